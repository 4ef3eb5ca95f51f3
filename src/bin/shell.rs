//! An interactive driver over a single table: `i`nsert, `f`ind, `d`elete,
//! `s`can, `p`rint buffer stats, `q`uit. Mirrors the reference
//! implementation's command-line loop, rewritten as a line-oriented REPL.

use std::io::{self, BufRead, Write};

use pagestore::{db_delete, db_find, db_insert, db_scan, init_db, init_log, open_table, Engine};

fn prompt(line: &mut String, msg: &str) -> io::Result<()> {
    print!("{}", msg);
    io::stdout().flush()?;
    line.clear();
    io::stdin().lock().read_line(line)?;
    Ok(())
}

fn main() -> io::Result<()> {
    init_log();
    if let Err(e) = init_db(8, 100) {
        eprintln!("failed to initialize engine: {}", e);
        return Ok(());
    }

    let mut line = String::new();
    prompt(&mut line, "input db name\n")?;
    let table_id = match open_table(line.trim()) {
        Ok(id) => id,
        Err(e) => {
            eprintln!("failed to open table: {}", e);
            return Ok(());
        }
    };

    loop {
        prompt(&mut line, "(i/f/d/s/p/q) > ")?;
        let instruction = line.trim().chars().next().unwrap_or('\n');

        match instruction {
            'i' => {
                prompt(&mut line, "input insert key\n")?;
                let key: i64 = match line.trim().parse() {
                    Ok(k) => k,
                    Err(_) => continue,
                };
                prompt(&mut line, "input value string\n")?;
                let value = line.trim().as_bytes();
                match db_insert(table_id, key, value) {
                    Ok(()) => println!("Insertion succeeded"),
                    Err(e) => println!("Insertion failed: {}", e),
                }
            }
            'f' => {
                prompt(&mut line, "input find key\n")?;
                let key: i64 = match line.trim().parse() {
                    Ok(k) => k,
                    Err(_) => continue,
                };
                match db_find(table_id, key) {
                    Ok(value) => println!(
                        "value: {}, size: {}",
                        String::from_utf8_lossy(&value),
                        value.len()
                    ),
                    Err(_) => println!("Find failed"),
                }
            }
            'd' => {
                prompt(&mut line, "input delete key\n")?;
                let key: i64 = match line.trim().parse() {
                    Ok(k) => k,
                    Err(_) => continue,
                };
                match db_delete(table_id, key) {
                    Ok(()) => println!("Deletion succeeded"),
                    Err(_) => println!("Deletion failed"),
                }
            }
            's' => {
                prompt(&mut line, "input scan begin key, end key\n")?;
                let parts: Vec<i64> = line.trim().split_whitespace().filter_map(|s| s.parse().ok()).collect();
                if parts.len() != 2 {
                    println!("Scan failed");
                    continue;
                }
                match db_scan(table_id, parts[0], parts[1]) {
                    Ok(rows) => {
                        for (key, value) in rows {
                            println!("scanned key: {}, value: {}, size: {}", key, String::from_utf8_lossy(&value), value.len());
                        }
                    }
                    Err(_) => println!("Scan failed"),
                }
            }
            'p' => {
                let (hits, misses, frames) = Engine::global().buffer_stats();
                let total = hits + misses;
                let ratio = if total == 0 { 1.0 } else { hits as f64 / total as f64 };
                println!("frames: {}, hits: {}, misses: {}, hit ratio: {:.3}", frames, hits, misses, ratio);
            }
            'q' => {
                println!("Exit");
                let _ = pagestore::shutdown_db();
                return Ok(());
            }
            _ => println!(),
        }
    }
}
