use env_logger::Builder;
use std::io::Write;
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize the global logger from `RUST_LOG`, once per process.
///
/// Safe to call from every test and from the shell binary; repeated calls
/// after the first are no-ops.
pub fn init_log() {
    INIT.call_once(|| {
        let mut builder = Builder::from_default_env();
        builder
            .format_timestamp_micros()
            .format(|buf, record| {
                writeln!(
                    buf,
                    "[{} - {}] [{}:{}] {}",
                    record.level(),
                    record.target(),
                    record.file().unwrap_or("?"),
                    record.line().unwrap_or(0),
                    record.args()
                )
            })
            .init();
    });
}
