//! Logging for the `chordmatch` binary
//!
//! Console output goes to stderr so `replay --json` stays parseable. Its level
//! comes from `-v` flags unless RUST_LOG is set, e.g.
//! `RUST_LOG=chordmatch::shortcuts=trace` to see every snapshot the engine builds.
//!
//! A second layer keeps debug-level logs in `<config dir>/logs/chordmatch.log`,
//! rotated daily. Replays that fire the wrong command are easiest to diagnose
//! from there.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "chordmatch.log";

/// Console level for a `-v` count
pub fn console_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the console and file layers
///
/// Later calls are no-ops, so tests and embedding hosts may call it freely.
pub fn init(verbosity: u8) {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(console_level(verbosity)));

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(console_filter);

    let file_layer = match crate::config_paths::ensure_logs_dir() {
        Ok(dir) => Some(
            fmt::layer()
                .with_writer(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX))
                .with_ansi(false)
                .with_line_number(true)
                .with_filter(EnvFilter::new("chordmatch=debug")),
        ),
        Err(e) => {
            eprintln!("chordmatch: file logging disabled: {}", e);
            None
        }
    };

    let _ = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init();
}
