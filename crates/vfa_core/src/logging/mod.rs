//! Logging infrastructure for Video Frame Align.
//!
//! Two layers: library code logs through `tracing` macros, and each
//! pipeline run additionally gets a [`RunLogger`] writing a readable log
//! file (and optionally echoing it through a callback). In compact mode the
//! run logger only prints progress at fixed steps and keeps recent detail
//! lines in a tail buffer that is dumped when something fails.
//!
//! # Example
//!
//! ```no_run
//! use vfa_core::logging::{LogConfig, RunLogger};
//!
//! let logger = RunLogger::new("align", ".logs", LogConfig::default(), None).unwrap();
//!
//! logger.phase("Detect");
//! logger.progress(40);
//! logger.success("Run completed");
//! ```

mod run_logger;
mod types;

pub use run_logger::{RunLogger, RunLoggerBuilder};
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the global `tracing` subscriber writing to stderr.
///
/// `RUST_LOG` wins over `default_level` when set. Call once per process.
pub fn init_tracing(default_level: LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_to_filter_str(default_level)));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(true)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Warnings and errors from library code, captured by the test harness.
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

fn level_to_filter_str(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Trace => "trace",
        LogLevel::Debug => "debug",
        LogLevel::Info => "info",
        LogLevel::Warn => "warn",
        LogLevel::Error => "error",
    }
}
