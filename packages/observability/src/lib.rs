//! # Observability
//!
//! Centralized logging setup for the Prism client.
//!
//! Components call `observability::init()` once at startup and use standard
//! `tracing` macros throughout their code. Where the lines go is decided here:
//!
//! - Without a log path: compact human-readable output on stderr
//! - With a log path: structured JSONL appended to that file, optionally
//!   mirrored to stderr
//!
//! Field values that look like secrets (tokens, signatures, bearer headers,
//! JWTs) are replaced with `[REDACTED]` before a JSONL line is written.
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init("prism-client");
//!     tracing::info!("client started");
//! }
//! ```
//!
//! Or with configuration:
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "prism-client".into(),
//!     default_level: "debug".into(),
//!     log_path: Some(observability::default_log_path()?),
//!     also_stderr: true,
//! })?;
//! ```

mod file;
mod json_layer;
mod redact;

pub use file::{default_log_path, FileLogWriter};
pub use json_layer::{JsonLayer, LogEntry};
pub use redact::{redact_fields, REDACTED};

use std::io;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the component, included in every JSONL line.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// JSONL output file. `None` logs to stderr only.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr when writing to a file.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Initialize logging to stderr with default settings.
pub fn init(service_name: &str) {
    // Stderr-only setup cannot fail to open anything
    let _ = init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with custom configuration.
///
/// Fails only when the log file cannot be opened. A second call in the same
/// process keeps the subscriber that is already installed.
pub fn init_with_config(config: LogConfig) -> io::Result<()> {
    let Some(log_path) = config.log_path.clone() else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter(&config.default_level))
            .with_target(true)
            .compact()
            .with_writer(io::stderr)
            .try_init();
        return Ok(());
    };

    let writer = FileLogWriter::new(&log_path)?;
    let json_layer = JsonLayer::new(config.service_name.clone(), writer);

    let stderr_layer = config.also_stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .with_writer(io::stderr)
            .with_filter(env_filter(&config.default_level))
    });

    let installed = tracing_subscriber::registry()
        .with(json_layer.with_filter(env_filter(&config.default_level)))
        .with(stderr_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(log_path = %log_path.display(), "observability initialized");
    }
    Ok(())
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};
