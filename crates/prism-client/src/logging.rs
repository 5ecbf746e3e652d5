//! Logging setup for hosts embedding the client.

use observability::LogConfig;
use std::path::PathBuf;

const SERVICE_NAME: &str = "prism-client";

/// Logging settings read from `PRISM_LOG_LEVEL` and `PRISM_LOG_FILE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub level: String,
    /// JSONL output file; stderr when unset
    pub log_file: Option<PathBuf>,
    pub also_stderr: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_file: None,
            also_stderr: false,
        }
    }
}

impl LoggingSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            level: lookup("PRISM_LOG_LEVEL")
                .filter(|level| !level.trim().is_empty())
                .unwrap_or(defaults.level),
            log_file: lookup("PRISM_LOG_FILE")
                .filter(|path| !path.trim().is_empty())
                .map(PathBuf::from),
            also_stderr: lookup("PRISM_LOG_STDERR")
                .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
                .unwrap_or(defaults.also_stderr),
        }
    }
}

/// Install the process-wide subscriber. Safe to call more than once.
pub fn init_logging(settings: &LoggingSettings) -> std::io::Result<()> {
    observability::init_with_config(LogConfig {
        service_name: SERVICE_NAME.to_string(),
        default_level: settings.level.clone(),
        log_path: settings.log_file.clone(),
        also_stderr: settings.also_stderr,
    })
}
