//! Runtime preferences read from the environment

use crate::logging::LogLevel;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileProcessorPreferences {
    /// Whether to require the .tmdl extension on documents
    pub require_tmdl_extension: bool,

    /// Whether to log read timings for every document
    pub enable_performance_logging: bool,
}

impl Default for FileProcessorPreferences {
    fn default() -> Self {
        Self {
            require_tmdl_extension: from_env(env_vars::REQUIRE_TMDL_EXTENSION).unwrap_or(false),
            enable_performance_logging: from_env(env_vars::ENABLE_PERFORMANCE_LOGGING)
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchPreferences {
    /// Print a progress line after each document reaches its terminal state
    pub progress_reporting: bool,

    /// Worker threads used when the caller does not choose; 1 keeps the run sequential
    pub default_threads: usize,
}

impl Default for BatchPreferences {
    fn default() -> Self {
        Self {
            progress_reporting: from_env(env_vars::BATCH_PROGRESS).unwrap_or(true),
            default_threads: from_env(env_vars::BATCH_THREADS)
                .filter(|n: &usize| *n >= 1)
                .unwrap_or(1),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingPreferences {
    /// Whether to use structured JSON logging
    pub use_structured_logging: bool,

    /// Whether to enable console output
    pub enable_console_logging: bool,

    /// Minimum level written by the console/structured loggers
    pub min_log_level: LogLevel,

    /// Whether to enable cargo-style error reporting
    pub enable_cargo_style_output: bool,

    /// Whether to include file context in log messages
    pub include_file_context: bool,
}

impl Default for LoggingPreferences {
    fn default() -> Self {
        let use_structured_logging = from_env(env_vars::LOGGING_USE_STRUCTURED).unwrap_or(false);

        Self {
            use_structured_logging,
            enable_console_logging: from_env(env_vars::LOGGING_ENABLE_CONSOLE).unwrap_or(false),
            min_log_level: env::var(env_vars::LOGGING_MIN_LEVEL)
                .ok()
                .and_then(|v| LogLevel::parse(&v))
                .unwrap_or(LogLevel::Info),
            // Grouped summaries are the default unless JSON lines were asked for
            enable_cargo_style_output: from_env(env_vars::LOGGING_CARGO_STYLE)
                .unwrap_or(!use_structured_logging),
            include_file_context: from_env(env_vars::LOGGING_INCLUDE_FILE_CONTEXT).unwrap_or(true),
        }
    }
}

impl LoggingPreferences {
    pub fn validate(&self) -> Result<(), String> {
        // JSON lines and the grouped summary would interleave on stderr.
        if self.use_structured_logging && self.enable_cargo_style_output {
            return Err(
                "Structured logging and cargo-style output cannot both be enabled".to_string(),
            );
        }
        Ok(())
    }
}

/// Unset and unparsable values both fall back to the caller's default
fn from_env<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// `TMDL_*` variables read by the `Default` impls above
pub mod env_vars {
    // File Processor
    pub const REQUIRE_TMDL_EXTENSION: &str = "TMDL_REQUIRE_TMDL_EXTENSION";
    pub const ENABLE_PERFORMANCE_LOGGING: &str = "TMDL_ENABLE_PERFORMANCE_LOGGING";

    // Batch
    pub const BATCH_PROGRESS: &str = "TMDL_BATCH_PROGRESS";
    pub const BATCH_THREADS: &str = "TMDL_BATCH_THREADS";

    // Logging
    pub const LOGGING_USE_STRUCTURED: &str = "TMDL_LOGGING_USE_STRUCTURED";
    pub const LOGGING_ENABLE_CONSOLE: &str = "TMDL_LOGGING_ENABLE_CONSOLE";
    pub const LOGGING_MIN_LEVEL: &str = "TMDL_LOGGING_MIN_LEVEL";
    pub const LOGGING_CARGO_STYLE: &str = "TMDL_LOGGING_CARGO_STYLE";
    pub const LOGGING_INCLUDE_FILE_CONTEXT: &str = "TMDL_LOGGING_INCLUDE_FILE_CONTEXT";
}
