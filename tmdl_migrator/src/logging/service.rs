//! Event sinks

use super::events::{LogEvent, LogLevel};
use crate::config::runtime::LoggingPreferences;
use std::sync::{Arc, Mutex, PoisonError};

pub trait Logger: Send + Sync {
    fn log(&self, event: &LogEvent);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleFormat {
    Plain,
    Json,
}

/// Writes to stderr so stdout stays free for reports and previews
#[derive(Debug, Clone)]
pub struct ConsoleLogger {
    format: ConsoleFormat,
    include_file_context: bool,
}

impl ConsoleLogger {
    pub fn new(format: ConsoleFormat, include_file_context: bool) -> Self {
        Self {
            format,
            include_file_context,
        }
    }

    pub fn render(&self, event: &LogEvent) -> String {
        match self.format {
            ConsoleFormat::Plain => event.format(self.include_file_context),
            ConsoleFormat::Json => event
                .format_json()
                .unwrap_or_else(|_| event.format(self.include_file_context)),
        }
    }
}

impl Logger for ConsoleLogger {
    fn log(&self, event: &LogEvent) {
        eprintln!("{}", self.render(event));
    }
}

/// Keeps every event; used by tests
#[derive(Debug, Default)]
pub struct MemoryLogger {
    events: Mutex<Vec<LogEvent>>,
}

impl MemoryLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LogEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn has_code(&self, code: super::Code) -> bool {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|event| event.code == code)
    }
}

impl Logger for MemoryLogger {
    fn log(&self, event: &LogEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

/// Level filter in front of an optional sink. Without a sink, events still
/// reach the error collector through the macros.
pub struct LoggingService {
    logger: Option<Arc<dyn Logger>>,
    min_level: LogLevel,
}

impl LoggingService {
    pub fn new(logger: Arc<dyn Logger>, min_level: LogLevel) -> Self {
        Self {
            logger: Some(logger),
            min_level,
        }
    }

    pub fn from_preferences(prefs: &LoggingPreferences) -> Self {
        let logger: Option<Arc<dyn Logger>> = prefs.enable_console_logging.then(|| {
            let format = if prefs.use_structured_logging {
                ConsoleFormat::Json
            } else {
                ConsoleFormat::Plain
            };
            Arc::new(ConsoleLogger::new(format, prefs.include_file_context)) as Arc<dyn Logger>
        });

        Self {
            logger,
            min_level: prefs.min_log_level,
        }
    }

    pub fn enabled(&self, level: LogLevel) -> bool {
        self.logger.is_some() && level <= self.min_level
    }

    pub fn log_event(&self, event: &LogEvent) {
        if let Some(logger) = &self.logger {
            if event.level <= self.min_level {
                logger.log(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::codes;

    fn prefs() -> LoggingPreferences {
        LoggingPreferences {
            use_structured_logging: false,
            enable_console_logging: true,
            min_log_level: LogLevel::Info,
            enable_cargo_style_output: true,
            include_file_context: true,
        }
    }

    #[test]
    fn test_level_filtering() {
        let memory = Arc::new(MemoryLogger::new());
        let service = LoggingService::new(memory.clone(), LogLevel::Warning);

        service.log_event(&LogEvent::debug("call site located"));
        service.log_event(&LogEvent::success(codes::success::BACKUP_WRITTEN, "Backup written"));
        service.log_event(&LogEvent::error(codes::write::OVERWRITE_FAILED, "Write failed"));

        assert_eq!(memory.events().len(), 1);
        assert!(memory.has_code(codes::write::OVERWRITE_FAILED));
        assert!(!service.enabled(LogLevel::Info));
    }

    #[test]
    fn test_console_disabled_has_no_sink() {
        let service = LoggingService::from_preferences(&LoggingPreferences {
            enable_console_logging: false,
            ..prefs()
        });
        assert!(!service.enabled(LogLevel::Error));
    }

    #[test]
    fn test_console_format_follows_preferences() {
        let event = LogEvent::warning(codes::document::NO_PARTITION_MARKER, "No partition")
            .with_context("file", "Measures.tmdl");

        let plain = ConsoleLogger::new(ConsoleFormat::Plain, true);
        assert_eq!(
            plain.render(&event),
            "[WARN] W020 - No partition (Measures.tmdl)"
        );

        let json = ConsoleLogger::new(ConsoleFormat::Json, false);
        assert!(json.render(&event).starts_with('{'));

        let service = LoggingService::from_preferences(&prefs());
        assert!(service.enabled(LogLevel::Info));
        assert!(!service.enabled(LogLevel::Debug));
    }
}
