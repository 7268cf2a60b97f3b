//! Global logging for the TMDL migrator
//!
//! One process-wide `LoggingService` and `ErrorCollector`, a thread-local
//! record of the document being migrated, and the `log_*!` macros that tie
//! them together.

pub mod codes;
pub mod collector;
pub mod events;
pub mod macros;
pub mod service;

use crate::config::runtime::LoggingPreferences;
use std::cell::RefCell;
use std::path::PathBuf;
use std::sync::OnceLock;

pub use codes::Code;
pub use collector::{ErrorCollector, FileProcessingContext, ProcessingSummary};
pub use events::{LogEvent, LogLevel};
pub use service::{ConsoleFormat, ConsoleLogger, Logger, LoggingService, MemoryLogger};

static GLOBAL_LOGGER: OnceLock<LoggingService> = OnceLock::new();
static GLOBAL_ERROR_COLLECTOR: OnceLock<ErrorCollector> = OnceLock::new();
static CARGO_STYLE_OUTPUT: OnceLock<bool> = OnceLock::new();

thread_local! {
    static FILE_CONTEXT: RefCell<Option<FileProcessingContext>> = const { RefCell::new(None) };
}

/// Initialize global logging from `TMDL_LOGGING_*` preferences
pub fn init_global_logging() -> Result<(), String> {
    init_global_logging_with(LoggingPreferences::default())
}

pub fn init_global_logging_with(prefs: LoggingPreferences) -> Result<(), String> {
    prefs.validate()?;

    GLOBAL_ERROR_COLLECTOR
        .set(ErrorCollector::new())
        .map_err(|_| "Global error collector already initialized")?;
    GLOBAL_LOGGER
        .set(LoggingService::from_preferences(&prefs))
        .map_err(|_| "Global logger already initialized")?;
    let _ = CARGO_STYLE_OUTPUT.set(prefs.enable_cargo_style_output);

    emit(
        LogEvent::success(
            codes::success::SYSTEM_INITIALIZATION_COMPLETED,
            "Global logging initialized",
        ),
        vec![("min_level", prefs.min_log_level.as_str().to_string())],
    );

    Ok(())
}

/// Run `f` with events tagged with, and collected under, `file_path`
pub fn with_file_context<F, R>(file_path: PathBuf, file_id: usize, f: F) -> R
where
    F: FnOnce() -> R,
{
    FILE_CONTEXT.with(|ctx| {
        *ctx.borrow_mut() = Some(FileProcessingContext { file_path, file_id })
    });
    let result = f();
    FILE_CONTEXT.with(|ctx| *ctx.borrow_mut() = None);
    result
}

pub fn current_file_context() -> Option<FileProcessingContext> {
    FILE_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// Whether a `level` event would reach the console
pub fn enabled(level: LogLevel) -> bool {
    GLOBAL_LOGGER
        .get()
        .map(|service| service.enabled(level))
        .unwrap_or(false)
}

/// Used by the `log_*!` macros. Errors and warnings raised inside
/// `with_file_context` are also kept for the end-of-run summary.
#[doc(hidden)]
pub fn emit(mut event: LogEvent, context: Vec<(&str, String)>) {
    for (key, value) in context {
        event = event.with_context(key, value);
    }

    let file = current_file_context();
    if let Some(ctx) = &file {
        event = event
            .with_context("file", ctx.file_path.display().to_string())
            .with_context("file_id", ctx.file_id.to_string());
    }

    if let Some(service) = GLOBAL_LOGGER.get() {
        service.log_event(&event);
    }

    if let (Some(ctx), Some(collector)) = (file, GLOBAL_ERROR_COLLECTOR.get()) {
        if event.is_error() || event.is_warning() {
            collector.record_event(&ctx.file_path, event);
        }
    }
}

/// Print collected errors and warnings grouped by document, to stderr
pub fn print_cargo_style_summary() {
    if !CARGO_STYLE_OUTPUT.get().copied().unwrap_or(false) {
        return;
    }

    if let Some(collector) = GLOBAL_ERROR_COLLECTOR.get() {
        let output = collector.format_cargo_style();
        if !output.is_empty() {
            eprint!("{}", output);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_file_context() {
        assert!(current_file_context().is_none());

        let result = with_file_context(PathBuf::from("Orders.tmdl"), 2, || {
            let context = current_file_context();
            assert_eq!(context.map(|c| c.file_id), Some(2));
            42
        });

        assert_eq!(result, 42);
        assert!(current_file_context().is_none());
    }

    #[test]
    fn test_events_are_collected_under_their_document() {
        let _ = init_global_logging();
        let path = PathBuf::from("collected/Sales.tmdl");

        with_file_context(path.clone(), 7, || {
            crate::log_warning!(codes::rewrite::UNRECOGNIZED_SHAPE, "Shape not recognized",
                "shape" => "unrecognized");
            crate::log_info!("not collected");
        });

        let events = GLOBAL_ERROR_COLLECTOR
            .get()
            .map(|collector| collector.file_events(&path))
            .unwrap_or_default();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].context.get("file_id").map(String::as_str), Some("7"));
        assert_eq!(events[0].context.get("shape").map(String::as_str), Some("unrecognized"));
    }
}
