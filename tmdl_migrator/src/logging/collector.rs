//! Per-document error and warning collection
//!
//! Worker threads record coded errors and warnings against the document they
//! are processing; the CLI prints the grouped result once the batch is done.

use super::codes;
use super::events::LogEvent;
use crate::config::compile_time::logging::{LOG_BUFFER_SIZE, MAX_LOG_EVENTS_PER_FILE};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// The document the current thread is working on
#[derive(Debug, Clone)]
pub struct FileProcessingContext {
    pub file_path: PathBuf,
    pub file_id: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingSummary {
    pub documents: usize,
    pub failed_documents: usize,
    pub total_errors: usize,
    pub total_warnings: usize,
}

#[derive(Debug, Default)]
struct Collected {
    by_file: BTreeMap<PathBuf, Vec<LogEvent>>,
    total: usize,
}

/// Capped at `MAX_LOG_EVENTS_PER_FILE` per document and `LOG_BUFFER_SIZE`
/// overall; a document that hits its cap gets one notice in place of the rest.
#[derive(Debug, Default)]
pub struct ErrorCollector {
    collected: Mutex<Collected>,
}

impl ErrorCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_event(&self, file_path: &Path, event: LogEvent) {
        let mut collected = self
            .collected
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        if collected.total >= LOG_BUFFER_SIZE {
            return;
        }

        let events = collected.by_file.entry(file_path.to_path_buf()).or_default();
        let pushed = match events.len() {
            n if n < MAX_LOG_EVENTS_PER_FILE => {
                events.push(event);
                true
            }
            n if n == MAX_LOG_EVENTS_PER_FILE => {
                events.push(LogEvent::warning(
                    codes::system::EVENTS_DROPPED,
                    &format!("Further events dropped (limit {})", MAX_LOG_EVENTS_PER_FILE),
                ));
                true
            }
            _ => false,
        };

        if pushed {
            collected.total += 1;
        }
    }

    pub fn file_events(&self, file_path: &Path) -> Vec<LogEvent> {
        self.collected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_file
            .get(file_path)
            .cloned()
            .unwrap_or_default()
    }

    pub fn summary(&self) -> ProcessingSummary {
        let collected = self
            .collected
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut summary = ProcessingSummary {
            documents: collected.by_file.len(),
            ..ProcessingSummary::default()
        };

        for events in collected.by_file.values() {
            let errors = events.iter().filter(|e| e.is_error()).count();
            summary.total_errors += errors;
            summary.total_warnings += events.iter().filter(|e| e.is_warning()).count();
            if errors > 0 {
                summary.failed_documents += 1;
            }
        }

        summary
    }

    /// Errors then warnings, grouped by document, followed by totals
    pub fn format_cargo_style(&self) -> String {
        let by_file = self
            .collected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .by_file
            .clone();
        let mut output = String::new();

        for (file_path, events) in &by_file {
            if events.is_empty() {
                continue;
            }

            output.push_str(&format!("Migrating {}...\n", file_path.display()));

            for event in events.iter().filter(|e| e.is_error()) {
                output.push_str(&format!(
                    "error[{}]: {}\n --> {}\n",
                    event.code,
                    event.message,
                    file_path.display()
                ));
                push_context(&mut output, event);
                if let Some(metadata) = codes::get_error_metadata(event.code.as_str()) {
                    output.push_str(&format!("  = help: {}\n", metadata.recommended_action));
                }
            }

            for event in events.iter().filter(|e| e.is_warning()) {
                output.push_str(&format!("warning[{}]: {}\n", event.code, event.message));
                push_context(&mut output, event);
            }

            output.push('\n');
        }

        let summary = self.summary();
        if summary.total_errors > 0 {
            output.push_str(&format!(
                "Total errors: {} in {} document(s)\n",
                summary.total_errors, summary.failed_documents
            ));
        }
        if summary.total_warnings > 0 {
            output.push_str(&format!("Total warnings: {}\n", summary.total_warnings));
        }

        output
    }
}

fn push_context(output: &mut String, event: &LogEvent) {
    for (key, value) in &event.context {
        if key != "file" && key != "file_id" {
            output.push_str(&format!("  = {}: {}\n", key, value));
        }
    }
}
