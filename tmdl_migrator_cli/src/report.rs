//! Plain-text reports for the terminal

use std::fmt::Write;
use tmdl_migrator::batch::{BatchResults, DiscoveredDocument};
use tmdl_migrator::migration::{FileReport, RewriteStatus};

fn status_tag(status: &RewriteStatus) -> &'static str {
    match status {
        RewriteStatus::Success => "[OK]  ",
        RewriteStatus::SkippedNoPartition | RewriteStatus::SkippedNoChange => "[SKIP]",
        RewriteStatus::Error(_) => "[FAIL]",
    }
}

fn format_report_line(report: &FileReport) -> String {
    let mut line = format!("  {} {}", status_tag(&report.status), report.file);

    if let Some(table) = &report.table {
        let _ = write!(line, " -> {}", table);
    }
    let _ = write!(line, ": {}", report.status);
    if let Some(shape) = report.shape {
        let _ = write!(line, " [{}]", shape);
    }
    if let Some(backup) = &report.backup_path {
        let _ = write!(line, " (backup: {})", backup.display());
    }

    line
}

pub fn format_results(results: &BatchResults) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Migration Summary ===");
    let _ = writeln!(out, "Folder: {}", results.folder.display());
    let _ = writeln!(out, "Target: {}", results.target.connect_expression());
    for report in &results.reports {
        let _ = writeln!(out, "{}", format_report_line(report));
    }
    let _ = writeln!(out, "Migrated: {} of {}", results.successes, results.total);
    let _ = writeln!(out, "Skipped: {}", results.skipped_count());
    let _ = writeln!(out, "Failed: {}", results.error_count());
    let _ = writeln!(
        out,
        "Duration: {:.2}s",
        results.processing_duration.as_secs_f64()
    );

    out
}

pub fn format_discovery(documents: &[DiscoveredDocument]) -> String {
    if documents.is_empty() {
        return "No eligible documents found\n".to_string();
    }

    let width = documents.iter().map(|d| d.file.len()).max().unwrap_or(0);
    let mut out = String::new();
    for doc in documents {
        let _ = writeln!(out, "{:width$}  {}", doc.file, doc.table, width = width);
    }
    out
}
