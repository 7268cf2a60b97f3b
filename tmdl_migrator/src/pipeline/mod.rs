//! Per-document migration: read, rewrite, back up, overwrite
//!
//! `migrate_file` runs the stages and returns a `PipelineError` for the first
//! failing one. `process_document` is the per-file boundary used by the batch
//! runner: every outcome, failures included, comes back as a `FileReport`.

mod error;
mod result;
mod validation;

pub use error::PipelineError;
pub use result::PipelineResult;
pub use validation::validate_pipeline;

use crate::config::runtime::FileProcessorPreferences;
use crate::file_processor::FileProcessor;
use crate::logging::{self, codes};
use crate::migration::{self, DocumentOutcome, FileReport, RewriteStatus};
use crate::rewrite::{BlockRewrite, ConnectionTarget, Shape};
use crate::{log_error, log_info, log_performance, log_success, log_warning};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// `<path>.backup`, next to the document
pub fn backup_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".backup");
    PathBuf::from(name)
}

/// Migrate one document in place using the environment's reader preferences
pub fn migrate_file(
    path: &Path,
    target: &ConnectionTarget,
    table: &str,
) -> Result<PipelineResult, PipelineError> {
    let processor = FileProcessor::from_preferences(&FileProcessorPreferences::default());
    migrate_file_with(&processor, path, target, table)
}

pub fn migrate_file_with(
    processor: &FileProcessor,
    path: &Path,
    target: &ConnectionTarget,
    table: &str,
) -> Result<PipelineResult, PipelineError> {
    let start_time = Instant::now();

    let original = processor.process_file(path)?.source;

    let (text, rewrite) = match migration::migrate_document(&original, target, table) {
        DocumentOutcome::Ineligible => {
            log_warning!(codes::document::NO_PARTITION_MARKER,
                "No partition marker; document skipped",
                "path" => path.display());
            return Ok(PipelineResult::new(
                RewriteStatus::SkippedNoPartition,
                start_time.elapsed(),
            ));
        }
        DocumentOutcome::Unchanged { rewrite: None } => {
            log_warning!(codes::document::NO_SOURCE_BLOCK,
                "Partition has no source block; document unchanged",
                "path" => path.display());
            return Ok(PipelineResult::new(
                RewriteStatus::SkippedNoChange,
                start_time.elapsed(),
            ));
        }
        DocumentOutcome::Unchanged {
            rewrite: Some(rewrite),
        } => {
            log_rewrite_diagnostics(&rewrite, path);
            return Ok(
                PipelineResult::new(RewriteStatus::SkippedNoChange, start_time.elapsed())
                    .with_shape(Some(rewrite.shape)),
            );
        }
        DocumentOutcome::Rewritten { text, rewrite } => (text, rewrite),
    };

    log_rewrite_diagnostics(&rewrite, path);
    log_success!(codes::success::BLOCK_REWRITTEN, "Source block rewritten",
        "path" => path.display(),
        "shape" => rewrite.shape,
        "table" => table);

    let backup_path = backup_path_for(path);
    fs::write(&backup_path, original.as_bytes()).map_err(|source| {
        let error = PipelineError::Backup {
            path: backup_path.clone(),
            source,
        };
        log_error!(error.error_code(), "Backup write failed; document left untouched",
            "path" => path.display(),
            "backup" => backup_path.display(),
            "error" => &error);
        error
    })?;
    log_success!(codes::success::BACKUP_WRITTEN, "Backup written",
        "backup" => backup_path.display());

    fs::write(path, text.as_bytes()).map_err(|source| {
        let error = PipelineError::Overwrite {
            path: path.to_path_buf(),
            source,
        };
        log_error!(error.error_code(), "Overwrite failed after backup",
            "path" => path.display(),
            "backup" => backup_path.display(),
            "error" => &error);
        error
    })?;

    let processing_duration = start_time.elapsed();
    log_performance!(codes::success::DOCUMENT_MIGRATED, "Document migrated",
        duration = processing_duration,
        "path" => path.display(),
        "shape" => rewrite.shape);

    Ok(PipelineResult::new(RewriteStatus::Success, processing_duration)
        .with_shape(Some(rewrite.shape))
        .with_backup(backup_path))
}

/// Migrated text of a document without touching the file
pub fn preview_file(
    processor: &FileProcessor,
    path: &Path,
    target: &ConnectionTarget,
    table: &str,
) -> Result<(String, RewriteStatus, Option<Shape>), PipelineError> {
    let original = processor.process_file(path)?.source;

    Ok(match migration::migrate_document(&original, target, table) {
        DocumentOutcome::Ineligible => (original, RewriteStatus::SkippedNoPartition, None),
        DocumentOutcome::Unchanged { rewrite } => (
            original,
            RewriteStatus::SkippedNoChange,
            rewrite.map(|r| r.shape),
        ),
        DocumentOutcome::Rewritten { text, rewrite } => {
            (text, RewriteStatus::Success, Some(rewrite.shape))
        }
    })
}

/// Migrate one document and fold any failure into its report
pub fn process_document(
    processor: &FileProcessor,
    path: &Path,
    file: &str,
    file_id: usize,
    target: &ConnectionTarget,
    table: &str,
) -> FileReport {
    logging::with_file_context(path.to_path_buf(), file_id, || {
        log_info!("Migrating document", "table" => table);

        match migrate_file_with(processor, path, target, table) {
            Ok(result) => result.into_report(file, table),
            Err(error) => FileReport::new(file, RewriteStatus::Error(error.to_string()))
                .with_table(table),
        }
    })
}

fn log_rewrite_diagnostics(rewrite: &BlockRewrite, path: &Path) {
    if rewrite.shape == Shape::Unrecognized {
        log_warning!(codes::rewrite::UNRECOGNIZED_SHAPE,
            "Source block shape not recognized; block left unchanged",
            "path" => path.display());
    }

    if let Some(flat) = &rewrite.flat_file {
        if flat.sites_unbounded > 0 {
            log_warning!(codes::rewrite::UNBOUNDED_CALL,
                "Flat-file call without a closing parenthesis left unmodified",
                "path" => path.display(),
                "sites" => flat.sites_unbounded);
        }
        if flat.sites_over_limit > 0 {
            log_warning!(codes::rewrite::TOO_MANY_CALL_SITES,
                "Call sites beyond the per-block limit left unmodified",
                "path" => path.display(),
                "sites" => flat.sites_over_limit);
        }
    }

    for splice in &rewrite.splices {
        log_success!(codes::success::HEADER_STEP_SPLICED, "Header promotion step removed",
            "step" => &splice.step,
            "input" => &splice.input,
            "references" => splice.references_renamed);
    }
}
