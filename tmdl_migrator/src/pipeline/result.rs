use crate::migration::{FileReport, RewriteStatus};
use crate::rewrite::Shape;
use std::path::PathBuf;
use std::time::Duration;

/// Outcome of a document that made it through the pipeline without error
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    /// Never `RewriteStatus::Error`; failures are `PipelineError`
    pub status: RewriteStatus,
    pub shape: Option<Shape>,
    /// Set only when the document was overwritten
    pub backup_path: Option<PathBuf>,
    pub processing_duration: Duration,
}

impl PipelineResult {
    pub fn new(status: RewriteStatus, processing_duration: Duration) -> Self {
        Self {
            status,
            shape: None,
            backup_path: None,
            processing_duration,
        }
    }

    pub fn with_shape(mut self, shape: Option<Shape>) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_backup(mut self, backup_path: PathBuf) -> Self {
        self.backup_path = Some(backup_path);
        self
    }

    pub fn into_report(self, file: &str, table: &str) -> FileReport {
        let mut report = FileReport::new(file, self.status).with_table(table);
        report.shape = self.shape;
        report.backup_path = self.backup_path;
        report
    }
}
