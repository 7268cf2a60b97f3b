use crate::rewrite::Shape;
use serde::Serialize;
use std::path::PathBuf;

/// Terminal state of one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum RewriteStatus {
    Success,
    SkippedNoPartition,
    SkippedNoChange,
    Error(String),
}

impl RewriteStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::SkippedNoPartition | Self::SkippedNoChange)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "migrated",
            Self::SkippedNoPartition => "skipped (no partition)",
            Self::SkippedNoChange => "skipped (no change)",
            Self::Error(_) => "error",
        }
    }
}

impl std::fmt::Display for RewriteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error(message) => write!(f, "error: {}", message),
            other => f.write_str(other.label()),
        }
    }
}

/// Per-document entry of the run report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file: String,
    #[serde(flatten)]
    pub status: RewriteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<Shape>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup_path: Option<PathBuf>,
}

impl FileReport {
    pub fn new(file: impl Into<String>, status: RewriteStatus) -> Self {
        Self {
            file: file.into(),
            status,
            table: None,
            shape: None,
            backup_path: None,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn with_backup(mut self, backup_path: PathBuf) -> Self {
        self.backup_path = Some(backup_path);
        self
    }
}
