use crate::file_processor::FileProcessorError;
use crate::logging::codes::{self, Code};
use std::path::PathBuf;

/// Failures inside one document's migration
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("File processing failed: {0}")]
    FileProcessing(#[from] FileProcessorError),

    #[error("Backup write to {path} failed: {source}")]
    Backup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Overwrite of {path} failed: {source}")]
    Overwrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::FileProcessing(inner) => inner.error_code(),
            Self::Backup { .. } => codes::write::BACKUP_FAILED,
            Self::Overwrite { .. } => codes::write::OVERWRITE_FAILED,
        }
    }
}
