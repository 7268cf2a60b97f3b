//! Bounded document reader
//!
//! A document is read whole, as UTF-8, and only when it fits the build
//! profile's size and line limits.

use crate::config::compile_time::file_processing::{MAX_FILE_SIZE, MAX_LINE_COUNT};
use crate::config::runtime::FileProcessorPreferences;
use crate::logging::{codes, Code};
use crate::{log_debug, log_error, log_performance, log_success};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, thiserror::Error)]
pub enum FileProcessorError {
    #[error("Document not found: {path}")]
    FileNotFound { path: String },

    #[error("Not a .tmdl document (extension {extension:?})")]
    InvalidExtension { extension: Option<String> },

    #[error("Document is {size} bytes, over the {max_size} byte limit")]
    FileTooLarge { size: u64, max_size: u64 },

    #[error("Document has {lines} lines, over the {max_lines} line limit")]
    TooManyLines { lines: usize, max_lines: usize },

    #[error("Permission denied reading {path}")]
    PermissionDenied { path: String },

    #[error("Document is not valid UTF-8: {path}")]
    InvalidEncoding { path: String },

    #[error("Not a regular file: {path}")]
    InvalidPath { path: String },

    #[error("Could not read {path}: {message}")]
    IoError { path: String, message: String },
}

impl FileProcessorError {
    pub fn error_code(&self) -> Code {
        use codes::file_processing::*;

        match self {
            Self::FileNotFound { .. } => FILE_NOT_FOUND,
            Self::InvalidExtension { .. } => INVALID_EXTENSION,
            Self::FileTooLarge { .. } | Self::TooManyLines { .. } => FILE_TOO_LARGE,
            Self::PermissionDenied { .. } => PERMISSION_DENIED,
            Self::InvalidEncoding { .. } => INVALID_ENCODING,
            Self::InvalidPath { .. } => INVALID_PATH,
            Self::IoError { .. } => IO_ERROR,
        }
    }

    fn from_io(path: &Path, err: &io::Error) -> Self {
        let path = path.display().to_string();
        match err.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound { path },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            io::ErrorKind::InvalidData => Self::InvalidEncoding { path },
            _ => Self::IoError {
                path,
                message: err.to_string(),
            },
        }
    }
}

/// A document's text as read from disk
#[derive(Debug, Clone)]
pub struct FileProcessingResult {
    pub path: PathBuf,
    pub source: String,
    pub size_bytes: u64,
    pub line_count: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct FileProcessor {
    /// Refuse files whose extension is not `.tmdl` (any case)
    pub require_tmdl_extension: bool,
    /// Log each read with its timing instead of a plain success event
    pub enable_performance_logging: bool,
}

impl FileProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_preferences(prefs: &FileProcessorPreferences) -> Self {
        Self {
            require_tmdl_extension: prefs.require_tmdl_extension,
            enable_performance_logging: prefs.enable_performance_logging,
        }
    }

    pub fn with_tmdl_extension_required(mut self, required: bool) -> Self {
        self.require_tmdl_extension = required;
        self
    }

    /// Read `path`, logging a coded error for whichever check refuses it
    pub fn process_file(&self, path: &Path) -> Result<FileProcessingResult, FileProcessorError> {
        let started = Instant::now();
        log_debug!("Reading document", "file" => path.display());

        let result = self.read_checked(path, started);
        match &result {
            Ok(document) => self.log_read(document),
            Err(error) => {
                log_error!(error.error_code(), "Document could not be read",
                    "file" => path.display(),
                    "reason" => error);
            }
        }
        result
    }

    fn read_checked(
        &self,
        path: &Path,
        started: Instant,
    ) -> Result<FileProcessingResult, FileProcessorError> {
        let metadata = fs::metadata(path).map_err(|e| FileProcessorError::from_io(path, &e))?;
        if !metadata.is_file() {
            return Err(FileProcessorError::InvalidPath {
                path: path.display().to_string(),
            });
        }

        let size_bytes = metadata.len();
        if size_bytes > MAX_FILE_SIZE {
            return Err(FileProcessorError::FileTooLarge {
                size: size_bytes,
                max_size: MAX_FILE_SIZE,
            });
        }

        if self.require_tmdl_extension {
            let extension = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(str::to_ascii_lowercase);
            if extension.as_deref() != Some("tmdl") {
                return Err(FileProcessorError::InvalidExtension { extension });
            }
        }

        let bytes = fs::read(path).map_err(|e| FileProcessorError::from_io(path, &e))?;
        let source = String::from_utf8(bytes).map_err(|_| FileProcessorError::InvalidEncoding {
            path: path.display().to_string(),
        })?;

        let line_count = source.lines().count();
        if line_count > MAX_LINE_COUNT {
            return Err(FileProcessorError::TooManyLines {
                lines: line_count,
                max_lines: MAX_LINE_COUNT,
            });
        }

        Ok(FileProcessingResult {
            path: path.to_path_buf(),
            source,
            size_bytes,
            line_count,
            elapsed: started.elapsed(),
        })
    }

    fn log_read(&self, document: &FileProcessingResult) {
        if self.enable_performance_logging {
            log_performance!(codes::success::FILE_READ_COMPLETE, "Document read",
                duration = document.elapsed,
                "file" => document.path.display(),
                "size" => format_size(document.size_bytes),
                "lines" => document.line_count,
            );
        } else {
            log_success!(codes::success::FILE_READ_COMPLETE, "Document read",
                "file" => document.path.display(),
                "size_bytes" => document.size_bytes,
            );
        }
    }
}

/// Bytes below 1 KiB as-is, otherwise KiB or MiB to one decimal
fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;

    match bytes {
        b if b >= MIB => format!("{:.1} MiB", b as f64 / MIB as f64),
        b if b >= KIB => format!("{:.1} KiB", b as f64 / KIB as f64),
        b => format!("{} B", b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn test_reads_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Sales.tmdl");
        let content = "table Sales\n\tpartition Sales = m\n";
        fs::write(&path, content).unwrap();

        let document = FileProcessor::new().process_file(&path).unwrap();
        assert_eq!(document.source, content);
        assert_eq!(document.line_count, 2);
        assert_eq!(document.size_bytes, content.len() as u64);
        assert_eq!(document.path, path);
    }

    #[test]
    fn test_empty_document_is_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Empty.tmdl");
        fs::write(&path, "").unwrap();

        let document = FileProcessor::new().process_file(&path).unwrap();
        assert!(document.source.is_empty());
        assert_eq!(document.line_count, 0);
    }

    #[test]
    fn test_missing_document() {
        let err = FileProcessor::new()
            .process_file(Path::new("missing/Nope.tmdl"))
            .unwrap_err();
        assert_matches!(err, FileProcessorError::FileNotFound { .. });
        assert_eq!(err.error_code().as_str(), "E005");
    }

    #[test]
    fn test_empty_path_is_not_found() {
        assert_matches!(
            FileProcessor::new().process_file(Path::new("")),
            Err(FileProcessorError::FileNotFound { .. })
        );
    }

    #[test]
    fn test_directory_is_invalid_path() {
        let dir = tempdir().unwrap();
        assert_matches!(
            FileProcessor::new().process_file(dir.path()),
            Err(FileProcessorError::InvalidPath { .. })
        );
    }

    #[test]
    fn test_invalid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Latin1.tmdl");
        fs::write(&path, [0x74, 0x61, 0xff, 0xfe, 0x0a]).unwrap();

        let err = FileProcessor::new().process_file(&path).unwrap_err();
        assert_matches!(err, FileProcessorError::InvalidEncoding { .. });
        assert_eq!(err.error_code(), codes::file_processing::INVALID_ENCODING);
    }

    #[test]
    fn test_extension_only_checked_when_required() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Sales.txt");
        fs::write(&path, "table Sales\n").unwrap();

        assert!(FileProcessor::new().process_file(&path).is_ok());

        let strict = FileProcessor::new().with_tmdl_extension_required(true);
        assert_matches!(
            strict.process_file(&path),
            Err(FileProcessorError::InvalidExtension { extension: Some(ref ext) }) if ext == "txt"
        );

        let upper = dir.path().join("Orders.TMDL");
        fs::write(&upper, "table Orders\n").unwrap();
        assert!(strict.process_file(&upper).is_ok());
    }

    #[test]
    fn test_line_limit() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Long.tmdl");
        fs::write(&path, "\n".repeat(MAX_LINE_COUNT + 1)).unwrap();

        let err = FileProcessor::new().process_file(&path).unwrap_err();
        assert_matches!(err, FileProcessorError::TooManyLines { max_lines, .. } if max_lines == MAX_LINE_COUNT);
        assert_eq!(err.error_code(), codes::file_processing::FILE_TOO_LARGE);
    }

    #[test]
    fn test_from_preferences() {
        let processor = FileProcessor::from_preferences(&FileProcessorPreferences {
            require_tmdl_extension: true,
            enable_performance_logging: true,
        });
        assert!(processor.require_tmdl_extension);
        assert!(processor.enable_performance_logging);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(3 * 1024 * 1024 + 512 * 1024), "3.5 MiB");
    }

    #[test]
    fn test_error_codes_are_registered() {
        let err = FileProcessorError::IoError {
            path: "Sales.tmdl".to_string(),
            message: "interrupted".to_string(),
        };
        assert_eq!(err.error_code(), codes::file_processing::IO_ERROR);
        assert_eq!(codes::get_category(err.error_code().as_str()), "FileProcessing");
        assert!(err.to_string().contains("Sales.tmdl"));
    }
}
