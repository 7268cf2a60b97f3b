//! Document reading under the build profile's limits

mod processor;

pub use processor::{FileProcessingResult, FileProcessor, FileProcessorError};

/// Check that every file processing code has registry metadata
pub fn init_file_processor_logging() -> Result<(), String> {
    use crate::logging::codes::{self, file_processing};

    let required = [
        file_processing::FILE_NOT_FOUND,
        file_processing::INVALID_EXTENSION,
        file_processing::FILE_TOO_LARGE,
        file_processing::PERMISSION_DENIED,
        file_processing::INVALID_ENCODING,
        file_processing::IO_ERROR,
        file_processing::INVALID_PATH,
    ];

    match required
        .iter()
        .find(|code| codes::get_error_metadata(code.as_str()).is_none())
    {
        Some(code) => Err(format!("File processing code {} is not registered", code)),
        None => Ok(()),
    }
}
