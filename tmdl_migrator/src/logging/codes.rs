//! Consolidated error codes and classification system
//!
//! Single source of truth for all codes emitted by the migrator, their metadata,
//! and the classification helpers used by events and the collector.

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// CODE WRAPPER TYPE
// ============================================================================

/// Universal code wrapper for both error and success codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code(&'static str);

impl Code {
    pub const fn new(code: &'static str) -> Self {
        Self(code)
    }

    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Code {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ERROR CLASSIFICATION TYPES
// ============================================================================

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Critical = 0,
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
            Severity::Low => "Low",
        }
    }
}

/// Complete metadata for a code
#[derive(Debug, Clone)]
pub struct ErrorMetadata {
    pub code: &'static str,
    pub category: &'static str,
    pub severity: Severity,
    pub recoverable: bool,
    pub description: &'static str,
    pub recommended_action: &'static str,
}

impl ErrorMetadata {
    pub fn new(
        code: &'static str,
        category: &'static str,
        severity: Severity,
        recoverable: bool,
        description: &'static str,
        recommended_action: &'static str,
    ) -> Self {
        Self {
            code,
            category,
            severity,
            recoverable,
            description,
            recommended_action,
        }
    }
}

// ============================================================================
// CODE CONSTANTS
// ============================================================================

/// Logging system codes
pub mod system {
    use super::Code;

    pub const EVENTS_DROPPED: Code = Code::new("W001");
}

/// File processing error codes
pub mod file_processing {
    use super::Code;

    pub const FILE_NOT_FOUND: Code = Code::new("E005");
    pub const INVALID_EXTENSION: Code = Code::new("E006");
    pub const FILE_TOO_LARGE: Code = Code::new("E007");
    pub const PERMISSION_DENIED: Code = Code::new("E009");
    pub const INVALID_ENCODING: Code = Code::new("E010");
    pub const IO_ERROR: Code = Code::new("E011");
    pub const INVALID_PATH: Code = Code::new("E012");
}

/// Document structure codes (partition gate, source block)
pub mod document {
    use super::Code;

    pub const NO_PARTITION_MARKER: Code = Code::new("W020");
    pub const NO_SOURCE_BLOCK: Code = Code::new("W021");
}

/// Block rewrite codes
pub mod rewrite {
    use super::Code;

    pub const UNBOUNDED_CALL: Code = Code::new("W030");
    pub const TOO_MANY_CALL_SITES: Code = Code::new("W031");
    pub const UNRECOGNIZED_SHAPE: Code = Code::new("W032");
}

/// Backup and overwrite codes
pub mod write {
    use super::Code;

    pub const BACKUP_FAILED: Code = Code::new("E040");
    pub const OVERWRITE_FAILED: Code = Code::new("E041");
}

/// Batch orchestration codes
pub mod batch {
    use super::Code;

    pub const DIRECTORY_NOT_FOUND: Code = Code::new("E050");
    pub const NO_FILES_FOUND: Code = Code::new("E051");
    pub const TOO_MANY_FILES: Code = Code::new("E052");
    pub const WORKER_FAILURE: Code = Code::new("E053");
    pub const DUPLICATE_FILE: Code = Code::new("W054");
}

/// Migration request codes
pub mod request {
    use super::Code;

    pub const INVALID_REQUEST_FILE: Code = Code::new("E060");
    pub const EMPTY_CONNECTION_FIELD: Code = Code::new("E061");
    pub const INVALID_TABLE_NAME: Code = Code::new("E062");
}

/// Success codes
pub mod success {
    use super::Code;

    pub const OPERATION_COMPLETED_SUCCESSFULLY: Code = Code::new("I001");
    pub const SYSTEM_INITIALIZATION_COMPLETED: Code = Code::new("I004");

    pub const FILE_READ_COMPLETE: Code = Code::new("I006");
    pub const DISCOVERY_COMPLETE: Code = Code::new("I007");

    pub const BLOCK_REWRITTEN: Code = Code::new("I030");
    pub const HEADER_STEP_SPLICED: Code = Code::new("I031");

    pub const BACKUP_WRITTEN: Code = Code::new("I040");
    pub const DOCUMENT_MIGRATED: Code = Code::new("I041");
}

// ============================================================================
// METADATA REGISTRY
// ============================================================================

static ERROR_REGISTRY: OnceLock<HashMap<&'static str, ErrorMetadata>> = OnceLock::new();

fn get_error_registry() -> &'static HashMap<&'static str, ErrorMetadata> {
    ERROR_REGISTRY.get_or_init(|| {
        let entries = [
            // System
            ErrorMetadata::new(
                "W001",
                "System",
                Severity::Low,
                true,
                "Event limit reached for one document; later events dropped",
                "Raise max_log_events_per_file in the build profile",
            ),
            // File processing
            ErrorMetadata::new(
                "E005",
                "FileProcessing",
                Severity::High,
                true,
                "Document not found",
                "Verify the folder path and file list",
            ),
            ErrorMetadata::new(
                "E006",
                "FileProcessing",
                Severity::Medium,
                true,
                "Document does not carry the .tmdl extension",
                "Rename the file or unset TMDL_REQUIRE_TMDL_EXTENSION",
            ),
            ErrorMetadata::new(
                "E007",
                "FileProcessing",
                Severity::High,
                true,
                "Document exceeds the configured size or line limit",
                "Split the table definition or raise the build profile limits",
            ),
            ErrorMetadata::new(
                "E009",
                "FileProcessing",
                Severity::High,
                true,
                "Permission denied reading document",
                "Check file permissions",
            ),
            ErrorMetadata::new(
                "E010",
                "FileProcessing",
                Severity::High,
                true,
                "Document is not valid UTF-8",
                "Re-save the document as UTF-8",
            ),
            ErrorMetadata::new(
                "E011",
                "FileProcessing",
                Severity::High,
                true,
                "I/O error while reading document",
                "Retry; check disk health and file locks",
            ),
            ErrorMetadata::new(
                "E012",
                "FileProcessing",
                Severity::Medium,
                true,
                "Invalid document path",
                "Provide a path to a regular file",
            ),
            // Document structure
            ErrorMetadata::new(
                "W020",
                "Document",
                Severity::Low,
                true,
                "No `partition <name> = m` line; document left untouched",
                "No action needed unless the table should be migrated",
            ),
            ErrorMetadata::new(
                "W021",
                "Document",
                Severity::Low,
                true,
                "Partition present but no `source =` block found",
                "Check the partition definition",
            ),
            // Rewrite
            ErrorMetadata::new(
                "W030",
                "Rewrite",
                Severity::Medium,
                true,
                "Flat-file call has no matching closing parenthesis; site left unmodified",
                "Inspect the source expression for unbalanced quotes or parentheses",
            ),
            ErrorMetadata::new(
                "W031",
                "Rewrite",
                Severity::Medium,
                true,
                "Too many flat-file call sites in one block; extra sites left unmodified",
                "Raise max_call_sites_per_block in the build profile",
            ),
            ErrorMetadata::new(
                "W032",
                "Rewrite",
                Severity::Low,
                true,
                "Source block shape not recognized; block left unchanged",
                "Migrate this table by hand",
            ),
            // Write
            ErrorMetadata::new(
                "E040",
                "Write",
                Severity::High,
                true,
                "Could not write backup copy; original left untouched",
                "Check write permissions on the folder",
            ),
            ErrorMetadata::new(
                "E041",
                "Write",
                Severity::Critical,
                true,
                "Could not overwrite document after backup",
                "Restore from the .backup file if the document is damaged",
            ),
            // Batch
            ErrorMetadata::new(
                "E050",
                "Batch",
                Severity::High,
                true,
                "Table folder not found",
                "Verify the folder path",
            ),
            ErrorMetadata::new(
                "E051",
                "Batch",
                Severity::Medium,
                true,
                "No .tmdl documents found",
                "Point the migrator at the definition/tables folder",
            ),
            ErrorMetadata::new(
                "E052",
                "Batch",
                Severity::Medium,
                true,
                "Too many documents for a single batch",
                "Run the migration on smaller folders",
            ),
            ErrorMetadata::new(
                "E053",
                "Batch",
                Severity::Critical,
                false,
                "A worker thread failed during processing",
                "Re-run sequentially with --threads 1",
            ),
            ErrorMetadata::new(
                "W054",
                "Batch",
                Severity::Low,
                true,
                "Document listed more than once; processed once",
                "Remove duplicates from the file list",
            ),
            // Request
            ErrorMetadata::new(
                "E060",
                "Request",
                Severity::High,
                true,
                "Migration request file could not be read or parsed",
                "Check the TOML syntax of the request file",
            ),
            ErrorMetadata::new(
                "E061",
                "Request",
                Severity::High,
                true,
                "Server or database identifier is empty",
                "Provide both --server and --database",
            ),
            ErrorMetadata::new(
                "E062",
                "Request",
                Severity::Medium,
                true,
                "Target table name is empty or too long",
                "Fix the table mapping entry",
            ),
        ];

        entries
            .into_iter()
            .map(|metadata| (metadata.code, metadata))
            .collect()
    })
}

// ============================================================================
// CLASSIFICATION FUNCTIONS
// ============================================================================

/// Get metadata for a specific code
pub fn get_error_metadata(code: &str) -> Option<&'static ErrorMetadata> {
    get_error_registry().get(code)
}

/// Get severity from code
pub fn get_severity(code: &str) -> Severity {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.severity)
        .unwrap_or(Severity::Medium)
}

/// Check if error is recoverable
pub fn is_recoverable(code: &str) -> bool {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.recoverable)
        .unwrap_or(true)
}

/// Get category from code
pub fn get_category(code: &str) -> &'static str {
    get_error_registry()
        .get(code)
        .map(|metadata| metadata.category)
        .unwrap_or("Unknown")
}
