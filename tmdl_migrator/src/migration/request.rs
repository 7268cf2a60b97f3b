//! Migration request: the folder, connection target, file list and table mapping
//! for one run, built in code or loaded from a TOML file.

use crate::config::compile_time::rewrite::MAX_TABLE_NAME_LENGTH;
use crate::logging::codes::{self, Code};
use crate::rewrite::ConnectionTarget;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("Cannot read request file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid request file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Connection field '{field}' must not be empty")]
    EmptyConnectionField { field: &'static str },

    #[error("Invalid table name for {file}: {reason}")]
    InvalidTableName { file: String, reason: String },

    #[error("Invalid table mapping '{entry}': expected FILE=TABLE")]
    InvalidMappingEntry { entry: String },
}

impl RequestError {
    pub fn error_code(&self) -> Code {
        match self {
            Self::Read { .. } | Self::Parse { .. } | Self::InvalidMappingEntry { .. } => {
                codes::request::INVALID_REQUEST_FILE
            }
            Self::EmptyConnectionField { .. } => codes::request::EMPTY_CONNECTION_FIELD,
            Self::InvalidTableName { .. } => codes::request::INVALID_TABLE_NAME,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationRequest {
    /// Folder holding the table definition documents
    pub folder: PathBuf,
    pub server: String,
    pub database: String,
    /// Document names inside `folder`, in processing order; discovered when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
    /// Document name to target table overrides
    #[serde(default)]
    pub tables: BTreeMap<String, String>,
}

impl MigrationRequest {
    pub fn new(
        folder: impl Into<PathBuf>,
        server: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            folder: folder.into(),
            server: server.into(),
            database: database.into(),
            files: None,
            tables: BTreeMap::new(),
        }
    }

    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = Some(files);
        self
    }

    pub fn with_table(mut self, file: impl Into<String>, table: impl Into<String>) -> Self {
        self.tables.insert(file.into(), table.into());
        self
    }

    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, RequestError> {
        let request: Self = toml::from_str(content).map_err(|source| RequestError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        request.validate()?;
        Ok(request)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, RequestError> {
        let content = std::fs::read_to_string(path).map_err(|source| RequestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Parse `FILE=TABLE` overrides as given on the command line
    pub fn parse_mapping_entry(entry: &str) -> Result<(String, String), RequestError> {
        match entry.split_once('=') {
            Some((file, table)) if !file.trim().is_empty() => {
                Ok((file.trim().to_string(), table.trim().to_string()))
            }
            _ => Err(RequestError::InvalidMappingEntry {
                entry: entry.to_string(),
            }),
        }
    }

    pub fn validate(&self) -> Result<(), RequestError> {
        if self.server.trim().is_empty() {
            return Err(RequestError::EmptyConnectionField { field: "server" });
        }
        if self.database.trim().is_empty() {
            return Err(RequestError::EmptyConnectionField { field: "database" });
        }

        for (file, table) in &self.tables {
            validate_table_name(file, table)?;
        }

        Ok(())
    }

    pub fn connection_target(&self) -> ConnectionTarget {
        ConnectionTarget::new(self.server.clone(), self.database.clone())
    }

    /// Target table for a document: the override, else the file stem
    pub fn table_name_for(&self, file: &str) -> String {
        self.tables
            .get(file)
            .cloned()
            .unwrap_or_else(|| default_table_name(file))
    }
}

/// Document name without its extension
pub fn default_table_name(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}

fn validate_table_name(file: &str, table: &str) -> Result<(), RequestError> {
    if table.trim().is_empty() {
        return Err(RequestError::InvalidTableName {
            file: file.to_string(),
            reason: "table name is empty".to_string(),
        });
    }

    if table.len() > MAX_TABLE_NAME_LENGTH {
        return Err(RequestError::InvalidTableName {
            file: file.to_string(),
            reason: format!(
                "{} bytes exceeds limit of {}",
                table.len(),
                MAX_TABLE_NAME_LENGTH
            ),
        });
    }

    Ok(())
}
