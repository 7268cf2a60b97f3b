//! # TMDL Migrator
//!
//! Rewrites the `source =` block of TMDL table definition documents so that a
//! partition reading a CSV file or workbook reads the same table from a SQL
//! database instead. Everything outside the block is left byte-for-byte intact.

#[macro_use]
pub mod logging;

pub mod batch;
pub mod config;
pub mod document;
pub mod file_processor;
pub mod migration;
pub mod pipeline;
pub mod rewrite;
pub mod scanner;

// Re-export key types for library consumers
pub use batch::{run_migration, BatchConfig, BatchError, BatchResults};
pub use migration::{migrate_document, FileReport, MigrationRequest, RewriteStatus};
pub use pipeline::{PipelineError, PipelineResult};
pub use rewrite::{rewrite_block, ConnectionTarget};
