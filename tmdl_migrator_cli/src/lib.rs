//! # TMDL Migrator CLI
//!
//! Argument parsing, command dispatch and terminal reports for `tmdl-migrate`.

pub mod cli;
pub mod commands;
pub mod report;

pub use cli::{Cli, Command};
