use super::CommandResult;
use std::path::Path;
use tmdl_migrator::config::runtime::FileProcessorPreferences;
use tmdl_migrator::file_processor::FileProcessor;
use tmdl_migrator::migration::{default_table_name, MigrationRequest};
use tmdl_migrator::pipeline;

/// Migrated text goes to stdout, the status line to stderr
pub fn run_preview(file: &Path, server: &str, database: &str, table: Option<&str>) -> CommandResult {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let table = table.map(str::to_string).unwrap_or_else(|| default_table_name(&name));

    let folder = file.parent().unwrap_or_else(|| Path::new("."));
    let request = MigrationRequest::new(folder, server, database).with_table(&name, &table);
    request.validate()?;

    let processor = FileProcessor::from_preferences(&FileProcessorPreferences::default());
    let (text, status, shape) =
        pipeline::preview_file(&processor, file, &request.connection_target(), &table)?;

    print!("{}", text);
    match shape {
        Some(shape) => eprintln!("{}: {} ({})", file.display(), status, shape),
        None => eprintln!("{}: {}", file.display(), status),
    }

    Ok(false)
}
