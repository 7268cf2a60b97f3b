use super::CommandResult;
use crate::report;
use std::path::Path;
use tmdl_migrator::batch;

pub fn run_discover(folder: &Path, recursive: bool, json: bool) -> CommandResult {
    let documents = batch::discover_documents(folder, recursive)?;
    log::info!("{} eligible documents in {}", documents.len(), folder.display());

    if json {
        println!("{}", serde_json::to_string_pretty(&documents)?);
    } else {
        print!("{}", report::format_discovery(&documents));
    }

    Ok(false)
}
