use super::CommandResult;
use crate::cli::MigrateArgs;
use crate::report;
use tmdl_migrator::batch::{self, BatchConfig};
use tmdl_migrator::migration::MigrationRequest;

/// Request file first, then flags on top of it
pub fn build_request(args: &MigrateArgs) -> Result<MigrationRequest, Box<dyn std::error::Error>> {
    let mut request = match &args.request {
        Some(path) => {
            log::info!("Loading request from {}", path.display());
            MigrationRequest::from_toml_file(path)?
        }
        None => MigrationRequest::new(
            args.folder
                .clone()
                .ok_or("--folder is required without --request")?,
            args.server
                .clone()
                .ok_or("--server is required without --request")?,
            args.database
                .clone()
                .ok_or("--database is required without --request")?,
        ),
    };

    if let Some(folder) = &args.folder {
        request.folder = folder.clone();
    }
    if let Some(server) = &args.server {
        request.server = server.clone();
    }
    if let Some(database) = &args.database {
        request.database = database.clone();
    }
    if !args.files.is_empty() {
        request.files = Some(args.files.clone());
    }
    for entry in &args.mappings {
        let (file, table) = MigrationRequest::parse_mapping_entry(entry)?;
        request.tables.insert(file, table);
    }

    request.validate()?;
    Ok(request)
}

fn batch_config(args: &MigrateArgs) -> BatchConfig {
    let mut config = BatchConfig::default().with_recursive(args.recursive);

    match args.threads {
        Some(0) => config = config.with_threads(num_cpus::get()),
        Some(n) => config = config.with_threads(n),
        None => {}
    }

    config.with_progress_callback(|progress| {
        log::debug!(
            "{}/{} {} -> {}",
            progress.completed,
            progress.total,
            progress.report.file,
            progress.report.status
        );
    })
}

pub fn run_migrate(args: &MigrateArgs) -> CommandResult {
    let request = build_request(args)?;
    let config = batch_config(args);
    log::debug!("Batch configuration: {:?}", config);

    let results = batch::run_migration(&request, &config)?;

    if args.json {
        println!("{}", results.to_json()?);
    } else {
        print!("{}", report::format_results(&results));
    }

    Ok(results.has_errors())
}
