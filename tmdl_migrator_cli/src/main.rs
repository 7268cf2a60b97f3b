//! # TMDL Migrator CLI
//!

use clap::Parser;
use tmdl_migrator::{log_info, logging, pipeline};
use tmdl_migrator_cli::{commands, Cli};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    logging::init_global_logging()?;
    pipeline::validate_pipeline()?;

    let cli = Cli::parse();
    log_info!("tmdl-migrate starting", "version" => env!("CARGO_PKG_VERSION"));

    let had_errors = commands::run(cli);
    logging::print_cargo_style_summary();

    if had_errors? {
        std::process::exit(1);
    }

    Ok(())
}
