//! One module per subcommand; each returns whether the run should exit non-zero

mod discover;
mod migrate;
mod preview;

pub use discover::run_discover;
pub use migrate::{build_request, run_migrate};
pub use preview::run_preview;

use crate::cli::{Cli, Command};

pub type CommandResult = Result<bool, Box<dyn std::error::Error>>;

pub fn run(cli: Cli) -> CommandResult {
    match cli.command {
        Command::Migrate(args) => run_migrate(&args),
        Command::Discover {
            folder,
            recursive,
            json,
        } => run_discover(&folder, recursive, json),
        Command::Preview {
            file,
            server,
            database,
            table,
        } => run_preview(&file, &server, &database, table.as_deref()),
    }
}
