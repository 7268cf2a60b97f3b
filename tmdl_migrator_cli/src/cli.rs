use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Repoint flat-file table partitions at a SQL database
#[derive(Parser, Debug)]
#[command(name = "tmdl-migrate")]
#[command(about = "Repoint flat-file table partitions at a SQL database", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Migrate the documents of a table folder in place, keeping .backup copies
    Migrate(MigrateArgs),

    /// List documents that carry a partition marker
    Discover {
        /// Folder holding the table definition documents
        #[arg(long)]
        folder: PathBuf,

        /// Descend into subfolders
        #[arg(long)]
        recursive: bool,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the migrated text of one document without writing it
    Preview {
        /// Document to preview
        file: PathBuf,

        #[arg(long)]
        server: String,

        #[arg(long)]
        database: String,

        /// Target table (default: the file stem)
        #[arg(long)]
        table: Option<String>,
    },
}

#[derive(Args, Debug, Default)]
pub struct MigrateArgs {
    /// Folder holding the table definition documents
    #[arg(long)]
    pub folder: Option<PathBuf>,

    #[arg(long)]
    pub server: Option<String>,

    #[arg(long)]
    pub database: Option<String>,

    /// Document to migrate, in order (default: every eligible document)
    #[arg(long = "file", value_name = "FILE")]
    pub files: Vec<String>,

    /// Target table override for one document
    #[arg(long = "map", value_name = "FILE=TABLE")]
    pub mappings: Vec<String>,

    /// TOML request file; other flags override its values
    #[arg(long, value_name = "FILE")]
    pub request: Option<PathBuf>,

    /// Worker threads (0 uses every core)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Descend into subfolders when discovering documents
    #[arg(long)]
    pub recursive: bool,

    /// Print the run report as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_migrate_flags() {
        let cli = Cli::try_parse_from([
            "tmdl-migrate",
            "migrate",
            "--folder",
            "tables",
            "--server",
            "srv",
            "--database",
            "db",
            "--map",
            "Sales.tmdl=FactSales",
            "--map",
            "Orders.tmdl=FactOrders",
            "--threads",
            "4",
            "--json",
        ])
        .unwrap();

        let Command::Migrate(args) = cli.command else {
            panic!("expected migrate");
        };
        assert_eq!(args.folder, Some(PathBuf::from("tables")));
        assert_eq!(args.mappings.len(), 2);
        assert_eq!(args.threads, Some(4));
        assert!(args.json);
        assert!(!args.recursive);
    }

    #[test]
    fn preview_requires_connection() {
        assert!(Cli::try_parse_from(["tmdl-migrate", "preview", "Sales.tmdl"]).is_err());

        let cli = Cli::try_parse_from([
            "tmdl-migrate",
            "preview",
            "Sales.tmdl",
            "--server",
            "s",
            "--database",
            "d",
        ])
        .unwrap();
        assert!(matches!(cli.command, Command::Preview { table: None, .. }));
    }
}
