use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::layout::Location;

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(
    name = "dbt",
    version,
    about = "Maintain the directory layout for database change scripts"
)]
pub struct Cli {
    /// Config file applied after the global and personal ones.
    #[arg(short = 'f', long = "file", global = true)]
    pub file: Option<PathBuf>,
    /// Directory holding `db-tool-dir/`.
    #[arg(long = "base-dir", global = true)]
    pub base_dir: Option<PathBuf>,
    /// SQL client binary.
    #[arg(long = "psql", global = true)]
    pub psql: Option<String>,
    #[arg(long = "database", global = true)]
    pub database: Option<String>,
    #[arg(long = "schema", global = true)]
    pub schema: Option<String>,
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Report whether the layout for a database schema is complete.
    Check,
    /// Create whatever is missing from the layout for a database schema.
    Init,
    /// Print the path of a well-known location.
    Path(PathArgs),
    /// Run an SQL file through the configured client.
    Sql(SqlArgs),
    /// Configuration display and editing.
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommand>,
    },
}

#[derive(Args, Debug)]
pub struct PathArgs {
    #[arg(value_enum)]
    pub location: Location,
    #[arg(long = "release")]
    pub release: Option<String>,
}

#[derive(Args, Debug)]
pub struct SqlArgs {
    pub file: PathBuf,
    /// Print the command without running it.
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    Show,
    Path,
    Generate {
        #[arg()]
        path: Option<PathBuf>,
        #[arg(long = "force", default_value_t = false)]
        force: bool,
    },
    /// Record the base directory in the personal (or `--file`) config.
    SetBaseDir { dir: String },
}

/// Helper entry point so `main` can stay minimal.
pub fn parse() -> Cli {
    Cli::parse()
}
