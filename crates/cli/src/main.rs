mod commands;
mod config;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::{FileConfig, Settings};
use sediment_core::MigrationResult;

#[derive(Parser)]
#[command(name = "sediment")]
#[command(about = "PostgreSQL schema-migration runner", version)]
struct Cli {
    /// Directory containing migration files
    #[arg(long, short = 'd', global = true)]
    dir: Option<PathBuf>,

    /// PostgreSQL connection URL
    #[arg(long, short = 'u', global = true)]
    url: Option<String>,

    /// Ledger table name
    #[arg(long, short = 't', global = true)]
    table: Option<String>,

    /// TOML configuration file with dir/url/table keys
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new migration file
    Create {
        /// Migration name, appended to the timestamp prefix
        name: String,
    },

    /// Show the migration list
    List,

    /// Apply pending migrations
    Up,

    /// Roll back applied migrations
    Down,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> MigrationResult<()> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let settings = Settings::resolve(cli.dir, cli.url, cli.table, file)?;
    tracing::debug!(?settings, "resolved settings");

    match cli.command {
        Commands::Create { name } => commands::migrate::create(&settings, &name).await,
        Commands::List => commands::migrate::list(&settings).await,
        Commands::Up => commands::migrate::up(&settings).await,
        Commands::Down => commands::migrate::down(&settings).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }
}
