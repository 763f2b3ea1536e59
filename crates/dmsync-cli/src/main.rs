mod db;
mod sync;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "dmsync-cli")]
#[command(about = "Directus to Medusa product sync")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Reconcile every CMS product row against Medusa once
    Sync {
        /// Print the plan without creating products or recording links
        #[arg(long)]
        dry_run: bool,
    },
    /// Inspect CMS key to Medusa product links
    Links {
        #[command(subcommand)]
        command: LinksCommands,
    },
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
}

#[derive(Debug, Subcommand)]
enum LinksCommands {
    List,
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    Ping,
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("dmsync-cli: no command given; run with --help for usage");
        return Ok(());
    };

    let config = dmsync_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match command {
        Commands::Sync { dry_run } => sync::run_sync(&config, dry_run).await,
        Commands::Links {
            command: LinksCommands::List,
        } => db::run_links_list(&config).await,
        Commands::Db {
            command: DbCommands::Ping,
        } => db::run_ping(&config).await,
        Commands::Db {
            command: DbCommands::Migrate,
        } => db::run_migrate(&config).await,
    }
}
