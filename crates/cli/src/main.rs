//! Foodcart CLI - database migrations and dispatch tools.
//!
//! # Usage
//!
//! ```bash
//! # Run dispatch database migrations
//! fc-cli migrate
//!
//! # Print the dispatch board for active orders
//! fc-cli match
//!
//! # Print the dispatch board for a JSON snapshot
//! fc-cli match --snapshot snapshot.json
//!
//! # Geocode addresses through the cache
//! fc-cli geocode "Moscow, Tverskaya 1"
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `match` - Run one matching pass and print the result as JSON
//! - `geocode` - Resolve addresses to coordinates

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "fc-cli")]
#[command(author, version, about = "Foodcart dispatch CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Match active orders to restaurants and print the dispatch board
    Match {
        /// Read records from a JSON snapshot instead of the database
        #[arg(short, long)]
        snapshot: Option<PathBuf>,
    },
    /// Resolve addresses to coordinates
    Geocode {
        /// Addresses to resolve
        #[arg(required = true)]
        addresses: Vec<String>,

        /// Keep results in memory instead of the locations table
        #[arg(long)]
        no_store: bool,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output can be piped
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "foodcart_cli=info,foodcart_dispatch=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Match { snapshot } => commands::matching::run(snapshot.as_deref()).await?,
        Commands::Geocode {
            addresses,
            no_store,
        } => commands::geocode::run(&addresses, no_store).await?,
    }
    Ok(())
}
