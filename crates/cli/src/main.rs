//! Perim CLI - Database migrations and maintenance tools.
//!
//! # Usage
//!
//! ```bash
//! # Apply pending database migrations
//! perim-cli migrate
//!
//! # Load demo customers, addresses, deliverers and deliveries
//! perim-cli seed
//!
//! # Check a CPF without touching the database
//! perim-cli tax-id check 111.444.777-35
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the database with demo data
//! - `tax-id check` - Validate a tax id

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "perim-cli")]
#[command(author, version, about = "Perim deliveries CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with demo data
    Seed,
    /// Tax id (CPF) utilities
    TaxId {
        #[command(subcommand)]
        action: TaxIdAction,
    },
}

#[derive(Subcommand)]
enum TaxIdAction {
    /// Validate a CPF, with or without separators
    Check {
        /// The tax id to check
        value: String,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

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
        Commands::Seed => commands::seed::run().await?,
        Commands::TaxId { action } => match action {
            TaxIdAction::Check { value } => commands::tax_id::check(&value)?,
        },
    }
    Ok(())
}
