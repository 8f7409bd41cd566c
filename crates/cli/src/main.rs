//! Tipsy Tank CLI - session migrations and catalog tools.
//!
//! # Usage
//!
//! ```bash
//! # Create the sessions table
//! tipsy-cli migrate
//!
//! # Load the product catalog into the hosted entity store
//! tipsy-cli seed products --file crates/storefront/content/products.yaml
//!
//! # List products the storefront would show
//! tipsy-cli products list --category kits
//! ```
//!
//! # Commands
//!
//! - `migrate` - Create the `tower-sessions` table in `PostgreSQL`
//! - `seed products` - Create catalog products that don't exist yet
//! - `products list` - Print the catalog from the configured entity store

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "tipsy-cli")]
#[command(author, version, about = "Tipsy Tank CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the session store table
    Migrate,
    /// Seed the entity store
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Inspect catalog products
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Create catalog products from a YAML file (existing slugs are skipped)
    Products {
        /// Catalog YAML file
        #[arg(
            short,
            long,
            env = "ENTITY_SEED_FILE",
            default_value = "crates/storefront/content/products.yaml"
        )]
        file: PathBuf,

        /// Parse and validate the file without writing anything
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
enum ProductsAction {
    /// List products, optionally limited to one category
    List {
        /// Category tag (`kits`, `extensions`, `bundles`); `all` for everything
        #[arg(short, long)]
        category: Option<String>,
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
        Commands::Migrate => commands::migrate::sessions().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Products { file, dry_run } => {
                commands::seed::products(&file, dry_run).await?;
            }
        },
        Commands::Products { action } => match action {
            ProductsAction::List { category } => {
                commands::products::list(category.as_deref()).await?;
            }
        },
    }
    Ok(())
}
