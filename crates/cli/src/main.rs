//! Delicious CLI - Database migrations, seeding and store reports.
//!
//! # Usage
//!
//! ```bash
//! # Create the schema
//! delicious migrate
//!
//! # Load users, stores and reviews from a seed file
//! delicious seed crates/cli/seeds/stores.yaml
//!
//! # Reports (JSON on stdout)
//! delicious tags
//! delicious top
//! delicious search "coffee bagels" --limit 3
//! delicious nearby --lng -79.38 --lat 43.65 --max-distance 2500
//! delicious show cafe-soul
//!
//! # Same seed file against an in-memory backend, no database needed
//! delicious demo crates/cli/seeds/stores.yaml
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `seed` - Seed the database from a YAML (or JSON) file
//! - `tags`, `top`, `search`, `nearby`, `show` - Query stores
//! - `demo` - Seed an in-memory backend and print the tag and top-store reports
//!
//! Logging goes to stderr and is filtered by `RUST_LOG`
//! (default: `delicious_cli=info,delicious_stores=info`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

const DEFAULT_LOG_FILTER: &str = "delicious_cli=info,delicious_stores=info";

#[derive(Parser)]
#[command(name = "delicious")]
#[command(author, version, about = "Delicious store directory tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database with users, stores and reviews
    Seed {
        /// Path to the seed file
        path: String,
    },
    /// Print how many stores carry each tag
    Tags,
    /// Print the best-rated stores (at least two reviews)
    Top,
    /// Keyword search over store names and descriptions
    Search {
        /// Search terms
        query: String,

        /// Maximum number of results (default: 5)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Stores near a point, nearest first
    Nearby {
        /// Longitude of the origin
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,

        /// Latitude of the origin
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        /// Search radius in meters (default: 10000)
        #[arg(short, long)]
        max_distance: Option<f64>,

        /// Maximum number of results (default: 10)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Print one store with its reviews
    Show {
        /// Store slug
        slug: String,
    },
    /// Seed an in-memory backend and print the reports
    Demo {
        /// Path to the seed file
        path: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
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
        Commands::Seed { path } => commands::seed::from_file(&path).await?,
        Commands::Tags => commands::report::tags(&commands::connect().await?).await?,
        Commands::Top => commands::report::top(&commands::connect().await?).await?,
        Commands::Search { query, limit } => {
            commands::report::search(&commands::connect().await?, &query, limit).await?;
        }
        Commands::Nearby {
            lng,
            lat,
            max_distance,
            limit,
        } => {
            commands::report::nearby(&commands::connect().await?, lng, lat, max_distance, limit)
                .await?;
        }
        Commands::Show { slug } => {
            commands::report::show(&commands::connect().await?, &slug).await?;
        }
        Commands::Demo { path } => commands::seed::demo(&path).await?,
    }
    Ok(())
}
