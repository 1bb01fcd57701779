mod api;
mod cli;
mod config;
mod db;
mod models;
mod services;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::cli::ExportFormat;
use crate::config::Config;

#[derive(Parser)]
#[command(name = "matchcast")]
#[command(about = "Today's and tomorrow's football fixtures with placeholder predictions")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server and the refresh scheduler
    Serve {
        /// Overrides PORT
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Run one fetch and predict cycle and print the result
    Refresh,
    /// Predict a single fixture
    Predict {
        #[arg(long)]
        home: String,
        #[arg(long)]
        away: String,
    },
    /// Show or clear the match cache
    Cache {
        #[arg(long)]
        clear: bool,
    },
    /// Export cached matches
    Export {
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,
        /// Output file; stdout when omitted
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Initialize the database
    InitDb,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables before anything reads them
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("matchcast=info,tower_http=info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match cli.command {
        Some(Commands::Serve { port }) => {
            if let Some(port) = port {
                config.port = port;
            }
            tracing::info!("Starting matchcast on {}", config.bind_addr());
            api::serve(config).await?;
        }
        Some(Commands::Refresh) => {
            cli::refresh_once(config).await?;
        }
        Some(Commands::Predict { home, away }) => {
            cli::predict(&config, &home, &away)?;
        }
        Some(Commands::Cache { clear }) => {
            cli::show_cache(&config, clear).await?;
        }
        Some(Commands::Export { format, out }) => {
            cli::export(&config, format, out.as_deref()).await?;
        }
        Some(Commands::InitDb) => {
            tracing::info!("Initializing database...");
            db::init_database(&config.database_url).await?;
        }
        None => {
            // Default to serving
            tracing::info!("Starting matchcast on {}", config.bind_addr());
            api::serve(config).await?;
        }
    }

    Ok(())
}
