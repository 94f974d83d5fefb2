//! Telco churn pipeline
//!
//! Derives the customer feature mart, trains a churn classifier, and writes
//! run metadata and per-customer scores to the feature store.

use std::path::PathBuf;

use anyhow::Result;
use churn_pipeline::commands::{self, init_device, train::DEFAULT_MODEL_NAME};
use clap::{Parser, Subcommand};
use config::Config;
use database::{FeatureStore, PgFeatureStore, create_pool, run_migrations};
use ml_model::TrainingConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Telco churn pipeline
#[derive(Parser)]
#[command(name = "churn-pipeline")]
#[command(about = "Feature mart, churn classifier, and scoring for Telco customers")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run ingest and training in memory, without a database
    Local {
        /// Raw export to read
        #[arg(short, long)]
        file: PathBuf,

        /// Name recorded with the run and its scores
        #[arg(short, long, default_value = DEFAULT_MODEL_NAME)]
        model_name: String,
    },

    #[command(flatten)]
    Store(StoreCommand),
}

/// Commands that run against the database.
#[derive(Subcommand)]
enum StoreCommand {
    /// Run database migrations
    Migrate,

    /// Derive the feature mart from a raw export and replace the stored table
    Ingest {
        /// Raw export to read (defaults to `CHURN_DATA_PATH`)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Train on the stored mart, record the run, and score every customer
    Train {
        /// Name recorded with the run and its scores
        #[arg(short, long, default_value = DEFAULT_MODEL_NAME)]
        model_name: String,
    },

    /// Report data quality of the stored mart
    Quality,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing subscriber
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });

    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Local { file, model_name } => {
            let device = init_device();
            let outcome =
                commands::local::run(&file, &model_name, &TrainingConfig::default(), &device)
                    .await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Commands::Store(command) => {
            let config = Config::from_env()?;
            let store = PgFeatureStore::new(create_pool(&config).await?);

            let result = run_store_command(&store, command, &config).await;

            store.close().await;
            result?;
        }
    }

    Ok(())
}

/// Runs a command that needs the database. The caller closes the store.
async fn run_store_command(
    store: &PgFeatureStore,
    command: StoreCommand,
    config: &Config,
) -> Result<()> {
    match command {
        StoreCommand::Migrate => {
            run_migrations(store.pool()).await?;
            info!("Migrations completed successfully");
        }
        StoreCommand::Ingest { file } => {
            let path = file.unwrap_or_else(|| config.data_path.clone());
            commands::ingest::run(store, &path).await?;
        }
        StoreCommand::Train { model_name } => {
            let device = init_device();
            let outcome =
                commands::train::run(store, &model_name, &TrainingConfig::default(), &device)
                    .await?;
            info!(run_id = %outcome.run_id, scored = outcome.scored_rows, "Training run complete");
        }
        StoreCommand::Quality => {
            commands::quality::run(store).await?;
        }
    }

    Ok(())
}
