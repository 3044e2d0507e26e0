//! repbook CLI - Offline-first workout log
//!
//! Every mutation is recorded locally first and propagated to the remote
//! store when connectivity allows.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use repbook_core::models::ActivityType;

mod commands;
mod error;

use commands::add::{run_add, AddArgs};
use commands::common::resolve_db_path;
use commands::delete::run_delete;
use commands::done::run_done;
use commands::list::run_list;
use commands::sync::run_sync;
use error::CliError;

#[derive(Parser)]
#[command(name = "repbook")]
#[command(about = "Track workouts from the command line")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Optional path to local database file
    #[arg(long, value_name = "PATH", global = true)]
    db_path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new activity
    #[command(alias = "new")]
    Add {
        /// Activity name
        name: String,
        /// Calendar date (YYYY-MM-DD, default today)
        #[arg(short, long)]
        date: Option<String>,
        /// Activity category
        #[arg(short = 't', long = "type", value_enum, default_value = "strength")]
        activity_type: CliActivityType,
        /// Display emoji
        #[arg(long)]
        emoji: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },
    /// List activities
    List {
        /// Number of activities to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle an activity's completed flag
    Done {
        /// Activity ID or unique ID prefix
        id: String,
    },
    /// Delete an activity
    Delete {
        /// Activity ID or unique ID prefix
        id: String,
    },
    /// Sync with the remote store
    Sync,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
enum CliActivityType {
    Strength,
    Cardio,
    Flexibility,
    Sport,
    Other,
}

impl From<CliActivityType> for ActivityType {
    fn from(value: CliActivityType) -> Self {
        match value {
            CliActivityType::Strength => Self::Strength,
            CliActivityType::Cardio => Self::Cardio,
            CliActivityType::Flexibility => Self::Flexibility,
            CliActivityType::Sport => Self::Sport,
            CliActivityType::Other => Self::Other,
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("repbook=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Add {
            name,
            date,
            activity_type,
            emoji,
            notes,
        } => {
            run_add(
                AddArgs {
                    name,
                    date,
                    activity_type: activity_type.into(),
                    emoji,
                    notes,
                },
                &db_path,
            )
            .await?;
        }
        Commands::List { limit, json } => run_list(limit, json, &db_path)?,
        Commands::Done { id } => run_done(&id, &db_path).await?,
        Commands::Delete { id } => run_delete(&id, &db_path).await?,
        Commands::Sync => run_sync(&db_path).await?,
    }

    Ok(())
}
