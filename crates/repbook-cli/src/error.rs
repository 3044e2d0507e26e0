use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] repbook_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No activity name provided")]
    EmptyName,
    #[error("Invalid date: {0} (expected YYYY-MM-DD)")]
    InvalidDate(String),
    #[error("Activity not found for id/prefix: {0}")]
    ActivityNotFound(String),
    #[error("{0}")]
    AmbiguousActivityId(String),
    #[error(
        "Sync is not configured. Set REPBOOK_API_URL and REPBOOK_API_TOKEN to enable `repbook sync`."
    )]
    SyncNotConfigured,
}
