//! Shared helpers for CLI commands

use std::env;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use repbook_core::error::{Error, Result as CoreResult};
use repbook_core::models::SyncableActivity;
use repbook_core::store::{ActivityStore, Database, SqliteActivityStore};
use repbook_core::sync::{
    HttpSyncTransport, PullResponse, PushRequest, PushResponse, SyncEngine, SyncTransport,
};
use repbook_core::Activity;

use crate::error::CliError;

const API_URL_ENV: &str = "REPBOOK_API_URL";
const API_TOKEN_ENV: &str = "REPBOOK_API_TOKEN";

/// Resolve the database path: explicit flag, else the platform data dir
pub fn resolve_db_path(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }

    dirs::data_dir()
        .map_or_else(|| PathBuf::from("."), |dir| dir.join("repbook"))
        .join("repbook.db")
}

/// Open the local database, creating parent directories as needed
pub fn open_database(path: &Path) -> CoreResult<Database> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Database::open(path)
}

/// Remote sync configuration resolved from the environment.
///
/// Local-only operation (no endpoint, no token) is a first-class mode: sync
/// paths become no-ops and mutations simply accumulate in the pending queue.
pub struct Remote {
    pub transport: CliTransport,
    token: Option<String>,
}

impl Remote {
    pub fn from_env() -> CoreResult<Self> {
        let base_url = non_empty_env(API_URL_ENV);
        let token = non_empty_env(API_TOKEN_ENV);

        let transport = match base_url {
            Some(url) => CliTransport::Http(HttpSyncTransport::new(url)?),
            None => CliTransport::Disabled,
        };
        Ok(Self { transport, token })
    }

    /// Token to hand the engine; `None` unless both endpoint and token exist
    pub fn token(&self) -> Option<&str> {
        if matches!(self.transport, CliTransport::Disabled) {
            return None;
        }
        self.token.as_deref()
    }

    pub const fn is_configured(&self) -> bool {
        matches!(self.transport, CliTransport::Http(_)) && self.token.is_some()
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Transport used by the CLI: real HTTP when an endpoint is configured,
/// otherwise a null transport that is never reached (the engine no-ops
/// without a token).
pub enum CliTransport {
    Http(HttpSyncTransport),
    Disabled,
}

#[async_trait]
impl SyncTransport for CliTransport {
    async fn pull(&self, token: &str, since: Option<&str>) -> CoreResult<PullResponse> {
        match self {
            Self::Http(transport) => transport.pull(token, since).await,
            Self::Disabled => Err(disabled_error()),
        }
    }

    async fn push(&self, token: &str, request: &PushRequest) -> CoreResult<PushResponse> {
        match self {
            Self::Http(transport) => transport.push(token, request).await,
            Self::Disabled => Err(disabled_error()),
        }
    }
}

fn disabled_error() -> Error {
    Error::InvalidInput("sync endpoint is not configured".to_string())
}

/// Build a sync engine over the given database connection
pub fn build_engine<'a>(
    db: &'a Database,
    remote: Remote,
) -> SyncEngine<SqliteActivityStore<'a>, CliTransport> {
    SyncEngine::new(SqliteActivityStore::new(db.connection()), remote.transport)
}

/// Find a single activity whose id matches the given prefix
pub fn resolve_activity(
    store: &impl ActivityStore,
    id_or_prefix: &str,
) -> Result<Activity, CliError> {
    let prefix = id_or_prefix.trim();
    if prefix.is_empty() {
        return Err(CliError::ActivityNotFound(id_or_prefix.to_string()));
    }

    let collection = store.load_activities().map_err(CliError::Core)?;
    let matches: Vec<&SyncableActivity> = collection
        .iter()
        .filter(|record| record.activity.id.as_str().starts_with(prefix))
        .collect();

    match matches.as_slice() {
        [] => Err(CliError::ActivityNotFound(prefix.to_string())),
        [record] => Ok(record.activity.clone()),
        many => Err(CliError::AmbiguousActivityId(format!(
            "Id prefix '{prefix}' matches {} activities; use a longer prefix",
            many.len()
        ))),
    }
}

/// Render activities as aligned terminal lines
pub fn format_activity_lines(activities: &[Activity]) -> Vec<String> {
    activities
        .iter()
        .map(|activity| {
            let marker = if activity.completed { "x" } else { " " };
            let short_id: String = activity.id.as_str().chars().take(8).collect();
            let emoji = if activity.emoji.is_empty() {
                String::new()
            } else {
                format!("{} ", activity.emoji)
            };
            format!(
                "[{marker}] {short_id}  {}  {emoji}{}",
                activity.date, activity.name
            )
        })
        .collect()
}
