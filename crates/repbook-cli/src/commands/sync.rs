use std::path::Path;

use crate::commands::common::{build_engine, open_database, Remote};
use crate::error::CliError;

/// Run one full pull/merge/push cycle against the remote store
pub async fn run_sync(db_path: &Path) -> Result<(), CliError> {
    let remote = Remote::from_env()?;
    if !remote.is_configured() {
        return Err(CliError::SyncNotConfigured);
    }

    let db = open_database(db_path)?;
    let token = remote.token().map(ToString::to_string);
    let engine = build_engine(&db, remote);

    let mut visible_count = 0;
    let outcome = engine
        .run_cycle(token.as_deref(), |activities| {
            visible_count = activities.len();
        })
        .await;

    if outcome.pull_failed && outcome.push_failed {
        println!("Sync failed: server unreachable (changes kept for retry)");
    } else {
        println!(
            "Sync completed: pulled {}, pushed {}, {} activities",
            outcome.pulled, outcome.pushed, visible_count
        );
    }
    if outcome.pull_failed && !outcome.push_failed {
        println!("(pull failed; pushed local changes only)");
    }
    if !outcome.pull_failed && outcome.push_failed {
        println!("(push failed; queued changes kept for retry)");
    }
    if !outcome.conflicts.is_empty() {
        println!("Conflicts resolved by server: {}", outcome.conflicts.join(", "));
    }

    Ok(())
}
