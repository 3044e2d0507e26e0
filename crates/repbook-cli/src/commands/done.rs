use std::path::Path;

use repbook_core::store::SqliteActivityStore;

use crate::commands::common::{build_engine, open_database, resolve_activity, Remote};
use crate::error::CliError;

/// Toggle the completed flag on an activity
pub async fn run_done(id_or_prefix: &str, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let mut activity = {
        let store = SqliteActivityStore::new(db.connection());
        resolve_activity(&store, id_or_prefix)?
    };
    activity.completed = !activity.completed;

    let remote = Remote::from_env()?;
    let token = remote.token().map(ToString::to_string);
    let engine = build_engine(&db, remote);

    let id = activity.id.clone();
    let completed = activity.completed;
    engine
        .push_local_mutation(token.as_deref(), activity, false)
        .await;

    println!("{id} {}", if completed { "done" } else { "not done" });
    Ok(())
}
