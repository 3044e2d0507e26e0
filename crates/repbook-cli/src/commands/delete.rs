use std::path::Path;

use repbook_core::store::SqliteActivityStore;

use crate::commands::common::{build_engine, open_database, resolve_activity, Remote};
use crate::error::CliError;

/// Delete an activity (a tombstone propagates the deletion to peers)
pub async fn run_delete(id_or_prefix: &str, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let activity = {
        let store = SqliteActivityStore::new(db.connection());
        resolve_activity(&store, id_or_prefix)?
    };

    let remote = Remote::from_env()?;
    let token = remote.token().map(ToString::to_string);
    let engine = build_engine(&db, remote);

    let id = activity.id.clone();
    engine
        .push_local_mutation(token.as_deref(), activity, true)
        .await;

    println!("{id}");
    Ok(())
}
