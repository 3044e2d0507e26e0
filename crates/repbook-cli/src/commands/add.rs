use std::path::Path;

use chrono::{Local, NaiveDate};
use repbook_core::models::ActivityType;
use repbook_core::sync::PushDisposition;
use repbook_core::Activity;

use crate::commands::common::{build_engine, open_database, Remote};
use crate::error::CliError;

pub struct AddArgs {
    pub name: String,
    pub date: Option<String>,
    pub activity_type: ActivityType,
    pub emoji: Option<String>,
    pub notes: Option<String>,
}

pub async fn run_add(args: AddArgs, db_path: &Path) -> Result<(), CliError> {
    let name = args.name.trim();
    if name.is_empty() {
        return Err(CliError::EmptyName);
    }

    let date = match args.date {
        Some(raw) => raw
            .parse::<NaiveDate>()
            .map_err(|_| CliError::InvalidDate(raw))?,
        None => Local::now().date_naive(),
    };

    let mut activity = Activity::new(name, date, args.activity_type);
    if let Some(emoji) = args.emoji {
        activity.emoji = emoji;
    }
    activity.notes = args
        .notes
        .map(|notes| notes.trim().to_string())
        .filter(|notes| !notes.is_empty());

    let db = open_database(db_path)?;
    let remote = Remote::from_env()?;
    let token = remote.token().map(ToString::to_string);
    let engine = build_engine(&db, remote);

    let id = activity.id.clone();
    let disposition = engine
        .push_local_mutation(token.as_deref(), activity, false)
        .await;

    println!("{id}");
    if disposition == PushDisposition::Queued && token.is_some() {
        println!("(queued: server unreachable, will retry on next sync)");
    }
    Ok(())
}
