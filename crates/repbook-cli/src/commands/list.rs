use std::path::Path;

use repbook_core::store::{ActivityStore, SqliteActivityStore};
use repbook_core::Activity;
use serde::Serialize;

use crate::commands::common::{format_activity_lines, open_database};
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct ActivityListItem {
    id: String,
    date: String,
    #[serde(rename = "type")]
    activity_type: String,
    name: String,
    emoji: String,
    completed: bool,
    sets: usize,
}

fn to_list_item(activity: &Activity) -> ActivityListItem {
    ActivityListItem {
        id: activity.id.to_string(),
        date: activity.date.to_string(),
        activity_type: format!("{:?}", activity.activity_type).to_lowercase(),
        name: activity.name.clone(),
        emoji: activity.emoji.clone(),
        completed: activity.completed,
        sets: activity.sets.len(),
    }
}

pub fn run_list(limit: usize, as_json: bool, db_path: &Path) -> Result<(), CliError> {
    let db = open_database(db_path)?;
    let store = SqliteActivityStore::new(db.connection());

    let mut activities: Vec<Activity> = store
        .load_activities()?
        .into_iter()
        .filter(|record| !record.is_deleted())
        .map(|record| record.activity)
        .collect();
    // Newest scheduled first
    activities.sort_by(|a, b| b.date.cmp(&a.date));
    activities.truncate(limit);

    if as_json {
        let items: Vec<ActivityListItem> = activities.iter().map(to_list_item).collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
    } else if activities.is_empty() {
        println!("No activities recorded.");
    } else {
        for line in format_activity_lines(&activities) {
            println!("{line}");
        }
    }

    Ok(())
}
