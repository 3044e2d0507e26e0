//! Data models

mod activity;
mod sync;

pub use activity::{Activity, ActivityId, ActivityType, Recurrence, RecurrenceFrequency, SetRecord, TrackingFields};
pub use sync::{ActivityCollection, SyncableActivity, COLLECTION_SCHEMA_VERSION};
