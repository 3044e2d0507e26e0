//! Sync-boundary extensions of the activity model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Activity;

/// Version of the persisted collection envelope
pub const COLLECTION_SCHEMA_VERSION: u32 = 1;

/// An [`Activity`] extended, only at the sync boundary, with conflict
/// resolution metadata.
///
/// `updated_at` is authoritative for last-writer-wins comparison. A record
/// lacking it (never synced, created offline) compares as the Unix epoch, so
/// any timestamped peer version wins. A present `deleted_at` marks the record
/// as a tombstone: logically deleted but still transmitted so peers can
/// discard it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncableActivity {
    #[serde(flatten)]
    pub activity: Activity,
    /// Timestamp of the last mutation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    /// Deletion timestamp; presence marks a tombstone
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl SyncableActivity {
    /// Wrap an activity with a fresh mutation timestamp
    #[must_use]
    pub fn stamped(activity: Activity, at: DateTime<Utc>) -> Self {
        Self {
            activity,
            updated_at: Some(at),
            deleted_at: None,
        }
    }

    /// Build a tombstone for a deleted activity
    #[must_use]
    pub fn tombstone(activity: Activity, at: DateTime<Utc>) -> Self {
        Self {
            activity,
            updated_at: Some(at),
            deleted_at: Some(at),
        }
    }

    /// True when this record is a tombstone
    #[must_use]
    pub const fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// The timestamp used for last-writer-wins comparison.
    ///
    /// Records without `updated_at` compare as the oldest possible time.
    #[must_use]
    pub fn effective_updated_at(&self) -> DateTime<Utc> {
        self.updated_at.unwrap_or(DateTime::UNIX_EPOCH)
    }
}

impl From<Activity> for SyncableActivity {
    fn from(activity: Activity) -> Self {
        Self {
            activity,
            updated_at: None,
            deleted_at: None,
        }
    }
}

/// Versioned persistence envelope for the local activity collection.
///
/// Future field additions migrate on the version number instead of relying
/// on permissive JSON parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityCollection {
    pub schema_version: u32,
    pub activities: Vec<SyncableActivity>,
}

impl ActivityCollection {
    /// Wrap a collection in the current envelope version
    #[must_use]
    pub const fn new(activities: Vec<SyncableActivity>) -> Self {
        Self {
            schema_version: COLLECTION_SCHEMA_VERSION,
            activities,
        }
    }
}

impl Default for ActivityCollection {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
