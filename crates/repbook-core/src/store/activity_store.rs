//! Activity store implementation: collection slot, sync cursor, pending queue

use crate::error::Result;
use crate::models::{ActivityCollection, ActivityId, SyncableActivity};
use rusqlite::{params, Connection, OptionalExtension};

const ACTIVITIES_SLOT: &str = "activities";
const CURSOR_SLOT: &str = "last_sync_time";

/// Trait for durable sync-state storage.
///
/// Three concerns share one storage unit: the full activity collection (an
/// opaque-to-SQL JSON envelope), the last-successful-sync cursor, and the
/// pending mutation queue. All operations are idempotent and last-write-wins
/// at the storage layer.
pub trait ActivityStore {
    /// Load the persisted activity collection; empty when never saved
    fn load_activities(&self) -> Result<Vec<SyncableActivity>>;

    /// Replace the persisted activity collection
    fn save_activities(&self, activities: &[SyncableActivity]) -> Result<()>;

    /// Read the last-successful-sync cursor
    fn cursor(&self) -> Result<Option<String>>;

    /// Overwrite the sync cursor
    fn set_cursor(&self, timestamp: &str) -> Result<()>;

    /// Insert or replace a pending mutation, keyed by activity id.
    ///
    /// A new mutation for an already-queued id replaces the queued entry;
    /// the queue never holds more than one entry per activity.
    fn enqueue_pending(&self, record: &SyncableActivity) -> Result<()>;

    /// Return all queued entries, oldest first, without removing them
    fn pending(&self) -> Result<Vec<SyncableActivity>>;

    /// Remove a single acknowledged entry
    fn remove_pending(&self, id: &ActivityId) -> Result<()>;

    /// Remove all entries (after a successful batch push)
    fn clear_pending(&self) -> Result<()>;
}

/// `SQLite` implementation of [`ActivityStore`]
pub struct SqliteActivityStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteActivityStore<'a> {
    /// Create a new store with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    fn get_slot(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM slots WHERE key = ?", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set_slot(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO slots (key, value) VALUES (?, ?)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl ActivityStore for SqliteActivityStore<'_> {
    fn load_activities(&self) -> Result<Vec<SyncableActivity>> {
        let Some(raw) = self.get_slot(ACTIVITIES_SLOT)? else {
            return Ok(Vec::new());
        };

        let envelope: ActivityCollection = serde_json::from_str(&raw)?;
        Ok(envelope.activities)
    }

    fn save_activities(&self, activities: &[SyncableActivity]) -> Result<()> {
        let envelope = ActivityCollection::new(activities.to_vec());
        let raw = serde_json::to_string(&envelope)?;
        self.set_slot(ACTIVITIES_SLOT, &raw)
    }

    fn cursor(&self) -> Result<Option<String>> {
        self.get_slot(CURSOR_SLOT)
    }

    fn set_cursor(&self, timestamp: &str) -> Result<()> {
        self.set_slot(CURSOR_SLOT, timestamp)
    }

    fn enqueue_pending(&self, record: &SyncableActivity) -> Result<()> {
        let payload = serde_json::to_string(record)?;
        let now = chrono::Utc::now().timestamp_millis();

        self.conn.execute(
            "INSERT INTO pending_mutations (activity_id, payload, queued_at)
             VALUES (?, ?, ?)
             ON CONFLICT(activity_id) DO UPDATE SET payload = excluded.payload",
            params![record.activity.id.as_str(), payload, now],
        )?;
        Ok(())
    }

    fn pending(&self) -> Result<Vec<SyncableActivity>> {
        let mut stmt = self
            .conn
            .prepare("SELECT payload FROM pending_mutations ORDER BY queued_at, activity_id")?;

        let payloads = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        payloads
            .iter()
            .map(|payload| serde_json::from_str(payload).map_err(Into::into))
            .collect()
    }

    fn remove_pending(&self, id: &ActivityId) -> Result<()> {
        self.conn.execute(
            "DELETE FROM pending_mutations WHERE activity_id = ?",
            params![id.as_str()],
        )?;
        Ok(())
    }

    fn clear_pending(&self) -> Result<()> {
        self.conn.execute("DELETE FROM pending_mutations", [])?;
        Ok(())
    }
}
