//! Sync engine: the orchestrated pull/push cycle and the immediate-push path
//!
//! Sync is a best-effort background concern. Nothing here returns an error to
//! the caller: transport failures degrade the cycle, storage failures are
//! logged and treated as empty reads / unpersisted writes, and queued data is
//! retained for the next cycle. The only user-visible consequence of failure
//! is staleness.

use chrono::{DateTime, Utc};

use super::merge::merge;
use super::transport::{PushRequest, SyncTransport};
use crate::models::{Activity, SyncableActivity};
use crate::store::ActivityStore;

/// Summary of one orchestrated sync cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncOutcome {
    /// True when no credential was available and the cycle was a no-op
    pub skipped: bool,
    /// Records received from the pull
    pub pulled: usize,
    /// Records the server accepted from the batch push
    pub pushed: usize,
    /// Ids the server reported as conflicting (informational)
    pub conflicts: Vec<String>,
    /// The pull did not complete; the cycle degraded to push-only
    pub pull_failed: bool,
    /// The batch push did not complete; the queue was retained
    pub push_failed: bool,
    /// Cursor value after the cycle, if one is stored
    pub cursor: Option<String>,
}

impl SyncOutcome {
    fn skipped() -> Self {
        Self {
            skipped: true,
            ..Self::default()
        }
    }
}

/// Where an immediate-push mutation ended up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushDisposition {
    /// The server acknowledged the record; its queue entry was removed
    Acknowledged,
    /// The record remains queued for the next full sync cycle
    Queued,
}

/// Orchestrates synchronization between an [`ActivityStore`] and a remote
/// store reached through a [`SyncTransport`].
pub struct SyncEngine<S, T> {
    store: S,
    transport: T,
}

impl<S: ActivityStore, T: SyncTransport> SyncEngine<S, T> {
    /// Create an engine over the given store and transport
    pub const fn new(store: S, transport: T) -> Self {
        Self { store, transport }
    }

    /// Access the underlying store
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Run one full pull -> merge -> push -> merge -> cursor-advance cycle.
    ///
    /// `publish` receives the full visible collection after each merge (once
    /// after the pull, again if the push returned server-side winners); each
    /// invocation is a full replace. Without a token the cycle is a no-op -
    /// local-only operation is a first-class mode, not an error.
    pub async fn run_cycle<F>(&self, token: Option<&str>, mut publish: F) -> SyncOutcome
    where
        F: FnMut(Vec<Activity>),
    {
        let Some(token) = token else {
            tracing::debug!("no access token; skipping sync cycle");
            return SyncOutcome::skipped();
        };

        let mut outcome = SyncOutcome::default();
        let cursor = self.stored_cursor();
        let local = self.load_or_empty();
        let queued = self.pending_or_empty();

        // Pull; a failure degrades to zero remote changes for this cycle
        let mut pull_time = None;
        let pulled = match self.transport.pull(token, cursor.as_deref()).await {
            Ok(response) => {
                pull_time = Some(response.sync_time);
                outcome.pulled = response.activities.len();
                response.activities
            }
            Err(error) => {
                tracing::warn!("pull failed, continuing without remote changes: {error}");
                outcome.pull_failed = true;
                Vec::new()
            }
        };

        let mut merged = merge(local, &pulled);
        self.save_logged(&merged);
        // Publish before pushing so the UI reflects server state even if the
        // push fails
        publish(visible(&merged));

        let mut push_time = None;
        if !queued.is_empty() {
            let request = PushRequest {
                activities: queued,
                last_sync_time: cursor,
            };
            match self.transport.push(token, &request).await {
                Ok(response) => {
                    outcome.pushed = response.synced;
                    outcome.conflicts = response.conflicts;
                    push_time = Some(response.sync_time);

                    if !response.server_activities.is_empty() {
                        merged = merge(merged, &response.server_activities);
                        self.save_logged(&merged);
                        publish(visible(&merged));
                    }

                    // Queue is cleared only on push acknowledgement
                    if let Err(error) = self.store.clear_pending() {
                        tracing::warn!("failed to clear pending queue: {error}");
                    }
                }
                Err(error) => {
                    tracing::warn!("batch push failed, queue retained: {error}");
                    outcome.push_failed = true;
                }
            }
        }

        // The push timestamp takes precedence: it may carry a definitive
        // cursor that the (older) pull timestamp must not clobber
        if let Some(timestamp) = push_time.or(pull_time) {
            self.advance_cursor(&timestamp);
        }

        outcome.cursor = self.stored_cursor();
        tracing::debug!(
            pulled = outcome.pulled,
            pushed = outcome.pushed,
            pull_failed = outcome.pull_failed,
            push_failed = outcome.push_failed,
            "sync cycle finished"
        );
        outcome
    }

    /// Record a local mutation and attempt to propagate it immediately.
    ///
    /// The mutation is stamped with the local clock, applied to the stored
    /// collection, and unconditionally enqueued before any network attempt -
    /// the enqueue is the durability boundary. On acknowledgement the queue
    /// entry is removed and the cursor advances to the server's timestamp; on
    /// any failure the entry stays queued for the next full cycle.
    pub async fn push_local_mutation(
        &self,
        token: Option<&str>,
        activity: Activity,
        deletion: bool,
    ) -> PushDisposition {
        let now = Utc::now();
        let record = if deletion {
            SyncableActivity::tombstone(activity, now)
        } else {
            SyncableActivity::stamped(activity, now)
        };

        self.apply_to_collection(&record);

        if let Err(error) = self.store.enqueue_pending(&record) {
            tracing::warn!("failed to enqueue mutation: {error}");
        }

        let Some(token) = token else {
            tracing::debug!("no access token; mutation stays queued");
            return PushDisposition::Queued;
        };

        let request = PushRequest {
            activities: vec![record.clone()],
            last_sync_time: None,
        };
        match self.transport.push(token, &request).await {
            Ok(response) => {
                if let Err(error) = self.store.remove_pending(&record.activity.id) {
                    tracing::warn!("failed to remove acknowledged queue entry: {error}");
                }
                self.advance_cursor(&response.sync_time);
                PushDisposition::Acknowledged
            }
            Err(error) if error.is_conflict() => {
                // Informational: the record stays queued and is retried by
                // the next full cycle
                tracing::info!(
                    id = %record.activity.id,
                    "server reported a conflict for immediate push: {error}"
                );
                PushDisposition::Queued
            }
            Err(error) => {
                tracing::warn!("immediate push failed, mutation stays queued: {error}");
                PushDisposition::Queued
            }
        }
    }

    /// Update the stored collection with a freshly stamped local mutation
    fn apply_to_collection(&self, record: &SyncableActivity) {
        let mut collection = self.load_or_empty();
        if record.is_deleted() {
            collection.retain(|existing| existing.activity.id != record.activity.id);
        } else if let Some(existing) = collection
            .iter_mut()
            .find(|existing| existing.activity.id == record.activity.id)
        {
            *existing = record.clone();
        } else {
            collection.push(record.clone());
        }
        self.save_logged(&collection);
    }

    /// Advance the cursor to a server-supplied timestamp, never backward
    fn advance_cursor(&self, candidate: &str) {
        if let Some(current) = self.stored_cursor() {
            if let (Some(current), Some(candidate)) = (parse_cursor(&current), parse_cursor(candidate))
            {
                if candidate <= current {
                    return;
                }
            }
        }
        if let Err(error) = self.store.set_cursor(candidate) {
            tracing::warn!("failed to persist sync cursor: {error}");
        }
    }

    fn stored_cursor(&self) -> Option<String> {
        self.store.cursor().unwrap_or_else(|error| {
            tracing::warn!("failed to read sync cursor, treating as unset: {error}");
            None
        })
    }

    fn load_or_empty(&self) -> Vec<SyncableActivity> {
        self.store.load_activities().unwrap_or_else(|error| {
            tracing::warn!("failed to load activity collection, treating as empty: {error}");
            Vec::new()
        })
    }

    fn pending_or_empty(&self) -> Vec<SyncableActivity> {
        self.store.pending().unwrap_or_else(|error| {
            tracing::warn!("failed to read pending queue, treating as empty: {error}");
            Vec::new()
        })
    }

    fn save_logged(&self, collection: &[SyncableActivity]) {
        if let Err(error) = self.store.save_activities(collection) {
            tracing::warn!("failed to persist activity collection: {error}");
        }
    }
}

/// Strip sync metadata for the presentation layer; tombstones are excluded
fn visible(records: &[SyncableActivity]) -> Vec<Activity> {
    records
        .iter()
        .filter(|record| !record.is_deleted())
        .map(|record| record.activity.clone())
        .collect()
}

fn parse_cursor(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::models::{ActivityType, SyncableActivity};
    use crate::store::{Database, SqliteActivityStore};
    use crate::sync::transport::{PullResponse, PushResponse};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    fn activity(id: &str, name: &str) -> Activity {
        let mut activity =
            Activity::new(name, "2024-01-01".parse().unwrap(), ActivityType::Strength);
        activity.id = id.parse().unwrap();
        activity
    }

    fn record(id: &str, name: &str, updated: &str) -> SyncableActivity {
        SyncableActivity::stamped(activity(id, name), updated.parse().unwrap())
    }

    /// In-memory transport standing in for the HTTP client
    #[derive(Default)]
    struct FakeTransport {
        pull_response: Option<PullResponse>,
        push_response: Option<PushResponse>,
        push_error_status: u16,
        pulls: Mutex<Vec<Option<String>>>,
        pushes: Mutex<Vec<PushRequest>>,
    }

    impl FakeTransport {
        fn unavailable_status(&self) -> u16 {
            if self.push_error_status == 0 {
                503
            } else {
                self.push_error_status
            }
        }
    }

    #[async_trait]
    impl SyncTransport for FakeTransport {
        async fn pull(&self, _token: &str, since: Option<&str>) -> Result<PullResponse> {
            self.pulls
                .lock()
                .unwrap()
                .push(since.map(ToString::to_string));
            self.pull_response.clone().ok_or(Error::Api {
                status: 503,
                message: "unavailable".to_string(),
            })
        }

        async fn push(&self, _token: &str, request: &PushRequest) -> Result<PushResponse> {
            self.pushes.lock().unwrap().push(request.clone());
            self.push_response.clone().ok_or(Error::Api {
                status: self.unavailable_status(),
                message: "unavailable".to_string(),
            })
        }
    }

    fn pull_ok(activities: Vec<SyncableActivity>, sync_time: &str) -> Option<PullResponse> {
        Some(PullResponse {
            activities,
            sync_time: sync_time.to_string(),
        })
    }

    fn push_ok(synced: usize, sync_time: &str) -> Option<PushResponse> {
        Some(PushResponse {
            synced,
            conflicts: Vec::new(),
            server_activities: Vec::new(),
            sync_time: sync_time.to_string(),
        })
    }

    #[tokio::test]
    async fn test_cycle_skipped_without_token() {
        let db = Database::open_in_memory().unwrap();
        let engine = SyncEngine::new(
            SqliteActivityStore::new(db.connection()),
            FakeTransport::default(),
        );

        let mut published = 0;
        let outcome = engine.run_cycle(None, |_| published += 1).await;

        assert!(outcome.skipped);
        assert_eq!(published, 0);
        assert!(engine.transport.pulls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cycle_pull_merges_persists_and_publishes() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteActivityStore::new(db.connection());
        store
            .save_activities(&[activity("1", "Squat").into()])
            .unwrap();

        let transport = FakeTransport {
            pull_response: pull_ok(
                vec![record("1", "Squat 2.0", "2024-01-02T00:00:00Z")],
                "2024-01-02T00:00:00Z",
            ),
            ..FakeTransport::default()
        };
        let engine = SyncEngine::new(store, transport);

        let mut snapshots: Vec<Vec<Activity>> = Vec::new();
        let outcome = engine
            .run_cycle(Some("token"), |activities| snapshots.push(activities))
            .await;

        assert_eq!(outcome.pulled, 1);
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0][0].name, "Squat 2.0");
        assert_eq!(
            engine.store().cursor().unwrap().as_deref(),
            Some("2024-01-02T00:00:00Z")
        );
        // Merged result was written back
        let persisted = engine.store().load_activities().unwrap();
        assert_eq!(persisted[0].activity.name, "Squat 2.0");
        // Empty queue means no push
        assert!(engine.transport.pushes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cycle_first_run_pulls_unbounded() {
        let db = Database::open_in_memory().unwrap();
        let transport = FakeTransport {
            pull_response: pull_ok(Vec::new(), "2024-01-02T00:00:00Z"),
            ..FakeTransport::default()
        };
        let engine = SyncEngine::new(SqliteActivityStore::new(db.connection()), transport);

        engine.run_cycle(Some("token"), |_| {}).await;

        assert_eq!(engine.transport.pulls.lock().unwrap()[0], None);
    }

    #[tokio::test]
    async fn test_cycle_push_clears_queue_and_prefers_push_cursor() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteActivityStore::new(db.connection());
        store.set_cursor("2024-01-01T00:00:00Z").unwrap();
        store
            .enqueue_pending(&record("2", "Bench", "2024-01-01T12:00:00Z"))
            .unwrap();

        let transport = FakeTransport {
            pull_response: pull_ok(Vec::new(), "2024-01-02T00:00:00Z"),
            push_response: push_ok(1, "2024-01-03T00:00:00Z"),
            ..FakeTransport::default()
        };
        let engine = SyncEngine::new(store, transport);

        let outcome = engine.run_cycle(Some("token"), |_| {}).await;

        assert_eq!(outcome.pushed, 1);
        assert!(engine.store().pending().unwrap().is_empty());
        // Push timestamp wins over the pull's
        assert_eq!(
            engine.store().cursor().unwrap().as_deref(),
            Some("2024-01-03T00:00:00Z")
        );
        // The stored cursor rode along with the batch
        let pushes = engine.transport.pushes.lock().unwrap();
        assert_eq!(
            pushes[0].last_sync_time.as_deref(),
            Some("2024-01-01T00:00:00Z")
        );
        assert_eq!(pushes[0].activities.len(), 1);
    }

    #[tokio::test]
    async fn test_cycle_republishes_server_side_winners() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteActivityStore::new(db.connection());
        store
            .enqueue_pending(&record("1", "Squat", "2024-01-01T00:00:00Z"))
            .unwrap();

        let transport = FakeTransport {
            pull_response: pull_ok(Vec::new(), "2024-01-01T00:00:00Z"),
            push_response: Some(PushResponse {
                synced: 0,
                conflicts: vec!["1".to_string()],
                server_activities: vec![record("1", "Squat (other device)", "2024-01-05T00:00:00Z")],
                sync_time: "2024-01-05T00:00:00Z".to_string(),
            }),
            ..FakeTransport::default()
        };
        let engine = SyncEngine::new(store, transport);

        let mut snapshots: Vec<Vec<Activity>> = Vec::new();
        let outcome = engine
            .run_cycle(Some("token"), |activities| snapshots.push(activities))
            .await;

        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[1][0].name, "Squat (other device)");
        assert_eq!(outcome.conflicts, vec!["1".to_string()]);
    }

    #[tokio::test]
    async fn test_cycle_pull_failure_degrades_to_push_only() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteActivityStore::new(db.connection());
        store
            .enqueue_pending(&record("2", "Bench", "2024-01-01T12:00:00Z"))
            .unwrap();

        let transport = FakeTransport {
            pull_response: None,
            push_response: push_ok(1, "2024-01-03T00:00:00Z"),
            ..FakeTransport::default()
        };
        let engine = SyncEngine::new(store, transport);

        let outcome = engine.run_cycle(Some("token"), |_| {}).await;

        assert!(outcome.pull_failed);
        assert_eq!(outcome.pushed, 1);
        assert_eq!(
            engine.store().cursor().unwrap().as_deref(),
            Some("2024-01-03T00:00:00Z")
        );
    }

    #[tokio::test]
    async fn test_cycle_push_failure_retains_queue_and_pull_cursor() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteActivityStore::new(db.connection());
        store
            .enqueue_pending(&record("2", "Bench", "2024-01-01T12:00:00Z"))
            .unwrap();

        let transport = FakeTransport {
            pull_response: pull_ok(Vec::new(), "2024-01-02T00:00:00Z"),
            push_response: None,
            ..FakeTransport::default()
        };
        let engine = SyncEngine::new(store, transport);

        let outcome = engine.run_cycle(Some("token"), |_| {}).await;

        assert!(outcome.push_failed);
        assert_eq!(engine.store().pending().unwrap().len(), 1);
        assert_eq!(
            engine.store().cursor().unwrap().as_deref(),
            Some("2024-01-02T00:00:00Z")
        );
    }

    #[tokio::test]
    async fn test_cycle_both_failed_leaves_cursor_unchanged() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteActivityStore::new(db.connection());
        store.set_cursor("2024-01-01T00:00:00Z").unwrap();
        store
            .enqueue_pending(&record("2", "Bench", "2024-01-01T12:00:00Z"))
            .unwrap();

        let engine = SyncEngine::new(store, FakeTransport::default());
        let outcome = engine.run_cycle(Some("token"), |_| {}).await;

        assert!(outcome.pull_failed && outcome.push_failed);
        assert_eq!(
            engine.store().cursor().unwrap().as_deref(),
            Some("2024-01-01T00:00:00Z")
        );
    }

    #[tokio::test]
    async fn test_cursor_never_moves_backward() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteActivityStore::new(db.connection());
        store.set_cursor("2024-02-01T00:00:00Z").unwrap();

        let transport = FakeTransport {
            pull_response: pull_ok(Vec::new(), "2024-01-01T00:00:00Z"),
            ..FakeTransport::default()
        };
        let engine = SyncEngine::new(store, transport);

        engine.run_cycle(Some("token"), |_| {}).await;

        assert_eq!(
            engine.store().cursor().unwrap().as_deref(),
            Some("2024-02-01T00:00:00Z")
        );
    }

    #[tokio::test]
    async fn test_immediate_push_ack_removes_entry_and_advances_cursor() {
        let db = Database::open_in_memory().unwrap();
        let transport = FakeTransport {
            push_response: push_ok(1, "2024-01-04T00:00:00Z"),
            ..FakeTransport::default()
        };
        let engine = SyncEngine::new(SqliteActivityStore::new(db.connection()), transport);

        let disposition = engine
            .push_local_mutation(Some("token"), activity("1", "Squat"), false)
            .await;

        assert_eq!(disposition, PushDisposition::Acknowledged);
        assert!(engine.store().pending().unwrap().is_empty());
        assert_eq!(
            engine.store().cursor().unwrap().as_deref(),
            Some("2024-01-04T00:00:00Z")
        );
        // Mutation applied to the stored collection with a stamp
        let persisted = engine.store().load_activities().unwrap();
        assert_eq!(persisted.len(), 1);
        assert!(persisted[0].updated_at.is_some());
    }

    #[tokio::test]
    async fn test_immediate_push_failure_leaves_entry_queued() {
        let db = Database::open_in_memory().unwrap();
        let engine = SyncEngine::new(
            SqliteActivityStore::new(db.connection()),
            FakeTransport::default(),
        );

        let disposition = engine
            .push_local_mutation(Some("token"), activity("1", "Squat"), false)
            .await;

        assert_eq!(disposition, PushDisposition::Queued);
        assert_eq!(engine.store().pending().unwrap().len(), 1);
        assert_eq!(engine.store().cursor().unwrap(), None);
    }

    #[tokio::test]
    async fn test_immediate_push_conflict_stays_queued() {
        let db = Database::open_in_memory().unwrap();
        let transport = FakeTransport {
            push_error_status: 409,
            ..FakeTransport::default()
        };
        let engine = SyncEngine::new(SqliteActivityStore::new(db.connection()), transport);

        let disposition = engine
            .push_local_mutation(Some("token"), activity("1", "Squat"), false)
            .await;

        assert_eq!(disposition, PushDisposition::Queued);
        assert_eq!(engine.store().pending().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_immediate_push_without_token_applies_locally_and_queues() {
        let db = Database::open_in_memory().unwrap();
        let engine = SyncEngine::new(
            SqliteActivityStore::new(db.connection()),
            FakeTransport::default(),
        );

        let disposition = engine
            .push_local_mutation(None, activity("1", "Squat"), false)
            .await;

        assert_eq!(disposition, PushDisposition::Queued);
        assert_eq!(engine.store().load_activities().unwrap().len(), 1);
        assert_eq!(engine.store().pending().unwrap().len(), 1);
        assert!(engine.transport.pushes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deletion_tombstones_queue_entry_and_drops_from_collection() {
        let db = Database::open_in_memory().unwrap();
        let store = SqliteActivityStore::new(db.connection());
        store
            .save_activities(&[record("1", "Squat", "2024-01-01T00:00:00Z")])
            .unwrap();

        let engine = SyncEngine::new(store, FakeTransport::default());
        engine
            .push_local_mutation(None, activity("1", "Squat"), true)
            .await;

        assert!(engine.store().load_activities().unwrap().is_empty());
        let queued = engine.store().pending().unwrap();
        assert_eq!(queued.len(), 1);
        assert!(queued[0].is_deleted());
    }

    #[tokio::test]
    async fn test_failed_mutation_pushed_exactly_once_next_cycle() {
        let db = Database::open_in_memory().unwrap();
        let engine = SyncEngine::new(
            SqliteActivityStore::new(db.connection()),
            FakeTransport::default(),
        );

        // Offline edit: enqueued, push fails
        engine
            .push_local_mutation(Some("token"), activity("1", "Squat"), false)
            .await;
        assert_eq!(engine.store().pending().unwrap().len(), 1);

        // Next cycle with the network back: the entry goes out exactly once
        let db2 = Database::open_in_memory().unwrap();
        let store2 = SqliteActivityStore::new(db2.connection());
        for entry in engine.store().pending().unwrap() {
            store2.enqueue_pending(&entry).unwrap();
        }
        let transport = FakeTransport {
            pull_response: pull_ok(Vec::new(), "2024-01-02T00:00:00Z"),
            push_response: push_ok(1, "2024-01-02T00:00:00Z"),
            ..FakeTransport::default()
        };
        let engine2 = SyncEngine::new(store2, transport);
        engine2.run_cycle(Some("token"), |_| {}).await;

        let pushes = engine2.transport.pushes.lock().unwrap();
        assert_eq!(pushes.len(), 1);
        assert_eq!(pushes[0].activities.len(), 1);
        assert_eq!(pushes[0].activities[0].activity.id.as_str(), "1");
        assert!(engine2.store().pending().unwrap().is_empty());
    }
}
