//! Merge resolver: last-writer-wins reconciliation of two activity collections

use std::collections::HashMap;

use crate::models::{ActivityId, SyncableActivity};

/// Reconcile a local collection with a batch of remote records.
///
/// Rules, applied per remote record:
/// - a tombstone (`deleted_at` present) removes the id unconditionally,
///   regardless of the local timestamp - deletions must propagate even when a
///   local edit raced with them;
/// - an id absent locally is inserted (new from server);
/// - otherwise the record with the strictly newer `updated_at` wins, ties keep
///   local. A record without `updated_at` compares as the Unix epoch.
///
/// Local ordering is preserved; records new from the server append in arrival
/// order. Purely-local records the remote batch does not mention are never
/// dropped. Applying the same remote batch twice is idempotent: equal
/// timestamps are not strictly newer, so a re-merge never changes a record.
#[must_use]
pub fn merge(local: Vec<SyncableActivity>, remote: &[SyncableActivity]) -> Vec<SyncableActivity> {
    let mut slots: Vec<Option<SyncableActivity>> = local.into_iter().map(Some).collect();
    let mut index: HashMap<ActivityId, usize> = slots
        .iter()
        .enumerate()
        .filter_map(|(position, slot)| {
            slot.as_ref()
                .map(|record| (record.activity.id.clone(), position))
        })
        .collect();

    for record in remote {
        if record.is_deleted() {
            if let Some(position) = index.remove(&record.activity.id) {
                slots[position] = None;
            }
            continue;
        }

        match index.get(&record.activity.id) {
            Some(&position) => {
                let local_wins = slots[position].as_ref().is_some_and(|existing| {
                    existing.effective_updated_at() >= record.effective_updated_at()
                });
                if !local_wins {
                    slots[position] = Some(record.clone());
                }
            }
            None => {
                index.insert(record.activity.id.clone(), slots.len());
                slots.push(Some(record.clone()));
            }
        }
    }

    slots.into_iter().flatten().collect()
}
