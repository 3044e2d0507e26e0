//! Offline-first synchronization with the remote activity store

mod engine;
mod merge;
mod transport;

pub use engine::{PushDisposition, SyncEngine, SyncOutcome};
pub use merge::merge;
pub use transport::{HttpSyncTransport, PullResponse, PushRequest, PushResponse, SyncTransport};
