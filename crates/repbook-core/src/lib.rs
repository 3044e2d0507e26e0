//! repbook-core - Core library for repbook
//!
//! This crate contains the shared models, local store, and sync engine used
//! by all repbook interfaces.

pub mod error;
pub mod models;
pub mod store;
pub mod sync;

pub use error::{Error, Result};
pub use models::{Activity, ActivityId, SyncableActivity};
