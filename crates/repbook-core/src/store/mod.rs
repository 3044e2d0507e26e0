//! Durable local store: connection management, migrations, and slot storage

mod activity_store;
mod connection;
mod migrations;

pub use activity_store::{ActivityStore, SqliteActivityStore};
pub use connection::Database;
