//! CLI command implementations

pub mod add;
pub mod common;
pub mod delete;
pub mod done;
pub mod list;
pub mod sync;
