//! SQLite backend for rinkstat.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. The event tables are filled by the
//! upstream ingestion pipeline; the stats tables are owned by the engine.

mod encode;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod fixtures;
