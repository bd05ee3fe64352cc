//! SQLite backend for the subject/role directory.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod password;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteDirectory;

#[cfg(test)]
mod tests;
