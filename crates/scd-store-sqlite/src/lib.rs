//! SQLite backend for slowly changing dimension tables.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime. Reads resolve current rows with one
//! joined query; writes assign versions inside a single transaction.

mod encode;
mod store;
mod versioner;

pub mod error;
pub mod settings;

pub use error::{Error, Result};
pub use settings::{Settings, StoreOptions, TransactionMode, WriteMode};
pub use store::SqliteScd;
