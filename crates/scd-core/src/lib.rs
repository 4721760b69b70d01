//! Core types for slowly changing dimension (type 2) tables.
//!
//! Every logical entity is stored as a series of immutable rows sharing an
//! identity value, each carrying a version number that grows by one per write.
//! This crate holds the backend-neutral parts: table configuration, the query
//! builder filters operate on, record field mapping, and the read and write
//! algorithms expressed as queries. It has no database dependency.

pub mod error;
pub mod filter;
pub mod query;
pub mod resolve;
pub mod schema;
pub mod store;
pub mod table;
pub mod value;
pub mod version;

pub use error::{Error, ErrorKind, Result};
pub use filter::Filter;
pub use query::Query;
pub use schema::{Encoding, Field, Record, Shape};
pub use store::{Reader, Scd, Writer};
pub use table::VersionedTable;
pub use value::Value;
