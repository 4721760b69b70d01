//! Error types for `scd-core`.

use thiserror::Error;

/// Coarse classification of every failure the core can surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// A configured table or column does not line up with a record type.
  Configuration,
  /// A record field could not be read or assigned.
  FieldAccess,
  /// The storage collaborator failed, or its rows could not be materialized.
  Storage,
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid table configuration: {0}")]
  InvalidTable(String),

  #[error("column {column:?} is not mapped by any field of {record}")]
  ColumnNotMapped {
    column: String,
    record: &'static str,
  },

  #[error("field {0:?} not found")]
  FieldNotFound(String),

  #[error("field {field:?} cannot be assigned: {reason}")]
  Unassignable { field: String, reason: String },

  /// The record did not serialize to a map of named fields.
  #[error("{0} does not serialize as a record with named fields")]
  NotARecord(&'static str),

  /// The field's serialized value has no storage form under its encoding.
  #[error("field {field:?} cannot be stored: {reason}")]
  Unencodable { field: String, reason: String },

  #[error("identity field {0:?} holds no value")]
  MissingIdentity(String),

  #[error("failed to encode record: {0}")]
  Encode(#[source] serde_json::Error),

  #[error("failed to decode row: {0}")]
  Decode(#[source] serde_json::Error),

  #[error("version counter overflowed after {0}")]
  VersionOverflow(i64),
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::InvalidTable(_) | Error::ColumnNotMapped { .. } => {
        ErrorKind::Configuration
      }
      Error::FieldNotFound(_)
      | Error::Unassignable { .. }
      | Error::Unencodable { .. }
      | Error::NotARecord(_)
      | Error::MissingIdentity(_)
      | Error::Encode(_) => ErrorKind::FieldAccess,
      Error::Decode(_) | Error::VersionOverflow(_) => ErrorKind::Storage,
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
