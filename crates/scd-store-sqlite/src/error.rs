//! Error type for `scd-store-sqlite`.

use rusqlite::ErrorCode;
use scd_core::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] scd_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("settings error: {0}")]
  Settings(#[from] config::ConfigError),

  #[error("table {0:?} does not exist")]
  TableNotFound(String),

  #[error("table {table:?} has no column {column:?}")]
  ColumnNotFound { table: String, column: String },

  /// Concurrent writers are only safe with this index in place.
  #[error(
    "table {table:?} has no unique index on ({id_column:?}, {version_column:?})"
  )]
  MissingUniqueIndex {
    table:          String,
    id_column:      String,
    version_column: String,
  },
}

impl Error {
  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::Core(e) => e.kind(),
      Error::Database(_) => ErrorKind::Storage,
      Error::Settings(_)
      | Error::TableNotFound(_)
      | Error::ColumnNotFound { .. }
      | Error::MissingUniqueIndex { .. } => ErrorKind::Configuration,
    }
  }

  fn sqlite_code(&self) -> Option<ErrorCode> {
    match self {
      Error::Database(tokio_rusqlite::Error::Rusqlite(e)) => e.sqlite_error_code(),
      _ => None,
    }
  }

  /// A `UNIQUE` (or other) constraint rejected the statement, typically a
  /// concurrent write that claimed the same version first.
  pub fn is_constraint_violation(&self) -> bool {
    self.sqlite_code() == Some(ErrorCode::ConstraintViolation)
  }

  /// The database stayed locked by another connection past the busy timeout.
  pub fn is_busy(&self) -> bool {
    matches!(
      self.sqlite_code(),
      Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
    )
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
