//! Store settings, loaded from a TOML file and `SCD__*` environment variables.
//!
//! ```toml
//! path = "dims.sqlite"
//!
//! [table]
//! name           = "user_scds"
//! id_column      = "user_id"
//! version_column = "version"
//!
//! [store]
//! write_mode  = "single_statement"
//! transaction = "immediate"
//! ```

use std::{path::PathBuf, time::Duration};

use rusqlite::TransactionBehavior;
use scd_core::VersionedTable;
use serde::Deserialize;

use crate::Result;

/// How a write computes and stores the next version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
  /// Read `MAX(version)`, then insert `max + 1`, in one transaction.
  #[default]
  ReadThenInsert,
  /// A single `INSERT … SELECT MAX(version) + 1` statement.
  SingleStatement,
}

/// SQLite lock acquisition for the write transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionMode {
  /// Locks are taken lazily; concurrent writers race and one of them fails
  /// with a busy or uniqueness error.
  Deferred,
  /// The write lock is taken at `BEGIN`; concurrent writers queue behind it
  /// for up to the busy timeout.
  #[default]
  Immediate,
  Exclusive,
}

impl TransactionMode {
  pub(crate) fn behavior(self) -> TransactionBehavior {
    match self {
      TransactionMode::Deferred => TransactionBehavior::Deferred,
      TransactionMode::Immediate => TransactionBehavior::Immediate,
      TransactionMode::Exclusive => TransactionBehavior::Exclusive,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreOptions {
  pub write_mode:           WriteMode,
  pub transaction:          TransactionMode,
  pub busy_timeout_ms:      u64,
  /// Refuse to open a table without a unique `(identity, version)` index.
  pub require_unique_index: bool,
}

impl Default for StoreOptions {
  fn default() -> Self {
    Self {
      write_mode:           WriteMode::default(),
      transaction:          TransactionMode::default(),
      busy_timeout_ms:      5_000,
      require_unique_index: true,
    }
  }
}

impl StoreOptions {
  pub fn busy_timeout(&self) -> Duration {
    Duration::from_millis(self.busy_timeout_ms)
  }
}

/// Everything needed to open a [`SqliteScd`](crate::SqliteScd).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
  pub path:  PathBuf,
  pub table: VersionedTable,
  #[serde(default)]
  pub store: StoreOptions,
}

impl Settings {
  /// Layer `file` (optional, TOML) under `SCD__`-prefixed environment
  /// variables, e.g. `SCD__TABLE__NAME=user_scds`.
  pub fn load(file: impl Into<PathBuf>) -> Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(file.into()).required(false))
      .add_source(
        config::Environment::with_prefix("SCD")
          .prefix_separator("__")
          .separator("__"),
      )
      .build()?;

    Ok(settings.try_deserialize()?)
  }
}
