//! The [`Reader`] and [`Writer`] traits and the combined [`Scd`] trait.
//!
//! Implemented by storage backends (e.g. `scd-store-sqlite`). Callers that
//! only resolve current rows depend on [`Reader`]; callers that append
//! versions depend on [`Writer`].

use std::future::Future;

use crate::{Filter, Record};

/// Resolves the current row of every identity group.
pub trait Reader: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Every current (highest-version) row that satisfies all `filters`.
  ///
  /// Filters apply conjunctively, in order, to current rows only. An empty
  /// filter list returns the current row of every identity; no match is an
  /// empty `Vec`, not an error.
  fn read<'a, R: Record>(
    &'a self,
    filters: &'a [&'a dyn Filter],
  ) -> impl Future<Output = Result<Vec<R>, Self::Error>> + Send + 'a;
}

/// Appends new versions.
pub trait Writer: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Persist `record` as the next version of its identity.
  ///
  /// The incoming version field is ignored. On success it holds the assigned
  /// version. On failure nothing is persisted and the record's version field
  /// is unspecified.
  fn write<'a, R: Record>(
    &'a self,
    record: &'a mut R,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;
}

/// A backend that both reads and writes one versioned table.
pub trait Scd: Reader + Writer {}

impl<T: Reader + Writer> Scd for T {}
