//! [`SqliteScd`] — the SQLite implementation of [`Reader`] and [`Writer`].

use std::collections::HashSet;

use rusqlite::params_from_iter;
use scd_core::{
  Filter, Reader, Record, Shape, Value, VersionedTable, Writer, filter,
  resolve, schema, version,
};

use crate::{
  Error, Result,
  encode::{RawRow, encode_params, raw_row},
  settings::{Settings, StoreOptions},
  versioner,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// One SCD type 2 table in a SQLite database.
///
/// The table itself is not created here. It must exist with a `UNIQUE`
/// constraint (or primary key) on exactly `(identity, version)`; opening the
/// store checks for it unless
/// [`require_unique_index`](StoreOptions::require_unique_index) is off.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteScd {
  conn:    tokio_rusqlite::Connection,
  table:   VersionedTable,
  options: StoreOptions,
}

impl SqliteScd {
  /// Open the database named in `settings`.
  pub async fn open(settings: Settings) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(&settings.path).await?;
    Self::new(conn, settings.table, settings.store).await
  }

  /// Wrap an existing connection, e.g. one opened in memory.
  pub async fn new(
    conn: tokio_rusqlite::Connection,
    table: VersionedTable,
    options: StoreOptions,
  ) -> Result<Self> {
    let timeout = options.busy_timeout();
    conn
      .call(move |conn| {
        conn.busy_timeout(timeout)?;
        Ok(())
      })
      .await?;

    let store = Self { conn, table, options };
    if store.options.require_unique_index {
      store.verify_preconditions().await?;
    }

    tracing::info!(
      table = store.table.name(),
      id_column = store.table.id_column(),
      version_column = store.table.version_column(),
      write_mode = ?store.options.write_mode,
      "opened versioned table"
    );
    Ok(store)
  }

  pub fn table(&self) -> &VersionedTable { &self.table }

  pub fn options(&self) -> &StoreOptions { &self.options }

  /// Check that the table and both configured columns exist and that a unique
  /// index covers exactly `(identity, version)`. Partial indexes (`… WHERE`)
  /// do not count; they leave rows outside their predicate unconstrained.
  pub async fn verify_preconditions(&self) -> Result<()> {
    let table = self.table.clone();
    let name = table.name().to_owned();

    let (columns, unique_indexes) = self
      .conn
      .call(move |conn| {
        let columns = conn
          .prepare("SELECT name FROM pragma_table_info(?1)")?
          .query_map([&name], |r| r.get::<_, String>(0))?
          .collect::<rusqlite::Result<HashSet<_>>>()?;

        let index_names = conn
          .prepare(
            r#"SELECT name FROM pragma_index_list(?1) WHERE "unique" = 1 AND "partial" = 0"#,
          )?
          .query_map([&name], |r| r.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut unique_indexes = Vec::with_capacity(index_names.len());
        for index in index_names {
          let cols = conn
            .prepare("SELECT name FROM pragma_index_info(?1)")?
            .query_map([&index], |r| r.get::<_, Option<String>>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          unique_indexes.push(cols);
        }

        Ok((columns, unique_indexes))
      })
      .await?;

    if columns.is_empty() {
      return Err(Error::TableNotFound(table.name().to_owned()));
    }
    for column in [table.id_column(), table.version_column()] {
      if !columns.contains(column) {
        return Err(Error::ColumnNotFound {
          table:  table.name().to_owned(),
          column: column.to_owned(),
        });
      }
    }

    let wanted: HashSet<Option<&str>> =
      [Some(table.id_column()), Some(table.version_column())].into();
    let covered = unique_indexes.iter().any(|cols| {
      cols.len() == 2 && cols.iter().map(Option::as_deref).collect::<HashSet<_>>() == wanted
    });

    if !covered {
      return Err(Error::MissingUniqueIndex {
        table:          table.name().to_owned(),
        id_column:      table.id_column().to_owned(),
        version_column: table.version_column().to_owned(),
      });
    }

    Ok(())
  }

  async fn fetch<R: Record>(&self, query: scd_core::Query) -> Result<Vec<R>> {
    let (sql, params) = query.to_sql();
    tracing::debug!(table = self.table.name(), %sql, params = params.len(), "query");

    let rows: Vec<RawRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let names: Vec<String> =
          stmt.column_names().into_iter().map(str::to_owned).collect();

        let rows = stmt
          .query_map(params_from_iter(encode_params(&params)), |row| {
            raw_row(&names, row)
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|row| schema::from_columns(row).map_err(Error::from))
      .collect()
  }

  /// The current row of one identity group, if the group exists.
  pub async fn current<R: Record>(&self, identity: impl Into<Value>) -> Result<Option<R>> {
    let by_id = filter::eq(self.table.id_column(), identity);
    let rows: Vec<R> = self.read(&[&by_id]).await?;
    Ok(rows.into_iter().next())
  }

  /// Every stored version of one identity group, oldest first.
  pub async fn history<R: Record>(&self, identity: impl Into<Value>) -> Result<Vec<R>> {
    self.fetch(version::history(&self.table, identity.into())).await
  }
}

// ─── Reader / Writer impls ───────────────────────────────────────────────────

impl Reader for SqliteScd {
  type Error = Error;

  #[tracing::instrument(skip_all, fields(table = self.table.name(), filters = filters.len()))]
  async fn read<'a, R: Record>(&'a self, filters: &'a [&'a dyn Filter]) -> Result<Vec<R>> {
    self.fetch(resolve::current_rows(&self.table, filters)).await
  }
}

impl Writer for SqliteScd {
  type Error = Error;

  #[tracing::instrument(skip_all, fields(table = self.table.name()))]
  async fn write<'a, R: Record>(&'a self, record: &'a mut R) -> Result<()> {
    let id_field = schema::resolve_field_name(record, self.table.id_column())?;
    let version_field = schema::resolve_field_name(record, self.table.version_column())?;

    let shape = Shape::of(record)?;
    let identity = shape.get(id_field)?;
    if identity.is_null() {
      return Err(scd_core::Error::MissingIdentity(id_field.to_owned()).into());
    }
    // Fields with no storage form fail here, before any statement runs.
    let columns = shape.columns::<R>(None)?;

    let table = self.table.clone();
    let mode = self.options.write_mode;
    let behavior = self.options.transaction.behavior();
    let logged_identity = identity.clone();

    let staged: versioner::Staged<R> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction_with_behavior(behavior)?;
        let staged =
          versioner::stage::<R>(&tx, &table, mode, &shape, columns, version_field, identity)?;
        // Dropping `tx` without committing rolls the insert back.
        if staged.is_ok() {
          tx.commit()?;
        }
        Ok(staged)
      })
      .await
      .map_err(Error::from)
      .inspect_err(|e| {
        if e.is_constraint_violation() || e.is_busy() {
          tracing::warn!(identity = %logged_identity, error = %e, "concurrent write rejected");
        }
      })?;

    let (updated, assigned) = staged?;
    *record = updated;

    tracing::debug!(identity = %logged_identity, version = assigned, "wrote version");
    Ok(())
  }
}
