//! The write path, run on the connection thread inside one transaction.

use rusqlite::{Transaction, params_from_iter};
use scd_core::{
  Record, Shape, Value, VersionedTable, query::quote_ident, version,
};

use crate::{
  encode::{encode_params, encode_value},
  settings::WriteMode,
};

/// Outcome of the statements issued by one write: either the updated record
/// with its assigned version, or a record-level error that must roll the
/// transaction back.
pub type Staged<R> = Result<(R, i64), scd_core::Error>;

/// `INSERT INTO t (c1, c2, …) VALUES (?, ?, …)`.
pub fn insert_sql(table: &str, columns: &[&str]) -> String {
  let names: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
  let marks = vec!["?"; columns.len()].join(", ");
  format!(
    "INSERT INTO {} ({}) VALUES ({marks})",
    quote_ident(table),
    names.join(", ")
  )
}

/// `INSERT INTO t (c1, …, version) SELECT ?, …, COALESCE(MAX(version), 0) + 1
/// FROM t WHERE id = ? RETURNING version`.
pub fn conditional_insert_sql(table: &VersionedTable, columns: &[&str]) -> String {
  let version = quote_ident(table.version_column());
  let mut names: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
  names.push(version.clone());

  let mut values = vec!["?".to_owned(); columns.len()];
  values.push(format!("COALESCE(MAX({version}), 0) + 1"));

  format!(
    "INSERT INTO {table} ({}) SELECT {} FROM {table} WHERE {} = ? RETURNING {version}",
    names.join(", "),
    values.join(", "),
    quote_ident(table.id_column()),
    table = quote_ident(table.name()),
  )
}

/// Compute the next version for `identity`, assign it to the record and
/// insert the row. `columns` is the encoded record, including the version
/// column. Does not commit.
pub fn stage<R: Record>(
  tx: &Transaction<'_>,
  table: &VersionedTable,
  mode: WriteMode,
  shape: &Shape,
  columns: Vec<(&'static str, Value)>,
  version_field: &str,
  identity: Value,
) -> rusqlite::Result<Staged<R>> {
  match mode {
    WriteMode::ReadThenInsert => {
      let (sql, params) = version::max_version(table, identity).to_sql();
      let max: i64 =
        tx.query_row(&sql, params_from_iter(encode_params(&params)), |r| r.get(0))?;

      let next = match version::next_version(max) {
        Ok(next) => next,
        Err(e) => return Ok(Err(e)),
      };
      let record: R = match shape.assign(version_field, Value::Integer(next)) {
        Ok(record) => record,
        Err(e) => return Ok(Err(e)),
      };

      let names: Vec<&str> = columns.iter().map(|(c, _)| *c).collect();
      let values = columns.iter().map(|(column, value)| {
        if *column == table.version_column() {
          encode_value(&Value::Integer(next))
        } else {
          encode_value(value)
        }
      });
      tx.execute(&insert_sql(table.name(), &names), params_from_iter(values))?;

      Ok(Ok((record, next)))
    }
    WriteMode::SingleStatement => {
      let payload: Vec<_> = columns
        .into_iter()
        .filter(|(column, _)| *column != table.version_column())
        .collect();
      let names: Vec<&str> = payload.iter().map(|(c, _)| *c).collect();

      let mut params: Vec<_> = payload.iter().map(|(_, v)| encode_value(v)).collect();
      params.push(encode_value(&identity));

      // An aggregate without GROUP BY always yields one row.
      let assigned: i64 = tx.query_row(
        &conditional_insert_sql(table, &names),
        params_from_iter(params),
        |r| r.get(0),
      )?;

      Ok(
        shape
          .assign(version_field, Value::Integer(assigned))
          .map(|record| (record, assigned)),
      )
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn insert_sql_lists_columns() {
    assert_eq!(
      insert_sql("user_scds", &["user_id", "version", "name"]),
      r#"INSERT INTO "user_scds" ("user_id", "version", "name") VALUES (?, ?, ?)"#
    );
  }

  #[test]
  fn conditional_insert_computes_version_in_sql() {
    let t = VersionedTable::new("user_scds", "user_id", "version").unwrap();
    assert_eq!(
      conditional_insert_sql(&t, &["user_id", "name"]),
      concat!(
        r#"INSERT INTO "user_scds" ("user_id", "name", "version") "#,
        r#"SELECT ?, ?, COALESCE(MAX("version"), 0) + 1 FROM "user_scds" "#,
        r#"WHERE "user_id" = ? RETURNING "version""#,
      )
    );
  }
}
