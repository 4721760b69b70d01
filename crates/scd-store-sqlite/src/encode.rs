//! Conversion between [`scd_core::Value`] and SQLite values.

use rusqlite::{
  Row,
  types::{Value as SqlValue, ValueRef},
};
use scd_core::Value;

pub fn encode_value(value: &Value) -> SqlValue {
  match value {
    Value::Null => SqlValue::Null,
    Value::Integer(i) => SqlValue::Integer(*i),
    Value::Real(f) => SqlValue::Real(*f),
    Value::Text(s) => SqlValue::Text(s.clone()),
    Value::Blob(b) => SqlValue::Blob(b.clone()),
  }
}

pub fn decode_value(value: ValueRef<'_>) -> Value {
  match value {
    ValueRef::Null => Value::Null,
    ValueRef::Integer(i) => Value::Integer(i),
    ValueRef::Real(f) => Value::Real(f),
    ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
    ValueRef::Blob(b) => Value::Blob(b.to_vec()),
  }
}

/// Bind parameters for `rusqlite`, in placeholder order.
pub fn encode_params(values: &[Value]) -> Vec<SqlValue> {
  values.iter().map(encode_value).collect()
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// One result row as `(column name, value)` pairs.
pub type RawRow = Vec<(String, Value)>;

pub fn raw_row(names: &[String], row: &Row<'_>) -> rusqlite::Result<RawRow> {
  names
    .iter()
    .enumerate()
    .map(|(i, name)| Ok((name.clone(), decode_value(row.get_ref(i)?))))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn scalars_survive_sqlite() {
    let conn = rusqlite::Connection::open_in_memory().unwrap();
    let values = vec![
      Value::Null,
      Value::Integer(-3),
      Value::Real(2.5),
      Value::from("text"),
      Value::Blob(vec![0, 1, 2]),
    ];

    let back: Vec<Value> = conn
      .query_row(
        "SELECT ?1, ?2, ?3, ?4, ?5",
        rusqlite::params_from_iter(encode_params(&values)),
        |row| (0..5).map(|i| Ok(decode_value(row.get_ref(i)?))).collect(),
      )
      .unwrap();

    assert_eq!(back, values);
  }
}
