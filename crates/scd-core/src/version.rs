//! Version assignment.
//!
//! A new row's version is one more than the highest version already stored
//! for its identity, or 1 for an unseen identity. The lookup and the insert
//! must share one transaction, and the table must carry a uniqueness
//! constraint on `(identity, version)`; without it two concurrent writers can
//! both observe the same maximum and store duplicate versions.

use crate::{Error, Query, Result, Value, VersionedTable, query::quote_ident};

/// Version assigned to the first row of an identity group.
pub const FIRST_VERSION: i64 = 1;

/// `SELECT COALESCE(MAX(version), 0) FROM table WHERE id = ?`.
pub fn max_version(table: &VersionedTable, identity: Value) -> Query {
  Query::table(table.name())
    .select(format!(
      "COALESCE(MAX({}), 0)",
      quote_ident(table.version_column())
    ))
    .filter(format!("{} = ?", quote_ident(table.id_column())), [identity])
}

pub fn next_version(current_max: i64) -> Result<i64> {
  current_max
    .checked_add(1)
    .ok_or(Error::VersionOverflow(current_max))
}

/// Every version of one identity group, oldest first.
pub fn history(table: &VersionedTable, identity: Value) -> Query {
  Query::table(table.name())
    .filter(format!("{} = ?", table.qualified(table.id_column())), [identity])
    .order_by(format!("{} ASC", table.qualified(table.version_column())))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn max_version_defaults_to_zero() {
    let t = VersionedTable::new("t", "uid", "v").unwrap();
    let (sql, params) = max_version(&t, Value::from("u1")).to_sql();
    assert_eq!(
      sql,
      r#"SELECT COALESCE(MAX("v"), 0) FROM "t" WHERE ("uid" = ?)"#
    );
    assert_eq!(params, vec![Value::from("u1")]);
  }

  #[test]
  fn next_version_increments() {
    assert_eq!(next_version(0).unwrap(), FIRST_VERSION);
    assert_eq!(next_version(41).unwrap(), 42);
    assert!(matches!(next_version(i64::MAX), Err(Error::VersionOverflow(_))));
  }

  #[test]
  fn history_orders_by_version() {
    let t = VersionedTable::new("t", "uid", "v").unwrap();
    let (sql, _) = history(&t, Value::from("u1")).to_sql();
    assert!(sql.ends_with(r#"WHERE ("t"."uid" = ?) ORDER BY "t"."v" ASC"#));
  }
}
