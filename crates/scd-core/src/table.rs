//! [`VersionedTable`] — the configuration shared by readers and writers of one
//! SCD-tracked table.

use serde::Deserialize;

use crate::{Error, Result, query::quote_ident};

/// Names the table, its identity column and its version column.
///
/// Immutable once constructed. The version column must hold non-negative
/// integers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct VersionedTable {
  name:           String,
  id_column:      String,
  version_column: String,
}

#[derive(Deserialize)]
struct RawTable {
  name:           String,
  id_column:      String,
  version_column: String,
}

impl TryFrom<RawTable> for VersionedTable {
  type Error = Error;

  fn try_from(raw: RawTable) -> Result<Self> {
    VersionedTable::new(raw.name, raw.id_column, raw.version_column)
  }
}

impl VersionedTable {
  pub fn new(
    name: impl Into<String>,
    id_column: impl Into<String>,
    version_column: impl Into<String>,
  ) -> Result<Self> {
    let table = Self {
      name:           name.into(),
      id_column:      id_column.into(),
      version_column: version_column.into(),
    };

    for (what, ident) in [
      ("table name", &table.name),
      ("identity column", &table.id_column),
      ("version column", &table.version_column),
    ] {
      if ident.trim().is_empty() {
        return Err(Error::InvalidTable(format!("{what} is empty")));
      }
      if ident.contains('\0') {
        return Err(Error::InvalidTable(format!("{what} contains a NUL byte")));
      }
    }

    if table.id_column == table.version_column {
      return Err(Error::InvalidTable(format!(
        "identity and version column are both {:?}",
        table.id_column
      )));
    }

    Ok(table)
  }

  pub fn name(&self) -> &str { &self.name }

  pub fn id_column(&self) -> &str { &self.id_column }

  pub fn version_column(&self) -> &str { &self.version_column }

  /// `"table"."column"`, for use in joined statements.
  pub fn qualified(&self, column: &str) -> String {
    format!("{}.{}", quote_ident(&self.name), quote_ident(column))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_distinct_names() {
    let t = VersionedTable::new("user_scds", "user_id", "version").unwrap();
    assert_eq!(t.name(), "user_scds");
    assert_eq!(t.id_column(), "user_id");
    assert_eq!(t.version_column(), "version");
    assert_eq!(t.qualified("status"), r#""user_scds"."status""#);
  }

  #[test]
  fn rejects_empty_and_colliding_names() {
    assert!(matches!(
      VersionedTable::new("", "id", "version"),
      Err(Error::InvalidTable(_))
    ));
    assert!(matches!(
      VersionedTable::new("t", "  ", "version"),
      Err(Error::InvalidTable(_))
    ));
    assert!(matches!(
      VersionedTable::new("t", "v", "v"),
      Err(Error::InvalidTable(_))
    ));
  }

  #[test]
  fn deserialize_validates() {
    let ok: VersionedTable = serde_json::from_str(
      r#"{"name":"t","id_column":"id","version_column":"version"}"#,
    )
    .unwrap();
    assert_eq!(ok.id_column(), "id");

    let bad = serde_json::from_str::<VersionedTable>(
      r#"{"name":"t","id_column":"id","version_column":"id"}"#,
    );
    assert!(bad.is_err());
  }
}
