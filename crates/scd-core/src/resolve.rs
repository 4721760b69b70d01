//! Current-row resolution.
//!
//! The current row of an identity group is the one holding the group's
//! maximum version. Reads join the caller's filtered query against a grouped
//! view of `(identity, MAX(version))`, so a filter only ever sees current
//! rows: an identity whose current row fails a filter is absent from the
//! result even if an older version would have matched.

use crate::{Filter, Query, VersionedTable, query::quote_ident};

/// Alias of the derived `(identity, max_version)` view.
pub const LATEST_ALIAS: &str = "latest";

/// Column of the latest view holding the group's maximum version.
pub const MAX_VERSION: &str = "max_version";

/// `SELECT id, MAX(version) AS max_version FROM table GROUP BY id`.
pub fn latest_view(table: &VersionedTable) -> Query {
  let id = quote_ident(table.id_column());
  let version = quote_ident(table.version_column());

  Query::table(table.name())
    .select(id.clone())
    .select(format!("MAX({version}) AS {}", quote_ident(MAX_VERSION)))
    .group_by(id)
}

/// The full read: every current row that satisfies all `filters`.
pub fn current_rows(table: &VersionedTable, filters: &[&dyn Filter]) -> Query {
  let main = filters
    .iter()
    .fold(Query::table(table.name()), |query, filter| filter.apply(query));

  let latest = quote_ident(LATEST_ALIAS);
  let on = format!(
    "{} = {latest}.{} AND {} = {latest}.{}",
    table.qualified(table.id_column()),
    quote_ident(table.id_column()),
    table.qualified(table.version_column()),
    quote_ident(MAX_VERSION),
  );

  main.join(latest_view(table), LATEST_ALIAS, on)
}
