//! A narrow, backend-neutral query builder.
//!
//! [`Query`] carries exactly the capabilities the resolver and the versioner
//! need: projection, conjunctive predicates, grouping, ordering and an inner
//! join against a derived table. It renders to SQL with positional `?`
//! placeholders; parameters are returned in the order their placeholders
//! appear in the text.

use crate::Value;

/// Quote an identifier for SQL, doubling any embedded quote.
pub fn quote_ident(ident: &str) -> String {
  format!("\"{}\"", ident.replace('"', "\"\""))
}

/// One conjunct of a `WHERE` clause.
#[derive(Debug, Clone, PartialEq)]
struct Predicate {
  sql:    String,
  params: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
struct Join {
  source: Box<Query>,
  alias:  String,
  on:     String,
}

/// A `SELECT` over one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
  table:      String,
  projection: Vec<String>,
  joins:      Vec<Join>,
  predicates: Vec<Predicate>,
  group_by:   Vec<String>,
  order_by:   Vec<String>,
  limit:      Option<u64>,
}

impl Query {
  /// Start a query over `table`. Without an explicit projection it selects
  /// every column of `table` (and only of `table`, even when joined).
  pub fn table(table: impl Into<String>) -> Self {
    Self {
      table:      table.into(),
      projection: Vec::new(),
      joins:      Vec::new(),
      predicates: Vec::new(),
      group_by:   Vec::new(),
      order_by:   Vec::new(),
      limit:      None,
    }
  }

  pub fn table_name(&self) -> &str { &self.table }

  /// `"table"."column"` for this query's table.
  pub fn column(&self, column: &str) -> String {
    format!("{}.{}", quote_ident(&self.table), quote_ident(column))
  }

  /// Append a select expression. Expressions are raw SQL.
  pub fn select(mut self, expr: impl Into<String>) -> Self {
    self.projection.push(expr.into());
    self
  }

  /// AND a raw SQL condition onto the query. `?` placeholders in `sql` bind
  /// `params` in order.
  pub fn filter(
    mut self,
    sql: impl Into<String>,
    params: impl IntoIterator<Item = Value>,
  ) -> Self {
    self.predicates.push(Predicate {
      sql:    sql.into(),
      params: params.into_iter().collect(),
    });
    self
  }

  pub fn group_by(mut self, expr: impl Into<String>) -> Self {
    self.group_by.push(expr.into());
    self
  }

  pub fn order_by(mut self, expr: impl Into<String>) -> Self {
    self.order_by.push(expr.into());
    self
  }

  pub fn limit(mut self, n: u64) -> Self {
    self.limit = Some(n);
    self
  }

  /// Inner-join `source` as a derived table named `alias`. `on` is raw SQL.
  pub fn join(
    mut self,
    source: Query,
    alias: impl Into<String>,
    on: impl Into<String>,
  ) -> Self {
    self.joins.push(Join {
      source: Box::new(source),
      alias:  alias.into(),
      on:     on.into(),
    });
    self
  }

  /// Render to `(sql, params)`.
  pub fn to_sql(&self) -> (String, Vec<Value>) {
    let mut params = Vec::new();
    let sql = self.render(&mut params);
    (sql, params)
  }

  fn render(&self, params: &mut Vec<Value>) -> String {
    let table = quote_ident(&self.table);

    let projection = if self.projection.is_empty() {
      format!("{table}.*")
    } else {
      self.projection.join(", ")
    };

    let mut sql = format!("SELECT {projection} FROM {table}");

    for join in &self.joins {
      let inner = join.source.render(params);
      sql.push_str(&format!(
        " JOIN ({inner}) AS {} ON {}",
        quote_ident(&join.alias),
        join.on
      ));
    }

    if !self.predicates.is_empty() {
      let conds: Vec<String> = self
        .predicates
        .iter()
        .map(|p| {
          params.extend(p.params.iter().cloned());
          format!("({})", p.sql)
        })
        .collect();
      sql.push_str(" WHERE ");
      sql.push_str(&conds.join(" AND "));
    }

    if !self.group_by.is_empty() {
      sql.push_str(" GROUP BY ");
      sql.push_str(&self.group_by.join(", "));
    }

    if !self.order_by.is_empty() {
      sql.push_str(" ORDER BY ");
      sql.push_str(&self.order_by.join(", "));
    }

    if let Some(n) = self.limit {
      sql.push_str(&format!(" LIMIT {n}"));
    }

    sql
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bare_query_selects_table_columns() {
    let (sql, params) = Query::table("users").to_sql();
    assert_eq!(sql, r#"SELECT "users".* FROM "users""#);
    assert!(params.is_empty());

    let (sql, _) = Query::table("users").order_by("name").limit(5).to_sql();
    assert_eq!(sql, r#"SELECT "users".* FROM "users" ORDER BY name LIMIT 5"#);
  }

  #[test]
  fn predicates_are_conjunctive_and_ordered() {
    let (sql, params) = Query::table("users")
      .filter("status = ?", [Value::from("active")])
      .filter("age > ?", [Value::from(30)])
      .to_sql();
    assert_eq!(
      sql,
      r#"SELECT "users".* FROM "users" WHERE (status = ?) AND (age > ?)"#
    );
    assert_eq!(params, vec![Value::from("active"), Value::Integer(30)]);
  }

  #[test]
  fn join_params_precede_where_params() {
    let sub = Query::table("t")
      .select("id")
      .filter("kind = ?", [Value::from("sub")])
      .group_by("id");
    let (sql, params) = Query::table("t")
      .filter("name = ?", [Value::from("main")])
      .join(sub, "s", r#""t"."id" = "s"."id""#)
      .to_sql();

    assert_eq!(
      sql,
      r#"SELECT "t".* FROM "t" JOIN (SELECT id FROM "t" WHERE (kind = ?) GROUP BY id) AS "s" ON "t"."id" = "s"."id" WHERE (name = ?)"#
    );
    assert_eq!(params, vec![Value::from("sub"), Value::from("main")]);
  }

  #[test]
  fn quote_ident_escapes_quotes() {
    assert_eq!(quote_ident(r#"we"ird"#), r#""we""ird""#);
  }
}
