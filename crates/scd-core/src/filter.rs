//! Caller-supplied predicates.
//!
//! A [`Filter`] transforms a [`Query`]; filters passed to a read are applied
//! to the main query in order and combine with AND. Any
//! `Fn(Query) -> Query` closure is a filter, and the helpers below cover the
//! common comparisons. Helper column names are qualified with the query's own
//! table so they cannot collide with columns of the joined latest-version
//! view.

use crate::{Query, Value};

pub trait Filter: Send + Sync {
  fn apply(&self, query: Query) -> Query;
}

impl<F> Filter for F
where
  F: Fn(Query) -> Query + Send + Sync,
{
  fn apply(&self, query: Query) -> Query { self(query) }
}

// ─── Comparisons ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
  Eq,
  Ne,
  Lt,
  Le,
  Gt,
  Ge,
  Like,
}

impl Op {
  fn as_sql(self) -> &'static str {
    match self {
      Op::Eq => "=",
      Op::Ne => "<>",
      Op::Lt => "<",
      Op::Le => "<=",
      Op::Gt => ">",
      Op::Ge => ">=",
      Op::Like => "LIKE",
    }
  }
}

/// `column <op> value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Compare {
  column: String,
  op:     Op,
  value:  Value,
}

impl Filter for Compare {
  fn apply(&self, query: Query) -> Query {
    let column = query.column(&self.column);
    match (self.op, &self.value) {
      // `= NULL` never matches; treat it as the null test the caller meant.
      (Op::Eq, Value::Null) => query.filter(format!("{column} IS NULL"), []),
      (Op::Ne, Value::Null) => {
        query.filter(format!("{column} IS NOT NULL"), [])
      }
      (op, value) => query.filter(
        format!("{column} {} ?", op.as_sql()),
        [value.clone()],
      ),
    }
  }
}

fn compare(column: impl Into<String>, op: Op, value: impl Into<Value>) -> Compare {
  Compare { column: column.into(), op, value: value.into() }
}

pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Compare {
  compare(column, Op::Eq, value)
}

pub fn ne(column: impl Into<String>, value: impl Into<Value>) -> Compare {
  compare(column, Op::Ne, value)
}

pub fn lt(column: impl Into<String>, value: impl Into<Value>) -> Compare {
  compare(column, Op::Lt, value)
}

pub fn le(column: impl Into<String>, value: impl Into<Value>) -> Compare {
  compare(column, Op::Le, value)
}

pub fn gt(column: impl Into<String>, value: impl Into<Value>) -> Compare {
  compare(column, Op::Gt, value)
}

pub fn ge(column: impl Into<String>, value: impl Into<Value>) -> Compare {
  compare(column, Op::Ge, value)
}

pub fn like(column: impl Into<String>, pattern: impl Into<Value>) -> Compare {
  compare(column, Op::Like, pattern)
}

// ─── Null tests ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullTest {
  column:  String,
  negated: bool,
}

impl Filter for NullTest {
  fn apply(&self, query: Query) -> Query {
    let column = query.column(&self.column);
    let test = if self.negated { "IS NOT NULL" } else { "IS NULL" };
    query.filter(format!("{column} {test}"), [])
  }
}

pub fn is_null(column: impl Into<String>) -> NullTest {
  NullTest { column: column.into(), negated: false }
}

pub fn is_not_null(column: impl Into<String>) -> NullTest {
  NullTest { column: column.into(), negated: true }
}

// ─── Membership ──────────────────────────────────────────────────────────────

/// `column IN (…)`. An empty list matches nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct InList {
  column: String,
  values: Vec<Value>,
}

impl Filter for InList {
  fn apply(&self, query: Query) -> Query {
    if self.values.is_empty() {
      return query.filter("1 = 0", []);
    }
    let column = query.column(&self.column);
    let marks = vec!["?"; self.values.len()].join(", ");
    query.filter(format!("{column} IN ({marks})"), self.values.clone())
  }
}

pub fn in_list<V: Into<Value>>(
  column: impl Into<String>,
  values: impl IntoIterator<Item = V>,
) -> InList {
  InList {
    column: column.into(),
    values: values.into_iter().map(Into::into).collect(),
  }
}

// ─── Raw SQL ─────────────────────────────────────────────────────────────────

/// A raw condition. Unqualified column names are the caller's responsibility;
/// the identity and version columns must be qualified with the table name
/// because the latest-version view exposes an identity column as well. An
/// unqualified one fails at execution as an ambiguous column.
///
/// Build qualified names with [`Query::column`] inside a closure filter, or
/// with [`VersionedTable::qualified`](crate::VersionedTable::qualified):
///
/// ```
/// use scd_core::{Filter, Query, Value};
///
/// let by_id = |q: Query| {
///   let sql = format!("{} = ?", q.column("user_id"));
///   q.filter(sql, [Value::from("u1")])
/// };
/// let (sql, _) = by_id.apply(Query::table("users")).to_sql();
/// assert!(sql.ends_with(r#"WHERE ("users"."user_id" = ?)"#));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Raw {
  sql:    String,
  params: Vec<Value>,
}

impl Filter for Raw {
  fn apply(&self, query: Query) -> Query {
    query.filter(self.sql.clone(), self.params.clone())
  }
}

pub fn raw<V: Into<Value>>(
  sql: impl Into<String>,
  params: impl IntoIterator<Item = V>,
) -> Raw {
  Raw {
    sql:    sql.into(),
    params: params.into_iter().map(Into::into).collect(),
  }
}
