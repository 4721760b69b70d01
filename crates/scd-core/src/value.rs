//! [`Value`] — the scalar exchanged between records, filters and storage.
//!
//! The variants follow the storage classes of a relational column. Encoding
//! rules that matter for filtering:
//!
//! - `bool` is stored as `0` / `1`.
//! - `Uuid` is stored as hyphenated lowercase text.
//! - `DateTime<Utc>` is stored as RFC 3339 text with a `Z` suffix, which is
//!   exactly what serde writes for a `DateTime<Utc>` field, so a filter value
//!   and a persisted field compare as equal strings.
//! - Integers must fit `i64`; larger ones have no storage form.
//!
//! Record fields holding booleans or nested data are persisted through
//! [`Field::flag`](crate::Field::flag) and [`Field::json`](crate::Field::json).

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
  #[default]
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
  Blob(Vec<u8>),
}

impl Value {
  pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Value::Integer(i) => Some(*i),
      _ => None,
    }
  }

  pub fn as_str(&self) -> Option<&str> {
    match self {
      Value::Text(s) => Some(s),
      _ => None,
    }
  }

  // ─── JSON ─────────────────────────────────────────────────────────────────

  /// Map a serialized record field onto a storage scalar.
  ///
  /// Nested arrays and objects become compact JSON text. Returns `None` for
  /// integers outside the `i64` range rather than rounding them to a float.
  pub fn from_json(json: serde_json::Value) -> Option<Self> {
    use serde_json::Value as Json;

    Some(match json {
      Json::Null => Value::Null,
      Json::Bool(b) => Value::Integer(b as i64),
      Json::Number(n) => match n.as_i64() {
        Some(i) => Value::Integer(i),
        None if n.is_f64() => Value::Real(n.as_f64()?),
        None => return None,
      },
      Json::String(s) => Value::Text(s),
      nested @ (Json::Array(_) | Json::Object(_)) => {
        Value::Text(nested.to_string())
      }
    })
  }

  /// Map a storage scalar onto the JSON shape serde expects for a field.
  ///
  /// Blobs become arrays of bytes, which is how serde reads a `Vec<u8>`.
  pub fn into_json(self) -> serde_json::Value {
    use serde_json::Value as Json;

    match self {
      Value::Null => Json::Null,
      Value::Integer(i) => Json::from(i),
      Value::Real(f) => serde_json::Number::from_f64(f)
        .map(Json::Number)
        .unwrap_or(Json::Null),
      Value::Text(s) => Json::String(s),
      Value::Blob(bytes) => Json::Array(bytes.into_iter().map(Json::from).collect()),
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Null => f.write_str("NULL"),
      Value::Integer(i) => write!(f, "{i}"),
      Value::Real(r) => write!(f, "{r}"),
      Value::Text(s) => write!(f, "{s:?}"),
      Value::Blob(b) => write!(f, "<{} bytes>", b.len()),
    }
  }
}

// ─── Conversions ─────────────────────────────────────────────────────────────

impl From<&str> for Value {
  fn from(s: &str) -> Self { Value::Text(s.to_owned()) }
}

impl From<String> for Value {
  fn from(s: String) -> Self { Value::Text(s) }
}

impl From<&String> for Value {
  fn from(s: &String) -> Self { Value::Text(s.clone()) }
}

macro_rules! integer_value {
  ($($t:ty),*) => {
    $(
      impl From<$t> for Value {
        fn from(i: $t) -> Self { Value::Integer(i as i64) }
      }
    )*
  };
}

integer_value!(i8, i16, i32, i64, u8, u16, u32);

impl From<f64> for Value {
  fn from(f: f64) -> Self { Value::Real(f) }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self { Value::Integer(b as i64) }
}

impl From<Uuid> for Value {
  fn from(id: Uuid) -> Self { Value::Text(id.hyphenated().to_string()) }
}

impl From<DateTime<Utc>> for Value {
  fn from(dt: DateTime<Utc>) -> Self {
    Value::Text(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
  }
}

impl From<Vec<u8>> for Value {
  fn from(bytes: Vec<u8>) -> Self { Value::Blob(bytes) }
}

impl<T: Into<Value>> From<Option<T>> for Value {
  fn from(opt: Option<T>) -> Self { opt.map_or(Value::Null, Into::into) }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use serde_json::json;

  use super::*;

  #[test]
  fn json_scalars_map_to_storage_classes() {
    assert_eq!(Value::from_json(json!(null)), Some(Value::Null));
    assert_eq!(Value::from_json(json!(true)), Some(Value::Integer(1)));
    assert_eq!(Value::from_json(json!(42)), Some(Value::Integer(42)));
    assert_eq!(Value::from_json(json!(1.5)), Some(Value::Real(1.5)));
    assert_eq!(Value::from_json(json!("x")), Some(Value::Text("x".into())));
    assert_eq!(
      Value::from_json(json!(["a", "b"])),
      Some(Value::Text(r#"["a","b"]"#.into()))
    );
  }

  #[test]
  fn integers_beyond_i64_have_no_storage_form() {
    assert_eq!(Value::from_json(json!(u64::MAX)), None);
    assert_eq!(Value::from_json(json!(i64::MAX as u64 + 1)), None);
    assert_eq!(
      Value::from_json(json!(i64::MAX as u64)),
      Some(Value::Integer(i64::MAX))
    );
  }

  #[test]
  fn datetime_matches_serde_encoding() {
    let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
    let via_serde = serde_json::to_value(dt).unwrap();
    assert_eq!(Some(Value::from(dt)), Value::from_json(via_serde));
  }

  #[test]
  fn option_none_is_null() {
    assert_eq!(Value::from(None::<i64>), Value::Null);
    assert_eq!(Value::from(Some("a")), Value::Text("a".into()));
  }
}
