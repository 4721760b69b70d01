//! Mapping between storage columns and the fields of a record type.
//!
//! Each [`Record`] declares its field ↔ column pairs at compile time in
//! [`Record::FIELDS`]; nothing is discovered per call. Field values are read
//! and written through the record's serde representation, its [`Shape`]:
//! field names are the keys serde emits.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value as Json};

use crate::{Error, Result, Value};

/// How a field's serialized value is laid out in its column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
  /// Strings, numbers and null, stored as they are.
  #[default]
  Scalar,
  /// A `bool` stored as `0` / `1`.
  Flag,
  /// Any serde value stored as compact JSON text: sequences, maps, nested
  /// structs.
  Json,
}

/// One field of a record and the column it is persisted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
  pub name:     &'static str,
  pub column:   &'static str,
  pub encoding: Encoding,
}

impl Field {
  pub const fn new(name: &'static str, column: &'static str) -> Self {
    Self { name, column, encoding: Encoding::Scalar }
  }

  /// A field persisted in a column of the same name.
  pub const fn same(name: &'static str) -> Self { Self::new(name, name) }

  pub const fn flag(name: &'static str, column: &'static str) -> Self {
    Self { name, column, encoding: Encoding::Flag }
  }

  pub const fn json(name: &'static str, column: &'static str) -> Self {
    Self { name, column, encoding: Encoding::Json }
  }

  /// The column value for this field's serialized form.
  pub fn encode(&self, json: Json) -> Result<Value> {
    let unencodable = |reason: &str| Error::Unencodable {
      field:  self.name.to_owned(),
      reason: reason.to_owned(),
    };

    match (self.encoding, json) {
      (_, Json::Null) => Ok(Value::Null),
      (Encoding::Json, json) => Ok(Value::Text(json.to_string())),
      (Encoding::Flag, Json::Bool(b)) => Ok(Value::from(b)),
      (Encoding::Flag, _) => Err(unencodable("expected a boolean")),
      (Encoding::Scalar, Json::Bool(_)) => {
        Err(unencodable("booleans are persisted through Field::flag"))
      }
      (Encoding::Scalar, Json::Array(_) | Json::Object(_)) => {
        Err(unencodable("nested values are persisted through Field::json"))
      }
      (Encoding::Scalar, json) => Value::from_json(json)
        .ok_or_else(|| unencodable("integer does not fit in a signed 64-bit column")),
    }
  }

  /// The serialized form serde expects for a column value read back.
  pub fn decode(&self, value: Value) -> Result<Json> {
    match (self.encoding, value) {
      (_, Value::Null) => Ok(Json::Null),
      (Encoding::Json, Value::Text(text)) => {
        serde_json::from_str(&text).map_err(Error::Decode)
      }
      (Encoding::Flag, Value::Integer(0)) => Ok(Json::Bool(false)),
      (Encoding::Flag, Value::Integer(1)) => Ok(Json::Bool(true)),
      (Encoding::Flag, other) => Err(Error::Decode(serde::de::Error::custom(
        format!("column {:?} holds {other}, expected 0 or 1", self.column),
      ))),
      (_, value) => Ok(value.into_json()),
    }
  }
}

/// A row type of a versioned table.
///
/// Fields missing from `FIELDS` are neither inserted nor read back; give them
/// `#[serde(default)]` if the type should still deserialize.
pub trait Record: Serialize + DeserializeOwned + Send + Sync + 'static {
  const FIELDS: &'static [Field];
}

fn type_name<R>() -> &'static str { std::any::type_name::<R>() }

// ─── Accessor operations ─────────────────────────────────────────────────────

/// The name of the field of `R` persisted in `column`.
pub fn resolve_field_name<R: Record>(_record: &R, column: &str) -> Result<&'static str> {
  field_for_column::<R>(column).map(|f| f.name)
}

pub fn get_field_value<R: Record>(record: &R, field: &str) -> Result<Value> {
  Shape::of(record)?.get(field)
}

/// Overwrite one field of `record`. On error `record` is left untouched.
pub fn set_field_value<R: Record>(record: &mut R, field: &str, value: Value) -> Result<()> {
  *record = Shape::of(record)?.assign(field, value)?;
  Ok(())
}

pub fn field_for_column<R: Record>(column: &str) -> Result<&'static Field> {
  R::FIELDS
    .iter()
    .find(|f| f.column == column)
    .ok_or_else(|| Error::ColumnNotMapped {
      column: column.to_owned(),
      record: type_name::<R>(),
    })
}

/// Build a record from `(column, value)` pairs as read from storage. Columns
/// no field maps to are ignored.
pub fn from_columns<R: Record>(
  columns: impl IntoIterator<Item = (String, Value)>,
) -> Result<R> {
  let mut map = Map::new();
  for (column, value) in columns {
    if let Some(field) = R::FIELDS.iter().find(|f| f.column == column) {
      map.insert(field.name.to_owned(), field.decode(value)?);
    }
  }
  serde_json::from_value(Json::Object(map)).map_err(Error::Decode)
}

// ─── Shape ───────────────────────────────────────────────────────────────────

/// The serialized, field-addressable form of one record value.
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
  record: &'static str,
  fields: Map<String, Json>,
}

impl Shape {
  pub fn of<R: Record>(record: &R) -> Result<Self> {
    match serde_json::to_value(record).map_err(Error::Encode)? {
      Json::Object(fields) => Ok(Self { record: type_name::<R>(), fields }),
      _ => Err(Error::NotARecord(type_name::<R>())),
    }
  }

  /// The value of `field` as a storage scalar. Booleans read as `0` / `1` and
  /// nested values as JSON text.
  pub fn get(&self, field: &str) -> Result<Value> {
    let json = self
      .fields
      .get(field)
      .cloned()
      .ok_or_else(|| Error::FieldNotFound(field.to_owned()))?;

    Value::from_json(json).ok_or_else(|| Error::Unencodable {
      field:  field.to_owned(),
      reason: "integer does not fit in a signed 64-bit column".to_owned(),
    })
  }

  /// Produce a new `R` equal to this shape with `field` replaced by `value`.
  ///
  /// A mapped field takes `value` in its column form, e.g. JSON text for a
  /// [`Field::json`] field. Fails with [`Error::Unassignable`] when the value
  /// does not fit the field's type, or when the field ignores what is written
  /// to it (for example `#[serde(skip_deserializing)]`).
  pub fn assign<R: Record>(&self, field: &str, value: Value) -> Result<R> {
    if !self.fields.contains_key(field) {
      return Err(Error::FieldNotFound(field.to_owned()));
    }

    let unassignable = |reason: String| Error::Unassignable { field: field.to_owned(), reason };

    let written = match R::FIELDS.iter().find(|f| f.name == field) {
      Some(mapped) => mapped.decode(value).map_err(|e| unassignable(e.to_string()))?,
      None => value.into_json(),
    };
    let mut fields = self.fields.clone();
    fields.insert(field.to_owned(), written.clone());

    let record: R = serde_json::from_value(Json::Object(fields))
      .map_err(|e| unassignable(e.to_string()))?;

    let stored = Shape::of(&record)?.fields.remove(field).unwrap_or(Json::Null);
    if !same_json(&stored, &written) {
      return Err(unassignable(format!("{} does not keep assigned values", self.record)));
    }

    Ok(record)
  }

  /// `(column, value)` for every mapped field present in the shape, in
  /// `FIELDS` order, skipping `exclude`. Each value is encoded per its
  /// field's [`Encoding`].
  pub fn columns<R: Record>(
    &self,
    exclude: Option<&str>,
  ) -> Result<Vec<(&'static str, Value)>> {
    R::FIELDS
      .iter()
      .filter(|f| Some(f.column) != exclude)
      .filter_map(|f| {
        let json = self.fields.get(f.name)?;
        Some(f.encode(json.clone()).map(|value| (f.column, value)))
      })
      .collect()
  }
}

fn same_json(a: &Json, b: &Json) -> bool {
  match (a, b) {
    (Json::Number(x), Json::Number(y)) => x.as_f64() == y.as_f64(),
    _ => a == b,
  }
}
