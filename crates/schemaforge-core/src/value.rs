//! Dynamic entity values.
//!
//! Entities handled by compiled schemas are plain trees of [`Value`]. A field
//! that is missing from its parent object is *absent*; a field holding
//! [`Value::Null`] is an explicit null. Most operations treat the two
//! differently: absent fields are omitted from generated literals, nulls are
//! copied.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, SchemaError};
use crate::path::FieldPath;

/// Field map of an object value. Insertion order is preserved.
pub type Object = IndexMap<String, Value>;

/// A value in a dynamic entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Explicit null.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit signed integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value.
    String(String),
    /// Point in time, always UTC.
    Date(DateTime<Utc>),
    /// List of values.
    List(Vec<Value>),
    /// Nested object.
    Object(Object),
}

impl Value {
    /// Creates an empty object value.
    pub fn object() -> Self {
        Value::Object(Object::new())
    }

    /// Short name of the variant, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Int(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    /// Returns true if this value is Null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Attempts to extract a bool value.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to extract an i64 value.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Attempts to extract an f64 value. Integers widen.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Attempts to extract a string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to extract a list.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// Attempts to extract an object.
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Attempts to extract a mutable object.
    pub fn as_object_mut(&mut self) -> Option<&mut Object> {
        match self {
            Value::Object(v) => Some(v),
            _ => None,
        }
    }

    /// Looks up the value at `path`. The root path returns `self`.
    ///
    /// Returns `None` if any segment is absent or traverses a non-object.
    pub fn get_path(&self, path: &FieldPath) -> Option<&Value> {
        path.segments()
            .iter()
            .try_fold(self, |current, segment| current.as_object()?.get(segment))
    }

    /// Mutable variant of [`Value::get_path`].
    pub fn get_path_mut(&mut self, path: &FieldPath) -> Option<&mut Value> {
        path.segments().iter().try_fold(self, |current, segment| {
            current.as_object_mut()?.get_mut(segment)
        })
    }

    /// Returns true if `path` resolves to a value, null included.
    pub fn has_path(&self, path: &FieldPath) -> bool {
        self.get_path(path).is_some()
    }

    /// Returns true if `path` is absent or null.
    pub fn is_missing(&self, path: &FieldPath) -> bool {
        self.get_path(path).map_or(true, Value::is_null)
    }

    /// Writes `value` at `path`, creating absent intermediate objects.
    ///
    /// Returns the previous value at `path`, if any. Fails with
    /// [`SchemaError::InvalidTarget`] if an intermediate (or `self`) is null
    /// or not an object.
    pub fn set_path(&mut self, path: &FieldPath, value: Value) -> Result<Option<Value>> {
        let Some((leaf, parents)) = path.segments().split_last() else {
            return Ok(Some(std::mem::replace(self, value)));
        };
        let invalid = || SchemaError::InvalidTarget {
            path: path.to_string(),
        };
        let mut current = self;
        for segment in parents {
            let object = current.as_object_mut().ok_or_else(invalid)?;
            current = object.entry(segment.clone()).or_insert_with(Value::object);
        }
        let object = current.as_object_mut().ok_or_else(invalid)?;
        Ok(object.insert(leaf.clone(), value))
    }

    /// Removes the value at `path`, returning it.
    pub fn remove_path(&mut self, path: &FieldPath) -> Option<Value> {
        let (leaf, _) = path.segments().split_last()?;
        let parent = self.get_path_mut(&path.parent()?)?;
        parent.as_object_mut()?.shift_remove(leaf)
    }

    /// Stringifies the value for interpolation into a hash.
    ///
    /// Strings are raw, dates are RFC 3339 with milliseconds, nested
    /// lists and objects are compact JSON.
    pub fn hash_segment(&self) -> String {
        match self {
            Value::Null => "null".to_owned(),
            Value::Bool(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::String(v) => v.clone(),
            Value::Date(v) => format_date(v),
            Value::List(_) | Value::Object(_) => self.to_json().to_string(),
        }
    }

    /// Stringifies a key value so that distinct values never collide.
    ///
    /// Compact JSON: strings are quoted, so `""` and `"null"` differ from
    /// each other, from `null`, and from the empty segment of an absent key.
    pub fn key_segment(&self) -> String {
        self.to_json().to_string()
    }

    /// Converts into a `serde_json::Value`. Dates become RFC 3339 strings.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(v) => serde_json::Value::Bool(*v),
            Value::Int(v) => serde_json::Value::from(*v),
            Value::Float(v) => serde_json::Number::from_f64(*v)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(v) => serde_json::Value::String(v.clone()),
            Value::Date(v) => serde_json::Value::String(format_date(v)),
            Value::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Value::Object(fields) => serde_json::Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

/// Formats a date as RFC 3339 with millisecond precision and a `Z` suffix.
pub fn format_date(date: &DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an RFC 3339 string into a UTC date.
pub fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Converts milliseconds since the Unix epoch into a UTC date.
pub fn date_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(v) => Value::Bool(v),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(v) => Value::String(v),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(fields) => {
                Value::Object(fields.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Date(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Value::Object(v)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        Value::from(json!({
            "id": "1",
            "address": { "city": "X", "zip": null }
        }))
    }

    #[test]
    fn test_get_path() {
        let v = sample();
        assert_eq!(v.get_path(&"address.city".into()), Some(&Value::from("X")));
        assert_eq!(v.get_path(&"address.zip".into()), Some(&Value::Null));
        assert_eq!(v.get_path(&"address.street".into()), None);
        assert_eq!(v.get_path(&"id.nested".into()), None);
        assert_eq!(v.get_path(&FieldPath::root()), Some(&v));
    }

    #[test]
    fn test_is_missing() {
        let v = sample();
        assert!(v.is_missing(&"address.zip".into()));
        assert!(v.is_missing(&"nope".into()));
        assert!(!v.is_missing(&"id".into()));
    }

    #[test]
    fn test_set_path_creates_intermediates() {
        let mut v = Value::object();
        let previous = v.set_path(&"a.b.c".into(), Value::Int(1)).unwrap();
        assert_eq!(previous, None);
        assert_eq!(v.get_path(&"a.b.c".into()), Some(&Value::Int(1)));

        let previous = v.set_path(&"a.b.c".into(), Value::Int(2)).unwrap();
        assert_eq!(previous, Some(Value::Int(1)));
    }

    #[test]
    fn test_set_path_through_null_fails() {
        let mut v = sample();
        v.set_path(&"address".into(), Value::Null).unwrap();
        let err = v.set_path(&"address.city".into(), Value::from("Y")).unwrap_err();
        assert_eq!(
            err,
            SchemaError::InvalidTarget {
                path: "address.city".into()
            }
        );
    }

    #[test]
    fn test_remove_path() {
        let mut v = sample();
        assert_eq!(v.remove_path(&"address.city".into()), Some(Value::from("X")));
        assert!(!v.has_path(&"address.city".into()));
        assert_eq!(v.remove_path(&FieldPath::root()), None);
    }

    #[test]
    fn test_hash_segment() {
        let date = parse_date("2024-05-01T10:00:00Z").unwrap();
        assert_eq!(Value::Date(date).hash_segment(), "2024-05-01T10:00:00.000Z");
        assert_eq!(Value::Float(1.5).hash_segment(), "1.5");
        assert_eq!(Value::Null.hash_segment(), "null");
        assert_eq!(Value::from("a").hash_segment(), "a");
        assert_eq!(
            Value::List(vec![Value::Int(1), Value::from("x")]).hash_segment(),
            r#"[1,"x"]"#
        );
    }

    #[test]
    fn test_key_segment_quotes_strings() {
        assert_eq!(Value::from("a").key_segment(), r#""a""#);
        assert_eq!(Value::from("").key_segment(), r#""""#);
        assert_eq!(Value::from("null").key_segment(), r#""null""#);
        assert_eq!(Value::Null.key_segment(), "null");
        assert_eq!(Value::Int(7).key_segment(), "7");
    }

    #[test]
    fn test_json_conversion() {
        let json = json!({ "n": 1, "f": 2.5, "s": "x", "l": [true, null] });
        let value = Value::from(json.clone());
        assert_eq!(value.get_path(&"n".into()), Some(&Value::Int(1)));
        assert_eq!(value.get_path(&"f".into()), Some(&Value::Float(2.5)));
        assert_eq!(value.to_json(), json);
    }

    #[test]
    fn test_serde_through_json() {
        let value = sample();
        let text = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, value);
    }
}
