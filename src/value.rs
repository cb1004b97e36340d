//! In-memory values held by generated instances.
//!
//! Raw JSON is lifted into [`Value`] before casting; casting replaces maps with
//! typed objects/enum members and strings with timestamps/UUIDs where the
//! schema asks for them. Encoding goes the other way and is the only place
//! where non-JSON-native values are rendered as text.
use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use uuid::Uuid;

use crate::composite::EnumMember;
use crate::error::{Error, Result};
use crate::object::SchemaObject;

/// Output layout for timestamps: microseconds, UTC, trailing `Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Number(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Uuid(Uuid),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    Object(SchemaObject),
    Enum(EnumMember),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
    pub fn as_datetime(&self) -> Option<&DateTime<Utc>> {
        match self {
            Value::DateTime(dt) => Some(dt),
            _ => None,
        }
    }
    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Value::Uuid(id) => Some(id),
            _ => None,
        }
    }
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }
    pub fn as_object(&self) -> Option<&SchemaObject> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }
    pub fn as_enum(&self) -> Option<&EnumMember> {
        match self {
            Value::Enum(member) => Some(member),
            _ => None,
        }
    }

    /// Short name of the runtime type, used in error messages.
    pub fn type_label(&self) -> String {
        match self {
            Value::Null => "null".into(),
            Value::Bool(_) => "boolean".into(),
            Value::Integer(_) => "integer".into(),
            Value::Number(_) => "number".into(),
            Value::String(_) => "string".into(),
            Value::DateTime(_) => "date-time".into(),
            Value::Uuid(_) => "uuid".into(),
            Value::List(_) => "array".into(),
            Value::Map(_) => "object".into(),
            Value::Object(obj) => obj.type_name().to_string(),
            Value::Enum(member) => member.enum_name.clone(),
        }
    }

    /// Plain-data form: instances become maps keyed by external names, enum
    /// members become `{"Id", "Description"}` (or their literal). Recurses
    /// through lists and maps.
    pub fn to_plain(&self) -> Value {
        match self {
            Value::Object(obj) => Value::Map(obj.to_dict()),
            Value::Enum(member) => member.to_plain(),
            Value::List(items) => Value::List(items.iter().map(Value::to_plain).collect()),
            Value::Map(map) => Value::Map(map.iter().map(|(k, v)| (k.clone(), v.to_plain())).collect()),
            other => other.clone(),
        }
    }

    /// Encode as JSON. Fails for numbers JSON cannot carry (NaN, infinities).
    pub fn to_json(&self) -> Result<serde_json::Value> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .ok_or_else(|| Error::serialization(format!("number {n} is not representable in JSON")))?,
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::DateTime(dt) => serde_json::Value::String(format_timestamp(dt)),
            Value::Uuid(id) => serde_json::Value::String(id.hyphenated().to_string()),
            Value::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (ix, item) in items.iter().enumerate() {
                    out.push(item.to_json().map_err(|err| err.at_index(ix))?);
                }
                serde_json::Value::Array(out)
            }
            Value::Map(map) => {
                let mut out = serde_json::Map::new();
                for (key, item) in map {
                    out.insert(key.clone(), item.to_json().map_err(|err| err.at_field(key.as_str()))?);
                }
                serde_json::Value::Object(out)
            }
            Value::Object(obj) => obj.to_json_value()?,
            Value::Enum(member) => member.to_plain().to_json()?,
        })
    }
}

pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

// ------------------------------ Lifting ---------------------------------- //

impl From<serde_json::Value> for Value {
    fn from(raw: serde_json::Value) -> Self {
        match raw {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => Value::Map(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect()),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}
impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}
impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}
impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Integer(i64::from(i))
    }
}
impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}
impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Value::DateTime(dt)
    }
}
impl From<Uuid> for Value {
    fn from(id: Uuid) -> Self {
        Value::Uuid(id)
    }
}
impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}
impl From<IndexMap<String, Value>> for Value {
    fn from(map: IndexMap<String, Value>) -> Self {
        Value::Map(map)
    }
}
impl From<SchemaObject> for Value {
    fn from(obj: SchemaObject) -> Self {
        Value::Object(obj)
    }
}
impl From<EnumMember> for Value {
    fn from(member: EnumMember) -> Self {
        Value::Enum(member)
    }
}

// ------------------------------ Display ---------------------------------- //

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Number(n) => write!(f, "{n:?}"),
            Value::String(s) => write!(f, "{s:?}"),
            Value::DateTime(dt) => f.write_str(&format_timestamp(dt)),
            Value::Uuid(id) => write!(f, "{}", id.hyphenated()),
            Value::List(items) => {
                f.write_str("[")?;
                for (ix, item) in items.iter().enumerate() {
                    if ix > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (ix, (key, item)) in map.iter().enumerate() {
                    if ix > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key:?}: {item}")?;
                }
                f.write_str("}")
            }
            Value::Object(obj) => write!(f, "{obj}"),
            Value::Enum(member) => write!(f, "{}.{}", member.enum_name, member.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn lifts_json_numbers_by_kind() {
        assert_eq!(Value::from(json!(3)), Value::Integer(3));
        assert_eq!(Value::from(json!(3.5)), Value::Number(3.5));
        assert_eq!(Value::from(json!(u64::MAX)), Value::Number(u64::MAX as f64));
    }

    #[test]
    fn lifted_maps_keep_order() {
        let lifted = Value::from(json!({"b": 1, "a": [true, null]}));
        let keys: Vec<_> = lifted.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn encodes_timestamps_and_uuids() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5).unwrap();
        let id = Uuid::parse_str("A1B2C3D4-0000-4000-8000-000000000001").unwrap();
        let value = Value::List(vec![Value::DateTime(dt), Value::Uuid(id)]);
        assert_eq!(
            value.to_json().unwrap(),
            json!(["2024-03-01T12:30:05.000000Z", "a1b2c3d4-0000-4000-8000-000000000001"])
        );
    }

    #[test]
    fn non_finite_numbers_fail_with_path() {
        let mut map = IndexMap::new();
        map.insert("Mass".to_string(), Value::List(vec![Value::Number(1.0), Value::Number(f64::NAN)]));
        let err = Value::Map(map).to_json().unwrap_err();
        assert!(matches!(err, Error::Serialization { .. }));
        assert_eq!(err.path().unwrap().to_string(), "$.Mass[1]");
    }

    #[test]
    fn display_is_compact() {
        let value = Value::from(json!({"a": [1, 2.5, "x", null]}));
        assert_eq!(value.to_string(), r#"{"a": [1, 2.5, "x", null]}"#);
    }
}
