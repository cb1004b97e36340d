//! Casters: raw value → typed value.
//!
//! Every caster is idempotent: a value that is already of the target type is
//! returned unchanged, so the same caster serves property assignment and
//! discriminator resolution.
use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Timelike, Utc};
use uuid::Uuid;

use crate::dispatch::Dispatcher;
use crate::error::Error;
use crate::handle::NativeType;
use crate::registry::TypeRegistry;
use crate::value::{Value, format_timestamp};

// ------------------------------- Policy ---------------------------------- //

/// Layouts carrying an explicit offset, tried after RFC 3339.
const OFFSET_LAYOUTS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y/%m/%d %H:%M:%S%.f%:z",
];

/// Layouts without an offset; read as UTC.
const NAIVE_LAYOUTS: [&str; 8] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
];

// ------------------------------ Types ------------------------------------ //

#[derive(Debug, Clone, PartialEq)]
pub enum Caster {
    Identity,
    Native(NativeType),
    List(Box<Caster>),
    Enum(String),
    Composite(String),
    Polymorph(Box<Dispatcher>),
}

/// Why a cast did not produce a value.
#[derive(Debug)]
pub(crate) enum CastFailure {
    /// The value itself is of the wrong shape; handed back for the message.
    Mismatch { value: Value, detail: Option<String> },
    /// A nested construction failed; already carries its own context.
    Nested(Error),
}

impl From<Error> for CastFailure {
    fn from(err: Error) -> Self {
        CastFailure::Nested(err)
    }
}

impl CastFailure {
    fn mismatch(value: Value) -> Self {
        CastFailure::Mismatch { value, detail: None }
    }

    pub(crate) fn into_error(self, describe: impl FnOnce(&Value, Option<String>) -> String) -> Error {
        match self {
            CastFailure::Mismatch { value, detail } => Error::type_error(describe(&value, detail)),
            CastFailure::Nested(err) => err,
        }
    }
}

impl fmt::Display for Caster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Caster::Identity => f.write_str("Any"),
            Caster::Native(native) => write!(f, "{native}"),
            Caster::List(item) => write!(f, "List[{item}]"),
            Caster::Enum(name) | Caster::Composite(name) => f.write_str(name),
            Caster::Polymorph(dispatcher) => {
                let targets: Vec<&str> = dispatcher.branches().map(|branch| branch.target.as_str()).collect();
                write!(f, "Union[{}]", targets.join(", "))
            }
        }
    }
}

// ------------------------------ Casting ---------------------------------- //

pub(crate) fn apply(registry: &TypeRegistry, caster: &Caster, value: Value) -> Result<Value, CastFailure> {
    match caster {
        Caster::Identity => Ok(value),
        Caster::Native(native) => cast_native(*native, value),
        Caster::List(item_caster) => match value {
            Value::List(items) => {
                let mut out = Vec::with_capacity(items.len());
                for (ix, item) in items.into_iter().enumerate() {
                    let cast = apply(registry, item_caster, item).map_err(|failure| {
                        failure.into_error(|value, detail| {
                            let mut message = format!(
                                "item must be of type {item_caster} (value: {value}, type: {})",
                                value.type_label()
                            );
                            if let Some(detail) = detail {
                                message.push_str(": ");
                                message.push_str(&detail);
                            }
                            message
                        })
                    });
                    out.push(cast.map_err(|err| err.at_index(ix))?);
                }
                Ok(Value::List(out))
            }
            other => Err(CastFailure::mismatch(other)),
        },
        Caster::Enum(name) => {
            let enum_ty = registry.enum_type(name)?;
            match enum_ty.lookup(&value) {
                Some(member) => Ok(Value::Enum(member.clone())),
                None => Err(CastFailure::Mismatch { value, detail: Some(format!("not a member of {name}")) }),
            }
        }
        Caster::Composite(name) => match value {
            Value::Object(obj) if registry.is_subtype(obj.type_name(), name) => Ok(Value::Object(obj)),
            Value::Object(obj) => {
                let class = registry.class(name)?;
                Ok(Value::Object(class.from_map(obj.to_dict())?))
            }
            Value::Map(map) => {
                let class = registry.class(name)?;
                Ok(Value::Object(class.from_map(map)?))
            }
            other => Err(CastFailure::mismatch(other)),
        },
        Caster::Polymorph(dispatcher) => match value {
            Value::Object(obj) if dispatcher.branches().any(|b| registry.is_subtype(obj.type_name(), &b.target)) => {
                Ok(Value::Object(obj))
            }
            Value::Map(map) => Ok(dispatcher.discriminate(registry, map)?),
            other => Err(CastFailure::mismatch(other)),
        },
    }
}

pub fn conforms_native(native: NativeType, value: &Value) -> bool {
    matches!(
        (native, value),
        (NativeType::String, Value::String(_))
            | (NativeType::Integer, Value::Integer(_))
            | (NativeType::Number, Value::Number(_))
            | (NativeType::Boolean, Value::Bool(_))
            | (NativeType::DateTime, Value::DateTime(_))
            | (NativeType::Uuid, Value::Uuid(_))
    )
}

pub(crate) fn cast_native(native: NativeType, value: Value) -> Result<Value, CastFailure> {
    if conforms_native(native, &value) {
        return Ok(value);
    }
    let cast = match (native, &value) {
        (NativeType::String, Value::Integer(i)) => Some(Value::String(i.to_string())),
        (NativeType::String, Value::Number(n)) => Some(Value::String(format!("{n:?}"))),
        (NativeType::String, Value::Bool(b)) => Some(Value::String(b.to_string())),
        (NativeType::String, Value::DateTime(dt)) => Some(Value::String(format_timestamp(dt))),
        (NativeType::String, Value::Uuid(id)) => Some(Value::String(id.hyphenated().to_string())),

        (NativeType::Integer, Value::Number(n))
            if n.fract() == 0.0 && *n >= i64::MIN as f64 && *n < i64::MAX as f64 =>
        {
            Some(Value::Integer(*n as i64))
        }
        (NativeType::Integer, Value::String(s)) => s.trim().parse::<i64>().ok().map(Value::Integer),
        (NativeType::Integer, Value::Bool(b)) => Some(Value::Integer(i64::from(*b))),

        (NativeType::Number, Value::Integer(i)) => Some(Value::Number(*i as f64)),
        (NativeType::Number, Value::String(s)) => s.trim().parse::<f64>().ok().map(Value::Number),
        (NativeType::Number, Value::Bool(b)) => Some(Value::Number(if *b { 1.0 } else { 0.0 })),

        (NativeType::Boolean, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        (NativeType::Boolean, Value::Integer(0)) => Some(Value::Bool(false)),
        (NativeType::Boolean, Value::Integer(1)) => Some(Value::Bool(true)),

        (NativeType::DateTime, Value::String(s)) => parse_timestamp(s).map(Value::DateTime),
        (NativeType::Uuid, Value::String(s)) => Uuid::parse_str(s.trim()).ok().map(Value::Uuid),
        _ => None,
    };
    cast.ok_or_else(|| CastFailure::mismatch(value))
}

/// Lenient ISO-8601-like parsing. Offsets are normalized to UTC, naive
/// values are read as UTC, a bare date is midnight. Sub-microsecond
/// precision is dropped so that values survive the output format.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let text = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(truncate_to_micros(dt.with_timezone(&Utc)));
    }
    for layout in OFFSET_LAYOUTS {
        if let Ok(dt) = DateTime::parse_from_str(text, layout) {
            return Some(truncate_to_micros(dt.with_timezone(&Utc)));
        }
    }
    let naive = text.strip_suffix(['Z', 'z']).unwrap_or(text);
    for layout in NAIVE_LAYOUTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, layout) {
            return Some(truncate_to_micros(dt.and_utc()));
        }
    }
    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

fn truncate_to_micros(dt: DateTime<Utc>) -> DateTime<Utc> {
    let micros = dt.nanosecond() / 1_000 * 1_000;
    dt.with_nanosecond(micros).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn native(native: NativeType, value: impl Into<Value>) -> Option<Value> {
        cast_native(native, value.into()).ok()
    }

    #[test]
    fn string_cast_from_scalars() {
        assert_eq!(native(NativeType::String, 42), Some(Value::from("42")));
        assert_eq!(native(NativeType::String, 2.5), Some(Value::from("2.5")));
        assert_eq!(native(NativeType::String, true), Some(Value::from("true")));
        assert_eq!(native(NativeType::String, Value::List(vec![])), None);
    }

    #[test]
    fn numeric_casts() {
        assert_eq!(native(NativeType::Integer, 3.0), Some(Value::Integer(3)));
        assert_eq!(native(NativeType::Integer, 3.5), None);
        assert_eq!(native(NativeType::Integer, " 17 "), Some(Value::Integer(17)));
        assert_eq!(native(NativeType::Number, 4), Some(Value::Number(4.0)));
        assert_eq!(native(NativeType::Number, "12.5"), Some(Value::Number(12.5)));
        assert_eq!(native(NativeType::Number, "abc"), None);
    }

    #[test]
    fn integer_casts_stay_in_range() {
        let two_pow_63 = 9_223_372_036_854_775_808.0_f64;
        assert_eq!(native(NativeType::Integer, two_pow_63), None);
        assert_eq!(native(NativeType::Integer, -two_pow_63), Some(Value::Integer(i64::MIN)));
        assert_eq!(native(NativeType::Integer, 1e300), None);
        assert_eq!(native(NativeType::Integer, f64::NAN), None);
        assert_eq!(native(NativeType::Integer, f64::INFINITY), None);
    }

    #[test]
    fn boolean_casts() {
        assert_eq!(native(NativeType::Boolean, "TRUE"), Some(Value::Bool(true)));
        assert_eq!(native(NativeType::Boolean, 0), Some(Value::Bool(false)));
        assert_eq!(native(NativeType::Boolean, 2), None);
    }

    #[test]
    fn lenient_timestamps() {
        let expected = Utc.with_ymd_and_hms(2023, 5, 17, 8, 15, 0).unwrap();
        for raw in [
            "2023-05-17T08:15:00Z",
            "2023-05-17T08:15:00+00:00",
            "2023-05-17T10:15:00+02:00",
            "2023-05-17T08:15:00",
            "2023-05-17 08:15:00",
            "2023-05-17T08:15",
            "2023-05-17T08:15:00.000000Z",
        ] {
            assert_eq!(parse_timestamp(raw), Some(expected), "{raw}");
        }
        assert_eq!(parse_timestamp("2023-05-17"), Some(Utc.with_ymd_and_hms(2023, 5, 17, 0, 0, 0).unwrap()));
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn timestamps_drop_nanoseconds() {
        let dt = parse_timestamp("2023-05-17T08:15:00.123456789Z").unwrap();
        assert_eq!(dt.nanosecond(), 123_456_000);
        assert_eq!(format_timestamp(&dt), "2023-05-17T08:15:00.123456Z");
    }

    #[test]
    fn uuids_parse_any_case() {
        let cast = native(NativeType::Uuid, "6F9619FF-8B86-D011-B42D-00C04FC964FF").unwrap();
        assert_eq!(cast.to_string(), "6f9619ff-8b86-d011-b42d-00c04fc964ff");
        assert_eq!(native(NativeType::Uuid, "not-a-uuid"), None);
    }

    #[test]
    fn identity_and_idempotence() {
        let registry = TypeRegistry::default();
        let raw = Value::from("x");
        assert_eq!(apply(&registry, &Caster::Identity, raw.clone()).ok(), Some(raw.clone()));
        let once = cast_native(NativeType::Number, Value::Integer(2)).ok().unwrap();
        assert_eq!(cast_native(NativeType::Number, once.clone()).ok(), Some(once));
    }
}
