use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

/// A field value, closed over the kinds backends know how to render.
///
/// `Any` is the fallback for values outside the known set; it carries the
/// `Debug` rendering of the original value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    Bool(bool),
    Time(DateTime<Utc>),
    Duration(Duration),
    Bytes(Vec<u8>),
    /// Pre-encoded or nested structured data.
    Json(Value),
    /// The display text of an error.
    Error(String),
    /// Nested namespace holding its own ordered attributes.
    Group(Vec<Attr>),
    Any(String),
}

impl FieldValue {
    pub fn any<T: fmt::Debug + ?Sized>(value: &T) -> Self {
        FieldValue::Any(format!("{:?}", value))
    }

    pub fn error(err: &(dyn std::error::Error + '_)) -> Self {
        FieldValue::Error(err.to_string())
    }

    /// Render as JSON. Bytes use standard base64, durations fractional
    /// milliseconds, times RFC 3339 with nanoseconds.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Str(s) | FieldValue::Error(s) | FieldValue::Any(s) => {
                Value::String(s.clone())
            }
            FieldValue::Int(i) => Value::from(*i),
            FieldValue::Uint(u) => Value::from(*u),
            // NaN and infinities have no JSON form; serde_json maps them to null.
            FieldValue::Float(f) => Value::from(*f),
            FieldValue::Bool(b) => Value::Bool(*b),
            FieldValue::Time(t) => {
                Value::String(t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            FieldValue::Duration(d) => Value::from(d.as_secs_f64() * 1000.0),
            FieldValue::Bytes(b) => Value::String(STANDARD.encode(b)),
            FieldValue::Json(v) => v.clone(),
            FieldValue::Group(attrs) => Value::Object(attrs_to_map(attrs)),
        }
    }
}

/// One ordered key/value entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Attr {
    pub key: String,
    pub value: FieldValue,
}

impl Attr {
    pub fn new(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Attr {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn group(key: impl Into<String>, attrs: Vec<Attr>) -> Self {
        Attr {
            key: key.into(),
            value: FieldValue::Group(attrs),
        }
    }
}

/// Collect attributes into a JSON object. Later duplicates overwrite
/// earlier ones but keep the first position.
pub fn attrs_to_map(attrs: &[Attr]) -> serde_json::Map<String, Value> {
    let mut map = serde_json::Map::with_capacity(attrs.len());
    for attr in attrs {
        map.insert(attr.key.clone(), attr.value.to_json());
    }
    map
}

/// Append `new` below the group path, reusing the most recent group of the
/// same name at each step. Nothing is created for an empty `new`.
pub(crate) fn insert_at(attrs: &mut Vec<Attr>, path: &[String], new: Vec<Attr>) {
    if new.is_empty() {
        return;
    }
    let Some((head, rest)) = path.split_first() else {
        attrs.extend(new);
        return;
    };
    let existing = attrs
        .iter()
        .rposition(|a| a.key == *head && matches!(a.value, FieldValue::Group(_)));
    match existing {
        Some(i) => {
            if let FieldValue::Group(children) = &mut attrs[i].value {
                insert_at(children, rest, new);
            }
        }
        None => {
            let mut children = Vec::new();
            insert_at(&mut children, rest, new);
            attrs.push(Attr::group(head.clone(), children));
        }
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for FieldValue {
            fn from(v: $t) -> Self { FieldValue::Int(v as i64) }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for FieldValue {
            fn from(v: $t) -> Self { FieldValue::Uint(v as u64) }
        }
    )*};
}

from_signed!(i8, i16, i32, i64, isize);
from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        FieldValue::Float(v as f64)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Str(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Str(v)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(v: DateTime<Utc>) -> Self {
        FieldValue::Time(v)
    }
}

impl From<Duration> for FieldValue {
    fn from(v: Duration) -> Self {
        FieldValue::Duration(v)
    }
}

impl From<Vec<u8>> for FieldValue {
    fn from(v: Vec<u8>) -> Self {
        FieldValue::Bytes(v)
    }
}

impl From<Value> for FieldValue {
    fn from(v: Value) -> Self {
        FieldValue::Json(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn scalars_render_natively() {
        assert_eq!(FieldValue::from(-3i32).to_json(), json!(-3));
        assert_eq!(FieldValue::from(7u16).to_json(), json!(7));
        assert_eq!(FieldValue::from(true).to_json(), json!(true));
        assert_eq!(FieldValue::from("x").to_json(), json!("x"));
        assert_eq!(FieldValue::from(1.5f32).to_json(), json!(1.5));
    }

    #[test]
    fn time_bytes_and_duration() {
        let t = Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).single();
        let t = t.map(FieldValue::Time).map(|v| v.to_json());
        assert_eq!(t, Some(json!("2024-02-03T04:05:06Z")));
        assert_eq!(FieldValue::Bytes(vec![1, 2, 3]).to_json(), json!("AQID"));
        assert_eq!(
            FieldValue::Duration(Duration::from_micros(1500)).to_json(),
            json!(1.5)
        );
    }

    #[test]
    fn groups_nest_and_duplicates_keep_last_value() {
        let value = FieldValue::Group(vec![
            Attr::new("a", 1),
            Attr::new("b", "two"),
            Attr::new("a", 3),
        ]);
        assert_eq!(value.to_json(), json!({"a": 3, "b": "two"}));
    }

    #[test]
    fn any_uses_debug() {
        #[derive(Debug)]
        struct Opaque {
            id: u8,
        }
        assert_eq!(
            FieldValue::any(&Opaque { id: 4 }),
            FieldValue::Any("Opaque { id: 4 }".to_string())
        );
    }
}
