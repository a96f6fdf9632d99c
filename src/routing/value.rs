//! Sharding key domain
//!
//! Literals arrive from the host query as untyped JSON values and are typed
//! into the key's domain before they reach a mapper. A value that cannot be
//! typed (wrong JSON kind, unparsable timestamp or guid) is not an error; the
//! resolver treats the surrounding node as opaque.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Declared type of a sharding key property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShardKeyType {
    /// Signed 64-bit integer
    Int,
    /// UTF-8 string
    String,
    /// Boolean
    Bool,
    /// RFC 3339 timestamp, normalised to UTC
    DateTime,
    /// UUID / GUID
    Guid,
}

impl ShardKeyType {
    /// Types a host value into this key domain.
    ///
    /// Returns `None` for null and for any value of the wrong shape.
    pub fn coerce(self, value: &Value) -> Option<ShardKeyValue> {
        match (self, value) {
            (ShardKeyType::Int, Value::Number(n)) => n.as_i64().map(ShardKeyValue::Int),
            (ShardKeyType::String, Value::String(s)) => Some(ShardKeyValue::String(s.clone())),
            (ShardKeyType::Bool, Value::Bool(b)) => Some(ShardKeyValue::Bool(*b)),
            (ShardKeyType::DateTime, Value::String(s)) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| ShardKeyValue::DateTime(dt.with_timezone(&Utc))),
            (ShardKeyType::Guid, Value::String(s)) => {
                Uuid::parse_str(s).ok().map(ShardKeyValue::Guid)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShardKeyType::Int => "int",
            ShardKeyType::String => "string",
            ShardKeyType::Bool => "bool",
            ShardKeyType::DateTime => "datetime",
            ShardKeyType::Guid => "guid",
        }
    }
}

impl fmt::Display for ShardKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed, immutable value in a sharding key's domain
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ShardKeyValue {
    Int(i64),
    String(String),
    Bool(bool),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
}

impl ShardKeyValue {
    /// Returns the key type this value belongs to
    pub fn key_type(&self) -> ShardKeyType {
        match self {
            ShardKeyValue::Int(_) => ShardKeyType::Int,
            ShardKeyValue::String(_) => ShardKeyType::String,
            ShardKeyValue::Bool(_) => ShardKeyType::Bool,
            ShardKeyValue::DateTime(_) => ShardKeyType::DateTime,
            ShardKeyValue::Guid(_) => ShardKeyType::Guid,
        }
    }

    /// Returns true for the zero value of the key type.
    ///
    /// Zero values are `0`, `false`, `0001-01-01T00:00:00Z` and the nil guid.
    /// Strings have no zero value; an absent string is `null`.
    pub fn is_default(&self) -> bool {
        match self {
            ShardKeyValue::Int(v) => *v == 0,
            ShardKeyValue::String(_) => false,
            ShardKeyValue::Bool(v) => !*v,
            ShardKeyValue::DateTime(dt) => *dt == min_datetime(),
            ShardKeyValue::Guid(id) => id.is_nil(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ShardKeyValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ShardKeyValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            ShardKeyValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_guid(&self) -> Option<Uuid> {
        match self {
            ShardKeyValue::Guid(id) => Some(*id),
            _ => None,
        }
    }
}

/// `0001-01-01T00:00:00Z`, the zero value of a timestamp key
fn min_datetime() -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl fmt::Display for ShardKeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShardKeyValue::Int(v) => write!(f, "{}", v),
            ShardKeyValue::String(s) => write!(f, "'{}'", s),
            ShardKeyValue::Bool(b) => write!(f, "{}", b),
            ShardKeyValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            ShardKeyValue::Guid(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for ShardKeyValue {
    fn from(v: i64) -> Self {
        ShardKeyValue::Int(v)
    }
}

impl From<&str> for ShardKeyValue {
    fn from(v: &str) -> Self {
        ShardKeyValue::String(v.to_string())
    }
}

impl From<String> for ShardKeyValue {
    fn from(v: String) -> Self {
        ShardKeyValue::String(v)
    }
}

impl From<Uuid> for ShardKeyValue {
    fn from(v: Uuid) -> Self {
        ShardKeyValue::Guid(v)
    }
}

impl From<DateTime<Utc>> for ShardKeyValue {
    fn from(v: DateTime<Utc>) -> Self {
        ShardKeyValue::DateTime(v)
    }
}
