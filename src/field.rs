//! Typed key/value pairs for the direct encoder.

use std::borrow::Cow;
use std::fmt;
use std::io;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A value that knows how to write itself as JSON.
///
/// Every [`Serialize`] type implements this, so any serde type can be passed
/// as an [`Field::opaque`] value.
pub trait Serializable: Send + Sync {
    /// Writes the JSON representation of `self` to `out`.
    fn write_json(&self, out: &mut dyn io::Write) -> io::Result<()>;
}

impl<T: Serialize + Send + Sync + ?Sized> Serializable for T {
    fn write_json(&self, out: &mut dyn io::Write) -> io::Result<()> {
        serde_json::to_writer(out, self).map_err(io::Error::from)
    }
}

/// The kind of value a [`Field`] carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    String,
    Int,
    Int64,
    Float64,
    Bool,
    Bytes,
    Timestamp,
    Duration,
    Opaque,
}

/// The payload of a [`Field`].
pub enum Value<'a> {
    String(Cow<'a, str>),
    Int(i64),
    Int64(i64),
    Float64(f64),
    Bool(bool),
    Bytes(Cow<'a, [u8]>),
    Timestamp(DateTime<Utc>),
    Duration(Duration),
    Opaque(&'a dyn Serializable),
}

impl Value<'_> {
    /// The kind of this value.
    pub fn kind(&self) -> FieldKind {
        match self {
            Value::String(_) => FieldKind::String,
            Value::Int(_) => FieldKind::Int,
            Value::Int64(_) => FieldKind::Int64,
            Value::Float64(_) => FieldKind::Float64,
            Value::Bool(_) => FieldKind::Bool,
            Value::Bytes(_) => FieldKind::Bytes,
            Value::Timestamp(_) => FieldKind::Timestamp,
            Value::Duration(_) => FieldKind::Duration,
            Value::Opaque(_) => FieldKind::Opaque,
        }
    }
}

impl fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Int(n) => f.debug_tuple("Int").field(n).finish(),
            Value::Int64(n) => f.debug_tuple("Int64").field(n).finish(),
            Value::Float64(n) => f.debug_tuple("Float64").field(n).finish(),
            Value::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Value::Bytes(b) => f.debug_tuple("Bytes").field(b).finish(),
            Value::Timestamp(t) => f.debug_tuple("Timestamp").field(t).finish(),
            Value::Duration(d) => f.debug_tuple("Duration").field(d).finish(),
            Value::Opaque(_) => f.write_str("Opaque(..)"),
        }
    }
}

/// One key and its typed value.
///
/// Fields are built with the constructor for their kind and written out with
/// [`encode`](crate::encoder::encode):
///
/// ```rust
/// use bolt::field::{Field, FieldKind};
///
/// let fields = [
///     Field::string("name", "Ann"),
///     Field::int("age", 3),
///     Field::bool("ok", true),
/// ];
/// assert_eq!(fields[1].kind(), FieldKind::Int);
/// ```
#[derive(Debug)]
pub struct Field<'a> {
    pub key: Cow<'a, str>,
    pub value: Value<'a>,
}

impl<'a> Field<'a> {
    fn new(key: impl Into<Cow<'a, str>>, value: Value<'a>) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn string(key: impl Into<Cow<'a, str>>, value: impl Into<Cow<'a, str>>) -> Self {
        Self::new(key, Value::String(value.into()))
    }

    pub fn int(key: impl Into<Cow<'a, str>>, value: impl Into<i64>) -> Self {
        Self::new(key, Value::Int(value.into()))
    }

    pub fn int64(key: impl Into<Cow<'a, str>>, value: i64) -> Self {
        Self::new(key, Value::Int64(value))
    }

    pub fn float64(key: impl Into<Cow<'a, str>>, value: f64) -> Self {
        Self::new(key, Value::Float64(value))
    }

    pub fn bool(key: impl Into<Cow<'a, str>>, value: bool) -> Self {
        Self::new(key, Value::Bool(value))
    }

    /// Raw bytes, written as a string. Invalid UTF-8 is replaced with U+FFFD.
    pub fn bytes(key: impl Into<Cow<'a, str>>, value: impl Into<Cow<'a, [u8]>>) -> Self {
        Self::new(key, Value::Bytes(value.into()))
    }

    pub fn time(key: impl Into<Cow<'a, str>>, value: DateTime<Utc>) -> Self {
        Self::new(key, Value::Timestamp(value))
    }

    pub fn duration(key: impl Into<Cow<'a, str>>, value: Duration) -> Self {
        Self::new(key, Value::Duration(value))
    }

    /// Any serde value. This is the only kind that may allocate while encoding.
    pub fn opaque(key: impl Into<Cow<'a, str>>, value: &'a dyn Serializable) -> Self {
        Self::new(key, Value::Opaque(value))
    }

    /// The kind of value this field carries.
    pub fn kind(&self) -> FieldKind {
        self.value.kind()
    }
}
