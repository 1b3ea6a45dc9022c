//! Bindable values, binding maps and argument lists.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::options::CallOption;

/// The closed set of values a statement can bind.
///
/// Comparing two `Value`s with `==` is how the upsert engine decides a row
/// is already up to date, so equality here is plain typed equality: no
/// cross-type coercion, `Null == Null`.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    /// A wall-clock instant, always UTC. Adapters normalize on scan.
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
    /// List form, only meaningful to IN clauses
    List(Vec<Value>),
}

impl Value {
    /// Build a `Value::List` from anything iterable.
    pub fn list<I, T>(values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(values.into_iter().map(Into::into).collect())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The integer payload, if this value carries one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The text payload, if this value carries one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int(v.into())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_owned())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Binding map from marker keys to per-execution values.
pub type Bindings = HashMap<String, Value>;

/// Builds a [`Bindings`] map from `key => value` pairs.
///
/// Values go through [`Value::from`], so plain literals work:
///
/// ```
/// use dbkit::bindings;
///
/// let vs = bindings! { "name" => "alice", "age" => 30i64 };
/// assert_eq!(vs.len(), 2);
/// ```
#[macro_export]
macro_rules! bindings {
    () => { $crate::Bindings::new() };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut __dbkit_bindings = $crate::Bindings::new();
        $(
            __dbkit_bindings.insert(($key).into(), $crate::Value::from($value));
        )+
        __dbkit_bindings
    }};
}

/// One element of a rendered statement's argument list.
///
/// Per-call options travel in the argument list rather than the SQL text,
/// so a rendered statement stays portable. Adapters split the list back
/// apart with [`crate::strip_options`].
#[derive(Clone, Debug, PartialEq)]
pub enum Arg {
    /// A bindable value; owns one `$N` placeholder
    Value(Value),
    /// A per-call option; contributes no placeholder
    Option(CallOption),
}

impl Arg {
    /// The bindable payload, unless this argument is an option.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Arg::Value(v) => Some(v),
            Arg::Option(_) => None,
        }
    }
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        Arg::Value(v)
    }
}

impl From<CallOption> for Arg {
    fn from(o: CallOption) -> Self {
        Arg::Option(o)
    }
}
