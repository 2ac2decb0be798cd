//! Dynamic input values passed to metric functions.
//!
//! Targets and predictions arrive in several shapes: plain text, raw UTF-8
//! bytes, integer or float labels, sets of reference answers and keyed records.
//! `Value` is the tagged union over all of them. Byte strings are decoded
//! at a single boundary (`Value::as_text` / `Value::decode`) so that the metric
//! code only ever compares text.

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{MetricsError, Result};

/// Floats in `[-2^63, 2^63)` convert to `i64` without saturating.
const I64_LOWER: f64 = -9_223_372_036_854_775_808.0;
const I64_UPPER: f64 = 9_223_372_036_854_775_808.0;

/// A single target or prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// A set of acceptable references, or any other ordered collection.
    List(Vec<Value>),
    Record(BTreeMap<String, Value>),
    /// UTF-8 encoded text. Never produced by JSON deserialization.
    Bytes(Vec<u8>),
}

/// Hashable scalar view of a [`Value`], used for class labels and group keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Label {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::Bool(b) => write!(f, "{b}"),
            Label::Int(i) => write!(f, "{i}"),
            Label::Text(s) => write!(f, "{s}"),
        }
    }
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    pub fn bytes(b: impl AsRef<[u8]>) -> Self {
        Value::Bytes(b.as_ref().to_vec())
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn record<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Record(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Record(_) => "record",
            Value::Bytes(_) => "bytes",
        }
    }

    /// Borrow the value as text, decoding UTF-8 bytes.
    pub fn as_text(&self) -> Result<Cow<'_, str>> {
        match self {
            Value::Text(s) => Ok(Cow::Borrowed(s.as_str())),
            Value::Bytes(b) => Ok(Cow::Owned(String::from_utf8(b.clone())?)),
            other => Err(MetricsError::invalid_input(format!(
                "expected text or bytes, got {}",
                other.kind()
            ))),
        }
    }

    /// Numeric view of scalar values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a key in a record value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Record(map) => map.get(key),
            _ => None,
        }
    }

    /// Convert a scalar into a hashable label. Integral floats become ints.
    pub fn to_label(&self) -> Result<Label> {
        match self {
            Value::Bool(b) => Ok(Label::Bool(*b)),
            Value::Int(i) => Ok(Label::Int(*i)),
            Value::Float(f) if f.fract() == 0.0 && (I64_LOWER..I64_UPPER).contains(f) => {
                Ok(Label::Int(*f as i64))
            }
            Value::Text(_) | Value::Bytes(_) => Ok(Label::Text(self.as_text()?.into_owned())),
            other => Err(MetricsError::invalid_input(format!(
                "expected a scalar label, got {}",
                other.kind()
            ))),
        }
    }

    /// Recursively replace byte strings with decoded text.
    pub fn decode(&self) -> Result<Value> {
        Ok(match self {
            Value::Bytes(_) => Value::Text(self.as_text()?.into_owned()),
            Value::List(items) => {
                Value::List(items.iter().map(Value::decode).collect::<Result<_>>()?)
            }
            Value::Record(map) => Value::Record(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), v.decode()?)))
                    .collect::<Result<_>>()?,
            ),
            other => other.clone(),
        })
    }

    /// Exact equality after decoding bytes; ints and floats compare numerically.
    pub fn matches(&self, other: &Value) -> Result<bool> {
        Ok(loose_eq(&self.decode()?, &other.decode()?))
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::List(xs), Value::List(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| loose_eq(x, y))
        }
        (Value::Record(xs), Value::Record(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .zip(ys)
                    .all(|((kx, vx), (ky, vy))| kx == ky && loose_eq(vx, vy))
        }
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            a.as_f64() == b.as_f64()
        }
        _ => a == b,
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&[u8]> for Value {
    fn from(b: &[u8]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl<const N: usize> From<&[u8; N]> for Value {
    fn from(b: &[u8; N]) -> Self {
        Value::Bytes(b.to_vec())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Label> for Value {
    fn from(label: Label) -> Self {
        match label {
            Label::Bool(b) => Value::Bool(b),
            Label::Int(i) => Value::Int(i),
            Label::Text(s) => Value::Text(s),
        }
    }
}
