//! Scalar cell values.

use std::fmt;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// One cell of a [`Record`](super::Record).
///
/// `Missing` marks a column the record never had (inserted by column
/// reconciliation). It is distinct from `Null` (the service sent `null`) and
/// from an empty `Text`.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Missing,
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    Date(NaiveDate),
}

impl Scalar {
    /// Converts a JSON value into a scalar.
    ///
    /// Arrays and objects become their compact JSON text.
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => n.as_f64().map_or(Self::Null, Self::Float),
            },
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Self::Text(value.to_string()),
        }
    }

    /// Parses a `YYYY-MM-DD` string into `Date`, falling back to `Text`.
    #[must_use]
    pub fn date_or_text(value: &str) -> Self {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map_or_else(|_| Self::Text(value.to_string()), Self::Date)
    }

    /// Parses a numeric string into `Float`, falling back to `Text`.
    #[must_use]
    pub fn float_or_text(value: &str) -> Self {
        value
            .trim()
            .parse::<f64>()
            .map_or_else(|_| Self::Text(value.to_string()), Self::Float)
    }

    /// `Text` for `Some`, `Missing` for `None`.
    #[must_use]
    pub fn text_or_missing(value: Option<&str>) -> Self {
        value.map_or(Self::Missing, |v| Self::Text(v.to_string()))
    }

    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Borrows the text payload of `Text` cells.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            #[allow(clippy::cast_precision_loss)]
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => Ok(()),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Missing | Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(x) => serializer.serialize_f64(*x),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Date(d) => serializer.collect_str(&d.format("%Y-%m-%d")),
        }
    }
}
