//! Runtime values and the loose comparison policy.
//!
//! Conditions are untyped: a field holding the string `"30"` may be compared
//! with the number literal `30`. Rather than relying on any ambient language
//! semantics, the coercion rules are spelled out here and shared by the
//! local evaluator and by [`Filter::matches`](crate::Filter::matches).
//!
//! # Equality (`=`, and `!=` as its negation)
//!
//! - `Undefined` and `Null` equal each other and nothing else.
//! - Values of the same kind compare directly; `NaN` equals nothing.
//! - Number vs string: the string is converted with [`Value::to_number`].
//! - A boolean is converted to `1` or `0` and the comparison is retried.
//!
//! # Ordering (`>`, `>=`, `<`, `<=`)
//!
//! - Two strings compare lexicographically by UTF-16 code units.
//! - Otherwise both sides are converted to numbers; if either is `NaN` the
//!   comparison is `false`.

use std::cmp::Ordering;
use std::fmt;

use crate::token::{CompareOp, Literal};

/// A field or literal value seen by the evaluator.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// The field is absent from the record.
    #[default]
    Undefined,
    /// An explicit null.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(f64),
    /// A string.
    String(String),
}

impl Value {
    /// Truthiness used by `AND`/`OR` and for the final result.
    ///
    /// `Undefined`, `Null`, `false`, `0`, `NaN` and `""` are falsy.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Undefined | Self::Null => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0 && !n.is_nan(),
            Self::String(s) => !s.is_empty(),
        }
    }

    /// Numeric conversion: `Undefined` is `NaN`, `Null` is `0`, booleans are
    /// `1`/`0`, strings are parsed with [`string_to_number`].
    #[must_use]
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Undefined => f64::NAN,
            Self::Null => 0.0,
            Self::Bool(b) => f64::from(u8::from(*b)),
            Self::Number(n) => *n,
            Self::String(s) => string_to_number(s),
        }
    }

    /// Loose equality.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn loose_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined | Self::Null, Self::Undefined | Self::Null) => true,
            (Self::Undefined | Self::Null, _) | (_, Self::Undefined | Self::Null) => false,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(n), Self::String(s)) | (Self::String(s), Self::Number(n)) => {
                *n == string_to_number(s)
            }
            (Self::Bool(b), other) | (other, Self::Bool(b)) => {
                Self::Number(f64::from(u8::from(*b))).loose_eq(other)
            }
        }
    }

    /// Ordering used by `>`, `>=`, `<`, `<=`; `None` when the values are not
    /// comparable (a `NaN` after numeric conversion).
    #[must_use]
    pub fn loose_cmp(&self, other: &Self) -> Option<Ordering> {
        if let (Self::String(a), Self::String(b)) = (self, other) {
            return Some(a.encode_utf16().cmp(b.encode_utf16()));
        }
        self.to_number().partial_cmp(&other.to_number())
    }

    /// Apply a comparison operator under the loose policy.
    #[must_use]
    pub fn compare(&self, op: CompareOp, other: &Self) -> bool {
        match op {
            CompareOp::Eq => self.loose_eq(other),
            CompareOp::Ne => !self.loose_eq(other),
            CompareOp::Gt => self.loose_cmp(other) == Some(Ordering::Greater),
            CompareOp::Ge => matches!(
                self.loose_cmp(other),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            CompareOp::Lt => self.loose_cmp(other) == Some(Ordering::Less),
            CompareOp::Le => matches!(
                self.loose_cmp(other),
                Some(Ordering::Less | Ordering::Equal)
            ),
        }
    }
}

/// Convert a string to a number.
///
/// Surrounding whitespace is ignored, an empty string is `0`, `Infinity`
/// (optionally signed) is infinite, and decimal float syntax (sign, digits,
/// fraction, exponent) is parsed. Anything else is `NaN`.
#[must_use]
pub fn string_to_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }
    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }
    let has_digit = t.bytes().any(|b| b.is_ascii_digit());
    let decimal_syntax = t
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'));
    if !has_digit || !decimal_syntax {
        return f64::NAN;
    }
    t.parse().unwrap_or(f64::NAN)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "\"{s}\""),
        }
    }
}

impl From<&Literal> for Value {
    fn from(lit: &Literal) -> Self {
        match lit {
            Literal::String(s) => Self::String(s.clone()),
            Literal::Number(n) => Self::Number(*n),
        }
    }
}

impl From<&serde_json::Value> for Value {
    /// Arrays and objects are not flat field values and map to `Undefined`.
    fn from(v: &serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => n.as_f64().map_or(Self::Undefined, Self::Number),
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => Self::Undefined,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}
