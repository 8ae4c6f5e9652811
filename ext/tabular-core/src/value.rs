use crate::temporal::CalendarDate;
use ordered_float::OrderedFloat;
use std::sync::Arc;

const MILLIS_PER_DAY: i64 = 86_400_000;

/// A dynamically-typed inbound cell, produced by a host adapter.
///
/// A missing cell ("undefined") is not a `Value`; accessors report it as
/// `None` so that partial-row updates can skip it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(OrderedFloat<f64>),
    Str(Arc<str>),
    /// A host date object, as epoch milliseconds
    DateLike(i64),
    /// A calendar date decoded from a typed source
    Date(CalendarDate),
}

impl Value {
    pub fn str(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn float(f: f64) -> Self {
        Value::Float(OrderedFloat(f))
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get the type name of the value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Str(_) => "Str",
            Value::DateLike(_) => "DateLike",
            Value::Date(_) => "Date",
        }
    }

    /// Numeric coercion with host `Number(x)` semantics; non-numeric input is NaN
    pub fn as_number(&self) -> f64 {
        match self {
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Int(i) => *i as f64,
            Value::Float(f) => f.0,
            Value::Str(s) => parse_number(s),
            Value::DateLike(ms) => *ms as f64,
            Value::Date(date) => date
                .days_since_epoch()
                .map(|days| (i64::from(days) * MILLIS_PER_DAY) as f64)
                .unwrap_or(f64::NAN),
        }
    }

    /// The number embedded in a non-empty string, if any
    pub fn embedded_number(&self) -> Option<f64> {
        match self {
            Value::Str(s) if !s.is_empty() => {
                let n = parse_number(s);
                (!n.is_nan()).then_some(n)
            }
            _ => None,
        }
    }

    /// Host truthiness; strings spelling a boolean literal take that value
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => f.0 != 0.0 && !f.0.is_nan(),
            Value::Str(s) => {
                if s.eq_ignore_ascii_case("false") {
                    false
                } else {
                    !s.is_empty()
                }
            }
            Value::DateLike(_) | Value::Date(_) => true,
        }
    }

    /// String coercion with host `String(x)` semantics
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => format_number(f.0),
            Value::Str(s) => s.to_string(),
            Value::DateLike(ms) => jiff::Timestamp::from_millisecond(*ms)
                .map(|ts| ts.to_string())
                .unwrap_or_else(|_| "Invalid Date".to_string()),
            Value::Date(date) => date.to_string(),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(Arc::from(s))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Parse a string the way a host `Number(x)` call does: surrounding
/// whitespace is ignored, the empty string is zero, and anything that is
/// not a decimal, hex or `Infinity` literal is NaN.
pub fn parse_number(s: &str) -> f64 {
    let t = s.trim();
    if t.is_empty() {
        return 0.0;
    }

    match t {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    if let Some(hex) = t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16)
            .map(|v| v as f64)
            .unwrap_or(f64::NAN);
    }

    // Rust accepts "inf"/"nan" spellings that hosts reject
    if t
        .bytes()
        .any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E')
    {
        return f64::NAN;
    }

    t.parse::<f64>().unwrap_or(f64::NAN)
}

/// Format a float the way hosts print numbers: integral values carry no
/// fractional part.
pub fn format_number(f: f64) -> String {
    if f.is_nan() {
        "NaN".to_string()
    } else if f.is_infinite() {
        if f > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
    } else if f == 0.0 {
        "0".to_string()
    } else if f.fract() == 0.0 && f.abs() < 1e21 {
        format!("{:.0}", f)
    } else {
        f.to_string()
    }
}
