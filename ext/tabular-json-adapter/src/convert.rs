//! Conversion between JSON values and table cells.

use crate::{AdapterError, Result};
use jiff::tz::TimeZone;
use serde_json::{Map, Number, Value as Json};
use tabular_core::temporal::parse_timestamp;
use tabular_core::{OutputCast, Scalar, Value};

/// Key of the object form a host uses for date-like values,
/// e.g. `{"$date": 1700000000000}` or `{"$date": "2024-01-02T03:04:05Z"}`
pub const DATE_KEY: &str = "$date";

/// Read a JSON cell as a host value.
///
/// Integers that fit `i64` stay integral; every other number is a float.
/// Arrays and objects other than the `$date` form are rejected.
pub fn json_to_value(json: &Json, tz: &TimeZone) -> Result<Value> {
    match json {
        Json::Null => Ok(Value::Null),
        Json::Bool(b) => Ok(Value::Bool(*b)),
        Json::Number(n) => Ok(match n.as_i64() {
            Some(i) => Value::Int(i),
            None => Value::float(n.as_f64().unwrap_or(f64::NAN)),
        }),
        Json::String(s) => Ok(Value::str(s.as_str())),
        Json::Object(map) => date_like(map, tz),
        Json::Array(_) => Err(AdapterError::invalid_input("Nested arrays are not cells")),
    }
}

fn date_like(map: &Map<String, Json>, tz: &TimeZone) -> Result<Value> {
    let stamp = match (map.len(), map.get(DATE_KEY)) {
        (1, Some(stamp)) => stamp,
        _ => {
            return Err(AdapterError::invalid_input(format!(
                "Objects are not cells unless they have the single key `{}`",
                DATE_KEY
            )))
        }
    };

    let millis = match stamp {
        Json::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Json::String(s) => parse_timestamp(s, tz),
        _ => None,
    };
    millis
        .map(Value::DateLike)
        .ok_or_else(|| AdapterError::invalid_input(format!("Invalid date value {}", stamp)))
}

/// Conversion of core values into JSON
pub trait TryIntoJson: Sized {
    fn try_into_json(self) -> Result<Json>;
}

impl TryIntoJson for Value {
    fn try_into_json(self) -> Result<Json> {
        Ok(match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(b),
            Value::Int(i) => Json::Number(i.into()),
            // NaN and infinities have no JSON form
            Value::Float(f) => Number::from_f64(f.0).map_or(Json::Null, Json::Number),
            Value::Str(s) => Json::String(s.to_string()),
            Value::DateLike(ms) => Json::Number(ms.into()),
            Value::Date(date) => Json::String(date.to_string()),
        })
    }
}

impl<T> TryIntoJson for Vec<T>
where
    T: TryIntoJson,
{
    fn try_into_json(self) -> Result<Json> {
        self.into_iter()
            .map(TryIntoJson::try_into_json)
            .collect::<Result<Vec<_>>>()
            .map(Json::Array)
    }
}

/// Render a stored cell as JSON
pub fn scalar_to_json(scalar: &Scalar, cast: OutputCast, tz: &TimeZone) -> Result<Json> {
    scalar.to_value(cast, tz).try_into_json()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_cells() {
        let tz = TimeZone::UTC;
        assert_eq!(json_to_value(&json!(null), &tz).unwrap(), Value::Null);
        assert_eq!(json_to_value(&json!(3), &tz).unwrap(), Value::Int(3));
        assert_eq!(json_to_value(&json!(2.5), &tz).unwrap(), Value::float(2.5));
        assert_eq!(json_to_value(&json!("x"), &tz).unwrap(), Value::from("x"));
        assert_eq!(
            json_to_value(&json!(u64::MAX), &tz).unwrap(),
            Value::float(u64::MAX as f64)
        );
    }

    #[test]
    fn test_date_objects() {
        let tz = TimeZone::UTC;
        assert_eq!(
            json_to_value(&json!({"$date": 86_400_000}), &tz).unwrap(),
            Value::DateLike(86_400_000)
        );
        assert_eq!(
            json_to_value(&json!({"$date": "1970-01-02"}), &tz).unwrap(),
            Value::DateLike(86_400_000)
        );
        assert!(json_to_value(&json!({"$date": true}), &tz).is_err());
        assert!(json_to_value(&json!({"a": 1}), &tz).is_err());
        assert!(json_to_value(&json!([1]), &tz).is_err());
    }

    #[test]
    fn test_scalar_to_json() {
        let tz = TimeZone::UTC;
        assert_eq!(
            scalar_to_json(&Scalar::Float64(f64::NAN), OutputCast::Plain, &tz).unwrap(),
            Json::Null
        );
        assert_eq!(
            scalar_to_json(&Scalar::Time(0), OutputCast::Text, &tz).unwrap(),
            json!("1970-01-01 00:00:00.000")
        );
        assert_eq!(
            vec![Value::Int(1), Value::Null].try_into_json().unwrap(),
            json!([1, null])
        );
    }
}
