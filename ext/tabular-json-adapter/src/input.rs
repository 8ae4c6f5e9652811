//! Recognition of the three ingestible JSON shapes.

use crate::convert::json_to_value;
use crate::{AdapterError, ErrorContext, Result};
use indexmap::IndexMap;
use jiff::tz::TimeZone;
use serde_json::{Map, Value as Json};
use tabular_core::{Value, ValueInput};

/// Build an ingestion input from a JSON document.
///
/// - an array of objects is row-major
/// - an object whose values are all arrays is column-major
/// - an object whose values are all strings declares a schema
pub fn json_to_input(json: &Json, tz: &TimeZone) -> Result<ValueInput> {
    match json {
        Json::Array(rows) => rows_input(rows, tz),
        Json::Object(map) if map.values().all(Json::is_array) => columns_input(map, tz),
        Json::Object(map) if map.values().all(Json::is_string) => Ok(schema_input(map)),
        Json::Object(_) => Err(AdapterError::invalid_input(
            "Object input must map every column to an array, or every column to a type name",
        )),
        other => Err(AdapterError::invalid_input(format!(
            "Cannot load a table from JSON {}",
            json_kind(other)
        ))),
    }
}

/// Parse JSON text and build an ingestion input from it
pub fn parse_input(text: &str, tz: &TimeZone) -> Result<ValueInput> {
    let json: Json = serde_json::from_str(text)?;
    json_to_input(&json, tz)
}

fn rows_input(rows: &[Json], tz: &TimeZone) -> Result<ValueInput> {
    let mut records = Vec::with_capacity(rows.len());
    for (idx, row) in rows.iter().enumerate() {
        let Json::Object(fields) = row else {
            return Err(AdapterError::invalid_input(format!(
                "Row {} is {}, expected an object",
                idx,
                json_kind(row)
            )));
        };
        let record = fields
            .iter()
            .map(|(name, cell)| Ok((name.clone(), json_to_value(cell, tz)?)))
            .collect::<Result<IndexMap<String, Value>>>()
            .with_context(|| format!("Row {}", idx))?;
        records.push(record);
    }
    Ok(ValueInput::rows(records))
}

fn columns_input(map: &Map<String, Json>, tz: &TimeZone) -> Result<ValueInput> {
    let mut columns = IndexMap::with_capacity(map.len());
    for (name, cells) in map {
        let cells = cells.as_array().map(Vec::as_slice).unwrap_or_default();
        let values = cells
            .iter()
            .map(|cell| json_to_value(cell, tz))
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("Column `{}`", name))?;
        columns.insert(name.clone(), values);
    }
    Ok(ValueInput::columns(columns))
}

fn schema_input(map: &Map<String, Json>) -> ValueInput {
    let declared = map
        .iter()
        .filter_map(|(name, token)| Some((name.clone(), token.as_str()?.to_string())))
        .collect();
    ValueInput::schema(declared)
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tabular_core::{InputData, InputFormat};

    #[test]
    fn test_detects_formats() {
        let tz = TimeZone::UTC;

        let rows = json_to_input(&json!([{"a": 1}, {"b": "x"}]), &tz).unwrap();
        assert_eq!(rows.data.format(), InputFormat::Rows);
        assert_eq!(rows.row_count(), 2);

        let columns = json_to_input(&json!({"a": [1, 2, 3], "b": []}), &tz).unwrap();
        assert_eq!(columns.data.format(), InputFormat::Columns);
        assert_eq!(columns.row_count(), 3);

        let schema = json_to_input(&json!({"x": "integer", "y": "datetime"}), &tz).unwrap();
        let InputData::Schema(declared) = &schema.data else {
            panic!("expected a schema declaration");
        };
        assert_eq!(declared.keys().collect::<Vec<_>>(), vec!["x", "y"]);
    }

    #[test]
    fn test_rejects_other_shapes() {
        let tz = TimeZone::UTC;
        assert!(json_to_input(&json!(3), &tz).is_err());
        assert!(json_to_input(&json!({"a": [1], "b": "float"}), &tz).is_err());

        let err = json_to_input(&json!([{"a": 1}, 7]), &tz).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: Row 1 is a number, expected an object"
        );
    }

    #[test]
    fn test_cell_errors_name_their_row() {
        let err = json_to_input(&json!([{"a": [1]}]), &TimeZone::UTC).unwrap_err();
        assert!(err.to_string().contains("Row 0"));
    }
}
