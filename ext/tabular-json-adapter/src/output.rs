//! JSON serialization of a table window.

use crate::convert::scalar_to_json;
use crate::types::{Orientation, OutputOptions};
use crate::Result;
use jiff::tz::TimeZone;
use serde_json::{Map, Value as Json};
use tabular_core::{visible_columns, DataTable};

/// Serialize the visible columns of a window
pub fn to_json(table: &DataTable, options: &OutputOptions, tz: &TimeZone) -> Result<Json> {
    let rows = options.window.rows(table.size());
    let columns = visible_columns(table, &options.window);

    match options.orientation {
        Orientation::Records => {
            let mut records = Vec::with_capacity(rows.len());
            for row in rows {
                let mut record = Map::with_capacity(columns.len());
                for (name, column) in &columns {
                    record.insert(
                        name.to_string(),
                        scalar_to_json(&column.get(row), options.cast, tz)?,
                    );
                }
                records.push(Json::Object(record));
            }
            Ok(Json::Array(records))
        }
        Orientation::Columns => {
            let mut out = Map::with_capacity(columns.len());
            for (name, column) in &columns {
                let cells = column
                    .scalars(rows.clone())
                    .iter()
                    .map(|scalar| scalar_to_json(scalar, options.cast, tz))
                    .collect::<Result<Vec<_>>>()?;
                out.insert(name.to_string(), Json::Array(cells));
            }
            Ok(Json::Object(out))
        }
    }
}

/// Serialize a window as JSON text
pub fn to_json_string(table: &DataTable, options: &OutputOptions, tz: &TimeZone) -> Result<String> {
    Ok(serde_json::to_string(&to_json(table, options, tz)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use tabular_core::{DType, Scalar, Schema, Window};

    fn table() -> DataTable {
        let schema = Schema::new(
            vec!["a".to_string(), "b".to_string(), "psp_okey".to_string()],
            vec![DType::Int32, DType::Str, DType::Int32],
        )
        .unwrap();
        let mut table = DataTable::with_rows(schema, 2);
        table.column_mut("a").unwrap().set(0, Scalar::Int32(7)).unwrap();
        table
            .column_mut("b")
            .unwrap()
            .set(1, Scalar::Str(Arc::from("q")))
            .unwrap();
        table
    }

    #[test]
    fn test_records() {
        let json = to_json(&table(), &OutputOptions::new(), &TimeZone::UTC).unwrap();
        assert_eq!(
            json,
            json!([{"a": 7, "b": null}, {"a": null, "b": "q"}])
        );
    }

    #[test]
    fn test_columns_window() {
        let options = OutputOptions::new()
            .with_orientation(Orientation::Columns)
            .with_window(Window::new(1..5, 1..2));
        let text = to_json_string(&table(), &options, &TimeZone::UTC).unwrap();
        assert_eq!(text, r#"{"b":["q"]}"#);
    }
}
