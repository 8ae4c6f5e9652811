use jiff::tz::TimeZone;
use serde_json::json;
use tabular_core::traits::GraphNode;
use tabular_core::{DType, DataTable, OutputCast, Schema, Window};
use tabular_json_adapter::*;

/// Keeps only the latest committed table
#[derive(Default)]
struct LatestNode {
    table: Option<DataTable>,
    offset: u32,
}

impl GraphNode for LatestNode {
    fn output_schema(&self) -> Schema {
        self.table
            .as_ref()
            .map(|table| table.schema().clone())
            .unwrap_or_default()
    }

    fn promote_column(&mut self, name: &str, dtype: DType) -> tabular_core::Result<()> {
        match self.table.as_mut() {
            Some(table) => table.promote_column(name, dtype),
            None => Ok(()),
        }
    }

    fn current_row_count(&self) -> usize {
        self.table.as_ref().map_or(0, DataTable::size)
    }

    fn write_offset(&self) -> u32 {
        self.offset
    }
}

fn utc() -> LoadOptions {
    LoadOptions {
        time_zone: Some("UTC".to_string()),
        ..LoadOptions::default()
    }
}

#[test]
fn test_records_round_trip() {
    let text = r#"[
        {"name": "ann", "age": 31, "seen": {"$date": "2024-01-02T03:04:05Z"}},
        {"name": "bo", "age": null},
        {"name": "cy", "age": 28, "seen": {"$date": 0}}
    ]"#;
    let delta = load_json(None::<&mut LatestNode>, text, &utc())
        .unwrap()
        .unwrap();

    assert_eq!(
        delta.output_schema.iter().collect::<Vec<_>>(),
        vec![("name", DType::Str), ("age", DType::Int32), ("seen", DType::Time)]
    );

    let options = OutputOptions::new().with_cast(OutputCast::Text);
    let json = to_json(&delta.table, &options, &TimeZone::UTC).unwrap();
    assert_eq!(
        json,
        json!([
            {"name": "ann", "age": 31, "seen": "2024-01-02 03:04:05.000"},
            {"name": "bo", "age": null, "seen": null},
            {"name": "cy", "age": 28, "seen": "1970-01-01 00:00:00.000"}
        ])
    );
}

#[test]
fn test_update_uses_committed_schema() {
    let mut node = LatestNode::default();
    let delta = load_json(Some(&mut node), r#"{"x": "integer", "y": "string"}"#, &utc())
        .unwrap()
        .unwrap();
    node.table = Some(delta.table);

    let options = LoadOptions {
        is_update: true,
        ..utc()
    };
    let delta = load_json(Some(&mut node), r#"{"x": ["5", 6], "y": [1, "b"]}"#, &options)
        .unwrap()
        .unwrap();
    assert!(delta.is_update);

    let options = OutputOptions::new()
        .with_orientation(Orientation::Columns)
        .with_window(Window::all());
    assert_eq!(
        to_json_string(&delta.table, &options, &TimeZone::UTC).unwrap(),
        r#"{"x":[5,6],"y":["1","b"]}"#
    );
}

#[test]
fn test_malformed_documents() {
    let err = load_json(None::<&mut LatestNode>, "[1, 2", &utc()).unwrap_err();
    assert!(matches!(err, AdapterError::Json(_)));

    let err = load_json(None::<&mut LatestNode>, r#"{"x": "decimal"}"#, &utc()).unwrap_err();
    assert!(matches!(
        err,
        AdapterError::Core(tabular_core::TableError::Configuration(_))
    ));
}
