//! Inbound dataset descriptors and the accessor over host values.

use crate::traits::DataAccessor;
use crate::{DType, Result, TableError, Value};
use bytes::Bytes;
use indexmap::IndexMap;

/// Shape of a freeform dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// A sequence of records keyed by column name
    Rows,
    /// A map of column name to a sequence of cells
    Columns,
    /// A map of column name to a declared type token; carries no rows
    Schema,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputData {
    Rows(Vec<IndexMap<String, Value>>),
    Columns(IndexMap<String, Vec<Value>>),
    Schema(IndexMap<String, String>),
}

impl InputData {
    pub fn format(&self) -> InputFormat {
        match self {
            InputData::Rows(_) => InputFormat::Rows,
            InputData::Columns(_) => InputFormat::Columns,
            InputData::Schema(_) => InputFormat::Schema,
        }
    }

    /// Rows carried by the dataset. Column-major data reports its longest
    /// column; shorter columns read as missing past their end.
    pub fn row_count(&self) -> usize {
        match self {
            InputData::Rows(rows) => rows.len(),
            InputData::Columns(columns) => columns.values().map(Vec::len).max().unwrap_or(0),
            InputData::Schema(_) => 0,
        }
    }

    /// A single cell; `None` when the record or column lacks it
    pub fn cell(&self, name: &str, row: usize) -> Option<&Value> {
        match self {
            InputData::Rows(rows) => rows.get(row)?.get(name),
            InputData::Columns(columns) => columns.get(name)?.get(row),
            InputData::Schema(_) => None,
        }
    }

    /// Whether any record or column carries `name`
    pub fn has_column(&self, name: &str) -> bool {
        match self {
            InputData::Rows(rows) => rows.iter().any(|row| row.contains_key(name)),
            InputData::Columns(columns) => columns.contains_key(name),
            InputData::Schema(declared) => declared.contains_key(name),
        }
    }
}

/// Host-value input, optionally with caller-resolved names and types
#[derive(Debug, Clone, PartialEq)]
pub struct ValueInput {
    pub data: InputData,
    pub names: Option<Vec<String>>,
    pub types: Option<Vec<DType>>,
}

impl ValueInput {
    pub fn new(data: InputData) -> Self {
        Self {
            data,
            names: None,
            types: None,
        }
    }

    pub fn rows(rows: Vec<IndexMap<String, Value>>) -> Self {
        Self::new(InputData::Rows(rows))
    }

    pub fn columns(columns: IndexMap<String, Vec<Value>>) -> Self {
        Self::new(InputData::Columns(columns))
    }

    pub fn schema(declared: IndexMap<String, String>) -> Self {
        Self::new(InputData::Schema(declared))
    }

    /// Supply names and types explicitly, bypassing inference
    pub fn with_schema(mut self, names: Vec<String>, types: Vec<DType>) -> Self {
        self.names = Some(names);
        self.types = Some(types);
        self
    }

    pub fn row_count(&self) -> usize {
        self.data.row_count()
    }
}

/// Everything the materializer can ingest
#[derive(Debug, Clone)]
pub enum TableInput {
    Values(ValueInput),
    /// An Arrow IPC file or stream
    Arrow(Bytes),
    /// Delimited text with a header row
    Csv(String),
}

impl From<ValueInput> for TableInput {
    fn from(input: ValueInput) -> Self {
        TableInput::Values(input)
    }
}

/// [`DataAccessor`] over host values, exposing the given column names
pub struct ValueAccessor<'a> {
    data: &'a InputData,
    names: Vec<String>,
    row_count: usize,
}

impl<'a> ValueAccessor<'a> {
    pub fn new(data: &'a InputData, names: Vec<String>) -> Self {
        Self {
            row_count: data.row_count(),
            data,
            names,
        }
    }
}

impl DataAccessor for ValueAccessor<'_> {
    fn row_count(&self) -> usize {
        self.row_count
    }

    fn names(&self) -> &[String] {
        &self.names
    }

    fn value(&self, column: usize, row: usize) -> Option<Value> {
        let name = self.names.get(column)?;
        self.data.cell(name, row).cloned()
    }
}

/// Parse delimited text into column-major string cells.
///
/// Empty cells become `Value::Null`. A header that starts with the
/// delimiter gets a `_` prefix so its first column has a name.
pub fn parse_csv(text: &str) -> Result<InputData> {
    let prefixed;
    let text = if text.starts_with(',') {
        prefixed = format!("_{}", text);
        prefixed.as_str()
    } else {
        text
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(TableError::invalid_argument("CSV input has no header row"));
    }

    let mut columns: IndexMap<String, Vec<Value>> = IndexMap::with_capacity(headers.len());
    for name in headers.iter() {
        if columns.insert(name.to_string(), Vec::new()).is_some() {
            return Err(TableError::schema(format!(
                "Duplicate CSV column name `{}`",
                name
            )));
        }
    }

    for record in reader.records() {
        let record = record?;
        for (idx, cells) in columns.values_mut().enumerate() {
            let cell = match record.get(idx) {
                Some("") | None => Value::Null,
                Some(text) => Value::from(text),
            };
            cells.push(cell);
        }
    }

    Ok(InputData::Columns(columns))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, Value)]) -> IndexMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_row_major_accessor() {
        let data = InputData::Rows(vec![
            record(&[("a", Value::Int(1)), ("b", Value::from("x"))]),
            record(&[("a", Value::Null)]),
        ]);
        let accessor = ValueAccessor::new(&data, vec!["a".into(), "b".into()]);

        assert_eq!(accessor.row_count(), 2);
        assert_eq!(accessor.value(0, 0), Some(Value::Int(1)));
        assert_eq!(accessor.value(0, 1), Some(Value::Null));
        assert_eq!(accessor.value(1, 1), None);
        assert_eq!(accessor.position("b"), Some(1));
    }

    #[test]
    fn test_column_major_ragged_lengths() {
        let mut columns = IndexMap::new();
        columns.insert("a".to_string(), vec![Value::Int(1), Value::Int(2)]);
        columns.insert("b".to_string(), vec![Value::Bool(true)]);
        let data = InputData::Columns(columns);

        assert_eq!(data.row_count(), 2);
        assert_eq!(data.cell("b", 1), None);
        assert!(data.has_column("a"));
        assert!(!data.has_column("c"));
    }

    #[test]
    fn test_parse_csv() {
        let data = parse_csv("x,y\n1,a\n,b\n").unwrap();
        match data {
            InputData::Columns(columns) => {
                assert_eq!(columns.keys().collect::<Vec<_>>(), vec!["x", "y"]);
                assert_eq!(columns["x"], vec![Value::from("1"), Value::Null]);
                assert_eq!(columns["y"], vec![Value::from("a"), Value::from("b")]);
            }
            other => panic!("unexpected format {:?}", other.format()),
        }
    }

    #[test]
    fn test_parse_csv_leading_delimiter() {
        let data = parse_csv(",v\n0,3\n").unwrap();
        assert!(data.has_column("_"));
        assert_eq!(data.cell("v", 0), Some(&Value::from("3")));
    }
}
