#![allow(dead_code)]

use arrow_array::RecordBatch;
use arrow_ipc::writer::StreamWriter;
use bytes::Bytes;
use indexmap::IndexMap;
use jiff::tz::TimeZone;
use tabular_core::traits::GraphNode;
use tabular_core::*;

/// One row-major record
pub fn record(cells: &[(&str, Value)]) -> IndexMap<String, Value> {
    cells
        .iter()
        .map(|(name, value)| (name.to_string(), value.clone()))
        .collect()
}

/// Column-major input from `(name, cells)` pairs
pub fn column_input(columns: &[(&str, Vec<Value>)]) -> ValueInput {
    ValueInput::columns(
        columns
            .iter()
            .map(|(name, cells)| (name.to_string(), cells.clone()))
            .collect(),
    )
}

/// Options that resolve local calendar fields in UTC
pub fn utc_options() -> MaterializeOptions {
    MaterializeOptions::new()
        .with_inference(InferenceOptions::new().with_time_zone(TimeZone::UTC))
}

/// Materialize a fresh table with no graph node
pub fn materialize_new(input: impl Into<TableInput>, options: &MaterializeOptions) -> Materialized {
    materialize(None::<&mut MemoryNode>, input.into(), options)
        .unwrap()
        .expect("input produced no table")
}

/// Encode record batches as an Arrow IPC stream
pub fn arrow_stream(batches: &[RecordBatch]) -> Bytes {
    let mut bytes = Vec::new();
    {
        let schema = batches[0].schema();
        let mut writer = StreamWriter::try_new(&mut bytes, &schema).unwrap();
        for batch in batches {
            writer.write(batch).unwrap();
        }
        writer.finish().unwrap();
    }
    Bytes::from(bytes)
}

/// A graph node that appends every committed delta to one in-memory table
#[derive(Default)]
pub struct MemoryNode {
    table: Option<DataTable>,
    offset: u32,
}

impl MemoryNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self) -> &DataTable {
        self.table.as_ref().expect("nothing committed yet")
    }

    /// Append the delta's valid cells, widening committed columns the
    /// delta promoted
    pub fn commit(&mut self, delta: Materialized) -> Result<()> {
        self.offset = delta.next_offset();
        let Some(table) = self.table.as_mut() else {
            self.table = Some(delta.table);
            return Ok(());
        };

        for (name, dtype) in delta.table.schema().iter() {
            if let Some(current) = table.schema().dtype(name) {
                if current != dtype && current.widens_to(dtype) {
                    table.promote_column(name, dtype)?;
                }
            }
        }

        let base = table.size();
        table.extend(delta.table.size());
        for (name, column) in delta.table.iter() {
            let Some(target) = table.column_mut(name) else {
                continue;
            };
            for row in 0..column.len() {
                if column.status(row) == CellStatus::Valid {
                    target.set(base + row, column.get(row))?;
                }
            }
        }
        Ok(())
    }
}

impl GraphNode for MemoryNode {
    fn output_schema(&self) -> Schema {
        self.table
            .as_ref()
            .map(|table| table.schema().clone())
            .unwrap_or_default()
    }

    fn promote_column(&mut self, name: &str, dtype: DType) -> Result<()> {
        match self.table.as_mut() {
            Some(table) => table.promote_column(name, dtype),
            None => Err(TableError::schema("No committed table")),
        }
    }

    fn current_row_count(&self) -> usize {
        self.table.as_ref().map_or(0, DataTable::size)
    }

    fn write_offset(&self) -> u32 {
        self.offset
    }
}
