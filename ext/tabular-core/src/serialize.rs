//! Whole-table serialization of a rectangular window.

use crate::arrow_conversion::column_to_arrow_array;
use crate::column::{Column, Scalar};
use crate::table::DataTable;
use crate::temporal::format_datetime;
use crate::{ErrorContext, Result, TableError, INTERNAL_COLUMNS};
use arrow_array::{RecordBatch, RecordBatchOptions};
use arrow_ipc::writer::StreamWriter;
use arrow_schema::{Field, Schema as ArrowSchema};
use jiff::tz::TimeZone;
use std::ops::Range;
use std::sync::Arc;

/// Rows `start_row..end_row` and visible columns `start_col..end_col`.
///
/// Bounds past the end of the table are clamped, so `Window::default()`
/// with `end_* = usize::MAX` selects everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start_row: usize,
    pub end_row: usize,
    pub start_col: usize,
    pub end_col: usize,
}

impl Default for Window {
    fn default() -> Self {
        Self::all()
    }
}

impl Window {
    pub fn new(rows: Range<usize>, cols: Range<usize>) -> Self {
        Self {
            start_row: rows.start,
            end_row: rows.end,
            start_col: cols.start,
            end_col: cols.end,
        }
    }

    pub fn all() -> Self {
        Self::new(0..usize::MAX, 0..usize::MAX)
    }

    /// Row range clamped to a table of `size` rows
    pub fn rows(&self, size: usize) -> Range<usize> {
        clamp(self.start_row..self.end_row, size)
    }

    /// Column range clamped to `count` visible columns
    pub fn cols(&self, count: usize) -> Range<usize> {
        clamp(self.start_col..self.end_col, count)
    }
}

fn clamp(range: Range<usize>, len: usize) -> Range<usize> {
    let end = range.end.min(len);
    range.start.min(end)..end
}

/// User columns in the window, internal key columns excluded
pub fn visible_columns<'a>(table: &'a DataTable, window: &Window) -> Vec<(&'a str, &'a Column)> {
    let mut visible: Vec<(&str, &Column)> = table
        .iter()
        .filter(|(name, _)| !INTERNAL_COLUMNS.contains(name))
        .collect();
    let cols = window.cols(visible.len());
    visible.drain(cols).collect()
}

/// Serialize a window as an Arrow IPC stream
pub fn to_arrow(table: &DataTable, window: Window) -> Result<Vec<u8>> {
    let rows = window.rows(table.size());
    let columns = visible_columns(table, &window);

    let fields: Vec<Field> = columns
        .iter()
        .map(|(name, column)| Field::new(*name, column.dtype().to_arrow(), true))
        .collect();
    let schema = Arc::new(ArrowSchema::new(fields));

    let arrays = columns
        .iter()
        .map(|(name, column)| {
            column_to_arrow_array(column, rows.clone())
                .with_context(|| format!("Failed to serialize column `{}`", name))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut buffer = Vec::new();
    {
        let mut writer = StreamWriter::try_new(&mut buffer, &schema)?;
        if !rows.is_empty() {
            let options = RecordBatchOptions::new().with_row_count(Some(rows.len()));
            let batch = RecordBatch::try_new_with_options(schema.clone(), arrays, &options)?;
            writer.write(&batch)?;
        }
        writer.finish()?;
    }

    log::debug!(
        "Serialized {} rows x {} columns to {} arrow bytes",
        rows.len(),
        columns.len(),
        buffer.len()
    );
    Ok(buffer)
}

/// Serialize a window as CSV with a header row.
///
/// Datetimes are rendered in `tz`; nulls are empty fields.
pub fn to_csv(table: &DataTable, window: Window, tz: &TimeZone) -> Result<String> {
    let rows = window.rows(table.size());
    let columns = visible_columns(table, &window);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(columns.iter().map(|(name, _)| *name))?;

    for row in rows {
        let record = columns
            .iter()
            .map(|(_, column)| csv_field(&column.get(row), tz))
            .collect::<Vec<_>>();
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| TableError::from(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| TableError::from(e.utf8_error()))
}

fn csv_field(scalar: &Scalar, tz: &TimeZone) -> String {
    match scalar {
        Scalar::Null => String::new(),
        Scalar::Date(date) => date.to_string(),
        Scalar::Time(ms) => format_datetime(*ms, tz).unwrap_or_default(),
        other => other.to_text(),
    }
}
