//! Column name discovery and type inference over freeform input.

use crate::input::InputData;
use crate::schema::INDEX_COLUMN;
use crate::temporal::{is_local_midnight, parse_timestamp};
use crate::{DType, Result, Schema, TableError, Value};
use jiff::tz::TimeZone;

/// Rows sampled per column when inferring a type
pub const DEFAULT_SAMPLE_ROWS: usize = 100;
/// Initial window of records scanned for keys in row-major input
pub const DEFAULT_KEY_SAMPLE_ROWS: usize = 50;
/// Integral numbers at or above this magnitude infer as float64
const INTEGER_MAGNITUDE_LIMIT: f64 = 10_000.0;

/// Sampling configuration for inference
#[derive(Debug, Clone)]
pub struct InferenceOptions {
    pub sample_rows: usize,
    pub key_sample_rows: usize,
    /// Zone whose calendar decides date vs. datetime
    pub time_zone: TimeZone,
}

impl Default for InferenceOptions {
    fn default() -> Self {
        Self {
            sample_rows: DEFAULT_SAMPLE_ROWS,
            key_sample_rows: DEFAULT_KEY_SAMPLE_ROWS,
            time_zone: TimeZone::system(),
        }
    }
}

impl InferenceOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sample_rows(mut self, rows: usize) -> Self {
        self.sample_rows = rows;
        self
    }

    pub fn with_key_sample_rows(mut self, rows: usize) -> Self {
        self.key_sample_rows = rows;
        self
    }

    pub fn with_time_zone(mut self, time_zone: TimeZone) -> Self {
        self.time_zone = time_zone;
        self
    }
}

/// Classify a single cell
pub fn infer_scalar_type(value: &Value, tz: &TimeZone) -> DType {
    let number = match value {
        Value::Int(i) => Some(*i as f64),
        Value::Float(f) => Some(f.0),
        other => other.embedded_number(),
    };

    if let Some(n) = number {
        return if n.fract() == 0.0 && n.abs() < INTEGER_MAGNITUDE_LIMIT && n != 0.0 {
            DType::Int32
        } else {
            DType::Float64
        };
    }

    match value {
        Value::Null => DType::None,
        Value::Bool(_) => DType::Bool,
        Value::Date(_) => DType::Date,
        Value::DateLike(ms) if is_local_midnight(*ms, tz) => DType::Date,
        Value::DateLike(_) => DType::Time,
        Value::Str(s) => {
            if parse_timestamp(s, tz).is_some() {
                DType::Time
            } else if s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false") {
                DType::Bool
            } else {
                DType::Str
            }
        }
        // numbers are classified above
        Value::Int(_) | Value::Float(_) => DType::Float64,
    }
}

/// Column names of a freeform dataset.
///
/// Row-major input takes the union of keys over a sample window that
/// doubles whenever a record introduces unseen keys. Declared schemas drop
/// `__INDEX__`, which is never a stored column.
pub fn column_names(data: &InputData, options: &InferenceOptions) -> Vec<String> {
    match data {
        InputData::Rows(rows) => row_major_names(rows, options.key_sample_rows),
        InputData::Columns(columns) => columns.keys().cloned().collect(),
        InputData::Schema(declared) => declared
            .keys()
            .filter(|name| {
                if name.as_str() == INDEX_COLUMN {
                    log::warn!("{} column should not be in the Table schema", INDEX_COLUMN);
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect(),
    }
}

fn row_major_names(rows: &[indexmap::IndexMap<String, Value>], window: usize) -> Vec<String> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };

    let mut names: Vec<String> = first.keys().cloned().collect();
    let mut max_check = window.max(1);
    let mut warned = false;
    let mut idx = 0;

    while idx < rows.len().min(max_check) {
        let record = &rows[idx];
        let consistent =
            record.len() == names.len() && record.keys().all(|key| names.contains(key));

        if !consistent {
            if !warned {
                log::warn!("Data parse warning: row-major data has inconsistent rows");
                warned = true;
            }

            let old_size = names.len();
            for key in record.keys() {
                if !names.contains(key) {
                    names.push(key.clone());
                }
            }
            if names.len() > old_size {
                log::debug!("Extended column names from {} to {}", old_size, names.len());
                max_check *= 2;
            }
        }
        idx += 1;
    }

    names
}

/// Type of one column, from the first non-null sample; `string` if none
pub fn infer_column_type(data: &InputData, name: &str, options: &InferenceOptions) -> DType {
    let sample = data.row_count().min(options.sample_rows);
    (0..sample)
        .filter_map(|row| data.cell(name, row))
        .find(|value| !value.is_null())
        .map(|value| infer_scalar_type(value, &options.time_zone))
        .unwrap_or(DType::Str)
}

/// Types for `names`. Declared schemas map their type tokens exactly;
/// other formats are sampled.
pub fn infer_types(
    data: &InputData,
    names: &[String],
    options: &InferenceOptions,
) -> Result<Vec<DType>> {
    if names.is_empty() {
        return Err(TableError::configuration(
            "Cannot determine data types without column names",
        ));
    }

    match data {
        InputData::Schema(declared) => names
            .iter()
            .map(|name| {
                let token = declared.get(name).ok_or_else(|| {
                    TableError::configuration(format!("No declared type for key '{}'", name))
                })?;
                DType::from_declared(token).ok_or_else(|| {
                    TableError::configuration(format!(
                        "Unknown type '{}' for key '{}'",
                        token, name
                    ))
                })
            })
            .collect(),
        _ => Ok(names
            .iter()
            .map(|name| infer_column_type(data, name, options))
            .collect()),
    }
}

/// Names and types of a freeform dataset
pub fn resolve_schema(data: &InputData, options: &InferenceOptions) -> Result<Schema> {
    let names = column_names(data, options);
    let types = infer_types(data, &names, options)?;
    log::debug!("Inferred schema: {:?} {:?}", names, types);
    Schema::new(names, types)
}
