//! Conversion between Arrow arrays and table cells
//!
//! Inbound Arrow cells are read as [`Value`]s so the ordinary fill engine
//! can write them; outbound columns are rebuilt as Arrow arrays for IPC
//! serialization.

use crate::column::{Column, Scalar};
use crate::temporal::CalendarDate;
use crate::{DType, Result, TableError, Value};
use arrow_array::builder::*;
use arrow_array::cast::AsArray;
use arrow_array::types::Int32Type;
use arrow_array::{Array, ArrayRef, NullArray};
use arrow_schema::{DataType, TimeUnit};
use jiff::tz::TimeZone;
use std::ops::Range;
use std::sync::Arc;

/// Convert a single value from an Arrow array at the given index to a Value
pub fn arrow_to_value(array: &dyn Array, index: usize) -> Result<Value> {
    use arrow_array::*;

    if array.is_null(index) {
        return Ok(Value::Null);
    }

    match array.data_type() {
        DataType::Null => Ok(Value::Null),
        DataType::Boolean => {
            let array = downcast_array::<BooleanArray>(array)?;
            Ok(Value::Bool(array.value(index)))
        }
        DataType::Int8 => {
            let array = downcast_array::<Int8Array>(array)?;
            Ok(Value::Int(i64::from(array.value(index))))
        }
        DataType::Int16 => {
            let array = downcast_array::<Int16Array>(array)?;
            Ok(Value::Int(i64::from(array.value(index))))
        }
        DataType::Int32 => {
            let array = downcast_array::<Int32Array>(array)?;
            Ok(Value::Int(i64::from(array.value(index))))
        }
        DataType::Int64 => {
            let array = downcast_array::<Int64Array>(array)?;
            Ok(Value::Int(array.value(index)))
        }
        DataType::UInt8 => {
            let array = downcast_array::<UInt8Array>(array)?;
            Ok(Value::Int(i64::from(array.value(index))))
        }
        DataType::UInt16 => {
            let array = downcast_array::<UInt16Array>(array)?;
            Ok(Value::Int(i64::from(array.value(index))))
        }
        DataType::UInt32 => {
            let array = downcast_array::<UInt32Array>(array)?;
            Ok(Value::Int(i64::from(array.value(index))))
        }
        DataType::UInt64 => {
            let array = downcast_array::<UInt64Array>(array)?;
            let value = array.value(index);
            Ok(i64::try_from(value)
                .map(Value::Int)
                .unwrap_or_else(|_| Value::float(value as f64)))
        }
        DataType::Float32 => {
            let array = downcast_array::<Float32Array>(array)?;
            Ok(Value::float(f64::from(array.value(index))))
        }
        DataType::Float64 => {
            let array = downcast_array::<Float64Array>(array)?;
            Ok(Value::float(array.value(index)))
        }

        DataType::Utf8 => {
            let array = downcast_array::<StringArray>(array)?;
            Ok(Value::str(array.value(index)))
        }
        DataType::LargeUtf8 => {
            let array = downcast_array::<LargeStringArray>(array)?;
            Ok(Value::str(array.value(index)))
        }
        DataType::Dictionary(_, _) => {
            let dictionary = array.as_any_dictionary_opt().ok_or_else(|| {
                TableError::conversion("Failed to cast to a dictionary array")
            })?;
            let key = match arrow_to_value(dictionary.keys(), index)? {
                Value::Int(key) => usize::try_from(key).map_err(|_| {
                    TableError::conversion(format!("Negative dictionary key {}", key))
                })?,
                other => {
                    return Err(TableError::conversion(format!(
                        "Expected integer dictionary key, got {}",
                        other.type_name()
                    )))
                }
            };
            arrow_to_value(dictionary.values().as_ref(), key)
        }

        // Date and time types
        DataType::Date32 => {
            let array = downcast_array::<Date32Array>(array)?;
            let days = array.value(index);
            CalendarDate::from_days_since_epoch(days)
                .map(Value::Date)
                .ok_or_else(|| TableError::conversion(format!("Date32 {} is out of range", days)))
        }
        DataType::Date64 => {
            let array = downcast_array::<Date64Array>(array)?;
            let millis = array.value(index);
            CalendarDate::from_epoch_millis(millis, &TimeZone::UTC)
                .map(Value::Date)
                .ok_or_else(|| TableError::conversion(format!("Date64 {} is out of range", millis)))
        }
        DataType::Timestamp(unit, _) => {
            let millis = match unit {
                TimeUnit::Second => {
                    let array = downcast_array::<TimestampSecondArray>(array)?;
                    array.value(index).saturating_mul(1_000)
                }
                TimeUnit::Millisecond => {
                    let array = downcast_array::<TimestampMillisecondArray>(array)?;
                    array.value(index)
                }
                TimeUnit::Microsecond => {
                    let array = downcast_array::<TimestampMicrosecondArray>(array)?;
                    array.value(index).div_euclid(1_000)
                }
                TimeUnit::Nanosecond => {
                    let array = downcast_array::<TimestampNanosecondArray>(array)?;
                    array.value(index).div_euclid(1_000_000)
                }
            };
            Ok(Value::DateLike(millis))
        }

        dt => Err(TableError::conversion(format!(
            "Unsupported Arrow data type: {:?}",
            dt
        ))),
    }
}

macro_rules! build_primitive {
    ($builder:ident, $variant:ident, $scalars:expr) => {{
        let scalars = $scalars;
        let mut builder = $builder::with_capacity(scalars.len());
        for scalar in scalars {
            match scalar {
                Scalar::$variant(v) => builder.append_value(v),
                Scalar::Null => builder.append_null(),
                other => return Err(unexpected(DType::$variant, &other)),
            }
        }
        Ok(Arc::new(builder.finish()) as ArrayRef)
    }};
}

/// Build an Arrow array from the rows `rows` of a column.
///
/// String columns become `Dictionary<Int32, Utf8>`, dates `Date32` and
/// datetimes millisecond timestamps.
pub fn column_to_arrow_array(column: &Column, rows: Range<usize>) -> Result<ArrayRef> {
    let scalars = column.scalars(rows);

    match column.dtype() {
        DType::None => Ok(Arc::new(NullArray::new(scalars.len()))),
        DType::Bool => {
            let mut builder = BooleanBuilder::with_capacity(scalars.len());
            for scalar in scalars {
                match scalar {
                    Scalar::Bool(b) => builder.append_value(b),
                    Scalar::Null => builder.append_null(),
                    other => return Err(unexpected(DType::Bool, &other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        DType::Int8 => build_primitive!(Int8Builder, Int8, scalars),
        DType::Int16 => build_primitive!(Int16Builder, Int16, scalars),
        DType::Int32 => build_primitive!(Int32Builder, Int32, scalars),
        DType::Int64 => build_primitive!(Int64Builder, Int64, scalars),
        DType::UInt8 => build_primitive!(UInt8Builder, UInt8, scalars),
        DType::UInt16 => build_primitive!(UInt16Builder, UInt16, scalars),
        DType::UInt32 => build_primitive!(UInt32Builder, UInt32, scalars),
        DType::UInt64 => build_primitive!(UInt64Builder, UInt64, scalars),
        DType::Float32 => build_primitive!(Float32Builder, Float32, scalars),
        DType::Float64 => build_primitive!(Float64Builder, Float64, scalars),
        DType::Time => build_primitive!(TimestampMillisecondBuilder, Time, scalars),
        DType::Date => {
            let mut builder = Date32Builder::with_capacity(scalars.len());
            for scalar in scalars {
                match scalar {
                    Scalar::Date(date) => {
                        let days = date.days_since_epoch().ok_or_else(|| {
                            TableError::conversion(format!("Date {} is out of range", date))
                        })?;
                        builder.append_value(days);
                    }
                    Scalar::Null => builder.append_null(),
                    other => return Err(unexpected(DType::Date, &other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
        DType::Str => {
            let mut builder = StringDictionaryBuilder::<Int32Type>::new();
            for scalar in scalars {
                match scalar {
                    Scalar::Str(s) => {
                        builder.append(s.as_ref())?;
                    }
                    Scalar::Null => builder.append_null(),
                    other => return Err(unexpected(DType::Str, &other)),
                }
            }
            Ok(Arc::new(builder.finish()))
        }
    }
}


fn unexpected(expected: DType, got: &Scalar) -> TableError {
    TableError::conversion(format!(
        "Expected {} cell, got {}",
        expected,
        got.dtype()
    ))
}

/// Helper function to downcast an array with better error messages
fn downcast_array<T: 'static>(array: &dyn Array) -> Result<&T> {
    array.as_any().downcast_ref::<T>().ok_or_else(|| {
        TableError::conversion(format!("Failed to cast to {}", std::any::type_name::<T>()))
    })
}
