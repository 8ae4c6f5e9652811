//! Writes accessor cells into typed columns, promoting on insert.

use crate::column::{Column, Scalar};
use crate::table::DataTable;
use crate::temporal::{parse_timestamp, CalendarDate};
use crate::traits::DataAccessor;
use crate::{DType, Result, TableError, Value};
use jiff::tz::TimeZone;
use std::ops::Range;
use std::sync::Arc;

/// Per-call fill settings
#[derive(Debug, Clone, Copy)]
pub struct FillContext<'a> {
    /// Missing and null cells become no-op markers instead of hard nulls,
    /// and promotion is refused
    pub is_update: bool,
    /// The table has a row limit; missing cells are then written as nulls
    /// rather than skipped
    pub is_limited: bool,
    pub time_zone: &'a TimeZone,
}

enum Outcome {
    Done,
    Missing,
    Promote(DType),
}

/// Fill every row of table column `target` from accessor column `source`
pub fn fill_column<A: DataAccessor + ?Sized>(
    accessor: &A,
    table: &mut DataTable,
    target: &str,
    source: &str,
    ctx: &FillContext<'_>,
) -> Result<()> {
    let rows = 0..table.size();
    fill_column_range(accessor, table, target, source, rows, ctx)
}

/// Fill `rows` of table column `target` from accessor column `source`.
///
/// An int32 column that meets a value outside the signed 32-bit range is
/// promoted to float64, keeping the rows already written, and the remaining
/// rows are filled as float64. An int32 or int64 column that meets NaN is
/// promoted to string and every row of `rows` is filled again from the
/// accessor, so earlier cells keep the caller's text rather than the
/// truncated integers.
pub fn fill_column_range<A: DataAccessor + ?Sized>(
    accessor: &A,
    table: &mut DataTable,
    target: &str,
    source: &str,
    rows: Range<usize>,
    ctx: &FillContext<'_>,
) -> Result<()> {
    let source_idx = accessor.position(source);
    let end = rows.end.min(table.size());
    let mut row = rows.start;

    while row < end {
        let item = source_idx.and_then(|cidx| accessor.value(cidx, row));
        let column = table
            .column_mut(target)
            .ok_or_else(|| TableError::schema(format!("No column named `{}`", target)))?;

        let outcome = match item {
            None if !ctx.is_limited => Outcome::Done,
            None | Some(Value::Null) => Outcome::Missing,
            Some(value) => write_cell(column, row, &value, ctx)?,
        };

        match outcome {
            Outcome::Done => row += 1,
            Outcome::Missing => {
                mark_missing(column, row, ctx);
                row += 1;
            }
            Outcome::Promote(to) => {
                let from = column.dtype();
                if ctx.is_update {
                    return Err(TableError::PromotionOnUpdate {
                        column: target.to_string(),
                        from,
                        to,
                        row,
                    });
                }
                log::warn!(
                    "Promoting column `{}` from {} to {} at row {}",
                    target,
                    from,
                    to,
                    row
                );
                table.promote_column(target, to)?;
                if to == DType::Str {
                    row = rows.start;
                }
            }
        }
    }

    Ok(())
}

fn mark_missing(column: &mut Column, row: usize, ctx: &FillContext<'_>) {
    if ctx.is_update {
        column.unset(row);
    } else {
        column.clear(row);
    }
}

fn write_cell(column: &mut Column, row: usize, value: &Value, ctx: &FillContext<'_>) -> Result<Outcome> {
    let scalar = match column.dtype() {
        DType::None => return Ok(Outcome::Done),
        DType::Bool => Scalar::Bool(value.is_truthy()),
        DType::Str => Scalar::Str(match value {
            Value::Str(s) => Arc::clone(s),
            other => Arc::from(other.to_text()),
        }),
        DType::Date => match to_date(value, ctx.time_zone) {
            Some(date) => Scalar::Date(date),
            None => return Ok(Outcome::Missing),
        },
        DType::Time => match to_datetime(value, ctx.time_zone) {
            Some(ms) => Scalar::Time(ms),
            None => return Ok(Outcome::Missing),
        },
        DType::Int64 => match value {
            Value::Int(i) => Scalar::Int64(*i),
            other => {
                let n = other.as_number();
                if n.is_nan() {
                    return Ok(Outcome::Promote(DType::Str));
                }
                Scalar::Int64(n as i64)
            }
        },
        DType::Int32 => {
            let n = value.as_number();
            if n > f64::from(i32::MAX) || n < f64::from(i32::MIN) {
                return Ok(Outcome::Promote(DType::Float64));
            }
            if n.is_nan() {
                return Ok(Outcome::Promote(DType::Str));
            }
            Scalar::Int32(n as i32)
        }
        DType::Int8 => Scalar::Int8(value.as_number() as i8),
        DType::Int16 => Scalar::Int16(value.as_number() as i16),
        DType::UInt8 => Scalar::UInt8(value.as_number() as u8),
        DType::UInt16 => Scalar::UInt16(value.as_number() as u16),
        DType::UInt32 => Scalar::UInt32(value.as_number() as u32),
        DType::UInt64 => match value {
            Value::Int(i) => Scalar::UInt64(*i as u64),
            other => Scalar::UInt64(other.as_number() as u64),
        },
        DType::Float32 => Scalar::Float32(value.as_number() as f32),
        DType::Float64 => Scalar::Float64(value.as_number()),
    };

    column.set(row, scalar)?;
    Ok(Outcome::Done)
}

/// Epoch milliseconds of a date-like, numeric or parseable cell
fn to_datetime(value: &Value, tz: &TimeZone) -> Option<i64> {
    match value {
        Value::DateLike(ms) => Some(*ms),
        Value::Int(i) => Some(*i),
        Value::Float(f) if f.0.is_finite() => Some(f.0 as i64),
        Value::Str(s) => parse_timestamp(s, tz),
        Value::Date(date) => date.local_midnight_millis(tz),
        _ => None,
    }
}

/// Local calendar fields of a date-like, numeric or parseable cell
fn to_date(value: &Value, tz: &TimeZone) -> Option<CalendarDate> {
    match value {
        Value::Date(date) => Some(*date),
        other => CalendarDate::from_epoch_millis(to_datetime(other, tz)?, tz),
    }
}
