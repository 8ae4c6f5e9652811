//! Columnar export codec.
//!
//! Encodes a run of cells into flat typed buffers plus an Arrow-style
//! validity bitmap, or into a dictionary triple for string columns. The
//! bitmap is packed 32 rows per `u32` word but padded to a 64-row boundary:
//! `ceil(rows / 64) * 2` words.

use crate::column::{Column, Scalar};
use crate::temporal::format_datetime;
use crate::vocab::Vocabulary;
use crate::{DType, Result, TableError, Value};
use jiff::tz::TimeZone;
use std::ops::Range;

/// Length in `u32` words of the validity bitmap for `rows` rows
pub fn validity_words(rows: usize) -> usize {
    rows.div_ceil(64) * 2
}

/// A flat value buffer; null rows hold the type's zero value
#[derive(Debug, Clone, PartialEq)]
pub enum TypedValues {
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    UInt32(Vec<u32>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    /// One bit per row, least significant bit first
    Bool(Vec<u8>),
}

impl TypedValues {
    pub fn len(&self) -> usize {
        match self {
            TypedValues::Int8(v) => v.len(),
            TypedValues::Int16(v) => v.len(),
            TypedValues::Int32(v) => v.len(),
            TypedValues::UInt32(v) => v.len(),
            TypedValues::Float32(v) => v.len(),
            TypedValues::Float64(v) => v.len(),
            TypedValues::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodedValues {
    pub values: TypedValues,
    pub null_count: usize,
    pub validity: Vec<u32>,
}

/// Dictionary encoding of a string column
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedDictionary {
    /// UTF-8 bytes of every distinct string, in first-seen order
    pub dictionary: Vec<u8>,
    /// `distinct + 1` cumulative byte offsets into `dictionary`
    pub offsets: Vec<i32>,
    /// Per-row dictionary index; zero for null rows
    pub indices: Vec<i32>,
    pub null_count: usize,
    pub validity: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EncodedColumn {
    Values(EncodedValues),
    Dictionary(EncodedDictionary),
}

impl EncodedColumn {
    pub fn null_count(&self) -> usize {
        match self {
            EncodedColumn::Values(v) => v.null_count,
            EncodedColumn::Dictionary(d) => d.null_count,
        }
    }

    pub fn validity(&self) -> &[u32] {
        match self {
            EncodedColumn::Values(v) => &v.validity,
            EncodedColumn::Dictionary(d) => &d.validity,
        }
    }
}

struct ValidityBuilder {
    words: Vec<u32>,
    null_count: usize,
}

impl ValidityBuilder {
    fn new(rows: usize) -> Self {
        Self {
            words: vec![0; validity_words(rows)],
            null_count: 0,
        }
    }

    /// Record row `idx`; returns whether it is valid
    fn mark(&mut self, idx: usize, scalar: &Scalar) -> bool {
        if scalar.is_valid() {
            self.words[idx / 32] |= 1 << (idx % 32);
            true
        } else {
            self.null_count += 1;
            false
        }
    }
}

/// Encode `scalars` as a column of type `dtype`.
///
/// With `cast_double`, datetime cells are emitted as the stored 64-bit
/// integer reinterpreted as an IEEE-754 double. Float64 cells are copied
/// bit for bit in either mode.
pub fn encode_column(scalars: &[Scalar], dtype: DType, cast_double: bool) -> Result<EncodedColumn> {
    if dtype == DType::Str {
        return Ok(EncodedColumn::Dictionary(encode_strings(scalars)?));
    }

    let rows = scalars.len();
    let mut validity = ValidityBuilder::new(rows);

    let values = match dtype {
        DType::Bool => {
            let mut bits = vec![0u8; validity_words(rows) * 4];
            for (idx, scalar) in scalars.iter().enumerate() {
                if validity.mark(idx, scalar) && matches!(scalar, Scalar::Bool(true)) {
                    bits[idx / 8] |= 1 << (idx % 8);
                }
            }
            TypedValues::Bool(bits)
        }
        DType::Int8 => TypedValues::Int8(collect(scalars, &mut validity, |s| match s {
            Scalar::Int8(v) => Some(*v),
            _ => None,
        })?),
        DType::Int16 => TypedValues::Int16(collect(scalars, &mut validity, |s| match s {
            Scalar::Int16(v) => Some(*v),
            _ => None,
        })?),
        DType::Int32 => TypedValues::Int32(collect(scalars, &mut validity, |s| match s {
            Scalar::Int32(v) => Some(*v),
            _ => None,
        })?),
        // 64-bit integers travel as int32 on this wire and may truncate
        DType::Int64 => TypedValues::Int32(collect(scalars, &mut validity, |s| match s {
            Scalar::Int64(v) => Some(*v as i32),
            _ => None,
        })?),
        DType::UInt32 => TypedValues::UInt32(collect(scalars, &mut validity, |s| match s {
            Scalar::UInt32(v) => Some(*v),
            _ => None,
        })?),
        DType::Float32 => TypedValues::Float32(collect(scalars, &mut validity, |s| match s {
            Scalar::Float32(v) => Some(*v),
            _ => None,
        })?),
        DType::Float64 => TypedValues::Float64(collect(scalars, &mut validity, |s| match s {
            Scalar::Float64(v) => Some(*v),
            _ => None,
        })?),
        DType::Time => TypedValues::Float64(collect(scalars, &mut validity, |s| match s {
            Scalar::Time(ms) if cast_double => Some(f64::from_bits(*ms as u64)),
            Scalar::Time(ms) => Some(*ms as f64),
            _ => None,
        })?),
        DType::Date => TypedValues::Float64(collect(scalars, &mut validity, |s| match s {
            Scalar::Date(date) => date
                .local_midnight_millis(&TimeZone::UTC)
                .map(|ms| ms as f64),
            _ => None,
        })?),
        other => {
            return Err(TableError::conversion(format!(
                "Unhandled export type {}",
                other
            )))
        }
    };

    Ok(EncodedColumn::Values(EncodedValues {
        values,
        null_count: validity.null_count,
        validity: validity.words,
    }))
}

fn collect<T: Default>(
    scalars: &[Scalar],
    validity: &mut ValidityBuilder,
    extract: impl Fn(&Scalar) -> Option<T>,
) -> Result<Vec<T>> {
    let mut values = Vec::with_capacity(scalars.len());
    for (idx, scalar) in scalars.iter().enumerate() {
        if validity.mark(idx, scalar) {
            let value = extract(scalar).ok_or_else(|| {
                TableError::conversion(format!(
                    "Unexpected {} cell at row {}",
                    scalar.dtype(),
                    idx
                ))
            })?;
            values.push(value);
        } else {
            values.push(T::default());
        }
    }
    Ok(values)
}

/// Dictionary-encode string cells against a vocabulary private to this call
pub fn encode_strings(scalars: &[Scalar]) -> Result<EncodedDictionary> {
    let rows = scalars.len();
    let mut validity = ValidityBuilder::new(rows);
    let mut vocab = Vocabulary::new();
    let mut indices = vec![0i32; rows];

    for (idx, scalar) in scalars.iter().enumerate() {
        if !validity.mark(idx, scalar) {
            continue;
        }
        let text = match scalar {
            Scalar::Str(s) => vocab.intern(s),
            other => vocab.intern(&other.to_text()),
        };
        indices[idx] = i32::try_from(text)
            .map_err(|_| TableError::conversion("String dictionary exceeds i32 indices"))?;
    }

    Ok(EncodedDictionary {
        dictionary: vocab.bytes().to_vec(),
        offsets: vocab.offsets(),
        indices,
        null_count: validity.null_count,
        validity: validity.words,
    })
}

/// Encode the rows `rows` of a stored column
pub fn encode_table_column(
    column: &Column,
    rows: Range<usize>,
    cast_double: bool,
) -> Result<EncodedColumn> {
    encode_column(&column.scalars(rows), column.dtype(), cast_double)
}

/// How a cell is rendered for a host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputCast {
    #[default]
    Plain,
    /// Floats and datetimes as the raw bits of the stored value
    Double,
    /// Datetimes as `YYYY-MM-DD HH:MM:SS.fff` local text
    Text,
}

impl Scalar {
    /// Convert a stored cell into a host value
    pub fn to_value(&self, cast: OutputCast, tz: &TimeZone) -> Value {
        match self {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(*b),
            Scalar::Time(ms) => match cast {
                OutputCast::Double => Value::float(f64::from_bits(*ms as u64)),
                OutputCast::Text => format_datetime(*ms, tz)
                    .map(Value::from)
                    .unwrap_or(Value::Null),
                OutputCast::Plain => Value::float(*ms as f64),
            },
            Scalar::Float64(v) => Value::float(*v),
            Scalar::Float32(v) => Value::float(f64::from(*v)),
            Scalar::Date(date) => date
                .local_midnight_millis(tz)
                .map(|ms| Value::float(ms as f64))
                .unwrap_or(Value::Null),
            Scalar::Int8(v) => Value::Int(i64::from(*v)),
            Scalar::Int16(v) => Value::Int(i64::from(*v)),
            Scalar::Int32(v) => Value::Int(i64::from(*v)),
            Scalar::Int64(v) => Value::Int(*v),
            Scalar::UInt8(v) => Value::Int(i64::from(*v)),
            Scalar::UInt16(v) => Value::Int(i64::from(*v)),
            Scalar::UInt32(v) => Value::Int(i64::from(*v)),
            Scalar::UInt64(v) => i64::try_from(*v)
                .map(Value::Int)
                .unwrap_or_else(|_| Value::float(*v as f64)),
            Scalar::Str(s) => Value::Str(s.clone()),
        }
    }
}
