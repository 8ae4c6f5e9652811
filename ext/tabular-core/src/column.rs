//! Typed, nullable, resizable column storage.
//!
//! Each column keeps its cells in a typed vector plus two
//! bitmaps: `validity` (1 = present) and `unset` (1 = explicitly unset by an
//! update, a no-op signal for the downstream merge). A cleared cell has
//! neither bit. Promotion rebuilds the storage as a wider variant.

use crate::bitmap::Bitmap;
use crate::temporal::CalendarDate;
use crate::value::format_number;
use crate::vocab::Vocabulary;
use crate::{DType, Result, TableError};
use std::ops::Range;
use std::sync::Arc;

/// A single typed cell read back from, or written into, a column
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float32(f32),
    Float64(f64),
    Str(Arc<str>),
    Date(CalendarDate),
    Time(i64),
}

impl Scalar {
    pub fn dtype(&self) -> DType {
        match self {
            Scalar::Null => DType::None,
            Scalar::Bool(_) => DType::Bool,
            Scalar::Int8(_) => DType::Int8,
            Scalar::Int16(_) => DType::Int16,
            Scalar::Int32(_) => DType::Int32,
            Scalar::Int64(_) => DType::Int64,
            Scalar::UInt8(_) => DType::UInt8,
            Scalar::UInt16(_) => DType::UInt16,
            Scalar::UInt32(_) => DType::UInt32,
            Scalar::UInt64(_) => DType::UInt64,
            Scalar::Float32(_) => DType::Float32,
            Scalar::Float64(_) => DType::Float64,
            Scalar::Str(_) => DType::Str,
            Scalar::Date(_) => DType::Date,
            Scalar::Time(_) => DType::Time,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Scalar::Null)
    }

    /// Numeric view of the cell; dates and strings have none
    pub fn to_f64(&self) -> Option<f64> {
        match self {
            Scalar::Bool(b) => Some(f64::from(u8::from(*b))),
            Scalar::Int8(v) => Some(f64::from(*v)),
            Scalar::Int16(v) => Some(f64::from(*v)),
            Scalar::Int32(v) => Some(f64::from(*v)),
            Scalar::Int64(v) => Some(*v as f64),
            Scalar::UInt8(v) => Some(f64::from(*v)),
            Scalar::UInt16(v) => Some(f64::from(*v)),
            Scalar::UInt32(v) => Some(f64::from(*v)),
            Scalar::UInt64(v) => Some(*v as f64),
            Scalar::Float32(v) => Some(f64::from(*v)),
            Scalar::Float64(v) => Some(*v),
            Scalar::Time(v) => Some(*v as f64),
            Scalar::Null | Scalar::Str(_) | Scalar::Date(_) => None,
        }
    }

    fn to_i64(&self) -> Option<i64> {
        match self {
            Scalar::Bool(b) => Some(i64::from(*b)),
            Scalar::Int8(v) => Some(i64::from(*v)),
            Scalar::Int16(v) => Some(i64::from(*v)),
            Scalar::Int32(v) => Some(i64::from(*v)),
            Scalar::Int64(v) => Some(*v),
            Scalar::UInt8(v) => Some(i64::from(*v)),
            Scalar::UInt16(v) => Some(i64::from(*v)),
            Scalar::UInt32(v) => Some(i64::from(*v)),
            Scalar::UInt64(v) => i64::try_from(*v).ok(),
            Scalar::Float32(v) => Some(*v as i64),
            Scalar::Float64(v) => Some(*v as i64),
            Scalar::Time(v) => Some(*v),
            Scalar::Null | Scalar::Str(_) | Scalar::Date(_) => None,
        }
    }

    /// Decimal/text rendering used when a column is promoted to string
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Null => String::new(),
            Scalar::Bool(b) => b.to_string(),
            Scalar::Int8(v) => v.to_string(),
            Scalar::Int16(v) => v.to_string(),
            Scalar::Int32(v) => v.to_string(),
            Scalar::Int64(v) => v.to_string(),
            Scalar::UInt8(v) => v.to_string(),
            Scalar::UInt16(v) => v.to_string(),
            Scalar::UInt32(v) => v.to_string(),
            Scalar::UInt64(v) => v.to_string(),
            Scalar::Float32(v) => format_number(f64::from(*v)),
            Scalar::Float64(v) => format_number(*v),
            Scalar::Str(s) => s.to_string(),
            Scalar::Date(d) => d.to_string(),
            Scalar::Time(ms) => ms.to_string(),
        }
    }

    /// Re-encode a valid cell as `target`
    fn widen(&self, target: DType) -> Result<Scalar> {
        if self.dtype() == target {
            return Ok(self.clone());
        }

        let widened = match target {
            DType::Str => Some(Scalar::Str(Arc::from(self.to_text()))),
            DType::Float64 => self.to_f64().map(Scalar::Float64),
            DType::Float32 => self.to_f64().map(|v| Scalar::Float32(v as f32)),
            DType::Int64 => self.to_i64().map(Scalar::Int64),
            DType::Int32 => self.to_i64().map(|v| Scalar::Int32(v as i32)),
            DType::Int16 => self.to_i64().map(|v| Scalar::Int16(v as i16)),
            DType::UInt64 => self.to_i64().map(|v| Scalar::UInt64(v as u64)),
            DType::UInt32 => self.to_i64().map(|v| Scalar::UInt32(v as u32)),
            DType::UInt16 => self.to_i64().map(|v| Scalar::UInt16(v as u16)),
            _ => None,
        };

        widened.ok_or_else(|| {
            TableError::conversion(format!(
                "Cannot re-encode {} value as {}",
                self.dtype(),
                target
            ))
        })
    }
}

/// Physical storage for one column
#[derive(Debug, Clone)]
enum ColumnData {
    None(usize),
    Bool(Vec<bool>),
    Int8(Vec<i8>),
    Int16(Vec<i16>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    UInt8(Vec<u8>),
    UInt16(Vec<u16>),
    UInt32(Vec<u32>),
    UInt64(Vec<u64>),
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    /// Per-row indices into the column's own vocabulary; index 0 is ""
    Str {
        vocab: Vocabulary,
        indices: Vec<u32>,
    },
    Date(Vec<CalendarDate>),
    Time(Vec<i64>),
}

macro_rules! for_each_vec {
    ($data:expr, $vec:ident => $body:expr, none($n:ident) => $none:expr) => {
        match $data {
            ColumnData::None($n) => $none,
            ColumnData::Bool($vec) => $body,
            ColumnData::Int8($vec) => $body,
            ColumnData::Int16($vec) => $body,
            ColumnData::Int32($vec) => $body,
            ColumnData::Int64($vec) => $body,
            ColumnData::UInt8($vec) => $body,
            ColumnData::UInt16($vec) => $body,
            ColumnData::UInt32($vec) => $body,
            ColumnData::UInt64($vec) => $body,
            ColumnData::Float32($vec) => $body,
            ColumnData::Float64($vec) => $body,
            ColumnData::Str { indices: $vec, .. } => $body,
            ColumnData::Date($vec) => $body,
            ColumnData::Time($vec) => $body,
        }
    };
}

impl ColumnData {
    fn new(dtype: DType, len: usize) -> Self {
        match dtype {
            DType::None => ColumnData::None(len),
            DType::Bool => ColumnData::Bool(vec![false; len]),
            DType::Int8 => ColumnData::Int8(vec![0; len]),
            DType::Int16 => ColumnData::Int16(vec![0; len]),
            DType::Int32 => ColumnData::Int32(vec![0; len]),
            DType::Int64 => ColumnData::Int64(vec![0; len]),
            DType::UInt8 => ColumnData::UInt8(vec![0; len]),
            DType::UInt16 => ColumnData::UInt16(vec![0; len]),
            DType::UInt32 => ColumnData::UInt32(vec![0; len]),
            DType::UInt64 => ColumnData::UInt64(vec![0; len]),
            DType::Float32 => ColumnData::Float32(vec![0.0; len]),
            DType::Float64 => ColumnData::Float64(vec![0.0; len]),
            DType::Str => {
                let mut vocab = Vocabulary::new();
                vocab.intern("");
                ColumnData::Str {
                    vocab,
                    indices: vec![0; len],
                }
            }
            DType::Date => ColumnData::Date(vec![CalendarDate::default(); len]),
            DType::Time => ColumnData::Time(vec![0; len]),
        }
    }

    fn len(&self) -> usize {
        for_each_vec!(self, v => v.len(), none(n) => *n)
    }

    fn resize(&mut self, len: usize) {
        for_each_vec!(self, v => v.resize(len, Default::default()), none(n) => *n = len)
    }
}

/// Presence state of a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStatus {
    Valid,
    /// Hard null (insert semantics)
    Cleared,
    /// No-op marker for the merge (update semantics)
    Unset,
}

#[derive(Debug, Clone)]
pub struct Column {
    dtype: DType,
    data: ColumnData,
    validity: Bitmap,
    unset: Bitmap,
}

impl Column {
    /// A column of `len` cleared cells
    pub fn new(dtype: DType, len: usize) -> Self {
        Self {
            dtype,
            data: ColumnData::new(dtype, len),
            validity: Bitmap::with_len(len, false),
            unset: Bitmap::with_len(len, false),
        }
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn len(&self) -> usize {
        self.validity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append `rows` cleared cells
    pub fn extend(&mut self, rows: usize) {
        let len = self.len() + rows;
        self.data.resize(len);
        self.validity.resize(len, false);
        self.unset.resize(len, false);
    }

    pub fn is_valid(&self, idx: usize) -> bool {
        self.validity.get(idx)
    }

    pub fn status(&self, idx: usize) -> CellStatus {
        if self.validity.get(idx) {
            CellStatus::Valid
        } else if self.unset.get(idx) {
            CellStatus::Unset
        } else {
            CellStatus::Cleared
        }
    }

    pub fn valid_count(&self) -> usize {
        self.validity.count_ones()
    }

    /// Mark a cell as a hard null
    pub fn clear(&mut self, idx: usize) {
        self.validity.set(idx, false);
        self.unset.set(idx, false);
    }

    /// Mark a cell as untouched by this update
    pub fn unset(&mut self, idx: usize) {
        self.validity.set(idx, false);
        self.unset.set(idx, true);
    }

    /// Write a cell. `Scalar::Null` clears it; any other scalar must match
    /// the column type.
    pub fn set(&mut self, idx: usize, value: Scalar) -> Result<()> {
        if idx >= self.len() {
            return Err(TableError::invalid_argument(format!(
                "Row {} is out of bounds for a column of {} rows",
                idx,
                self.len()
            )));
        }

        if !value.is_valid() {
            self.clear(idx);
            return Ok(());
        }

        match (&mut self.data, value) {
            (ColumnData::Bool(v), Scalar::Bool(x)) => v[idx] = x,
            (ColumnData::Int8(v), Scalar::Int8(x)) => v[idx] = x,
            (ColumnData::Int16(v), Scalar::Int16(x)) => v[idx] = x,
            (ColumnData::Int32(v), Scalar::Int32(x)) => v[idx] = x,
            (ColumnData::Int64(v), Scalar::Int64(x)) => v[idx] = x,
            (ColumnData::UInt8(v), Scalar::UInt8(x)) => v[idx] = x,
            (ColumnData::UInt16(v), Scalar::UInt16(x)) => v[idx] = x,
            (ColumnData::UInt32(v), Scalar::UInt32(x)) => v[idx] = x,
            (ColumnData::UInt64(v), Scalar::UInt64(x)) => v[idx] = x,
            (ColumnData::Float32(v), Scalar::Float32(x)) => v[idx] = x,
            (ColumnData::Float64(v), Scalar::Float64(x)) => v[idx] = x,
            (ColumnData::Str { vocab, indices }, Scalar::Str(s)) => indices[idx] = vocab.intern(&s),
            (ColumnData::Date(v), Scalar::Date(x)) => v[idx] = x,
            (ColumnData::Time(v), Scalar::Time(x)) => v[idx] = x,
            (_, other) => {
                return Err(TableError::conversion(format!(
                    "Cannot write {} value into {} column",
                    other.dtype(),
                    self.dtype
                )))
            }
        }

        self.validity.set(idx, true);
        self.unset.set(idx, false);
        Ok(())
    }

    /// Read a cell; invalid cells read as `Scalar::Null`
    pub fn get(&self, idx: usize) -> Scalar {
        if !self.is_valid(idx) {
            return Scalar::Null;
        }

        match &self.data {
            ColumnData::None(_) => Scalar::Null,
            ColumnData::Bool(v) => Scalar::Bool(v[idx]),
            ColumnData::Int8(v) => Scalar::Int8(v[idx]),
            ColumnData::Int16(v) => Scalar::Int16(v[idx]),
            ColumnData::Int32(v) => Scalar::Int32(v[idx]),
            ColumnData::Int64(v) => Scalar::Int64(v[idx]),
            ColumnData::UInt8(v) => Scalar::UInt8(v[idx]),
            ColumnData::UInt16(v) => Scalar::UInt16(v[idx]),
            ColumnData::UInt32(v) => Scalar::UInt32(v[idx]),
            ColumnData::UInt64(v) => Scalar::UInt64(v[idx]),
            ColumnData::Float32(v) => Scalar::Float32(v[idx]),
            ColumnData::Float64(v) => Scalar::Float64(v[idx]),
            ColumnData::Str { vocab, indices } => {
                Scalar::Str(Arc::from(vocab.unintern(indices[idx]).unwrap_or_default()))
            }
            ColumnData::Date(v) => Scalar::Date(v[idx]),
            ColumnData::Time(v) => Scalar::Time(v[idx]),
        }
    }

    /// Cells in `rows`, clamped to the column length
    pub fn scalars(&self, rows: Range<usize>) -> Vec<Scalar> {
        let end = rows.end.min(self.len());
        let start = rows.start.min(end);
        (start..end).map(|idx| self.get(idx)).collect()
    }

    /// The vocabulary backing a string column
    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        match &self.data {
            ColumnData::Str { vocab, .. } => Some(vocab),
            _ => None,
        }
    }

    /// Widen the column to `target` in place, re-encoding every valid cell.
    /// Validity and unset markers are preserved. An empty column may be
    /// retyped to any type.
    pub fn promote(&mut self, target: DType) -> Result<()> {
        if target == self.dtype {
            return Ok(());
        }
        if self.is_empty() {
            *self = Column::new(target, 0);
            return Ok(());
        }
        if !self.dtype.widens_to(target) {
            return Err(TableError::conversion(format!(
                "Cannot promote column from {} to {}",
                self.dtype, target
            )));
        }

        let len = self.len();
        let mut promoted = Column {
            dtype: target,
            data: ColumnData::new(target, len),
            validity: Bitmap::with_len(len, false),
            unset: self.unset.clone(),
        };

        for idx in 0..len {
            let cell = self.get(idx);
            if cell.is_valid() {
                promoted.set(idx, cell.widen(target)?)?;
            }
        }

        *self = promoted;
        Ok(())
    }
}
