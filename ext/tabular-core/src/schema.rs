use crate::{Result, TableError};
use arrow_schema::{DataType, Field, TimeUnit};
use std::fmt;

/// Synthesized primary key column
pub const PKEY_COLUMN: &str = "psp_pkey";
/// Synthesized operation/order key column
pub const OKEY_COLUMN: &str = "psp_okey";
/// Operation column maintained by the update-propagation node
pub const OP_COLUMN: &str = "psp_op";
/// Pseudo-column carrying caller-supplied primary keys; consumed, never stored
pub const INDEX_COLUMN: &str = "__INDEX__";

/// Columns owned by the table machinery rather than the caller
pub const INTERNAL_COLUMNS: [&str; 3] = [PKEY_COLUMN, OKEY_COLUMN, OP_COLUMN];

/// Scalar column types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    None,
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    Str,
    Date,
    Time,
}

impl DType {
    /// Get the type name for display
    pub fn type_name(&self) -> &'static str {
        match self {
            DType::None => "none",
            DType::Bool => "bool",
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::UInt8 => "uint8",
            DType::UInt16 => "uint16",
            DType::UInt32 => "uint32",
            DType::UInt64 => "uint64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
            DType::Str => "string",
            DType::Date => "date",
            DType::Time => "datetime",
        }
    }

    /// Map a schema-declaration token to a type. Matching is exact.
    pub fn from_declared(token: &str) -> Option<DType> {
        match token {
            "integer" => Some(DType::Int32),
            "float" => Some(DType::Float64),
            "string" => Some(DType::Str),
            "boolean" => Some(DType::Bool),
            "datetime" => Some(DType::Time),
            "date" => Some(DType::Date),
            _ => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            DType::Int8
                | DType::Int16
                | DType::Int32
                | DType::Int64
                | DType::UInt8
                | DType::UInt16
                | DType::UInt32
                | DType::UInt64
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, DType::Float32 | DType::Float64)
    }

    /// 32-bit numeric types that an incoming 64-bit Arrow column may widen
    pub fn is_32_bit(&self) -> bool {
        matches!(self, DType::Int32 | DType::Float32)
    }

    pub fn is_64_bit_numeric(&self) -> bool {
        matches!(self, DType::Int64 | DType::Float64)
    }

    fn integer_width(&self) -> Option<(bool, u8)> {
        match self {
            DType::Int8 => Some((true, 8)),
            DType::Int16 => Some((true, 16)),
            DType::Int32 => Some((true, 32)),
            DType::Int64 => Some((true, 64)),
            DType::UInt8 => Some((false, 8)),
            DType::UInt16 => Some((false, 16)),
            DType::UInt32 => Some((false, 32)),
            DType::UInt64 => Some((false, 64)),
            _ => None,
        }
    }

    /// Whether values of `self` can be re-encoded as `target` without
    /// narrowing. Every type widens to string.
    pub fn widens_to(&self, target: DType) -> bool {
        if *self == target || target == DType::Str {
            return true;
        }
        if *self == DType::None {
            return true;
        }

        match (self.integer_width(), target.integer_width()) {
            (Some((src_signed, src_bits)), Some((dst_signed, dst_bits))) => {
                if src_signed == dst_signed {
                    dst_bits >= src_bits
                } else {
                    // unsigned fits a strictly wider signed type
                    !src_signed && dst_signed && dst_bits > src_bits
                }
            }
            (Some((_, bits)), None) => match target {
                DType::Float64 => bits <= 32 || *self == DType::Int64 || *self == DType::UInt64,
                DType::Float32 => bits <= 16,
                _ => false,
            },
            (None, None) => matches!((self, target), (DType::Float32, DType::Float64)),
            (None, Some(_)) => false,
        }
    }

    /// Arrow type used when a column of this type is serialized
    pub fn to_arrow(&self) -> DataType {
        match self {
            DType::None => DataType::Null,
            DType::Bool => DataType::Boolean,
            DType::Int8 => DataType::Int8,
            DType::Int16 => DataType::Int16,
            DType::Int32 => DataType::Int32,
            DType::Int64 => DataType::Int64,
            DType::UInt8 => DataType::UInt8,
            DType::UInt16 => DataType::UInt16,
            DType::UInt32 => DataType::UInt32,
            DType::UInt64 => DataType::UInt64,
            DType::Float32 => DataType::Float32,
            DType::Float64 => DataType::Float64,
            DType::Str => {
                DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8))
            }
            DType::Date => DataType::Date32,
            DType::Time => DataType::Timestamp(TimeUnit::Millisecond, None),
        }
    }

    /// Map a decoded Arrow type onto the closed type set
    pub fn from_arrow(data_type: &DataType) -> Option<DType> {
        match data_type {
            DataType::Null => Some(DType::None),
            DataType::Boolean => Some(DType::Bool),
            DataType::Int8 => Some(DType::Int8),
            DataType::Int16 => Some(DType::Int16),
            DataType::Int32 => Some(DType::Int32),
            DataType::Int64 => Some(DType::Int64),
            DataType::UInt8 => Some(DType::UInt8),
            DataType::UInt16 => Some(DType::UInt16),
            DataType::UInt32 => Some(DType::UInt32),
            DataType::UInt64 => Some(DType::UInt64),
            DataType::Float32 => Some(DType::Float32),
            DataType::Float64 => Some(DType::Float64),
            DataType::Utf8 | DataType::LargeUtf8 => Some(DType::Str),
            DataType::Dictionary(_, values) => match values.as_ref() {
                DataType::Utf8 | DataType::LargeUtf8 => Some(DType::Str),
                _ => None,
            },
            DataType::Date32 | DataType::Date64 => Some(DType::Date),
            DataType::Timestamp(_, _) => Some(DType::Time),
            _ => None,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Ordered (column name, type) pairs with unique names
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    columns: Vec<String>,
    types: Vec<DType>,
}

impl Schema {
    pub fn new(columns: Vec<String>, types: Vec<DType>) -> Result<Self> {
        if columns.len() != types.len() {
            return Err(TableError::schema(format!(
                "Schema has {} column names but {} types",
                columns.len(),
                types.len()
            )));
        }

        let mut schema = Schema {
            columns: Vec::with_capacity(columns.len()),
            types: Vec::with_capacity(types.len()),
        };
        for (name, dtype) in columns.into_iter().zip(types) {
            schema.push(name, dtype)?;
        }
        Ok(schema)
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn types(&self) -> &[DType] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn dtype(&self, name: &str) -> Option<DType> {
        self.position(name).map(|idx| self.types[idx])
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Append a column, rejecting duplicate names
    pub fn push(&mut self, name: impl Into<String>, dtype: DType) -> Result<()> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(TableError::schema(format!(
                "Duplicate column name `{}`",
                name
            )));
        }
        self.columns.push(name);
        self.types.push(dtype);
        Ok(())
    }

    /// Change the declared type of an existing column
    pub fn retype(&mut self, name: &str, dtype: DType) -> Result<()> {
        let idx = self
            .position(name)
            .ok_or_else(|| TableError::schema(format!("No column named `{}`", name)))?;
        self.types[idx] = dtype;
        Ok(())
    }

    /// Copy of this schema without the named columns
    pub fn drop(&self, names: &[&str]) -> Schema {
        let (columns, types) = self
            .iter()
            .filter(|(name, _)| !names.contains(name))
            .map(|(name, dtype)| (name.to_string(), dtype))
            .unzip();
        Schema { columns, types }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, DType)> + '_ {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.types.iter().copied())
    }

    pub fn to_arrow(&self) -> arrow_schema::Schema {
        let fields: Vec<Field> = self
            .iter()
            .map(|(name, dtype)| Field::new(name, dtype.to_arrow(), true))
            .collect();
        arrow_schema::Schema::new(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_tokens() {
        assert_eq!(DType::from_declared("integer"), Some(DType::Int32));
        assert_eq!(DType::from_declared("float"), Some(DType::Float64));
        assert_eq!(DType::from_declared("string"), Some(DType::Str));
        assert_eq!(DType::from_declared("boolean"), Some(DType::Bool));
        assert_eq!(DType::from_declared("datetime"), Some(DType::Time));
        assert_eq!(DType::from_declared("date"), Some(DType::Date));
        assert_eq!(DType::from_declared("Integer"), None);
        assert_eq!(DType::from_declared("decimal"), None);
    }

    #[test]
    fn test_widening_order() {
        assert!(DType::Int32.widens_to(DType::Float64));
        assert!(DType::Float64.widens_to(DType::Str));
        assert!(DType::Int32.widens_to(DType::Int64));
        assert!(DType::UInt16.widens_to(DType::Int32));
        assert!(!DType::Float64.widens_to(DType::Int32));
        assert!(!DType::Str.widens_to(DType::Float64));
        assert!(!DType::Int64.widens_to(DType::Int32));
        assert!(!DType::Int32.widens_to(DType::Float32));
    }

    #[test]
    fn test_schema_rejects_duplicates() {
        let err = Schema::new(
            vec!["a".to_string(), "a".to_string()],
            vec![DType::Int32, DType::Str],
        )
        .unwrap_err();
        assert!(err.to_string().contains("Duplicate column name `a`"));
    }

    #[test]
    fn test_schema_drop_preserves_order() {
        let schema = Schema::new(
            vec!["x".to_string(), PKEY_COLUMN.to_string(), "y".to_string()],
            vec![DType::Int32, DType::Int32, DType::Time],
        )
        .unwrap();

        let dropped = schema.drop(&[PKEY_COLUMN]);
        assert_eq!(dropped.columns(), &["x".to_string(), "y".to_string()]);
        assert_eq!(dropped.types(), &[DType::Int32, DType::Time]);
    }

    #[test]
    fn test_arrow_mapping() {
        assert_eq!(
            DType::from_arrow(&DataType::Timestamp(TimeUnit::Microsecond, None)),
            Some(DType::Time)
        );
        assert_eq!(DType::from_arrow(&DataType::LargeUtf8), Some(DType::Str));
        assert_eq!(DType::from_arrow(&DType::Str.to_arrow()), Some(DType::Str));
        assert_eq!(DType::from_arrow(&DataType::Binary), None);
    }
}
