use crate::Value;

/// Random access to an inbound dataset, by column position and row.
///
/// `value` returns `None` for a missing ("undefined") cell, which is
/// distinct from a present `Value::Null`.
pub trait DataAccessor {
    /// Number of rows the accessor can produce
    fn row_count(&self) -> usize;

    /// Column names in fill order
    fn names(&self) -> &[String];

    fn value(&self, column: usize, row: usize) -> Option<Value>;

    /// Position of a named column
    fn position(&self, name: &str) -> Option<usize> {
        self.names().iter().position(|n| n == name)
    }
}
