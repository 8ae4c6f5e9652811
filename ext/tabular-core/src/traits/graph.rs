use crate::{DType, Result, Schema};

/// The update-propagation node a materialized table is handed to.
///
/// The core only reads its committed shape and asks it to widen columns;
/// merging deltas is the node's business.
pub trait GraphNode {
    /// Committed schema, internal columns included
    fn output_schema(&self) -> Schema;

    /// Widen a committed column in place
    fn promote_column(&mut self, name: &str, dtype: DType) -> Result<()>;

    /// Rows committed so far
    fn current_row_count(&self) -> usize;

    /// Rows written so far, used to continue implicit keys
    fn write_offset(&self) -> u32;
}
