//! Test utilities for tabular-core

#[cfg(test)]
pub mod test {
    use crate::traits::GraphNode;
    use crate::{DType, Result, Schema, TableError};

    /// A graph node that never exists; names the type parameter of
    /// `materialize(None, ..)`
    pub enum NullNode {}

    impl GraphNode for NullNode {
        fn output_schema(&self) -> Schema {
            match *self {}
        }

        fn promote_column(&mut self, _name: &str, _dtype: DType) -> Result<()> {
            match *self {}
        }

        fn current_row_count(&self) -> usize {
            match *self {}
        }

        fn write_offset(&self) -> u32 {
            match *self {}
        }
    }

    /// A committed schema with no rows, as left by a declared-schema table
    pub struct EmptyNode {
        pub schema: Schema,
    }

    impl GraphNode for EmptyNode {
        fn output_schema(&self) -> Schema {
            self.schema.clone()
        }

        fn promote_column(&mut self, name: &str, dtype: DType) -> Result<()> {
            let current = self
                .schema
                .dtype(name)
                .ok_or_else(|| TableError::schema(format!("No column named `{}`", name)))?;
            if !current.widens_to(dtype) {
                return Err(TableError::conversion(format!(
                    "Cannot promote {} to {}",
                    current, dtype
                )));
            }
            self.schema.retype(name, dtype)
        }

        fn current_row_count(&self) -> usize {
            0
        }

        fn write_offset(&self) -> u32 {
            0
        }
    }

    /// Build a schema from `(name, type)` pairs
    pub fn schema_of(pairs: &[(&str, DType)]) -> Schema {
        Schema::new(
            pairs.iter().map(|(name, _)| name.to_string()).collect(),
            pairs.iter().map(|(_, dtype)| *dtype).collect(),
        )
        .unwrap()
    }
}
