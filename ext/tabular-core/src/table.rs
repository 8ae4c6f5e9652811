use crate::column::Column;
use crate::{DType, Result, Schema, TableError};

/// A schema plus one [`Column`] per schema entry, all of equal length
#[derive(Debug, Clone)]
pub struct DataTable {
    schema: Schema,
    columns: Vec<Column>,
    size: usize,
}

impl DataTable {
    /// An empty table with the given schema
    pub fn new(schema: Schema) -> Self {
        Self::with_rows(schema, 0)
    }

    /// A table of `rows` cleared cells per column
    pub fn with_rows(schema: Schema, rows: usize) -> Self {
        let columns = schema
            .types()
            .iter()
            .map(|dtype| Column::new(*dtype, rows))
            .collect();
        Self {
            schema,
            columns,
            size: rows,
        }
    }

    /// Append `rows` cleared rows
    pub fn extend(&mut self, rows: usize) {
        for column in &mut self.columns {
            column.extend(rows);
        }
        self.size += rows;
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.schema.position(name).map(|idx| &self.columns[idx])
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.schema.position(name).map(|idx| &mut self.columns[idx])
    }

    /// Add a cleared column of the table's current length
    pub fn add_column(&mut self, name: &str, dtype: DType) -> Result<&mut Column> {
        self.schema.push(name, dtype)?;
        self.columns.push(Column::new(dtype, self.size));
        let last = self.columns.len() - 1;
        Ok(&mut self.columns[last])
    }

    /// Copy the column `from` into a new column `to`
    pub fn clone_column(&mut self, from: &str, to: &str) -> Result<()> {
        let source = self
            .column(from)
            .cloned()
            .ok_or_else(|| TableError::schema(format!("No column named `{}`", from)))?;
        self.schema.push(to, source.dtype())?;
        self.columns.push(source);
        Ok(())
    }

    /// Promote a column in place and record the new type in the schema
    pub fn promote_column(&mut self, name: &str, dtype: DType) -> Result<()> {
        let column = self
            .column_mut(name)
            .ok_or_else(|| TableError::schema(format!("No column named `{}`", name)))?;
        column.promote(dtype)?;
        self.schema.retype(name, dtype)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Column)> + '_ {
        self.schema
            .columns()
            .iter()
            .map(String::as_str)
            .zip(self.columns.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Scalar;

    fn sample_table() -> DataTable {
        let schema = Schema::new(
            vec!["x".to_string(), "y".to_string()],
            vec![DType::Int32, DType::Str],
        )
        .unwrap();
        DataTable::with_rows(schema, 2)
    }

    #[test]
    fn test_with_rows_and_extend() {
        let mut table = sample_table();
        assert_eq!(table.size(), 2);
        table.extend(3);
        assert_eq!(table.size(), 5);
        assert!(table.iter().all(|(_, col)| col.len() == 5));
    }

    #[test]
    fn test_clone_and_promote() {
        let mut table = sample_table();
        table
            .column_mut("x")
            .unwrap()
            .set(1, Scalar::Int32(9))
            .unwrap();

        table.clone_column("x", "x2").unwrap();
        table.promote_column("x", DType::Float64).unwrap();

        assert_eq!(table.schema().dtype("x"), Some(DType::Float64));
        assert_eq!(table.schema().dtype("x2"), Some(DType::Int32));
        assert_eq!(table.column("x").unwrap().get(1), Scalar::Float64(9.0));
        assert!(table.clone_column("missing", "z").is_err());
    }

    #[test]
    fn test_add_column_rejects_duplicates() {
        let mut table = sample_table();
        assert!(table.add_column("x", DType::Bool).is_err());
        let col = table.add_column("z", DType::Bool).unwrap();
        assert_eq!(col.len(), 2);
    }
}
