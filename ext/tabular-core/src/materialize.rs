//! Builds a typed delta table from an inbound dataset.
//!
//! Schema resolution follows the input: Arrow buffers carry their own
//! schema, updates reuse the committed one, explicit names and types are
//! taken as given, and everything else is inferred. The resulting table is
//! freshly allocated on every call and always carries `psp_pkey` and
//! `psp_okey`.

use crate::arrow_loader::ArrowLoader;
use crate::column::Scalar;
use crate::fill::{fill_column, FillContext};
use crate::infer::{infer_column_type, resolve_schema, InferenceOptions};
use crate::input::{parse_csv, InputData, TableInput, ValueAccessor};
use crate::schema::{INDEX_COLUMN, INTERNAL_COLUMNS, OKEY_COLUMN, PKEY_COLUMN};
use crate::table::DataTable;
use crate::traits::{DataAccessor, GraphNode};
use crate::{DType, Result, Schema, TableError};

/// Row limit of a table that is not bounded
pub const UNBOUNDED_LIMIT: u32 = u32::MAX;

/// What the delta does to the committed table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Op {
    #[default]
    Insert,
    /// Remove the rows whose index values the input lists
    Delete,
}

/// Settings for a single [`materialize`] call
#[derive(Debug, Clone, Default)]
pub struct MaterializeOptions {
    /// Maximum table size; synthesized keys wrap around at this value
    pub limit: Option<u32>,
    /// Column whose values key the rows
    pub index: Option<String>,
    pub op: Op,
    pub is_update: bool,
    pub port_id: u32,
    /// Starting key for a table that has no graph node yet
    pub offset: Option<u32>,
    pub inference: InferenceOptions,
}

impl MaterializeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn with_op(mut self, op: Op) -> Self {
        self.op = op;
        self
    }

    pub fn with_update(mut self, is_update: bool) -> Self {
        self.is_update = is_update;
        self
    }

    pub fn with_port_id(mut self, port_id: u32) -> Self {
        self.port_id = port_id;
        self
    }

    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn with_inference(mut self, inference: InferenceOptions) -> Self {
        self.inference = inference;
        self
    }

    fn effective_limit(&self) -> u32 {
        self.limit.unwrap_or(UNBOUNDED_LIMIT)
    }
}

/// A delta table ready to hand to the graph node
#[derive(Debug, Clone)]
pub struct Materialized {
    pub table: DataTable,
    /// Resolved columns of the input, `__INDEX__` included
    pub input_schema: Schema,
    /// Stored user columns after any promotion, internal columns excluded
    pub output_schema: Schema,
    pub row_count: usize,
    /// Key offset the rows were numbered from
    pub offset: u32,
    pub limit: u32,
    pub op: Op,
    pub port_id: u32,
    pub is_update: bool,
}

impl Materialized {
    /// Offset the next delta should number its rows from
    pub fn next_offset(&self) -> u32 {
        ((u64::from(self.offset) + self.row_count as u64) % u64::from(self.limit)) as u32
    }
}

enum Source {
    Values(InputData),
    Arrow(ArrowLoader),
}

struct Resolved {
    source: Source,
    names: Vec<String>,
    types: Vec<DType>,
}

/// Materialize `input` as a delta against `existing`, or as a new table.
///
/// Returns `Ok(None)` when there is nothing to ingest: an update without
/// rows, or an Arrow buffer whose scratch copy could not be allocated.
pub fn materialize<G: GraphNode + ?Sized>(
    mut existing: Option<&mut G>,
    input: TableInput,
    options: &MaterializeOptions,
) -> Result<Option<Materialized>> {
    let limit = options.effective_limit();
    if limit == 0 {
        return Err(TableError::invalid_argument("limit must be positive"));
    }

    let (offset, is_update) = match existing.as_deref() {
        Some(node) => (
            node.write_offset(),
            options.is_update || node.current_row_count() > 0,
        ),
        None => (options.offset.unwrap_or(0) % limit, options.is_update),
    };
    let is_delete = options.op == Op::Delete;

    if is_delete && options.index.is_none() {
        return Err(TableError::configuration(
            "Cannot remove rows from a table without a user-specified index",
        ));
    }

    let resolved = match input {
        TableInput::Arrow(bytes) => {
            let loader = match ArrowLoader::decode(&bytes) {
                Ok(loader) => loader,
                Err(TableError::Allocation(msg)) => {
                    log::warn!("{}", msg);
                    return Ok(None);
                }
                Err(e) => return Err(e),
            };
            resolve_arrow(existing.as_deref_mut(), loader, is_update, options)?
        }
        TableInput::Csv(text) => {
            let data = parse_csv(&text)?;
            resolve_values(existing.as_deref(), data, None, None, is_update, options)?
        }
        TableInput::Values(input) => resolve_values(
            existing.as_deref(),
            input.data,
            input.names,
            input.types,
            is_update,
            options,
        )?,
    };

    let Resolved {
        source,
        names,
        types,
    } = resolved;

    let row_count = match &source {
        Source::Values(data) => data.row_count(),
        Source::Arrow(loader) => loader.row_count(),
    };
    if is_update && row_count == 0 && matches!(source, Source::Values(_)) {
        log::warn!("Update called with no data - ignoring");
        return Ok(None);
    }

    let input_schema = Schema::new(names, types)?;
    log::debug!(
        "Materializing {} rows into [{}]",
        row_count,
        input_schema
            .iter()
            .map(|(name, dtype)| format!("{}: {}", name, dtype))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let mut table = DataTable::with_rows(input_schema.drop(&[INDEX_COLUMN]), row_count);
    let ctx = FillContext {
        is_update,
        is_limited: limit != UNBOUNDED_LIMIT,
        time_zone: &options.inference.time_zone,
    };

    let implicit_index = match &source {
        Source::Values(data) => {
            let accessor = ValueAccessor::new(data, input_schema.columns().to_vec());
            fill_table(&accessor, &mut table, &input_schema, &ctx)?
        }
        Source::Arrow(loader) => fill_table(loader, &mut table, &input_schema, &ctx)?,
    };

    if !implicit_index {
        match options.index.as_deref() {
            Some(index) => {
                if table.column(index).is_none() {
                    return Err(TableError::configuration(format!(
                        "Index column `{}` is not in the input",
                        index
                    )));
                }
                table.clone_column(index, PKEY_COLUMN)?;
                table.clone_column(index, OKEY_COLUMN)?;
            }
            None => synthesize_keys(&mut table, offset, limit)?,
        }
    }

    let output_schema = table.schema().drop(&INTERNAL_COLUMNS);

    Ok(Some(Materialized {
        table,
        input_schema,
        output_schema,
        row_count,
        offset,
        limit,
        op: options.op,
        port_id: options.port_id,
        is_update,
    }))
}

/// Fill every input column; `__INDEX__` lands in the key columns.
/// Returns whether the input carried `__INDEX__`.
fn fill_table<A: DataAccessor + ?Sized>(
    accessor: &A,
    table: &mut DataTable,
    input_schema: &Schema,
    ctx: &FillContext<'_>,
) -> Result<bool> {
    let mut implicit_index = false;

    for (name, dtype) in input_schema.iter() {
        if name == INDEX_COLUMN {
            implicit_index = true;
            table.add_column(PKEY_COLUMN, dtype)?;
            fill_column(accessor, table, PKEY_COLUMN, INDEX_COLUMN, ctx)?;
            table.clone_column(PKEY_COLUMN, OKEY_COLUMN)?;
            continue;
        }
        fill_column(accessor, table, name, name, ctx)?;
    }

    Ok(implicit_index)
}

/// Row-number keys, `(row + offset) % limit`
fn synthesize_keys(table: &mut DataTable, offset: u32, limit: u32) -> Result<()> {
    let rows = table.size();
    for name in [PKEY_COLUMN, OKEY_COLUMN] {
        let column = table.add_column(name, DType::Int32)?;
        for row in 0..rows {
            let key = (row as u64 + u64::from(offset)) % u64::from(limit);
            column.set(row, Scalar::Int32(key as i32))?;
        }
    }
    Ok(())
}

fn resolve_arrow<G: GraphNode + ?Sized>(
    existing: Option<&mut G>,
    loader: ArrowLoader,
    is_update: bool,
    options: &MaterializeOptions,
) -> Result<Resolved> {
    let node = match existing {
        Some(node) if is_update => node,
        _ => {
            return Ok(Resolved {
                names: loader.names().to_vec(),
                types: loader.types().to_vec(),
                source: Source::Arrow(loader),
            })
        }
    };

    if node.current_row_count() == 0 {
        // a table created from a declared schema adopts 64-bit Arrow types
        let committed = node.output_schema();
        for (name, dtype) in committed.iter() {
            let can_retype =
                options.index.as_deref() != Some(name) && !INTERNAL_COLUMNS.contains(&name);
            if !can_retype || !dtype.is_32_bit() {
                continue;
            }
            if let Some(arrow_dtype) = loader.dtype(name).filter(DType::is_64_bit_numeric) {
                log::warn!(
                    "Promoting column `{}` to {} to maintain consistency with Arrow type",
                    name,
                    arrow_dtype
                );
                node.promote_column(name, arrow_dtype)?;
            }
        }
    }

    let has_index = loader.names().iter().any(|n| n == INDEX_COLUMN);
    let (names, types) = update_schema(&node.output_schema(), has_index, options)?;
    Ok(Resolved {
        source: Source::Arrow(loader),
        names,
        types,
    })
}

fn resolve_values<G: GraphNode + ?Sized>(
    existing: Option<&G>,
    data: InputData,
    names: Option<Vec<String>>,
    types: Option<Vec<DType>>,
    is_update: bool,
    options: &MaterializeOptions,
) -> Result<Resolved> {
    if let (Some(names), Some(types)) = (names, types) {
        if names.len() != types.len() {
            return Err(TableError::schema(format!(
                "{} column names but {} types",
                names.len(),
                types.len()
            )));
        }
        return Ok(Resolved {
            source: Source::Values(data),
            names,
            types,
        });
    }

    let committed = existing.map(|node| node.output_schema());

    if options.op == Op::Delete {
        let index = options.index.clone().unwrap_or_default();
        let dtype = committed
            .as_ref()
            .and_then(|schema| schema.dtype(&index))
            .unwrap_or_else(|| infer_column_type(&data, &index, &options.inference));
        return Ok(Resolved {
            source: Source::Values(data),
            names: vec![index],
            types: vec![dtype],
        });
    }

    if let (true, Some(committed)) = (is_update, committed.as_ref()) {
        let has_index = data.has_column(INDEX_COLUMN);
        let (names, types) = update_schema(committed, has_index, options)?;
        return Ok(Resolved {
            source: Source::Values(data),
            names,
            types,
        });
    }

    let schema = resolve_schema(&data, &options.inference)?;
    Ok(Resolved {
        source: Source::Values(data),
        names: schema.columns().to_vec(),
        types: schema.types().to_vec(),
    })
}

/// Committed user columns, plus `__INDEX__` typed as the index column
/// (or int32 when there is none)
fn update_schema(
    committed: &Schema,
    has_index: bool,
    options: &MaterializeOptions,
) -> Result<(Vec<String>, Vec<DType>)> {
    let user = committed.drop(&INTERNAL_COLUMNS);
    let mut names = user.columns().to_vec();
    let mut types = user.types().to_vec();

    if has_index {
        let index_type = options
            .index
            .as_deref()
            .and_then(|index| user.dtype(index))
            .unwrap_or(DType::Int32);
        names.push(INDEX_COLUMN.to_string());
        types.push(index_type);
    }

    if names.is_empty() {
        return Err(TableError::configuration(
            "Cannot update a table that has no columns",
        ));
    }
    Ok((names, types))
}
