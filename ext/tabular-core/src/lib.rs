//! Host-independent ingestion and export core for dynamically typed tables
//!
//! `tabular-core` turns loosely typed tabular input into strongly typed
//! columnar tables, and turns those tables back into Arrow-compatible
//! transfer buffers. Host runtimes talk to it through adapters (see
//! `tabular-json-adapter`) that translate their own values into [`Value`].
//!
//! # Key Components
//!
//! - **Vocabulary**: deduplicating string interner backed by one byte arena
//!
//! - **Type Inference**: samples rows to pick a [`DType`] per column
//!   - Tolerates ragged row-major records
//!   - Maps declared type names exactly
//!
//! - **Column Store**: typed, nullable, growable [`Column`]s
//!   - In-place widening that preserves stored values
//!
//! - **Fill Engine**: writes accessor cells into columns, promoting a column
//!   when an insert outgrows its type
//!
//! - **Table Materializer**: resolves the schema for an insert, update or
//!   delete, synthesizes primary keys and produces a [`DataTable`] delta
//!   - Freeform values, declared schemas, Arrow IPC buffers and CSV text
//!
//! - **Export**: flat typed buffers with validity bitmaps, string
//!   dictionaries, and whole-window Arrow IPC or CSV serialization
//!
//! # Design Philosophy
//!
//! Collaborators that merge deltas into a live table, or that decode host
//! values, sit behind the narrow traits in [`traits`]. Everything here is
//! synchronous and single-threaded per call.

pub mod arrow_conversion;
pub mod arrow_loader;
pub mod bitmap;
pub mod column;
pub mod error;
pub mod export;
pub mod fill;
pub mod infer;
pub mod input;
pub mod materialize;
pub mod schema;
pub mod serialize;
pub mod table;
pub mod temporal;
pub mod traits;
pub mod value;
pub mod vocab;

#[cfg(test)]
pub mod test_utils;

pub use column::{CellStatus, Column, Scalar};
pub use error::{ErrorContext, Result, TableError};
pub use export::{encode_column, encode_table_column, EncodedColumn, OutputCast};
pub use infer::InferenceOptions;
pub use input::{InputData, InputFormat, TableInput, ValueInput};
pub use materialize::{materialize, MaterializeOptions, Materialized, Op};
pub use schema::{
    DType, Schema, INDEX_COLUMN, INTERNAL_COLUMNS, OKEY_COLUMN, OP_COLUMN, PKEY_COLUMN,
};
pub use serialize::{to_arrow, to_csv, visible_columns, Window};
pub use table::DataTable;
pub use value::Value;
pub use vocab::Vocabulary;
