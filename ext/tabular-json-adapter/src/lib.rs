//! JSON adapter for tabular-core
//!
//! Hosts that speak JSON hand their data over as a document; this crate
//! turns it into a [`tabular_core::TableInput`], runs the materializer, and
//! renders committed tables back as JSON.
//!
//! # Overview
//!
//! ## Value Conversion
//!
//! - JSON null, booleans, numbers and strings map onto [`tabular_core::Value`]
//! - `{"$date": ...}` objects carry date-like values, as epoch
//!   milliseconds or a parseable timestamp string
//!
//! ## Input Shapes
//!
//! - Arrays of objects are row-major records
//! - Objects of arrays are column-major data
//! - Objects of type names declare a schema
//!
//! ## Output
//!
//! Windows of a table serialize as records or as column arrays, with the
//! same cell casts the columnar export offers.

pub mod error;
pub use error::{AdapterError, ErrorContext, Result};

pub mod convert;
pub use convert::{json_to_value, scalar_to_json, TryIntoJson};

pub mod input;
pub use input::{json_to_input, parse_input};

pub mod output;
pub use output::{to_json, to_json_string};

pub mod types;
pub use types::{LoadOptions, Orientation, OutputOptions};

use tabular_core::traits::GraphNode;
use tabular_core::{materialize, Materialized, TableInput};

/// Materialize JSON text as a delta against `existing`.
///
/// Returns `Ok(None)` when the core decides there is nothing to ingest.
pub fn load_json<G: GraphNode + ?Sized>(
    existing: Option<&mut G>,
    text: &str,
    options: &LoadOptions,
) -> Result<Option<Materialized>> {
    let materialize_options = options.to_materialize_options()?;
    let input = parse_input(text, &materialize_options.inference.time_zone)?;
    log::debug!(
        "Loading {} JSON rows as {:?}",
        input.row_count(),
        input.data.format()
    );
    Ok(materialize(
        existing,
        TableInput::Values(input),
        &materialize_options,
    )?)
}
