use crate::{AdapterError, Result};
use jiff::tz::TimeZone;
use serde::Deserialize;
use std::str::FromStr;
use tabular_core::{InferenceOptions, MaterializeOptions, Op, OutputCast, Window};

/// Options a host sends alongside its data
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadOptions {
    pub index: Option<String>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    #[serde(rename = "update")]
    pub is_update: bool,
    pub op: Option<String>,
    pub port_id: u32,
    /// IANA zone for local calendar fields; the system zone when absent
    pub time_zone: Option<String>,
}

impl LoadOptions {
    /// Parse options from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_materialize_options(&self) -> Result<MaterializeOptions> {
        let mut options = MaterializeOptions::new()
            .with_update(self.is_update)
            .with_port_id(self.port_id);
        if let Some(index) = &self.index {
            options = options.with_index(index.clone());
        }
        if let Some(limit) = self.limit {
            options = options.with_limit(limit);
        }
        if let Some(offset) = self.offset {
            options = options.with_offset(offset);
        }
        if let Some(op) = &self.op {
            options = options.with_op(parse_op(op)?);
        }
        if let Some(name) = &self.time_zone {
            let inference = InferenceOptions::new().with_time_zone(parse_time_zone(name)?);
            options = options.with_inference(inference);
        }
        Ok(options)
    }
}

fn parse_time_zone(name: &str) -> Result<TimeZone> {
    if name.eq_ignore_ascii_case("UTC") {
        return Ok(TimeZone::UTC);
    }
    TimeZone::get(name)
        .map_err(|e| AdapterError::invalid_option(format!("Invalid time zone {}: {}", name, e)))
}

fn parse_op(op: &str) -> Result<Op> {
    match op {
        "insert" => Ok(Op::Insert),
        "delete" => Ok(Op::Delete),
        _ => Err(AdapterError::invalid_option(format!(
            "Invalid operation: {}",
            op
        ))),
    }
}

/// Shape of serialized output rows
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Orientation {
    /// An array of `{column: value}` objects
    #[default]
    Records,
    /// An object of column arrays
    Columns,
}

impl TryFrom<&str> for Orientation {
    type Error = AdapterError;

    fn try_from(value: &str) -> Result<Self> {
        match value {
            "records" => Ok(Orientation::Records),
            "columns" => Ok(Orientation::Columns),
            _ => Err(AdapterError::invalid_option(format!(
                "Invalid orientation: {}",
                value
            ))),
        }
    }
}

impl FromStr for Orientation {
    type Err = AdapterError;

    fn from_str(s: &str) -> Result<Self> {
        Self::try_from(s)
    }
}

impl std::fmt::Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Orientation::Records => write!(f, "records"),
            Orientation::Columns => write!(f, "columns"),
        }
    }
}

/// Options for serializing a window as JSON
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub window: Window,
    pub orientation: Orientation,
    pub cast: OutputCast,
}

impl OutputOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_window(mut self, window: Window) -> Self {
        self.window = window;
        self
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_cast(mut self, cast: OutputCast) -> Self {
        self.cast = cast;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_options() {
        let options =
            LoadOptions::from_json(r#"{"index": "id", "limit": 10, "op": "delete"}"#).unwrap();
        let materialize = options.to_materialize_options().unwrap();
        assert_eq!(materialize.index.as_deref(), Some("id"));
        assert_eq!(materialize.limit, Some(10));
        assert_eq!(materialize.op, Op::Delete);
        assert!(!materialize.is_update);

        let options = LoadOptions::from_json(r#"{"time_zone": "utc"}"#).unwrap();
        let materialize = options.to_materialize_options().unwrap();
        assert_eq!(materialize.inference.time_zone.iana_name(), Some("UTC"));
    }

    #[test]
    fn test_bad_options() {
        assert!(LoadOptions::from_json(r#"{"colour": 1}"#).is_err());
        let options = LoadOptions::from_json(r#"{"op": "upsert"}"#).unwrap();
        assert!(matches!(
            options.to_materialize_options(),
            Err(AdapterError::InvalidOption(_))
        ));
    }

    #[test]
    fn test_orientation() {
        assert_eq!("columns".parse::<Orientation>().unwrap(), Orientation::Columns);
        assert_eq!(Orientation::Records.to_string(), "records");
        assert!("rows".parse::<Orientation>().is_err());
    }
}
