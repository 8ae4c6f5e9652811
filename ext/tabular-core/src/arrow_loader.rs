//! Decoding of Arrow IPC buffers into an accessor the fill engine reads.

use crate::arrow_conversion::arrow_to_value;
use crate::traits::DataAccessor;
use crate::{DType, Result, TableError, Value};
use arrow_array::RecordBatch;
use arrow_ipc::reader::{FileReader, StreamReader};
use std::io::Cursor;

/// Magic bytes that open an Arrow IPC file
const ARROW_FILE_MAGIC: &[u8; 6] = b"ARROW1";

/// Framing of an Arrow IPC buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpcFormat {
    File,
    Stream,
}

/// Detect the framing by examining magic bytes
pub fn detect_ipc_format(bytes: &[u8]) -> IpcFormat {
    if bytes.len() >= ARROW_FILE_MAGIC.len() && bytes.starts_with(ARROW_FILE_MAGIC) {
        IpcFormat::File
    } else {
        IpcFormat::Stream
    }
}

/// Every record batch of a decoded Arrow buffer, with its column metadata
#[derive(Debug, Clone)]
pub struct ArrowLoader {
    names: Vec<String>,
    types: Vec<DType>,
    batches: Vec<RecordBatch>,
    // first row of each batch
    starts: Vec<usize>,
    row_count: usize,
}

impl ArrowLoader {
    /// Decode an IPC file or stream.
    ///
    /// The caller's bytes are first copied into a scratch buffer that lives
    /// only for the duration of the decode. Failure to acquire it (or an
    /// empty buffer) is reported as [`TableError::Allocation`].
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(TableError::allocation("Unable to load arrow of size 0"));
        }

        let mut scratch: Vec<u8> = Vec::new();
        scratch.try_reserve_exact(bytes.len()).map_err(|e| {
            TableError::allocation(format!(
                "Unable to allocate {} bytes for arrow buffer: {}",
                bytes.len(),
                e
            ))
        })?;
        scratch.extend_from_slice(bytes);

        let format = detect_ipc_format(&scratch);
        log::debug!("Decoding {} byte arrow buffer as {:?}", scratch.len(), format);

        let (schema, batches) = match format {
            IpcFormat::File => {
                let reader = FileReader::try_new(Cursor::new(scratch.as_slice()), None)?;
                let schema = reader.schema();
                let batches = reader
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                (schema, batches)
            }
            IpcFormat::Stream => {
                let reader = StreamReader::try_new(Cursor::new(scratch.as_slice()), None)?;
                let schema = reader.schema();
                let batches = reader
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                (schema, batches)
            }
        };

        let mut names = Vec::with_capacity(schema.fields().len());
        let mut types = Vec::with_capacity(schema.fields().len());
        for field in schema.fields() {
            let dtype = DType::from_arrow(field.data_type()).ok_or_else(|| {
                TableError::conversion(format!(
                    "Unsupported Arrow type {:?} for column `{}`",
                    field.data_type(),
                    field.name()
                ))
            })?;
            names.push(field.name().clone());
            types.push(dtype);
        }

        let mut starts = Vec::with_capacity(batches.len());
        let mut row_count = 0;
        for batch in &batches {
            starts.push(row_count);
            row_count += batch.num_rows();
        }

        Ok(Self {
            names,
            types,
            batches,
            starts,
            row_count,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn types(&self) -> &[DType] {
        &self.types
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Decoded type of a named column
    pub fn dtype(&self, name: &str) -> Option<DType> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|idx| self.types[idx])
    }
}

impl DataAccessor for ArrowLoader {
    fn row_count(&self) -> usize {
        self.row_count
    }

    fn names(&self) -> &[String] {
        &self.names
    }

    fn value(&self, column: usize, row: usize) -> Option<Value> {
        if row >= self.row_count {
            return None;
        }
        let batch_idx = self.starts.partition_point(|&start| start <= row).checked_sub(1)?;
        let batch = &self.batches[batch_idx];
        let array = batch.columns().get(column)?;
        // column types were validated in `decode`
        match arrow_to_value(array.as_ref(), row - self.starts[batch_idx]) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!(
                    "Reading row {} of column `{}` as missing: {}",
                    row,
                    self.names[column],
                    e
                );
                None
            }
        }
    }
}
