//! Binary parser for safetensors model containers
//!
//! ```text
//! FILE   := HEADER_LEN  HEADER  DATA
//! HEADER_LEN := u64 little-endian
//! HEADER := JSON {
//!   "__metadata__": { "key": "value", ... },          (optional)
//!   "tensor_name": { "dtype": "F32", "shape": [..], "data_offsets": [start, end] },
//!   ...
//! }
//! ```
//!
//! Offsets are relative to the start of `DATA`.

use crate::error::{CorruptorError, Result};
use crate::weights::{byte_len, Dtype};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Header key holding the string metadata dictionary
pub const METADATA_KEY: &str = "__metadata__";

/// Upper bound on header size, guards against garbage length prefixes
pub const MAX_HEADER_LEN: u64 = 100 * 1024 * 1024;

/// Raw per-tensor header entry
#[derive(Debug, Deserialize)]
struct RawTensorEntry {
    dtype: String,
    shape: Vec<usize>,
    data_offsets: [usize; 2],
}

/// Validated tensor header entry
#[derive(Debug, Clone, PartialEq)]
pub struct TensorEntry {
    /// Tensor name
    pub name: String,

    /// Element type
    pub dtype: Dtype,

    /// Shape
    pub shape: Vec<usize>,

    /// Byte range within the data section
    pub data_offsets: [usize; 2],
}

/// Parsed container header
#[derive(Debug, Clone)]
pub struct ContainerHeader {
    /// Tensor entries sorted by data offset (on-disk order)
    pub tensors: Vec<TensorEntry>,

    /// String metadata dictionary
    pub metadata: BTreeMap<String, String>,

    /// Absolute offset of the data section
    pub data_start: usize,
}

/// Parse and validate the container header
///
/// # Errors
///
/// Returns error if the length prefix, JSON, dtypes or offsets are invalid.
pub fn parse_header(data: &[u8]) -> Result<ContainerHeader> {
    tracing::debug!("Parsing container header ({} bytes)", data.len());

    if data.len() < 8 {
        return Err(CorruptorError::parse_error("File too small"));
    }

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&data[..8]);
    let header_len = u64::from_le_bytes(len_bytes);

    if header_len > MAX_HEADER_LEN {
        return Err(CorruptorError::parse_error(format!(
            "Header length {header_len} exceeds limit"
        )));
    }

    let header_len = usize::try_from(header_len)
        .map_err(|_| CorruptorError::parse_error("Header length exceeds platform usize"))?;
    let data_start = 8 + header_len;

    if data_start > data.len() {
        return Err(CorruptorError::parse_error(format!(
            "Header length {header_len} exceeds file size {}",
            data.len()
        )));
    }

    let raw: BTreeMap<String, serde_json::Value> = serde_json::from_slice(&data[8..data_start])?;
    let data_len = data.len() - data_start;

    let mut metadata: BTreeMap<String, String> = BTreeMap::new();
    let mut tensors = Vec::with_capacity(raw.len());

    for (name, value) in raw {
        if name == METADATA_KEY {
            metadata = serde_json::from_value(value)?;
            continue;
        }

        let entry: RawTensorEntry = serde_json::from_value(value)?;
        let dtype = Dtype::from_tag(&entry.dtype)?;
        let [start, end] = entry.data_offsets;

        if end < start {
            return Err(CorruptorError::invalid_tensor(
                name,
                format!("data offsets [{start}, {end}] are reversed"),
            ));
        }
        if end > data_len {
            return Err(CorruptorError::invalid_tensor(
                name,
                format!("data offset {end} exceeds data size {data_len}"),
            ));
        }

        let expected = byte_len(&name, &entry.shape, dtype)?;
        if end - start != expected {
            return Err(CorruptorError::invalid_tensor(
                name,
                format!(
                    "shape {:?} of {dtype} needs {expected} bytes, offsets span {}",
                    entry.shape,
                    end - start
                ),
            ));
        }

        tracing::debug!("Found tensor {name}: {dtype} {:?}", entry.shape);

        tensors.push(TensorEntry {
            name,
            dtype,
            shape: entry.shape,
            data_offsets: entry.data_offsets,
        });
    }

    // File order defines parameter order; names break ties between empty tensors
    tensors.sort_by(|a, b| {
        a.data_offsets
            .cmp(&b.data_offsets)
            .then_with(|| a.name.cmp(&b.name))
    });

    for pair in tensors.windows(2) {
        if pair[1].data_offsets[0] < pair[0].data_offsets[1] {
            return Err(CorruptorError::invalid_tensor(
                pair[1].name.clone(),
                format!("overlaps tensor '{}'", pair[0].name),
            ));
        }
    }

    Ok(ContainerHeader {
        tensors,
        metadata,
        data_start,
    })
}
