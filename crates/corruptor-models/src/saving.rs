//! Snapshot serialization
//!
//! Writes a model back into the safetensors container read by
//! [`Model::from_bytes`], with tensors laid out contiguously in model order.

use crate::error::Result;
use crate::parser::METADATA_KEY;
use crate::Model;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;

impl Model {
    /// Encode the full model state plus metadata
    ///
    /// # Errors
    ///
    /// Returns error if the header cannot be serialized.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut header = Map::new();
        let mut payload = Vec::new();

        if !self.metadata().is_empty() {
            header.insert(METADATA_KEY.to_string(), json!(self.metadata()));
        }

        for tensor in self.tensors() {
            let start = payload.len();
            payload.extend_from_slice(&tensor.to_bytes());
            let end = payload.len();

            header.insert(
                tensor.name().to_string(),
                json!({
                    "dtype": tensor.dtype().tag(),
                    "shape": tensor.shape(),
                    "data_offsets": [start, end],
                }),
            );
        }

        let mut header_bytes = serde_json::to_vec(&Value::Object(header))?;
        // Keep the data section 8-byte aligned
        while header_bytes.len() % 8 != 0 {
            header_bytes.push(b' ');
        }

        let mut out = Vec::with_capacity(8 + header_bytes.len() + payload.len());
        out.extend_from_slice(&(header_bytes.len() as u64).to_le_bytes());
        out.extend_from_slice(&header_bytes);
        out.extend_from_slice(&payload);

        Ok(out)
    }

    /// Write the model to `path`, replacing any existing file of that name
    ///
    /// # Errors
    ///
    /// Returns error if the old file cannot be removed or the write fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if path.exists() {
            tracing::debug!("Removing stale snapshot {}", path.display());
            fs::remove_file(path)?;
        }

        let bytes = self.to_bytes()?;
        fs::write(path, &bytes)?;

        tracing::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::weights::{Dtype, Parameter, Tensor};
    use crate::Model;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn tiny_model(metadata: BTreeMap<String, String>) -> Model {
        let w = Parameter::new("w", Dtype::F32, vec![2, 2], vec![1.0, -1.0, 0.5, 0.25]).unwrap();
        Model::new(vec![Tensor::Parameter(w)], metadata).unwrap()
    }

    #[test]
    fn test_header_is_aligned() {
        let bytes = tiny_model(BTreeMap::new()).to_bytes().unwrap();
        let mut len = [0u8; 8];
        len.copy_from_slice(&bytes[..8]);
        assert_eq!(u64::from_le_bytes(len) % 8, 0);
    }

    #[test]
    fn test_empty_metadata_omitted() {
        let bytes = tiny_model(BTreeMap::new()).to_bytes().unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(!text.contains("__metadata__"));
    }

    #[test]
    fn test_save_overwrites_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("snapshot.pth");
        std::fs::write(&path, b"stale").unwrap();

        let metadata = BTreeMap::from([("n_species".to_string(), "2".to_string())]);
        let model = tiny_model(metadata);
        model.save(&path).unwrap();

        let reloaded = Model::from_file(&path).unwrap();
        assert_eq!(reloaded, model);
    }
}
