//! Deployed model representation

use crate::error::{CorruptorError, Result};
use crate::parser;
use crate::weights::{Buffer, Parameter, Tensor};
use bytes::Bytes;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Deployed model: ordered tensors plus the metadata dictionary bundled with them
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    /// Tensors in file order
    tensors: Vec<Tensor>,

    /// String metadata, re-attached unchanged on save
    metadata: BTreeMap<String, String>,
}

impl Model {
    /// Assemble a model from tensors and metadata
    ///
    /// # Errors
    ///
    /// Returns error if two tensors share a name.
    pub fn new(tensors: Vec<Tensor>, metadata: BTreeMap<String, String>) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for tensor in &tensors {
            if !seen.insert(tensor.name()) {
                return Err(CorruptorError::invalid_tensor(
                    tensor.name(),
                    "duplicate tensor name",
                ));
            }
        }

        Ok(Self { tensors, metadata })
    }

    /// Load model from file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        tracing::info!("Loading model from: {}", path.display());

        if !path.exists() {
            return Err(CorruptorError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let data = fs::read(path)?;
        Self::from_bytes(&data)
    }

    /// Parse model from container bytes
    ///
    /// # Errors
    ///
    /// Returns error if parsing fails.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let header = parser::parse_header(data)?;
        let payload = &data[header.data_start..];

        let mut tensors = Vec::with_capacity(header.tensors.len());
        for entry in header.tensors {
            let [start, end] = entry.data_offsets;
            let raw = &payload[start..end];

            let tensor = if entry.dtype.is_float() {
                Tensor::Parameter(Parameter::decode(
                    &entry.name,
                    entry.dtype,
                    entry.shape,
                    raw,
                )?)
            } else {
                Tensor::Buffer(Buffer::new(
                    entry.name,
                    entry.dtype,
                    entry.shape,
                    Bytes::copy_from_slice(raw),
                )?)
            };
            tensors.push(tensor);
        }

        let model = Self::new(tensors, header.metadata)?;
        tracing::info!(
            "Model has {} parameter(s), {} buffer(s), {} metadata key(s)",
            model.parameter_count(),
            model.tensors.len() - model.parameter_count(),
            model.metadata.len()
        );

        Ok(model)
    }

    /// All tensors in file order
    pub fn tensors(&self) -> &[Tensor] {
        &self.tensors
    }

    /// Parameters in stable iteration order
    pub fn parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.tensors.iter().filter_map(|t| match t {
            Tensor::Parameter(p) => Some(p),
            Tensor::Buffer(_) => None,
        })
    }

    /// Mutable parameters, same order as [`Model::parameters`]
    pub fn parameters_mut(&mut self) -> impl Iterator<Item = &mut Parameter> {
        self.tensors.iter_mut().filter_map(|t| match t {
            Tensor::Parameter(p) => Some(p),
            Tensor::Buffer(_) => None,
        })
    }

    /// Number of parameter tensors
    pub fn parameter_count(&self) -> usize {
        self.parameters().count()
    }

    /// Total scalar count across parameters
    pub fn total_parameter_elements(&self) -> usize {
        self.parameters().map(Parameter::len).sum()
    }

    /// Look up a parameter by name
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters().find(|p| p.name() == name)
    }

    /// Metadata dictionary
    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weights::Dtype;

    fn sample_model() -> Model {
        let w = Parameter::new("w", Dtype::F32, vec![2], vec![1.0, 2.0]).unwrap();
        let idx = Buffer::new("idx", Dtype::I64, vec![1], vec![7u8, 0, 0, 0, 0, 0, 0, 0]).unwrap();
        let b = Parameter::new("b", Dtype::F64, vec![], vec![0.5]).unwrap();
        let metadata = BTreeMap::from([("r_max".to_string(), "4.0".to_string())]);

        Model::new(
            vec![
                Tensor::Parameter(w),
                Tensor::Buffer(idx),
                Tensor::Parameter(b),
            ],
            metadata,
        )
        .unwrap()
    }

    #[test]
    fn test_parameters_skip_buffers() {
        let model = sample_model();
        let names: Vec<_> = model.parameters().map(Parameter::name).collect();
        assert_eq!(names, ["w", "b"]);
        assert_eq!(model.parameter_count(), 2);
        assert_eq!(model.total_parameter_elements(), 3);

        assert_eq!(model.parameter("b").map(Parameter::shape), Some(&[][..]));
        assert!(model.parameter("idx").is_none());
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let a = Parameter::new("w", Dtype::F32, vec![1], vec![1.0]).unwrap();
        let b = a.clone();
        assert!(Model::new(
            vec![Tensor::Parameter(a), Tensor::Parameter(b)],
            BTreeMap::new()
        )
        .is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Model::from_file("/nonexistent/deployed.pth"),
            Err(CorruptorError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_byte_round_trip_preserves_order() {
        let model = sample_model();
        let reloaded = Model::from_bytes(&model.to_bytes().unwrap()).unwrap();
        assert_eq!(reloaded, model);
    }
}
