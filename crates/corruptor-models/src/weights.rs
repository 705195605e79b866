//! Tensor payloads: floating-point parameters and pass-through buffers
//!
//! Parameters are decoded into an `f64` working copy so that repeated noise
//! accumulation does not round at every step; they are rounded back to their
//! stored dtype only when encoded.

use crate::error::{CorruptorError, Result};
use bytes::Bytes;
use half::{bf16, f16};

/// Element type of a stored tensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dtype {
    /// 64-bit float
    F64,
    /// 32-bit float
    F32,
    /// IEEE half precision
    F16,
    /// Brain float 16
    BF16,
    /// 64-bit signed integer
    I64,
    /// 32-bit signed integer
    I32,
    /// 16-bit signed integer
    I16,
    /// 8-bit signed integer
    I8,
    /// 8-bit unsigned integer
    U8,
    /// Boolean (one byte)
    Bool,
}

impl Dtype {
    /// Parse a header dtype tag
    ///
    /// # Errors
    ///
    /// Returns [`CorruptorError::UnsupportedDtype`] for unknown tags.
    pub fn from_tag(tag: &str) -> Result<Self> {
        let dtype = match tag {
            "F64" => Self::F64,
            "F32" => Self::F32,
            "F16" => Self::F16,
            "BF16" => Self::BF16,
            "I64" => Self::I64,
            "I32" => Self::I32,
            "I16" => Self::I16,
            "I8" => Self::I8,
            "U8" => Self::U8,
            "BOOL" => Self::Bool,
            other => return Err(CorruptorError::unsupported_dtype(other)),
        };
        Ok(dtype)
    }

    /// Header dtype tag
    pub const fn tag(self) -> &'static str {
        match self {
            Self::F64 => "F64",
            Self::F32 => "F32",
            Self::F16 => "F16",
            Self::BF16 => "BF16",
            Self::I64 => "I64",
            Self::I32 => "I32",
            Self::I16 => "I16",
            Self::I8 => "I8",
            Self::U8 => "U8",
            Self::Bool => "BOOL",
        }
    }

    /// Bytes per element
    pub const fn size_bytes(self) -> usize {
        match self {
            Self::F64 | Self::I64 => 8,
            Self::F32 | Self::I32 => 4,
            Self::F16 | Self::BF16 | Self::I16 => 2,
            Self::I8 | Self::U8 | Self::Bool => 1,
        }
    }

    /// Whether tensors of this dtype are trainable parameters
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F64 | Self::F32 | Self::F16 | Self::BF16)
    }
}

impl std::fmt::Display for Dtype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

/// Number of elements for a shape (a scalar has one)
///
/// # Errors
///
/// Returns error if the product overflows `usize`.
pub fn element_count(name: &str, shape: &[usize]) -> Result<usize> {
    shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| CorruptorError::invalid_tensor(name, "shape element count overflows"))
}

/// Payload size in bytes for a shape and dtype
///
/// # Errors
///
/// Returns error if the size overflows `usize`.
pub fn byte_len(name: &str, shape: &[usize], dtype: Dtype) -> Result<usize> {
    element_count(name, shape)?
        .checked_mul(dtype.size_bytes())
        .ok_or_else(|| CorruptorError::invalid_tensor(name, "shape byte length overflows"))
}

/// Floating-point parameter tensor with a writable working buffer
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    dtype: Dtype,
    shape: Vec<usize>,
    values: Vec<f64>,
}

impl Parameter {
    /// Create a parameter from already-decoded values
    ///
    /// # Errors
    ///
    /// Returns error if the dtype is not floating point or the value count
    /// does not match the shape.
    pub fn new(
        name: impl Into<String>,
        dtype: Dtype,
        shape: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let name = name.into();

        if !dtype.is_float() {
            return Err(CorruptorError::invalid_tensor(
                name,
                format!("dtype {dtype} is not a floating-point parameter type"),
            ));
        }

        let expected = element_count(&name, &shape)?;
        if values.len() != expected {
            return Err(CorruptorError::invalid_tensor(
                name,
                format!("shape {shape:?} needs {expected} values, got {}", values.len()),
            ));
        }

        Ok(Self {
            name,
            dtype,
            shape,
            values,
        })
    }

    /// Decode little-endian tensor bytes
    ///
    /// # Errors
    ///
    /// Returns error if the byte length does not match shape and dtype.
    pub fn decode(name: &str, dtype: Dtype, shape: Vec<usize>, bytes: &[u8]) -> Result<Self> {
        let expected = byte_len(name, &shape, dtype)?;
        if bytes.len() != expected {
            return Err(CorruptorError::invalid_tensor(
                name,
                format!("expected {expected} bytes, got {}", bytes.len()),
            ));
        }

        let values = match dtype {
            Dtype::F64 => bytes
                .chunks_exact(8)
                .map(|chunk| {
                    let mut raw = [0u8; 8];
                    raw.copy_from_slice(chunk);
                    f64::from_le_bytes(raw)
                })
                .collect(),
            Dtype::F32 => bytes
                .chunks_exact(4)
                .map(|chunk| {
                    let mut raw = [0u8; 4];
                    raw.copy_from_slice(chunk);
                    f64::from(f32::from_le_bytes(raw))
                })
                .collect(),
            Dtype::F16 => bytes
                .chunks_exact(2)
                .map(|chunk| f16::from_le_bytes([chunk[0], chunk[1]]).to_f64())
                .collect(),
            Dtype::BF16 => bytes
                .chunks_exact(2)
                .map(|chunk| bf16::from_le_bytes([chunk[0], chunk[1]]).to_f64())
                .collect(),
            other => {
                return Err(CorruptorError::invalid_tensor(
                    name,
                    format!("dtype {other} cannot be decoded as a parameter"),
                ));
            }
        };

        Self::new(name, dtype, shape, values)
    }

    /// Encode the working buffer in the stored dtype
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.values.len() * self.dtype.size_bytes());

        for &v in &self.values {
            match self.dtype {
                Dtype::F64 => out.extend_from_slice(&v.to_le_bytes()),
                #[allow(clippy::cast_possible_truncation)]
                Dtype::F32 => out.extend_from_slice(&(v as f32).to_le_bytes()),
                Dtype::F16 => out.extend_from_slice(&f16::from_f64(v).to_le_bytes()),
                Dtype::BF16 => out.extend_from_slice(&bf16::from_f64(v).to_le_bytes()),
                // Constructors reject non-float dtypes
                _ => {}
            }
        }

        out
    }

    /// Tensor name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stored dtype
    pub const fn dtype(&self) -> Dtype {
        self.dtype
    }

    /// Tensor shape
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Working values in row-major order
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the tensor has no elements
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Add `factor * noise` element-wise
    ///
    /// # Errors
    ///
    /// Returns error if `noise` does not have one value per element.
    pub fn add_scaled(&mut self, factor: f64, noise: &[f64]) -> Result<()> {
        if noise.len() != self.values.len() {
            return Err(CorruptorError::invalid_tensor(
                self.name.clone(),
                format!(
                    "noise has {} values, parameter has {}",
                    noise.len(),
                    self.values.len()
                ),
            ));
        }

        for (value, n) in self.values.iter_mut().zip(noise) {
            *value += factor * n;
        }

        Ok(())
    }
}

/// Non-floating-point tensor carried through unchanged
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    /// Tensor name
    pub name: String,

    /// Stored dtype
    pub dtype: Dtype,

    /// Tensor shape
    pub shape: Vec<usize>,

    /// Raw little-endian bytes (Bytes keeps snapshot copies cheap)
    pub data: Bytes,
}

impl Buffer {
    /// Create a buffer, checking the byte length against shape and dtype
    ///
    /// # Errors
    ///
    /// Returns error on a length mismatch.
    pub fn new(
        name: impl Into<String>,
        dtype: Dtype,
        shape: Vec<usize>,
        data: impl Into<Bytes>,
    ) -> Result<Self> {
        let name = name.into();
        let data = data.into();
        let expected = byte_len(&name, &shape, dtype)?;

        if data.len() != expected {
            return Err(CorruptorError::invalid_tensor(
                name,
                format!("expected {expected} bytes, got {}", data.len()),
            ));
        }

        Ok(Self {
            name,
            dtype,
            shape,
            data,
        })
    }
}

/// A stored tensor, in file order
#[derive(Debug, Clone, PartialEq)]
pub enum Tensor {
    /// Floating-point parameter (perturbed)
    Parameter(Parameter),
    /// Anything else (copied verbatim)
    Buffer(Buffer),
}

impl Tensor {
    /// Tensor name
    pub fn name(&self) -> &str {
        match self {
            Self::Parameter(p) => p.name(),
            Self::Buffer(b) => &b.name,
        }
    }

    /// Stored dtype
    pub const fn dtype(&self) -> Dtype {
        match self {
            Self::Parameter(p) => p.dtype(),
            Self::Buffer(b) => b.dtype,
        }
    }

    /// Tensor shape
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Parameter(p) => p.shape(),
            Self::Buffer(b) => &b.shape,
        }
    }

    /// Encoded payload
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::Parameter(p) => p.encode(),
            Self::Buffer(b) => b.data.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dtype_tags() {
        for tag in ["F64", "F32", "F16", "BF16", "I64", "I32", "I16", "I8", "U8", "BOOL"] {
            assert_eq!(Dtype::from_tag(tag).unwrap().tag(), tag);
        }
        assert!(matches!(
            Dtype::from_tag("C64"),
            Err(CorruptorError::UnsupportedDtype { .. })
        ));
    }

    #[test]
    fn test_f32_decode_encode() {
        let raw: Vec<u8> = [1.5f32, -2.25, 0.1]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();

        let param = Parameter::decode("w", Dtype::F32, vec![3], &raw).unwrap();
        assert_eq!(param.len(), 3);
        assert!((param.values()[0] - 1.5).abs() < 1e-12);
        assert!((param.values()[1] + 2.25).abs() < 1e-12);

        // f32 -> f64 -> f32 is exact
        assert_eq!(param.encode(), raw);
    }

    #[test]
    fn test_f16_decode() {
        let raw: Vec<u8> = [f16::from_f32(0.5), f16::from_f32(-4.0)]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();

        let param = Parameter::decode("h", Dtype::F16, vec![2], &raw).unwrap();
        assert_eq!(param.values(), &[0.5, -4.0]);
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let raw = vec![0u8; 10];
        assert!(matches!(
            Parameter::decode("w", Dtype::F32, vec![3], &raw),
            Err(CorruptorError::InvalidTensor { .. })
        ));
        assert!(Buffer::new("idx", Dtype::I64, vec![2], raw).is_err());
    }

    #[test]
    fn test_scalar_shape_has_one_element() {
        assert_eq!(element_count("s", &[]).unwrap(), 1);
        let param = Parameter::new("s", Dtype::F64, vec![], vec![3.0]).unwrap();
        assert_eq!(param.len(), 1);
    }

    #[test]
    fn test_overflowing_shape_rejected() {
        let huge = vec![usize::MAX / 2, 4];
        assert!(matches!(
            element_count("w", &huge),
            Err(CorruptorError::InvalidTensor { .. })
        ));
        assert!(byte_len("w", &[usize::MAX / 2], Dtype::F32).is_err());
        assert!(Parameter::decode("w", Dtype::F32, huge.clone(), &[]).is_err());
        assert!(Buffer::new("idx", Dtype::U8, huge, Vec::new()).is_err());
    }

    #[test]
    fn test_integer_parameter_rejected() {
        assert!(Parameter::new("n", Dtype::I32, vec![1], vec![1.0]).is_err());
    }

    #[test]
    fn test_add_scaled() {
        let mut param = Parameter::new("w", Dtype::F64, vec![2], vec![1.0, 2.0]).unwrap();
        param.add_scaled(0.5, &[2.0, -4.0]).unwrap();
        assert_eq!(param.values(), &[2.0, 0.0]);

        assert!(param.add_scaled(1.0, &[1.0]).is_err());
    }
}
