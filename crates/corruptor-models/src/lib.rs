#![deny(unsafe_code)]

//! Seeded Gaussian corruption of deployed model checkpoints
//!
//! This crate loads a deployed model (parameters plus a string metadata
//! dictionary), perturbs every floating-point parameter with noise
//! proportional to its own spread, and writes one snapshot per step of a
//! logarithmic corruption schedule.
//!
//! # Format
//!
//! Models are read and written as safetensors containers:
//!
//! - **Header length** (8 bytes): little-endian `u64`
//! - **Header**: JSON mapping tensor names to dtype, shape and byte offsets,
//!   plus an optional `__metadata__` string dictionary
//! - **Data**: raw little-endian tensor bytes
//!
//! Floating-point tensors are parameters and get perturbed; every other
//! tensor is a buffer and is copied through unchanged.
//!
//! # Example
//!
//! ```no_run
//! use corruptor_models::{run, RunConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let summary = run(&RunConfig::new(42, "model.pth"))?;
//!
//! println!("Output: {}", summary.output_dir.display());
//! for snapshot in &summary.snapshots {
//!     println!("{:e} -> {}", snapshot.step.factor, snapshot.path.display());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

mod corruptor;
mod error;
mod model;
pub mod noise;
pub mod output;
mod parser;
mod run;
mod saving;
mod schedule;
pub mod stats;
mod weights;

pub use corruptor::{fmt_std, Corruptor, StepReport};
pub use error::{CorruptorError, Result};
pub use model::Model;
pub use noise::NoiseTensor;
pub use parser::{parse_header, ContainerHeader, TensorEntry, METADATA_KEY};
pub use run::{run, run_with, RunConfig, RunSummary, SnapshotRecord};
pub use schedule::CorruptionSchedule;
pub use weights::{Buffer, Dtype, Parameter, Tensor};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::{CorruptionSchedule, Corruptor, Model, Result, RunConfig, RunSummary};
}
