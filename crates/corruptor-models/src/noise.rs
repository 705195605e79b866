//! Per-parameter Gaussian noise
//!
//! Each parameter gets one fixed noise sample drawn from `N(0, σ²)`, where σ
//! is that parameter's own sample standard deviation at load time. Samples
//! are taken in parameter order from a single explicitly seeded generator.

use crate::model::Model;
use crate::stats;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, StandardNormal};

/// Fixed noise sample for one parameter
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseTensor {
    /// Name of the parameter this noise belongs to
    pub name: String,

    /// Standard deviation the noise was drawn with
    pub std: f64,

    /// Noise values, same layout as the parameter
    pub values: Vec<f64>,
}

/// Generator used for noise sampling, seeded from the run seed
pub fn seeded_rng(seed: i64) -> ChaCha8Rng {
    // Negative seeds map onto distinct u64 values
    #[allow(clippy::cast_sign_loss)]
    ChaCha8Rng::seed_from_u64(seed as u64)
}

/// Draw one noise tensor per parameter, in parameter order
pub fn sample_noise<R: Rng + ?Sized>(model: &Model, rng: &mut R) -> Vec<NoiseTensor> {
    model
        .parameters()
        .map(|param| {
            let std = match stats::sample_std(param.values()) {
                Some(std) if std.is_finite() => std,
                _ => {
                    tracing::warn!(
                        "Parameter {} has {} element(s), no usable spread; leaving it unperturbed",
                        param.name(),
                        param.len()
                    );
                    0.0
                }
            };

            let values = (0..param.len())
                .map(|_| {
                    let z: f64 = StandardNormal.sample(&mut *rng);
                    std * z
                })
                .collect();

            tracing::debug!("Noise for {}: σ = {std:.6e}, {} values", param.name(), param.len());

            NoiseTensor {
                name: param.name().to_string(),
                std,
                values,
            }
        })
        .collect()
}
