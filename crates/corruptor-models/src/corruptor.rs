//! Cumulative noise injection
//!
//! The corruptor owns the model's parameter buffers and one fixed noise
//! tensor per parameter. Each [`Corruptor::advance`] adds the next schedule
//! increment, so after step `i` every parameter carries exactly
//! `factors[i] * noise` on top of its loaded value.

use crate::error::{CorruptorError, Result};
use crate::model::Model;
use crate::noise::{self, NoiseTensor};
use crate::output;
use crate::schedule::CorruptionSchedule;
use crate::stats;
use rand::Rng;

/// Diagnostics for one corruption step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepReport {
    /// 0-based step index
    pub index: usize,

    /// Cumulative corruption factor after this step
    pub factor: f64,

    /// Increment applied at this step
    pub increment: f64,

    /// Sample std of the first parameter after the step
    pub first_param_std: Option<f64>,

    /// Sample std of the increment applied to the first parameter
    pub increment_std: Option<f64>,
}

/// Owns a model and drives it through the corruption schedule
#[derive(Debug, Clone)]
pub struct Corruptor {
    model: Model,
    noise: Vec<NoiseTensor>,
    factors: Vec<f64>,
    increments: Vec<f64>,
    next_step: usize,
}

impl Corruptor {
    /// Sample noise for `model` from `rng` and prepare the schedule
    pub fn new<R: Rng + ?Sized>(model: Model, schedule: &CorruptionSchedule, rng: &mut R) -> Self {
        let noise = noise::sample_noise(&model, rng);

        tracing::info!(
            "Sampled noise for {} parameter(s) ({} values)",
            noise.len(),
            model.total_parameter_elements()
        );

        Self {
            model,
            noise,
            factors: schedule.factors(),
            increments: schedule.increments(),
            next_step: 0,
        }
    }

    /// Seed a fresh generator from `seed` and sample noise with it
    pub fn seeded(model: Model, schedule: &CorruptionSchedule, seed: i64) -> Self {
        let mut rng = noise::seeded_rng(seed);
        Self::new(model, schedule, &mut rng)
    }

    /// Current model state (read-only view for serialization)
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Fixed noise tensors, one per parameter in parameter order
    pub fn noise(&self) -> &[NoiseTensor] {
        &self.noise
    }

    /// Cumulative factors for every step
    pub fn factors(&self) -> &[f64] {
        &self.factors
    }

    /// Number of steps already applied
    pub const fn steps_taken(&self) -> usize {
        self.next_step
    }

    /// Whether every step has been applied
    pub fn is_finished(&self) -> bool {
        self.next_step >= self.factors.len()
    }

    /// Apply the next increment to every parameter
    ///
    /// Returns `Ok(None)` once the schedule is exhausted.
    ///
    /// # Errors
    ///
    /// Returns error if a noise tensor no longer matches its parameter.
    pub fn advance(&mut self) -> Result<Option<StepReport>> {
        let index = self.next_step;
        let (Some(&factor), Some(&increment)) =
            (self.factors.get(index), self.increments.get(index))
        else {
            return Ok(None);
        };

        for (param, noise) in self.model.parameters_mut().zip(&self.noise) {
            if param.name() != noise.name {
                return Err(CorruptorError::invalid_tensor(
                    param.name(),
                    format!("noise was sampled for '{}'", noise.name),
                ));
            }
            param.add_scaled(increment, &noise.values)?;
        }

        let first_param_std = self
            .model
            .parameters()
            .next()
            .and_then(|p| stats::sample_std(p.values()));
        let increment_std = self
            .noise
            .first()
            .and_then(|n| stats::scaled_sample_std(increment, &n.values));

        self.next_step += 1;

        let report = StepReport {
            index,
            factor,
            increment,
            first_param_std,
            increment_std,
        };
        tracing::info!(
            "step {index}: factor={} first_param_std={} increment_std={}",
            output::format_factor(factor),
            fmt_std(first_param_std),
            fmt_std(increment_std)
        );

        Ok(Some(report))
    }
}

/// Render an optional std for diagnostics, in the same style as factors
pub fn fmt_std(std: Option<f64>) -> String {
    std.map_or_else(|| "nan".to_string(), output::format_factor)
}
