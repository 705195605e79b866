//! Corruption factor schedule
//!
//! Factors are `10^e` for exponents evenly spaced over
//! `[start_exponent, stop_exponent]`, both ends included.

use crate::error::{CorruptorError, Result};

/// Default first exponent (`10^-4.3` ≈ 5.0e-5)
pub const DEFAULT_START_EXPONENT: f64 = -4.3;

/// Default last exponent (`10^-0.3` ≈ 0.501)
pub const DEFAULT_STOP_EXPONENT: f64 = -0.3;

/// Default number of snapshots
pub const DEFAULT_STEPS: usize = 12;

/// Logarithmically spaced corruption factors
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorruptionSchedule {
    /// Base-10 exponent of the first factor
    pub start_exponent: f64,

    /// Base-10 exponent of the last factor
    pub stop_exponent: f64,

    /// Number of factors
    pub steps: usize,
}

impl Default for CorruptionSchedule {
    fn default() -> Self {
        Self {
            start_exponent: DEFAULT_START_EXPONENT,
            stop_exponent: DEFAULT_STOP_EXPONENT,
            steps: DEFAULT_STEPS,
        }
    }
}

impl CorruptionSchedule {
    /// Create a schedule, checking that factors will be strictly increasing
    ///
    /// # Errors
    ///
    /// Returns error for fewer than one step, non-finite exponents, or a
    /// multi-step schedule whose exponents do not increase.
    pub fn new(start_exponent: f64, stop_exponent: f64, steps: usize) -> Result<Self> {
        if steps == 0 {
            return Err(CorruptorError::invalid_schedule("schedule needs at least one step"));
        }
        if !start_exponent.is_finite() || !stop_exponent.is_finite() {
            return Err(CorruptorError::invalid_schedule("schedule exponents must be finite"));
        }
        if steps > 1 && stop_exponent <= start_exponent {
            return Err(CorruptorError::invalid_schedule(format!(
                "schedule exponents must increase ({start_exponent} -> {stop_exponent})"
            )));
        }

        Ok(Self {
            start_exponent,
            stop_exponent,
            steps,
        })
    }

    /// Cumulative factors, strictly increasing
    #[allow(clippy::cast_precision_loss)]
    pub fn factors(&self) -> Vec<f64> {
        if self.steps == 1 {
            return vec![10f64.powf(self.start_exponent)];
        }

        let span = self.stop_exponent - self.start_exponent;
        let step = span / (self.steps - 1) as f64;

        let mut factors: Vec<f64> = (0..self.steps)
            .map(|i| 10f64.powf(self.start_exponent + i as f64 * step))
            .collect();

        // Pin the endpoint exactly
        if let Some(last) = factors.last_mut() {
            *last = 10f64.powf(self.stop_exponent);
        }

        factors
    }

    /// Successive differences between factors (`steps - 1` values)
    pub fn differences(&self) -> Vec<f64> {
        self.factors().windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Amount to add at each step so that the running total after step `i`
    /// equals `factors()[i]`
    pub fn increments(&self) -> Vec<f64> {
        let factors = self.factors();
        let mut increments = Vec::with_capacity(factors.len());

        if let Some(&first) = factors.first() {
            increments.push(first);
        }
        increments.extend(self.differences());

        increments
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule_shape() {
        let factors = CorruptionSchedule::default().factors();

        assert_eq!(factors.len(), 12);
        assert!(factors.iter().all(|&f| f > 0.0));
        assert!(factors.windows(2).all(|w| w[0] < w[1]));
        assert!((factors[0] - 10f64.powf(-4.3)).abs() < 1e-18);
        assert!((factors[11] - 10f64.powf(-0.3)).abs() < 1e-15);
    }

    #[test]
    fn test_exponents_evenly_spaced() {
        let factors = CorruptionSchedule::default().factors();
        let ratios: Vec<f64> = factors.windows(2).map(|w| w[1] / w[0]).collect();
        let expected = 10f64.powf(4.0 / 11.0);
        for r in ratios {
            assert!((r - expected).abs() < 1e-9);
        }
    }

    #[test]
    fn test_increments_sum_to_factors() {
        let schedule = CorruptionSchedule::default();
        let factors = schedule.factors();
        let increments = schedule.increments();

        assert_eq!(schedule.differences().len(), 11);
        assert_eq!(increments.len(), 12);

        let mut total = 0.0_f64;
        for (inc, factor) in increments.iter().zip(&factors) {
            total += inc;
            assert!((total - factor).abs() < 1e-12 * factor.max(1.0));
        }
    }

    #[test]
    fn test_invalid_schedules() {
        assert!(CorruptionSchedule::new(-1.0, -2.0, 3).is_err());
        assert!(CorruptionSchedule::new(-1.0, 0.0, 0).is_err());
        assert!(CorruptionSchedule::new(f64::NAN, 0.0, 2).is_err());

        let single = CorruptionSchedule::new(-2.0, -2.0, 1).unwrap().factors();
        assert_eq!(single.len(), 1);
        assert!((single[0] - 0.01).abs() < 1e-15);
    }
}
