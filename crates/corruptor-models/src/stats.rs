//! Summary statistics over parameter buffers

/// Arithmetic mean, `None` for an empty slice
#[allow(clippy::cast_precision_loss)]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Bessel-corrected sample standard deviation
///
/// Undefined (`None`) for fewer than two values.
#[allow(clippy::cast_precision_loss)]
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }

    let mean = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((sum_sq / (values.len() - 1) as f64).sqrt())
}

/// Sample standard deviation of `factor * values`, without materializing it
pub fn scaled_sample_std(factor: f64, values: &[f64]) -> Option<f64> {
    sample_std(values).map(|std| std * factor.abs())
}
