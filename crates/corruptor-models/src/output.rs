//! Output directory layout
//!
//! ```text
//! <root>/<stem>_corrupted_SEED_<seed>/
//!     corruptfac_<factor>_0.pth
//!     ...
//!     corruptfac_<factor>_11.pth
//! ```

use crate::error::{CorruptorError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Snapshot file extension
pub const SNAPSHOT_EXTENSION: &str = "pth";

/// Snapshot file name prefix
pub const SNAPSHOT_PREFIX: &str = "corruptfac";

/// Output directory name for a model file and seed
///
/// The stem is the model's file name up to its first `.`, so
/// `deployed.v2.pth` with seed 3 gives `deployed_corrupted_SEED_3`.
/// Leading directories of `model_path` are dropped: the directory is always
/// created under the run's output root, not next to the model.
///
/// # Errors
///
/// Returns error if the file name is missing or its stem is empty.
pub fn output_dir_name(model_path: &Path, seed: i64) -> Result<String> {
    let file_name = model_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let stem = file_name.split('.').next().unwrap_or_default();
    if stem.is_empty() {
        return Err(CorruptorError::InvalidModelName {
            name: model_path.display().to_string(),
        });
    }

    Ok(format!("{stem}_corrupted_SEED_{seed}"))
}

/// Create `root/name` empty, deleting whatever was there before
///
/// # Errors
///
/// Returns error if removal or creation fails.
pub fn prepare_output_dir(root: &Path, name: &str) -> Result<PathBuf> {
    let dir = root.join(name);

    if dir.is_dir() {
        tracing::warn!("Removing previous output directory {}", dir.display());
        fs::remove_dir_all(&dir)?;
    } else if dir.exists() {
        tracing::warn!("Removing file in place of output directory {}", dir.display());
        fs::remove_file(&dir)?;
    }

    fs::create_dir_all(root)?;
    fs::create_dir(&dir)?;

    tracing::info!("Output directory: {}", dir.display());
    Ok(dir)
}

/// Snapshot file name for a cumulative factor and step index
pub fn snapshot_file_name(factor: f64, index: usize) -> String {
    format!(
        "{SNAPSHOT_PREFIX}_{}_{index}.{SNAPSHOT_EXTENSION}",
        format_factor(factor)
    )
}

/// Shortest round-trip rendering of a factor
///
/// Plain decimal in `[1e-4, 1e16)`, otherwise scientific with a signed
/// exponent of at least two digits (`5.011872336272725e-05`).
pub fn format_factor(value: f64) -> String {
    let magnitude = value.abs();

    if !value.is_finite() || value == 0.0 || (1e-4..1e16).contains(&magnitude) {
        let plain = format!("{value}");
        if value.is_finite() && !plain.contains('.') {
            return format!("{plain}.0");
        }
        return plain;
    }

    let sci = format!("{value:e}");
    match sci.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => sci,
    }
}

/// Parse the factor and index back out of a snapshot file name
pub fn parse_snapshot_file_name(file_name: &str) -> Option<(f64, usize)> {
    let body = file_name
        .strip_prefix(SNAPSHOT_PREFIX)?
        .strip_prefix('_')?
        .strip_suffix(SNAPSHOT_EXTENSION)?
        .strip_suffix('.')?;
    let (factor, index) = body.rsplit_once('_')?;

    Some((factor.parse().ok()?, index.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_output_dir_name() {
        assert_eq!(
            output_dir_name(Path::new("model.pth"), 42).unwrap(),
            "model_corrupted_SEED_42"
        );
        assert_eq!(
            output_dir_name(Path::new("runs/deployed.v2.pth"), -3).unwrap(),
            "deployed_corrupted_SEED_-3"
        );
        assert_eq!(
            output_dir_name(Path::new("noext"), 0).unwrap(),
            "noext_corrupted_SEED_0"
        );
        assert!(output_dir_name(Path::new(".pth"), 1).is_err());
        assert!(output_dir_name(Path::new("/"), 1).is_err());
    }

    #[test]
    fn test_format_factor() {
        assert_eq!(format_factor(5.5e-5), "5.5e-05");
        assert_eq!(format_factor(0.5), "0.5");
        assert_eq!(format_factor(1e-5), "1e-05");
        assert_eq!(format_factor(1e-4), "0.0001");
        assert_eq!(format_factor(1.0), "1.0");
        assert_eq!(format_factor(2.5e-120), "2.5e-120");
        assert_eq!(format_factor(1e16), "1e+16");
    }

    #[test]
    fn test_default_schedule_file_names() {
        let factors = crate::schedule::CorruptionSchedule::default().factors();
        let names: Vec<String> = factors
            .iter()
            .enumerate()
            .map(|(i, &f)| snapshot_file_name(f, i))
            .collect();

        assert_eq!(names.len(), 12);
        assert_eq!(names[0], "corruptfac_5.011872336272725e-05_0.pth");
        assert_eq!(names[11], "corruptfac_0.5011872336272722_11.pth");
        // Only the first factor is below 1e-4
        assert!(names[1].starts_with("corruptfac_0.0001"));
        assert!(names[1..].iter().all(|n| !n.contains("e-")));
    }

    #[test]
    fn test_snapshot_file_name_round_trip() {
        let name = snapshot_file_name(0.000_125, 1);
        assert_eq!(name, "corruptfac_0.000125_1.pth");

        let (factor, index) = parse_snapshot_file_name(&name).unwrap();
        assert_eq!(factor, 0.000_125);
        assert_eq!(index, 1);

        assert!(parse_snapshot_file_name("model.pth").is_none());
    }

    #[test]
    fn test_prepare_clears_previous_run() {
        let temp_dir = TempDir::new().unwrap();
        let stale = temp_dir.path().join("m_corrupted_SEED_1");
        fs::create_dir_all(stale.join("nested")).unwrap();
        fs::write(stale.join("nested/old.txt"), b"old").unwrap();

        let dir = prepare_output_dir(temp_dir.path(), "m_corrupted_SEED_1").unwrap();

        assert_eq!(dir, stale);
        assert_eq!(fs::read_dir(&dir).unwrap().count(), 0);
    }

    #[test]
    fn test_prepare_creates_missing_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("a/b");
        let dir = prepare_output_dir(&root, "x").unwrap();
        assert!(dir.is_dir());
    }
}
