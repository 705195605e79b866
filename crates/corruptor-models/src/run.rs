//! End-to-end corruption run: prepare output, load, corrupt, save each step

use crate::corruptor::{Corruptor, StepReport};
use crate::error::Result;
use crate::model::Model;
use crate::output;
use crate::schedule::CorruptionSchedule;
use std::path::PathBuf;

/// Inputs for one corruption run
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Noise seed
    pub seed: i64,

    /// Deployed model to corrupt
    pub model_path: PathBuf,

    /// Directory the output directory is created in
    pub output_root: PathBuf,

    /// Corruption factors
    pub schedule: CorruptionSchedule,
}

impl RunConfig {
    /// Default schedule, output next to the working directory
    pub fn new(seed: i64, model_path: impl Into<PathBuf>) -> Self {
        Self {
            seed,
            model_path: model_path.into(),
            output_root: PathBuf::from("."),
            schedule: CorruptionSchedule::default(),
        }
    }

    /// Override where the output directory is created
    #[must_use]
    pub fn with_output_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.output_root = root.into();
        self
    }

    /// Override the corruption schedule
    #[must_use]
    pub fn with_schedule(mut self, schedule: CorruptionSchedule) -> Self {
        self.schedule = schedule;
        self
    }
}

/// One written snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRecord {
    /// Step diagnostics
    pub step: StepReport,

    /// File the snapshot was written to
    pub path: PathBuf,
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Directory holding the snapshots
    pub output_dir: PathBuf,

    /// Snapshots in step order
    pub snapshots: Vec<SnapshotRecord>,
}

/// Run the full corruption procedure
///
/// The output directory is wiped before the model is loaded, so a load
/// failure still leaves an empty directory behind.
///
/// # Errors
///
/// Returns error if the model name is unusable, the model cannot be loaded,
/// or any directory or snapshot write fails.
pub fn run(config: &RunConfig) -> Result<RunSummary> {
    run_with(config, |_| {})
}

/// Run the full corruption procedure, calling `on_step` after each
/// increment is applied and before that step's snapshot is written
///
/// # Errors
///
/// Same as [`run`].
pub fn run_with<F>(config: &RunConfig, mut on_step: F) -> Result<RunSummary>
where
    F: FnMut(&SnapshotRecord),
{
    let dir_name = output::output_dir_name(&config.model_path, config.seed)?;
    let output_dir = output::prepare_output_dir(&config.output_root, &dir_name)?;

    let model = Model::from_file(&config.model_path)?;
    let mut corruptor = Corruptor::seeded(model, &config.schedule, config.seed);

    let mut snapshots = Vec::with_capacity(config.schedule.steps);
    while let Some(step) = corruptor.advance()? {
        let path = output_dir.join(output::snapshot_file_name(step.factor, step.index));
        let record = SnapshotRecord { step, path };
        on_step(&record);

        corruptor.model().save(&record.path)?;
        tracing::info!("Saved {}", record.path.display());
        snapshots.push(record);
    }

    tracing::info!(
        "Wrote {} snapshot(s) to {}",
        snapshots.len(),
        output_dir.display()
    );

    Ok(RunSummary {
        output_dir,
        snapshots,
    })
}
