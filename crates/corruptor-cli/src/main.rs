//! `corruptor`: write progressively noisier copies of a deployed model.
//!
//! ```text
//! USAGE:
//!   corruptor --seed <int> --modelname <file> [--output-root <dir>]
//!
//! OUTPUT:
//!   <output-root>/<stem>_corrupted_SEED_<seed>/corruptfac_<factor>_<i>.pth   (i = 0..11)
//! ```
//!
//! Any existing output directory for the same model and seed is deleted first.

use anyhow::{Context, Result};
use clap::Parser;
use corruptor_models::output::format_factor;
use corruptor_models::{fmt_std, run_with, RunConfig, SnapshotRecord};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "corruptor",
    about = "Inject seeded Gaussian noise into a deployed model's parameters",
    version
)]
struct Cli {
    /// Seed for the noise generator.
    #[arg(long, allow_negative_numbers = true)]
    seed: i64,

    /// Deployed model file, relative to the working directory.
    #[arg(long)]
    modelname: PathBuf,

    /// Directory in which the output directory is created.
    #[arg(long, default_value = ".")]
    output_root: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = RunConfig::new(cli.seed, &cli.modelname).with_output_root(&cli.output_root);
    let summary = run_with(&config, print_step)
        .with_context(|| format!("Corrupting {}", cli.modelname.display()))?;

    println!();
    println!(
        "Wrote {} snapshots to {}",
        summary.snapshots.len(),
        summary.output_dir.display()
    );

    Ok(())
}

/// Diagnostic line for one step, printed before its snapshot is written
fn step_line(record: &SnapshotRecord) -> String {
    let step = &record.step;
    format!(
        "({}, {}, {})",
        format_factor(step.factor),
        fmt_std(step.first_param_std),
        fmt_std(step.increment_std)
    )
}

fn print_step(record: &SnapshotRecord) {
    println!("{}", step_line(record));
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_required_args() {
        assert!(Cli::try_parse_from(["corruptor", "--seed", "1"]).is_err());
        assert!(Cli::try_parse_from(["corruptor", "--modelname", "m.pth"]).is_err());
        assert!(Cli::try_parse_from(["corruptor", "--seed", "x", "--modelname", "m.pth"]).is_err());
    }

    #[test]
    fn test_step_line_format() {
        let record = SnapshotRecord {
            step: corruptor_models::StepReport {
                index: 0,
                factor: 5.5e-5,
                increment: 5.5e-5,
                first_param_std: Some(0.25),
                increment_std: None,
            },
            path: PathBuf::from("corruptfac_5.5e-05_0.pth"),
        };
        assert_eq!(step_line(&record), "(5.5e-05, 0.25, nan)");
    }

    #[test]
    fn test_parse_defaults() {
        let cli = Cli::try_parse_from(["corruptor", "--seed", "-7", "--modelname", "model.pth"])
            .unwrap();
        assert_eq!(cli.seed, -7);
        assert_eq!(cli.modelname, PathBuf::from("model.pth"));
        assert_eq!(cli.output_root, PathBuf::from("."));
    }
}
