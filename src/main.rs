//! Command-line driver for the AMI calibration pipeline.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use ami_pipeline::pipeline::report::StageReport;
use ami_pipeline::{
    AnalyzeConfig, CalibError, DetectorConfig, ImageConfig, NormalizeConfig, Result,
    SubprocessPipeline,
};

/// Run AMI exposures through detector correction, image calibration, and
/// interferometric analysis, then normalize each target against its
/// matched PSF calibrators.
#[derive(Debug, Parser)]
#[command(name = "ami-pipeline", version, about)]
struct Cli {
    /// Input exposure files (any pipeline suffix; remapped per stage)
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Output directory shared by all stages (created if missing)
    #[arg(short, long)]
    outdir: PathBuf,

    /// Subset of stages to run, in ascending order (default: all three)
    #[arg(long, num_args = 1.., value_parser = clap::value_parser!(u8).range(1..=3))]
    stages: Option<Vec<u8>>,

    /// Externally supplied calibration-pair file (not yet supported)
    #[arg(long)]
    calib_pairs: Option<PathBuf>,

    /// Write a JSON report of per-file and per-pair outcomes
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(reports) => {
            if let Some(path) = &cli.report {
                if let Err(e) = write_report(path, &reports) {
                    error!("{e}");
                    return ExitCode::FAILURE;
                }
            }
            if reports.iter().any(StageReport::has_failures) {
                error!("pipeline finished with failures");
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn write_report(path: &Path, reports: &[StageReport]) -> Result<()> {
    let json = serde_json::to_string_pretty(reports)?;
    fs::write(path, json).map_err(|e| CalibError::io(path, e))?;
    info!("wrote report to {}", path.display());
    Ok(())
}

fn run(cli: &Cli) -> Result<Vec<StageReport>> {
    let pipeline = SubprocessPipeline::subprocess(
        &DetectorConfig::default(),
        &ImageConfig::default(),
        &AnalyzeConfig::default(),
        &NormalizeConfig::default(),
    );
    let calib_pairs = cli.calib_pairs.as_deref();

    let Some(stages) = cli.stages.clone() else {
        info!("running all three stages into {}", cli.outdir.display());
        let report = pipeline.run_all(&cli.files, &cli.outdir, calib_pairs)?;
        return Ok(report.stages);
    };

    let mut stages = stages;
    stages.sort_unstable();
    stages.dedup();

    let mut reports = Vec::new();
    for stage in stages {
        let report = match stage {
            1 => pipeline.run_detector1(&cli.files, &cli.outdir)?,
            2 => pipeline.run_image2(&cli.files, &cli.outdir)?,
            _ => pipeline.run_ami3(&cli.files, &cli.outdir, calib_pairs)?,
        };
        reports.push(report);
    }
    Ok(reports)
}
