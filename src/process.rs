//! Subprocess-backed collaborators.
//!
//! The actual detector correction, image calibration, fringe extraction,
//! and normalization are performed by the external processing suite,
//! reached through its `strun` command-line entry point. Each stage's
//! configuration record maps onto `--parameter=value` overrides; the
//! child process inherits stdout/stderr so its own logging stays
//! visible.
//!
//! These types are deliberately thin: everything interesting about a run
//! (suffix normalization, idempotency, outcome collection) happens in
//! the runner, not here.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::debug;

use crate::errors::{CalibError, Result};
use crate::naming::StageSuffix;
use crate::pipeline::config::{AnalyzeConfig, DetectorConfig, ImageConfig, NormalizeConfig};
use crate::pipeline::runner::AmiPipeline;
use crate::pipeline::traits::{ExposureStage, PairNormalizer};

/// Default entry-point command of the processing suite.
const STRUN: &str = "strun";

fn flag(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

// ============================================================================
// StrunStage — one exposure stage run via `strun`
// ============================================================================

/// An exposure-processing stage delegated to `strun <alias> <file> ...`.
#[derive(Debug, Clone)]
pub struct StrunStage {
    name: &'static str,
    alias: &'static str,
    input: StageSuffix,
    output: StageSuffix,
    overrides: Vec<String>,
    program: PathBuf,
}

impl StrunStage {
    /// The detector-correction stage (`calwebb_detector1`).
    pub fn detector1(cfg: &DetectorConfig) -> Self {
        Self {
            name: "detector1",
            alias: "calwebb_detector1",
            input: StageSuffix::Uncal,
            output: StageSuffix::Rateints,
            overrides: vec![
                format!("--save_results={}", flag(cfg.save_results)),
                format!("--save_calibrated_ramp={}", flag(cfg.save_calibrated_ramp)),
                format!("--steps.ipc.skip={}", flag(cfg.skip_ipc)),
                format!("--steps.persistence.skip={}", flag(cfg.skip_persistence)),
            ],
            program: PathBuf::from(STRUN),
        }
    }

    /// The image-calibration stage (`calwebb_image2`).
    pub fn image2(cfg: &ImageConfig) -> Self {
        Self {
            name: "image2",
            alias: "calwebb_image2",
            input: StageSuffix::Rateints,
            output: StageSuffix::Calints,
            overrides: vec![
                format!("--save_results={}", flag(cfg.save_results)),
                format!("--steps.photom.skip={}", flag(cfg.skip_photom)),
                format!("--steps.resample.skip={}", flag(cfg.skip_resample)),
            ],
            program: PathBuf::from(STRUN),
        }
    }

    /// The interferometric-analysis stage (`ami_analyze`).
    pub fn ami_analyze(cfg: &AnalyzeConfig) -> Self {
        let mut overrides = vec![
            format!("--save_results={}", flag(cfg.save_results)),
            format!("--oversample={}", cfg.oversample),
            format!("--usebp={}", flag(cfg.use_bad_pixel_map)),
            format!("--run_bpfix={}", flag(cfg.run_bpfix)),
        ];
        if let Some(n) = cfg.first_few {
            overrides.push(format!("--firstfew={n}"));
        }
        Self {
            name: "ami3",
            alias: "ami_analyze",
            input: StageSuffix::Calints,
            output: StageSuffix::AmiOi,
            overrides,
            program: PathBuf::from(STRUN),
        }
    }

    /// Override the entry-point command (used by tests).
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// The argument vector for one invocation.
    fn argv(&self, input: &Path, outdir: &Path) -> Vec<String> {
        let mut argv = vec![
            self.alias.to_string(),
            input.display().to_string(),
            format!("--output_dir={}", outdir.display()),
        ];
        argv.extend(self.overrides.iter().cloned());
        argv
    }
}

impl ExposureStage for StrunStage {
    fn name(&self) -> &'static str {
        self.name
    }

    fn input_stage(&self) -> StageSuffix {
        self.input
    }

    fn output_stage(&self) -> StageSuffix {
        self.output
    }

    fn process(&self, input: &Path, outdir: &Path) -> Result<()> {
        let argv = self.argv(input, outdir);
        debug!("running {} {}", self.program.display(), argv.join(" "));
        let status = Command::new(&self.program)
            .args(&argv)
            .status()
            .map_err(|e| CalibError::io(&self.program, e))?;
        if !status.success() {
            return Err(CalibError::stage_failed(
                self.name,
                format!("{} {} exited with {status}", self.program.display(), self.alias),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// StrunNormalize — the per-pair normalization step
// ============================================================================

/// The normalization step (`ami_normalize`) run via `strun`.
#[derive(Debug, Clone)]
pub struct StrunNormalize {
    overrides: Vec<String>,
    program: PathBuf,
}

impl StrunNormalize {
    pub fn new(cfg: &NormalizeConfig) -> Self {
        Self {
            overrides: vec![format!("--save_results={}", flag(cfg.save_results))],
            program: PathBuf::from(STRUN),
        }
    }

    /// Override the entry-point command (used by tests).
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    fn argv(&self, target_oi: &Path, calib_oi: &Path, outdir: &Path) -> Vec<String> {
        let mut argv = vec![
            "ami_normalize".to_string(),
            target_oi.display().to_string(),
            calib_oi.display().to_string(),
            format!("--output_dir={}", outdir.display()),
        ];
        argv.extend(self.overrides.iter().cloned());
        argv
    }
}

impl PairNormalizer for StrunNormalize {
    fn normalize(&self, target_oi: &Path, calib_oi: &Path, outdir: &Path) -> Result<()> {
        let argv = self.argv(target_oi, calib_oi, outdir);
        debug!("running {} {}", self.program.display(), argv.join(" "));
        let status = Command::new(&self.program)
            .args(&argv)
            .status()
            .map_err(|e| CalibError::io(&self.program, e))?;
        if !status.success() {
            return Err(CalibError::stage_failed(
                "ami_normalize",
                format!("{} ami_normalize exited with {status}", self.program.display()),
            ));
        }
        Ok(())
    }
}

// ============================================================================
// SubprocessPipeline — the binary's composed pipeline
// ============================================================================

/// Type alias for the pipeline the CLI binary runs.
pub type SubprocessPipeline = AmiPipeline<StrunStage, StrunStage, StrunStage, StrunNormalize>;

impl SubprocessPipeline {
    /// Compose a subprocess-backed pipeline from stage configurations.
    pub fn subprocess(
        detector: &DetectorConfig,
        image: &ImageConfig,
        analyze: &AnalyzeConfig,
        normalize: &NormalizeConfig,
    ) -> Self {
        AmiPipeline::new(
            StrunStage::detector1(detector),
            StrunStage::image2(image),
            StrunStage::ami_analyze(analyze),
            StrunNormalize::new(normalize),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector1_argv() {
        let stage = StrunStage::detector1(&DetectorConfig::default());
        let argv = stage.argv(Path::new("a_0_uncal.fits"), Path::new("out"));
        assert_eq!(argv[0], "calwebb_detector1");
        assert_eq!(argv[1], "a_0_uncal.fits");
        assert!(argv.contains(&"--output_dir=out".to_string()));
        assert!(argv.contains(&"--steps.ipc.skip=True".to_string()));
        assert!(argv.contains(&"--steps.persistence.skip=True".to_string()));
        assert!(argv.contains(&"--save_calibrated_ramp=True".to_string()));
    }

    #[test]
    fn test_image2_argv() {
        let cfg = ImageConfig::default().with_skip_photom(false);
        let stage = StrunStage::image2(&cfg);
        let argv = stage.argv(Path::new("a_0_rateints.fits"), Path::new("out"));
        assert_eq!(argv[0], "calwebb_image2");
        assert!(argv.contains(&"--steps.photom.skip=False".to_string()));
        assert!(argv.contains(&"--steps.resample.skip=True".to_string()));
    }

    #[test]
    fn test_ami_analyze_argv() {
        let cfg = AnalyzeConfig::default().with_first_few(7);
        let stage = StrunStage::ami_analyze(&cfg);
        let argv = stage.argv(Path::new("a_0_calints.fits"), Path::new("out"));
        assert_eq!(argv[0], "ami_analyze");
        assert!(argv.contains(&"--oversample=5".to_string()));
        assert!(argv.contains(&"--usebp=False".to_string()));
        assert!(argv.contains(&"--run_bpfix=True".to_string()));
        assert!(argv.contains(&"--firstfew=7".to_string()));
    }

    #[test]
    fn test_firstfew_omitted_by_default() {
        let stage = StrunStage::ami_analyze(&AnalyzeConfig::default());
        let argv = stage.argv(Path::new("a_0_calints.fits"), Path::new("out"));
        assert!(!argv.iter().any(|a| a.starts_with("--firstfew")));
    }

    #[test]
    fn test_normalize_argv_orders_target_then_calibrator() {
        let step = StrunNormalize::new(&NormalizeConfig::default());
        let argv = step.argv(
            Path::new("t_ami-oi.fits"),
            Path::new("c_ami-oi.fits"),
            Path::new("out"),
        );
        assert_eq!(argv[..3], ["ami_normalize", "t_ami-oi.fits", "c_ami-oi.fits"]);
    }

    #[test]
    fn test_nonzero_exit_is_stage_failure() {
        let stage = StrunStage::detector1(&DetectorConfig::default()).with_program("false");
        let err = stage
            .process(Path::new("a_0_uncal.fits"), Path::new("out"))
            .unwrap_err();
        assert!(matches!(err, CalibError::StageFailed { .. }));
    }

    #[test]
    fn test_missing_program_is_io_error() {
        let stage = StrunStage::detector1(&DetectorConfig::default())
            .with_program("/nonexistent/strun");
        let err = stage
            .process(Path::new("a_0_uncal.fits"), Path::new("out"))
            .unwrap_err();
        assert!(matches!(err, CalibError::Io { .. }));
    }
}
