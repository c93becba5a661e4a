//! Per-stage configuration records.
//!
//! Each stage takes an immutable configuration value; there is no
//! mutable settings object shared between invocations. Defaults match
//! the operational AMI reduction setup: IPC and persistence corrections
//! off in detector processing, photometric calibration and resampling
//! off in image processing, five-fold oversampling in the analysis.
//!
//! All records are serde round-trippable so a run's configuration can be
//! captured alongside its report.

use serde::{Deserialize, Serialize};

/// Configuration for the detector-correction stage (stage 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Skip the interpixel-capacitance correction sub-step.
    pub skip_ipc: bool,

    /// Skip the persistence correction sub-step.
    pub skip_persistence: bool,

    /// Also save the calibrated ramp product.
    pub save_calibrated_ramp: bool,

    /// Ask the stage to save its results to the output directory.
    pub save_results: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            skip_ipc: true,
            skip_persistence: true,
            save_calibrated_ramp: true,
            save_results: true,
        }
    }
}

impl DetectorConfig {
    /// Set whether the IPC sub-step is skipped.
    pub fn with_skip_ipc(mut self, skip: bool) -> Self {
        self.skip_ipc = skip;
        self
    }

    /// Set whether the persistence sub-step is skipped.
    pub fn with_skip_persistence(mut self, skip: bool) -> Self {
        self.skip_persistence = skip;
        self
    }

    /// Set whether the calibrated ramp is saved.
    pub fn with_save_calibrated_ramp(mut self, save: bool) -> Self {
        self.save_calibrated_ramp = save;
        self
    }
}

/// Configuration for the image-calibration stage (stage 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Skip the photometric-calibration sub-step.
    pub skip_photom: bool,

    /// Skip the resampling sub-step.
    pub skip_resample: bool,

    /// Ask the stage to save its results to the output directory.
    pub save_results: bool,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            skip_photom: true,
            skip_resample: true,
            save_results: true,
        }
    }
}

impl ImageConfig {
    /// Set whether the photometric sub-step is skipped.
    pub fn with_skip_photom(mut self, skip: bool) -> Self {
        self.skip_photom = skip;
        self
    }

    /// Set whether the resampling sub-step is skipped.
    pub fn with_skip_resample(mut self, skip: bool) -> Self {
        self.skip_resample = skip;
        self
    }
}

/// Configuration for the interferometric-analysis stage (stage 3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyzeConfig {
    /// Fringe-fitting oversampling factor.
    pub oversample: u32,

    /// Analyze only the first N integrations, when set.
    pub first_few: Option<u32>,

    /// Apply the bad-pixel map during fringe fitting.
    pub use_bad_pixel_map: bool,

    /// Run the bad-pixel-fix pre-step.
    pub run_bpfix: bool,

    /// Ask the stage to save its results to the output directory.
    pub save_results: bool,
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        Self {
            oversample: 5,
            first_few: None,
            use_bad_pixel_map: false,
            run_bpfix: true,
            save_results: true,
        }
    }
}

impl AnalyzeConfig {
    /// Set the oversampling factor.
    pub fn with_oversample(mut self, oversample: u32) -> Self {
        self.oversample = oversample;
        self
    }

    /// Restrict analysis to the first N integrations.
    pub fn with_first_few(mut self, n: u32) -> Self {
        self.first_few = Some(n);
        self
    }

    /// Set whether the bad-pixel map is applied.
    pub fn with_use_bad_pixel_map(mut self, use_map: bool) -> Self {
        self.use_bad_pixel_map = use_map;
        self
    }

    /// Set whether the bad-pixel-fix pre-step runs.
    pub fn with_run_bpfix(mut self, run: bool) -> Self {
        self.run_bpfix = run;
        self
    }
}

/// Configuration for the per-pair normalization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeConfig {
    /// Ask the step to save its results to the output directory.
    pub save_results: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self { save_results: true }
    }
}
