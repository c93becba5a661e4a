//! Collaborator trait definitions for the pipeline.
//!
//! The orchestration core never performs detector correction, image
//! calibration, fringe extraction, or normalization itself; those live
//! behind these traits. Implementations are statically dispatched; the
//! runner is generic over them, so tests compose mock stages with zero
//! indirection.

use std::path::Path;

use crate::errors::Result;
use crate::naming::StageSuffix;

/// One exposure-processing stage of the external suite.
///
/// # Contract
///
/// - **Input**: one exposure file carrying this stage's input suffix,
///   plus the output directory.
/// - **Output**: the stage leaves `<base>_<output-suffix>.fits` in the
///   output directory (the suffix substitution is the inter-stage
///   protocol; a stage that writes elsewhere breaks the pipeline).
/// - **Errors**: any failure is returned as-is; the runner records it
///   against the file and moves on. The stage must not be invoked for a
///   file whose expected output already exists; the runner enforces
///   this, implementations need not check.
pub trait ExposureStage {
    /// Short stage name used in logs and reports (e.g. `"detector1"`).
    fn name(&self) -> &'static str;

    /// The suffix this stage expects on its input files.
    fn input_stage(&self) -> StageSuffix;

    /// The suffix this stage's primary product carries.
    fn output_stage(&self) -> StageSuffix;

    /// Run one exposure through the stage, writing products to `outdir`.
    fn process(&self, input: &Path, outdir: &Path) -> Result<()>;
}

/// The per-pair normalization step of stage 3.
///
/// # Contract
///
/// - **Input**: the target's and the calibrator's `ami-oi` product
///   paths, plus the output directory.
/// - **Output**: one normalized product in the output directory; its
///   naming is the implementation's concern.
/// - **Errors**: returned as-is; the runner records them per pair.
pub trait PairNormalizer {
    /// Normalize one target product against one calibrator product.
    fn normalize(&self, target_oi: &Path, calib_oi: &Path, outdir: &Path) -> Result<()>;
}

impl<T: ExposureStage + ?Sized> ExposureStage for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn input_stage(&self) -> StageSuffix {
        (**self).input_stage()
    }

    fn output_stage(&self) -> StageSuffix {
        (**self).output_stage()
    }

    fn process(&self, input: &Path, outdir: &Path) -> Result<()> {
        (**self).process(input, outdir)
    }
}

impl<T: PairNormalizer + ?Sized> PairNormalizer for &T {
    fn normalize(&self, target_oi: &Path, calib_oi: &Path, outdir: &Path) -> Result<()> {
        (**self).normalize(target_oi, calib_oi, outdir)
    }
}
