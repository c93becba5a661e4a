//! Pipeline runner — stage sequencing, idempotency, and pairing.
//!
//! [`AmiPipeline`] holds one collaborator per stage and executes them in
//! order over a batch of exposure files, sharing a single flat output
//! directory: stage N writes its products there and stage N+1 finds its
//! inputs there by suffix substitution.
//!
//! # Per-file behavior
//!
//! Every file is handled independently:
//!
//! - its suffix is normalized to the stage's expected input via
//!   [`ArtifactRef`] (a batch may mix suffixes freely);
//! - if its expected output already exists in the output directory, the
//!   collaborator is not invoked (re-runs are idempotent);
//! - a failure (malformed name, unreadable header, stage error) is
//!   recorded against that file and the batch continues.
//!
//! # Static dispatch
//!
//! `AmiPipeline` is generic over all four collaborator types, so mock
//! stages in tests and subprocess stages in the binary compose without
//! trait objects.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info, warn};

use crate::errors::{CalibError, Result};
use crate::exposure::{Exposure, ExposureMeta};
use crate::naming::{transition, ArtifactRef, StageSuffix};
use crate::pairing::make_pairs;
use crate::pipeline::report::{
    FileOutcome, PairOutcome, PairReport, PipelineReport, StageReport,
};
use crate::pipeline::traits::{ExposureStage, PairNormalizer};

/// Enter a tracing span for a pipeline stage (when the `tracing` feature
/// is enabled). When disabled, this is a no-op and the compiler
/// eliminates it.
macro_rules! trace_stage {
    ($name:expr) => {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("pipeline_stage", stage = $name).entered();
    };
}

// ============================================================================
// AmiPipeline — statically-composed stage container
// ============================================================================

/// The three-stage AMI pipeline plus the per-pair normalizer.
///
/// | Param | Trait | Role |
/// |-------|-------|------|
/// | `D` | [`ExposureStage`] | detector correction (`uncal` → `rateints`) |
/// | `I` | [`ExposureStage`] | image calibration (`rateints` → `calints`) |
/// | `A` | [`ExposureStage`] | interferometric analysis (`calints` → `ami-oi`) |
/// | `N` | [`PairNormalizer`] | per-pair normalization of `ami-oi` products |
#[derive(Debug, Clone)]
pub struct AmiPipeline<D, I, A, N> {
    pub detector: D,
    pub image: I,
    pub analyze: A,
    pub normalize: N,
}

impl<D, I, A, N> AmiPipeline<D, I, A, N>
where
    D: ExposureStage,
    I: ExposureStage,
    A: ExposureStage,
    N: PairNormalizer,
{
    /// Compose a pipeline from its four collaborators.
    pub fn new(detector: D, image: I, analyze: A, normalize: N) -> Self {
        Self {
            detector,
            image,
            analyze,
            normalize,
        }
    }

    /// Run the detector-correction stage over `files`.
    pub fn run_detector1<P: AsRef<Path>>(&self, files: &[P], outdir: &Path) -> Result<StageReport> {
        trace_stage!("detector1");
        run_exposure_stage(&self.detector, files, outdir)
    }

    /// Run the image-calibration stage over `files`.
    pub fn run_image2<P: AsRef<Path>>(&self, files: &[P], outdir: &Path) -> Result<StageReport> {
        trace_stage!("image2");
        run_exposure_stage(&self.image, files, outdir)
    }

    /// Run the interferometric-analysis stage over `files`, then build
    /// calibration pairs and normalize each one.
    ///
    /// Exposures whose `EXP_TYPE` is not interferometric are skipped
    /// (target acquisitions must not be analyzed) and excluded from
    /// pairing. Pairing runs over the exposures whose `ami-oi` product
    /// is available: freshly produced or already present from an
    /// earlier run.
    ///
    /// `calib_pairs` optionally names an externally supplied pairing
    /// file; its format is not yet specified, so it is warned about and
    /// pairs are computed from headers instead.
    pub fn run_ami3<P: AsRef<Path>>(
        &self,
        files: &[P],
        outdir: &Path,
        calib_pairs: Option<&Path>,
    ) -> Result<StageReport> {
        trace_stage!("ami3");
        ensure_outdir(outdir)?;
        let started = Instant::now();
        let mut report = StageReport::new(self.analyze.name());
        let mut eligible: Vec<Exposure> = Vec::new();

        for file in files {
            let file = file.as_ref();
            let outcome = self.analyze_one(file, outdir, &mut eligible);
            report.record(file, outcome);
        }

        if let Some(pairs_file) = calib_pairs {
            warn!(
                "external calibration pair file {} is not yet supported; \
                 computing pairs from exposure headers instead",
                pairs_file.display()
            );
        }
        let pairs = make_pairs(&eligible);
        info!("normalizing {} calibration pair(s)", pairs.len());
        for pair in &pairs {
            let outcome = self.normalize_pair(pair, outdir);
            report.pairs.push(PairReport::new(pair, outcome));
        }

        report.elapsed = started.elapsed();
        info!("{}", report.summary());
        Ok(report)
    }

    /// Run all three stages in sequence over `files`.
    ///
    /// The same input references are passed to every stage; per-file
    /// suffix normalization resolves them to the previous stage's
    /// products in `outdir`. Inputs that do not carry the `uncal` suffix
    /// are warned about but still processed.
    pub fn run_all<P: AsRef<Path>>(
        &self,
        files: &[P],
        outdir: &Path,
        calib_pairs: Option<&Path>,
    ) -> Result<PipelineReport> {
        for file in files {
            let file = file.as_ref();
            if let Ok(artifact) = ArtifactRef::parse(file) {
                if artifact.stage() != StageSuffix::Uncal {
                    warn!(
                        "input {} carries the '{}' suffix, not 'uncal'",
                        file.display(),
                        artifact.stage()
                    );
                }
            }
        }

        let mut pipeline_report = PipelineReport::default();
        pipeline_report.stages.push(self.run_detector1(files, outdir)?);
        pipeline_report.stages.push(self.run_image2(files, outdir)?);
        pipeline_report
            .stages
            .push(self.run_ami3(files, outdir, calib_pairs)?);
        Ok(pipeline_report)
    }

    /// Analyze one file; on success (or an already-present product) add
    /// it to the pairing candidates.
    fn analyze_one(
        &self,
        file: &Path,
        outdir: &Path,
        eligible: &mut Vec<Exposure>,
    ) -> FileOutcome {
        let artifact = match ArtifactRef::parse(file) {
            Ok(artifact) => artifact,
            Err(e) => return FileOutcome::failed(e),
        };
        let input = resolve_input(file, &artifact, self.analyze.input_stage(), outdir);

        let meta = match ExposureMeta::from_file(&input) {
            Ok(meta) => meta,
            Err(e) => return FileOutcome::failed(e),
        };
        if !meta.is_ami() {
            debug!(
                "skipping {}: EXP_TYPE '{}' is not interferometric",
                input.display(),
                meta.exp_type
            );
            return FileOutcome::SkippedExpType;
        }

        let output = artifact.path_in(outdir, self.analyze.output_stage());
        if output.exists() {
            debug!("skipping {}: {} already exists", input.display(), output.display());
            eligible.push(Exposure::new(input, meta));
            return FileOutcome::SkippedExisting;
        }
        match self.analyze.process(&input, outdir) {
            Ok(()) => {
                eligible.push(Exposure::new(input, meta));
                FileOutcome::Produced
            }
            Err(e) => FileOutcome::failed(e),
        }
    }

    /// Normalize one pair, mapping both sides to their `ami-oi` products.
    fn normalize_pair(&self, pair: &crate::pairing::CalibPair, outdir: &Path) -> PairOutcome {
        let target_oi = match transition(&pair.target, StageSuffix::AmiOi, outdir) {
            Ok(p) => p,
            Err(error) => return PairOutcome::Failed { error },
        };
        let calib_oi = match transition(&pair.calibrator, StageSuffix::AmiOi, outdir) {
            Ok(p) => p,
            Err(error) => return PairOutcome::Failed { error },
        };
        match self.normalize.normalize(&target_oi, &calib_oi, outdir) {
            Ok(()) => PairOutcome::Normalized,
            Err(error) => PairOutcome::Failed { error },
        }
    }
}

// ============================================================================
// Shared stage mechanics
// ============================================================================

/// Run one exposure stage over a batch, one file at a time.
fn run_exposure_stage<S: ExposureStage, P: AsRef<Path>>(
    stage: &S,
    files: &[P],
    outdir: &Path,
) -> Result<StageReport> {
    ensure_outdir(outdir)?;
    let started = Instant::now();
    let mut report = StageReport::new(stage.name());

    for file in files {
        let file = file.as_ref();
        let outcome = process_one(stage, file, outdir);
        report.record(file, outcome);
    }

    report.elapsed = started.elapsed();
    info!("{}", report.summary());
    Ok(report)
}

/// Resolve, check, and (when needed) delegate one file.
fn process_one<S: ExposureStage>(stage: &S, file: &Path, outdir: &Path) -> FileOutcome {
    let artifact = match ArtifactRef::parse(file) {
        Ok(artifact) => artifact,
        Err(e) => return FileOutcome::failed(e),
    };
    let input = resolve_input(file, &artifact, stage.input_stage(), outdir);

    let output = artifact.path_in(outdir, stage.output_stage());
    if output.exists() {
        debug!("skipping {}: {} already exists", input.display(), output.display());
        return FileOutcome::SkippedExisting;
    }
    match stage.process(&input, outdir) {
        Ok(()) => FileOutcome::Produced,
        Err(e) => FileOutcome::failed(e),
    }
}

/// The path a stage should read for `file`: the file itself when it
/// already carries the expected suffix, else the expected-suffix name in
/// the output directory (where the prior stage left it).
fn resolve_input(
    file: &Path,
    artifact: &ArtifactRef,
    expected: StageSuffix,
    outdir: &Path,
) -> PathBuf {
    if artifact.stage() == expected {
        file.to_path_buf()
    } else {
        let resolved = artifact.path_in(outdir, expected);
        debug!(
            "remapping {} to expected '{}' input {}",
            file.display(),
            expected,
            resolved.display()
        );
        resolved
    }
}

fn ensure_outdir(outdir: &Path) -> Result<()> {
    fs::create_dir_all(outdir).map_err(|e| CalibError::io(outdir, e))
}
