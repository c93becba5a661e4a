//! Per-file and per-pair outcome reporting.
//!
//! A stage never aborts its batch: every file resolves to a tagged
//! [`FileOutcome`], and stage 3's normalization pass likewise records a
//! [`PairOutcome`] per calibration pair. The orchestrator reports
//! partial success without losing completed work; callers inspect the
//! report (or serialize it) to decide the process exit status.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Serialize, Serializer};

use crate::errors::CalibError;
use crate::pairing::CalibPair;

/// What happened to one input file during a stage run.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    /// The stage ran and produced the expected output.
    Produced,

    /// The expected output already existed; the stage was not invoked.
    SkippedExisting,

    /// The exposure's type is not interferometric; analysis does not
    /// apply to it.
    SkippedExpType,

    /// The file failed: a malformed name, an unreadable header, or a
    /// stage error. The rest of the batch is unaffected.
    Failed {
        #[serde(serialize_with = "error_as_string")]
        error: CalibError,
    },
}

impl FileOutcome {
    /// Wrap an error into a failure outcome.
    pub fn failed(error: CalibError) -> Self {
        Self::Failed { error }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn is_produced(&self) -> bool {
        matches!(self, Self::Produced)
    }
}

/// What happened to one calibration pair during normalization.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PairOutcome {
    /// The normalized product was produced.
    Normalized,

    /// Normalization failed for this pair; other pairs are unaffected.
    Failed {
        #[serde(serialize_with = "error_as_string")]
        error: CalibError,
    },
}

impl PairOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

fn error_as_string<S: Serializer>(error: &CalibError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&error.to_string())
}

/// One input file and its outcome.
#[derive(Debug, Serialize)]
pub struct FileReport {
    /// The file as passed to the stage (before suffix normalization).
    pub input: PathBuf,

    #[serde(flatten)]
    pub outcome: FileOutcome,
}

/// One calibration pair and its normalization outcome.
#[derive(Debug, Serialize)]
pub struct PairReport {
    pub target: PathBuf,
    pub calibrator: PathBuf,

    #[serde(flatten)]
    pub outcome: PairOutcome,
}

impl PairReport {
    pub fn new(pair: &CalibPair, outcome: PairOutcome) -> Self {
        Self {
            target: pair.target.clone(),
            calibrator: pair.calibrator.clone(),
            outcome,
        }
    }
}

// ============================================================================
// StageReport — one stage's run over a batch
// ============================================================================

/// Everything recorded about one stage run.
#[derive(Debug, Serialize)]
pub struct StageReport {
    /// Stage name (`"detector1"`, `"image2"`, `"ami3"`).
    pub stage: String,

    /// Per-file outcomes, in input order.
    pub files: Vec<FileReport>,

    /// Per-pair normalization outcomes (stage 3 only; empty otherwise).
    pub pairs: Vec<PairReport>,

    /// Wall-clock time for the whole stage.
    #[serde(rename = "elapsed_ms", serialize_with = "duration_as_millis")]
    pub elapsed: Duration,
}

fn duration_as_millis<S: Serializer>(d: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u128(d.as_millis())
}

impl StageReport {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            files: Vec::new(),
            pairs: Vec::new(),
            elapsed: Duration::ZERO,
        }
    }

    /// Record one file's outcome.
    pub fn record(&mut self, input: impl Into<PathBuf>, outcome: FileOutcome) {
        self.files.push(FileReport {
            input: input.into(),
            outcome,
        });
    }

    /// Number of files the stage actually processed.
    pub fn produced(&self) -> usize {
        self.files.iter().filter(|f| f.outcome.is_produced()).count()
    }

    /// Number of files skipped because their output already existed.
    pub fn skipped_existing(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f.outcome, FileOutcome::SkippedExisting))
            .count()
    }

    /// Whether any file or pair failed.
    pub fn has_failures(&self) -> bool {
        self.files.iter().any(|f| f.outcome.is_failed())
            || self.pairs.iter().any(|p| p.outcome.is_failed())
    }

    /// One-line human summary for the log.
    pub fn summary(&self) -> String {
        let failed = self.files.iter().filter(|f| f.outcome.is_failed()).count();
        let mut line = format!(
            "stage {}: {} produced, {} skipped, {} failed of {} files",
            self.stage,
            self.produced(),
            self.files.len() - self.produced() - failed,
            failed,
            self.files.len(),
        );
        if !self.pairs.is_empty() {
            let pair_failed = self.pairs.iter().filter(|p| p.outcome.is_failed()).count();
            line.push_str(&format!(
                ", {} of {} pairs normalized",
                self.pairs.len() - pair_failed,
                self.pairs.len(),
            ));
        }
        line.push_str(&format!(" in {:.2}s", self.elapsed.as_secs_f64()));
        line
    }
}

/// Reports for a full multi-stage run.
#[derive(Debug, Default, Serialize)]
pub struct PipelineReport {
    pub stages: Vec<StageReport>,
}

impl PipelineReport {
    /// Whether any stage recorded a failure.
    pub fn has_failures(&self) -> bool {
        self.stages.iter().any(StageReport::has_failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let mut report = StageReport::new("detector1");
        report.record("a_0_uncal.fits", FileOutcome::Produced);
        report.record("a_1_uncal.fits", FileOutcome::SkippedExisting);
        report.record(
            "a_2_uncal.fits",
            FileOutcome::failed(CalibError::stage_failed("detector1", "exit status 1")),
        );

        assert_eq!(report.produced(), 1);
        assert_eq!(report.skipped_existing(), 1);
        assert!(report.has_failures());
    }

    #[test]
    fn test_summary_line() {
        let mut report = StageReport::new("ami3");
        report.record("t_calints.fits", FileOutcome::Produced);
        report.record("x_calints.fits", FileOutcome::SkippedExpType);
        report.pairs.push(PairReport::new(
            &CalibPair::new("t_calints.fits", "c_calints.fits"),
            PairOutcome::Normalized,
        ));

        let line = report.summary();
        assert!(line.contains("stage ami3"));
        assert!(line.contains("1 produced"));
        assert!(line.contains("1 of 1 pairs normalized"));
    }

    #[test]
    fn test_report_serializes() {
        let mut report = StageReport::new("image2");
        report.record(
            "a_rateints.fits",
            FileOutcome::failed(CalibError::malformed_filename("a", "no suffix token")),
        );
        report.elapsed = Duration::from_millis(1500);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["stage"], "image2");
        assert_eq!(value["elapsed_ms"], 1500);
        assert_eq!(value["files"][0]["status"], "failed");
        assert!(value["files"][0]["error"]
            .as_str()
            .unwrap()
            .contains("Malformed filename"));
    }

    #[test]
    fn test_pipeline_report_failure_rollup() {
        let mut ok = StageReport::new("detector1");
        ok.record("a_0_uncal.fits", FileOutcome::Produced);
        let mut bad = StageReport::new("image2");
        bad.record(
            "a_0_rateints.fits",
            FileOutcome::failed(CalibError::stage_failed("image2", "exit status 1")),
        );

        let report = PipelineReport {
            stages: vec![ok, bad],
        };
        assert!(report.has_failures());
    }
}
