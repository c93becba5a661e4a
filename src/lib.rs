//! # ami_pipeline
//!
//! Stage orchestration and calibration-pair matching for NIRISS
//! aperture-masking-interferometry (AMI) exposures.
//!
//! The crate sequences three processing stages over a batch of exposure
//! files: detector correction (`uncal` → `rateints`), image calibration
//! (`rateints` → `calints`), and interferometric analysis (`calints` →
//! `ami-oi`). It then matches science targets with PSF calibrators and
//! normalizes each pair. The numerical stages themselves live behind the
//! collaborator traits in [`pipeline::traits`]; this crate owns the
//! sequencing, the filename convention, idempotent re-runs, and the
//! pairing algorithm.
//!
//! ## Features
//!
//! - **Idempotent**: a stage never re-processes a file whose expected
//!   output already exists in the output directory
//! - **Isolating**: one file's failure is recorded and the batch
//!   continues; reports carry a tagged outcome per file and per pair
//! - **Deterministic**: pairing is exhaustive and ordered by the input
//!   list, never by directory enumeration

pub mod errors;
pub mod exposure;
pub mod header;
pub mod naming;
pub mod pairing;
pub mod pipeline;
pub mod process;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use errors::{CalibError, Result};
pub use exposure::{load_exposures, Exposure, ExposureMeta, EXP_TYPE_AMI};
pub use naming::{transition, ArtifactRef, StageSuffix};
pub use pairing::{make_pairs, make_pairs_from_files, CalibPair};

// Re-export main functionality
pub use pipeline::config::{AnalyzeConfig, DetectorConfig, ImageConfig, NormalizeConfig};
pub use pipeline::report::{FileOutcome, PairOutcome, PipelineReport, StageReport};
pub use pipeline::runner::AmiPipeline;
pub use pipeline::traits::{ExposureStage, PairNormalizer};
pub use process::{StrunNormalize, StrunStage, SubprocessPipeline};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
