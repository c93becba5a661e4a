//! Filename transitions between pipeline stages.
//!
//! Pipeline products follow the convention `<tokens>_<suffix>.fits`,
//! where the final underscore-delimited token names the stage that
//! produced the file (`uncal` → `rateints` → `calints` → `ami-oi`).
//! This convention is the sole inter-stage protocol: each stage derives
//! its expected input and output paths from it, and nothing else.
//!
//! Rather than substituting suffix strings in place, a filename is parsed
//! once into an [`ArtifactRef`], an explicit (base identifier, stage tag)
//! pair. Parsing is the only fallible step; rendering any stage's
//! filename from a parsed reference cannot fail.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{CalibError, Result};

// ============================================================================
// StageSuffix — the four stage tags
// ============================================================================

/// The suffix token marking which pipeline stage produced a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StageSuffix {
    /// Raw, uncalibrated exposure (pipeline input).
    Uncal,
    /// Detector-corrected count-rate cube (stage 1 output).
    Rateints,
    /// Image-calibrated cube (stage 2 output).
    Calints,
    /// Interferometric observables (stage 3 analysis output).
    AmiOi,
}

impl StageSuffix {
    /// The filename token for this stage.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uncal => "uncal",
            Self::Rateints => "rateints",
            Self::Calints => "calints",
            Self::AmiOi => "ami-oi",
        }
    }

    /// Parse a filename token into a stage tag.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "uncal" => Some(Self::Uncal),
            "rateints" => Some(Self::Rateints),
            "calints" => Some(Self::Calints),
            "ami-oi" => Some(Self::AmiOi),
            _ => None,
        }
    }
}

impl std::fmt::Display for StageSuffix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ArtifactRef — explicit (base, stage) file identity
// ============================================================================

/// A pipeline artifact identified by base name and stage tag.
///
/// `base` is the underscore-joined prefix of the filename with the
/// directory and the stage token stripped: `"/a/jw001_0001_nis_uncal.fits"`
/// parses to base `"jw001_0001_nis"` at stage [`StageSuffix::Uncal`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef {
    base: String,
    stage: StageSuffix,
}

impl ArtifactRef {
    /// Parse a path into an artifact reference.
    ///
    /// Directory components are ignored. Fails with
    /// [`CalibError::MalformedFilename`] when the filename has no `.fits`
    /// extension, no underscore-delimited suffix token, or an
    /// unrecognized stage token.
    pub fn parse(path: &Path) -> Result<Self> {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                CalibError::malformed_filename(path.display().to_string(), "no filename component")
            })?;

        let stem = filename.strip_suffix(".fits").ok_or_else(|| {
            CalibError::malformed_filename(filename, "expected a '.fits' extension")
        })?;

        let (base, token) = stem.rsplit_once('_').ok_or_else(|| {
            CalibError::malformed_filename(filename, "no underscore-delimited suffix token")
        })?;

        let stage = StageSuffix::from_token(token).ok_or_else(|| {
            CalibError::malformed_filename(
                filename,
                format!("unrecognized stage token '{token}'"),
            )
        })?;

        Ok(Self {
            base: base.to_string(),
            stage,
        })
    }

    /// The base identifier shared by all of this exposure's products.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The stage tag this reference currently carries.
    pub fn stage(&self) -> StageSuffix {
        self.stage
    }

    /// Render the filename this artifact has at `stage`.
    pub fn filename(&self, stage: StageSuffix) -> String {
        format!("{}_{}.fits", self.base, stage.as_str())
    }

    /// Render the path this artifact has at `stage` inside `dir`.
    pub fn path_in(&self, dir: &Path, stage: StageSuffix) -> PathBuf {
        dir.join(self.filename(stage))
    }

    /// The same artifact retagged to another stage.
    pub fn at_stage(&self, stage: StageSuffix) -> Self {
        Self {
            base: self.base.clone(),
            stage,
        }
    }
}

/// Map `path` to the name it has at `stage`, relocated into `outdir`.
///
/// This is the single source of truth for how stages locate their
/// expected inputs and outputs.
pub fn transition(path: &Path, stage: StageSuffix, outdir: &Path) -> Result<PathBuf> {
    Ok(ArtifactRef::parse(path)?.path_in(outdir, stage))
}
