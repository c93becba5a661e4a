//! Exposure metadata extracted from FITS headers.
//!
//! The pairing and stage-gating logic needs five header keywords per
//! exposure: `FILTER`, `IS_PSF`, `PATT_NUM`, `NUMDTHPT`, and `EXP_TYPE`.
//! [`ExposureMeta`] reads them once; everything downstream works on the
//! cached record and never re-opens the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{CalibError, Result};
use crate::header::{Header, HeaderValue};

/// Exposure type marking aperture-masking-interferometry data.
///
/// Only exposures of this type participate in analysis and pairing;
/// target acquisitions (`NIS_TACQ`) and calibration references are
/// excluded entirely.
pub const EXP_TYPE_AMI: &str = "NIS_AMI";

// ============================================================================
// ExposureMeta — the fixed attribute set read from one header
// ============================================================================

/// Metadata for one exposure, read once from its primary header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureMeta {
    /// Filter wheel position (`FILTER`), e.g. `"F480M"`.
    pub filter: String,

    /// Whether this exposure observes a PSF reference star (`IS_PSF`).
    /// `true` marks a calibrator, `false` a science target.
    pub is_psf: bool,

    /// Position number within the dither pattern (`PATT_NUM`).
    pub patt_num: i64,

    /// Total number of points in the dither pattern (`NUMDTHPT`).
    pub num_dither_points: i64,

    /// Exposure type (`EXP_TYPE`), e.g. `"NIS_AMI"` or `"NIS_TACQ"`.
    pub exp_type: String,
}

impl ExposureMeta {
    /// Read the required attribute set from the file at `path`.
    ///
    /// Fails with [`CalibError::MissingAttribute`] when any required
    /// keyword is absent, or [`CalibError::AttributeType`] when one is
    /// present with an unusable type. Read-only.
    pub fn from_file(path: &Path) -> Result<Self> {
        let header = Header::from_file(path)?;
        Self::from_header(path, &header)
    }

    /// Extract the required attribute set from an already-parsed header.
    pub fn from_header(path: &Path, header: &Header) -> Result<Self> {
        Ok(Self {
            filter: require_text(path, header, "FILTER")?,
            is_psf: require_logical(path, header, "IS_PSF")?,
            patt_num: require_integer(path, header, "PATT_NUM")?,
            num_dither_points: require_integer(path, header, "NUMDTHPT")?,
            exp_type: require_text(path, header, "EXP_TYPE")?,
        })
    }

    /// Whether this exposure is interferometric (AMI) data.
    pub fn is_ami(&self) -> bool {
        self.exp_type == EXP_TYPE_AMI
    }
}

fn require<'h>(path: &Path, header: &'h Header, keyword: &str) -> Result<&'h HeaderValue> {
    header
        .get(keyword)
        .ok_or_else(|| CalibError::missing_attribute(path, keyword))
}

fn require_text(path: &Path, header: &Header, keyword: &str) -> Result<String> {
    let value = require(path, header, keyword)?;
    value
        .as_text()
        .map(str::to_string)
        .ok_or_else(|| CalibError::attribute_type(path, keyword, "a string"))
}

fn require_logical(path: &Path, header: &Header, keyword: &str) -> Result<bool> {
    let value = require(path, header, keyword)?;
    value
        .as_logical()
        .ok_or_else(|| CalibError::attribute_type(path, keyword, "a logical"))
}

fn require_integer(path: &Path, header: &Header, keyword: &str) -> Result<i64> {
    let value = require(path, header, keyword)?;
    value
        .as_integer()
        .ok_or_else(|| CalibError::attribute_type(path, keyword, "an integer"))
}

// ============================================================================
// Exposure — a file path with its cached metadata
// ============================================================================

/// One exposure file with its metadata attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exposure {
    /// Path of the exposure file.
    pub path: PathBuf,

    /// Attributes read from the primary header.
    pub meta: ExposureMeta,
}

impl Exposure {
    /// Read an exposure's metadata from disk.
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let meta = ExposureMeta::from_file(&path)?;
        Ok(Self { path, meta })
    }

    /// Build an exposure from already-known metadata.
    pub fn new(path: impl Into<PathBuf>, meta: ExposureMeta) -> Self {
        Self {
            path: path.into(),
            meta,
        }
    }
}

/// Read metadata for every file, failing fast on the first error.
///
/// This is the loading step for explicit pairing: a single exposure with
/// an unreadable or incomplete header makes the whole set unpairable.
pub fn load_exposures<P: AsRef<Path>>(files: &[P]) -> Result<Vec<Exposure>> {
    files
        .iter()
        .map(|f| Exposure::from_file(f.as_ref()))
        .collect()
}
