//! Calibration pair matching.
//!
//! Stage 3 normalizes each science target against a PSF reference star.
//! A valid pair is a (target, calibrator) tuple where both exposures are
//! interferometric, the target's `IS_PSF` is false, the calibrator's is
//! true, and both share the same filter, dither-pattern position, and
//! dither-point count.
//!
//! Matching is exhaustive and directional: every calibrator that matches
//! a target yields its own pair, and pairs are emitted in input order
//! (outer loop over targets, inner loop over calibrators), so the result
//! is deterministic for a given input ordering. Exposures whose
//! `EXP_TYPE` is not interferometric never participate, on either side.

use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::exposure::{load_exposures, Exposure};

/// One (target, calibrator) pairing of exposure files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalibPair {
    /// The science-target exposure.
    pub target: PathBuf,

    /// The PSF-calibrator exposure.
    pub calibrator: PathBuf,
}

impl CalibPair {
    pub fn new(target: impl Into<PathBuf>, calibrator: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
            calibrator: calibrator.into(),
        }
    }
}

/// Match targets with calibrators over already-read metadata.
///
/// Non-interferometric exposures are dropped before matching; an input
/// with no PSF exposures yields an empty set, not an error. Metadata is
/// taken from the [`Exposure`] records as given; nothing is re-read
/// from disk.
pub fn make_pairs(exposures: &[Exposure]) -> Vec<CalibPair> {
    let ami: Vec<&Exposure> = exposures.iter().filter(|e| e.meta.is_ami()).collect();

    let mut pairs = Vec::new();
    for target in ami.iter().filter(|e| !e.meta.is_psf) {
        for cal in ami.iter().filter(|e| e.meta.is_psf) {
            if target.meta.filter == cal.meta.filter
                && target.meta.patt_num == cal.meta.patt_num
                && target.meta.num_dither_points == cal.meta.num_dither_points
            {
                info!(
                    "targ: {} cal: {}",
                    basename(&target.path),
                    basename(&cal.path)
                );
                pairs.push(CalibPair::new(&target.path, &cal.path));
            }
        }
    }
    pairs
}

/// Read metadata for `files` (once per file) and match pairs.
///
/// Fails fast if any file's header is unreadable or missing a required
/// attribute; pairing cannot proceed over incomplete metadata.
pub fn make_pairs_from_files<P: AsRef<Path>>(files: &[P]) -> Result<Vec<CalibPair>> {
    Ok(make_pairs(&load_exposures(files)?))
}

fn basename(path: &Path) -> std::borrow::Cow<'_, str> {
    path.file_name().map_or_else(
        || path.to_string_lossy(),
        |name| name.to_string_lossy(),
    )
}
