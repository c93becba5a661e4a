//! Shared fixtures for integration tests: synthesized exposure files and
//! collaborator doubles.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use ami_pipeline::{transition, CalibError, ExposureStage, PairNormalizer, Result, StageSuffix};

/// Render a minimal FITS header from `(keyword, value)` pairs.
pub fn fits_header(cards: &[(&str, &str)]) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut push_card = |text: &str| {
        let mut card = text.as_bytes().to_vec();
        assert!(card.len() <= 80, "card too long: {text}");
        card.resize(80, b' ');
        bytes.extend_from_slice(&card);
    };
    push_card("SIMPLE  =                    T");
    for (keyword, value) in cards {
        push_card(&format!("{keyword:<8}= {value}"));
    }
    push_card("END");
    while bytes.len() % 2880 != 0 {
        bytes.push(b' ');
    }
    bytes
}

/// Write a header-only exposure file and return its path.
pub fn write_exposure(
    dir: &Path,
    name: &str,
    filter: &str,
    is_psf: bool,
    patt_num: i64,
    num_dither_points: i64,
    exp_type: &str,
) -> PathBuf {
    let path = dir.join(name);
    let filter = format!("'{filter}'");
    let exp_type = format!("'{exp_type}'");
    let bytes = fits_header(&[
        ("FILTER", filter.as_str()),
        ("IS_PSF", if is_psf { "T" } else { "F" }),
        ("PATT_NUM", &patt_num.to_string()),
        ("NUMDTHPT", &num_dither_points.to_string()),
        ("EXP_TYPE", exp_type.as_str()),
    ]);
    fs::write(&path, bytes).unwrap();
    path
}

/// Stage double that copies its input to the output name, so headers
/// survive into later stages the way real products carry theirs.
pub struct CopyStage {
    name: &'static str,
    input: StageSuffix,
    output: StageSuffix,
    pub calls: RefCell<Vec<PathBuf>>,
}

impl CopyStage {
    pub fn new(name: &'static str, input: StageSuffix, output: StageSuffix) -> Self {
        Self {
            name,
            input,
            output,
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn detector1() -> Self {
        Self::new("detector1", StageSuffix::Uncal, StageSuffix::Rateints)
    }

    pub fn image2() -> Self {
        Self::new("image2", StageSuffix::Rateints, StageSuffix::Calints)
    }

    pub fn ami3() -> Self {
        Self::new("ami3", StageSuffix::Calints, StageSuffix::AmiOi)
    }

    pub fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl ExposureStage for CopyStage {
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
        self.calls.borrow_mut().push(input.to_path_buf());
        let output = transition(input, self.output, outdir)?;
        fs::copy(input, &output).map_err(|e| CalibError::io(input, e))?;
        Ok(())
    }
}

/// Normalizer double that records pairs and writes a marker product.
#[derive(Default)]
pub struct RecordingNormalizer {
    pub calls: RefCell<Vec<(PathBuf, PathBuf)>>,
}

impl PairNormalizer for RecordingNormalizer {
    fn normalize(&self, target_oi: &Path, calib_oi: &Path, outdir: &Path) -> Result<()> {
        self.calls
            .borrow_mut()
            .push((target_oi.to_path_buf(), calib_oi.to_path_buf()));
        let stem = target_oi.file_stem().unwrap().to_string_lossy();
        let marker = outdir.join(format!("{stem}-norm.fits"));
        fs::write(&marker, b"").map_err(|e| CalibError::io(&marker, e))?;
        Ok(())
    }
}
