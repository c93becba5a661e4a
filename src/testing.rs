//! Shared unit-test fixtures: synthesized FITS headers on disk.

use std::path::{Path, PathBuf};

/// Render a minimal FITS header from `(keyword, value)` pairs, with the
/// value text exactly as it would appear after the `= ` indicator.
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

/// The five keywords an exposure header needs, in test-friendly form.
#[derive(Debug, Clone)]
pub struct HeaderSpec {
    pub filter: String,
    pub is_psf: bool,
    pub patt_num: i64,
    pub num_dither_points: i64,
    pub exp_type: String,
}

impl HeaderSpec {
    /// A science-target AMI exposure.
    pub fn target(filter: &str, patt_num: i64, num_dither_points: i64) -> Self {
        Self {
            filter: filter.to_string(),
            is_psf: false,
            patt_num,
            num_dither_points,
            exp_type: crate::exposure::EXP_TYPE_AMI.to_string(),
        }
    }

    /// A PSF-calibrator AMI exposure.
    pub fn psf(filter: &str, patt_num: i64, num_dither_points: i64) -> Self {
        let mut spec = Self::target(filter, patt_num, num_dither_points);
        spec.is_psf = true;
        spec
    }

    pub fn with_exp_type(mut self, exp_type: &str) -> Self {
        self.exp_type = exp_type.to_string();
        self
    }

    fn header_bytes(&self) -> Vec<u8> {
        let filter = format!("'{}'", self.filter);
        let is_psf = if self.is_psf { "T" } else { "F" };
        let patt_num = self.patt_num.to_string();
        let numdthpt = self.num_dither_points.to_string();
        let exp_type = format!("'{}'", self.exp_type);
        fits_header(&[
            ("FILTER", &filter),
            ("IS_PSF", is_psf),
            ("PATT_NUM", &patt_num),
            ("NUMDTHPT", &numdthpt),
            ("EXP_TYPE", &exp_type),
        ])
    }
}

/// Write a header-only exposure file into `dir` and return its path.
pub fn write_exposure(dir: &Path, name: &str, spec: &HeaderSpec) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, spec.header_bytes()).unwrap();
    path
}
