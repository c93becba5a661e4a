//! Minimal read-only FITS primary-header reader.
//!
//! A FITS header is a sequence of 2880-byte blocks, each holding 36
//! eighty-byte ASCII "cards". A card carries an 8-character keyword,
//! an optional value indicator (`= ` in columns 9-10), a value, and an
//! optional `/ comment`. The header ends at the `END` card.
//!
//! Only the primary header is parsed; data units are never read. This is
//! deliberately the smallest reader that can serve the exposure metadata
//! keywords; it is not a general FITS library.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use rustc_hash::FxHashMap;

use crate::errors::{CalibError, Result};

/// Bytes per FITS header block.
const BLOCK_SIZE: usize = 2880;

/// Bytes per header card.
const CARD_SIZE: usize = 80;

// ============================================================================
// HeaderValue — typed card values
// ============================================================================

/// A parsed FITS card value.
#[derive(Debug, Clone, PartialEq)]
pub enum HeaderValue {
    /// Logical constant, written `T` or `F`.
    Logical(bool),
    /// Integer constant.
    Integer(i64),
    /// Floating-point constant (including `D` exponent notation).
    Real(f64),
    /// Character string, written between single quotes.
    Text(String),
    /// A value indicator with an empty value field.
    Undefined,
}

impl HeaderValue {
    /// Interpret as a logical, if it is one.
    pub fn as_logical(&self) -> Option<bool> {
        match self {
            Self::Logical(b) => Some(*b),
            _ => None,
        }
    }

    /// Interpret as an integer, if it is one.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Interpret as a real; integers coerce.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Self::Real(r) => Some(*r),
            Self::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Interpret as a string, if it is one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Name of the value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Logical(_) => "a logical",
            Self::Integer(_) => "an integer",
            Self::Real(_) => "a real",
            Self::Text(_) => "a string",
            Self::Undefined => "undefined",
        }
    }
}

// ============================================================================
// Header — keyword → value map for one primary header
// ============================================================================

/// The primary header of one FITS file.
///
/// Commentary cards (`COMMENT`, `HISTORY`, blank keyword) and cards
/// without a value indicator are skipped. When a keyword repeats, the
/// last occurrence wins.
#[derive(Debug, Clone, Default)]
pub struct Header {
    cards: FxHashMap<String, HeaderValue>,
}

impl Header {
    /// Read and parse the primary header of the file at `path`.
    ///
    /// Blocks are read one at a time until the `END` card; the data unit
    /// is never touched. Fails with [`CalibError::HeaderParse`] when the
    /// file ends before `END` or a block is truncated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| CalibError::io(path, e))?;
        let mut cards = FxHashMap::default();
        let mut block = [0u8; BLOCK_SIZE];

        loop {
            if let Err(e) = file.read_exact(&mut block) {
                return Err(match e.kind() {
                    std::io::ErrorKind::UnexpectedEof => CalibError::header_parse(
                        path,
                        "header ended before END card (truncated block)",
                    ),
                    _ => CalibError::io(path, e),
                });
            }
            if parse_block(&block, &mut cards) {
                return Ok(Self { cards });
            }
        }
    }

    /// Parse a header from an in-memory byte buffer.
    ///
    /// `path` is used only to annotate errors.
    pub fn from_bytes(path: &Path, bytes: &[u8]) -> Result<Self> {
        let mut cards = FxHashMap::default();
        for block in bytes.chunks(BLOCK_SIZE) {
            if block.len() < BLOCK_SIZE {
                return Err(CalibError::header_parse(
                    path,
                    format!("truncated header block ({} of {BLOCK_SIZE} bytes)", block.len()),
                ));
            }
            if parse_block(block, &mut cards) {
                return Ok(Self { cards });
            }
        }
        Err(CalibError::header_parse(
            path,
            "header ended before END card",
        ))
    }

    /// Look up a keyword's value.
    pub fn get(&self, keyword: &str) -> Option<&HeaderValue> {
        self.cards.get(keyword)
    }

    /// Check whether a keyword is present.
    pub fn contains(&self, keyword: &str) -> bool {
        self.cards.contains_key(keyword)
    }

    /// Number of value-carrying cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if no value-carrying cards were found.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Parse one 2880-byte block into `cards`. Returns `true` once the `END`
/// card has been seen.
fn parse_block(block: &[u8], cards: &mut FxHashMap<String, HeaderValue>) -> bool {
    for card in block.chunks(CARD_SIZE) {
        let keyword = std::str::from_utf8(&card[..8])
            .map(str::trim_end)
            .unwrap_or("");
        if keyword == "END" {
            return true;
        }
        if keyword.is_empty() || keyword == "COMMENT" || keyword == "HISTORY" {
            continue;
        }
        // Cards without the value indicator carry no parseable value.
        if &card[8..10] != b"= " {
            continue;
        }
        let field = String::from_utf8_lossy(&card[10..]);
        cards.insert(keyword.to_string(), parse_value(&field));
    }
    false
}

/// Parse the value field of a card (everything after `= `).
fn parse_value(field: &str) -> HeaderValue {
    let trimmed = field.trim_start();

    // Character string: quote-delimited, '' escapes a literal quote,
    // trailing blanks inside the quotes are insignificant.
    if let Some(rest) = trimmed.strip_prefix('\'') {
        let mut text = String::new();
        let mut chars = rest.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    text.push('\'');
                } else {
                    break;
                }
            } else {
                text.push(c);
            }
        }
        return HeaderValue::Text(text.trim_end().to_string());
    }

    // Non-string values end at the comment separator.
    let value = trimmed.split('/').next().unwrap_or("").trim();
    if value.is_empty() {
        return HeaderValue::Undefined;
    }
    match value {
        "T" => return HeaderValue::Logical(true),
        "F" => return HeaderValue::Logical(false),
        _ => {}
    }
    if let Ok(i) = value.parse::<i64>() {
        return HeaderValue::Integer(i);
    }
    // Fortran-style D exponents appear in older headers.
    if let Ok(r) = value.replace(['D', 'd'], "E").parse::<f64>() {
        return HeaderValue::Real(r);
    }
    HeaderValue::Text(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Render one 80-byte card from its text prefix.
    fn card(text: &str) -> Vec<u8> {
        let mut bytes = text.as_bytes().to_vec();
        assert!(bytes.len() <= CARD_SIZE);
        bytes.resize(CARD_SIZE, b' ');
        bytes
    }

    /// Assemble cards (plus END) into padded 2880-byte blocks.
    fn header_bytes(cards: &[&str]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for c in cards {
            bytes.extend_from_slice(&card(c));
        }
        bytes.extend_from_slice(&card("END"));
        while bytes.len() % BLOCK_SIZE != 0 {
            bytes.push(b' ');
        }
        bytes
    }

    fn parse(cards: &[&str]) -> Header {
        Header::from_bytes(Path::new("test.fits"), &header_bytes(cards)).unwrap()
    }

    #[test]
    fn test_string_value() {
        let hdr = parse(&["FILTER  = 'F480M   '           / filter wheel position"]);
        assert_eq!(hdr.get("FILTER").unwrap().as_text(), Some("F480M"));
    }

    #[test]
    fn test_string_quote_escape() {
        let hdr = parse(&["OBSERVER= 'O''BRIEN'"]);
        assert_eq!(hdr.get("OBSERVER").unwrap().as_text(), Some("O'BRIEN"));
    }

    #[test]
    fn test_logical_values() {
        let hdr = parse(&["IS_PSF  =                    T", "SUBARRAY=                    F"]);
        assert_eq!(hdr.get("IS_PSF").unwrap().as_logical(), Some(true));
        assert_eq!(hdr.get("SUBARRAY").unwrap().as_logical(), Some(false));
    }

    #[test]
    fn test_integer_value() {
        let hdr = parse(&["PATT_NUM=                    3 / position number in pattern"]);
        assert_eq!(hdr.get("PATT_NUM").unwrap().as_integer(), Some(3));
    }

    #[test]
    fn test_real_value() {
        let hdr = parse(&["EXPTIME =              12.5E1", "OLDVAL  =            1.25D2"]);
        assert_eq!(hdr.get("EXPTIME").unwrap().as_real(), Some(125.0));
        assert_eq!(hdr.get("OLDVAL").unwrap().as_real(), Some(125.0));
    }

    #[test]
    fn test_integer_coerces_to_real() {
        let hdr = parse(&["NUMDTHPT=                    4"]);
        assert_eq!(hdr.get("NUMDTHPT").unwrap().as_real(), Some(4.0));
        assert_eq!(hdr.get("NUMDTHPT").unwrap().as_integer(), Some(4));
    }

    #[test]
    fn test_undefined_value() {
        let hdr = parse(&["BLANKVAL=                      / no value given"]);
        assert_eq!(hdr.get("BLANKVAL"), Some(&HeaderValue::Undefined));
    }

    #[test]
    fn test_commentary_cards_skipped() {
        let hdr = parse(&[
            "COMMENT this card has no value",
            "HISTORY reprocessed twice",
            "SIMPLE  =                    T",
        ]);
        assert!(!hdr.contains("COMMENT"));
        assert!(!hdr.contains("HISTORY"));
        assert_eq!(hdr.len(), 1);
    }

    #[test]
    fn test_card_without_value_indicator_skipped() {
        let hdr = parse(&["DATASUM   not actually a value"]);
        assert!(!hdr.contains("DATASUM"));
    }

    #[test]
    fn test_last_duplicate_wins() {
        let hdr = parse(&["PATT_NUM=                    1", "PATT_NUM=                    2"]);
        assert_eq!(hdr.get("PATT_NUM").unwrap().as_integer(), Some(2));
    }

    #[test]
    fn test_end_in_second_block() {
        // 36 value cards fill block one; END lands in block two.
        let names: Vec<String> = (0..36).map(|i| format!("KEY{i:<5}=                    {i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let hdr = parse(&refs);
        assert_eq!(hdr.len(), 36);
        assert_eq!(hdr.get("KEY35").unwrap().as_integer(), Some(35));
    }

    #[test]
    fn test_missing_end_is_error() {
        let mut bytes = card("SIMPLE  =                    T");
        bytes.resize(BLOCK_SIZE, b' ');
        let err = Header::from_bytes(Path::new("bad.fits"), &bytes).unwrap_err();
        assert!(err.to_string().contains("END"));
    }

    #[test]
    fn test_truncated_block_is_error() {
        let bytes = card("SIMPLE  =                    T");
        let err = Header::from_bytes(Path::new("bad.fits"), &bytes).unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn test_from_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jw_uncal.fits");
        std::fs::write(&path, header_bytes(&["IS_PSF  =                    F"])).unwrap();
        let hdr = Header::from_file(&path).unwrap();
        assert_eq!(hdr.get("IS_PSF").unwrap().as_logical(), Some(false));
    }

    #[test]
    fn test_from_file_missing_is_io_error() {
        let err = Header::from_file(Path::new("/nonexistent/x_uncal.fits")).unwrap_err();
        assert!(matches!(err, CalibError::Io { .. }));
    }
}
