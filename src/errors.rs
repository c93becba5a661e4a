//! Error types for ami_pipeline
//!
//! This module defines the error types used throughout the library.
//! All errors are designed to be informative and actionable: they carry
//! the file path and keyword/token that caused the failure.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CalibError>;

/// Main error type for ami_pipeline
#[derive(Error, Debug)]
pub enum CalibError {
    /// A required header attribute is absent from an exposure's metadata
    #[error("Missing attribute '{keyword}' in header of {path:?}")]
    MissingAttribute { path: PathBuf, keyword: String },

    /// A header attribute is present but has an unusable type
    #[error("Attribute '{keyword}' in header of {path:?} is not {expected}")]
    AttributeType {
        path: PathBuf,
        keyword: String,
        expected: &'static str,
    },

    /// A filename does not follow the `<tokens>_<suffix>.fits` convention
    #[error("Malformed filename '{filename}': {reason}")]
    MalformedFilename { filename: String, reason: String },

    /// A FITS header is structurally invalid (truncated block, missing END)
    #[error("Invalid FITS header in {path:?}: {message}")]
    HeaderParse { path: PathBuf, message: String },

    /// Filesystem failure, annotated with the path that caused it
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external processing stage reported failure
    #[error("Stage '{stage}' failed: {message}")]
    StageFailed { stage: String, message: String },

    /// JSON serialization error
    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl CalibError {
    /// Create a missing attribute error
    pub fn missing_attribute(path: impl Into<PathBuf>, keyword: impl Into<String>) -> Self {
        Self::MissingAttribute {
            path: path.into(),
            keyword: keyword.into(),
        }
    }

    /// Create an attribute type error
    pub fn attribute_type(
        path: impl Into<PathBuf>,
        keyword: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::AttributeType {
            path: path.into(),
            keyword: keyword.into(),
            expected,
        }
    }

    /// Create a malformed filename error
    pub fn malformed_filename(filename: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedFilename {
            filename: filename.into(),
            reason: reason.into(),
        }
    }

    /// Create a header parse error
    pub fn header_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::HeaderParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a stage failure error
    pub fn stage_failed(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StageFailed {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// Annotate an I/O error with the path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if this error indicates a missing header attribute
    /// (the batch cannot be paired when one of these surfaces)
    pub fn is_missing_attribute(&self) -> bool {
        matches!(self, Self::MissingAttribute { .. })
    }

    /// The path this error is about, when it concerns a specific file
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::MissingAttribute { path, .. }
            | Self::AttributeType { path, .. }
            | Self::HeaderParse { path, .. }
            | Self::Io { path, .. } => Some(path),
            Self::MalformedFilename { .. }
            | Self::StageFailed { .. }
            | Self::Serialization { .. } => None,
        }
    }
}

impl From<serde_json::Error> for CalibError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}
