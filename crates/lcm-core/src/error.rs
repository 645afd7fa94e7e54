//! Error types for latent class posterior inference.
//!
//! Every failure is raised synchronously at the point of detection and
//! carries a stable numeric code plus a category:
//!
//! - 10-19: model structure (`ValidationError`)
//! - 20-29: indicator / target selection (`ConfigurationError`)
//! - 30-39: subject data (missing indicator, missing value, bad observation)
//! - 40-49: numerical failures (degenerate likelihood, bad label scale)
//! - 50-59: engine configuration files
//! - 60-69: I/O and serialization
//!
//! Subject-local errors name the subject by index and identifier so callers
//! can drop, re-impute or abort on their own terms.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::naming::Axis;

/// Result type alias for inference operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Structural problems in the fitted model.
    Model,
    /// Bad indicator or target-class selection.
    Selection,
    /// A single subject's record is unusable.
    Subject,
    /// Numerical failures during normalization.
    Numerical,
    /// Engine configuration errors.
    Config,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Model => write!(f, "model"),
            ErrorCategory::Selection => write!(f, "selection"),
            ErrorCategory::Subject => write!(f, "subject"),
            ErrorCategory::Numerical => write!(f, "numerical"),
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Structural inconsistencies in a latent class model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("model has an empty {axis} axis")]
    EmptyAxis { axis: Axis },

    #[error("{axis} count mismatch: expected {expected}, got {actual}")]
    ShapeMismatch {
        axis: Axis,
        expected: usize,
        actual: usize,
    },

    #[error("outcome probability row {row} has {actual} entries, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("duplicate {axis} name '{name}'")]
    DuplicateName { axis: Axis, name: String },

    #[error("{axis} name at position {index} is empty")]
    EmptyName { axis: Axis, index: usize },

    #[error("outcome probability for class {class}, indicator {indicator} must be in [0, 1], got {value}")]
    ProbabilityOutOfRange {
        class: usize,
        indicator: usize,
        value: f64,
    },

    #[error("class prior {class} must be in [0, 1], got {value}")]
    PriorOutOfRange { class: usize, value: f64 },

    #[error("class priors must sum to 1 (tolerance {tolerance}), got {sum}")]
    PriorSum { sum: f64, tolerance: f64 },

    #[error("prior-sum tolerance must be finite and in [0, 1), got {tolerance}")]
    InvalidTolerance { tolerance: f64 },
}

/// Invalid indicator or target-class selection for an inference call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("unknown indicator '{name}'")]
    UnknownIndicator { name: String },

    #[error("indicator '{name}' selected more than once")]
    DuplicateIndicator { name: String },

    #[error("indicator selection is empty")]
    EmptySelection,

    #[error("unknown target class '{name}'")]
    UnknownTargetClass { name: String },
}

/// Unified error type for the inference engine.
#[derive(Error, Debug)]
pub enum Error {
    // Model errors (10-19)
    #[error("invalid model: {0}")]
    Validation(#[from] ValidationError),

    // Selection errors (20-29)
    #[error("invalid selection: {0}")]
    Configuration(#[from] ConfigurationError),

    // Subject errors (30-39)
    #[error("subject '{subject}' (index {subject_index}) has no result for indicator '{indicator}'")]
    MissingIndicator {
        subject_index: usize,
        subject: String,
        indicator: String,
    },

    #[error("subject '{subject}' (index {subject_index}) has a missing value for indicator '{indicator}'")]
    MissingValue {
        subject_index: usize,
        subject: String,
        indicator: String,
    },

    #[error("subject '{subject}' (index {subject_index}) has non-binary value {value} for indicator '{indicator}'")]
    InvalidObservation {
        subject_index: usize,
        subject: String,
        indicator: String,
        value: u8,
    },

    // Numerical errors (40-49)
    #[error("likelihood underflowed for every class for subject '{subject}' (index {subject_index})")]
    DegenerateLikelihood { subject_index: usize, subject: String },

    #[error("soft label scale must be positive and finite, got {0}")]
    InvalidScale(f64),

    // Engine configuration errors (50-59)
    #[error("invalid engine config: {0}")]
    InvalidEngineConfig(String),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the stable error code for this error.
    pub fn code(&self) -> u32 {
        match self {
            Error::Validation(_) => 10,
            Error::Configuration(_) => 20,
            Error::MissingIndicator { .. } => 30,
            Error::MissingValue { .. } => 31,
            Error::InvalidObservation { .. } => 32,
            Error::DegenerateLikelihood { .. } => 40,
            Error::InvalidScale(_) => 41,
            Error::InvalidEngineConfig(_) => 50,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Returns the error category for grouping and filtering.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Validation(_) => ErrorCategory::Model,
            Error::Configuration(_) => ErrorCategory::Selection,
            Error::MissingIndicator { .. }
            | Error::MissingValue { .. }
            | Error::InvalidObservation { .. } => ErrorCategory::Subject,
            Error::DegenerateLikelihood { .. } | Error::InvalidScale(_) => {
                ErrorCategory::Numerical
            }
            Error::InvalidEngineConfig(_) => ErrorCategory::Config,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }

    /// Index of the offending subject for subject-local errors.
    pub fn subject_index(&self) -> Option<usize> {
        match self {
            Error::MissingIndicator { subject_index, .. }
            | Error::MissingValue { subject_index, .. }
            | Error::InvalidObservation { subject_index, .. }
            | Error::DegenerateLikelihood { subject_index, .. } => Some(*subject_index),
            _ => None,
        }
    }

    /// Whether the error concerns one subject only.
    ///
    /// Subject-local errors never invalidate the rest of a batch.
    pub fn is_subject_local(&self) -> bool {
        self.subject_index().is_some()
    }
}
