//! Latent class posterior inference for probabilistic weak labels.
//!
//! This library turns imperfect binary diagnostic test results into
//! per-subject class probabilities that a downstream classifier can use as
//! soft supervision targets:
//! - Model types with named class/indicator axes and structural validation
//! - Conditional probability and prevalence tables for reporting
//! - Batch posterior inference with indicator selection and target projection
//! - Per-indicator evidence breakdowns
//! - Engine configuration and structured logging
//!
//! Model fitting and model selection happen upstream; training happens
//! downstream. Neither is part of this crate.

pub mod config;
pub mod error;
pub mod inference;
pub mod logging;
pub mod model;
pub mod naming;
pub mod subject;
pub mod tables;
pub mod validate;

pub use config::{resolve_config, ConfigSource, EngineConfig, MissingValuePolicy};
pub use error::{ConfigurationError, Error, ErrorCategory, Result, ValidationError};
pub use inference::{
    EvidenceTerm, PosteriorEngine, PosteriorMatrix, PosteriorOutput, PosteriorQuery,
    PosteriorVector, SubjectExplanation, SubjectOutcomes, SubjectProbability, TargetProbabilities,
};
pub use model::{FitStatistics, LatentClassModel, ModelBuilder, ModelFit};
pub use naming::{class_name, indicator_name, Axis, NameIndex};
pub use subject::{SubjectId, SubjectRecord};
pub use tables::{
    extract_tables, ClassPrevalenceRecord, ConditionalProbabilityRecord, ProbabilityTables,
};
