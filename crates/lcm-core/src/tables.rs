//! Conditional probability table extraction.
//!
//! Presents a fitted model as two long-form tables for human reporting: one
//! record per (class, indicator) pair and one prevalence record per class.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::model::{LatentClassModel, ModelFit};

/// P(indicator positive | class) and its complement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConditionalProbabilityRecord {
    pub class_index: usize,
    pub class: String,
    pub indicator: String,
    pub p_positive: f64,
    /// Always `1 - p_positive`.
    pub p_negative: f64,
}

/// Unconditional probability of one latent class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClassPrevalenceRecord {
    pub class_index: usize,
    pub class: String,
    pub prevalence: f64,
}

/// Both reporting tables for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProbabilityTables {
    /// K·M records, class-major, indicators in model order.
    pub conditional: Vec<ConditionalProbabilityRecord>,
    /// K records in class order.
    pub prevalence: Vec<ClassPrevalenceRecord>,
}

impl ProbabilityTables {
    /// Conditional records belonging to `class`.
    pub fn conditional_for<'a>(
        &'a self,
        class: &'a str,
    ) -> impl Iterator<Item = &'a ConditionalProbabilityRecord> + 'a {
        self.conditional.iter().filter(move |r| r.class == class)
    }

    /// Prevalence of `class`, if present.
    pub fn prevalence_of(&self, class: &str) -> Option<f64> {
        self.prevalence
            .iter()
            .find(|r| r.class == class)
            .map(|r| r.prevalence)
    }

    /// Sum of all class prevalences.
    pub fn total_prevalence(&self) -> f64 {
        self.prevalence.iter().map(|r| r.prevalence).sum()
    }
}

impl LatentClassModel {
    /// Extract the reporting tables; infallible on a validated model.
    pub fn tables(&self) -> ProbabilityTables {
        let mut conditional = Vec::with_capacity(self.n_classes() * self.n_indicators());
        for (class_index, class) in self.classes().iter() {
            for (indicator_index, indicator) in self.indicators().iter() {
                let p_positive = self.probability(class_index, indicator_index);
                conditional.push(ConditionalProbabilityRecord {
                    class_index,
                    class: class.to_string(),
                    indicator: indicator.to_string(),
                    p_positive,
                    p_negative: 1.0 - p_positive,
                });
            }
        }

        let prevalence = self
            .classes()
            .iter()
            .map(|(class_index, class)| ClassPrevalenceRecord {
                class_index,
                class: class.to_string(),
                prevalence: self.class_priors()[class_index],
            })
            .collect();

        ProbabilityTables {
            conditional,
            prevalence,
        }
    }
}

/// Extract reporting tables straight from a fitter document.
///
/// Fails with a [`ValidationError`] when the document is structurally
/// inconsistent, e.g. the matrix has a different column count than the
/// supplied indicator names.
pub fn extract_tables(fit: &ModelFit) -> Result<ProbabilityTables, ValidationError> {
    let model = LatentClassModel::from_fit(fit)?;
    Ok(model.tables())
}
