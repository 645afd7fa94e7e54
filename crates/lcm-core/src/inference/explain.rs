//! Per-indicator evidence breakdown for one subject.
//!
//! The unnormalized log posterior of each class is a sum of one prior term
//! and one term per conditioned indicator. Listing those terms shows which
//! test results moved a subject toward which class.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::inference::output::PosteriorVector;
use crate::inference::posterior::{InferencePlan, PosteriorEngine, PosteriorQuery};
use crate::model::LatentClassModel;
use crate::subject::{SubjectId, SubjectRecord};

/// Evidence term contribution per class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EvidenceTerm {
    /// `"prior"` or the indicator name.
    pub feature: String,
    /// Observed value; `None` for the prior and for marginalized values.
    pub observed: Option<u8>,
    pub log_likelihood: Vec<f64>,
}

/// Evidence terms plus the resulting posterior for one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubjectExplanation {
    pub subject: SubjectId,
    pub classes: Vec<String>,
    pub terms: Vec<EvidenceTerm>,
    pub posterior: PosteriorVector,
}

impl SubjectExplanation {
    /// log P(a | x) − log P(b | x).
    ///
    /// `None` for an unknown class index, or when both classes have zero
    /// posterior mass (e.g. both priors are zero) and the ratio is undefined.
    pub fn log_odds(&self, a: usize, b: usize) -> Option<f64> {
        let la = *self.posterior.log_probabilities.get(a)?;
        let lb = *self.posterior.log_probabilities.get(b)?;
        if la == f64::NEG_INFINITY && lb == f64::NEG_INFINITY {
            return None;
        }
        Some(la - lb)
    }

    /// Sum of all terms for `class`: its unnormalized log posterior.
    pub fn total(&self, class: usize) -> f64 {
        self.terms.iter().map(|t| t.log_likelihood[class]).sum()
    }

    /// Indicator whose term most favours class `a` over class `b`.
    pub fn strongest_evidence(&self, a: usize, b: usize) -> Option<&EvidenceTerm> {
        self.terms
            .iter()
            .filter(|t| t.feature != "prior" && t.observed.is_some())
            .max_by(|x, y| {
                let dx = x.log_likelihood[a] - x.log_likelihood[b];
                let dy = y.log_likelihood[a] - y.log_likelihood[b];
                dx.total_cmp(&dy)
            })
    }
}

impl PosteriorEngine {
    /// Break one subject's posterior into prior and per-indicator terms.
    ///
    /// Uses the same selection, clamping and missing-value policy as
    /// [`PosteriorEngine::infer`]; errors are reported with subject index 0.
    pub fn explain(
        &self,
        model: &LatentClassModel,
        subject: &SubjectRecord,
        query: &PosteriorQuery,
    ) -> Result<SubjectExplanation> {
        let plan = InferencePlan::resolve(model, query, self.config())?;
        let posterior = plan.score(0, subject)?;
        let pattern = plan.pattern(0, subject)?;

        let mut terms = Vec::with_capacity(plan.indicators.len() + 1);
        terms.push(EvidenceTerm {
            feature: "prior".to_string(),
            observed: None,
            log_likelihood: plan.log_priors.clone(),
        });
        for (m, (name, observed)) in plan.indicators.iter().zip(pattern.iter()).enumerate() {
            terms.push(EvidenceTerm {
                feature: name.clone(),
                observed: observed.map(u8::from),
                log_likelihood: plan
                    .class_tables
                    .iter()
                    .map(|table| table.term(m, *observed))
                    .collect(),
            });
        }

        Ok(SubjectExplanation {
            subject: subject.id.clone(),
            classes: plan.classes,
            terms,
            posterior,
        })
    }
}
