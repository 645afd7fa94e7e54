//! Posterior results handed to the weak-label consumer.
//!
//! Results are new collections keyed by subject id, in input order. Merging
//! them back into a caller-owned table is the caller's job.

use ndarray::Array2;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::subject::SubjectId;

/// Posterior class membership of one subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PosteriorVector {
    pub subject: SubjectId,
    /// P(class | observed indicators), one entry per class, summing to 1.
    pub probabilities: Vec<f64>,
    pub log_probabilities: Vec<f64>,
    /// log P(observed pattern) under the model.
    pub log_evidence: f64,
    /// Indicators that contributed a likelihood factor.
    pub indicators_used: usize,
}

impl PosteriorVector {
    /// Index of the most probable class (first one on ties).
    pub fn most_probable_class(&self) -> usize {
        let mut best = 0;
        for (k, p) in self.probabilities.iter().enumerate() {
            if *p > self.probabilities[best] {
                best = k;
            }
        }
        best
    }

    pub fn probability(&self, class: usize) -> Option<f64> {
        self.probabilities.get(class).copied()
    }
}

/// Full N×K posterior table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PosteriorMatrix {
    classes: Vec<String>,
    indicators: Vec<String>,
    rows: Vec<PosteriorVector>,
}

impl PosteriorMatrix {
    pub(crate) fn new(
        classes: Vec<String>,
        indicators: Vec<String>,
        rows: Vec<PosteriorVector>,
    ) -> Self {
        Self {
            classes,
            indicators,
            rows,
        }
    }

    /// Class names, in column order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Indicators that were conditioned on.
    pub fn indicators(&self) -> &[String] {
        &self.indicators
    }

    pub fn rows(&self) -> &[PosteriorVector] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Posterior of the subject with id `subject`.
    pub fn row(&self, subject: &SubjectId) -> Option<&PosteriorVector> {
        self.rows.iter().find(|r| &r.subject == subject)
    }

    /// Probabilities of `class` across subjects.
    pub fn column(&self, class: &str) -> Option<Vec<f64>> {
        let k = self.classes.iter().position(|c| c == class)?;
        Some(self.rows.iter().map(|r| r.probabilities[k]).collect())
    }

    /// Dense N×K copy of the probabilities.
    pub fn to_array(&self) -> Array2<f64> {
        let k = self.classes.len();
        let mut out = Array2::zeros((self.rows.len(), k));
        for (i, row) in self.rows.iter().enumerate() {
            for (j, p) in row.probabilities.iter().enumerate() {
                out[[i, j]] = *p;
            }
        }
        out
    }

    /// Modal class assignment per subject.
    pub fn modal_assignments(&self) -> Vec<usize> {
        self.rows.iter().map(PosteriorVector::most_probable_class).collect()
    }

    /// Column sums: expected number of subjects in each class.
    pub fn expected_class_sizes(&self) -> Vec<f64> {
        let mut sizes = vec![0.0; self.classes.len()];
        for row in &self.rows {
            for (size, p) in sizes.iter_mut().zip(row.probabilities.iter()) {
                *size += p;
            }
        }
        sizes
    }

    /// Relative entropy of the classification, in [0, 1].
    ///
    /// 1 means every subject is assigned with certainty; 0 means every
    /// posterior is uniform. `None` for an empty batch or a single class.
    pub fn classification_entropy(&self) -> Option<f64> {
        let n = self.rows.len();
        let k = self.classes.len();
        if n == 0 || k < 2 {
            return None;
        }
        let mut entropy = 0.0;
        for row in &self.rows {
            for p in &row.probabilities {
                if *p > 0.0 {
                    entropy -= p * p.ln();
                }
            }
        }
        let max_entropy = n as f64 * (k as f64).ln();
        Some((1.0 - entropy / max_entropy).clamp(0.0, 1.0))
    }

    /// Keep only the probability of class `class_index` per subject.
    pub fn project(&self, class_index: usize) -> Option<TargetProbabilities> {
        let class = self.classes.get(class_index)?.clone();
        let values = self
            .rows
            .iter()
            .map(|r| SubjectProbability {
                subject: r.subject.clone(),
                probability: r.probabilities[class_index],
            })
            .collect();
        Some(TargetProbabilities { class, values })
    }
}

/// One subject's probability of the target class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SubjectProbability {
    pub subject: SubjectId,
    pub probability: f64,
}

/// Per-subject probability of a single target class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TargetProbabilities {
    pub class: String,
    pub values: Vec<SubjectProbability>,
}

impl TargetProbabilities {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The plain length-N probability vector.
    pub fn probabilities(&self) -> Vec<f64> {
        self.values.iter().map(|v| v.probability).collect()
    }

    /// Soft labels rescaled by a positive constant for squared-error targets.
    pub fn soft_labels(&self, scale: f64) -> Result<Vec<f64>> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::InvalidScale(scale));
        }
        Ok(self.values.iter().map(|v| v.probability * scale).collect())
    }
}

/// Engine output: the full table, or one target column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PosteriorOutput {
    Full(PosteriorMatrix),
    Target(TargetProbabilities),
}

impl PosteriorOutput {
    pub fn len(&self) -> usize {
        match self {
            PosteriorOutput::Full(m) => m.len(),
            PosteriorOutput::Target(t) => t.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_full(self) -> Option<PosteriorMatrix> {
        match self {
            PosteriorOutput::Full(m) => Some(m),
            PosteriorOutput::Target(_) => None,
        }
    }

    pub fn into_target(self) -> Option<TargetProbabilities> {
        match self {
            PosteriorOutput::Target(t) => Some(t),
            PosteriorOutput::Full(_) => None,
        }
    }
}

/// Per-subject results from [`crate::PosteriorEngine::infer_each`].
#[derive(Debug)]
pub struct SubjectOutcomes {
    pub(crate) classes: Vec<String>,
    pub(crate) indicators: Vec<String>,
    pub(crate) outcomes: Vec<Result<PosteriorVector>>,
}

impl SubjectOutcomes {
    /// One entry per input subject, in input order.
    pub fn outcomes(&self) -> &[Result<PosteriorVector>] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Subject-local failures.
    pub fn failures(&self) -> impl Iterator<Item = &Error> {
        self.outcomes.iter().filter_map(|o| o.as_ref().err())
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Matrix of the subjects that succeeded; failed subjects are dropped.
    pub fn completed(self) -> PosteriorMatrix {
        let rows = self.outcomes.into_iter().filter_map(|o| o.ok()).collect();
        PosteriorMatrix::new(self.classes, self.indicators, rows)
    }
}
