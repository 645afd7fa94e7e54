//! Core posterior computation P(class | x) for a batch of subjects.
//!
//! Combines class priors with conditional-independence Bernoulli likelihoods
//! in the log domain and returns normalized posteriors per subject.
//!
//! Per subject i and class k, over the effective indicators m:
//!
//! ```text
//! logL[i,k]  = Σ_m x[i,m]·ln p[k,m] + (1 − x[i,m])·ln(1 − p[k,m])
//! post[i,k]  = exp(logL[i,k] + ln π[k] − logsumexp_j(logL[i,j] + ln π[j]))
//! ```
//!
//! Each `p[k,m]` is clamped into `[ε, 1 − ε]` first, so a fitted rate of
//! exactly 0 or 1 cannot zero out a class. Subjects are independent; large
//! batches are scored across rayon workers over the same read-only plan.

use rayon::prelude::*;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use lcm_math::bernoulli::BernoulliLogTable;
use lcm_math::{exp_probs, ln_or_neg_inf, normalize_log_probs};

use crate::config::{EngineConfig, MissingValuePolicy};
use crate::error::{ConfigurationError, Error, Result};
use crate::inference::output::{
    PosteriorMatrix, PosteriorOutput, PosteriorVector, SubjectOutcomes, TargetProbabilities,
};
use crate::model::LatentClassModel;
use crate::subject::SubjectRecord;

/// Which indicators to condition on and which class to report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PosteriorQuery {
    /// Subset of model indicators; `None` means all of them.
    #[serde(default)]
    pub selected_indicators: Option<Vec<String>>,
    /// Report only this class's probability.
    #[serde(default)]
    pub target_class: Option<String>,
}

impl PosteriorQuery {
    /// Condition on every indicator and return the full table.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn select<I, S>(mut self, indicators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_indicators = Some(indicators.into_iter().map(Into::into).collect());
        self
    }

    pub fn target(mut self, class: impl Into<String>) -> Self {
        self.target_class = Some(class.into());
        self
    }
}

/// Everything needed to score a subject, resolved once per call.
#[derive(Debug, Clone)]
pub(crate) struct InferencePlan {
    pub(crate) indicators: Vec<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) class_tables: Vec<BernoulliLogTable>,
    pub(crate) log_priors: Vec<f64>,
    pub(crate) target: Option<usize>,
    missing_values: MissingValuePolicy,
}

impl InferencePlan {
    pub(crate) fn resolve(
        model: &LatentClassModel,
        query: &PosteriorQuery,
        config: &EngineConfig,
    ) -> Result<Self> {
        let positions = resolve_indicators(model, query.selected_indicators.as_deref())?;

        let target = match &query.target_class {
            Some(name) => Some(model.classes().position(name).ok_or_else(|| {
                ConfigurationError::UnknownTargetClass { name: name.clone() }
            })?),
            None => None,
        };

        let class_tables = (0..model.n_classes())
            .map(|k| {
                let row = model.class_row(k);
                BernoulliLogTable::from_probabilities(
                    positions.iter().map(|&m| row[m]),
                    config.probability_floor,
                )
            })
            .collect();

        let indicators = positions
            .iter()
            .map(|&m| model.indicators().names()[m].clone())
            .collect();

        debug!(
            target: "lcm_core::inference",
            indicators = positions.len(),
            target_class = ?target,
            probability_floor = config.probability_floor,
            missing_values = %config.missing_values,
            "resolved inference plan"
        );

        Ok(Self {
            indicators,
            classes: model.classes().names().to_vec(),
            class_tables,
            log_priors: model.class_priors().iter().map(|&p| ln_or_neg_inf(p)).collect(),
            target,
            missing_values: config.missing_values,
        })
    }

    /// Read the subject's effective pattern; `None` entries are marginalized.
    pub(crate) fn pattern(
        &self,
        subject_index: usize,
        subject: &SubjectRecord,
    ) -> Result<Vec<Option<bool>>> {
        self.indicators
            .iter()
            .map(|name| match subject.get(name) {
                None => Err(Error::MissingIndicator {
                    subject_index,
                    subject: subject.id.to_string(),
                    indicator: name.clone(),
                }),
                Some(None) => match self.missing_values {
                    MissingValuePolicy::Fail => Err(Error::MissingValue {
                        subject_index,
                        subject: subject.id.to_string(),
                        indicator: name.clone(),
                    }),
                    MissingValuePolicy::Marginalize => Ok(None),
                },
                Some(Some(0)) => Ok(Some(false)),
                Some(Some(1)) => Ok(Some(true)),
                Some(Some(value)) => Err(Error::InvalidObservation {
                    subject_index,
                    subject: subject.id.to_string(),
                    indicator: name.clone(),
                    value,
                }),
            })
            .collect()
    }

    /// Unnormalized log posterior `ln π_k + logL_k` per class.
    pub(crate) fn log_joint(&self, pattern: &[Option<bool>]) -> Vec<f64> {
        self.class_tables
            .iter()
            .zip(self.log_priors.iter())
            .map(|(table, log_prior)| log_prior + table.log_likelihood(pattern))
            .collect()
    }

    pub(crate) fn score(
        &self,
        subject_index: usize,
        subject: &SubjectRecord,
    ) -> Result<PosteriorVector> {
        let pattern = self.pattern(subject_index, subject)?;
        let log_joint = self.log_joint(&pattern);
        let (log_probabilities, log_evidence) = normalize_log_probs(&log_joint);
        if !log_evidence.is_finite() {
            return Err(Error::DegenerateLikelihood {
                subject_index,
                subject: subject.id.to_string(),
            });
        }
        Ok(PosteriorVector {
            subject: subject.id.clone(),
            probabilities: exp_probs(&log_probabilities),
            log_probabilities,
            log_evidence,
            indicators_used: pattern.iter().filter(|x| x.is_some()).count(),
        })
    }
}

/// Map the requested indicator names onto model columns.
fn resolve_indicators(model: &LatentClassModel, selected: Option<&[String]>) -> Result<Vec<usize>> {
    let Some(selected) = selected else {
        return Ok((0..model.n_indicators()).collect());
    };
    if selected.is_empty() {
        return Err(ConfigurationError::EmptySelection.into());
    }
    let mut positions = Vec::with_capacity(selected.len());
    for name in selected {
        let position = model
            .indicators()
            .position(name)
            .ok_or_else(|| ConfigurationError::UnknownIndicator { name: name.clone() })?;
        if positions.contains(&position) {
            return Err(ConfigurationError::DuplicateIndicator { name: name.clone() }.into());
        }
        positions.push(position);
    }
    Ok(positions)
}

/// Stateless batch posterior engine.
///
/// Holds only its configuration; the model and subjects are borrowed per call
/// and nothing is retained between calls.
#[derive(Debug, Clone, Default)]
pub struct PosteriorEngine {
    config: EngineConfig,
}

impl PosteriorEngine {
    /// Create an engine after validating `config`.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Posterior for every subject, failing on the first bad subject.
    ///
    /// The first error in subject order is returned, whichever path (serial
    /// or parallel) computed it. With a target class the output is one
    /// probability per subject, otherwise the full N×K table.
    pub fn infer(
        &self,
        model: &LatentClassModel,
        subjects: &[SubjectRecord],
        query: &PosteriorQuery,
    ) -> Result<PosteriorOutput> {
        let plan = InferencePlan::resolve(model, query, &self.config)?;
        let target = plan.target;
        let matrix = self.score_matrix(plan, subjects)?;
        match target.and_then(|k| matrix.project(k)) {
            Some(projected) => Ok(PosteriorOutput::Target(projected)),
            None => Ok(PosteriorOutput::Full(matrix)),
        }
    }

    /// Full N×K table; any target class in `query` is validated but ignored.
    pub fn infer_full(
        &self,
        model: &LatentClassModel,
        subjects: &[SubjectRecord],
        query: &PosteriorQuery,
    ) -> Result<PosteriorMatrix> {
        let plan = InferencePlan::resolve(model, query, &self.config)?;
        self.score_matrix(plan, subjects)
    }

    /// Probability of `class` per subject, conditioned on `query`'s selection.
    pub fn infer_target(
        &self,
        model: &LatentClassModel,
        subjects: &[SubjectRecord],
        query: &PosteriorQuery,
        class: &str,
    ) -> Result<TargetProbabilities> {
        let query = query.clone().target(class);
        let plan = InferencePlan::resolve(model, &query, &self.config)?;
        let target = plan.target;
        let matrix = self.score_matrix(plan, subjects)?;
        target
            .and_then(|k| matrix.project(k))
            .ok_or_else(|| {
                ConfigurationError::UnknownTargetClass {
                    name: class.to_string(),
                }
                .into()
            })
    }

    /// Score every subject independently.
    ///
    /// Selection problems still fail the whole call; a subject's missing
    /// data or degenerate likelihood only fails that subject's entry.
    pub fn infer_each(
        &self,
        model: &LatentClassModel,
        subjects: &[SubjectRecord],
        query: &PosteriorQuery,
    ) -> Result<SubjectOutcomes> {
        let plan = InferencePlan::resolve(model, query, &self.config)?;
        let outcomes = self.score_batch(&plan, subjects);
        for err in outcomes.iter().filter_map(|o| o.as_ref().err()) {
            warn!(
                target: "lcm_core::inference",
                subject_index = err.subject_index(),
                code = err.code(),
                "subject excluded: {}",
                err
            );
        }
        Ok(SubjectOutcomes {
            classes: plan.classes,
            indicators: plan.indicators,
            outcomes,
        })
    }

    fn score_matrix(&self, plan: InferencePlan, subjects: &[SubjectRecord]) -> Result<PosteriorMatrix> {
        let rows = self
            .score_batch(&plan, subjects)
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        Ok(PosteriorMatrix::new(plan.classes, plan.indicators, rows))
    }

    fn score_batch(
        &self,
        plan: &InferencePlan,
        subjects: &[SubjectRecord],
    ) -> Vec<Result<PosteriorVector>> {
        let parallel = subjects.len() >= self.config.parallel_threshold;
        debug!(
            target: "lcm_core::inference",
            subjects = subjects.len(),
            classes = plan.classes.len(),
            indicators = plan.indicators.len(),
            parallel,
            "scoring posterior batch"
        );

        let outcomes: Vec<Result<PosteriorVector>> = if parallel {
            subjects
                .par_iter()
                .enumerate()
                .map(|(i, subject)| plan.score(i, subject))
                .collect()
        } else {
            subjects
                .iter()
                .enumerate()
                .map(|(i, subject)| plan.score(i, subject))
                .collect()
        };

        debug!(
            target: "lcm_core::inference",
            failed = outcomes.iter().filter(|o| o.is_err()).count(),
            "posterior batch complete"
        );
        outcomes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    fn symmetric_model() -> LatentClassModel {
        LatentClassModel::builder(array![[0.9, 0.1], [0.1, 0.9]], vec![0.5, 0.5])
            .build()
            .unwrap()
    }

    fn subject(id: &str, values: &[u8]) -> SubjectRecord {
        SubjectRecord::from_pattern(id, ["Test1", "Test2"], values)
    }

    #[test]
    fn two_class_reference_posterior() {
        let engine = PosteriorEngine::default();
        let matrix = engine
            .infer_full(&symmetric_model(), &[subject("s0", &[1, 0])], &PosteriorQuery::all())
            .unwrap();
        let row = &matrix.rows()[0];
        assert!(approx_eq(row.probabilities[0], 0.405 / 0.41, 1e-9));
        assert!(approx_eq(row.probabilities[1], 0.005 / 0.41, 1e-9));
        assert!(approx_eq(row.log_evidence, 0.41f64.ln(), 1e-9));
        assert_eq!(row.indicators_used, 2);
    }

    #[test]
    fn prior_only_when_pattern_is_uninformative() {
        let model = LatentClassModel::builder(array![[0.5], [0.5]], vec![0.2, 0.8])
            .build()
            .unwrap();
        let matrix = PosteriorEngine::default()
            .infer_full(&model, &[SubjectRecord::new("x").with_result("Test1", 1)], &PosteriorQuery::all())
            .unwrap();
        assert!(approx_eq(matrix.rows()[0].probabilities[0], 0.2, 1e-12));
    }

    #[test]
    fn plan_restricts_to_selection_in_request_order() {
        let model = LatentClassModel::builder(array![[0.9, 0.2, 0.7]], vec![1.0])
            .build()
            .unwrap();
        let query = PosteriorQuery::all().select(["Test3", "Test1"]);
        let plan = InferencePlan::resolve(&model, &query, &EngineConfig::default()).unwrap();
        assert_eq!(plan.indicators, vec!["Test3", "Test1"]);
        let positive = plan.class_tables[0].term(0, Some(true));
        assert!(approx_eq(positive, 0.7f64.ln(), 1e-12));
    }

    #[test]
    fn unknown_indicator_is_configuration_error() {
        let err = PosteriorEngine::default()
            .infer(
                &symmetric_model(),
                &[subject("s0", &[1, 0])],
                &PosteriorQuery::all().select(["Test9"]),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::UnknownIndicator { .. })
        ));
    }

    #[test]
    fn empty_and_duplicate_selection_rejected() {
        let engine = PosteriorEngine::default();
        let empty = PosteriorQuery {
            selected_indicators: Some(vec![]),
            target_class: None,
        };
        assert!(matches!(
            engine.infer(&symmetric_model(), &[], &empty).unwrap_err(),
            Error::Configuration(ConfigurationError::EmptySelection)
        ));
        let dup = PosteriorQuery::all().select(["Test1", "Test1"]);
        assert!(matches!(
            engine.infer(&symmetric_model(), &[], &dup).unwrap_err(),
            Error::Configuration(ConfigurationError::DuplicateIndicator { .. })
        ));
    }

    #[test]
    fn unknown_target_rejected_before_scoring() {
        let err = PosteriorEngine::default()
            .infer(&symmetric_model(), &[], &PosteriorQuery::all().target("Class_3"))
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::UnknownTargetClass { .. })
        ));
    }

    #[test]
    fn non_binary_value_rejected() {
        let err = PosteriorEngine::default()
            .infer(&symmetric_model(), &[subject("bad", &[1, 2])], &PosteriorQuery::all())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidObservation { value: 2, .. }));
    }

    #[test]
    fn first_failing_subject_is_reported() {
        let subjects = vec![
            subject("ok", &[1, 1]),
            SubjectRecord::new("no-t2").with_result("Test1", 1),
            SubjectRecord::new("empty"),
        ];
        let err = PosteriorEngine::default()
            .infer(&symmetric_model(), &subjects, &PosteriorQuery::all())
            .unwrap_err();
        assert_eq!(err.subject_index(), Some(1));
    }

    #[test]
    fn zero_prior_class_gets_zero_posterior() {
        let model = LatentClassModel::builder(array![[0.9], [0.1]], vec![1.0, 0.0])
            .build()
            .unwrap();
        let matrix = PosteriorEngine::default()
            .infer_full(&model, &[SubjectRecord::new("z").with_result("Test1", 0)], &PosteriorQuery::all())
            .unwrap();
        assert_eq!(matrix.rows()[0].probabilities, vec![1.0, 0.0]);
    }

    #[test]
    fn fully_marginalized_subject_gets_prior() {
        let model = LatentClassModel::builder(array![[0.9, 0.1], [0.1, 0.9]], vec![0.3, 0.7])
            .build()
            .unwrap();
        let engine = PosteriorEngine::new(
            EngineConfig::default().with_missing_values(MissingValuePolicy::Marginalize),
        )
        .unwrap();
        let blank = SubjectRecord::new("blank").with_missing("Test1").with_missing("Test2");
        let matrix = engine.infer_full(&model, &[blank], &PosteriorQuery::all()).unwrap();
        let row = &matrix.rows()[0];
        assert_eq!(row.indicators_used, 0);
        assert!(approx_eq(row.probabilities[0], 0.3, 1e-12));
        assert!(approx_eq(row.log_evidence, 0.0, 1e-12));
    }

    #[test]
    fn engine_rejects_invalid_config() {
        let config = EngineConfig::default().with_probability_floor(0.7);
        assert!(PosteriorEngine::new(config).is_err());
    }

    #[test]
    fn query_serde_defaults() {
        let query: PosteriorQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query, PosteriorQuery::all());
    }
}
