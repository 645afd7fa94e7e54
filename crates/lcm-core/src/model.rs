//! Fitted latent class model.
//!
//! The model is produced by an external fitter and never mutated here.
//! [`ModelFit`] is the fitter's serialized output contract; [`LatentClassModel`]
//! is the validated, immutable form every other component consumes.

use std::path::Path;

use ndarray::{Array2, ArrayView1};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ValidationError};
use crate::naming::{Axis, NameIndex};
use crate::validate::{matrix_from_rows, validate_model_parts, PRIOR_SUM_TOLERANCE};

/// Output contract of the external latent class fitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelFit {
    /// K rows (classes) of M positivity probabilities (indicators).
    pub outcome_probabilities: Vec<Vec<f64>>,

    /// Class prevalences, length K.
    pub class_priors: Vec<f64>,

    /// Indicator names; `null` entries fall back to `TestN`.
    #[serde(default)]
    pub indicator_names: Option<Vec<Option<String>>>,

    /// Class names; `null` entries fall back to `Class_N`.
    #[serde(default)]
    pub class_names: Option<Vec<Option<String>>>,

    /// Bayesian information criterion reported by the fitter.
    #[serde(default)]
    pub bic: Option<f64>,

    /// Maximized log-likelihood reported by the fitter.
    #[serde(default)]
    pub log_likelihood: Option<f64>,
}

impl ModelFit {
    /// Parse a fitter output document.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a fitter output document from disk.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Validate and convert into an immutable model.
    pub fn into_model(self) -> Result<LatentClassModel, ValidationError> {
        LatentClassModel::from_fit(&self)
    }
}

/// Goodness-of-fit metadata carried through from the fitter.
///
/// Never interpreted by inference; model selection happens upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FitStatistics {
    pub bic: Option<f64>,
    pub log_likelihood: Option<f64>,
}

/// Immutable, validated latent class model.
#[derive(Debug, Clone, PartialEq)]
pub struct LatentClassModel {
    outcome_probabilities: Array2<f64>,
    class_priors: Vec<f64>,
    classes: NameIndex,
    indicators: NameIndex,
    fit_statistics: FitStatistics,
}

impl LatentClassModel {
    /// Start building a model from a K×M matrix and K priors.
    pub fn builder(outcome_probabilities: Array2<f64>, class_priors: Vec<f64>) -> ModelBuilder {
        ModelBuilder {
            outcome_probabilities,
            class_priors,
            indicator_names: None,
            class_names: None,
            fit_statistics: FitStatistics::default(),
            prior_tolerance: PRIOR_SUM_TOLERANCE,
        }
    }

    /// Validate a fitter output document.
    pub fn from_fit(fit: &ModelFit) -> Result<Self, ValidationError> {
        let matrix = matrix_from_rows(&fit.outcome_probabilities)?;
        let mut builder = Self::builder(matrix, fit.class_priors.clone()).fit_statistics(
            FitStatistics {
                bic: fit.bic,
                log_likelihood: fit.log_likelihood,
            },
        );
        builder.indicator_names = fit.indicator_names.clone();
        builder.class_names = fit.class_names.clone();
        builder.build()
    }

    /// Number of latent classes K.
    pub fn n_classes(&self) -> usize {
        self.outcome_probabilities.nrows()
    }

    /// Number of indicators M.
    pub fn n_indicators(&self) -> usize {
        self.outcome_probabilities.ncols()
    }

    /// The K×M positivity matrix.
    pub fn outcome_probabilities(&self) -> &Array2<f64> {
        &self.outcome_probabilities
    }

    /// Positivity probabilities of one class across all indicators.
    pub fn class_row(&self, class: usize) -> ArrayView1<'_, f64> {
        self.outcome_probabilities.row(class)
    }

    /// P(indicator positive | class).
    pub fn probability(&self, class: usize, indicator: usize) -> f64 {
        self.outcome_probabilities[[class, indicator]]
    }

    pub fn class_priors(&self) -> &[f64] {
        &self.class_priors
    }

    pub fn classes(&self) -> &NameIndex {
        &self.classes
    }

    pub fn indicators(&self) -> &NameIndex {
        &self.indicators
    }

    pub fn fit_statistics(&self) -> FitStatistics {
        self.fit_statistics
    }

    /// Convert back into the fitter's document form with resolved names.
    pub fn to_fit(&self) -> ModelFit {
        ModelFit {
            outcome_probabilities: self
                .outcome_probabilities
                .rows()
                .into_iter()
                .map(|row| row.to_vec())
                .collect(),
            class_priors: self.class_priors.clone(),
            indicator_names: Some(self.indicators.names().iter().cloned().map(Some).collect()),
            class_names: Some(self.classes.names().iter().cloned().map(Some).collect()),
            bic: self.fit_statistics.bic,
            log_likelihood: self.fit_statistics.log_likelihood,
        }
    }
}

/// Builder for [`LatentClassModel`]; all checks run in [`ModelBuilder::build`].
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    outcome_probabilities: Array2<f64>,
    class_priors: Vec<f64>,
    indicator_names: Option<Vec<Option<String>>>,
    class_names: Option<Vec<Option<String>>>,
    fit_statistics: FitStatistics,
    prior_tolerance: f64,
}

impl ModelBuilder {
    pub fn indicator_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indicator_names = Some(names.into_iter().map(|n| Some(n.into())).collect());
        self
    }

    pub fn class_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.class_names = Some(names.into_iter().map(|n| Some(n.into())).collect());
        self
    }

    pub fn fit_statistics(mut self, stats: FitStatistics) -> Self {
        self.fit_statistics = stats;
        self
    }

    /// Override the tolerance on the class-prior sum.
    ///
    /// Must be finite and in `[0, 1)`. Priors accepted under a looser
    /// tolerance are rescaled to sum to 1 when the model is built.
    pub fn prior_tolerance(mut self, tolerance: f64) -> Self {
        self.prior_tolerance = tolerance;
        self
    }

    pub fn build(mut self) -> Result<LatentClassModel, ValidationError> {
        validate_model_parts(
            &self.outcome_probabilities,
            &self.class_priors,
            self.prior_tolerance,
        )?;
        // Sum lies within (0, 2) here, so the rescale is well defined.
        let sum: f64 = self.class_priors.iter().sum();
        if sum != 1.0 {
            for prior in &mut self.class_priors {
                *prior /= sum;
            }
        }
        let (n_classes, n_indicators) = self.outcome_probabilities.dim();
        let indicators = NameIndex::resolve(
            Axis::Indicator,
            n_indicators,
            self.indicator_names.as_deref(),
        )?;
        let classes = NameIndex::resolve(Axis::Class, n_classes, self.class_names.as_deref())?;

        Ok(LatentClassModel {
            outcome_probabilities: self.outcome_probabilities,
            class_priors: self.class_priors,
            classes,
            indicators,
            fit_statistics: self.fit_statistics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_by_two() -> LatentClassModel {
        LatentClassModel::builder(array![[0.9, 0.1], [0.1, 0.9]], vec![0.5, 0.5])
            .build()
            .unwrap()
    }

    #[test]
    fn dimensions_and_fallback_names() {
        let model = two_by_two();
        assert_eq!(model.n_classes(), 2);
        assert_eq!(model.n_indicators(), 2);
        assert_eq!(model.classes().names(), &["Class_1", "Class_2"]);
        assert_eq!(model.indicators().names(), &["Test1", "Test2"]);
        assert_eq!(model.probability(1, 0), 0.1);
    }

    #[test]
    fn explicit_names_are_kept() {
        let model = LatentClassModel::builder(array![[0.8, 0.7], [0.05, 0.2]], vec![0.3, 0.7])
            .indicator_names(["pcr", "culture"])
            .class_names(["infected", "healthy"])
            .build()
            .unwrap();
        assert_eq!(model.indicators().position("culture"), Some(1));
        assert_eq!(model.classes().position("healthy"), Some(1));
    }

    #[test]
    fn indicator_name_count_mismatch_is_validation_error() {
        let err = LatentClassModel::builder(array![[0.9, 0.1], [0.1, 0.9]], vec![0.5, 0.5])
            .indicator_names(["only_one"])
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::ShapeMismatch {
                axis: Axis::Indicator,
                expected: 2,
                actual: 1
            }
        );
    }

    #[test]
    fn fit_document_round_trip_resolves_names() {
        let json = r#"{
            "outcome_probabilities": [[0.9, 0.2, 0.6], [0.1, 0.3, 0.05]],
            "class_priors": [0.25, 0.75],
            "indicator_names": ["pcr", null, "xray"],
            "bic": 1234.5
        }"#;
        let fit = ModelFit::from_json_str(json).unwrap();
        let model = fit.into_model().unwrap();
        assert_eq!(model.indicators().names(), &["pcr", "Test2", "xray"]);
        assert_eq!(model.classes().names(), &["Class_1", "Class_2"]);
        assert_eq!(model.fit_statistics().bic, Some(1234.5));

        let back = model.to_fit();
        assert_eq!(back.outcome_probabilities[1], vec![0.1, 0.3, 0.05]);
        assert_eq!(
            back.indicator_names.unwrap()[1].as_deref(),
            Some("Test2")
        );
    }

    #[test]
    fn malformed_fit_document_is_json_error() {
        let err = ModelFit::from_json_str("{\"class_priors\": [1.0]}").unwrap_err();
        assert_eq!(err.code(), 61);
    }

    #[test]
    fn fit_file_loads_and_missing_file_is_io_error() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/diagnostic_fit.json");
        let fit = ModelFit::from_file(&path).unwrap();
        assert_eq!(fit.class_priors, vec![0.22, 0.78]);

        let dir = tempfile::TempDir::new().unwrap();
        let err = ModelFit::from_file(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.code(), 60);
    }

    #[test]
    fn ragged_fit_rejected() {
        let fit = ModelFit {
            outcome_probabilities: vec![vec![0.5, 0.5], vec![0.5]],
            class_priors: vec![0.5, 0.5],
            indicator_names: None,
            class_names: None,
            bic: None,
            log_likelihood: None,
        };
        assert!(matches!(
            fit.into_model().unwrap_err(),
            ValidationError::RaggedRow { row: 1, .. }
        ));
    }

    #[test]
    fn loose_tolerance_rescales_priors() {
        let model = LatentClassModel::builder(array![[0.9], [0.1]], vec![0.5, 0.499])
            .prior_tolerance(1e-2)
            .build()
            .unwrap();
        let sum: f64 = model.class_priors().iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!((model.class_priors()[0] - 0.5 / 0.999).abs() < 1e-12);

        let model = LatentClassModel::builder(array![[0.9], [0.1]], vec![0.3, 0.3])
            .prior_tolerance(0.5)
            .build()
            .unwrap();
        assert!((model.tables().total_prevalence() - 1.0).abs() < 1e-6);
        assert_eq!(model.class_priors(), &[0.5, 0.5]);
    }

    #[test]
    fn non_finite_or_out_of_range_tolerance_rejected() {
        for tolerance in [f64::NAN, f64::INFINITY, -1e-6, 1.0, 3.0] {
            let err = LatentClassModel::builder(array![[0.9], [0.1]], vec![0.1, 0.1])
                .prior_tolerance(tolerance)
                .build()
                .unwrap_err();
            assert!(
                matches!(err, ValidationError::InvalidTolerance { .. }),
                "tolerance {tolerance}: {err}"
            );
        }
    }

    #[test]
    fn zero_tolerance_is_allowed() {
        let model = LatentClassModel::builder(array![[0.9], [0.1]], vec![0.25, 0.75])
            .prior_tolerance(0.0)
            .build()
            .unwrap();
        assert_eq!(model.class_priors(), &[0.25, 0.75]);
    }

    #[test]
    fn model_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<LatentClassModel>();
    }
}
