//! Structural validation of latent class model parts.

use ndarray::Array2;

use crate::error::ValidationError;
use crate::naming::Axis;

/// Tolerance for the class-prior sum when none is configured.
pub const PRIOR_SUM_TOLERANCE: f64 = 1e-6;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Turn row-major nested rows into a K×M matrix, rejecting ragged input.
pub fn matrix_from_rows(rows: &[Vec<f64>]) -> ValidationResult<Array2<f64>> {
    let classes = rows.len();
    if classes == 0 {
        return Err(ValidationError::EmptyAxis { axis: Axis::Class });
    }
    let indicators = rows[0].len();
    let mut flat = Vec::with_capacity(classes * indicators);
    for (row, values) in rows.iter().enumerate() {
        if values.len() != indicators {
            return Err(ValidationError::RaggedRow {
                row,
                expected: indicators,
                actual: values.len(),
            });
        }
        flat.extend_from_slice(values);
    }
    Array2::from_shape_vec((classes, indicators), flat).map_err(|_| {
        ValidationError::ShapeMismatch {
            axis: Axis::Indicator,
            expected: indicators,
            actual: 0,
        }
    })
}

/// Validate the outcome-probability matrix against the class priors.
///
/// Checks, in order: the tolerance itself, non-empty axes, prior length = row count, every
/// probability finite in [0, 1], every prior finite in [0, 1], and the prior
/// sum within `tolerance` of 1.
pub fn validate_model_parts(
    outcome_probabilities: &Array2<f64>,
    class_priors: &[f64],
    tolerance: f64,
) -> ValidationResult<()> {
    if !tolerance.is_finite() || !(0.0..1.0).contains(&tolerance) {
        return Err(ValidationError::InvalidTolerance { tolerance });
    }
    let (classes, indicators) = outcome_probabilities.dim();
    if classes == 0 {
        return Err(ValidationError::EmptyAxis { axis: Axis::Class });
    }
    if indicators == 0 {
        return Err(ValidationError::EmptyAxis {
            axis: Axis::Indicator,
        });
    }
    if class_priors.len() != classes {
        return Err(ValidationError::ShapeMismatch {
            axis: Axis::Class,
            expected: classes,
            actual: class_priors.len(),
        });
    }

    for ((class, indicator), &value) in outcome_probabilities.indexed_iter() {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::ProbabilityOutOfRange {
                class,
                indicator,
                value,
            });
        }
    }

    for (class, &value) in class_priors.iter().enumerate() {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::PriorOutOfRange { class, value });
        }
    }

    let sum: f64 = class_priors.iter().sum();
    if (sum - 1.0).abs() > tolerance {
        return Err(ValidationError::PriorSum { sum, tolerance });
    }

    Ok(())
}
