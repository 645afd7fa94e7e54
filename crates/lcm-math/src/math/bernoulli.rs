//! Bernoulli log-likelihoods for binary indicators.
//!
//! Under the conditional independence assumption a latent class is fully
//! described by one positivity probability per indicator, and the joint
//! probability of an observed pattern is the product of per-indicator
//! Bernoulli terms:
//!
//! `log P(x | class) = Σ_m x_m·ln(p_m) + (1 − x_m)·ln(1 − p_m)`
//!
//! Probabilities are clamped into `[floor, 1 − floor]` before the logarithm
//! so a fitted 0% or 100% rate cannot drive a class to -inf.

use super::stable::clamp_probability;

/// Log probability of a single binary outcome under `Bernoulli(p)`.
///
/// `p` is used as-is; exact 0 or 1 yield -inf for the contradicting outcome.
pub fn log_bernoulli(positive: bool, p: f64) -> f64 {
    if positive {
        if p <= 0.0 {
            f64::NEG_INFINITY
        } else {
            p.ln()
        }
    } else if p >= 1.0 {
        f64::NEG_INFINITY
    } else {
        (-p).ln_1p()
    }
}

/// Precomputed `ln(p)` / `ln(1 − p)` pairs for one class row.
#[derive(Debug, Clone, PartialEq)]
pub struct BernoulliLogTable {
    log_positive: Vec<f64>,
    log_negative: Vec<f64>,
}

impl BernoulliLogTable {
    /// Build the table from positivity probabilities, clamping each into
    /// `[floor, 1 − floor]` first.
    pub fn from_probabilities<I>(probabilities: I, floor: f64) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut log_positive = Vec::new();
        let mut log_negative = Vec::new();
        for p in probabilities {
            let clamped = clamp_probability(p, floor);
            log_positive.push(log_bernoulli(true, clamped));
            log_negative.push(log_bernoulli(false, clamped));
        }
        Self {
            log_positive,
            log_negative,
        }
    }

    /// Number of indicators in the table.
    pub fn len(&self) -> usize {
        self.log_positive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log_positive.is_empty()
    }

    /// Log-likelihood contribution of indicator `index` for one observation.
    ///
    /// `None` marginalizes the indicator and contributes zero.
    pub fn term(&self, index: usize, observed: Option<bool>) -> f64 {
        match observed {
            Some(true) => self.log_positive[index],
            Some(false) => self.log_negative[index],
            None => 0.0,
        }
    }

    /// Conditional-independence log-likelihood of a full pattern.
    ///
    /// # Panics
    /// Panics if `pattern.len() != self.len()`.
    pub fn log_likelihood(&self, pattern: &[Option<bool>]) -> f64 {
        assert_eq!(
            pattern.len(),
            self.len(),
            "pattern length must match table length"
        );
        pattern
            .iter()
            .enumerate()
            .map(|(index, observed)| self.term(index, *observed))
            .sum()
    }
}
