//! Numerically stable primitives for log-domain Bayesian math.

/// Stable log(sum(exp(values))).
///
/// Returns NEG_INFINITY for empty input or all -inf inputs.
pub fn log_sum_exp(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NEG_INFINITY;
    }
    if values.iter().any(|v| v.is_nan()) {
        return f64::NAN;
    }
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return f64::NEG_INFINITY;
    }
    if max == f64::INFINITY {
        return f64::INFINITY;
    }
    let mut sum = 0.0;
    for v in values {
        sum += (*v - max).exp();
    }
    max + sum.ln()
}

/// Normalize unnormalized log weights into log probabilities.
///
/// Returns `(log_probs, log_normalizer)` where `log_normalizer` is
/// `log_sum_exp(values)`. When the normalizer is not finite (empty input,
/// every entry -inf, NaN or +inf present) every returned log probability is
/// NaN and callers must treat the row as degenerate.
pub fn normalize_log_probs(values: &[f64]) -> (Vec<f64>, f64) {
    let log_normalizer = log_sum_exp(values);
    if !log_normalizer.is_finite() {
        return (vec![f64::NAN; values.len()], log_normalizer);
    }
    let log_probs = values.iter().map(|v| v - log_normalizer).collect();
    (log_probs, log_normalizer)
}

/// Exponentiate log probabilities back into [0, 1].
///
/// Rounding can push `exp(0 - tiny)` a hair above 1; results are clamped.
pub fn exp_probs(log_probs: &[f64]) -> Vec<f64> {
    log_probs
        .iter()
        .map(|lp| lp.exp().clamp(0.0, 1.0))
        .collect()
}

/// Clamp a probability into `[floor, 1 - floor]`.
///
/// `floor` must lie in `[0, 0.5)`; a floor of zero leaves the value untouched
/// so exact 0/1 probabilities reach the logarithm unguarded.
pub fn clamp_probability(p: f64, floor: f64) -> f64 {
    debug_assert!((0.0..0.5).contains(&floor), "floor out of range: {floor}");
    if floor <= 0.0 {
        return p;
    }
    p.clamp(floor, 1.0 - floor)
}

/// Natural log that maps non-positive inputs to NEG_INFINITY instead of NaN.
pub fn ln_or_neg_inf(value: f64) -> f64 {
    if value <= 0.0 {
        f64::NEG_INFINITY
    } else {
        value.ln()
    }
}
