//! Fuzz target for posterior scoring.
//!
//! Builds a small model and batch from arbitrary bytes; every successful
//! posterior must be a probability vector.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use lcm_core::{EngineConfig, LatentClassModel, PosteriorEngine, PosteriorQuery, SubjectRecord};

#[derive(Debug, Arbitrary)]
struct Input {
    probabilities: Vec<u16>,
    priors: Vec<u8>,
    subjects: Vec<Vec<u8>>,
    floor_exponent: u8,
}

fuzz_target!(|input: Input| {
    let k = input.priors.len().clamp(1, 4);
    let m = (input.probabilities.len() / k).clamp(1, 6);

    let matrix = ndarray::Array2::from_shape_fn((k, m), |(i, j)| {
        let raw = input.probabilities.get(i * m + j).copied().unwrap_or(0);
        f64::from(raw) / f64::from(u16::MAX)
    });
    let weights: Vec<f64> = (0..k)
        .map(|i| f64::from(input.priors.get(i).copied().unwrap_or(1)) + 1.0)
        .collect();
    let total: f64 = weights.iter().sum();
    let priors = weights.iter().map(|w| w / total).collect();

    let Ok(model) = LatentClassModel::builder(matrix, priors).build() else {
        return;
    };
    let names = model.indicators().names().to_vec();
    let subjects: Vec<SubjectRecord> = input
        .subjects
        .iter()
        .take(32)
        .enumerate()
        .map(|(i, values)| SubjectRecord::from_pattern(format!("s{i}"), names.iter(), values))
        .collect();

    let floor = if input.floor_exponent % 4 == 0 {
        0.0
    } else {
        10f64.powi(-i32::from(input.floor_exponent % 16 + 1))
    };
    let Ok(engine) = PosteriorEngine::new(EngineConfig::default().with_probability_floor(floor))
    else {
        return;
    };

    if let Ok(outcomes) = engine.infer_each(&model, &subjects, &PosteriorQuery::all()) {
        for posterior in outcomes.outcomes().iter().flatten() {
            let sum: f64 = posterior.probabilities.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
            assert!(posterior.probabilities.iter().all(|p| (0.0..=1.0).contains(p)));
        }
    }
});
