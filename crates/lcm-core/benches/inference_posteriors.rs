//! Criterion benchmarks for the batch posterior path in `lcm-core`.
//!
//! Synthetic models and subjects only, so runs are deterministic.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lcm_core::{EngineConfig, LatentClassModel, PosteriorEngine, PosteriorQuery, SubjectRecord};
use ndarray::Array2;

fn synthetic_model(classes: usize, indicators: usize) -> LatentClassModel {
    let matrix = Array2::from_shape_fn((classes, indicators), |(k, m)| {
        // Spread rates over (0.05, 0.95) so no class is a copy of another.
        0.05 + 0.9 * (((k * 7 + m * 3) % 11) as f64) / 10.0
    });
    let priors = vec![1.0 / classes as f64; classes];
    LatentClassModel::builder(matrix, priors)
        .build()
        .expect("synthetic model is valid")
}

fn synthetic_subjects(model: &LatentClassModel, n: usize) -> Vec<SubjectRecord> {
    let names = model.indicators().names();
    (0..n)
        .map(|i| {
            let values: Vec<u8> = (0..names.len())
                .map(|m| u8::from((i * 31 + m * 17) % 5 < 2))
                .collect();
            SubjectRecord::from_pattern(format!("s{i}"), names.iter(), &values)
        })
        .collect()
}

fn bench_infer(c: &mut Criterion) {
    let mut group = c.benchmark_group("posterior");

    for (classes, indicators) in [(2usize, 4usize), (4, 8), (8, 16)] {
        let model = synthetic_model(classes, indicators);
        let subjects = synthetic_subjects(&model, 256);
        group.bench_with_input(
            BenchmarkId::new("infer_full_256", format!("k{classes}_m{indicators}")),
            &subjects,
            |b, subjects| {
                let engine = PosteriorEngine::default();
                b.iter(|| {
                    let matrix = engine
                        .infer_full(black_box(&model), black_box(subjects), &PosteriorQuery::all())
                        .expect("posterior should compute");
                    black_box(matrix.len());
                })
            },
        );
    }

    // Throughput for a 10k batch, serial versus rayon.
    let model = synthetic_model(3, 6);
    let subjects = synthetic_subjects(&model, 10_000);
    for (label, threshold) in [("serial", usize::MAX), ("parallel", 1)] {
        let engine = PosteriorEngine::new(EngineConfig::default().with_parallel_threshold(threshold))
            .expect("valid config");
        group.bench_function(BenchmarkId::new("infer_full_10k", label), |b| {
            b.iter(|| {
                let matrix = engine
                    .infer_full(&model, black_box(&subjects), &PosteriorQuery::all())
                    .expect("posterior should compute");
                black_box(matrix.expected_class_sizes());
            })
        });
    }

    group.finish();
}

fn bench_explain(c: &mut Criterion) {
    let model = synthetic_model(4, 8);
    let subject = synthetic_subjects(&model, 1).remove(0);
    let engine = PosteriorEngine::default();
    c.bench_function("explain_single", |b| {
        b.iter(|| {
            let explanation = engine
                .explain(black_box(&model), black_box(&subject), &PosteriorQuery::all())
                .expect("explanation should compute");
            black_box(explanation.log_odds(0, 1));
        })
    });
}

criterion_group!(benches, bench_infer, bench_explain);
criterion_main!(benches);
