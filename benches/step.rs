//! Benchmarks for one fireworks algorithm step.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use fireworks::{
    compute::{Algorithm, Problem, Randomizer, StepCounterStopCondition},
    schema::{
        AlgorithmSettings, Dimension, DynamicFireworksAlgorithmSettings,
        FireworksAlgorithmSettings, FireworksAlgorithmSettings2012, Interval, ProblemTarget,
    },
};

fn rastrigin(c: &[f64]) -> f64 {
    10.0 * c.len() as f64
        + c.iter()
            .map(|x| x * x - 10.0 * (2.0 * std::f64::consts::PI * x).cos())
            .sum::<f64>()
}

fn problem(dimensions: usize) -> Problem {
    let dimensions = (0..dimensions)
        .map(|i| Dimension::new(format!("x{i}"), Interval::new(-5.12, 5.12).unwrap()))
        .collect();
    Problem::new(dimensions, rastrigin, ProblemTarget::Minimum).unwrap()
}

fn base(locations_number: usize, modifier: f64) -> FireworksAlgorithmSettings {
    FireworksAlgorithmSettings {
        locations_number,
        explosion_sparks_number_modifier: modifier,
        ..Default::default()
    }
}

fn algorithm(settings: AlgorithmSettings, dimensions: usize) -> Algorithm {
    let mut algorithm = Algorithm::new(
        problem(dimensions),
        StepCounterStopCondition::new(u32::MAX),
        Randomizer::new(42),
        settings,
    )
    .unwrap();
    algorithm.initialize();
    algorithm
}

fn bench_variant_step(c: &mut Criterion) {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut group = c.benchmark_group("variant_step");

    let variants = [
        ("fwa", AlgorithmSettings::Fwa(base(5, 50.0))),
        (
            "efwa",
            AlgorithmSettings::Efwa(FireworksAlgorithmSettings2012 {
                base: base(5, 50.0),
                ..Default::default()
            }),
        ),
        (
            "dynfwa",
            AlgorithmSettings::DynFwa(DynamicFireworksAlgorithmSettings {
                base: base(5, 50.0),
                ..Default::default()
            }),
        ),
    ];

    for (name, settings) in variants {
        let mut algorithm = algorithm(settings, 2);
        group.bench_with_input(BenchmarkId::from_parameter(name), &name, |b, _| {
            b.iter(|| {
                black_box(algorithm.make_step().unwrap());
            });
        });
    }

    group.finish();
}

fn bench_population_size(c: &mut Criterion) {
    let mut group = c.benchmark_group("population_size");

    for locations in [5, 10, 20] {
        let settings = AlgorithmSettings::Fwa(base(locations, 200.0));
        let mut algorithm = algorithm(settings, 10);
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_fireworks", locations)),
            &locations,
            |b, _| {
                b.iter(|| {
                    black_box(algorithm.make_step().unwrap());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_variant_step, bench_population_size);
criterion_main!(benches);
