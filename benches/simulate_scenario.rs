use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use nalgebra::Vector3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use polar_axis_sim::mount::{propagate, MountRotation};
use polar_axis_sim::simulation::{simulate, simulate_batch, SimulationParams};

/// Random scenario around the reference one: site, misalignment, step and first pointing.
fn random_params(rng: &mut StdRng) -> SimulationParams {
    SimulationParams::builder()
        .latitude(rng.random_range(-70.0..70.0))
        .longitude(rng.random_range(-180.0..180.0))
        .misalignment(rng.random_range(-2.0..2.0), rng.random_range(-2.0..2.0))
        .step(rng.random_range(-60.0..60.0))
        .initial_point(rng.random_range(10.0..80.0), rng.random_range(0.0..360.0))
        .build()
        .unwrap()
}

/// Full pipeline on the reference scenario.
fn bench_reference(c: &mut Criterion) {
    let params = SimulationParams::default();
    c.bench_function("simulate/reference_scenario", |b| {
        b.iter(|| black_box(simulate(black_box(&params)).unwrap()))
    });
}

/// Rotation construction and propagation only.
fn bench_rotation(c: &mut Criterion) {
    let axis = Vector3::new(0.766, 0.013, 0.643);
    let start = Vector3::new(0.321, 0.883, 0.342);
    c.bench_function("mount/rotation_and_propagation", |b| {
        b.iter(|| {
            let rotation = MountRotation::new(black_box(&axis), black_box(0.5236)).unwrap();
            black_box(propagate(&rotation, black_box(&start)))
        })
    });
}

/// Sequential loop against the rayon batch on the same scenarios.
fn bench_batch(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0xC0FFEE);
    let samples = 1_000usize;

    c.bench_function("simulate/sequential_1000", |b| {
        b.iter_batched(
            || {
                (0..samples)
                    .map(|_| random_params(&mut rng))
                    .collect::<Vec<_>>()
            },
            |cases| {
                for params in cases.iter() {
                    black_box(simulate(params).unwrap());
                }
            },
            BatchSize::LargeInput,
        )
    });

    let cases: Vec<_> = (0..samples).map(|_| random_params(&mut rng)).collect();
    c.bench_function("simulate/batch_1000", |b| {
        b.iter(|| black_box(simulate_batch(black_box(&cases))))
    });
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_reference, bench_rotation, bench_batch
);
criterion_main!(benches);
