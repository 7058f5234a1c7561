//! Benchmarks for frame plan stages over long synthetic projects.
//!
//! Run with: cargo bench

use criterion::{BatchSize, Criterion};
use num_rational::Rational64;

use mpgg::{
    FramePlan, MemoryHost, PictureFlags, Project, Session, SessionOptions, classify::classify,
    loader::load_plan,
    normalize::{ceil, floor, floor_pattern},
    recovery::recover,
};

/// Roughly an hour of NTSC: alternating soft-pulldown film and telecined
/// interlaced sections.
const SECTIONS: usize = 1_000;
const SECTION_PICTURES: usize = 80;

fn ntsc() -> Rational64 {
    Rational64::new(30000, 1001)
}

fn vfr_project() -> Project {
    // TFF+RFF, BFF, BFF+RFF, TFF: ten fields per four pictures.
    let cadence = [(true, true), (false, false), (false, true), (true, false)];

    let mut pictures = Vec::with_capacity(SECTIONS * SECTION_PICTURES);
    for section in 0..SECTIONS {
        let progressive = section % 2 == 0;
        for n in 0..SECTION_PICTURES {
            let (tff, rff) = cadence[n % cadence.len()];
            pictures.push(PictureFlags::new(progressive, tff, rff));
        }
    }
    Project::from_pictures("benchmark.d2v", ntsc(), pictures)
}

fn classified(project: &Project) -> FramePlan {
    let plan = load_plan(project, project.pictures.len()).expect("Failed to build plan");
    classify(&plan, ntsc().recip() / 2).0
}

fn benchmark_loading(criterion: &mut Criterion) {
    let project = vfr_project();

    criterion.bench_function("load and classify", |bencher| {
        bencher.iter(|| classified(&project));
    });

    criterion.bench_function("open session (memory host)", |bencher| {
        bencher.iter_batched(
            || project.clone(),
            |project| Session::from_project(MemoryHost::new(), project, SessionOptions::new()),
            BatchSize::LargeInput,
        );
    });
}

fn benchmark_recovery(criterion: &mut Criterion) {
    let plan = classified(&vfr_project());

    criterion.bench_function("recover", |bencher| {
        bencher.iter(|| recover(&plan));
    });
}

fn benchmark_normalization(criterion: &mut Criterion) {
    let plan = classified(&vfr_project());
    let film = Rational64::new(24000, 1001);

    let mut group = criterion.benchmark_group("normalize");
    group.bench_function("ceil", |bencher| {
        bencher.iter(|| ceil(&plan, ntsc()).expect("Failed to ceil"));
    });
    group.bench_function("floor", |bencher| {
        bencher.iter(|| floor(&plan, film).expect("Failed to floor"));
    });
    group.bench_function("floor_pattern", |bencher| {
        bencher.iter(|| floor_pattern(&plan, 5, &[0, 1, 2, 3], film).expect("Failed to decimate"));
    });
    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_loading,
    benchmark_recovery,
    benchmark_normalization,
);
criterion::criterion_main!(benches);
