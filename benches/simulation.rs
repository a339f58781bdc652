use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use fmu_explore::prelude::*;

fn setup_session(backend: Backend) -> Session {
    let config = SessionConfigBuilder::default()
        .backend(backend)
        .marker(SessionConfig::for_backend(backend).marker)
        .options(SimulateOptions::fast())
        .build()
        .expect("Failed to build session configuration");
    let application = yeast_batch(config.marker);
    Session::for_unit(yeast_batch_unit(config.marker), config, application)
}

fn benchmark_simulation(c: &mut Criterion) {
    let mut instance = setup_session(Backend::Instance);
    let mut oneshot = setup_session(Backend::OneShot);

    c.bench_function("instance_init", |b| {
        b.iter(|| {
            let _ = black_box(instance.simu().horizon(black_box(12.0)).call());
        });
    });

    c.bench_function("oneshot_init", |b| {
        b.iter(|| {
            let _ = black_box(oneshot.simu().horizon(black_box(12.0)).call());
        });
    });

    c.bench_function("oneshot_continue", |b| {
        b.iter(|| {
            let _ = black_box(
                oneshot
                    .simu()
                    .mode(RunMode::Continued)
                    .horizon(black_box(1.0))
                    .call(),
            );
        });
    });

    let unit = yeast_batch_unit(InitialValueMarker::Start);
    let options = SimulateOptions::standard();
    c.bench_function("engine_rk5", |b| {
        let options = SimulateOptionsBuilder::default()
            .solver(Solver::RK5)
            .build()
            .expect("Failed to build simulate options");
        let mut engine = OneShotEngine::new(unit.clone());
        b.iter(|| {
            let _ = black_box(engine.simulate(0.0, 12.0, black_box(&options)));
        });
    });

    c.bench_function("engine_rk4", |b| {
        let mut engine = OneShotEngine::new(unit.clone());
        b.iter(|| {
            let _ = black_box(engine.simulate(0.0, 12.0, black_box(&options)));
        });
    });
}

criterion_group!(benches, benchmark_simulation);
criterion_main!(benches);
