use criterion::*;
use std::hint::black_box;

use scene_runtime::prelude::*;

mod common;
use common::*;

fn economy_jobs(ids: &Ids) -> Vec<Box<dyn Job>> {
    vec![
        // wealth += productivity * dt
        FnJob::update(
            "production",
            vec![DELTA_TIME, ids.productivity, ids.wealth],
            vec![ids.wealth],
            |inputs, outputs| {
                let dt = *inputs.get::<f32>(0);
                let rate = inputs.get::<Productivity>(1).rate;
                let wealth = inputs.get::<Wealth>(2).value;
                outputs.set(0, Wealth { value: wealth + rate * dt });
                true
            },
        )
        .boxed(),
        FnJob::update("decay", vec![ids.wealth], vec![ids.wealth], |inputs, outputs| {
            outputs.set(0, Wealth { value: inputs.get::<Wealth>(0).value * 0.999 });
            true
        })
        .boxed(),
    ]
}

fn tick_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("tick");

    group.bench_function("tick_2_jobs_10k", |b| {
        let (mut scene, _) = setup_scene(AGENTS_SMALL, economy_jobs);
        b.iter(|| {
            scene.tick(black_box(16.0));
        });
    });

    group.bench_function("tick_2_jobs_100k", |b| {
        let (mut scene, _) = setup_scene(AGENTS_MED, economy_jobs);
        b.iter(|| {
            scene.tick(black_box(16.0));
        });
    });

    group.finish();
}

criterion_group!(benches, tick_benchmark);
criterion_main!(benches);
