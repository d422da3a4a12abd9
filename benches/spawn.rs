use std::hint::black_box;

use criterion::*;
use scene_runtime::prelude::*;

mod common;
use common::*;

fn spawn_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("spawn");

    group.bench_function("queue_and_apply_100k_agents", |b| {
        b.iter(|| {
            let (scene, _) = setup_scene(AGENTS_MED, |_| Vec::new());
            black_box(scene.entity_count())
        });
    });

    group.bench_function("spawn_list_job_10k_per_tick", |b| {
        let (mut scene, _) = setup_scene(0, |ids| {
            let template = agent(ids);
            vec![FnJob::update(
                "spawner",
                vec![DELTA_TIME],
                vec![ENTITY_SPAWN_LIST],
                move |_, outputs| {
                    let list = outputs.get_or_init::<SpawnList>(0);
                    for _ in 0..AGENTS_SMALL {
                        list.push(template.clone());
                    }
                    true
                },
            )
            .boxed()]
        });
        b.iter(|| {
            scene.tick(black_box(16.0));
            black_box(scene.entity_count())
        });
    });

    group.finish();
}

criterion_group!(benches, spawn_benchmark);
criterion_main!(benches);
