use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use scene_runtime::prelude::*;
use scene_runtime::{Identity, QueryError, SceneError};

mod common;
use common::*;

fn empty_scene() -> (Scene, Ids) {
    init_logger();
    let (registry, ids) = registry();
    let scene = Scene::new(registry, vec![], SceneConfig::default()).unwrap();
    (scene, ids)
}

#[test]
fn tick_publishes_delta_and_scaled_game_time() {
    let (mut scene, _) = empty_scene();
    assert!(scene.scene_component(DELTA_TIME).is_none());

    scene.tick(16.0);
    assert_eq!(scene.scene_component_as::<f32>(DELTA_TIME), Some(&16.0));
    let game_time = *scene.scene_component_as::<f32>(GAME_TIME).unwrap();
    assert!((game_time - 0.016).abs() < 1e-6, "game time after one tick: {game_time}");

    scene.tick(16.0);
    assert_eq!(scene.scene_component_as::<f32>(DELTA_TIME), Some(&16.0));
    let game_time = *scene.scene_component_as::<f32>(GAME_TIME).unwrap();
    assert!((game_time - 0.032).abs() < 1e-6, "game time after two ticks: {game_time}");
    assert_eq!(scene.game_time(), game_time);
}

#[test]
fn game_time_scale_is_configurable() {
    init_logger();
    let (registry, _) = registry();
    let config = SceneConfig::from_toml_str("game_time_scale = 1.0").unwrap();
    let mut scene = Scene::new(registry, vec![], config).unwrap();

    scene.tick(0.5);
    scene.tick(0.25);
    assert_eq!(scene.scene_component_as::<f32>(GAME_TIME), Some(&0.75));
}

#[test]
fn queued_spawns_land_on_next_tick() {
    let (mut scene, _) = empty_scene();
    for _ in 0..5 {
        scene.queue_spawn(EntityDescriptor::new());
    }
    assert_eq!(scene.entity_count(), 0);

    scene.tick(1.0);
    assert_eq!(scene.entity_count(), 5);
    assert_eq!(scene.pending_spawns(), 0);

    scene.tick(1.0);
    assert_eq!(scene.entity_count(), 5);
}

#[test]
fn spawn_list_output_spawns_before_next_frame() {
    init_logger();
    let (registry, ids) = registry();
    let position = ids.position;
    let spawner = FnJob::update("spawner", vec![DELTA_TIME], vec![ENTITY_SPAWN_LIST], move |_, outputs| {
        let list = outputs.get_or_init::<SpawnList>(0);
        list.push(EntityDescriptor::new().with(position, 1.0f32));
        list.push(EntityDescriptor::new());
        true
    });
    let mut scene = Scene::new(registry, vec![spawner.boxed()], SceneConfig::default()).unwrap();

    scene.tick(1.0);
    assert_eq!(scene.entity_count(), 0, "requests made during a tick wait for the next one");
    assert_eq!(scene.pending_spawns(), 2);

    scene.tick(1.0);
    assert_eq!(scene.entity_count(), 2);
    assert_eq!(scene.indexed_storage(ids.position).len(), 1);

    scene.tick(1.0);
    assert_eq!(scene.entity_count(), 4);
}

#[test]
fn despawning_absent_entities_is_harmless() {
    let (mut scene, _) = empty_scene();
    scene.queue_spawn(EntityDescriptor::new());
    scene.queue_spawn(EntityDescriptor::new());
    scene.tick(1.0);
    let first = scene.entities()[0];

    scene.queue_despawn(first);
    scene.queue_despawn(first);
    scene.queue_despawn(Identity::new(99, 0));
    assert_eq!(scene.pending_despawns(), 3);
    scene.tick(1.0);
    assert_eq!(scene.entity_count(), 1);
    assert_eq!(scene.pending_despawns(), 0);
    assert!(!scene.contains_entity(first));

    scene.queue_despawn(first);
    scene.tick(1.0);
    assert_eq!(scene.entity_count(), 1);
}

#[test]
fn despawns_apply_before_spawns() {
    let (mut scene, _) = empty_scene();
    scene.queue_spawn(EntityDescriptor::new());
    scene.tick(1.0);
    let old = scene.entities()[0];

    scene.queue_despawn(old);
    scene.queue_spawn(EntityDescriptor::new());
    scene.tick(1.0);

    let recycled = scene.entities()[0];
    assert_eq!(scene.entity_count(), 1);
    assert_eq!(recycled.index(), old.index());
    assert_ne!(recycled, old);
}

#[test]
fn events_are_seen_in_order_then_cleared() {
    init_logger();
    let (registry, ids) = registry();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let listener = FnJob::update("listener", vec![ids.hit], vec![], move |inputs, _| {
        sink.lock().unwrap().push((inputs.event_index(), *inputs.get::<u32>(0)));
        true
    });
    let mut scene = Scene::new(registry, vec![listener.boxed()], SceneConfig::default()).unwrap();

    for value in [7u32, 8, 9] {
        scene.send_event(ids.hit, value);
    }
    assert_eq!(scene.event_storage(ids.hit).count(), 3);
    assert_eq!(scene.event_storage(ids.hit).event_as::<u32>(1), Some(&8));

    scene.tick(1.0);
    assert_eq!(*seen.lock().unwrap(), vec![(Some(0), 7), (Some(1), 8), (Some(2), 9)]);
    assert_eq!(scene.event_storage(ids.hit).count(), 0);

    scene.tick(1.0);
    assert_eq!(seen.lock().unwrap().len(), 3);
}

#[test]
fn aborted_job_does_not_stop_later_jobs() {
    init_logger();
    let (registry, _) = registry();
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = runs.clone();
    let jobs = vec![
        FnJob::update("quitter", vec![DELTA_TIME], vec![], |_, _| false).boxed(),
        FnJob::update("counter", vec![DELTA_TIME], vec![], move |_, _| {
            counter.fetch_add(1, Ordering::Relaxed);
            true
        })
        .boxed(),
    ];
    let mut scene = Scene::new(registry, jobs, SceneConfig::default()).unwrap();
    assert_eq!(scene.update_jobs().collect::<Vec<_>>(), vec!["quitter", "counter"]);

    scene.tick(1.0);
    scene.tick(1.0);
    assert_eq!(runs.load(Ordering::Relaxed), 2);
}

#[test]
fn update_jobs_see_earlier_jobs_outputs() {
    init_logger();
    let (registry, ids) = registry();
    let gravity = ids.gravity;
    let jobs = vec![
        FnJob::update("write", vec![DELTA_TIME], vec![gravity], |inputs, outputs| {
            outputs.set(0, *inputs.get::<f32>(0) * 2.0);
            true
        })
        .boxed(),
        FnJob::update("double", vec![gravity], vec![gravity], |inputs, outputs| {
            outputs.set(0, *inputs.get::<f32>(0) * 2.0);
            true
        })
        .boxed(),
    ];
    let mut scene = Scene::new(registry, jobs, SceneConfig::default()).unwrap();

    scene.tick(3.0);
    assert_eq!(scene.scene_component_as::<f32>(gravity), Some(&12.0));
}

#[test]
fn invalid_job_declarations_fail_construction() {
    init_logger();
    let (registry, ids) = registry();
    let job = FnJob::update("pair", vec![ids.hit, ids.click], vec![], |_, _| true);

    match Scene::new(registry, vec![job.boxed()], SceneConfig::default()) {
        Err(SceneError::InvalidJob { job, source }) => {
            assert_eq!(job, "pair");
            assert_eq!(source, QueryError::MultipleEventInputs { first: ids.hit, second: ids.click });
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("scene accepted an invalid job"),
    }
}

#[test]
#[should_panic(expected = "writing event outputs is not implemented")]
fn jobs_declaring_event_outputs_fail_on_first_run() {
    init_logger();
    let (registry, ids) = registry();
    let emit = FnJob::update("emit", vec![DELTA_TIME], vec![ids.hit], |_, _| true);
    let mut scene = Scene::new(registry, vec![emit.boxed()], SceneConfig::default()).unwrap();
    scene.tick(1.0);
}

#[test]
fn scene_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<Scene>();
}
