use std::any::{Any, TypeId};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use scene_runtime::engine::types::Value;
use scene_runtime::prelude::*;
use scene_runtime::TypeInfo;

mod common;

/// `u32` descriptor that counts clones and destroys.
#[derive(Default)]
struct Counted {
    clones: AtomicUsize,
    destroys: AtomicUsize,
}

impl Counted {
    fn counts(&self) -> (usize, usize) {
        (self.clones.load(Ordering::Relaxed), self.destroys.load(Ordering::Relaxed))
    }
}

impl TypeInfo for Counted {
    fn name(&self) -> &'static str { "u32" }
    fn type_id(&self) -> TypeId { TypeId::of::<u32>() }
    fn size(&self) -> usize { std::mem::size_of::<u32>() }
    fn align(&self) -> usize { std::mem::align_of::<u32>() }
    fn initialize(&self) -> Value { Box::new(0u32) }

    fn clone_value(&self, source: &dyn Any) -> Value {
        self.clones.fetch_add(1, Ordering::Relaxed);
        Box::new(*source.downcast_ref::<u32>().unwrap())
    }

    fn destroy(&self, _value: Value) {
        self.destroys.fetch_add(1, Ordering::Relaxed);
    }
}

fn counted_scene(kind: ResourceKind) -> (Scene, ResourceID, Arc<Counted>) {
    common::init_logger();
    let counted = Arc::new(Counted::default());
    let mut builder = ResourceRegistry::builder();
    let id = builder.register_with_info("Counter", kind, counted.clone()).unwrap();
    let scene = Scene::new(builder.build(), vec![], SceneConfig::default()).unwrap();
    (scene, id, counted)
}

#[test]
fn emplace_is_one_destroy_and_one_clone() {
    let (mut scene, counter, counted) = counted_scene(ResourceKind::SceneComponent);

    scene.emplace_scene_component(counter, 1u32);
    assert_eq!(counted.counts(), (1, 0));
    scene.emplace_scene_component(counter, 2u32);
    assert_eq!(counted.counts(), (2, 1));
    assert_eq!(scene.scene_component_as::<u32>(counter), Some(&2));

    drop(scene);
    assert_eq!(counted.counts(), (2, 2));
}

#[test]
fn committed_outputs_are_cloned_in_and_scratch_destroyed() {
    let (mut scene, counter, counted) = counted_scene(ResourceKind::SceneComponent);
    scene.emplace_scene_component(counter, 1u32);

    scene
        .iterate(&[], &[counter], |_, outputs| {
            outputs.set(0, 5u32);
            true
        })
        .unwrap();

    // old value destroyed, new value cloned in, scratch buffer destroyed
    assert_eq!(counted.counts(), (2, 2));
    assert_eq!(scene.scene_component_as::<u32>(counter), Some(&5));
}

#[test]
fn one_scratch_buffer_serves_every_match() {
    let (mut scene, counter, counted) = counted_scene(ResourceKind::EntityComponent);
    for value in 0..4u32 {
        scene.queue_spawn(EntityDescriptor::new().with(counter, value));
    }
    scene.tick(1.0);
    assert_eq!(counted.counts(), (4, 0));

    let completed = scene
        .iterate(&[counter], &[counter], |inputs, outputs| {
            outputs.set(0, inputs.get::<u32>(0) + 10);
            true
        })
        .unwrap();

    // one destroy + clone per commit, the shared scratch buffer destroyed once
    assert!(completed);
    assert_eq!(counted.counts(), (8, 5));
    let entities = scene.entities().to_vec();
    let values: Vec<u32> = entities
        .iter()
        .map(|&entity| *scene.indexed_storage(counter).component_as::<u32>(entity).unwrap())
        .collect();
    assert_eq!(values, vec![10, 11, 12, 13]);
}

#[test]
fn aborted_scratch_is_destroyed_not_committed() {
    let (mut scene, counter, counted) = counted_scene(ResourceKind::SceneComponent);

    let completed = scene
        .iterate(&[], &[counter], |_, outputs| {
            *outputs.get_or_init::<u32>(0) += 7;
            false
        })
        .unwrap();

    assert!(!completed);
    assert_eq!(counted.counts(), (0, 1));
    assert!(scene.scene_component(counter).is_none());
}

#[test]
fn dropping_the_scene_destroys_entity_components() {
    let (mut scene, counter, counted) = counted_scene(ResourceKind::EntityComponent);
    for value in 0..3u32 {
        scene.queue_spawn(EntityDescriptor::new().with(counter, value));
    }
    scene.tick(1.0);
    assert_eq!(counted.counts(), (3, 0));

    drop(scene);
    assert_eq!(counted.counts(), (3, 3));
}

#[test]
fn events_are_destroyed_when_cleared() {
    let (mut scene, counter, counted) = counted_scene(ResourceKind::Event);
    scene.send_event(counter, 1u32);
    scene.send_event(counter, 2u32);
    assert_eq!(scene.event_storage(counter).count(), 2);

    scene.tick(1.0);
    assert_eq!(scene.event_storage(counter).count(), 0);
    assert_eq!(counted.counts(), (2, 2));
}
