#![allow(dead_code)]

use std::sync::Arc;

use scene_runtime::prelude::*;

pub const AGENTS_SMALL: usize = 10_000;
pub const AGENTS_MED: usize = 100_000;

#[derive(Clone, Copy, Default)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Default)]
pub struct Wealth {
    pub value: f32,
}

#[derive(Clone, Copy, Default)]
pub struct Productivity {
    pub rate: f32,
}

pub struct Ids {
    pub position: ResourceID,
    pub wealth: ResourceID,
    pub productivity: ResourceID,
}

pub fn make_registry() -> (Arc<ResourceRegistry>, Ids) {
    let mut builder = ResourceRegistry::builder();
    let ids = Ids {
        position: builder.register::<Position>("Position", ResourceKind::EntityComponent).unwrap(),
        wealth: builder.register::<Wealth>("Wealth", ResourceKind::EntityComponent).unwrap(),
        productivity: builder
            .register::<Productivity>("Productivity", ResourceKind::EntityComponent)
            .unwrap(),
    };
    (builder.build(), ids)
}

pub fn agent(ids: &Ids) -> EntityDescriptor {
    EntityDescriptor::new()
        .with(ids.position, Position { x: 0.0, y: 0.0 })
        .with(ids.wealth, Wealth { value: 100.0 })
        .with(ids.productivity, Productivity { rate: 1.0 })
}

/// Builds a scene with `jobs` and `agent_count` fully populated agents.
pub fn setup_scene(agent_count: usize, jobs: impl FnOnce(&Ids) -> Vec<Box<dyn Job>>) -> (Scene, Ids) {
    let (registry, ids) = make_registry();
    let jobs = jobs(&ids);
    let config = SceneConfig { entity_capacity: agent_count, ..SceneConfig::default() };
    let mut scene = Scene::new(registry, jobs, config).unwrap();
    for _ in 0..agent_count {
        scene.queue_spawn(agent(&ids));
    }
    scene.tick(0.0);
    (scene, ids)
}
