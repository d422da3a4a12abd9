#![allow(dead_code)]

use std::sync::Arc;

use scene_runtime::{ResourceID, ResourceKind, ResourceRegistry};

pub struct Ids {
    /// Entity component, `f32`.
    pub position: ResourceID,
    /// Entity component, `f32`.
    pub velocity: ResourceID,
    /// Entity component, `u32`.
    pub tag: ResourceID,
    /// Viewport component, `f32`.
    pub zoom: ResourceID,
    /// Viewport component, `u32`.
    pub layer: ResourceID,
    /// Scene component, `f32`.
    pub gravity: ResourceID,
    /// Event, `u32`.
    pub hit: ResourceID,
    /// Event, `u32`.
    pub click: ResourceID,
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn registry() -> (Arc<ResourceRegistry>, Ids) {
    let mut builder = ResourceRegistry::builder();
    let ids = Ids {
        position: builder.register::<f32>("Position", ResourceKind::EntityComponent).unwrap(),
        velocity: builder.register::<f32>("Velocity", ResourceKind::EntityComponent).unwrap(),
        tag: builder.register::<u32>("Tag", ResourceKind::EntityComponent).unwrap(),
        zoom: builder.register::<f32>("Zoom", ResourceKind::ViewportComponent).unwrap(),
        layer: builder.register::<u32>("Layer", ResourceKind::ViewportComponent).unwrap(),
        gravity: builder.register::<f32>("Gravity", ResourceKind::SceneComponent).unwrap(),
        hit: builder.register::<u32>("Hit", ResourceKind::Event).unwrap(),
        click: builder.register::<u32>("Click", ResourceKind::Event).unwrap(),
    };
    (builder.build(), ids)
}
