//! # Scene Runtime
//!
//! Data-oriented scene runtime built around type-erased resources.
//!
//! A scene owns one storage per registered resource (scene-wide values,
//! per-viewport and per-entity components, per-tick events and structural
//! request lists) and advances through discrete ticks. Each tick applies
//! deferred despawns and spawns, publishes the frame's delta time and game
//! time, then runs the update jobs. A job declares the resources it reads and
//! writes; the runtime invokes it once per (event, viewport, entity) match and
//! commits its outputs after every match.
//!
//! ## Design Goals
//! - Runtime-registered resources described by [`TypeInfo`] descriptors
//! - Deterministic, sequential job execution
//! - Deferred structural changes applied at tick boundaries
//! - Explicit, reportable failures for bad job declarations

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_inception)]
#![deny(dead_code)]

pub mod engine;
pub mod profiling;

// ─────────────────────────────────────────────────────────────────────────────
// Re-exports (Public API)
// ─────────────────────────────────────────────────────────────────────────────

pub use engine::scene::{Scene, SceneData};

pub use engine::resource::{
    ResourceDescriptor,
    ResourceRegistry,
    ResourceRegistryBuilder,
    DELTA_TIME,
    GAME_TIME,
    ENTITY_SPAWN_LIST,
    ENTITY_DESPAWN_LIST,
};

pub use engine::type_info::{TypeInfo, TypedInfo};

pub use engine::entity::{Entity, Identity, IdPool, Viewport};

pub use engine::commands::{
    Command,
    CommandQueue,
    ComponentInit,
    DespawnList,
    EntityDescriptor,
    SpawnList,
};

pub use engine::query::{Inputs, QueryPlan, Slot};
pub use engine::scratch::Outputs;

pub use engine::job::{FnJob, Job};
pub use engine::scheduler::Scheduler;

pub use engine::config::SceneConfig;

pub use engine::error::{
    ConfigError,
    QueryError,
    RegistryError,
    SceneError,
    SceneResult,
};

pub use engine::types::{
    JobKind,
    ResourceID,
    ResourceKind,
};

// ─────────────────────────────────────────────────────────────────────────────
// Prelude
// ─────────────────────────────────────────────────────────────────────────────

/// Commonly used scene types.
///
/// Import with:
/// ```rust
/// use scene_runtime::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Scene,
        SceneConfig,
        ResourceRegistry,
        ResourceKind,
        ResourceID,
        Entity,
        Viewport,
        EntityDescriptor,
        SpawnList,
        Inputs,
        Outputs,
        FnJob,
        Job,
        JobKind,
        SceneResult,
        DELTA_TIME,
        GAME_TIME,
        ENTITY_SPAWN_LIST,
        ENTITY_DESPAWN_LIST,
    };
}
