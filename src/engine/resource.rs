//! # Resource Registry
//!
//! This module provides the table that assigns dense [`ResourceID`] values to
//! every resource a scene manages and records each resource's kind and element
//! [`TypeInfo`].
//!
//! ## Design
//! - Resources are registered through a [`ResourceRegistryBuilder`] and receive
//!   compact ids in `[0, RESOURCE_CAP)` in registration order.
//! - [`ResourceRegistryBuilder::build`] freezes the table into an immutable,
//!   shareable [`ResourceRegistry`] that scenes receive by `Arc`.
//! - The builder pre-registers the built-in resources the scene itself writes
//!   or consumes: [`DELTA_TIME`], [`GAME_TIME`], [`ENTITY_SPAWN_LIST`] and
//!   [`ENTITY_DESPAWN_LIST`].
//!
//! ## Invariants
//! - Ids are dense and equal to the descriptor's position in the table.
//! - Names are unique.
//! - A built registry never changes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::engine::commands::{DespawnList, SpawnList};
use crate::engine::error::RegistryError;
use crate::engine::type_info::{DisplayTypeInfo, TypeInfo, TypedInfo};
use crate::engine::types::{ResourceID, ResourceKind, RESOURCE_CAP};


/// Frame delta time in milliseconds (`f32` scene component).
pub const DELTA_TIME: ResourceID = 0;
/// Accumulated game time (`f32` scene component).
pub const GAME_TIME: ResourceID = 1;
/// Built-in spawn request list (`SpawnList`).
pub const ENTITY_SPAWN_LIST: ResourceID = 2;
/// Built-in despawn request list (`DespawnList`).
pub const ENTITY_DESPAWN_LIST: ResourceID = 3;

/// Describes one registered resource.
#[derive(Clone)]
pub struct ResourceDescriptor {
    /// Dense identifier, also the index into the scene's storage table.
    pub id: ResourceID,

    /// Unique human-readable name.
    pub name: &'static str,

    /// Storage shape of the resource.
    pub kind: ResourceKind,

    /// Capability set of the element type.
    pub type_info: Arc<dyn TypeInfo>,
}

impl fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("type", &self.type_info.name())
            .finish()
    }
}

impl fmt::Display for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "resource {} `{}` ({}, {})",
            self.id,
            self.name,
            self.kind,
            DisplayTypeInfo(self.type_info.as_ref())
        )
    }
}

/// Immutable table of resource descriptors.
#[derive(Debug)]
pub struct ResourceRegistry {
    descriptors: Vec<ResourceDescriptor>,
    by_name: HashMap<&'static str, ResourceID>,
}

impl ResourceRegistry {
    /// Starts a new registry with the built-in resources already registered.
    pub fn builder() -> ResourceRegistryBuilder {
        ResourceRegistryBuilder::new()
    }

    /// Number of registered resources.
    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if no resources are registered (never the case for a
    /// registry produced by the builder).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Returns the descriptor for `id`, if registered.
    #[inline]
    pub fn get(&self, id: ResourceID) -> Option<&ResourceDescriptor> {
        self.descriptors.get(id as usize)
    }

    /// Returns the descriptor for `id`.
    ///
    /// ## Panics
    /// Panics if `id` is not registered.
    pub fn descriptor(&self, id: ResourceID) -> &ResourceDescriptor {
        match self.descriptors.get(id as usize) {
            Some(descriptor) => descriptor,
            None => panic!("resource {id} is not registered ({} resources)", self.descriptors.len()),
        }
    }

    /// Looks a resource up by its registered name.
    pub fn id_of(&self, name: &str) -> Option<ResourceID> {
        self.by_name.get(name).copied()
    }

    /// Iterates over all descriptors in id order.
    pub fn iter(&self) -> impl Iterator<Item = &ResourceDescriptor> {
        self.descriptors.iter()
    }
}

/// Mutable registration phase of a [`ResourceRegistry`].
pub struct ResourceRegistryBuilder {
    descriptors: Vec<ResourceDescriptor>,
    by_name: HashMap<&'static str, ResourceID>,
}

impl ResourceRegistryBuilder {
    fn new() -> Self {
        let mut builder = Self { descriptors: Vec::new(), by_name: HashMap::new() };
        builder.push("DeltaTime", ResourceKind::SceneComponent, TypedInfo::<f32>::shared());
        builder.push("GameTime", ResourceKind::SceneComponent, TypedInfo::<f32>::shared());
        builder.push("EntitySpawnList", ResourceKind::EntitySpawnList, TypedInfo::<SpawnList>::shared());
        builder.push("EntityDespawnList", ResourceKind::EntityDespawnList, TypedInfo::<DespawnList>::shared());
        debug_assert_eq!(builder.by_name["DeltaTime"], DELTA_TIME);
        debug_assert_eq!(builder.by_name["GameTime"], GAME_TIME);
        debug_assert_eq!(builder.by_name["EntitySpawnList"], ENTITY_SPAWN_LIST);
        debug_assert_eq!(builder.by_name["EntityDespawnList"], ENTITY_DESPAWN_LIST);
        builder
    }

    fn push(&mut self, name: &'static str, kind: ResourceKind, type_info: Arc<dyn TypeInfo>) -> ResourceID {
        let id = self.descriptors.len() as ResourceID;
        self.by_name.insert(name, id);
        self.descriptors.push(ResourceDescriptor { id, name, kind, type_info });
        id
    }

    /// Registers a resource of element type `T`.
    ///
    /// ## Errors
    /// - [`RegistryError::DuplicateName`] if `name` is taken.
    /// - [`RegistryError::CapacityExceeded`] if `RESOURCE_CAP` is reached.
    pub fn register<T>(&mut self, name: &'static str, kind: ResourceKind) -> Result<ResourceID, RegistryError>
    where
        T: Clone + Default + Send + 'static,
    {
        self.register_with_info(name, kind, TypedInfo::<T>::shared())
    }

    /// Registers a resource with an explicit type descriptor.
    pub fn register_with_info(
        &mut self,
        name: &'static str,
        kind: ResourceKind,
        type_info: Arc<dyn TypeInfo>,
    ) -> Result<ResourceID, RegistryError> {
        if let Some(&existing) = self.by_name.get(name) {
            return Err(RegistryError::DuplicateName { name, existing });
        }
        if self.descriptors.len() >= RESOURCE_CAP {
            return Err(RegistryError::CapacityExceeded { capacity: RESOURCE_CAP });
        }
        Ok(self.push(name, kind, type_info))
    }

    /// Freezes the table.
    pub fn build(self) -> Arc<ResourceRegistry> {
        Arc::new(ResourceRegistry { descriptors: self.descriptors, by_name: self.by_name })
    }
}
