//! # Commands
//!
//! Deferred structural requests against the scene's entity pool.
//!
//! Jobs never create or remove entities directly. They produce spawn requests
//! (by writing an [`SpawnList`] output) and the embedder queues despawns; both
//! are recorded here and applied at the start of the next tick, despawns
//! first, then spawns.
//!
//! ## Invariants
//! - Requests are applied in the order they were recorded.
//! - Despawning an identity that is no longer live is a no-op.
//! - The queue is empty after every application.

use std::any::Any;
use std::sync::Arc;

use crate::engine::entity::Entity;
use crate::engine::types::ResourceID;


/// Initial value for one entity component of a spawned entity.
#[derive(Clone)]
pub struct ComponentInit {
    /// Entity-component resource receiving the value.
    pub resource: ResourceID,

    /// Value to clone into the resource's storage.
    pub value: Arc<dyn Any + Send + Sync>,
}

/// Describes an entity to create before the next tick.
#[derive(Clone, Default)]
pub struct EntityDescriptor {
    /// Components emplaced on the new entity.
    pub components: Vec<ComponentInit>,
}

impl EntityDescriptor {
    /// An entity with no initial components.
    pub fn new() -> Self { Self::default() }

    /// Adds an initial component value (builder-style).
    pub fn with<T: Any + Send + Sync>(mut self, resource: ResourceID, value: T) -> Self {
        self.components.push(ComponentInit { resource, value: Arc::new(value) });
        self
    }
}

/// Dynamic list of spawn requests.
///
/// This is the element type of `EntitySpawnList` resources: a job writes a
/// `SpawnList` output and every descriptor in it becomes one entity.
#[derive(Clone, Default)]
pub struct SpawnList {
    descriptors: Vec<EntityDescriptor>,
}

impl SpawnList {
    /// An empty list.
    pub fn new() -> Self { Self::default() }

    /// Number of requests.
    #[inline]
    pub fn len(&self) -> usize { self.descriptors.len() }

    /// Returns `true` if the list holds no requests.
    #[inline]
    pub fn is_empty(&self) -> bool { self.descriptors.is_empty() }

    /// Appends one request.
    pub fn push(&mut self, descriptor: EntityDescriptor) {
        self.descriptors.push(descriptor);
    }

    /// Moves every request of `other` to the end of this list.
    ///
    /// Returns `true` if anything was appended.
    pub fn append(&mut self, other: &mut SpawnList) -> bool {
        let appended = !other.is_empty();
        self.descriptors.append(&mut other.descriptors);
        appended
    }

    /// Returns the request at `index`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&EntityDescriptor> {
        self.descriptors.get(index)
    }

    /// Removes every request.
    pub fn clear(&mut self) { self.descriptors.clear(); }

    /// Removes and yields every request in order.
    pub fn drain(&mut self) -> impl Iterator<Item = EntityDescriptor> + '_ {
        self.descriptors.drain(..)
    }
}

/// Dynamic list of despawn requests.
#[derive(Clone, Default, Debug)]
pub struct DespawnList {
    entities: Vec<Entity>,
}

impl DespawnList {
    /// An empty list.
    pub fn new() -> Self { Self::default() }

    /// Number of requests.
    #[inline]
    pub fn len(&self) -> usize { self.entities.len() }

    /// Returns `true` if the list holds no requests.
    #[inline]
    pub fn is_empty(&self) -> bool { self.entities.is_empty() }

    /// Appends one request.
    pub fn push(&mut self, entity: Entity) { self.entities.push(entity); }

    /// Removes and yields every request in order.
    pub fn drain(&mut self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.drain(..)
    }
}

/// A deferred structural request.
pub enum Command {
    /// Create one entity described by `descriptor`.
    Spawn {
        /// Entity to create.
        descriptor: EntityDescriptor,
    },

    /// Remove `entity` if it is still live.
    Despawn {
        /// Entity to remove.
        entity: Entity,
    },
}

/// Pending requests for the next tick.
#[derive(Default)]
pub struct CommandQueue {
    spawns: SpawnList,
    despawns: DespawnList,
}

impl CommandQueue {
    /// An empty queue.
    pub fn new() -> Self { Self::default() }

    /// Records a request.
    pub fn push(&mut self, command: Command) {
        match command {
            Command::Spawn { descriptor } => self.spawns.push(descriptor),
            Command::Despawn { entity } => self.despawns.push(entity),
        }
    }

    /// Appends a whole spawn list; returns `true` if anything was added.
    pub fn append_spawns(&mut self, list: &mut SpawnList) -> bool {
        self.spawns.append(list)
    }

    /// Pending spawn requests.
    #[inline]
    pub fn spawns(&self) -> &SpawnList { &self.spawns }

    /// Pending despawn requests.
    #[inline]
    pub fn despawns(&self) -> &DespawnList { &self.despawns }

    /// Splits the queue into its two request lists for draining.
    pub fn lists_mut(&mut self) -> (&mut DespawnList, &mut SpawnList) {
        (&mut self.despawns, &mut self.spawns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::entity::Identity;

    #[test]
    fn append_moves_requests_and_reports_change() {
        let mut pending = SpawnList::new();
        let mut produced = SpawnList::new();
        assert!(!pending.append(&mut produced));

        produced.push(EntityDescriptor::new());
        produced.push(EntityDescriptor::new().with(7, 1.5f32));
        assert!(pending.append(&mut produced));
        assert_eq!(pending.len(), 2);
        assert!(produced.is_empty());
        assert_eq!(pending.get(1).map(|d| d.components.len()), Some(1));
    }

    #[test]
    fn commands_route_to_their_lists() {
        let mut queue = CommandQueue::new();
        queue.push(Command::Spawn { descriptor: EntityDescriptor::new() });
        queue.push(Command::Despawn { entity: Identity::new(3, 0) });
        queue.push(Command::Despawn { entity: Identity::new(4, 0) });

        assert_eq!(queue.spawns().len(), 1);
        assert_eq!(queue.despawns().len(), 2);

        let (despawns, spawns) = queue.lists_mut();
        assert_eq!(despawns.drain().count(), 2);
        spawns.clear();
        assert!(queue.spawns().is_empty() && queue.despawns().is_empty());
    }
}
