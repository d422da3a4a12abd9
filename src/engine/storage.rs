//! Kind-polymorphic resource storage.
//!
//! Every registered resource owns exactly one storage, chosen by its
//! [`ResourceKind`]:
//!
//! | kind                         | storage                     |
//! |------------------------------|-----------------------------|
//! | `SceneComponent`             | [`SceneComponentStorage`]   |
//! | `ViewportComponent`          | [`IndexedComponentStorage`] |
//! | `EntityComponent`            | [`IndexedComponentStorage`] |
//! | `Event`                      | [`EventStorage`]            |
//! | `EntitySpawnList` / `Despawn`| [`RequestListStorage`]      |
//!
//! All storages sit behind the [`ResourceStorage`] trait so the scene can keep
//! them in one table indexed by resource id. Callers that need a particular
//! shape downcast through [`downcast_storage`] / [`downcast_storage_mut`];
//! asking for the wrong shape is a programmer error and panics.
//!
//! # Value lifecycle
//!
//! Storages never construct, copy or drop values themselves. They go through
//! the resource's [`TypeInfo`](crate::engine::type_info::TypeInfo):
//!
//! - `emplace` destroys the current occupant (if any) and then clones the new
//!   value in, so every emplace is exactly one destroy + one clone;
//! - `clear` destroys every held value.
//!
//! References returned by the read accessors borrow the storage and are
//! therefore invalidated by the next mutation.

use std::any::{type_name, Any};

use crate::engine::entity::Identity;
use crate::engine::resource::ResourceDescriptor;
use crate::engine::type_info::TypeInfo;
use crate::engine::types::{ResourceKind, Value};


/// Common interface of all storage shapes.
pub trait ResourceStorage: Any + Send {
    /// Descriptor of the resource this storage backs.
    fn descriptor(&self) -> &ResourceDescriptor;

    /// Returns `self` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Returns `self` for mutable downcasting.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Drops values that only live for one tick. Only events do anything here.
    fn end_tick(&mut self) {}
}

/// Creates the storage matching `descriptor.kind`.
pub fn make_storage(descriptor: &ResourceDescriptor) -> Box<dyn ResourceStorage> {
    let descriptor = descriptor.clone();
    match descriptor.kind {
        ResourceKind::SceneComponent => Box::new(SceneComponentStorage::new(descriptor)),
        ResourceKind::ViewportComponent | ResourceKind::EntityComponent => {
            Box::new(IndexedComponentStorage::new(descriptor))
        }
        ResourceKind::Event => Box::new(EventStorage::new(descriptor)),
        ResourceKind::EntitySpawnList | ResourceKind::EntityDespawnList => {
            Box::new(RequestListStorage::new(descriptor))
        }
    }
}

/// Downcasts a storage to shape `S`.
///
/// ## Panics
/// Panics if the storage is not an `S`.
pub fn downcast_storage<S: ResourceStorage>(storage: &dyn ResourceStorage) -> &S {
    match storage.as_any().downcast_ref::<S>() {
        Some(storage) => storage,
        None => panic!(
            "{} is not backed by a {}",
            storage.descriptor(),
            type_name::<S>()
        ),
    }
}

/// Downcasts a storage to shape `S` mutably.
///
/// ## Panics
/// Panics if the storage is not an `S`.
pub fn downcast_storage_mut<S: ResourceStorage>(storage: &mut dyn ResourceStorage) -> &mut S {
    if !storage.as_any().is::<S>() {
        panic!("{} is not backed by a {}", storage.descriptor(), type_name::<S>());
    }
    match storage.as_any_mut().downcast_mut::<S>() {
        Some(storage) => storage,
        None => unreachable!(),
    }
}

fn check_type(descriptor: &ResourceDescriptor, value: &dyn Any) {
    assert!(
        value.type_id() == TypeInfo::type_id(&*descriptor.type_info),
        "value written to {} is not a `{}`",
        descriptor,
        descriptor.type_info.name()
    );
}

/// Zero-or-one value shared by the whole scene.
pub struct SceneComponentStorage {
    descriptor: ResourceDescriptor,
    value: Option<Value>,
}

impl SceneComponentStorage {
    /// An empty storage.
    pub fn new(descriptor: ResourceDescriptor) -> Self {
        Self { descriptor, value: None }
    }

    /// Current value, or `None` if never emplaced.
    #[inline]
    pub fn get(&self) -> Option<&dyn Any> {
        self.value.as_deref().map(|value| value as &dyn Any)
    }

    /// Current value downcast to `T`.
    #[inline]
    pub fn get_as<T: 'static>(&self) -> Option<&T> {
        self.value.as_deref().and_then(|value| value.downcast_ref::<T>())
    }

    /// Returns `true` once a value has been emplaced.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    /// Overwrites the value with a clone of `value`.
    ///
    /// ## Panics
    /// Panics if `value` is not of the resource's element type.
    pub fn emplace(&mut self, value: &dyn Any) {
        check_type(&self.descriptor, value);
        let type_info = &self.descriptor.type_info;
        if let Some(previous) = self.value.take() {
            type_info.destroy(previous);
        }
        self.value = Some(type_info.clone_value(value));
    }
}

impl Drop for SceneComponentStorage {
    fn drop(&mut self) {
        if let Some(value) = self.value.take() {
            self.descriptor.type_info.destroy(value);
        }
    }
}

impl ResourceStorage for SceneComponentStorage {
    fn descriptor(&self) -> &ResourceDescriptor { &self.descriptor }
    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}

/// Sparse identity → value map for entity and viewport components.
///
/// Slots are addressed by the identity's index and remember the full identity
/// they were written for, so entries left behind by removed identities are
/// inert holes: they are never returned for a recycled identity and are
/// overwritten on its first emplace.
pub struct IndexedComponentStorage {
    descriptor: ResourceDescriptor,
    slots: Vec<Option<(Identity, Value)>>,
    occupied: usize,
}

impl IndexedComponentStorage {
    /// An empty storage.
    pub fn new(descriptor: ResourceDescriptor) -> Self {
        debug_assert!(descriptor.kind.is_indexed());
        Self { descriptor, slots: Vec::new(), occupied: 0 }
    }

    /// Value stored for `identity`, if any.
    #[inline]
    pub fn component(&self, identity: Identity) -> Option<&dyn Any> {
        match self.slots.get(identity.index() as usize) {
            Some(Some((owner, value))) if *owner == identity => Some(&**value as &dyn Any),
            _ => None,
        }
    }

    /// Value stored for `identity` downcast to `T`.
    #[inline]
    pub fn component_as<T: 'static>(&self, identity: Identity) -> Option<&T> {
        self.component(identity).and_then(|value| value.downcast_ref::<T>())
    }

    /// Returns `true` if a value is stored for `identity`.
    #[inline]
    pub fn contains(&self, identity: Identity) -> bool {
        self.component(identity).is_some()
    }

    /// Number of occupied slots, including holes left by removed identities.
    #[inline]
    pub fn len(&self) -> usize {
        self.occupied
    }

    /// Returns `true` if no slot is occupied.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Inserts or overwrites the value for `identity` with a clone of `value`.
    ///
    /// ## Panics
    /// Panics if `value` is not of the resource's element type.
    pub fn emplace(&mut self, identity: Identity, value: &dyn Any) {
        check_type(&self.descriptor, value);
        let index = identity.index() as usize;
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }

        let type_info = &self.descriptor.type_info;
        match self.slots[index].take() {
            Some((_, previous)) => type_info.destroy(previous),
            None => self.occupied += 1,
        }
        self.slots[index] = Some((identity, type_info.clone_value(value)));
    }

    /// Removes the value stored for `identity`. Returns `true` if one existed.
    pub fn remove(&mut self, identity: Identity) -> bool {
        let Some(slot) = self.slots.get_mut(identity.index() as usize) else { return false; };
        if !matches!(slot.as_ref(), Some((owner, _)) if *owner == identity) {
            return false;
        }
        if let Some((_, value)) = slot.take() {
            self.descriptor.type_info.destroy(value);
        }
        self.occupied -= 1;
        true
    }
}

impl Drop for IndexedComponentStorage {
    fn drop(&mut self) {
        let type_info = &self.descriptor.type_info;
        for (_, value) in self.slots.drain(..).flatten() {
            type_info.destroy(value);
        }
    }
}

impl ResourceStorage for IndexedComponentStorage {
    fn descriptor(&self) -> &ResourceDescriptor { &self.descriptor }
    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}

/// Ordered values produced during the current tick.
pub struct EventStorage {
    descriptor: ResourceDescriptor,
    events: Vec<Value>,
}

impl EventStorage {
    /// An empty queue.
    pub fn new(descriptor: ResourceDescriptor) -> Self {
        Self { descriptor, events: Vec::new() }
    }

    /// Number of queued events.
    #[inline]
    pub fn count(&self) -> usize {
        self.events.len()
    }

    /// Event at `index` in arrival order.
    #[inline]
    pub fn event(&self, index: usize) -> Option<&dyn Any> {
        self.events.get(index).map(|value| &**value as &dyn Any)
    }

    /// Event at `index` downcast to `T`.
    #[inline]
    pub fn event_as<T: 'static>(&self, index: usize) -> Option<&T> {
        self.event(index).and_then(|value| value.downcast_ref::<T>())
    }

    /// Appends a clone of `value`.
    ///
    /// ## Panics
    /// Panics if `value` is not of the resource's element type.
    pub fn push(&mut self, value: &dyn Any) {
        check_type(&self.descriptor, value);
        let value = self.descriptor.type_info.clone_value(value);
        self.events.push(value);
    }

    /// Destroys every queued event.
    pub fn clear(&mut self) {
        let type_info = &self.descriptor.type_info;
        for value in self.events.drain(..) {
            type_info.destroy(value);
        }
    }
}

impl Drop for EventStorage {
    fn drop(&mut self) {
        self.clear();
    }
}

impl ResourceStorage for EventStorage {
    fn descriptor(&self) -> &ResourceDescriptor { &self.descriptor }
    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }

    fn end_tick(&mut self) {
        self.clear();
    }
}

/// Placeholder storage for spawn/despawn list resources.
///
/// Request lists are not general storage: writes are routed into the scene's
/// [`CommandQueue`](crate::engine::commands::CommandQueue) and they cannot be
/// read by jobs. The storage only keeps the descriptor so the table stays
/// dense.
pub struct RequestListStorage {
    descriptor: ResourceDescriptor,
}

impl RequestListStorage {
    /// Storage for a request-list resource.
    pub fn new(descriptor: ResourceDescriptor) -> Self {
        debug_assert!(descriptor.kind.is_request_list());
        Self { descriptor }
    }
}

impl ResourceStorage for RequestListStorage {
    fn descriptor(&self) -> &ResourceDescriptor { &self.descriptor }
    fn as_any(&self) -> &dyn Any { self }
    fn as_any_mut(&mut self) -> &mut dyn Any { self }
}
