//! Scene ownership and tick orchestration.
//!
//! A [`Scene`] owns one storage per registered resource, the entity and
//! viewport pools, the pending structural requests and the update jobs. Its
//! lifecycle is:
//!
//! * **Constructed.** Job declarations are planned against the registry,
//!   storages are created empty and setup jobs run once.
//! * **Ticking.** Each [`Scene::tick`] applies pending despawns, then pending
//!   spawns, publishes delta time and game time, runs the update jobs and
//!   finally clears every event storage.
//! * **Dropped.** Every stored value is destroyed through its type descriptor.
//!
//! ## Concurrency model
//!
//! Single-threaded. All mutation goes through `&mut Scene`, so `tick` cannot
//! be re-entered from a job and borrows handed out by accessors end before the
//! next mutation. A scene is `Send` and may be moved between threads.

use std::any::Any;
use std::sync::Arc;

use log::{debug, info, trace};

use crate::engine::commands::{Command, CommandQueue, EntityDescriptor};
use crate::engine::config::SceneConfig;
use crate::engine::entity::{Entity, IdPool, Viewport};
use crate::engine::error::SceneResult;
use crate::engine::job::Job;
use crate::engine::query::Inputs;
use crate::engine::resource::{ResourceRegistry, DELTA_TIME, GAME_TIME};
use crate::engine::scheduler::Scheduler;
use crate::engine::scratch::Outputs;
use crate::engine::storage::{
    downcast_storage, downcast_storage_mut, make_storage, EventStorage, IndexedComponentStorage,
    ResourceStorage, SceneComponentStorage,
};
use crate::engine::types::{ResourceID, ResourceKind};
use crate::profiling::{self, Arg};


/// Mutable scene state shared by the query engine and the schedulers.
///
/// Kept apart from [`Scene`] so a scheduler can run its jobs against the
/// data while the scene still owns the scheduler.
pub struct SceneData {
    pub(crate) registry: Arc<ResourceRegistry>,
    pub(crate) storages: Vec<Box<dyn ResourceStorage>>,
    pub(crate) entities: IdPool,
    pub(crate) viewports: IdPool,
    pub(crate) commands: CommandQueue,
}

impl SceneData {
    fn new(registry: Arc<ResourceRegistry>, config: &SceneConfig) -> Self {
        let storages = registry.iter().map(make_storage).collect();
        Self {
            registry,
            storages,
            entities: IdPool::with_capacity(config.entity_capacity),
            viewports: IdPool::with_capacity(config.viewport_capacity),
            commands: CommandQueue::new(),
        }
    }

    /// Storage backing `resource`.
    ///
    /// ## Panics
    /// Panics if the resource is not registered.
    pub fn storage(&self, resource: ResourceID) -> &dyn ResourceStorage {
        match self.storages.get(resource as usize) {
            Some(storage) => storage.as_ref(),
            None => panic!("resource {resource} is not registered"),
        }
    }

    /// Mutable storage backing `resource`.
    ///
    /// ## Panics
    /// Panics if the resource is not registered.
    pub fn storage_mut(&mut self, resource: ResourceID) -> &mut dyn ResourceStorage {
        match self.storages.get_mut(resource as usize) {
            Some(storage) => storage.as_mut(),
            None => panic!("resource {resource} is not registered"),
        }
    }

    /// Applies pending despawns, then pending spawns, leaving both queues empty.
    ///
    /// ## Panics
    /// Panics if a spawn descriptor initializes a resource that is not an
    /// entity component.
    pub(crate) fn apply_commands(&mut self) {
        let SceneData { registry, storages, entities, commands, .. } = self;
        let (despawns, spawns) = commands.lists_mut();

        let requested = despawns.len();
        let despawned = despawns.drain().filter(|&entity| entities.remove(entity)).count();

        let spawned = spawns.len();
        for EntityDescriptor { components } in spawns.drain() {
            let entity = entities.emplace();
            for init in components {
                let descriptor = registry.descriptor(init.resource);
                assert!(
                    descriptor.kind == ResourceKind::EntityComponent,
                    "spawn descriptor initializes {descriptor}, which is not an entity component"
                );
                downcast_storage_mut::<IndexedComponentStorage>(storages[init.resource as usize].as_mut())
                    .emplace(entity, &*init.value);
            }
        }

        if requested > 0 || spawned > 0 {
            debug!(
                "applied {despawned}/{requested} despawns and {spawned} spawns ({} entities live)",
                entities.count()
            );
        }
    }
}

/// A running scene.
pub struct Scene {
    data: SceneData,
    update_scheduler: Scheduler,
    config: SceneConfig,
    game_time: f32,
}

impl Scene {
    /// Builds a scene over `registry` and runs its setup jobs once.
    ///
    /// ## Errors
    /// * [`SceneError::Config`](crate::engine::error::SceneError::Config) if `config` is out of range.
    /// * [`SceneError::InvalidJob`](crate::engine::error::SceneError::InvalidJob) if a job's
    ///   resources cannot be joined. No job runs in either case.
    pub fn new(
        registry: Arc<ResourceRegistry>,
        jobs: Vec<Box<dyn Job>>,
        config: SceneConfig,
    ) -> SceneResult<Self> {
        config.validate()?;
        let (mut setup_scheduler, update_scheduler) = Scheduler::partition(&registry, jobs)?;

        let mut data = SceneData::new(registry, &config);
        info!(
            "scene created with {} resources, {} setup and {} update jobs",
            data.registry.len(),
            setup_scheduler.len(),
            update_scheduler.len()
        );
        setup_scheduler.run_jobs(&mut data);

        Ok(Self { data, update_scheduler, config, game_time: 0.0 })
    }

    /// Advances the scene by `delta_time`.
    pub fn tick(&mut self, delta_time: f32) {
        let _span = profiling::span("Scene::tick")
            .arg("entities", Arg::U64(self.data.entities.count() as u64));
        trace!("tick: delta_time = {delta_time}");

        self.data.apply_commands();

        self.game_time += delta_time * self.config.game_time_scale;
        let game_time = self.game_time;
        self.scene_storage_mut(DELTA_TIME).emplace(&delta_time);
        self.scene_storage_mut(GAME_TIME).emplace(&game_time);

        self.update_scheduler.run_jobs(&mut self.data);

        for storage in &mut self.data.storages {
            storage.end_tick();
        }
    }

    /// Runs an ad-hoc join over the scene's resources.
    ///
    /// Returns `Ok(false)` if the callback aborted. Matches committed before
    /// the abort are kept.
    ///
    /// ## Errors
    /// Returns [`SceneError::Query`](crate::engine::error::SceneError::Query) if the
    /// resource lists cannot be joined.
    pub fn iterate<F>(
        &mut self,
        inputs: &[ResourceID],
        outputs: &[ResourceID],
        callback: F,
    ) -> SceneResult<bool>
    where
        F: FnMut(&Inputs<'_>, &mut Outputs) -> bool,
    {
        Ok(self.data.iterate(inputs, outputs, callback)?)
    }

    // ── Scene components ────────────────────────────────────────────────────

    /// Current value of a scene component, or `None` while unset.
    ///
    /// ## Panics
    /// Panics if `resource` is not a scene component.
    pub fn scene_component(&self, resource: ResourceID) -> Option<&dyn Any> {
        self.scene_component_storage(resource).get()
    }

    /// Typed [`Scene::scene_component`].
    pub fn scene_component_as<T: Any>(&self, resource: ResourceID) -> Option<&T> {
        self.scene_component_storage(resource).get_as::<T>()
    }

    /// Overwrites a scene component.
    pub fn emplace_scene_component<T: Any>(&mut self, resource: ResourceID, value: T) {
        self.scene_storage_mut(resource).emplace(&value);
    }

    /// Storage of a scene component.
    ///
    /// ## Panics
    /// Panics if `resource` is not a scene component.
    pub fn scene_component_storage(&self, resource: ResourceID) -> &SceneComponentStorage {
        downcast_storage(self.data.storage(resource))
    }

    fn scene_storage_mut(&mut self, resource: ResourceID) -> &mut SceneComponentStorage {
        downcast_storage_mut(self.data.storage_mut(resource))
    }

    // ── Entities and viewports ──────────────────────────────────────────────

    /// Number of live entities.
    #[inline]
    pub fn entity_count(&self) -> usize {
        self.data.entities.count()
    }

    /// Live entities in enumeration order.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        self.data.entities.as_slice()
    }

    /// Returns `true` if `entity` is live.
    #[inline]
    pub fn contains_entity(&self, entity: Entity) -> bool {
        self.data.entities.contains(entity)
    }

    /// Queues an entity to be created at the start of the next tick.
    pub fn queue_spawn(&mut self, descriptor: EntityDescriptor) {
        self.data.commands.push(Command::Spawn { descriptor });
    }

    /// Queues `entity` for removal at the start of the next tick.
    ///
    /// Removing an entity that is gone by then is a no-op.
    pub fn queue_despawn(&mut self, entity: Entity) {
        self.data.commands.push(Command::Despawn { entity });
    }

    /// Number of spawn requests waiting for the next tick.
    #[inline]
    pub fn pending_spawns(&self) -> usize {
        self.data.commands.spawns().len()
    }

    /// Number of despawn requests waiting for the next tick.
    #[inline]
    pub fn pending_despawns(&self) -> usize {
        self.data.commands.despawns().len()
    }

    /// Creates a viewport immediately.
    pub fn add_viewport(&mut self) -> Viewport {
        self.data.viewports.emplace()
    }

    /// Removes a viewport. Returns `false` if it was not live.
    pub fn remove_viewport(&mut self, viewport: Viewport) -> bool {
        self.data.viewports.remove(viewport)
    }

    /// Number of live viewports.
    #[inline]
    pub fn viewport_count(&self) -> usize {
        self.data.viewports.count()
    }

    /// Live viewports in enumeration order.
    #[inline]
    pub fn viewports(&self) -> &[Viewport] {
        self.data.viewports.as_slice()
    }

    /// Writes an entity component directly.
    ///
    /// ## Panics
    /// Panics if `entity` is not live, if `resource` is not an entity
    /// component or if `T` is not its element type.
    pub fn emplace_entity_component<T: Any>(&mut self, resource: ResourceID, entity: Entity, value: T) {
        self.emplace_indexed(resource, ResourceKind::EntityComponent, entity, &value);
    }

    /// Writes a viewport component directly.
    ///
    /// ## Panics
    /// Panics if `viewport` is not live, if `resource` is not a viewport
    /// component or if `T` is not its element type.
    pub fn emplace_viewport_component<T: Any>(
        &mut self,
        resource: ResourceID,
        viewport: Viewport,
        value: T,
    ) {
        self.emplace_indexed(resource, ResourceKind::ViewportComponent, viewport, &value);
    }

    fn emplace_indexed(&mut self, resource: ResourceID, kind: ResourceKind, identity: Entity, value: &dyn Any) {
        let pool = match kind {
            ResourceKind::ViewportComponent => &self.data.viewports,
            _ => &self.data.entities,
        };
        assert!(pool.contains(identity), "{identity:?} is not live");

        let descriptor = self.data.registry.descriptor(resource);
        assert!(descriptor.kind == kind, "{descriptor} is not a {kind}");
        downcast_storage_mut::<IndexedComponentStorage>(self.data.storage_mut(resource))
            .emplace(identity, value);
    }

    /// Storage of an entity or viewport component.
    ///
    /// ## Panics
    /// Panics if `resource` is not indexed by identity.
    pub fn indexed_storage(&self, resource: ResourceID) -> &IndexedComponentStorage {
        downcast_storage(self.data.storage(resource))
    }

    // ── Events ──────────────────────────────────────────────────────────────

    /// Queues an event for the current tick. Events are cleared at the end of
    /// every tick.
    pub fn send_event<T: Any>(&mut self, resource: ResourceID, value: T) {
        self.event_storage_mut(resource).push(&value);
    }

    /// Storage of an event resource.
    ///
    /// ## Panics
    /// Panics if `resource` is not an event.
    pub fn event_storage(&self, resource: ResourceID) -> &EventStorage {
        downcast_storage(self.data.storage(resource))
    }

    /// Mutable storage of an event resource.
    pub fn event_storage_mut(&mut self, resource: ResourceID) -> &mut EventStorage {
        downcast_storage_mut(self.data.storage_mut(resource))
    }

    // ── Misc ────────────────────────────────────────────────────────────────

    /// Accumulated, scaled game time.
    #[inline]
    pub fn game_time(&self) -> f32 {
        self.game_time
    }

    /// Registry the scene was built over.
    #[inline]
    pub fn registry(&self) -> &Arc<ResourceRegistry> {
        &self.data.registry
    }

    /// Configuration the scene was built with.
    #[inline]
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Names of the update jobs, in run order.
    pub fn update_jobs(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.update_scheduler.job_names()
    }

    /// Direct access to the scene's data.
    pub fn data_mut(&mut self) -> &mut SceneData {
        &mut self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::job::FnJob;

    fn registry() -> (Arc<ResourceRegistry>, ResourceID, ResourceID) {
        let mut builder = ResourceRegistry::builder();
        let hp = builder.register::<i32>("hp", ResourceKind::EntityComponent).unwrap();
        let gravity = builder.register::<f32>("gravity", ResourceKind::SceneComponent).unwrap();
        (builder.build(), hp, gravity)
    }

    #[test]
    fn setup_jobs_run_once_at_construction() {
        let (registry, _, gravity) = registry();
        let jobs = vec![FnJob::setup("seed", vec![], vec![gravity], |_, outputs| {
            outputs.set(0, 9.8f32);
            true
        })
        .boxed()];

        let mut scene = Scene::new(registry, jobs, SceneConfig::default()).unwrap();
        assert_eq!(scene.scene_component_as::<f32>(gravity), Some(&9.8));
        assert_eq!(scene.update_jobs().count(), 0);

        scene.emplace_scene_component(gravity, 1.0f32);
        scene.tick(1.0);
        assert_eq!(scene.scene_component_as::<f32>(gravity), Some(&1.0));
    }

    #[test]
    fn spawn_descriptors_initialize_components() {
        let (registry, hp, _) = registry();
        let mut scene = Scene::new(registry, vec![], SceneConfig::default()).unwrap();

        scene.queue_spawn(EntityDescriptor::new().with(hp, 30i32));
        scene.queue_spawn(EntityDescriptor::new());
        assert_eq!(scene.pending_spawns(), 2);
        scene.tick(1.0);

        assert_eq!(scene.entity_count(), 2);
        assert_eq!(scene.pending_spawns(), 0);
        let first = scene.entities()[0];
        assert_eq!(scene.indexed_storage(hp).component_as::<i32>(first), Some(&30));
        assert!(!scene.indexed_storage(hp).contains(scene.entities()[1]));
    }

    #[test]
    #[should_panic(expected = "not an entity component")]
    fn spawn_descriptor_must_name_entity_components() {
        let (registry, _, gravity) = registry();
        let mut scene = Scene::new(registry, vec![], SceneConfig::default()).unwrap();
        scene.queue_spawn(EntityDescriptor::new().with(gravity, 1.0f32));
        scene.tick(1.0);
    }

    #[test]
    fn viewports_are_managed_directly() {
        let (registry, _, _) = registry();
        let mut scene = Scene::new(registry, vec![], SceneConfig::default()).unwrap();
        let a = scene.add_viewport();
        let b = scene.add_viewport();
        assert_eq!(scene.viewports(), &[a, b]);
        assert!(scene.remove_viewport(a));
        assert!(!scene.remove_viewport(a));
        assert_eq!(scene.viewport_count(), 1);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let (registry, _, _) = registry();
        let config = SceneConfig { game_time_scale: 0.0, ..SceneConfig::default() };
        assert!(Scene::new(registry, vec![], config).is_err());
    }
}
