//! Join planning and execution for jobs.
//!
//! A job declares an ordered list of input resources and an ordered list of
//! output resources. Executing it means invoking its callback once for every
//! combination of (event, viewport, entity) on which all of its inputs hold a
//! value, then committing whatever the callback wrote before moving on.
//!
//! ## Execution model
//! 1. [`QueryPlan::new`] classifies every resource by kind and rejects lists
//!    that cannot be joined. Nothing is touched when planning fails.
//! 2. Scene-component inputs are checked once. If any is unset the job has
//!    nothing to do and no callback runs.
//! 3. The engine walks events (when an event input exists), then viewports
//!    (when a viewport-component resource is involved), then entities (when an
//!    entity-component resource is involved). A level with no involved
//!    resource contributes exactly one pass.
//! 4. A viewport or entity is skipped unless every input of its kind holds a
//!    value for it. Matching is all-or-nothing.
//! 5. Each committed output is cloned into its storage and the scratch value
//!    destroyed. Returning `false` from the callback stops the whole call;
//!    matches committed before it are kept.
//!
//! Input values are resolved again for every combination, so a value written
//! by an earlier commit is what a later combination reads.
//!
//! ## Example
//! ```ignore
//! scene.iterate(&[position, velocity, DELTA_TIME], &[position], |inputs, outputs| {
//!     let p = *inputs.get::<f32>(0);
//!     let v = *inputs.get::<f32>(1);
//!     outputs.set(0, p + v * inputs.get::<f32>(2));
//!     true
//! })?;
//! ```

use std::any::Any;

use log::debug;
use smallvec::SmallVec;

use crate::engine::commands::{CommandQueue, SpawnList};
use crate::engine::entity::{Entity, Viewport};
use crate::engine::error::QueryError;
use crate::engine::resource::ResourceRegistry;
use crate::engine::scene::SceneData;
use crate::engine::scratch::Outputs;
use crate::engine::storage::{
    downcast_storage, downcast_storage_mut, EventStorage, IndexedComponentStorage,
    ResourceStorage, SceneComponentStorage,
};
use crate::engine::types::{ResourceID, ResourceKind};
use crate::profiling;


/// Classified resource lists of one job.
///
/// Plans depend only on the registry, so a scene builds one per job at
/// construction and reuses it every tick.
#[derive(Clone, Debug)]
pub struct QueryPlan {
    inputs: SmallVec<[(ResourceID, ResourceKind); 8]>,
    outputs: SmallVec<[(ResourceID, ResourceKind); 4]>,
    event_input: Option<ResourceID>,
    iterates_viewports: bool,
    iterates_entities: bool,
}

impl QueryPlan {
    /// Classifies `inputs` and `outputs` against `registry`.
    ///
    /// ## Errors
    /// * [`QueryError::UnknownResource`] if an id is not registered.
    /// * [`QueryError::InvalidInput`] if a spawn or despawn list is used as an input.
    /// * [`QueryError::MultipleEventInputs`] if more than one event resource is read.
    pub fn new(
        registry: &ResourceRegistry,
        inputs: &[ResourceID],
        outputs: &[ResourceID],
    ) -> Result<Self, QueryError> {
        let kind_of = |resource: ResourceID| {
            registry
                .get(resource)
                .map(|descriptor| descriptor.kind)
                .ok_or(QueryError::UnknownResource(resource))
        };

        let mut plan = QueryPlan {
            inputs: SmallVec::with_capacity(inputs.len()),
            outputs: SmallVec::with_capacity(outputs.len()),
            event_input: None,
            iterates_viewports: false,
            iterates_entities: false,
        };

        for &resource in inputs {
            let kind = kind_of(resource)?;
            match kind {
                ResourceKind::EntitySpawnList | ResourceKind::EntityDespawnList => {
                    return Err(QueryError::InvalidInput { resource, kind });
                }
                ResourceKind::Event => {
                    if let Some(first) = plan.event_input {
                        return Err(QueryError::MultipleEventInputs { first, second: resource });
                    }
                    plan.event_input = Some(resource);
                }
                ResourceKind::ViewportComponent => plan.iterates_viewports = true,
                ResourceKind::EntityComponent => plan.iterates_entities = true,
                ResourceKind::SceneComponent => {}
            }
            plan.inputs.push((resource, kind));
        }

        for &resource in outputs {
            let kind = kind_of(resource)?;
            match kind {
                ResourceKind::ViewportComponent => plan.iterates_viewports = true,
                ResourceKind::EntityComponent => plan.iterates_entities = true,
                _ => {}
            }
            plan.outputs.push((resource, kind));
        }

        Ok(plan)
    }

    /// Input resources in declaration order.
    pub fn inputs(&self) -> impl Iterator<Item = ResourceID> + '_ {
        self.inputs.iter().map(|&(resource, _)| resource)
    }

    /// Output resources in declaration order.
    pub fn outputs(&self) -> impl Iterator<Item = ResourceID> + '_ {
        self.outputs.iter().map(|&(resource, _)| resource)
    }

    /// The event resource driving the outer loop, if any.
    #[inline]
    pub fn event_input(&self) -> Option<ResourceID> {
        self.event_input
    }

    /// Returns `true` if execution walks the viewport pool.
    #[inline]
    pub fn iterates_viewports(&self) -> bool {
        self.iterates_viewports
    }

    /// Returns `true` if execution walks the entity pool.
    #[inline]
    pub fn iterates_entities(&self) -> bool {
        self.iterates_entities
    }

    fn holds_all(
        &self,
        storages: &[Box<dyn ResourceStorage>],
        kind: ResourceKind,
        identity: Entity,
    ) -> bool {
        self.inputs
            .iter()
            .filter(|&&(_, input_kind)| input_kind == kind)
            .all(|&(resource, _)| {
                downcast_storage::<IndexedComponentStorage>(storages[resource as usize].as_ref())
                    .contains(identity)
            })
    }
}

/// Where an input value was read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    /// The scene-wide value.
    Scene,
    /// The value attached to a viewport.
    Viewport(Viewport),
    /// The value attached to an entity.
    Entity(Entity),
    /// The event at this position in the current tick's event list.
    Event(usize),
}

struct Input<'a> {
    resource: ResourceID,
    slot: Slot,
    value: &'a dyn Any,
}

/// Read-only view of a job's input values for one match.
///
/// Values are positional: index `i` is the value of the `i`-th declared input.
pub struct Inputs<'a> {
    values: SmallVec<[Input<'a>; 8]>,
    event: Option<usize>,
    viewport: Option<Viewport>,
    entity: Option<Entity>,
}

impl<'a> Inputs<'a> {
    fn resolve(
        plan: &QueryPlan,
        storages: &'a [Box<dyn ResourceStorage>],
        event: Option<usize>,
        viewport: Option<Viewport>,
        entity: Option<Entity>,
    ) -> Self {
        let values = plan
            .inputs
            .iter()
            .map(|&(resource, kind)| {
                let storage = storages[resource as usize].as_ref();
                let (slot, value) = match (kind, event, viewport, entity) {
                    (ResourceKind::SceneComponent, ..) => {
                        (Slot::Scene, downcast_storage::<SceneComponentStorage>(storage).get())
                    }
                    (ResourceKind::Event, Some(index), ..) => {
                        (Slot::Event(index), downcast_storage::<EventStorage>(storage).event(index))
                    }
                    (ResourceKind::ViewportComponent, _, Some(viewport), _) => (
                        Slot::Viewport(viewport),
                        downcast_storage::<IndexedComponentStorage>(storage).component(viewport),
                    ),
                    (ResourceKind::EntityComponent, _, _, Some(entity)) => (
                        Slot::Entity(entity),
                        downcast_storage::<IndexedComponentStorage>(storage).component(entity),
                    ),
                    _ => unreachable!("input {resource} ({kind}) resolved outside its loop"),
                };
                let value = value
                    .unwrap_or_else(|| panic!("input {resource} ({kind}) has no value for this match"));
                Input { resource, slot, value }
            })
            .collect();

        Inputs { values, event, viewport, entity }
    }

    fn input(&self, index: usize) -> &Input<'a> {
        match self.values.get(index) {
            Some(input) => input,
            None => panic!("input {index} out of range ({} inputs declared)", self.values.len()),
        }
    }

    /// Number of declared inputs.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if the job declares no inputs.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Type-erased value of input `index`.
    #[inline]
    pub fn value(&self, index: usize) -> &'a dyn Any {
        self.input(index).value
    }

    /// Value of input `index` as a `T`.
    ///
    /// ## Panics
    /// Panics if the input's element type is not `T`.
    pub fn get<T: Any>(&self, index: usize) -> &'a T {
        let input = self.input(index);
        match input.value.downcast_ref::<T>() {
            Some(value) => value,
            None => panic!(
                "input {index} (resource {}) is not a `{}`",
                input.resource,
                std::any::type_name::<T>()
            ),
        }
    }

    /// Value of input `index` as a `T`, or `None` on a type mismatch.
    #[inline]
    pub fn try_get<T: Any>(&self, index: usize) -> Option<&'a T> {
        self.input(index).value.downcast_ref::<T>()
    }

    /// Resource read by input `index`.
    #[inline]
    pub fn resource(&self, index: usize) -> ResourceID {
        self.input(index).resource
    }

    /// Where input `index` was read from.
    #[inline]
    pub fn slot(&self, index: usize) -> Slot {
        self.input(index).slot
    }

    /// The entity of this match, when entities are iterated.
    #[inline]
    pub fn entity(&self) -> Option<Entity> {
        self.entity
    }

    /// The viewport of this match, when viewports are iterated.
    #[inline]
    pub fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    /// Position of the current event, when an event input drives the call.
    #[inline]
    pub fn event_index(&self) -> Option<usize> {
        self.event
    }
}

impl SceneData {
    /// Plans and runs a join over `inputs`, writing `outputs`.
    ///
    /// Returns `Ok(true)` if the iteration ran to completion (including the
    /// case of zero matches) and `Ok(false)` if the callback aborted.
    ///
    /// ## Errors
    /// Returns a [`QueryError`] if the lists cannot be planned. No callback
    /// runs in that case.
    pub fn iterate<F>(
        &mut self,
        inputs: &[ResourceID],
        outputs: &[ResourceID],
        mut callback: F,
    ) -> Result<bool, QueryError>
    where
        F: FnMut(&Inputs<'_>, &mut Outputs) -> bool,
    {
        let plan = QueryPlan::new(&self.registry, inputs, outputs)?;
        Ok(self.run_plan(&plan, &mut callback))
    }

    /// Runs an already validated plan.
    pub(crate) fn run_plan<F>(&mut self, plan: &QueryPlan, callback: &mut F) -> bool
    where
        F: FnMut(&Inputs<'_>, &mut Outputs) -> bool,
    {
        let _span = profiling::span("iterate");
        let SceneData { registry, storages, entities, viewports, commands } = self;

        let unset_scalar = plan.inputs.iter().any(|&(resource, kind)| {
            kind == ResourceKind::SceneComponent
                && !downcast_storage::<SceneComponentStorage>(storages[resource as usize].as_ref())
                    .is_set()
        });
        if unset_scalar {
            return true;
        }

        let mut scratch = Outputs::new(&**registry, plan.outputs());

        let event_count = match plan.event_input {
            Some(resource) => {
                downcast_storage::<EventStorage>(storages[resource as usize].as_ref()).count()
            }
            None => 1,
        };
        let viewport_count = if plan.iterates_viewports { viewports.count() } else { 1 };
        let entity_count = if plan.iterates_entities { entities.count() } else { 1 };

        for event_index in 0..event_count {
            let event = plan.event_input.map(|_| event_index);

            for viewport_index in 0..viewport_count {
                let viewport = plan.iterates_viewports.then(|| viewports[viewport_index]);
                if let Some(viewport) = viewport {
                    if !plan.holds_all(storages, ResourceKind::ViewportComponent, viewport) {
                        continue;
                    }
                }

                for entity_index in 0..entity_count {
                    let entity = plan.iterates_entities.then(|| entities[entity_index]);
                    if let Some(entity) = entity {
                        if !plan.holds_all(storages, ResourceKind::EntityComponent, entity) {
                            continue;
                        }
                    }

                    let proceed = {
                        let view = Inputs::resolve(plan, storages, event, viewport, entity);
                        callback(&view, &mut scratch)
                    };
                    if !proceed {
                        return false;
                    }

                    commit(plan, storages, commands, &mut scratch, viewport, entity);
                }
            }
        }

        true
    }
}

/// Copies every written output of the current match into its storage.
///
/// ## Panics
/// Panics on any entity despawn list or event output, written or not.
fn commit(
    plan: &QueryPlan,
    storages: &mut [Box<dyn ResourceStorage>],
    commands: &mut CommandQueue,
    scratch: &mut Outputs,
    viewport: Option<Viewport>,
    entity: Option<Entity>,
) {
    for (index, &(resource, kind)) in plan.outputs.iter().enumerate() {
        if matches!(kind, ResourceKind::EntityDespawnList | ResourceKind::Event) {
            panic!("writing {kind} outputs is not implemented (resource {resource})");
        }
        let Some(value) = scratch.take_written(index) else { continue };
        let storage = storages[resource as usize].as_mut();

        match (kind, viewport, entity) {
            (ResourceKind::SceneComponent, ..) => {
                downcast_storage_mut::<SceneComponentStorage>(storage).emplace(&**value);
            }
            (ResourceKind::ViewportComponent, Some(viewport), _) => {
                downcast_storage_mut::<IndexedComponentStorage>(storage).emplace(viewport, &**value);
            }
            (ResourceKind::EntityComponent, _, Some(entity)) => {
                downcast_storage_mut::<IndexedComponentStorage>(storage).emplace(entity, &**value);
            }
            (ResourceKind::EntitySpawnList, ..) => match value.downcast_mut::<SpawnList>() {
                Some(list) => {
                    let count = list.len();
                    if commands.append_spawns(list) {
                        debug!("spawning {count} entities before next frame");
                    }
                }
                None => panic!("output {resource} ({kind}) does not hold a `SpawnList`"),
            },
            _ => unreachable!("output {resource} ({kind}) committed outside its loop"),
        }
    }
}
