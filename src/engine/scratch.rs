//! # Output Scratch
//!
//! Per-call scratch space for the values a job callback produces.
//!
//! One [`Outputs`] is created per `iterate` call with one slot per declared
//! output resource. The same slots are reused for every match of that call.
//! A slot counts as unwritten at the start of each match; the callback writes
//! it, the engine copies the value into storage during commit and marks the
//! slot unwritten again. The buffer itself stays allocated, so after the
//! first match writes land in place. Buffers still held when the call ends
//! are destroyed through the resource's type descriptor when the scratch is
//! dropped.

use std::any::{type_name, Any, TypeId};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::engine::resource::ResourceRegistry;
use crate::engine::type_info::TypeInfo;
use crate::engine::types::{ResourceID, ResourceKind, Value};


struct OutputSlot {
    resource: ResourceID,
    kind: ResourceKind,
    type_info: Arc<dyn TypeInfo>,
    value: Option<Value>,
    written: bool,
}

/// Output buffers handed to a job callback.
pub struct Outputs {
    slots: SmallVec<[OutputSlot; 4]>,
}

impl Outputs {
    /// Allocates one empty slot per resource in `resources`.
    ///
    /// ## Panics
    /// Panics if a resource is not registered; ids are validated before
    /// scratch is created.
    pub(crate) fn new<I>(registry: &ResourceRegistry, resources: I) -> Self
    where
        I: IntoIterator<Item = ResourceID>,
    {
        let slots = resources
            .into_iter()
            .map(|resource| {
                let descriptor = registry.descriptor(resource);
                OutputSlot {
                    resource,
                    kind: descriptor.kind,
                    type_info: descriptor.type_info.clone(),
                    value: None,
                    written: false,
                }
            })
            .collect();
        Self { slots }
    }

    fn slot(&self, index: usize) -> &OutputSlot {
        match self.slots.get(index) {
            Some(slot) => slot,
            None => panic!("output {index} out of range ({} outputs declared)", self.slots.len()),
        }
    }

    fn slot_mut(&mut self, index: usize) -> &mut OutputSlot {
        let len = self.slots.len();
        match self.slots.get_mut(index) {
            Some(slot) => slot,
            None => panic!("output {index} out of range ({len} outputs declared)"),
        }
    }

    /// Number of declared outputs.
    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the job declares no outputs.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Resource written by output `index`.
    #[inline]
    pub fn resource(&self, index: usize) -> ResourceID {
        self.slot(index).resource
    }

    /// Kind of the resource written by output `index`.
    #[inline]
    pub fn kind(&self, index: usize) -> ResourceKind {
        self.slot(index).kind
    }

    /// Returns `true` if output `index` holds a value for this match.
    #[inline]
    pub fn is_set(&self, index: usize) -> bool {
        self.slot(index).written
    }

    /// Writes `value` to output `index`, overwriting any value already
    /// written for this match.
    ///
    /// ## Panics
    /// Panics if `T` is not the element type of the output resource.
    pub fn set<T: Any + Send>(&mut self, index: usize, value: T) {
        let slot = self.slot_mut(index);
        assert!(
            TypeInfo::type_id(&*slot.type_info) == TypeId::of::<T>(),
            "output {index} (resource {}) expects `{}`, got `{}`",
            slot.resource,
            slot.type_info.name(),
            type_name::<T>()
        );
        if let Some(buffer) = slot.value.as_mut().and_then(|buffer| buffer.downcast_mut::<T>()) {
            *buffer = value;
        } else {
            slot.value = Some(Box::new(value));
        }
        slot.written = true;
    }

    /// Mutable access to output `index`, initializing it with the type's
    /// default value first if the callback has not written it yet.
    ///
    /// ## Panics
    /// Panics if `T` is not the element type of the output resource.
    pub fn get_or_init<T: Any + Default>(&mut self, index: usize) -> &mut T {
        let slot = self.slot_mut(index);
        let stale = slot.value.is_some() && !slot.written;
        slot.written = true;
        let type_info = &slot.type_info;
        let value = slot.value.get_or_insert_with(|| type_info.initialize());
        match value.downcast_mut::<T>() {
            Some(value) => {
                if stale {
                    *value = T::default();
                }
                value
            }
            None => panic!(
                "output {index} expects `{}`, got `{}`",
                slot.type_info.name(),
                type_name::<T>()
            ),
        }
    }

    /// Value written to output `index` so far.
    pub fn get<T: Any>(&self, index: usize) -> Option<&T> {
        let slot = self.slot(index);
        if !slot.written {
            return None;
        }
        slot.value.as_deref().and_then(|value| value.downcast_ref::<T>())
    }

    /// Value written to output `index` for this match, marking the slot
    /// unwritten. The buffer stays in place for the next match.
    pub(crate) fn take_written(&mut self, index: usize) -> Option<&mut Value> {
        let slot = self.slot_mut(index);
        if !std::mem::take(&mut slot.written) {
            return None;
        }
        slot.value.as_mut()
    }

    /// Destroys every buffer still held and empties all slots.
    pub(crate) fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.written = false;
            if let Some(value) = slot.value.take() {
                slot.type_info.destroy(value);
            }
        }
    }
}

impl Drop for Outputs {
    fn drop(&mut self) {
        self.reset();
    }
}
