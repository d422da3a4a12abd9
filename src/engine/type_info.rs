//! # Element Type Descriptors
//!
//! Resource storages never know the concrete Rust type of the values they hold.
//! Instead every resource carries a [`TypeInfo`] trait object that supplies the
//! capability set the storages need:
//!
//! - `size` / `align` of the element type (diagnostics and scratch sizing),
//! - `initialize` to produce a default value,
//! - `clone_value` to copy a value into storage,
//! - `destroy` to release a value that leaves storage.
//!
//! [`TypedInfo<T>`] implements the trait for any `T: Clone + Default + Send`.
//! Embedders with exotic lifetimes (e.g. counting instrumentation) can
//! implement [`TypeInfo`] themselves.
//!
//! ## Invariants
//! - `clone_value` and `destroy` must only ever be handed values whose dynamic
//!   type matches `type_id()`. A mismatch is a programmer error and panics.

use std::any::{type_name, Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::mem::{align_of, size_of};
use std::sync::Arc;

use crate::engine::types::Value;


/// Capability set describing one element type.
pub trait TypeInfo: Send + Sync + 'static {
    /// Rust type name for diagnostics.
    fn name(&self) -> &'static str;

    /// Runtime `TypeId` of the element type.
    fn type_id(&self) -> TypeId;

    /// Size of the element type in bytes.
    fn size(&self) -> usize;

    /// Alignment of the element type in bytes.
    fn align(&self) -> usize;

    /// Produces a freshly initialized value.
    fn initialize(&self) -> Value;

    /// Produces an owned copy of `source`.
    ///
    /// ## Panics
    /// Panics if `source` is not of this element type.
    fn clone_value(&self, source: &dyn Any) -> Value;

    /// Releases a value previously produced by `initialize` or `clone_value`.
    fn destroy(&self, value: Value);
}

/// [`TypeInfo`] for a concrete Rust type.
pub struct TypedInfo<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedInfo<T>
where
    T: Clone + Default + Send + 'static,
{
    /// Creates the descriptor for `T`.
    pub fn new() -> Self {
        Self { _marker: PhantomData }
    }

    /// Creates a shareable descriptor for `T`.
    pub fn shared() -> Arc<dyn TypeInfo> {
        Arc::new(Self::new())
    }
}

impl<T> Default for TypedInfo<T>
where
    T: Clone + Default + Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TypeInfo for TypedInfo<T>
where
    T: Clone + Default + Send + 'static,
{
    fn name(&self) -> &'static str {
        type_name::<T>()
    }

    fn type_id(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn size(&self) -> usize {
        size_of::<T>()
    }

    fn align(&self) -> usize {
        align_of::<T>()
    }

    fn initialize(&self) -> Value {
        Box::new(T::default())
    }

    fn clone_value(&self, source: &dyn Any) -> Value {
        match source.downcast_ref::<T>() {
            Some(value) => Box::new(value.clone()),
            None => panic!("clone_value: value is not a `{}`", type_name::<T>()),
        }
    }

    fn destroy(&self, value: Value) {
        debug_assert!(
            (*value).type_id() == TypeId::of::<T>(),
            "destroy: value is not a `{}`",
            type_name::<T>()
        );
        drop(value);
    }
}

/// Formats a type descriptor for logs: `name (size N, align A)`.
pub struct DisplayTypeInfo<'a>(pub &'a dyn TypeInfo);

impl fmt::Display for DisplayTypeInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (size {}, align {})", self.0.name(), self.0.size(), self.0.align())
    }
}
