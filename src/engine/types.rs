//! Core Scene Types, Identifiers, and Bit-Level Layouts
//!
//! This module defines the **fundamental identifiers and enumerations** shared
//! by every subsystem of the scene runtime: resource storage, identity pools,
//! the job scheduler, and the join engine.
//!
//! ## Identity Representation
//!
//! Entities and viewports are both drawn from recyclable identity pools. An
//! identity is encoded as a packed 64-bit integer:
//!
//! ```text
//! | version | index |
//! ```
//!
//! - **Index** identifies the slot inside the pool and is reused after removal.
//! - **Version** is bumped on every removal so that a recycled slot never
//!   matches a handle (or a stored component) from its previous occupant.
//!
//! The bit widths are compile-time constants validated with static assertions.
//!
//! ## Resources
//!
//! Every piece of state the scene manages is a *resource* with a dense
//! [`ResourceID`] and a [`ResourceKind`]. The kind decides which storage shape
//! backs the resource and how the join engine iterates over it.

use std::any::Any;
use std::fmt;


/// Bit-width type used for compile-time layout calculations.
pub type Bits = u8;

/// Packed identity value (`version | index`).
pub type IdentityID = u64;
/// Slot index inside an identity pool.
pub type IndexID = u32;
/// Generation counter used to detect stale identities.
pub type VersionID = u32;

/// Dense resource identifier; doubles as the index into the scene's storage table.
pub type ResourceID = u32;

/// Total number of bits in an [`IdentityID`].
pub const IDENTITY_BITS: Bits = 64;
/// Number of bits reserved for the version counter.
pub const VERSION_BITS: Bits = 32;
/// Number of bits reserved for the slot index.
pub const INDEX_BITS: Bits = IDENTITY_BITS - VERSION_BITS;

const _: [(); 1] = [(); (VERSION_BITS < IDENTITY_BITS) as usize];
const _: [(); 1] = [(); (INDEX_BITS > 0) as usize];
const _: [(); 1] = [(); (INDEX_BITS <= 32) as usize];

const fn mask(bits: Bits) -> IdentityID {
    if bits == 0 { 0 } else { ((1 as IdentityID) << bits) - 1 }
}

/// Mask selecting the index portion of an [`IdentityID`].
pub const INDEX_MASK: IdentityID = mask(INDEX_BITS);
/// Largest slot index an identity pool will hand out.
pub const INDEX_CAP: IndexID = INDEX_MASK as IndexID;

/// Maximum number of resources a registry may hold.
pub const RESOURCE_CAP: usize = 4096;

/// Owned, type-erased resource value.
///
/// Values are created, cloned and destroyed exclusively through the
/// [`TypeInfo`](crate::engine::type_info::TypeInfo) of the resource they belong to.
pub type Value = Box<dyn Any + Send>;

/// Storage shape of a resource.
///
/// The kind is fixed at registration and decides both the storage variant the
/// scene allocates for the resource and the loop level the join engine uses
/// when the resource appears in a job's inputs or outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A single optional value shared by the whole scene (e.g. delta time).
    SceneComponent,
    /// One value per live viewport.
    ViewportComponent,
    /// One value per live entity.
    EntityComponent,
    /// Zero or more values produced during one tick and cleared after it.
    Event,
    /// Requests to create entities before the next tick.
    EntitySpawnList,
    /// Requests to remove entities before the next tick.
    EntityDespawnList,
}

impl ResourceKind {
    /// Returns `true` for the kinds backed by an identity-indexed storage.
    #[inline]
    pub fn is_indexed(self) -> bool {
        matches!(self, ResourceKind::ViewportComponent | ResourceKind::EntityComponent)
    }

    /// Returns `true` for the spawn/despawn request kinds.
    #[inline]
    pub fn is_request_list(self) -> bool {
        matches!(self, ResourceKind::EntitySpawnList | ResourceKind::EntityDespawnList)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::SceneComponent => "scene component",
            ResourceKind::ViewportComponent => "viewport component",
            ResourceKind::EntityComponent => "entity component",
            ResourceKind::Event => "event",
            ResourceKind::EntitySpawnList => "entity spawn list",
            ResourceKind::EntityDespawnList => "entity despawn list",
        };
        f.write_str(name)
    }
}

/// When a job runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum JobKind {
    /// Runs exactly once, while the scene is being constructed.
    Setup,
    /// Runs once per [`Scene::tick`](crate::engine::scene::Scene::tick).
    Update,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Setup => f.write_str("setup"),
            JobKind::Update => f.write_str("update"),
        }
    }
}
