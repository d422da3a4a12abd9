//! Recyclable identity pools for entities and viewports.
//!
//! An [`IdPool`] hands out packed `version | index` identities. Removing an
//! identity bumps the slot's version and returns the slot to a free store, so a
//! recycled slot never compares equal to a handle from its previous occupant.
//!
//! Live identities are additionally kept in a dense list. That list is the
//! pool's enumeration order: identities appear in creation order, except that
//! a removal moves the last live identity into the removed position
//! (swap-remove). Enumeration is therefore stable between mutations but not
//! sorted by identity value.

use std::ops::Index;

use crate::engine::types::{IdentityID, IndexID, VersionID, INDEX_BITS, INDEX_CAP, INDEX_MASK};


/// Opaque generational identity.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct Identity(pub IdentityID);

/// Identity drawn from the scene's entity pool.
pub type Entity = Identity;

/// Identity drawn from the scene's viewport pool.
pub type Viewport = Identity;

#[inline]
const fn make_id(index: IndexID, version: VersionID) -> IdentityID {
    ((version as IdentityID) << INDEX_BITS) | (index as IdentityID)
}

#[inline]
const fn split_id(identity: Identity) -> (IndexID, VersionID) {
    let id = identity.0;
    ((id & INDEX_MASK) as IndexID, (id >> INDEX_BITS) as VersionID)
}

impl Identity {
    /// Builds an identity from its parts.
    #[inline]
    pub const fn new(index: IndexID, version: VersionID) -> Self {
        Identity(make_id(index, version))
    }

    /// Slot index of this identity.
    #[inline]
    pub const fn index(self) -> IndexID { split_id(self).0 }

    /// Version of this identity.
    #[inline]
    pub const fn version(self) -> VersionID { split_id(self).1 }
}

#[derive(Clone, Copy, Debug, Default)]
struct Slot {
    version: VersionID,
    /// Position in `dense` while alive.
    dense: Option<u32>,
}

/// Generational identity allocator with dense enumeration.
#[derive(Debug, Default)]
pub struct IdPool {
    slots: Vec<Slot>,
    free_store: Vec<IndexID>,
    dense: Vec<Identity>,
}

impl IdPool {
    /// Creates an empty pool.
    pub fn new() -> Self { Self::default() }

    /// Creates an empty pool with room for `capacity` identities.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_store: Vec::new(),
            dense: Vec::with_capacity(capacity),
        }
    }

    /// Allocates a new live identity, recycling a free slot when one exists.
    ///
    /// ## Panics
    /// Panics if more than `INDEX_CAP` slots would be needed.
    pub fn emplace(&mut self) -> Identity {
        let index = match self.free_store.pop() {
            Some(index) => index,
            None => {
                let index = self.slots.len();
                assert!(index < INDEX_CAP as usize, "identity pool exhausted ({INDEX_CAP} slots)");
                self.slots.push(Slot::default());
                index as IndexID
            }
        };

        let slot = &mut self.slots[index as usize];
        let identity = Identity::new(index, slot.version);
        slot.dense = Some(self.dense.len() as u32);
        self.dense.push(identity);
        identity
    }

    /// Removes `identity`. Returns `false` if it was not live.
    pub fn remove(&mut self, identity: Identity) -> bool {
        let (index, version) = split_id(identity);
        let Some(slot) = self.slots.get_mut(index as usize) else { return false; };
        if slot.version != version {
            return false;
        }
        let Some(position) = slot.dense.take() else { return false; };

        slot.version = slot.version.wrapping_add(1);
        self.free_store.push(index);

        self.dense.swap_remove(position as usize);
        if let Some(&moved) = self.dense.get(position as usize) {
            self.slots[moved.index() as usize].dense = Some(position);
        }
        true
    }

    /// Returns `true` if `identity` is live.
    pub fn contains(&self, identity: Identity) -> bool {
        let (index, version) = split_id(identity);
        self.slots
            .get(index as usize)
            .is_some_and(|slot| slot.version == version && slot.dense.is_some())
    }

    /// Number of live identities.
    #[inline]
    pub fn count(&self) -> usize { self.dense.len() }

    /// Returns `true` if no identity is live.
    #[inline]
    pub fn is_empty(&self) -> bool { self.dense.is_empty() }

    /// Returns the live identity at enumeration position `position`.
    #[inline]
    pub fn get(&self, position: usize) -> Option<Identity> {
        self.dense.get(position).copied()
    }

    /// Live identities in enumeration order.
    #[inline]
    pub fn as_slice(&self) -> &[Identity] { &self.dense }

    /// Iterates over live identities in enumeration order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = Identity> + '_ {
        self.dense.iter().copied()
    }
}

impl Index<usize> for IdPool {
    type Output = Identity;

    fn index(&self, position: usize) -> &Identity {
        &self.dense[position]
    }
}
