//! Prelude module with the collection and pointer types used across the crate.
//!
//! Everything that stores keys uses the Fx hasher; object fields use an
//! insertion-ordered `IndexMap` so enumeration is deterministic.

pub use std::{
    cell::{Cell, OnceCell, Ref, RefCell, RefMut},
    fmt,
    hash::{Hash, Hasher},
    rc::{Rc, Weak},
};

pub use rustc_hash::{FxHashMap, FxHashSet};

// ═══════════════════════════════════════════════════════════════════════════════
// IndexMap - insertion-ordered, FxHasher-backed
// ═══════════════════════════════════════════════════════════════════════════════

pub type IndexMap<K, V> =
    indexmap::IndexMap<K, V, core::hash::BuildHasherDefault<rustc_hash::FxHasher>>;

/// Create an empty IndexMap
#[inline]
pub fn index_map_new<K, V>() -> IndexMap<K, V>
where
    K: core::hash::Hash + Eq,
{
    indexmap::IndexMap::with_hasher(Default::default())
}

/// Create an IndexMap with the given capacity
#[inline]
pub fn index_map_with_capacity<K, V>(capacity: usize) -> IndexMap<K, V>
where
    K: core::hash::Hash + Eq,
{
    indexmap::IndexMap::with_capacity_and_hasher(capacity, Default::default())
}

/// Address of the allocation behind an `Rc`, used as an identity key.
#[inline]
pub fn rc_addr<T: ?Sized>(rc: &Rc<T>) -> usize {
    Rc::as_ptr(rc) as *const () as usize
}
