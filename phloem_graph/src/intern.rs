// Copyright 2026 the Phloem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interning of field/node names to compact ids.
//!
//! The core graph APIs are keyed by [`NameId`], a `Copy` handle, to keep hot
//! paths free of cloning and hashing of string keys. Embedders hold a
//! [`NameTable`] mapping the names from their declarations to ids once, at
//! build time, and translate back only at the edges (diagnostics, messages).
//!
//! ## Example
//!
//! ```rust
//! use phloem_graph::intern::{NameId, NameTable};
//!
//! let mut names = NameTable::new();
//! let count: NameId = names.intern("count");
//! let doubled: NameId = names.intern("doubled");
//!
//! assert_ne!(count, doubled);
//! assert_eq!(names.intern("count"), count);
//! assert_eq!(names.get(doubled), Some("doubled"));
//! assert_eq!(names.lookup("missing"), None);
//! ```

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::hash::{BuildHasher, Hash};

use hashbrown::DefaultHashBuilder;
use hashbrown::HashMap;

/// A compact identifier for an interned name.
///
/// Ids are dense and start at zero, so they double as table indices.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct NameId(u32);

impl NameId {
    /// Returns this id as a `usize` index (for tables keyed by name ids).
    #[inline]
    #[must_use]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// Returns the raw numeric id.
    #[inline]
    #[must_use]
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Interns names into compact [`NameId`] handles.
///
/// Names are stored once, as shared `Arc<str>` allocations, so they can be
/// handed across threads (for example inside a completion message) without
/// copying the text. Lookups use a hash-bucket index (hash -> small list of
/// candidate ids) so interning an already-known name allocates nothing.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    names: Vec<Arc<str>>,
    buckets: HashMap<u64, Vec<NameId>>,
    build_hasher: DefaultHashBuilder,
}

impl NameTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self {
            names: Vec::new(),
            buckets: HashMap::new(),
            build_hasher: DefaultHashBuilder::default(),
        }
    }

    /// Returns the number of interned names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if the table contains no names.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the name for an interned id, if the id is in-range.
    #[must_use]
    pub fn get(&self, id: NameId) -> Option<&str> {
        self.names.get(id.as_usize()).map(|name| &**name)
    }

    /// Returns a shared handle to the name for an interned id.
    ///
    /// The clone is reference-counted, not a copy of the text.
    #[must_use]
    pub fn arc(&self, id: NameId) -> Option<Arc<str>> {
        self.names.get(id.as_usize()).map(Arc::clone)
    }

    /// Returns the id for `name` if it has been interned, without inserting.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<NameId> {
        let hash = self.hash(name);
        let ids = self.buckets.get(&hash)?;
        ids.iter()
            .copied()
            .find(|id| &*self.names[id.as_usize()] == name)
    }

    /// Interns `name` and returns its [`NameId`].
    ///
    /// If an equal name was already interned, this returns the existing id
    /// without allocating.
    pub fn intern(&mut self, name: &str) -> NameId {
        let hash = self.hash(name);
        if let Some(ids) = self.buckets.get(&hash) {
            for &id in ids {
                if &*self.names[id.as_usize()] == name {
                    return id;
                }
            }
        }

        let id = NameId(
            u32::try_from(self.names.len()).expect("too many interned names for NameId (u32)"),
        );
        self.names.push(Arc::from(name));
        self.buckets.entry(hash).or_default().push(id);
        id
    }

    fn hash(&self, name: &str) -> u64 {
        self.build_hasher.hash_one(name)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;

    #[test]
    fn interns_duplicates_to_same_id() {
        let mut names = NameTable::new();
        let a0 = names.intern("alpha");
        let a1 = names.intern("alpha");
        let b = names.intern("beta");

        assert_eq!(a0, a1);
        assert_ne!(a0, b);
        assert_eq!(names.get(a0), Some("alpha"));
        assert_eq!(names.get(b), Some("beta"));
        assert_eq!(names.len(), 2);
    }

    #[test]
    fn lookup_does_not_insert() {
        let mut names = NameTable::new();
        assert_eq!(names.lookup("alpha"), None);
        assert!(names.is_empty());

        let a = names.intern("alpha");
        assert_eq!(names.lookup("alpha"), Some(a));
        assert_eq!(names.len(), 1);
    }

    #[test]
    fn arc_shares_storage() {
        let mut names = NameTable::new();
        let a = names.intern("alpha");

        let first = names.arc(a).unwrap();
        let second = names.arc(a).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
