// Copyright 2026 the Phloem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty set: names changed since the last invalidation pass.

use core::hash::Hash;

use hashbrown::HashSet;

/// Accumulated dirty keys with generation tracking.
///
/// `DirtySet` collects the keys mutated since the last pass, along with a
/// generation counter that increments on every mutation. The generation lets
/// a caller detect whether new marks arrived between two observations, for
/// example while a pass was running.
///
/// The set holds no graph knowledge: marking a key records that key only.
/// Expanding a mark to everything it affects is the job of
/// [`DepGraph::affected`](crate::DepGraph::affected), performed when a pass
/// is scheduled.
///
/// # Type Parameters
///
/// - `K`: The key type, typically an interned name id. Must be
///   `Copy + Eq + Hash`. For owned/structured keys, see
///   [`intern::NameTable`](crate::intern::NameTable).
///
/// # Example
///
/// ```
/// use phloem_graph::DirtySet;
///
/// let mut dirty = DirtySet::<u32>::new();
///
/// dirty.mark(1);
/// dirty.mark(2);
/// assert!(dirty.is_dirty(1));
/// assert_eq!(dirty.len(), 2);
///
/// // Draining snapshots and clears in one step.
/// let marked: Vec<_> = dirty.drain().collect();
/// assert_eq!(marked.len(), 2);
/// assert!(dirty.is_empty());
/// ```
#[derive(Clone, Debug)]
pub struct DirtySet<K>
where
    K: Copy + Eq + Hash,
{
    keys: HashSet<K>,
    /// Generation counter, incremented on each mutation.
    generation: u64,
}

impl<K> Default for DirtySet<K>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> DirtySet<K>
where
    K: Copy + Eq + Hash,
{
    /// Creates a new empty dirty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            keys: HashSet::new(),
            generation: 0,
        }
    }

    /// Returns the current generation.
    ///
    /// The generation is incremented on every mutation (mark, remove, clear,
    /// drain). Comparing generations across a pass detects marks that arrived
    /// while the pass ran.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Marks a key as dirty.
    ///
    /// Returns `true` if the key was newly inserted, `false` if it was
    /// already dirty.
    pub fn mark(&mut self, key: K) -> bool {
        self.generation = self.generation.wrapping_add(1);
        self.keys.insert(key)
    }

    /// Returns `true` if the key is dirty.
    #[must_use]
    pub fn is_dirty(&self, key: K) -> bool {
        self.keys.contains(&key)
    }

    /// Returns `true` if there are no dirty keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Returns the number of dirty keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns an iterator over the dirty keys.
    ///
    /// This does not clear the dirty state. Use [`drain`](Self::drain) to
    /// consume and clear.
    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.keys.iter().copied()
    }

    /// Drains and returns the dirty keys.
    ///
    /// After this call the set is empty, so the snapshot and the clear happen
    /// as one step: marks arriving after the drain belong to the next pass.
    pub fn drain(&mut self) -> impl Iterator<Item = K> + '_ {
        self.generation = self.generation.wrapping_add(1);
        self.keys.drain()
    }

    /// Clears all dirty keys.
    pub fn clear(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.keys.clear();
    }

    /// Removes a specific key.
    ///
    /// This is useful when a key is retired entirely.
    pub fn remove(&mut self, key: K) -> bool {
        let removed = self.keys.remove(&key);
        if removed {
            self.generation = self.generation.wrapping_add(1);
        }
        removed
    }
}
