// Copyright 2026 the Phloem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Depth ranking: longest dependency-chain depth per node, with cycle
//! detection at build time.

use alloc::vec::Vec;
use core::fmt;
use core::hash::Hash;

use hashbrown::HashMap;

use crate::graph::DepGraph;

/// Traversal state for one key during the build.
#[derive(Copy, Clone, Eq, PartialEq)]
enum Visit {
    InProgress,
    Done,
}

/// Memoized longest-chain depths over a [`DepGraph`].
///
/// A node's depth is 0 when it depends on no other node (leaves do not
/// count), otherwise `1 + max(depth of its node dependencies)`. A node's
/// depth is therefore strictly greater than every dependency's depth, so
/// sorting any node subset by ascending depth is a valid topological order
/// for that subset. Ties between independent nodes break by key, making the
/// order deterministic.
///
/// Depths are computed once, here, by an iterative depth-first traversal.
/// The same traversal rejects cycles: revisiting a key that is still in
/// progress means the dependency chain loops, and the build fails with a
/// [`CycleError`] carrying the looping path.
///
/// # Example
///
/// ```
/// use phloem_graph::{DepGraph, Topology};
///
/// let mut graph = DepGraph::new();
/// graph.insert(10, &[0]); // depends on a leaf only: depth 0
/// graph.insert(11, &[10]); // depth 1
/// graph.insert(12, &[10, 11]); // depth 2
///
/// let topo = Topology::build(&graph).unwrap();
/// assert_eq!(topo.depth(12), Some(2));
///
/// let mut pass = vec![12, 10, 11];
/// topo.sort(&mut pass);
/// assert_eq!(pass, vec![10, 11, 12]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct Topology<K>
where
    K: Copy + Eq + Hash,
{
    depth: HashMap<K, u32>,
}

impl<K> Topology<K>
where
    K: Copy + Eq + Hash,
{
    /// Computes depths for every node in `graph`.
    ///
    /// Fails with a [`CycleError`] if the dependency edges loop.
    pub fn build(graph: &DepGraph<K>) -> Result<Self, CycleError<K>> {
        let mut depth = HashMap::with_capacity(graph.node_count());
        let mut state: HashMap<K, Visit> = HashMap::with_capacity(graph.node_count());
        // (key, index of the next dependency to visit)
        let mut stack: Vec<(K, usize)> = Vec::new();

        for root in graph.nodes() {
            if state.get(&root) == Some(&Visit::Done) {
                continue;
            }
            state.insert(root, Visit::InProgress);
            stack.push((root, 0));

            while let Some(&mut (key, ref mut cursor)) = stack.last_mut() {
                let deps = graph.dependencies(key);
                if *cursor < deps.len() {
                    let child = deps[*cursor];
                    *cursor += 1;
                    if !graph.is_node(child) {
                        // Leaves contribute no depth.
                        continue;
                    }
                    match state.get(&child) {
                        None => {
                            state.insert(child, Visit::InProgress);
                            stack.push((child, 0));
                        }
                        Some(Visit::InProgress) => {
                            return Err(CycleError::extract(&stack, child));
                        }
                        Some(Visit::Done) => {}
                    }
                } else {
                    // All dependencies resolved; rank this node.
                    let rank = deps
                        .iter()
                        .filter_map(|dep| depth.get(dep).copied())
                        .max()
                        .map_or(0, |max| max + 1);
                    depth.insert(key, rank);
                    state.insert(key, Visit::Done);
                    stack.pop();
                }
            }
        }

        Ok(Self { depth })
    }

    /// Returns the depth of `key`, or `None` if it is not a ranked node.
    #[must_use]
    pub fn depth(&self, key: K) -> Option<u32> {
        self.depth.get(&key).copied()
    }

    /// Returns the number of ranked nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.depth.len()
    }

    /// Returns `true` if no nodes were ranked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.depth.is_empty()
    }

    /// Sorts `keys` into execution order: ascending depth, ties by key.
    ///
    /// Every dependency of a key that is itself in `keys` ends up earlier.
    /// Keys unknown to this topology sort as depth 0.
    pub fn sort(&self, keys: &mut [K])
    where
        K: Ord,
    {
        keys.sort_unstable_by_key(|&key| (self.depth(key).unwrap_or(0), key));
    }
}

/// A dependency cycle found while ranking a graph.
///
/// `cycle()` lists the looping keys in dependency order: each key depends on
/// the next, and the last depends on the first.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CycleError<K> {
    cycle: Vec<K>,
}

impl<K: Copy + Eq> CycleError<K> {
    /// Extracts the looping suffix of the traversal stack, starting at the
    /// revisited key.
    fn extract(stack: &[(K, usize)], revisited: K) -> Self {
        let start = stack
            .iter()
            .position(|&(key, _)| key == revisited)
            .unwrap_or(0);
        Self {
            cycle: stack[start..].iter().map(|&(key, _)| key).collect(),
        }
    }

    /// The keys forming the cycle; each depends on the next, the last on the
    /// first.
    #[must_use]
    pub fn cycle(&self) -> &[K] {
        &self.cycle
    }
}

impl<K: fmt::Debug> fmt::Display for CycleError<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dependency cycle: ")?;
        for key in &self.cycle {
            write!(f, "{key:?} -> ")?;
        }
        match self.cycle.first() {
            Some(first) => write!(f, "{first:?}"),
            None => write!(f, "<empty>"),
        }
    }
}

impl<K: fmt::Debug> core::error::Error for CycleError<K> {}
