// Copyright 2026 the Phloem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dependency graph: "node depends on name" edges with bidirectional
//! adjacency and affected-set computation.

use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::scratch::Scratch;

/// Inline capacity for adjacency lists; most nodes have few edges.
type EdgeList<K> = SmallVec<[K; 4]>;

/// A directed acyclic dependency graph keyed by `Copy` ids.
///
/// Keys fall into two kinds. A **node** is a key registered through
/// [`insert`](Self::insert) together with the ordered list of names it
/// depends on. A **leaf** (an input field, a caller-supplied prop) is any key
/// that only ever appears on the dependency side: it has dependents but no
/// entry of its own. Only nodes are ever part of an affected set; leaves are
/// where marks originate.
///
/// The graph stores both directions of every edge: `dependencies(node)`
/// returns the declared list in declaration order, `dependents(name)` the
/// nodes that named it. Acyclicity is not enforced here; it is checked when a
/// [`Topology`](crate::Topology) is built over the finished graph, which is
/// also where a cycle is reported with its full path.
///
/// # Example
///
/// ```
/// use phloem_graph::DepGraph;
///
/// // 1 is a leaf; 2 and 3 are nodes.
/// let mut graph = DepGraph::new();
/// graph.insert(2, &[1]);
/// graph.insert(3, &[2]);
///
/// assert_eq!(graph.dependents(1), &[2]);
/// assert_eq!(graph.dependencies(3), &[2]);
///
/// // Everything downstream of leaf 1:
/// let mut affected = graph.affected([1], false);
/// affected.sort_unstable();
/// assert_eq!(affected, vec![2, 3]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct DepGraph<K>
where
    K: Copy + Eq + Hash,
{
    /// Node -> its dependencies, in declaration order.
    forward: HashMap<K, EdgeList<K>>,
    /// Name -> the nodes depending on it.
    reverse: HashMap<K, EdgeList<K>>,
}

impl<K> DepGraph<K>
where
    K: Copy + Eq + Hash,
{
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            forward: HashMap::new(),
            reverse: HashMap::new(),
        }
    }

    /// Registers a node and its ordered dependency list.
    ///
    /// Returns `false` and leaves the graph unchanged if the node was already
    /// registered. Duplicate entries within `deps` produce a single edge.
    pub fn insert(&mut self, node: K, deps: &[K]) -> bool {
        if self.forward.contains_key(&node) {
            return false;
        }

        let mut list = EdgeList::new();
        for &dep in deps {
            if !list.contains(&dep) {
                list.push(dep);
            }
            let dependents = self.reverse.entry(dep).or_default();
            if !dependents.contains(&node) {
                dependents.push(node);
            }
        }
        self.forward.insert(node, list);
        true
    }

    /// Returns `true` if `key` was registered as a node.
    #[must_use]
    pub fn is_node(&self, key: K) -> bool {
        self.forward.contains_key(&key)
    }

    /// Returns the number of registered nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.forward.len()
    }

    /// Returns an iterator over all registered nodes, in no particular order.
    pub fn nodes(&self) -> impl Iterator<Item = K> + '_ {
        self.forward.keys().copied()
    }

    /// Returns the dependencies of `key` in declaration order.
    ///
    /// Leaves (and unknown keys) have no dependencies.
    #[must_use]
    pub fn dependencies(&self, key: K) -> &[K] {
        self.forward.get(&key).map_or(&[], |list| list.as_slice())
    }

    /// Returns the nodes that depend on `key` directly.
    #[must_use]
    pub fn dependents(&self, key: K) -> &[K] {
        self.reverse.get(&key).map_or(&[], |list| list.as_slice())
    }

    /// Computes the set of nodes that must recompute after `dirty` changed.
    ///
    /// The computation runs in two phases:
    ///
    /// 1. **Direct**: every node whose dependency list intersects `dirty`.
    ///    With `include_self`, a dirty key that is itself a node also joins
    ///    the set (a completed async result marks the node's own name dirty
    ///    so its dependents recompute; a plain input mutation does not
    ///    re-mark the input). Dirty leaves never join the set.
    /// 2. **Closure**: nodes depending on anything already in the set are
    ///    added until a fixed point is reached.
    ///
    /// The result is appended to `out` in traversal order, which is *not*
    /// topological; rank it with [`Topology::sort`](crate::Topology::sort)
    /// before executing. `scratch` is reset on entry and can be reused across
    /// calls.
    pub fn affected_into(
        &self,
        dirty: impl IntoIterator<Item = K>,
        include_self: bool,
        scratch: &mut Scratch<K>,
        out: &mut Vec<K>,
    ) {
        scratch.reset();

        // Phase 1: directly affected.
        for key in dirty {
            if include_self && self.is_node(key) && scratch.seen.insert(key) {
                scratch.stack.push(key);
            }
            for &node in self.dependents(key) {
                if scratch.seen.insert(node) {
                    scratch.stack.push(node);
                }
            }
        }

        // Phase 2: transitive closure over dependents.
        while let Some(node) = scratch.stack.pop() {
            out.push(node);
            for &next in self.dependents(node) {
                if scratch.seen.insert(next) {
                    scratch.stack.push(next);
                }
            }
        }
    }

    /// Allocating convenience for [`affected_into`](Self::affected_into).
    #[must_use]
    pub fn affected(&self, dirty: impl IntoIterator<Item = K>, include_self: bool) -> Vec<K> {
        let mut scratch = Scratch::new();
        let mut out = Vec::new();
        self.affected_into(dirty, include_self, &mut scratch, &mut out);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    /// Leaf 0; node 1 <- [0]; node 2 <- [1]; node 3 <- [1, 2].
    fn diamondish() -> DepGraph<u32> {
        let mut graph = DepGraph::new();
        graph.insert(1, &[0]);
        graph.insert(2, &[1]);
        graph.insert(3, &[1, 2]);
        graph
    }

    fn sorted(mut v: Vec<u32>) -> Vec<u32> {
        v.sort_unstable();
        v
    }

    #[test]
    fn insert_and_query() {
        let graph = diamondish();

        assert!(graph.is_node(1));
        assert!(!graph.is_node(0));
        assert_eq!(graph.node_count(), 3);

        assert_eq!(graph.dependencies(3), &[1, 2]);
        assert_eq!(graph.dependencies(0), &[] as &[u32]);
        assert_eq!(sorted(graph.dependents(1).to_vec()), vec![2, 3]);
    }

    #[test]
    fn reinsert_is_rejected() {
        let mut graph = diamondish();

        assert!(!graph.insert(1, &[2]));
        assert_eq!(graph.dependencies(1), &[0]);
    }

    #[test]
    fn duplicate_deps_collapse() {
        let mut graph = DepGraph::new();
        graph.insert(5, &[1, 1, 2]);

        assert_eq!(graph.dependencies(5), &[1, 2]);
        assert_eq!(graph.dependents(1), &[5]);
    }

    #[test]
    fn affected_reaches_transitive_dependents() {
        let graph = diamondish();

        // Leaf 0 changed: every node is downstream.
        assert_eq!(sorted(graph.affected([0], false)), vec![1, 2, 3]);

        // Node 2 changed: only 3 is downstream.
        assert_eq!(graph.affected([2], false), vec![3]);
    }

    #[test]
    fn affected_visits_each_node_once() {
        // 1 and 2 both feed 3; 3 must appear once.
        let graph = diamondish();
        let affected = graph.affected([1], false);
        assert_eq!(affected.iter().filter(|&&k| k == 3).count(), 1);
    }

    #[test]
    fn include_self_adds_dirty_nodes_only() {
        let graph = diamondish();

        // Node 2 dirty with include_self: 2 itself joins its dependents.
        assert_eq!(sorted(graph.affected([2], true)), vec![2, 3]);

        // Leaf 0 dirty with include_self: leaves never join.
        assert_eq!(sorted(graph.affected([0], true)), vec![1, 2, 3]);
    }

    #[test]
    fn affected_into_reuses_scratch() {
        let graph = diamondish();
        let mut scratch = Scratch::with_capacity(4);

        let mut first = Vec::new();
        graph.affected_into([0], false, &mut scratch, &mut first);

        let mut second = Vec::new();
        graph.affected_into([2], false, &mut scratch, &mut second);

        assert_eq!(sorted(first), vec![1, 2, 3]);
        assert_eq!(second, vec![3]);
    }
}
