// Copyright 2026 the Phloem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The Field Store: single source of truth for one owner's values.

use hashbrown::HashMap;
use phloem_graph::{DirtySet, NameId};

use crate::state::ComputationState;
use crate::value::Value;

/// A node's stored result.
#[derive(Clone, Debug)]
struct NodeSlot {
    state: ComputationState,
    /// Whether the value came out of async work, directly or upstream.
    async_origin: bool,
}

/// Current values of one owner's fields and derived nodes.
///
/// The store is the only place values live: the builder, scheduler, tracker,
/// and executor all read and write through it, and only the owning instance
/// ever holds one. Field values (props included) are always plain; node
/// results carry a [`ComputationState`] plus an async-origin flag, and are
/// absent until their first pass.
///
/// Writing a node state does not mark it dirty; a pass already carries the
/// write to the node's dependents through the affected set. Marks come from
/// field mutations, async result deliveries, and external invalidations.
#[derive(Debug, Default)]
pub struct FieldStore {
    fields: HashMap<NameId, Value>,
    nodes: HashMap<NameId, NodeSlot>,
    dirty: DirtySet<NameId>,
}

impl FieldStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a field's initial value without marking it dirty.
    pub(crate) fn install_field(&mut self, id: NameId, value: Value) {
        self.fields.insert(id, value);
    }

    /// Returns a field's (or prop's) current value.
    #[must_use]
    pub fn field(&self, id: NameId) -> Option<&Value> {
        self.fields.get(&id)
    }

    /// Overwrites a field's value and marks it dirty.
    ///
    /// Returns `false` if the field does not exist; unknown names are a
    /// build-time concern and never spring into existence here.
    pub fn set_field(&mut self, id: NameId, value: Value) -> bool {
        let Some(slot) = self.fields.get_mut(&id) else {
            return false;
        };
        *slot = value;
        self.dirty.mark(id);
        true
    }

    /// Returns a node's current state, or `None` before its first pass.
    #[must_use]
    pub fn node_state(&self, id: NameId) -> Option<&ComputationState> {
        self.nodes.get(&id).map(|slot| &slot.state)
    }

    /// Returns whether a node's value came out of async work.
    ///
    /// `false` for nodes that have not produced anything yet.
    #[must_use]
    pub fn async_origin(&self, id: NameId) -> bool {
        self.nodes.get(&id).is_some_and(|slot| slot.async_origin)
    }

    /// Overwrites a node's state.
    pub fn put_node_state(&mut self, id: NameId, state: ComputationState, async_origin: bool) {
        self.nodes.insert(
            id,
            NodeSlot {
                state,
                async_origin,
            },
        );
    }

    /// Marks a name dirty without changing any value.
    ///
    /// External invalidation and async delivery enter here.
    pub fn mark_dirty(&mut self, id: NameId) {
        self.dirty.mark(id);
    }

    /// The names marked since the last drain.
    #[must_use]
    pub fn dirty(&self) -> &DirtySet<NameId> {
        &self.dirty
    }

    /// Snapshots and clears the dirty names in one step.
    pub fn drain_dirty(&mut self) -> impl Iterator<Item = NameId> + '_ {
        self.dirty.drain()
    }

    /// Clears the dirty names without observing them.
    pub fn clear_dirty(&mut self) {
        self.dirty.clear();
    }
}
