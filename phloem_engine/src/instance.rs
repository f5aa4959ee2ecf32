// Copyright 2026 the Phloem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! One owner: its names, graph, nodes, store, and passes.

use std::mem;
use std::sync::Arc;

use hashbrown::{HashMap, HashSet};
use phloem_graph::intern::NameTable;
use phloem_graph::{DepGraph, NameId, Scratch, Topology};
use smallvec::SmallVec;
use tracing::{debug, warn};

use crate::declare::{BuildError, Declaration, FieldDef, SourceRef};
use crate::executor::{ExecCx, compute_one};
use crate::node::{ComputeResult, Node};
use crate::resources::Resources;
use crate::spawn::TaskSpawner;
use crate::state::ComputationState;
use crate::store::FieldStore;
use crate::value::Value;

/// Dirty-name snapshot taken when a pass is scheduled.
type DirtyBuf = SmallVec<[NameId; 8]>;

/// A single view or component instance: the owner of one [`FieldStore`] and
/// the graph derived over it.
///
/// Everything here is single-threaded by construction. The instance is built
/// once from field definitions, props, and declarations; after that the host
/// runtime mutates it one event at a time (field set, async delivery,
/// external invalidation), each scheduling one serial pass. Background tasks
/// never touch the instance; they only send envelopes back.
#[derive(Debug)]
pub struct Instance {
    pub(crate) names: NameTable,
    pub(crate) graph: DepGraph<NameId>,
    pub(crate) topo: Topology<NameId>,
    pub(crate) nodes: HashMap<NameId, Node>,
    pub(crate) store: FieldStore,
    /// Per-node spawn generation, bumped each time a task is launched.
    pub(crate) generations: HashMap<NameId, u64>,
    field_defs: Vec<FieldDef>,
    field_ids: HashSet<NameId>,
    prop_ids: HashSet<NameId>,
    scratch: Scratch<NameId>,
    pass: Vec<NameId>,
}

impl Instance {
    /// Builds an instance from its declarative parts.
    ///
    /// All configuration errors surface here, before any pass runs: duplicate
    /// names across fields, props, and nodes; references that resolve to
    /// nothing in their namespace; dependency cycles. A built instance is one
    /// the engine can always schedule.
    pub fn build(
        fields: impl IntoIterator<Item = FieldDef>,
        props: impl IntoIterator<Item = (Arc<str>, Value)>,
        declarations: impl IntoIterator<Item = Declaration>,
        resources: &Arc<dyn Resources>,
    ) -> Result<Self, BuildError> {
        let mut names = NameTable::new();
        let mut store = FieldStore::new();
        let mut field_defs = Vec::new();
        let mut field_ids = HashSet::new();
        let mut prop_ids = HashSet::new();
        let mut taken = HashSet::new();

        for def in fields {
            let id = names.intern(def.name());
            if !taken.insert(id) {
                return Err(BuildError::DuplicateName {
                    name: def.name_shared(),
                });
            }
            field_ids.insert(id);
            store.install_field(id, def.default().clone());
            field_defs.push(def);
        }

        for (name, value) in props {
            let id = names.intern(&name);
            if !taken.insert(id) {
                return Err(BuildError::DuplicateName { name });
            }
            prop_ids.insert(id);
            store.install_field(id, value);
        }

        let declarations: Vec<Declaration> = declarations.into_iter().collect();
        let mut node_ids = HashSet::new();
        for decl in &declarations {
            let id = names.intern(decl.name());
            if !taken.insert(id) {
                return Err(BuildError::DuplicateName {
                    name: Arc::from(decl.name()),
                });
            }
            node_ids.insert(id);
        }

        // Every name is interned now; resolve references by namespace.
        for decl in &declarations {
            for source in decl.sources() {
                let known = match source {
                    SourceRef::Field(name) => names
                        .lookup(name)
                        .is_some_and(|id| field_ids.contains(&id)),
                    SourceRef::NodeResult(name) => {
                        names.lookup(name).is_some_and(|id| node_ids.contains(&id))
                    }
                    SourceRef::Prop(name) => {
                        names.lookup(name).is_some_and(|id| prop_ids.contains(&id))
                    }
                };
                if !known {
                    return Err(BuildError::UnresolvedReference {
                        node: Arc::from(decl.name()),
                        reference: source.clone(),
                    });
                }
            }
        }

        let mut graph = DepGraph::new();
        let mut nodes = HashMap::with_capacity(declarations.len());
        for decl in declarations {
            let node = decl.expand(resources);
            let id = names.intern(node.name());
            let deps: SmallVec<[NameId; 4]> = node
                .depends_on()
                .iter()
                .map(|dep| names.intern(dep))
                .collect();
            graph.insert(id, &deps);
            nodes.insert(id, node);
        }

        let topo = Topology::build(&graph).map_err(|err| BuildError::Cycle {
            path: err
                .cycle()
                .iter()
                .filter_map(|&id| names.arc(id))
                .collect(),
        })?;

        Ok(Self {
            names,
            graph,
            topo,
            nodes,
            store,
            generations: HashMap::new(),
            field_defs,
            field_ids,
            prop_ids,
            scratch: Scratch::new(),
            pass: Vec::new(),
        })
    }

    /// The field definitions, for the host's persistence layer.
    #[must_use]
    pub fn field_defs(&self) -> &[FieldDef] {
        &self.field_defs
    }

    /// The current value of a field or prop.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        let id = self.names.lookup(name)?;
        self.store.field(id)
    }

    /// The current state of a node, or `None` before its first pass.
    #[must_use]
    pub fn node_state(&self, name: &str) -> Option<&ComputationState> {
        let id = self.names.lookup(name)?;
        self.store.node_state(id)
    }

    /// Whether a node's current value came out of async work, directly or
    /// through an async dependency.
    #[must_use]
    pub fn async_origin(&self, name: &str) -> bool {
        self.names
            .lookup(name)
            .is_some_and(|id| self.store.async_origin(id))
    }

    /// The node records, in no particular order.
    ///
    /// Invalidation brokers walk these for their `reads` lists.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Overwrites a field's value and marks it dirty.
    ///
    /// Returns `false` for names that are not fields of this instance.
    pub(crate) fn set_field(&mut self, name: &str, value: Value) -> bool {
        let Some(id) = self.names.lookup(name) else {
            return false;
        };
        if !self.field_ids.contains(&id) {
            return false;
        }
        self.store.set_field(id, value)
    }

    /// Re-supplies a prop's value and marks it dirty.
    pub(crate) fn set_prop(&mut self, name: &str, value: Value) -> bool {
        let Some(id) = self.names.lookup(name) else {
            return false;
        };
        if !self.prop_ids.contains(&id) {
            return false;
        }
        self.store.set_field(id, value)
    }

    /// Marks a name dirty without changing any value (external invalidation).
    pub(crate) fn mark_dirty(&mut self, name: &str) -> bool {
        let Some(id) = self.names.lookup(name) else {
            return false;
        };
        self.store.mark_dirty(id);
        true
    }

    /// Runs every node once, in dependency order. The mount pass.
    pub(crate) fn full_pass<S: TaskSpawner>(&mut self, cx: &ExecCx<'_, S>) {
        let mut order = mem::take(&mut self.pass);
        order.clear();
        order.extend(self.graph.nodes());
        self.topo.sort(&mut order);

        debug!(nodes = order.len(), "full pass");
        for &id in &order {
            compute_one(self, id, cx);
        }
        self.pass = order;
        self.store.clear_dirty();
    }

    /// Runs the nodes affected by the currently dirty names, in dependency
    /// order. No-op when nothing is dirty.
    pub(crate) fn dirty_pass<S: TaskSpawner>(&mut self, cx: &ExecCx<'_, S>) {
        let dirty: DirtyBuf = self.store.drain_dirty().collect();
        if dirty.is_empty() {
            return;
        }
        self.run_affected(&dirty, false, None, cx);
    }

    /// Applies one async completion: writes the delivered state, then runs a
    /// dependents-only pass.
    ///
    /// A delivery whose generation is behind the node's current one is stale
    /// (a newer pass re-spawned the node) and is discarded. The delivered
    /// node itself is never recomputed by its own delivery pass.
    pub(crate) fn apply_delivery<S: TaskSpawner>(
        &mut self,
        node: &str,
        generation: u64,
        result: ComputeResult,
        cx: &ExecCx<'_, S>,
    ) {
        let Some(id) = self.names.lookup(node) else {
            warn!(node, "delivery for unknown node");
            return;
        };
        if !self.nodes.contains_key(&id) {
            warn!(node, "delivery for a name that is not a node");
            return;
        }
        let current = self.generations.get(&id).copied().unwrap_or(0);
        if generation < current {
            debug!(node, generation, current, "discarding stale delivery");
            return;
        }

        let state = match result {
            Ok(value) => ComputationState::Ready(value),
            Err(err) => err.into(),
        };
        debug!(node, generation, "applying delivery");
        self.store.put_node_state(id, state, true);

        self.store.mark_dirty(id);
        let dirty: DirtyBuf = self.store.drain_dirty().collect();
        self.run_affected(&dirty, true, Some(id), cx);
    }

    /// Expands `dirty` to the affected set, orders it, and computes each
    /// node once.
    fn run_affected<S: TaskSpawner>(
        &mut self,
        dirty: &[NameId],
        include_self: bool,
        skip: Option<NameId>,
        cx: &ExecCx<'_, S>,
    ) {
        let mut order = mem::take(&mut self.pass);
        order.clear();
        self.graph.affected_into(
            dirty.iter().copied(),
            include_self,
            &mut self.scratch,
            &mut order,
        );
        if let Some(skip) = skip {
            order.retain(|&id| id != skip);
        }
        self.topo.sort(&mut order);

        debug!(dirty = dirty.len(), affected = order.len(), "dirty pass");
        for &id in &order {
            compute_one(self, id, cx);
        }
        self.pass = order;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declare::{DeriveDecl, SourceRef};
    use crate::node::ComputeError;
    use crate::resources::FetchError;

    struct NoResources;

    impl Resources for NoResources {
        fn fetch_by_id(&self, _: &str, _: &Value, _: &str) -> Result<Value, FetchError> {
            Err(FetchError::NotFound)
        }

        fn build_draft(
            &self,
            _: &str,
            _: Option<&Value>,
            _: &Value,
        ) -> Result<Value, ComputeError> {
            Ok(Value::Nil)
        }
    }

    fn layer() -> Arc<dyn Resources> {
        Arc::new(NoResources)
    }

    fn derive(name: &str, inputs: Vec<SourceRef>) -> Declaration {
        Declaration::Derive(DeriveDecl::new(name, inputs, |_| Ok(Value::Nil)))
    }

    #[test]
    fn build_resolves_all_three_namespaces() {
        let instance = Instance::build(
            [FieldDef::new("count", Value::number(0))],
            [(Arc::from("limit"), Value::number(10))],
            [
                derive("doubled", vec![SourceRef::field("count")]),
                derive(
                    "capped",
                    vec![SourceRef::node("doubled"), SourceRef::prop("limit")],
                ),
            ],
            &layer(),
        )
        .unwrap();

        assert_eq!(instance.field("count"), Some(&Value::number(0)));
        assert_eq!(instance.field("limit"), Some(&Value::number(10)));
        assert_eq!(instance.nodes().count(), 2);
    }

    #[test]
    fn duplicate_names_fail_across_namespaces() {
        let err = Instance::build(
            [FieldDef::new("count", Value::number(0))],
            [],
            [derive("count", vec![])],
            &layer(),
        )
        .unwrap_err();

        assert!(matches!(err, BuildError::DuplicateName { name } if &*name == "count"));
    }

    #[test]
    fn references_check_their_namespace() {
        // `doubled` is a node, but the reference claims it is a field.
        let err = Instance::build(
            [FieldDef::new("count", Value::number(0))],
            [],
            [
                derive("doubled", vec![SourceRef::field("count")]),
                derive("capped", vec![SourceRef::field("doubled")]),
            ],
            &layer(),
        )
        .unwrap_err();

        assert!(matches!(
            err,
            BuildError::UnresolvedReference { node, .. } if &*node == "capped"
        ));
    }

    #[test]
    fn cycles_fail_the_build_with_the_path() {
        let err = Instance::build(
            [],
            [],
            [
                derive("a", vec![SourceRef::node("b")]),
                derive("b", vec![SourceRef::node("a")]),
            ],
            &layer(),
        )
        .unwrap_err();

        match err {
            BuildError::Cycle { path } => {
                let mut names: Vec<_> = path.iter().map(|n| n.to_string()).collect();
                names.sort();
                assert_eq!(names, vec!["a", "b"]);
            }
            other => panic!("expected a cycle error, got {other:?}"),
        }
    }

    #[test]
    fn set_field_rejects_props_and_nodes() {
        let mut instance = Instance::build(
            [FieldDef::new("count", Value::number(0))],
            [(Arc::from("limit"), Value::number(10))],
            [derive("doubled", vec![SourceRef::field("count")])],
            &layer(),
        )
        .unwrap();

        assert!(instance.set_field("count", Value::number(1)));
        assert!(!instance.set_field("limit", Value::number(1)));
        assert!(!instance.set_field("doubled", Value::number(1)));
        assert!(instance.set_prop("limit", Value::number(1)));
        assert!(!instance.set_prop("count", Value::number(2)));
    }
}
