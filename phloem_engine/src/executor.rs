// Copyright 2026 the Phloem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-node computation: propagate, run inline, or spawn.

use std::sync::mpsc::Sender;

use phloem_graph::NameId;
use tracing::{debug, trace};

use crate::instance::Instance;
use crate::runtime::{Envelope, OwnerAddress};
use crate::spawn::TaskSpawner;
use crate::state::{ComputationState, DepView, Screen, screen_dependencies};

/// What one pass needs beyond the instance itself: where async tasks run,
/// where their completions go, and which owner they belong to.
pub(crate) struct ExecCx<'a, S> {
    pub(crate) spawner: &'a S,
    pub(crate) completions: &'a Sender<Envelope>,
    pub(crate) owner: OwnerAddress,
}

/// Computes one node and writes its state back to the store.
///
/// Called once per affected node, in scheduler order, so every dependency
/// inside the same pass has already been written when this runs. Dependency
/// states short-circuit: any `Loading` propagates as `Loading`, else the
/// first `Failed` in declaration order propagates its reason; the node's own
/// compute runs only when every dependency is ready. Async nodes never block
/// the owner: the state goes to `Loading` and the compute runs on a spawned
/// task that reports back through the completion channel, tagged with the
/// node's spawn generation.
pub(crate) fn compute_one<S: TaskSpawner>(instance: &mut Instance, id: NameId, cx: &ExecCx<'_, S>) {
    let Some(node) = instance.nodes.get(&id) else {
        return;
    };

    let screen = {
        let store = &instance.store;
        let nodes = &instance.nodes;
        let names = &instance.names;
        let deps = instance.graph.dependencies(id).iter().filter_map(|&dep| {
            let name = names.arc(dep)?;
            let view = if nodes.contains_key(&dep) {
                DepView::Node {
                    state: store.node_state(dep),
                    async_origin: store.async_origin(dep),
                }
            } else {
                DepView::Plain(store.field(dep)?)
            };
            Some((name, view))
        });
        screen_dependencies(deps)
    };

    match screen {
        Screen::Loading => {
            trace!(node = node.name(), "propagating loading dependency");
            instance
                .store
                .put_node_state(id, ComputationState::Loading, true);
        }
        Screen::Failed(reason) => {
            trace!(node = node.name(), %reason, "propagating failed dependency");
            instance
                .store
                .put_node_state(id, ComputationState::Failed(reason), false);
        }
        Screen::Run {
            inputs,
            async_origin,
        } => {
            let async_origin = async_origin || node.is_async();
            if node.is_async() {
                let generation = instance
                    .generations
                    .entry(id)
                    .and_modify(|generation| *generation += 1)
                    .or_insert(1);
                let generation = *generation;

                let compute = node.compute_fn();
                let name = node.name_shared();
                let sender = cx.completions.clone();
                let owner = cx.owner;
                debug!(node = &*name, generation, "spawning compute task");
                cx.spawner.spawn(Box::new(move || {
                    let result = compute(&inputs);
                    // The owner may have gone away; nothing to do then.
                    let _ = sender.send(Envelope {
                        owner,
                        node: name,
                        generation,
                        result,
                    });
                }));
                instance
                    .store
                    .put_node_state(id, ComputationState::Loading, true);
            } else {
                let state = match node.compute(&inputs) {
                    Ok(value) => ComputationState::Ready(value),
                    Err(err) => {
                        trace!(node = node.name(), reason = err.reason(), "compute failed");
                        err.into()
                    }
                };
                instance.store.put_node_state(id, state, async_origin);
            }
        }
    }
}
