// Copyright 2026 the Phloem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The host runtime: instance registry, completion mailbox, result routing.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};

use hashbrown::HashMap;
use tracing::{debug, warn};

use crate::declare::{BuildError, Declaration, FieldDef};
use crate::executor::ExecCx;
use crate::instance::Instance;
use crate::node::ComputeResult;
use crate::resources::Resources;
use crate::spawn::TaskSpawner;
use crate::state::ComputationState;
use crate::value::Value;

/// A stable address for one mounted instance.
///
/// Minted at mount, threaded through every spawned task, and used to route
/// its completion envelope back to the owning instance. Addresses are never
/// reused within one runtime.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct OwnerAddress(u64);

/// One async completion, sent from a spawned task to the runtime mailbox.
#[derive(Debug)]
pub(crate) struct Envelope {
    pub(crate) owner: OwnerAddress,
    pub(crate) node: Arc<str>,
    pub(crate) generation: u64,
    pub(crate) result: ComputeResult,
}

/// Hosts a set of instances and routes async results between them and their
/// background tasks.
///
/// The runtime is the single-threaded side of the concurrency model: all
/// instance mutation happens on the thread driving it, one event at a time —
/// a field set, a prop set, an external invalidation, or a drained completion
/// envelope — and each event schedules one serial pass on the instance it
/// concerns. Spawned tasks live wherever the [`TaskSpawner`] puts them and
/// communicate only through the mailbox channel.
///
/// Completions are not picked up by themselves: the host calls
/// [`pump`](Self::pump) or [`drain`](Self::drain) whenever it is ready to
/// apply them.
#[derive(Debug)]
pub struct Runtime<S> {
    spawner: S,
    completions_tx: Sender<Envelope>,
    completions_rx: Receiver<Envelope>,
    instances: HashMap<OwnerAddress, Instance>,
    next_address: u64,
}

impl<S: TaskSpawner> Runtime<S> {
    /// Creates a runtime driving async work through `spawner`.
    #[must_use]
    pub fn new(spawner: S) -> Self {
        let (completions_tx, completions_rx) = channel();
        Self {
            spawner,
            completions_tx,
            completions_rx,
            instances: HashMap::new(),
            next_address: 0,
        }
    }

    /// The spawner, for hosts (and tests) that drive it explicitly.
    #[must_use]
    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    /// Builds an instance, registers it, and runs its mount pass.
    ///
    /// Returns the new instance's address. Async nodes come out of the mount
    /// pass `Loading` with their tasks spawned; their results arrive through
    /// [`drain`](Self::drain).
    pub fn mount(
        &mut self,
        fields: impl IntoIterator<Item = FieldDef>,
        props: impl IntoIterator<Item = (Arc<str>, Value)>,
        declarations: impl IntoIterator<Item = Declaration>,
        resources: &Arc<dyn Resources>,
    ) -> Result<OwnerAddress, BuildError> {
        let mut instance = Instance::build(fields, props, declarations, resources)?;
        let address = OwnerAddress(self.next_address);
        self.next_address += 1;

        debug!(?address, "mounting instance");
        let cx = ExecCx {
            spawner: &self.spawner,
            completions: &self.completions_tx,
            owner: address,
        };
        instance.full_pass(&cx);
        self.instances.insert(address, instance);
        Ok(address)
    }

    /// Removes an instance.
    ///
    /// In-flight tasks for it keep running; their envelopes are discarded on
    /// delivery. Returns `false` if the address was not mounted.
    pub fn unmount(&mut self, address: OwnerAddress) -> bool {
        debug!(?address, "unmounting instance");
        self.instances.remove(&address).is_some()
    }

    /// A mounted instance, for state inspection.
    #[must_use]
    pub fn instance(&self, address: OwnerAddress) -> Option<&Instance> {
        self.instances.get(&address)
    }

    /// The current value of a field or prop of a mounted instance.
    #[must_use]
    pub fn field(&self, address: OwnerAddress, name: &str) -> Option<&Value> {
        self.instances.get(&address)?.field(name)
    }

    /// The current state of a node of a mounted instance.
    #[must_use]
    pub fn node_state(&self, address: OwnerAddress, name: &str) -> Option<&ComputationState> {
        self.instances.get(&address)?.node_state(name)
    }

    /// Overwrites a field's value and runs the dirty pass it triggers.
    ///
    /// Returns `false` (and changes nothing) when the address is not mounted
    /// or the name is not one of its fields.
    pub fn set_field(&mut self, address: OwnerAddress, name: &str, value: Value) -> bool {
        let Some(instance) = self.instances.get_mut(&address) else {
            return false;
        };
        if !instance.set_field(name, value) {
            return false;
        }
        let cx = ExecCx {
            spawner: &self.spawner,
            completions: &self.completions_tx,
            owner: address,
        };
        instance.dirty_pass(&cx);
        true
    }

    /// Re-supplies a prop's value and runs the dirty pass it triggers.
    pub fn set_prop(&mut self, address: OwnerAddress, name: &str, value: Value) -> bool {
        let Some(instance) = self.instances.get_mut(&address) else {
            return false;
        };
        if !instance.set_prop(name, value) {
            return false;
        }
        let cx = ExecCx {
            spawner: &self.spawner,
            completions: &self.completions_tx,
            owner: address,
        };
        instance.dirty_pass(&cx);
        true
    }

    /// Marks a name dirty and runs the pass it triggers.
    ///
    /// External (cross-process) invalidation enters here; it is treated
    /// exactly like a local field mutation.
    pub fn mark_dirty(&mut self, address: OwnerAddress, name: &str) -> bool {
        let Some(instance) = self.instances.get_mut(&address) else {
            return false;
        };
        if !instance.mark_dirty(name) {
            return false;
        }
        let cx = ExecCx {
            spawner: &self.spawner,
            completions: &self.completions_tx,
            owner: address,
        };
        instance.dirty_pass(&cx);
        true
    }

    /// Applies one pending completion, if any. Returns `false` when the
    /// mailbox was empty.
    pub fn pump(&mut self) -> bool {
        match self.completions_rx.try_recv() {
            Ok(envelope) => {
                self.deliver(envelope);
                true
            }
            Err(_) => false,
        }
    }

    /// Applies pending completions until the mailbox is empty. Returns the
    /// number applied (discarded stale ones included).
    pub fn drain(&mut self) -> usize {
        let mut applied = 0;
        while self.pump() {
            applied += 1;
        }
        applied
    }

    /// Routes one envelope to its owner.
    fn deliver(&mut self, envelope: Envelope) {
        let Some(instance) = self.instances.get_mut(&envelope.owner) else {
            warn!(owner = ?envelope.owner, node = &*envelope.node, "delivery for unmounted owner");
            return;
        };
        let cx = ExecCx {
            spawner: &self.spawner,
            completions: &self.completions_tx,
            owner: envelope.owner,
        };
        instance.apply_delivery(&envelope.node, envelope.generation, envelope.result, &cx);
    }
}
