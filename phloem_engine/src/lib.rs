// Copyright 2026 the Phloem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Phloem Engine: a reactive, dependency-driven computation engine.
//!
//! The engine maintains a set of derived values computed from mutable input
//! fields, recomputing only what a change affects, with synchronous and
//! asynchronous (background I/O) computations mixed freely in one graph.
//! [`phloem_graph`] supplies the bookkeeping (interning, dependency edges,
//! affected sets, depth ranking); this crate supplies the semantics:
//!
//! - **Declarations** ([`Declaration`]): plain derives, resource reads by id,
//!   and form draft builders, all expanded into one uniform [`Node`] shape.
//! - **Tri-state results** ([`ComputationState`]): `Ready`, `Loading`, or
//!   `Failed`, propagated monotonically through dependents — a node over a
//!   loading or failed dependency never runs its own compute.
//! - **Single-owner instances** ([`Instance`]): each owns a [`FieldStore`],
//!   the one place its values live, mutated one event at a time.
//! - **A host runtime** ([`Runtime`]): mounts instances, schedules passes,
//!   and routes async completions back to their owner by address, discarding
//!   results a newer pass has made stale.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use phloem_engine::{
//!     ComputationState, ComputeError, Declaration, DeriveDecl, FetchError, FieldDef,
//!     ManualSpawner, Resources, Runtime, SourceRef, Value,
//! };
//!
//! // No resource layer needed for plain derives.
//! struct NoIo;
//!
//! impl Resources for NoIo {
//!     fn fetch_by_id(&self, _: &str, _: &Value, _: &str) -> Result<Value, FetchError> {
//!         Err(FetchError::NotFound)
//!     }
//!     fn build_draft(
//!         &self,
//!         _: &str,
//!         _: Option<&Value>,
//!         _: &Value,
//!     ) -> Result<Value, ComputeError> {
//!         Ok(Value::Nil)
//!     }
//! }
//!
//! let resources: Arc<dyn Resources> = Arc::new(NoIo);
//! let mut runtime = Runtime::new(ManualSpawner::new());
//!
//! let view = runtime
//!     .mount(
//!         [FieldDef::new("count", Value::number(0))],
//!         [],
//!         [Declaration::Derive(DeriveDecl::new(
//!             "doubled",
//!             [SourceRef::field("count")],
//!             |inputs| {
//!                 let count = inputs.get("count").and_then(Value::as_number).unwrap_or(0.0);
//!                 Ok(Value::number(count * 2.0))
//!             },
//!         ))],
//!         &resources,
//!     )
//!     .unwrap();
//!
//! // The mount pass ran everything once.
//! assert_eq!(
//!     runtime.node_state(view, "doubled"),
//!     Some(&ComputationState::Ready(Value::number(0))),
//! );
//!
//! // A mutation recomputes only what depends on it.
//! runtime.set_field(view, "count", Value::number(5));
//! assert_eq!(
//!     runtime.node_state(view, "doubled"),
//!     Some(&ComputationState::Ready(Value::number(10))),
//! );
//! ```
//!
//! ## Concurrency Model
//!
//! Each instance is single-threaded: the thread driving the [`Runtime`] is
//! the only one that ever touches it. An async node's compute runs on a task
//! spawned through the configured [`TaskSpawner`], with the node `Loading`
//! in the meantime; the task's only link back is one completion envelope on
//! the runtime's mailbox, applied when the host calls
//! [`pump`](Runtime::pump) or [`drain`](Runtime::drain). Every spawn is
//! tagged with a per-node generation, so a result that was superseded while
//! in flight is discarded instead of clobbering newer state.
//!
//! ## Logging
//!
//! The engine is instrumented with [`tracing`]: pass boundaries, task
//! spawns, deliveries, and stale-result discards at `debug`, per-node
//! decisions at `trace`, misaddressed deliveries at `warn`.

mod declare;
mod executor;
mod instance;
mod node;
mod resources;
mod runtime;
mod spawn;
mod state;
mod store;
mod value;

pub use declare::{
    BuildError, Declaration, DeriveDecl, FieldDef, FormDecl, ReadDecl, SourceRef, StorageClass,
};
pub use instance::Instance;
pub use node::{ComputeError, ComputeFn, ComputeResult, Inputs, Node};
pub use resources::{FetchError, Resources};
pub use runtime::{OwnerAddress, Runtime};
pub use spawn::{ManualSpawner, Task, TaskSpawner, ThreadSpawner};
pub use state::ComputationState;
pub use store::FieldStore;
pub use value::Value;
