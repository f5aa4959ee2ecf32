// Copyright 2026 the Phloem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Phloem Graph: dependency-graph and invalidation primitives.
//!
//! This crate provides the building blocks for an incremental computation
//! engine in which named inputs feed named derived nodes. It models the
//! bookkeeping side only; what a node computes, and when, is the embedder's
//! business. The pieces:
//!
//! - **Name interning** ([`intern::NameTable`], [`NameId`]): owned names map
//!   to dense `Copy` ids once, at build time, keeping hot paths free of
//!   string hashing.
//! - **Dependency graph** ([`DepGraph`]): "node depends on name" edges with
//!   bidirectional adjacency, plus the two-phase affected-set computation
//!   (directly affected, then transitive closure over dependents).
//! - **Dirty set** ([`DirtySet`]): names changed since the last pass, with a
//!   generation counter for detecting marks that arrive mid-pass.
//! - **Depth ranking** ([`Topology`]): memoized longest-chain depth per node,
//!   giving a deterministic topological execution order; building it rejects
//!   cyclic graphs with a [`CycleError`] naming the loop.
//! - **Scratch buffers** ([`Scratch`]): reusable traversal state for owners
//!   that schedule many passes.
//!
//! ## Quick Start
//!
//! ```rust
//! use phloem_graph::{DepGraph, DirtySet, Topology, intern::NameTable};
//!
//! let mut names = NameTable::new();
//! let count = names.intern("count");
//! let doubled = names.intern("doubled");
//! let label = names.intern("label");
//!
//! // `count` is an input leaf; `doubled` and `label` are derived nodes.
//! let mut graph = DepGraph::new();
//! graph.insert(doubled, &[count]);
//! graph.insert(label, &[doubled]);
//!
//! // Ranking the graph also proves it acyclic.
//! let topo = Topology::build(&graph).expect("graph is acyclic");
//!
//! // An input changed; schedule a pass.
//! let mut dirty = DirtySet::new();
//! dirty.mark(count);
//!
//! let mut pass = graph.affected(dirty.drain(), false);
//! topo.sort(&mut pass);
//! assert_eq!(pass, vec![doubled, label]);
//! ```
//!
//! ## The `include_self` rule
//!
//! [`DepGraph::affected`] takes an `include_self` flag controlling only the
//! first phase: when set, a dirty key that is itself a node joins the
//! affected set alongside its dependents. Engines use this for completed
//! background work, where the finished node's own name is marked dirty so
//! its dependents recompute; plain input mutations leave it unset. Dirty
//! leaves (inputs) never join the set either way.
//!
//! ## Performance Notes
//!
//! Owners that schedule passes in a loop should reuse a [`Scratch`] and a
//! pass buffer via [`DepGraph::affected_into`] to avoid per-pass allocation.
//! Depths are computed once per [`Topology::build`], not per sort.
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.
//!
//! ## Features
//!
//! This crate currently has no optional features. All functionality is always
//! available.

#![no_std]

extern crate alloc;

mod dirty;
mod graph;
pub mod intern;
mod scratch;
mod topo;

pub use dirty::DirtySet;
pub use graph::DepGraph;
pub use intern::NameId;
pub use scratch::Scratch;
pub use topo::{CycleError, Topology};
