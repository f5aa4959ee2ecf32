// Copyright 2026 the Phloem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The uniform node record and the inputs handed to compute functions.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::value::Value;

/// Failure reason reported by a compute function or the resource layer.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ComputeError {
    reason: Arc<str>,
}

impl ComputeError {
    /// Creates an error with the given reason.
    #[must_use]
    pub fn new(reason: impl Into<Arc<str>>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    /// The failure reason.
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub(crate) fn reason_shared(&self) -> Arc<str> {
        Arc::clone(&self.reason)
    }
}

impl fmt::Display for ComputeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "compute failed: {}", self.reason)
    }
}

impl std::error::Error for ComputeError {}

/// What a compute function produces.
pub type ComputeResult = Result<Value, ComputeError>;

/// A compute function: a pure mapping from resolved dependency values to a
/// result. Runs inline for sync nodes, on a background task for async ones,
/// so it must be `Send + Sync`.
pub type ComputeFn = Arc<dyn Fn(&Inputs) -> ComputeResult + Send + Sync>;

/// Dependency values for one compute invocation, keyed by bare name.
///
/// Every entry is a plain [`Value`]; state wrappers were already unwrapped
/// and screened before the compute function runs. Entries are kept sorted
/// for binary-search lookup; dependency lists are short, so the backing
/// storage is inline.
#[derive(Clone, Debug, Default)]
pub struct Inputs {
    entries: SmallVec<[(Arc<str>, Value); 4]>,
}

impl Inputs {
    /// Creates an empty input map.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: SmallVec::new(),
        }
    }

    /// Inserts or replaces the value for `name`.
    pub fn insert(&mut self, name: Arc<str>, value: Value) {
        match self.entries.binary_search_by(|(n, _)| (**n).cmp(&name)) {
            Ok(index) => self.entries[index].1 = value,
            Err(index) => self.entries.insert(index, (name, value)),
        }
    }

    /// Returns the value for `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .binary_search_by(|(n, _)| (**n).cmp(name))
            .ok()
            .map(|index| &self.entries[index].1)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.entries.iter().map(|(name, value)| (&**name, value))
    }
}

/// A named derived computation in its uniform shape.
///
/// Every declaration kind expands to this record: a name, the ordered names
/// it depends on, whether its compute runs on a background task, the compute
/// function itself, and the external resources it reads (opaque here, used
/// by cross-process invalidation brokers).
#[derive(Clone)]
pub struct Node {
    name: Arc<str>,
    depends_on: SmallVec<[Arc<str>; 4]>,
    is_async: bool,
    compute: ComputeFn,
    reads: Vec<Arc<str>>,
}

impl Node {
    pub(crate) fn new(
        name: Arc<str>,
        depends_on: SmallVec<[Arc<str>; 4]>,
        is_async: bool,
        compute: ComputeFn,
        reads: Vec<Arc<str>>,
    ) -> Self {
        Self {
            name,
            depends_on,
            is_async,
            compute,
            reads,
        }
    }

    /// The node's name, unique within its owner.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_shared(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// The names this node depends on, in declaration order.
    #[must_use]
    pub fn depends_on(&self) -> &[Arc<str>] {
        &self.depends_on
    }

    /// Whether the compute runs on a background task.
    #[must_use]
    pub fn is_async(&self) -> bool {
        self.is_async
    }

    /// External resources this node reads, for invalidation brokers.
    #[must_use]
    pub fn reads(&self) -> &[Arc<str>] {
        &self.reads
    }

    pub(crate) fn compute_fn(&self) -> ComputeFn {
        Arc::clone(&self.compute)
    }

    /// Runs the compute function over `inputs`.
    pub(crate) fn compute(&self, inputs: &Inputs) -> ComputeResult {
        (self.compute)(inputs)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .field("is_async", &self.is_async)
            .field("reads", &self.reads)
            .finish_non_exhaustive()
    }
}
