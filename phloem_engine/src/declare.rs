// Copyright 2026 the Phloem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Declarations and their expansion into uniform nodes.
//!
//! An owner's derived values arrive in three declarative shapes: a plain
//! derive (dependencies and compute given explicitly), a resource read by id,
//! and a form draft builder. One exhaustive [`Declaration::expand`] turns all
//! three into the single [`Node`] record the rest of the engine schedules,
//! so nothing downstream of the builder knows the kinds apart.

use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;

use crate::node::{ComputeError, ComputeFn, ComputeResult, Inputs, Node};
use crate::resources::{FetchError, Resources};
use crate::value::Value;

/// Where the Field Store persists a field, from the host's point of view.
///
/// The engine stores this on the definition and never reads it; only the
/// host's persistence layer cares.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum StorageClass {
    /// Mirrored into the URL; survives link sharing.
    UrlSynced,
    /// Survives a reconnect of the same session.
    Durable,
    /// In-memory only.
    #[default]
    Ephemeral,
}

/// Definition of a mutable input field.
#[derive(Clone, Debug)]
pub struct FieldDef {
    name: Arc<str>,
    default: Value,
    storage: StorageClass,
}

impl FieldDef {
    /// Creates an ephemeral field with a default value.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, default: Value) -> Self {
        Self {
            name: name.into(),
            default,
            storage: StorageClass::Ephemeral,
        }
    }

    /// Sets the storage class.
    #[must_use]
    pub fn storage(mut self, storage: StorageClass) -> Self {
        self.storage = storage;
        self
    }

    /// The field's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn name_shared(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    /// The field's initial value.
    #[must_use]
    pub fn default(&self) -> &Value {
        &self.default
    }

    /// The field's storage class.
    #[must_use]
    pub fn storage_class(&self) -> StorageClass {
        self.storage
    }
}

/// A reference to a dependency source, as written in a declaration.
///
/// All three shapes resolve to a bare name at build time; the shape decides
/// which namespace the name must exist in. A reference naming nothing in its
/// namespace is a [`BuildError::UnresolvedReference`], never a runtime error.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SourceRef {
    /// A mutable input field of the same owner.
    Field(Arc<str>),
    /// Another node's result.
    NodeResult(Arc<str>),
    /// A value supplied by the caller at instance build.
    Prop(Arc<str>),
}

impl SourceRef {
    /// References a field by name.
    #[must_use]
    pub fn field(name: impl Into<Arc<str>>) -> Self {
        Self::Field(name.into())
    }

    /// References another node's result by name.
    #[must_use]
    pub fn node(name: impl Into<Arc<str>>) -> Self {
        Self::NodeResult(name.into())
    }

    /// References a caller-supplied prop by name.
    #[must_use]
    pub fn prop(name: impl Into<Arc<str>>) -> Self {
        Self::Prop(name.into())
    }

    /// The bare name this reference resolves to.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Field(name) | Self::NodeResult(name) | Self::Prop(name) => name,
        }
    }

    pub(crate) fn name_shared(&self) -> Arc<str> {
        match self {
            Self::Field(name) | Self::NodeResult(name) | Self::Prop(name) => Arc::clone(name),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Field(_) => "field",
            Self::NodeResult(_) => "node result",
            Self::Prop(_) => "prop",
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`", self.kind(), self.name())
    }
}

/// A plain derived expression: explicit inputs and compute.
#[derive(Clone)]
pub struct DeriveDecl {
    name: Arc<str>,
    inputs: Vec<SourceRef>,
    compute: ComputeFn,
    is_async: bool,
    reads: Vec<Arc<str>>,
}

impl DeriveDecl {
    /// Creates a synchronous derive over the given inputs.
    #[must_use]
    pub fn new(
        name: impl Into<Arc<str>>,
        inputs: impl IntoIterator<Item = SourceRef>,
        compute: impl Fn(&Inputs) -> ComputeResult + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            inputs: inputs.into_iter().collect(),
            compute: Arc::new(compute),
            is_async: false,
            reads: Vec::new(),
        }
    }

    /// Runs the compute on a background task instead of inline.
    #[must_use]
    pub fn asynchronous(mut self) -> Self {
        self.is_async = true;
        self
    }

    /// Records external resources read by the compute, for invalidation
    /// brokers.
    #[must_use]
    pub fn reads(mut self, resources: impl IntoIterator<Item = Arc<str>>) -> Self {
        self.reads = resources.into_iter().collect();
        self
    }
}

impl fmt::Debug for DeriveDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeriveDecl")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("is_async", &self.is_async)
            .field("reads", &self.reads)
            .finish_non_exhaustive()
    }
}

/// A resource lookup by id.
///
/// Expands to an async node (unless [`inline`](Self::inline) is set) whose
/// compute fetches `resource` by the id found at `id_source`. A nil id short
/// circuits to a ready nil without touching the resource layer, and a fetch
/// reporting "not found" is also success-with-nil; only real fetch errors
/// become a failed state.
#[derive(Clone, Debug)]
pub struct ReadDecl {
    name: Arc<str>,
    resource: Arc<str>,
    id_source: SourceRef,
    action: Arc<str>,
    is_async: bool,
}

impl ReadDecl {
    /// Creates a read of `resource` keyed by the id at `id_source`.
    #[must_use]
    pub fn new(
        name: impl Into<Arc<str>>,
        resource: impl Into<Arc<str>>,
        id_source: SourceRef,
        action: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            name: name.into(),
            resource: resource.into(),
            id_source,
            action: action.into(),
            is_async: true,
        }
    }

    /// Runs the fetch inline instead of on a background task.
    ///
    /// Only sensible when the resource layer answers from memory.
    #[must_use]
    pub fn inline(mut self) -> Self {
        self.is_async = false;
        self
    }
}

/// A form draft builder.
///
/// Expands to a synchronous node depending on the optional data source and a
/// params source, whose compute builds a create-or-update draft through the
/// resource layer. The params source defaults to the field named `params`.
#[derive(Clone, Debug)]
pub struct FormDecl {
    name: Arc<str>,
    resource: Arc<str>,
    data_source: Option<SourceRef>,
    params_source: SourceRef,
}

impl FormDecl {
    /// Creates a form for `resource` reading params from the `params` field.
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, resource: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            resource: resource.into(),
            data_source: None,
            params_source: SourceRef::field("params"),
        }
    }

    /// Sets the existing-record source, making this an update form.
    #[must_use]
    pub fn data_source(mut self, source: SourceRef) -> Self {
        self.data_source = Some(source);
        self
    }

    /// Overrides the params source.
    #[must_use]
    pub fn params_source(mut self, source: SourceRef) -> Self {
        self.params_source = source;
        self
    }
}

/// One declared derived value, in any of the three shapes.
#[derive(Clone, Debug)]
pub enum Declaration {
    /// A plain derived expression.
    Derive(DeriveDecl),
    /// A resource lookup by id.
    Read(ReadDecl),
    /// A form draft builder.
    Form(FormDecl),
}

impl Declaration {
    /// The declared node name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Derive(decl) => &decl.name,
            Self::Read(decl) => &decl.name,
            Self::Form(decl) => &decl.name,
        }
    }

    /// The dependency references, in the order the expanded node declares
    /// them.
    pub(crate) fn sources(&self) -> SmallVec<[&SourceRef; 4]> {
        match self {
            Self::Derive(decl) => decl.inputs.iter().collect(),
            Self::Read(decl) => SmallVec::from_iter([&decl.id_source]),
            Self::Form(decl) => decl
                .data_source
                .iter()
                .chain([&decl.params_source])
                .collect(),
        }
    }

    /// Expands this declaration into the uniform node record.
    ///
    /// Reference resolution has already been checked by the caller; this only
    /// shapes the record and closes the compute over the resource layer where
    /// one is needed.
    pub(crate) fn expand(self, resources: &Arc<dyn Resources>) -> Node {
        match self {
            Self::Derive(decl) => {
                let depends_on = decl
                    .inputs
                    .iter()
                    .map(SourceRef::name_shared)
                    .collect::<SmallVec<_>>();
                Node::new(decl.name, depends_on, decl.is_async, decl.compute, decl.reads)
            }
            Self::Read(decl) => {
                let id_name = decl.id_source.name_shared();
                let depends_on = SmallVec::from_iter([Arc::clone(&id_name)]);
                let reads = vec![Arc::clone(&decl.resource)];
                let resource = decl.resource;
                let action = decl.action;
                let layer = Arc::clone(resources);
                let compute: ComputeFn = Arc::new(move |inputs: &Inputs| {
                    let id = inputs.get(&id_name).cloned().unwrap_or_default();
                    if id.is_nil() {
                        return Ok(Value::Nil);
                    }
                    match layer.fetch_by_id(&resource, &id, &action) {
                        Ok(value) => Ok(value),
                        Err(FetchError::NotFound) => Ok(Value::Nil),
                        Err(FetchError::Failed(reason)) => Err(ComputeError::new(reason)),
                    }
                });
                Node::new(decl.name, depends_on, decl.is_async, compute, reads)
            }
            Self::Form(decl) => {
                let data_name = decl.data_source.as_ref().map(SourceRef::name_shared);
                let params_name = decl.params_source.name_shared();
                let depends_on = data_name
                    .iter()
                    .chain([&params_name])
                    .map(Arc::clone)
                    .collect::<SmallVec<_>>();
                let reads = vec![Arc::clone(&decl.resource)];
                let resource = decl.resource;
                let layer = Arc::clone(resources);
                let compute: ComputeFn = Arc::new(move |inputs: &Inputs| {
                    let params = inputs.get(&params_name).cloned().unwrap_or_default();
                    // A nil data value means "create", same as no data source.
                    let existing = data_name
                        .as_deref()
                        .and_then(|name| inputs.get(name))
                        .filter(|value| !value.is_nil());
                    layer.build_draft(&resource, existing, &params)
                });
                Node::new(decl.name, depends_on, false, compute, reads)
            }
        }
    }
}

/// A configuration error found while building an instance.
///
/// All of these are caught before any pass runs; a graph that builds is one
/// the engine can always schedule.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BuildError {
    /// Two fields, props, or nodes share a name.
    DuplicateName {
        /// The colliding name.
        name: Arc<str>,
    },
    /// A dependency reference names nothing in its namespace.
    UnresolvedReference {
        /// The node whose declaration holds the reference.
        node: Arc<str>,
        /// The reference that resolved to nothing.
        reference: SourceRef,
    },
    /// The declarations form a dependency cycle.
    Cycle {
        /// The names along the loop; each depends on the next, the last on
        /// the first.
        path: Vec<Arc<str>>,
    },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateName { name } => {
                write!(f, "duplicate name `{name}`")
            }
            Self::UnresolvedReference { node, reference } => {
                write!(f, "node `{node}` references unresolved {reference}")
            }
            Self::Cycle { path } => {
                write!(f, "dependency cycle: ")?;
                for name in path {
                    write!(f, "`{name}` -> ")?;
                }
                match path.first() {
                    Some(first) => write!(f, "`{first}`"),
                    None => write!(f, "<empty>"),
                }
            }
        }
    }
}

impl std::error::Error for BuildError {}
