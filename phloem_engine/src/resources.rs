// Copyright 2026 the Phloem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The external resource-access contract used by expanded read/form nodes.

use std::fmt;
use std::sync::Arc;

use crate::node::ComputeError;
use crate::value::Value;

/// Outcome of a resource fetch that did not produce a value.
///
/// `NotFound` is not a failure from the graph's point of view: a read node
/// maps it to a ready `nil`, the same as a nil id. Everything else becomes a
/// `Failed` state carrying the reason.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum FetchError {
    /// The resource exists as a type, but no record has this id.
    NotFound,
    /// The fetch itself failed (connection refused, permission, ...).
    Failed(Arc<str>),
}

impl FetchError {
    /// Creates a `Failed` fetch error with the given reason.
    #[must_use]
    pub fn failed(reason: impl Into<Arc<str>>) -> Self {
        Self::Failed(reason.into())
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::Failed(reason) => write!(f, "fetch failed: {reason}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Access to the external data layer.
///
/// The engine never talks to storage itself; expanded read and form nodes
/// call through this trait. Implementations run on background tasks for
/// async nodes, so they must be `Send + Sync`. The `action` string is passed
/// through to the layer untouched (authorization scoping, usually).
pub trait Resources: Send + Sync {
    /// Fetches one record of `resource` by id.
    ///
    /// Returns [`FetchError::NotFound`] when the id matches nothing; the
    /// caller treats that as success-with-nil, not as a failure.
    fn fetch_by_id(&self, resource: &str, id: &Value, action: &str) -> Result<Value, FetchError>;

    /// Builds a create-or-update draft for `resource`.
    ///
    /// `existing` is the current record when the form edits one, `None` for a
    /// create form. `params` carries the in-progress user input.
    fn build_draft(
        &self,
        resource: &str,
        existing: Option<&Value>,
        params: &Value,
    ) -> Result<Value, ComputeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_display() {
        assert_eq!(FetchError::NotFound.to_string(), "not found");
        assert_eq!(
            FetchError::failed("timeout").to_string(),
            "fetch failed: timeout"
        );
    }
}
