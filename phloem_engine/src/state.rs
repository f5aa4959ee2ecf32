// Copyright 2026 the Phloem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tri-state computation results and dependency screening.

use std::sync::Arc;

use crate::node::{ComputeError, Inputs};
use crate::value::Value;

/// The current status of a node's result.
///
/// A node is absent from the store until its first pass; after that it holds
/// exactly one of these, overwritten on every recomputation. Input fields
/// never carry a state: their values are always plain.
#[derive(Clone, Debug, PartialEq)]
pub enum ComputationState {
    /// The value is available.
    Ready(Value),
    /// A background task is outstanding, here or upstream.
    Loading,
    /// The computation, or one of its dependencies, failed.
    Failed(Arc<str>),
}

impl ComputationState {
    /// Creates a `Ready` state.
    #[must_use]
    pub fn ready(value: Value) -> Self {
        Self::Ready(value)
    }

    /// Creates a `Failed` state with the given reason.
    #[must_use]
    pub fn failed(reason: impl Into<Arc<str>>) -> Self {
        Self::Failed(reason.into())
    }

    /// Returns `true` if the value is available.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Returns `true` while a background task is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Returns `true` if the computation failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// The value, if ready.
    #[must_use]
    pub fn ready_value(&self) -> Option<&Value> {
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    /// The failure reason, if failed.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match self {
            Self::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl From<ComputeError> for ComputationState {
    fn from(err: ComputeError) -> Self {
        Self::Failed(err.reason_shared())
    }
}

/// One dependency as the executor sees it while assembling a pass.
pub(crate) enum DepView<'a> {
    /// An input field or prop: always a plain value.
    Plain(&'a Value),
    /// Another node's stored state. `None` means the node has not produced
    /// anything yet, which screens the same as `Loading`.
    Node {
        state: Option<&'a ComputationState>,
        async_origin: bool,
    },
}

/// The executor's verdict for one node after looking at its dependencies.
pub(crate) enum Screen {
    /// Some dependency is still loading; propagate without computing.
    Loading,
    /// Some dependency failed; propagate its reason without computing.
    Failed(Arc<str>),
    /// All dependencies ready: run the compute over the unwrapped values.
    /// `async_origin` is set when any dependency's value came out of async
    /// work, so the output must report the same origin.
    Run { inputs: Inputs, async_origin: bool },
}

/// Screens dependency states in declaration order.
///
/// The rule is deterministic: any `Loading` wins over any `Failed`, whatever
/// their relative positions; among several `Failed` dependencies the first
/// in declaration order supplies the reason. `Ready` wrappers are unwrapped
/// into the input map, since the wrapper is scheduling metadata rather than
/// data a compute function should see.
pub(crate) fn screen_dependencies<'a>(
    deps: impl Iterator<Item = (Arc<str>, DepView<'a>)>,
) -> Screen {
    let mut inputs = Inputs::new();
    let mut async_origin = false;
    let mut first_failure: Option<Arc<str>> = None;

    for (name, view) in deps {
        match view {
            DepView::Plain(value) => inputs.insert(name, value.clone()),
            DepView::Node { state: None, .. }
            | DepView::Node {
                state: Some(ComputationState::Loading),
                ..
            } => return Screen::Loading,
            DepView::Node {
                state: Some(ComputationState::Failed(reason)),
                ..
            } => {
                if first_failure.is_none() {
                    first_failure = Some(Arc::clone(reason));
                }
            }
            DepView::Node {
                state: Some(ComputationState::Ready(value)),
                async_origin: origin,
            } => {
                async_origin |= origin;
                inputs.insert(name, value.clone());
            }
        }
    }

    match first_failure {
        Some(reason) => Screen::Failed(reason),
        None => Screen::Run {
            inputs,
            async_origin,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> Arc<str> {
        Arc::from(s)
    }

    #[test]
    fn loading_beats_failed() {
        let failed = ComputationState::failed("boom");
        let loading = ComputationState::Loading;
        let deps = vec![
            (
                name("a"),
                DepView::Node {
                    state: Some(&failed),
                    async_origin: false,
                },
            ),
            (
                name("b"),
                DepView::Node {
                    state: Some(&loading),
                    async_origin: true,
                },
            ),
        ];

        assert!(matches!(
            screen_dependencies(deps.into_iter()),
            Screen::Loading
        ));
    }

    #[test]
    fn first_failure_in_order_wins() {
        let first = ComputationState::failed("first");
        let second = ComputationState::failed("second");
        let deps = vec![
            (
                name("a"),
                DepView::Node {
                    state: Some(&first),
                    async_origin: false,
                },
            ),
            (
                name("b"),
                DepView::Node {
                    state: Some(&second),
                    async_origin: false,
                },
            ),
        ];

        match screen_dependencies(deps.into_iter()) {
            Screen::Failed(reason) => assert_eq!(&*reason, "first"),
            _ => panic!("expected a failure"),
        }
    }

    #[test]
    fn absent_state_screens_as_loading() {
        let deps = vec![(
            name("a"),
            DepView::Node {
                state: None,
                async_origin: false,
            },
        )];

        assert!(matches!(
            screen_dependencies(deps.into_iter()),
            Screen::Loading
        ));
    }

    #[test]
    fn ready_values_unwrap_and_carry_origin() {
        let plain = Value::number(1);
        let ready = ComputationState::ready(Value::number(2));
        let deps = vec![
            (name("field"), DepView::Plain(&plain)),
            (
                name("node"),
                DepView::Node {
                    state: Some(&ready),
                    async_origin: true,
                },
            ),
        ];

        match screen_dependencies(deps.into_iter()) {
            Screen::Run {
                inputs,
                async_origin,
            } => {
                assert!(async_origin);
                assert_eq!(inputs.get("field"), Some(&Value::number(1)));
                assert_eq!(inputs.get("node"), Some(&Value::number(2)));
            }
            _ => panic!("expected a run verdict"),
        }
    }

    #[test]
    fn sync_only_inputs_have_no_async_origin() {
        let ready = ComputationState::ready(Value::number(2));
        let deps = vec![(
            name("node"),
            DepView::Node {
                state: Some(&ready),
                async_origin: false,
            },
        )];

        match screen_dependencies(deps.into_iter()) {
            Screen::Run { async_origin, .. } => assert!(!async_origin),
            _ => panic!("expected a run verdict"),
        }
    }
}
