// Copyright 2026 the Phloem Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dynamically typed values flowing through the graph.

use std::collections::BTreeMap;
use std::sync::Arc;

/// A value held by an input field or produced by a node.
///
/// Values are dynamically typed and cheap to clone: text, lists, and records
/// share their backing allocation. Records keep their entries ordered by
/// field name, so iteration (and anything derived from it) is deterministic.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// The absent value. Also what a lookup by a nil id produces.
    #[default]
    Nil,
    /// A boolean.
    Bool(bool),
    /// A number; integers ride along as whole floats.
    Number(f64),
    /// Shared text.
    Text(Arc<str>),
    /// A shared sequence of values.
    List(Arc<[Value]>),
    /// A shared name-keyed record with ordered entries.
    Record(Arc<BTreeMap<Arc<str>, Value>>),
}

impl Value {
    /// Creates a number value.
    #[must_use]
    pub fn number(n: impl Into<f64>) -> Self {
        Self::Number(n.into())
    }

    /// Creates a text value.
    #[must_use]
    pub fn text(s: impl Into<Arc<str>>) -> Self {
        Self::Text(s.into())
    }

    /// Creates a list value.
    #[must_use]
    pub fn list(items: impl IntoIterator<Item = Self>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Creates a record value from `(name, value)` entries.
    ///
    /// Later duplicates of a name win.
    #[must_use]
    pub fn record<N: Into<Arc<str>>>(entries: impl IntoIterator<Item = (N, Self)>) -> Self {
        Self::Record(Arc::new(
            entries
                .into_iter()
                .map(|(name, value)| (name.into(), value))
                .collect(),
        ))
    }

    /// Returns `true` for [`Value::Nil`].
    #[must_use]
    pub fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    /// Returns the boolean, if this is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the number, if this is one.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the text, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the items, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Self]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the entries, if this is a record.
    #[must_use]
    pub fn as_record(&self) -> Option<&BTreeMap<Arc<str>, Self>> {
        match self {
            Self::Record(entries) => Some(entries),
            _ => None,
        }
    }

    /// Returns a record field by name, if this is a record holding it.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Self> {
        self.as_record()?.get(field)
    }

    /// A short name for this value's kind, for diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Record(_) => "record",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_and_accessors() {
        assert_eq!(Value::number(5).as_number(), Some(5.0));
        assert_eq!(Value::text("hi").as_text(), Some("hi"));
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert!(Value::Nil.is_nil());
        assert!(!Value::number(0).is_nil());

        let list = Value::list([Value::number(1), Value::number(2)]);
        assert_eq!(list.as_list().map(|items| items.len()), Some(2));
    }

    #[test]
    fn record_fields() {
        let rec = Value::record([("id", Value::number(7)), ("name", Value::text("x"))]);
        assert_eq!(rec.get("id"), Some(&Value::number(7)));
        assert_eq!(rec.get("missing"), None);
        assert_eq!(rec.kind(), "record");
    }

    #[test]
    fn later_duplicate_record_entries_win() {
        let rec = Value::record([("a", Value::number(1)), ("a", Value::number(2))]);
        assert_eq!(rec.get("a"), Some(&Value::number(2)));
    }

    #[test]
    fn equality_is_structural() {
        assert_eq!(
            Value::record([("a", Value::number(1))]),
            Value::record([("a", Value::number(1))]),
        );
        assert_ne!(Value::number(1), Value::text("1"));
    }
}
