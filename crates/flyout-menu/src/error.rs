#![forbid(unsafe_code)]

//! Construction and configuration errors.
//!
//! Interaction never produces an error: ignored input is reported through
//! [`EventResult::Ignored`](crate::controller::EventResult) and unplaceable
//! surfaces degrade to a clamped position.

use thiserror::Error;

use crate::tree::{NodeId, NodeKind};

/// A malformed menu declaration.
///
/// Each error is local to the subtree rooted at the offending node;
/// [`MenuTree::build_lenient`](crate::tree::MenuTree::build_lenient) drops
/// that subtree and keeps the rest of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// Two nodes declare the same id.
    #[error("duplicate node id {0}")]
    DuplicateId(NodeId),

    /// A radio item that is not a descendant of a radio group.
    #[error("radio item {0} is not inside a radio group")]
    RadioOutsideGroup(NodeId),

    /// A radio group declared inside another radio group.
    #[error("radio group {inner:?} is nested inside radio group {outer:?}")]
    NestedRadioGroup { inner: String, outer: String },

    /// Two radio groups share a name.
    #[error("radio group name {0:?} is declared more than once")]
    DuplicateRadioGroup(String),

    /// A radio group declared with an empty name.
    #[error("radio group at node {0} has an empty name")]
    EmptyRadioGroupName(NodeId),

    /// The initial selection of a radio group is not one of its items.
    #[error("radio group {group:?} selects {selected}, which is not one of its items")]
    SelectionNotInGroup { group: String, selected: NodeId },

    /// Children attached to a node kind that cannot hold any.
    #[error("{kind:?} node {id} cannot have children")]
    ChildrenOnLeaf { id: NodeId, kind: NodeKind },
}

/// Errors that can occur when loading a [`MenuConfig`](crate::config::MenuConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[cfg(feature = "config")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parse error.
    #[cfg(feature = "config")]
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Out-of-range values.
    #[error("validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}
