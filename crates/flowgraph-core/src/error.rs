//! Core error types for flowgraph-core.
//!
//! Uses `thiserror` for structured, matchable error variants. Note that the
//! taxonomy is deliberately small: structural absence (a node with no
//! widgets, a graph with no groups) is never an error, and a node type
//! missing from the capability registry only errors where a descriptor is
//! strictly required (node creation). Everywhere else a missing type is a
//! reported, non-fatal condition.

use thiserror::Error;

use crate::id::{LinkId, NodeId};

/// Core errors produced by graph mutations.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A node type has no entry in the capability registry, so its slots
    /// and default widget values cannot be built.
    #[error("unknown node type: '{type_name}'")]
    UnknownNodeType { type_name: String },

    /// A node id was not found in the node table.
    #[error("node not found: {id}")]
    NodeNotFound { id: NodeId },

    /// A link id was not found in the link table.
    #[error("link not found: {id}")]
    LinkNotFound { id: LinkId },

    /// An input slot index is out of range for the given node.
    #[error("input slot {index} out of range on node {node}")]
    InputSlotOutOfRange { node: NodeId, index: usize },

    /// An output slot index is out of range for the given node.
    #[error("output slot {index} out of range on node {node}")]
    OutputSlotOutOfRange { node: NodeId, index: usize },

    /// No widget-bearing input slot with the given name exists on the node.
    #[error("widget '{name}' not found on node {node}")]
    WidgetNotFound { node: NodeId, name: String },
}
