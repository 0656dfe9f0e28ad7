//! Wire error types for flowgraph-wire.
//!
//! [`WireError`] covers the fatal failure modes of the serialization
//! boundary. Tolerated anomalies -- dangling links, node types missing
//! from the registry -- are not errors; they surface in the load report.

use thiserror::Error;

use flowgraph_core::{LinkId, NodeId};

/// Errors produced by document loading and serialization.
#[derive(Debug, Error)]
pub enum WireError {
    /// The document is malformed: missing required top-level fields, a
    /// link tuple of the wrong arity, or invalid JSON altogether.
    #[error("malformed document: {0}")]
    Document(#[from] serde_json::Error),

    /// Two document nodes share an id; referential integrity is
    /// unrecoverable.
    #[error("document node {id} appears more than once")]
    DuplicateNodeId { id: NodeId },

    /// Two document links share an id.
    #[error("document link {id} appears more than once")]
    DuplicateLinkId { id: LinkId },
}
