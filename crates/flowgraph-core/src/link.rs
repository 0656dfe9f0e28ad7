//! The keyed link record connecting one output slot to one input slot.
//!
//! On the wire a link is a positional tuple; internally it is always this
//! keyed record stored in an id-indexed map, so integrity checks and
//! lookups are O(1) and not index-fragile. The tuple form exists only at
//! the serialization boundary.

use crate::id::{LinkId, NodeId};
use crate::slot::SlotType;

/// A directed connection from `origin_id`'s output slot to `target_id`'s
/// input slot.
///
/// Invariant (maintained by the graph store): a live link id appears in
/// exactly one input's `link` field and exactly one output's `links` list.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: LinkId,
    pub origin_id: NodeId,
    /// Index into the origin node's outputs.
    pub origin_slot: usize,
    pub target_id: NodeId,
    /// Index into the target node's inputs.
    pub target_slot: usize,
    /// Informational data-type tag, copied from the origin output slot.
    pub ty: Option<SlotType>,
}

impl Link {
    /// Returns `true` if the link touches the given node on either side.
    pub fn touches(&self, node: NodeId) -> bool {
        self.origin_id == node || self.target_id == node
    }
}
