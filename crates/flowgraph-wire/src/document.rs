//! The wire document model.
//!
//! This is the persisted JSON shape of a workflow, kept strictly at the
//! boundary: links travel as positional tuples, widget values arrive in
//! either the positional or the legacy name-keyed form, and unrecognized
//! per-node fields are captured so foreign documents survive a round-trip.
//! Inside the graph store none of these dualities exist.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use flowgraph_core::{
    Group, InputSlot, Link, LinkId, NodeFlags, NodeId, NodeMode, OutputSlot, SlotType,
};

use crate::error::WireError;

/// A link on the wire: `[id, origin, origin_slot, target, target_slot, ty]`.
///
/// The positional, order-significant form exists only here; the loader
/// immediately converts it to the keyed [`Link`] record. A tuple of the
/// wrong arity fails deserialization (and thus the whole load).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkTuple(
    pub LinkId,
    pub NodeId,
    pub usize,
    pub NodeId,
    pub usize,
    pub Option<SlotType>,
);

impl From<&Link> for LinkTuple {
    fn from(link: &Link) -> Self {
        LinkTuple(
            link.id,
            link.origin_id,
            link.origin_slot,
            link.target_id,
            link.target_slot,
            link.ty.clone(),
        )
    }
}

impl From<LinkTuple> for Link {
    fn from(tuple: LinkTuple) -> Self {
        Link {
            id: tuple.0,
            origin_id: tuple.1,
            origin_slot: tuple.2,
            target_id: tuple.3,
            target_slot: tuple.4,
            ty: tuple.5,
        }
    }
}

/// Widget values as they appear on the wire.
///
/// The positional list is canonical and the only form ever written. The
/// name-keyed object is a legacy shape still accepted on load and migrated
/// during graph construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WidgetValuesDoc {
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
}

impl WidgetValuesDoc {
    /// Returns `true` if nothing would be serialized.
    pub fn is_empty(&self) -> bool {
        match self {
            WidgetValuesDoc::List(values) => values.is_empty(),
            WidgetValuesDoc::Map(map) => map.is_empty(),
        }
    }
}

impl Default for WidgetValuesDoc {
    fn default() -> Self {
        WidgetValuesDoc::List(Vec::new())
    }
}

/// One node as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeDoc {
    pub id: NodeId,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub pos: [f64; 2],
    pub size: [f64; 2],
    #[serde(default, skip_serializing_if = "NodeFlags::is_empty")]
    pub flags: NodeFlags,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub mode: NodeMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bgcolor: Option<String>,
    #[serde(default)]
    pub inputs: Vec<InputSlot>,
    #[serde(default)]
    pub outputs: Vec<OutputSlot>,
    #[serde(default, skip_serializing_if = "WidgetValuesDoc::is_empty")]
    pub widgets_values: WidgetValuesDoc,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Value>,
    /// Unrecognized fields (runtime/display leftovers from other editors).
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// The full persisted workflow.
///
/// `nodes` and `links` are required; a document missing either is
/// malformed and fails to load. Counters and groups default, and the
/// passthrough metadata (`extra`, `version`, `revision`) is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowDocument {
    #[serde(default)]
    pub last_node_id: u64,
    #[serde(default)]
    pub last_link_id: u64,
    pub nodes: Vec<NodeDoc>,
    pub links: Vec<LinkTuple>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Group>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<Value>,
}

impl WorkflowDocument {
    /// Parses a document from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Parses a document from an already-decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self, WireError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Encodes the document as a JSON value.
    pub fn to_value(&self) -> Result<Value, WireError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Encodes the document as a JSON string.
    pub fn to_json_string(&self) -> Result<String, WireError> {
        Ok(serde_json::to_string(self)?)
    }
}
