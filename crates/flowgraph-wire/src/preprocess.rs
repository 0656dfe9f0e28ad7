//! Preprocessing passes over raw documents.
//!
//! A [`DocumentPass`] rewrites document nodes before graph construction.
//! The shipped pass, [`WidgetPatchSet`], applies user-defined per-node-type
//! overrides: named widget values are overwritten (both wire forms handled)
//! and property entries merged. Patch sets are plain serde data, so callers
//! can keep them as JSON next to their other settings.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use flowgraph_core::slot::widget_value_index;

use crate::document::{NodeDoc, WidgetValuesDoc, WorkflowDocument};
use crate::error::WireError;

/// A rewrite pass the loader runs over the raw document before building
/// the graph.
pub trait DocumentPass {
    /// Short name for logging.
    fn name(&self) -> &str;

    /// Rewrites the document in place.
    fn apply(&self, document: &mut WorkflowDocument);
}

/// Per-node-type override: widget values to overwrite and properties to
/// merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodePatch {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub widgets: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Value>,
}

impl NodePatch {
    /// Returns `true` if the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty() && self.properties.is_empty()
    }
}

/// User-defined patches keyed by node type name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetPatchSet {
    patches: IndexMap<String, NodePatch>,
}

impl WidgetPatchSet {
    /// Creates an empty patch set.
    pub fn new() -> Self {
        WidgetPatchSet::default()
    }

    /// Parses a patch set from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self, WireError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Adds (or replaces) the patch for a node type.
    pub fn insert(&mut self, node_type: impl Into<String>, patch: NodePatch) {
        self.patches.insert(node_type.into(), patch);
    }

    /// Looks up the patch for a node type.
    pub fn get(&self, node_type: &str) -> Option<&NodePatch> {
        self.patches.get(node_type)
    }

    /// Returns `true` if no node type is patched.
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }
}

impl DocumentPass for WidgetPatchSet {
    fn name(&self) -> &str {
        "widget-patches"
    }

    fn apply(&self, document: &mut WorkflowDocument) {
        for node in &mut document.nodes {
            if let Some(patch) = self.patches.get(&node.node_type) {
                debug!(node = %node.id, node_type = %node.node_type, "patching node");
                apply_patch(node, patch);
            }
        }
    }
}

fn apply_patch(node: &mut NodeDoc, patch: &NodePatch) {
    for (name, value) in &patch.widgets {
        match &mut node.widgets_values {
            WidgetValuesDoc::Map(map) => {
                map.insert(name.clone(), value.clone());
            }
            WidgetValuesDoc::List(values) => match widget_value_index(&node.inputs, name) {
                Some(index) => {
                    if values.len() <= index {
                        values.resize(index + 1, Value::Null);
                    }
                    values[index] = value.clone();
                }
                None => {
                    warn!(
                        node = %node.id,
                        widget = %name,
                        "patch targets a widget the node does not declare"
                    );
                }
            },
        }
    }

    for (key, value) in &patch.properties {
        node.properties.insert(key.clone(), value.clone());
    }
}
