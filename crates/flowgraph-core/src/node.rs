//! The node entity: one operation instance in the graph.
//!
//! A [`Node`] owns its slot lists and widget values. Everything here is
//! document state -- runtime/display caches (resolved capability lookups,
//! transient execution flags) are deliberately not part of the model, so
//! they can never leak into the serialized form.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::NodeId;
use crate::slot::{widget_value_index, widget_value_len, InputSlot, OutputSlot};

/// Execution mode, stored as a bare integer on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum NodeMode {
    #[default]
    Always,
    OnEvent,
    Never,
    OnTrigger,
    Bypass,
}

impl From<NodeMode> for u8 {
    fn from(mode: NodeMode) -> Self {
        match mode {
            NodeMode::Always => 0,
            NodeMode::OnEvent => 1,
            NodeMode::Never => 2,
            NodeMode::OnTrigger => 3,
            NodeMode::Bypass => 4,
        }
    }
}

impl TryFrom<u8> for NodeMode {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        match raw {
            0 => Ok(NodeMode::Always),
            1 => Ok(NodeMode::OnEvent),
            2 => Ok(NodeMode::Never),
            3 => Ok(NodeMode::OnTrigger),
            4 => Ok(NodeMode::Bypass),
            other => Err(format!("invalid node mode: {other}")),
        }
    }
}

/// Per-node display flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeFlags {
    #[serde(default, skip_serializing_if = "is_false")]
    pub collapsed: bool,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl NodeFlags {
    /// Returns `true` if nothing would be serialized.
    pub fn is_empty(&self) -> bool {
        !self.collapsed && self.extra.is_empty()
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// One operation instance: typed slots, geometry, and widget values.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// Key into the capability registry.
    pub node_type: String,
    /// Optional override of the capability display name.
    pub title: Option<String>,
    pub pos: [f64; 2],
    pub size: [f64; 2],
    pub flags: NodeFlags,
    /// Execution ordering hint. Opaque to the core.
    pub order: i64,
    pub mode: NodeMode,
    pub color: Option<String>,
    pub bgcolor: Option<String>,
    pub inputs: Vec<InputSlot>,
    pub outputs: Vec<OutputSlot>,
    /// Ordered values aligned to the widget-bearing subset of `inputs`
    /// (control-mode companions included). The positional list is the one
    /// canonical representation; name-keyed wire forms are migrated on load.
    pub widgets_values: Vec<Value>,
    /// Opaque key/value bag.
    pub properties: IndexMap<String, Value>,
    /// Unrecognized wire fields, preserved for round-trips.
    pub extra: IndexMap<String, Value>,
}

impl Node {
    /// Creates a bare node with empty slots and default geometry flags.
    pub fn new(id: NodeId, node_type: impl Into<String>, pos: [f64; 2], size: [f64; 2]) -> Self {
        Node {
            id,
            node_type: node_type.into(),
            title: None,
            pos,
            size,
            flags: NodeFlags::default(),
            order: 0,
            mode: NodeMode::default(),
            color: None,
            bgcolor: None,
            inputs: Vec::new(),
            outputs: Vec::new(),
            widgets_values: Vec::new(),
            properties: IndexMap::new(),
            extra: IndexMap::new(),
        }
    }

    /// Positional index into `widgets_values` for the named widget.
    pub fn widget_value_index(&self, name: &str) -> Option<usize> {
        widget_value_index(&self.inputs, name)
    }

    /// Number of `widgets_values` entries this node's inputs account for.
    pub fn widget_value_len(&self) -> usize {
        widget_value_len(&self.inputs)
    }

    /// Reads a widget value by name. `None` if no such widget exists or the
    /// value list is too short to cover it.
    pub fn widget_value(&self, name: &str) -> Option<&Value> {
        self.widgets_values.get(self.widget_value_index(name)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::{SlotType, WidgetDesc, WidgetKind};
    use serde_json::json;

    #[test]
    fn mode_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&NodeMode::Always).unwrap(), "0");
        assert_eq!(serde_json::to_string(&NodeMode::Bypass).unwrap(), "4");

        let mode: NodeMode = serde_json::from_str("2").unwrap();
        assert_eq!(mode, NodeMode::Never);
    }

    #[test]
    fn out_of_range_mode_is_an_error() {
        let result: Result<NodeMode, _> = serde_json::from_str("7");
        assert!(result.is_err());
    }

    #[test]
    fn flags_skip_collapsed_false() {
        let flags = NodeFlags::default();
        assert!(flags.is_empty());
        assert_eq!(serde_json::to_value(&flags).unwrap(), json!({}));

        let collapsed = NodeFlags {
            collapsed: true,
            ..NodeFlags::default()
        };
        assert_eq!(
            serde_json::to_value(&collapsed).unwrap(),
            json!({"collapsed": true})
        );
    }

    #[test]
    fn widget_value_reads_through_layout() {
        let mut node = Node::new(NodeId(1), "KSampler", [0.0, 0.0], [200.0, 100.0]);
        node.inputs = vec![
            InputSlot::new("seed", SlotType::tag("INT"))
                .with_widget(WidgetDesc::new(WidgetKind::Number, "seed")),
            InputSlot::new("steps", SlotType::tag("INT"))
                .with_widget(WidgetDesc::new(WidgetKind::Number, "steps")),
        ];
        node.widgets_values = vec![json!(42), json!("Fixed"), json!(20)];

        assert_eq!(node.widget_value("seed"), Some(&json!(42)));
        assert_eq!(node.widget_value("steps"), Some(&json!(20)));
        assert_eq!(node.widget_value("cfg"), None);
        assert_eq!(node.widget_value_len(), 3);
    }

    #[test]
    fn widget_value_none_when_list_short() {
        let mut node = Node::new(NodeId(1), "CLIPTextEncode", [0.0, 0.0], [200.0, 100.0]);
        node.inputs = vec![InputSlot::new("text", SlotType::tag("STRING"))
            .with_widget(WidgetDesc::new(WidgetKind::Text, "text"))];

        assert_eq!(node.widget_value("text"), None);
    }
}
