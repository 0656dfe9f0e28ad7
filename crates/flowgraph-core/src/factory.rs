//! Node factory: builds a fresh node instance from a type name and its
//! capability descriptor.
//!
//! Id allocation lives in the graph store; the factory itself is pure so
//! callers (and tests) can build nodes without a store.

use crate::id::NodeId;
use crate::node::Node;
use crate::registry::NodeCapability;
use crate::slots::{build_input_slots, build_output_slots, default_widget_values};

/// Minimum node width in canvas units.
const MIN_WIDTH: f64 = 200.0;

/// Creates a node of the given type at the given position.
///
/// Size heuristic: width `max(200, 8 x display-name length + 40)`, height
/// `60 + 20 x max(#inputs, #outputs)`. Slots and default widget values come
/// from the slot builder; the title defaults to the capability display name
/// (else the type name), mode to ALWAYS, order to 0.
pub fn create_node(
    id: NodeId,
    type_name: &str,
    pos: [f64; 2],
    capability: &NodeCapability,
) -> Node {
    let inputs = build_input_slots(&capability.input, &capability.input_order);
    let outputs = build_output_slots(&capability.output, &capability.output_name);
    let widgets_values = default_widget_values(&capability.input, &capability.input_order);

    let title = capability.title_for(type_name);
    let width = MIN_WIDTH.max((8 * title.chars().count() + 40) as f64);
    let height = 60.0 + 20.0 * inputs.len().max(outputs.len()) as f64;

    let mut node = Node::new(id, type_name, pos, [width, height]);
    node.title = Some(title.to_string());
    node.inputs = inputs;
    node.outputs = outputs;
    node.widgets_values = widgets_values;
    node
}
