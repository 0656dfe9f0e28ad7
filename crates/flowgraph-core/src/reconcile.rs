//! Slot reconciliation: re-synchronizing a node against updated capability
//! metadata without breaking existing wiring.
//!
//! The merge is append-only. Existing slots pass through verbatim -- same
//! order, same `link`/`links` values -- and only template slots whose names
//! are not already present are appended. A plugin update that adds a
//! parameter therefore grows the node without disturbing a single
//! connection.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::GraphError;
use crate::graph::GraphStore;
use crate::id::NodeId;
use crate::registry::CapabilityRegistry;
use crate::slot::{InputSlot, OutputSlot};
use crate::slots::{build_input_slots, build_output_slots, default_values_for};

/// Per-node outcome of a refresh, so a batch over many nodes can report
/// partial success instead of failing wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RefreshOutcome {
    /// New slots were appended.
    Updated {
        added_inputs: Vec<String>,
        added_outputs: Vec<String>,
    },
    /// The template added nothing new.
    Unchanged,
    /// The node's type has no registry entry; the node was left untouched.
    SkippedMissingType,
}

/// Merges existing slots with a freshly generated template.
///
/// Existing slots are preserved verbatim; template slots with new names are
/// appended in template order.
pub fn reconcile_slots(
    existing_inputs: Vec<InputSlot>,
    existing_outputs: Vec<OutputSlot>,
    template_inputs: Vec<InputSlot>,
    template_outputs: Vec<OutputSlot>,
) -> (Vec<InputSlot>, Vec<OutputSlot>) {
    let input_names: BTreeSet<String> = existing_inputs
        .iter()
        .map(|slot| slot.name.clone())
        .collect();
    let output_names: BTreeSet<String> = existing_outputs
        .iter()
        .map(|slot| slot.name.clone())
        .collect();

    let mut inputs = existing_inputs;
    inputs.extend(
        template_inputs
            .into_iter()
            .filter(|slot| !input_names.contains(&slot.name)),
    );

    let mut outputs = existing_outputs;
    outputs.extend(
        template_outputs
            .into_iter()
            .filter(|slot| !output_names.contains(&slot.name)),
    );

    (inputs, outputs)
}

impl GraphStore {
    /// Reconciles one node's slots against the registry.
    ///
    /// A missing registry entry is a skip outcome, not an error; only a
    /// missing node errors. Newly appended widget-bearing inputs get their
    /// default values appended so `widgets_values` stays aligned with the
    /// widget layout.
    pub fn refresh_node(
        &mut self,
        id: NodeId,
        registry: &CapabilityRegistry,
    ) -> Result<RefreshOutcome, GraphError> {
        let node = self.node(id).ok_or(GraphError::NodeNotFound { id })?;
        let Some(capability) = registry.get(&node.node_type) else {
            return Ok(RefreshOutcome::SkippedMissingType);
        };

        let template_inputs = build_input_slots(&capability.input, &capability.input_order);
        let template_outputs = build_output_slots(&capability.output, &capability.output_name);

        let existing_input_count = node.inputs.len();
        let existing_output_count = node.outputs.len();
        let (inputs, outputs) = reconcile_slots(
            node.inputs.clone(),
            node.outputs.clone(),
            template_inputs,
            template_outputs,
        );

        let added_inputs: Vec<String> = inputs[existing_input_count..]
            .iter()
            .map(|slot| slot.name.clone())
            .collect();
        let added_outputs: Vec<String> = outputs[existing_output_count..]
            .iter()
            .map(|slot| slot.name.clone())
            .collect();

        if added_inputs.is_empty() && added_outputs.is_empty() {
            return Ok(RefreshOutcome::Unchanged);
        }

        // Defaults for the appended widget-bearing inputs, in append order.
        let mut appended_values = Vec::new();
        for name in &added_inputs {
            let spec = capability
                .input
                .required
                .get(name)
                .or_else(|| capability.input.optional.get(name));
            if let Some(spec) = spec {
                appended_values.extend(default_values_for(name, spec));
            }
        }

        if let Some(node) = self.node_mut(id) {
            node.inputs = inputs;
            node.outputs = outputs;
            node.widgets_values.extend(appended_values);
        }

        Ok(RefreshOutcome::Updated {
            added_inputs,
            added_outputs,
        })
    }

    /// Reconciles every node in the graph, reporting one outcome per node
    /// in table order.
    pub fn refresh_all(&mut self, registry: &CapabilityRegistry) -> Vec<(NodeId, RefreshOutcome)> {
        let ids: Vec<NodeId> = self.nodes().keys().copied().collect();
        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            if let Ok(outcome) = self.refresh_node(id, registry) {
                outcomes.push((id, outcome));
            }
        }
        outcomes
    }
}
