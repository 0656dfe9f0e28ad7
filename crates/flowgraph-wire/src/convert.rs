//! Load/serialize conversions between wire documents and the graph store.
//!
//! [`load`] turns a [`WorkflowDocument`] into a [`GraphStore`] plus a
//! [`LoadReport`] of everything that was tolerated along the way; [`serialize`]
//! is the exact inverse. Round-trip determinism is the contract:
//! `serialize(load(serialize(load(doc))))` is structurally equal to
//! `serialize(load(doc))` for any document that loads at all.
//!
//! Normalizations applied exactly once, at load time:
//! - name-keyed widget values migrate to the canonical positional list;
//! - empty output link lists collapse to `null`;
//! - slot link references are rebuilt from the (authoritative) link table,
//!   so inconsistent documents come out repaired rather than dangling.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use flowgraph_core::slot::{CONTROL_COMPANION_DEFAULT, CONTROL_COMPANION_KEY};
use flowgraph_core::{
    CapabilityRegistry, GraphStore, InputSlot, Link, LinkId, LinkList, Node, NodeId,
};

use crate::document::{LinkTuple, NodeDoc, WidgetValuesDoc, WorkflowDocument};
use crate::error::WireError;
use crate::preprocess::DocumentPass;

/// Load-time behavior toggles.
#[derive(Default)]
pub struct LoadOptions {
    /// Drop unrecognized per-node fields (runtime/display leftovers other
    /// editors write). Off by default so foreign documents round-trip
    /// byte-faithfully.
    pub clean: bool,
    /// Preprocessing passes, applied to the raw document in order before
    /// graph construction.
    pub passes: Vec<Box<dyn DocumentPass>>,
}

impl LoadOptions {
    /// Adds a preprocessing pass.
    pub fn with_pass(mut self, pass: Box<dyn DocumentPass>) -> Self {
        self.passes.push(pass);
        self
    }
}

/// Everything the loader tolerated rather than failed on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Nodes whose type has no registry entry. The nodes themselves are
    /// retained untouched.
    pub missing_types: BTreeSet<NodeId>,
    /// Link tuples dropped for referencing a missing node or slot, or for
    /// losing an input-slot conflict.
    pub dropped_links: Vec<LinkId>,
}

impl LoadReport {
    /// Returns `true` if the document loaded without any tolerated anomaly.
    pub fn is_clean(&self) -> bool {
        self.missing_types.is_empty() && self.dropped_links.is_empty()
    }
}

/// Builds a graph store from a wire document.
///
/// Fatal conditions are duplicate node/link ids (and, upstream of this
/// call, a document that fails to deserialize). A node type missing from
/// the registry is never fatal: the node is kept with its document slots
/// and values, and its id lands in [`LoadReport::missing_types`] -- the
/// document survives an engine that lacks optional node types.
pub fn load(
    document: WorkflowDocument,
    registry: &CapabilityRegistry,
    options: &LoadOptions,
) -> Result<(GraphStore, LoadReport), WireError> {
    let mut document = document;
    for pass in &options.passes {
        debug!(pass = pass.name(), "applying document pass");
        pass.apply(&mut document);
    }

    let mut report = LoadReport::default();

    // Node table, in document order.
    let mut nodes: IndexMap<NodeId, Node> = IndexMap::with_capacity(document.nodes.len());
    for node_doc in document.nodes {
        if !registry.contains(&node_doc.node_type) {
            debug!(node = %node_doc.id, node_type = %node_doc.node_type, "type missing from registry");
            report.missing_types.insert(node_doc.id);
        }
        let node = node_from_doc(node_doc, options.clean);
        let id = node.id;
        if nodes.insert(id, node).is_some() {
            return Err(WireError::DuplicateNodeId { id });
        }
    }

    // Link table. Tuples referencing a missing node or slot are dropped;
    // the document still loads.
    let mut links: IndexMap<LinkId, Link> = IndexMap::with_capacity(document.links.len());
    for tuple in document.links {
        let link = Link::from(tuple);
        let id = link.id;

        let origin_ok = nodes
            .get(&link.origin_id)
            .map_or(false, |node| link.origin_slot < node.outputs.len());
        let target_ok = nodes
            .get(&link.target_id)
            .map_or(false, |node| link.target_slot < node.inputs.len());
        if !origin_ok || !target_ok {
            warn!(link = %id, "dropping dangling link");
            report.dropped_links.push(id);
            continue;
        }

        if links.insert(id, link).is_some() {
            return Err(WireError::DuplicateLinkId { id });
        }
    }

    rebuild_slot_references(&mut nodes, &mut links, &mut report);

    let graph = GraphStore::from_parts(
        nodes,
        links,
        document.groups,
        document.last_node_id,
        document.last_link_id,
        document.version,
        document.revision,
        document.extra,
    );

    Ok((graph, report))
}

/// Serializes a graph store back into its wire document shape.
///
/// Only document state is written: runtime concerns (the load report,
/// registry lookups) have no representation here by construction.
pub fn serialize(graph: &GraphStore) -> WorkflowDocument {
    WorkflowDocument {
        last_node_id: graph.last_node_id(),
        last_link_id: graph.last_link_id(),
        nodes: graph.nodes().values().map(node_to_doc).collect(),
        links: graph.links().values().map(LinkTuple::from).collect(),
        groups: graph.groups.clone(),
        extra: graph.extra.clone(),
        version: graph.version.clone(),
        revision: graph.revision.clone(),
    }
}

/// Converts one document node into the in-memory model, migrating legacy
/// widget-value shapes into the canonical positional list.
fn node_from_doc(doc: NodeDoc, clean: bool) -> Node {
    let widgets_values = match doc.widgets_values {
        WidgetValuesDoc::List(values) => values,
        WidgetValuesDoc::Map(map) => normalize_widget_map(doc.id, &doc.inputs, map),
    };

    let mut node = Node::new(doc.id, doc.node_type, doc.pos, doc.size);
    node.title = doc.title;
    node.flags = doc.flags;
    node.order = doc.order;
    node.mode = doc.mode;
    node.color = doc.color;
    node.bgcolor = doc.bgcolor;
    node.inputs = doc.inputs;
    node.outputs = doc.outputs;
    node.widgets_values = widgets_values;
    node.properties = doc.properties;
    if !clean {
        node.extra = doc.extra;
    }
    node
}

fn node_to_doc(node: &Node) -> NodeDoc {
    NodeDoc {
        id: node.id,
        node_type: node.node_type.clone(),
        title: node.title.clone(),
        pos: node.pos,
        size: node.size,
        flags: node.flags.clone(),
        order: node.order,
        mode: node.mode,
        color: node.color.clone(),
        bgcolor: node.bgcolor.clone(),
        inputs: node.inputs.clone(),
        outputs: node.outputs.clone(),
        widgets_values: WidgetValuesDoc::List(node.widgets_values.clone()),
        properties: node.properties.clone(),
        extra: node.extra.clone(),
    }
}

/// Migrates the legacy name-keyed widget map into the positional list,
/// walking the node's own widget-bearing slots in order.
fn normalize_widget_map(
    id: NodeId,
    inputs: &[InputSlot],
    mut map: IndexMap<String, Value>,
) -> Vec<Value> {
    let mut values = Vec::new();
    for slot in inputs {
        if let Some(widget) = &slot.widget {
            values.push(map.swap_remove(&widget.name).unwrap_or(Value::Null));
            if slot.has_control_companion() {
                values.push(
                    map.swap_remove(CONTROL_COMPANION_KEY)
                        .unwrap_or_else(|| Value::from(CONTROL_COMPANION_DEFAULT)),
                );
            }
        }
    }
    if !map.is_empty() {
        warn!(
            node = %id,
            names = ?map.keys().collect::<Vec<_>>(),
            "dropping widget values with no matching slot"
        );
    }
    values
}

/// Rebuilds every slot's link references from the link table.
///
/// The table is authoritative: all references are cleared, then each link
/// claims its target input and joins its origin output list in table
/// order. A link whose target input is already claimed loses the conflict
/// and is dropped. Consistent documents come out bit-identical; anything
/// else comes out repaired.
fn rebuild_slot_references(
    nodes: &mut IndexMap<NodeId, Node>,
    links: &mut IndexMap<LinkId, Link>,
    report: &mut LoadReport,
) {
    for node in nodes.values_mut() {
        for input in &mut node.inputs {
            input.link = None;
        }
        for output in &mut node.outputs {
            output.links = None;
        }
    }

    let mut conflicts = Vec::new();
    links.retain(|id, link| {
        {
            let Some(target) = nodes.get_mut(&link.target_id) else {
                return false;
            };
            let Some(slot) = target.inputs.get_mut(link.target_slot) else {
                return false;
            };
            if slot.link.is_some() {
                conflicts.push(*id);
                return false;
            }
            slot.link = Some(*id);
        }
        if let Some(origin) = nodes.get_mut(&link.origin_id) {
            if let Some(slot) = origin.outputs.get_mut(link.origin_slot) {
                slot.links.get_or_insert_with(LinkList::new).push(*id);
            }
        }
        true
    });

    for id in conflicts {
        warn!(link = %id, "dropping link: target input already connected");
        report.dropped_links.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> CapabilityRegistry {
        serde_json::from_value(json!({
            "LoadImage": {
                "output": ["IMAGE"],
                "output_name": ["IMAGE"]
            },
            "KSampler": {
                "input": {
                    "required": {
                        "model": "MODEL",
                        "seed": ["INT", {"default": 0}],
                        "steps": ["INT", {"default": 20}]
                    }
                },
                "input_order": {"required": ["model", "seed", "steps"]},
                "output": ["LATENT"]
            }
        }))
        .unwrap()
    }

    fn sampler_doc() -> WorkflowDocument {
        WorkflowDocument::from_value(json!({
            "last_node_id": 2,
            "last_link_id": 1,
            "nodes": [
                {
                    "id": 1,
                    "type": "LoadImage",
                    "pos": [0.0, 0.0],
                    "size": [210.0, 80.0],
                    "outputs": [{"name": "IMAGE", "type": "IMAGE", "links": [1]}]
                },
                {
                    "id": 2,
                    "type": "KSampler",
                    "pos": [300.0, 0.0],
                    "size": [250.0, 120.0],
                    "inputs": [
                        {"name": "model", "type": "MODEL", "link": 1},
                        {"name": "seed", "type": "INT", "link": null,
                         "widget": {"type": "number", "name": "seed"}},
                        {"name": "steps", "type": "INT", "link": null,
                         "widget": {"type": "number", "name": "steps"}}
                    ],
                    "outputs": [{"name": "LATENT", "type": "LATENT", "links": null}],
                    "widgets_values": [7, "Fixed", 20]
                }
            ],
            "links": [[1, 1, 0, 2, 0, "IMAGE"]],
            "version": 0.4
        }))
        .unwrap()
    }

    #[test]
    fn load_builds_keyed_tables() {
        let (graph, report) = load(sampler_doc(), &registry(), &LoadOptions::default()).unwrap();

        assert!(report.is_clean());
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.link_count(), 1);

        let link = graph.link(LinkId(1)).unwrap();
        assert_eq!(link.origin_id, NodeId(1));
        assert_eq!(link.target_id, NodeId(2));

        let sampler = graph.node(NodeId(2)).unwrap();
        assert_eq!(sampler.inputs[0].link, Some(LinkId(1)));
        assert_eq!(sampler.widget_value("seed"), Some(&json!(7)));
    }

    #[test]
    fn missing_type_node_is_retained_and_reported() {
        let mut document = sampler_doc();
        document.nodes[1].node_type = "CustomSampler".to_string();

        let (graph, report) = load(document, &registry(), &LoadOptions::default()).unwrap();

        // The node survives with its document slots and values, and the
        // report names exactly that node.
        assert_eq!(graph.node_count(), 2);
        let node = graph.node(NodeId(2)).unwrap();
        assert_eq!(node.node_type, "CustomSampler");
        assert_eq!(node.inputs.len(), 3);
        assert_eq!(node.widgets_values, vec![json!(7), json!("Fixed"), json!(20)]);
        assert_eq!(report.missing_types, BTreeSet::from([NodeId(2)]));
    }

    #[test]
    fn registry_unavailable_means_every_type_missing() {
        let (graph, report) = load(
            sampler_doc(),
            &CapabilityRegistry::new(),
            &LoadOptions::default(),
        )
        .unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(
            report.missing_types,
            BTreeSet::from([NodeId(1), NodeId(2)])
        );
    }

    #[test]
    fn dangling_link_is_dropped_and_scrubbed() {
        let mut document = sampler_doc();
        // Tuple 9 references node 99, which does not exist; the LoadImage
        // output also claims it.
        document.links.push(serde_json::from_value(json!([9, 1, 0, 99, 0, "IMAGE"])).unwrap());
        document.nodes[0].outputs[0].links = Some(LinkList::from_slice(&[LinkId(1), LinkId(9)]));

        let (graph, report) = load(document, &registry(), &LoadOptions::default()).unwrap();

        assert_eq!(report.dropped_links, vec![LinkId(9)]);
        let out = &graph.node(NodeId(1)).unwrap().outputs[0];
        assert_eq!(out.links.as_ref().map(|l| l.as_slice()), Some([LinkId(1)].as_slice()));
    }

    #[test]
    fn out_of_range_slot_link_is_dropped() {
        let mut document = sampler_doc();
        document.links.push(serde_json::from_value(json!([9, 1, 4, 2, 0, null])).unwrap());

        let (_, report) = load(document, &registry(), &LoadOptions::default()).unwrap();
        assert_eq!(report.dropped_links, vec![LinkId(9)]);
    }

    #[test]
    fn conflicting_input_claims_keep_first_link() {
        let mut document = sampler_doc();
        document.links.push(serde_json::from_value(json!([2, 1, 0, 2, 0, "IMAGE"])).unwrap());

        let (graph, report) = load(document, &registry(), &LoadOptions::default()).unwrap();

        assert_eq!(report.dropped_links, vec![LinkId(2)]);
        assert_eq!(graph.node(NodeId(2)).unwrap().inputs[0].link, Some(LinkId(1)));
        assert_eq!(graph.link_count(), 1);
    }

    #[test]
    fn name_keyed_widget_values_are_normalized() {
        let mut document = sampler_doc();
        document.nodes[1].widgets_values = serde_json::from_value(json!({
            "seed": 42,
            "control_after_generate": "randomize",
            "steps": 30
        }))
        .unwrap();

        let (graph, _) = load(document, &registry(), &LoadOptions::default()).unwrap();

        let node = graph.node(NodeId(2)).unwrap();
        assert_eq!(
            node.widgets_values,
            vec![json!(42), json!("randomize"), json!(30)]
        );
    }

    #[test]
    fn name_keyed_values_missing_companion_get_default() {
        let mut document = sampler_doc();
        document.nodes[1].widgets_values =
            serde_json::from_value(json!({"seed": 1, "steps": 2})).unwrap();

        let (graph, _) = load(document, &registry(), &LoadOptions::default()).unwrap();
        assert_eq!(
            graph.node(NodeId(2)).unwrap().widgets_values,
            vec![json!(1), json!("Fixed"), json!(2)]
        );
    }

    #[test]
    fn empty_output_list_normalizes_to_null() {
        let mut document = sampler_doc();
        document.nodes[1].outputs[0].links = Some(LinkList::new());

        let (graph, _) = load(document, &registry(), &LoadOptions::default()).unwrap();
        assert_eq!(graph.node(NodeId(2)).unwrap().outputs[0].links, None);

        let out = serialize(&graph);
        let value = serde_json::to_value(&out).unwrap();
        assert_eq!(value["nodes"][1]["outputs"][0]["links"], json!(null));
    }

    #[test]
    fn counters_are_raised_to_cover_content() {
        let mut document = sampler_doc();
        document.last_node_id = 0;
        document.last_link_id = 0;

        let (graph, _) = load(document, &registry(), &LoadOptions::default()).unwrap();
        assert_eq!(graph.last_node_id(), 2);
        assert_eq!(graph.last_link_id(), 1);
    }

    #[test]
    fn duplicate_node_id_is_fatal() {
        let mut document = sampler_doc();
        let clone = document.nodes[0].clone();
        document.nodes.push(clone);

        let result = load(document, &registry(), &LoadOptions::default());
        assert!(matches!(
            result,
            Err(WireError::DuplicateNodeId { id: NodeId(1) })
        ));
    }

    #[test]
    fn clean_strips_unrecognized_node_fields() {
        let mut document = sampler_doc();
        document.nodes[0]
            .extra
            .insert("shape".to_string(), json!(1));

        let keep = load(document.clone(), &registry(), &LoadOptions::default())
            .unwrap()
            .0;
        assert_eq!(
            keep.node(NodeId(1)).unwrap().extra.get("shape"),
            Some(&json!(1))
        );

        let clean_options = LoadOptions {
            clean: true,
            ..LoadOptions::default()
        };
        let cleaned = load(document, &registry(), &clean_options).unwrap().0;
        assert!(cleaned.node(NodeId(1)).unwrap().extra.is_empty());
    }

    #[test]
    fn metadata_passes_through_untouched() {
        let (graph, _) = load(sampler_doc(), &registry(), &LoadOptions::default()).unwrap();
        assert_eq!(graph.version, Some(json!(0.4)));

        let out = serialize(&graph);
        assert_eq!(out.version, Some(json!(0.4)));
        assert_eq!(out.revision, None);
    }
}
