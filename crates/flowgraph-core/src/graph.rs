//! The mutable in-memory graph: node table, link table, groups, and id
//! counters.
//!
//! [`GraphStore`] is the single owner of graph state. All mutations are
//! explicit `&mut self` methods that keep the link invariant intact: a live
//! link id appears in exactly one input's `link` field and exactly one
//! output's `links` list, and dangling references never persist.
//!
//! There is no interior mutability and no locking. The store is driven by
//! discrete user edits from a single logical owner; callers that need
//! snapshots (undo, cancel-reposition) clone the store before editing, and
//! callers that autosave serialize writes themselves.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde_json::Value;

use crate::error::GraphError;
use crate::factory::create_node;
use crate::group::Group;
use crate::id::{GroupId, LinkId, NodeId};
use crate::link::Link;
use crate::node::Node;
use crate::registry::CapabilityRegistry;
use crate::slot::LinkList;

/// The mutable workflow graph.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    /// Node table in document order.
    nodes: IndexMap<NodeId, Node>,
    /// Link table in document order, keyed for O(1) integrity checks.
    links: IndexMap<LinkId, Link>,
    /// Geometric group records.
    pub groups: Vec<Group>,
    /// Monotonic id counters; always >= the max id present.
    last_node_id: u64,
    last_link_id: u64,
    /// Passthrough top-level metadata. Survives load -> edit -> serialize
    /// unmodified.
    pub version: Option<Value>,
    pub revision: Option<Value>,
    pub extra: Option<Value>,
}

impl GraphStore {
    /// Creates an empty graph. Empty collections are a valid graph.
    pub fn new() -> Self {
        GraphStore::default()
    }

    /// Constructs a `GraphStore` from already-consistent parts.
    ///
    /// This is the loader's entry point: the wire layer builds the tables
    /// and hands them over without re-running the edit-path validation.
    /// Counters are raised to cover the maximum ids present so later
    /// allocations can never collide.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        nodes: IndexMap<NodeId, Node>,
        links: IndexMap<LinkId, Link>,
        groups: Vec<Group>,
        last_node_id: u64,
        last_link_id: u64,
        version: Option<Value>,
        revision: Option<Value>,
        extra: Option<Value>,
    ) -> Self {
        let last_node_id = last_node_id.max(nodes.keys().map(|id| id.0).max().unwrap_or(0));
        let last_link_id = last_link_id.max(links.keys().map(|id| id.0).max().unwrap_or(0));

        GraphStore {
            nodes,
            links,
            groups,
            last_node_id,
            last_link_id,
            version,
            revision,
            extra,
        }
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    /// The node table, in document order.
    pub fn nodes(&self) -> &IndexMap<NodeId, Node> {
        &self.nodes
    }

    /// The link table, in document order.
    pub fn links(&self) -> &IndexMap<LinkId, Link> {
        &self.links
    }

    /// Looks up a node by id.
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Looks up a node by id, mutably. Field edits (position, title, mode)
    /// go through here; structural edits use the dedicated methods so the
    /// link invariant stays intact.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Looks up a link by id.
    pub fn link(&self, id: LinkId) -> Option<&Link> {
        self.links.get(&id)
    }

    /// Highest node id ever allocated or loaded.
    pub fn last_node_id(&self) -> u64 {
        self.last_node_id
    }

    /// Highest link id ever allocated or loaded.
    pub fn last_link_id(&self) -> u64 {
        self.last_link_id
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of links.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    // -----------------------------------------------------------------------
    // Node methods
    // -----------------------------------------------------------------------

    /// Creates a node of the given type at the given position, allocating
    /// the next node id.
    ///
    /// The one place a missing registry entry is a hard error: without a
    /// capability descriptor there are no slots to build.
    pub fn add_node(
        &mut self,
        type_name: &str,
        pos: [f64; 2],
        registry: &CapabilityRegistry,
    ) -> Result<NodeId, GraphError> {
        let capability = registry
            .get(type_name)
            .ok_or_else(|| GraphError::UnknownNodeType {
                type_name: type_name.to_string(),
            })?;

        self.last_node_id += 1;
        let id = NodeId(self.last_node_id);
        let node = create_node(id, type_name, pos, capability);
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Inserts a prebuilt node, replacing any node with the same id and
    /// raising the id counter to cover it. Used by the loader.
    pub fn insert_node(&mut self, node: Node) {
        self.last_node_id = self.last_node_id.max(node.id.0);
        self.nodes.insert(node.id, node);
    }

    /// Every link id touching the given node, on either side.
    ///
    /// The union covers the node's own slot references plus a sweep of the
    /// link table, which catches references a stale slot no longer carries.
    pub fn collect_link_ids(&self, id: NodeId) -> BTreeSet<LinkId> {
        let mut ids = BTreeSet::new();

        if let Some(node) = self.nodes.get(&id) {
            for input in &node.inputs {
                if let Some(link) = input.link {
                    ids.insert(link);
                }
            }
            for output in &node.outputs {
                if let Some(links) = &output.links {
                    ids.extend(links.iter().copied());
                }
            }
        }
        for (link_id, link) in &self.links {
            if link.touches(id) {
                ids.insert(*link_id);
            }
        }

        ids
    }

    /// Removes a node together with every link touching it, then scrubs the
    /// removed link ids off all remaining nodes so no dangling reference
    /// survives.
    ///
    /// Removing a nonexistent id is a no-op returning `None`.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        if !self.nodes.contains_key(&id) {
            return None;
        }

        let removed_links = self.collect_link_ids(id);
        for link_id in &removed_links {
            self.links.shift_remove(link_id);
        }
        let node = self.nodes.shift_remove(&id);

        for remaining in self.nodes.values_mut() {
            for input in &mut remaining.inputs {
                if input.link.map_or(false, |link| removed_links.contains(&link)) {
                    input.link = None;
                }
            }
            for output in &mut remaining.outputs {
                if let Some(links) = &mut output.links {
                    links.retain(|link| !removed_links.contains(link));
                }
                output.normalize();
            }
        }

        #[cfg(debug_assertions)]
        self.assert_consistency();

        node
    }

    // -----------------------------------------------------------------------
    // Link methods
    // -----------------------------------------------------------------------

    /// Connects an output slot to an input slot, allocating the next link
    /// id.
    ///
    /// An input holds at most one link: any existing connection on the
    /// target slot is disconnected first. The link's type tag is copied
    /// from the origin output slot.
    pub fn connect(
        &mut self,
        origin: NodeId,
        origin_slot: usize,
        target: NodeId,
        target_slot: usize,
    ) -> Result<LinkId, GraphError> {
        let ty = {
            let node = self
                .nodes
                .get(&origin)
                .ok_or(GraphError::NodeNotFound { id: origin })?;
            let slot = node
                .outputs
                .get(origin_slot)
                .ok_or(GraphError::OutputSlotOutOfRange {
                    node: origin,
                    index: origin_slot,
                })?;
            slot.ty.clone()
        };
        let displaced = {
            let node = self
                .nodes
                .get(&target)
                .ok_or(GraphError::NodeNotFound { id: target })?;
            let slot = node
                .inputs
                .get(target_slot)
                .ok_or(GraphError::InputSlotOutOfRange {
                    node: target,
                    index: target_slot,
                })?;
            slot.link
        };

        if let Some(old) = displaced {
            if self.links.contains_key(&old) {
                self.disconnect(old)?;
            } else if let Some(node) = self.nodes.get_mut(&target) {
                // Stale reference with no backing link: scrub it.
                if let Some(slot) = node.inputs.get_mut(target_slot) {
                    slot.link = None;
                }
            }
        }

        self.last_link_id += 1;
        let id = LinkId(self.last_link_id);
        self.links.insert(
            id,
            Link {
                id,
                origin_id: origin,
                origin_slot,
                target_id: target,
                target_slot,
                ty: Some(ty),
            },
        );

        if let Some(node) = self.nodes.get_mut(&origin) {
            if let Some(slot) = node.outputs.get_mut(origin_slot) {
                slot.links.get_or_insert_with(LinkList::new).push(id);
            }
        }
        if let Some(node) = self.nodes.get_mut(&target) {
            if let Some(slot) = node.inputs.get_mut(target_slot) {
                slot.link = Some(id);
            }
        }

        #[cfg(debug_assertions)]
        self.assert_consistency();

        Ok(id)
    }

    /// Removes a link and clears both endpoint references.
    pub fn disconnect(&mut self, id: LinkId) -> Result<Link, GraphError> {
        let link = self
            .links
            .shift_remove(&id)
            .ok_or(GraphError::LinkNotFound { id })?;

        if let Some(node) = self.nodes.get_mut(&link.origin_id) {
            if let Some(slot) = node.outputs.get_mut(link.origin_slot) {
                if let Some(links) = &mut slot.links {
                    links.retain(|l| *l != id);
                }
                slot.normalize();
            }
        }
        if let Some(node) = self.nodes.get_mut(&link.target_id) {
            if let Some(slot) = node.inputs.get_mut(link.target_slot) {
                if slot.link == Some(id) {
                    slot.link = None;
                }
            }
        }

        #[cfg(debug_assertions)]
        self.assert_consistency();

        Ok(link)
    }

    // -----------------------------------------------------------------------
    // Group methods
    // -----------------------------------------------------------------------

    /// Adds a group, allocating the next free group id.
    pub fn add_group(
        &mut self,
        title: impl Into<String>,
        bounding: [f64; 4],
        color: Option<String>,
    ) -> GroupId {
        let id = GroupId(self.groups.iter().map(|g| g.id.0).max().unwrap_or(0) + 1);
        let mut group = Group::new(id, title, bounding);
        group.color = color;
        self.groups.push(group);
        id
    }

    /// Removes a group by id. Filters the group list only; node and link
    /// tables are untouched.
    pub fn remove_group(&mut self, id: GroupId) -> Option<Group> {
        let position = self.groups.iter().position(|group| group.id == id)?;
        Some(self.groups.remove(position))
    }

    // -----------------------------------------------------------------------
    // Widget values
    // -----------------------------------------------------------------------

    /// Reads a widget value by name. `Ok(None)` when the value list does
    /// not cover the widget yet.
    pub fn widget_value(&self, id: NodeId, name: &str) -> Result<Option<&Value>, GraphError> {
        let node = self.nodes.get(&id).ok_or(GraphError::NodeNotFound { id })?;
        let index = node
            .widget_value_index(name)
            .ok_or_else(|| GraphError::WidgetNotFound {
                node: id,
                name: name.to_string(),
            })?;
        Ok(node.widgets_values.get(index))
    }

    /// Writes a widget value by name, padding the value list with nulls if
    /// it is shorter than the widget layout requires.
    pub fn set_widget_value(
        &mut self,
        id: NodeId,
        name: &str,
        value: Value,
    ) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(GraphError::NodeNotFound { id })?;
        let index = node
            .widget_value_index(name)
            .ok_or_else(|| GraphError::WidgetNotFound {
                node: id,
                name: name.to_string(),
            })?;

        if node.widgets_values.len() <= index {
            node.widgets_values.resize(index + 1, Value::Null);
        }
        node.widgets_values[index] = value;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Debug consistency assertion
    // -----------------------------------------------------------------------

    /// Verifies the link invariant: every link's endpoints exist and point
    /// back at it, and every slot reference is backed by the link table.
    #[cfg(debug_assertions)]
    pub(crate) fn assert_consistency(&self) {
        for (id, link) in &self.links {
            let origin = self
                .nodes
                .get(&link.origin_id)
                .unwrap_or_else(|| panic!("link {id} origin node missing"));
            let output = origin
                .outputs
                .get(link.origin_slot)
                .unwrap_or_else(|| panic!("link {id} origin slot out of range"));
            assert!(
                output
                    .links
                    .as_ref()
                    .map_or(false, |links| links.contains(id)),
                "link {id} not in origin output list"
            );

            let target = self
                .nodes
                .get(&link.target_id)
                .unwrap_or_else(|| panic!("link {id} target node missing"));
            let input = target
                .inputs
                .get(link.target_slot)
                .unwrap_or_else(|| panic!("link {id} target slot out of range"));
            assert_eq!(input.link, Some(*id), "link {id} not on target input");
        }

        for node in self.nodes.values() {
            for input in &node.inputs {
                if let Some(link) = input.link {
                    assert!(
                        self.links.contains_key(&link),
                        "node {} references dead link {link}",
                        node.id
                    );
                }
            }
            for output in &node.outputs {
                for link in output.links.iter().flatten() {
                    assert!(
                        self.links.contains_key(link),
                        "node {} references dead link {link}",
                        node.id
                    );
                }
            }
        }
    }
}
