//! Capability descriptors and the type registry.
//!
//! A [`NodeCapability`] describes what one node type can do: its declared
//! inputs (required and optional, with per-input configs), the preferred
//! input ordering, its output types and display names. The
//! [`CapabilityRegistry`] maps type names to capabilities.
//!
//! The registry is read-only from the core's perspective: the caller
//! fetches it (over whatever transport) and passes it in. An unavailable
//! registry is indistinguishable from an empty one -- every type is simply
//! "missing", which every consumer here treats as a non-fatal condition.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::slot::SlotType;

/// Per-input configuration attached to a capability input spec.
///
/// Only the fields the slot builder interprets are declared; everything
/// else rides along in `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Default widget value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Multiline text inputs render as a textarea widget.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiline: Option<bool>,
    /// Enumerable values make an otherwise connection-only type selectable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<Value>>,
    /// Upload affordance; the slot gets a combo widget over uploaded names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_upload: Option<bool>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

/// Raw per-input spec: either a bare type tag or `[tag, config]`.
///
/// The bare form also covers the legacy combo shape where the tag position
/// holds the literal options list; [`SlotType`]'s untagged serde sorts the
/// two apart (a two-element list whose second element is an object parses
/// as tag-plus-config, anything else as a bare type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputSpec {
    WithConfig(SlotType, InputConfig),
    Bare(SlotType),
}

impl InputSpec {
    /// The input's type tag (or options list).
    pub fn ty(&self) -> &SlotType {
        match self {
            InputSpec::WithConfig(ty, _) => ty,
            InputSpec::Bare(ty) => ty,
        }
    }

    /// The input's config, if one was declared.
    pub fn config(&self) -> Option<&InputConfig> {
        match self {
            InputSpec::WithConfig(_, config) => Some(config),
            InputSpec::Bare(_) => None,
        }
    }
}

/// Declared inputs, split into required and optional sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSection {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub required: IndexMap<String, InputSpec>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub optional: IndexMap<String, InputSpec>,
}

/// Preferred input ordering. May be incomplete or missing entirely; the
/// slot builder falls back to declaration order for unlisted names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputOrder {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub optional: Vec<String>,
}

/// Capability descriptor for one node type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeCapability {
    #[serde(default)]
    pub input: InputSection,
    #[serde(default)]
    pub input_order: InputOrder,
    /// Ordered output type tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output: Vec<SlotType>,
    /// Ordered output display names; falls back to the tag when short.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub output_name: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl NodeCapability {
    /// The human-facing name: `display_name` if set, else the given type name.
    pub fn title_for<'a>(&'a self, type_name: &'a str) -> &'a str {
        self.display_name.as_deref().unwrap_or(type_name)
    }
}

/// Read-only map from node type name to capability descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityRegistry {
    types: IndexMap<String, NodeCapability>,
}

impl CapabilityRegistry {
    /// Creates an empty registry (equivalent to "registry unavailable").
    pub fn new() -> Self {
        CapabilityRegistry {
            types: IndexMap::new(),
        }
    }

    /// Registers (or replaces) a capability descriptor.
    pub fn insert(&mut self, type_name: impl Into<String>, capability: NodeCapability) {
        self.types.insert(type_name.into(), capability);
    }

    /// Looks up a capability descriptor by type name.
    pub fn get(&self, type_name: &str) -> Option<&NodeCapability> {
        self.types.get(type_name)
    }

    /// Returns `true` if the registry has an entry for the type name.
    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    /// Number of registered type names.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if no types are registered.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterates over `(type_name, capability)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &NodeCapability)> {
        self.types.iter()
    }
}

impl FromIterator<(String, NodeCapability)> for CapabilityRegistry {
    fn from_iter<T: IntoIterator<Item = (String, NodeCapability)>>(iter: T) -> Self {
        CapabilityRegistry {
            types: iter.into_iter().collect(),
        }
    }
}
