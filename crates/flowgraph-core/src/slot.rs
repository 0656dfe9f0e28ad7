//! Slot types for node inputs and outputs.
//!
//! Slots come in three closed kinds rather than probed `any`-shapes:
//! - **connection-only** -- no widget descriptor; the slot can only be wired.
//! - **widget-bearing** -- a [`WidgetDesc`] is present; the slot is editable
//!   inline and owns one entry in the node's `widgets_values`.
//! - **combo** -- a widget-bearing slot whose type is `COMBO` and whose
//!   selectable options live in the widget descriptor.
//!
//! The wire format stores a slot's type either as a bare tag (`"IMAGE"`) or
//! as a list of literal options (older combo form); [`SlotType`] accepts
//! both and round-trips them verbatim.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smallvec::SmallVec;

use crate::id::LinkId;

/// Per-output link list. Almost always 0-2 entries, so it lives inline.
pub type LinkList = SmallVec<[LinkId; 2]>;

/// Type tag for combo slots built from a literal-options list.
pub const COMBO_TAG: &str = "COMBO";

/// Basic tags whose slots are always widget-bearing.
pub const BASIC_WIDGET_TAGS: [&str; 4] = ["INT", "FLOAT", "STRING", "BOOLEAN"];

/// Integer slots with one of these names receive a synthetic control-mode
/// companion value after their numeric default.
pub const SEED_WIDGET_NAMES: [&str; 2] = ["seed", "noise_seed"];

/// Default value of the control-mode companion entry.
pub const CONTROL_COMPANION_DEFAULT: &str = "Fixed";

/// Key under which name-keyed wire documents store the companion entry.
pub const CONTROL_COMPANION_KEY: &str = "control_after_generate";

/// A slot's data-type tag.
///
/// `Options` is the legacy combo form where the type position holds the
/// selectable literals themselves. The slot builder converts it to a
/// `COMBO`-tagged slot; documents that already contain the list form are
/// preserved as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotType {
    /// A plain type tag such as `IMAGE`, `INT`, or `COMBO`.
    Tag(String),
    /// A list of selectable literal options standing in for the type.
    Options(Vec<Value>),
}

impl SlotType {
    /// Builds a tag variant from any string-ish input.
    pub fn tag(tag: impl Into<String>) -> Self {
        SlotType::Tag(tag.into())
    }

    /// Returns the tag string, if this is a tag variant.
    pub fn as_tag(&self) -> Option<&str> {
        match self {
            SlotType::Tag(tag) => Some(tag),
            SlotType::Options(_) => None,
        }
    }

    /// Returns `true` if this is the literal-options combo form.
    pub fn is_options(&self) -> bool {
        matches!(self, SlotType::Options(_))
    }

    /// Returns `true` if the tag is one of the basic widget-eligible tags.
    pub fn is_basic(&self) -> bool {
        self.as_tag()
            .map_or(false, |tag| BASIC_WIDGET_TAGS.contains(&tag))
    }
}

/// Display widget kind, derived from the slot's data type and config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WidgetKind {
    Combo,
    Number,
    Toggle,
    Text,
    Textarea,
    /// Unrecognized kind from a foreign document. Never produced by the
    /// slot builder.
    #[serde(other)]
    Unknown,
}

/// Inline-edit descriptor attached to a widget-bearing slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetDesc {
    #[serde(rename = "type")]
    pub kind: WidgetKind,
    pub name: String,
    /// Selectable options for combo widgets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<Value>>,
}

impl WidgetDesc {
    /// Creates a descriptor without options.
    pub fn new(kind: WidgetKind, name: impl Into<String>) -> Self {
        WidgetDesc {
            kind,
            name: name.into(),
            options: None,
        }
    }

    /// Creates a combo descriptor with the given options.
    pub fn combo(name: impl Into<String>, options: Vec<Value>) -> Self {
        WidgetDesc {
            kind: WidgetKind::Combo,
            name: name.into(),
            options: Some(options),
        }
    }
}

/// An input slot: named, typed, holding at most one incoming link.
///
/// `extra` carries unrecognized wire fields (labels, shapes and similar
/// editor decorations) so foreign documents survive a round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSlot {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: SlotType,
    #[serde(default)]
    pub link: Option<LinkId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget: Option<WidgetDesc>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl InputSlot {
    /// Creates a connection-only input slot.
    pub fn new(name: impl Into<String>, ty: SlotType) -> Self {
        InputSlot {
            name: name.into(),
            ty,
            link: None,
            widget: None,
            extra: IndexMap::new(),
        }
    }

    /// Attaches a widget descriptor, making the slot widget-bearing.
    pub fn with_widget(mut self, widget: WidgetDesc) -> Self {
        self.widget = Some(widget);
        self
    }

    /// Returns `true` if the slot is widget-bearing.
    pub fn is_widget(&self) -> bool {
        self.widget.is_some()
    }

    /// Returns `true` if this slot's widget value is followed by a synthetic
    /// control-mode companion entry in `widgets_values`.
    ///
    /// This reproduces the documented special case exactly: an `INT` slot
    /// literally named `seed` or `noise_seed`, and nothing else.
    pub fn has_control_companion(&self) -> bool {
        self.widget.is_some()
            && self.ty.as_tag() == Some("INT")
            && SEED_WIDGET_NAMES.contains(&self.name.as_str())
    }
}

/// An output slot: named, typed, fanning out to any number of links.
///
/// The canonical "no connection" representation is `None`, serialized as
/// `null`; an empty list is normalized away on load and never written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSlot {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: SlotType,
    #[serde(default)]
    pub links: Option<LinkList>,
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl OutputSlot {
    /// Creates an unconnected output slot.
    pub fn new(name: impl Into<String>, ty: SlotType) -> Self {
        OutputSlot {
            name: name.into(),
            ty,
            links: None,
            extra: IndexMap::new(),
        }
    }

    /// Collapses an empty link list to the canonical `None` form.
    pub fn normalize(&mut self) {
        if self.links.as_ref().map_or(false, |l| l.is_empty()) {
            self.links = None;
        }
    }
}

/// Number of `widgets_values` entries the given input slots account for,
/// control-mode companions included.
pub fn widget_value_len(inputs: &[InputSlot]) -> usize {
    inputs
        .iter()
        .map(|slot| match (slot.is_widget(), slot.has_control_companion()) {
            (true, true) => 2,
            (true, false) => 1,
            _ => 0,
        })
        .sum()
}

/// Positional index into `widgets_values` for the named widget, skipping
/// over companion entries of preceding slots.
///
/// This is the single place that knows the value layout; every read/write
/// path goes through it.
pub fn widget_value_index(inputs: &[InputSlot], name: &str) -> Option<usize> {
    let mut index = 0;
    for slot in inputs {
        if let Some(widget) = &slot.widget {
            if widget.name == name {
                return Some(index);
            }
            index += 1;
            if slot.has_control_companion() {
                index += 1;
            }
        }
    }
    None
}
