//! Canvas groups: titled, colored bounding boxes.
//!
//! Groups do not own nodes. Membership is computed by spatial containment
//! in the presentation layer; the core stores groups as independent
//! geometric records and never mutates node-to-group assignment.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::GroupId;

/// A rectangular group on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub id: GroupId,
    pub title: String,
    /// `[x, y, width, height]`.
    pub bounding: [f64; 4],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// Unrecognized wire fields (font size and similar decorations),
    /// preserved for round-trips.
    #[serde(flatten)]
    pub extra: IndexMap<String, Value>,
}

impl Group {
    /// Creates a group with no color and no extra fields.
    pub fn new(id: GroupId, title: impl Into<String>, bounding: [f64; 4]) -> Self {
        Group {
            id,
            title: title.into(),
            bounding,
            color: None,
            extra: IndexMap::new(),
        }
    }
}
