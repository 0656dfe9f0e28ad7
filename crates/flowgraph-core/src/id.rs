//! Stable ID newtypes for graph entities.
//!
//! All IDs are distinct newtype wrappers over `u64`, providing type safety
//! so that a `NodeId` cannot be accidentally used where a `LinkId` is
//! expected. On the wire each serializes as its bare integer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable node identifier, assigned by the document or the id counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Stable link identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LinkId(pub u64);

/// Group identifier. Groups are geometric records; their ids never collide
/// with node or link ids by construction, only by type. Defaults to 0 for
/// legacy documents that predate group ids.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct GroupId(pub u64);

// Display implementations -- just print the inner value.

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NodeId {
    fn from(raw: u64) -> Self {
        NodeId(raw)
    }
}

impl From<u64> for LinkId {
    fn from(raw: u64) -> Self {
        LinkId(raw)
    }
}

impl From<u64> for GroupId {
    fn from(raw: u64) -> Self {
        GroupId(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_display() {
        assert_eq!(format!("{}", NodeId(7)), "7");
        assert_eq!(format!("{}", LinkId(99)), "99");
        assert_eq!(format!("{}", GroupId(3)), "3");
    }

    #[test]
    fn id_types_are_distinct() {
        // Same inner value, different types; cannot be confused at compile time.
        let node = NodeId(1);
        let link = LinkId(1);
        assert_eq!(node.0, link.0);
    }

    #[test]
    fn serde_bare_integer() {
        let json = serde_json::to_string(&NodeId(42)).unwrap();
        assert_eq!(json, "42");

        let back: NodeId = serde_json::from_str("42").unwrap();
        assert_eq!(back, NodeId(42));
    }

    #[test]
    fn serde_roundtrip() {
        let link = LinkId(17);
        let json = serde_json::to_string(&link).unwrap();
        let back: LinkId = serde_json::from_str(&json).unwrap();
        assert_eq!(link, back);
    }
}
