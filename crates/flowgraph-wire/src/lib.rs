//! Wire-format boundary for workflow graphs.
//!
//! Converts persisted JSON workflow documents into [`flowgraph_core`]
//! graph stores and back. The wire shape keeps its historical quirks --
//! positional link tuples, widget values as either a list or a name-keyed
//! object, unknown per-node fields from other editors -- and this crate
//! confines all of them to the boundary: one normalization on the way in,
//! one canonical shape on the way out.
//!
//! # Modules
//!
//! - [`document`]: the serde document model (tuples, dual-form widget
//!   values, passthrough metadata)
//! - [`convert`]: `load` / `serialize` plus the load report
//! - [`preprocess`]: pluggable document passes (per-node-type widget
//!   patches)
//! - [`error`]: WireError enum with the fatal failure modes
//!
//! Loading tolerates what it reasonably can (dangling links are dropped,
//! unknown node types are kept and reported) and is fatal only where
//! integrity is unrecoverable. Everything tolerated is visible in the
//! returned [`LoadReport`].

pub mod convert;
pub mod document;
pub mod error;
pub mod preprocess;

// Re-export key types for ergonomic use.
pub use convert::{load, serialize, LoadOptions, LoadReport};
pub use document::{LinkTuple, NodeDoc, WidgetValuesDoc, WorkflowDocument};
pub use error::WireError;
pub use preprocess::{DocumentPass, NodePatch, WidgetPatchSet};
