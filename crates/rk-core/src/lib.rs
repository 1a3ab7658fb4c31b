//! RK document layer
//!
//! This crate provides:
//! - Object references and element name pairs shared with the selection system
//! - The [`DocumentGraph`] trait hosts implement to expose their documents
//! - A type registry answering derived-type queries
//! - [`MemoryDocuments`], an in-memory graph with links and element maps

pub mod constants;
pub mod graph;
pub mod memory;
pub mod object;
pub mod types;

// Re-exports for convenience
pub use constants::{BASE_TYPE, GEO_FEATURE_TYPE, GROUP_TYPE, LINK_TYPE, SUB_NAME_SEPARATOR};
pub use graph::DocumentGraph;
pub use memory::{DocumentError, DocumentResult, MemoryDocuments};
pub use object::{ElementNamePair, ObjectKey};
pub use types::TypeRegistry;
