//! Error types.

use thiserror::Error;

use crate::dom::NodeId;

/// A host-tree operation that violates the tree's structure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    /// The reference node passed to an insertion or removal is not a child of
    /// the parent it was used with.
    #[error("node {child:?} is not a child of node {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },

    /// The insertion would produce an invalid tree.
    #[error("cannot insert node {node:?} into node {parent:?}: {reason}")]
    HierarchyRequest {
        parent: NodeId,
        node: NodeId,
        reason: &'static str,
    },
}

/// A render configuration that could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse render config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid render config: {0}")]
    Invalid(String),
}
