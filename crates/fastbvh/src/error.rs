//! Error types for tree construction.

use thiserror::Error;

/// Errors raised while building or validating a [`Tree`](crate::Tree).
///
/// Traversal itself never fails; every variant here describes a tree or
/// configuration that must be rejected before a traverser can be bound to it.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BvhError {
    /// The node array is empty; node 0 must always be the root.
    #[error("tree has no nodes")]
    NoNodes,

    /// An internal node points at a child beyond the node array.
    #[error("node {node} references child {child} but the tree has {len} nodes")]
    ChildOutOfBounds {
        /// Offending internal node.
        node: usize,
        /// Child index it resolves to.
        child: usize,
        /// Length of the node array.
        len: usize,
    },

    /// A right offset of 1 would make the right child alias the left child.
    #[error("node {node} has right offset {offset}, which aliases its left child")]
    InvalidRightOffset {
        /// Offending internal node.
        node: usize,
        /// Its right offset.
        offset: u32,
    },

    /// The left subtree does not end where the right child begins.
    #[error("left subtree of node {node} ends at {found}, expected right child at {expected}")]
    LayoutMismatch {
        /// Offending internal node.
        node: usize,
        /// Index of the right child.
        expected: usize,
        /// Index one past the last node of the left subtree.
        found: usize,
    },

    /// An internal node claims to own primitives.
    #[error("internal node {node} has primitive count {count}")]
    InternalWithPrimitives {
        /// Offending internal node.
        node: usize,
        /// Its primitive count.
        count: u32,
    },

    /// A leaf's primitive range runs past the primitive array.
    #[error("leaf {node} references primitives {start}..{start}+{count} but only {len} exist")]
    PrimitiveRangeOutOfBounds {
        /// Offending leaf node.
        node: usize,
        /// First primitive index.
        start: u32,
        /// Number of primitives.
        count: u32,
        /// Length of the primitive array.
        len: usize,
    },

    /// The tree is deeper than the fixed traversal stack can hold.
    #[error("tree depth {depth} exceeds the supported maximum of {max}")]
    DepthExceeded {
        /// Depth at which the limit was crossed.
        depth: usize,
        /// Maximum supported depth.
        max: usize,
    },

    /// Nodes exist that no path from the root reaches.
    #[error("only {reachable} of {len} nodes are reachable from the root")]
    UnreachableNodes {
        /// Nodes visited from the root.
        reachable: usize,
        /// Length of the node array.
        len: usize,
    },

    /// More primitives than 32-bit leaf ranges can address.
    #[error("{count} primitives exceed the addressable maximum of {max}")]
    TooManyPrimitives {
        /// Primitives supplied.
        count: usize,
        /// Maximum addressable.
        max: usize,
    },

    /// Builder configuration rejected.
    #[error("invalid build config: {0}")]
    InvalidConfig(String),
}

/// Result type for tree construction.
pub type Result<T> = std::result::Result<T, BvhError>;
