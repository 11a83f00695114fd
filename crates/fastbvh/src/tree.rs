//! Flattened, immutable tree representation.
//!
//! Nodes live in one array in depth-first order. The left child of internal
//! node `i` is always `i + 1`; the right child is `i + right_offset`. A
//! `right_offset` of zero marks a leaf, whose primitives are the contiguous
//! range `start..start + prim_count` of the primitive array.

use std::fmt;

use crate::error::{BvhError, Result};
use crate::Aabb3;

/// Capacity of the inline traversal stack.
pub const STACK_CAPACITY: usize = 64;

/// Deepest leaf depth (root = 0) a tree may have.
///
/// Near-first traversal holds at most one pending sibling per level plus
/// the two children just pushed, so a leaf at this depth peaks the stack at
/// exactly [`STACK_CAPACITY`] entries.
pub const MAX_DEPTH: usize = STACK_CAPACITY - 1;

/// One element of the flattened tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Node {
    /// Box enclosing everything beneath this node.
    pub bbox: Aabb3,
    /// First primitive of a leaf.
    pub start: u32,
    /// Number of primitives in a leaf, zero for internal nodes.
    pub prim_count: u32,
    /// Distance to the right child, zero for leaves.
    pub right_offset: u32,
}

impl Node {
    /// Create a leaf over `prim_count` primitives starting at `start`.
    pub fn leaf(bbox: Aabb3, start: u32, prim_count: u32) -> Self {
        Self {
            bbox,
            start,
            prim_count,
            right_offset: 0,
        }
    }

    /// Create an internal node whose right child sits `right_offset` slots ahead.
    pub fn internal(bbox: Aabb3, right_offset: u32) -> Self {
        Self {
            bbox,
            start: 0,
            prim_count: 0,
            right_offset,
        }
    }

    /// True if this node holds primitives directly.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.right_offset == 0
    }

    /// Primitive index range of a leaf (empty for internal nodes).
    #[inline]
    pub fn primitive_range(&self) -> std::ops::Range<usize> {
        let start = self.start as usize;
        start..start + self.prim_count as usize
    }
}

/// An immutable bounding volume hierarchy over primitives of type `P`.
///
/// Obtained from [`Tree::from_parts`] or the [`build`](crate::build) module;
/// both guarantee the addressing invariant and the depth bound, so
/// traversal needs no checks of its own.
#[derive(Debug, Clone)]
pub struct Tree<P> {
    nodes: Vec<Node>,
    primitives: Vec<P>,
    depth: usize,
}

impl<P> Tree<P> {
    /// Assemble a tree from a prebuilt node array and primitive array.
    ///
    /// Rejects any layout that violates the left-adjacent depth-first
    /// addressing scheme, leaves that reach past the primitive array, and
    /// trees deeper than [`MAX_DEPTH`].
    pub fn from_parts(nodes: Vec<Node>, primitives: Vec<P>) -> Result<Self> {
        let depth = match validate(&nodes, primitives.len()) {
            Ok(depth) => depth,
            Err(err) => {
                tracing::warn!(nodes = nodes.len(), primitives = primitives.len(), %err, "rejected tree");
                return Err(err);
            }
        };
        tracing::debug!(nodes = nodes.len(), primitives = primitives.len(), depth, "accepted tree");
        Ok(Self {
            nodes,
            primitives,
            depth,
        })
    }

    /// All nodes, root first.
    #[inline]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All primitives, in leaf order.
    #[inline]
    pub fn primitives(&self) -> &[P] {
        &self.primitives
    }

    /// The node at `index`.
    #[inline]
    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    /// The root node.
    #[inline]
    pub fn root(&self) -> &Node {
        &self.nodes[0]
    }

    /// Primitives referenced by a leaf.
    #[inline]
    pub fn leaf_primitives(&self, node: &Node) -> &[P] {
        &self.primitives[node.primitive_range()]
    }

    /// Depth of the deepest leaf, the root being at depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of leaves.
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf()).count()
    }

    /// Number of primitives.
    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    /// True if the tree holds no primitives.
    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// Bounds of the whole tree.
    pub fn bounds(&self) -> Aabb3 {
        self.root().bbox
    }

    /// Summary statistics.
    pub fn stats(&self) -> TreeStats {
        TreeStats {
            nodes: self.nodes.len(),
            leaves: self.leaf_count(),
            primitives: self.primitives.len(),
            depth: self.depth,
            max_leaf_size: self
                .nodes
                .iter()
                .filter(|n| n.is_leaf())
                .map(|n| n.prim_count as usize)
                .max()
                .unwrap_or(0),
        }
    }

    /// Split the tree back into its node and primitive arrays.
    pub fn into_parts(self) -> (Vec<Node>, Vec<P>) {
        (self.nodes, self.primitives)
    }
}

/// Shape of a tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeStats {
    /// Total nodes.
    pub nodes: usize,
    /// Leaf nodes.
    pub leaves: usize,
    /// Primitives.
    pub primitives: usize,
    /// Deepest leaf depth.
    pub depth: usize,
    /// Largest primitive count in one leaf.
    pub max_leaf_size: usize,
}

impl fmt::Display for TreeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} nodes ({} leaves), {} primitives, depth {}, largest leaf {}",
            self.nodes, self.leaves, self.primitives, self.depth, self.max_leaf_size
        )
    }
}

/// Check the addressing invariant, returning the depth of the deepest leaf.
fn validate(nodes: &[Node], prim_len: usize) -> Result<usize> {
    if nodes.is_empty() {
        return Err(BvhError::NoNodes);
    }
    let mut max_depth = 0;
    let end = validate_subtree(nodes, prim_len, 0, 0, &mut max_depth)?;
    if end != nodes.len() {
        return Err(BvhError::UnreachableNodes {
            reachable: end,
            len: nodes.len(),
        });
    }
    Ok(max_depth)
}

/// Validate the subtree rooted at `index`, returning one past its last node.
///
/// Recursion is bounded by [`MAX_DEPTH`] since deeper nodes are rejected
/// before descending.
fn validate_subtree(
    nodes: &[Node],
    prim_len: usize,
    index: usize,
    depth: usize,
    max_depth: &mut usize,
) -> Result<usize> {
    if depth > MAX_DEPTH {
        return Err(BvhError::DepthExceeded {
            depth,
            max: MAX_DEPTH,
        });
    }
    *max_depth = (*max_depth).max(depth);

    let node = &nodes[index];
    if node.is_leaf() {
        let end = node.start as usize + node.prim_count as usize;
        if end > prim_len {
            return Err(BvhError::PrimitiveRangeOutOfBounds {
                node: index,
                start: node.start,
                count: node.prim_count,
                len: prim_len,
            });
        }
        return Ok(index + 1);
    }

    if node.prim_count != 0 {
        return Err(BvhError::InternalWithPrimitives {
            node: index,
            count: node.prim_count,
        });
    }
    if node.right_offset == 1 {
        return Err(BvhError::InvalidRightOffset {
            node: index,
            offset: node.right_offset,
        });
    }
    let right = index + node.right_offset as usize;
    if right >= nodes.len() {
        return Err(BvhError::ChildOutOfBounds {
            node: index,
            child: right,
            len: nodes.len(),
        });
    }

    let left_end = validate_subtree(nodes, prim_len, index + 1, depth + 1, max_depth)?;
    if left_end != right {
        return Err(BvhError::LayoutMismatch {
            node: index,
            expected: right,
            found: left_end,
        });
    }
    validate_subtree(nodes, prim_len, right, depth + 1, max_depth)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Point3;

    fn bx(lo: f64, hi: f64) -> Aabb3 {
        Aabb3::new(Point3::new(lo, lo, lo), Point3::new(hi, hi, hi))
    }

    /// root -> (leaf 0..1, internal -> (leaf 1..2, leaf 2..3))
    fn sample_nodes() -> Vec<Node> {
        vec![
            Node::internal(bx(0.0, 3.0), 2),
            Node::leaf(bx(0.0, 1.0), 0, 1),
            Node::internal(bx(1.0, 3.0), 2),
            Node::leaf(bx(1.0, 2.0), 1, 1),
            Node::leaf(bx(2.0, 3.0), 2, 1),
        ]
    }

    #[test]
    fn test_from_parts_accepts_valid_layout() {
        let tree = Tree::from_parts(sample_nodes(), vec!['a', 'b', 'c']).unwrap();
        assert_eq!(tree.depth(), 2);
        assert_eq!(tree.leaf_count(), 3);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.leaf_primitives(tree.node(3)), &['b']);
        assert_eq!(tree.bounds(), bx(0.0, 3.0));
    }

    #[test]
    fn test_single_empty_leaf_is_valid() {
        let tree: Tree<u8> = Tree::from_parts(vec![Node::leaf(Aabb3::empty(), 0, 0)], vec![]).unwrap();
        assert!(tree.is_empty());
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.stats().leaves, 1);
    }

    #[test]
    fn test_rejects_no_nodes() {
        let err = Tree::<u8>::from_parts(vec![], vec![]).unwrap_err();
        assert_eq!(err, BvhError::NoNodes);
    }

    #[test]
    fn test_rejects_right_offset_one() {
        let nodes = vec![
            Node::internal(bx(0.0, 1.0), 1),
            Node::leaf(bx(0.0, 1.0), 0, 1),
        ];
        let err = Tree::from_parts(nodes, vec![0u8]).unwrap_err();
        assert!(matches!(err, BvhError::InvalidRightOffset { node: 0, offset: 1 }));
    }

    #[test]
    fn test_rejects_child_out_of_bounds() {
        let nodes = vec![
            Node::internal(bx(0.0, 1.0), 5),
            Node::leaf(bx(0.0, 1.0), 0, 1),
        ];
        let err = Tree::from_parts(nodes, vec![0u8]).unwrap_err();
        assert!(matches!(err, BvhError::ChildOutOfBounds { node: 0, child: 5, len: 2 }));
    }

    #[test]
    fn test_rejects_layout_mismatch() {
        let mut nodes = sample_nodes();
        // Root's right child now skips past the start of the right subtree.
        nodes[0].right_offset = 3;
        let err = Tree::from_parts(nodes, vec![0u8; 3]).unwrap_err();
        assert_eq!(
            err,
            BvhError::LayoutMismatch {
                node: 0,
                expected: 3,
                found: 2
            }
        );
    }

    #[test]
    fn test_rejects_internal_with_primitives() {
        let mut nodes = sample_nodes();
        nodes[2].prim_count = 2;
        let err = Tree::from_parts(nodes, vec![0u8; 3]).unwrap_err();
        assert!(matches!(err, BvhError::InternalWithPrimitives { node: 2, count: 2 }));
    }

    #[test]
    fn test_rejects_primitive_range_out_of_bounds() {
        let err = Tree::from_parts(sample_nodes(), vec![0u8; 2]).unwrap_err();
        assert!(matches!(err, BvhError::PrimitiveRangeOutOfBounds { node: 4, start: 2, count: 1, len: 2 }));
    }

    #[test]
    fn test_rejects_unreachable_nodes() {
        let mut nodes = sample_nodes();
        nodes.push(Node::leaf(bx(0.0, 1.0), 0, 1));
        let err = Tree::from_parts(nodes, vec![0u8; 3]).unwrap_err();
        assert_eq!(err, BvhError::UnreachableNodes { reachable: 5, len: 6 });
    }

    #[test]
    fn test_stats_display() {
        let tree = Tree::from_parts(sample_nodes(), vec![1, 2, 3]).unwrap();
        let stats = tree.stats();
        assert_eq!(stats.max_leaf_size, 1);
        assert_eq!(
            stats.to_string(),
            "5 nodes (3 leaves), 3 primitives, depth 2, largest leaf 1"
        );
    }
}
