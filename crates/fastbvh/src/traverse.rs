//! Single-ray traversal of a [`Tree`].
//!
//! Traversal is iterative over an inline stack of pending nodes. Children
//! whose boxes the ray enters are pushed far-then-near so the nearer subtree
//! is expanded first; pending entries whose entry distance lies beyond the
//! current best hit are dropped when popped.

use smallvec::SmallVec;

use crate::intersection::{Intersection, Intersector};
use crate::tree::{Tree, STACK_CAPACITY};
use crate::Ray;

/// A node pending visitation.
#[derive(Debug, Clone, Copy)]
struct StackEntry {
    node: u32,
    /// Distance at which the ray enters the node's box. `None` for the
    /// root, which is visited unconditionally.
    near: Option<f64>,
}

impl StackEntry {
    #[inline]
    fn root() -> Self {
        Self { node: 0, near: None }
    }

    #[inline]
    fn child(node: usize, near: f64) -> Self {
        Self {
            node: node as u32,
            near: Some(near),
        }
    }
}

/// Counters gathered by [`Traverser::traverse_with_stats`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TraversalStats {
    /// Rays traced.
    pub rays: u64,
    /// Nodes popped and expanded.
    pub nodes_visited: u64,
    /// Nodes popped and skipped because a closer hit was already known.
    pub pruned: u64,
    /// Ray-box tests performed.
    pub box_tests: u64,
    /// Ray-primitive tests performed.
    pub primitive_tests: u64,
    /// Largest number of pending stack entries seen.
    pub max_stack: usize,
}

impl TraversalStats {
    /// Fold another set of counters into this one.
    pub fn merge(&mut self, other: &TraversalStats) {
        self.rays += other.rays;
        self.nodes_visited += other.nodes_visited;
        self.pruned += other.pruned;
        self.box_tests += other.box_tests;
        self.primitive_tests += other.primitive_tests;
        self.max_stack = self.max_stack.max(other.max_stack);
    }
}

/// Hooks for the traversal loop; the unit impl compiles to nothing.
trait Counters {
    fn visit(&mut self) {}
    fn prune(&mut self) {}
    fn box_tests(&mut self, _n: u64) {}
    fn primitive_test(&mut self) {}
    fn stack_len(&mut self, _len: usize) {}
}

impl Counters for () {}

impl Counters for TraversalStats {
    #[inline]
    fn visit(&mut self) {
        self.nodes_visited += 1;
    }

    #[inline]
    fn prune(&mut self) {
        self.pruned += 1;
    }

    #[inline]
    fn box_tests(&mut self, n: u64) {
        self.box_tests += n;
    }

    #[inline]
    fn primitive_test(&mut self) {
        self.primitive_tests += 1;
    }

    #[inline]
    fn stack_len(&mut self, len: usize) {
        self.max_stack = self.max_stack.max(len);
    }
}

/// Traces rays through a borrowed [`Tree`] with an owned intersector.
///
/// Holds no per-query state, so one traverser serves any number of
/// queries. It is `Sync` whenever the primitives and the intersector are.
#[derive(Debug, Clone)]
pub struct Traverser<'a, P, I> {
    tree: &'a Tree<P>,
    intersector: I,
}

impl<'a, P, I> Traverser<'a, P, I>
where
    I: Intersector<P>,
{
    /// Bind a traverser to `tree`.
    pub fn new(tree: &'a Tree<P>, intersector: I) -> Self {
        Self { tree, intersector }
    }

    /// The tree being traversed.
    pub fn tree(&self) -> &'a Tree<P> {
        self.tree
    }

    /// The intersector used for primitive tests.
    pub fn intersector(&self) -> &I {
        &self.intersector
    }

    /// Trace `ray` through the tree.
    ///
    /// With `occlusion` unset the closest hit is returned. With `occlusion`
    /// set the first hit found is returned immediately, which is not
    /// necessarily the closest. Returns [`Intersection::Miss`] if nothing
    /// is hit.
    pub fn traverse(&self, ray: &Ray, occlusion: bool) -> Intersection<'a, P, I::Attributes> {
        self.run(ray, occlusion, &mut ())
    }

    /// Like [`traverse`](Self::traverse), additionally accumulating counters
    /// into `stats`.
    pub fn traverse_with_stats(
        &self,
        ray: &Ray,
        occlusion: bool,
        stats: &mut TraversalStats,
    ) -> Intersection<'a, P, I::Attributes> {
        stats.rays += 1;
        self.run(ray, occlusion, stats)
    }

    /// Closest hit along `ray`.
    pub fn closest_hit(&self, ray: &Ray) -> Intersection<'a, P, I::Attributes> {
        self.traverse(ray, false)
    }

    /// True if anything blocks `ray` within its valid range.
    pub fn occluded(&self, ray: &Ray) -> bool {
        self.traverse(ray, true).is_hit()
    }

    fn run<C: Counters>(
        &self,
        ray: &Ray,
        occlusion: bool,
        counters: &mut C,
    ) -> Intersection<'a, P, I::Attributes> {
        let tree: &'a Tree<P> = self.tree;
        let nodes = tree.nodes();
        let primitives = tree.primitives();

        let mut best = Intersection::Miss;

        // Depth is bounded at construction, so this never spills to the heap.
        let mut stack: SmallVec<[StackEntry; STACK_CAPACITY]> = SmallVec::new();
        stack.push(StackEntry::root());
        counters.stack_len(stack.len());

        while let Some(entry) = stack.pop() {
            if let Some(near) = entry.near {
                if near > best.t() {
                    counters.prune();
                    continue;
                }
            }

            let index = entry.node as usize;
            let node = &nodes[index];
            counters.visit();

            if node.is_leaf() {
                for i in node.primitive_range() {
                    let primitive = &primitives[i];
                    counters.primitive_test();
                    if let Some(hit) = self.intersector.intersect(primitive, ray) {
                        let current = Intersection::from_primitive(primitive, i, hit);
                        if occlusion {
                            return current;
                        }
                        best = best.closest(current);
                    }
                }
                continue;
            }

            let left = index + 1;
            let right = index + node.right_offset as usize;
            counters.box_tests(2);

            match (nodes[left].bbox.intersect(ray), nodes[right].bbox.intersect(ray)) {
                (Some((left_near, _)), Some((right_near, _))) => {
                    // Left wins ties.
                    let (closer, farther) = if right_near < left_near {
                        (StackEntry::child(right, right_near), StackEntry::child(left, left_near))
                    } else {
                        (StackEntry::child(left, left_near), StackEntry::child(right, right_near))
                    };
                    stack.push(farther);
                    stack.push(closer);
                }
                (Some((near, _)), None) => stack.push(StackEntry::child(left, near)),
                (None, Some((near, _))) => stack.push(StackEntry::child(right, near)),
                (None, None) => {}
            }
            counters.stack_len(stack.len());
        }

        best
    }
}

/// Test every primitive against `ray` without any acceleration.
///
/// Reference for checking traversal results. In occlusion mode the first
/// hit in array order is returned.
pub fn brute_force<'a, P, I>(
    primitives: &'a [P],
    intersector: &I,
    ray: &Ray,
    occlusion: bool,
) -> Intersection<'a, P, I::Attributes>
where
    I: Intersector<P>,
{
    let mut best = Intersection::Miss;
    for (i, primitive) in primitives.iter().enumerate() {
        if let Some(hit) = intersector.intersect(primitive, ray) {
            let current = Intersection::from_primitive(primitive, i, hit);
            if occlusion {
                return current;
            }
            best = best.closest(current);
        }
    }
    best
}
