//! Tree construction.
//!
//! Builds a flattened tree top-down using a binned Surface Area Heuristic
//! over primitive centroids. Nodes are emitted depth-first with the left
//! child adjacent, and the primitives are reordered so every leaf covers a
//! contiguous range.

use serde::{Deserialize, Serialize};

use crate::error::{BvhError, Result};
use crate::math::{axis_component, Point3};
use crate::tree::{Node, Tree, MAX_DEPTH};
use crate::Aabb3;

/// Primitives that can report an axis-aligned bounding box.
pub trait Bounded {
    /// Box enclosing the primitive.
    fn aabb(&self) -> Aabb3;

    /// Point used to sort the primitive during construction.
    fn centroid(&self) -> Point3 {
        self.aabb().centroid()
    }
}

/// How interior nodes choose their split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitStrategy {
    /// Binned Surface Area Heuristic.
    #[default]
    Sah,
    /// Object median along the longest centroid axis.
    Median,
}

/// Builder settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Largest number of primitives stored in one leaf.
    pub max_leaf_size: usize,
    /// Number of SAH bins per axis.
    pub bin_count: usize,
    /// Split selection.
    pub strategy: SplitStrategy,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            max_leaf_size: 4,
            bin_count: 12,
            strategy: SplitStrategy::Sah,
        }
    }
}

impl BuildConfig {
    /// Reject settings the builder cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.max_leaf_size == 0 {
            return Err(BvhError::InvalidConfig(
                "max_leaf_size must be at least 1".into(),
            ));
        }
        if self.bin_count < 2 {
            return Err(BvhError::InvalidConfig(format!(
                "bin_count must be at least 2, got {}",
                self.bin_count
            )));
        }
        Ok(())
    }
}

/// Per-primitive data carried through construction.
#[derive(Debug, Clone, Copy)]
struct BuildRef {
    index: usize,
    aabb: Aabb3,
    centroid: Point3,
}

/// SAH bin for evaluating split candidates.
#[derive(Debug, Clone, Copy, Default)]
struct Bin {
    bounds: Aabb3,
    count: usize,
}

struct Builder<'c> {
    config: &'c BuildConfig,
    nodes: Vec<Node>,
    forced_medians: usize,
}

impl<P: Bounded> Tree<P> {
    /// Build a tree over `primitives` with the default [`BuildConfig`].
    pub fn build(primitives: Vec<P>) -> Result<Self> {
        Self::build_with(primitives, &BuildConfig::default())
    }

    /// Build a tree over `primitives`.
    ///
    /// The primitives are moved into the tree in leaf order. An empty input
    /// produces a single empty leaf, which every ray misses.
    #[tracing::instrument(skip_all, fields(primitives = primitives.len(), strategy = ?config.strategy))]
    pub fn build_with(primitives: Vec<P>, config: &BuildConfig) -> Result<Self> {
        config.validate()?;
        if primitives.len() > u32::MAX as usize {
            return Err(BvhError::TooManyPrimitives {
                count: primitives.len(),
                max: u32::MAX as usize,
            });
        }

        let mut refs: Vec<BuildRef> = primitives
            .iter()
            .enumerate()
            .map(|(index, p)| BuildRef {
                index,
                aabb: p.aabb(),
                centroid: p.centroid(),
            })
            .collect();

        let mut builder = Builder {
            config,
            nodes: Vec::with_capacity(2 * refs.len().max(1)),
            forced_medians: 0,
        };
        if refs.is_empty() {
            builder.nodes.push(Node::leaf(Aabb3::empty(), 0, 0));
        } else {
            builder.build_node(&mut refs, 0, 0);
        }

        if builder.forced_medians > 0 {
            tracing::warn!(
                count = builder.forced_medians,
                "depth budget forced median splits"
            );
        }

        // Move primitives into leaf order.
        let mut slots: Vec<Option<P>> = primitives.into_iter().map(Some).collect();
        let ordered: Vec<P> = refs
            .iter()
            .filter_map(|r| slots[r.index].take())
            .collect();

        Tree::from_parts(builder.nodes, ordered)
    }
}

impl Builder<'_> {
    /// Emit the subtree for `refs`, whose primitives will occupy
    /// `offset..offset + refs.len()` in the final primitive array.
    fn build_node(&mut self, refs: &mut [BuildRef], offset: usize, depth: usize) {
        let mut bounds = Aabb3::empty();
        let mut centroid_bounds = Aabb3::empty();
        for r in refs.iter() {
            bounds.include_aabb(&r.aabb);
            centroid_bounds.include_point(&r.centroid);
        }

        let count = refs.len();
        if count <= self.config.max_leaf_size {
            self.nodes.push(Node::leaf(bounds, offset as u32, count as u32));
            return;
        }

        // Splitting at the median needs ceil(log2(count)) more levels to reach
        // single-primitive leaves; once that is all the budget left, stop
        // trusting SAH, which may peel off one primitive at a time.
        let remaining = MAX_DEPTH - depth;
        let force_median = remaining <= ceil_log2(count);
        if force_median && self.config.strategy == SplitStrategy::Sah {
            self.forced_medians += 1;
        }

        let mid = if force_median || self.config.strategy == SplitStrategy::Median {
            median_split(refs, &centroid_bounds)
        } else {
            match find_best_split(refs, &centroid_bounds, self.config.bin_count) {
                Some((axis, pos)) => partition(refs, axis, pos),
                None => 0,
            }
        };

        // Fallback if partition fails
        let mid = if mid == 0 || mid == count { count / 2 } else { mid };

        let index = self.nodes.len();
        // Right offset is patched once the left subtree has been emitted.
        self.nodes.push(Node::internal(bounds, 0));

        let (left, right) = refs.split_at_mut(mid);
        self.build_node(left, offset, depth + 1);
        self.nodes[index].right_offset = (self.nodes.len() - index) as u32;
        self.build_node(right, offset + mid, depth + 1);
    }
}

/// Smallest `k` with `2^k >= n`.
fn ceil_log2(n: usize) -> usize {
    n.next_power_of_two().trailing_zeros() as usize
}

/// Reorder `refs` around the centroid median of the longest axis.
fn median_split(refs: &mut [BuildRef], centroid_bounds: &Aabb3) -> usize {
    let axis = centroid_bounds.longest_axis();
    let mid = refs.len() / 2;
    refs.select_nth_unstable_by(mid, |a, b| {
        axis_component(&a.centroid, axis).total_cmp(&axis_component(&b.centroid, axis))
    });
    mid
}

/// Find the best split axis and position using binned SAH.
///
/// Returns `None` if every centroid coincides or no bin boundary separates
/// the primitives.
fn find_best_split(
    refs: &[BuildRef],
    centroid_bounds: &Aabb3,
    bin_count: usize,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    let mut best_cost = f64::INFINITY;

    for axis in 0..3 {
        let axis_min = centroid_bounds.min_on(axis);
        let axis_extent = centroid_bounds.max_on(axis) - axis_min;
        if axis_extent < 1e-12 {
            continue;
        }

        let mut bins = vec![Bin::default(); bin_count];
        let scale = bin_count as f64 / axis_extent;
        for r in refs {
            let b = ((axis_component(&r.centroid, axis) - axis_min) * scale) as usize;
            let bin = &mut bins[b.min(bin_count - 1)];
            bin.count += 1;
            bin.bounds.include_aabb(&r.aabb);
        }

        // Sweep from the left, recording prefix areas and counts.
        let mut left_area = vec![0.0; bin_count - 1];
        let mut left_count = vec![0usize; bin_count - 1];
        let mut sweep = Aabb3::empty();
        let mut sweep_count = 0;
        for i in 0..bin_count - 1 {
            sweep.include_aabb(&bins[i].bounds);
            sweep_count += bins[i].count;
            left_area[i] = sweep.surface_area();
            left_count[i] = sweep_count;
        }

        // Sweep from the right and evaluate each boundary.
        let mut sweep = Aabb3::empty();
        let mut sweep_count = 0;
        for i in (1..bin_count).rev() {
            sweep.include_aabb(&bins[i].bounds);
            sweep_count += bins[i].count;
            if left_count[i - 1] == 0 || sweep_count == 0 {
                continue;
            }

            let cost = left_count[i - 1] as f64 * left_area[i - 1]
                + sweep_count as f64 * sweep.surface_area();
            if cost < best_cost {
                best_cost = cost;
                best = Some((axis, axis_min + (i as f64 / bin_count as f64) * axis_extent));
            }
        }
    }

    best
}

/// Partition refs by centroid along an axis, returning the split point.
fn partition(refs: &mut [BuildRef], axis: usize, pos: f64) -> usize {
    let mut left = 0;
    let mut right = refs.len();

    while left < right {
        if axis_component(&refs[left].centroid, axis) < pos {
            left += 1;
        } else {
            right -= 1;
            refs.swap(left, right);
        }
    }

    left
}
