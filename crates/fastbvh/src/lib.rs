#![warn(missing_docs)]

//! Flattened bounding volume hierarchy with single-ray traversal.
//!
//! A [`Tree`] stores its nodes in one depth-first array where every internal
//! node's left child immediately follows it and the right child sits a fixed
//! offset ahead. A [`Traverser`] walks that array with a small inline stack,
//! expanding the nearer child first and skipping any subtree whose box is
//! entered beyond the closest hit found so far.
//!
//! # Architecture
//!
//! - [`Ray`] - Ray with cached reciprocal direction and a valid range
//! - [`Aabb3`] - Axis-aligned box with the slab ray test
//! - [`Tree`] / [`Node`] - Immutable flattened hierarchy
//! - [`Intersector`] / [`Intersection`] - Primitive test capability and results
//! - [`Traverser`] - Closest-hit and occlusion queries
//! - [`build`] - Binned SAH construction for any [`Bounded`] primitive
//! - [`shapes`] - Reference sphere and triangle primitives
//!
//! # Example
//!
//! ```
//! use fastbvh::math::{Point3, Vec3};
//! use fastbvh::shapes::{Sphere, SphereIntersector};
//! use fastbvh::{Ray, Traverser, Tree};
//!
//! let spheres = vec![
//!     Sphere::new(Point3::new(0.0, 0.0, 5.0), 1.0),
//!     Sphere::new(Point3::new(0.0, 0.0, 10.0), 1.0),
//! ];
//! let tree = Tree::build(spheres).unwrap();
//! let traverser = Traverser::new(&tree, SphereIntersector);
//!
//! let ray = Ray::new(Point3::origin(), Vec3::new(0.0, 0.0, 1.0));
//! let hit = traverser.traverse(&ray, false);
//! assert!((hit.t() - 4.0).abs() < 1e-9);
//! assert!(traverser.occluded(&ray));
//! ```

mod bbox;
mod error;
mod intersection;
mod ray;
mod traverse;
mod tree;

pub mod build;
pub mod math;
pub mod shapes;

pub use bbox::Aabb3;
pub use build::{BuildConfig, Bounded, SplitStrategy};
pub use error::{BvhError, Result};
pub use intersection::{Hit, Intersection, Intersector, PrimitiveHit};
pub use ray::Ray;
pub use traverse::{brute_force, TraversalStats, Traverser};
pub use tree::{Node, Tree, TreeStats, MAX_DEPTH, STACK_CAPACITY};
