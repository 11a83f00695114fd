//! Math types used throughout the hierarchy.
//!
//! Thin aliases over nalgebra so geometry code reads in terms of points,
//! vectors and unit directions.

use nalgebra::{Unit, Vector3};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// Component of `p` along `axis` (0 = x, 1 = y, anything else = z).
#[inline]
pub fn axis_component(p: &Point3, axis: usize) -> f64 {
    match axis {
        0 => p.x,
        1 => p.y,
        _ => p.z,
    }
}
