//! Ray representation.

use crate::math::{Dir3, Point3, Vec3};

/// A ray in 3D space defined by origin, direction and a valid parametric range.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
    /// Precomputed reciprocal of direction components for fast AABB tests.
    inv_direction: Vec3,
    /// Sign of direction components (0 if positive, 1 if negative).
    sign: [usize; 3],
    /// Closest parameter considered a hit.
    t_min: f64,
    /// Farthest parameter considered a hit.
    t_max: f64,
}

impl Ray {
    /// Create a new ray from origin and direction, valid over `[0, +inf)`.
    ///
    /// The direction will be normalized. A zero direction is not rejected;
    /// its components become NaN and queries return whatever the box test
    /// and intersector make of that.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        let dir = Dir3::new_normalize(direction);
        let inv = Vec3::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z);
        let sign = [
            if inv.x < 0.0 { 1 } else { 0 },
            if inv.y < 0.0 { 1 } else { 0 },
            if inv.z < 0.0 { 1 } else { 0 },
        ];
        Self {
            origin,
            direction: dir,
            inv_direction: inv,
            sign,
            t_min: 0.0,
            t_max: f64::INFINITY,
        }
    }

    /// Create a ray from `from` towards `to`, valid only up to `to`.
    ///
    /// Handy for shadow rays: the ray is occluded iff something lies between
    /// the two points.
    pub fn segment(from: Point3, to: Point3) -> Self {
        let delta = to - from;
        Self::new(from, delta).with_range(0.0, delta.norm())
    }

    /// Restrict the ray to the parametric range `[t_min, t_max]`.
    pub fn with_range(mut self, t_min: f64, t_max: f64) -> Self {
        self.t_min = t_min;
        self.t_max = t_max;
        self
    }

    /// Closest valid parameter.
    #[inline]
    pub fn t_min(&self) -> f64 {
        self.t_min
    }

    /// Farthest valid parameter.
    #[inline]
    pub fn t_max(&self) -> f64 {
        self.t_max
    }

    /// Whether `t` lies inside the valid range.
    #[inline]
    pub fn contains(&self, t: f64) -> bool {
        t >= self.t_min && t <= self.t_max
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }

    #[inline]
    pub(crate) fn inv_direction(&self) -> &Vec3 {
        &self.inv_direction
    }

    #[inline]
    pub(crate) fn sign(&self) -> &[usize; 3] {
        &self.sign
    }
}
