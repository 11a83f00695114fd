//! Axis-aligned bounding boxes and the slab ray test.

use crate::math::{axis_component, Point3, Vec3};
use crate::Ray;

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Default for Aabb3 {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb3 {
    /// Create an AABB from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) AABB suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// True if no point has been included yet.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this AABB to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Expand this AABB to include another one.
    pub fn include_aabb(&mut self, other: &Aabb3) {
        if other.is_empty() {
            return;
        }
        self.include_point(&other.min);
        self.include_point(&other.max);
    }

    /// Test if `other` lies entirely inside this box (touching counts).
    pub fn contains_aabb(&self, other: &Aabb3) -> bool {
        other.is_empty()
            || (self.min.x <= other.min.x
                && self.min.y <= other.min.y
                && self.min.z <= other.min.z
                && self.max.x >= other.max.x
                && self.max.y >= other.max.y
                && self.max.z >= other.max.z)
    }

    /// Center of the box.
    pub fn centroid(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    /// Size of the box along each axis.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Surface area, zero for an empty box.
    pub fn surface_area(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        let d = self.extent();
        2.0 * (d.x * d.y + d.y * d.z + d.z * d.x)
    }

    /// Index of the axis with the largest extent.
    pub fn longest_axis(&self) -> usize {
        let d = self.extent();
        if d.x >= d.y && d.x >= d.z {
            0
        } else if d.y >= d.z {
            1
        } else {
            2
        }
    }

    /// Lower bound along `axis`.
    #[inline]
    pub fn min_on(&self, axis: usize) -> f64 {
        axis_component(&self.min, axis)
    }

    /// Upper bound along `axis`.
    #[inline]
    pub fn max_on(&self, axis: usize) -> f64 {
        axis_component(&self.max, axis)
    }

    /// Test ray-AABB intersection using the slab method.
    ///
    /// Returns `Some((t_entry, t_exit))` if the ray's valid range overlaps the
    /// box, with both parameters clipped to that range. Returns `None` if the
    /// ray misses the box or only reaches it outside its range.
    ///
    /// Handles infinite values correctly for axis-aligned rays.
    #[inline]
    pub fn intersect(&self, ray: &Ray) -> Option<(f64, f64)> {
        let bounds = [self.min, self.max];
        let sign = ray.sign();
        let inv = ray.inv_direction();
        let origin = &ray.origin;

        let tx1 = (bounds[sign[0]].x - origin.x) * inv.x;
        let tx2 = (bounds[1 - sign[0]].x - origin.x) * inv.x;

        let mut t_min = tx1;
        let mut t_max = tx2;

        let ty1 = (bounds[sign[1]].y - origin.y) * inv.y;
        let ty2 = (bounds[1 - sign[1]].y - origin.y) * inv.y;

        t_min = t_min.max(ty1);
        t_max = t_max.min(ty2);

        let tz1 = (bounds[sign[2]].z - origin.z) * inv.z;
        let tz2 = (bounds[1 - sign[2]].z - origin.z) * inv.z;

        t_min = t_min.max(tz1).max(ray.t_min());
        t_max = t_max.min(tz2).min(ray.t_max());

        if t_max >= t_min {
            Some((t_min, t_max))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> Aabb3 {
        Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_ray_aabb_hit() {
        let ray = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
        let (t_min, t_max) = unit_box().intersect(&ray).unwrap();
        assert_relative_eq!(t_min, 5.0, epsilon = 1e-10);
        assert_relative_eq!(t_max, 6.0, epsilon = 1e-10);
    }

    #[test]
    fn test_ray_aabb_miss() {
        let ray = Ray::new(Point3::new(-5.0, 5.0, 5.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(unit_box().intersect(&ray).is_none());
    }

    #[test]
    fn test_ray_inside_aabb() {
        // Ray origin inside the box
        let ray = Ray::new(Point3::new(0.5, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
        let (t_min, t_max) = unit_box().intersect(&ray).unwrap();
        assert_eq!(t_min, 0.0);
        assert_relative_eq!(t_max, 0.5, epsilon = 1e-10);
    }

    #[test]
    fn test_ray_aabb_diagonal() {
        let ray = Ray::new(Point3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        let (t_min, _) = unit_box().intersect(&ray).unwrap();
        assert_relative_eq!(t_min, 3f64.sqrt(), epsilon = 1e-10);
    }

    #[test]
    fn test_ray_aabb_behind() {
        // Ray pointing away from box
        let ray = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::new(-1.0, 0.0, 0.0));
        assert!(unit_box().intersect(&ray).is_none());
    }

    #[test]
    fn test_ray_aabb_beyond_range() {
        let ray = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0))
            .with_range(0.0, 4.0);
        assert!(unit_box().intersect(&ray).is_none());

        let ray = ray.with_range(5.5, 10.0);
        let (t_min, t_max) = unit_box().intersect(&ray).unwrap();
        assert_relative_eq!(t_min, 5.5);
        assert_relative_eq!(t_max, 6.0, epsilon = 1e-10);
    }

    #[test]
    fn test_ray_aabb_on_face_plane() {
        // Ray travelling inside the x = 0 face plane still counts as a hit.
        let ray = Ray::new(Point3::new(0.0, -1.0, 0.5), Vec3::new(0.0, 1.0, 0.0));
        assert!(unit_box().intersect(&ray).is_some());
    }

    #[test]
    fn test_empty_box_never_hit() {
        let ray = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
        assert!(Aabb3::empty().intersect(&ray).is_none());
        assert!(Aabb3::empty().is_empty());
        assert_eq!(Aabb3::empty().surface_area(), 0.0);
    }

    #[test]
    fn test_include_and_contains() {
        let mut b = Aabb3::empty();
        b.include_aabb(&unit_box());
        b.include_point(&Point3::new(3.0, -1.0, 0.5));
        assert!(b.contains_aabb(&unit_box()));
        assert!(!unit_box().contains_aabb(&b));
        assert_eq!(b.longest_axis(), 0);
        assert_relative_eq!(b.centroid().x, 1.5);
        assert_relative_eq!(unit_box().surface_area(), 6.0);
    }
}
