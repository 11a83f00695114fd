//! Reference primitives and their intersectors.
//!
//! Enough geometry to drive the hierarchy end to end; real applications
//! supply their own primitive types through [`Bounded`] and [`Intersector`].

use crate::build::Bounded;
use crate::intersection::{Intersector, PrimitiveHit};
use crate::math::{Point3, Vec3};
use crate::{Aabb3, Ray};

/// Determinant threshold below which a ray is treated as parallel to a triangle.
const PARALLEL_EPSILON: f64 = 1e-12;

/// A sphere given by center and radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    /// Center point.
    pub center: Point3,
    /// Radius.
    pub radius: f64,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Point3, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl Bounded for Sphere {
    fn aabb(&self) -> Aabb3 {
        let r = Vec3::new(self.radius, self.radius, self.radius);
        Aabb3::new(self.center - r, self.center + r)
    }
}

/// Ray-sphere intersector (quadratic equation).
///
/// Reports the nearest root inside the ray's range, with the outward unit
/// normal at the hit point as attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SphereIntersector;

impl Intersector<Sphere> for SphereIntersector {
    type Attributes = Vec3;

    fn intersect(&self, sphere: &Sphere, ray: &Ray) -> Option<PrimitiveHit<Vec3>> {
        let oc = ray.origin - sphere.center;
        let d = ray.direction.as_ref();

        // Unit direction, so a = 1.
        let half_b = oc.dot(d);
        let c = oc.dot(&oc) - sphere.radius * sphere.radius;

        let discriminant = half_b * half_b - c;
        if discriminant < 0.0 {
            return None;
        }
        let sqrt_disc = discriminant.sqrt();

        let mut t = -half_b - sqrt_disc;
        if !ray.contains(t) {
            t = -half_b + sqrt_disc;
            if !ray.contains(t) {
                return None;
            }
        }

        let normal = (ray.at(t) - sphere.center) / sphere.radius;
        Some(PrimitiveHit::new(t, normal))
    }
}

/// A triangle given by its three vertices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First vertex.
    pub a: Point3,
    /// Second vertex.
    pub b: Point3,
    /// Third vertex.
    pub c: Point3,
}

impl Triangle {
    /// Create a new triangle.
    pub fn new(a: Point3, b: Point3, c: Point3) -> Self {
        Self { a, b, c }
    }

    /// Geometric normal (not normalized), following the `a -> b -> c` winding.
    pub fn normal(&self) -> Vec3 {
        (self.b - self.a).cross(&(self.c - self.a))
    }
}

impl Bounded for Triangle {
    fn aabb(&self) -> Aabb3 {
        let mut aabb = Aabb3::empty();
        aabb.include_point(&self.a);
        aabb.include_point(&self.b);
        aabb.include_point(&self.c);
        aabb
    }
}

/// Ray-triangle intersector (Möller–Trumbore), double sided.
///
/// Attributes are the barycentric coordinates `(u, v)` of the hit relative
/// to vertices `b` and `c`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TriangleIntersector;

impl Intersector<Triangle> for TriangleIntersector {
    type Attributes = (f64, f64);

    fn intersect(&self, tri: &Triangle, ray: &Ray) -> Option<PrimitiveHit<(f64, f64)>> {
        let d = ray.direction.as_ref();
        let e1 = tri.b - tri.a;
        let e2 = tri.c - tri.a;

        let p = d.cross(&e2);
        let det = e1.dot(&p);
        if det.abs() < PARALLEL_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let s = ray.origin - tri.a;
        let u = s.dot(&p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(&e1);
        let v = d.dot(&q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = e2.dot(&q) * inv_det;
        if !ray.contains(t) {
            return None;
        }

        Some(PrimitiveHit::new(t, (u, v)))
    }
}
