//! Intersection results and the intersector capability.

use crate::Ray;

/// Result of testing a single primitive against a ray.
///
/// Produced by an [`Intersector`]; the traverser attaches the primitive
/// reference and index when promoting it to an [`Intersection`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitiveHit<A = ()> {
    /// Parameter along the ray where the hit occurs.
    pub t: f64,
    /// Primitive-specific data chosen by the intersector.
    pub attributes: A,
}

impl<A> PrimitiveHit<A> {
    /// Create a new primitive hit.
    pub fn new(t: f64, attributes: A) -> Self {
        Self { t, attributes }
    }
}

impl PrimitiveHit<()> {
    /// A hit carrying no attributes.
    pub fn at(t: f64) -> Self {
        Self { t, attributes: () }
    }
}

/// Tests a single primitive against a ray.
///
/// Implementations may do any geometry they like. They must return `None`
/// on a miss and a hit with a meaningful `t` otherwise, and should honor the
/// ray's valid range. Closures of the shape
/// `Fn(&P, &Ray) -> Option<PrimitiveHit<A>>` implement this trait.
pub trait Intersector<P> {
    /// Extra data attached to each hit.
    type Attributes;

    /// Intersect `primitive` with `ray`.
    fn intersect(&self, primitive: &P, ray: &Ray) -> Option<PrimitiveHit<Self::Attributes>>;
}

impl<P, A, F> Intersector<P> for F
where
    F: Fn(&P, &Ray) -> Option<PrimitiveHit<A>>,
{
    type Attributes = A;

    #[inline]
    fn intersect(&self, primitive: &P, ray: &Ray) -> Option<PrimitiveHit<A>> {
        self(primitive, ray)
    }
}

/// A confirmed hit against a primitive of the tree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit<'a, P, A = ()> {
    /// The primitive that was hit.
    pub primitive: &'a P,
    /// Index of the primitive in the tree's primitive array.
    pub index: usize,
    /// Parameter along the ray.
    pub t: f64,
    /// Attributes supplied by the intersector.
    pub attributes: A,
}

/// Outcome of a ray query: either nothing was hit, or a hit record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intersection<'a, P, A = ()> {
    /// The ray hit nothing.
    Miss,
    /// The ray hit a primitive.
    Hit(Hit<'a, P, A>),
}

impl<P, A> Default for Intersection<'_, P, A> {
    fn default() -> Self {
        Intersection::Miss
    }
}

impl<'a, P, A> Intersection<'a, P, A> {
    /// Promote an intersector result for the primitive at `index`.
    #[inline]
    pub fn from_primitive(primitive: &'a P, index: usize, hit: PrimitiveHit<A>) -> Self {
        Intersection::Hit(Hit {
            primitive,
            index,
            t: hit.t,
            attributes: hit.attributes,
        })
    }

    /// Hit distance, `+inf` on a miss.
    #[inline]
    pub fn t(&self) -> f64 {
        match self {
            Intersection::Miss => f64::INFINITY,
            Intersection::Hit(hit) => hit.t,
        }
    }

    /// True if something was hit.
    #[inline]
    pub fn is_hit(&self) -> bool {
        matches!(self, Intersection::Hit(_))
    }

    /// The hit primitive, if any.
    pub fn primitive(&self) -> Option<&'a P> {
        match self {
            Intersection::Miss => None,
            Intersection::Hit(hit) => Some(hit.primitive),
        }
    }

    /// Index of the hit primitive, if any.
    pub fn index(&self) -> Option<usize> {
        match self {
            Intersection::Miss => None,
            Intersection::Hit(hit) => Some(hit.index),
        }
    }

    /// The hit record, if any.
    pub fn hit(&self) -> Option<&Hit<'a, P, A>> {
        match self {
            Intersection::Miss => None,
            Intersection::Hit(hit) => Some(hit),
        }
    }

    /// Convert into an `Option`.
    pub fn into_hit(self) -> Option<Hit<'a, P, A>> {
        match self {
            Intersection::Miss => None,
            Intersection::Hit(hit) => Some(hit),
        }
    }

    /// Keep whichever of `self` and `other` is closer.
    ///
    /// A hit always beats a miss. On equal distances `self` is kept.
    #[inline]
    pub fn closest(self, other: Self) -> Self {
        let other_closer = match (&self, &other) {
            (_, Intersection::Miss) => false,
            (Intersection::Miss, _) => true,
            (Intersection::Hit(a), Intersection::Hit(b)) => b.t < a.t,
        };
        if other_closer {
            other
        } else {
            self
        }
    }
}
