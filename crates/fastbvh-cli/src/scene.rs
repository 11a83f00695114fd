//! Procedural scenes and ray generation.

use fastbvh::math::{Point3, Vec3};
use fastbvh::shapes::Sphere;
use fastbvh::Ray;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::SceneSettings;

/// Scatter spheres uniformly inside the scene cube.
pub fn spheres(settings: &SceneSettings) -> Vec<Sphere> {
    let mut rng = StdRng::seed_from_u64(settings.seed);
    let e = settings.extent;
    (0..settings.spheres)
        .map(|_| {
            let center = Point3::new(
                rng.gen_range(-e..=e),
                rng.gen_range(-e..=e),
                rng.gen_range(-e..=e),
            );
            Sphere::new(center, rng.gen_range(settings.min_radius..=settings.max_radius))
        })
        .collect()
}

/// Pinhole camera rays looking down +z at the scene, one per pixel, row-major.
pub fn camera_rays(settings: &SceneSettings, width: usize, height: usize) -> Vec<Ray> {
    let e = settings.extent;
    let eye = Point3::new(0.0, 0.0, -3.0 * e);
    let mut rays = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let u = (col as f64 + 0.5) / width as f64 * 2.0 - 1.0;
            let v = 1.0 - (row as f64 + 0.5) / height as f64 * 2.0;
            let target = Point3::new(u * e, v * e, 0.0);
            rays.push(Ray::new(eye, target - eye));
        }
    }
    rays
}

/// Random rays starting anywhere in a slightly enlarged scene cube.
pub fn random_rays(settings: &SceneSettings, count: usize) -> Vec<Ray> {
    // Offset the seed so rays don't correlate with sphere placement.
    let mut rng = StdRng::seed_from_u64(settings.seed.wrapping_add(0x9e37_79b9));
    let e = settings.extent * 1.5;
    let mut rays = Vec::with_capacity(count);
    while rays.len() < count {
        let dir = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        if dir.norm() < 1e-3 {
            continue;
        }
        let origin = Point3::new(
            rng.gen_range(-e..e),
            rng.gen_range(-e..e),
            rng.gen_range(-e..e),
        );
        rays.push(Ray::new(origin, dir));
    }
    rays
}
