//! Traversal checked against brute force over randomized scenes.

use approx::assert_relative_eq;
use fastbvh::math::{Point3, Vec3};
use fastbvh::shapes::{Sphere, SphereIntersector, Triangle, TriangleIntersector};
use fastbvh::{brute_force, BuildConfig, Intersector, Ray, SplitStrategy, Traverser, Tree};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const RAYS: usize = 500;

fn random_point(rng: &mut StdRng, extent: f64) -> Point3 {
    Point3::new(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
    )
}

fn random_ray(rng: &mut StdRng) -> Ray {
    loop {
        let dir = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
        );
        if dir.norm() > 1e-3 {
            return Ray::new(random_point(rng, 30.0), dir);
        }
    }
}

fn random_spheres(rng: &mut StdRng, n: usize) -> Vec<Sphere> {
    (0..n)
        .map(|_| Sphere::new(random_point(rng, 20.0), rng.gen_range(0.1..2.0)))
        .collect()
}

fn random_triangles(rng: &mut StdRng, n: usize) -> Vec<Triangle> {
    (0..n)
        .map(|_| {
            let a = random_point(rng, 20.0);
            let b = a + random_point(rng, 3.0).coords;
            let c = a + random_point(rng, 3.0).coords;
            Triangle::new(a, b, c)
        })
        .collect()
}

fn configs() -> Vec<BuildConfig> {
    vec![
        BuildConfig::default(),
        BuildConfig {
            max_leaf_size: 1,
            ..Default::default()
        },
        BuildConfig {
            max_leaf_size: 8,
            strategy: SplitStrategy::Median,
            ..Default::default()
        },
    ]
}

/// Closest t and hit existence must match a full scan for every ray.
fn check_against_brute_force<P, I>(tree: &Tree<P>, intersector: I, rng: &mut StdRng)
where
    I: Intersector<P> + Clone,
{
    let traverser = Traverser::new(tree, intersector.clone());
    let mut hits = 0;
    for _ in 0..RAYS {
        let ray = random_ray(rng);
        let expected = brute_force(tree.primitives(), &intersector, &ray, false);

        let closest = traverser.traverse(&ray, false);
        assert_relative_eq!(closest.t(), expected.t(), max_relative = 1e-9);
        assert_eq!(closest.is_hit(), expected.is_hit());

        let any = traverser.traverse(&ray, true);
        assert_eq!(any.is_hit(), expected.is_hit());
        if any.is_hit() {
            hits += 1;
            assert!(any.t() >= closest.t());
        }
    }
    // Make sure the scenes are dense enough to exercise both paths.
    assert!(hits > 0 && hits < RAYS, "degenerate scene: {hits} hits");
}

#[test]
fn test_spheres_match_brute_force() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for config in configs() {
        let tree = Tree::build_with(random_spheres(&mut rng, 300), &config).unwrap();
        check_against_brute_force(&tree, SphereIntersector, &mut rng);
    }
}

#[test]
fn test_triangles_match_brute_force() {
    let mut rng = StdRng::seed_from_u64(42);
    for config in configs() {
        let tree = Tree::build_with(random_triangles(&mut rng, 400), &config).unwrap();
        check_against_brute_force(&tree, TriangleIntersector, &mut rng);
    }
}

#[test]
fn test_collinear_spheres_closest_is_first() {
    // Ray crosses every sphere; distances strictly increase with x.
    let spheres: Vec<Sphere> = (0..40)
        .map(|i| Sphere::new(Point3::new(i as f64 * 3.0, 0.0, 0.0), 1.0))
        .collect();
    let mut shuffled = spheres.clone();
    shuffled.shuffle(&mut StdRng::seed_from_u64(7));

    let tree = Tree::build(shuffled).unwrap();
    let traverser = Traverser::new(&tree, SphereIntersector);
    let ray = Ray::new(Point3::new(-10.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));

    let hit = traverser.traverse(&ray, false);
    assert_eq!(hit.primitive(), Some(&spheres[0]));
    assert_relative_eq!(hit.t(), 9.0, epsilon = 1e-10);
}

#[test]
fn test_insertion_order_does_not_change_closest_t() {
    let mut rng = StdRng::seed_from_u64(99);
    let spheres = random_spheres(&mut rng, 200);
    let tree = Tree::build(spheres.clone()).unwrap();

    let mut shuffled = spheres;
    shuffled.shuffle(&mut rng);
    let shuffled_tree = Tree::build(shuffled).unwrap();

    let a = Traverser::new(&tree, SphereIntersector);
    let b = Traverser::new(&shuffled_tree, SphereIntersector);
    for _ in 0..RAYS {
        let ray = random_ray(&mut rng);
        assert_relative_eq!(
            a.closest_hit(&ray).t(),
            b.closest_hit(&ray).t(),
            max_relative = 1e-9
        );
    }
}

#[test]
fn test_rays_missing_scene_bounds() {
    let mut rng = StdRng::seed_from_u64(3);
    let tree = Tree::build(random_spheres(&mut rng, 100)).unwrap();
    let traverser = Traverser::new(&tree, SphereIntersector);

    // Everything lives within |coord| <= 22; these rays run parallel above it.
    for i in 0..50 {
        let origin = Point3::new(-100.0, 50.0 + i as f64, rng.gen_range(-30.0..30.0));
        let ray = Ray::new(origin, Vec3::new(1.0, 0.0, 0.0));
        let result = traverser.traverse(&ray, false);
        assert!(result.primitive().is_none());
        assert_eq!(result.t(), f64::INFINITY);
        assert!(!traverser.occluded(&ray));
    }
}

#[test]
fn test_shared_traverser_across_threads() {
    let mut rng = StdRng::seed_from_u64(11);
    let tree = Tree::build(random_spheres(&mut rng, 300)).unwrap();
    let traverser = Traverser::new(&tree, SphereIntersector);
    let rays: Vec<Ray> = (0..400).map(|_| random_ray(&mut rng)).collect();

    let sequential: Vec<f64> = rays.iter().map(|r| traverser.closest_hit(r).t()).collect();

    let parallel: Vec<f64> = std::thread::scope(|s| {
        let handles: Vec<_> = rays
            .chunks(100)
            .map(|chunk| {
                let traverser = &traverser;
                s.spawn(move || {
                    chunk
                        .iter()
                        .map(|r| traverser.closest_hit(r).t())
                        .collect::<Vec<f64>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect()
    });

    assert_eq!(sequential, parallel);
}
