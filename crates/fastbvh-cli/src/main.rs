//! fastbvh CLI - build procedural scenes and trace rays through them
//!
//! Useful for eyeballing tree quality and checking traversal against a
//! brute-force scan.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fastbvh::shapes::{Sphere, SphereIntersector};
use fastbvh::{brute_force, TraversalStats, Traverser, Tree};
use tracing_subscriber::EnvFilter;

mod config;
mod scene;

use config::SceneConfig;

/// Shading ramp for ASCII output, near to far.
const RAMP: &[u8] = b"@%#*+=-:.";

#[derive(Parser)]
#[command(name = "fastbvh")]
#[command(about = "Build and trace bounding volume hierarchies", long_about = None)]
struct Cli {
    /// TOML file with [build] and [scene] sections
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the number of spheres
    #[arg(long, global = true)]
    spheres: Option<usize>,

    /// Override the scene seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the scene and print tree statistics
    Info,
    /// Trace a grid of camera rays and report traversal counters
    Trace {
        /// Image width in rays
        #[arg(long, default_value_t = 64)]
        width: usize,
        /// Image height in rays
        #[arg(long, default_value_t = 32)]
        height: usize,
        /// Only test for occlusion instead of finding the closest hit
        #[arg(long)]
        occlusion: bool,
        /// Print the hit distances as ASCII art
        #[arg(long)]
        ascii: bool,
    },
    /// Compare traversal with brute force over random rays
    Verify {
        /// Number of random rays
        #[arg(long, default_value_t = 10_000)]
        rays: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = SceneConfig::load(cli.config.as_deref())?;
    if let Some(spheres) = cli.spheres {
        config.scene.spheres = spheres;
    }
    if let Some(seed) = cli.seed {
        config.scene.seed = seed;
    }

    let tree = build_scene(&config)?;

    match cli.command {
        Commands::Info => {
            println!("{}", tree.stats());
        }
        Commands::Trace {
            width,
            height,
            occlusion,
            ascii,
        } => {
            trace(&tree, &config, width, height, occlusion, ascii);
        }
        Commands::Verify { rays } => {
            verify(&tree, &config, rays)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_scene(config: &SceneConfig) -> Result<Tree<Sphere>> {
    let spheres = scene::spheres(&config.scene);
    let start = Instant::now();
    let tree = Tree::build_with(spheres, &config.build).context("building tree")?;
    tracing::info!(
        spheres = tree.len(),
        nodes = tree.nodes().len(),
        depth = tree.depth(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1e3,
        "built tree"
    );
    Ok(tree)
}

fn trace(
    tree: &Tree<Sphere>,
    config: &SceneConfig,
    width: usize,
    height: usize,
    occlusion: bool,
    ascii: bool,
) {
    let traverser = Traverser::new(tree, SphereIntersector);
    let rays = scene::camera_rays(&config.scene, width, height);

    let mut stats = TraversalStats::default();
    let start = Instant::now();
    let distances: Vec<f64> = rays
        .iter()
        .map(|ray| traverser.traverse_with_stats(ray, occlusion, &mut stats).t())
        .collect();
    let elapsed = start.elapsed();

    let hits = distances.iter().filter(|t| t.is_finite()).count();
    let per_ray = |n: u64| n as f64 / stats.rays.max(1) as f64;
    println!("rays:            {}", stats.rays);
    println!("hits:            {hits}");
    println!("nodes/ray:       {:.2}", per_ray(stats.nodes_visited));
    println!("pruned/ray:      {:.2}", per_ray(stats.pruned));
    println!("box tests/ray:   {:.2}", per_ray(stats.box_tests));
    println!("prim tests/ray:  {:.2}", per_ray(stats.primitive_tests));
    println!("peak stack:      {}", stats.max_stack);
    println!(
        "time:            {:.3} ms ({:.1} ns/ray)",
        elapsed.as_secs_f64() * 1e3,
        elapsed.as_secs_f64() * 1e9 / stats.rays.max(1) as f64
    );

    if ascii {
        print!("{}", render_ascii(&distances, width));
    }
}

/// Map finite distances onto [`RAMP`], blanks for misses.
fn render_ascii(distances: &[f64], width: usize) -> String {
    let finite = distances.iter().copied().filter(|t| t.is_finite());
    let (lo, hi) = finite.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), t| {
        (lo.min(t), hi.max(t))
    });
    let span = (hi - lo).max(1e-9);

    let mut out = String::with_capacity(distances.len() + distances.len() / width.max(1) + 1);
    for row in distances.chunks(width.max(1)) {
        for &t in row {
            if t.is_finite() {
                let idx = ((t - lo) / span * (RAMP.len() - 1) as f64).round() as usize;
                out.push(RAMP[idx.min(RAMP.len() - 1)] as char);
            } else {
                out.push(' ');
            }
        }
        out.push('\n');
    }
    out
}

fn verify(tree: &Tree<Sphere>, config: &SceneConfig, count: usize) -> Result<()> {
    let traverser = Traverser::new(tree, SphereIntersector);
    let rays = scene::random_rays(&config.scene, count);

    let mut mismatches = 0usize;
    let mut hits = 0usize;
    for (i, ray) in rays.iter().enumerate() {
        let expected = brute_force(tree.primitives(), &SphereIntersector, ray, false);
        let closest = traverser.traverse(ray, false);
        let any = traverser.traverse(ray, true);

        let t_ok = closest.t() == expected.t()
            || (closest.t() - expected.t()).abs() <= 1e-9 * expected.t().abs();
        if !t_ok || any.is_hit() != expected.is_hit() {
            mismatches += 1;
            tracing::warn!(
                ray = i,
                traversed = closest.t(),
                brute_force = expected.t(),
                occluded = any.is_hit(),
                "traversal disagrees with brute force"
            );
        }
        if expected.is_hit() {
            hits += 1;
        }
    }

    println!("checked {count} rays, {hits} hits, {mismatches} mismatches");
    if mismatches > 0 {
        anyhow::bail!("{mismatches} of {count} rays disagree with brute force");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_ascii_shapes() {
        let inf = f64::INFINITY;
        let art = render_ascii(&[1.0, inf, 3.0, inf, 2.0, inf], 3);
        assert_eq!(art, "@ .\n + \n");
    }

    #[test]
    fn test_build_and_verify_small_scene() {
        let mut config = SceneConfig::default();
        config.scene.spheres = 200;
        let tree = build_scene(&config).unwrap();
        assert_eq!(tree.len(), 200);
        verify(&tree, &config, 500).unwrap();
    }
}
