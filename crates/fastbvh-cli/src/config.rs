//! Scene configuration loaded from TOML.

use std::path::Path;

use anyhow::{Context, Result};
use fastbvh::BuildConfig;
use serde::{Deserialize, Serialize};

/// Procedural scene parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// Number of spheres to scatter.
    pub spheres: usize,
    /// RNG seed for the scatter and for random rays.
    pub seed: u64,
    /// Spheres are centered within `[-extent, extent]` on every axis.
    pub extent: f64,
    /// Smallest sphere radius.
    pub min_radius: f64,
    /// Largest sphere radius.
    pub max_radius: f64,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            spheres: 1_000,
            seed: 1,
            extent: 50.0,
            min_radius: 0.25,
            max_radius: 2.0,
        }
    }
}

/// Everything the CLI needs to build a scene.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Tree construction settings.
    pub build: BuildConfig,
    /// Scene generation settings.
    pub scene: SceneSettings,
}

impl SceneConfig {
    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: SceneConfig =
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject inconsistent settings.
    pub fn validate(&self) -> Result<()> {
        self.build.validate()?;
        let s = &self.scene;
        if !(s.extent > 0.0) {
            anyhow::bail!("scene.extent must be positive, got {}", s.extent);
        }
        if !(s.min_radius > 0.0 && s.min_radius <= s.max_radius) {
            anyhow::bail!(
                "scene radii must satisfy 0 < min_radius <= max_radius, got {}..{}",
                s.min_radius,
                s.max_radius
            );
        }
        Ok(())
    }
}
