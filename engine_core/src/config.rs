//! Configuration system.
//!
//! Loads engine configuration from JSON strings/files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Root configuration for the editor and headless runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Viewport size in pixels.
    pub screen_width: u32,
    pub screen_height: u32,
    /// Fixed update rate.
    pub tick_hz: u32,
    /// Directory animation and mesh files are resolved against.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: PathBuf,
    /// Vertical field of view for new cameras, in degrees.
    #[serde(default = "default_field_of_view")]
    pub field_of_view: f32,
    #[serde(default = "default_near_plane")]
    pub near_plane: f32,
    #[serde(default = "default_far_plane")]
    pub far_plane: f32,
    /// Draw node and joint axes.
    #[serde(default = "default_true")]
    pub show_debug_matrices: bool,
    #[serde(default = "default_true")]
    pub show_debug_grid: bool,
    #[serde(default)]
    pub show_collision_boxes: bool,
}

fn default_assets_dir() -> PathBuf {
    PathBuf::from("assets")
}

fn default_field_of_view() -> f32 {
    crate::scene::CAMERA_DEFAULT_FOV
}

fn default_near_plane() -> f32 {
    crate::scene::CAMERA_DEFAULT_NEAR
}

fn default_far_plane() -> f32 {
    crate::scene::CAMERA_DEFAULT_FAR
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            screen_width: 1280,
            screen_height: 720,
            tick_hz: 60,
            assets_dir: default_assets_dir(),
            field_of_view: default_field_of_view(),
            near_plane: default_near_plane(),
            far_plane: default_far_plane(),
            show_debug_matrices: true,
            show_debug_grid: true,
            show_collision_boxes: false,
        }
    }
}

impl EngineConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.screen_width as f32 / self.screen_height.max(1) as f32
    }

    /// Seconds per tick.
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_hz.max(1) as f32
    }
}
