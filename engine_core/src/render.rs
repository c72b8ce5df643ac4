//! Rendering abstraction.
//!
//! This crate intentionally does not depend on a graphics backend.
//! [`draw_scene`] walks the scene's meshes, frustum-culls them against the
//! camera and hands the survivors to a [`RenderBackend`].

use std::fmt;
use std::str::FromStr;

use anyhow::bail;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::debug_lines::{ColoredVertex, DebugLines};
use crate::geometry::{aabb_in_frustum, calculate_frustum, Frustum, View};
use crate::math::{degrees_to_radians, Mat4, Vec3, Vec4};
use crate::scene::{Node, NodeId, NodeKind, Scene};

/// Near/far planes of the culling projection.
pub const CULL_NEAR: f32 = 1.0;
pub const CULL_FAR: f32 = 1000.0;

/// Editor render state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RenderState {
    /// Editing: animation and hierarchy refresh only, everything drawn.
    #[default]
    Debug,
    /// Play-in-editor with debug overlays.
    Test,
    /// Shipping view: no overlays, hidden-in-game nodes skipped.
    Ship,
}

impl RenderState {
    pub fn shows_debug(&self) -> bool {
        !matches!(self, RenderState::Ship)
    }
}

impl fmt::Display for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RenderState::Debug => "debug",
            RenderState::Test => "test",
            RenderState::Ship => "ship",
        };
        f.write_str(s)
    }
}

impl FromStr for RenderState {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(RenderState::Debug),
            "test" => Ok(RenderState::Test),
            "ship" => Ok(RenderState::Ship),
            other => bail!("unknown render state: {}", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointLightData {
    pub position: Vec3,
    pub color: Vec4,
    pub intensity: f32,
    pub radius: f32,
}

/// One mesh submission.
#[derive(Debug, Clone, Copy)]
pub struct MeshDraw<'a> {
    pub node: NodeId,
    pub asset: &'a str,
    pub world: Mat4,
    pub skinned: bool,
}

/// A minimal rendering API.
pub trait RenderBackend: Send + Sync {
    fn begin_frame(&mut self);
    fn set_view_proj(&mut self, view: &View);
    fn set_point_lights(&mut self, lights: &[PointLightData]);
    fn draw_lines(&mut self, verts: &[ColoredVertex]);
    fn draw_mesh(&mut self, draw: &MeshDraw<'_>);
    fn end_frame(&mut self);
}

/// A no-op renderer useful for headless tests.
#[derive(Default)]
pub struct NullRenderer;

impl RenderBackend for NullRenderer {
    fn begin_frame(&mut self) {}
    fn set_view_proj(&mut self, _view: &View) {}
    fn set_point_lights(&mut self, _lights: &[PointLightData]) {}
    fn draw_lines(&mut self, _verts: &[ColoredVertex]) {}
    fn draw_mesh(&mut self, _draw: &MeshDraw<'_>) {}
    fn end_frame(&mut self) {}
}

/// Per-frame culling counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CullStats {
    /// Meshes tested against the frustum.
    pub considered: usize,
    pub drawn: usize,
    pub culled: usize,
    /// Meshes skipped before the test (invisible or hidden in game).
    pub skipped: usize,
}

/// The camera's view with the fixed culling projection.
pub fn cull_view(camera: &Node, aspect: f32) -> Option<View> {
    let fov = camera.camera()?.field_of_view;
    Some(View {
        view: camera.world.view.inverse()?,
        projection: Mat4::perspective_fov_lh(degrees_to_radians(fov), aspect, CULL_NEAR, CULL_FAR),
    })
}

pub fn cull_frustum(camera: &Node, width: f32, height: f32) -> Option<Frustum> {
    let view = cull_view(camera, width / height)?;
    Some(calculate_frustum(&view, width, height))
}

fn point_lights(scene: &Scene) -> Vec<PointLightData> {
    scene
        .lights()
        .iter()
        .filter_map(|id| scene.get(*id))
        .filter(|n| n.visible())
        .filter_map(|n| match &n.kind {
            NodeKind::PointLight(light) => Some(PointLightData {
                position: n.location(),
                color: light.color,
                intensity: light.intensity(),
                radius: light.radius,
            }),
            _ => None,
        })
        .collect()
}

/// Renders one frame from `camera`. Returns zeroed stats if `camera` is not
/// a live camera node.
pub fn draw_scene(
    scene: &Scene,
    camera: NodeId,
    width: f32,
    height: f32,
    state: RenderState,
    lines: &DebugLines,
    backend: &mut dyn RenderBackend,
) -> CullStats {
    let mut stats = CullStats::default();
    let Some(cam) = scene.get(camera) else {
        return stats;
    };
    let Some(frustum) = cull_frustum(cam, width, height) else {
        return stats;
    };

    backend.begin_frame();
    backend.set_view_proj(&View {
        view: cam.world.view.inverse().unwrap_or(Mat4::IDENTITY),
        projection: cam.world.projection,
    });
    backend.set_point_lights(&point_lights(scene));

    for id in scene.meshes() {
        let Some(node) = scene.get(*id) else {
            continue;
        };
        let Some(mesh) = node.kind.mesh() else {
            continue;
        };
        if !node.visible() || (state != RenderState::Debug && node.hidden_in_game()) {
            stats.skipped += 1;
            continue;
        }

        stats.considered += 1;
        if aabb_in_frustum(&mesh.bounding_box, &frustum) {
            stats.drawn += 1;
            backend.draw_mesh(&MeshDraw {
                node: *id,
                asset: &mesh.asset,
                world: node.world.view,
                skinned: matches!(node.kind, NodeKind::SkeletalMesh(_)),
            });
        } else {
            stats.culled += 1;
        }
    }

    if state.shows_debug() && !lines.is_empty() {
        backend.draw_lines(lines.verts());
    }
    backend.end_frame();

    trace!(
        considered = stats.considered,
        drawn = stats.drawn,
        culled = stats.culled,
        "frame drawn"
    );
    stats
}
