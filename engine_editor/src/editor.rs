//! Editor implementation.
//!
//! The editor maintains:
//! - The scene and the editor camera the user flies around with
//! - Debug overlays (grid, node axes, skeletons, collision boxes)
//! - A render state deciding what gets drawn and culled
//! - Console for user commands, including animation transport controls

use std::time::Duration;

use anyhow::{bail, Context};
use engine_core::config::EngineConfig;
use engine_core::console::{Console, CvarFlags, CvarValue};
use engine_core::debug_lines::{DebugLines, DrawType, WHITE};
use engine_core::math::Vec3;
use engine_core::mesh::MeshData;
use engine_core::render::{draw_scene, CullStats, NullRenderer, RenderBackend, RenderState};
use engine_core::scene::{Camera, ControllerId, NodeDesc, NodeId, NodeKind, Scene};
use serde::Serialize;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::input::{fly_camera, InputState};

pub const EDITOR_CAMERA: &str = "editor_camera";
pub const EDITOR_CONTROLLER: ControllerId = ControllerId(0);

pub const R_SHOW_MATRICES: &str = "r_show_matrices";
pub const R_SHOW_GRID: &str = "r_show_grid";
pub const R_SHOW_BOXES: &str = "r_show_boxes";
pub const R_SHOW_BIND_POSE: &str = "r_show_bind_pose";
pub const HOST_TIMESCALE: &str = "host_timescale";

const GRID_SIZE: i32 = 100;

/// Snapshot printed by `status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub state: RenderState,
    pub tick: u64,
    pub nodes: usize,
    pub camera: [f32; 3],
    pub selected: Option<String>,
    pub stats: CullStats,
    pub line_verts: usize,
    pub dropped_lines: usize,
}

/// High-level editor session.
pub struct Editor {
    pub config: EngineConfig,
    pub scene: Scene,
    pub console: Console,
    pub lines: DebugLines,
    pub state: RenderState,

    /// The editor's own fly camera.
    pub camera: NodeId,
    /// Target of `anim`, `teleport` and friends.
    pub selected: Option<NodeId>,
    pub last_stats: CullStats,

    backend: Box<dyn RenderBackend>,
    tick: u64,
    quit: bool,
}

impl Editor {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_backend(config, Box::new(NullRenderer))
    }

    pub fn with_backend(config: EngineConfig, backend: Box<dyn RenderBackend>) -> Self {
        let mut scene = Scene::new();
        let camera = scene.spawn(
            NodeDesc::new(
                EDITOR_CAMERA,
                NodeKind::Camera(Camera {
                    field_of_view: config.field_of_view,
                    active_on_start: true,
                    ..Camera::default()
                }),
            )
            .with_input(true),
        );
        if let Some(node) = scene.get_mut(camera) {
            node.possess_controller(EDITOR_CONTROLLER, true);
            node.set_camera_active(true);
            node.refresh_aspect_ratio(config.aspect_ratio(), config.near_plane, config.far_plane);
        }

        let mut console = Console::new();
        Self::register_cvars(&mut console, &config);

        info!(
            width = config.screen_width,
            height = config.screen_height,
            tick_hz = config.tick_hz,
            "editor started"
        );

        Self {
            config,
            scene,
            console,
            lines: DebugLines::new(),
            state: RenderState::default(),
            camera,
            selected: None,
            last_stats: CullStats::default(),
            backend,
            tick: 0,
            quit: false,
        }
    }

    fn register_cvars(console: &mut Console, config: &EngineConfig) {
        console.register_cvar(
            R_SHOW_MATRICES,
            CvarValue::Bool(config.show_debug_matrices),
            "Draw node axes",
            CvarFlags::ARCHIVE | CvarFlags::DEBUG_DRAW,
        );
        console.register_cvar(
            R_SHOW_GRID,
            CvarValue::Bool(config.show_debug_grid),
            "Draw the ground grid",
            CvarFlags::ARCHIVE | CvarFlags::DEBUG_DRAW,
        );
        console.register_cvar(
            R_SHOW_BOXES,
            CvarValue::Bool(config.show_collision_boxes),
            "Draw mesh bounding boxes",
            CvarFlags::ARCHIVE | CvarFlags::DEBUG_DRAW,
        );
        console.register_cvar(
            R_SHOW_BIND_POSE,
            CvarValue::Bool(false),
            "Draw bind pose skeletons next to animated ones",
            CvarFlags::DEBUG_DRAW,
        );
        console.register_cvar(
            HOST_TIMESCALE,
            CvarValue::Float(1.0),
            "Scales scene time; 0 freezes animation",
            CvarFlags::NONE,
        );
        console.register_cvar(
            "r_tick_hz",
            CvarValue::Int(i64::from(config.tick_hz)),
            "Fixed update rate",
            CvarFlags::READ_ONLY,
        );
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Set by the `quit` command.
    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// The camera frames are rendered from: the first active camera, else
    /// the editor camera.
    pub fn view_camera(&self) -> NodeId {
        self.scene.active_camera().unwrap_or(self.camera)
    }

    /// Sizes a mesh node's bounding box to its mesh file, if the file
    /// exists under the asset directory. Returns whether a file was read.
    pub fn fit_mesh_bounds(&mut self, id: NodeId) -> anyhow::Result<bool> {
        let Some(asset) = self
            .scene
            .get(id)
            .and_then(|n| n.kind.mesh())
            .map(|m| m.asset.clone())
        else {
            return Ok(false);
        };
        let path = self.config.assets_dir.join(&asset);
        if !path.is_file() {
            return Ok(false);
        }

        let mut mesh = MeshData::load(&path)?;
        mesh.condition_left_handed();
        let Some(bounds) = mesh.bounds() else {
            bail!("mesh {} has no vertices", asset);
        };

        if let Some(component) = self.scene.get_mut(id).and_then(|n| n.kind.mesh_mut()) {
            component.box_offset = bounds.center;
            component.bounding_box.extents = bounds.extents;
        }
        debug!(asset = %asset, triangles = mesh.triangle_count(), "mesh bounds fitted");
        Ok(true)
    }

    /// Advances one frame: camera controls, scene update, overlays, draw.
    pub fn tick(&mut self, dt: f32, input: &InputState) -> CullStats {
        if let Some(camera) = self.scene.get_mut(self.camera) {
            fly_camera(camera, input, dt);
        }

        let timescale = self.console.cvar_float(HOST_TIMESCALE, 1.0).max(0.0) as f32;
        self.scene.update(dt * timescale);
        self.rebuild_debug_lines();

        let camera = self.view_camera();
        self.last_stats = draw_scene(
            &self.scene,
            camera,
            self.config.screen_width as f32,
            self.config.screen_height as f32,
            self.state,
            &self.lines,
            self.backend.as_mut(),
        );
        if self.lines.dropped() > 0 {
            warn!(dropped = self.lines.dropped(), "debug line buffer full");
        }

        self.tick += 1;
        self.last_stats
    }

    fn rebuild_debug_lines(&mut self) {
        self.lines.clear();
        if !self.state.shows_debug() {
            return;
        }

        if self.console.cvar_bool(R_SHOW_GRID) {
            self.lines.draw_grid(GRID_SIZE, WHITE);
        }
        let matrices = self.console.cvar_bool(R_SHOW_MATRICES);
        let boxes = self.console.cvar_bool(R_SHOW_BOXES);
        let bind_pose = self.console.cvar_bool(R_SHOW_BIND_POSE);

        for (id, node) in self.scene.iter() {
            if id == self.camera {
                continue;
            }
            if matrices {
                self.lines.add_node(node, DrawType::for_kind(&node.kind));
            }
            if let NodeKind::SkeletalMesh(_) = node.kind {
                self.lines.add_animated_skeleton(node);
                if bind_pose {
                    self.lines.add_bind_pose_skeleton(node);
                }
            }
            if let Some(mesh) = node.kind.mesh() {
                if boxes || mesh.collision {
                    self.lines.add_box_collider(&mesh.bounding_box);
                }
            }
        }
    }

    /// Ticks at the configured rate until `ticks` frames have run.
    pub async fn run_for_ticks(&mut self, ticks: u64, input: InputState) -> CullStats {
        let dt = self.config.tick_dt();
        let mut interval = tokio::time::interval(Duration::from_secs_f32(dt));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        for _ in 0..ticks {
            interval.tick().await;
            self.tick(dt, &input);
        }
        self.last_stats
    }

    pub fn status(&self) -> StatusReport {
        let camera = self
            .scene
            .get(self.view_camera())
            .map(|n| n.location())
            .unwrap_or(Vec3::ZERO);
        StatusReport {
            state: self.state,
            tick: self.tick,
            nodes: self.scene.len(),
            camera: [camera.x, camera.y, camera.z],
            selected: self
                .selected
                .and_then(|id| self.scene.get(id))
                .map(|n| n.name.clone()),
            stats: self.last_stats,
            line_verts: self.lines.len(),
            dropped_lines: self.lines.dropped(),
        }
    }

    fn node_by_name(&self, name: &str) -> anyhow::Result<NodeId> {
        self.scene
            .find(name)
            .with_context(|| format!("no node named '{}'", name))
    }

    fn selected_or(&self, name: Option<&&str>) -> anyhow::Result<NodeId> {
        match name {
            Some(name) => self.node_by_name(name),
            None => self
                .selected
                .filter(|id| self.scene.contains(*id))
                .context("nothing selected"),
        }
    }

    /// Executes a console command.
    pub fn exec_console(&mut self, line: &str) -> anyhow::Result<Vec<String>> {
        let line = line.trim();
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        match tokens[0] {
            "status" => {
                let report = self.status();
                if tokens.get(1) == Some(&"json") {
                    return Ok(vec![serde_json::to_string(&report)?]);
                }
                let mut out = Vec::new();
                out.push(format!("State: {}", report.state));
                out.push(format!("Tick: {}", report.tick));
                out.push(format!("Nodes: {}", report.nodes));
                out.push(format!(
                    "Camera: ({:.2}, {:.2}, {:.2})",
                    report.camera[0], report.camera[1], report.camera[2]
                ));
                if let Some(ref name) = report.selected {
                    out.push(format!("Selected: {}", name));
                }
                out.push(format!(
                    "Meshes: {} drawn, {} culled, {} skipped",
                    report.stats.drawn, report.stats.culled, report.stats.skipped
                ));
                out.push(format!(
                    "Debug lines: {} verts ({} dropped)",
                    report.line_verts, report.dropped_lines
                ));
                Ok(out)
            }
            "nodes" => Ok(self
                .scene
                .iter()
                .map(|(id, node)| {
                    let p = node.location();
                    let parent = node
                        .parent()
                        .and_then(|pid| self.scene.get(pid))
                        .map(|pn| format!(" -> {}", pn.name))
                        .unwrap_or_default();
                    format!(
                        "{:>3} {} [{}] ({:.2}, {:.2}, {:.2}){}",
                        id.index(),
                        node.name,
                        node.kind.name(),
                        p.x,
                        p.y,
                        p.z,
                        parent
                    )
                })
                .collect()),
            "select" => {
                if tokens.len() < 2 {
                    return Ok(vec!["Usage: select <node>".to_string()]);
                }
                let id = self.node_by_name(tokens[1])?;
                self.selected = Some(id);
                Ok(vec![format!("Selected {}", tokens[1])])
            }
            "state" => {
                if tokens.len() < 2 {
                    return Ok(vec![format!("State: {}", self.state)]);
                }
                self.state = tokens[1].parse()?;
                info!(state = %self.state, "render state changed");
                Ok(vec![format!("State: {}", self.state)])
            }
            "teleport" => {
                if tokens.len() < 4 {
                    return Ok(vec!["Usage: teleport <x> <y> <z>".to_string()]);
                }
                let id = self.selected_or(None)?;
                let mut v = [0.0f32; 3];
                for (slot, token) in v.iter_mut().zip(&tokens[1..4]) {
                    *slot = token.parse().with_context(|| format!("bad coordinate '{}'", token))?;
                }
                if let Some(node) = self.scene.get_mut(id) {
                    node.set_location(Vec3::new(v[0], v[1], v[2]));
                }
                Ok(vec![])
            }
            "attach" => {
                if tokens.len() < 3 {
                    return Ok(vec!["Usage: attach <child> <parent>".to_string()]);
                }
                let child = self.node_by_name(tokens[1])?;
                let parent = self.node_by_name(tokens[2])?;
                if !self.scene.attach_to_object(child, parent) {
                    bail!("cannot attach '{}' to '{}'", tokens[1], tokens[2]);
                }
                Ok(vec![format!("{} attached to {}", tokens[1], tokens[2])])
            }
            "detach" => {
                let id = self.selected_or(tokens.get(1))?;
                let detached = self.scene.detach(id);
                Ok(vec![if detached { "Detached" } else { "Not attached" }.to_string()])
            }
            "destroy" => {
                let id = self.selected_or(tokens.get(1))?;
                if id == self.camera {
                    bail!("the editor camera cannot be destroyed");
                }
                let node = self.scene.destroy(id).context("node already destroyed")?;
                if self.selected == Some(id) {
                    self.selected = None;
                }
                Ok(vec![format!("Destroyed {}", node.name)])
            }
            "cull" => {
                let s = self.last_stats;
                Ok(vec![format!(
                    "Culling: {} considered, {} drawn, {} culled, {} skipped",
                    s.considered, s.drawn, s.culled, s.skipped
                )])
            }
            "anim" => self.exec_anim(&tokens[1..]),
            "quit" | "exit" => {
                self.quit = true;
                Ok(vec!["Bye".to_string()])
            }
            _ => {
                // Delegate to console system.
                self.console.exec(line)
            }
        }
    }

    /// `anim <play [file]|pause|step <n>|frame <n>|time <t>|info>` on the
    /// selected node.
    fn exec_anim(&mut self, args: &[&str]) -> anyhow::Result<Vec<String>> {
        let Some(sub) = args.first() else {
            return Ok(vec!["Usage: anim <play [file]|pause|step <n>|frame <n>|time <t>|info>".to_string()]);
        };
        let id = self.selected_or(None)?;
        let assets_dir = self.config.assets_dir.clone();
        let node = self.scene.get_mut(id).context("selected node is gone")?;
        let animator = &mut node.animator;

        let out = match *sub {
            "play" => {
                let file = args.get(1).copied().unwrap_or("");
                if animator.play(&assets_dir, file) {
                    format!("Playing {}", animator.anim.file())
                } else {
                    "Nothing to play".to_string()
                }
            }
            "pause" => {
                if animator.pause() {
                    format!("Paused at {:.3}s", animator.anim.time)
                } else {
                    "Nothing to pause".to_string()
                }
            }
            "step" => {
                let n: i32 = args.get(1).unwrap_or(&"1").parse().context("frame count")?;
                animator.anim.frame_jump(n);
                format!("Time {:.3}s", animator.anim.time)
            }
            "frame" => {
                let frame: i32 = args.get(1).context("missing frame")?.parse().context("frame")?;
                animator.anim.frame_set(frame);
                format!("Time {:.3}s", animator.anim.time)
            }
            "time" => {
                let time: f64 = args.get(1).context("missing time")?.parse().context("time")?;
                animator.anim.time_set(time);
                format!("Time {:.3}s", animator.anim.time)
            }
            "info" => {
                let anim = &animator.anim;
                if !anim.ready() {
                    "No animation loaded".to_string()
                } else {
                    format!(
                        "{}: {} frames, {:.3}s, at {:.3}s (frame {}), {}",
                        anim.file(),
                        anim.frame_count(),
                        anim.duration(),
                        anim.time,
                        anim.frame_at_current_time().unwrap_or(0),
                        if anim.paused() { "paused" } else { "playing" }
                    )
                }
            }
            other => bail!("unknown anim command: {}", other),
        };
        Ok(vec![out])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo;
    use crate::input::Keys;
    use engine_core::math::Vec2;
    use std::path::Path;

    fn demo_editor() -> Editor {
        let mut editor = Editor::new(EngineConfig::default());
        demo::populate(&mut editor.scene, Path::new("missing-assets"), 3, 11);
        editor
    }

    #[test]
    fn editor_camera_is_active_and_possessed() {
        let editor = Editor::new(EngineConfig::default());
        let camera = editor.scene.get(editor.camera).unwrap();
        assert_eq!(camera.controller(), Some(EDITOR_CONTROLLER));
        assert!(camera.input_enabled());
        assert_eq!(editor.view_camera(), editor.camera);
    }

    #[test]
    fn ship_state_draws_no_overlays() {
        let mut editor = demo_editor();
        editor.tick(1.0 / 60.0, &InputState::default());
        assert!(!editor.lines.is_empty());

        editor.exec_console("state ship").unwrap();
        editor.tick(1.0 / 60.0, &InputState::default());
        assert!(editor.lines.is_empty());
        assert_eq!(editor.tick_count(), 2);
    }

    #[test]
    fn grid_toggle_goes_through_console() {
        let mut editor = Editor::new(EngineConfig::default());
        editor.exec_console("r_show_matrices 0").unwrap();
        editor.tick(0.0, &InputState::default());
        let with_grid = editor.lines.len();
        assert!(with_grid > 0);

        editor.exec_console("r_show_grid 0").unwrap();
        editor.tick(0.0, &InputState::default());
        assert_eq!(editor.lines.len(), 0);
    }

    #[test]
    fn timescale_freezes_animation() {
        let mut editor = demo_editor();
        editor.exec_console("host_timescale 0").unwrap();
        editor.exec_console("select hero").unwrap();
        editor.tick(0.5, &InputState::default());
        let hero = editor.scene.find("hero").unwrap();
        assert_eq!(editor.scene.get(hero).unwrap().animator.anim.time, 0.0);

        editor.exec_console("host_timescale 1").unwrap();
        editor.tick(0.5, &InputState::default());
        assert_eq!(editor.scene.get(hero).unwrap().animator.anim.time, 0.5);
    }

    #[test]
    fn anim_transport_commands() {
        let mut editor = demo_editor();
        editor.exec_console("select hero").unwrap();

        let out = editor.exec_console("anim pause").unwrap();
        assert!(out[0].starts_with("Paused"));
        editor.exec_console("anim frame 12").unwrap();
        let hero = editor.selected.unwrap();
        assert_eq!(editor.scene.get(hero).unwrap().animator.anim.time, 1.0);

        editor.exec_console("anim step -3").unwrap();
        assert_eq!(editor.scene.get(hero).unwrap().animator.anim.time, 0.75);

        editor.exec_console("anim time 5").unwrap();
        assert_eq!(editor.scene.get(hero).unwrap().animator.anim.time, 0.75);

        let info = editor.exec_console("anim info").unwrap();
        assert!(info[0].contains("24 frames"), "{info:?}");
        assert!(info[0].ends_with("paused"));
    }

    #[test]
    fn cull_reports_last_frame() {
        let mut editor = demo_editor();
        editor.tick(0.0, &InputState::default());
        let s = editor.last_stats;
        assert_eq!(s.considered, 4);
        let out = editor.exec_console("cull").unwrap();
        assert_eq!(
            out,
            vec![format!("Culling: 4 considered, {} drawn, {} culled, 0 skipped", s.drawn, s.culled)]
        );
    }

    #[test]
    fn anim_requires_selection() {
        let mut editor = demo_editor();
        assert!(editor.exec_console("anim info").is_err());
    }

    #[test]
    fn destroy_clears_selection() {
        let mut editor = demo_editor();
        editor.exec_console("select prop_0").unwrap();
        let out = editor.exec_console("destroy").unwrap();
        assert_eq!(out, vec!["Destroyed prop_0"]);
        assert!(editor.selected.is_none());
        assert!(editor.scene.find("prop_0").is_none());
        assert!(editor.exec_console(&format!("destroy {}", EDITOR_CAMERA)).is_err());
    }

    #[test]
    fn flying_moves_the_view() {
        let mut editor = Editor::new(EngineConfig::default());
        let before = editor.status().camera;
        editor.tick(0.1, &InputState::new(Keys::MOUSE_RIGHT | Keys::W, Vec2::default()));
        assert_ne!(editor.status().camera, before);
    }

    #[test]
    fn unknown_commands_reach_the_console() {
        let mut editor = Editor::new(EngineConfig::default());
        assert_eq!(editor.exec_console("frobnicate").unwrap(), vec!["Unknown command: frobnicate"]);
        assert_eq!(editor.exec_console("echo hi").unwrap(), vec!["hi"]);
        assert!(editor.exec_console("r_tick_hz 5").is_err());
    }

    #[test]
    fn mesh_bounds_follow_the_file() {
        let dir = tempfile::tempdir().unwrap();
        demo::write_demo_assets(dir.path()).unwrap();
        let config = EngineConfig {
            assets_dir: dir.path().to_path_buf(),
            ..EngineConfig::default()
        };
        let mut editor = Editor::new(config);
        let scene = demo::populate(&mut editor.scene, dir.path(), 1, 3);

        assert!(editor.fit_mesh_bounds(scene.hero).unwrap());
        let hero = editor.scene.get(scene.hero).unwrap();
        let mesh = hero.kind.mesh().unwrap();
        assert_eq!(mesh.bounding_box.extents, Vec3::splat(1.5));
        assert_eq!(mesh.box_offset, Vec3::ZERO);

        assert!(!editor.fit_mesh_bounds(scene.sun).unwrap());
    }

    #[test]
    fn quit_is_requested_not_forced() {
        let mut editor = Editor::new(EngineConfig::default());
        editor.exec_console("quit").unwrap();
        assert!(editor.quit_requested());
    }
}
