//! Scene nodes and the transform hierarchy.
//!
//! Nodes live in a [`Scene`] arena and are addressed by generational
//! [`NodeId`] handles. Each node has a world transform (plus a projection
//! slot used by cameras) and a local transform relative to its parent.
//!
//! - Unattached nodes: the world transform is authoritative.
//! - Attached nodes: `world = local * parent.world`, recomputed by
//!   [`Scene::refresh_local_location`] and once per [`Scene::update`].
//!
//! `update` walks nodes in spawn order. Parents spawned after their
//! children are one tick behind; there is no ordering solver.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::anim::Animator;
use crate::geometry::{Aabb, View};
use crate::math::{degrees_to_radians, Mat4, Quat, Vec3, Vec4};

/// Handle to a node in a [`Scene`]. Stale after the node is destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// Identifies the input controller possessing a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ControllerId(pub u32);

bitflags::bitflags! {
    /// Node control flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NodeFlags: u32 {
        const VISIBLE = 1 << 0;         // Drawn at all
        const HIDDEN_IN_GAME = 1 << 1;  // Drawn in debug state only
        const INPUT = 1 << 2;           // Reads controller input
        const MOVEMENT = 1 << 3;
        const ROTATION = 1 << 4;
    }
}

impl Default for NodeFlags {
    fn default() -> Self {
        Self::VISIBLE
    }
}

pub const DEFAULT_MOVEMENT_SPEED: f32 = 11.0;
pub const DEFAULT_ROTATION_RATE: f32 = 4.5;

pub const CAMERA_DEFAULT_FOV: f32 = 90.0;
pub const CAMERA_DEFAULT_NEAR: f32 = 0.03;
pub const CAMERA_DEFAULT_FAR: f32 = 1000.0;
pub const CAMERA_ROTATION_SPEED: f32 = 0.003;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    /// Vertical field of view in degrees.
    pub field_of_view: f32,
    pub rotation_speed: f32,
    pub active: bool,
    pub active_on_start: bool,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            field_of_view: CAMERA_DEFAULT_FOV,
            rotation_speed: CAMERA_ROTATION_SPEED,
            active: false,
            active_on_start: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub color: Vec4,
    intensity: f32,
    pub radius: f32,
}

impl PointLight {
    /// `intensity` is clamped to `[0, 1]`.
    pub fn new(intensity: f32, radius: f32, color: Vec4) -> Self {
        Self {
            color,
            intensity: intensity.clamp(0.0, 1.0),
            radius,
        }
    }

    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    pub fn set_intensity(&mut self, intensity: f32) {
        self.intensity = intensity.clamp(0.0, 1.0);
    }
}

impl Default for PointLight {
    fn default() -> Self {
        Self::new(1.0, 10.0, Vec4::splat(1.0))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub color: Vec4,
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            color: Vec4::splat(1.0),
            intensity: 1.0,
        }
    }
}

/// Renderable mesh payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshComponent {
    /// Mesh file relative to the asset directory.
    pub asset: String,
    pub collision: bool,
    /// Box center relative to the node location.
    pub box_offset: Vec3,
    pub bounding_box: Aabb,
}

impl MeshComponent {
    pub fn new(asset: impl Into<String>) -> Self {
        Self {
            asset: asset.into(),
            ..Self::default()
        }
    }
}

impl Default for MeshComponent {
    fn default() -> Self {
        Self {
            asset: String::new(),
            collision: false,
            box_offset: Vec3::new(0.0, 2.0, 0.0),
            bounding_box: Aabb::new(Vec3::ZERO, Vec3::splat(2.0)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Empty,
    Camera(Camera),
    PointLight(PointLight),
    DirectionalLight(DirectionalLight),
    StaticMesh(MeshComponent),
    SkeletalMesh(MeshComponent),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Empty => "empty",
            NodeKind::Camera(_) => "camera",
            NodeKind::PointLight(_) => "point_light",
            NodeKind::DirectionalLight(_) => "directional_light",
            NodeKind::StaticMesh(_) => "static_mesh",
            NodeKind::SkeletalMesh(_) => "skeletal_mesh",
        }
    }

    pub fn is_light(&self) -> bool {
        matches!(self, NodeKind::PointLight(_) | NodeKind::DirectionalLight(_))
    }

    pub fn mesh(&self) -> Option<&MeshComponent> {
        match self {
            NodeKind::StaticMesh(m) | NodeKind::SkeletalMesh(m) => Some(m),
            _ => None,
        }
    }

    pub fn mesh_mut(&mut self) -> Option<&mut MeshComponent> {
        match self {
            NodeKind::StaticMesh(m) | NodeKind::SkeletalMesh(m) => Some(m),
            _ => None,
        }
    }
}

/// Applies yaw (y), pitch (x) then roll (z), each as `rotation * m`, keeping
/// the translation row where it started.
fn rotate_in_place(m: Mat4, direction: Vec3) -> Mat4 {
    let location = m.translation_part();
    let mut out = m;
    for rotation in [
        Mat4::rotation_y(direction.y),
        Mat4::rotation_x(direction.x),
        Mat4::rotation_z(direction.z),
    ] {
        out = rotation * out;
        out.set_row3(3, location);
    }
    out
}

fn diagonal(m: &Mat4) -> Vec3 {
    Vec3::new(m.m[0][0], m.m[1][1], m.m[2][2])
}

#[derive(Debug, Clone)]
pub struct Node {
    pub name: String,
    pub kind: NodeKind,
    /// World transform (`view`) and the camera projection slot.
    pub world: View,
    pub local: Mat4,
    pub flags: NodeFlags,
    pub movement_speed: f32,
    pub rotation_rate: f32,
    pub animator: Animator,
    parent: Option<NodeId>,
    controller: Option<ControllerId>,
}

impl Node {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        let mut world = View::default();
        if matches!(kind, NodeKind::Camera(_)) {
            let look = Mat4::look_at_lh(Vec3::new(0.0, 15.0, -15.0), Vec3::ZERO, Vec3::Y);
            world.view = look.inverse().unwrap_or(Mat4::IDENTITY);
        }
        Self {
            name: name.into(),
            kind,
            world,
            local: Mat4::IDENTITY,
            flags: NodeFlags::VISIBLE,
            movement_speed: DEFAULT_MOVEMENT_SPEED,
            rotation_rate: DEFAULT_ROTATION_RATE,
            animator: Animator::new(),
            parent: None,
            controller: None,
        }
    }

    pub fn world_matrix(&self) -> &Mat4 {
        &self.world.view
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn controller(&self) -> Option<ControllerId> {
        self.controller
    }

    pub fn location(&self) -> Vec3 {
        self.world.view.translation_part()
    }

    pub fn local_location(&self) -> Vec3 {
        self.local.translation_part()
    }

    pub fn rotation(&self) -> Quat {
        self.world.view.decompose().1
    }

    /// Diagonal of the world transform.
    pub fn scale(&self) -> Vec3 {
        diagonal(&self.world.view)
    }

    /// Diagonal of the local transform. Z is read from `[2][2]`; the
    /// homogeneous `[3][3]` slot is always 1 and is not a scale.
    pub fn local_scale(&self) -> Vec3 {
        diagonal(&self.local)
    }

    pub fn right(&self) -> Vec3 {
        self.world.view.row3(0)
    }

    pub fn up(&self) -> Vec3 {
        self.world.view.row3(1)
    }

    pub fn forward(&self) -> Vec3 {
        self.world.view.row3(2)
    }

    /// Translates in the node's own frame.
    pub fn add_movement_input(&mut self, direction: Vec3) {
        self.world.view = Mat4::from_translation(direction) * self.world.view;
    }

    pub fn add_rotation_input(&mut self, direction: Vec3) {
        self.world.view = rotate_in_place(self.world.view, direction);
    }

    pub fn set_location(&mut self, location: Vec3) {
        self.world.view.set_row3(3, location);
    }

    /// Overwrites the world diagonal.
    pub fn set_scale(&mut self, scale: Vec3) {
        self.world.view.m[0][0] = scale.x;
        self.world.view.m[1][1] = scale.y;
        self.world.view.m[2][2] = scale.z;
    }

    pub fn scale_object(&mut self, scale: Vec3) {
        self.world.view = self.world.view * Mat4::from_scale(scale);
    }

    pub fn visible(&self) -> bool {
        self.flags.contains(NodeFlags::VISIBLE)
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.flags.set(NodeFlags::VISIBLE, visible);
    }

    pub fn toggle_visibility(&mut self) {
        self.flags.toggle(NodeFlags::VISIBLE);
    }

    pub fn hidden_in_game(&self) -> bool {
        self.flags.contains(NodeFlags::HIDDEN_IN_GAME)
    }

    pub fn set_hidden_in_game(&mut self, hidden: bool) {
        self.flags.set(NodeFlags::HIDDEN_IN_GAME, hidden);
    }

    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.flags.set(NodeFlags::INPUT, enabled);
    }

    /// Movement and rotation toggle together.
    pub fn set_movement_enabled(&mut self, enabled: bool) {
        self.flags.set(NodeFlags::MOVEMENT | NodeFlags::ROTATION, enabled);
    }

    pub fn input_enabled(&self) -> bool {
        self.flags.contains(NodeFlags::INPUT | NodeFlags::MOVEMENT)
    }

    pub fn movement_enabled(&self) -> bool {
        self.flags.contains(NodeFlags::MOVEMENT)
    }

    pub fn rotation_enabled(&self) -> bool {
        self.flags.contains(NodeFlags::ROTATION)
    }

    pub fn possess_controller(&mut self, controller: ControllerId, activate: bool) {
        self.controller = Some(controller);
        if activate {
            self.set_input_enabled(true);
        }
    }

    pub fn camera(&self) -> Option<&Camera> {
        match &self.kind {
            NodeKind::Camera(c) => Some(c),
            _ => None,
        }
    }

    pub fn camera_mut(&mut self) -> Option<&mut Camera> {
        match &mut self.kind {
            NodeKind::Camera(c) => Some(c),
            _ => None,
        }
    }

    /// Activates or deactivates a camera. Deactivating revokes input.
    pub fn set_camera_active(&mut self, active: bool) {
        let Some(camera) = self.camera_mut() else {
            return;
        };
        camera.active = active;
        if !active {
            self.flags
                .remove(NodeFlags::INPUT | NodeFlags::MOVEMENT | NodeFlags::ROTATION);
        }
    }

    /// Rebuilds a camera's projection slot. Returns false for non-cameras.
    pub fn refresh_aspect_ratio(&mut self, aspect: f32, near: f32, far: f32) -> bool {
        let Some(fov) = self.camera().map(|c| c.field_of_view) else {
            return false;
        };
        self.world.projection =
            Mat4::perspective_fov_lh(degrees_to_radians(fov), aspect, near, far);
        true
    }

    /// Centers the mesh bounding box on `location + box_offset`.
    pub fn place_bounding_box(&mut self) {
        let location = self.location();
        if let Some(mesh) = self.kind.mesh_mut() {
            mesh.bounding_box.center = location + mesh.box_offset;
        }
    }

    fn refresh_with(&mut self, parent_world: Option<Mat4>) {
        if let Some(parent_world) = parent_world {
            self.world.view = self.local * parent_world;
        }
    }

    fn teardown(&mut self) {
        self.set_input_enabled(false);
        self.controller = None;
        self.parent = None;
        self.set_movement_enabled(false);
    }
}

/// Spawn parameters.
#[derive(Debug, Clone)]
pub struct NodeDesc {
    pub name: String,
    pub kind: NodeKind,
    pub parent: Option<NodeId>,
    pub scale: Vec3,
    pub visible: bool,
    /// Enables input, movement and rotation.
    pub input: bool,
}

impl NodeDesc {
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            parent: None,
            scale: Vec3::ONE,
            visible: true,
            input: false,
        }
    }

    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_input(mut self, input: bool) -> Self {
        self.input = input;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }
}

#[derive(Debug, Clone, Default)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Node arena plus per-kind indices.
#[derive(Debug, Default)]
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    order: Vec<NodeId>,
    cameras: Vec<NodeId>,
    lights: Vec<NodeId>,
    meshes: Vec<NodeId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a node: identity transforms (cameras start at their default
    /// eye), optional attachment, then the initial scale on both world and
    /// local transforms.
    pub fn spawn(&mut self, desc: NodeDesc) -> NodeId {
        let mut node = Node::new(desc.name, desc.kind);
        node.set_visible(desc.visible);
        if desc.input {
            node.flags
                .insert(NodeFlags::INPUT | NodeFlags::MOVEMENT | NodeFlags::ROTATION);
        }

        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        };

        self.order.push(id);
        if let Some(node) = self.get(id) {
            match &node.kind {
                NodeKind::Camera(_) => self.cameras.push(id),
                NodeKind::PointLight(_) | NodeKind::DirectionalLight(_) => self.lights.push(id),
                NodeKind::StaticMesh(_) | NodeKind::SkeletalMesh(_) => self.meshes.push(id),
                NodeKind::Empty => {}
            }
        }

        if let Some(parent) = desc.parent {
            self.attach_to_object(id, parent);
        }
        if let Some(node) = self.get_mut(id) {
            node.scale_object(desc.scale);
        }
        self.scale_object_locally(id, desc.scale);

        debug!(index = id.index, generation = id.generation, "node spawned");
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        let slot = self.slots.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_ref()
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.node.as_mut()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Live node ids in spawn order.
    pub fn ids(&self) -> &[NodeId] {
        &self.order
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> + '_ {
        self.order
            .iter()
            .filter_map(move |id| self.get(*id).map(|n| (*id, n)))
    }

    pub fn cameras(&self) -> &[NodeId] {
        &self.cameras
    }

    pub fn lights(&self) -> &[NodeId] {
        &self.lights
    }

    pub fn meshes(&self) -> &[NodeId] {
        &self.meshes
    }

    /// First camera flagged active.
    pub fn active_camera(&self) -> Option<NodeId> {
        self.cameras
            .iter()
            .copied()
            .find(|id| self.get(*id).and_then(Node::camera).is_some_and(|c| c.active))
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.iter().find(|(_, n)| n.name == name).map(|(id, _)| id)
    }

    /// World transform of `id`'s parent, if it has a live one.
    pub fn parent_world(&self, id: NodeId) -> Option<Mat4> {
        let parent = self.get(id)?.parent?;
        self.get(parent).map(|p| p.world.view)
    }

    /// Recomputes `world = local * parent.world`. No-op when unattached.
    pub fn refresh_local_location(&mut self, id: NodeId) {
        let parent_world = self.parent_world(id);
        if let Some(node) = self.get_mut(id) {
            node.refresh_with(parent_world);
        }
    }

    fn modify_local(&mut self, id: NodeId, f: impl FnOnce(&mut Mat4)) -> bool {
        let parent_world = self.parent_world(id);
        let Some(node) = self.get_mut(id) else {
            return false;
        };
        f(&mut node.local);
        node.refresh_with(parent_world);
        true
    }

    /// `local = local * T(direction)`, then refresh.
    pub fn add_local_movement_input(&mut self, id: NodeId, direction: Vec3) -> bool {
        self.modify_local(id, |local| *local = *local * Mat4::from_translation(direction))
    }

    pub fn add_local_rotation_input(&mut self, id: NodeId, direction: Vec3) -> bool {
        self.modify_local(id, |local| *local = rotate_in_place(*local, direction))
    }

    pub fn set_local_location(&mut self, id: NodeId, location: Vec3) -> bool {
        self.modify_local(id, |local| local.set_row3(3, location))
    }

    pub fn scale_object_locally(&mut self, id: NodeId, scale: Vec3) -> bool {
        self.modify_local(id, |local| *local = *local * Mat4::from_scale(scale))
    }

    /// Parents `child` to `parent`, revoking the child's input, movement and
    /// rotation. Returns false if either handle is stale or they are equal.
    pub fn attach_to_object(&mut self, child: NodeId, parent: NodeId) -> bool {
        if child == parent || !self.contains(parent) {
            return false;
        }
        let Some(node) = self.get_mut(child) else {
            return false;
        };
        node.parent = Some(parent);
        node.set_input_enabled(false);
        node.set_movement_enabled(false);
        self.refresh_local_location(child);
        debug!(child = child.index, parent = parent.index, "node attached");
        true
    }

    /// Clears the parent. The world transform keeps its last derived value.
    pub fn detach(&mut self, child: NodeId) -> bool {
        match self.get_mut(child) {
            Some(node) => node.parent.take().is_some(),
            None => false,
        }
    }

    /// Tears the node down and invalidates its handle. Children are kept;
    /// their parent handle goes stale and resolves to unattached.
    pub fn destroy(&mut self, id: NodeId) -> Option<Node> {
        let slot = self.slots.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        let mut node = slot.node.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);

        node.teardown();
        for list in [
            &mut self.order,
            &mut self.cameras,
            &mut self.lights,
            &mut self.meshes,
        ] {
            list.retain(|n| *n != id);
        }
        debug!(index = id.index, name = %node.name, "node destroyed");
        Some(node)
    }

    /// Per-node tick in spawn order: animation, hierarchy refresh, then
    /// bounding box placement.
    pub fn update(&mut self, dt: f32) {
        for i in 0..self.order.len() {
            let id = self.order[i];
            let parent_world = self.parent_world(id);
            if let Some(node) = self.get_mut(id) {
                node.animator.update(f64::from(dt));
                node.refresh_with(parent_world);
                node.place_bounding_box();
            }
        }
    }
}
