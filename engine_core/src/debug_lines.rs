//! Debug line buffer.
//!
//! Collects colored line vertices (two per line) for one frame: node axes,
//! skeletons, box colliders and the ground grid. The buffer holds at most
//! [`MAX_LINE_VERTS`] vertices; lines past that are dropped and counted.

use serde::{Deserialize, Serialize};

use crate::anim::Joint;
use crate::geometry::Aabb;
use crate::math::{Vec3, Vec4};
use crate::scene::{Node, NodeKind};

pub const MAX_LINE_VERTS: usize = 4096;

pub const RED: Vec4 = Vec4::rgba(1.0, 0.0, 0.0, 1.0);
pub const GREEN: Vec4 = Vec4::rgba(0.0, 1.0, 0.0, 1.0);
pub const BLUE: Vec4 = Vec4::rgba(0.0, 0.0, 1.0, 1.0);
pub const WHITE: Vec4 = Vec4::rgba(1.0, 1.0, 1.0, 1.0);
pub const CAMERA_PINK: Vec4 = Vec4::rgba(0.96, 0.26, 0.78, 1.0);
pub const SUN_YELLOW: Vec4 = Vec4::rgba(0.96, 0.91, 0.26, 1.0);

const OBJECT_AXIS_LENGTH: f32 = 1.0;
const JOINT_AXIS_LENGTH: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct ColoredVertex {
    pub position: Vec3,
    pub color: Vec4,
}

/// How a node's axes are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawType {
    /// Forward red, up green, right blue.
    Object,
    /// All three axes pink.
    Camera,
    /// Right axis only, yellow.
    Directional,
    /// All three axes white.
    Point,
}

impl DrawType {
    pub fn for_kind(kind: &NodeKind) -> Self {
        match kind {
            NodeKind::Camera(_) => DrawType::Camera,
            NodeKind::DirectionalLight(_) => DrawType::Directional,
            NodeKind::PointLight(_) => DrawType::Point,
            _ => DrawType::Object,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DebugLines {
    verts: Vec<ColoredVertex>,
    dropped: usize,
}

impl DebugLines {
    pub fn new() -> Self {
        Self {
            verts: Vec::with_capacity(MAX_LINE_VERTS),
            dropped: 0,
        }
    }

    pub fn add_line(&mut self, a: Vec3, b: Vec3, color: Vec4) {
        self.add_line_gradient(a, b, color, color);
    }

    pub fn add_line_gradient(&mut self, a: Vec3, b: Vec3, color_a: Vec4, color_b: Vec4) {
        if self.verts.len() + 2 > MAX_LINE_VERTS {
            self.dropped += 1;
            return;
        }
        self.verts.push(ColoredVertex {
            position: a,
            color: color_a,
        });
        self.verts.push(ColoredVertex {
            position: b,
            color: color_b,
        });
    }

    /// Draws a visible node's basis vectors from its location.
    pub fn add_node(&mut self, node: &Node, draw_type: DrawType) {
        if !node.visible() {
            return;
        }
        let origin = node.location();
        let forward = origin + node.forward() * OBJECT_AXIS_LENGTH;
        let up = origin + node.up() * OBJECT_AXIS_LENGTH;
        let right = origin + node.right() * OBJECT_AXIS_LENGTH;

        match draw_type {
            DrawType::Object => {
                self.add_line(origin, forward, RED);
                self.add_line(origin, up, GREEN);
                self.add_line(origin, right, BLUE);
            }
            DrawType::Camera => {
                self.add_line(origin, forward, CAMERA_PINK);
                self.add_line(origin, up, CAMERA_PINK);
                self.add_line(origin, right, CAMERA_PINK);
            }
            DrawType::Directional => self.add_line(origin, right, SUN_YELLOW),
            DrawType::Point => {
                self.add_line(origin, forward, WHITE);
                self.add_line(origin, up, WHITE);
                self.add_line(origin, right, WHITE);
            }
        }
    }

    pub fn add_joint_transform(&mut self, joint: &Joint) {
        let origin = joint.translation();
        self.add_line(origin, origin + joint.forward() * JOINT_AXIS_LENGTH, RED);
        self.add_line(origin, origin + joint.up() * JOINT_AXIS_LENGTH, GREEN);
        self.add_line(origin, origin + joint.right() * JOINT_AXIS_LENGTH, BLUE);
    }

    /// Bone from every joint to its parent, plus the joint's axes. Roots and
    /// joints with an out-of-range parent are skipped.
    pub fn add_skeleton(&mut self, joints: &[Joint]) {
        for joint in joints {
            let Some(parent) = joint.parent().and_then(|p| joints.get(p)) else {
                continue;
            };
            self.add_line(joint.translation(), parent.translation(), WHITE);
            self.add_joint_transform(joint);
        }
    }

    /// Animated pose of a node whose animator is ready.
    pub fn add_animated_skeleton(&mut self, node: &Node) {
        let anim = &node.animator.anim;
        if !anim.ready() {
            return;
        }
        if let Some(pose) = anim.lerp_keyframe(None) {
            self.add_skeleton(&pose.joints);
        }
    }

    pub fn add_bind_pose_skeleton(&mut self, node: &Node) {
        let anim = &node.animator.anim;
        if anim.ready() {
            self.add_skeleton(&anim.bind_pose().joints);
        }
    }

    /// The twelve edges of `aabb`.
    pub fn add_box_collider(&mut self, aabb: &Aabb) {
        const EDGES: [(usize, usize); 12] = [
            (0, 1),
            (1, 2),
            (2, 3),
            (3, 0),
            (4, 5),
            (5, 6),
            (6, 7),
            (7, 4),
            (0, 4),
            (1, 5),
            (2, 6),
            (3, 7),
        ];
        let c = aabb.corners();
        for (a, b) in EDGES {
            self.add_line(c[a], c[b], WHITE);
        }
    }

    /// Ground grid on y = 0 centered on the origin, lines every 2 units.
    pub fn draw_grid(&mut self, size: i32, color: Vec4) {
        let offset = (size as f32 / 2.0).round();
        let size = size as f32;
        let mut x = 0.0f32;
        while x <= size {
            self.add_line(
                Vec3::new(x - offset, 0.0, -offset),
                Vec3::new(x - offset, 0.0, size - offset),
                color,
            );
            self.add_line(
                Vec3::new(-offset, 0.0, x - offset),
                Vec3::new(size - offset, 0.0, x - offset),
                color,
            );
            x += 2.0;
        }
    }

    pub fn clear(&mut self) {
        self.verts.clear();
        self.dropped = 0;
    }

    pub fn verts(&self) -> &[ColoredVertex] {
        &self.verts
    }

    pub fn len(&self) -> usize {
        self.verts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verts.is_empty()
    }

    pub fn capacity(&self) -> usize {
        MAX_LINE_VERTS
    }

    /// Lines rejected since the last clear because the buffer was full.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::{AnimClip, BindPose, Keyframe};
    use crate::math::Mat4;
    use crate::scene::{DirectionalLight, NodeKind};

    fn chain() -> Vec<Joint> {
        vec![
            Joint::new(Mat4::IDENTITY, -1),
            Joint::new(Mat4::from_translation(Vec3::new(0.0, 1.0, 0.0)), 0),
            Joint::new(Mat4::from_translation(Vec3::new(0.0, 2.0, 0.0)), 1),
            Joint::new(Mat4::from_translation(Vec3::new(0.0, 3.0, 0.0)), 7),
        ]
    }

    #[test]
    fn node_axes_by_draw_type() {
        let mut lines = DebugLines::new();
        let node = Node::new("n", NodeKind::Empty);
        lines.add_node(&node, DrawType::Object);
        assert_eq!(lines.len(), 6);
        assert_eq!(lines.verts()[1].position, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(lines.verts()[1].color, RED);

        lines.clear();
        let sun = Node::new("sun", NodeKind::DirectionalLight(DirectionalLight::default()));
        lines.add_node(&sun, DrawType::for_kind(&sun.kind));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines.verts()[1].position, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(lines.verts()[0].color, SUN_YELLOW);

        lines.clear();
        let mut hidden = Node::new("h", NodeKind::Empty);
        hidden.set_visible(false);
        lines.add_node(&hidden, DrawType::Object);
        assert!(lines.is_empty());
    }

    #[test]
    fn skeleton_skips_roots_and_bad_parents() {
        let mut lines = DebugLines::new();
        lines.add_skeleton(&chain());
        // Two bones, each with three joint axes.
        assert_eq!(lines.len(), 2 * (2 + 6));
        assert_eq!(lines.verts()[0].position, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(lines.verts()[1].position, Vec3::ZERO);
    }

    #[test]
    fn animated_skeleton_needs_ready_animator() {
        let mut lines = DebugLines::new();
        let mut node = Node::new("rig", NodeKind::Empty);
        lines.add_animated_skeleton(&node);
        assert!(lines.is_empty());

        let clip = AnimClip {
            duration: 1.0,
            frames: vec![Keyframe {
                time: 0.0,
                joints: chain(),
            }],
        };
        node.animator.anim.set("rig.anim", clip, 0.0, true);
        node.animator.anim.set_bind_pose(BindPose { joints: chain() });
        lines.add_animated_skeleton(&node);
        lines.add_bind_pose_skeleton(&node);
        assert_eq!(lines.len(), 2 * 2 * (2 + 6));
    }

    #[test]
    fn box_collider_has_twelve_edges() {
        let mut lines = DebugLines::new();
        lines.add_box_collider(&Aabb::new(Vec3::ZERO, Vec3::splat(1.0)));
        assert_eq!(lines.len(), 24);
        for pair in lines.verts().chunks(2) {
            let d = pair[1].position - pair[0].position;
            assert_eq!(d.abs().x + d.abs().y + d.abs().z, 2.0);
        }
    }

    #[test]
    fn grid_lines_every_two_units() {
        let mut lines = DebugLines::new();
        lines.draw_grid(10, WHITE);
        // x = 0, 2, ..., 10
        assert_eq!(lines.len(), 6 * 4);
        assert_eq!(lines.verts()[0].position, Vec3::new(-5.0, 0.0, -5.0));
        assert_eq!(lines.verts()[1].position, Vec3::new(-5.0, 0.0, 5.0));
    }

    #[test]
    fn full_buffer_drops_lines() {
        let mut lines = DebugLines::new();
        for _ in 0..(MAX_LINE_VERTS / 2 + 3) {
            lines.add_line(Vec3::ZERO, Vec3::ONE, WHITE);
        }
        assert_eq!(lines.len(), MAX_LINE_VERTS);
        assert_eq!(lines.dropped(), 3);
        lines.clear();
        assert_eq!(lines.dropped(), 0);
    }
}
