//! Input handling.
//!
//! In a real editor this would integrate with windowing and raw
//! mouse/keyboard polling. Here input is a sampled per-tick snapshot that the
//! fly-camera controls consume.

use engine_core::math::{Vec2, Vec3};
use engine_core::scene::Node;

bitflags::bitflags! {
    /// Buttons held during a tick.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Keys: u32 {
        const MOUSE_RIGHT = 1 << 0;
        const W = 1 << 1;
        const A = 1 << 2;
        const S = 1 << 3;
        const D = 1 << 4;
        const Q = 1 << 5;
        const E = 1 << 6;
        const WHEEL_UP = 1 << 7;
        const WHEEL_DOWN = 1 << 8;
    }
}

impl Keys {
    /// Parses `+`-separated key names, e.g. `rmb+w+d`. Unknown names are
    /// ignored.
    pub fn parse(s: &str) -> Self {
        s.split('+')
            .map(|k| match k.trim().to_ascii_lowercase().as_str() {
                "rmb" | "mouse_right" => Keys::MOUSE_RIGHT,
                "w" => Keys::W,
                "a" => Keys::A,
                "s" => Keys::S,
                "d" => Keys::D,
                "q" => Keys::Q,
                "e" => Keys::E,
                "wheel_up" => Keys::WHEEL_UP,
                "wheel_down" => Keys::WHEEL_DOWN,
                _ => Keys::empty(),
            })
            .fold(Keys::empty(), |acc, k| acc | k)
    }
}

/// User input state at a moment in time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputState {
    pub keys: Keys,
    /// Mouse movement since the previous tick, in pixels.
    pub mouse_delta: Vec2,
}

impl InputState {
    pub fn new(keys: Keys, mouse_delta: Vec2) -> Self {
        Self { keys, mouse_delta }
    }

    pub fn is_down(&self, keys: Keys) -> bool {
        self.keys.contains(keys)
    }
}

const MIN_FLY_SPEED: f32 = 2.0;
const MAX_FLY_SPEED: f32 = 100.0;
const WHEEL_SPEED_RATE: f32 = 15.0;
const WHEEL_DOLLY_FACTOR: f32 = 0.25;

/// Fly-camera controls. Only nodes possessed by a controller respond.
///
/// With the right mouse button held: mouse look, WASD moves, Q/E rise and
/// sink, and the wheel changes speed. Without it the wheel dollies forward
/// and back.
pub fn fly_camera(node: &mut Node, input: &InputState, dt: f32) {
    if node.controller().is_none() {
        return;
    }
    let Some(rotation_speed) = node.camera().map(|c| c.rotation_speed) else {
        return;
    };
    let step = node.movement_speed * dt;

    if input.is_down(Keys::MOUSE_RIGHT) {
        let delta = input.mouse_delta;
        if node.rotation_enabled() && (delta.x != 0.0 || delta.y != 0.0) {
            node.add_rotation_input(Vec3::new(
                delta.y * rotation_speed,
                delta.x * rotation_speed,
                0.0,
            ));
        }
        if !node.movement_enabled() {
            return;
        }

        if input.is_down(Keys::W) {
            node.add_movement_input(Vec3::new(0.0, 0.0, step));
        } else if input.is_down(Keys::S) {
            node.add_movement_input(Vec3::new(0.0, 0.0, -step));
        }
        if input.is_down(Keys::A) {
            node.add_movement_input(Vec3::new(-step, 0.0, 0.0));
        } else if input.is_down(Keys::D) {
            node.add_movement_input(Vec3::new(step, 0.0, 0.0));
        }

        if input.is_down(Keys::WHEEL_UP) {
            if node.movement_speed < MAX_FLY_SPEED {
                node.movement_speed += dt * WHEEL_SPEED_RATE;
            }
        } else if input.is_down(Keys::WHEEL_DOWN) && node.movement_speed > MIN_FLY_SPEED {
            node.movement_speed -= dt * WHEEL_SPEED_RATE;
        }

        if input.is_down(Keys::Q) {
            node.add_movement_input(Vec3::new(0.0, dt, 0.0));
        } else if input.is_down(Keys::E) {
            node.add_movement_input(Vec3::new(0.0, -dt, 0.0));
        }
    } else if node.movement_enabled() {
        let dolly = step * WHEEL_DOLLY_FACTOR;
        if input.is_down(Keys::WHEEL_UP) {
            node.add_movement_input(Vec3::new(0.0, 0.0, dolly));
        } else if input.is_down(Keys::WHEEL_DOWN) {
            node.add_movement_input(Vec3::new(0.0, 0.0, -dolly));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use engine_core::scene::{Camera, ControllerId, NodeFlags, NodeKind};

    fn possessed_camera() -> Node {
        let mut node = Node::new("cam", NodeKind::Camera(Camera::default()));
        node.flags = NodeFlags::VISIBLE | NodeFlags::INPUT | NodeFlags::MOVEMENT | NodeFlags::ROTATION;
        node.possess_controller(ControllerId(0), true);
        node
    }

    #[test]
    fn keys_parse() {
        assert_eq!(Keys::parse("rmb+w+d"), Keys::MOUSE_RIGHT | Keys::W | Keys::D);
        assert_eq!(Keys::parse("nope"), Keys::empty());
    }

    #[test]
    fn forward_moves_along_view() {
        let mut node = possessed_camera();
        let start = node.location();
        let forward = node.forward();
        fly_camera(&mut node, &InputState::new(Keys::MOUSE_RIGHT | Keys::W, Vec2::default()), 0.5);
        let moved = node.location() - start;
        let expected = forward * (11.0 * 0.5);
        assert!((moved - expected).length() < 1e-3, "{moved:?} vs {expected:?}");
    }

    #[test]
    fn no_controller_no_motion() {
        let mut node = Node::new("cam", NodeKind::Camera(Camera::default()));
        node.set_movement_enabled(true);
        let before = node.world;
        fly_camera(&mut node, &InputState::new(Keys::MOUSE_RIGHT | Keys::W, Vec2::new(5.0, 5.0)), 1.0);
        assert_eq!(node.world, before);
    }

    #[test]
    fn wheel_changes_speed_only_while_flying() {
        let mut node = possessed_camera();
        fly_camera(&mut node, &InputState::new(Keys::MOUSE_RIGHT | Keys::WHEEL_UP, Vec2::default()), 1.0);
        assert_eq!(node.movement_speed, 26.0);

        let start = node.location();
        fly_camera(&mut node, &InputState::new(Keys::WHEEL_DOWN, Vec2::default()), 1.0);
        assert_eq!(node.movement_speed, 26.0);
        assert!((node.location() - start).length() > 0.0);
    }
}
