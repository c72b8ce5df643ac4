//! Demo content: procedural assets and a small scene to fly around in.

use std::path::Path;

use anyhow::Context;
use engine_core::anim::{AnimClip, BindPose, Joint, Keyframe};
use engine_core::anim_io;
use engine_core::math::{Mat4, Vec2, Vec3, Vec4, PI};
use engine_core::mesh::{MeshData, Vertex};
use engine_core::scene::{DirectionalLight, MeshComponent, NodeDesc, NodeId, NodeKind, PointLight, Scene};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

pub const WAVE_ANIM: &str = "wave.anim";
pub const CRATE_MESH: &str = "crate.mesh";
pub const HERO_MESH: &str = "hero.mesh";

const JOINT_SPACING: f32 = 0.5;
const WAVE_AMPLITUDE: f32 = 0.3;

/// A joint chain standing on the origin along +y, swaying about z.
///
/// Frame `k` sits at `k * duration / frames`, so every frame time maps back
/// onto its own index.
pub fn wave_clip(joints: usize, frames: usize, duration: f64) -> (BindPose, AnimClip) {
    let pose = |angle: f32| -> Vec<Joint> {
        (0..joints)
            .map(|i| {
                let height = Mat4::from_translation(Vec3::new(0.0, i as f32 * JOINT_SPACING, 0.0));
                let sway = Mat4::rotation_z(angle * i as f32);
                Joint::new(height * sway, i as i32 - 1)
            })
            .collect()
    };

    let bind_pose = BindPose { joints: pose(0.0) };
    let frames = (0..frames)
        .map(|k| {
            let phase = k as f32 / frames as f32;
            Keyframe {
                time: k as f64 * duration / frames as f64,
                joints: pose((phase * 2.0 * PI).sin() * WAVE_AMPLITUDE),
            }
        })
        .collect();

    (bind_pose, AnimClip { duration, frames })
}

/// Unit cube centered on the origin, one quad per face.
pub fn cube_mesh(half: f32) -> MeshData {
    let faces = [
        (Vec3::X, Vec3::Y),
        (-Vec3::X, Vec3::Y),
        (Vec3::Y, Vec3::Z),
        (-Vec3::Y, Vec3::Z),
        (Vec3::Z, Vec3::Y),
        (-Vec3::Z, Vec3::Y),
    ];

    let mut mesh = MeshData::default();
    for (normal, up) in faces {
        let side = up.cross(normal);
        let base = mesh.vertices.len() as u32;
        for (u, v) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            let position = (normal + side * (u * 2.0 - 1.0) + up * (v * 2.0 - 1.0)) * half;
            mesh.vertices.push(Vertex {
                position,
                normal,
                uv: Vec2::new(u, v),
                weights: Vec4::new(1.0, 0.0, 0.0, 0.0),
                joints: [0; 4],
            });
        }
        mesh.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    mesh
}

/// Writes the demo clip and meshes into `dir`.
pub fn write_demo_assets(dir: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;

    let (bind_pose, clip) = wave_clip(4, 24, 2.0);
    anim_io::save(&dir.join(WAVE_ANIM), &bind_pose, &clip)?;
    cube_mesh(1.0).save(&dir.join(CRATE_MESH))?;
    cube_mesh(1.5).save(&dir.join(HERO_MESH))?;

    info!(dir = %dir.display(), "demo assets written");
    Ok(())
}

/// Handles of the demo scene's fixed nodes.
#[derive(Debug, Clone)]
pub struct DemoScene {
    pub sun: NodeId,
    pub lamp: NodeId,
    pub hero: NodeId,
    pub hat: NodeId,
    pub props: Vec<NodeId>,
}

/// Populates `scene` with lights, an animated hero wearing a hat, and
/// `prop_count` crates scattered from `seed`.
///
/// The hero plays [`WAVE_ANIM`] from `assets_dir` when present, otherwise
/// an in-memory copy of the same clip.
pub fn populate(scene: &mut Scene, assets_dir: &Path, prop_count: usize, seed: u64) -> DemoScene {
    let sun = scene.spawn(NodeDesc::new(
        "sun",
        NodeKind::DirectionalLight(DirectionalLight::default()),
    ));
    if let Some(node) = scene.get_mut(sun) {
        node.set_location(Vec3::new(0.0, 50.0, 0.0));
        node.add_rotation_input(Vec3::new(PI / 4.0, 0.0, 0.0));
    }

    let lamp = scene.spawn(NodeDesc::new(
        "lamp",
        NodeKind::PointLight(PointLight::new(0.8, 15.0, Vec4::rgba(1.0, 0.85, 0.6, 1.0))),
    ));
    if let Some(node) = scene.get_mut(lamp) {
        node.set_location(Vec3::new(4.0, 6.0, 4.0));
    }

    let hero = scene.spawn(NodeDesc::new(
        "hero",
        NodeKind::SkeletalMesh(MeshComponent::new(HERO_MESH)),
    ));
    if let Some(node) = scene.get_mut(hero) {
        let animator = &mut node.animator;
        if !(assets_dir.join(WAVE_ANIM).is_file() && animator.play(assets_dir, WAVE_ANIM)) {
            let (bind_pose, clip) = wave_clip(4, 24, 2.0);
            animator.anim.set_bind_pose(bind_pose);
            animator.anim.set(WAVE_ANIM, clip, 0.0, false);
        }
    }

    let hat = scene.spawn(NodeDesc::new("hat", NodeKind::Empty).with_parent(hero));
    scene.set_local_location(hat, Vec3::new(0.0, 2.0, 0.0));

    let mut rng = StdRng::seed_from_u64(seed);
    let props = (0..prop_count)
        .map(|i| {
            let scale = rng.gen_range(0.5..2.0);
            let id = scene.spawn(
                NodeDesc::new(
                    format!("prop_{i}"),
                    NodeKind::StaticMesh(MeshComponent::new(CRATE_MESH)),
                )
                .with_scale(Vec3::splat(scale)),
            );
            let location = Vec3::new(rng.gen_range(-40.0..40.0), 0.0, rng.gen_range(-40.0..40.0));
            if let Some(node) = scene.get_mut(id) {
                node.set_location(location);
            }
            id
        })
        .collect();

    info!(nodes = scene.len(), prop_count, seed, "demo scene populated");
    DemoScene {
        sun,
        lamp,
        hero,
        hat,
        props,
    }
}
