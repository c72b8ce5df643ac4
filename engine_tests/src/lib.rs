//! Shared fixtures for the integration tests.

use engine_core::anim::{AnimClip, BindPose, Joint, Keyframe};
use engine_core::scene::{MeshComponent, NodeDesc, NodeId, NodeKind, Scene};

/// Installs a test-friendly subscriber once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Clip whose frame `k` has every joint matrix entry equal to `k`, which
/// makes blended values easy to read back.
pub fn numbered_clip(times: &[f64], duration: f64, joints: usize) -> (BindPose, AnimClip) {
    let joint = |value: f32, i: usize| Joint {
        transform: [value; 16],
        parent_index: i as i32 - 1,
    };
    let bind_pose = BindPose {
        joints: (0..joints).map(|i| joint(-1.0, i)).collect(),
    };
    let frames = times
        .iter()
        .enumerate()
        .map(|(k, &time)| Keyframe {
            time,
            joints: (0..joints).map(|i| joint(k as f32, i)).collect(),
        })
        .collect();
    (bind_pose, AnimClip { duration, frames })
}

/// Spawns a static mesh node and returns its handle.
pub fn spawn_prop(scene: &mut Scene, name: &str) -> NodeId {
    scene.spawn(NodeDesc::new(
        name,
        NodeKind::StaticMesh(MeshComponent::new(format!("{name}.mesh"))),
    ))
}
