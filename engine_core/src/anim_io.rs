//! Animation file codec.
//!
//! Little-endian, no header:
//!
//! ```text
//! u32 bind_joint_count
//! bind_joint_count x Joint
//! f64 duration
//! u32 frame_count
//! frame_count x (f64 time, u32 joint_count, joint_count x Joint)
//! ```
//!
//! A `Joint` is 16 `f32` (row-major transform) followed by an `i32` parent
//! index, 68 bytes in total.

use std::path::Path;

use anyhow::{bail, Context};
use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::anim::{AnimClip, BindPose, Joint, Keyframe};

pub const JOINT_SIZE: usize = 16 * 4 + 4;

/// Encodes a bind pose and clip.
pub fn encode(bind_pose: &BindPose, clip: &AnimClip) -> Bytes {
    let joints_total: usize = clip.frames.iter().map(|f| f.joints.len()).sum();
    let mut buf = BytesMut::with_capacity(
        4 + bind_pose.joints.len() * JOINT_SIZE
            + 12
            + clip.frames.len() * 12
            + joints_total * JOINT_SIZE,
    );

    put_joints(&mut buf, &bind_pose.joints);
    buf.put_f64_le(clip.duration);
    buf.put_u32_le(clip.frames.len() as u32);
    for frame in &clip.frames {
        buf.put_f64_le(frame.time);
        put_joints(&mut buf, &frame.joints);
    }
    buf.freeze()
}

/// Decodes a bind pose and clip, rejecting truncated input.
///
/// Trailing bytes after the last frame are ignored.
pub fn decode(data: &[u8]) -> anyhow::Result<(BindPose, AnimClip)> {
    let mut buf = data;

    let joints = get_joints(&mut buf).context("bind pose")?;
    let bind_pose = BindPose { joints };

    need(&buf, 12, "clip header")?;
    let duration = buf.get_f64_le();
    let frame_count = buf.get_u32_le() as usize;

    // Each frame needs at least its time and joint count.
    need(&buf, frame_count.saturating_mul(12), "frame table")?;
    let mut frames = Vec::with_capacity(frame_count);
    for i in 0..frame_count {
        need(&buf, 8, "frame time")?;
        let time = buf.get_f64_le();
        let joints = get_joints(&mut buf).with_context(|| format!("frame {}", i))?;
        frames.push(Keyframe { time, joints });
    }

    Ok((bind_pose, AnimClip { duration, frames }))
}

/// Reads an animation file.
pub fn load(path: &Path) -> anyhow::Result<(BindPose, AnimClip)> {
    let data = std::fs::read(path).with_context(|| format!("open {}", path.display()))?;
    decode(&data).with_context(|| format!("decode {}", path.display()))
}

/// Writes an animation file.
pub fn save(path: &Path, bind_pose: &BindPose, clip: &AnimClip) -> anyhow::Result<()> {
    std::fs::write(path, encode(bind_pose, clip))
        .with_context(|| format!("write {}", path.display()))
}

fn put_joints(buf: &mut BytesMut, joints: &[Joint]) {
    buf.put_u32_le(joints.len() as u32);
    for joint in joints {
        for v in joint.transform {
            buf.put_f32_le(v);
        }
        buf.put_i32_le(joint.parent_index);
    }
}

fn get_joints(buf: &mut &[u8]) -> anyhow::Result<Vec<Joint>> {
    need(buf, 4, "joint count")?;
    let count = buf.get_u32_le() as usize;
    need(buf, count.saturating_mul(JOINT_SIZE), "joints")?;

    let mut joints = Vec::with_capacity(count);
    for _ in 0..count {
        let mut transform = [0.0f32; 16];
        for v in &mut transform {
            *v = buf.get_f32_le();
        }
        let parent_index = buf.get_i32_le();
        joints.push(Joint {
            transform,
            parent_index,
        });
    }
    Ok(joints)
}

fn need(buf: &&[u8], len: usize, what: &str) -> anyhow::Result<()> {
    if buf.remaining() < len {
        bail!(
            "truncated animation data: {} needs {} bytes, {} left",
            what,
            len,
            buf.remaining()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Mat4, Vec3};

    fn sample() -> (BindPose, AnimClip) {
        let bind = BindPose {
            joints: vec![
                Joint::new(Mat4::IDENTITY, -1),
                Joint::new(Mat4::from_translation(Vec3::new(0.0, -1.0, 0.0)), 0),
            ],
        };
        let frames = (0..3)
            .map(|i| Keyframe {
                time: f64::from(i) / 3.0,
                joints: vec![
                    Joint::new(Mat4::rotation_y(0.1 * i as f32), -1),
                    Joint::new(Mat4::from_translation(Vec3::new(0.0, 1.0, 0.1 * i as f32)), 0),
                ],
            })
            .collect();
        (
            bind,
            AnimClip {
                duration: 1.0,
                frames,
            },
        )
    }

    #[test]
    fn layout_sizes() {
        let (bind, clip) = sample();
        let bytes = encode(&bind, &clip);
        let expected = 4 + 2 * JOINT_SIZE + 8 + 4 + 3 * (8 + 4 + 2 * JOINT_SIZE);
        assert_eq!(bytes.len(), expected);
        assert_eq!(&bytes[..4], &2u32.to_le_bytes());
    }

    #[test]
    fn decode_preserves_bits() {
        let (bind, clip) = sample();
        let (bind2, clip2) = decode(&encode(&bind, &clip)).unwrap();
        assert_eq!(bind2, bind);
        assert_eq!(clip2.duration.to_bits(), clip.duration.to_bits());
        for (a, b) in clip.frames.iter().zip(&clip2.frames) {
            assert_eq!(a.time.to_bits(), b.time.to_bits());
            assert_eq!(a.joints, b.joints);
        }
    }

    #[test]
    fn truncated_input_is_rejected() {
        let (bind, clip) = sample();
        let bytes = encode(&bind, &clip);
        for cut in [0, 3, 4 + JOINT_SIZE, bytes.len() - 1] {
            assert!(decode(&bytes[..cut]).is_err(), "cut at {cut}");
        }
    }

    #[test]
    fn save_then_load_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("walk.anim");
        let (bind, clip) = sample();

        save(&path, &bind, &clip).unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len() as usize, encode(&bind, &clip).len());
        let (bind2, clip2) = load(&path).unwrap();
        assert_eq!(bind2, bind);
        assert_eq!(clip2, clip);

        let err = load(&dir.path().join("missing.anim")).unwrap_err();
        assert!(format!("{err:#}").contains("missing.anim"));
    }

    #[test]
    fn huge_counts_fail_without_allocating() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(u32::MAX);
        let err = decode(&buf).unwrap_err();
        assert!(format!("{err:#}").contains("truncated"));
    }
}
