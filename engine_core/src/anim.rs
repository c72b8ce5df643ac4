//! Skeletal animation clips and playback.
//!
//! A clip is an ordered list of time-stamped, full-skeleton snapshots.
//! Sampling blends the two snapshots around a time by lerping every one of
//! the 16 transform elements independently; rotations are not slerped.
//!
//! Frame lookups return `None` when no clip frames are loaded. Seeks outside
//! the clip are ignored or clamped, never reported as errors.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::anim_io;
use crate::math::{fclamp, is_nearly_equal, Mat4, Vec3};

/// One joint of a skeleton snapshot.
///
/// `transform` is a row-major 4x4 matrix; `parent_index` is -1 for a root,
/// otherwise an index into the same joint array.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Joint {
    pub transform: [f32; 16],
    pub parent_index: i32,
}

impl Default for Joint {
    fn default() -> Self {
        Self {
            transform: Mat4::IDENTITY.to_array(),
            parent_index: -1,
        }
    }
}

impl Joint {
    pub fn new(transform: Mat4, parent_index: i32) -> Self {
        Self {
            transform: transform.to_array(),
            parent_index,
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_array(self.transform)
    }

    pub fn parent(&self) -> Option<usize> {
        usize::try_from(self.parent_index).ok()
    }

    pub fn right(&self) -> Vec3 {
        let t = &self.transform;
        Vec3::new(t[0], t[1], t[2])
    }

    pub fn up(&self) -> Vec3 {
        let t = &self.transform;
        Vec3::new(t[4], t[5], t[6])
    }

    pub fn forward(&self) -> Vec3 {
        let t = &self.transform;
        Vec3::new(t[8], t[9], t[10])
    }

    pub fn translation(&self) -> Vec3 {
        let t = &self.transform;
        Vec3::new(t[12], t[13], t[14])
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f64,
    pub joints: Vec<Joint>,
}

/// Times compare within 0.01s; joints compare exactly.
impl PartialEq for Keyframe {
    fn eq(&self, other: &Self) -> bool {
        is_nearly_equal(self.time, other.time, 0.01) && self.joints == other.joints
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimClip {
    pub duration: f64,
    pub frames: Vec<Keyframe>,
}

/// Rest pose: the inverse bind-time world transform of every joint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindPose {
    pub joints: Vec<Joint>,
}

/// Playback state for one clip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Animation {
    file_path: String,
    clip: AnimClip,
    bind_pose: BindPose,
    ready: bool,
    paused: bool,
    /// Playback position in seconds.
    pub time: f64,
}

impl Default for Animation {
    fn default() -> Self {
        Self {
            file_path: String::new(),
            clip: AnimClip::default(),
            bind_pose: BindPose::default(),
            ready: false,
            paused: true,
            time: 0.0,
        }
    }
}

impl Animation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a clip. The animation becomes ready when `file` is non-empty.
    pub fn set(&mut self, file: &str, clip: AnimClip, time: f64, paused: bool) {
        self.file_path = file.to_string();
        self.clip = clip;
        self.time = time;
        self.paused = paused;
        if !self.file_path.is_empty() {
            self.ready = true;
        }
    }

    pub fn set_bind_pose(&mut self, bind_pose: BindPose) {
        self.bind_pose = bind_pose;
    }

    pub fn ready(&self) -> bool {
        !self.file_path.is_empty() && self.ready
    }

    pub fn file(&self) -> &str {
        &self.file_path
    }

    pub fn clip(&self) -> &AnimClip {
        &self.clip
    }

    pub fn bind_pose(&self) -> &BindPose {
        &self.bind_pose
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn frame_count(&self) -> usize {
        self.clip.frames.len()
    }

    /// Clip duration, or 0 when nothing is loaded.
    pub fn duration(&self) -> f64 {
        if self.file_path.is_empty() {
            0.0
        } else {
            self.clip.duration
        }
    }

    pub fn play(&mut self) {
        if self.ready {
            self.paused = false;
        }
    }

    pub fn pause(&mut self) {
        if self.ready {
            self.paused = true;
        }
    }

    /// Advances playback. Passing the duration wraps to exactly 0, once.
    pub fn update(&mut self, dt: f64) {
        if self.paused {
            return;
        }
        self.time += dt;
        if self.time > self.duration() {
            self.time = 0.0;
        }
    }

    /// Frame index under the playback position (truncated proportional
    /// index, clamped to the clip).
    pub fn frame_at_current_time(&self) -> Option<usize> {
        let n = self.frame_count();
        if n == 0 {
            return None;
        }
        let scaled = (self.time as f32 / self.clip.duration as f32) * n as f32;
        Some(fclamp(scaled, 0.0, (n - 1) as f32) as usize)
    }

    /// Frame index for `time`, floored then clamped to the clip.
    pub fn frame_at_time(&self, time: f64) -> Option<usize> {
        let n = self.frame_count();
        if n == 0 {
            return None;
        }
        let scaled = ((time as f32 / self.clip.duration as f32) * n as f32).floor();
        Some(fclamp(scaled, 0.0, (n - 1) as f32) as usize)
    }

    /// Evenly spaced time for `frame`, clamped to `[0, duration]`.
    pub fn time_at_frame(&self, frame: i32) -> f64 {
        let n = self.frame_count();
        let duration = self.duration() as f32;
        if n < 2 {
            return 0.0;
        }
        let t = (frame as f32 / (n - 1) as f32) * duration;
        f64::from(fclamp(t, 0.0, duration))
    }

    pub fn keyframe(&self) -> Option<&Keyframe> {
        self.keyframe_at(self.frame_at_current_time()?)
    }

    pub fn keyframe_at_time(&self, time: f64) -> Option<&Keyframe> {
        self.keyframe_at(self.frame_at_time(time)?)
    }

    pub fn keyframe_at(&self, frame: usize) -> Option<&Keyframe> {
        self.clip.frames.get(frame)
    }

    /// The frame after the current one, saturating at the last frame.
    pub fn next_keyframe(&self) -> Option<&Keyframe> {
        self.next_keyframe_from(self.keyframe()?)
    }

    /// The frame after `from`, saturating at the last frame.
    pub fn next_keyframe_from(&self, from: &Keyframe) -> Option<&Keyframe> {
        let last = self.frame_count().checked_sub(1)?;
        let next = self.frame_at_time(from.time)? + 1;
        self.keyframe_at(next.min(last))
    }

    /// Index of a frame equal to `frame`.
    pub fn frame_of(&self, frame: &Keyframe) -> Option<usize> {
        self.clip.frames.iter().position(|f| f == frame)
    }

    /// Blended pose at `check_time`, or at the playback position when `None`.
    ///
    /// The blend weight is `clamp(1 - elapsed / span, 0, 1)` towards the next
    /// frame, where `elapsed` is the distance from the current frame's time.
    /// A zero span yields the current frame.
    pub fn lerp_keyframe(&self, check_time: Option<f64>) -> Option<Keyframe> {
        let time = check_time.unwrap_or(self.time);
        let current = self.keyframe_at_time(time)?;
        let next = self.next_keyframe_from(current)?;

        let elapsed = (time - current.time).abs() as f32;
        let span = if next.time >= current.time {
            (next.time - current.time).abs() as f32
        } else {
            (self.duration() - current.time).abs() as f32
        };

        let mut blend = fclamp(1.0 - elapsed / span, 0.0, 1.0);
        if blend.is_nan() {
            blend = 0.0;
        }

        let joints = current
            .joints
            .iter()
            .enumerate()
            .map(|(i, from)| {
                let to = next.joints.get(i).unwrap_or(from);
                let mut transform = [0.0f32; 16];
                for (x, out) in transform.iter_mut().enumerate() {
                    let a = from.transform[x];
                    *out = a + blend * (to.transform[x] - a);
                }
                Joint {
                    transform,
                    parent_index: from.parent_index,
                }
            })
            .collect();

        Some(Keyframe { time, joints })
    }

    /// Moves the playback position `num` frames from the current one.
    /// Targets outside the clip are ignored.
    pub fn frame_jump(&mut self, num: i32) {
        if !self.ready() {
            return;
        }
        let Some(current) = self.frame_at_current_time() else {
            return;
        };
        let next = current as i64 + i64::from(num);
        if let Some(frame) = usize::try_from(next).ok().and_then(|i| self.clip.frames.get(i)) {
            self.time = frame.time;
        }
    }

    /// Seeks to `frame / frame_count * duration` for `frame` in `0..=frame_count`.
    pub fn frame_set(&mut self, frame: i32) {
        let n = self.frame_count();
        if !self.ready() || n == 0 || frame < 0 || frame as usize > n {
            return;
        }
        self.time = (f64::from(frame) / n as f64) * self.duration();
    }

    /// Seeks to `time` if it lies within `[0, last frame time]`.
    pub fn time_set(&mut self, time: f64) {
        if !self.ready() {
            return;
        }
        let Some(last) = self.clip.frames.last() else {
            return;
        };
        if time >= 0.0 && time <= last.time {
            self.time = time.clamp(0.0, self.duration());
        }
    }
}

/// Owns a node's playback state and loads clips from the asset directory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Animator {
    pub anim: Animation,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, dt: f64) {
        self.anim.update(dt);
    }

    /// Plays `file`, loading it from `assets_dir` unless it is already the
    /// loaded clip. An empty `file` resumes whatever is loaded.
    ///
    /// Returns whether playback is running afterwards.
    pub fn play(&mut self, assets_dir: &Path, file: &str) -> bool {
        let loaded = self.anim.file();
        if file == loaded || (file.is_empty() && !loaded.is_empty()) {
            self.anim.play();
            return !self.anim.paused();
        }
        if file.is_empty() {
            return false;
        }

        match self.load(assets_dir, file) {
            Ok(()) => {
                self.anim.play();
                !self.anim.paused()
            }
            Err(e) => {
                warn!(file, error = %e, "animation load failed");
                false
            }
        }
    }

    /// Returns whether the animation is paused afterwards.
    pub fn pause(&mut self) -> bool {
        if self.anim.file().is_empty() {
            return false;
        }
        self.anim.pause();
        self.anim.paused()
    }

    pub fn paused(&self) -> bool {
        self.anim.paused()
    }

    pub fn ready(&self) -> bool {
        self.anim.ready()
    }

    /// Duration of the loaded clip; 0 when not ready.
    pub fn duration(&self) -> f64 {
        if self.ready() {
            self.anim.duration()
        } else {
            0.0
        }
    }

    /// Loads `file` (relative to `assets_dir`) into a paused animation.
    pub fn load(&mut self, assets_dir: &Path, file: &str) -> anyhow::Result<()> {
        let path = assets_dir.join(file);
        let (bind_pose, clip) = anim_io::load(&path)?;
        info!(
            file,
            frames = clip.frames.len(),
            joints = bind_pose.joints.len(),
            duration = clip.duration,
            "animation loaded"
        );
        self.anim.set_bind_pose(bind_pose);
        self.anim.set(file, clip, 0.0, true);
        debug!(file, "animation ready");
        Ok(())
    }
}
