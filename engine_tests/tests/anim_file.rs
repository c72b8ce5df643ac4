use engine_core::anim::Animator;
use engine_core::anim_io;
use engine_tests::{init_tracing, numbered_clip};

const TIMES: [f64; 4] = [0.0, 0.5, 1.0, 1.5];

fn write_walk(dir: &std::path::Path) -> anyhow::Result<()> {
    let (bind_pose, clip) = numbered_clip(&TIMES, 2.0, 2);
    anim_io::save(&dir.join("walk.anim"), &bind_pose, &clip)
}

/// Plays a clip from disk and samples blended poses along the way.
#[test]
fn plays_and_blends_clip_from_disk() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;
    write_walk(dir.path())?;

    let mut animator = Animator::new();
    assert!(animator.play(dir.path(), "walk.anim"));
    assert_eq!(animator.duration(), 2.0);
    assert_eq!(animator.anim.bind_pose().joints[1].parent_index, 0);

    animator.update(0.25);
    let pose = animator.anim.lerp_keyframe(None).expect("pose");
    assert_eq!(pose.joints[0].transform[0], 0.5);

    animator.update(1.0);
    let pose = animator.anim.lerp_keyframe(None).expect("pose");
    assert_eq!(pose.time, 1.25);
    assert_eq!(pose.joints[1].transform[15], 2.5);

    // Past the end wraps to the start exactly.
    animator.update(1.0);
    assert_eq!(animator.anim.time, 0.0);
    Ok(())
}

/// On a frame boundary the blend weight is 1, so the pose is the next frame.
#[test]
fn pose_on_frame_time_is_next_frame() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write_walk(dir.path())?;

    let mut animator = Animator::new();
    animator.load(dir.path(), "walk.anim")?;
    let pose = animator.anim.lerp_keyframe(Some(1.0)).expect("pose");
    assert_eq!(pose.joints[0].transform[3], 3.0);
    Ok(())
}

/// Loading keeps the clip paused until play is requested.
#[test]
fn load_then_resume() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write_walk(dir.path())?;

    let mut animator = Animator::new();
    animator.load(dir.path(), "walk.anim")?;
    assert!(animator.ready());
    assert!(animator.paused());

    animator.update(1.0);
    assert_eq!(animator.anim.time, 0.0);

    // Empty file name resumes what is loaded.
    assert!(animator.play(dir.path(), ""));
    animator.anim.frame_jump(2);
    assert_eq!(animator.anim.time, 1.0);
    assert!(animator.pause());
    Ok(())
}

#[test]
fn missing_file_does_not_play() -> anyhow::Result<()> {
    init_tracing();
    let dir = tempfile::tempdir()?;

    let mut animator = Animator::new();
    assert!(!animator.play(dir.path(), "nope.anim"));
    assert!(!animator.ready());
    assert_eq!(animator.duration(), 0.0);
    assert!(!animator.pause());
    Ok(())
}

#[test]
fn truncated_file_is_rejected() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    write_walk(dir.path())?;
    let path = dir.path().join("walk.anim");
    let bytes = std::fs::read(&path)?;
    std::fs::write(&path, &bytes[..bytes.len() - 10])?;

    let mut animator = Animator::new();
    let err = animator.load(dir.path(), "walk.anim").unwrap_err();
    assert!(format!("{err:#}").contains("walk.anim"));
    assert!(!animator.ready());
    Ok(())
}
