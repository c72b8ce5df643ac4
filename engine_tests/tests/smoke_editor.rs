use engine_core::config::EngineConfig;
use engine_editor::demo;
use engine_editor::input::InputState;
use engine_editor::Editor;

/// Smoke test: the editor can run a few paced ticks over the demo scene.
#[tokio::test]
async fn editor_runs_few_ticks() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    demo::write_demo_assets(dir.path())?;
    let cfg = EngineConfig {
        tick_hz: 240,
        assets_dir: dir.path().to_path_buf(),
        ..EngineConfig::default()
    };

    let mut editor = Editor::new(cfg);
    let scene = demo::populate(&mut editor.scene, dir.path(), 8, 42);
    let stats = editor.run_for_ticks(5, InputState::default()).await;

    assert_eq!(editor.tick_count(), 5);
    assert_eq!(stats.considered, 1 + scene.props.len());
    assert_eq!(stats.drawn + stats.culled, stats.considered);

    let status = editor.exec_console("status json")?;
    assert!(status[0].contains("\"tick\":5"), "{status:?}");
    Ok(())
}
