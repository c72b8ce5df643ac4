//! Standalone editor binary.
//!
//! Usage:
//!   cargo run -p engine_editor -- [--config editor.json] [--assets-dir assets]
//!                                 [--state debug|test|ship] [--ticks N]
//!                                 [--props N] [--seed N] [--write-assets]
//!
//! Without `--ticks` the editor runs until `quit`, reading console commands
//! from stdin. With it, the editor runs N frames headless and prints status.
//!
//! Console commands:
//!   status [json]         - Show editor status
//!   nodes                 - List scene nodes
//!   select <node>         - Select a node by name
//!   anim <play|pause|step|frame|time|info> - Animation transport on selection
//!   attach <child> <parent> / detach [node] / destroy [node]
//!   teleport <x> <y> <z>  - Move the selection
//!   state <debug|test|ship> - Switch render state
//!   cull                  - Show last frame's culling counters
//!   quit                  - Exit editor

use std::env;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use engine_core::config::EngineConfig;
use engine_core::render::RenderState;
use engine_editor::demo;
use engine_editor::input::InputState;
use engine_editor::Editor;
use tokio::sync::mpsc;
use tracing::info;

struct Args {
    config: Option<PathBuf>,
    assets_dir: Option<PathBuf>,
    state: Option<String>,
    ticks: Option<u64>,
    props: usize,
    seed: u64,
    write_assets: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut out = Args {
        config: None,
        assets_dir: None,
        state: None,
        ticks: None,
        props: 24,
        seed: 1,
        write_assets: false,
    };
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                out.config = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--assets-dir" if i + 1 < args.len() => {
                out.assets_dir = Some(PathBuf::from(&args[i + 1]));
                i += 2;
            }
            "--state" if i + 1 < args.len() => {
                out.state = Some(args[i + 1].clone());
                i += 2;
            }
            "--ticks" if i + 1 < args.len() => {
                out.ticks = Some(args[i + 1].parse().context("--ticks")?);
                i += 2;
            }
            "--props" if i + 1 < args.len() => {
                out.props = args[i + 1].parse().context("--props")?;
                i += 2;
            }
            "--seed" if i + 1 < args.len() => {
                out.seed = args[i + 1].parse().context("--seed")?;
                i += 2;
            }
            "--write-assets" => {
                out.write_assets = true;
                i += 1;
            }
            _ => i += 1,
        }
    }
    Ok(out)
}

fn print_output(result: anyhow::Result<Vec<String>>) {
    match result {
        Ok(output) => {
            for line in output {
                println!("{}", line);
            }
        }
        Err(e) => {
            println!("Error: {:#}", e);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = parse_args()?;
    let mut cfg = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    if let Some(dir) = args.assets_dir {
        cfg.assets_dir = dir;
    }
    info!(assets_dir = %cfg.assets_dir.display(), "Starting editor");

    if args.write_assets {
        demo::write_demo_assets(&cfg.assets_dir)?;
    }

    let mut editor = Editor::new(cfg.clone());
    if let Some(state) = &args.state {
        editor.state = state.parse::<RenderState>()?;
    }
    let scene = demo::populate(&mut editor.scene, &cfg.assets_dir, args.props, args.seed);
    for id in std::iter::once(scene.hero).chain(scene.props.iter().copied()) {
        editor.fit_mesh_bounds(id)?;
    }
    editor.selected = Some(scene.hero);

    if let Some(ticks) = args.ticks {
        let stats = editor.run_for_ticks(ticks, InputState::default()).await;
        info!(
            ticks,
            drawn = stats.drawn,
            culled = stats.culled,
            "Headless run finished"
        );
        print_output(editor.exec_console("status"));
        return Ok(());
    }

    // Set up console input channel.
    let (console_tx, mut console_rx) = mpsc::channel::<String>(32);

    // Spawn stdin reader thread.
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("] ");
            let _ = stdout.flush();
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    println!("Editor ready. Type 'status' for info, 'quit' to exit.");
    println!();

    let dt = cfg.tick_dt();
    let tick_interval = Duration::from_secs_f32(dt);

    loop {
        // Process console commands.
        while let Ok(line) = console_rx.try_recv() {
            print_output(editor.exec_console(&line));
        }
        if editor.quit_requested() {
            break;
        }

        // No window, so no live input.
        let stats = editor.tick(dt, &InputState::default());
        if editor.tick_count() % 600 == 0 {
            info!(
                tick = editor.tick_count(),
                drawn = stats.drawn,
                culled = stats.culled,
                "Frame"
            );
        }

        tokio::time::sleep(tick_interval).await;
    }

    Ok(())
}
