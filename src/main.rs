//! chordmatch command line front-end
//!
//! Usage:
//!   chordmatch replay samples/scenarios/save_chord.yaml
//!   chordmatch check shortcuts.yaml
//!   chordmatch live --shortcuts my-shortcuts.yaml

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::ModifiersState;
use winit::window::{Window, WindowId};

use chordmatch::cli::{CliArgs, CliCommand};
use chordmatch::config::EngineConfig;
use chordmatch::replay;
use chordmatch::shortcuts::{
    load_shortcuts_file, parse_shortcuts_yaml, raw_event_from_winit, Command, Engine, Millis,
    ShortcutDef, Target,
};

/// Shortcut set used by `live` when no file is given or found
const DEFAULT_SHORTCUTS_YAML: &str = include_str!("../shortcuts.yaml");

// ============================================================================
// REPLAY / CHECK
// ============================================================================

fn run_replay(scenarios: &[PathBuf], json: bool, base: &EngineConfig) -> Result<()> {
    let mut failed = 0;

    for path in scenarios {
        let report = replay::run_file(path, base)
            .with_context(|| format!("replaying {}", path.display()))?;

        if json {
            println!("{}", serde_json::to_string_pretty(&report.fired)?);
        } else {
            let title = report.name.as_deref().unwrap_or("(unnamed)");
            println!("{} [{}]", title, path.display());
            if report.fired.is_empty() {
                println!("  nothing fired");
            }
            for fire in &report.fired {
                println!("  {}", fire);
            }
        }

        let problems = report.mismatches();
        if !problems.is_empty() {
            failed += 1;
            eprintln!("{}: expectation mismatch", path.display());
            for problem in problems {
                eprintln!("  {}", problem);
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} scenario(s) failed", failed, scenarios.len());
    }
    Ok(())
}

fn run_check(file: &Path) -> Result<()> {
    let defs = load_shortcuts_file(file).with_context(|| format!("checking {}", file.display()))?;

    for def in &defs {
        println!("{:<24} {:>4}  {}", def.label(), def.priority, def.predicate);
    }
    println!("{} shortcut(s) OK", defs.len());
    Ok(())
}

// ============================================================================
// LIVE - winit window feeding the engine
// ============================================================================

struct LiveApp {
    window: Option<Window>,
    engine: Engine,
    started: Instant,
    modifiers: ModifiersState,
}

impl LiveApp {
    fn new(engine: Engine) -> Self {
        Self {
            window: None,
            engine,
            started: Instant::now(),
            modifiers: ModifiersState::empty(),
        }
    }

    fn now(&self) -> Millis {
        self.started.elapsed().as_millis() as Millis
    }
}

impl ApplicationHandler for LiveApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window_attributes = Window::default_attributes()
            .with_title("chordmatch - press some keys")
            .with_inner_size(LogicalSize::new(480, 240));

        match event_loop.create_window(window_attributes) {
            Ok(window) => self.window = Some(window),
            Err(e) => {
                tracing::error!("Failed to create window: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Focused(focused) => {
                // Keys pressed in other windows are not ours
                let target = focused.then(|| Target::new("live"));
                self.engine.set_target(target);
            }
            WindowEvent::ModifiersChanged(mods) => {
                self.modifiers = mods.state();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if event.repeat {
                    return;
                }
                let raw = raw_event_from_winit(&event.logical_key, event.state, self.modifiers);
                self.engine.handle_event(&raw, self.now());
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        self.engine.poll(self.now());

        // Sleep until the next batch or idle deadline instead of spinning
        match self.engine.next_deadline() {
            Some(deadline) => event_loop.set_control_flow(ControlFlow::WaitUntil(
                self.started + Duration::from_millis(deadline),
            )),
            None => event_loop.set_control_flow(ControlFlow::Wait),
        }
    }
}

fn live_shortcuts(explicit: Option<&Path>) -> Result<Vec<ShortcutDef>> {
    if let Some(path) = explicit {
        return load_shortcuts_file(path).with_context(|| format!("loading {}", path.display()));
    }

    if let Some(path) = chordmatch::config_paths::shortcuts_file().filter(|p| p.exists()) {
        match load_shortcuts_file(&path) {
            Ok(defs) => return Ok(defs),
            Err(e) => tracing::warn!("Ignoring {}: {}", path.display(), e),
        }
    }

    parse_shortcuts_yaml(DEFAULT_SHORTCUTS_YAML).context("parsing built-in shortcuts")
}

fn run_live(shortcuts: Option<&Path>, config: &EngineConfig) -> Result<()> {
    let defs = live_shortcuts(shortcuts)?;
    println!("Listening for {} shortcut(s); close the window to quit", defs.len());

    let commands: Vec<Command> = defs
        .into_iter()
        .map(|def| {
            let label = def.label().to_string();
            def.into_command(move |event| {
                println!(
                    "{:>8}ms  {}  ({})",
                    event.timestamp,
                    label,
                    event.display_string()
                )
            })
        })
        .collect();

    let engine = Engine::new(config).with_target(Target::new("live"));
    engine.register_commands(commands, Some("live"));

    let event_loop = EventLoop::new()?;
    let mut app = LiveApp::new(engine);
    event_loop.run_app(&mut app)?;

    app.engine.dispose();
    Ok(())
}

// ============================================================================
// MAIN - Entry point
// ============================================================================

fn main() -> Result<()> {
    let args = CliArgs::parse();
    chordmatch::tracing::init(args.verbose);

    let config = args.engine_config();
    tracing::debug!(?config, "engine config");

    match &args.command {
        CliCommand::Replay { scenarios, json } => run_replay(scenarios, *json, &config),
        CliCommand::Check { file } => run_check(file),
        CliCommand::Live { shortcuts } => run_live(shortcuts.as_deref(), &config),
    }
}
