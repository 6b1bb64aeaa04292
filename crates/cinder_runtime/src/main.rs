//! Cinder Engine Runtime
//!
//! Loads settings, builds the headless demo scene and runs it for a bounded
//! number of frames.
//!
//! Usage: `cinder [settings.json]`

use anyhow::{Context, Result};
use cinder_render::HeadlessTarget;
use cinder_runtime::demo::{self, DemoWorld};
use cinder_runtime::Engine;
use cinder_services::Settings;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Frames to run when the settings do not say.
const DEFAULT_DEMO_FRAMES: u64 = 180;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("Cinder Engine v{}", cinder_core::VERSION);

    let settings_path = std::env::args_os().nth(1).map(PathBuf::from);
    let settings = Settings::load_or_default(settings_path.as_deref())
        .context("failed to load settings")?;

    let mut engine = Engine::new(&settings, DemoWorld::default(), HeadlessTarget::new());
    let scene = demo::build_scene(&mut engine).context("failed to build demo scene")?;

    let frames = settings.engine.max_frames.unwrap_or(DEFAULT_DEMO_FRAMES);
    let ran = engine.run(Some(frames)).context("engine loop failed")?;

    tracing::info!(
        "Ran {} frames: {} presented, {} draws, {} physics steps",
        ran,
        engine.target().frames(),
        engine.target().total_draws(),
        engine.physics().world().steps()
    );
    tracing::info!("{}", engine.stats());

    let (_, tail) = scene.chain;
    if engine.processes().arena().contains(tail) {
        tracing::info!("Process chain still running at exit");
    }

    engine.shutdown();
    Ok(())
}
