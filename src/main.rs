//! Pong - headless rally on top of the scene graph
//!
//! Loads a scene description, builds the entity tree and runs a fixed number
//! of frames through the per-frame systems.

mod components;
mod settings;
mod systems;

use std::path::PathBuf;

use anyhow::{Context, Result};
use pong_scene::{ComponentRegistry, Scene, SceneDescription};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use settings::GameSettings;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    info!("Starting Pong...");

    let mut settings = GameSettings::load();
    if let Some(path) = std::env::args().nth(1) {
        settings.scene.path = PathBuf::from(path);
    }

    components::register_all(&ComponentRegistry::global());

    let path = &settings.scene.path;
    let description = SceneDescription::load(path)
        .with_context(|| format!("Failed to load scene description {}", path.display()))?;
    let scene = Scene::build(&description)
        .await
        .with_context(|| format!("Failed to build scene {}", path.display()))?;

    let schedule = systems::schedule(settings.simulation.frame_dt);
    info!(
        "Running {} frames at {:.4}s per frame",
        settings.simulation.frames, settings.simulation.frame_dt
    );
    for frame in 0..settings.simulation.frames {
        schedule
            .run(&scene)
            .await
            .with_context(|| format!("Frame {} failed", frame))?;
    }

    for (player, points) in systems::scores(&scene).await? {
        info!("{}: {}", player, points);
    }
    Ok(())
}
