//! Orrery binary: an animated solar system with orbit camera and bloom.
//!
//! Configuration is loaded from `config.ron` and can be overridden via CLI flags.
//! Run with `cargo run -p orrery-app -- --assets ./assets` to open the viewer.
//! Run with `cargo run -p orrery-app -- --headless-frames 600` to simulate
//! ten seconds without a window and log body positions.

use std::process::ExitCode;

use clap::Parser;
use orrery_app::{AppState, run};
use orrery_config::{CliArgs, Config, default_config_dir};
use orrery_scene::{HeadlessSession, SceneBuilder};
use tracing::{error, info};

/// Simulated frame step for headless runs.
const HEADLESS_DT: f64 = 1.0 / 60.0;

fn main() -> ExitCode {
    let args = CliArgs::parse();

    // Resolve config directory
    let config_dir = match args.config.clone() {
        Some(dir) => dir,
        None => match default_config_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("Failed to resolve config directory: {e}");
                return ExitCode::FAILURE;
            }
        },
    };

    // Load or create config, then apply CLI overrides
    let file_config = Config::load_or_create(&config_dir).unwrap_or_else(|e| {
        eprintln!("Failed to load config: {e}, using defaults");
        Config::default()
    });
    let mut config = file_config.clone();
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    orrery_log::init_logging(Some(&log_dir), cfg!(debug_assertions), Some(&config));
    info!(
        config_dir = %config_dir.display(),
        asset_dir = %config.scene.asset_dir.display(),
        "Orrery starting"
    );

    if let Some(frames) = args.headless_frames {
        // Positions do not depend on image data, so headless runs work
        // without the asset directory.
        let scene = match SceneBuilder::from_config(&config)
            .require_textures(false)
            .build()
        {
            Ok(scene) => scene,
            Err(e) => {
                error!("Scene construction failed: {e}");
                return ExitCode::FAILURE;
            }
        };
        let mut session = HeadlessSession::new(scene, config.debug.log_positions_every);
        session.run(frames, HEADLESS_DT);
        return ExitCode::SUCCESS;
    }

    let scene = match SceneBuilder::from_config(&config).build() {
        Ok(scene) => scene,
        Err(e) => {
            error!("Scene construction failed: {e}");
            return ExitCode::FAILURE;
        }
    };

    let app = AppState::new(config, scene).with_hot_reload(config_dir, file_config, args);
    match run(app) {
        Ok(()) => {
            info!("Orrery exited");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Orrery exited with error: {e}");
            ExitCode::FAILURE
        }
    }
}
