//! Headless engine binary for the Haven simulation.
//!
//! Loads configuration, builds the simulation from the built-in content,
//! resumes from the save file when one exists, and runs the frame loop
//! with the autopilot player until the frame limit or Ctrl-C. The game is
//! saved on the way out.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `HAVEN_CONFIG` or `haven-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the simulation from the built-in content
//! 4. Resume from the save file, if present
//! 5. Register the log listener and apply the time-scale boost
//! 6. Run the frame loop
//! 7. Save and log the result

mod autopilot;
mod error;
mod log_listener;
mod runner;

use std::path::{Path, PathBuf};

use haven_core::{GameContent, LogFormat, LoggingConfig, Simulation, SimulationConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::autopilot::Autopilot;
use crate::error::EngineError;
use crate::log_listener::LogListener;

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "haven-config.yaml";

/// Environment variable overriding the configuration path.
const CONFIG_PATH_ENV: &str = "HAVEN_CONFIG";

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if any initialization step, the frame loop, or the
/// final save fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let (config, config_path) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!("haven-engine starting");
    match &config_path {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        world_name = config.world.name,
        seed = config.world.seed,
        real_seconds_per_game_hour = config.time.real_seconds_per_game_hour,
        frame_ms = config.engine.frame_ms,
        "Configuration ready"
    );

    // 3. Build the simulation.
    let engine_config = config.engine.clone();
    let mut sim = Simulation::new(config, GameContent::builtin()).map_err(EngineError::from)?;
    info!(
        zone = %sim.zones().current(),
        weather = ?sim.weather().today(),
        "Simulation created"
    );

    // 4. Resume from the save file.
    let save_path = PathBuf::from(&engine_config.save_path);
    resume(&mut sim, &save_path).await?;

    // 5. Listener and time scale.
    sim.register_listener(Box::new(LogListener::new()));
    if let Some(boost) = engine_config.time_scale_boost {
        let scale = sim.clock().scale() * boost;
        sim.set_scale(scale).map_err(EngineError::from)?;
        info!(boost, scale, "Time scale boosted");
    }

    // 6. Run the frame loop.
    let mut pilot = Autopilot::new();
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl-C handler unavailable, running to the frame limit");
            std::future::pending::<()>().await;
        }
    };
    let result = runner::run_frames(&mut sim, &mut pilot, &engine_config, shutdown).await?;

    // 7. Save and log.
    save(&sim, &save_path, engine_config.slot).await?;
    runner::log_run_end(&result, &sim);
    info!("haven-engine shutdown complete");

    Ok(())
}

/// Load the configuration.
///
/// Reads the file named by `HAVEN_CONFIG`, else `haven-config.yaml` in the
/// working directory. A missing default file yields the defaults; a
/// missing file named by the environment is an error. Returns the path
/// actually read, if any.
fn load_config() -> Result<(SimulationConfig, Option<PathBuf>), EngineError> {
    let (path, explicit) = match std::env::var_os(CONFIG_PATH_ENV) {
        Some(path) => (PathBuf::from(path), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };
    if explicit || path.exists() {
        let config = SimulationConfig::from_file(&path)?;
        config.validate()?;
        Ok((config, Some(path)))
    } else {
        Ok((SimulationConfig::default(), None))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `logging.level`.
fn init_logging(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = match logging.format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}

/// Restore the save at `path` if it exists.
async fn resume(sim: &mut Simulation, path: &Path) -> Result<(), EngineError> {
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "No save file, starting a new game");
            return Ok(());
        }
        Err(source) => {
            return Err(EngineError::SaveFile {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let report = sim.restore(&text)?;
    if !report.is_clean() {
        warn!(
            path = %path.display(),
            migrated_from = ?report.migrated_from,
            defaulted = ?report.defaulted,
            "Save file was migrated, it will be rewritten in the current format on exit"
        );
    }
    info!(
        path = %path.display(),
        day = sim.clock().day(),
        time = %sim.clock().time_string(),
        "Save file restored"
    );
    Ok(())
}

/// Write a snapshot of `sim` to `path`.
async fn save(sim: &Simulation, path: &Path, slot: u32) -> Result<(), EngineError> {
    let text = sim.snapshot(slot)?;
    tokio::fs::write(path, text)
        .await
        .map_err(|source| EngineError::SaveFile {
            path: path.to_path_buf(),
            source,
        })?;
    info!(path = %path.display(), slot, "Game saved");
    Ok(())
}
