//! The frame loop.
//!
//! [`run_frames`] ticks the simulation once per frame interval, lets the
//! player act after every tick, and stops when the frame limit is hit or
//! the shutdown future resolves (Ctrl-C in the binary).

use std::future::Future;
use std::time::Duration;

use haven_core::{EngineConfig, Simulation};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::autopilot::Player;
use crate::error::EngineError;

/// Why the frame loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// `engine.max_frames` frames ran.
    MaxFramesReached,
    /// The shutdown signal fired.
    Interrupted,
}

/// Result of a frame loop run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    /// Why the loop stopped.
    pub end_reason: EndReason,
    /// Frames executed.
    pub total_frames: u64,
    /// Player actions performed across all frames.
    pub player_actions: u64,
    /// Listener failures reported across all frames.
    pub listener_failures: u64,
}

/// Run frames until the frame limit or `shutdown` resolves.
///
/// Each frame advances the simulation by `frame_ms` of real time, then
/// hands it to `player`.
///
/// # Errors
///
/// Returns [`EngineError::Simulation`] if a tick is rejected.
pub async fn run_frames<F>(
    sim: &mut Simulation,
    player: &mut dyn Player,
    config: &EngineConfig,
    shutdown: F,
) -> Result<RunResult, EngineError>
where
    F: Future<Output = ()>,
{
    let frame = Duration::from_millis(config.frame_ms);
    let frame_seconds = frame.as_secs_f64();
    let mut interval = tokio::time::interval(frame);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut result = RunResult {
        end_reason: EndReason::MaxFramesReached,
        total_frames: 0,
        player_actions: 0,
        listener_failures: 0,
    };

    info!(
        frame_ms = config.frame_ms,
        max_frames = ?config.max_frames,
        "Frame loop starting"
    );

    loop {
        // --- Check frame limit (before frame) ---
        if config.max_frames.is_some_and(|max| result.total_frames >= max) {
            info!(total_frames = result.total_frames, "Frame limit reached");
            result.end_reason = EndReason::MaxFramesReached;
            return Ok(result);
        }

        tokio::select! {
            biased;
            () = &mut shutdown => {
                info!(total_frames = result.total_frames, "Shutdown requested");
                result.end_reason = EndReason::Interrupted;
                return Ok(result);
            }
            _ = interval.tick() => {}
        }

        // --- Execute frame ---
        let report = sim.tick(frame_seconds)?;
        for failure in &report.listener_failures {
            warn!(listener = %failure.listener, reason = %failure.reason, "Listener failed");
        }
        result.listener_failures = result
            .listener_failures
            .saturating_add(u64::try_from(report.listener_failures.len()).unwrap_or(u64::MAX));

        let actions = player.act(sim);
        result.player_actions = result
            .player_actions
            .saturating_add(u64::try_from(actions.len()).unwrap_or(u64::MAX));
        result.total_frames = result.total_frames.saturating_add(1);
    }
}

/// Log the end of a run.
pub fn log_run_end(result: &RunResult, sim: &Simulation) {
    info!(
        reason = ?result.end_reason,
        total_frames = result.total_frames,
        player_actions = result.player_actions,
        listener_failures = result.listener_failures,
        day = sim.clock().day(),
        time = %sim.clock().time_string(),
        gold = sim.inventory().gold(),
        reputation = sim.shop().reputation(),
        stage = ?sim.creature().stage(),
        "Run ended"
    );
}
