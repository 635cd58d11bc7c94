//! Simulation core for Haven: the clock, configuration, static content,
//! the driver that owns every subsystem, and save/restore.
//!
//! The subsystems themselves live in their own crates (`haven-world`,
//! `haven-creature`, `haven-shop`, `haven-story`). This crate wires them
//! together and is the only place that mutates more than one of them.
//!
//! # Modules
//!
//! - [`achievement`] -- One-time milestones with gold rewards.
//! - [`clock`] -- Game clock: real-to-game time conversion, day, season,
//!   and period boundaries.
//! - [`config`] -- Configuration loading from `haven-config.yaml` into
//!   strongly-typed structs.
//! - [`content`] -- Validated static content: abilities, recipes, zones,
//!   spawn points, staff, festivals, achievements, the starting pantry,
//!   and story.
//! - [`error`] -- [`SimError`] and the caller-facing [`ErrorKind`].
//! - [`listener`] -- [`SimEvent`] and the [`SimulationListener`] trait.
//! - [`simulation`] -- [`Simulation`]: the per-tick driver and player
//!   operations.
//! - [`snapshot`] -- Save documents, checksums, and all-or-nothing restore.

pub mod achievement;
pub mod clock;
pub mod config;
pub mod content;
pub mod error;
pub mod listener;
pub mod simulation;
pub mod snapshot;

// Re-export primary types at crate root.
pub use achievement::{AchievementDef, AchievementRecord, AchievementRule, Achievements, Progress};
pub use clock::{Clock, ClockError, ClockEvent, ClockRecord};
pub use config::{ConfigError, EngineConfig, LogFormat, LoggingConfig, SimulationConfig, TimeConfig, WorldConfig};
pub use content::{ContentError, GameContent};
pub use error::{ErrorKind, SimError};
pub use listener::{ListenerFailure, NoOpListener, SimEvent, SimulationListener};
pub use simulation::{Simulation, TickReport};
pub use snapshot::{
    RestoreReport, SCHEMA_VERSION, SaveDocument, SaveMeta, SnapshotError, WorldRecord, parse_document,
};
