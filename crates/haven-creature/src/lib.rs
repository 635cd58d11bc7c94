//! The creature companion of the Haven simulation.
//!
//! A creature starts as an egg, hatches, and grows through four further
//! life stages as days pass. It has hunger, happiness, stamina, and bond
//! stats, a body colour shaped by what it eats, and abilities that unlock
//! with each stage.
//!
//! # Modules
//!
//! - [`creature`] -- The [`Creature`] state machine: aging, hourly decay,
//!   feeding, petting, abilities, and persistence.
//! - [`ability`] -- Ability definitions and stage gating.
//! - [`config`] -- Growth thresholds and stat rates.
//! - [`error`] -- Error types for creature operations.

pub mod ability;
pub mod config;
pub mod creature;
pub mod error;

// Re-export primary types at crate root.
pub use ability::{AbilityCatalog, AbilityDef, AbilityEffect, AbilityKind, EffectTag};
pub use config::{CreatureConfig, StageThresholds};
pub use creature::{
    Creature, CreatureEvent, CreatureRecord, FeedOutcome, Meal, Mood, PetOutcome, STAT_MAX,
};
pub use error::CreatureError;
