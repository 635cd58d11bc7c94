//! Weather, resource spawning, zones, and inventory for the Haven simulation.
//!
//! This crate models the world outside the shop: the daily weather draw,
//! gatherable spawn points with rarity-tier respawn rules, the zones the
//! player can travel between, and the containers that hold what they
//! gather.
//!
//! # Modules
//!
//! - [`weather`] -- Season-weighted daily weather with a one-day forecast
//!   and deterministic per-day randomness.
//! - [`spawn`] -- Spawn points, cached daily rarity rolls, and gathering.
//! - [`zone`] -- Zone definitions and stage-gated travel.
//! - [`inventory`] -- Slot-limited containers, spoilage, upgrades, and
//!   the gold purse.
//! - [`error`] -- Error types for world operations.

pub mod error;
pub mod inventory;
pub mod spawn;
pub mod weather;
pub mod zone;

// Re-export primary types at crate root.
pub use error::WorldError;
pub use inventory::{
    Container, ContainerKind, Inventory, InventoryConfig, InventoryRecord, ItemStack, SpoiledStack,
    UpgradeCounts, UpgradeDef, UpgradeReceipt, UpgradeTable,
};
pub use spawn::{
    Availability, DailyRoll, DayContext, GatheredItem, SpawnPointDef, SpawnPointRecord,
    SpawnRefresh, SpawnScheduler, SpawnTuning, Unavailability,
};
pub use weather::{SeasonWeights, WeatherRoller, WeatherTable};
pub use zone::{ZoneDef, ZoneMap};
