//! Error types for the `haven-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`] through the
//! standard [`Result`] type alias. No operation mutates state before it
//! has decided to succeed.

use haven_types::{AbilityId, ItemId, LifeStage, Season, SpawnPointId, ZoneId};

use crate::inventory::ContainerKind;
use crate::spawn::Unavailability;

/// Errors that can occur during weather, gathering, travel, or inventory operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    /// No spawn point with this id exists.
    #[error("unknown spawn point: {0}")]
    UnknownSpawnPoint(SpawnPointId),

    /// No zone with this id exists.
    #[error("unknown zone: {0}")]
    UnknownZone(ZoneId),

    /// The spawn point has nothing to gather right now.
    #[error("spawn point {point} is not available: {reason}")]
    NotAvailable {
        /// The point that was gathered.
        point: SpawnPointId,
        /// Why it is unavailable.
        reason: Unavailability,
    },

    /// The spawn point needs an ability the creature does not have.
    #[error("spawn point {point} requires ability {ability}")]
    MissingAbility {
        /// The point that was gathered.
        point: SpawnPointId,
        /// The ability it needs.
        ability: AbilityId,
    },

    /// The spawn point is in a different zone than the player.
    #[error("spawn point {point} is in {zone}, player is in {current}")]
    WrongZone {
        /// The point that was gathered.
        point: SpawnPointId,
        /// Zone the point belongs to.
        zone: ZoneId,
        /// Zone the player is in.
        current: ZoneId,
    },

    /// A container has no free slot for a new stack.
    #[error("{container:?} inventory is full ({capacity} slots)")]
    InventoryFull {
        /// The full container.
        container: ContainerKind,
        /// Its slot capacity.
        capacity: u32,
    },

    /// Not enough of an item to remove.
    #[error("insufficient {item}: requested {requested}, available {available}")]
    InsufficientItems {
        /// The item requested.
        item: ItemId,
        /// Quantity requested.
        requested: u32,
        /// Quantity held.
        available: u32,
    },

    /// Every slot upgrade for a container has been bought.
    #[error("{container:?} upgrades are maxed out ({max_purchases} bought)")]
    UpgradeMaxed {
        /// The container.
        container: ContainerKind,
        /// Purchases on sale.
        max_purchases: u32,
    },

    /// Not enough gold to pay.
    #[error("insufficient gold: requested {requested}, available {available}")]
    InsufficientGold {
        /// Amount requested.
        requested: u64,
        /// Amount held.
        available: u64,
    },

    /// The zone requires a more grown creature and has not been unlocked.
    #[error("zone {zone} requires stage {required:?}")]
    ZoneLocked {
        /// The locked zone.
        zone: ZoneId,
        /// Minimum creature stage.
        required: LifeStage,
    },

    /// A season's weather probabilities are malformed.
    #[error("invalid weather table for {season:?}: {reason}")]
    InvalidWeatherTable {
        /// The offending season.
        season: Season,
        /// What is wrong.
        reason: String,
    },

    /// Spawn or inventory tuning is malformed.
    #[error("invalid world tuning: {reason}")]
    InvalidTuning {
        /// What is wrong.
        reason: String,
    },

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in world calculation")]
    ArithmeticOverflow,
}
