//! Shared type definitions for the Haven simulation core.
//!
//! This crate is the single source of truth for the vocabulary every
//! subsystem speaks: calendar and weather enums, creature stages, shop
//! states, content identifiers, and the deterministic random generator.
//!
//! # Modules
//!
//! - [`ids`] -- String newtypes for content identifiers, numeric customer ids
//! - [`enums`] -- Enumeration types (calendar, creature, gathering, shop)
//! - [`structs`] -- Small shared values ([`Color`], [`Quality`])
//! - [`rng`] -- [`SimRng`], a serializable generator implementing `rand::RngCore`

pub mod enums;
pub mod ids;
pub mod rng;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    DayPeriod, IngredientKind, LifeStage, OrderCategory, RarityTier, Season, ServicePeriod,
    ShopState, Weather,
};
pub use ids::{
    AbilityId, AchievementId, CustomerId, EventId, FestivalId, ItemId, RecipeId, SpawnPointId, StaffId,
    ZoneId,
};
pub use rng::{SimRng, fnv1a64};
pub use structs::{Color, Quality};
