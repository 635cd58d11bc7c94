//! The shop side of the Haven simulation.
//!
//! The shop opens twice a day. Each service period walks through PREP,
//! SERVICE, and CLEANUP on the game clock; during SERVICE customers arrive
//! according to the shop's reputation tier, wait for their order, eat, and
//! leave with a verdict that moves reputation and pays out gold.
//!
//! # Modules
//!
//! - [`shop`] -- The [`Shop`] orchestrator and its persisted record.
//! - [`service`] -- Service windows, the per-period state machine, and
//!   per-period counters.
//! - [`customer`] -- Customer lifecycle, seating, patience, satisfaction,
//!   and tips.
//! - [`staff`] -- Staff morale, efficiency, and pep talks.
//! - [`menu`] -- Recipe definitions, ingredients, cooked dishes, unlocks,
//!   and the daily menu.
//! - [`festival`] -- Seasonal festivals, their bonuses and festival recipes.
//! - [`reputation`] -- Reputation score and tier bands.
//! - [`config`] -- Shop tuning.
//! - [`error`] -- Error types for shop operations.

pub mod config;
pub mod customer;
pub mod error;
pub mod festival;
pub mod menu;
pub mod reputation;
pub mod service;
pub mod shop;
pub mod staff;

// Re-export primary types at crate root.
pub use config::ShopConfig;
pub use customer::{
    Arrival, CategoryWeights, Customer, CustomerConfig, CustomerFloor, CustomerKind, CustomerMood,
    CustomerState, Departure, ExpectationWeights, FloorRecord, Order, Plate, ServedDish,
};
pub use error::ShopError;
pub use festival::{FestivalBonuses, FestivalCalendar, FestivalDef, FestivalEvent, FestivalRecord};
pub use menu::{Dish, Ingredient, Menu, RecipeBook, RecipeDef, cooked_quality};
pub use reputation::{REP_MAX, Reputation, ReputationConfig, ReputationTier, TierBand};
pub use service::{PeriodPhase, PeriodSession, PeriodStats, PhaseChange, ServiceWindow};
pub use shop::{DaySummary, ServeOutcome, Shop, ShopEvent, ShopRecord, ShopUpdate};
pub use staff::{
    MORALE_MAX, Roster, StaffConfig, StaffDef, StaffMember, StaffRecord, StaffRole, StaffTrait,
    TalkOutcome,
};
