//! Enumeration types shared across the simulation crates.
//!
//! Organized by domain area:
//! - Calendar: [`Season`], [`DayPeriod`], [`Weather`]
//! - Creature: [`LifeStage`]
//! - Gathering: [`RarityTier`], [`IngredientKind`]
//! - Shop: [`ServicePeriod`], [`ShopState`], [`OrderCategory`]
//!
//! All enums serialize as `snake_case` strings so snapshot documents and
//! YAML content files stay readable.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// A season in the annual cycle (7 in-game days per season by default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    /// Herbs and flowers are in season.
    Spring,
    /// Berries and honey are in season.
    Summer,
    /// Mushrooms, roots, and grain are in season.
    Autumn,
    /// Meat and preserved goods are in season.
    Winter,
}

impl Season {
    /// All seasons in cycle order.
    pub const ALL: [Self; 4] = [Self::Spring, Self::Summer, Self::Autumn, Self::Winter];

    /// The season that follows this one (cyclic).
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Spring => Self::Summer,
            Self::Summer => Self::Autumn,
            Self::Autumn => Self::Winter,
            Self::Winter => Self::Spring,
        }
    }

    /// Zero-based position in the cycle.
    pub const fn index(self) -> u32 {
        match self {
            Self::Spring => 0,
            Self::Summer => 1,
            Self::Autumn => 2,
            Self::Winter => 3,
        }
    }
}

/// Coarse time-of-day band derived from the hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPeriod {
    /// 00:00 -- 06:00.
    Night,
    /// 06:00 -- 12:00.
    Morning,
    /// 12:00 -- 18:00.
    Afternoon,
    /// 18:00 -- 24:00.
    Evening,
}

impl DayPeriod {
    /// Classify an hour of day in `[0, 24)`.
    pub fn from_hour(hour: f64) -> Self {
        if hour < 6.0 {
            Self::Night
        } else if hour < 12.0 {
            Self::Morning
        } else if hour < 18.0 {
            Self::Afternoon
        } else {
            Self::Evening
        }
    }
}

/// Daily weather, drawn once per day from a season-indexed distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weather {
    /// Clear skies. Honey quality bonus.
    Sunny,
    /// Overcast. Mushroom quality bonus.
    Cloudy,
    /// Rain. Herb, mushroom, and fish quality bonus.
    Rainy,
    /// Storm. The shop stays closed; storm-touched ingredients appear.
    Stormy,
    /// Rare magical weather. Legendary spawns are far more likely.
    Special,
}

impl Weather {
    /// All weather states in table order.
    pub const ALL: [Self; 5] = [
        Self::Sunny,
        Self::Cloudy,
        Self::Rainy,
        Self::Stormy,
        Self::Special,
    ];

    /// Whether the shop must stay closed for the day.
    pub const fn closes_shop(self) -> bool {
        matches!(self, Self::Stormy)
    }
}

// ---------------------------------------------------------------------------
// Creature
// ---------------------------------------------------------------------------

/// Discrete life phase of the creature companion.
///
/// Ordering follows growth, so `stage >= LifeStage::Juvenile` reads as
/// "juvenile or older".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifeStage {
    /// Not yet hatched. No decay, no abilities.
    Egg,
    /// Freshly hatched.
    Hatchling,
    /// Young and curious.
    Juvenile,
    /// Nearly grown; fire abilities unlock.
    Adolescent,
    /// Fully grown; flight unlocks.
    Adult,
}

impl LifeStage {
    /// All stages in growth order.
    pub const ALL: [Self; 5] = [
        Self::Egg,
        Self::Hatchling,
        Self::Juvenile,
        Self::Adolescent,
        Self::Adult,
    ];

    /// The next stage, or `None` for [`LifeStage::Adult`].
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Egg => Some(Self::Hatchling),
            Self::Hatchling => Some(Self::Juvenile),
            Self::Juvenile => Some(Self::Adolescent),
            Self::Adolescent => Some(Self::Adult),
            Self::Adult => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Gathering
// ---------------------------------------------------------------------------

/// Rarity classification of a gatherable resource.
///
/// Controls respawn interval, base spawn chance, and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RarityTier {
    /// Always there, respawns daily.
    Common,
    /// Shows up about half the time.
    Uncommon,
    /// Needs luck or good weather.
    Rare,
    /// Almost only in special weather.
    Legendary,
}

/// Ingredient family, used for season and weather quality bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngredientKind {
    /// Garden and wild herbs.
    Herb,
    /// Wild berries.
    Berry,
    /// Edible flowers.
    Flower,
    /// Mushrooms of all kinds.
    Mushroom,
    /// Honey and honeycomb.
    Honey,
    /// Buried roots and tubers.
    Root,
    /// Wild grain.
    Grain,
    /// Fish and shellfish.
    Fish,
    /// Game meat.
    Meat,
    /// Dried and preserved goods.
    Preserved,
    /// Mineral crystals.
    Crystal,
    /// Storm-charged ingredients.
    Storm,
    /// Legendary ingredients.
    Legendary,
}

impl IngredientKind {
    /// Whether items of this family go off outside the fridge.
    ///
    /// Fresh produce, fish, and meat spoil; honey, roots, grain, and the
    /// mineral and preserved families keep indefinitely.
    pub const fn is_perishable(self) -> bool {
        matches!(
            self,
            Self::Herb | Self::Berry | Self::Flower | Self::Mushroom | Self::Fish | Self::Meat
        )
    }
}

// ---------------------------------------------------------------------------
// Shop
// ---------------------------------------------------------------------------

/// A named daily shop-open window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServicePeriod {
    /// Breakfast and lunch crowd.
    Morning,
    /// Dinner crowd.
    Evening,
}

impl ServicePeriod {
    /// Both periods in daily order.
    pub const ALL: [Self; 2] = [Self::Morning, Self::Evening];
}

/// State of one service period's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShopState {
    /// Not open. Initial and terminal state of every period.
    Closed,
    /// Preparing before the doors open.
    Prep,
    /// Customers arrive and are served.
    Service,
    /// Doors shut, tidying up.
    Cleanup,
}

impl ShopState {
    /// Successor in the time-driven cycle `Closed -> Prep -> Service -> Cleanup -> Closed`.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Closed => Self::Prep,
            Self::Prep => Self::Service,
            Self::Service => Self::Cleanup,
            Self::Cleanup => Self::Closed,
        }
    }
}

/// Dish category a customer orders and a recipe belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderCategory {
    /// Drinks.
    Beverage,
    /// Small plates.
    Appetizer,
    /// Main courses.
    Main,
    /// Sweets.
    Dessert,
}

impl OrderCategory {
    /// All categories in table order.
    pub const ALL: [Self; 4] = [Self::Beverage, Self::Appetizer, Self::Main, Self::Dessert];
}
