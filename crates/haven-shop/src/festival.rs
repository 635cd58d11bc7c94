//! Seasonal festivals.
//!
//! Each festival belongs to one season and runs for a fixed stretch of
//! days inside it. While it runs its bonuses apply to tips, customer
//! patience, reputation gains, bonding, and cooking, and its festival
//! recipes can be cooked. The recipes stay unlocked once granted but are
//! only cookable again at the next year's festival.
//!
//! The calendar is checked once per day rollover; a festival already in
//! progress when a game is loaded is picked up by the same check.

use std::collections::{BTreeMap, BTreeSet};

use haven_types::{FestivalId, RecipeId, Season};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ShopError;
use crate::menu::{RecipeBook, RecipeDef};

/// What a running festival changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FestivalBonuses {
    /// Added to the tip fraction (0.25 = a quarter more in tips).
    #[serde(default)]
    pub tip_bonus: f64,
    /// Multiplier on the patience of arriving customers.
    #[serde(default = "neutral")]
    pub patience_multiplier: f64,
    /// Multiplier on reputation gains (losses are unaffected).
    #[serde(default = "neutral")]
    pub reputation_multiplier: f64,
    /// Multiplier on bond gained by feeding the creature.
    #[serde(default = "neutral")]
    pub bond_multiplier: f64,
    /// Stars added to every dish cooked.
    #[serde(default)]
    pub quality_bonus: u8,
}

const fn neutral() -> f64 {
    1.0
}

impl FestivalBonuses {
    /// No festival running.
    pub const NONE: Self = Self {
        tip_bonus: 0.0,
        patience_multiplier: 1.0,
        reputation_multiplier: 1.0,
        bond_multiplier: 1.0,
        quality_bonus: 0,
    };

    fn validate(&self) -> Result<(), String> {
        if !self.tip_bonus.is_finite() || self.tip_bonus < 0.0 {
            return Err("tip_bonus must be finite and non-negative".to_owned());
        }
        for (name, value) in [
            ("patience_multiplier", self.patience_multiplier),
            ("reputation_multiplier", self.reputation_multiplier),
            ("bond_multiplier", self.bond_multiplier),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(format!("{name} must be finite and positive"));
            }
        }
        Ok(())
    }
}

impl Default for FestivalBonuses {
    fn default() -> Self {
        Self::NONE
    }
}

/// Static definition of a festival.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FestivalDef {
    /// Unique id.
    pub id: FestivalId,
    /// Display name.
    pub name: String,
    /// Season it belongs to.
    pub season: Season,
    /// First day, counted from 1 within the season.
    pub start_day: u32,
    /// Days it lasts.
    pub duration: u32,
    /// Effects while running.
    #[serde(default)]
    pub bonuses: FestivalBonuses,
    /// Festival recipes granted when it starts.
    #[serde(default)]
    pub recipes: Vec<RecipeId>,
}

impl FestivalDef {
    /// Whether the festival runs on `day_of_season` of `season`.
    pub fn runs_on(&self, season: Season, day_of_season: u32) -> bool {
        season == self.season
            && day_of_season >= self.start_day
            && day_of_season.saturating_sub(self.start_day) < self.duration
    }

    /// Last day within the season.
    const fn end_day(&self) -> u32 {
        self.start_day
            .saturating_add(self.duration)
            .saturating_sub(1)
    }
}

/// A festival starting or ending at a day rollover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FestivalEvent {
    /// A festival began.
    Started {
        /// The festival.
        festival: FestivalId,
        /// Its display name.
        name: String,
        /// Festival recipes it granted.
        recipes: Vec<RecipeId>,
    },
    /// A festival finished.
    Ended {
        /// The festival.
        festival: FestivalId,
    },
}

/// Persisted calendar state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FestivalRecord {
    /// Festival running right now.
    #[serde(default)]
    pub active: Option<FestivalId>,
    /// Times each festival has been held.
    #[serde(default)]
    pub participated: BTreeMap<FestivalId, u32>,
}

/// The festival schedule and which one, if any, is running.
#[derive(Debug, Clone, PartialEq)]
pub struct FestivalCalendar {
    defs: Vec<FestivalDef>,
    active: Option<FestivalId>,
    participated: BTreeMap<FestivalId, u32>,
}

impl FestivalCalendar {
    /// Build a calendar for seasons of `days_per_season` days.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::InvalidConfig`] for duplicate ids, festivals
    /// that do not fit inside their season, two festivals in one season,
    /// malformed bonuses, or recipes that are unknown or not festival dishes.
    pub fn new(defs: Vec<FestivalDef>, book: &RecipeBook, days_per_season: u32) -> Result<Self, ShopError> {
        let invalid = |reason: String| ShopError::InvalidConfig { reason };
        let mut ids = BTreeSet::new();
        let mut seasons = BTreeSet::new();
        for def in &defs {
            if !ids.insert(&def.id) {
                return Err(invalid(format!("duplicate festival id {}", def.id)));
            }
            if !seasons.insert(def.season) {
                return Err(invalid(format!("second festival in {:?}: {}", def.season, def.id)));
            }
            if def.start_day == 0 || def.duration == 0 || def.end_day() > days_per_season {
                return Err(invalid(format!(
                    "festival {} must fit within a {days_per_season}-day season",
                    def.id
                )));
            }
            def.bonuses
                .validate()
                .map_err(|reason| invalid(format!("festival {}: {reason}", def.id)))?;
            for recipe in &def.recipes {
                let seasonal = book.get(recipe).is_some_and(|r| r.seasonal);
                if !seasonal {
                    return Err(invalid(format!(
                        "festival {} offers {recipe}, which is not a festival recipe",
                        def.id
                    )));
                }
            }
        }
        Ok(Self {
            defs,
            active: None,
            participated: BTreeMap::new(),
        })
    }

    /// Day rollover: end a finished festival, then start one due today.
    pub fn on_new_day(&mut self, season: Season, day_of_season: u32) -> Vec<FestivalEvent> {
        let mut events = Vec::new();
        if let Some(active) = self.active()
            && !active.runs_on(season, day_of_season)
        {
            let festival = active.id.clone();
            info!(festival = %festival, "Festival ended");
            self.active = None;
            events.push(FestivalEvent::Ended { festival });
        }
        if self.active.is_none()
            && let Some(def) = self.defs.iter().find(|d| d.runs_on(season, day_of_season))
        {
            let count = self.participated.entry(def.id.clone()).or_insert(0);
            *count = count.saturating_add(1);
            info!(festival = %def.id, name = %def.name, "Festival started");
            self.active = Some(def.id.clone());
            events.push(FestivalEvent::Started {
                festival: def.id.clone(),
                name: def.name.clone(),
                recipes: def.recipes.clone(),
            });
        }
        events
    }

    /// The festival running right now.
    pub fn active(&self) -> Option<&FestivalDef> {
        let id = self.active.as_ref()?;
        self.defs.iter().find(|d| &d.id == id)
    }

    /// Bonuses in effect; neutral when no festival runs.
    pub fn bonuses(&self) -> FestivalBonuses {
        self.active().map_or(FestivalBonuses::NONE, |d| d.bonuses)
    }

    /// Whether `recipe` can be cooked today.
    pub fn in_season(&self, recipe: &RecipeDef) -> bool {
        !recipe.seasonal || self.active().is_some_and(|d| d.recipes.contains(&recipe.id))
    }

    /// Times `festival` has been held.
    pub fn times_held(&self, festival: &FestivalId) -> u32 {
        self.participated.get(festival).copied().unwrap_or(0)
    }

    /// Festivals held across all years.
    pub fn total_held(&self) -> u32 {
        self.participated
            .values()
            .fold(0_u32, |acc, n| acc.saturating_add(*n))
    }

    /// All festival definitions.
    pub fn defs(&self) -> &[FestivalDef] {
        &self.defs
    }

    /// Rebuild this calendar's state from a record, leaving `self` untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::CorruptRecord`] for festival ids the calendar
    /// does not define.
    pub fn restored(&self, record: FestivalRecord) -> Result<Self, ShopError> {
        let known = |id: &FestivalId| self.defs.iter().any(|d| &d.id == id);
        if let Some(unknown) = record
            .active
            .iter()
            .chain(record.participated.keys())
            .find(|id| !known(id))
        {
            return Err(ShopError::CorruptRecord {
                reason: format!("unknown festival {unknown}"),
            });
        }
        Ok(Self {
            defs: self.defs.clone(),
            active: record.active,
            participated: record.participated,
        })
    }

    /// Persisted form.
    pub fn record(&self) -> FestivalRecord {
        FestivalRecord {
            active: self.active.clone(),
            participated: self.participated.clone(),
        }
    }
}
