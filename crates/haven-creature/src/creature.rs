//! The creature companion's state machine.
//!
//! Life stage is a monotonic function of `days_alive`: every day rollover
//! increments the counter and walks through each stage threshold crossed,
//! applying each stage's entry effects in order (never skipping, never
//! regressing). Stats decay once per in-game hour and every mutation
//! clamps hunger, happiness, and stamina to `[0, 100]` and bond to
//! `[0, bond_max]`.
//!
//! # Order of operations per hour
//!
//! 1. Eggs do nothing.
//! 2. Hunger decays.
//! 3. Happiness decays, faster if hunger is below the low threshold.
//! 4. Stamina regenerates if no continuous ability is running.

use std::collections::BTreeSet;

use haven_types::{AbilityId, Color, LifeStage, Quality, RecipeId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ability::{AbilityCatalog, AbilityEffect, AbilityKind};
use crate::config::CreatureConfig;
use crate::error::CreatureError;

/// Upper bound of hunger, happiness, and stamina.
pub const STAT_MAX: f64 = 100.0;

/// Name given to a creature that was never named.
pub const DEFAULT_NAME: &str = "Dragon";

/// A cooked dish offered to the creature.
#[derive(Debug, Clone, PartialEq)]
pub struct Meal {
    /// Recipe the dish was cooked from.
    pub recipe: RecipeId,
    /// Hunger restored at standard quality.
    pub hunger_value: f64,
    /// Happiness restored at standard quality.
    pub happiness_value: f64,
    /// Colour the dish pulls the creature toward.
    pub color_influence: Color,
    /// Dish quality; scales the restored amounts.
    pub quality: Quality,
    /// Whether the recipe is one of the creature's favourites.
    pub favorite: bool,
    /// Multiplier on the bond gained (1.0 outside festivals).
    pub bond_multiplier: f64,
}

/// Result of a feeding.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedOutcome {
    /// Hunger actually gained after clamping.
    pub hunger_gained: f64,
    /// Bond actually gained after clamping.
    pub bond_gained: f64,
    /// Colour after blending.
    pub color: Color,
}

/// Result of petting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PetOutcome {
    /// Happiness after petting.
    pub happiness: f64,
    /// Bond after petting.
    pub bond: f64,
}

/// Something the creature did on its own that observers may care about.
#[derive(Debug, Clone, PartialEq)]
pub enum CreatureEvent {
    /// A new life stage began.
    StageEntered {
        /// The stage entered.
        stage: LifeStage,
        /// Abilities that unlocked with it.
        unlocked: Vec<AbilityId>,
    },
    /// A continuous ability stopped because stamina ran out.
    AbilityExhausted {
        /// The ability that stopped.
        ability: AbilityId,
    },
}

/// Displayed mood, derived from stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    /// Still an egg.
    Incubating,
    /// Hunger at or below the warning level.
    Hungry,
    /// Stamina at or below the warning level.
    Tired,
    /// Happiness at or below the warning level.
    Sad,
    /// Happiness and hunger both high.
    Happy,
    /// Comfortably above every warning.
    Content,
    /// None of the above.
    Neutral,
}

/// Persisted creature shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatureRecord {
    /// Life stage.
    pub stage: LifeStage,
    /// Fullness, 0--100.
    pub hunger: f64,
    /// Happiness, 0--100.
    pub happiness: f64,
    /// Stamina, 0--100.
    pub stamina: f64,
    /// Bond, 0--`bond_max`.
    pub bond: f64,
    /// Body colour.
    pub color: Color,
    /// Days since the egg appeared.
    pub days_alive: u32,
    /// Unlocked abilities.
    #[serde(default)]
    pub unlocked_abilities: BTreeSet<AbilityId>,
    /// Name.
    #[serde(default = "default_name")]
    pub name: String,
    /// Continuous ability currently running.
    #[serde(default)]
    pub active_ability: Option<AbilityId>,
}

fn default_name() -> String {
    DEFAULT_NAME.to_owned()
}

/// The creature companion.
#[derive(Debug, Clone, PartialEq)]
pub struct Creature {
    name: String,
    stage: LifeStage,
    hunger: f64,
    happiness: f64,
    stamina: f64,
    bond: f64,
    color: Color,
    days_alive: u32,
    unlocked: BTreeSet<AbilityId>,
    active: Option<AbilityId>,
}

impl Creature {
    /// A fresh egg.
    pub fn new_egg(config: &CreatureConfig) -> Self {
        Self {
            name: DEFAULT_NAME.to_owned(),
            stage: LifeStage::Egg,
            hunger: clamp_stat(config.starting_hunger),
            happiness: clamp_stat(config.starting_happiness),
            stamina: STAT_MAX,
            bond: 0.0,
            color: Color::NEUTRAL,
            days_alive: 0,
            unlocked: BTreeSet::new(),
            active: None,
        }
    }

    /// Rebuild from a persisted record, checking every invariant.
    ///
    /// An empty ability set (written by older saves) is recomputed from the
    /// stage; a non-empty set must match the stage exactly.
    ///
    /// # Errors
    ///
    /// Returns [`CreatureError::CorruptRecord`] naming the violated invariant.
    pub fn from_record(
        record: CreatureRecord,
        config: &CreatureConfig,
        catalog: &AbilityCatalog,
    ) -> Result<Self, CreatureError> {
        let corrupt = |reason: String| CreatureError::CorruptRecord { reason };

        for (name, value) in [
            ("hunger", record.hunger),
            ("happiness", record.happiness),
            ("stamina", record.stamina),
        ] {
            if !value.is_finite() || !(0.0..=STAT_MAX).contains(&value) {
                return Err(corrupt(format!("{name} {value} outside [0, 100]")));
            }
        }
        if !record.bond.is_finite() || !(0.0..=config.bond_max).contains(&record.bond) {
            return Err(corrupt(format!("bond {} outside [0, {}]", record.bond, config.bond_max)));
        }
        if !record.color.is_valid() {
            return Err(corrupt("color channel outside [0, 1]".to_owned()));
        }
        let expected_stage = config.stage_thresholds.stage_for(record.days_alive);
        if record.stage != expected_stage {
            return Err(corrupt(format!(
                "stage {:?} does not match {} days alive ({expected_stage:?})",
                record.stage, record.days_alive
            )));
        }
        let expected = catalog.unlocked_through(record.stage);
        if !record.unlocked_abilities.is_empty() && record.unlocked_abilities != expected {
            return Err(corrupt("unlocked abilities do not match stage".to_owned()));
        }
        if let Some(active) = &record.active_ability {
            let continuous = catalog
                .get(active)
                .is_some_and(|d| matches!(d.kind, AbilityKind::Continuous { .. }));
            if !continuous || !expected.contains(active) {
                return Err(corrupt(format!("active ability {active} is not a running ability")));
            }
        }
        validate_name(&record.name, config).map_err(|e| corrupt(e.to_string()))?;

        Ok(Self {
            name: record.name,
            stage: record.stage,
            hunger: record.hunger,
            happiness: record.happiness,
            stamina: record.stamina,
            bond: record.bond,
            color: record.color,
            days_alive: record.days_alive,
            unlocked: expected,
            active: record.active_ability,
        })
    }

    /// Persisted form.
    pub fn record(&self) -> CreatureRecord {
        CreatureRecord {
            stage: self.stage,
            hunger: self.hunger,
            happiness: self.happiness,
            stamina: self.stamina,
            bond: self.bond,
            color: self.color,
            days_alive: self.days_alive,
            unlocked_abilities: self.unlocked.clone(),
            name: self.name.clone(),
            active_ability: self.active.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Clock-driven updates
    // -----------------------------------------------------------------------

    /// Day rollover: age by one day and enter every stage whose threshold
    /// has been reached, in order.
    pub fn on_new_day(
        &mut self,
        config: &CreatureConfig,
        catalog: &AbilityCatalog,
    ) -> Vec<CreatureEvent> {
        self.days_alive = self.days_alive.saturating_add(1);
        let target = config.stage_thresholds.stage_for(self.days_alive);
        let mut events = Vec::new();
        while self.stage < target {
            let Some(next) = self.stage.next() else {
                break;
            };
            self.enter_stage(next, catalog);
            info!(
                name = %self.name,
                stage = ?next,
                days_alive = self.days_alive,
                "Creature entered a new stage"
            );
            events.push(CreatureEvent::StageEntered {
                stage: next,
                unlocked: catalog.gated_at(next),
            });
        }
        events
    }

    fn enter_stage(&mut self, stage: LifeStage, catalog: &AbilityCatalog) {
        self.stage = stage;
        self.unlocked = catalog.unlocked_through(stage);
        if stage == LifeStage::Hatchling {
            // A hatchling comes out of the shell rested.
            self.stamina = STAT_MAX;
        }
    }

    /// Apply one in-game hour of decay and regeneration.
    pub fn on_hour(&mut self, config: &CreatureConfig) {
        // 1. Eggs do nothing
        if self.stage == LifeStage::Egg {
            return;
        }

        // 2. Hunger decays
        self.hunger = clamp_stat(self.hunger - config.hunger_decay_per_hour);

        // 3. Happiness decays, faster when hungry
        let multiplier = if self.hunger < config.low_hunger_threshold {
            config.hungry_happiness_multiplier
        } else {
            1.0
        };
        self.happiness = clamp_stat(self.happiness - config.happiness_decay_per_hour * multiplier);

        // 4. Stamina regenerates while nothing drains it
        if self.active.is_none() {
            self.stamina = clamp_stat(self.stamina + config.stamina_regen_per_hour);
        }
    }

    /// Drain stamina for a running continuous ability over `real_seconds`.
    ///
    /// Returns [`CreatureEvent::AbilityExhausted`] if stamina hit zero and
    /// the ability auto-stopped.
    pub fn drain_active(&mut self, real_seconds: f64, catalog: &AbilityCatalog) -> Option<CreatureEvent> {
        let active = self.active.as_ref()?;
        let rate = match catalog.get(active).map(|d| d.kind) {
            Some(AbilityKind::Continuous { cost_per_second }) => cost_per_second,
            _ => 0.0,
        };
        let seconds = if real_seconds.is_finite() { real_seconds.max(0.0) } else { 0.0 };
        self.stamina = clamp_stat(self.stamina - rate * seconds);
        if self.stamina <= 0.0 {
            let ability = self.active.take()?;
            debug!(ability = %ability, "Continuous ability exhausted stamina");
            return Some(CreatureEvent::AbilityExhausted { ability });
        }
        None
    }

    // -----------------------------------------------------------------------
    // Player operations
    // -----------------------------------------------------------------------

    /// Feed a dish.
    ///
    /// # Errors
    ///
    /// Returns [`CreatureError::StillAnEgg`] before hatching, or
    /// [`CreatureError::InvalidArgument`] for non-finite meal values.
    pub fn feed(&mut self, meal: &Meal, config: &CreatureConfig) -> Result<FeedOutcome, CreatureError> {
        if self.stage == LifeStage::Egg {
            return Err(CreatureError::StillAnEgg);
        }
        if !meal.hunger_value.is_finite()
            || !meal.happiness_value.is_finite()
            || meal.hunger_value < 0.0
            || meal.happiness_value < 0.0
            || !meal.bond_multiplier.is_finite()
            || meal.bond_multiplier <= 0.0
        {
            return Err(CreatureError::InvalidArgument {
                reason: format!("meal {} has invalid values", meal.recipe),
            });
        }

        let factor = f64::from(meal.quality.stars()) / f64::from(haven_types::Quality::STANDARD.stars());
        let before_hunger = self.hunger;
        self.hunger = clamp_stat(self.hunger + meal.hunger_value * factor);
        self.happiness = clamp_stat(self.happiness + meal.happiness_value * factor);

        let bond_gain = if meal.favorite {
            config.feed_bond_gain + config.favorite_bond_bonus
        } else {
            config.feed_bond_gain
        } * meal.bond_multiplier;
        let before_bond = self.bond;
        self.bond = clamp_bond(self.bond + bond_gain, config);
        self.color = self
            .color
            .blend_toward(meal.color_influence, config.color_blend_factor);

        debug!(
            recipe = %meal.recipe,
            hunger = self.hunger,
            bond = self.bond,
            favorite = meal.favorite,
            "Creature fed"
        );

        Ok(FeedOutcome {
            hunger_gained: self.hunger - before_hunger,
            bond_gained: self.bond - before_bond,
            color: self.color,
        })
    }

    /// Pet the creature. Flat gain, no cooldown.
    ///
    /// # Errors
    ///
    /// Returns [`CreatureError::StillAnEgg`] before hatching.
    pub fn pet(&mut self, config: &CreatureConfig) -> Result<PetOutcome, CreatureError> {
        if self.stage == LifeStage::Egg {
            return Err(CreatureError::StillAnEgg);
        }
        self.happiness = clamp_stat(self.happiness + config.pet_happiness_gain);
        self.bond = clamp_bond(self.bond + config.pet_bond_gain, config);
        Ok(PetOutcome {
            happiness: self.happiness,
            bond: self.bond,
        })
    }

    /// Use an instantaneous ability.
    ///
    /// # Errors
    ///
    /// [`CreatureError::UnknownAbility`], [`CreatureError::AbilityLocked`],
    /// [`CreatureError::NotInstant`], [`CreatureError::InsufficientStamina`].
    pub fn use_ability(
        &mut self,
        id: &AbilityId,
        catalog: &AbilityCatalog,
    ) -> Result<AbilityEffect, CreatureError> {
        let def = self.eligible(id, catalog)?;
        let AbilityKind::Instant { cost } = def.kind else {
            return Err(CreatureError::NotInstant(id.clone()));
        };
        if self.stamina < cost {
            return Err(CreatureError::InsufficientStamina {
                ability: id.clone(),
                required: cost,
                available: self.stamina,
            });
        }
        self.stamina = clamp_stat(self.stamina - cost);
        info!(ability = %id, stamina = self.stamina, "Ability used");
        Ok(AbilityEffect {
            ability: id.clone(),
            effect: def.effect,
            duration_seconds: def.duration_seconds,
            stamina_spent: cost,
        })
    }

    /// Start a continuous ability. It drains stamina every tick until
    /// stopped or exhausted.
    ///
    /// # Errors
    ///
    /// [`CreatureError::UnknownAbility`], [`CreatureError::AbilityLocked`],
    /// [`CreatureError::NotContinuous`], [`CreatureError::AnotherAbilityActive`],
    /// [`CreatureError::InsufficientStamina`] (less than one second's worth).
    pub fn start_ability(&mut self, id: &AbilityId, catalog: &AbilityCatalog) -> Result<(), CreatureError> {
        let def = self.eligible(id, catalog)?;
        let AbilityKind::Continuous { cost_per_second } = def.kind else {
            return Err(CreatureError::NotContinuous(id.clone()));
        };
        if let Some(active) = &self.active {
            return Err(CreatureError::AnotherAbilityActive {
                active: active.clone(),
            });
        }
        if self.stamina < cost_per_second || self.stamina <= 0.0 {
            return Err(CreatureError::InsufficientStamina {
                ability: id.clone(),
                required: cost_per_second,
                available: self.stamina,
            });
        }
        self.active = Some(id.clone());
        info!(ability = %id, "Continuous ability started");
        Ok(())
    }

    /// Stop a running continuous ability.
    ///
    /// # Errors
    ///
    /// Returns [`CreatureError::AbilityNotActive`] if `id` is not running.
    pub fn stop_ability(&mut self, id: &AbilityId) -> Result<(), CreatureError> {
        if self.active.as_ref() != Some(id) {
            return Err(CreatureError::AbilityNotActive(id.clone()));
        }
        self.active = None;
        info!(ability = %id, "Continuous ability stopped");
        Ok(())
    }

    fn eligible<'c>(
        &self,
        id: &AbilityId,
        catalog: &'c AbilityCatalog,
    ) -> Result<&'c crate::ability::AbilityDef, CreatureError> {
        let def = catalog
            .get(id)
            .ok_or_else(|| CreatureError::UnknownAbility(id.clone()))?;
        if !self.unlocked.contains(id) {
            return Err(CreatureError::AbilityLocked {
                ability: id.clone(),
                stage: self.stage,
            });
        }
        Ok(def)
    }

    /// Sleep: stop any continuous ability and refill stamina.
    pub fn rest(&mut self) {
        self.active = None;
        if self.stage != LifeStage::Egg {
            self.stamina = STAT_MAX;
        }
    }

    /// Rename the creature.
    ///
    /// # Errors
    ///
    /// Returns [`CreatureError::InvalidName`] for empty or overlong names.
    pub fn rename(&mut self, name: &str, config: &CreatureConfig) -> Result<(), CreatureError> {
        let trimmed = name.trim();
        validate_name(trimmed, config)?;
        trimmed.clone_into(&mut self.name);
        Ok(())
    }

    /// Mood derived from the current stats.
    pub fn mood(&self, config: &CreatureConfig) -> Mood {
        if self.stage == LifeStage::Egg {
            Mood::Incubating
        } else if self.hunger <= config.hunger_warning {
            Mood::Hungry
        } else if self.stamina <= config.stamina_warning {
            Mood::Tired
        } else if self.happiness <= config.happiness_warning {
            Mood::Sad
        } else if self.happiness >= 80.0 && self.hunger >= 60.0 {
            Mood::Happy
        } else if self.happiness >= 60.0 {
            Mood::Content
        } else {
            Mood::Neutral
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Life stage.
    pub const fn stage(&self) -> LifeStage {
        self.stage
    }

    /// Fullness, 0--100 (100 is full).
    pub const fn hunger(&self) -> f64 {
        self.hunger
    }

    /// Happiness, 0--100.
    pub const fn happiness(&self) -> f64 {
        self.happiness
    }

    /// Stamina, 0--100.
    pub const fn stamina(&self) -> f64 {
        self.stamina
    }

    /// Bond with the player.
    pub const fn bond(&self) -> f64 {
        self.bond
    }

    /// Body colour.
    pub const fn color(&self) -> Color {
        self.color
    }

    /// Days since the egg appeared.
    pub const fn days_alive(&self) -> u32 {
        self.days_alive
    }

    /// Unlocked abilities.
    pub const fn abilities(&self) -> &BTreeSet<AbilityId> {
        &self.unlocked
    }

    /// Running continuous ability.
    pub const fn active_ability(&self) -> Option<&AbilityId> {
        self.active.as_ref()
    }
}

fn validate_name(name: &str, config: &CreatureConfig) -> Result<(), CreatureError> {
    let len = name.chars().count();
    if len == 0 {
        return Err(CreatureError::InvalidName {
            reason: "name is empty".to_owned(),
        });
    }
    if len > config.max_name_len {
        return Err(CreatureError::InvalidName {
            reason: format!("name longer than {} characters", config.max_name_len),
        });
    }
    Ok(())
}

fn clamp_stat(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, STAT_MAX) }
}

fn clamp_bond(value: f64, config: &CreatureConfig) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, config.bond_max) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config() -> CreatureConfig {
        CreatureConfig::default()
    }

    fn catalog() -> AbilityCatalog {
        AbilityCatalog::builtin()
    }

    fn hatched() -> Creature {
        let mut c = Creature::new_egg(&config());
        for _ in 0..2 {
            c.on_new_day(&config(), &catalog());
        }
        assert_eq!(c.stage(), LifeStage::Hatchling);
        c
    }

    fn aged(days: u32) -> Creature {
        let mut c = Creature::new_egg(&config());
        for _ in 0..days {
            c.on_new_day(&config(), &catalog());
        }
        c
    }

    fn meal(favorite: bool) -> Meal {
        Meal {
            recipe: RecipeId::new("berry_juice"),
            hunger_value: 35.0,
            happiness_value: 12.0,
            color_influence: Color::new(1.0, 0.0, 0.0),
            quality: Quality::STANDARD,
            favorite,
            bond_multiplier: 1.0,
        }
    }

    #[test]
    fn hatches_exactly_at_threshold_rollover() {
        let mut c = Creature::new_egg(&config());
        let first = c.on_new_day(&config(), &catalog());
        assert!(first.is_empty());
        assert_eq!(c.stage(), LifeStage::Egg);
        let second = c.on_new_day(&config(), &catalog());
        assert_eq!(c.stage(), LifeStage::Hatchling);
        assert!(matches!(
            second.first(),
            Some(CreatureEvent::StageEntered {
                stage: LifeStage::Hatchling,
                ..
            })
        ));
        assert_eq!(c.abilities().len(), 2);
    }

    #[test]
    fn jumping_days_enters_every_stage_in_order() {
        let jumpy = CreatureConfig {
            stage_thresholds: crate::config::StageThresholds {
                hatchling: 1,
                juvenile: 2,
                adolescent: 3,
                adult: 4,
            },
            ..config()
        };
        let mut creature = Creature::new_egg(&jumpy);
        creature.days_alive = 3;
        let events = creature.on_new_day(&jumpy, &catalog());
        let stages: Vec<LifeStage> = events
            .iter()
            .filter_map(|e| match e {
                CreatureEvent::StageEntered { stage, .. } => Some(*stage),
                CreatureEvent::AbilityExhausted { .. } => None,
            })
            .collect();
        assert_eq!(
            stages,
            vec![
                LifeStage::Hatchling,
                LifeStage::Juvenile,
                LifeStage::Adolescent,
                LifeStage::Adult
            ]
        );
        assert_eq!(creature.abilities(), &catalog().unlocked_through(LifeStage::Adult));
    }

    #[test]
    fn record_with_stage_behind_age_is_corrupt() {
        let mut record = Creature::new_egg(&config()).record();
        record.days_alive = 9;
        assert!(matches!(
            Creature::from_record(record, &config(), &catalog()),
            Err(CreatureError::CorruptRecord { .. })
        ));
    }

    #[test]
    fn stage_never_regresses() {
        let mut c = Creature::new_egg(&config());
        let mut last = c.stage();
        for _ in 0..30 {
            c.on_new_day(&config(), &catalog());
            assert!(c.stage() >= last);
            last = c.stage();
        }
        assert_eq!(last, LifeStage::Adult);
    }

    #[test]
    fn egg_does_not_decay_and_cannot_be_fed() {
        let mut c = Creature::new_egg(&config());
        let before = c.clone();
        c.on_hour(&config());
        assert_eq!(c, before);
        assert_eq!(c.feed(&meal(false), &config()), Err(CreatureError::StillAnEgg));
        assert_eq!(c.pet(&config()), Err(CreatureError::StillAnEgg));
        assert_eq!(c.mood(&config()), Mood::Incubating);
    }

    #[test]
    fn hourly_decay_is_faster_when_hungry() {
        let mut c = hatched();
        c.hunger = 50.0;
        c.happiness = 50.0;
        c.on_hour(&config());
        assert!((c.hunger() - 47.0).abs() < 1e-9);
        assert!((c.happiness() - 49.0).abs() < 1e-9);

        c.hunger = 10.0;
        c.on_hour(&config());
        assert!((c.hunger() - 7.0).abs() < 1e-9);
        assert!((c.happiness() - 47.0).abs() < 1e-9);
    }

    #[test]
    fn stats_stay_clamped_under_long_sequences() {
        let mut c = hatched();
        for i in 0..500 {
            if i % 7 == 0 {
                c.feed(&meal(i % 14 == 0), &config()).unwrap();
            }
            if i % 3 == 0 {
                c.pet(&config()).unwrap();
            }
            c.on_hour(&config());
            for v in [c.hunger(), c.happiness(), c.stamina()] {
                assert!((0.0..=STAT_MAX).contains(&v));
            }
            assert!((0.0..=config().bond_max).contains(&c.bond()));
        }
        assert_eq!(c.bond(), config().bond_max);
    }

    #[test]
    fn feeding_favorite_gives_extra_bond_and_shifts_color() {
        let mut c = hatched();
        c.hunger = 20.0;
        let plain = c.feed(&meal(false), &config()).unwrap();
        let fav = c.feed(&meal(true), &config()).unwrap();
        assert!((plain.bond_gained - 8.0).abs() < 1e-9);
        assert!((fav.bond_gained - 12.0).abs() < 1e-9);
        assert!(c.color().r > Color::NEUTRAL.r);
        assert!(c.color().g < Color::NEUTRAL.g);
    }

    #[test]
    fn festival_multiplier_scales_feeding_bond() {
        let mut c = hatched();
        let festive = Meal {
            bond_multiplier: 1.5,
            ..meal(false)
        };
        let outcome = c.feed(&festive, &config()).unwrap();
        assert!((outcome.bond_gained - 12.0).abs() < 1e-9);
        let broken = Meal {
            bond_multiplier: f64::NAN,
            ..meal(false)
        };
        assert!(matches!(
            c.feed(&broken, &config()),
            Err(CreatureError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn feed_caps_hunger_at_max() {
        let mut c = hatched();
        c.hunger = 90.0;
        let outcome = c.feed(&meal(false), &config()).unwrap();
        assert_eq!(c.hunger(), STAT_MAX);
        assert!((outcome.hunger_gained - 10.0).abs() < 1e-9);
    }

    #[test]
    fn pet_is_flat_gain() {
        let mut c = hatched();
        c.happiness = 10.0;
        let first = c.pet(&config()).unwrap();
        let second = c.pet(&config()).unwrap();
        assert!((second.happiness - first.happiness - 18.0).abs() < 1e-9);
    }

    #[test]
    fn locked_ability_is_rejected_without_change() {
        let mut c = hatched();
        let before = c.clone();
        let err = c
            .use_ability(&AbilityId::new("rock_smash"), &catalog())
            .unwrap_err();
        assert!(matches!(err, CreatureError::AbilityLocked { .. }));
        assert_eq!(c, before);
    }

    #[test]
    fn insufficient_stamina_is_rejected_without_change() {
        let mut c = hatched();
        c.stamina = 10.0;
        let before = c.clone();
        let err = c
            .use_ability(&AbilityId::new("burrow_fetch"), &catalog())
            .unwrap_err();
        assert!(matches!(err, CreatureError::InsufficientStamina { .. }));
        assert_eq!(c, before);
    }

    #[test]
    fn instant_ability_spends_stamina_and_tags_effect() {
        let mut c = hatched();
        let effect = c
            .use_ability(&AbilityId::new("sniff_track"), &catalog())
            .unwrap();
        assert_eq!(effect.effect, crate::ability::EffectTag::Track);
        assert!((c.stamina() - 85.0).abs() < 1e-9);
    }

    #[test]
    fn unknown_ability_is_reported() {
        let mut c = hatched();
        assert!(matches!(
            c.use_ability(&AbilityId::new("teleport"), &catalog()),
            Err(CreatureError::UnknownAbility(_))
        ));
    }

    #[test]
    fn continuous_ability_drains_and_auto_stops() {
        let mut c = aged(6);
        let glide = AbilityId::new("glide");
        assert!(matches!(
            c.use_ability(&glide, &catalog()),
            Err(CreatureError::NotInstant(_))
        ));
        c.start_ability(&glide, &catalog()).unwrap();
        assert_eq!(c.active_ability(), Some(&glide));

        // No regeneration while gliding.
        c.stamina = 50.0;
        c.on_hour(&config());
        assert!((c.stamina() - 50.0).abs() < 1e-9);

        assert_eq!(c.drain_active(10.0, &catalog()), None);
        assert!((c.stamina() - 20.0).abs() < 1e-9);
        let event = c.drain_active(10.0, &catalog());
        assert_eq!(event, Some(CreatureEvent::AbilityExhausted { ability: glide }));
        assert_eq!(c.stamina(), 0.0);
        assert_eq!(c.active_ability(), None);
    }

    #[test]
    fn stop_requires_running_ability() {
        let mut c = aged(6);
        let glide = AbilityId::new("glide");
        assert!(matches!(
            c.stop_ability(&glide),
            Err(CreatureError::AbilityNotActive(_))
        ));
        c.start_ability(&glide, &catalog()).unwrap();
        c.stop_ability(&glide).unwrap();
        assert_eq!(c.active_ability(), None);
    }

    #[test]
    fn rest_refills_stamina() {
        let mut c = hatched();
        c.stamina = 5.0;
        c.rest();
        assert_eq!(c.stamina(), STAT_MAX);
        assert_eq!(c.mood(&config()), Mood::Content);
    }

    #[test]
    fn rename_validates_length() {
        let mut c = hatched();
        c.rename("  Ember  ", &config()).unwrap();
        assert_eq!(c.name(), "Ember");
        assert!(c.rename("", &config()).is_err());
        assert!(c.rename(&"x".repeat(21), &config()).is_err());
        assert_eq!(c.name(), "Ember");
    }

    #[test]
    fn record_round_trip() {
        let mut c = aged(7);
        c.feed(&meal(true), &config()).unwrap();
        c.start_ability(&AbilityId::new("glide"), &catalog()).unwrap();
        let restored = Creature::from_record(c.record(), &config(), &catalog()).unwrap();
        assert_eq!(restored, c);
    }

    #[test]
    fn record_with_mismatched_abilities_is_corrupt() {
        let mut record = aged(4).record();
        record.unlocked_abilities.insert(AbilityId::new("full_flight"));
        assert!(matches!(
            Creature::from_record(record, &config(), &catalog()),
            Err(CreatureError::CorruptRecord { .. })
        ));
    }

    #[test]
    fn old_record_without_abilities_is_recomputed() {
        let mut record = aged(4).record();
        record.unlocked_abilities.clear();
        let c = Creature::from_record(record, &config(), &catalog()).unwrap();
        assert_eq!(c.abilities(), &catalog().unlocked_through(LifeStage::Juvenile));
    }

    #[test]
    fn record_with_out_of_range_stat_is_corrupt() {
        let mut record = hatched().record();
        record.hunger = 140.0;
        assert!(Creature::from_record(record, &config(), &catalog()).is_err());
    }
}
