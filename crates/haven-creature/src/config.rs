//! Tuning for creature growth and stats.
//!
//! Loaded from the `creature` section of the simulation config. Every
//! field has a default, so an absent section gives the standard game.
//! Stat rates are per in-game hour.

use haven_types::LifeStage;
use serde::{Deserialize, Serialize};

use crate::error::CreatureError;

/// `daysAlive` at which each stage begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageThresholds {
    /// Hatches on this day (default: 2).
    pub hatchling: u32,
    /// Becomes a juvenile (default: 4).
    pub juvenile: u32,
    /// Becomes an adolescent (default: 6).
    pub adolescent: u32,
    /// Fully grown (default: 10).
    pub adult: u32,
}

impl StageThresholds {
    /// Day count at which `stage` begins. The egg stage begins at 0.
    pub const fn threshold(&self, stage: LifeStage) -> u32 {
        match stage {
            LifeStage::Egg => 0,
            LifeStage::Hatchling => self.hatchling,
            LifeStage::Juvenile => self.juvenile,
            LifeStage::Adolescent => self.adolescent,
            LifeStage::Adult => self.adult,
        }
    }

    /// The stage a creature of `days_alive` days should be in.
    pub fn stage_for(&self, days_alive: u32) -> LifeStage {
        LifeStage::ALL
            .iter()
            .rev()
            .find(|s| days_alive >= self.threshold(**s))
            .copied()
            .unwrap_or(LifeStage::Egg)
    }
}

impl Default for StageThresholds {
    fn default() -> Self {
        Self {
            hatchling: 2,
            juvenile: 4,
            adolescent: 6,
            adult: 10,
        }
    }
}

/// Creature tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureConfig {
    /// Days at which each stage begins.
    #[serde(default)]
    pub stage_thresholds: StageThresholds,

    /// Hunger lost per hour (default: 3).
    #[serde(default = "default_hunger_decay")]
    pub hunger_decay_per_hour: f64,

    /// Happiness lost per hour while fed (default: 1).
    #[serde(default = "default_happiness_decay")]
    pub happiness_decay_per_hour: f64,

    /// Below this hunger, happiness decays faster (default: 40).
    #[serde(default = "default_low_hunger")]
    pub low_hunger_threshold: f64,

    /// Happiness decay multiplier while hungry (default: 2).
    #[serde(default = "default_hungry_multiplier")]
    pub hungry_happiness_multiplier: f64,

    /// Stamina regained per hour with no continuous ability running (default: 8).
    #[serde(default = "default_stamina_regen")]
    pub stamina_regen_per_hour: f64,

    /// Bond gained per feeding (default: 8).
    #[serde(default = "default_feed_bond")]
    pub feed_bond_gain: f64,

    /// Extra bond when the meal is a favourite (default: 4).
    #[serde(default = "default_favorite_bond")]
    pub favorite_bond_bonus: f64,

    /// Happiness gained per pet (default: 18).
    #[serde(default = "default_pet_happiness")]
    pub pet_happiness_gain: f64,

    /// Bond gained per pet (default: 5).
    #[serde(default = "default_pet_bond")]
    pub pet_bond_gain: f64,

    /// Fraction of the way colour moves toward a meal's influence (default: 0.05).
    #[serde(default = "default_color_blend")]
    pub color_blend_factor: f64,

    /// Upper bound of bond (default: 500).
    #[serde(default = "default_bond_max")]
    pub bond_max: f64,

    /// Hunger at or below which the creature is "hungry" (default: 40).
    #[serde(default = "default_low_hunger")]
    pub hunger_warning: f64,

    /// Happiness at or below which the creature is "sad" (default: 40).
    #[serde(default = "default_happiness_warning")]
    pub happiness_warning: f64,

    /// Stamina at or below which the creature is "tired" (default: 25).
    #[serde(default = "default_stamina_warning")]
    pub stamina_warning: f64,

    /// Hunger of a freshly hatched creature (default: 80).
    #[serde(default = "default_starting_hunger")]
    pub starting_hunger: f64,

    /// Happiness of a freshly hatched creature (default: 70).
    #[serde(default = "default_starting_happiness")]
    pub starting_happiness: f64,

    /// Longest accepted name in characters (default: 20).
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,
}

impl CreatureConfig {
    /// Check ranges and threshold ordering.
    ///
    /// # Errors
    ///
    /// Returns [`CreatureError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<(), CreatureError> {
        let t = &self.stage_thresholds;
        if !(t.hatchling < t.juvenile && t.juvenile < t.adolescent && t.adolescent < t.adult) {
            return Err(CreatureError::InvalidConfig {
                reason: "stage thresholds must be strictly increasing".to_owned(),
            });
        }
        let rates = [
            ("hunger_decay_per_hour", self.hunger_decay_per_hour),
            ("happiness_decay_per_hour", self.happiness_decay_per_hour),
            ("hungry_happiness_multiplier", self.hungry_happiness_multiplier),
            ("stamina_regen_per_hour", self.stamina_regen_per_hour),
            ("feed_bond_gain", self.feed_bond_gain),
            ("favorite_bond_bonus", self.favorite_bond_bonus),
            ("pet_happiness_gain", self.pet_happiness_gain),
            ("pet_bond_gain", self.pet_bond_gain),
            ("bond_max", self.bond_max),
        ];
        for (name, value) in rates {
            if !value.is_finite() || value < 0.0 {
                return Err(CreatureError::InvalidConfig {
                    reason: format!("{name} must be a non-negative number"),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.color_blend_factor) {
            return Err(CreatureError::InvalidConfig {
                reason: "color_blend_factor must be within [0, 1]".to_owned(),
            });
        }
        for (name, value) in [
            ("starting_hunger", self.starting_hunger),
            ("starting_happiness", self.starting_happiness),
            ("low_hunger_threshold", self.low_hunger_threshold),
        ] {
            if !(0.0..=100.0).contains(&value) {
                return Err(CreatureError::InvalidConfig {
                    reason: format!("{name} must be within [0, 100]"),
                });
            }
        }
        if self.max_name_len == 0 {
            return Err(CreatureError::InvalidConfig {
                reason: "max_name_len must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

impl Default for CreatureConfig {
    fn default() -> Self {
        Self {
            stage_thresholds: StageThresholds::default(),
            hunger_decay_per_hour: default_hunger_decay(),
            happiness_decay_per_hour: default_happiness_decay(),
            low_hunger_threshold: default_low_hunger(),
            hungry_happiness_multiplier: default_hungry_multiplier(),
            stamina_regen_per_hour: default_stamina_regen(),
            feed_bond_gain: default_feed_bond(),
            favorite_bond_bonus: default_favorite_bond(),
            pet_happiness_gain: default_pet_happiness(),
            pet_bond_gain: default_pet_bond(),
            color_blend_factor: default_color_blend(),
            bond_max: default_bond_max(),
            hunger_warning: default_low_hunger(),
            happiness_warning: default_happiness_warning(),
            stamina_warning: default_stamina_warning(),
            starting_hunger: default_starting_hunger(),
            starting_happiness: default_starting_happiness(),
            max_name_len: default_max_name_len(),
        }
    }
}

const fn default_hunger_decay() -> f64 {
    3.0
}

const fn default_happiness_decay() -> f64 {
    1.0
}

const fn default_low_hunger() -> f64 {
    40.0
}

const fn default_hungry_multiplier() -> f64 {
    2.0
}

const fn default_stamina_regen() -> f64 {
    8.0
}

const fn default_feed_bond() -> f64 {
    8.0
}

const fn default_favorite_bond() -> f64 {
    4.0
}

const fn default_pet_happiness() -> f64 {
    18.0
}

const fn default_pet_bond() -> f64 {
    5.0
}

const fn default_color_blend() -> f64 {
    0.05
}

const fn default_bond_max() -> f64 {
    500.0
}

const fn default_happiness_warning() -> f64 {
    40.0
}

const fn default_stamina_warning() -> f64 {
    25.0
}

const fn default_starting_hunger() -> f64 {
    80.0
}

const fn default_starting_happiness() -> f64 {
    70.0
}

const fn default_max_name_len() -> usize {
    20
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        CreatureConfig::default().validate().unwrap();
    }

    #[test]
    fn stage_for_days() {
        let t = StageThresholds::default();
        assert_eq!(t.stage_for(0), LifeStage::Egg);
        assert_eq!(t.stage_for(1), LifeStage::Egg);
        assert_eq!(t.stage_for(2), LifeStage::Hatchling);
        assert_eq!(t.stage_for(5), LifeStage::Juvenile);
        assert_eq!(t.stage_for(6), LifeStage::Adolescent);
        assert_eq!(t.stage_for(400), LifeStage::Adult);
    }

    #[test]
    fn unordered_thresholds_are_rejected() {
        let config = CreatureConfig {
            stage_thresholds: StageThresholds {
                hatchling: 3,
                juvenile: 3,
                adolescent: 6,
                adult: 10,
            },
            ..CreatureConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config: CreatureConfig =
            serde_yml::from_str("hunger_decay_per_hour: 5.0\nbond_max: 300.0\n").unwrap();
        assert_eq!(config.hunger_decay_per_hour, 5.0);
        assert_eq!(config.bond_max, 300.0);
        assert_eq!(config.pet_bond_gain, 5.0);
        assert_eq!(config.stage_thresholds, StageThresholds::default());
    }
}
