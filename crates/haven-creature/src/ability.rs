//! Ability catalog and stage gating.
//!
//! Abilities are either instantaneous (a flat stamina cost per use) or
//! continuous (a stamina cost per real second while active). Each ability
//! unlocks at a life stage; a creature's ability set is always exactly the
//! abilities gated at or below its current stage.

use std::collections::{BTreeMap, BTreeSet};

use haven_types::{AbilityId, LifeStage};
use serde::{Deserialize, Serialize};

use crate::error::CreatureError;

/// How an ability spends stamina.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AbilityKind {
    /// One-shot use with a flat cost.
    Instant {
        /// Stamina per use.
        cost: f64,
    },
    /// Sustained use, drained every tick while active.
    Continuous {
        /// Stamina per real second.
        cost_per_second: f64,
    },
}

/// Gameplay effect family, interpreted by the world/UI collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTag {
    /// Digs up buried items.
    Dig,
    /// Reveals hidden items nearby.
    Track,
    /// Breaks rocks and obstacles.
    Smash,
    /// Scares nearby creatures away.
    Scare,
    /// Lights or burns things.
    Burn,
    /// Reveals the surrounding map.
    Scout,
    /// Lets the player cross gaps.
    Fly,
}

/// Static definition of an ability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityDef {
    /// Unique id.
    pub id: AbilityId,
    /// Display name.
    pub name: String,
    /// First stage at which the ability is available.
    pub unlock_stage: LifeStage,
    /// Stamina model.
    pub kind: AbilityKind,
    /// Effect family.
    pub effect: EffectTag,
    /// How long the effect lasts, in seconds (0 for immediate effects).
    #[serde(default)]
    pub duration_seconds: f64,
}

/// Tagged result of using an instantaneous ability.
#[derive(Debug, Clone, PartialEq)]
pub struct AbilityEffect {
    /// Ability used.
    pub ability: AbilityId,
    /// Effect family.
    pub effect: EffectTag,
    /// Effect duration in seconds.
    pub duration_seconds: f64,
    /// Stamina spent.
    pub stamina_spent: f64,
}

/// Validated set of ability definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct AbilityCatalog {
    defs: BTreeMap<AbilityId, AbilityDef>,
}

impl AbilityCatalog {
    /// Build a catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CreatureError::InvalidConfig`] for duplicate ids, negative
    /// or non-finite costs, or abilities gated at the egg stage.
    pub fn new(defs: Vec<AbilityDef>) -> Result<Self, CreatureError> {
        let mut map = BTreeMap::new();
        for def in defs {
            let cost = match def.kind {
                AbilityKind::Instant { cost } => cost,
                AbilityKind::Continuous { cost_per_second } => cost_per_second,
            };
            if !cost.is_finite() || cost < 0.0 {
                return Err(CreatureError::InvalidConfig {
                    reason: format!("ability {} has an invalid cost", def.id),
                });
            }
            if def.unlock_stage == LifeStage::Egg {
                return Err(CreatureError::InvalidConfig {
                    reason: format!("ability {} cannot unlock before hatching", def.id),
                });
            }
            let id = def.id.clone();
            if map.insert(id.clone(), def).is_some() {
                return Err(CreatureError::InvalidConfig {
                    reason: format!("duplicate ability id {id}"),
                });
            }
        }
        Ok(Self { defs: map })
    }

    /// The standard ability set.
    pub fn builtin() -> Self {
        let instant = |id: &str, name: &str, stage, cost, effect, duration_seconds| AbilityDef {
            id: AbilityId::new(id),
            name: name.to_owned(),
            unlock_stage: stage,
            kind: AbilityKind::Instant { cost },
            effect,
            duration_seconds,
        };
        let continuous = |id: &str, name: &str, stage, cost_per_second| AbilityDef {
            id: AbilityId::new(id),
            name: name.to_owned(),
            unlock_stage: stage,
            kind: AbilityKind::Continuous { cost_per_second },
            effect: EffectTag::Fly,
            duration_seconds: 0.0,
        };
        let defs = vec![
            instant("burrow_fetch", "Burrow Fetch", LifeStage::Hatchling, 20.0, EffectTag::Dig, 0.0),
            instant("sniff_track", "Sniff Track", LifeStage::Hatchling, 15.0, EffectTag::Track, 10.0),
            instant("rock_smash", "Rock Smash", LifeStage::Juvenile, 30.0, EffectTag::Smash, 0.0),
            instant("creature_scare", "Creature Scare", LifeStage::Juvenile, 20.0, EffectTag::Scare, 8.0),
            instant("ember_breath", "Ember Breath", LifeStage::Adolescent, 25.0, EffectTag::Burn, 3.0),
            instant("fire_breath", "Fire Breath", LifeStage::Adolescent, 40.0, EffectTag::Burn, 5.0),
            continuous("glide", "Glide", LifeStage::Adolescent, 3.0),
            instant("flight_scout", "Flight Scout", LifeStage::Adult, 50.0, EffectTag::Scout, 15.0),
            instant("fire_stream", "Fire Stream", LifeStage::Adult, 40.0, EffectTag::Burn, 6.0),
            continuous("full_flight", "Full Flight", LifeStage::Adult, 5.0),
        ];
        let mut map = BTreeMap::new();
        for def in defs {
            map.insert(def.id.clone(), def);
        }
        Self { defs: map }
    }

    /// Look up a definition.
    pub fn get(&self, id: &AbilityId) -> Option<&AbilityDef> {
        self.defs.get(id)
    }

    /// All definitions in id order.
    pub fn iter(&self) -> impl Iterator<Item = &AbilityDef> {
        self.defs.values()
    }

    /// Every ability gated at or below `stage`.
    pub fn unlocked_through(&self, stage: LifeStage) -> BTreeSet<AbilityId> {
        self.defs
            .values()
            .filter(|d| d.unlock_stage <= stage)
            .map(|d| d.id.clone())
            .collect()
    }

    /// Abilities gated exactly at `stage`.
    pub fn gated_at(&self, stage: LifeStage) -> Vec<AbilityId> {
        self.defs
            .values()
            .filter(|d| d.unlock_stage == stage)
            .map(|d| d.id.clone())
            .collect()
    }
}
