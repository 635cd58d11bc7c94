//! First-instance milestones.
//!
//! An achievement is a one-way latch on a progress rule: once the world
//! satisfies the rule it unlocks, pays its gold reward, and never fires
//! again. Rules are checked after every tick and after player operations
//! against a [`Progress`] summary assembled by the driver.

use std::collections::BTreeSet;

use haven_story::Chapter;
use haven_types::{AchievementId, LifeStage};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::content::ContentError;

/// What has to be true for an achievement to unlock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AchievementRule {
    /// The creature reached `stage` or later.
    StageReached {
        /// Minimum stage.
        stage: LifeStage,
    },
    /// Bond is at least `bond`.
    BondAtLeast {
        /// Minimum bond.
        bond: f64,
    },
    /// Shop reputation is at least `reputation`.
    ReputationAtLeast {
        /// Minimum reputation.
        reputation: u32,
    },
    /// At least `count` customers were served and paid.
    CustomersServed {
        /// Minimum served customers.
        count: u64,
    },
    /// At least `count` festivals were held.
    FestivalsHeld {
        /// Minimum festivals.
        count: u32,
    },
    /// The story reached `chapter` or later.
    ChapterReached {
        /// Minimum chapter.
        chapter: Chapter,
    },
}

impl AchievementRule {
    fn is_met(&self, progress: &Progress, served: u64) -> bool {
        match self {
            Self::StageReached { stage } => progress.stage >= *stage,
            Self::BondAtLeast { bond } => progress.bond >= *bond,
            Self::ReputationAtLeast { reputation } => progress.reputation >= *reputation,
            Self::CustomersServed { count } => served >= *count,
            Self::FestivalsHeld { count } => progress.festivals_held >= *count,
            Self::ChapterReached { chapter } => progress.chapter >= *chapter,
        }
    }
}

/// Static definition of an achievement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementDef {
    /// Unique id.
    pub id: AchievementId,
    /// Display name.
    pub name: String,
    /// Unlock rule.
    pub rule: AchievementRule,
    /// Gold paid on unlock.
    #[serde(default)]
    pub reward_gold: u64,
}

/// Snapshot of the world that rules are checked against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    /// Creature life stage.
    pub stage: LifeStage,
    /// Creature bond.
    pub bond: f64,
    /// Shop reputation.
    pub reputation: u32,
    /// Festivals held so far.
    pub festivals_held: u32,
    /// Story chapter.
    pub chapter: Chapter,
}

/// Persisted achievement state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementRecord {
    /// Achievements already unlocked.
    #[serde(default)]
    pub unlocked: BTreeSet<AchievementId>,
    /// Customers served and paid across the whole game.
    #[serde(default)]
    pub customers_served: u64,
}

/// Achievement definitions and which ones are unlocked.
#[derive(Debug, Clone, PartialEq)]
pub struct Achievements {
    defs: Vec<AchievementDef>,
    unlocked: BTreeSet<AchievementId>,
    customers_served: u64,
}

impl Achievements {
    /// Build the tracker with nothing unlocked.
    ///
    /// # Errors
    ///
    /// Returns [`ContentError::Invalid`] for duplicate ids or a bond
    /// threshold that is not finite.
    pub fn new(defs: Vec<AchievementDef>) -> Result<Self, ContentError> {
        let mut seen = BTreeSet::new();
        for def in &defs {
            if !seen.insert(&def.id) {
                return Err(ContentError::Invalid {
                    reason: format!("duplicate achievement id {}", def.id),
                });
            }
            if let AchievementRule::BondAtLeast { bond } = def.rule
                && !bond.is_finite()
            {
                return Err(ContentError::Invalid {
                    reason: format!("achievement {} has a non-finite bond threshold", def.id),
                });
            }
        }
        Ok(Self {
            defs,
            unlocked: BTreeSet::new(),
            customers_served: 0,
        })
    }

    /// Count one served customer.
    pub const fn record_service(&mut self) {
        self.customers_served = self.customers_served.saturating_add(1);
    }

    /// Customers served and paid across the whole game.
    pub const fn customers_served(&self) -> u64 {
        self.customers_served
    }

    /// Unlock every achievement whose rule now holds, returning the new ones
    /// in definition order.
    pub fn check(&mut self, progress: &Progress) -> Vec<AchievementDef> {
        let served = self.customers_served;
        let fresh: Vec<AchievementDef> = self
            .defs
            .iter()
            .filter(|def| !self.unlocked.contains(&def.id) && def.rule.is_met(progress, served))
            .cloned()
            .collect();
        for def in &fresh {
            info!(achievement = %def.id, name = %def.name, reward = def.reward_gold, "Achievement unlocked");
            self.unlocked.insert(def.id.clone());
        }
        fresh
    }

    /// Whether `id` is unlocked.
    pub fn is_unlocked(&self, id: &AchievementId) -> bool {
        self.unlocked.contains(id)
    }

    /// Unlocked ids.
    pub const fn unlocked(&self) -> &BTreeSet<AchievementId> {
        &self.unlocked
    }

    /// All definitions.
    pub fn defs(&self) -> &[AchievementDef] {
        &self.defs
    }

    /// Rebuild the tracker's state from a record, leaving `self` untouched.
    ///
    /// Ids this build does not define are dropped rather than refused, so
    /// content can retire an achievement without breaking old saves.
    #[must_use]
    pub fn restored(&self, record: AchievementRecord) -> Self {
        let known: BTreeSet<AchievementId> = record
            .unlocked
            .into_iter()
            .filter(|id| self.defs.iter().any(|d| &d.id == id))
            .collect();
        Self {
            defs: self.defs.clone(),
            unlocked: known,
            customers_served: record.customers_served,
        }
    }

    /// Persisted form.
    pub fn record(&self) -> AchievementRecord {
        AchievementRecord {
            unlocked: self.unlocked.clone(),
            customers_served: self.customers_served,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn def(id: &str, rule: AchievementRule, reward_gold: u64) -> AchievementDef {
        AchievementDef {
            id: AchievementId::new(id),
            name: id.to_owned(),
            rule,
            reward_gold,
        }
    }

    fn progress() -> Progress {
        Progress {
            stage: LifeStage::Egg,
            bond: 0.0,
            reputation: 0,
            festivals_held: 0,
            chapter: Chapter::Prologue,
        }
    }

    fn tracker() -> Achievements {
        Achievements::new(vec![
            def("hatched", AchievementRule::StageReached { stage: LifeStage::Hatchling }, 25),
            def("famous", AchievementRule::ReputationAtLeast { reputation: 100 }, 100),
            def("first_guest", AchievementRule::CustomersServed { count: 1 }, 10),
        ])
        .unwrap()
    }

    #[test]
    fn unlocks_once_when_the_rule_holds() {
        let mut achievements = tracker();
        assert!(achievements.check(&progress()).is_empty());

        let grown = Progress {
            stage: LifeStage::Juvenile,
            ..progress()
        };
        let first = achievements.check(&grown);
        assert_eq!(first.len(), 1);
        assert_eq!(first.first().map(|d| d.reward_gold), Some(25));
        assert!(achievements.is_unlocked(&AchievementId::new("hatched")));
        assert!(achievements.check(&grown).is_empty());
    }

    #[test]
    fn served_customers_are_counted_by_the_tracker() {
        let mut achievements = tracker();
        achievements.record_service();
        let unlocked = achievements.check(&progress());
        assert_eq!(unlocked.len(), 1);
        assert_eq!(achievements.customers_served(), 1);
    }

    #[test]
    fn several_can_unlock_together_in_definition_order() {
        let mut achievements = tracker();
        achievements.record_service();
        let everything = Progress {
            stage: LifeStage::Adult,
            reputation: 400,
            ..progress()
        };
        let ids: Vec<String> = achievements
            .check(&everything)
            .iter()
            .map(|d| d.id.to_string())
            .collect();
        assert_eq!(ids, ["hatched", "famous", "first_guest"]);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let rule = AchievementRule::FestivalsHeld { count: 1 };
        let err = Achievements::new(vec![def("a", rule.clone(), 0), def("a", rule, 0)]).unwrap_err();
        assert!(matches!(err, ContentError::Invalid { .. }));
    }

    #[test]
    fn record_round_trips_and_drops_retired_ids() {
        let mut achievements = tracker();
        achievements.record_service();
        achievements.check(&progress());
        let mut record = achievements.record();
        let restored = tracker().restored(record.clone());
        assert_eq!(restored, achievements);

        record.unlocked.insert(AchievementId::new("retired"));
        let restored = tracker().restored(record);
        assert!(!restored.is_unlocked(&AchievementId::new("retired")));
    }

    #[test]
    fn rules_parse_from_yaml() {
        let yaml = r"
id: storyteller
name: Storyteller
rule:
  type: chapter_reached
  chapter: chapter2
reward_gold: 40
";
        let def: AchievementDef = serde_yml::from_str(yaml).unwrap();
        assert_eq!(
            def.rule,
            AchievementRule::ChapterReached {
                chapter: Chapter::Chapter2
            }
        );
        assert_eq!(def.reward_gold, 40);
    }
}
