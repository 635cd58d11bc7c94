//! Reputation score and the tiers derived from it.
//!
//! Reputation is an integer in `[0, REP_MAX]`. Every change goes through
//! [`Reputation::apply`], which clamps, so no sequence of customer
//! feedback, skip penalties, or narrative outcomes can push it out of
//! range. The tier controls how many customers arrive per spawn roll and
//! which recipes are unlocked.

use serde::{Deserialize, Serialize};

use crate::error::ShopError;

/// Highest reachable reputation.
pub const REP_MAX: u32 = 1000;

/// Banded reputation ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReputationTier {
    /// Nobody has heard of the shop.
    Unknown,
    /// A local favourite.
    Local,
    /// Known across town.
    Town,
    /// Famous in the region.
    Regional,
    /// Legendary.
    Legendary,
}

impl ReputationTier {
    /// All tiers from lowest to highest.
    pub const ALL: [Self; 5] = [
        Self::Unknown,
        Self::Local,
        Self::Town,
        Self::Regional,
        Self::Legendary,
    ];
}

/// Arrival behaviour for one tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierBand {
    /// Lowest reputation in the tier.
    pub min_reputation: u32,
    /// Fewest customers per successful spawn roll.
    pub min_customers: u32,
    /// Most customers per successful spawn roll.
    pub max_customers: u32,
    /// Probability that a spawn roll produces anyone.
    pub spawn_chance: f64,
}

impl TierBand {
    const fn new(min_reputation: u32, min_customers: u32, max_customers: u32, spawn_chance: f64) -> Self {
        Self {
            min_reputation,
            min_customers,
            max_customers,
            spawn_chance,
        }
    }
}

/// Tier boundaries and arrival bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReputationConfig {
    /// Reputation at game start (default: 0).
    #[serde(default)]
    pub starting: u32,

    /// Unknown tier (default: from 0, 1--2 customers, 30%).
    #[serde(default = "default_unknown")]
    pub unknown: TierBand,

    /// Local tier (default: from 50, 2--4 customers, 40%).
    #[serde(default = "default_local")]
    pub local: TierBand,

    /// Town tier (default: from 150, 3--6 customers, 50%).
    #[serde(default = "default_town")]
    pub town: TierBand,

    /// Regional tier (default: from 300, 5--8 customers, 60%).
    #[serde(default = "default_regional")]
    pub regional: TierBand,

    /// Legendary tier (default: from 500, 7--10 customers, 70%).
    #[serde(default = "default_legendary")]
    pub legendary: TierBand,

    /// Extra tip fraction at the legendary tier (default: 0.25).
    #[serde(default = "default_legendary_tip_bonus")]
    pub legendary_tip_bonus: f64,
}

impl ReputationConfig {
    /// Band for a tier.
    pub const fn band(&self, tier: ReputationTier) -> &TierBand {
        match tier {
            ReputationTier::Unknown => &self.unknown,
            ReputationTier::Local => &self.local,
            ReputationTier::Town => &self.town,
            ReputationTier::Regional => &self.regional,
            ReputationTier::Legendary => &self.legendary,
        }
    }

    /// Tier containing `value`.
    pub fn tier_for(&self, value: u32) -> ReputationTier {
        ReputationTier::ALL
            .iter()
            .rev()
            .find(|t| value >= self.band(**t).min_reputation)
            .copied()
            .unwrap_or(ReputationTier::Unknown)
    }

    /// Check ordering and ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<(), ShopError> {
        if self.unknown.min_reputation != 0 {
            return Err(invalid("the unknown tier must start at 0"));
        }
        let mut previous: Option<u32> = None;
        for tier in ReputationTier::ALL {
            let band = self.band(tier);
            if previous.is_some_and(|p| band.min_reputation <= p) {
                return Err(invalid(&format!("tier {tier:?} must start above the previous tier")));
            }
            if band.min_reputation > REP_MAX {
                return Err(invalid(&format!("tier {tier:?} starts above {REP_MAX}")));
            }
            if band.min_customers == 0 || band.min_customers > band.max_customers {
                return Err(invalid(&format!("tier {tier:?} has an empty customer band")));
            }
            if !(0.0..=1.0).contains(&band.spawn_chance) {
                return Err(invalid(&format!("tier {tier:?} spawn chance must be within [0, 1]")));
            }
            previous = Some(band.min_reputation);
        }
        if self.starting > REP_MAX {
            return Err(invalid("starting reputation exceeds the maximum"));
        }
        if !self.legendary_tip_bonus.is_finite() || self.legendary_tip_bonus < 0.0 {
            return Err(invalid("legendary_tip_bonus must be non-negative"));
        }
        Ok(())
    }
}

impl Default for ReputationConfig {
    fn default() -> Self {
        Self {
            starting: 0,
            unknown: default_unknown(),
            local: default_local(),
            town: default_town(),
            regional: default_regional(),
            legendary: default_legendary(),
            legendary_tip_bonus: default_legendary_tip_bonus(),
        }
    }
}

fn invalid(reason: &str) -> ShopError {
    ShopError::InvalidConfig {
        reason: reason.to_owned(),
    }
}

const fn default_unknown() -> TierBand {
    TierBand::new(0, 1, 2, 0.3)
}

const fn default_local() -> TierBand {
    TierBand::new(50, 2, 4, 0.4)
}

const fn default_town() -> TierBand {
    TierBand::new(150, 3, 6, 0.5)
}

const fn default_regional() -> TierBand {
    TierBand::new(300, 5, 8, 0.6)
}

const fn default_legendary() -> TierBand {
    TierBand::new(500, 7, 10, 0.7)
}

const fn default_legendary_tip_bonus() -> f64 {
    0.25
}

/// Clamped reputation score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reputation(u32);

impl Reputation {
    /// Build a score, clamping to `REP_MAX`.
    pub fn new(value: u32) -> Self {
        Self(value.min(REP_MAX))
    }

    /// Current score.
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Apply a signed change, clamping to `[0, REP_MAX]`.
    ///
    /// Returns the change actually applied.
    pub fn apply(&mut self, delta: i32) -> i32 {
        let before = i64::from(self.0);
        let after = before.saturating_add(i64::from(delta)).clamp(0, i64::from(REP_MAX));
        self.0 = u32::try_from(after).unwrap_or(REP_MAX);
        i32::try_from(after.saturating_sub(before)).unwrap_or(0)
    }
}
