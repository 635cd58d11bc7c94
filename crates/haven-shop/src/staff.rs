//! Staff roster: morale, efficiency, and pep talks.
//!
//! Each staff member has a role, a fixed trait, and a morale score in
//! `[0, 100]`. Efficiency is derived from morale and trait; it speeds up
//! autonomous order taking and lowers the chance of mistakes. Morale
//! decays while a period is serving and is restored by talking to the
//! staff member, which has a cooldown measured in game hours.

use haven_types::StaffId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ShopError;

/// Upper bound of morale.
pub const MORALE_MAX: f64 = 100.0;

/// What a staff member does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    /// Takes orders and carries dishes.
    Server,
    /// Cooks.
    Chef,
    /// Clears tables.
    Busser,
}

/// Fixed personality trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffTrait {
    /// Fast but clumsy.
    Enthusiastic,
    /// Careful but prideful.
    Skilled,
    /// Slow, loses morale quickly, responds well to attention.
    Lazy,
}

impl StaffTrait {
    /// Efficiency multiplier.
    pub const fn efficiency_multiplier(self) -> f64 {
        match self {
            Self::Enthusiastic => 1.1,
            Self::Skilled => 1.0,
            Self::Lazy => 0.9,
        }
    }

    /// Morale added to (or removed from) the base talk boost.
    pub const fn talk_adjustment(self) -> f64 {
        match self {
            Self::Enthusiastic => 3.0,
            Self::Skilled => -3.0,
            Self::Lazy => 5.0,
        }
    }

    /// Multiplier on the base mistake chance.
    pub const fn mistake_factor(self) -> f64 {
        match self {
            Self::Enthusiastic => 1.5,
            Self::Skilled => 0.5,
            Self::Lazy => 1.0,
        }
    }

    /// Multiplier on morale decay.
    pub const fn decay_factor(self) -> f64 {
        match self {
            Self::Enthusiastic | Self::Skilled => 1.0,
            Self::Lazy => 1.5,
        }
    }
}

/// Static definition of a staff member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffDef {
    /// Unique id.
    pub id: StaffId,
    /// Display name.
    pub name: String,
    /// Job.
    pub role: StaffRole,
    /// Personality.
    #[serde(rename = "trait")]
    pub staff_trait: StaffTrait,
}

/// Staff tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffConfig {
    /// Morale of a new hire (default: 70).
    #[serde(default = "default_starting_morale")]
    pub starting_morale: f64,

    /// Morale lost per game hour while serving (default: 1).
    #[serde(default = "default_morale_decay")]
    pub morale_decay_per_hour: f64,

    /// Base morale gained from a talk (default: 15).
    #[serde(default = "default_talk_boost")]
    pub talk_boost: f64,

    /// Game hours between effective talks (default: 2).
    #[serde(default = "default_talk_cooldown")]
    pub talk_cooldown_hours: f64,

    /// Efficiency at zero morale before the trait multiplier (default: 0.5).
    #[serde(default = "default_min_efficiency")]
    pub min_efficiency: f64,

    /// Efficiency ceiling after the trait multiplier (default: 1.2).
    #[serde(default = "default_max_efficiency")]
    pub max_efficiency: f64,

    /// Mistake chance at efficiency 1 (default: 0.05).
    #[serde(default = "default_mistake_chance")]
    pub base_mistake_chance: f64,

    /// Below this morale, mistakes double (default: 30).
    #[serde(default = "default_low_morale")]
    pub low_morale_threshold: f64,

    /// Real seconds a server at efficiency 1 needs to take an order (default: 5).
    #[serde(default = "default_seconds_per_order")]
    pub seconds_per_order: f64,
}

impl StaffConfig {
    /// Check ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<(), ShopError> {
        let invalid = |reason: &str| ShopError::InvalidConfig {
            reason: reason.to_owned(),
        };
        if !(0.0..=MORALE_MAX).contains(&self.starting_morale) {
            return Err(invalid("starting_morale must be within [0, 100]"));
        }
        for (name, value) in [
            ("morale_decay_per_hour", self.morale_decay_per_hour),
            ("talk_boost", self.talk_boost),
            ("talk_cooldown_hours", self.talk_cooldown_hours),
            ("base_mistake_chance", self.base_mistake_chance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(&format!("{name} must be a non-negative number")));
            }
        }
        if !(self.min_efficiency > 0.0 && self.min_efficiency <= self.max_efficiency) {
            return Err(invalid("efficiency bounds must satisfy 0 < min <= max"));
        }
        if !self.seconds_per_order.is_finite() || self.seconds_per_order <= 0.0 {
            return Err(invalid("seconds_per_order must be positive"));
        }
        Ok(())
    }
}

impl Default for StaffConfig {
    fn default() -> Self {
        Self {
            starting_morale: default_starting_morale(),
            morale_decay_per_hour: default_morale_decay(),
            talk_boost: default_talk_boost(),
            talk_cooldown_hours: default_talk_cooldown(),
            min_efficiency: default_min_efficiency(),
            max_efficiency: default_max_efficiency(),
            base_mistake_chance: default_mistake_chance(),
            low_morale_threshold: default_low_morale(),
            seconds_per_order: default_seconds_per_order(),
        }
    }
}

const fn default_starting_morale() -> f64 {
    70.0
}

const fn default_morale_decay() -> f64 {
    1.0
}

const fn default_talk_boost() -> f64 {
    15.0
}

const fn default_talk_cooldown() -> f64 {
    2.0
}

const fn default_min_efficiency() -> f64 {
    0.5
}

const fn default_max_efficiency() -> f64 {
    1.2
}

const fn default_mistake_chance() -> f64 {
    0.05
}

const fn default_low_morale() -> f64 {
    30.0
}

const fn default_seconds_per_order() -> f64 {
    5.0
}

/// Persisted per-member state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffRecord {
    /// Which member.
    pub id: StaffId,
    /// Morale, 0--100.
    pub morale: f64,
    /// Absolute game hour of the last effective talk.
    #[serde(default)]
    pub last_talk_hour: Option<f64>,
    /// Partial progress toward the next order.
    #[serde(default)]
    pub order_progress: f64,
}

/// Result of a talk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TalkOutcome {
    /// Morale actually gained after clamping.
    pub gained: f64,
    /// Morale after the talk.
    pub morale: f64,
}

/// A staff member on shift.
#[derive(Debug, Clone, PartialEq)]
pub struct StaffMember {
    def: StaffDef,
    morale: f64,
    last_talk: Option<f64>,
    order_progress: f64,
}

impl StaffMember {
    /// A new hire at starting morale.
    pub fn new(def: StaffDef, config: &StaffConfig) -> Self {
        Self {
            def,
            morale: config.starting_morale,
            last_talk: None,
            order_progress: 0.0,
        }
    }

    /// Rebuild from a definition and its persisted state.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::CorruptRecord`] if the record is for someone
    /// else or holds out-of-range values.
    pub fn from_record(def: StaffDef, record: &StaffRecord) -> Result<Self, ShopError> {
        let corrupt = |reason: String| ShopError::CorruptRecord { reason };
        if record.id != def.id {
            return Err(corrupt(format!("staff record {} does not match {}", record.id, def.id)));
        }
        if !record.morale.is_finite() || !(0.0..=MORALE_MAX).contains(&record.morale) {
            return Err(corrupt(format!("{} morale {} outside [0, 100]", def.id, record.morale)));
        }
        if !record.order_progress.is_finite() || !(0.0..=1.0).contains(&record.order_progress) {
            return Err(corrupt(format!("{} order progress outside [0, 1]", def.id)));
        }
        if record.last_talk_hour.is_some_and(|h| !h.is_finite() || h < 0.0) {
            return Err(corrupt(format!("{} last talk hour is invalid", def.id)));
        }
        Ok(Self {
            def,
            morale: record.morale,
            last_talk: record.last_talk_hour,
            order_progress: record.order_progress,
        })
    }

    /// Persisted form.
    pub fn record(&self) -> StaffRecord {
        StaffRecord {
            id: self.def.id.clone(),
            morale: self.morale,
            last_talk_hour: self.last_talk,
            order_progress: self.order_progress,
        }
    }

    /// Id.
    pub const fn id(&self) -> &StaffId {
        &self.def.id
    }

    /// Static definition.
    pub const fn def(&self) -> &StaffDef {
        &self.def
    }

    /// Job.
    pub const fn role(&self) -> StaffRole {
        self.def.role
    }

    /// Morale, 0--100.
    pub const fn morale(&self) -> f64 {
        self.morale
    }

    /// Efficiency from morale and trait, capped at the configured maximum.
    pub fn efficiency(&self, config: &StaffConfig) -> f64 {
        let base = config.min_efficiency + (1.0 - config.min_efficiency) * (self.morale / MORALE_MAX);
        (base * self.def.staff_trait.efficiency_multiplier()).min(config.max_efficiency)
    }

    /// Probability that a served dish is botched.
    pub fn mistake_chance(&self, config: &StaffConfig) -> f64 {
        let efficiency = self.efficiency(config).max(f64::EPSILON);
        let mut chance = config.base_mistake_chance / efficiency;
        if self.morale < config.low_morale_threshold {
            chance *= 2.0;
        }
        (chance * self.def.staff_trait.mistake_factor()).clamp(0.0, 1.0)
    }

    /// Lose morale for `hours` of service.
    pub fn decay(&mut self, hours: f64, config: &StaffConfig) {
        let loss = config.morale_decay_per_hour * self.def.staff_trait.decay_factor() * hours.max(0.0);
        self.morale = (self.morale - loss).clamp(0.0, MORALE_MAX);
    }

    /// Give a pep talk at absolute game hour `now`.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::TalkOnCooldown`] if the previous effective talk
    /// was less than the cooldown ago. Morale is unchanged in that case.
    pub fn talk_to(&mut self, now: f64, config: &StaffConfig) -> Result<TalkOutcome, ShopError> {
        if let Some(last) = self.last_talk {
            let elapsed = now - last;
            if elapsed < config.talk_cooldown_hours {
                return Err(ShopError::TalkOnCooldown {
                    staff: self.def.id.clone(),
                    remaining_hours: config.talk_cooldown_hours - elapsed,
                });
            }
        }
        let boost = (config.talk_boost + self.def.staff_trait.talk_adjustment()).max(0.0);
        let before = self.morale;
        self.morale = (self.morale + boost).clamp(0.0, MORALE_MAX);
        self.last_talk = Some(now);
        debug!(staff = %self.def.id, morale = self.morale, "Talked to staff");
        Ok(TalkOutcome {
            gained: self.morale - before,
            morale: self.morale,
        })
    }

    /// Accrue order-taking progress for `real_seconds` of service.
    ///
    /// Progress is capped at one pending order.
    pub fn accrue_orders(&mut self, real_seconds: f64, config: &StaffConfig) {
        let rate = self.efficiency(config) / config.seconds_per_order;
        self.order_progress = (self.order_progress + rate * real_seconds.max(0.0)).min(1.0);
    }

    /// Consume one order's worth of progress if available.
    pub fn take_ready_order(&mut self) -> bool {
        if self.order_progress >= 1.0 {
            self.order_progress = 0.0;
            true
        } else {
            false
        }
    }

    /// Drop partial progress (e.g. when service ends).
    pub fn clear_progress(&mut self) {
        self.order_progress = 0.0;
    }
}

/// The shop's staff, in roster order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Roster {
    members: Vec<StaffMember>,
}

impl Roster {
    /// Hire everyone in `defs`.
    pub fn new(defs: &[StaffDef], config: &StaffConfig) -> Self {
        Self {
            members: defs.iter().cloned().map(|d| StaffMember::new(d, config)).collect(),
        }
    }

    /// Rebuild from definitions and persisted records. Members without a
    /// record start fresh.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::CorruptRecord`] for records of unknown staff or
    /// invalid values.
    pub fn restore(
        defs: &[StaffDef],
        records: &[StaffRecord],
        config: &StaffConfig,
    ) -> Result<Self, ShopError> {
        if let Some(stray) = records.iter().find(|r| !defs.iter().any(|d| d.id == r.id)) {
            return Err(ShopError::CorruptRecord {
                reason: format!("record for unknown staff member {}", stray.id),
            });
        }
        let members = defs
            .iter()
            .map(|def| match records.iter().find(|r| r.id == def.id) {
                Some(record) => StaffMember::from_record(def.clone(), record),
                None => Ok(StaffMember::new(def.clone(), config)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { members })
    }

    /// Persisted form.
    pub fn records(&self) -> Vec<StaffRecord> {
        self.members.iter().map(StaffMember::record).collect()
    }

    /// All members.
    pub fn members(&self) -> &[StaffMember] {
        &self.members
    }

    /// Mutable access to every member.
    pub fn members_mut(&mut self) -> &mut [StaffMember] {
        &mut self.members
    }

    /// Look up a member.
    pub fn get(&self, id: &StaffId) -> Option<&StaffMember> {
        self.members.iter().find(|m| m.id() == id)
    }

    /// Look up a member mutably or fail with [`ShopError::UnknownStaff`].
    pub fn require_mut(&mut self, id: &StaffId) -> Result<&mut StaffMember, ShopError> {
        self.members
            .iter_mut()
            .find(|m| m.id() == id)
            .ok_or_else(|| ShopError::UnknownStaff(id.clone()))
    }

    /// Mean efficiency across the roster (1.0 with nobody hired).
    #[allow(clippy::cast_precision_loss)]
    pub fn average_efficiency(&self, config: &StaffConfig) -> f64 {
        if self.members.is_empty() {
            return 1.0;
        }
        let total: f64 = self.members.iter().map(|m| m.efficiency(config)).sum();
        total / self.members.len() as f64
    }

    /// The server most likely to get an order right, if any.
    pub fn best_server(&self, config: &StaffConfig) -> Option<&StaffMember> {
        self.members
            .iter()
            .filter(|m| m.role() == StaffRole::Server)
            .min_by(|a, b| a.mistake_chance(config).total_cmp(&b.mistake_chance(config)))
    }
}
