//! Explorable zones and stage-gated travel.
//!
//! Each zone names the minimum creature stage needed to reach it. A
//! narrative outcome can unlock a zone early, regardless of stage.

use std::collections::{BTreeMap, BTreeSet};

use haven_types::{LifeStage, ZoneId};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::WorldError;

/// Static definition of a zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDef {
    /// Unique id.
    pub id: ZoneId,
    /// Display name.
    pub name: String,
    /// Minimum creature stage to travel there.
    pub required_stage: LifeStage,
}

/// Zone graph plus the player's position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZoneMap {
    zones: BTreeMap<ZoneId, ZoneDef>,
    current: ZoneId,
    unlocked: BTreeSet<ZoneId>,
}

impl ZoneMap {
    /// Build the map with the player standing in `start`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidTuning`] for duplicate zone ids and
    /// [`WorldError::UnknownZone`] if `start` is not defined.
    pub fn new(defs: Vec<ZoneDef>, start: ZoneId) -> Result<Self, WorldError> {
        let mut zones = BTreeMap::new();
        for def in defs {
            let id = def.id.clone();
            if zones.insert(id.clone(), def).is_some() {
                return Err(WorldError::InvalidTuning {
                    reason: format!("duplicate zone id {id}"),
                });
            }
        }
        if !zones.contains_key(&start) {
            return Err(WorldError::UnknownZone(start));
        }
        Ok(Self {
            zones,
            current: start,
            unlocked: BTreeSet::new(),
        })
    }

    /// Restore position and narrative unlocks.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownZone`] if any id is not defined.
    pub fn restore(&mut self, current: ZoneId, unlocked: BTreeSet<ZoneId>) -> Result<(), WorldError> {
        if let Some(unknown) = std::iter::once(&current)
            .chain(unlocked.iter())
            .find(|z| !self.zones.contains_key(*z))
        {
            return Err(WorldError::UnknownZone(unknown.clone()));
        }
        self.current = current;
        self.unlocked = unlocked;
        Ok(())
    }

    /// Zone the player is in.
    pub const fn current(&self) -> &ZoneId {
        &self.current
    }

    /// Zones unlocked by the story.
    pub const fn unlocked(&self) -> &BTreeSet<ZoneId> {
        &self.unlocked
    }

    /// All zone definitions in id order.
    pub fn zones(&self) -> impl Iterator<Item = &ZoneDef> {
        self.zones.values()
    }

    /// Whether a zone is defined.
    pub fn contains(&self, zone: &ZoneId) -> bool {
        self.zones.contains_key(zone)
    }

    /// Whether the creature's stage (or a story unlock) opens the zone.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownZone`] if the zone is not defined.
    pub fn is_accessible(&self, zone: &ZoneId, stage: LifeStage) -> Result<bool, WorldError> {
        let def = self
            .zones
            .get(zone)
            .ok_or_else(|| WorldError::UnknownZone(zone.clone()))?;
        Ok(stage >= def.required_stage || self.unlocked.contains(zone))
    }

    /// Move the player to another zone.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownZone`] or [`WorldError::ZoneLocked`].
    pub fn travel(&mut self, zone: &ZoneId, stage: LifeStage) -> Result<(), WorldError> {
        if !self.is_accessible(zone, stage)? {
            let required = self
                .zones
                .get(zone)
                .map_or(LifeStage::Adult, |d| d.required_stage);
            return Err(WorldError::ZoneLocked {
                zone: zone.clone(),
                required,
            });
        }
        if &self.current != zone {
            info!(from = %self.current, to = %zone, "Travelled");
            self.current = zone.clone();
        }
        Ok(())
    }

    /// Open a zone regardless of stage. Returns `true` if newly unlocked.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownZone`] if the zone is not defined.
    pub fn unlock(&mut self, zone: &ZoneId) -> Result<bool, WorldError> {
        if !self.zones.contains_key(zone) {
            return Err(WorldError::UnknownZone(zone.clone()));
        }
        Ok(self.unlocked.insert(zone.clone()))
    }
}
