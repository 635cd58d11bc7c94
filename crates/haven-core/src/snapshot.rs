//! Save documents: the persisted shape of a whole simulation.
//!
//! A document is compact JSON with one section per subsystem. The current
//! schema carries an FNV-1a 64 checksum of its canonical form (keys sorted,
//! checksum removed) so a single flipped byte is caught on load.
//!
//! Loading is all-or-nothing. Every section is validated into a fresh
//! component value first and the live simulation is only replaced once all
//! of them succeed. Older schema versions load best-effort with a warning
//! and a [`RestoreReport`] naming the sections that fell back to defaults;
//! newer ones are refused.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use haven_creature::{Creature, CreatureRecord};
use haven_shop::{FestivalRecord, ShopRecord};
use haven_story::StoryRecord;
use haven_types::{SimRng, Weather, ZoneId, fnv1a64};
use haven_world::{Inventory, InventoryRecord, SpawnPointRecord, WeatherRoller};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::achievement::AchievementRecord;
use crate::clock::ClockRecord;
use crate::error::SimError;
use crate::simulation::{SimState, Simulation};

/// Schema version written by this build.
pub const SCHEMA_VERSION: u32 = 3;

/// Sections a document may leave out; each falls back to its default.
const OPTIONAL_SECTIONS: [&str; 3] = ["story", "festivals", "achievements"];

/// Errors raised while writing or reading a save document.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The document is not valid JSON or does not have the expected shape.
    #[error("malformed save document: {source}")]
    Json {
        /// The underlying JSON error.
        source: serde_json::Error,
    },

    /// The document was written by a newer build.
    #[error("save schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the document.
        found: u64,
        /// Newest version this build reads.
        supported: u32,
    },

    /// A current-schema document has no checksum.
    #[error("save document has no checksum")]
    MissingChecksum,

    /// The checksum does not match the content.
    #[error("checksum mismatch: document says {expected}, content hashes to {actual}")]
    ChecksumMismatch {
        /// Checksum stored in the document.
        expected: String,
        /// Checksum of the content as loaded.
        actual: String,
    },

    /// A section parsed but failed validation.
    #[error("invalid {section} section: {reason}")]
    Invalid {
        /// Section name.
        section: &'static str,
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_json::Error> for SnapshotError {
    fn from(source: serde_json::Error) -> Self {
        Self::Json { source }
    }
}

/// Document header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveMeta {
    /// Save slot.
    pub slot: u32,
    /// Schema version the document was written with.
    pub schema_version: u32,
    /// Real seconds played.
    #[serde(default)]
    pub playtime_seconds: f64,
    /// When the document was written.
    pub timestamp: DateTime<Utc>,
    /// FNV-1a 64 of the canonical document, lowercase hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// World section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldRecord {
    /// Zone the player is in.
    pub current_location: ZoneId,
    /// Zones opened by the story.
    #[serde(default)]
    pub unlocked_zones: BTreeSet<ZoneId>,
    /// Per-point gather and roll state.
    #[serde(default, rename = "spawnPointState")]
    pub spawn_points: Vec<SpawnPointRecord>,
    /// Today's weather.
    pub weather: Weather,
    /// Tomorrow's forecast.
    pub pending_weather: Weather,
    /// State of the driver's running random stream.
    #[serde(default)]
    pub rng_state: Option<u64>,
}

/// A whole saved game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveDocument {
    /// Header.
    pub meta: SaveMeta,
    /// Clock.
    pub clock: ClockRecord,
    /// Creature.
    pub creature: CreatureRecord,
    /// Containers and gold.
    pub inventory: InventoryRecord,
    /// Shop, staff, and customers.
    pub shop: ShopRecord,
    /// Position, spawn points, weather, and randomness.
    pub world: WorldRecord,
    /// Story progress.
    #[serde(default)]
    pub story: StoryRecord,
    /// Festival calendar.
    #[serde(default)]
    pub festivals: FestivalRecord,
    /// Unlocked milestones.
    #[serde(default)]
    pub achievements: AchievementRecord,
}

/// How a loaded document differed from one this build would write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Schema version the document was written with, when older than
    /// [`SCHEMA_VERSION`].
    pub migrated_from: Option<u32>,
    /// Optional sections missing from the document, now at their defaults.
    pub defaulted: Vec<&'static str>,
}

impl RestoreReport {
    /// Whether the document loaded exactly as written.
    pub const fn is_clean(&self) -> bool {
        self.migrated_from.is_none() && self.defaulted.is_empty()
    }
}

impl Simulation {
    /// Capture the whole simulation as a document.
    pub fn save_document(&self, slot: u32, timestamp: DateTime<Utc>) -> SaveDocument {
        let state = &self.state;
        SaveDocument {
            meta: SaveMeta {
                slot,
                schema_version: SCHEMA_VERSION,
                playtime_seconds: state.playtime_seconds,
                timestamp,
                checksum: None,
            },
            clock: state.clock.record(),
            creature: state.creature.record(),
            inventory: state.inventory.record(),
            shop: state.shop.record(),
            world: WorldRecord {
                current_location: state.zones.current().clone(),
                unlocked_zones: state.zones.unlocked().clone(),
                spawn_points: state.spawns.records(),
                weather: state.weather.today(),
                pending_weather: state.weather.forecast(),
                rng_state: Some(state.rng.state()),
            },
            story: state.narrator.record(),
            festivals: state.festivals.record(),
            achievements: state.achievements.record(),
        }
    }

    /// Serialise the simulation with a checksum, stamped with `timestamp`.
    ///
    /// # Errors
    ///
    /// [`SimError::Snapshot`] if serialisation fails.
    pub fn snapshot_at(&self, slot: u32, timestamp: DateTime<Utc>) -> Result<String, SimError> {
        let mut document = self.save_document(slot, timestamp);
        let canonical = canonical_form(serde_json::to_value(&document).map_err(SnapshotError::from)?);
        document.meta.checksum = Some(checksum(&canonical));
        Ok(serde_json::to_string(&document).map_err(SnapshotError::from)?)
    }

    /// Serialise the simulation with a checksum, stamped now.
    ///
    /// # Errors
    ///
    /// [`SimError::Snapshot`] if serialisation fails.
    pub fn snapshot(&self, slot: u32) -> Result<String, SimError> {
        self.snapshot_at(slot, Utc::now())
    }

    /// Replace the live simulation with a saved one.
    ///
    /// Listeners stay registered; buffered events are dropped. Returns what
    /// had to be migrated or defaulted on the way in.
    ///
    /// # Errors
    ///
    /// [`SimError::Snapshot`] for anything wrong with the document. The
    /// live simulation is unchanged on every error.
    pub fn restore(&mut self, text: &str) -> Result<RestoreReport, SimError> {
        let (document, report) = parse_document(text)?;
        let restored = self.state.restored(document)?;
        self.state = restored;
        info!(
            day = self.state.clock.day(),
            hour = self.state.clock.hour(),
            migrated_from = ?report.migrated_from,
            defaulted = ?report.defaulted,
            "Snapshot restored"
        );
        Ok(report)
    }
}

/// Parse, version-check, and verify a document without touching any state.
///
/// # Errors
///
/// [`SnapshotError::Json`], [`SnapshotError::UnsupportedVersion`],
/// [`SnapshotError::MissingChecksum`], [`SnapshotError::ChecksumMismatch`],
/// or [`SnapshotError::Invalid`] for a malformed header.
pub fn parse_document(text: &str) -> Result<(SaveDocument, RestoreReport), SnapshotError> {
    let mut value: serde_json::Value = serde_json::from_str(text)?;

    let version = value
        .pointer("/meta/schemaVersion")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| SnapshotError::Invalid {
            section: "meta",
            reason: "missing schema version".to_owned(),
        })?;
    if version > u64::from(SCHEMA_VERSION) {
        return Err(SnapshotError::UnsupportedVersion {
            found: version,
            supported: SCHEMA_VERSION,
        });
    }

    let stored = value
        .get_mut("meta")
        .and_then(serde_json::Value::as_object_mut)
        .and_then(|meta| meta.remove("checksum"));
    match stored {
        Some(serde_json::Value::String(expected)) => {
            let actual = checksum(&canonical_form(value.clone()));
            if expected != actual {
                return Err(SnapshotError::ChecksumMismatch { expected, actual });
            }
        }
        Some(other) => {
            return Err(SnapshotError::Invalid {
                section: "meta",
                reason: format!("checksum must be a string, found {other}"),
            });
        }
        None if version >= u64::from(SCHEMA_VERSION) => return Err(SnapshotError::MissingChecksum),
        None => warn!(version, "Loading an older save without a checksum"),
    }
    let mut report = RestoreReport::default();
    if version < u64::from(SCHEMA_VERSION) {
        warn!(version, current = SCHEMA_VERSION, "Save predates the current schema, loading best-effort");
        // Below SCHEMA_VERSION, so it fits.
        report.migrated_from = u32::try_from(version).ok();
    }
    report.defaulted = OPTIONAL_SECTIONS
        .into_iter()
        .filter(|section| value.get(section).is_none_or(serde_json::Value::is_null))
        .collect();
    if !report.defaulted.is_empty() {
        warn!(sections = ?report.defaulted, "Save is missing sections, using defaults");
    }

    Ok((serde_json::from_value(value)?, report))
}

/// Keys sorted, no whitespace, checksum absent.
fn canonical_form(mut value: serde_json::Value) -> String {
    if let Some(meta) = value.get_mut("meta").and_then(serde_json::Value::as_object_mut) {
        meta.remove("checksum");
    }
    value.to_string()
}

fn checksum(canonical: &str) -> String {
    format!("{:016x}", fnv1a64(canonical.as_bytes()))
}

fn invalid(section: &'static str) -> impl Fn(String) -> SnapshotError {
    move |reason| SnapshotError::Invalid { section, reason }
}

impl SimState {
    /// Build a complete replacement state from a document. `self` is only
    /// read, so a failure leaves it exactly as it was.
    pub(crate) fn restored(&self, document: SaveDocument) -> Result<Self, SnapshotError> {
        let SaveDocument {
            meta,
            clock,
            creature,
            inventory,
            shop,
            world,
            story,
            festivals,
            achievements,
        } = document;

        if !meta.playtime_seconds.is_finite() || meta.playtime_seconds < 0.0 {
            return Err(invalid("meta")(format!("playtime {} is not valid", meta.playtime_seconds)));
        }
        let clock = self.clock.restored(clock).map_err(|e| invalid("clock")(e.to_string()))?;
        let catalog = self.catalog.clone();
        let creature = Creature::from_record(creature, &self.config.creature, &catalog)
            .map_err(|e| invalid("creature")(e.to_string()))?;
        let inventory = Inventory::from_record(inventory, &self.config.inventory)
            .map_err(|e| invalid("inventory")(e.to_string()))?;
        let mut shop = self.shop.restored(shop).map_err(|e| invalid("shop")(e.to_string()))?;
        let narrator = self.narrator.restored(story).map_err(|e| invalid("story")(e.to_string()))?;
        let festivals = self
            .festivals
            .restored(festivals)
            .map_err(|e| invalid("festivals")(e.to_string()))?;
        shop.set_festival_bonuses(festivals.bonuses());
        let achievements = self.achievements.restored(achievements);

        let world_error = invalid("world");
        let weather = WeatherRoller::from_parts(
            self.weather.world_seed(),
            self.weather.table().clone(),
            world.weather,
            world.pending_weather,
        )
        .map_err(|e| world_error(e.to_string()))?;
        let spawns = self
            .spawns
            .restored(&world.spawn_points)
            .map_err(|e| world_error(e.to_string()))?;
        let mut zones = self.zones.clone();
        zones
            .restore(world.current_location, world.unlocked_zones)
            .map_err(|e| world_error(e.to_string()))?;
        let rng = world.rng_state.map_or(self.rng, SimRng::seed_from);

        Ok(Self {
            config: self.config.clone(),
            clock,
            weather,
            spawns,
            zones,
            inventory,
            catalog,
            creature,
            shop,
            festivals,
            narrator,
            achievements,
            rng,
            playtime_seconds: meta.playtime_seconds,
            pending: Vec::new(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeZone;
    use haven_types::{EventId, FestivalId, LifeStage, RecipeId, SpawnPointId, StaffId};

    use super::*;
    use crate::config::SimulationConfig;
    use crate::content::GameContent;
    use crate::error::ErrorKind;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).unwrap()
    }

    fn fresh() -> Simulation {
        let mut config = SimulationConfig::default();
        config.time.real_seconds_per_game_hour = 1.0;
        Simulation::new(config, GameContent::builtin()).unwrap()
    }

    /// A game a few days in: hatched, gathered, talked to staff, story
    /// underway, customers on the floor.
    fn mid_game() -> Simulation {
        let mut sim = fresh();
        sim.tick(0.1).unwrap();
        sim.tick(0.1).unwrap();
        sim.complete_story(&EventId::new("meet_melody")).unwrap();
        sim.gather(&SpawnPointId::new("cg_herb_1")).unwrap();
        sim.sleep().unwrap();
        sim.sleep().unwrap();
        assert_eq!(sim.creature().stage(), LifeStage::Hatchling);
        sim.pet().unwrap();
        let tea = sim.cook(&RecipeId::new("honey_tea")).unwrap();
        sim.feed(&tea).unwrap();
        sim.talk_to(&StaffId::new("melody")).unwrap();
        for _ in 0..60 {
            sim.tick(0.1).unwrap();
        }
        sim
    }

    fn flip_a_digit(text: &str, after: &str) -> String {
        let start = text.find(after).unwrap() + after.len();
        let mut bytes = text.as_bytes().to_vec();
        let offset = bytes[start..].iter().position(u8::is_ascii_digit).unwrap();
        let byte = &mut bytes[start + offset];
        *byte = if *byte == b'9' { b'1' } else { *byte + 1 };
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn fresh_game_round_trips() {
        let sim = fresh();
        let text = sim.snapshot_at(1, fixed_time()).unwrap();
        let mut other = fresh();
        other.tick(0.1).unwrap();
        let report = other.restore(&text).unwrap();
        assert!(report.is_clean());
        assert_eq!(other.snapshot_at(1, fixed_time()).unwrap(), text);
        assert_eq!(other.clock(), sim.clock());
        assert_eq!(other.creature(), sim.creature());
        assert_eq!(other.shop(), sim.shop());
    }

    #[test]
    fn mid_game_round_trips() {
        let sim = mid_game();
        let text = sim.snapshot_at(2, fixed_time()).unwrap();
        let mut other = fresh();
        other.restore(&text).unwrap();

        assert_eq!(other.clock(), sim.clock());
        assert_eq!(other.creature(), sim.creature());
        assert_eq!(other.inventory(), sim.inventory());
        assert_eq!(other.shop(), sim.shop());
        assert_eq!(other.narrator(), sim.narrator());
        assert_eq!(other.zones(), sim.zones());
        assert_eq!(other.spawns(), sim.spawns());
        assert_eq!(other.weather(), sim.weather());
        assert_eq!(other.festivals(), sim.festivals());
        assert_eq!(other.achievements(), sim.achievements());
        assert_eq!(other.playtime_seconds(), sim.playtime_seconds());
        assert_eq!(other.snapshot_at(2, fixed_time()).unwrap(), text);
    }

    #[test]
    fn restored_game_continues_identically() {
        let mut sim = mid_game();
        let text = sim.snapshot_at(1, fixed_time()).unwrap();
        let mut other = fresh();
        other.restore(&text).unwrap();
        for _ in 0..500 {
            let a = sim.tick(0.1).unwrap();
            let b = other.tick(0.1).unwrap();
            assert_eq!(a.events, b.events);
        }
        assert_eq!(
            sim.snapshot_at(1, fixed_time()).unwrap(),
            other.snapshot_at(1, fixed_time()).unwrap()
        );
    }

    #[test]
    fn one_corrupt_byte_is_rejected_and_changes_nothing() {
        let saved = mid_game();
        let text = saved.snapshot_at(1, fixed_time()).unwrap();
        let corrupt = flip_a_digit(&text, "\"gold\":");

        let mut live = fresh();
        live.tick(0.1).unwrap();
        let before = live.snapshot_at(1, fixed_time()).unwrap();

        let err = live.restore(&corrupt).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateCorruption);
        assert!(matches!(
            err,
            SimError::Snapshot {
                source: SnapshotError::ChecksumMismatch { .. }
            }
        ));
        assert_eq!(live.snapshot_at(1, fixed_time()).unwrap(), before);
    }

    #[test]
    fn truncated_document_is_state_corruption() {
        let text = mid_game().snapshot_at(1, fixed_time()).unwrap();
        let mut live = fresh();
        let before = live.snapshot_at(1, fixed_time()).unwrap();
        let err = live.restore(&text[..text.len() / 2]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateCorruption);
        assert_eq!(live.snapshot_at(1, fixed_time()).unwrap(), before);
    }

    #[test]
    fn structurally_invalid_section_is_rejected() {
        let sim = fresh();
        let mut document = sim.save_document(1, fixed_time());
        document.world.current_location = ZoneId::new("atlantis");
        document.meta.schema_version = 1;
        let text = serde_json::to_string(&document).unwrap();

        let mut live = fresh();
        let err = live.restore(&text).unwrap_err();
        assert!(matches!(
            err,
            SimError::Snapshot {
                source: SnapshotError::Invalid { section: "world", .. }
            }
        ));
        assert_eq!(live.zones().current(), &ZoneId::new("cafe_grounds"));
    }

    #[test]
    fn current_version_without_checksum_is_rejected() {
        let document = fresh().save_document(1, fixed_time());
        let text = serde_json::to_string(&document).unwrap();
        let err = fresh().restore(&text).unwrap_err();
        assert!(matches!(
            err,
            SimError::Snapshot {
                source: SnapshotError::MissingChecksum
            }
        ));
    }

    #[test]
    fn newer_version_is_rejected() {
        let mut document = fresh().save_document(1, fixed_time());
        document.meta.schema_version = SCHEMA_VERSION + 1;
        let text = serde_json::to_string(&document).unwrap();
        let err = fresh().restore(&text).unwrap_err();
        assert!(matches!(
            err,
            SimError::Snapshot {
                source: SnapshotError::UnsupportedVersion { found, .. }
            } if found == u64::from(SCHEMA_VERSION) + 1
        ));
    }

    #[test]
    fn version_one_document_loads_best_effort() {
        let text = r#"{
            "meta": { "slot": 1, "schemaVersion": 1, "playtimeSeconds": 120.0,
                      "timestamp": "2025-11-02T10:00:00Z" },
            "clock": { "dayIndex": 3, "hourOfDay": 12.5, "season": "spring", "paused": false },
            "creature": { "stage": "hatchling", "hunger": 70.0, "happiness": 65.0, "stamina": 90.0,
                          "bond": 12.0, "color": { "r": 0.5, "g": 0.5, "b": 0.5 }, "daysAlive": 2,
                          "unlockedAbilities": ["burrow_fetch", "sniff_track"], "name": "Ember" },
            "inventory": { "carried": [], "storage": [], "fridge": [], "gold": 240 },
            "shop": { "reputation": 30 },
            "world": { "currentLocation": "cafe_grounds", "weather": "sunny", "pendingWeather": "rainy" },
            "story": { "chapter": "prologue", "completedEventIds": ["arrival"],
                       "flags": { "arrived": true }, "characterAffinities": {} }
        }"#;
        let mut sim = fresh();
        let report = sim.restore(text).unwrap();
        assert_eq!(report.migrated_from, Some(1));
        assert_eq!(report.defaulted, ["festivals", "achievements"]);
        assert!(!report.is_clean());
        assert_eq!(sim.clock().day(), 3);
        assert_eq!(sim.creature().name(), "Ember");
        assert_eq!(sim.creature().stage(), LifeStage::Hatchling);
        assert_eq!(sim.inventory().gold(), 240);
        assert_eq!(sim.shop().reputation(), 30);
        assert!(sim.shop().menu().unlocked().contains(&RecipeId::new("berry_juice")));
        assert!(sim.narrator().is_completed(&EventId::new("arrival")));
        assert_eq!(sim.playtime_seconds(), 120.0);
    }

    #[test]
    fn checksum_is_stable_for_identical_state() {
        let a = fresh().snapshot_at(1, fixed_time()).unwrap();
        let b = fresh().snapshot_at(1, fixed_time()).unwrap();
        assert_eq!(a, b);
        let (document, report) = parse_document(&a).unwrap();
        assert_eq!(document.meta.checksum, None);
        assert_eq!(document.meta.schema_version, SCHEMA_VERSION);
        assert!(report.is_clean());
    }

    #[test]
    fn festival_in_progress_survives_restore() {
        let opening = fresh();
        assert_eq!(
            opening.festivals().active().map(|f| f.id.clone()),
            Some(FestivalId::new("dragon_hatching"))
        );
        let text = opening.snapshot_at(1, fixed_time()).unwrap();

        let mut later = fresh();
        later.sleep().unwrap();
        later.sleep().unwrap();
        assert!(later.festivals().active().is_none());
        assert!((later.shop().festival_bonuses().bond_multiplier - 1.0).abs() < f64::EPSILON);

        later.restore(&text).unwrap();
        assert!(later.festivals().active().is_some());
        assert!((later.shop().festival_bonuses().bond_multiplier - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_festival_in_save_is_rejected() {
        let mut document = fresh().save_document(1, fixed_time());
        document.festivals.active = Some(FestivalId::new("midsummer_rave"));
        document.meta.schema_version = 1;
        let text = serde_json::to_string(&document).unwrap();
        let mut live = fresh();
        let err = live.restore(&text).unwrap_err();
        assert!(matches!(
            err,
            SimError::Snapshot {
                source: SnapshotError::Invalid {
                    section: "festivals",
                    ..
                }
            }
        ));
    }
}
