//! Trigger conditions and the read-only world view they are checked against.
//!
//! A condition never mutates anything. The evaluator combines an event's
//! conditions with logical AND.

use std::collections::{BTreeMap, BTreeSet};

use haven_types::{EventId, LifeStage, Weather, ZoneId};
use serde::{Deserialize, Serialize};

use crate::event::Chapter;

/// What the rest of the simulation looks like right now.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldView<'a> {
    /// Hour of day in `[0, 24)`.
    pub hour: f64,
    /// Day index, starting at 1.
    pub day: u32,
    /// Shop reputation.
    pub reputation: u32,
    /// Creature life stage.
    pub stage: LifeStage,
    /// Zone the player is in.
    pub location: &'a ZoneId,
    /// Today's weather.
    pub weather: Weather,
}

/// Story-side facts a condition may read.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Progress<'a> {
    pub chapter: Chapter,
    pub completed: &'a BTreeSet<EventId>,
    pub flags: &'a BTreeMap<String, bool>,
}

/// One requirement on the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// Hour within `[from, to)`.
    TimeOfDay {
        /// Earliest hour.
        from: f64,
        /// Hour the window closes.
        to: f64,
    },
    /// Day within `[from, to]`.
    DayRange {
        /// First day.
        from: u32,
        /// Last day.
        to: u32,
    },
    /// Day at least this.
    DayMin {
        /// Minimum day.
        day: u32,
    },
    /// Reputation at least this.
    ReputationMin {
        /// Minimum reputation.
        reputation: u32,
    },
    /// Creature at or past this stage.
    StageMin {
        /// Minimum stage.
        stage: LifeStage,
    },
    /// Every listed event already completed.
    EventsCompleted {
        /// Prerequisite events.
        events: Vec<EventId>,
    },
    /// A story flag is set.
    Flag {
        /// The flag.
        flag: String,
    },
    /// A story flag is not set.
    NotFlag {
        /// The flag.
        flag: String,
    },
    /// The story is in this chapter.
    Chapter {
        /// The chapter.
        chapter: Chapter,
    },
    /// The player is in this zone.
    Location {
        /// The zone.
        zone: ZoneId,
    },
    /// Today's weather is this.
    Weather {
        /// The weather.
        weather: Weather,
    },
}

impl Condition {
    pub(crate) fn holds(&self, view: &WorldView<'_>, progress: &Progress<'_>) -> bool {
        match self {
            Self::TimeOfDay { from, to } => *from <= view.hour && view.hour < *to,
            Self::DayRange { from, to } => (*from..=*to).contains(&view.day),
            Self::DayMin { day } => view.day >= *day,
            Self::ReputationMin { reputation } => view.reputation >= *reputation,
            Self::StageMin { stage } => view.stage >= *stage,
            Self::EventsCompleted { events } => events.iter().all(|e| progress.completed.contains(e)),
            Self::Flag { flag } => progress.flags.get(flag).copied().unwrap_or(false),
            Self::NotFlag { flag } => !progress.flags.get(flag).copied().unwrap_or(false),
            Self::Chapter { chapter } => progress.chapter == *chapter,
            Self::Location { zone } => view.location == zone,
            Self::Weather { weather } => view.weather == *weather,
        }
    }

    /// Events this condition refers to.
    pub(crate) fn referenced_events(&self) -> &[EventId] {
        match self {
            Self::EventsCompleted { events } => events,
            _ => &[],
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn view(zone: &ZoneId) -> WorldView<'_> {
        WorldView {
            hour: 9.5,
            day: 3,
            reputation: 40,
            stage: LifeStage::Juvenile,
            location: zone,
            weather: Weather::Rainy,
        }
    }

    fn check(condition: &Condition) -> bool {
        let zone = ZoneId::new("cafe_grounds");
        let completed = BTreeSet::from([EventId::new("intro")]);
        let flags = BTreeMap::from([("met_melody".to_owned(), true), ("old".to_owned(), false)]);
        let progress = Progress {
            chapter: Chapter::Chapter1,
            completed: &completed,
            flags: &flags,
        };
        condition.holds(&view(&zone), &progress)
    }

    #[test]
    fn time_window_excludes_its_end() {
        assert!(check(&Condition::TimeOfDay { from: 9.0, to: 10.0 }));
        assert!(!check(&Condition::TimeOfDay { from: 8.0, to: 9.5 }));
    }

    #[test]
    fn day_range_is_inclusive() {
        assert!(check(&Condition::DayRange { from: 1, to: 3 }));
        assert!(!check(&Condition::DayRange { from: 4, to: 9 }));
        assert!(check(&Condition::DayMin { day: 3 }));
    }

    #[test]
    fn stage_minimum_accepts_older_creatures() {
        assert!(check(&Condition::StageMin {
            stage: LifeStage::Hatchling
        }));
        assert!(check(&Condition::StageMin {
            stage: LifeStage::Juvenile
        }));
        assert!(!check(&Condition::StageMin {
            stage: LifeStage::Adult
        }));
    }

    #[test]
    fn flags_treat_false_as_unset() {
        assert!(check(&Condition::Flag {
            flag: "met_melody".to_owned()
        }));
        assert!(!check(&Condition::Flag { flag: "old".to_owned() }));
        assert!(check(&Condition::NotFlag { flag: "old".to_owned() }));
        assert!(check(&Condition::NotFlag {
            flag: "missing".to_owned()
        }));
    }

    #[test]
    fn world_facts_are_compared() {
        assert!(check(&Condition::ReputationMin { reputation: 40 }));
        assert!(!check(&Condition::ReputationMin { reputation: 41 }));
        assert!(check(&Condition::Weather {
            weather: Weather::Rainy
        }));
        assert!(!check(&Condition::Location {
            zone: ZoneId::new("forest")
        }));
        assert!(check(&Condition::Chapter {
            chapter: Chapter::Chapter1
        }));
        assert!(check(&Condition::EventsCompleted {
            events: vec![EventId::new("intro")]
        }));
    }

    #[test]
    fn conditions_parse_from_yaml() {
        let yaml = "- type: time_of_day\n  from: 6\n  to: 12\n- type: stage_min\n  stage: hatchling\n";
        let parsed: Vec<Condition> = serde_yml::from_str(yaml).unwrap();
        assert_eq!(
            parsed,
            vec![
                Condition::TimeOfDay { from: 6.0, to: 12.0 },
                Condition::StageMin {
                    stage: LifeStage::Hatchling
                },
            ]
        );
    }
}
