//! Chapters, story event definitions, and the validated event book.

use std::collections::BTreeMap;

use haven_types::EventId;
use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::error::StoryError;
use crate::outcome::Outcome;

/// Story chapter, in reading order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chapter {
    /// Before the first chapter.
    #[default]
    Prologue,
    /// Chapter one.
    Chapter1,
    /// Chapter two.
    Chapter2,
    /// Chapter three.
    Chapter3,
    /// After the last chapter.
    Epilogue,
}

impl Chapter {
    /// All chapters in order.
    pub const ALL: [Self; 5] = [
        Self::Prologue,
        Self::Chapter1,
        Self::Chapter2,
        Self::Chapter3,
        Self::Epilogue,
    ];

    /// The following chapter, or `None` for the epilogue.
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Prologue => Some(Self::Chapter1),
            Self::Chapter1 => Some(Self::Chapter2),
            Self::Chapter2 => Some(Self::Chapter3),
            Self::Chapter3 => Some(Self::Epilogue),
            Self::Epilogue => None,
        }
    }
}

/// Static definition of a narrative beat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryEvent {
    /// Unique id.
    pub id: EventId,
    /// Chapter the event belongs to.
    #[serde(default)]
    pub chapter: Chapter,
    /// Position within the chapter for tie-breaks.
    #[serde(default)]
    pub sequence_order: u32,
    /// Dialogue handed to the dialogue collaborator. Events without one
    /// complete as soon as they fire.
    #[serde(default)]
    pub dialogue: Option<String>,
    /// All must hold for the event to fire.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Applied together on completion.
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
    /// May fire again after completion, at most once per day.
    #[serde(default)]
    pub repeatable: bool,
}

/// Every story event, validated and in tie-break order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoryBook {
    /// Sorted by chapter, then sequence order, then id.
    events: Vec<StoryEvent>,
    index: BTreeMap<EventId, usize>,
}

impl StoryBook {
    /// Validate and index story events.
    ///
    /// # Errors
    ///
    /// [`StoryError::DuplicateEvent`] for repeated ids,
    /// [`StoryError::InvalidContent`] for references to unknown events or
    /// inverted time and day windows.
    pub fn new(mut events: Vec<StoryEvent>) -> Result<Self, StoryError> {
        events.sort_by(|a, b| {
            (a.chapter, a.sequence_order, &a.id).cmp(&(b.chapter, b.sequence_order, &b.id))
        });
        let mut index = BTreeMap::new();
        for (position, event) in events.iter().enumerate() {
            if index.insert(event.id.clone(), position).is_some() {
                return Err(StoryError::DuplicateEvent(event.id.clone()));
            }
        }

        for event in &events {
            let invalid = |reason: String| StoryError::InvalidContent { reason };
            for condition in &event.conditions {
                if let Some(unknown) = condition
                    .referenced_events()
                    .iter()
                    .find(|id| !index.contains_key(*id))
                {
                    return Err(invalid(format!("{} requires unknown event {unknown}", event.id)));
                }
                match condition {
                    Condition::TimeOfDay { from, to }
                        if !(0.0..24.0).contains(from) || to <= from || *to > 24.0 =>
                    {
                        return Err(invalid(format!("{} has an invalid time window", event.id)));
                    }
                    Condition::DayRange { from, to } if to < from => {
                        return Err(invalid(format!("{} has an inverted day range", event.id)));
                    }
                    _ => {}
                }
            }
            let queued = event.outcomes.iter().filter_map(|o| match o {
                Outcome::NextEvent { event } => Some(event),
                _ => None,
            });
            for next in queued {
                if !index.contains_key(next) {
                    return Err(invalid(format!("{} queues unknown event {next}", event.id)));
                }
            }
        }

        Ok(Self { events, index })
    }

    /// Look up an event.
    pub fn get(&self, id: &EventId) -> Option<&StoryEvent> {
        self.index.get(id).and_then(|&i| self.events.get(i))
    }

    /// Look up an event or fail.
    ///
    /// # Errors
    ///
    /// [`StoryError::UnknownEvent`].
    pub fn require(&self, id: &EventId) -> Result<&StoryEvent, StoryError> {
        self.get(id).ok_or_else(|| StoryError::UnknownEvent(id.clone()))
    }

    /// Events in tie-break order.
    pub fn iter(&self) -> impl Iterator<Item = &StoryEvent> {
        self.events.iter()
    }

    /// Events of one chapter.
    pub fn in_chapter(&self, chapter: Chapter) -> impl Iterator<Item = &StoryEvent> {
        self.events.iter().filter(move |e| e.chapter == chapter)
    }

    /// Number of events.
    pub const fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether there are no events.
    pub const fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn event(id: &str, chapter: Chapter, order: u32) -> StoryEvent {
        StoryEvent {
            id: EventId::new(id),
            chapter,
            sequence_order: order,
            dialogue: None,
            conditions: Vec::new(),
            outcomes: Vec::new(),
            repeatable: false,
        }
    }

    #[test]
    fn book_sorts_by_chapter_then_order() {
        let book = StoryBook::new(vec![
            event("c", Chapter::Chapter1, 0),
            event("b", Chapter::Prologue, 2),
            event("a", Chapter::Prologue, 1),
        ])
        .unwrap();
        let ids: Vec<&str> = book.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(book.in_chapter(Chapter::Prologue).count(), 2);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let result = StoryBook::new(vec![event("a", Chapter::Prologue, 0), event("a", Chapter::Chapter1, 0)]);
        assert_eq!(result, Err(StoryError::DuplicateEvent(EventId::new("a"))));
    }

    #[test]
    fn references_to_unknown_events_are_rejected() {
        let mut queued = event("a", Chapter::Prologue, 0);
        queued.outcomes.push(Outcome::NextEvent {
            event: EventId::new("ghost"),
        });
        assert!(StoryBook::new(vec![queued]).is_err());

        let mut gated = event("b", Chapter::Prologue, 0);
        gated.conditions.push(Condition::EventsCompleted {
            events: vec![EventId::new("ghost")],
        });
        assert!(StoryBook::new(vec![gated]).is_err());
    }

    #[test]
    fn inverted_windows_are_rejected() {
        let mut late = event("a", Chapter::Prologue, 0);
        late.conditions.push(Condition::TimeOfDay { from: 20.0, to: 6.0 });
        assert!(StoryBook::new(vec![late]).is_err());
    }

    #[test]
    fn chapters_advance_in_order() {
        assert_eq!(Chapter::Prologue.next(), Some(Chapter::Chapter1));
        assert_eq!(Chapter::Epilogue.next(), None);
        assert!(Chapter::Chapter2 < Chapter::Chapter3);
    }
}
