//! The narrative trigger evaluator.
//!
//! [`Narrator`] polls the world once per tick and fires at most one event
//! at a time. A fired event with dialogue stays active until the dialogue
//! collaborator reports back through [`Narrator::complete`] or
//! [`Narrator::abort`]; one without dialogue completes on the spot.
//!
//! # Selection
//!
//! 1. Nothing fires while an event is active.
//! 2. Queued events (from `next_event` outcomes) are tried first, in queue
//!    order. A queued event that is not yet eligible keeps its place.
//! 3. Otherwise the first eligible event in book order wins: lowest
//!    chapter, then lowest sequence order, then id. The rest are simply
//!    reconsidered next tick.
//!
//! # Completion
//!
//! Completion is all-or-nothing. Every external outcome is first checked
//! by the [`OutcomeSink`], then the story's own bookkeeping is staged on a
//! copy. Only when nothing was refused are the external outcomes applied
//! and the copy committed.

use std::collections::{BTreeMap, BTreeSet};

use haven_types::EventId;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::condition::{Progress, WorldView};
use crate::error::StoryError;
use crate::event::{Chapter, StoryBook, StoryEvent};
use crate::outcome::{Outcome, OutcomeSink};

/// Persisted story bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryRecord {
    /// Current chapter.
    #[serde(default)]
    pub chapter: Chapter,
    /// Events completed at least once.
    #[serde(default, rename = "completedEventIds")]
    pub completed: BTreeSet<EventId>,
    /// Story flags.
    #[serde(default)]
    pub flags: BTreeMap<String, bool>,
    /// Character affinities.
    #[serde(default, rename = "characterAffinities")]
    pub affinities: BTreeMap<String, i32>,
    /// Priority queue of events to fire next.
    #[serde(default)]
    pub queue: Vec<EventId>,
    /// Event waiting on its dialogue.
    #[serde(default)]
    pub active: Option<EventId>,
    /// Day each repeatable event last completed.
    #[serde(default)]
    pub last_fired_day: BTreeMap<EventId, u32>,
}

/// What a poll produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoryStep {
    /// An event fired and is waiting on its dialogue.
    Started {
        /// The event.
        event: EventId,
        /// Dialogue to run.
        dialogue: String,
    },
    /// An event without dialogue fired and completed.
    Completed(Completion),
}

/// Result of a successful completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// The event.
    pub event: EventId,
    /// Outcomes applied, in definition order.
    pub outcomes: Vec<Outcome>,
    /// Chapter change caused by this completion, if any.
    pub chapter_change: Option<(Chapter, Chapter)>,
}

/// Chapter progress for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterProgress {
    /// The chapter.
    pub chapter: Chapter,
    /// Non-repeatable events completed.
    pub completed: usize,
    /// Non-repeatable events in the chapter.
    pub total: usize,
}

/// Story state plus the event book it is evaluated against.
#[derive(Debug, Clone, PartialEq)]
pub struct Narrator {
    book: StoryBook,
    state: StoryRecord,
}

impl Narrator {
    /// Start a new story at the prologue.
    pub fn new(book: StoryBook) -> Self {
        Self {
            book,
            state: StoryRecord::default(),
        }
    }

    /// Rebuild this narrator's state from a record, leaving `self` untouched.
    ///
    /// # Errors
    ///
    /// [`StoryError::CorruptRecord`] if the record names unknown events.
    pub fn restored(&self, record: StoryRecord) -> Result<Self, StoryError> {
        let stray = record
            .completed
            .iter()
            .chain(&record.queue)
            .chain(record.active.iter())
            .chain(record.last_fired_day.keys())
            .find(|id| self.book.get(id).is_none());
        if let Some(id) = stray {
            return Err(StoryError::CorruptRecord {
                reason: format!("unknown event {id}"),
            });
        }
        Ok(Self {
            book: self.book.clone(),
            state: record,
        })
    }

    /// Persisted form.
    pub fn record(&self) -> StoryRecord {
        self.state.clone()
    }

    /// The event book.
    pub const fn book(&self) -> &StoryBook {
        &self.book
    }

    /// Current chapter.
    pub const fn chapter(&self) -> Chapter {
        self.state.chapter
    }

    /// Event waiting on its dialogue.
    pub const fn active(&self) -> Option<&EventId> {
        self.state.active.as_ref()
    }

    /// Whether an event has completed at least once.
    pub fn is_completed(&self, id: &EventId) -> bool {
        self.state.completed.contains(id)
    }

    /// Whether a flag is set.
    pub fn has_flag(&self, flag: &str) -> bool {
        self.state.flags.get(flag).copied().unwrap_or(false)
    }

    /// Set a flag outside of an event (e.g. from dialogue choices).
    pub fn set_flag(&mut self, flag: impl Into<String>) {
        self.state.flags.insert(flag.into(), true);
    }

    /// Clear a flag.
    pub fn clear_flag(&mut self, flag: &str) {
        self.state.flags.remove(flag);
    }

    /// Affinity with a character (0 if never changed).
    pub fn affinity(&self, character: &str) -> i32 {
        self.state.affinities.get(character).copied().unwrap_or(0)
    }

    /// Queued events.
    pub fn queue(&self) -> &[EventId] {
        &self.state.queue
    }

    /// Put an event at the back of the queue. Returns `false` if it was
    /// already queued.
    ///
    /// # Errors
    ///
    /// [`StoryError::UnknownEvent`].
    pub fn queue_event(&mut self, id: &EventId) -> Result<bool, StoryError> {
        self.book.require(id)?;
        if self.state.queue.contains(id) {
            return Ok(false);
        }
        self.state.queue.push(id.clone());
        Ok(true)
    }

    /// Progress through the current chapter.
    pub fn chapter_progress(&self) -> ChapterProgress {
        let chapter = self.state.chapter;
        let required: Vec<&StoryEvent> = self.book.in_chapter(chapter).filter(|e| !e.repeatable).collect();
        ChapterProgress {
            chapter,
            completed: required.iter().filter(|e| self.state.completed.contains(&e.id)).count(),
            total: required.len(),
        }
    }

    // -----------------------------------------------------------------------
    // Evaluation
    // -----------------------------------------------------------------------

    fn progress(&self) -> Progress<'_> {
        Progress {
            chapter: self.state.chapter,
            completed: &self.state.completed,
            flags: &self.state.flags,
        }
    }

    /// Whether `event` may fire now.
    fn eligible(&self, event: &StoryEvent, view: &WorldView<'_>) -> bool {
        if self.state.completed.contains(&event.id) {
            if !event.repeatable {
                return false;
            }
            if self.state.last_fired_day.get(&event.id) == Some(&view.day) {
                return false;
            }
        }
        let progress = self.progress();
        event.conditions.iter().all(|c| c.holds(view, &progress))
    }

    /// The event that would fire now, without firing it.
    pub fn next_eligible(&self, view: &WorldView<'_>) -> Option<&StoryEvent> {
        if self.state.active.is_some() {
            return None;
        }
        let queued = self
            .state
            .queue
            .iter()
            .filter_map(|id| self.book.get(id))
            .find(|e| self.eligible(e, view));
        queued.or_else(|| self.book.iter().find(|e| self.eligible(e, view)))
    }

    /// Fire the next eligible event, if any.
    ///
    /// # Errors
    ///
    /// [`StoryError::OutcomeRejected`] when an event without dialogue
    /// fires and the sink refuses one of its outcomes. The event is left
    /// inactive and uncompleted.
    pub fn poll(
        &mut self,
        view: &WorldView<'_>,
        sink: &mut dyn OutcomeSink,
    ) -> Result<Option<StoryStep>, StoryError> {
        let Some(event) = self.next_eligible(view) else {
            return Ok(None);
        };
        let id = event.id.clone();
        let dialogue = event.dialogue.clone();
        self.state.queue.retain(|q| *q != id);
        self.state.active = Some(id.clone());
        info!(event = %id, chapter = ?event_chapter(&self.book, &id), "Story event fired");

        match dialogue {
            Some(dialogue) => Ok(Some(StoryStep::Started { event: id, dialogue })),
            None => self.complete(&id, view.day, sink).map(|c| Some(StoryStep::Completed(c))),
        }
    }

    /// The dialogue for the active event finished normally: apply its
    /// outcomes atomically.
    ///
    /// # Errors
    ///
    /// [`StoryError::NoActiveEvent`] and [`StoryError::NotActive`] leave
    /// everything unchanged. [`StoryError::OutcomeRejected`] clears the
    /// active event without applying anything, so it can fire again.
    pub fn complete(
        &mut self,
        id: &EventId,
        day: u32,
        sink: &mut dyn OutcomeSink,
    ) -> Result<Completion, StoryError> {
        self.ensure_active(id)?;
        let event = self.book.require(id)?;

        // 1. Ask the owning subsystems
        for outcome in event.outcomes.iter().filter(|o| o.is_external()) {
            if let Err(reason) = sink.check(outcome) {
                warn!(event = %id, reason = %reason, "Story outcome rejected; nothing applied");
                self.state.active = None;
                return Err(StoryError::OutcomeRejected {
                    event: id.clone(),
                    reason,
                });
            }
        }

        // 2. Stage the story's own changes
        let mut staged = self.state.clone();
        staged.active = None;
        staged.completed.insert(id.clone());
        if event.repeatable {
            staged.last_fired_day.insert(id.clone(), day);
        }
        let before = staged.chapter;
        let mut chapter_set = false;
        for outcome in &event.outcomes {
            match outcome {
                Outcome::SetFlag { flag } => {
                    staged.flags.insert(flag.clone(), true);
                }
                Outcome::ClearFlag { flag } => {
                    staged.flags.remove(flag);
                }
                Outcome::NextEvent { event: next } => {
                    if !staged.queue.contains(next) {
                        staged.queue.push(next.clone());
                    }
                }
                Outcome::SetChapter { chapter } => {
                    staged.chapter = *chapter;
                    chapter_set = true;
                }
                Outcome::Affinity { character, delta } => {
                    let entry = staged.affinities.entry(character.clone()).or_insert(0);
                    *entry = entry.saturating_add(*delta);
                }
                Outcome::Reputation { .. }
                | Outcome::UnlockRecipe { .. }
                | Outcome::UnlockZone { .. }
                | Outcome::Gold { .. } => {}
            }
        }
        if !chapter_set && self.chapter_finished(&staged) {
            if let Some(next) = staged.chapter.next() {
                staged.chapter = next;
            }
        }

        // 3. Commit
        for outcome in event.outcomes.iter().filter(|o| o.is_external()) {
            sink.apply(outcome);
        }
        let outcomes = event.outcomes.clone();
        self.state = staged;
        let after = self.state.chapter;
        if before != after {
            info!(from = ?before, to = ?after, "Story chapter changed");
        }
        debug!(event = %id, outcomes = outcomes.len(), "Story event completed");
        Ok(Completion {
            event: id.clone(),
            outcomes,
            chapter_change: (before != after).then_some((before, after)),
        })
    }

    /// The dialogue ended abnormally: drop the active event with no
    /// outcomes. It stays eligible.
    ///
    /// # Errors
    ///
    /// [`StoryError::NoActiveEvent`], [`StoryError::NotActive`].
    pub fn abort(&mut self, id: &EventId) -> Result<(), StoryError> {
        self.ensure_active(id)?;
        warn!(event = %id, "Story event aborted");
        self.state.active = None;
        Ok(())
    }

    fn ensure_active(&self, id: &EventId) -> Result<(), StoryError> {
        match &self.state.active {
            None => Err(StoryError::NoActiveEvent),
            Some(active) if active != id => Err(StoryError::NotActive {
                event: id.clone(),
                active: active.clone(),
            }),
            Some(_) => Ok(()),
        }
    }

    /// Every non-repeatable event of the staged chapter is completed, and
    /// the chapter has at least one event.
    fn chapter_finished(&self, staged: &StoryRecord) -> bool {
        let mut events = self.book.in_chapter(staged.chapter).peekable();
        events.peek().is_some() && events.all(|e| e.repeatable || staged.completed.contains(&e.id))
    }
}

fn event_chapter(book: &StoryBook, id: &EventId) -> Option<Chapter> {
    book.get(id).map(|e| e.chapter)
}
