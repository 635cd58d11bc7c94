//! Event outcomes and the sink that applies the ones owned elsewhere.
//!
//! Flags, the event queue, chapters, and character affinities belong to
//! the story itself. Reputation, recipe and zone unlocks, and gold belong
//! to other subsystems and reach them only through an [`OutcomeSink`].

use haven_types::{EventId, RecipeId, ZoneId};
use serde::{Deserialize, Serialize};

use crate::event::Chapter;

/// One effect of completing an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Outcome {
    /// Set a story flag.
    SetFlag {
        /// The flag.
        flag: String,
    },
    /// Clear a story flag.
    ClearFlag {
        /// The flag.
        flag: String,
    },
    /// Put an event at the back of the priority queue.
    NextEvent {
        /// The event.
        event: EventId,
    },
    /// Jump to a chapter.
    SetChapter {
        /// The chapter.
        chapter: Chapter,
    },
    /// Change shop reputation.
    Reputation {
        /// Signed change.
        delta: i32,
    },
    /// Make a recipe available.
    UnlockRecipe {
        /// The recipe.
        recipe: RecipeId,
    },
    /// Open a zone regardless of creature stage.
    UnlockZone {
        /// The zone.
        zone: ZoneId,
    },
    /// Pay the player.
    Gold {
        /// Amount paid.
        amount: u64,
    },
    /// Change how a character feels about the player.
    Affinity {
        /// The character.
        character: String,
        /// Signed change.
        delta: i32,
    },
}

impl Outcome {
    /// Whether another subsystem owns this effect.
    pub const fn is_external(&self) -> bool {
        matches!(
            self,
            Self::Reputation { .. } | Self::UnlockRecipe { .. } | Self::UnlockZone { .. } | Self::Gold { .. }
        )
    }
}

/// Applies external outcomes through the owning subsystems' own APIs.
///
/// Completion calls [`check`](Self::check) on every external outcome of an
/// event before calling [`apply`](Self::apply) on any of them, so a sink
/// must accept in `apply` everything it accepted in `check`.
pub trait OutcomeSink {
    /// Whether `outcome` can be applied. `Err` carries the reason.
    fn check(&self, outcome: &Outcome) -> Result<(), String>;

    /// Apply a previously checked outcome.
    fn apply(&mut self, outcome: &Outcome);
}

/// A sink that accepts and discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl OutcomeSink for NullSink {
    fn check(&self, _outcome: &Outcome) -> Result<(), String> {
        Ok(())
    }

    fn apply(&mut self, _outcome: &Outcome) {}
}
