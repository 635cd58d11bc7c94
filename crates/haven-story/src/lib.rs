//! Narrative trigger evaluation for the Haven simulation.
//!
//! Story events are condition-gated beats grouped into chapters. Each tick
//! the evaluator looks at a read-only [`WorldView`] and fires at most one
//! event. Completing an event applies its outcomes all together or not at
//! all; effects owned by other subsystems go through an [`OutcomeSink`].
//!
//! # Modules
//!
//! - [`evaluator`] -- [`Narrator`]: selection, firing, atomic completion,
//!   and persistence.
//! - [`event`] -- Chapters, event definitions, and the validated book.
//! - [`condition`] -- Trigger conditions and the world view.
//! - [`outcome`] -- Outcomes and the sink trait.
//! - [`error`] -- Error types for story operations.

pub mod condition;
pub mod error;
pub mod evaluator;
pub mod event;
pub mod outcome;

// Re-export primary types at crate root.
pub use condition::{Condition, WorldView};
pub use error::StoryError;
pub use evaluator::{ChapterProgress, Completion, Narrator, StoryRecord, StoryStep};
pub use event::{Chapter, StoryBook, StoryEvent};
pub use outcome::{NullSink, Outcome, OutcomeSink};
