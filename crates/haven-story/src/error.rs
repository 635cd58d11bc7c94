//! Error types for the `haven-story` crate.

use haven_types::EventId;

/// Errors that can occur while evaluating or completing story events.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoryError {
    /// No event with this id exists.
    #[error("unknown story event: {0}")]
    UnknownEvent(EventId),

    /// Two events share an id.
    #[error("duplicate story event: {0}")]
    DuplicateEvent(EventId),

    /// A completion arrived while nothing was firing.
    #[error("no story event is active")]
    NoActiveEvent,

    /// A completion or abort named a different event than the active one.
    #[error("story event {event} is not active (active: {active})")]
    NotActive {
        /// The event named by the caller.
        event: EventId,
        /// The event actually firing.
        active: EventId,
    },

    /// An outcome was refused by the subsystem that owns it. Nothing was
    /// applied and the event stays available.
    #[error("outcome of story event {event} was rejected: {reason}")]
    OutcomeRejected {
        /// The event being completed.
        event: EventId,
        /// Why the owning subsystem refused.
        reason: String,
    },

    /// Static story content is malformed.
    #[error("invalid story content: {reason}")]
    InvalidContent {
        /// What is wrong.
        reason: String,
    },

    /// A persisted story record is inconsistent.
    #[error("corrupt story record: {reason}")]
    CorruptRecord {
        /// What is wrong.
        reason: String,
    },
}
