//! Error types for the `haven-creature` crate.

use haven_types::{AbilityId, LifeStage};

/// Errors from creature operations. A failed operation never changes the
/// creature.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CreatureError {
    /// The creature has not hatched yet.
    #[error("the creature is still an egg")]
    StillAnEgg,

    /// No ability with this id exists in the catalog.
    #[error("unknown ability: {0}")]
    UnknownAbility(AbilityId),

    /// The ability exists but is gated behind a later stage.
    #[error("ability {ability} is locked at stage {stage:?}")]
    AbilityLocked {
        /// The requested ability.
        ability: AbilityId,
        /// The creature's current stage.
        stage: LifeStage,
    },

    /// Not enough stamina to pay the ability's cost.
    #[error("insufficient stamina for {ability}: need {required}, have {available}")]
    InsufficientStamina {
        /// The requested ability.
        ability: AbilityId,
        /// Stamina required.
        required: f64,
        /// Stamina available.
        available: f64,
    },

    /// A continuous ability was used as if it were instantaneous.
    #[error("ability {0} is continuous; start and stop it instead")]
    NotInstant(AbilityId),

    /// An instantaneous ability was started as if it were continuous.
    #[error("ability {0} is instantaneous; use it instead")]
    NotContinuous(AbilityId),

    /// Stopping an ability that is not running.
    #[error("ability {0} is not active")]
    AbilityNotActive(AbilityId),

    /// Starting a continuous ability while another one runs.
    #[error("ability {active} is already active")]
    AnotherAbilityActive {
        /// The ability currently running.
        active: AbilityId,
    },

    /// The proposed name is empty or too long.
    #[error("invalid name: {reason}")]
    InvalidName {
        /// What is wrong with it.
        reason: String,
    },

    /// A numeric argument is negative or not finite.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What is wrong with it.
        reason: String,
    },

    /// A persisted creature record violates an invariant.
    #[error("corrupt creature record: {reason}")]
    CorruptRecord {
        /// The violated invariant.
        reason: String,
    },

    /// Tuning or ability content is malformed.
    #[error("invalid creature config: {reason}")]
    InvalidConfig {
        /// What is wrong.
        reason: String,
    },
}
