//! Top-level error type and its mapping onto the four caller-facing
//! error kinds.

use haven_creature::CreatureError;
use haven_shop::ShopError;
use haven_story::StoryError;
use haven_world::WorldError;

use crate::clock::ClockError;
use crate::config::ConfigError;
use crate::content::ContentError;
use crate::snapshot::SnapshotError;

/// How a caller should react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The input was malformed. Nothing changed.
    InvalidArgument,
    /// The input was fine but the current state does not allow the
    /// operation. Nothing changed.
    PreconditionFailed,
    /// Persisted or restored state failed validation. Nothing changed.
    StateCorruption,
    /// A collaborator (listener or outcome sink) rejected its part.
    CallbackFailure,
}

/// Errors returned by simulation operations.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// Configuration is invalid.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },

    /// Static content is invalid.
    #[error("content error: {source}")]
    Content {
        /// The underlying content error.
        #[from]
        source: ContentError,
    },

    /// A world operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// A creature operation failed.
    #[error("creature error: {source}")]
    Creature {
        /// The underlying creature error.
        #[from]
        source: CreatureError,
    },

    /// A shop operation failed.
    #[error("shop error: {source}")]
    Shop {
        /// The underlying shop error.
        #[from]
        source: ShopError,
    },

    /// A story operation failed.
    #[error("story error: {source}")]
    Story {
        /// The underlying story error.
        #[from]
        source: StoryError,
    },

    /// Saving or loading a snapshot failed.
    #[error("snapshot error: {source}")]
    Snapshot {
        /// The underlying snapshot error.
        #[from]
        source: SnapshotError,
    },

    /// A driver-level argument was rejected.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was wrong.
        reason: String,
    },
}

impl SimError {
    /// The caller-facing kind of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Clock { source } => match source {
                ClockError::CorruptRecord { .. } => ErrorKind::StateCorruption,
                ClockError::InvalidArgument { .. } | ClockError::InvalidConfig { .. } => {
                    ErrorKind::InvalidArgument
                }
            },
            Self::Config { .. } | Self::Content { .. } | Self::InvalidArgument { .. } => {
                ErrorKind::InvalidArgument
            }
            Self::World { source } => world_kind(source),
            Self::Creature { source } => creature_kind(source),
            Self::Shop { source } => shop_kind(source),
            Self::Story { source } => story_kind(source),
            Self::Snapshot { .. } => ErrorKind::StateCorruption,
        }
    }
}

const fn world_kind(error: &WorldError) -> ErrorKind {
    match error {
        WorldError::UnknownSpawnPoint(_)
        | WorldError::UnknownZone(_)
        | WorldError::InvalidWeatherTable { .. }
        | WorldError::InvalidTuning { .. } => ErrorKind::InvalidArgument,
        WorldError::NotAvailable { .. }
        | WorldError::MissingAbility { .. }
        | WorldError::WrongZone { .. }
        | WorldError::InventoryFull { .. }
        | WorldError::InsufficientItems { .. }
        | WorldError::InsufficientGold { .. }
        | WorldError::UpgradeMaxed { .. }
        | WorldError::ZoneLocked { .. }
        | WorldError::ArithmeticOverflow => ErrorKind::PreconditionFailed,
    }
}

const fn creature_kind(error: &CreatureError) -> ErrorKind {
    match error {
        CreatureError::UnknownAbility(_)
        | CreatureError::InvalidName { .. }
        | CreatureError::InvalidArgument { .. }
        | CreatureError::InvalidConfig { .. } => ErrorKind::InvalidArgument,
        CreatureError::CorruptRecord { .. } => ErrorKind::StateCorruption,
        CreatureError::StillAnEgg
        | CreatureError::AbilityLocked { .. }
        | CreatureError::InsufficientStamina { .. }
        | CreatureError::NotInstant(_)
        | CreatureError::NotContinuous(_)
        | CreatureError::AbilityNotActive(_)
        | CreatureError::AnotherAbilityActive { .. } => ErrorKind::PreconditionFailed,
    }
}

const fn shop_kind(error: &ShopError) -> ErrorKind {
    match error {
        ShopError::UnknownCustomer(_)
        | ShopError::UnknownStaff(_)
        | ShopError::UnknownRecipe(_)
        | ShopError::InvalidConfig { .. } => ErrorKind::InvalidArgument,
        ShopError::CorruptRecord { .. } => ErrorKind::StateCorruption,
        ShopError::WrongCustomerState { .. }
        | ShopError::NotSeated(_)
        | ShopError::TalkOnCooldown { .. }
        | ShopError::RecipeLocked(_)
        | ShopError::OutOfSeason(_)
        | ShopError::NotOnMenu(_)
        | ShopError::AlreadyOnMenu(_)
        | ShopError::MenuFull { .. }
        | ShopError::ServiceInProgress { .. }
        | ShopError::PeriodFinished { .. }
        | ShopError::AlreadySkipped { .. }
        | ShopError::ClosedForWeather => ErrorKind::PreconditionFailed,
    }
}

const fn story_kind(error: &StoryError) -> ErrorKind {
    match error {
        StoryError::UnknownEvent(_) | StoryError::DuplicateEvent(_) | StoryError::InvalidContent { .. } => {
            ErrorKind::InvalidArgument
        }
        StoryError::NoActiveEvent | StoryError::NotActive { .. } => ErrorKind::PreconditionFailed,
        StoryError::OutcomeRejected { .. } => ErrorKind::CallbackFailure,
        StoryError::CorruptRecord { .. } => ErrorKind::StateCorruption,
    }
}
