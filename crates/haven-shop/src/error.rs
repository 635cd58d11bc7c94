//! Error types for the `haven-shop` crate.
//!
//! A returned error means nothing changed: reputation, sessions, staff and
//! customers are left exactly as they were before the call.

use haven_types::{CustomerId, RecipeId, ServicePeriod, StaffId};

use crate::customer::CustomerState;

/// Errors that can occur during shop operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ShopError {
    /// No customer with this id is in the shop.
    #[error("unknown customer: {0}")]
    UnknownCustomer(CustomerId),

    /// The customer is in the wrong lifecycle state for this operation.
    #[error("{customer} is {state:?}, expected {expected:?}")]
    WrongCustomerState {
        /// The customer.
        customer: CustomerId,
        /// Its current state.
        state: CustomerState,
        /// The state the operation needs.
        expected: CustomerState,
    },

    /// The customer is still standing in the queue.
    #[error("{0} is queued and has no seat yet")]
    NotSeated(CustomerId),

    /// No staff member with this id is on the roster.
    #[error("unknown staff member: {0}")]
    UnknownStaff(StaffId),

    /// The staff member was talked to too recently.
    #[error("{staff} was talked to recently, try again in {remaining_hours:.2} hours")]
    TalkOnCooldown {
        /// The staff member.
        staff: StaffId,
        /// Game hours until the next talk has an effect.
        remaining_hours: f64,
    },

    /// No recipe with this id exists in the recipe book.
    #[error("unknown recipe: {0}")]
    UnknownRecipe(RecipeId),

    /// The recipe exists but has not been unlocked.
    #[error("recipe {0} is locked")]
    RecipeLocked(RecipeId),

    /// A festival dish can only be cooked while its festival runs.
    #[error("recipe {0} is only cooked during its festival")]
    OutOfSeason(RecipeId),

    /// The dish is not on today's menu.
    #[error("recipe {0} is not on the menu")]
    NotOnMenu(RecipeId),

    /// The recipe is already on the menu.
    #[error("recipe {0} is already on the menu")]
    AlreadyOnMenu(RecipeId),

    /// The menu has no free slot.
    #[error("menu is full ({capacity} dishes)")]
    MenuFull {
        /// Maximum dishes on the menu.
        capacity: usize,
    },

    /// The period's doors are already open.
    #[error("{period:?} service is already in progress")]
    ServiceInProgress {
        /// The period.
        period: ServicePeriod,
    },

    /// The period's window has already ended today.
    #[error("{period:?} service is already over for today")]
    PeriodFinished {
        /// The period.
        period: ServicePeriod,
    },

    /// The period was already skipped today.
    #[error("{period:?} service was already skipped today")]
    AlreadySkipped {
        /// The period.
        period: ServicePeriod,
    },

    /// Bad weather keeps the shop shut today.
    #[error("the shop is closed for the weather today")]
    ClosedForWeather,

    /// Tuning failed validation.
    #[error("invalid shop configuration: {reason}")]
    InvalidConfig {
        /// What is wrong.
        reason: String,
    },

    /// A persisted shop record violates an invariant.
    #[error("corrupt shop record: {reason}")]
    CorruptRecord {
        /// The violated invariant.
        reason: String,
    },
}
