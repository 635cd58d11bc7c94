//! Shop tuning: service windows, penalties, and the nested reputation,
//! customer, and staff sections.

use haven_types::ServicePeriod;
use serde::{Deserialize, Serialize};

use crate::customer::CustomerConfig;
use crate::error::ShopError;
use crate::reputation::ReputationConfig;
use crate::service::ServiceWindow;
use crate::staff::StaffConfig;

/// Shop tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShopConfig {
    /// Morning window (default: prep 9, service 10--14, cleanup to 15).
    #[serde(default = "default_morning")]
    pub morning: ServiceWindow,

    /// Evening window (default: prep 16, service 17--21, cleanup to 22).
    #[serde(default = "default_evening")]
    pub evening: ServiceWindow,

    /// Reputation lost when a period is skipped (default: 5).
    #[serde(default = "default_skip_penalty")]
    pub skip_penalty: u32,

    /// Most dishes on the menu at once (default: 6).
    #[serde(default = "default_menu_capacity")]
    pub menu_capacity: usize,

    /// Reputation tiers.
    #[serde(default)]
    pub reputation: ReputationConfig,

    /// Customer arrival and satisfaction.
    #[serde(default)]
    pub customers: CustomerConfig,

    /// Staff morale and efficiency.
    #[serde(default)]
    pub staff: StaffConfig,
}

impl ShopConfig {
    /// Window for a period.
    pub const fn window(&self, period: ServicePeriod) -> &ServiceWindow {
        match period {
            ServicePeriod::Morning => &self.morning,
            ServicePeriod::Evening => &self.evening,
        }
    }

    /// Validate every section.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<(), ShopError> {
        self.morning.validate(ServicePeriod::Morning)?;
        self.evening.validate(ServicePeriod::Evening)?;
        if self.morning.cleanup_end > self.evening.prep_start {
            return Err(ShopError::InvalidConfig {
                reason: "the morning window must end before evening prep".to_owned(),
            });
        }
        if self.menu_capacity == 0 {
            return Err(ShopError::InvalidConfig {
                reason: "menu_capacity must be at least 1".to_owned(),
            });
        }
        self.reputation.validate()?;
        self.customers.validate()?;
        self.staff.validate()
    }
}

impl Default for ShopConfig {
    fn default() -> Self {
        Self {
            morning: default_morning(),
            evening: default_evening(),
            skip_penalty: default_skip_penalty(),
            menu_capacity: default_menu_capacity(),
            reputation: ReputationConfig::default(),
            customers: CustomerConfig::default(),
            staff: StaffConfig::default(),
        }
    }
}

const fn default_morning() -> ServiceWindow {
    ServiceWindow::MORNING
}

const fn default_evening() -> ServiceWindow {
    ServiceWindow::EVENING
}

const fn default_skip_penalty() -> u32 {
    5
}

const fn default_menu_capacity() -> usize {
    6
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        ShopConfig::default().validate().unwrap();
    }

    #[test]
    fn overlapping_windows_are_rejected() {
        let config = ShopConfig {
            evening: ServiceWindow {
                prep_start: 14.0,
                service_start: 17.0,
                service_end: 21.0,
                cleanup_end: 22.0,
            },
            ..ShopConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn yaml_overrides_nested_sections() {
        let yaml = "skip_penalty: 8\ncustomers:\n  seats: 4\nstaff:\n  talk_boost: 20.0\n";
        let config: ShopConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.skip_penalty, 8);
        assert_eq!(config.customers.seats, 4);
        assert_eq!(config.customers.queue_capacity, 4);
        assert_eq!(config.staff.talk_boost, 20.0);
        assert_eq!(config.morning, ServiceWindow::MORNING);
        config.validate().unwrap();
    }
}
