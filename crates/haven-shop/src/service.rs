//! Per-period service state machine.
//!
//! Each service period (morning, evening) runs its own
//! `CLOSED -> PREP -> SERVICE -> CLEANUP -> CLOSED` cycle once per day. The
//! machine is driven purely by the hour of day: [`PeriodSession::advance_to`]
//! compares the session's phase with the phase the window prescribes for
//! the current hour and walks every intermediate phase in order, so a large
//! time jump still passes through SERVICE entry (which resets the period's
//! counters) and CLEANUP.
//!
//! Internally the two CLOSED states are distinguished: [`PeriodPhase::BeforeOpen`]
//! waits for prep, [`PeriodPhase::Done`] has finished (or been skipped) for
//! the day. Both report [`ShopState::Closed`].

use haven_types::{ServicePeriod, ShopState};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ShopError;

/// Hours of one period's daily window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceWindow {
    /// PREP begins.
    pub prep_start: f64,
    /// Doors open; SERVICE begins.
    pub service_start: f64,
    /// Doors shut; CLEANUP begins.
    pub service_end: f64,
    /// CLEANUP ends; CLOSED for the rest of the day.
    pub cleanup_end: f64,
}

impl ServiceWindow {
    /// The default morning window: prep 9, service 10--14, cleanup to 15.
    pub const MORNING: Self = Self {
        prep_start: 9.0,
        service_start: 10.0,
        service_end: 14.0,
        cleanup_end: 15.0,
    };

    /// The default evening window: prep 16, service 17--21, cleanup to 22.
    pub const EVENING: Self = Self {
        prep_start: 16.0,
        service_start: 17.0,
        service_end: 21.0,
        cleanup_end: 22.0,
    };

    /// Phase this window prescribes at `hour`.
    pub fn phase_at(&self, hour: f64) -> PeriodPhase {
        if hour < self.prep_start {
            PeriodPhase::BeforeOpen
        } else if hour < self.service_start {
            PeriodPhase::Prep
        } else if hour < self.service_end {
            PeriodPhase::Service
        } else if hour < self.cleanup_end {
            PeriodPhase::Cleanup
        } else {
            PeriodPhase::Done
        }
    }

    /// Check `0 <= prep < service start < service end < cleanup end <= 24`.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::InvalidConfig`] if the hours are out of order.
    pub fn validate(&self, period: ServicePeriod) -> Result<(), ShopError> {
        let ordered = 0.0 <= self.prep_start
            && self.prep_start < self.service_start
            && self.service_start < self.service_end
            && self.service_end < self.cleanup_end
            && self.cleanup_end <= 24.0;
        if ordered {
            Ok(())
        } else {
            Err(ShopError::InvalidConfig {
                reason: format!("{period:?} window hours must be strictly increasing within the day"),
            })
        }
    }
}

/// Where a period is within its day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodPhase {
    /// Closed, waiting for prep.
    BeforeOpen,
    /// Preparing.
    Prep,
    /// Serving customers.
    Service,
    /// Tidying up.
    Cleanup,
    /// Closed for the rest of the day.
    Done,
}

impl PeriodPhase {
    /// Externally visible state.
    pub const fn state(self) -> ShopState {
        match self {
            Self::BeforeOpen | Self::Done => ShopState::Closed,
            Self::Prep => ShopState::Prep,
            Self::Service => ShopState::Service,
            Self::Cleanup => ShopState::Cleanup,
        }
    }

    const fn next(self) -> Option<Self> {
        match self {
            Self::BeforeOpen => Some(Self::Prep),
            Self::Prep => Some(Self::Service),
            Self::Service => Some(Self::Cleanup),
            Self::Cleanup => Some(Self::Done),
            Self::Done => None,
        }
    }
}

/// Counters for one period's service.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PeriodStats {
    /// Customers who were served and left.
    pub customers_served: u32,
    /// Customers who left angry (including timeouts).
    pub customers_angry: u32,
    /// Arrivals turned away because the queue was full.
    pub turned_away: u32,
    /// Dish revenue in gold.
    pub revenue: u64,
    /// Tips in gold.
    pub tips: u64,
    /// Net reputation change from customer feedback.
    pub reputation_delta: i64,
    /// Sum of satisfaction scores of departed customers.
    pub satisfaction_total: f64,
    /// Number of departed customers.
    pub departures: u32,
}

impl PeriodStats {
    /// Mean satisfaction of departed customers, if any left.
    pub fn average_satisfaction(&self) -> Option<f64> {
        (self.departures > 0).then(|| self.satisfaction_total / f64::from(self.departures))
    }

    /// Sum of two periods' counters.
    #[must_use]
    pub fn combined(&self, other: &Self) -> Self {
        Self {
            customers_served: self.customers_served.saturating_add(other.customers_served),
            customers_angry: self.customers_angry.saturating_add(other.customers_angry),
            turned_away: self.turned_away.saturating_add(other.turned_away),
            revenue: self.revenue.saturating_add(other.revenue),
            tips: self.tips.saturating_add(other.tips),
            reputation_delta: self.reputation_delta.saturating_add(other.reputation_delta),
            satisfaction_total: self.satisfaction_total + other.satisfaction_total,
            departures: self.departures.saturating_add(other.departures),
        }
    }
}

/// A state change of one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseChange {
    /// The period.
    pub period: ServicePeriod,
    /// Phase left.
    pub from: PeriodPhase,
    /// Phase entered.
    pub to: PeriodPhase,
}

/// One period's state machine and counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodSession {
    /// Which period this is.
    pub period: ServicePeriod,
    /// Current phase.
    pub phase: PeriodPhase,
    /// Whether the period was skipped today.
    #[serde(default)]
    pub skipped: bool,
    /// Counters since the last SERVICE entry.
    #[serde(default)]
    pub stats: PeriodStats,
}

impl PeriodSession {
    /// A closed session waiting for today's window.
    pub fn new(period: ServicePeriod) -> Self {
        Self {
            period,
            phase: PeriodPhase::BeforeOpen,
            skipped: false,
            stats: PeriodStats::default(),
        }
    }

    /// Externally visible state.
    pub const fn state(&self) -> ShopState {
        self.phase.state()
    }

    /// Walk forward to the phase `window` prescribes at `hour`.
    ///
    /// Returns every transition taken, in order. Counters reset on SERVICE
    /// entry. A finished or skipped session stays CLOSED until
    /// [`reset_for_day`](Self::reset_for_day).
    pub fn advance_to(&mut self, hour: f64, window: &ServiceWindow) -> Vec<PhaseChange> {
        let target = window.phase_at(hour);
        self.walk_to(target)
    }

    /// Walk forward to [`PeriodPhase::Done`], e.g. when the day ends
    /// before the window does.
    pub fn finish(&mut self) -> Vec<PhaseChange> {
        self.walk_to(PeriodPhase::Done)
    }

    fn walk_to(&mut self, target: PeriodPhase) -> Vec<PhaseChange> {
        let mut changes = Vec::new();
        while self.phase < target {
            let Some(next) = self.phase.next() else {
                break;
            };
            if next == PeriodPhase::Service {
                self.stats = PeriodStats::default();
            }
            info!(
                period = ?self.period,
                from = ?self.phase.state(),
                to = ?next.state(),
                "Service period changed state"
            );
            changes.push(PhaseChange {
                period: self.period,
                from: self.phase,
                to: next,
            });
            self.phase = next;
        }
        changes
    }

    /// Force CLOSED for the rest of today's window.
    ///
    /// Only allowed before the doors open. The caller applies the
    /// reputation penalty; this method guarantees it is asked to exactly
    /// once per period per day.
    ///
    /// # Errors
    ///
    /// [`ShopError::ServiceInProgress`] during SERVICE,
    /// [`ShopError::AlreadySkipped`] after a previous skip,
    /// [`ShopError::PeriodFinished`] once the window has closed.
    pub fn skip(&mut self) -> Result<PhaseChange, ShopError> {
        match self.phase {
            PeriodPhase::BeforeOpen | PeriodPhase::Prep => {
                let change = PhaseChange {
                    period: self.period,
                    from: self.phase,
                    to: PeriodPhase::Done,
                };
                self.phase = PeriodPhase::Done;
                self.skipped = true;
                info!(period = ?self.period, "Service period skipped");
                Ok(change)
            }
            PeriodPhase::Service => Err(ShopError::ServiceInProgress {
                period: self.period,
            }),
            PeriodPhase::Done if self.skipped => Err(ShopError::AlreadySkipped {
                period: self.period,
            }),
            PeriodPhase::Cleanup | PeriodPhase::Done => Err(ShopError::PeriodFinished {
                period: self.period,
            }),
        }
    }

    /// Close for the whole day without a penalty (bad weather).
    pub fn close_for_day(&mut self) {
        self.phase = PeriodPhase::Done;
    }

    /// Start a new day: back to waiting for prep with fresh counters.
    pub fn reset_for_day(&mut self) {
        self.phase = PeriodPhase::BeforeOpen;
        self.skipped = false;
        self.stats = PeriodStats::default();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn half_hour_prep() -> ServiceWindow {
        ServiceWindow {
            prep_start: 9.5,
            service_start: 10.0,
            service_end: 14.0,
            cleanup_end: 15.0,
        }
    }

    #[test]
    fn prep_then_service_at_the_configured_hours() {
        let window = half_hour_prep();
        let mut session = PeriodSession::new(ServicePeriod::Morning);
        assert!(session.advance_to(9.25, &window).is_empty());
        assert_eq!(session.state(), ShopState::Closed);

        let changes = session.advance_to(9.5, &window);
        assert_eq!(changes.len(), 1);
        assert_eq!(session.state(), ShopState::Prep);

        session.advance_to(9.99, &window);
        assert_eq!(session.state(), ShopState::Prep);
        session.advance_to(10.0, &window);
        assert_eq!(session.state(), ShopState::Service);
    }

    #[test]
    fn large_jump_walks_every_phase_in_order() {
        let mut session = PeriodSession::new(ServicePeriod::Morning);
        session.stats.revenue = 99;
        let changes = session.advance_to(23.0, &ServiceWindow::MORNING);
        let phases: Vec<PeriodPhase> = changes.iter().map(|c| c.to).collect();
        assert_eq!(
            phases,
            vec![
                PeriodPhase::Prep,
                PeriodPhase::Service,
                PeriodPhase::Cleanup,
                PeriodPhase::Done
            ]
        );
        assert_eq!(session.stats.revenue, 0);
        assert_eq!(session.state(), ShopState::Closed);
    }

    #[test]
    fn done_session_does_not_reopen_the_same_day() {
        let mut session = PeriodSession::new(ServicePeriod::Evening);
        session.advance_to(23.0, &ServiceWindow::EVENING);
        assert!(session.advance_to(17.5, &ServiceWindow::EVENING).is_empty());
        assert_eq!(session.state(), ShopState::Closed);
    }

    #[test]
    fn skip_is_allowed_once_before_service() {
        let mut session = PeriodSession::new(ServicePeriod::Morning);
        session.advance_to(9.2, &ServiceWindow::MORNING);
        session.skip().unwrap();
        assert_eq!(session.state(), ShopState::Closed);
        assert_eq!(
            session.skip(),
            Err(ShopError::AlreadySkipped {
                period: ServicePeriod::Morning
            })
        );
        assert!(session.advance_to(11.0, &ServiceWindow::MORNING).is_empty());
    }

    #[test]
    fn skip_is_rejected_during_service_and_after() {
        let mut session = PeriodSession::new(ServicePeriod::Morning);
        session.advance_to(11.0, &ServiceWindow::MORNING);
        assert!(matches!(session.skip(), Err(ShopError::ServiceInProgress { .. })));
        session.advance_to(14.5, &ServiceWindow::MORNING);
        assert!(matches!(session.skip(), Err(ShopError::PeriodFinished { .. })));
    }

    #[test]
    fn reset_reopens_next_day() {
        let mut session = PeriodSession::new(ServicePeriod::Morning);
        session.skip().unwrap();
        session.reset_for_day();
        assert!(!session.skipped);
        session.advance_to(10.5, &ServiceWindow::MORNING);
        assert_eq!(session.state(), ShopState::Service);
    }

    #[test]
    fn window_validation() {
        ServiceWindow::MORNING.validate(ServicePeriod::Morning).unwrap();
        let bad = ServiceWindow {
            prep_start: 10.0,
            service_start: 10.0,
            service_end: 14.0,
            cleanup_end: 15.0,
        };
        assert!(bad.validate(ServicePeriod::Morning).is_err());
    }

    #[test]
    fn combined_stats_add_up() {
        let a = PeriodStats {
            customers_served: 2,
            revenue: 80,
            departures: 2,
            satisfaction_total: 8.0,
            ..PeriodStats::default()
        };
        let b = PeriodStats {
            customers_served: 1,
            revenue: 40,
            departures: 2,
            satisfaction_total: 4.0,
            ..PeriodStats::default()
        };
        let total = a.combined(&b);
        assert_eq!(total.customers_served, 3);
        assert_eq!(total.revenue, 120);
        assert_eq!(total.average_satisfaction(), Some(3.0));
    }
}
