//! Game clock and time tracking for the Haven simulation.
//!
//! The clock is the single source of truth for in-game time. It converts
//! real seconds into game hours through a scale factor, and reports every
//! boundary it crosses as a [`ClockEvent`] so the driver can react in a
//! fixed order.
//!
//! # Design Principles
//!
//! - Season is derived from the day index and never stored independently.
//! - A call to [`Clock::advance`] walks hour by hour, so a large step still
//!   chimes every hour and rolls over every day exactly once.
//! - Rejected input leaves the clock untouched.

use haven_types::{DayPeriod, Season};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Hours in one in-game day.
pub const HOURS_PER_DAY: f64 = 24.0;

/// Errors that can occur during clock operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClockError {
    /// A time step, scale, or hour is negative or not finite.
    #[error("invalid clock argument: {reason}")]
    InvalidArgument {
        /// What is wrong with the argument.
        reason: String,
    },

    /// Invalid time configuration (e.g. zero days per season).
    #[error("invalid time configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },

    /// A persisted clock record is inconsistent.
    #[error("corrupt clock record: {reason}")]
    CorruptRecord {
        /// The violated invariant.
        reason: String,
    },
}

/// A boundary the clock crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClockEvent {
    /// A whole in-game hour began.
    HourChimed {
        /// Day index.
        day: u32,
        /// Hour that began, 0--23.
        hour: u32,
    },
    /// Midnight passed.
    NewDay {
        /// The new day index.
        day: u32,
        /// Season of the new day.
        season: Season,
    },
    /// The first day of a season began.
    NewSeason {
        /// The new season.
        season: Season,
    },
    /// The coarse time-of-day band changed.
    PeriodChanged {
        /// Band left.
        from: DayPeriod,
        /// Band entered.
        to: DayPeriod,
    },
}

/// Persisted clock shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockRecord {
    /// Day index, starting at 1.
    pub day_index: u32,
    /// Hour of day in `[0, 24)`.
    pub hour_of_day: f64,
    /// Season of `day_index`.
    pub season: Season,
    /// Whether time is frozen.
    #[serde(default)]
    pub paused: bool,
}

/// The game clock.
#[derive(Debug, Clone, PartialEq)]
pub struct Clock {
    /// Day index (1-based).
    day: u32,
    /// Hour of day in `[0, 24)`.
    hour: f64,
    /// Game hours per real second.
    scale: f64,
    /// Days in each season.
    days_per_season: u32,
    /// Whether `advance` is a no-op.
    paused: bool,
}

impl Clock {
    /// Create a clock at day 1, `start_hour`.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `days_per_season` is 0, the
    /// scale is not positive and finite, or the start hour is outside
    /// `[0, 24)`.
    pub fn new(start_hour: f64, scale: f64, days_per_season: u32) -> Result<Self, ClockError> {
        if days_per_season == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "days_per_season must be at least 1".to_owned(),
            });
        }
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ClockError::InvalidConfig {
                reason: format!("scale {scale} must be positive and finite"),
            });
        }
        if !(0.0..HOURS_PER_DAY).contains(&start_hour) {
            return Err(ClockError::InvalidConfig {
                reason: format!("start hour {start_hour} outside [0, 24)"),
            });
        }
        Ok(Self {
            day: 1,
            hour: start_hour,
            scale,
            days_per_season,
            paused: false,
        })
    }

    /// Rebuild a clock from a record, keeping this clock's scale and season
    /// length. The receiver is untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::CorruptRecord`] for a zero day, an hour outside
    /// `[0, 24)`, or a season that does not match the day.
    pub fn restored(&self, record: ClockRecord) -> Result<Self, ClockError> {
        let corrupt = |reason: String| ClockError::CorruptRecord { reason };
        if record.day_index == 0 {
            return Err(corrupt("day index must start at 1".to_owned()));
        }
        if !record.hour_of_day.is_finite() || !(0.0..HOURS_PER_DAY).contains(&record.hour_of_day) {
            return Err(corrupt(format!("hour {} outside [0, 24)", record.hour_of_day)));
        }
        let expected = season_of(record.day_index, self.days_per_season);
        if record.season != expected {
            return Err(corrupt(format!(
                "season {:?} does not match day {} ({expected:?})",
                record.season, record.day_index
            )));
        }
        Ok(Self {
            day: record.day_index,
            hour: record.hour_of_day,
            scale: self.scale,
            days_per_season: self.days_per_season,
            paused: record.paused,
        })
    }

    /// Persisted form.
    pub fn record(&self) -> ClockRecord {
        ClockRecord {
            day_index: self.day,
            hour_of_day: self.hour,
            season: self.season(),
            paused: self.paused,
        }
    }

    /// Advance by `real_seconds` of wall time.
    ///
    /// Returns every boundary crossed, in order. A paused clock returns no
    /// events and does not move.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidArgument`] for negative or non-finite
    /// input; the clock is unchanged.
    pub fn advance(&mut self, real_seconds: f64) -> Result<Vec<ClockEvent>, ClockError> {
        if !real_seconds.is_finite() || real_seconds < 0.0 {
            return Err(ClockError::InvalidArgument {
                reason: format!("real seconds {real_seconds} must be finite and non-negative"),
            });
        }
        if self.paused {
            return Ok(Vec::new());
        }

        let mut remaining = real_seconds * self.scale;
        let mut events = Vec::new();
        while remaining > 0.0 {
            let boundary = self.hour.floor() + 1.0;
            // Compare the rounded sum, not the exact step, so the hour can
            // never land on the boundary without chiming it.
            let next = self.hour + remaining;
            if next < boundary {
                self.hour = next;
                break;
            }
            remaining -= boundary - self.hour;
            let before = self.period();
            if boundary >= HOURS_PER_DAY {
                self.hour = 0.0;
                self.roll_day(&mut events);
            } else {
                self.hour = boundary;
            }
            events.push(ClockEvent::HourChimed {
                day: self.day,
                hour: whole_hour(self.hour),
            });
            self.push_period_change(before, &mut events);
        }
        Ok(events)
    }

    /// Fast-forward to `wake_hour` (sleeping).
    ///
    /// If the wake hour is still ahead today the clock stays on the same
    /// day; otherwise it crosses exactly one midnight. Hours are not
    /// chimed while asleep.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidArgument`] if `wake_hour` is outside
    /// `[0, 24)`.
    pub fn force_to_next_morning(&mut self, wake_hour: f64) -> Result<Vec<ClockEvent>, ClockError> {
        if !(0.0..HOURS_PER_DAY).contains(&wake_hour) {
            return Err(ClockError::InvalidArgument {
                reason: format!("wake hour {wake_hour} outside [0, 24)"),
            });
        }
        let before = self.period();
        let mut events = Vec::new();
        if self.hour >= wake_hour {
            self.roll_day(&mut events);
        }
        self.hour = wake_hour;
        self.push_period_change(before, &mut events);
        info!(day = self.day, hour = self.hour, "Slept until morning");
        Ok(events)
    }

    fn roll_day(&mut self, events: &mut Vec<ClockEvent>) {
        self.day = self.day.saturating_add(1);
        let season = self.season();
        info!(day = self.day, season = ?season, "New day");
        events.push(ClockEvent::NewDay {
            day: self.day,
            season,
        });
        if self.day_within_season() == 0 {
            info!(season = ?season, "New season");
            events.push(ClockEvent::NewSeason { season });
        }
    }

    fn push_period_change(&self, before: DayPeriod, events: &mut Vec<ClockEvent>) {
        let after = self.period();
        if before != after {
            debug!(from = ?before, to = ?after, "Day period changed");
            events.push(ClockEvent::PeriodChanged {
                from: before,
                to: after,
            });
        }
    }

    /// Freeze time. Idempotent.
    pub const fn pause(&mut self) {
        self.paused = true;
    }

    /// Unfreeze time. Idempotent.
    pub const fn resume(&mut self) {
        self.paused = false;
    }

    /// Replace the time multiplier; takes effect on the next advance.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidArgument`] unless `scale` is positive
    /// and finite.
    pub fn set_scale(&mut self, scale: f64) -> Result<(), ClockError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(ClockError::InvalidArgument {
                reason: format!("scale {scale} must be positive and finite"),
            });
        }
        self.scale = scale;
        Ok(())
    }

    /// Day index, starting at 1.
    pub const fn day(&self) -> u32 {
        self.day
    }

    /// Hour of day in `[0, 24)`.
    pub const fn hour(&self) -> f64 {
        self.hour
    }

    /// Game hours per real second.
    pub const fn scale(&self) -> f64 {
        self.scale
    }

    /// Whether time is frozen.
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Configured season length in days.
    pub const fn days_per_season(&self) -> u32 {
        self.days_per_season
    }

    /// Current season.
    pub fn season(&self) -> Season {
        season_of(self.day, self.days_per_season)
    }

    /// Season of tomorrow.
    pub fn tomorrow_season(&self) -> Season {
        self.season_on(self.day.saturating_add(1))
    }

    /// Season on an arbitrary day index.
    pub fn season_on(&self, day: u32) -> Season {
        season_of(day, self.days_per_season)
    }

    /// Zero-based day within the current season.
    pub fn day_within_season(&self) -> u32 {
        self.day.saturating_sub(1).checked_rem(self.days_per_season).unwrap_or(0)
    }

    /// One-based day within the season of an arbitrary day index.
    pub fn day_of_season_on(&self, day: u32) -> u32 {
        day.saturating_sub(1)
            .checked_rem(self.days_per_season)
            .unwrap_or(0)
            .saturating_add(1)
    }

    /// Current coarse time-of-day band.
    pub fn period(&self) -> DayPeriod {
        DayPeriod::from_hour(self.hour)
    }

    /// Absolute game hours since day 1, 00:00.
    pub fn total_hours(&self) -> f64 {
        f64::from(self.day.saturating_sub(1)).mul_add(HOURS_PER_DAY, self.hour)
    }

    /// Hour of day as `HH:MM`.
    pub fn time_string(&self) -> String {
        // hour is in [0, 24), so the minute count fits comfortably.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let minutes_total = (self.hour * 60.0).floor().clamp(0.0, 1439.0) as u32;
        format!(
            "{:02}:{:02}",
            minutes_total.checked_div(60).unwrap_or(0),
            minutes_total.checked_rem(60).unwrap_or(0)
        )
    }
}

/// Whole hour of an hour-of-day value, clamped to 0--23.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_hour(hour: f64) -> u32 {
    hour.floor().clamp(0.0, 23.0) as u32
}

/// Season of a 1-based day index.
fn season_of(day: u32, days_per_season: u32) -> Season {
    let index = day
        .saturating_sub(1)
        .checked_div(days_per_season)
        .unwrap_or(0)
        .checked_rem(4)
        .unwrap_or(0);
    match index {
        0 => Season::Spring,
        1 => Season::Summer,
        2 => Season::Autumn,
        // 3 is the only remaining case.
        _ => Season::Winter,
    }
}
