//! Typed simulation events and the listener trait observers implement.
//!
//! Listeners run after the built-in subsystem reactions of a tick, in
//! registration order. A listener that fails is logged and skipped; it
//! never stops the clock or the listeners after it.

use haven_creature::CreatureEvent;
use haven_shop::{Dish, FestivalEvent, ShopEvent};
use haven_story::{StoryError, StoryStep};
use haven_types::{AchievementId, Weather};
use haven_world::{GatheredItem, SpawnRefresh, SpoiledStack, UpgradeReceipt};

use crate::clock::ClockEvent;

/// Everything observers can hear about.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// A clock boundary was crossed.
    Clock(ClockEvent),
    /// Today's weather was drawn along with tomorrow's forecast.
    WeatherRolled {
        /// Day index.
        day: u32,
        /// Weather in effect today.
        weather: Weather,
        /// Weather expected tomorrow.
        forecast: Weather,
    },
    /// Spawn points were re-rolled for a new day.
    SpawnsRefreshed(SpawnRefresh),
    /// The creature changed on its own.
    Creature(CreatureEvent),
    /// Something happened in the shop.
    Shop(ShopEvent),
    /// A story event fired or completed.
    Story(StoryStep),
    /// A story event could not complete; it stays available.
    StoryRejected(StoryError),
    /// The player gathered an item.
    Gathered(GatheredItem),
    /// Perishables outside the fridge went off overnight.
    ItemsSpoiled(Vec<SpoiledStack>),
    /// A festival started or ended.
    Festival(FestivalEvent),
    /// The player cooked a dish into the fridge.
    Cooked(Dish),
    /// The player bought a container upgrade.
    ContainerUpgraded(UpgradeReceipt),
    /// A milestone was reached and its reward paid.
    AchievementUnlocked {
        /// The achievement.
        achievement: AchievementId,
        /// Display name.
        name: String,
        /// Gold paid.
        reward_gold: u64,
    },
}

/// Observer notified of every event of a tick.
pub trait SimulationListener {
    /// Name used in logs and failure reports.
    fn name(&self) -> &str;

    /// Handle one event. `Err` carries the reason and is isolated.
    fn on_event(&mut self, event: &SimEvent) -> Result<(), String>;
}

/// A listener that ignores everything.
pub struct NoOpListener;

impl SimulationListener for NoOpListener {
    fn name(&self) -> &str {
        "noop"
    }

    fn on_event(&mut self, _event: &SimEvent) -> Result<(), String> {
        Ok(())
    }
}

/// A listener failure recorded during dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFailure {
    /// Name of the listener that failed.
    pub listener: String,
    /// What it reported.
    pub reason: String,
}
