//! Listener that writes simulation events to the structured log.
//!
//! Day-level events (weather, new days, stage changes, story beats,
//! festivals, achievements, spoilage, day summaries) go out at `info`; the
//! per-customer and per-dish chatter goes to `debug`.

use haven_core::{ClockEvent, SimEvent, SimulationListener};
use haven_shop::{FestivalEvent, ShopEvent};
use haven_story::StoryStep;
use tracing::{debug, info, warn};

/// Listener that logs every event it hears.
#[derive(Debug, Default)]
pub struct LogListener {
    events_seen: u64,
}

impl LogListener {
    /// Create a listener with a zeroed counter.
    pub const fn new() -> Self {
        Self { events_seen: 0 }
    }

    /// Events logged so far.
    pub const fn events_seen(&self) -> u64 {
        self.events_seen
    }
}

impl SimulationListener for LogListener {
    fn name(&self) -> &str {
        "log"
    }

    fn on_event(&mut self, event: &SimEvent) -> Result<(), String> {
        self.events_seen = self.events_seen.saturating_add(1);
        match event {
            SimEvent::Clock(ClockEvent::NewDay { day, season }) => {
                info!(day, season = ?season, "New day");
            }
            SimEvent::Clock(ClockEvent::NewSeason { season }) => {
                info!(season = ?season, "New season");
            }
            SimEvent::Clock(clock) => debug!(event = ?clock, "Clock"),
            SimEvent::WeatherRolled { day, weather, forecast } => {
                info!(day, weather = ?weather, forecast = ?forecast, "Weather rolled");
            }
            SimEvent::SpawnsRefreshed(refresh) => {
                debug!(refresh = ?refresh, "Spawn points refreshed");
            }
            SimEvent::Creature(change) => info!(event = ?change, "Creature changed"),
            SimEvent::Shop(ShopEvent::DayClosed(summary)) => {
                info!(summary = ?summary, "Shop day closed");
            }
            SimEvent::Shop(shop @ (ShopEvent::TierChanged { .. } | ShopEvent::RecipeUnlocked { .. })) => {
                info!(event = ?shop, "Shop milestone");
            }
            SimEvent::Shop(shop) => debug!(event = ?shop, "Shop"),
            SimEvent::Story(StoryStep::Started { event, .. }) => {
                info!(event = %event, "Story event started");
            }
            SimEvent::Story(StoryStep::Completed(completion)) => {
                info!(
                    event = %completion.event,
                    outcomes = completion.outcomes.len(),
                    chapter_change = ?completion.chapter_change,
                    "Story event completed"
                );
            }
            SimEvent::StoryRejected(error) => warn!(error = %error, "Story event rejected"),
            SimEvent::Gathered(item) => debug!(item = ?item, "Gathered"),
            SimEvent::ItemsSpoiled(stacks) => {
                let units: u32 = stacks.iter().map(|s| s.quantity).fold(0, u32::saturating_add);
                info!(stacks = stacks.len(), units, "Items spoiled");
            }
            SimEvent::Festival(FestivalEvent::Started { festival, name, recipes }) => {
                info!(festival = %festival, name = %name, recipes = recipes.len(), "Festival started");
            }
            SimEvent::Festival(FestivalEvent::Ended { festival }) => {
                info!(festival = %festival, "Festival ended");
            }
            SimEvent::Cooked(dish) => debug!(recipe = %dish.recipe, quality = ?dish.quality, "Cooked"),
            SimEvent::ContainerUpgraded(receipt) => {
                info!(
                    container = ?receipt.container,
                    capacity = receipt.capacity,
                    cost = receipt.cost,
                    "Container upgraded"
                );
            }
            SimEvent::AchievementUnlocked {
                achievement,
                name,
                reward_gold,
            } => info!(achievement = %achievement, name = %name, reward_gold, "Achievement unlocked"),
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use haven_types::{AchievementId, FestivalId, Season, Weather};

    use super::*;

    #[test]
    fn counts_every_event_and_never_fails() {
        let mut listener = LogListener::new();
        let events = [
            SimEvent::Clock(ClockEvent::NewDay {
                day: 2,
                season: Season::Spring,
            }),
            SimEvent::WeatherRolled {
                day: 2,
                weather: Weather::Sunny,
                forecast: Weather::Rainy,
            },
            SimEvent::Festival(FestivalEvent::Ended {
                festival: FestivalId::new("lantern"),
            }),
            SimEvent::AchievementUnlocked {
                achievement: AchievementId::new("festival_goer"),
                name: "Festival Goer".to_owned(),
                reward_gold: 100,
            },
        ];
        for event in &events {
            listener.on_event(event).unwrap();
        }
        assert_eq!(listener.events_seen(), 4);
        assert_eq!(listener.name(), "log");
    }
}
