//! A scripted player for headless runs.
//!
//! [`Autopilot`] looks at the simulation after every frame and performs
//! the chores a careful player would: finish story dialogue, look after
//! the creature, keep staff morale up, work the customer floor, gather
//! what is ready in the current zone, and go to bed at night. Dishes come
//! from the fridge when one is stocked and are cooked on demand otherwise. It only
//! attempts an operation when the state says it should succeed, so a
//! rejected operation is logged at debug level and skipped.

use std::collections::BTreeMap;

use haven_core::Simulation;
use haven_shop::{CustomerState, Dish};
use haven_types::{CustomerId, EventId, ItemId, LifeStage, RecipeId, SpawnPointId, StaffId};
use haven_world::{Availability, ContainerKind};
use tracing::debug;

/// Hour of day the autopilot goes to bed.
const BEDTIME_HOUR: f64 = 22.0;

/// Something the player did during a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerAction {
    /// A story dialogue was played to the end.
    CompletedStory(EventId),
    /// A story dialogue could not complete and was abandoned.
    AbortedStory(EventId),
    /// Slept until the next morning.
    Slept,
    /// Cooked a dish into the fridge.
    Cooked(RecipeId),
    /// Fed the creature.
    Fed(RecipeId),
    /// Petted the creature.
    Petted,
    /// Gave a staff member a pep talk.
    Talked(StaffId),
    /// Took a customer's order.
    TookOrder(CustomerId),
    /// Served a customer.
    Served(CustomerId, RecipeId),
    /// Gathered from a spawn point.
    Gathered(SpawnPointId),
    /// Moved carried stacks into storage.
    Deposited(u32),
}

/// Decides what the player does between frames.
pub trait Player {
    /// Act on the simulation, returning what was done.
    fn act(&mut self, sim: &mut Simulation) -> Vec<PlayerAction>;
}

/// A player that never does anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdlePlayer;

impl Player for IdlePlayer {
    fn act(&mut self, _sim: &mut Simulation) -> Vec<PlayerAction> {
        Vec::new()
    }
}

/// The scripted player.
#[derive(Debug, Clone, Default)]
pub struct Autopilot {
    /// Absolute game hour of the last pep talk per staff member.
    talked_at: BTreeMap<StaffId, f64>,
}

impl Autopilot {
    /// Create an autopilot with no history.
    pub fn new() -> Self {
        Self::default()
    }

    fn play_story(sim: &mut Simulation, actions: &mut Vec<PlayerAction>) {
        let Some(event) = sim.narrator().active().cloned() else {
            return;
        };
        match sim.complete_story(&event) {
            Ok(_) => actions.push(PlayerAction::CompletedStory(event)),
            Err(e) => {
                debug!(event = %event, error = %e, "Abandoning story dialogue");
                if sim.abort_story(&event).is_ok() {
                    actions.push(PlayerAction::AbortedStory(event));
                }
            }
        }
    }

    fn care_for_creature(sim: &mut Simulation, actions: &mut Vec<PlayerAction>) {
        let creature = sim.creature();
        if creature.stage() == LifeStage::Egg {
            return;
        }
        let config = sim.creature_config();
        let hungry = creature.hunger() <= config.hunger_warning;
        let sad = creature.happiness() <= config.happiness_warning;

        if hungry {
            let menu = sim.shop().menu().dishes().to_vec();
            if let Some(dish) = menu.iter().find_map(|recipe| dish_for(sim, recipe, actions)) {
                match sim.feed(&dish) {
                    Ok(_) => actions.push(PlayerAction::Fed(dish.recipe)),
                    Err(e) => debug!(error = %e, "Feeding skipped"),
                }
            }
        }
        if sad {
            match sim.pet() {
                Ok(_) => actions.push(PlayerAction::Petted),
                Err(e) => debug!(error = %e, "Petting skipped"),
            }
        }
    }

    fn encourage_staff(&mut self, sim: &mut Simulation, actions: &mut Vec<PlayerAction>) {
        let staff_config = &sim.shop().config().staff;
        let now = sim.clock().total_hours();
        let cooldown = staff_config.talk_cooldown_hours;
        let threshold = staff_config.low_morale_threshold;

        let due: Vec<StaffId> = sim
            .shop()
            .roster()
            .members()
            .iter()
            .filter(|m| m.morale() < threshold)
            .filter(|m| self.talked_at.get(m.id()).is_none_or(|last| now - last >= cooldown))
            .map(|m| m.id().clone())
            .collect();

        for staff in due {
            match sim.talk_to(&staff) {
                Ok(outcome) => {
                    debug!(staff = %staff, morale = outcome.morale, "Pep talk given");
                    self.talked_at.insert(staff.clone(), now);
                    actions.push(PlayerAction::Talked(staff));
                }
                Err(e) => debug!(staff = %staff, error = %e, "Pep talk skipped"),
            }
        }
    }

    fn work_floor(sim: &mut Simulation, actions: &mut Vec<PlayerAction>) {
        if !sim.shop().in_service() {
            return;
        }

        // 1. Take every seated order.
        let waiting: Vec<CustomerId> = sim
            .shop()
            .customers()
            .filter(|c| c.state == CustomerState::Waiting && c.seated)
            .map(|c| c.id)
            .collect();
        for customer in waiting {
            match sim.take_order(customer) {
                Ok(_) => actions.push(PlayerAction::TookOrder(customer)),
                Err(e) => debug!(customer = %customer, error = %e, "Order not taken"),
            }
        }

        // 2. Serve everyone who has ordered, matching the category when
        //    the menu allows it.
        let ordered: Vec<(CustomerId, Option<RecipeId>)> = sim
            .shop()
            .customers()
            .filter(|c| c.state == CustomerState::Ordered)
            .map(|c| {
                let dish = c.order.and_then(|order| {
                    let shop = sim.shop();
                    shop.menu()
                        .dishes()
                        .iter()
                        .find(|id| shop.book().get(id).is_some_and(|def| def.category == order.category))
                        .or_else(|| shop.menu().dishes().first())
                        .cloned()
                });
                (c.id, dish)
            })
            .collect();
        for (customer, recipe) in ordered {
            let Some(dish) = recipe.and_then(|recipe| dish_for(sim, &recipe, actions)) else {
                continue;
            };
            match sim.serve(customer, &dish) {
                Ok(_) => actions.push(PlayerAction::Served(customer, dish.recipe)),
                Err(e) => debug!(customer = %customer, error = %e, "Serve failed"),
            }
        }
    }

    fn gather_ready(sim: &mut Simulation, actions: &mut Vec<PlayerAction>) {
        let here = sim.zones().current().clone();
        let ready: Vec<SpawnPointId> = sim
            .spawns()
            .definitions()
            .filter(|def| def.zone == here)
            .map(|def| def.id.clone())
            .filter(|id| matches!(sim.spawn_availability(id), Ok(Availability::Available)))
            .collect();

        for point in ready {
            match sim.gather(&point) {
                Ok(_) => actions.push(PlayerAction::Gathered(point)),
                Err(e) => {
                    debug!(point = %point, error = %e, "Gather failed, emptying the bag");
                    let moved = sim.deposit_carried();
                    if moved > 0 {
                        actions.push(PlayerAction::Deposited(moved));
                    }
                    break;
                }
            }
        }
    }
}

/// The best stocked dish of `recipe`, cooking one if the fridge has none.
fn dish_for(sim: &mut Simulation, recipe: &RecipeId, actions: &mut Vec<PlayerAction>) -> Option<Dish> {
    let item = ItemId::new(recipe.as_str());
    let stocked = sim
        .inventory()
        .container(ContainerKind::Fridge)
        .stacks()
        .iter()
        .filter(|stack| stack.item == item)
        .map(|stack| stack.quality)
        .max();
    if let Some(quality) = stocked {
        return Some(Dish {
            recipe: recipe.clone(),
            quality,
        });
    }
    match sim.cook(recipe) {
        Ok(dish) => {
            actions.push(PlayerAction::Cooked(recipe.clone()));
            Some(dish)
        }
        Err(e) => {
            debug!(recipe = %recipe, error = %e, "Cooking skipped");
            None
        }
    }
}

impl Player for Autopilot {
    fn act(&mut self, sim: &mut Simulation) -> Vec<PlayerAction> {
        let mut actions = Vec::new();
        if sim.clock().is_paused() {
            return actions;
        }

        Self::play_story(sim, &mut actions);

        if sim.clock().hour() >= BEDTIME_HOUR && !sim.shop().in_service() {
            match sim.sleep() {
                Ok(()) => actions.push(PlayerAction::Slept),
                Err(e) => debug!(error = %e, "Could not sleep"),
            }
            return actions;
        }

        Self::care_for_creature(sim, &mut actions);
        self.encourage_staff(sim, &mut actions);
        Self::work_floor(sim, &mut actions);
        Self::gather_ready(sim, &mut actions);
        actions
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use haven_core::{GameContent, SimulationConfig};

    use super::*;

    fn sunny_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        for weights in [
            &mut config.weather.spring,
            &mut config.weather.summer,
            &mut config.weather.autumn,
            &mut config.weather.winter,
        ] {
            weights.sunny = 1.0;
            weights.cloudy = 0.0;
            weights.rainy = 0.0;
            weights.stormy = 0.0;
            weights.special = 0.0;
        }
        config
    }

    fn sim_with(config: SimulationConfig) -> Simulation {
        Simulation::new(config, GameContent::builtin()).unwrap()
    }

    /// Tick and act until the clock reaches `hour` of the current day.
    fn play_until_hour(sim: &mut Simulation, pilot: &mut Autopilot, hour: f64) -> Vec<PlayerAction> {
        let mut actions = Vec::new();
        let day = sim.clock().day();
        while sim.clock().day() == day && sim.clock().hour() < hour {
            sim.tick(0.1).unwrap();
            actions.extend(pilot.act(sim));
        }
        actions
    }

    #[test]
    fn idle_player_does_nothing() {
        let mut sim = sim_with(SimulationConfig::default());
        sim.tick(0.1).unwrap();
        assert!(IdlePlayer.act(&mut sim).is_empty());
    }

    #[test]
    fn plays_the_first_dialogue_to_the_end() {
        let mut sim = sim_with(SimulationConfig::default());
        let mut pilot = Autopilot::new();
        let mut actions = Vec::new();
        for _ in 0..5 {
            sim.tick(0.1).unwrap();
            actions.extend(pilot.act(&mut sim));
        }
        let met = EventId::new("meet_melody");
        assert!(actions.contains(&PlayerAction::CompletedStory(met.clone())));
        assert!(sim.narrator().is_completed(&met));
        assert!(sim.narrator().active().is_none());
    }

    #[test]
    fn gathers_everything_ready_in_the_current_zone() {
        let mut sim = sim_with(SimulationConfig::default());
        let mut pilot = Autopilot::new();
        sim.tick(0.1).unwrap();
        pilot.act(&mut sim);

        let here = sim.zones().current().clone();
        let ids: Vec<SpawnPointId> = sim
            .spawns()
            .definitions()
            .filter(|def| def.zone == here)
            .map(|def| def.id.clone())
            .collect();
        assert!(!ids.is_empty());
        for id in ids {
            assert_ne!(sim.spawn_availability(&id).unwrap(), Availability::Available);
        }
    }

    #[test]
    fn serves_customers_during_service() {
        let mut sim = sim_with(sunny_config());
        let mut pilot = Autopilot::new();
        let gold_before = sim.inventory().gold();
        let service_end = sim.config().shop.morning.service_end;

        let actions = play_until_hour(&mut sim, &mut pilot, service_end);

        assert!(actions.iter().any(|a| matches!(a, PlayerAction::TookOrder(_))));
        assert!(actions.iter().any(|a| matches!(a, PlayerAction::Served(..))));
        assert!(sim.inventory().gold() > gold_before);
    }

    #[test]
    fn cooks_before_it_serves() {
        let mut sim = sim_with(sunny_config());
        let mut pilot = Autopilot::new();
        let service_end = sim.config().shop.morning.service_end;

        let actions = play_until_hour(&mut sim, &mut pilot, service_end);

        let first_cook = actions.iter().position(|a| matches!(a, PlayerAction::Cooked(_)));
        let first_serve = actions.iter().position(|a| matches!(a, PlayerAction::Served(..)));
        assert!(first_cook.is_some());
        assert!(first_cook < first_serve);
    }

    #[test]
    fn uses_a_stocked_dish_before_cooking_another() {
        let mut sim = sim_with(SimulationConfig::default());
        let juice = RecipeId::new("berry_juice");
        let cooked = sim.cook(&juice).unwrap();
        let mut actions = Vec::new();

        let dish = dish_for(&mut sim, &juice, &mut actions).unwrap();
        assert_eq!(dish, cooked);
        assert!(actions.is_empty());

        sim.tick(0.0).unwrap();
        let herbs = dish_for(&mut sim, &RecipeId::new("herb_salad"), &mut actions).unwrap();
        assert_eq!(actions, [PlayerAction::Cooked(herbs.recipe)]);
    }

    #[test]
    fn talks_to_low_morale_staff_once_per_cooldown() {
        let mut config = SimulationConfig::default();
        config.shop.staff.starting_morale = 5.0;
        config.shop.staff.talk_boost = 1.0;
        let mut sim = sim_with(config);
        let mut pilot = Autopilot::new();
        sim.tick(0.1).unwrap();

        let first = pilot.act(&mut sim);
        let talks = first.iter().filter(|a| matches!(a, PlayerAction::Talked(_))).count();
        assert_eq!(talks, sim.shop().roster().members().len());

        sim.tick(0.1).unwrap();
        let second = pilot.act(&mut sim);
        assert!(!second.iter().any(|a| matches!(a, PlayerAction::Talked(_))));
    }

    #[test]
    fn goes_to_bed_at_night() {
        let mut config = sunny_config();
        config.time.real_seconds_per_game_hour = 1.0;
        let mut sim = sim_with(config);
        let mut pilot = Autopilot::new();

        let actions = play_until_hour(&mut sim, &mut pilot, 23.0);

        assert!(actions.contains(&PlayerAction::Slept));
        assert_eq!(sim.clock().day(), 2);
        assert_eq!(sim.clock().hour(), sim.config().time.wake_hour);
    }
}
