//! The simulation driver: one owned instance of every subsystem, advanced
//! by [`Simulation::tick`] and mutated only through the operations below.
//!
//! Per tick, in order:
//!
//! 1. **Clock** -- advance by the clamped real-time delta.
//! 2. **Boundaries** -- for each crossed boundary, in the order crossed:
//!    a new day rolls weather, then refreshes spawn points, then spoils
//!    perishables outside the fridge, then starts or ends festivals, then
//!    ages the creature, then resets the shop; an hour chime decays the
//!    creature and tires serving staff.
//! 3. **Abilities** -- drain stamina for a running continuous ability.
//! 4. **Shop** -- drive both service periods and the customer floor; revenue
//!    and tips go to the player's gold.
//! 5. **Story** -- poll the narrator against the resulting world.
//! 6. **Achievements** -- unlock milestones and pay their rewards.
//! 7. **Listeners** -- deliver every event of the tick, isolating failures.
//!
//! Player operations between ticks buffer their events, which are
//! delivered with the next tick.
//!
//! Dishes are cooked from inventory into the fridge and served or fed from
//! there, so the kitchen only sells what the player actually gathered.

use haven_creature::{
    AbilityCatalog, AbilityEffect, Creature, CreatureConfig, FeedOutcome, Meal, PetOutcome,
};
use haven_shop::{
    Dish, FestivalCalendar, FestivalEvent, Order, RecipeBook, ServeOutcome, Shop, ShopError, ShopEvent,
    ShopUpdate, TalkOutcome, cooked_quality,
};
use haven_story::{Completion, Narrator, Outcome, OutcomeSink, StoryBook, StoryStep, WorldView};
use haven_types::{
    AbilityId, CustomerId, EventId, ItemId, Quality, RecipeId, Season, ServicePeriod, SimRng,
    SpawnPointId, StaffId, ZoneId,
};
use haven_world::{
    Availability, ContainerKind, DayContext, GatheredItem, Inventory, SpawnScheduler, UpgradeReceipt,
    WeatherRoller, WorldError, ZoneMap,
};
use tracing::{debug, info, warn};

use crate::achievement::{Achievements, Progress};
use crate::clock::{Clock, ClockEvent};
use crate::config::SimulationConfig;
use crate::content::GameContent;
use crate::error::SimError;
use crate::listener::{ListenerFailure, SimEvent, SimulationListener};

/// Salt separating the driver's running random stream from daily rolls.
const DRIVER_STREAM_SALT: u64 = 0x6861_7665_6e5f_6472;

/// What one tick produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Every event delivered to listeners, in order.
    pub events: Vec<SimEvent>,
    /// Listeners that reported an error. Dispatch continued past each one.
    pub listener_failures: Vec<ListenerFailure>,
}

/// Every piece of live simulation state.
///
/// Kept apart from the listener list so it can be cloned, compared, and
/// swapped wholesale on restore.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SimState {
    pub(crate) config: SimulationConfig,
    pub(crate) clock: Clock,
    pub(crate) weather: WeatherRoller,
    pub(crate) spawns: SpawnScheduler,
    pub(crate) zones: ZoneMap,
    pub(crate) inventory: Inventory,
    pub(crate) catalog: AbilityCatalog,
    pub(crate) creature: Creature,
    pub(crate) shop: Shop,
    pub(crate) festivals: FestivalCalendar,
    pub(crate) narrator: Narrator,
    pub(crate) achievements: Achievements,
    pub(crate) rng: SimRng,
    pub(crate) playtime_seconds: f64,
    pub(crate) pending: Vec<SimEvent>,
}

/// The Haven simulation.
pub struct Simulation {
    pub(crate) state: SimState,
    listeners: Vec<Box<dyn SimulationListener>>,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("day", &self.state.clock.day())
            .field("hour", &self.state.clock.hour())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Build a fresh game from configuration and static content.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] or [`SimError::Content`] when either
    /// fails validation, or the subsystem error for anything the
    /// subsystems themselves reject.
    pub fn new(config: SimulationConfig, content: GameContent) -> Result<Self, SimError> {
        config.validate()?;
        content.validate()?;
        let seed = config.world.seed;

        // 1. Time and weather
        let clock = Clock::new(config.time.start_hour, config.time.scale(), config.time.days_per_season)?;
        let weather = WeatherRoller::new(
            seed,
            config.weather.clone(),
            clock.day(),
            clock.season(),
            clock.tomorrow_season(),
        )?;

        // 2. World
        let mut spawns = SpawnScheduler::new(seed, config.spawning.clone(), content.spawn_points)?;
        let zones = ZoneMap::new(content.zones, ZoneId::new(&config.world.start_location))?;
        let mut inventory = Inventory::new(&config.inventory);
        for stack in &content.starting_pantry {
            inventory.add_stack(ContainerKind::Fridge, stack)?;
        }

        // 3. Creature
        let catalog = AbilityCatalog::new(content.abilities)?;
        let creature = Creature::new_egg(&config.creature);

        // 4. Shop
        let book = RecipeBook::new(content.recipes)?;
        let mut festivals = FestivalCalendar::new(content.festivals, &book, config.time.days_per_season)?;
        let mut shop = Shop::new(config.shop.clone(), book, content.staff)?;

        // 5. Story and milestones
        let narrator = Narrator::new(StoryBook::new(content.story)?);
        let achievements = Achievements::new(content.achievements)?;

        // 6. First day
        let ctx = DayContext {
            day: clock.day(),
            season: clock.season(),
            weather: weather.today(),
        };
        let mut pending = vec![SimEvent::WeatherRolled {
            day: clock.day(),
            weather: weather.today(),
            forecast: weather.forecast(),
        }];
        pending.push(SimEvent::SpawnsRefreshed(spawns.on_new_day(ctx)));
        roll_festivals(
            &mut festivals,
            &mut shop,
            clock.season(),
            clock.day_of_season_on(clock.day()),
            &mut pending,
        );
        let opening = shop.on_new_day(weather.today());
        pending.extend(
            opening
                .events
                .into_iter()
                .filter(|e| !matches!(e, ShopEvent::DayClosed(_)))
                .map(SimEvent::Shop),
        );

        info!(
            world = %config.world.name,
            seed,
            day = clock.day(),
            hour = clock.hour(),
            weather = ?weather.today(),
            "Simulation created"
        );

        Ok(Self {
            state: SimState {
                rng: SimRng::for_day(seed, 0, DRIVER_STREAM_SALT),
                config,
                clock,
                weather,
                spawns,
                zones,
                inventory,
                catalog,
                creature,
                shop,
                festivals,
                narrator,
                achievements,
                playtime_seconds: 0.0,
                pending,
            },
            listeners: Vec::new(),
        })
    }

    /// Add a listener. Listeners are notified in registration order.
    pub fn register_listener(&mut self, listener: Box<dyn SimulationListener>) {
        info!(listener = listener.name(), "Listener registered");
        self.listeners.push(listener);
    }

    /// Advance the simulation by `real_seconds` of wall time.
    ///
    /// The step is clamped to `time.max_tick_seconds` before the clock's
    /// scale applies. A paused simulation only delivers buffered events.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidArgument`] for negative or non-finite
    /// input, with nothing changed.
    pub fn tick(&mut self, real_seconds: f64) -> Result<TickReport, SimError> {
        if !real_seconds.is_finite() || real_seconds < 0.0 {
            return Err(SimError::InvalidArgument {
                reason: format!("tick delta {real_seconds} must be finite and non-negative"),
            });
        }
        let dt = real_seconds.min(self.state.config.time.max_tick_seconds);

        let mut events = std::mem::take(&mut self.state.pending);
        if !self.state.clock.is_paused() {
            self.state.step(dt, &mut events)?;
        }
        let listener_failures = self.dispatch(&events);
        Ok(TickReport {
            events,
            listener_failures,
        })
    }

    fn dispatch(&mut self, events: &[SimEvent]) -> Vec<ListenerFailure> {
        let mut failures = Vec::new();
        for event in events {
            for listener in &mut self.listeners {
                if let Err(reason) = listener.on_event(event) {
                    warn!(listener = listener.name(), reason = %reason, "Listener failed");
                    failures.push(ListenerFailure {
                        listener: listener.name().to_owned(),
                        reason,
                    });
                }
            }
        }
        failures
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Freeze the clock. Idempotent.
    pub const fn pause(&mut self) {
        self.state.clock.pause();
    }

    /// Unfreeze the clock. Idempotent.
    pub const fn resume(&mut self) {
        self.state.clock.resume();
    }

    /// Replace the clock's game-hours-per-real-second multiplier.
    ///
    /// # Errors
    ///
    /// [`SimError::Clock`] unless `scale` is positive and finite.
    pub fn set_scale(&mut self, scale: f64) -> Result<(), SimError> {
        self.state.clock.set_scale(scale)?;
        Ok(())
    }

    /// Sleep until the configured wake hour.
    ///
    /// Crossing midnight runs the day-rollover reactions exactly once. The
    /// creature wakes with full stamina.
    ///
    /// # Errors
    ///
    /// [`SimError::Clock`] for an invalid wake hour; nothing changes.
    pub fn sleep(&mut self) -> Result<(), SimError> {
        let state = &mut self.state;
        let clock_events = state.clock.force_to_next_morning(state.config.time.wake_hour)?;
        let mut events = std::mem::take(&mut state.pending);
        for event in clock_events {
            state.react(event, &mut events);
        }
        state.creature.rest();
        state.pending = events;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // World
    // -----------------------------------------------------------------------

    /// Gather from a spawn point in the current zone into the carried bag.
    ///
    /// # Errors
    ///
    /// [`SimError::World`] with `UnknownSpawnPoint`, `WrongZone`,
    /// `NotAvailable`, `MissingAbility`, or `InventoryFull`. Nothing
    /// changes on failure.
    pub fn gather(&mut self, point: &SpawnPointId) -> Result<GatheredItem, SimError> {
        let state = &mut self.state;
        let ctx = state.day_context();
        let item = state.spawns.gather(
            point,
            ctx,
            state.zones.current(),
            state.creature.abilities(),
            &mut state.inventory,
        )?;
        state.pending.push(SimEvent::Gathered(item.clone()));
        Ok(item)
    }

    /// Whether a spawn point can be gathered right now.
    ///
    /// # Errors
    ///
    /// [`SimError::World`] if the point is not defined.
    pub fn spawn_availability(&self, point: &SpawnPointId) -> Result<Availability, SimError> {
        let state = &self.state;
        Ok(state
            .spawns
            .availability(point, state.day_context(), state.creature.abilities())?)
    }

    /// Move to another zone.
    ///
    /// # Errors
    ///
    /// [`SimError::World`] with `UnknownZone` or `ZoneLocked`.
    pub fn travel(&mut self, zone: &ZoneId) -> Result<(), SimError> {
        let stage = self.state.creature.stage();
        self.state.zones.travel(zone, stage)?;
        info!(zone = %zone, "Travelled");
        Ok(())
    }

    /// Move every carried stack that fits into storage.
    pub fn deposit_carried(&mut self) -> u32 {
        self.state.inventory.deposit_carried()
    }

    /// Buy one slot upgrade for a container.
    ///
    /// # Errors
    ///
    /// [`SimError::World`] with `UpgradeMaxed` or `InsufficientGold`;
    /// nothing changes.
    pub fn purchase_upgrade(&mut self, container: ContainerKind) -> Result<UpgradeReceipt, SimError> {
        let state = &mut self.state;
        let receipt = state
            .inventory
            .purchase_upgrade(container, &state.config.inventory)?;
        state.pending.push(SimEvent::ContainerUpgraded(receipt));
        Ok(receipt)
    }

    /// Move items between containers.
    ///
    /// # Errors
    ///
    /// [`SimError::World`] with `InsufficientItems` or `InventoryFull`.
    pub fn transfer(
        &mut self,
        from: ContainerKind,
        to: ContainerKind,
        item: &ItemId,
        quality: Quality,
        quantity: u32,
    ) -> Result<(), SimError> {
        self.state.inventory.transfer(from, to, item, quality, quantity)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Creature
    // -----------------------------------------------------------------------

    /// Feed the creature a cooked dish from the fridge.
    ///
    /// A running festival's bond multiplier applies. The dish is used up
    /// only when the creature eats it.
    ///
    /// # Errors
    ///
    /// [`SimError::Shop`] for an unknown recipe, [`SimError::World`] with
    /// `InsufficientItems` when the fridge holds no such dish, and
    /// [`SimError::Creature`] while the creature is still an egg.
    pub fn feed(&mut self, dish: &Dish) -> Result<FeedOutcome, SimError> {
        let state = &mut self.state;
        let def = state.shop.book().require(&dish.recipe)?;
        let item = stocked_dish(&state.inventory, dish)?;
        let meal = Meal {
            recipe: def.id.clone(),
            hunger_value: def.hunger_value,
            happiness_value: def.happiness_value,
            color_influence: def.color_influence,
            quality: dish.quality,
            favorite: def.favorite,
            bond_multiplier: state.festivals.bonuses().bond_multiplier,
        };
        let outcome = state.creature.feed(&meal, &state.config.creature)?;
        state.inventory.remove(ContainerKind::Fridge, &item, dish.quality, 1)?;
        self.settle();
        Ok(outcome)
    }

    /// Pet the creature.
    ///
    /// # Errors
    ///
    /// [`SimError::Creature`] while the creature is still an egg.
    pub fn pet(&mut self) -> Result<PetOutcome, SimError> {
        let outcome = self.state.creature.pet(&self.state.config.creature)?;
        self.settle();
        Ok(outcome)
    }

    /// Use an instant ability.
    ///
    /// # Errors
    ///
    /// [`SimError::Creature`] with `AbilityLocked`, `InsufficientStamina`,
    /// and friends. Stamina is untouched on failure.
    pub fn use_ability(&mut self, ability: &AbilityId) -> Result<AbilityEffect, SimError> {
        Ok(self.state.creature.use_ability(ability, &self.state.catalog)?)
    }

    /// Start a continuous ability; it drains stamina every tick.
    ///
    /// # Errors
    ///
    /// [`SimError::Creature`] when the ability is locked, not continuous,
    /// or another one is already running.
    pub fn start_ability(&mut self, ability: &AbilityId) -> Result<(), SimError> {
        self.state.creature.start_ability(ability, &self.state.catalog)?;
        Ok(())
    }

    /// Stop the running continuous ability.
    ///
    /// # Errors
    ///
    /// [`SimError::Creature`] if `ability` is not the one running.
    pub fn stop_ability(&mut self, ability: &AbilityId) -> Result<(), SimError> {
        self.state.creature.stop_ability(ability)?;
        Ok(())
    }

    /// Rename the creature.
    ///
    /// # Errors
    ///
    /// [`SimError::Creature`] for an empty or over-long name.
    pub fn rename_creature(&mut self, name: &str) -> Result<(), SimError> {
        self.state.creature.rename(name, &self.state.config.creature)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Shop
    // -----------------------------------------------------------------------

    /// Take a seated customer's order.
    ///
    /// # Errors
    ///
    /// [`SimError::Shop`] when the customer is unknown, queued, or has
    /// already ordered.
    pub fn take_order(&mut self, customer: CustomerId) -> Result<Order, SimError> {
        let state = &mut self.state;
        Ok(state.shop.take_order(customer, &mut state.rng)?)
    }

    /// Cook one dish of `recipe` into the fridge.
    ///
    /// Each ingredient is drawn best quality first, from the fridge, then
    /// storage, then the bag. The dish comes out at the quantity-weighted
    /// mean quality of what went in, plus the running festival's bonus.
    ///
    /// # Errors
    ///
    /// [`SimError::Shop`] for an unknown or locked recipe and for a
    /// festival dish outside its festival; [`SimError::World`] with
    /// `InsufficientItems` or `InventoryFull`. Nothing changes on failure.
    pub fn cook(&mut self, recipe: &RecipeId) -> Result<Dish, SimError> {
        let state = &mut self.state;
        let def = state.shop.book().require(recipe)?;
        if !state.shop.menu().unlocked().contains(recipe) {
            return Err(ShopError::RecipeLocked(recipe.clone()).into());
        }
        if !state.festivals.in_season(def) {
            return Err(ShopError::OutOfSeason(recipe.clone()).into());
        }

        let mut inventory = state.inventory.clone();
        let mut used = Vec::with_capacity(def.ingredients.len());
        for ingredient in &def.ingredients {
            let taken = inventory.take(&ingredient.item, ingredient.min_quality, ingredient.quantity)?;
            used.extend(taken.iter().map(|stack| (stack.quality, stack.quantity)));
        }
        let dish = Dish {
            recipe: recipe.clone(),
            quality: cooked_quality(&used, state.festivals.bonuses().quality_bonus),
        };
        inventory.add_perishable(ContainerKind::Fridge, &dish.item(), dish.quality, 1)?;
        state.inventory = inventory;

        debug!(recipe = %recipe, quality = ?dish.quality, "Dish cooked");
        state.pending.push(SimEvent::Cooked(dish.clone()));
        Ok(dish)
    }

    /// Serve a cooked dish from the fridge to a customer who has ordered.
    ///
    /// The dish is used up only when the serve succeeds.
    ///
    /// # Errors
    ///
    /// [`SimError::World`] with `InsufficientItems` when the fridge holds
    /// no such dish; [`SimError::Shop`] when the recipe is not on the menu
    /// or the customer is not waiting for food.
    pub fn serve(&mut self, customer: CustomerId, dish: &Dish) -> Result<ServeOutcome, SimError> {
        let state = &mut self.state;
        let item = stocked_dish(&state.inventory, dish)?;
        let outcome = state.shop.serve(customer, dish, &mut state.rng)?;
        state.inventory.remove(ContainerKind::Fridge, &item, dish.quality, 1)?;
        Ok(outcome)
    }

    /// Skip a service period, paying the reputation penalty once.
    ///
    /// # Errors
    ///
    /// [`SimError::Shop`] once service has begun, for a period already
    /// skipped or finished, and on days closed by weather.
    pub fn skip_service(&mut self, period: ServicePeriod) -> Result<(), SimError> {
        let events = self.state.shop.skip_service(period)?;
        self.state.pending.extend(events.into_iter().map(SimEvent::Shop));
        Ok(())
    }

    /// Give a staff member a pep talk.
    ///
    /// # Errors
    ///
    /// [`SimError::Shop`] with `UnknownStaff` or `TalkOnCooldown`.
    pub fn talk_to(&mut self, staff: &StaffId) -> Result<TalkOutcome, SimError> {
        let now = self.state.clock.total_hours();
        Ok(self.state.shop.talk_to(staff, now)?)
    }

    /// Put an unlocked recipe on the menu.
    ///
    /// # Errors
    ///
    /// [`SimError::Shop`] for locked, duplicate, or overflowing entries.
    pub fn add_to_menu(&mut self, recipe: &RecipeId) -> Result<(), SimError> {
        self.state.shop.add_to_menu(recipe)?;
        Ok(())
    }

    /// Take a recipe off the menu.
    ///
    /// # Errors
    ///
    /// [`SimError::Shop`] if the recipe is not on the menu.
    pub fn remove_from_menu(&mut self, recipe: &RecipeId) -> Result<(), SimError> {
        self.state.shop.remove_from_menu(recipe)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Story
    // -----------------------------------------------------------------------

    /// The dialogue for the active story event finished normally.
    ///
    /// # Errors
    ///
    /// [`SimError::Story`]; an `OutcomeRejected` failure applies nothing
    /// and leaves the event available to fire again.
    pub fn complete_story(&mut self, event: &EventId) -> Result<Completion, SimError> {
        let state = &mut self.state;
        let day = state.clock.day();
        let mut sink = WorldSink::new(&mut state.shop, &mut state.zones, &mut state.inventory);
        let result = state.narrator.complete(event, day, &mut sink);
        let effects = sink.events;
        match result {
            Ok(completion) => {
                state.pending.push(SimEvent::Story(StoryStep::Completed(completion.clone())));
                state.pending.extend(effects);
                self.settle();
                Ok(completion)
            }
            Err(err) => {
                warn!(event = %event, error = %err, "Story completion rejected");
                Err(err.into())
            }
        }
    }

    /// The dialogue for the active story event ended abnormally.
    ///
    /// # Errors
    ///
    /// [`SimError::Story`] if `event` is not the active event.
    pub fn abort_story(&mut self, event: &EventId) -> Result<(), SimError> {
        self.state.narrator.abort(event)?;
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Active configuration.
    pub const fn config(&self) -> &SimulationConfig {
        &self.state.config
    }

    /// The clock.
    pub const fn clock(&self) -> &Clock {
        &self.state.clock
    }

    /// Today's weather and tomorrow's forecast.
    pub const fn weather(&self) -> &WeatherRoller {
        &self.state.weather
    }

    /// Spawn points and their per-day state.
    pub const fn spawns(&self) -> &SpawnScheduler {
        &self.state.spawns
    }

    /// Zones and the player's position.
    pub const fn zones(&self) -> &ZoneMap {
        &self.state.zones
    }

    /// Inventory containers and gold.
    pub const fn inventory(&self) -> &Inventory {
        &self.state.inventory
    }

    /// Ability definitions.
    pub const fn catalog(&self) -> &AbilityCatalog {
        &self.state.catalog
    }

    /// The creature.
    pub const fn creature(&self) -> &Creature {
        &self.state.creature
    }

    /// The shop.
    pub const fn shop(&self) -> &Shop {
        &self.state.shop
    }

    /// Story progress.
    pub const fn narrator(&self) -> &Narrator {
        &self.state.narrator
    }

    /// Festival schedule and the festival running today.
    pub const fn festivals(&self) -> &FestivalCalendar {
        &self.state.festivals
    }

    /// Milestones and which are unlocked.
    pub const fn achievements(&self) -> &Achievements {
        &self.state.achievements
    }

    /// Real seconds simulated while unpaused.
    pub const fn playtime_seconds(&self) -> f64 {
        self.state.playtime_seconds
    }

    /// Creature tuning.
    pub const fn creature_config(&self) -> &CreatureConfig {
        &self.state.config.creature
    }

    /// Check milestones after a player operation; events wait for the
    /// next tick like the operation's own.
    fn settle(&mut self) {
        let mut events = std::mem::take(&mut self.state.pending);
        self.state.check_achievements(&mut events);
        self.state.pending = events;
    }
}

/// Fridge item of a cooked dish, if one is stocked.
fn stocked_dish(inventory: &Inventory, dish: &Dish) -> Result<ItemId, SimError> {
    let item = dish.item();
    let available = inventory
        .container(ContainerKind::Fridge)
        .quantity(&item, dish.quality);
    if available == 0 {
        return Err(WorldError::InsufficientItems {
            item,
            requested: 1,
            available,
        }
        .into());
    }
    Ok(item)
}

/// Festival step of a day rollover: end or start festivals, grant the
/// recipes of one that starts, and hand the shop today's bonuses.
fn roll_festivals(
    festivals: &mut FestivalCalendar,
    shop: &mut Shop,
    season: Season,
    day_of_season: u32,
    events: &mut Vec<SimEvent>,
) {
    for event in festivals.on_new_day(season, day_of_season) {
        let granted = match &event {
            FestivalEvent::Started { recipes, .. } => recipes.clone(),
            FestivalEvent::Ended { .. } => Vec::new(),
        };
        events.push(SimEvent::Festival(event));
        for recipe in granted {
            match shop.unlock_recipe(&recipe) {
                Ok(true) => events.push(SimEvent::Shop(ShopEvent::RecipeUnlocked { recipe })),
                Ok(false) => {}
                Err(err) => warn!(recipe = %recipe, error = %err, "Festival recipe unlock failed"),
            }
        }
    }
    shop.set_festival_bonuses(festivals.bonuses());
}

impl SimState {
    pub(crate) fn day_context(&self) -> DayContext {
        DayContext {
            day: self.clock.day(),
            season: self.clock.season(),
            weather: self.weather.today(),
        }
    }

    /// Steps 1 through 6 of a tick.
    fn step(&mut self, dt: f64, events: &mut Vec<SimEvent>) -> Result<(), SimError> {
        // 1. Clock
        let clock_events = self.clock.advance(dt)?;

        // 2. Boundaries
        for event in clock_events {
            self.react(event, events);
        }

        // 3. Continuous abilities
        if let Some(event) = self.creature.drain_active(dt, &self.catalog) {
            events.push(SimEvent::Creature(event));
        }

        // 4. Shop
        let update = self.shop.update(self.clock.hour(), dt, &mut self.rng);
        self.collect(update, events);

        // 5. Story
        self.poll_story(events);

        // 6. Achievements
        self.check_achievements(events);

        self.playtime_seconds += dt;
        Ok(())
    }

    /// Run the built-in reactions to one clock boundary.
    fn react(&mut self, event: ClockEvent, events: &mut Vec<SimEvent>) {
        events.push(SimEvent::Clock(event));
        match event {
            ClockEvent::NewDay { day, season } => self.start_day(day, season, events),
            ClockEvent::HourChimed { .. } => {
                self.creature.on_hour(&self.config.creature);
                self.shop.on_hour();
            }
            ClockEvent::NewSeason { .. } | ClockEvent::PeriodChanged { .. } => {}
        }
    }

    /// Day rollover: weather, spawns, spoilage, festivals, creature, shop.
    fn start_day(&mut self, day: u32, season: Season, events: &mut Vec<SimEvent>) {
        let tomorrow = self.clock.season_on(day.saturating_add(1));
        let weather = self.weather.on_new_day(day, season, tomorrow);
        events.push(SimEvent::WeatherRolled {
            day,
            weather,
            forecast: self.weather.forecast(),
        });

        let refresh = self.spawns.on_new_day(DayContext { day, season, weather });
        debug!(day, available = refresh.available, cooling_down = refresh.cooling_down, "Spawns refreshed");
        events.push(SimEvent::SpawnsRefreshed(refresh));

        let spoiled = self.inventory.advance_day();
        if !spoiled.is_empty() {
            events.push(SimEvent::ItemsSpoiled(spoiled));
        }

        let day_of_season = self.clock.day_of_season_on(day);
        roll_festivals(&mut self.festivals, &mut self.shop, season, day_of_season, events);

        let grown = self.creature.on_new_day(&self.config.creature, &self.catalog);
        events.extend(grown.into_iter().map(SimEvent::Creature));

        let update = self.shop.on_new_day(weather);
        self.collect(update, events);
    }

    fn collect(&mut self, update: ShopUpdate, events: &mut Vec<SimEvent>) {
        self.inventory.earn(update.gold_earned);
        for event in &update.events {
            if let ShopEvent::CustomerLeft(departure) = event
                && departure.revenue > 0
            {
                self.achievements.record_service();
            }
        }
        events.extend(update.events.into_iter().map(SimEvent::Shop));
    }

    fn progress(&self) -> Progress {
        Progress {
            stage: self.creature.stage(),
            bond: self.creature.bond(),
            reputation: self.shop.reputation(),
            festivals_held: self.festivals.total_held(),
            chapter: self.narrator.chapter(),
        }
    }

    /// Unlock milestones the world now meets and pay their rewards.
    pub(crate) fn check_achievements(&mut self, events: &mut Vec<SimEvent>) {
        let progress = self.progress();
        for def in self.achievements.check(&progress) {
            self.inventory.earn(def.reward_gold);
            events.push(SimEvent::AchievementUnlocked {
                achievement: def.id,
                name: def.name,
                reward_gold: def.reward_gold,
            });
        }
    }

    fn poll_story(&mut self, events: &mut Vec<SimEvent>) {
        let location = self.zones.current().clone();
        let view = WorldView {
            hour: self.clock.hour(),
            day: self.clock.day(),
            reputation: self.shop.reputation(),
            stage: self.creature.stage(),
            location: &location,
            weather: self.weather.today(),
        };
        let mut sink = WorldSink::new(&mut self.shop, &mut self.zones, &mut self.inventory);
        let result = self.narrator.poll(&view, &mut sink);
        let effects = sink.events;
        match result {
            Ok(Some(step)) => {
                events.push(SimEvent::Story(step));
                events.extend(effects);
            }
            Ok(None) => {}
            Err(err) => {
                warn!(error = %err, "Story event rejected");
                events.push(SimEvent::StoryRejected(err));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Outcome sink
// ---------------------------------------------------------------------------

/// Applies story outcomes through the owning subsystems' own APIs.
struct WorldSink<'a> {
    shop: &'a mut Shop,
    zones: &'a mut ZoneMap,
    inventory: &'a mut Inventory,
    events: Vec<SimEvent>,
}

impl<'a> WorldSink<'a> {
    const fn new(shop: &'a mut Shop, zones: &'a mut ZoneMap, inventory: &'a mut Inventory) -> Self {
        Self {
            shop,
            zones,
            inventory,
            events: Vec::new(),
        }
    }
}

impl OutcomeSink for WorldSink<'_> {
    fn check(&self, outcome: &Outcome) -> Result<(), String> {
        match outcome {
            Outcome::UnlockRecipe { recipe } if self.shop.book().get(recipe).is_none() => {
                Err(format!("unknown recipe {recipe}"))
            }
            Outcome::UnlockZone { zone } if !self.zones.contains(zone) => Err(format!("unknown zone {zone}")),
            _ => Ok(()),
        }
    }

    fn apply(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Reputation { delta } => {
                let changes = self.shop.adjust_reputation(*delta);
                self.events.extend(changes.into_iter().map(SimEvent::Shop));
            }
            Outcome::UnlockRecipe { recipe } => match self.shop.unlock_recipe(recipe) {
                Ok(true) => self.events.push(SimEvent::Shop(ShopEvent::RecipeUnlocked {
                    recipe: recipe.clone(),
                })),
                Ok(false) => {}
                Err(err) => warn!(recipe = %recipe, error = %err, "Recipe unlock failed after check"),
            },
            Outcome::UnlockZone { zone } => {
                if let Err(err) = self.zones.unlock(zone) {
                    warn!(zone = %zone, error = %err, "Zone unlock failed after check");
                }
            }
            Outcome::Gold { amount } => self.inventory.earn(*amount),
            _ => {}
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
mod tests {
    use std::cell::RefCell;
    use std::collections::BTreeSet;
    use std::rc::Rc;

    use haven_creature::CreatureEvent;
    use haven_types::{LifeStage, ShopState};
    use haven_world::{Unavailability, WorldError};

    use super::*;
    use crate::error::ErrorKind;

    /// One real second per game hour keeps the long tests short.
    fn fast_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.time.real_seconds_per_game_hour = 1.0;
        config
    }

    /// Default pacing with the shop never closed by weather.
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

    fn sim() -> Simulation {
        sim_with(fast_config())
    }

    /// Tick in maximum-size steps for `seconds` of real time.
    fn run(sim: &mut Simulation, seconds: f64) -> Vec<SimEvent> {
        let step = sim.config().time.max_tick_seconds;
        let steps = (seconds / step).round() as u64;
        let mut events = Vec::new();
        for _ in 0..steps {
            events.extend(sim.tick(step).unwrap().events);
        }
        events
    }

    /// Run until the clock reaches `hour` of the current day.
    fn run_until_hour(sim: &mut Simulation, hour: f64) -> Vec<SimEvent> {
        let mut events = Vec::new();
        let day = sim.clock().day();
        while sim.clock().day() == day && sim.clock().hour() < hour {
            events.extend(sim.tick(0.1).unwrap().events);
        }
        events
    }

    struct Recorder {
        seen: Rc<RefCell<Vec<SimEvent>>>,
    }

    impl SimulationListener for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn on_event(&mut self, event: &SimEvent) -> Result<(), String> {
            self.seen.borrow_mut().push(event.clone());
            Ok(())
        }
    }

    struct Broken;

    impl SimulationListener for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn on_event(&mut self, _event: &SimEvent) -> Result<(), String> {
            Err("always fails".to_owned())
        }
    }

    #[test]
    fn negative_or_nan_delta_is_rejected_without_change() {
        let mut sim = sim();
        let hour = sim.clock().hour();
        let err = sim.tick(-1.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(sim.tick(f64::NAN).is_err());
        assert_eq!(sim.clock().hour(), hour);
    }

    #[test]
    fn large_deltas_are_clamped_before_scaling() {
        let mut sim = sim();
        let before = sim.clock().total_hours();
        sim.tick(5.0).unwrap();
        let advanced = sim.clock().total_hours() - before;
        // 0.1 real seconds at one game hour per real second.
        assert!((advanced - 0.1).abs() < 1e-9);
    }

    #[test]
    fn paused_simulation_does_not_advance() {
        let mut sim = sim();
        sim.pause();
        let hour = sim.clock().hour();
        run(&mut sim, 2.0);
        assert_eq!(sim.clock().hour(), hour);
        assert_eq!(sim.playtime_seconds(), 0.0);
        sim.resume();
        sim.tick(0.1).unwrap();
        assert!(sim.clock().hour() > hour);
    }

    #[test]
    fn day_rollover_reacts_in_fixed_order() {
        let mut sim = sim();
        let events = run(&mut sim, 17.0);
        assert_eq!(sim.clock().day(), 2);

        let position = |pred: &dyn Fn(&SimEvent) -> bool| events.iter().position(|e| pred(e)).unwrap();
        let new_day = position(&|e| matches!(e, SimEvent::Clock(ClockEvent::NewDay { day: 2, .. })));
        let weather = position(&|e| matches!(e, SimEvent::WeatherRolled { day: 2, .. }));
        let spawns = events
            .iter()
            .enumerate()
            .skip(new_day)
            .find(|(_, e)| matches!(e, SimEvent::SpawnsRefreshed(_)))
            .map(|(i, _)| i)
            .unwrap();
        let summary = position(&|e| matches!(e, SimEvent::Shop(ShopEvent::DayClosed(_))));
        assert!(new_day < weather);
        assert!(weather < spawns);
        assert!(spawns < summary);
        let new_days = events
            .iter()
            .filter(|e| matches!(e, SimEvent::Clock(ClockEvent::NewDay { .. })))
            .count();
        assert_eq!(new_days, 1);
    }

    #[test]
    fn creature_hatches_on_the_threshold_rollover() {
        let mut sim = sim();
        assert_eq!(sim.creature().stage(), LifeStage::Egg);
        sim.sleep().unwrap();
        assert_eq!(sim.creature().days_alive(), 1);
        assert_eq!(sim.creature().stage(), LifeStage::Egg);
        sim.sleep().unwrap();
        assert_eq!(sim.creature().stage(), LifeStage::Hatchling);
        let report = sim.tick(0.1).unwrap();
        assert!(report.events.iter().any(|e| matches!(
            e,
            SimEvent::Creature(CreatureEvent::StageEntered {
                stage: LifeStage::Hatchling,
                ..
            })
        )));
    }

    #[test]
    fn sleeping_across_midnight_fires_one_new_day() {
        let mut sim = sim();
        run_until_hour(&mut sim, 22.0);
        sim.sleep().unwrap();
        assert_eq!(sim.clock().day(), 2);
        assert_eq!(sim.clock().hour(), sim.config().time.wake_hour);
        let report = sim.tick(0.0).unwrap();
        let new_days = report
            .events
            .iter()
            .filter(|e| matches!(e, SimEvent::Clock(ClockEvent::NewDay { .. })))
            .count();
        assert_eq!(new_days, 1);
        assert!(report.events.iter().any(|e| matches!(e, SimEvent::WeatherRolled { day: 2, .. })));
    }

    #[test]
    fn sleep_restores_stamina() {
        let mut sim = sim();
        sim.sleep().unwrap();
        sim.sleep().unwrap();
        sim.use_ability(&AbilityId::new("burrow_fetch")).unwrap();
        assert!(sim.creature().stamina() < 100.0);
        sim.sleep().unwrap();
        assert_eq!(sim.creature().stamina(), 100.0);
    }

    fn fridge_quantity(sim: &Simulation, item: &str, quality: Quality) -> u32 {
        sim.inventory()
            .container(ContainerKind::Fridge)
            .quantity(&ItemId::new(item), quality)
    }

    #[test]
    fn egg_cannot_be_fed_or_petted() {
        let mut sim = sim();
        let err = sim.pet().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        let juice = sim.cook(&RecipeId::new("berry_juice")).unwrap();
        let err = sim.feed(&juice).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(fridge_quantity(&sim, "berry_juice", juice.quality), 1);
    }

    #[test]
    fn feeding_uses_up_the_cooked_dish() {
        let mut sim = sim();
        sim.sleep().unwrap();
        sim.sleep().unwrap();
        let stew = sim.cook(&RecipeId::new("herb_stew")).unwrap();
        let outcome = sim.feed(&stew).unwrap();
        assert!(outcome.hunger_gained >= 0.0);
        assert_eq!(fridge_quantity(&sim, "herb_stew", stew.quality), 0);

        let err = sim.feed(&stew).unwrap_err();
        assert!(matches!(
            err,
            SimError::World {
                source: WorldError::InsufficientItems { .. }
            }
        ));
        let mystery = Dish {
            recipe: RecipeId::new("mystery"),
            quality: Quality::STANDARD,
        };
        let err = sim.feed(&mystery).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn cooking_draws_ingredients_into_the_fridge() {
        let mut sim = sim();
        let herbs = fridge_quantity(&sim, "garden_herb", Quality::STANDARD);
        let mint = fridge_quantity(&sim, "mint", Quality::STANDARD);

        let stew = sim.cook(&RecipeId::new("herb_stew")).unwrap();
        assert_eq!(stew.quality, Quality::STANDARD);
        assert_eq!(fridge_quantity(&sim, "garden_herb", Quality::STANDARD), herbs - 2);
        assert_eq!(fridge_quantity(&sim, "mint", Quality::STANDARD), mint - 1);
        assert_eq!(fridge_quantity(&sim, "herb_stew", stew.quality), 1);

        let report = sim.tick(0.0).unwrap();
        assert!(report.events.iter().any(|e| matches!(e, SimEvent::Cooked(d) if *d == stew)));
    }

    #[test]
    fn cooking_without_ingredients_changes_nothing() {
        let mut sim = sim();
        let berry_juice = RecipeId::new("berry_juice");
        while sim.cook(&berry_juice).is_ok() {}
        let before = sim.inventory().clone();

        let err = sim.cook(&berry_juice).unwrap_err();
        assert!(matches!(
            err,
            SimError::World {
                source: WorldError::InsufficientItems { .. }
            }
        ));
        assert_eq!(sim.inventory(), &before);
    }

    #[test]
    fn locked_recipe_cannot_be_cooked() {
        let mut sim = sim();
        let err = sim.cook(&RecipeId::new("phoenix_tart")).unwrap_err();
        assert!(matches!(
            err,
            SimError::Shop {
                source: ShopError::RecipeLocked(_)
            }
        ));
    }

    #[test]
    fn festival_dish_is_cooked_only_during_its_festival() {
        let mut sim = sim();
        let report = sim.tick(0.0).unwrap();
        assert!(report.events.iter().any(|e| matches!(
            e,
            SimEvent::Festival(FestivalEvent::Started { festival, .. }) if festival.as_str() == "dragon_hatching"
        )));

        let tea = RecipeId::new("blossom_tea");
        sim.cook(&tea).unwrap();
        sim.sleep().unwrap();
        sim.sleep().unwrap();
        assert!(sim.festivals().active().is_none());
        let err = sim.cook(&tea).unwrap_err();
        assert!(matches!(
            err,
            SimError::Shop {
                source: ShopError::OutOfSeason(_)
            }
        ));
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
    }

    #[test]
    fn gathered_herbs_spoil_but_the_fridge_keeps() {
        let mut sim = sim();
        let pantry = fridge_quantity(&sim, "garden_herb", Quality::STANDARD);
        sim.gather(&SpawnPointId::new("cg_herb_1")).unwrap();
        let herb = ItemId::new("garden_herb");
        assert!(sim.inventory().container(ContainerKind::Carried).count(&herb) > 0);

        sim.sleep().unwrap();
        sim.sleep().unwrap();
        assert!(sim.inventory().container(ContainerKind::Carried).count(&herb) > 0);
        sim.sleep().unwrap();
        assert_eq!(sim.inventory().container(ContainerKind::Carried).count(&herb), 0);
        assert_eq!(fridge_quantity(&sim, "garden_herb", Quality::STANDARD), pantry);

        let report = sim.tick(0.0).unwrap();
        assert!(report.events.iter().any(|e| matches!(
            e,
            SimEvent::ItemsSpoiled(stacks)
                if stacks.iter().any(|s| s.item == herb && s.container == ContainerKind::Carried)
        )));
    }

    #[test]
    fn hatching_unlocks_a_paid_achievement_once() {
        let mut sim = sim();
        sim.sleep().unwrap();
        sim.sleep().unwrap();
        let first_steps = haven_types::AchievementId::new("dragon_first_steps");
        assert!(!sim.achievements().is_unlocked(&first_steps));

        let report = sim.tick(0.0).unwrap();
        let unlocked: Vec<_> = report
            .events
            .iter()
            .filter_map(|e| match e {
                SimEvent::AchievementUnlocked {
                    achievement,
                    reward_gold,
                    ..
                } => Some((achievement.clone(), *reward_gold)),
                _ => None,
            })
            .collect();
        assert!(unlocked.contains(&(first_steps.clone(), 25)));
        assert!(sim.achievements().is_unlocked(&first_steps));

        let again = sim.tick(0.0).unwrap();
        assert!(!again.events.iter().any(|e| matches!(
            e,
            SimEvent::AchievementUnlocked { achievement, .. } if *achievement == first_steps
        )));
    }

    #[test]
    fn upgrades_are_paid_for_in_gold() {
        let mut config = fast_config();
        config.inventory.starting_gold = 1000;
        let mut sim = sim_with(config);
        let slots = sim.inventory().container(ContainerKind::Fridge).capacity();

        let receipt = sim.purchase_upgrade(ContainerKind::Fridge).unwrap();
        assert_eq!(receipt.cost, 750);
        assert_eq!(receipt.capacity, slots + 10);
        assert_eq!(sim.inventory().gold(), 250);

        let err = sim.purchase_upgrade(ContainerKind::Fridge).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(sim.inventory().gold(), 250);
    }

    #[test]
    fn serving_needs_a_cooked_dish() {
        let mut sim = sim_with(sunny_config());
        let juice = Dish {
            recipe: RecipeId::new("berry_juice"),
            quality: Quality::STANDARD,
        };
        let err = sim.serve(CustomerId(1), &juice).unwrap_err();
        assert!(matches!(
            err,
            SimError::World {
                source: WorldError::InsufficientItems { .. }
            }
        ));
    }

    #[test]
    fn locked_ability_changes_nothing() {
        let mut sim = sim();
        sim.sleep().unwrap();
        sim.sleep().unwrap();
        let stamina = sim.creature().stamina();
        let err = sim.use_ability(&AbilityId::new("rock_smash")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        assert_eq!(sim.creature().stamina(), stamina);
    }

    #[test]
    fn gather_is_once_per_cycle() {
        let mut sim = sim();
        let point = SpawnPointId::new("cg_herb_1");
        let item = sim.gather(&point).unwrap();
        assert_eq!(item.point, point);
        let carried = sim.inventory().record().carried;

        let err = sim.gather(&point).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        assert!(matches!(
            sim.spawn_availability(&point).unwrap(),
            Availability::Unavailable(Unavailability::Cooldown { .. })
        ));
        assert_eq!(sim.inventory().record().carried, carried);

        sim.sleep().unwrap();
        // Commons respawn after one day and always spawn.
        assert!(sim.gather(&point).is_ok());
    }

    #[test]
    fn gathering_outside_the_current_zone_is_rejected() {
        let mut sim = sim();
        let err = sim.gather(&SpawnPointId::new("meadow_grain_1")).unwrap_err();
        assert!(matches!(
            err,
            SimError::World {
                source: WorldError::WrongZone { .. }
            }
        ));
    }

    #[test]
    fn zones_open_with_the_creature() {
        let mut sim = sim();
        let meadow = ZoneId::new("meadow");
        let err = sim.travel(&meadow).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        sim.sleep().unwrap();
        sim.sleep().unwrap();
        sim.travel(&meadow).unwrap();
        assert_eq!(sim.zones().current(), &meadow);
    }

    #[test]
    fn shop_enters_prep_then_service_on_time() {
        let mut sim = sim_with(sunny_config());
        let prep_start = sim.config().shop.morning.prep_start;
        let service_start = sim.config().shop.morning.service_start;
        run_until_hour(&mut sim, prep_start - 0.01);
        assert_eq!(sim.shop().state(ServicePeriod::Morning), ShopState::Closed);
        run_until_hour(&mut sim, prep_start + 0.01);
        assert_eq!(sim.shop().state(ServicePeriod::Morning), ShopState::Prep);
        run_until_hour(&mut sim, service_start + 0.01);
        assert_eq!(sim.shop().state(ServicePeriod::Morning), ShopState::Service);
    }

    #[test]
    fn every_customer_leaves_exactly_once() {
        let config = sunny_config();
        let mut sim = sim_with(config);
        let seen = Rc::new(RefCell::new(Vec::new()));
        sim.register_listener(Box::new(Recorder { seen: Rc::clone(&seen) }));

        let cleanup_end = sim.config().shop.morning.cleanup_end;
        run_until_hour(&mut sim, cleanup_end + 0.5);

        let events = seen.borrow();
        let mut arrived = BTreeSet::new();
        let mut left = Vec::new();
        for event in events.iter() {
            match event {
                SimEvent::Shop(ShopEvent::CustomerArrived { customer, .. }) => {
                    assert!(arrived.insert(*customer));
                }
                SimEvent::Shop(ShopEvent::CustomerLeft(departure)) => left.push(departure.customer),
                _ => {}
            }
        }
        assert!(!arrived.is_empty());
        let unique: BTreeSet<_> = left.iter().copied().collect();
        assert_eq!(unique.len(), left.len(), "a customer left twice");
        assert_eq!(unique, arrived);
        assert!(sim.shop().floor().is_empty());
    }

    #[test]
    fn failing_listener_does_not_stop_the_others() {
        let mut sim = sim();
        let seen = Rc::new(RefCell::new(Vec::new()));
        sim.register_listener(Box::new(Broken));
        sim.register_listener(Box::new(Recorder { seen: Rc::clone(&seen) }));

        let events = run(&mut sim, 17.0);
        assert_eq!(sim.clock().day(), 2);
        assert_eq!(seen.borrow().len(), events.len());

        let report = sim.tick(0.1).unwrap();
        assert_eq!(report.listener_failures.len(), report.events.len());
        assert!(report.listener_failures.iter().all(|f| f.listener == "broken"));
    }

    #[test]
    fn prologue_fires_and_waits_for_dialogue() {
        let mut sim = sim();
        let first = sim.tick(0.1).unwrap();
        assert!(first.events.iter().any(|e| matches!(
            e,
            SimEvent::Story(StoryStep::Completed(c)) if c.event == EventId::new("arrival")
        )));
        let second = sim.tick(0.1).unwrap();
        assert!(second.events.iter().any(|e| matches!(
            e,
            SimEvent::Story(StoryStep::Started { event, .. }) if *event == EventId::new("meet_melody")
        )));
        assert_eq!(sim.narrator().active(), Some(&EventId::new("meet_melody")));

        sim.complete_story(&EventId::new("meet_melody")).unwrap();
        assert!(sim.narrator().has_flag("met_melody"));
        assert_eq!(sim.narrator().affinity("melody"), 5);
    }

    #[test]
    fn aborted_story_event_fires_again() {
        let mut sim = sim();
        sim.tick(0.1).unwrap();
        sim.tick(0.1).unwrap();
        let event = EventId::new("meet_melody");
        sim.abort_story(&event).unwrap();
        assert!(!sim.narrator().is_completed(&event));
        assert!(!sim.narrator().has_flag("met_melody"));
        sim.tick(0.1).unwrap();
        assert_eq!(sim.narrator().active(), Some(&event));
    }

    #[test]
    fn story_gold_reaches_the_inventory() {
        let mut sim = sim();
        sim.tick(0.1).unwrap();
        sim.tick(0.1).unwrap();
        sim.complete_story(&EventId::new("meet_melody")).unwrap();
        sim.sleep().unwrap();
        sim.sleep().unwrap();
        // Hatching fires at the next poll.
        let mut fired = false;
        for _ in 0..5 {
            sim.tick(0.1).unwrap();
            if sim.narrator().active() == Some(&EventId::new("egg_hatches")) {
                fired = true;
                break;
            }
        }
        assert!(fired);
        let gold = sim.inventory().gold();
        sim.complete_story(&EventId::new("egg_hatches")).unwrap();
        assert_eq!(sim.inventory().gold(), gold + 50);
    }

    #[test]
    fn talk_cooldown_uses_game_time() {
        let mut sim = sim();
        let melody = StaffId::new("melody");
        sim.talk_to(&melody).unwrap();
        let err = sim.talk_to(&melody).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
        run(&mut sim, 2.5);
        assert!(sim.talk_to(&melody).is_ok());
    }

    #[test]
    fn skipping_service_is_buffered_for_the_next_tick() {
        let mut sim = sim_with(sunny_config());
        sim.skip_service(ServicePeriod::Morning).unwrap();
        let report = sim.tick(0.0).unwrap();
        assert!(report.events.iter().any(|e| matches!(
            e,
            SimEvent::Shop(ShopEvent::ServiceSkipped {
                period: ServicePeriod::Morning,
                ..
            })
        )));
        let err = sim.skip_service(ServicePeriod::Morning).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PreconditionFailed);
    }
}
