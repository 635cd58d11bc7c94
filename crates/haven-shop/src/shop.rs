//! The shop: both service periods, staff, customers, menu, and reputation.
//!
//! [`Shop`] owns every piece of shop state and is the only thing that
//! mutates it. The simulation driver calls [`Shop::update`] every tick with
//! the hour of day and the real seconds elapsed, [`Shop::on_hour`] on every
//! in-game hour, and [`Shop::on_new_day`] at rollover. Player actions go
//! through the other `&mut self` methods, each of which either succeeds
//! completely or returns an error and changes nothing.
//!
//! # Order of operations per update
//!
//! 1. Walk each period's state machine to the current hour. SERVICE entry
//!    restarts the spawn timer; CLOSED entry sends that period's remaining
//!    customers home.
//! 2. Advance customer timers; apply departures.
//! 3. Roll arrivals for any period in SERVICE.
//! 4. Let servers take orders on their own.

use std::collections::BTreeSet;

use haven_types::{
    CustomerId, Quality, RecipeId, ServicePeriod, ShopState, SimRng, StaffId, Weather,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ShopConfig;
use crate::customer::{
    Arrival, Customer, CustomerFloor, CustomerMood, CustomerState, Departure, FloorRecord, Order, Plate,
};
use crate::error::ShopError;
use crate::festival::FestivalBonuses;
use crate::menu::{Dish, Menu, RecipeBook};
use crate::reputation::{REP_MAX, Reputation, ReputationTier};
use crate::service::{PeriodPhase, PeriodSession, PeriodStats};
use crate::staff::{Roster, StaffDef, StaffRecord, StaffRole, TalkOutcome};

/// Something that happened in the shop.
#[derive(Debug, Clone, PartialEq)]
pub enum ShopEvent {
    /// A period changed state.
    StateChanged {
        /// The period.
        period: ServicePeriod,
        /// State left.
        from: ShopState,
        /// State entered.
        to: ShopState,
    },
    /// A customer took a seat or joined the queue.
    CustomerArrived {
        /// The customer.
        customer: CustomerId,
        /// The period.
        period: ServicePeriod,
        /// Seated (otherwise queued).
        seated: bool,
    },
    /// An arrival found no room.
    CustomerTurnedAway {
        /// The period.
        period: ServicePeriod,
    },
    /// A server took an order without being asked.
    OrderTaken {
        /// The customer.
        customer: CustomerId,
        /// The order.
        order: Order,
        /// The server.
        staff: StaffId,
    },
    /// A customer left.
    CustomerLeft(Departure),
    /// Reputation moved into a different tier.
    TierChanged {
        /// Old tier.
        from: ReputationTier,
        /// New tier.
        to: ReputationTier,
    },
    /// A recipe became available.
    RecipeUnlocked {
        /// The recipe.
        recipe: RecipeId,
    },
    /// A period was skipped.
    ServiceSkipped {
        /// The period.
        period: ServicePeriod,
        /// Reputation actually lost.
        penalty: i32,
    },
    /// Bad weather keeps the shop shut today.
    ClosedForWeather {
        /// Today's weather.
        weather: Weather,
    },
    /// Both periods of a day are finished.
    DayClosed(DaySummary),
}

/// What one update produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShopUpdate {
    /// Events in the order they happened.
    pub events: Vec<ShopEvent>,
    /// Revenue and tips collected.
    pub gold_earned: u64,
}

impl ShopUpdate {
    fn merge(&mut self, other: Self) {
        self.events.extend(other.events);
        self.gold_earned = self.gold_earned.saturating_add(other.gold_earned);
    }
}

/// Both periods' counters and their total.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    /// Morning counters.
    pub morning: PeriodStats,
    /// Evening counters.
    pub evening: PeriodStats,
    /// Sum of both.
    pub total: PeriodStats,
    /// Reputation at the time of the summary.
    pub reputation: u32,
}

/// Result of serving a customer.
#[derive(Debug, Clone, PartialEq)]
pub struct ServeOutcome {
    /// Satisfaction scored.
    pub satisfaction: f64,
    /// Quality that reached the table.
    pub quality: Quality,
    /// Price charged when the customer leaves.
    pub price: u64,
    /// Server who botched the dish, if anyone did.
    pub mistake_by: Option<StaffId>,
}

/// Persisted shop state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopRecord {
    /// Reputation.
    pub reputation: u32,
    /// Dishes on the menu.
    #[serde(default)]
    pub menu: Vec<RecipeId>,
    /// Unlocked recipes. Empty in older saves.
    #[serde(default)]
    pub unlocked_recipes: BTreeSet<RecipeId>,
    /// Morning session.
    #[serde(default = "morning_session")]
    pub morning: PeriodSession,
    /// Evening session.
    #[serde(default = "evening_session")]
    pub evening: PeriodSession,
    /// Staff state.
    #[serde(default)]
    pub staff: Vec<StaffRecord>,
    /// Customers and spawn bookkeeping.
    #[serde(default)]
    pub floor: FloorRecord,
    /// Whether bad weather closed the shop today.
    #[serde(default)]
    pub closed_for_weather: bool,
}

fn morning_session() -> PeriodSession {
    PeriodSession::new(ServicePeriod::Morning)
}

fn evening_session() -> PeriodSession {
    PeriodSession::new(ServicePeriod::Evening)
}

/// The shop.
#[derive(Debug, Clone, PartialEq)]
pub struct Shop {
    config: ShopConfig,
    book: RecipeBook,
    staff_defs: Vec<StaffDef>,
    reputation: Reputation,
    menu: Menu,
    morning: PeriodSession,
    evening: PeriodSession,
    roster: Roster,
    floor: CustomerFloor,
    closed_for_weather: bool,
    festival: FestivalBonuses,
}

impl Shop {
    /// Open a new shop.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::InvalidConfig`] if the config fails validation
    /// or staff ids repeat.
    pub fn new(config: ShopConfig, book: RecipeBook, staff_defs: Vec<StaffDef>) -> Result<Self, ShopError> {
        config.validate()?;
        let mut ids = BTreeSet::new();
        if let Some(dup) = staff_defs.iter().find(|d| !ids.insert(d.id.clone())) {
            return Err(ShopError::InvalidConfig {
                reason: format!("duplicate staff id {}", dup.id),
            });
        }
        let reputation = Reputation::new(config.reputation.starting);
        let tier = config.reputation.tier_for(reputation.value());
        let menu = Menu::new(&book, tier, config.menu_capacity);
        let roster = Roster::new(&staff_defs, &config.staff);
        Ok(Self {
            config,
            book,
            staff_defs,
            reputation,
            menu,
            morning: PeriodSession::new(ServicePeriod::Morning),
            evening: PeriodSession::new(ServicePeriod::Evening),
            roster,
            floor: CustomerFloor::new(),
            closed_for_weather: false,
            festival: FestivalBonuses::NONE,
        })
    }

    /// Rebuild this shop's state from a record, leaving `self` untouched.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::CorruptRecord`] if any part is inconsistent.
    pub fn restored(&self, record: ShopRecord) -> Result<Self, ShopError> {
        let corrupt = |reason: &str| ShopError::CorruptRecord {
            reason: reason.to_owned(),
        };
        if record.reputation > REP_MAX {
            return Err(corrupt("reputation above maximum"));
        }
        if record.morning.period != ServicePeriod::Morning || record.evening.period != ServicePeriod::Evening {
            return Err(corrupt("period sessions are swapped"));
        }
        let reputation = Reputation::new(record.reputation);
        let tier = self.config.reputation.tier_for(reputation.value());
        let mut unlocked = record.unlocked_recipes;
        if unlocked.is_empty() {
            unlocked = self.book.unlocked_through(tier).map(|d| d.id.clone()).collect();
        }
        let menu = Menu::restore(&self.book, unlocked, record.menu, self.config.menu_capacity)?;
        let roster = Roster::restore(&self.staff_defs, &record.staff, &self.config.staff)?;
        let floor = CustomerFloor::restore(record.floor, &self.config.customers)?;
        Ok(Self {
            config: self.config.clone(),
            book: self.book.clone(),
            staff_defs: self.staff_defs.clone(),
            reputation,
            menu,
            morning: record.morning,
            evening: record.evening,
            roster,
            floor,
            closed_for_weather: record.closed_for_weather,
            festival: self.festival,
        })
    }

    /// Persisted form.
    pub fn record(&self) -> ShopRecord {
        ShopRecord {
            reputation: self.reputation.value(),
            menu: self.menu.dishes().to_vec(),
            unlocked_recipes: self.menu.unlocked().clone(),
            morning: self.morning.clone(),
            evening: self.evening.clone(),
            staff: self.roster.records(),
            floor: self.floor.record(),
            closed_for_weather: self.closed_for_weather,
        }
    }

    // -----------------------------------------------------------------------
    // Clock-driven updates
    // -----------------------------------------------------------------------

    /// Advance the shop to `hour` after `real_seconds` of play.
    pub fn update(&mut self, hour: f64, real_seconds: f64, rng: &mut SimRng) -> ShopUpdate {
        let mut update = ShopUpdate::default();

        // 1. State machines
        for period in ServicePeriod::ALL {
            let window = *self.config.window(period);
            let changes = self.session_mut(period).advance_to(hour, &window);
            for change in changes {
                update.merge(self.on_phase_entered(period, change.from, change.to));
            }
        }

        // 2. Timers
        let bonus = self.tip_bonus();
        let departures = self.floor.tick(real_seconds, bonus, &self.config.customers);
        for departure in departures {
            update.merge(self.settle(departure));
        }

        // 3. Arrivals
        for period in ServicePeriod::ALL {
            if self.session(period).phase != PeriodPhase::Service {
                continue;
            }
            let tier = self.tier();
            let band = *self.config.reputation.band(tier);
            let arrivals = self
                .floor
                .roll_arrivals(real_seconds, &band, period, rng, &self.config.customers);
            for arrival in arrivals {
                if let Arrival::Seated(id) | Arrival::Queued(id) = arrival {
                    self.floor.scale_patience(id, self.festival.patience_multiplier);
                }
                update.events.push(self.record_arrival(period, arrival));
            }
        }

        // 4. Servers
        if self.in_service() {
            self.servers_take_orders(real_seconds, rng, &mut update);
        }

        update
    }

    fn on_phase_entered(&mut self, period: ServicePeriod, from: PeriodPhase, to: PeriodPhase) -> ShopUpdate {
        let mut update = ShopUpdate::default();
        update.events.push(ShopEvent::StateChanged {
            period,
            from: from.state(),
            to: to.state(),
        });
        match to {
            PeriodPhase::Service => self.floor.reset_spawn_timer(),
            PeriodPhase::Cleanup => {
                for member in self.roster.members_mut() {
                    member.clear_progress();
                }
            }
            PeriodPhase::Done => {
                let bonus = self.tip_bonus();
                let departures = self.floor.close_out(period, bonus, &self.config.customers);
                for departure in departures {
                    update.merge(self.settle(departure));
                }
            }
            PeriodPhase::BeforeOpen | PeriodPhase::Prep => {}
        }
        update
    }

    fn record_arrival(&mut self, period: ServicePeriod, arrival: Arrival) -> ShopEvent {
        match arrival {
            Arrival::Seated(customer) => ShopEvent::CustomerArrived {
                customer,
                period,
                seated: true,
            },
            Arrival::Queued(customer) => ShopEvent::CustomerArrived {
                customer,
                period,
                seated: false,
            },
            Arrival::TurnedAway => {
                let stats = &mut self.session_mut(period).stats;
                stats.turned_away = stats.turned_away.saturating_add(1);
                ShopEvent::CustomerTurnedAway { period }
            }
        }
    }

    fn servers_take_orders(&mut self, real_seconds: f64, rng: &mut SimRng, update: &mut ShopUpdate) {
        let config = &self.config;
        for member in self.roster.members_mut() {
            if member.role() != StaffRole::Server {
                continue;
            }
            member.accrue_orders(real_seconds, &config.staff);
            let Some(customer) = self.floor.longest_waiting() else {
                continue;
            };
            if !member.take_ready_order() {
                continue;
            }
            match self.floor.take_order(customer, rng, &config.customers) {
                Ok(order) => update.events.push(ShopEvent::OrderTaken {
                    customer,
                    order,
                    staff: member.id().clone(),
                }),
                Err(err) => warn!(customer = %customer, error = %err, "Server could not take order"),
            }
        }
    }

    /// Apply one departure: stats, reputation, gold.
    fn settle(&mut self, departure: Departure) -> ShopUpdate {
        let mut update = ShopUpdate::default();
        let stats = &mut self.session_mut(departure.period).stats;
        stats.departures = stats.departures.saturating_add(1);
        stats.satisfaction_total += departure.satisfaction;
        if !departure.timed_out {
            stats.customers_served = stats.customers_served.saturating_add(1);
        }
        if departure.mood == CustomerMood::Angry {
            stats.customers_angry = stats.customers_angry.saturating_add(1);
        }
        stats.revenue = stats.revenue.saturating_add(departure.revenue);
        stats.tips = stats.tips.saturating_add(departure.tip);
        stats.reputation_delta = stats
            .reputation_delta
            .saturating_add(i64::from(departure.reputation_delta));

        update.gold_earned = departure.revenue.saturating_add(departure.tip);
        let events = self.change_reputation(departure.reputation_delta);
        update.events.push(ShopEvent::CustomerLeft(departure));
        update.events.extend(events);
        update
    }

    /// Apply reputation change, unlocking recipes on tier changes.
    ///
    /// Gains are scaled by the running festival; losses are not.
    fn change_reputation(&mut self, delta: i32) -> Vec<ShopEvent> {
        let delta = scaled_gain(delta, self.festival.reputation_multiplier);
        let before = self.tier();
        self.reputation.apply(delta);
        let after = self.tier();
        let mut events = Vec::new();
        if before != after {
            info!(from = ?before, to = ?after, reputation = self.reputation.value(), "Reputation tier changed");
            events.push(ShopEvent::TierChanged { from: before, to: after });
            for recipe in self.menu.unlock_tier(after, &self.book) {
                info!(recipe = %recipe, "Recipe unlocked by reputation");
                events.push(ShopEvent::RecipeUnlocked { recipe });
            }
        }
        events
    }

    /// One in-game hour passed: staff tire while serving.
    pub fn on_hour(&mut self) {
        if !self.in_service() {
            return;
        }
        for member in self.roster.members_mut() {
            member.decay(1.0, &self.config.staff);
        }
    }

    /// Day rollover: finish yesterday, then prepare today.
    ///
    /// Any period still open is walked to CLOSED (sending its customers
    /// home), a summary of yesterday is emitted, and both periods are reset.
    /// Weather that closes the shop keeps both periods CLOSED all day.
    pub fn on_new_day(&mut self, weather: Weather) -> ShopUpdate {
        let mut update = ShopUpdate::default();
        for period in ServicePeriod::ALL {
            let changes = self.session_mut(period).finish();
            for change in changes {
                update.merge(self.on_phase_entered(period, change.from, change.to));
            }
        }
        update.events.push(ShopEvent::DayClosed(self.day_summary()));

        self.morning.reset_for_day();
        self.evening.reset_for_day();
        self.closed_for_weather = weather.closes_shop();
        if self.closed_for_weather {
            self.morning.close_for_day();
            self.evening.close_for_day();
            info!(weather = ?weather, "Shop closed for the weather");
            update.events.push(ShopEvent::ClosedForWeather { weather });
        }
        update
    }

    // -----------------------------------------------------------------------
    // Player operations
    // -----------------------------------------------------------------------

    /// Skip a period: CLOSED for the rest of its window and a reputation
    /// penalty, applied exactly once.
    ///
    /// # Errors
    ///
    /// [`ShopError::ClosedForWeather`], [`ShopError::ServiceInProgress`],
    /// [`ShopError::AlreadySkipped`], [`ShopError::PeriodFinished`].
    pub fn skip_service(&mut self, period: ServicePeriod) -> Result<Vec<ShopEvent>, ShopError> {
        if self.closed_for_weather {
            return Err(ShopError::ClosedForWeather);
        }
        let change = self.session_mut(period).skip()?;
        let penalty = i32::try_from(self.config.skip_penalty).unwrap_or(i32::MAX);
        let before = self.reputation.value();
        let mut events = vec![ShopEvent::StateChanged {
            period,
            from: change.from.state(),
            to: change.to.state(),
        }];
        let tier_events = self.change_reputation(penalty.saturating_neg());
        let applied = i64::from(before).saturating_sub(i64::from(self.reputation.value()));
        events.push(ShopEvent::ServiceSkipped {
            period,
            penalty: i32::try_from(applied).unwrap_or(0),
        });
        events.extend(tier_events);
        Ok(events)
    }

    /// Take a seated customer's order.
    ///
    /// # Errors
    ///
    /// See [`CustomerFloor::take_order`].
    pub fn take_order(&mut self, customer: CustomerId, rng: &mut SimRng) -> Result<Order, ShopError> {
        self.floor.take_order(customer, rng, &self.config.customers)
    }

    /// Serve a dish from the menu to an ordered customer.
    ///
    /// The best available server may botch the dish, lowering its quality
    /// by one star. The price is settled when the customer leaves.
    ///
    /// # Errors
    ///
    /// [`ShopError::UnknownRecipe`], [`ShopError::NotOnMenu`], and the
    /// errors of [`CustomerFloor::serve`].
    pub fn serve(&mut self, customer: CustomerId, dish: &Dish, rng: &mut SimRng) -> Result<ServeOutcome, ShopError> {
        let recipe = &dish.recipe;
        let def = self.book.require(recipe)?;
        if !self.menu.offers(recipe) {
            return Err(ShopError::NotOnMenu(recipe.clone()));
        }
        // Validate the target before rolling, so a rejected call leaves the
        // random stream untouched.
        match self.floor.get(customer) {
            None => return Err(ShopError::UnknownCustomer(customer)),
            Some(c) if !c.seated => return Err(ShopError::NotSeated(customer)),
            Some(c) if c.state != CustomerState::Ordered => {
                return Err(ShopError::WrongCustomerState {
                    customer,
                    state: c.state,
                    expected: CustomerState::Ordered,
                });
            }
            Some(_) => {}
        }

        let staff_config = &self.config.staff;
        let mistake_by = self
            .roster
            .best_server(staff_config)
            .filter(|server| rng.chance(server.mistake_chance(staff_config)))
            .map(|server| server.id().clone());
        let quality = if mistake_by.is_some() {
            dish.quality.downgraded()
        } else {
            dish.quality
        };
        let price = def.price(quality);
        let plate = Plate {
            recipe: recipe.clone(),
            category: def.category,
            quality,
            price,
        };
        let efficiency = self.roster.average_efficiency(staff_config);
        let satisfaction = self
            .floor
            .serve(customer, plate, efficiency, &self.config.customers)?;
        if let Some(staff) = &mistake_by {
            debug!(staff = %staff, customer = %customer, "Server made a mistake");
        }
        Ok(ServeOutcome {
            satisfaction,
            quality,
            price,
            mistake_by,
        })
    }

    /// Give a staff member a pep talk at absolute game hour `now`.
    ///
    /// # Errors
    ///
    /// [`ShopError::UnknownStaff`], [`ShopError::TalkOnCooldown`].
    pub fn talk_to(&mut self, staff: &StaffId, now: f64) -> Result<TalkOutcome, ShopError> {
        let config = &self.config.staff;
        self.roster.require_mut(staff)?.talk_to(now, config)
    }

    /// Apply a reputation change from outside customer feedback.
    pub fn adjust_reputation(&mut self, delta: i32) -> Vec<ShopEvent> {
        self.change_reputation(delta)
    }

    /// Unlock a recipe. Returns `false` if it already was.
    ///
    /// # Errors
    ///
    /// [`ShopError::UnknownRecipe`].
    pub fn unlock_recipe(&mut self, recipe: &RecipeId) -> Result<bool, ShopError> {
        self.menu.unlock(recipe, &self.book)
    }

    /// Put an unlocked recipe on the menu.
    ///
    /// # Errors
    ///
    /// See [`Menu::add`].
    pub fn add_to_menu(&mut self, recipe: &RecipeId) -> Result<(), ShopError> {
        self.menu.add(recipe, &self.book)
    }

    /// Take a recipe off the menu.
    ///
    /// # Errors
    ///
    /// [`ShopError::NotOnMenu`].
    pub fn remove_from_menu(&mut self, recipe: &RecipeId) -> Result<(), ShopError> {
        self.menu.remove(recipe)
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Tuning.
    pub const fn config(&self) -> &ShopConfig {
        &self.config
    }

    /// Recipe book.
    pub const fn book(&self) -> &RecipeBook {
        &self.book
    }

    /// Menu and unlocked recipes.
    pub const fn menu(&self) -> &Menu {
        &self.menu
    }

    /// Current reputation.
    pub const fn reputation(&self) -> u32 {
        self.reputation.value()
    }

    /// Current reputation tier.
    pub fn tier(&self) -> ReputationTier {
        self.config.reputation.tier_for(self.reputation.value())
    }

    /// Session of one period.
    pub const fn session(&self, period: ServicePeriod) -> &PeriodSession {
        match period {
            ServicePeriod::Morning => &self.morning,
            ServicePeriod::Evening => &self.evening,
        }
    }

    fn session_mut(&mut self, period: ServicePeriod) -> &mut PeriodSession {
        match period {
            ServicePeriod::Morning => &mut self.morning,
            ServicePeriod::Evening => &mut self.evening,
        }
    }

    /// State of one period.
    pub const fn state(&self, period: ServicePeriod) -> ShopState {
        self.session(period).state()
    }

    /// Whether any period is serving right now.
    pub fn in_service(&self) -> bool {
        ServicePeriod::ALL
            .iter()
            .any(|p| self.session(*p).phase == PeriodPhase::Service)
    }

    /// Staff roster.
    pub const fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Customers in the shop.
    pub fn customers(&self) -> impl Iterator<Item = &Customer> {
        self.floor.customers()
    }

    /// Customer floor.
    pub const fn floor(&self) -> &CustomerFloor {
        &self.floor
    }

    /// Whether bad weather closed the shop today.
    pub const fn closed_for_weather(&self) -> bool {
        self.closed_for_weather
    }

    /// Both periods' counters and their total.
    pub fn day_summary(&self) -> DaySummary {
        DaySummary {
            morning: self.morning.stats,
            evening: self.evening.stats,
            total: self.morning.stats.combined(&self.evening.stats),
            reputation: self.reputation.value(),
        }
    }

    /// Bonuses of the running festival.
    pub const fn festival_bonuses(&self) -> &FestivalBonuses {
        &self.festival
    }

    /// Apply a festival's bonuses; [`FestivalBonuses::NONE`] when none runs.
    pub const fn set_festival_bonuses(&mut self, bonuses: FestivalBonuses) {
        self.festival = bonuses;
    }

    fn tip_bonus(&self) -> f64 {
        let tier_bonus = if self.tier() == ReputationTier::Legendary {
            self.config.reputation.legendary_tip_bonus
        } else {
            0.0
        };
        tier_bonus + self.festival.tip_bonus
    }
}

/// Scale a reputation gain by `multiplier`; losses pass through.
#[allow(clippy::cast_possible_truncation)]
fn scaled_gain(delta: i32, multiplier: f64) -> i32 {
    if delta <= 0 {
        return delta;
    }
    let scaled = (f64::from(delta) * multiplier).round();
    scaled.clamp(0.0, f64::from(i32::MAX)) as i32
}
