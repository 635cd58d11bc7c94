//! Customer arrival, patience, and satisfaction.
//!
//! Customers arrive on a fixed real-time interval while a period is in
//! SERVICE. Each arrival is seated if a seat is free, queued if the queue
//! has room, and turned away otherwise. Turned-away arrivals never become
//! customers; they only count in the period's stats.
//!
//! # Lifecycle
//!
//! ```text
//! WAITING --take_order--> ORDERED --serve--> EATING --(eating time)--> LEAVING
//!    |                       |
//!    +----(patience = 0)-----+------------------------------------> LEAVING (angry)
//! ```
//!
//! Patience only drains in WAITING and ORDERED. Every customer leaves
//! exactly once: the floor removes it and emits a single [`Departure`]
//! carrying its one reputation delta and tip. [`CustomerFloor::close_out`]
//! sends everyone home when a period closes, through the same two paths.

use std::collections::VecDeque;

use haven_types::{CustomerId, OrderCategory, Quality, RecipeId, ServicePeriod, SimRng};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ShopError;
use crate::reputation::TierBand;

/// Satisfaction range.
pub const SATISFACTION_MIN: f64 = 1.0;
/// Satisfaction range.
pub const SATISFACTION_MAX: f64 = 5.0;

const DELIGHTED_AT: f64 = 4.5;
const HAPPY_AT: f64 = 3.5;
const NEUTRAL_AT: f64 = 2.0;

const TIP_BASE: f64 = 0.10;
const TIP_PER_POINT: f64 = 0.05;
const TIP_MAX: f64 = 0.30;

const QUALITY_WEIGHT: f64 = 0.6;
const SPEED_WEIGHT: f64 = 0.3;
const STAFF_WEIGHT: f64 = 0.1;

/// Who the customer is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CustomerKind {
    /// An anonymous guest.
    Generic,
    /// A named regular with more patience.
    Named {
        /// Display name.
        name: String,
    },
}

/// Lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerState {
    /// Waiting to order (seated or queued).
    Waiting,
    /// Ordered, waiting for food.
    Ordered,
    /// Eating.
    Eating,
    /// Gone.
    Leaving,
}

/// How a departing customer felt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerMood {
    /// Satisfaction 4.5 or more.
    Delighted,
    /// Satisfaction 3.5 or more.
    Happy,
    /// Satisfaction 2 or more.
    Neutral,
    /// Satisfaction below 2, or never served.
    Angry,
}

impl CustomerMood {
    /// Mood for a satisfaction score.
    pub fn from_satisfaction(satisfaction: f64) -> Self {
        if satisfaction >= DELIGHTED_AT {
            Self::Delighted
        } else if satisfaction >= HAPPY_AT {
            Self::Happy
        } else if satisfaction >= NEUTRAL_AT {
            Self::Neutral
        } else {
            Self::Angry
        }
    }

    /// Reputation change this mood produces.
    pub const fn reputation_delta(self) -> i32 {
        match self {
            Self::Delighted => 5,
            Self::Happy => 3,
            Self::Neutral => 1,
            Self::Angry => -5,
        }
    }
}

/// What the customer asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Dish category wanted.
    pub category: OrderCategory,
    /// Quality the customer expects.
    pub expectation: Quality,
}

/// What the customer was given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServedDish {
    /// Recipe served.
    pub recipe: RecipeId,
    /// Quality after any server mistake.
    pub quality: Quality,
    /// Price charged.
    pub price: u64,
    /// Satisfaction scored at serve time.
    pub satisfaction: f64,
}

/// A customer in the shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    /// Sequential id.
    pub id: CustomerId,
    /// Generic or named.
    pub kind: CustomerKind,
    /// Period the customer arrived in.
    pub period: ServicePeriod,
    /// Lifecycle state.
    pub state: CustomerState,
    /// Whether the customer has a seat (otherwise queued).
    pub seated: bool,
    /// Patience at arrival, in real seconds.
    pub patience_total: f64,
    /// Patience left, in real seconds.
    pub patience_remaining: f64,
    /// Real seconds spent waiting (to order or for food).
    pub waited_seconds: f64,
    /// Order, once taken.
    #[serde(default)]
    pub order: Option<Order>,
    /// Dish, once served.
    #[serde(default)]
    pub served: Option<ServedDish>,
    /// Real seconds of eating left.
    #[serde(default)]
    pub eating_remaining: f64,
}

impl Customer {
    /// Fraction of patience left, for display.
    pub const fn patience_ratio(&self) -> f64 {
        if self.patience_total <= 0.0 {
            0.0
        } else {
            (self.patience_remaining / self.patience_total).clamp(0.0, 1.0)
        }
    }

    fn validate(&self) -> Result<(), String> {
        let finite = [
            self.patience_total,
            self.patience_remaining,
            self.waited_seconds,
            self.eating_remaining,
        ]
        .iter()
        .all(|v| v.is_finite() && *v >= 0.0);
        if !finite || self.patience_total <= 0.0 || self.patience_remaining > self.patience_total {
            return Err(format!("{} has invalid timers", self.id));
        }
        let consistent = match self.state {
            CustomerState::Waiting => self.order.is_none() && self.served.is_none(),
            CustomerState::Ordered => self.order.is_some() && self.served.is_none() && self.seated,
            CustomerState::Eating => self.order.is_some() && self.served.is_some() && self.seated,
            CustomerState::Leaving => false,
        };
        if consistent {
            Ok(())
        } else {
            Err(format!("{} is {:?} with inconsistent order data", self.id, self.state))
        }
    }
}

/// A dish on its way to a customer.
#[derive(Debug, Clone, PartialEq)]
pub struct Plate {
    /// Recipe cooked.
    pub recipe: RecipeId,
    /// Category of the recipe.
    pub category: OrderCategory,
    /// Quality after any server mistake.
    pub quality: Quality,
    /// Price charged.
    pub price: u64,
}

/// Where an arrival ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arrival {
    /// Took a free seat.
    Seated(CustomerId),
    /// Joined the queue.
    Queued(CustomerId),
    /// Seats and queue were full.
    TurnedAway,
}

/// A customer leaving the shop. Emitted exactly once per customer.
#[derive(Debug, Clone, PartialEq)]
pub struct Departure {
    /// Who left.
    pub customer: CustomerId,
    /// Generic or named.
    pub kind: CustomerKind,
    /// Period the customer arrived in.
    pub period: ServicePeriod,
    /// Mood on leaving.
    pub mood: CustomerMood,
    /// Final satisfaction.
    pub satisfaction: f64,
    /// Reputation change.
    pub reputation_delta: i32,
    /// Tip in gold (zero when angry).
    pub tip: u64,
    /// Dish revenue in gold (zero if never served).
    pub revenue: u64,
    /// Whether the customer gave up waiting.
    pub timed_out: bool,
}

/// Relative weights of each order category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryWeights {
    /// Drinks.
    pub beverage: f64,
    /// Small plates.
    pub appetizer: f64,
    /// Main courses.
    pub main: f64,
    /// Sweets.
    pub dessert: f64,
}

impl CategoryWeights {
    /// Weight of one category.
    pub const fn weight(&self, category: OrderCategory) -> f64 {
        match category {
            OrderCategory::Beverage => self.beverage,
            OrderCategory::Appetizer => self.appetizer,
            OrderCategory::Main => self.main,
            OrderCategory::Dessert => self.dessert,
        }
    }

    fn all_non_negative(&self) -> bool {
        OrderCategory::ALL
            .iter()
            .all(|c| self.weight(*c).is_finite() && self.weight(*c) >= 0.0)
    }
}

/// Relative weights of the three expectation levels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExpectationWeights {
    /// Easy to please (2 stars).
    pub low: f64,
    /// Average (3 stars).
    pub medium: f64,
    /// Demanding (4 stars).
    pub high: f64,
}

/// Customer tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerConfig {
    /// Real seconds between spawn rolls (default: 10).
    #[serde(default = "default_spawn_interval")]
    pub spawn_interval_seconds: f64,

    /// Seats in the shop (default: 6).
    #[serde(default = "default_seats")]
    pub seats: usize,

    /// Customers who can wait in line (default: 4).
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Mean patience in real seconds (default: 60).
    #[serde(default = "default_patience")]
    pub patience_seconds: f64,

    /// Patience spread either side of the mean (default: 15).
    #[serde(default = "default_patience_variance")]
    pub patience_variance_seconds: f64,

    /// Chance an arrival is a named regular (default: 0.1).
    #[serde(default = "default_named_chance")]
    pub named_chance: f64,

    /// Patience multiplier for named regulars (default: 1.5).
    #[serde(default = "default_named_patience")]
    pub named_patience_multiplier: f64,

    /// Names regulars are drawn from.
    #[serde(default = "default_regulars")]
    pub regulars: Vec<String>,

    /// Real seconds a served customer spends eating (default: 15).
    #[serde(default = "default_eating")]
    pub eating_seconds: f64,

    /// Expectation draw (default: low 0.3, medium 0.5, high 0.2).
    #[serde(default = "default_expectations")]
    pub expectations: ExpectationWeights,

    /// Base category weights (default: beverage 0.1, appetizer 0.2, main 0.5, dessert 0.2).
    #[serde(default = "default_categories")]
    pub categories: CategoryWeights,

    /// Morning multipliers on category weights.
    #[serde(default = "default_morning_preference")]
    pub morning_preference: CategoryWeights,

    /// Evening multipliers on category weights.
    #[serde(default = "default_evening_preference")]
    pub evening_preference: CategoryWeights,

    /// Morning multiplier on spawn chance (default: 0.6).
    #[serde(default = "default_morning_volume")]
    pub morning_volume: f64,

    /// Evening multiplier on spawn chance (default: 1.0).
    #[serde(default = "default_evening_volume")]
    pub evening_volume: f64,

    /// Quality points lost when the dish is the wrong category (default: 2).
    #[serde(default = "default_mismatch_penalty")]
    pub category_mismatch_penalty: f64,
}

impl CustomerConfig {
    /// Category preference multipliers for a period.
    pub const fn preference(&self, period: ServicePeriod) -> &CategoryWeights {
        match period {
            ServicePeriod::Morning => &self.morning_preference,
            ServicePeriod::Evening => &self.evening_preference,
        }
    }

    /// Spawn chance multiplier for a period.
    pub const fn volume(&self, period: ServicePeriod) -> f64 {
        match period {
            ServicePeriod::Morning => self.morning_volume,
            ServicePeriod::Evening => self.evening_volume,
        }
    }

    /// Check ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::InvalidConfig`] describing the first problem.
    pub fn validate(&self) -> Result<(), ShopError> {
        let invalid = |reason: &str| ShopError::InvalidConfig {
            reason: reason.to_owned(),
        };
        for (name, value) in [
            ("spawn_interval_seconds", self.spawn_interval_seconds),
            ("patience_seconds", self.patience_seconds),
            ("eating_seconds", self.eating_seconds),
            ("named_patience_multiplier", self.named_patience_multiplier),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(invalid(&format!("{name} must be positive")));
            }
        }
        if !(0.0..self.patience_seconds).contains(&self.patience_variance_seconds) {
            return Err(invalid("patience_variance_seconds must be within [0, patience_seconds)"));
        }
        if self.seats == 0 {
            return Err(invalid("the shop needs at least one seat"));
        }
        if !(0.0..=1.0).contains(&self.named_chance) {
            return Err(invalid("named_chance must be within [0, 1]"));
        }
        if self.named_chance > 0.0 && self.regulars.is_empty() {
            return Err(invalid("named customers need at least one regular name"));
        }
        let e = &self.expectations;
        if [e.low, e.medium, e.high].iter().any(|w| !w.is_finite() || *w < 0.0)
            || e.low + e.medium + e.high <= 0.0
        {
            return Err(invalid("expectation weights must be non-negative and not all zero"));
        }
        for weights in [&self.categories, &self.morning_preference, &self.evening_preference] {
            if !weights.all_non_negative() {
                return Err(invalid("category weights must be non-negative"));
            }
        }
        for volume in [self.morning_volume, self.evening_volume] {
            if !volume.is_finite() || volume < 0.0 {
                return Err(invalid("period volume must be non-negative"));
            }
        }
        if !self.category_mismatch_penalty.is_finite() || self.category_mismatch_penalty < 0.0 {
            return Err(invalid("category_mismatch_penalty must be non-negative"));
        }
        Ok(())
    }
}

impl Default for CustomerConfig {
    fn default() -> Self {
        Self {
            spawn_interval_seconds: default_spawn_interval(),
            seats: default_seats(),
            queue_capacity: default_queue_capacity(),
            patience_seconds: default_patience(),
            patience_variance_seconds: default_patience_variance(),
            named_chance: default_named_chance(),
            named_patience_multiplier: default_named_patience(),
            regulars: default_regulars(),
            eating_seconds: default_eating(),
            expectations: default_expectations(),
            categories: default_categories(),
            morning_preference: default_morning_preference(),
            evening_preference: default_evening_preference(),
            morning_volume: default_morning_volume(),
            evening_volume: default_evening_volume(),
            category_mismatch_penalty: default_mismatch_penalty(),
        }
    }
}

const fn default_spawn_interval() -> f64 {
    10.0
}

const fn default_seats() -> usize {
    6
}

const fn default_queue_capacity() -> usize {
    4
}

const fn default_patience() -> f64 {
    60.0
}

const fn default_patience_variance() -> f64 {
    15.0
}

const fn default_named_chance() -> f64 {
    0.1
}

const fn default_named_patience() -> f64 {
    1.5
}

fn default_regulars() -> Vec<String> {
    ["Old Maple", "Wren", "Captain Hollis", "Juniper"]
        .into_iter()
        .map(str::to_owned)
        .collect()
}

const fn default_eating() -> f64 {
    15.0
}

const fn default_expectations() -> ExpectationWeights {
    ExpectationWeights {
        low: 0.3,
        medium: 0.5,
        high: 0.2,
    }
}

const fn default_categories() -> CategoryWeights {
    CategoryWeights {
        beverage: 0.1,
        appetizer: 0.2,
        main: 0.5,
        dessert: 0.2,
    }
}

const fn default_morning_preference() -> CategoryWeights {
    CategoryWeights {
        beverage: 1.5,
        appetizer: 1.3,
        main: 0.8,
        dessert: 0.9,
    }
}

const fn default_evening_preference() -> CategoryWeights {
    CategoryWeights {
        beverage: 0.8,
        appetizer: 1.0,
        main: 1.4,
        dessert: 1.3,
    }
}

const fn default_morning_volume() -> f64 {
    0.6
}

const fn default_evening_volume() -> f64 {
    1.0
}

const fn default_mismatch_penalty() -> f64 {
    2.0
}

/// Satisfaction from dish quality, wait, and staff efficiency, in `[1, 5]`.
pub fn satisfaction(
    quality: Quality,
    expectation: Quality,
    mismatch_penalty: f64,
    wait_ratio: f64,
    staff_efficiency: f64,
) -> f64 {
    let diff = f64::from(quality.stars()) - f64::from(expectation.stars());
    let quality_score = (3.0 + diff - mismatch_penalty).clamp(SATISFACTION_MIN, SATISFACTION_MAX);
    let speed_score = if wait_ratio < 0.3 {
        5.0
    } else if wait_ratio < 0.6 {
        4.0
    } else if wait_ratio < 0.8 {
        3.0
    } else {
        2.0
    };
    let staff_score = 3.0 + (staff_efficiency - 1.0) * 2.0;
    (QUALITY_WEIGHT * quality_score + SPEED_WEIGHT * speed_score + STAFF_WEIGHT * staff_score)
        .clamp(SATISFACTION_MIN, SATISFACTION_MAX)
}

/// Tip for a served dish. Angry customers never tip.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn tip(price: u64, satisfaction: f64, bonus: f64) -> u64 {
    if CustomerMood::from_satisfaction(satisfaction) == CustomerMood::Angry {
        return 0;
    }
    let percent = (TIP_BASE + (satisfaction - 3.0) * TIP_PER_POINT).clamp(0.0, TIP_MAX);
    (price as f64 * percent * (1.0 + bonus.max(0.0))).round() as u64
}

/// Persisted floor state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloorRecord {
    /// Seated customers first (in seating order), then the queue.
    #[serde(default)]
    pub customers: Vec<Customer>,
    /// Next customer id to hand out.
    #[serde(default)]
    pub next_customer_id: u64,
    /// Real seconds accumulated toward the next spawn roll.
    #[serde(default)]
    pub spawn_timer: f64,
}

/// Everyone in the shop: seated customers and the queue.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CustomerFloor {
    seated: Vec<Customer>,
    queue: VecDeque<Customer>,
    next_id: u64,
    spawn_timer: f64,
}

impl CustomerFloor {
    /// An empty shop.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from a record.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::CorruptRecord`] if customers are inconsistent,
    /// ids repeat or run ahead of the counter, or capacity is exceeded.
    pub fn restore(record: FloorRecord, config: &CustomerConfig) -> Result<Self, ShopError> {
        let corrupt = |reason: String| ShopError::CorruptRecord { reason };
        let mut seen = std::collections::BTreeSet::new();
        let mut seated = Vec::new();
        let mut queue = VecDeque::new();
        for customer in record.customers {
            customer.validate().map_err(corrupt)?;
            if customer.id.0 >= record.next_customer_id || !seen.insert(customer.id) {
                return Err(corrupt(format!("{} has an invalid id", customer.id)));
            }
            if customer.seated {
                seated.push(customer);
            } else {
                queue.push_back(customer);
            }
        }
        if seated.len() > config.seats || queue.len() > config.queue_capacity {
            return Err(corrupt("more customers than seats and queue allow".to_owned()));
        }
        if !record.spawn_timer.is_finite() || record.spawn_timer < 0.0 {
            return Err(corrupt("spawn timer is invalid".to_owned()));
        }
        Ok(Self {
            seated,
            queue,
            next_id: record.next_customer_id,
            spawn_timer: record.spawn_timer,
        })
    }

    /// Persisted form.
    pub fn record(&self) -> FloorRecord {
        FloorRecord {
            customers: self.customers().cloned().collect(),
            next_customer_id: self.next_id,
            spawn_timer: self.spawn_timer,
        }
    }

    /// Every customer: seated first, then the queue.
    pub fn customers(&self) -> impl Iterator<Item = &Customer> {
        self.seated.iter().chain(self.queue.iter())
    }

    /// Look up a customer.
    pub fn get(&self, id: CustomerId) -> Option<&Customer> {
        self.customers().find(|c| c.id == id)
    }

    /// Number of customers in the shop.
    pub fn len(&self) -> usize {
        self.seated.len().saturating_add(self.queue.len())
    }

    /// Whether the shop is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Next id the floor will hand out.
    pub const fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Restart the spawn interval (at SERVICE entry).
    pub fn reset_spawn_timer(&mut self) {
        self.spawn_timer = 0.0;
    }

    /// Run spawn rolls for `real_seconds` of service.
    ///
    /// One roll happens per elapsed interval. A successful roll brings a
    /// number of arrivals drawn from the tier's band.
    pub fn roll_arrivals(
        &mut self,
        real_seconds: f64,
        band: &TierBand,
        period: ServicePeriod,
        rng: &mut SimRng,
        config: &CustomerConfig,
    ) -> Vec<Arrival> {
        self.spawn_timer += real_seconds.max(0.0);
        let mut arrivals = Vec::new();
        while self.spawn_timer >= config.spawn_interval_seconds {
            self.spawn_timer -= config.spawn_interval_seconds;
            if !rng.chance(band.spawn_chance * config.volume(period)) {
                continue;
            }
            let count = rng.random_range(band.min_customers..=band.max_customers);
            for _ in 0..count {
                arrivals.push(self.arrive(period, rng, config));
            }
        }
        arrivals
    }

    /// Multiply a just-arrived customer's patience by `factor`.
    ///
    /// Only customers still waiting with full patience are stretched.
    pub fn scale_patience(&mut self, id: CustomerId, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        if let Some(customer) = self
            .seated
            .iter_mut()
            .chain(self.queue.iter_mut())
            .find(|c| c.id == id && c.state == CustomerState::Waiting)
            && customer.waited_seconds <= 0.0
        {
            customer.patience_total *= factor;
            customer.patience_remaining = customer.patience_total;
        }
    }

    /// One arrival: seat, queue, or turn away.
    pub fn arrive(&mut self, period: ServicePeriod, rng: &mut SimRng, config: &CustomerConfig) -> Arrival {
        let has_seat = self.seated.len() < config.seats;
        if !has_seat && self.queue.len() >= config.queue_capacity {
            debug!(period = ?period, "Arrival turned away");
            return Arrival::TurnedAway;
        }

        let kind = if !config.regulars.is_empty() && rng.chance(config.named_chance) {
            let pick = rng.random_range(0..config.regulars.len());
            config.regulars.get(pick).map_or(CustomerKind::Generic, |name| CustomerKind::Named {
                name: name.clone(),
            })
        } else {
            CustomerKind::Generic
        };
        let spread = rng.random_range(-1.0..=1.0) * config.patience_variance_seconds;
        let mut patience = config.patience_seconds + spread;
        if matches!(kind, CustomerKind::Named { .. }) {
            patience *= config.named_patience_multiplier;
        }

        let id = CustomerId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        let customer = Customer {
            id,
            kind,
            period,
            state: CustomerState::Waiting,
            seated: has_seat,
            patience_total: patience,
            patience_remaining: patience,
            waited_seconds: 0.0,
            order: None,
            served: None,
            eating_remaining: 0.0,
        };
        debug!(customer = %id, seated = has_seat, patience, "Customer arrived");
        if has_seat {
            self.seated.push(customer);
            Arrival::Seated(id)
        } else {
            self.queue.push_back(customer);
            Arrival::Queued(id)
        }
    }

    /// The seated customer who has waited longest to order.
    pub fn longest_waiting(&self) -> Option<CustomerId> {
        self.seated
            .iter()
            .filter(|c| c.state == CustomerState::Waiting)
            .max_by(|a, b| a.waited_seconds.total_cmp(&b.waited_seconds))
            .map(|c| c.id)
    }

    /// Take a seated customer's order, revealing category and expectation.
    ///
    /// # Errors
    ///
    /// [`ShopError::UnknownCustomer`], [`ShopError::NotSeated`],
    /// [`ShopError::WrongCustomerState`] unless WAITING.
    pub fn take_order(
        &mut self,
        id: CustomerId,
        rng: &mut SimRng,
        config: &CustomerConfig,
    ) -> Result<Order, ShopError> {
        if self.queue.iter().any(|c| c.id == id) {
            return Err(ShopError::NotSeated(id));
        }
        let customer = self
            .seated
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(ShopError::UnknownCustomer(id))?;
        if customer.state != CustomerState::Waiting {
            return Err(ShopError::WrongCustomerState {
                customer: id,
                state: customer.state,
                expected: CustomerState::Waiting,
            });
        }
        let order = Order {
            category: draw_category(customer.period, rng, config),
            expectation: draw_expectation(rng, config),
        };
        customer.order = Some(order);
        customer.state = CustomerState::Ordered;
        debug!(customer = %id, category = ?order.category, "Order taken");
        Ok(order)
    }

    /// Serve an ordered customer.
    ///
    /// A plate whose category differs from the order costs quality points.
    /// Returns the satisfaction scored.
    ///
    /// # Errors
    ///
    /// [`ShopError::UnknownCustomer`], [`ShopError::NotSeated`],
    /// [`ShopError::WrongCustomerState`] unless ORDERED.
    pub fn serve(
        &mut self,
        id: CustomerId,
        plate: Plate,
        staff_efficiency: f64,
        config: &CustomerConfig,
    ) -> Result<f64, ShopError> {
        if self.queue.iter().any(|c| c.id == id) {
            return Err(ShopError::NotSeated(id));
        }
        let customer = self
            .seated
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(ShopError::UnknownCustomer(id))?;
        let order = match (customer.state, customer.order) {
            (CustomerState::Ordered, Some(order)) => order,
            (state, _) => {
                return Err(ShopError::WrongCustomerState {
                    customer: id,
                    state,
                    expected: CustomerState::Ordered,
                });
            }
        };
        let mismatch = if order.category == plate.category {
            0.0
        } else {
            config.category_mismatch_penalty
        };
        let wait_ratio = customer.waited_seconds / customer.patience_total;
        let score = satisfaction(plate.quality, order.expectation, mismatch, wait_ratio, staff_efficiency);
        customer.served = Some(ServedDish {
            recipe: plate.recipe,
            quality: plate.quality,
            price: plate.price,
            satisfaction: score,
        });
        customer.state = CustomerState::Eating;
        customer.eating_remaining = config.eating_seconds;
        debug!(customer = %id, satisfaction = score, "Customer served");
        Ok(score)
    }

    /// Advance timers by `real_seconds`.
    ///
    /// Waiting and ordered customers lose patience and leave angry at zero;
    /// eating customers leave scored when done. Freed seats go to the
    /// front of the queue.
    pub fn tick(&mut self, real_seconds: f64, tip_bonus: f64, config: &CustomerConfig) -> Vec<Departure> {
        let dt = real_seconds.max(0.0);
        let mut departures = Vec::new();

        for customer in self.seated.iter_mut().chain(self.queue.iter_mut()) {
            match customer.state {
                CustomerState::Waiting | CustomerState::Ordered => {
                    customer.waited_seconds += dt;
                    customer.patience_remaining = (customer.patience_remaining - dt).max(0.0);
                    if customer.patience_remaining <= 0.0 {
                        customer.state = CustomerState::Leaving;
                        departures.push(timeout_departure(customer));
                    }
                }
                CustomerState::Eating => {
                    customer.eating_remaining = (customer.eating_remaining - dt).max(0.0);
                    if customer.eating_remaining <= 0.0 {
                        customer.state = CustomerState::Leaving;
                        departures.push(scored_departure(customer, tip_bonus));
                    }
                }
                CustomerState::Leaving => {}
            }
        }

        self.remove_departed(config.seats);
        departures
    }

    /// Send home every customer who arrived in `period`.
    ///
    /// Unserved customers take the angry timeout path; eating customers are
    /// scored as if they had finished.
    pub fn close_out(
        &mut self,
        period: ServicePeriod,
        tip_bonus: f64,
        config: &CustomerConfig,
    ) -> Vec<Departure> {
        let mut departures = Vec::new();
        for customer in self.seated.iter_mut().chain(self.queue.iter_mut()) {
            if customer.period != period || customer.state == CustomerState::Leaving {
                continue;
            }
            let departure = if customer.state == CustomerState::Eating {
                scored_departure(customer, tip_bonus)
            } else {
                timeout_departure(customer)
            };
            customer.state = CustomerState::Leaving;
            departures.push(departure);
        }
        self.remove_departed(config.seats);
        departures
    }

    fn remove_departed(&mut self, seats: usize) {
        self.seated.retain(|c| c.state != CustomerState::Leaving);
        self.queue.retain(|c| c.state != CustomerState::Leaving);
        while self.seated.len() < seats {
            let Some(mut next) = self.queue.pop_front() else {
                break;
            };
            next.seated = true;
            debug!(customer = %next.id, "Queued customer seated");
            self.seated.push(next);
        }
    }
}

fn timeout_departure(customer: &Customer) -> Departure {
    let mood = CustomerMood::Angry;
    debug!(customer = %customer.id, "Customer left without being served");
    Departure {
        customer: customer.id,
        kind: customer.kind.clone(),
        period: customer.period,
        mood,
        satisfaction: SATISFACTION_MIN,
        reputation_delta: mood.reputation_delta(),
        tip: 0,
        revenue: 0,
        timed_out: true,
    }
}

fn scored_departure(customer: &Customer, tip_bonus: f64) -> Departure {
    let (score, price) = customer
        .served
        .as_ref()
        .map_or((SATISFACTION_MIN, 0), |d| (d.satisfaction, d.price));
    let mood = CustomerMood::from_satisfaction(score);
    Departure {
        customer: customer.id,
        kind: customer.kind.clone(),
        period: customer.period,
        mood,
        satisfaction: score,
        reputation_delta: mood.reputation_delta(),
        tip: tip(price, score, tip_bonus),
        revenue: price,
        timed_out: false,
    }
}

fn draw_category(period: ServicePeriod, rng: &mut SimRng, config: &CustomerConfig) -> OrderCategory {
    let preference = config.preference(period);
    let weights: Vec<(OrderCategory, f64)> = OrderCategory::ALL
        .iter()
        .map(|c| (*c, config.categories.weight(*c) * preference.weight(*c)))
        .collect();
    let total: f64 = weights.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return OrderCategory::Main;
    }
    let mut roll = rng.random::<f64>() * total;
    for (category, weight) in &weights {
        if roll < *weight {
            return *category;
        }
        roll -= weight;
    }
    OrderCategory::Main
}

fn draw_expectation(rng: &mut SimRng, config: &CustomerConfig) -> Quality {
    let e = &config.expectations;
    let roll = rng.random::<f64>() * (e.low + e.medium + e.high);
    let stars = if roll < e.medium {
        3
    } else if roll < e.medium + e.low {
        2
    } else {
        4
    };
    Quality::new(stars).unwrap_or(Quality::STANDARD)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn fixed_patience() -> CustomerConfig {
        CustomerConfig {
            patience_variance_seconds: 0.0,
            named_chance: 0.0,
            ..CustomerConfig::default()
        }
    }

    fn plate(category: OrderCategory, stars: u8) -> Plate {
        Plate {
            recipe: RecipeId::new("herb_stew"),
            category,
            quality: Quality::new(stars).unwrap(),
            price: 60,
        }
    }

    fn seated_customer(floor: &mut CustomerFloor, rng: &mut SimRng, config: &CustomerConfig) -> CustomerId {
        match floor.arrive(ServicePeriod::Evening, rng, config) {
            Arrival::Seated(id) => id,
            other => {
                assert!(matches!(other, Arrival::Seated(_)), "expected a seat, got {other:?}");
                CustomerId(u64::MAX)
            }
        }
    }

    #[test]
    fn unserved_customer_leaves_angry_when_patience_runs_out() {
        let config = fixed_patience();
        let mut rng = SimRng::seed_from(4);
        let mut floor = CustomerFloor::new();
        let id = seated_customer(&mut floor, &mut rng, &config);

        assert!(floor.tick(59.5, 0.0, &config).is_empty());
        assert_eq!(floor.get(id).unwrap().state, CustomerState::Waiting);

        let departures = floor.tick(0.5, 0.0, &config);
        assert_eq!(departures.len(), 1);
        let left = &departures[0];
        assert_eq!(left.customer, id);
        assert_eq!(left.mood, CustomerMood::Angry);
        assert!(left.reputation_delta < 0);
        assert_eq!(left.tip, 0);
        assert!(left.timed_out);
        assert!(floor.is_empty());
    }

    #[test]
    fn stretched_patience_lasts_longer() {
        let config = fixed_patience();
        let mut rng = SimRng::seed_from(4);
        let mut floor = CustomerFloor::new();
        let id = seated_customer(&mut floor, &mut rng, &config);
        floor.scale_patience(id, 1.5);
        assert!((floor.get(id).unwrap().patience_total - 90.0).abs() < 1e-9);

        assert!(floor.tick(80.0, 0.0, &config).is_empty());
        // Once the wait has begun, patience is no longer stretched.
        floor.scale_patience(id, 2.0);
        assert!((floor.get(id).unwrap().patience_total - 90.0).abs() < 1e-9);
        assert_eq!(floor.tick(10.0, 0.0, &config).len(), 1);
    }

    #[test]
    fn ordered_customer_keeps_losing_patience() {
        let config = fixed_patience();
        let mut rng = SimRng::seed_from(5);
        let mut floor = CustomerFloor::new();
        let id = seated_customer(&mut floor, &mut rng, &config);
        floor.tick(30.0, 0.0, &config);
        floor.take_order(id, &mut rng, &config).unwrap();
        let departures = floor.tick(30.0, 0.0, &config);
        assert_eq!(departures.len(), 1);
        assert!(departures[0].timed_out);
    }

    #[test]
    fn served_customer_eats_then_leaves_with_tip() {
        let config = fixed_patience();
        let mut rng = SimRng::seed_from(6);
        let mut floor = CustomerFloor::new();
        let id = seated_customer(&mut floor, &mut rng, &config);
        let order = floor.take_order(id, &mut rng, &config).unwrap();
        let score = floor
            .serve(id, plate(order.category, 5), 1.0, &config)
            .unwrap();
        assert!(score >= 3.5);

        // Patience no longer drains while eating.
        assert!(floor.tick(14.0, 0.0, &config).is_empty());
        let customer = floor.get(id).unwrap();
        assert_eq!(customer.state, CustomerState::Eating);
        assert!((customer.patience_remaining - 60.0).abs() < 1e-9);

        let departures = floor.tick(1.0, 0.0, &config);
        assert_eq!(departures.len(), 1);
        assert!(departures[0].reputation_delta > 0);
        assert!(departures[0].tip > 0);
        assert_eq!(departures[0].revenue, 60);
    }

    #[test]
    fn operations_check_lifecycle_state() {
        let config = fixed_patience();
        let mut rng = SimRng::seed_from(7);
        let mut floor = CustomerFloor::new();
        let id = seated_customer(&mut floor, &mut rng, &config);
        assert!(matches!(
            floor.serve(id, plate(OrderCategory::Main, 3), 1.0, &config),
            Err(ShopError::WrongCustomerState { .. })
        ));
        floor.take_order(id, &mut rng, &config).unwrap();
        assert!(matches!(
            floor.take_order(id, &mut rng, &config),
            Err(ShopError::WrongCustomerState { .. })
        ));
        assert_eq!(
            floor.take_order(CustomerId(99), &mut rng, &config),
            Err(ShopError::UnknownCustomer(CustomerId(99)))
        );
    }

    #[test]
    fn overflow_queues_then_turns_away() {
        let config = CustomerConfig {
            seats: 1,
            queue_capacity: 1,
            ..fixed_patience()
        };
        let mut rng = SimRng::seed_from(8);
        let mut floor = CustomerFloor::new();
        assert!(matches!(floor.arrive(ServicePeriod::Morning, &mut rng, &config), Arrival::Seated(_)));
        let queued = floor.arrive(ServicePeriod::Morning, &mut rng, &config);
        assert!(matches!(queued, Arrival::Queued(_)));
        assert_eq!(floor.arrive(ServicePeriod::Morning, &mut rng, &config), Arrival::TurnedAway);
        assert_eq!(floor.len(), 2);
        assert_eq!(floor.next_id(), 2);

        if let Arrival::Queued(id) = queued {
            assert_eq!(floor.take_order(id, &mut rng, &config), Err(ShopError::NotSeated(id)));
        }
    }

    #[test]
    fn freed_seat_goes_to_the_queue() {
        let config = CustomerConfig {
            seats: 1,
            ..fixed_patience()
        };
        let mut rng = SimRng::seed_from(9);
        let mut floor = CustomerFloor::new();
        let first = seated_customer(&mut floor, &mut rng, &config);
        floor.tick(10.0, 0.0, &config);
        let second = floor.arrive(ServicePeriod::Evening, &mut rng, &config);
        assert!(matches!(second, Arrival::Queued(_)));
        floor.tick(50.0, 0.0, &config);
        assert!(floor.get(first).is_none());
        let Arrival::Queued(second) = second else {
            return;
        };
        assert!(floor.get(second).unwrap().seated);
    }

    #[test]
    fn close_out_scores_eaters_and_sends_waiters_away_angry() {
        let config = fixed_patience();
        let mut rng = SimRng::seed_from(10);
        let mut floor = CustomerFloor::new();
        let eater = seated_customer(&mut floor, &mut rng, &config);
        let waiter = seated_customer(&mut floor, &mut rng, &config);
        let order = floor.take_order(eater, &mut rng, &config).unwrap();
        floor.serve(eater, plate(order.category, 4), 1.0, &config).unwrap();

        let departures = floor.close_out(ServicePeriod::Evening, 0.0, &config);
        assert_eq!(departures.len(), 2);
        let by_id = |id| departures.iter().find(|d| d.customer == id).unwrap();
        assert!(!by_id(eater).timed_out);
        assert_eq!(by_id(eater).revenue, 60);
        assert!(by_id(waiter).timed_out);
        assert!(floor.is_empty());
    }

    #[test]
    fn close_out_leaves_other_period_alone() {
        let config = fixed_patience();
        let mut rng = SimRng::seed_from(11);
        let mut floor = CustomerFloor::new();
        seated_customer(&mut floor, &mut rng, &config);
        assert!(floor.close_out(ServicePeriod::Morning, 0.0, &config).is_empty());
        assert_eq!(floor.len(), 1);
    }

    #[test]
    fn every_customer_departs_exactly_once() {
        let config = CustomerConfig::default();
        let band = TierBand {
            min_reputation: 0,
            min_customers: 2,
            max_customers: 5,
            spawn_chance: 1.0,
        };
        let mut rng = SimRng::seed_from(2024);
        let mut floor = CustomerFloor::new();
        let mut arrived = BTreeSet::new();
        let mut departed = Vec::new();

        for step in 0..2_000 {
            for arrival in floor.roll_arrivals(0.1, &band, ServicePeriod::Evening, &mut rng, &config) {
                if let Arrival::Seated(id) | Arrival::Queued(id) = arrival {
                    assert!(arrived.insert(id));
                }
            }
            if step % 37 == 0 {
                if let Some(id) = floor.longest_waiting() {
                    let order = floor.take_order(id, &mut rng, &config).unwrap();
                    floor
                        .serve(id, plate(order.category, 3), 1.0, &config)
                        .unwrap();
                }
            }
            departed.extend(floor.tick(0.1, 0.0, &config));
        }
        departed.extend(floor.close_out(ServicePeriod::Evening, 0.0, &config));

        let ids: Vec<CustomerId> = departed.iter().map(|d| d.customer).collect();
        let unique: BTreeSet<CustomerId> = ids.iter().copied().collect();
        assert_eq!(ids.len(), unique.len());
        assert_eq!(unique, arrived);
        assert!(departed.iter().all(|d| d.reputation_delta != 0));
    }

    #[test]
    fn satisfaction_weights_quality_speed_and_staff() {
        let q3 = Quality::STANDARD;
        // 0.6 * 3 + 0.3 * 5 + 0.1 * 3
        assert!((satisfaction(q3, q3, 0.0, 0.1, 1.0) - 3.6).abs() < 1e-9);
        // Wrong category and slow: 0.6 * 1 + 0.3 * 2 + 0.1 * 3
        assert!((satisfaction(q3, q3, 2.0, 0.9, 1.0) - 1.5).abs() < 1e-9);
        let best = satisfaction(Quality::MAX, Quality::MIN, 0.0, 0.0, 1.2);
        assert!(best <= SATISFACTION_MAX);
    }

    #[test]
    fn tip_scales_with_satisfaction_and_caps() {
        assert_eq!(tip(100, 3.0, 0.0), 10);
        assert_eq!(tip(100, 5.0, 0.0), 20);
        assert_eq!(tip(100, 5.0, 0.25), 25);
        assert_eq!(tip(100, 1.5, 0.0), 0);
    }

    #[test]
    fn morning_orders_lean_toward_drinks() {
        let config = CustomerConfig::default();
        let mut rng = SimRng::seed_from(77);
        let mut morning_drinks = 0;
        let mut evening_drinks = 0;
        for _ in 0..2_000 {
            if draw_category(ServicePeriod::Morning, &mut rng, &config) == OrderCategory::Beverage {
                morning_drinks += 1;
            }
            if draw_category(ServicePeriod::Evening, &mut rng, &config) == OrderCategory::Beverage {
                evening_drinks += 1;
            }
        }
        assert!(morning_drinks > evening_drinks);
    }

    #[test]
    fn floor_record_round_trip() {
        let config = fixed_patience();
        let mut rng = SimRng::seed_from(12);
        let mut floor = CustomerFloor::new();
        let id = seated_customer(&mut floor, &mut rng, &config);
        floor.take_order(id, &mut rng, &config).unwrap();
        seated_customer(&mut floor, &mut rng, &config);
        let json = serde_json::to_string(&floor.record()).unwrap();
        let record: FloorRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(CustomerFloor::restore(record, &config).unwrap(), floor);
    }

    #[test]
    fn restore_rejects_id_ahead_of_counter() {
        let config = fixed_patience();
        let mut rng = SimRng::seed_from(13);
        let mut floor = CustomerFloor::new();
        seated_customer(&mut floor, &mut rng, &config);
        let mut record = floor.record();
        record.next_customer_id = 0;
        assert!(CustomerFloor::restore(record, &config).is_err());
    }
}
