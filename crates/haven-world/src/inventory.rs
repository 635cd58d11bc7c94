//! Item containers and the gold purse.
//!
//! The player owns three containers -- what they carry, the storage chest,
//! and the fridge -- each limited by slot count. A slot holds one stack of
//! a single `(item, quality)` pair with unbounded quantity, so adding more
//! of something already held never needs a new slot.
//!
//! Perishable stacks carry a countdown of days. [`Inventory::advance_day`]
//! ages every stack outside the fridge and throws away the ones that reach
//! zero; the fridge freezes the countdown. Merging fresh units into an
//! older stack keeps the older countdown.
//!
//! Slot upgrades are bought with gold, a limited number of times per
//! container.
//!
//! All operations use checked arithmetic and decide success before mutating.

use haven_types::{ItemId, Quality};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::WorldError;

/// Which container an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainerKind {
    /// Items the player is carrying (gather target).
    Carried,
    /// The storage chest.
    Storage,
    /// The fridge (cooked dishes and perishables; nothing spoils here).
    Fridge,
}

impl ContainerKind {
    /// All containers, fridge first: the order ingredients are drawn in.
    pub const ALL: [Self; 3] = [Self::Fridge, Self::Storage, Self::Carried];
}

/// One slot: a quantity of a single item at a single quality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    /// The item.
    pub item: ItemId,
    /// Quality of every unit in the stack.
    pub quality: Quality,
    /// Units in the stack (always at least 1).
    pub quantity: u32,
    /// Days left before the stack spoils outside the fridge; `None` keeps forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub days_until_spoil: Option<u32>,
}

/// Price and size of one container's slot upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeDef {
    /// Gold per purchase.
    pub cost: u64,
    /// Slots added per purchase.
    pub slots: u32,
    /// How many times the upgrade can be bought.
    pub max_purchases: u32,
}

/// Slot upgrades for each container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeTable {
    /// Carried bag (default: 500 gold for 5 slots, 4 times).
    #[serde(default = "default_carried_upgrade")]
    pub carried: UpgradeDef,
    /// Storage chest (default: 1000 gold for 50 slots, 4 times).
    #[serde(default = "default_storage_upgrade")]
    pub storage: UpgradeDef,
    /// Fridge (default: 750 gold for 10 slots, 5 times).
    #[serde(default = "default_fridge_upgrade")]
    pub fridge: UpgradeDef,
}

impl UpgradeTable {
    /// Upgrade for one container.
    pub const fn get(&self, kind: ContainerKind) -> &UpgradeDef {
        match kind {
            ContainerKind::Carried => &self.carried,
            ContainerKind::Storage => &self.storage,
            ContainerKind::Fridge => &self.fridge,
        }
    }
}

impl Default for UpgradeTable {
    fn default() -> Self {
        Self {
            carried: default_carried_upgrade(),
            storage: default_storage_upgrade(),
            fridge: default_fridge_upgrade(),
        }
    }
}

const fn default_carried_upgrade() -> UpgradeDef {
    UpgradeDef {
        cost: 500,
        slots: 5,
        max_purchases: 4,
    }
}

const fn default_storage_upgrade() -> UpgradeDef {
    UpgradeDef {
        cost: 1000,
        slots: 50,
        max_purchases: 4,
    }
}

const fn default_fridge_upgrade() -> UpgradeDef {
    UpgradeDef {
        cost: 750,
        slots: 10,
        max_purchases: 5,
    }
}

/// Upgrades bought so far, per container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeCounts {
    /// Carried bag upgrades.
    #[serde(default)]
    pub carried: u32,
    /// Storage chest upgrades.
    #[serde(default)]
    pub storage: u32,
    /// Fridge upgrades.
    #[serde(default)]
    pub fridge: u32,
}

impl UpgradeCounts {
    /// Purchases for one container.
    pub const fn get(&self, kind: ContainerKind) -> u32 {
        match kind {
            ContainerKind::Carried => self.carried,
            ContainerKind::Storage => self.storage,
            ContainerKind::Fridge => self.fridge,
        }
    }

    const fn get_mut(&mut self, kind: ContainerKind) -> &mut u32 {
        match kind {
            ContainerKind::Carried => &mut self.carried,
            ContainerKind::Storage => &mut self.storage,
            ContainerKind::Fridge => &mut self.fridge,
        }
    }
}

/// Slot capacities, starting purse, shelf life, and upgrades.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryConfig {
    /// Slots in the carried container.
    #[serde(default = "default_carried_slots")]
    pub carried_slots: u32,
    /// Slots in storage.
    #[serde(default = "default_storage_slots")]
    pub storage_slots: u32,
    /// Slots in the fridge.
    #[serde(default = "default_fridge_slots")]
    pub fridge_slots: u32,
    /// Gold at the start of a new game.
    #[serde(default = "default_starting_gold")]
    pub starting_gold: u64,
    /// Days a perishable item lasts outside the fridge (default: 3, 0 = never spoils).
    #[serde(default = "default_spoil_days")]
    pub spoil_days: u32,
    /// Slot upgrades on sale.
    #[serde(default)]
    pub upgrades: UpgradeTable,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            carried_slots: default_carried_slots(),
            storage_slots: default_storage_slots(),
            fridge_slots: default_fridge_slots(),
            starting_gold: default_starting_gold(),
            spoil_days: default_spoil_days(),
            upgrades: UpgradeTable::default(),
        }
    }
}

impl InventoryConfig {
    /// Base slot count of one container, before upgrades.
    pub const fn base_slots(&self, kind: ContainerKind) -> u32 {
        match kind {
            ContainerKind::Carried => self.carried_slots,
            ContainerKind::Storage => self.storage_slots,
            ContainerKind::Fridge => self.fridge_slots,
        }
    }

    const fn shelf_life(&self) -> Option<u32> {
        if self.spoil_days == 0 {
            None
        } else {
            Some(self.spoil_days)
        }
    }
}

const fn default_carried_slots() -> u32 {
    20
}

const fn default_storage_slots() -> u32 {
    100
}

const fn default_fridge_slots() -> u32 {
    30
}

const fn default_starting_gold() -> u64 {
    150
}

const fn default_spoil_days() -> u32 {
    3
}

/// A stack thrown away at a day rollover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpoiledStack {
    /// Container it was in.
    pub container: ContainerKind,
    /// The item.
    pub item: ItemId,
    /// Its quality.
    pub quality: Quality,
    /// Units lost.
    pub quantity: u32,
}

/// Result of buying a slot upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeReceipt {
    /// Upgraded container.
    pub container: ContainerKind,
    /// Gold paid.
    pub cost: u64,
    /// Slot capacity afterwards.
    pub capacity: u32,
    /// Upgrades bought for this container, including this one.
    pub purchases: u32,
}

/// Older countdown wins; a stack that never spoils adopts the other's.
fn merge_freshness(a: Option<u32>, b: Option<u32>) -> Option<u32> {
    match (a, b) {
        (Some(x), Some(y)) => Some(x.min(y)),
        (x, None) | (None, x) => x,
    }
}

/// A slot-limited list of stacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    kind: ContainerKind,
    capacity: u32,
    stacks: Vec<ItemStack>,
}

impl Container {
    const fn new(kind: ContainerKind, capacity: u32) -> Self {
        Self {
            kind,
            capacity,
            stacks: Vec::new(),
        }
    }

    /// Stacks in insertion order.
    pub fn stacks(&self) -> &[ItemStack] {
        &self.stacks
    }

    /// Slot capacity.
    pub const fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Slots in use.
    pub fn used_slots(&self) -> u32 {
        u32::try_from(self.stacks.len()).unwrap_or(u32::MAX)
    }

    /// Total units of `item` across qualities.
    pub fn count(&self, item: &ItemId) -> u32 {
        self.stacks
            .iter()
            .filter(|s| &s.item == item)
            .fold(0_u32, |acc, s| acc.saturating_add(s.quantity))
    }

    /// Units of `item` at exactly `quality`.
    pub fn quantity(&self, item: &ItemId, quality: Quality) -> u32 {
        self.stack(item, quality).map_or(0, |s| s.quantity)
    }

    fn position(&self, item: &ItemId, quality: Quality) -> Option<usize> {
        self.stacks
            .iter()
            .position(|s| &s.item == item && s.quality == quality)
    }

    fn stack(&self, item: &ItemId, quality: Quality) -> Option<&ItemStack> {
        self.position(item, quality).and_then(|i| self.stacks.get(i))
    }

    /// Whether `(item, quality)` can be added without exceeding capacity.
    pub fn can_accept(&self, item: &ItemId, quality: Quality) -> bool {
        self.position(item, quality).is_some() || self.used_slots() < self.capacity
    }

    fn add(
        &mut self,
        item: &ItemId,
        quality: Quality,
        quantity: u32,
        days_until_spoil: Option<u32>,
    ) -> Result<(), WorldError> {
        if quantity == 0 {
            return Ok(());
        }
        if let Some(idx) = self.position(item, quality) {
            let stack = self
                .stacks
                .get_mut(idx)
                .ok_or(WorldError::ArithmeticOverflow)?;
            stack.quantity = stack
                .quantity
                .checked_add(quantity)
                .ok_or(WorldError::ArithmeticOverflow)?;
            stack.days_until_spoil = merge_freshness(stack.days_until_spoil, days_until_spoil);
            return Ok(());
        }
        if self.used_slots() >= self.capacity {
            return Err(WorldError::InventoryFull {
                container: self.kind,
                capacity: self.capacity,
            });
        }
        self.stacks.push(ItemStack {
            item: item.clone(),
            quality,
            quantity,
            days_until_spoil,
        });
        Ok(())
    }

    fn remove(&mut self, item: &ItemId, quality: Quality, quantity: u32) -> Result<(), WorldError> {
        let idx = self.position(item, quality);
        let available = idx
            .and_then(|i| self.stacks.get(i))
            .map_or(0, |s| s.quantity);
        if available < quantity {
            return Err(WorldError::InsufficientItems {
                item: item.clone(),
                requested: quantity,
                available,
            });
        }
        if let Some(i) = idx {
            let remaining = available
                .checked_sub(quantity)
                .ok_or(WorldError::ArithmeticOverflow)?;
            if remaining == 0 {
                self.stacks.remove(i);
            } else if let Some(stack) = self.stacks.get_mut(i) {
                stack.quantity = remaining;
            }
        }
        Ok(())
    }

    /// Count every perishable stack down one day; returns the ones that spoiled.
    fn age(&mut self) -> Vec<ItemStack> {
        let mut spoiled = Vec::new();
        self.stacks.retain_mut(|stack| {
            let Some(days) = stack.days_until_spoil else {
                return true;
            };
            let left = days.saturating_sub(1);
            if left == 0 {
                spoiled.push(stack.clone());
                false
            } else {
                stack.days_until_spoil = Some(left);
                true
            }
        });
        spoiled
    }
}

/// Persisted inventory shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    /// Carried stacks.
    #[serde(default)]
    pub carried: Vec<ItemStack>,
    /// Storage stacks.
    #[serde(default)]
    pub storage: Vec<ItemStack>,
    /// Fridge stacks.
    #[serde(default)]
    pub fridge: Vec<ItemStack>,
    /// Gold held.
    #[serde(default)]
    pub gold: u64,
    /// Slot upgrades bought.
    #[serde(default)]
    pub upgrades: UpgradeCounts,
}

/// The player's containers and gold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    carried: Container,
    storage: Container,
    fridge: Container,
    gold: u64,
    shelf_life: Option<u32>,
    upgrades: UpgradeCounts,
}

impl Inventory {
    /// Empty containers with the starting purse.
    pub const fn new(config: &InventoryConfig) -> Self {
        Self {
            carried: Container::new(ContainerKind::Carried, config.carried_slots),
            storage: Container::new(ContainerKind::Storage, config.storage_slots),
            fridge: Container::new(ContainerKind::Fridge, config.fridge_slots),
            gold: config.starting_gold,
            shelf_life: config.shelf_life(),
            upgrades: UpgradeCounts {
                carried: 0,
                storage: 0,
                fridge: 0,
            },
        }
    }

    /// Rebuild from a persisted record, validating slot counts and stacks.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InventoryFull`] if a container holds more stacks
    /// than it has slots, or [`WorldError::InvalidTuning`] for empty,
    /// duplicate, or already-spoiled stacks and for more upgrades than the
    /// config sells.
    pub fn from_record(record: InventoryRecord, config: &InventoryConfig) -> Result<Self, WorldError> {
        let mut inventory = Self::new(config);
        inventory.gold = record.gold;
        for kind in ContainerKind::ALL {
            let bought = record.upgrades.get(kind);
            let def = config.upgrades.get(kind);
            if bought > def.max_purchases {
                return Err(WorldError::InvalidTuning {
                    reason: format!("{bought} {kind:?} upgrades, at most {} on sale", def.max_purchases),
                });
            }
            let capacity = def
                .slots
                .checked_mul(bought)
                .and_then(|extra| config.base_slots(kind).checked_add(extra))
                .ok_or(WorldError::ArithmeticOverflow)?;
            inventory.container_mut(kind).capacity = capacity;
        }
        inventory.upgrades = record.upgrades;

        for (kind, stacks) in [
            (ContainerKind::Carried, record.carried),
            (ContainerKind::Storage, record.storage),
            (ContainerKind::Fridge, record.fridge),
        ] {
            let container = inventory.container_mut(kind);
            for stack in stacks {
                if stack.quantity == 0 {
                    return Err(WorldError::InvalidTuning {
                        reason: format!("empty stack of {} in {kind:?}", stack.item),
                    });
                }
                if stack.days_until_spoil == Some(0) {
                    return Err(WorldError::InvalidTuning {
                        reason: format!("spoiled stack of {} in {kind:?}", stack.item),
                    });
                }
                if container.position(&stack.item, stack.quality).is_some() {
                    return Err(WorldError::InvalidTuning {
                        reason: format!("duplicate stack of {} in {kind:?}", stack.item),
                    });
                }
                container.add(&stack.item, stack.quality, stack.quantity, stack.days_until_spoil)?;
            }
        }
        Ok(inventory)
    }

    /// Persisted form.
    pub fn record(&self) -> InventoryRecord {
        InventoryRecord {
            carried: self.carried.stacks.clone(),
            storage: self.storage.stacks.clone(),
            fridge: self.fridge.stacks.clone(),
            gold: self.gold,
            upgrades: self.upgrades,
        }
    }

    /// Borrow a container.
    pub const fn container(&self, kind: ContainerKind) -> &Container {
        match kind {
            ContainerKind::Carried => &self.carried,
            ContainerKind::Storage => &self.storage,
            ContainerKind::Fridge => &self.fridge,
        }
    }

    const fn container_mut(&mut self, kind: ContainerKind) -> &mut Container {
        match kind {
            ContainerKind::Carried => &mut self.carried,
            ContainerKind::Storage => &mut self.storage,
            ContainerKind::Fridge => &mut self.fridge,
        }
    }

    /// Whether `(item, quality)` fits in `kind`.
    pub fn can_accept(&self, kind: ContainerKind, item: &ItemId, quality: Quality) -> bool {
        self.container(kind).can_accept(item, quality)
    }

    /// Add units that never spoil.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InventoryFull`] if a new slot is needed and none is free.
    pub fn add(
        &mut self,
        kind: ContainerKind,
        item: &ItemId,
        quality: Quality,
        quantity: u32,
    ) -> Result<(), WorldError> {
        self.container_mut(kind).add(item, quality, quantity, None)
    }

    /// Add fresh perishable units with the configured shelf life.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InventoryFull`] if a new slot is needed and none is free.
    pub fn add_perishable(
        &mut self,
        kind: ContainerKind,
        item: &ItemId,
        quality: Quality,
        quantity: u32,
    ) -> Result<(), WorldError> {
        let shelf_life = self.shelf_life;
        self.container_mut(kind).add(item, quality, quantity, shelf_life)
    }

    /// Add a whole stack, keeping its spoil countdown.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InventoryFull`] if a new slot is needed and none
    /// is free, or [`WorldError::InvalidTuning`] for an already-spoiled stack.
    pub fn add_stack(&mut self, kind: ContainerKind, stack: &ItemStack) -> Result<(), WorldError> {
        if stack.days_until_spoil == Some(0) {
            return Err(WorldError::InvalidTuning {
                reason: format!("spoiled stack of {}", stack.item),
            });
        }
        self.container_mut(kind)
            .add(&stack.item, stack.quality, stack.quantity, stack.days_until_spoil)
    }

    /// Remove units from a container.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InsufficientItems`] if the stack holds fewer units.
    pub fn remove(
        &mut self,
        kind: ContainerKind,
        item: &ItemId,
        quality: Quality,
        quantity: u32,
    ) -> Result<(), WorldError> {
        self.container_mut(kind).remove(item, quality, quantity)
    }

    /// Move units between containers, keeping their spoil countdown.
    /// Nothing changes on failure.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InsufficientItems`] or [`WorldError::InventoryFull`].
    pub fn transfer(
        &mut self,
        from: ContainerKind,
        to: ContainerKind,
        item: &ItemId,
        quality: Quality,
        quantity: u32,
    ) -> Result<(), WorldError> {
        if from == to {
            return Ok(());
        }
        let source = self.container(from).stack(item, quality);
        let available = source.map_or(0, |s| s.quantity);
        let freshness = source.and_then(|s| s.days_until_spoil);
        if available < quantity {
            return Err(WorldError::InsufficientItems {
                item: item.clone(),
                requested: quantity,
                available,
            });
        }
        if !self.can_accept(to, item, quality) {
            let target = self.container(to);
            return Err(WorldError::InventoryFull {
                container: to,
                capacity: target.capacity,
            });
        }
        self.container_mut(from).remove(item, quality, quantity)?;
        self.container_mut(to).add(item, quality, quantity, freshness)
    }

    /// Move every carried stack that fits into storage.
    ///
    /// Returns the number of stacks moved; stacks that do not fit stay carried.
    pub fn deposit_carried(&mut self) -> u32 {
        let stacks = core::mem::take(&mut self.carried.stacks);
        let mut moved: u32 = 0;
        for stack in stacks {
            if self.storage.can_accept(&stack.item, stack.quality)
                && self
                    .storage
                    .add(&stack.item, stack.quality, stack.quantity, stack.days_until_spoil)
                    .is_ok()
            {
                moved = moved.saturating_add(1);
            } else {
                self.carried.stacks.push(stack);
            }
        }
        moved
    }

    /// Units of `item` at `min_quality` or better, across all containers.
    pub fn available(&self, item: &ItemId, min_quality: Quality) -> u32 {
        ContainerKind::ALL
            .iter()
            .flat_map(|kind| self.container(*kind).stacks.iter())
            .filter(|s| &s.item == item && s.quality >= min_quality)
            .fold(0_u32, |acc, s| acc.saturating_add(s.quantity))
    }

    /// Remove `quantity` units of `item` at `min_quality` or better,
    /// best quality first and the fridge before storage before the bag.
    ///
    /// Returns what was taken, one entry per source stack. Nothing changes
    /// on failure.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InsufficientItems`] if fewer units qualify.
    pub fn take(&mut self, item: &ItemId, min_quality: Quality, quantity: u32) -> Result<Vec<ItemStack>, WorldError> {
        let available = self.available(item, min_quality);
        if available < quantity {
            return Err(WorldError::InsufficientItems {
                item: item.clone(),
                requested: quantity,
                available,
            });
        }
        let mut sources: Vec<(ContainerKind, ItemStack)> = ContainerKind::ALL
            .iter()
            .flat_map(|kind| {
                self.container(*kind)
                    .stacks
                    .iter()
                    .filter(|s| &s.item == item && s.quality >= min_quality)
                    .map(|s| (*kind, s.clone()))
            })
            .collect();
        sources.sort_by(|a, b| b.1.quality.cmp(&a.1.quality));

        let mut taken = Vec::new();
        let mut remaining = quantity;
        for (kind, mut stack) in sources {
            if remaining == 0 {
                break;
            }
            let units = remaining.min(stack.quantity);
            self.container_mut(kind).remove(item, stack.quality, units)?;
            remaining = remaining.saturating_sub(units);
            stack.quantity = units;
            taken.push(stack);
        }
        Ok(taken)
    }

    /// Age every stack outside the fridge by one day and throw away the
    /// ones that spoil.
    pub fn advance_day(&mut self) -> Vec<SpoiledStack> {
        let mut spoiled = Vec::new();
        for kind in [ContainerKind::Carried, ContainerKind::Storage] {
            for stack in self.container_mut(kind).age() {
                spoiled.push(SpoiledStack {
                    container: kind,
                    item: stack.item,
                    quality: stack.quality,
                    quantity: stack.quantity,
                });
            }
        }
        if !spoiled.is_empty() {
            info!(stacks = spoiled.len(), "Items spoiled overnight");
        }
        spoiled
    }

    /// Upgrades bought so far.
    pub const fn upgrades(&self) -> &UpgradeCounts {
        &self.upgrades
    }

    /// Buy one slot upgrade for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UpgradeMaxed`] once every purchase is used up,
    /// or [`WorldError::InsufficientGold`]. Nothing changes on failure.
    pub fn purchase_upgrade(
        &mut self,
        kind: ContainerKind,
        config: &InventoryConfig,
    ) -> Result<UpgradeReceipt, WorldError> {
        let def = *config.upgrades.get(kind);
        let bought = self.upgrades.get(kind);
        if bought >= def.max_purchases {
            return Err(WorldError::UpgradeMaxed {
                container: kind,
                max_purchases: def.max_purchases,
            });
        }
        let capacity = self
            .container(kind)
            .capacity
            .checked_add(def.slots)
            .ok_or(WorldError::ArithmeticOverflow)?;
        let purchases = bought.checked_add(1).ok_or(WorldError::ArithmeticOverflow)?;
        self.spend(def.cost)?;
        self.container_mut(kind).capacity = capacity;
        *self.upgrades.get_mut(kind) = purchases;
        info!(container = ?kind, capacity, purchases, cost = def.cost, "Container upgraded");
        Ok(UpgradeReceipt {
            container: kind,
            cost: def.cost,
            capacity,
            purchases,
        })
    }

    /// Gold held.
    pub const fn gold(&self) -> u64 {
        self.gold
    }

    /// Add gold (saturating).
    pub const fn earn(&mut self, amount: u64) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Pay gold.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InsufficientGold`] if the purse is short.
    pub fn spend(&mut self, amount: u64) -> Result<(), WorldError> {
        self.gold = self
            .gold
            .checked_sub(amount)
            .ok_or(WorldError::InsufficientGold {
                requested: amount,
                available: self.gold,
            })?;
        Ok(())
    }
}
