//! Recipe book and the daily menu.
//!
//! The recipe book is static content: every dish the shop could ever
//! serve, with the ingredients one cook consumes. Recipes unlock when
//! reputation reaches their tier or when a narrative outcome or festival
//! grants them. The menu is the subset of unlocked recipes offered to
//! customers, at most `capacity` dishes.
//!
//! A cooked [`Dish`] takes the quantity-weighted mean quality of the
//! ingredients that went into it, rounded half up.

use std::collections::{BTreeMap, BTreeSet};

use haven_types::{Color, ItemId, OrderCategory, Quality, RecipeId};
use serde::{Deserialize, Serialize};

use crate::error::ShopError;
use crate::reputation::ReputationTier;

/// One line of a recipe's ingredient list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    /// Item consumed.
    pub item: ItemId,
    /// Units consumed per cook (default: 1).
    #[serde(default = "default_ingredient_quantity")]
    pub quantity: u32,
    /// Lowest quality accepted (default: 1 star).
    #[serde(default = "default_min_quality")]
    pub min_quality: Quality,
}

const fn default_ingredient_quantity() -> u32 {
    1
}

const fn default_min_quality() -> Quality {
    Quality::MIN
}

/// A cooked dish, ready to serve or feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dish {
    /// Recipe it was cooked from.
    pub recipe: RecipeId,
    /// Quality it came out at.
    pub quality: Quality,
}

impl Dish {
    /// Inventory item a cooked dish is stored as: the recipe id.
    pub fn item(&self) -> ItemId {
        ItemId::new(self.recipe.as_str())
    }
}

/// Quality of a dish cooked from `used` ingredients, each a `(quality,
/// units)` pair, plus `bonus_stars`.
///
/// The base is the quantity-weighted mean, rounded half up; a recipe
/// without ingredients cooks at standard quality.
pub fn cooked_quality(used: &[(Quality, u32)], bonus_stars: u8) -> Quality {
    let (weighted, units) = used.iter().fold((0_u64, 0_u64), |(w, n), (quality, count)| {
        (
            w.saturating_add(u64::from(quality.stars()).saturating_mul(u64::from(*count))),
            n.saturating_add(u64::from(*count)),
        )
    });
    let base = weighted
        .saturating_mul(2)
        .saturating_add(units)
        .checked_div(units.saturating_mul(2))
        .unwrap_or_else(|| u64::from(Quality::STANDARD.stars()));
    let score = i32::try_from(base)
        .unwrap_or(i32::MAX)
        .saturating_add(i32::from(bonus_stars));
    Quality::saturating(score)
}

/// Static definition of a dish.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeDef {
    /// Unique id.
    pub id: RecipeId,
    /// Display name.
    pub name: String,
    /// Menu category.
    pub category: OrderCategory,
    /// Price at standard quality, in gold.
    pub base_price: u64,
    /// Hunger restored when fed to the creature.
    pub hunger_value: f64,
    /// Happiness restored when fed to the creature.
    #[serde(default)]
    pub happiness_value: f64,
    /// Colour the dish pulls the creature toward.
    pub color_influence: Color,
    /// Whether the creature especially likes this dish.
    #[serde(default)]
    pub favorite: bool,
    /// Reputation tier at which the recipe unlocks.
    #[serde(default = "default_unlock_tier")]
    pub unlock_tier: ReputationTier,
    /// Ingredients one cook consumes.
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    /// Festival dish: never unlocked by reputation, cooked only while its
    /// festival runs.
    #[serde(default)]
    pub seasonal: bool,
}

const fn default_unlock_tier() -> ReputationTier {
    ReputationTier::Unknown
}

impl RecipeDef {
    /// Sale price for a dish of the given quality.
    ///
    /// Each star above or below standard moves the price by 10%, rounded
    /// half up.
    pub fn price(&self, quality: Quality) -> u64 {
        // (10 + stars - 3) tenths of the base price.
        let tenths = u64::from(quality.stars()).saturating_add(7);
        self.base_price
            .saturating_mul(tenths)
            .saturating_add(5)
            .checked_div(10)
            .unwrap_or(0)
    }
}

/// Validated recipe definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeBook {
    defs: BTreeMap<RecipeId, RecipeDef>,
}

impl RecipeBook {
    /// Build a recipe book.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::InvalidConfig`] on duplicate ids or invalid
    /// nutrition values.
    pub fn new(defs: Vec<RecipeDef>) -> Result<Self, ShopError> {
        let mut map = BTreeMap::new();
        for def in defs {
            if !def.hunger_value.is_finite()
                || def.hunger_value < 0.0
                || !def.happiness_value.is_finite()
                || def.happiness_value < 0.0
            {
                return Err(ShopError::InvalidConfig {
                    reason: format!("recipe {} has invalid nutrition values", def.id),
                });
            }
            if !def.color_influence.is_valid() {
                return Err(ShopError::InvalidConfig {
                    reason: format!("recipe {} has an invalid colour", def.id),
                });
            }
            let mut items = BTreeSet::new();
            for ingredient in &def.ingredients {
                if ingredient.quantity == 0 || !items.insert(&ingredient.item) {
                    return Err(ShopError::InvalidConfig {
                        reason: format!(
                            "recipe {} lists {} with zero quantity or twice",
                            def.id, ingredient.item
                        ),
                    });
                }
            }
            let id = def.id.clone();
            if map.insert(id.clone(), def).is_some() {
                return Err(ShopError::InvalidConfig {
                    reason: format!("duplicate recipe id {id}"),
                });
            }
        }
        Ok(Self { defs: map })
    }

    /// Look up a recipe.
    pub fn get(&self, id: &RecipeId) -> Option<&RecipeDef> {
        self.defs.get(id)
    }

    /// Look up a recipe or fail with [`ShopError::UnknownRecipe`].
    pub fn require(&self, id: &RecipeId) -> Result<&RecipeDef, ShopError> {
        self.get(id).ok_or_else(|| ShopError::UnknownRecipe(id.clone()))
    }

    /// All recipes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &RecipeDef> {
        self.defs.values()
    }

    /// Non-festival recipes whose unlock tier is at or below `tier`.
    pub fn unlocked_through(&self, tier: ReputationTier) -> impl Iterator<Item = &RecipeDef> {
        self.defs
            .values()
            .filter(move |d| !d.seasonal && d.unlock_tier <= tier)
    }
}

/// Unlocked recipes and the dishes currently offered.
#[derive(Debug, Clone, PartialEq)]
pub struct Menu {
    capacity: usize,
    unlocked: BTreeSet<RecipeId>,
    dishes: Vec<RecipeId>,
}

impl Menu {
    /// Starting menu: every recipe unlocked at `tier`, with the first
    /// `capacity` of them on offer.
    pub fn new(book: &RecipeBook, tier: ReputationTier, capacity: usize) -> Self {
        let unlocked: BTreeSet<RecipeId> =
            book.unlocked_through(tier).map(|d| d.id.clone()).collect();
        let dishes = unlocked.iter().take(capacity).cloned().collect();
        Self {
            capacity,
            unlocked,
            dishes,
        }
    }

    /// Rebuild from persisted parts.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::CorruptRecord`] if a recipe is unknown, a dish
    /// is not unlocked, a dish repeats, or the menu exceeds capacity.
    pub fn restore(
        book: &RecipeBook,
        unlocked: BTreeSet<RecipeId>,
        dishes: Vec<RecipeId>,
        capacity: usize,
    ) -> Result<Self, ShopError> {
        let corrupt = |reason: String| ShopError::CorruptRecord { reason };
        if let Some(unknown) = unlocked.iter().find(|id| book.get(id).is_none()) {
            return Err(corrupt(format!("unknown unlocked recipe {unknown}")));
        }
        if dishes.len() > capacity {
            return Err(corrupt(format!("menu has {} dishes, capacity {capacity}", dishes.len())));
        }
        let mut seen = BTreeSet::new();
        for dish in &dishes {
            if !unlocked.contains(dish) {
                return Err(corrupt(format!("menu dish {dish} is not unlocked")));
            }
            if !seen.insert(dish) {
                return Err(corrupt(format!("menu dish {dish} appears twice")));
            }
        }
        Ok(Self {
            capacity,
            unlocked,
            dishes,
        })
    }

    /// Unlocked recipes.
    pub const fn unlocked(&self) -> &BTreeSet<RecipeId> {
        &self.unlocked
    }

    /// Dishes on offer, in menu order.
    pub fn dishes(&self) -> &[RecipeId] {
        &self.dishes
    }

    /// Whether a recipe is on offer.
    pub fn offers(&self, id: &RecipeId) -> bool {
        self.dishes.contains(id)
    }

    /// Unlock one recipe. Returns `false` if it was already unlocked.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::UnknownRecipe`] if the book has no such recipe.
    pub fn unlock(&mut self, id: &RecipeId, book: &RecipeBook) -> Result<bool, ShopError> {
        book.require(id)?;
        Ok(self.unlocked.insert(id.clone()))
    }

    /// Unlock every recipe gated at or below `tier`; returns the new ones.
    pub fn unlock_tier(&mut self, tier: ReputationTier, book: &RecipeBook) -> Vec<RecipeId> {
        book.unlocked_through(tier)
            .filter(|d| self.unlocked.insert(d.id.clone()))
            .map(|d| d.id.clone())
            .collect()
    }

    /// Put an unlocked recipe on the menu.
    ///
    /// # Errors
    ///
    /// [`ShopError::UnknownRecipe`], [`ShopError::RecipeLocked`],
    /// [`ShopError::AlreadyOnMenu`], [`ShopError::MenuFull`].
    pub fn add(&mut self, id: &RecipeId, book: &RecipeBook) -> Result<(), ShopError> {
        book.require(id)?;
        if !self.unlocked.contains(id) {
            return Err(ShopError::RecipeLocked(id.clone()));
        }
        if self.offers(id) {
            return Err(ShopError::AlreadyOnMenu(id.clone()));
        }
        if self.dishes.len() >= self.capacity {
            return Err(ShopError::MenuFull {
                capacity: self.capacity,
            });
        }
        self.dishes.push(id.clone());
        Ok(())
    }

    /// Take a dish off the menu.
    ///
    /// # Errors
    ///
    /// Returns [`ShopError::NotOnMenu`] if it was not on offer.
    pub fn remove(&mut self, id: &RecipeId) -> Result<(), ShopError> {
        let before = self.dishes.len();
        self.dishes.retain(|d| d != id);
        if self.dishes.len() == before {
            return Err(ShopError::NotOnMenu(id.clone()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn recipe(id: &str, category: OrderCategory, tier: ReputationTier) -> RecipeDef {
        RecipeDef {
            id: RecipeId::new(id),
            name: id.to_owned(),
            category,
            base_price: 40,
            hunger_value: 30.0,
            happiness_value: 5.0,
            color_influence: Color::NEUTRAL,
            favorite: false,
            unlock_tier: tier,
            ingredients: Vec::new(),
            seasonal: false,
        }
    }

    fn book() -> RecipeBook {
        RecipeBook::new(vec![
            recipe("a_tea", OrderCategory::Beverage, ReputationTier::Unknown),
            recipe("b_salad", OrderCategory::Appetizer, ReputationTier::Unknown),
            recipe("c_stew", OrderCategory::Main, ReputationTier::Unknown),
            recipe("d_cake", OrderCategory::Dessert, ReputationTier::Local),
            recipe("e_roast", OrderCategory::Main, ReputationTier::Town),
        ])
        .unwrap()
    }

    #[test]
    fn price_scales_with_quality() {
        let r = recipe("x", OrderCategory::Main, ReputationTier::Unknown);
        assert_eq!(r.price(Quality::STANDARD), 40);
        assert_eq!(r.price(Quality::MAX), 48);
        assert_eq!(r.price(Quality::MIN), 32);
    }

    #[test]
    fn price_rounds_half_up() {
        let mut r = recipe("x", OrderCategory::Main, ReputationTier::Unknown);
        r.base_price = 25;
        assert_eq!(r.price(Quality::MAX), 30);
        assert_eq!(r.price(Quality::new(4).unwrap()), 28);
        assert_eq!(r.price(Quality::MIN), 20);
    }

    #[test]
    fn cooked_quality_is_the_weighted_mean() {
        let three = Quality::STANDARD;
        let five = Quality::MAX;
        assert_eq!(cooked_quality(&[(five, 1), (three, 1)], 0), Quality::new(4).unwrap());
        // 5 + 3 + 3 = 11 over 3 units is 3.67, which rounds to 4.
        assert_eq!(cooked_quality(&[(five, 1), (three, 2)], 0), Quality::new(4).unwrap());
        // 5 + 3 * 3 = 14 over 4 units is 3.5, which rounds up.
        assert_eq!(cooked_quality(&[(five, 1), (three, 3)], 0), Quality::new(4).unwrap());
        assert_eq!(cooked_quality(&[(Quality::MIN, 4)], 0), Quality::MIN);
    }

    #[test]
    fn cooked_quality_defaults_to_standard_and_caps_bonuses() {
        assert_eq!(cooked_quality(&[], 0), Quality::STANDARD);
        assert_eq!(cooked_quality(&[(Quality::new(4).unwrap(), 2)], 3), Quality::MAX);
    }

    #[test]
    fn recipe_listing_an_ingredient_twice_is_rejected() {
        let mut r = recipe("x", OrderCategory::Main, ReputationTier::Unknown);
        let herb = Ingredient {
            item: ItemId::new("garden_herb"),
            quantity: 1,
            min_quality: Quality::MIN,
        };
        r.ingredients = vec![herb.clone(), herb];
        assert!(RecipeBook::new(vec![r]).is_err());
    }

    #[test]
    fn festival_recipes_never_unlock_by_tier() {
        let mut festive = recipe("f_lantern_cake", OrderCategory::Dessert, ReputationTier::Unknown);
        festive.seasonal = true;
        let book = RecipeBook::new(vec![festive]).unwrap();
        assert_eq!(book.unlocked_through(ReputationTier::Legendary).count(), 0);
    }

    #[test]
    fn dish_is_stored_under_its_recipe_id() {
        let dish = Dish {
            recipe: RecipeId::new("honey_cake"),
            quality: Quality::STANDARD,
        };
        assert_eq!(dish.item(), ItemId::new("honey_cake"));
    }

    #[test]
    fn duplicate_recipe_is_rejected() {
        let dup = vec![
            recipe("a", OrderCategory::Main, ReputationTier::Unknown),
            recipe("a", OrderCategory::Main, ReputationTier::Unknown),
        ];
        assert!(RecipeBook::new(dup).is_err());
    }

    #[test]
    fn starting_menu_uses_base_tier_only() {
        let menu = Menu::new(&book(), ReputationTier::Unknown, 2);
        assert_eq!(menu.unlocked().len(), 3);
        assert_eq!(menu.dishes().len(), 2);
    }

    #[test]
    fn tier_unlock_reports_only_new_recipes() {
        let book = book();
        let mut menu = Menu::new(&book, ReputationTier::Unknown, 6);
        let new = menu.unlock_tier(ReputationTier::Town, &book);
        assert_eq!(new, vec![RecipeId::new("d_cake"), RecipeId::new("e_roast")]);
        assert!(menu.unlock_tier(ReputationTier::Town, &book).is_empty());
    }

    #[test]
    fn add_enforces_lock_duplicates_and_capacity() {
        let book = book();
        let mut menu = Menu::new(&book, ReputationTier::Unknown, 3);
        assert_eq!(
            menu.add(&RecipeId::new("d_cake"), &book),
            Err(ShopError::RecipeLocked(RecipeId::new("d_cake")))
        );
        menu.unlock(&RecipeId::new("d_cake"), &book).unwrap();
        assert_eq!(
            menu.add(&RecipeId::new("d_cake"), &book),
            Err(ShopError::MenuFull { capacity: 3 })
        );
        menu.remove(&RecipeId::new("a_tea")).unwrap();
        menu.add(&RecipeId::new("d_cake"), &book).unwrap();
        assert!(menu.add(&RecipeId::new("d_cake"), &book).is_err());
        assert!(menu.offers(&RecipeId::new("d_cake")));
    }

    #[test]
    fn restore_rejects_locked_dish() {
        let book = book();
        let unlocked: BTreeSet<RecipeId> = [RecipeId::new("a_tea")].into();
        let result = Menu::restore(&book, unlocked, vec![RecipeId::new("c_stew")], 6);
        assert!(matches!(result, Err(ShopError::CorruptRecord { .. })));
    }
}
