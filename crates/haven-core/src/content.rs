//! Static game content: abilities, recipes, zones, spawn points, staff,
//! story events, festivals, achievements, and the starting pantry.
//!
//! Content is a strongly typed record validated once at startup. It comes
//! either from [`GameContent::builtin`] or from YAML through
//! [`GameContent::from_yaml`]. Validation fails fast on duplicate ids and
//! on any reference to an ability, zone, recipe, event, or ingredient that
//! does not exist.

use std::collections::BTreeSet;

use haven_creature::{AbilityCatalog, AbilityDef, CreatureError};
use haven_shop::{
    FestivalBonuses, FestivalCalendar, FestivalDef, Ingredient, RecipeBook, RecipeDef, ReputationTier,
    ShopError, StaffDef, StaffRole, StaffTrait,
};
use haven_story::{Chapter, Condition, Outcome, StoryBook, StoryError, StoryEvent};
use haven_types::{
    AbilityId, AchievementId, Color, EventId, FestivalId, IngredientKind, ItemId, LifeStage,
    OrderCategory, Quality, RarityTier, RecipeId, Season, SpawnPointId, StaffId, Weather, ZoneId,
};
use haven_world::{ItemStack, SpawnPointDef, ZoneDef};
use serde::{Deserialize, Serialize};

use crate::achievement::{AchievementDef, AchievementRule, Achievements};

/// Errors raised while loading or validating content.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// The YAML document could not be parsed.
    #[error("failed to parse content YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// Ability definitions are malformed.
    #[error("invalid abilities: {source}")]
    Abilities {
        /// The underlying creature error.
        #[from]
        source: CreatureError,
    },

    /// Recipe or festival definitions are malformed.
    #[error("invalid recipes or festivals: {source}")]
    Recipes {
        /// The underlying shop error.
        #[from]
        source: ShopError,
    },

    /// Story events are malformed.
    #[error("invalid story: {source}")]
    Story {
        /// The underlying story error.
        #[from]
        source: StoryError,
    },

    /// An id repeats or a reference points at nothing.
    #[error("invalid content: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ContentError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Everything the simulation needs that never changes during play.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameContent {
    /// Creature abilities.
    #[serde(default)]
    pub abilities: Vec<AbilityDef>,
    /// Every recipe the shop could ever serve.
    #[serde(default)]
    pub recipes: Vec<RecipeDef>,
    /// Explorable zones.
    #[serde(default)]
    pub zones: Vec<ZoneDef>,
    /// Gatherable spawn points.
    #[serde(default)]
    pub spawn_points: Vec<SpawnPointDef>,
    /// Shop staff.
    #[serde(default)]
    pub staff: Vec<StaffDef>,
    /// Narrative events.
    #[serde(default)]
    pub story: Vec<StoryEvent>,
    /// Seasonal festivals, at most one per season.
    #[serde(default)]
    pub festivals: Vec<FestivalDef>,
    /// One-off milestones.
    #[serde(default)]
    pub achievements: Vec<AchievementDef>,
    /// Stock in the fridge at the start of a new game.
    #[serde(default)]
    pub starting_pantry: Vec<ItemStack>,
}

impl GameContent {
    /// Parse and validate content from YAML.
    ///
    /// # Errors
    ///
    /// [`ContentError::Yaml`] for malformed YAML, any other variant for
    /// content that fails [`validate`](Self::validate).
    pub fn from_yaml(yaml: &str) -> Result<Self, ContentError> {
        let content: Self = serde_yml::from_str(yaml)?;
        content.validate()?;
        Ok(content)
    }

    /// Check ids and cross-references.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ContentError> {
        let catalog = AbilityCatalog::new(self.abilities.clone())?;
        let book = RecipeBook::new(self.recipes.clone())?;
        StoryBook::new(self.story.clone())?;
        // Season length is checked again against the clock at startup.
        FestivalCalendar::new(self.festivals.clone(), &book, u32::MAX)?;
        Achievements::new(self.achievements.clone())?;

        let zones = unique_ids(self.zones.iter().map(|z| &z.id), "zone")?;
        unique_ids(self.spawn_points.iter().map(|p| &p.id), "spawn point")?;
        unique_ids(self.staff.iter().map(|s| &s.id), "staff member")?;
        if zones.is_empty() {
            return Err(invalid("at least one zone is required".to_owned()));
        }

        for point in &self.spawn_points {
            if !zones.contains(&point.zone) {
                return Err(invalid(format!("spawn point {} is in unknown zone {}", point.id, point.zone)));
            }
            if let Some(ability) = &point.required_ability
                && catalog.get(ability).is_none()
            {
                return Err(invalid(format!("spawn point {} requires unknown ability {ability}", point.id)));
            }
        }

        let mut pantry = BTreeSet::new();
        for stack in &self.starting_pantry {
            if stack.quantity == 0 || stack.days_until_spoil == Some(0) {
                return Err(invalid(format!("starting pantry stack of {} is empty or spoiled", stack.item)));
            }
            if !pantry.insert((&stack.item, stack.quality)) {
                return Err(invalid(format!("starting pantry lists {} twice", stack.item)));
            }
        }
        let provided: BTreeSet<&ItemId> = self
            .spawn_points
            .iter()
            .map(|p| &p.item)
            .chain(self.starting_pantry.iter().map(|s| &s.item))
            .collect();
        for recipe in &self.recipes {
            if let Some(missing) = recipe.ingredients.iter().find(|i| !provided.contains(&i.item)) {
                return Err(invalid(format!(
                    "recipe {} needs {}, which nothing provides",
                    recipe.id, missing.item
                )));
            }
        }

        for event in &self.story {
            for condition in &event.conditions {
                if let Condition::Location { zone } = condition
                    && !zones.contains(zone)
                {
                    return Err(invalid(format!("event {} checks unknown zone {zone}", event.id)));
                }
            }
            for outcome in &event.outcomes {
                match outcome {
                    Outcome::UnlockRecipe { recipe } if book.get(recipe).is_none() => {
                        return Err(invalid(format!("event {} unlocks unknown recipe {recipe}", event.id)));
                    }
                    Outcome::UnlockZone { zone } if !zones.contains(zone) => {
                        return Err(invalid(format!("event {} unlocks unknown zone {zone}", event.id)));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    /// The standard Haven content.
    pub fn builtin() -> Self {
        Self {
            abilities: AbilityCatalog::builtin().iter().cloned().collect(),
            recipes: builtin_recipes(),
            zones: builtin_zones(),
            spawn_points: builtin_spawn_points(),
            staff: builtin_staff(),
            story: builtin_story(),
            festivals: builtin_festivals(),
            achievements: builtin_achievements(),
            starting_pantry: builtin_pantry(),
        }
    }
}

fn invalid(reason: String) -> ContentError {
    ContentError::Invalid { reason }
}

fn unique_ids<'a, T>(ids: impl Iterator<Item = &'a T>, what: &str) -> Result<BTreeSet<T>, ContentError>
where
    T: Ord + Clone + std::fmt::Display + 'a,
{
    let mut seen = BTreeSet::new();
    for id in ids {
        if !seen.insert(id.clone()) {
            return Err(invalid(format!("duplicate {what} id {id}")));
        }
    }
    Ok(seen)
}

// ---------------------------------------------------------------------------
// Built-in content
// ---------------------------------------------------------------------------

/// Helper to build a [`RecipeDef`].
#[allow(clippy::too_many_arguments)]
fn recipe(
    id: &str,
    name: &str,
    category: OrderCategory,
    base_price: u64,
    hunger_value: f64,
    happiness_value: f64,
    color: (f64, f64, f64),
    favorite: bool,
    unlock_tier: ReputationTier,
) -> RecipeDef {
    RecipeDef {
        id: RecipeId::new(id),
        name: name.to_owned(),
        category,
        base_price,
        hunger_value,
        happiness_value,
        color_influence: Color::new(color.0, color.1, color.2),
        favorite,
        unlock_tier,
        ingredients: Vec::new(),
        seasonal: false,
    }
}

/// Attach an ingredient list of `(item, units)` pairs, any quality.
fn needs(mut def: RecipeDef, items: &[(&str, u32)]) -> RecipeDef {
    def.ingredients = items
        .iter()
        .map(|(item, quantity)| Ingredient {
            item: ItemId::new(*item),
            quantity: *quantity,
            min_quality: Quality::MIN,
        })
        .collect();
    def
}

/// Mark a recipe as festival-only.
fn seasonal(mut def: RecipeDef) -> RecipeDef {
    def.seasonal = true;
    def
}

fn builtin_recipes() -> Vec<RecipeDef> {
    use OrderCategory::{Appetizer, Beverage, Dessert, Main};
    use ReputationTier::{Legendary, Local, Regional, Town, Unknown};
    vec![
        needs(
            recipe("berry_juice", "Berry Juice", Beverage, 12, 10.0, 8.0, (0.8, 0.3, 0.5), false, Unknown),
            &[("wild_berry", 2)],
        ),
        needs(
            recipe("honey_tea", "Honey Tea", Beverage, 10, 5.0, 12.0, (0.9, 0.75, 0.3), true, Unknown),
            &[("mint", 1), ("honey_blossom", 1)],
        ),
        needs(
            recipe("herb_salad", "Herb Salad", Appetizer, 15, 20.0, 5.0, (0.4, 0.8, 0.3), false, Unknown),
            &[("garden_herb", 2)],
        ),
        needs(
            recipe("berry_toast", "Berry Toast", Dessert, 14, 18.0, 10.0, (0.7, 0.3, 0.4), false, Unknown),
            &[("wild_berry", 1), ("mint", 1)],
        ),
        needs(
            recipe("herb_stew", "Herb Stew", Main, 25, 40.0, 8.0, (0.45, 0.7, 0.35), false, Unknown),
            &[("garden_herb", 2), ("mint", 1)],
        ),
        needs(
            recipe("mushroom_skewers", "Mushroom Skewers", Appetizer, 22, 28.0, 6.0, (0.6, 0.5, 0.35), false, Local),
            &[("forest_mushroom", 2), ("garden_herb", 1)],
        ),
        needs(
            recipe("honey_cake", "Honey Cake", Dessert, 24, 22.0, 15.0, (0.95, 0.8, 0.35), true, Local),
            &[("honeycomb", 1), ("wild_grain", 1)],
        ),
        needs(
            recipe("root_soup", "Root Soup", Main, 30, 42.0, 7.0, (0.65, 0.45, 0.3), false, Town),
            &[("sweet_root", 2), ("garden_herb", 1)],
        ),
        needs(
            recipe("forest_fish_plate", "Forest Fish Plate", Main, 38, 45.0, 10.0, (0.35, 0.55, 0.75), false, Town),
            &[("river_fish", 1), ("garden_herb", 1)],
        ),
        needs(
            recipe("game_roast", "Game Roast", Main, 55, 60.0, 12.0, (0.7, 0.35, 0.25), true, Regional),
            &[("game_meat", 1), ("sweet_root", 1)],
        ),
        needs(
            recipe("crystal_sorbet", "Crystal Sorbet", Dessert, 48, 15.0, 20.0, (0.6, 0.85, 0.95), false, Regional),
            &[("frost_crystal", 1), ("wild_berry", 1)],
        ),
        needs(
            recipe("storm_curry", "Storm Curry", Main, 90, 70.0, 18.0, (0.5, 0.4, 0.8), false, Legendary),
            &[("storm_pepper", 1), ("game_meat", 1), ("ancient_preserve", 1)],
        ),
        needs(
            recipe("phoenix_tart", "Phoenix Tart", Dessert, 120, 40.0, 30.0, (1.0, 0.5, 0.2), true, Legendary),
            &[("phoenix_feather", 1), ("honeycomb", 1), ("wild_grain", 1)],
        ),
        // --- Festival dishes ---
        seasonal(needs(
            recipe("blossom_tea", "Blossom Tea", Beverage, 18, 6.0, 16.0, (0.95, 0.7, 0.8), false, Unknown),
            &[("honey_blossom", 1), ("mint", 1)],
        )),
        seasonal(needs(
            recipe("starlight_sorbet", "Starlight Sorbet", Dessert, 30, 12.0, 22.0, (0.75, 0.7, 0.95), false, Unknown),
            &[("wild_berry", 2), ("honeycomb", 1)],
        )),
        seasonal(needs(
            recipe("lantern_cake", "Lantern Cake", Dessert, 28, 24.0, 18.0, (1.0, 0.65, 0.3), true, Unknown),
            &[("wild_grain", 1), ("honeycomb", 1)],
        )),
        seasonal(needs(
            recipe("frost_cocoa", "Frost Cocoa", Beverage, 20, 8.0, 18.0, (0.55, 0.4, 0.35), false, Unknown),
            &[("honeycomb", 1), ("mint", 1)],
        )),
    ]
}

fn festival(
    id: &str,
    name: &str,
    season: Season,
    start_day: u32,
    duration: u32,
    bonuses: FestivalBonuses,
    recipes: &[&str],
) -> FestivalDef {
    FestivalDef {
        id: FestivalId::new(id),
        name: name.to_owned(),
        season,
        start_day,
        duration,
        bonuses,
        recipes: recipes.iter().map(|r| RecipeId::new(*r)).collect(),
    }
}

fn builtin_festivals() -> Vec<FestivalDef> {
    let none = FestivalBonuses::NONE;
    vec![
        festival(
            "dragon_hatching",
            "Dragon Hatching Festival",
            Season::Spring,
            1,
            2,
            FestivalBonuses {
                bond_multiplier: 1.5,
                ..none
            },
            &["blossom_tea"],
        ),
        festival(
            "harvest_moon",
            "Harvest Moon Feast",
            Season::Summer,
            3,
            3,
            FestivalBonuses {
                quality_bonus: 1,
                ..none
            },
            &["starlight_sorbet"],
        ),
        festival(
            "lantern",
            "Lantern Festival",
            Season::Autumn,
            3,
            3,
            FestivalBonuses {
                tip_bonus: 0.25,
                patience_multiplier: 1.2,
                ..none
            },
            &["lantern_cake"],
        ),
        festival(
            "frost_dragon",
            "Frost Dragon Celebration",
            Season::Winter,
            3,
            3,
            FestivalBonuses {
                reputation_multiplier: 1.25,
                ..none
            },
            &["frost_cocoa"],
        ),
    ]
}

fn builtin_achievements() -> Vec<AchievementDef> {
    let achievement = |id: &str, name: &str, rule, reward_gold| AchievementDef {
        id: AchievementId::new(id),
        name: name.to_owned(),
        rule,
        reward_gold,
    };
    let stage = |stage| AchievementRule::StageReached { stage };
    let reputation = |reputation| AchievementRule::ReputationAtLeast { reputation };
    vec![
        achievement("dragon_first_steps", "First Steps", stage(LifeStage::Hatchling), 25),
        achievement("dragon_growing_up", "Growing Up", stage(LifeStage::Juvenile), 50),
        achievement("dragon_coming_of_age", "Coming of Age", stage(LifeStage::Adolescent), 100),
        achievement("dragon_full_grown", "Full Grown", stage(LifeStage::Adult), 200),
        achievement(
            "dragon_best_friends",
            "Best Friends",
            AchievementRule::BondAtLeast { bond: 100.0 },
            150,
        ),
        achievement(
            "cafe_grand_opening",
            "Grand Opening",
            AchievementRule::CustomersServed { count: 1 },
            10,
        ),
        achievement("cafe_rising_star", "Rising Star", reputation(100), 50),
        achievement("cafe_expert_chef", "Expert Chef", reputation(200), 100),
        achievement("cafe_master_chef", "Master Chef", reputation(350), 200),
        achievement("cafe_legendary", "Legendary Cafe", reputation(500), 500),
        achievement(
            "festival_goer",
            "Festival Goer",
            AchievementRule::FestivalsHeld { count: 4 },
            100,
        ),
        achievement(
            "haven_found",
            "Haven Found",
            AchievementRule::ChapterReached {
                chapter: Chapter::Epilogue,
            },
            250,
        ),
    ]
}

fn builtin_pantry() -> Vec<ItemStack> {
    let stock = |item: &str, quantity| ItemStack {
        item: ItemId::new(item),
        quality: Quality::STANDARD,
        quantity,
        days_until_spoil: None,
    };
    vec![
        stock("wild_berry", 12),
        stock("mint", 10),
        stock("garden_herb", 12),
        stock("honey_blossom", 6),
        stock("honeycomb", 6),
        stock("wild_grain", 6),
    ]
}

fn zone(id: &str, name: &str, required_stage: LifeStage) -> ZoneDef {
    ZoneDef {
        id: ZoneId::new(id),
        name: name.to_owned(),
        required_stage,
    }
}

fn builtin_zones() -> Vec<ZoneDef> {
    vec![
        zone("cafe_grounds", "Cafe Grounds", LifeStage::Egg),
        zone("meadow", "Sunlit Meadow", LifeStage::Hatchling),
        zone("forest", "Whispering Forest", LifeStage::Juvenile),
        zone("coast", "Pebble Coast", LifeStage::Juvenile),
        zone("mountain", "Frostpeak Mountain", LifeStage::Adolescent),
        zone("ruins", "Ember Ruins", LifeStage::Adolescent),
        zone("sky_islands", "Sky Islands", LifeStage::Adult),
    ]
}

/// Helper to build a [`SpawnPointDef`].
fn point(
    id: &str,
    zone: &str,
    item: &str,
    kind: IngredientKind,
    rarity: RarityTier,
    required_ability: Option<&str>,
) -> SpawnPointDef {
    SpawnPointDef {
        id: SpawnPointId::new(id),
        zone: ZoneId::new(zone),
        item: ItemId::new(item),
        kind,
        rarity,
        required_ability: required_ability.map(AbilityId::new),
    }
}

fn builtin_spawn_points() -> Vec<SpawnPointDef> {
    use IngredientKind as K;
    use RarityTier::{Common, Legendary, Rare, Uncommon};
    vec![
        // --- Cafe Grounds ---
        point("cg_herb_1", "cafe_grounds", "garden_herb", K::Herb, Common, None),
        point("cg_herb_2", "cafe_grounds", "mint", K::Herb, Common, None),
        point("cg_berry_1", "cafe_grounds", "wild_berry", K::Berry, Common, None),
        point("cg_flower_1", "cafe_grounds", "honey_blossom", K::Flower, Uncommon, None),
        // --- Meadow ---
        point("meadow_honey_1", "meadow", "honeycomb", K::Honey, Uncommon, None),
        point("meadow_grain_1", "meadow", "wild_grain", K::Grain, Common, None),
        point("meadow_root_1", "meadow", "sweet_root", K::Root, Common, Some("burrow_fetch")),
        // --- Forest ---
        point("forest_mushroom_1", "forest", "forest_mushroom", K::Mushroom, Common, None),
        point("forest_truffle_1", "forest", "truffle", K::Mushroom, Rare, Some("sniff_track")),
        point("forest_game_1", "forest", "game_meat", K::Meat, Uncommon, Some("creature_scare")),
        // --- Coast ---
        point("coast_fish_1", "coast", "river_fish", K::Fish, Common, None),
        point("coast_clam_1", "coast", "pearl_clam", K::Fish, Rare, Some("rock_smash")),
        // --- Mountain ---
        point("mountain_crystal_1", "mountain", "frost_crystal", K::Crystal, Rare, Some("rock_smash")),
        point("mountain_storm_1", "mountain", "storm_pepper", K::Storm, Rare, None),
        // --- Ruins ---
        point("ruins_preserve_1", "ruins", "ancient_preserve", K::Preserved, Uncommon, Some("ember_breath")),
        // --- Sky Islands ---
        point("sky_feather_1", "sky_islands", "phoenix_feather", K::Legendary, Legendary, Some("glide")),
    ]
}

fn builtin_staff() -> Vec<StaffDef> {
    let member = |id: &str, name: &str, role, staff_trait| StaffDef {
        id: StaffId::new(id),
        name: name.to_owned(),
        role,
        staff_trait,
    };
    vec![
        member("melody", "Melody", StaffRole::Server, StaffTrait::Enthusiastic),
        member("bruno", "Bruno", StaffRole::Chef, StaffTrait::Skilled),
        member("sage", "Sage", StaffRole::Busser, StaffTrait::Lazy),
    ]
}

/// Helper to build a [`StoryEvent`]. Events after the prologue only fire
/// while the story is in their own chapter.
fn event(
    id: &str,
    chapter: Chapter,
    sequence_order: u32,
    dialogue: Option<&str>,
    conditions: Vec<Condition>,
    outcomes: Vec<Outcome>,
) -> StoryEvent {
    let mut gated = Vec::with_capacity(conditions.len().saturating_add(1));
    if chapter != Chapter::Prologue {
        gated.push(Condition::Chapter { chapter });
    }
    gated.extend(conditions);
    StoryEvent {
        id: EventId::new(id),
        chapter,
        sequence_order,
        dialogue: dialogue.map(str::to_owned),
        conditions: gated,
        outcomes,
        repeatable: false,
    }
}

fn flag(name: &str) -> Outcome {
    Outcome::SetFlag {
        flag: name.to_owned(),
    }
}

#[allow(clippy::too_many_lines)] // One entry per story beat, in chapter order.
fn builtin_story() -> Vec<StoryEvent> {
    let completed = |ids: &[&str]| Condition::EventsCompleted {
        events: ids.iter().map(|id| EventId::new(*id)).collect(),
    };

    let mut rainy_regular = event(
        "rainy_regular",
        Chapter::Chapter1,
        9,
        None,
        vec![
            Condition::Weather {
                weather: Weather::Rainy,
            },
            Condition::TimeOfDay { from: 10.0, to: 14.0 },
        ],
        vec![Outcome::Reputation { delta: 2 }],
    );
    rainy_regular.repeatable = true;

    vec![
        // --- Prologue ---
        event(
            "arrival",
            Chapter::Prologue,
            0,
            None,
            vec![Condition::DayMin { day: 1 }],
            vec![
                flag("arrived"),
                Outcome::NextEvent {
                    event: EventId::new("meet_melody"),
                },
            ],
        ),
        event(
            "meet_melody",
            Chapter::Prologue,
            1,
            Some("prologue_meet_melody"),
            vec![completed(&["arrival"]), Condition::TimeOfDay { from: 8.0, to: 20.0 }],
            vec![
                flag("met_melody"),
                Outcome::Affinity {
                    character: "melody".to_owned(),
                    delta: 5,
                },
            ],
        ),
        event(
            "egg_hatches",
            Chapter::Prologue,
            2,
            Some("prologue_egg_hatches"),
            vec![Condition::StageMin {
                stage: LifeStage::Hatchling,
            }],
            vec![flag("hatched"), Outcome::Gold { amount: 50 }],
        ),
        // --- Chapter 1 ---
        event(
            "first_regular",
            Chapter::Chapter1,
            0,
            Some("chapter1_first_regular"),
            vec![Condition::ReputationMin { reputation: 50 }],
            vec![
                Outcome::UnlockRecipe {
                    recipe: RecipeId::new("honey_cake"),
                },
                Outcome::Affinity {
                    character: "bruno".to_owned(),
                    delta: 3,
                },
            ],
        ),
        event(
            "coast_invitation",
            Chapter::Chapter1,
            1,
            Some("chapter1_coast_invitation"),
            vec![
                Condition::Flag {
                    flag: "met_melody".to_owned(),
                },
                Condition::DayMin { day: 5 },
            ],
            vec![
                Outcome::UnlockZone {
                    zone: ZoneId::new("coast"),
                },
                flag("coast_open"),
            ],
        ),
        rainy_regular,
        // --- Chapter 2 ---
        event(
            "mountain_rumor",
            Chapter::Chapter2,
            0,
            Some("chapter2_mountain_rumor"),
            vec![
                Condition::StageMin {
                    stage: LifeStage::Adolescent,
                },
                Condition::ReputationMin { reputation: 150 },
            ],
            vec![
                flag("heard_rumor"),
                Outcome::NextEvent {
                    event: EventId::new("storm_festival"),
                },
            ],
        ),
        event(
            "storm_festival",
            Chapter::Chapter2,
            1,
            Some("chapter2_storm_festival"),
            vec![
                completed(&["mountain_rumor"]),
                Condition::Weather {
                    weather: Weather::Stormy,
                },
            ],
            vec![
                Outcome::UnlockRecipe {
                    recipe: RecipeId::new("storm_curry"),
                },
                Outcome::Reputation { delta: 10 },
            ],
        ),
        // --- Chapter 3 ---
        event(
            "sky_call",
            Chapter::Chapter3,
            0,
            Some("chapter3_sky_call"),
            vec![Condition::StageMin {
                stage: LifeStage::Adult,
            }],
            vec![
                Outcome::UnlockZone {
                    zone: ZoneId::new("sky_islands"),
                },
                Outcome::SetChapter {
                    chapter: Chapter::Epilogue,
                },
            ],
        ),
        // --- Epilogue ---
        event(
            "haven_found",
            Chapter::Epilogue,
            0,
            Some("epilogue_haven_found"),
            Vec::new(),
            vec![flag("finished"), Outcome::Gold { amount: 500 }],
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn builtin_content_is_valid() {
        let content = GameContent::builtin();
        content.validate().unwrap();
        assert_eq!(content.zones.len(), 7);
        assert_eq!(content.staff.len(), 3);
        assert_eq!(content.abilities.len(), 10);
    }

    #[test]
    fn every_zone_has_something_to_gather() {
        let content = GameContent::builtin();
        for zone in &content.zones {
            assert!(
                content.spawn_points.iter().any(|p| p.zone == zone.id),
                "{} has no spawn points",
                zone.id
            );
        }
    }

    #[test]
    fn starting_menu_covers_every_category() {
        let content = GameContent::builtin();
        for category in OrderCategory::ALL {
            assert!(
                content
                    .recipes
                    .iter()
                    .any(|r| r.category == category && r.unlock_tier == ReputationTier::Unknown)
            );
        }
    }

    #[test]
    fn later_chapters_are_gated_on_their_chapter() {
        let content = GameContent::builtin();
        for event in content.story.iter().filter(|e| e.chapter != Chapter::Prologue) {
            assert!(
                event.conditions.contains(&Condition::Chapter { chapter: event.chapter }),
                "{} is not gated",
                event.id
            );
        }
    }

    #[test]
    fn spawn_point_in_unknown_zone_is_rejected() {
        let mut content = GameContent::builtin();
        content.spawn_points.push(point("ghost", "nowhere", "dust", IngredientKind::Herb, RarityTier::Common, None));
        assert!(matches!(content.validate(), Err(ContentError::Invalid { .. })));
    }

    #[test]
    fn unknown_required_ability_is_rejected() {
        let mut content = GameContent::builtin();
        if let Some(p) = content.spawn_points.first_mut() {
            p.required_ability = Some(AbilityId::new("teleport"));
        }
        assert!(content.validate().is_err());
    }

    #[test]
    fn story_unlocking_unknown_recipe_is_rejected() {
        let mut content = GameContent::builtin();
        content.story.push(event(
            "bad",
            Chapter::Epilogue,
            5,
            None,
            Vec::new(),
            vec![Outcome::UnlockRecipe {
                recipe: RecipeId::new("mystery_stew"),
            }],
        ));
        assert!(content.validate().is_err());
    }

    #[test]
    fn duplicate_staff_is_rejected() {
        let mut content = GameContent::builtin();
        let again = content.staff.first().cloned().unwrap();
        content.staff.push(again);
        assert!(content.validate().is_err());
    }

    #[test]
    fn every_regular_recipe_has_ingredients() {
        let content = GameContent::builtin();
        for recipe in &content.recipes {
            assert!(!recipe.ingredients.is_empty(), "{} has no ingredients", recipe.id);
        }
    }

    #[test]
    fn festivals_fit_the_default_season_and_offer_seasonal_dishes() {
        let content = GameContent::builtin();
        let book = RecipeBook::new(content.recipes.clone()).unwrap();
        let calendar = FestivalCalendar::new(content.festivals.clone(), &book, 7).unwrap();
        assert_eq!(calendar.defs().len(), 4);
        let seasonal: BTreeSet<&RecipeId> = content.recipes.iter().filter(|r| r.seasonal).map(|r| &r.id).collect();
        let offered: BTreeSet<&RecipeId> = content.festivals.iter().flat_map(|f| &f.recipes).collect();
        assert_eq!(seasonal, offered);
    }

    #[test]
    fn ingredient_nothing_provides_is_rejected() {
        let mut content = GameContent::builtin();
        if let Some(r) = content.recipes.first_mut() {
            r.ingredients.push(Ingredient {
                item: ItemId::new("unobtainium"),
                quantity: 1,
                min_quality: Quality::MIN,
            });
        }
        let err = content.validate().unwrap_err();
        assert!(matches!(err, ContentError::Invalid { .. }));
    }

    #[test]
    fn pantry_stock_counts_as_a_provider() {
        let mut content = GameContent::builtin();
        if let Some(r) = content.recipes.first_mut() {
            r.ingredients.push(Ingredient {
                item: ItemId::new("sugar"),
                quantity: 1,
                min_quality: Quality::MIN,
            });
        }
        content.starting_pantry.push(ItemStack {
            item: ItemId::new("sugar"),
            quality: Quality::STANDARD,
            quantity: 3,
            days_until_spoil: None,
        });
        content.validate().unwrap();
    }

    #[test]
    fn duplicate_pantry_stack_is_rejected() {
        let mut content = GameContent::builtin();
        let again = content.starting_pantry.first().cloned().unwrap();
        content.starting_pantry.push(again);
        assert!(content.validate().is_err());
    }

    #[test]
    fn duplicate_achievement_is_rejected() {
        let mut content = GameContent::builtin();
        let again = content.achievements.first().cloned().unwrap();
        content.achievements.push(again);
        assert!(content.validate().is_err());
    }

    #[test]
    fn two_festivals_in_one_season_are_rejected() {
        let mut content = GameContent::builtin();
        let mut again = content.festivals.first().cloned().unwrap();
        again.id = FestivalId::new("encore");
        content.festivals.push(again);
        assert!(matches!(content.validate(), Err(ContentError::Recipes { .. })));
    }

    #[test]
    fn content_parses_from_yaml() {
        let yaml = r"
zones:
  - id: home
    name: Home
    required_stage: egg
spawn_points:
  - id: home_herb
    zone: home
    item: garden_herb
    kind: herb
    rarity: common
recipes:
  - id: tea
    name: Tea
    category: beverage
    base_price: 5
    hunger_value: 2
    color_influence: { r: 0.5, g: 0.5, b: 0.5 }
story:
  - id: hello
    outcomes:
      - type: set_flag
        flag: greeted
";
        let content = GameContent::from_yaml(yaml).unwrap();
        assert_eq!(content.zones.len(), 1);
        assert_eq!(content.story.len(), 1);
        assert!(content.abilities.is_empty());
    }
}
