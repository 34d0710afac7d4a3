//! # Planning Data Model
//!
//! This module defines the data structures shared across the recommendation
//! and allocation engine: recipes with parsed ingredient entries, the weekly
//! plan grid with its 14 slots, multi-day groups, meal history records and
//! availability records.
//!
//! ## Core Concepts
//!
//! - **Recipe**: an immutable value record, normalized at the boundary
//! - **Slot**: one (weekday, meal type) cell of the weekly plan (14 total)
//! - **Effort class**: coarse prep-time bucket (quick / normal / elaborate)
//! - **Provenance**: previously-cooked favorite vs. freshly scouted recipe
//! - **Multi-day group**: a cook slot mirrored by one or more reuse slots
//!
//! ## Usage
//!
//! ```rust
//! use mealplanner::model::{IngredientEntry, Provenance, Recipe};
//!
//! let recipe = Recipe::new("r-1", "Linsensuppe", Provenance::Favorite)
//!     .with_prep_time(25)
//!     .with_servings(2)
//!     .with_ingredient(IngredientEntry::new("linsen", "200 g Linsen").with_amount(200.0, "gramm"));
//!
//! assert_eq!(recipe.effort_class(), mealplanner::model::EffortClass::Quick);
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable recipe identity (database id or source URL)
pub type RecipeId = String;

/// Days of the week, Monday first
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All weekdays in plan order
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        };
        write!(f, "{name}")
    }
}

/// Meal slots during the day
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum SlotType {
    Lunch,
    Dinner,
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotType::Lunch => write!(f, "lunch"),
            SlotType::Dinner => write!(f, "dinner"),
        }
    }
}

/// One (weekday, meal type) cell of the weekly plan
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SlotKey {
    pub weekday: Weekday,
    pub slot_type: SlotType,
}

impl SlotKey {
    pub fn new(weekday: Weekday, slot_type: SlotType) -> Self {
        Self { weekday, slot_type }
    }

    /// All 14 slot keys of a week, in plan order (Monday lunch first)
    pub fn week() -> Vec<SlotKey> {
        let mut keys = Vec::with_capacity(14);
        for weekday in Weekday::ALL {
            keys.push(SlotKey::new(weekday, SlotType::Lunch));
            keys.push(SlotKey::new(weekday, SlotType::Dinner));
        }
        keys
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.weekday, self.slot_type)
    }
}

/// Coarse preparation-effort buckets with fixed boundaries
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum EffortClass {
    /// Up to 30 minutes
    Quick,
    /// Up to 60 minutes
    Normal,
    /// More than 60 minutes
    Elaborate,
}

impl EffortClass {
    pub const ALL: [EffortClass; 3] = [
        EffortClass::Quick,
        EffortClass::Normal,
        EffortClass::Elaborate,
    ];

    /// Classify a prep time in minutes. Unknown prep times count as normal.
    pub fn from_prep_time(prep_time_minutes: Option<u32>) -> Self {
        match prep_time_minutes {
            Some(m) if m <= 30 => EffortClass::Quick,
            Some(m) if m <= 60 => EffortClass::Normal,
            Some(_) => EffortClass::Elaborate,
            None => EffortClass::Normal,
        }
    }

    /// Distance between effort classes (0, 1 or 2), used for time-fit decay
    pub fn distance(self, other: EffortClass) -> u32 {
        (self as i32 - other as i32).unsigned_abs()
    }

    /// Upper prep-time bound in minutes for search constraints
    pub fn max_prep_minutes(self) -> Option<u32> {
        match self {
            EffortClass::Quick => Some(30),
            EffortClass::Normal => Some(60),
            EffortClass::Elaborate => None,
        }
    }
}

impl fmt::Display for EffortClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EffortClass::Quick => write!(f, "quick"),
            EffortClass::Normal => write!(f, "normal"),
            EffortClass::Elaborate => write!(f, "elaborate"),
        }
    }
}

/// Whether a recipe comes from cook history or from scouting
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Provenance {
    /// Previously cooked, drawn from storage
    Favorite,
    /// Freshly scouted, never cooked before
    New,
}

/// Known grocery stores
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Store {
    Bioland,
    Generic,
}

impl fmt::Display for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Store::Bioland => write!(f, "bioland"),
            Store::Generic => write!(f, "generic"),
        }
    }
}

/// One parsed ingredient line of a recipe
///
/// The `name` and `unit` fields are normalized at the boundary (see the
/// `normalize` module); `raw` keeps the original text for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientEntry {
    /// Normalized ingredient name (lowercase, singular, filler-free)
    pub name: String,
    /// Numeric amount, if the line carried one
    pub amount: Option<f64>,
    /// Normalized unit (e.g. "gramm", "esslöffel"), if any
    pub unit: Option<String>,
    /// Original ingredient text as it appeared in the source
    pub raw: String,
    /// Explicitly tagged as essential to the recipe's identity
    pub is_main: bool,
}

impl IngredientEntry {
    pub fn new(name: &str, raw: &str) -> Self {
        Self {
            name: name.to_string(),
            amount: None,
            unit: None,
            raw: raw.to_string(),
            is_main: false,
        }
    }

    pub fn with_amount(mut self, amount: f64, unit: &str) -> Self {
        self.amount = Some(amount);
        self.unit = Some(unit.to_string());
        self
    }

    pub fn main(mut self) -> Self {
        self.is_main = true;
        self
    }
}

/// A recipe as an immutable value record
///
/// Recipes enter the engine already normalized; the engine never branches
/// on source-specific shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    /// Stable identity (database id or source URL)
    pub id: RecipeId,
    pub title: String,
    /// Ordered ingredient entries; may be empty for not-yet-detailed candidates
    pub ingredients: Vec<IngredientEntry>,
    pub prep_time_minutes: Option<u32>,
    pub servings: Option<u32>,
    pub calories: Option<u32>,
    pub provenance: Provenance,
}

impl Recipe {
    pub fn new(id: &str, title: &str, provenance: Provenance) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            ingredients: Vec::new(),
            prep_time_minutes: None,
            servings: None,
            calories: None,
            provenance,
        }
    }

    pub fn with_ingredient(mut self, entry: IngredientEntry) -> Self {
        self.ingredients.push(entry);
        self
    }

    pub fn with_prep_time(mut self, minutes: u32) -> Self {
        self.prep_time_minutes = Some(minutes);
        self
    }

    pub fn with_servings(mut self, servings: u32) -> Self {
        self.servings = Some(servings);
        self
    }

    pub fn with_calories(mut self, calories: u32) -> Self {
        self.calories = Some(calories);
        self
    }

    /// Effort class derived from the prep time
    pub fn effort_class(&self) -> EffortClass {
        EffortClass::from_prep_time(self.prep_time_minutes)
    }

    /// Main ingredients: explicitly tagged entries, otherwise the top three
    /// entries by amount (ties keep recipe order)
    pub fn main_ingredients(&self) -> Vec<&IngredientEntry> {
        let tagged: Vec<&IngredientEntry> =
            self.ingredients.iter().filter(|e| e.is_main).collect();
        if !tagged.is_empty() {
            return tagged;
        }

        let mut indexed: Vec<(usize, &IngredientEntry)> =
            self.ingredients.iter().enumerate().collect();
        indexed.sort_by(|(ia, a), (ib, b)| {
            let amount_a = a.amount.unwrap_or(0.0);
            let amount_b = b.amount.unwrap_or(0.0);
            amount_b
                .partial_cmp(&amount_a)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(ia.cmp(ib))
        });
        indexed.into_iter().take(3).map(|(_, e)| e).collect()
    }

    /// Whether full ingredient details have been loaded
    pub fn has_details(&self) -> bool {
        !self.ingredients.is_empty()
    }
}

/// Historical meal entry used for profile building
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealRecord {
    pub slot: SlotKey,
    pub cooked_at: NaiveDate,
    pub prep_time_minutes: Option<u32>,
    /// Normalized ingredient names of the cooked recipe
    pub ingredients: Vec<String>,
}

/// Seasonal and stocking information for one product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    /// Normalized product name
    pub name: String,
    pub store: Store,
    /// Whether the product is in season in the current month
    pub in_season: bool,
    /// Alternate names for the same product
    pub synonyms: Vec<String>,
}

impl AvailabilityRecord {
    pub fn new(name: &str, store: Store, in_season: bool) -> Self {
        Self {
            name: name.to_string(),
            store,
            in_season,
            synonyms: Vec::new(),
        }
    }

    pub fn with_synonym(mut self, synonym: &str) -> Self {
        self.synonyms.push(synonym.to_string());
        self
    }
}

/// Cached outcome of a substitutability classification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplacementDecision {
    pub replaceable: bool,
    /// Suggested alternatives, ordered; empty when not replaceable
    pub alternatives: Vec<String>,
    pub decided_at: DateTime<Utc>,
}

/// A recipe together with its composite score and annotations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub recipe: Recipe,
    /// Composite score in [0, 1]
    pub score: f64,
    /// Excluded-but-replaceable ingredients mapped to their alternatives
    pub substitutions: BTreeMap<String, Vec<String>>,
}

impl fmt::Display for ScoredCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let source = match self.recipe.provenance {
            Provenance::Favorite => "FAV",
            Provenance::New => "NEW",
        };
        write!(f, "[{source}] {} ({:.2})", self.recipe.title, self.score)
    }
}

/// A cook slot linked to reuse slots that mirror its recipe
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiDayGroup {
    pub primary: SlotKey,
    pub reuse: Vec<SlotKey>,
}

impl MultiDayGroup {
    /// Quantity multiplier: one cooking covers the primary plus all reuse days
    pub fn multiplier(&self) -> u32 {
        1 + self.reuse.len() as u32
    }

    pub fn total_days(&self) -> u32 {
        self.multiplier()
    }

    pub fn contains(&self, key: SlotKey) -> bool {
        self.primary == key || self.reuse.contains(&key)
    }
}

/// Display annotation for slots that are part of a multi-day group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiDayInfo {
    pub cook_weekday: Weekday,
    pub eat_weekdays: Vec<Weekday>,
    pub total_days: u32,
    pub multiplier: u32,
}

/// One cell of the weekly plan grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPlanSlot {
    pub key: SlotKey,
    /// Top recipe plus up to four ranked alternatives; empty for unfilled
    /// slots and for reuse slots (which mirror their group's primary)
    pub candidates: Vec<ScoredCandidate>,
    /// Index of the user-selected candidate (default 0)
    pub selected: usize,
    /// Primary slot of the multi-day group this slot belongs to, if any
    pub group: Option<SlotKey>,
    pub is_reuse: bool,
}

impl WeeklyPlanSlot {
    pub fn empty(key: SlotKey) -> Self {
        Self {
            key,
            candidates: Vec::new(),
            selected: 0,
            group: None,
            is_reuse: false,
        }
    }

    /// The selected candidate, if this slot carries its own recipe
    pub fn selected_candidate(&self) -> Option<&ScoredCandidate> {
        if self.is_reuse {
            return None;
        }
        self.candidates.get(self.selected)
    }
}

/// The weekly plan record, replaced wholesale on each generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyPlan {
    /// Key of the persisted record
    pub week_start: NaiveDate,
    pub generated_at: DateTime<Utc>,
    /// The 14 slots in plan order (Monday lunch first)
    pub slots: Vec<WeeklyPlanSlot>,
    pub groups: Vec<MultiDayGroup>,
    /// Slots whose top pick has favorite provenance
    pub favorites_count: usize,
    /// Slots whose top pick is newly scouted
    pub new_count: usize,
}

impl WeeklyPlan {
    pub fn slot(&self, key: SlotKey) -> Option<&WeeklyPlanSlot> {
        self.slots.iter().find(|s| s.key == key)
    }

    pub fn slot_mut(&mut self, key: SlotKey) -> Option<&mut WeeklyPlanSlot> {
        self.slots.iter_mut().find(|s| s.key == key)
    }

    /// The recipe effectively planned for a slot, following reuse slots to
    /// their group's primary
    pub fn recipe_for(&self, key: SlotKey) -> Option<&Recipe> {
        let slot = self.slot(key)?;
        if slot.is_reuse {
            let primary = slot.group?;
            return self
                .slot(primary)?
                .selected_candidate()
                .map(|c| &c.recipe);
        }
        slot.selected_candidate().map(|c| &c.recipe)
    }

    /// The multi-day group owning a slot, if any
    pub fn group_for(&self, key: SlotKey) -> Option<&MultiDayGroup> {
        self.groups.iter().find(|g| g.contains(key))
    }

    /// Display annotation for a grouped slot
    pub fn multi_day_info(&self, key: SlotKey) -> Option<MultiDayInfo> {
        let group = self.group_for(key)?;
        Some(MultiDayInfo {
            cook_weekday: group.primary.weekday,
            eat_weekdays: group.reuse.iter().map(|k| k.weekday).collect(),
            total_days: group.total_days(),
            multiplier: group.multiplier(),
        })
    }

    /// Quantity multiplier contributed by the multi-day group whose primary
    /// is `key` (1 when ungrouped)
    pub fn multiplier_for_primary(&self, key: SlotKey) -> u32 {
        self.groups
            .iter()
            .find(|g| g.primary == key)
            .map(|g| g.multiplier())
            .unwrap_or(1)
    }
}

/// One line of the aggregated shopping list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingListItem {
    /// Normalized ingredient name
    pub name: String,
    /// Normalized unit; items with different units stay separate
    pub unit: Option<String>,
    /// Aggregated quantity; None when no source line carried an amount
    pub quantity: Option<f64>,
    /// Recipes contributing to this line
    pub recipe_ids: Vec<RecipeId>,
}

impl fmt::Display for ShoppingListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.quantity, &self.unit) {
            (Some(q), Some(u)) => write!(f, "{q} {u} {}", self.name),
            (Some(q), None) => write!(f, "{q} {}", self.name),
            _ => write!(f, "{}", self.name),
        }
    }
}

/// Aggregated shopping list for one weekly plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingList {
    pub week_start: NaiveDate,
    pub items: Vec<ShoppingListItem>,
    /// Number of distinct cooked recipes that contributed
    pub recipe_count: usize,
}

/// Shopping list partitioned by store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitShoppingList {
    pub week_start: NaiveDate,
    pub bioland: Vec<ShoppingListItem>,
    pub generic: Vec<ShoppingListItem>,
    /// Items matching no known product; kept rather than dropped
    pub unassigned: Vec<ShoppingListItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effort_class_boundaries() {
        assert_eq!(EffortClass::from_prep_time(Some(15)), EffortClass::Quick);
        assert_eq!(EffortClass::from_prep_time(Some(30)), EffortClass::Quick);
        assert_eq!(EffortClass::from_prep_time(Some(31)), EffortClass::Normal);
        assert_eq!(EffortClass::from_prep_time(Some(60)), EffortClass::Normal);
        assert_eq!(
            EffortClass::from_prep_time(Some(90)),
            EffortClass::Elaborate
        );
        assert_eq!(EffortClass::from_prep_time(None), EffortClass::Normal);
    }

    #[test]
    fn test_effort_class_distance() {
        assert_eq!(EffortClass::Quick.distance(EffortClass::Quick), 0);
        assert_eq!(EffortClass::Quick.distance(EffortClass::Normal), 1);
        assert_eq!(EffortClass::Quick.distance(EffortClass::Elaborate), 2);
        assert_eq!(EffortClass::Elaborate.distance(EffortClass::Normal), 1);
    }

    #[test]
    fn test_week_has_14_slots() {
        let week = SlotKey::week();
        assert_eq!(week.len(), 14);
        assert_eq!(week[0], SlotKey::new(Weekday::Monday, SlotType::Lunch));
        assert_eq!(week[13], SlotKey::new(Weekday::Sunday, SlotType::Dinner));
    }

    #[test]
    fn test_main_ingredients_tagged() {
        let recipe = Recipe::new("r-1", "Gefüllte Paprika", Provenance::Favorite)
            .with_ingredient(IngredientEntry::new("paprika", "4 Paprika").main())
            .with_ingredient(
                IngredientEntry::new("reis", "200 g Reis").with_amount(200.0, "gramm"),
            );

        let mains = recipe.main_ingredients();
        assert_eq!(mains.len(), 1);
        assert_eq!(mains[0].name, "paprika");
    }

    #[test]
    fn test_main_ingredients_top_by_amount() {
        let recipe = Recipe::new("r-2", "Gemüsepfanne", Provenance::New)
            .with_ingredient(IngredientEntry::new("salz", "Salz"))
            .with_ingredient(
                IngredientEntry::new("zucchini", "400 g Zucchini").with_amount(400.0, "gramm"),
            )
            .with_ingredient(
                IngredientEntry::new("reis", "200 g Reis").with_amount(200.0, "gramm"),
            )
            .with_ingredient(
                IngredientEntry::new("paprika", "300 g Paprika").with_amount(300.0, "gramm"),
            );

        let mains = recipe.main_ingredients();
        assert_eq!(mains.len(), 3);
        assert_eq!(mains[0].name, "zucchini");
        assert_eq!(mains[1].name, "paprika");
        assert_eq!(mains[2].name, "reis");
    }

    #[test]
    fn test_multi_day_multiplier() {
        let group = MultiDayGroup {
            primary: SlotKey::new(Weekday::Sunday, SlotType::Dinner),
            reuse: vec![
                SlotKey::new(Weekday::Monday, SlotType::Dinner),
                SlotKey::new(Weekday::Tuesday, SlotType::Dinner),
            ],
        };
        assert_eq!(group.multiplier(), 3);
        assert!(group.contains(SlotKey::new(Weekday::Monday, SlotType::Dinner)));
        assert!(!group.contains(SlotKey::new(Weekday::Friday, SlotType::Lunch)));
    }

    #[test]
    fn test_recipe_for_follows_reuse() {
        let primary_key = SlotKey::new(Weekday::Sunday, SlotType::Dinner);
        let reuse_key = SlotKey::new(Weekday::Monday, SlotType::Dinner);

        let recipe = Recipe::new("r-3", "Lasagne", Provenance::Favorite);
        let mut primary = WeeklyPlanSlot::empty(primary_key);
        primary.candidates.push(ScoredCandidate {
            recipe: recipe.clone(),
            score: 0.9,
            substitutions: BTreeMap::new(),
        });
        primary.group = Some(primary_key);

        let mut reuse = WeeklyPlanSlot::empty(reuse_key);
        reuse.is_reuse = true;
        reuse.group = Some(primary_key);

        let plan = WeeklyPlan {
            week_start: NaiveDate::from_ymd_opt(2026, 8, 17).unwrap(),
            generated_at: Utc::now(),
            slots: vec![primary, reuse],
            groups: vec![MultiDayGroup {
                primary: primary_key,
                reuse: vec![reuse_key],
            }],
            favorites_count: 1,
            new_count: 0,
        };

        assert_eq!(plan.recipe_for(reuse_key).map(|r| r.title.as_str()), Some("Lasagne"));
        assert_eq!(plan.multiplier_for_primary(primary_key), 2);
    }
}
