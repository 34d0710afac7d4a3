//! # Shopping List Module
//!
//! Turns a committed weekly plan into an aggregated shopping list. Each
//! cooked recipe contributes once, scaled to the household size and the
//! multi-day multiplier, and contributions are grouped by (normalized
//! name, unit) so "200 g Reis" from two recipes becomes one 400 g line.
//!
//! Quantities are rounded to shoppable granularities per unit; a nonzero
//! contribution never rounds away to zero. The store split resolves each
//! line against the availability index, keeping unmatched lines in an
//! explicit unassigned bucket.

use log::{debug, info};
use std::collections::{BTreeMap, BTreeSet};

use crate::availability::AvailabilityIndex;
use crate::model::{
    RecipeId, ShoppingList, ShoppingListItem, SplitShoppingList, Store, WeeklyPlan,
};

/// Units counted in whole pieces
const COUNT_UNITS: [&str; 12] = [
    "stück",
    "zehe",
    "bund",
    "scheibe",
    "dose",
    "prise",
    "becher",
    "handvoll",
    "messerspitze",
    "zweig",
    "stiel",
    "blatt",
];

/// Shoppable rounding step for a unit
fn granularity(unit: Option<&str>) -> f64 {
    match unit {
        None => 1.0,
        Some("gramm") | Some("milliliter") => 10.0,
        Some("kilogramm") | Some("liter") => 0.1,
        Some("esslöffel") | Some("teelöffel") | Some("tasse") => 0.5,
        Some(u) if COUNT_UNITS.contains(&u) => 1.0,
        Some(_) => 0.1,
    }
}

/// Round a contribution to its unit's granularity
///
/// A nonzero amount never rounds to zero; it bottoms out at one step.
fn round_amount(value: f64, unit: Option<&str>) -> f64 {
    let step = granularity(unit);
    let rounded = (value / step).round() * step;
    let rounded = if rounded <= 0.0 && value > 0.0 {
        step
    } else {
        rounded
    };
    // Trim float noise from fractional steps
    (rounded * 1000.0).round() / 1000.0
}

/// Aggregate the plan's cooked recipes into one shopping list
///
/// Every occupied non-reuse slot contributes its selected recipe exactly
/// once at factor `(household_size / servings) * group multiplier`;
/// recipes without a servings count scale by the multiplier alone.
/// Grouping is order-independent: same name and unit sum into one line,
/// differing units stay separate.
pub fn aggregate(plan: &WeeklyPlan, household_size: u32) -> ShoppingList {
    // (name, unit) -> (quantity, contributing recipe ids)
    let mut lines: BTreeMap<(String, Option<String>), (Option<f64>, BTreeSet<RecipeId>)> =
        BTreeMap::new();
    let mut contributing: BTreeSet<RecipeId> = BTreeSet::new();

    for slot in &plan.slots {
        if slot.is_reuse {
            continue;
        }
        let Some(candidate) = slot.selected_candidate() else {
            continue;
        };
        let recipe = &candidate.recipe;
        contributing.insert(recipe.id.clone());

        let multiplier = plan.multiplier_for_primary(slot.key) as f64;
        let factor = match recipe.servings {
            Some(servings) if servings > 0 => {
                household_size as f64 / servings as f64 * multiplier
            }
            _ => multiplier,
        };

        for entry in &recipe.ingredients {
            if entry.name.is_empty() {
                continue;
            }
            let key = (entry.name.clone(), entry.unit.clone());
            let slot_entry = lines.entry(key).or_insert((None, BTreeSet::new()));
            if let Some(amount) = entry.amount {
                let contribution = round_amount(amount * factor, entry.unit.as_deref());
                *slot_entry.0.get_or_insert(0.0) += contribution;
            }
            slot_entry.1.insert(recipe.id.clone());
        }
    }

    let items: Vec<ShoppingListItem> = lines
        .into_iter()
        .map(|((name, unit), (quantity, recipe_ids))| ShoppingListItem {
            name,
            unit,
            // Sums of rounded contributions can reintroduce float noise
            quantity: quantity.map(|q| (q * 1000.0).round() / 1000.0),
            recipe_ids: recipe_ids.into_iter().collect(),
        })
        .collect();

    info!(
        "Aggregated shopping list: {} items from {} recipes",
        items.len(),
        contributing.len()
    );

    ShoppingList {
        week_start: plan.week_start,
        items,
        recipe_count: contributing.len(),
    }
}

/// Partition a shopping list by store via the availability index
///
/// Items whose name matches no known product (directly, by synonym or by
/// fuzzy match) land in the unassigned bucket rather than being dropped.
pub fn split_by_store(list: &ShoppingList, index: &AvailabilityIndex) -> SplitShoppingList {
    let mut bioland = Vec::new();
    let mut generic = Vec::new();
    let mut unassigned = Vec::new();

    for item in &list.items {
        match index.store_for(&item.name) {
            Some(Store::Bioland) => bioland.push(item.clone()),
            Some(Store::Generic) => generic.push(item.clone()),
            None => {
                debug!("No store match for '{}', keeping it unassigned", item.name);
                unassigned.push(item.clone());
            }
        }
    }

    SplitShoppingList {
        week_start: list.week_start,
        bioland,
        generic,
        unassigned,
    }
}
