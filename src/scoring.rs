//! # Recipe Scoring Module
//!
//! Pure scoring of one recipe for one slot. The composite score blends four
//! dimensions:
//!
//! | Dimension        | Weight | Signal                                    |
//! |------------------|--------|-------------------------------------------|
//! | affinity         | 0.40   | cosine vs. the profile's affinity vector   |
//! | time fit         | 0.25   | effort class vs. the slot's dominant class |
//! | availability fit | 0.20   | main ingredients resolvable at a store     |
//! | seasonality fit  | 0.15   | main ingredients obtainable in season      |
//!
//! A star rating scales the blend (2★ dampens, 4★/5★ boost); the result is
//! clamped to [0, 1]. Hard exclusions (1★ ratings, blocked recipes,
//! nothing-obtainable recipes) are filtered here and never reach the
//! candidate lists.

use log::trace;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::availability::AvailabilityIndex;
use crate::model::{Provenance, Recipe, RecipeId, ScoredCandidate, SlotKey};
use crate::profile::PreferenceProfile;

const WEIGHT_AFFINITY: f64 = 0.40;
const WEIGHT_TIME_FIT: f64 = 0.25;
const WEIGHT_AVAILABILITY: f64 = 0.20;
const WEIGHT_SEASONALITY: f64 = 0.15;

/// Neutral value for dimensions with no information
const NEUTRAL: f64 = 0.5;

/// Read-only inputs shared by all score calls of one run
#[derive(Debug, Clone, Copy)]
pub struct ScoringContext<'a> {
    pub profile: &'a PreferenceProfile,
    pub availability: &'a AvailabilityIndex,
    /// Star ratings by recipe id (1-5)
    pub ratings: &'a BTreeMap<RecipeId, u8>,
    /// Recipes blocked by a non-replaceable excluded ingredient
    pub blocked: &'a BTreeSet<RecipeId>,
}

/// Why a recipe was filtered before scoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionReason {
    /// Rated one star
    OneStar,
    /// Contains a non-replaceable excluded ingredient
    BlockedIngredient,
    /// No main ingredient is obtainable at any store this season
    NothingObtainable,
}

/// Per-dimension values behind a composite score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub affinity: f64,
    pub time_fit: f64,
    pub availability_fit: f64,
    pub seasonality_fit: f64,
    pub rating_multiplier: f64,
    /// Final score in [0, 1]
    pub composite: f64,
}

/// Result of scoring one recipe for one slot
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScoreOutcome {
    Scored(ScoreBreakdown),
    Excluded(ExclusionReason),
}

impl ScoreOutcome {
    pub fn composite(&self) -> Option<f64> {
        match self {
            ScoreOutcome::Scored(b) => Some(b.composite),
            ScoreOutcome::Excluded(_) => None,
        }
    }
}

/// Score a recipe for a slot, or report why it is excluded
pub fn score(recipe: &Recipe, slot: SlotKey, ctx: &ScoringContext<'_>) -> ScoreOutcome {
    if ctx.ratings.get(&recipe.id) == Some(&1) {
        return ScoreOutcome::Excluded(ExclusionReason::OneStar);
    }
    if ctx.blocked.contains(&recipe.id) {
        return ScoreOutcome::Excluded(ExclusionReason::BlockedIngredient);
    }

    let mains = recipe.main_ingredients();
    if !mains.is_empty() && mains.iter().all(|m| !ctx.availability.obtainable(&m.name)) {
        return ScoreOutcome::Excluded(ExclusionReason::NothingObtainable);
    }

    let affinity = affinity_score(recipe, ctx.profile);
    let time_fit = time_fit_score(recipe, slot, ctx.profile);
    let (availability_fit, seasonality_fit) = availability_scores(recipe, ctx.availability);
    let rating_multiplier = rating_multiplier(ctx.ratings.get(&recipe.id).copied());

    let blend = WEIGHT_AFFINITY * affinity
        + WEIGHT_TIME_FIT * time_fit
        + WEIGHT_AVAILABILITY * availability_fit
        + WEIGHT_SEASONALITY * seasonality_fit;
    let composite = (blend * rating_multiplier).clamp(0.0, 1.0);

    trace!(
        "Scored '{}' for {slot}: affinity {affinity:.3}, time {time_fit:.3}, availability {availability_fit:.3}, seasonality {seasonality_fit:.3}, x{rating_multiplier:.2} -> {composite:.3}",
        recipe.title
    );

    ScoreOutcome::Scored(ScoreBreakdown {
        affinity,
        time_fit,
        availability_fit,
        seasonality_fit,
        rating_multiplier,
        composite,
    })
}

/// Cosine similarity between the recipe's binary ingredient vector and the
/// profile's affinity vector. Neutral 0.5 without information.
fn affinity_score(recipe: &Recipe, profile: &PreferenceProfile) -> f64 {
    if profile.is_empty() {
        return NEUTRAL;
    }
    let mut names: Vec<&str> = recipe
        .ingredients
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    names.sort_unstable();
    names.dedup();
    if names.is_empty() {
        return NEUTRAL;
    }

    let dot: f64 = names
        .iter()
        .filter_map(|n| profile.affinity(n))
        .sum();
    let norm_recipe = (names.len() as f64).sqrt();
    let norm_profile: f64 = profile
        .affinities()
        .values()
        .map(|a| a * a)
        .sum::<f64>()
        .sqrt();
    if norm_profile == 0.0 {
        return NEUTRAL;
    }
    dot / (norm_recipe * norm_profile)
}

/// Decay by distance from the slot's dominant effort class. A slot without
/// a dominant class accepts every effort equally.
fn time_fit_score(recipe: &Recipe, slot: SlotKey, profile: &PreferenceProfile) -> f64 {
    match profile.dominant_effort(slot) {
        None => 1.0,
        Some(dominant) => match dominant.distance(recipe.effort_class()) {
            0 => 1.0,
            1 => 0.6,
            _ => 0.25,
        },
    }
}

/// (availability fit, seasonality fit) over the recipe's main ingredients
fn availability_scores(recipe: &Recipe, index: &AvailabilityIndex) -> (f64, f64) {
    let mains = recipe.main_ingredients();
    if mains.is_empty() {
        return (NEUTRAL, NEUTRAL);
    }
    if index.is_empty() {
        // No availability data, nothing to penalise
        return (1.0, 1.0);
    }
    let total = mains.len() as f64;
    let known = mains.iter().filter(|m| index.lookup(&m.name).is_some()).count() as f64;
    let obtainable = mains.iter().filter(|m| index.obtainable(&m.name)).count() as f64;
    (known / total, obtainable / total)
}

fn rating_multiplier(stars: Option<u8>) -> f64 {
    match stars {
        Some(2) => 0.85,
        Some(4) => 1.10,
        Some(5) => 1.20,
        _ => 1.0,
    }
}

/// Total deterministic candidate order: score descending, favorites before
/// new recipes, shorter prep time first (unknown last), then title and id
pub fn compare_candidates(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| match (a.recipe.provenance, b.recipe.provenance) {
            (Provenance::Favorite, Provenance::New) => Ordering::Less,
            (Provenance::New, Provenance::Favorite) => Ordering::Greater,
            _ => Ordering::Equal,
        })
        .then_with(
            || match (a.recipe.prep_time_minutes, b.recipe.prep_time_minutes) {
                (Some(pa), Some(pb)) => pa.cmp(&pb),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            },
        )
        .then_with(|| a.recipe.title.cmp(&b.recipe.title))
        .then_with(|| a.recipe.id.cmp(&b.recipe.id))
}
