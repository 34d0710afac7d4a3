//! # Collaborator Seams Module
//!
//! Async trait boundaries between the engine and the outside world: meal
//! history storage, the favorites catalogue, the scouting backend, detail
//! fetching, substitutability classification and availability data.
//!
//! Every method returns `anyhow::Result` and every error is contained by
//! the caller: a failing source degrades the affected bucket or candidate,
//! never the whole run. Tests drive the engine through stub
//! implementations of these traits.

use async_trait::async_trait;

use crate::model::{AvailabilityRecord, EffortClass, MealRecord, Recipe, ReplacementDecision};

/// Constraints passed to recipe searches
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchConstraints {
    /// Highest-affinity profile ingredients, best first
    pub preferred_ingredients: Vec<String>,
    /// Upper prep-time bound in minutes, None for unbounded
    pub max_prep_minutes: Option<u32>,
}

impl SearchConstraints {
    pub fn for_class(class: EffortClass, preferred_ingredients: Vec<String>) -> Self {
        Self {
            preferred_ingredients,
            max_prep_minutes: class.max_prep_minutes(),
        }
    }
}

/// Provider of the household's cooked-meal history
#[async_trait]
pub trait MealHistorySource: Send + Sync {
    async fn load_history(&self) -> anyhow::Result<Vec<MealRecord>>;
}

/// A queryable recipe catalogue (favorites storage or scouting backend)
///
/// Results may arrive without ingredient details; the allocator fetches
/// details for shortlisted candidates only.
#[async_trait]
pub trait RecipeSource: Send + Sync {
    async fn search(
        &self,
        class: EffortClass,
        constraints: &SearchConstraints,
    ) -> anyhow::Result<Vec<Recipe>>;
}

/// Loads full ingredient details for a shortlisted candidate
#[async_trait]
pub trait DetailFetcher: Send + Sync {
    async fn fetch_details(&self, recipe: &Recipe) -> anyhow::Result<Recipe>;
}

/// Decides whether an excluded ingredient is replaceable within a recipe
///
/// Calls are expensive; the exclusion resolver memoizes per
/// (ingredient, recipe id) and never issues duplicate concurrent calls.
#[async_trait]
pub trait SubstitutionClassifier: Send + Sync {
    async fn classify(
        &self,
        ingredient: &str,
        recipe: &Recipe,
    ) -> anyhow::Result<ReplacementDecision>;
}

/// Provider of store stocking and seasonality records
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    async fn load(&self) -> anyhow::Result<Vec<AvailabilityRecord>>;
}
