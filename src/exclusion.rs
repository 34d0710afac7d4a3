//! # Exclusion Resolver Module
//!
//! Applies the household's ingredient exclusion list to recipes. Whether an
//! excluded ingredient is replaceable inside a specific recipe is decided
//! by the `SubstitutionClassifier` collaborator; calls are expensive, so
//! decisions are memoized per (normalized ingredient, recipe id) and
//! concurrent resolutions of the same key are collapsed into a single
//! classification call.
//!
//! Classifier failures are never cached. The affected recipe is dropped
//! from the current run and the next run retries the classification.

use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use crate::model::{Recipe, RecipeId, ReplacementDecision};
use crate::normalize::normalize_name;
use crate::sources::SubstitutionClassifier;

type CacheKey = (String, RecipeId);

/// How an exclusion check left a recipe
#[derive(Debug, Clone, PartialEq)]
pub enum ExclusionOutcome {
    /// No non-replaceable excluded ingredient; replaceable ones are mapped
    /// to their suggested alternatives
    Allowed {
        substitutions: BTreeMap<String, Vec<String>>,
    },
    /// Contains an excluded ingredient with no replacement
    Blocked { ingredient: String },
}

/// Memoizing, single-flight wrapper around the substitution classifier
pub struct ExclusionResolver {
    classifier: Arc<dyn SubstitutionClassifier>,
    cache: Mutex<BTreeMap<CacheKey, ReplacementDecision>>,
    in_flight: Mutex<HashMap<CacheKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl ExclusionResolver {
    pub fn new(classifier: Arc<dyn SubstitutionClassifier>) -> Self {
        Self {
            classifier,
            cache: Mutex::new(BTreeMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Decide replaceability of an excluded ingredient within a recipe
    ///
    /// Returns the cached decision when present. Otherwise exactly one
    /// caller issues the classification while concurrent callers for the
    /// same key await it and then read the cache.
    pub async fn resolve(
        &self,
        ingredient: &str,
        recipe: &Recipe,
    ) -> anyhow::Result<ReplacementDecision> {
        let key: CacheKey = (normalize_name(ingredient), recipe.id.clone());

        if let Some(decision) = self.cached(&key) {
            return Ok(decision);
        }

        let gate = {
            let mut in_flight = self.in_flight.lock().unwrap();
            in_flight
                .entry(key.clone())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        let _guard = gate.lock().await;

        // A concurrent resolution may have landed while we waited
        if let Some(decision) = self.cached(&key) {
            return Ok(decision);
        }

        debug!(
            "Classifying replaceability of '{}' in recipe '{}'",
            key.0, recipe.title
        );
        let decision = self.classifier.classify(&key.0, recipe).await?;

        self.cache
            .lock()
            .unwrap()
            .insert(key.clone(), decision.clone());
        self.in_flight.lock().unwrap().remove(&key);

        Ok(decision)
    }

    /// Apply the binary exclusion policy to one recipe
    ///
    /// Any excluded ingredient present and not replaceable blocks the
    /// recipe. Replaceable ones keep it in play, annotated with their
    /// alternatives.
    pub async fn check_recipe(
        &self,
        recipe: &Recipe,
        excluded: &BTreeSet<String>,
    ) -> anyhow::Result<ExclusionOutcome> {
        let mut substitutions = BTreeMap::new();

        let mut present: Vec<&str> = recipe
            .ingredients
            .iter()
            .map(|e| e.name.as_str())
            .filter(|n| excluded.contains(*n))
            .collect();
        present.sort_unstable();
        present.dedup();

        for ingredient in present {
            let decision = self.resolve(ingredient, recipe).await?;
            if !decision.replaceable {
                warn!(
                    "Recipe '{}' blocked: '{}' has no replacement",
                    recipe.title, ingredient
                );
                return Ok(ExclusionOutcome::Blocked {
                    ingredient: ingredient.to_string(),
                });
            }
            substitutions.insert(ingredient.to_string(), decision.alternatives);
        }

        Ok(ExclusionOutcome::Allowed { substitutions })
    }

    /// Drop all cached decisions for one ingredient
    ///
    /// Called when the ingredient leaves the exclusion list; decisions for
    /// other ingredients stay valid.
    pub fn invalidate(&self, ingredient: &str) {
        let name = normalize_name(ingredient);
        let mut cache = self.cache.lock().unwrap();
        let before = cache.len();
        cache.retain(|(cached, _), _| *cached != name);
        debug!(
            "Invalidated {} cached decisions for '{name}'",
            before - cache.len()
        );
    }

    fn cached(&self, key: &CacheKey) -> Option<ReplacementDecision> {
        self.cache.lock().unwrap().get(key).cloned()
    }
}
