//! # Meal Plan Engine Module
//!
//! The façade over the whole planning pipeline. Owns the collaborator
//! handles and the mutable household context (ratings, exclusions, the
//! committed plan, household size) and exposes the user-facing operations:
//! plan generation, candidate selection, multi-day grouping, rating,
//! exclusion management and shopping lists.
//!
//! Generation runs are exclusive: a request arriving while a run is in
//! flight is rejected with `GenerationInProgress` rather than queued. The
//! committed plan is replaced wholesale, never patched.

use chrono::Utc;
use log::{info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};

use crate::allocator::{Allocator, PlanRequest};
use crate::availability::AvailabilityIndex;
use crate::error::PlanError;
use crate::exclusion::{ExclusionOutcome, ExclusionResolver};
use crate::model::{
    RecipeId, ShoppingList, SlotKey, SlotType, SplitShoppingList, Weekday, WeeklyPlan,
};
use crate::multi_day;
use crate::normalize::normalize_name;
use crate::profile::PreferenceProfile;
use crate::shopping;
use crate::sources::{
    AvailabilitySource, DetailFetcher, MealHistorySource, RecipeSource,
    SubstitutionClassifier,
};

const DEFAULT_HOUSEHOLD_SIZE: u32 = 2;

/// Mutable household context behind the engine
struct EngineState {
    profile: Option<PreferenceProfile>,
    ratings: BTreeMap<RecipeId, u8>,
    excluded: BTreeSet<String>,
    plan: Option<WeeklyPlan>,
    availability: AvailabilityIndex,
    household_size: u32,
}

/// Façade over profile building, allocation and list aggregation
pub struct MealPlanEngine {
    history: Arc<dyn MealHistorySource>,
    favorites: Arc<dyn RecipeSource>,
    scout: Arc<dyn RecipeSource>,
    details: Arc<dyn DetailFetcher>,
    availability_source: Arc<dyn AvailabilitySource>,
    resolver: ExclusionResolver,
    /// Held for the duration of a generation run; try-locked, never queued
    run_guard: tokio::sync::Mutex<()>,
    state: Mutex<EngineState>,
}

impl MealPlanEngine {
    pub fn new(
        history: Arc<dyn MealHistorySource>,
        favorites: Arc<dyn RecipeSource>,
        scout: Arc<dyn RecipeSource>,
        details: Arc<dyn DetailFetcher>,
        classifier: Arc<dyn SubstitutionClassifier>,
        availability_source: Arc<dyn AvailabilitySource>,
    ) -> Self {
        Self {
            history,
            favorites,
            scout,
            details,
            availability_source,
            resolver: ExclusionResolver::new(classifier),
            run_guard: tokio::sync::Mutex::new(()),
            state: Mutex::new(EngineState {
                profile: None,
                ratings: BTreeMap::new(),
                excluded: BTreeSet::new(),
                plan: None,
                availability: AvailabilityIndex::default(),
                household_size: DEFAULT_HOUSEHOLD_SIZE,
            }),
        }
    }

    pub fn with_household_size(self, household_size: u32) -> Self {
        self.state.lock().unwrap().household_size = household_size;
        self
    }

    /// Generate and commit a fresh weekly plan
    ///
    /// Rebuilds the preference profile when absent or older than seven
    /// days, degrading to the uniform profile if history cannot be loaded.
    /// A second call while a run is in flight fails with
    /// `GenerationInProgress`.
    pub async fn generate_plan(&self, request: PlanRequest) -> Result<WeeklyPlan, PlanError> {
        let _run = self
            .run_guard
            .try_lock()
            .map_err(|_| PlanError::GenerationInProgress)?;

        info!("Generating weekly plan for week of {}", request.week_start);

        let profile = self.current_or_rebuilt_profile().await;

        let availability = match self.availability_source.load().await {
            Ok(records) => AvailabilityIndex::new(records),
            Err(e) => {
                warn!("Availability data unavailable, continuing without: {e:#}");
                AvailabilityIndex::default()
            }
        };

        let (ratings, excluded) = {
            let state = self.state.lock().unwrap();
            (state.ratings.clone(), state.excluded.clone())
        };

        let allocator = Allocator {
            favorites: &*self.favorites,
            scout: &*self.scout,
            details: &*self.details,
            resolver: &self.resolver,
        };
        let plan = allocator
            .allocate(&request, &profile, &availability, &ratings, &excluded)
            .await;

        let mut state = self.state.lock().unwrap();
        state.profile = Some(profile);
        state.availability = availability;
        state.plan = Some(plan.clone());
        Ok(plan)
    }

    /// Promote an alternative to the slot's selected recipe
    ///
    /// Rejected on reuse slots, on indices beyond the alternatives list and
    /// when the chosen recipe carries a non-replaceable excluded
    /// ingredient (cached decisions are reused for the re-check).
    pub async fn select(
        &self,
        weekday: Weekday,
        slot_type: SlotType,
        index: usize,
    ) -> Result<(), PlanError> {
        let key = SlotKey::new(weekday, slot_type);

        let (recipe, excluded) = {
            let state = self.state.lock().unwrap();
            let plan = state.plan.as_ref().ok_or(PlanError::NoPlan)?;
            let slot = plan
                .slot(key)
                .ok_or_else(|| PlanError::InvalidGroupReference(format!("unknown slot {key}")))?;
            if slot.is_reuse {
                return Err(PlanError::InvalidGroupReference(format!(
                    "slot {key} mirrors its group's cook slot"
                )));
            }
            if index >= slot.candidates.len() {
                return Err(PlanError::StaleSelection {
                    requested: index,
                    available: slot.candidates.len(),
                });
            }
            (slot.candidates[index].recipe.clone(), state.excluded.clone())
        };

        match self.resolver.check_recipe(&recipe, &excluded).await {
            Ok(ExclusionOutcome::Blocked { ingredient }) => {
                return Err(PlanError::ExclusionConflict {
                    ingredient,
                    recipe_title: recipe.title,
                });
            }
            Ok(ExclusionOutcome::Allowed { .. }) => {}
            Err(e) => {
                // Without a verdict the selection cannot be admitted
                warn!("Exclusion re-check failed for '{}': {e:#}", recipe.title);
                return Err(PlanError::ExclusionConflict {
                    ingredient: "unknown".to_string(),
                    recipe_title: recipe.title,
                });
            }
        }

        let mut state = self.state.lock().unwrap();
        let plan = state.plan.as_mut().ok_or(PlanError::NoPlan)?;
        let slot = plan
            .slot_mut(key)
            .ok_or_else(|| PlanError::InvalidGroupReference(format!("unknown slot {key}")))?;
        if index >= slot.candidates.len() {
            return Err(PlanError::StaleSelection {
                requested: index,
                available: slot.candidates.len(),
            });
        }
        slot.selected = index;
        info!("Selected candidate {index} for {key}");
        Ok(())
    }

    /// Link reuse slots to a primary cook slot
    pub fn set_multi_day(&self, primary: SlotKey, reuse: &[SlotKey]) -> Result<(), PlanError> {
        let mut state = self.state.lock().unwrap();
        let plan = state.plan.as_mut().ok_or(PlanError::NoPlan)?;
        multi_day::create_group(plan, primary, reuse)
    }

    /// Dissolve the group cooked at `primary`
    pub fn clear_multi_day(&self, primary: SlotKey) -> Result<(), PlanError> {
        let mut state = self.state.lock().unwrap();
        let plan = state.plan.as_mut().ok_or(PlanError::NoPlan)?;
        multi_day::clear_group(plan, primary)
    }

    /// Rate a recipe 1-5 stars; the last write wins
    pub fn rate(&self, recipe_id: &str, stars: u8) -> Result<(), PlanError> {
        if !(1..=5).contains(&stars) {
            return Err(PlanError::InvalidRating(stars));
        }
        self.state
            .lock()
            .unwrap()
            .ratings
            .insert(recipe_id.to_string(), stars);
        Ok(())
    }

    /// Add an ingredient to the exclusion list (normalized)
    pub fn exclude(&self, ingredient: &str) {
        let name = normalize_name(ingredient);
        info!("Excluding ingredient '{name}'");
        self.state.lock().unwrap().excluded.insert(name);
    }

    /// Remove an ingredient from the exclusion list
    ///
    /// Cached replaceability decisions for that ingredient are invalidated;
    /// decisions for other ingredients stay warm.
    pub fn unexclude(&self, ingredient: &str) {
        let name = normalize_name(ingredient);
        info!("Removing exclusion of '{name}'");
        self.state.lock().unwrap().excluded.remove(&name);
        self.resolver.invalidate(&name);
    }

    /// Aggregated shopping list for the committed plan
    pub fn shopping_list(&self) -> Result<ShoppingList, PlanError> {
        let state = self.state.lock().unwrap();
        let plan = state.plan.as_ref().ok_or(PlanError::NoPlan)?;
        Ok(shopping::aggregate(plan, state.household_size))
    }

    /// Shopping list split by store, from the last run's availability data
    pub fn split_shopping_list(&self) -> Result<SplitShoppingList, PlanError> {
        let state = self.state.lock().unwrap();
        let plan = state.plan.as_ref().ok_or(PlanError::NoPlan)?;
        let list = shopping::aggregate(plan, state.household_size);
        Ok(shopping::split_by_store(&list, &state.availability))
    }

    /// The committed plan, if any
    pub fn plan(&self) -> Result<WeeklyPlan, PlanError> {
        self.state
            .lock()
            .unwrap()
            .plan
            .clone()
            .ok_or(PlanError::NoPlan)
    }

    /// The current profile, rebuilt from history when absent or stale
    async fn current_or_rebuilt_profile(&self) -> PreferenceProfile {
        let existing = {
            let state = self.state.lock().unwrap();
            state.profile.clone()
        };
        if let Some(profile) = existing {
            if !profile.is_stale(Utc::now()) {
                return profile;
            }
            info!("Preference profile is stale, rebuilding");
        }

        match self.history.load_history().await {
            Ok(records) => PreferenceProfile::build(&records, Utc::now().date_naive()),
            Err(e) => {
                warn!(
                    "{}",
                    PlanError::ProfileUnavailable(format!("{e:#}; using uniform profile"))
                );
                PreferenceProfile::uniform()
            }
        }
    }
}
