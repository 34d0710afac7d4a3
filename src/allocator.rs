//! # Hybrid Allocator Module
//!
//! Fills the week's slots from two candidate pools: favorites drawn from
//! cook history and newly scouted recipes. The allocator aims for a 60/40
//! favorites-to-new split, decided per slot by score margin so favorites
//! land where they are strongest and new recipes where the favorites are
//! weak.
//!
//! ## Run shape
//!
//! 1. Group occupied slots into effort buckets by the profile's dominant
//!    class (at most three searches per source)
//! 2. Query both sources per bucket, degrading on failure
//! 3. Shortlist the ten best preliminary new candidates, fetch details and
//!    run exclusion checks for the shortlist only
//! 4. Assign top picks by margin, then attach up to four ranked
//!    alternatives per slot
//!
//! The run is deterministic for identical inputs and completes partially
//! when sources fail: empty slots are a logged degradation, not an error.

use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use std::collections::{BTreeMap, BTreeSet};

use crate::availability::AvailabilityIndex;
use crate::error::PlanError;
use crate::exclusion::{ExclusionOutcome, ExclusionResolver};
use crate::model::{
    EffortClass, Provenance, Recipe, RecipeId, ScoredCandidate, SlotKey, WeeklyPlan,
    WeeklyPlanSlot,
};
use crate::profile::PreferenceProfile;
use crate::scoring::{compare_candidates, score, ScoreOutcome, ScoringContext};
use crate::sources::{DetailFetcher, RecipeSource, SearchConstraints};

/// Share of occupied slots topped by a favorite
const FAVORITE_SHARE: f64 = 0.6;

/// New candidates that get details fetched and a definitive re-score
const DETAIL_SHORTLIST: usize = 10;

/// Candidates kept per slot (top pick plus alternatives)
const MAX_CANDIDATES_PER_SLOT: usize = 5;

/// Profile ingredients passed to searches as preferences
const PREFERRED_INGREDIENT_COUNT: usize = 5;

/// Inputs for one plan generation run
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    /// Monday of the week being planned
    pub week_start: NaiveDate,
    /// Slots the household does not cook; excluded from allocation and
    /// from the favorites-share base
    pub skipped_slots: BTreeSet<SlotKey>,
}

impl PlanRequest {
    pub fn new(week_start: NaiveDate) -> Self {
        Self {
            week_start,
            skipped_slots: BTreeSet::new(),
        }
    }

    pub fn with_skipped(mut self, slot: SlotKey) -> Self {
        self.skipped_slots.insert(slot);
        self
    }
}

/// Hybrid favorites/new allocator over the collaborator seams
pub struct Allocator<'a> {
    pub favorites: &'a dyn RecipeSource,
    pub scout: &'a dyn RecipeSource,
    pub details: &'a dyn DetailFetcher,
    pub resolver: &'a ExclusionResolver,
}

impl Allocator<'_> {
    /// Run a full allocation and produce the weekly plan record
    pub async fn allocate(
        &self,
        request: &PlanRequest,
        profile: &PreferenceProfile,
        availability: &AvailabilityIndex,
        ratings: &BTreeMap<RecipeId, u8>,
        excluded: &BTreeSet<String>,
    ) -> WeeklyPlan {
        let occupied: Vec<SlotKey> = SlotKey::week()
            .into_iter()
            .filter(|k| !request.skipped_slots.contains(k))
            .collect();

        let buckets = bucket_by_effort(&occupied, profile);
        info!(
            "Allocating {} slots across {} effort buckets",
            occupied.len(),
            buckets.len()
        );

        let (favorite_pool, new_pool) = self.gather_candidates(&buckets, profile).await;

        let mut blocked: BTreeSet<RecipeId> = BTreeSet::new();
        let mut substitutions: BTreeMap<RecipeId, BTreeMap<String, Vec<String>>> =
            BTreeMap::new();

        let favorite_pool = self
            .apply_exclusions(favorite_pool, excluded, &mut blocked, &mut substitutions)
            .await;

        let new_pool = self
            .shortlist_and_detail(
                new_pool,
                &occupied,
                profile,
                availability,
                ratings,
                excluded,
                &mut blocked,
                &mut substitutions,
            )
            .await;

        let ctx = ScoringContext {
            profile,
            availability,
            ratings,
            blocked: &blocked,
        };

        self.assign_slots(
            request,
            &occupied,
            &favorite_pool,
            &new_pool,
            &ctx,
            &substitutions,
        )
    }

    /// Query both sources per bucket, degrading per failed call
    async fn gather_candidates(
        &self,
        buckets: &BTreeMap<EffortClass, Vec<SlotKey>>,
        profile: &PreferenceProfile,
    ) -> (Vec<Recipe>, Vec<Recipe>) {
        let preferred = profile.top_ingredients(PREFERRED_INGREDIENT_COUNT);

        let mut favorites: Vec<Recipe> = Vec::new();
        let mut news: Vec<Recipe> = Vec::new();
        let mut seen: BTreeSet<RecipeId> = BTreeSet::new();

        for class in buckets.keys().copied() {
            let constraints = SearchConstraints::for_class(class, preferred.clone());

            match self.favorites.search(class, &constraints).await {
                Ok(results) => {
                    for mut recipe in results {
                        recipe.provenance = Provenance::Favorite;
                        if seen.insert(recipe.id.clone()) {
                            favorites.push(recipe);
                        }
                    }
                }
                Err(e) => warn!("Favorites search failed for {class} bucket: {e:#}"),
            }

            match self.scout.search(class, &constraints).await {
                Ok(results) => {
                    for mut recipe in results {
                        recipe.provenance = Provenance::New;
                        if seen.insert(recipe.id.clone()) {
                            news.push(recipe);
                        }
                    }
                }
                Err(e) => warn!("Scouting search failed for {class} bucket: {e:#}"),
            }
        }

        favorites.sort_by(|a, b| a.id.cmp(&b.id));
        news.sort_by(|a, b| a.id.cmp(&b.id));
        debug!(
            "Gathered {} favorite and {} new candidates",
            favorites.len(),
            news.len()
        );
        (favorites, news)
    }

    /// Run exclusion checks over detailed recipes, filling the blocked set
    /// and the substitution annotations. Classification failures drop the
    /// affected recipe from the run.
    async fn apply_exclusions(
        &self,
        pool: Vec<Recipe>,
        excluded: &BTreeSet<String>,
        blocked: &mut BTreeSet<RecipeId>,
        substitutions: &mut BTreeMap<RecipeId, BTreeMap<String, Vec<String>>>,
    ) -> Vec<Recipe> {
        let mut kept = Vec::with_capacity(pool.len());
        for recipe in pool {
            match self.resolver.check_recipe(&recipe, excluded).await {
                Ok(ExclusionOutcome::Allowed { substitutions: subs }) => {
                    if !subs.is_empty() {
                        substitutions.insert(recipe.id.clone(), subs);
                    }
                    kept.push(recipe);
                }
                Ok(ExclusionOutcome::Blocked { ingredient }) => {
                    debug!("Recipe '{}' blocked on '{ingredient}'", recipe.title);
                    blocked.insert(recipe.id.clone());
                }
                Err(e) => {
                    warn!(
                        "Dropping recipe '{}' from this run, classification failed: {e:#}",
                        recipe.title
                    );
                }
            }
        }
        kept
    }

    /// Keep the ten best preliminary new candidates, fetch their details
    /// and run exclusion checks; the rest never get a detail fetch
    #[allow(clippy::too_many_arguments)]
    async fn shortlist_and_detail(
        &self,
        pool: Vec<Recipe>,
        occupied: &[SlotKey],
        profile: &PreferenceProfile,
        availability: &AvailabilityIndex,
        ratings: &BTreeMap<RecipeId, u8>,
        excluded: &BTreeSet<String>,
        blocked: &mut BTreeSet<RecipeId>,
        substitutions: &mut BTreeMap<RecipeId, BTreeMap<String, Vec<String>>>,
    ) -> Vec<Recipe> {
        let empty_blocked = BTreeSet::new();
        let ctx = ScoringContext {
            profile,
            availability,
            ratings,
            blocked: &empty_blocked,
        };

        // Preliminary score: the candidate's best slot this week
        let mut ranked: Vec<(f64, Recipe)> = pool
            .into_iter()
            .filter_map(|recipe| {
                let best = occupied
                    .iter()
                    .filter_map(|slot| score(&recipe, *slot, &ctx).composite())
                    .fold(None::<f64>, |acc, s| Some(acc.map_or(s, |a| a.max(s))));
                best.map(|s| (s, recipe))
            })
            .collect();
        ranked.sort_by(|(sa, ra), (sb, rb)| {
            sb.partial_cmp(sa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| ra.id.cmp(&rb.id))
        });

        let mut detailed = Vec::new();
        for (_, recipe) in ranked.into_iter().take(DETAIL_SHORTLIST) {
            let recipe = if recipe.has_details() {
                recipe
            } else {
                match self.details.fetch_details(&recipe).await {
                    Ok(full) => full,
                    Err(e) => {
                        warn!(
                            "Dropping candidate '{}', detail fetch failed: {e:#}",
                            recipe.title
                        );
                        continue;
                    }
                }
            };
            detailed.push(recipe);
        }

        self.apply_exclusions(detailed, excluded, blocked, substitutions)
            .await
    }

    /// Assign top picks by favorite-vs-new margin and attach alternatives
    fn assign_slots(
        &self,
        request: &PlanRequest,
        occupied: &[SlotKey],
        favorite_pool: &[Recipe],
        new_pool: &[Recipe],
        ctx: &ScoringContext<'_>,
        substitutions: &BTreeMap<RecipeId, BTreeMap<String, Vec<String>>>,
    ) -> WeeklyPlan {
        // Per-slot ranked candidates, split by provenance
        let mut per_slot: BTreeMap<SlotKey, (Vec<ScoredCandidate>, Vec<ScoredCandidate>)> =
            BTreeMap::new();
        for slot in occupied {
            let rank = |pool: &[Recipe]| -> Vec<ScoredCandidate> {
                let mut scored: Vec<ScoredCandidate> = pool
                    .iter()
                    .filter_map(|recipe| match score(recipe, *slot, ctx) {
                        ScoreOutcome::Scored(b) => Some(ScoredCandidate {
                            recipe: recipe.clone(),
                            score: b.composite,
                            substitutions: substitutions
                                .get(&recipe.id)
                                .cloned()
                                .unwrap_or_default(),
                        }),
                        ScoreOutcome::Excluded(_) => None,
                    })
                    .collect();
                scored.sort_by(compare_candidates);
                scored
            };
            per_slot.insert(*slot, (rank(favorite_pool), rank(new_pool)));
        }

        // Margin = how much stronger the best favorite is than the best new
        // candidate; favorites go where the margin is largest
        let mut ordered: Vec<(usize, SlotKey, f64)> = occupied
            .iter()
            .enumerate()
            .map(|(i, slot)| {
                let (favs, news) = &per_slot[slot];
                let best_fav = favs.first().map(|c| c.score).unwrap_or(f64::MIN);
                let best_new = news.first().map(|c| c.score).unwrap_or(f64::MIN);
                (i, *slot, best_fav - best_new)
            })
            .collect();
        ordered.sort_by(|(ia, _, ma), (ib, _, mb)| {
            mb.partial_cmp(ma)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| ia.cmp(ib))
        });

        let favorite_target = (FAVORITE_SHARE * occupied.len() as f64).round() as usize;

        let mut used: BTreeSet<RecipeId> = BTreeSet::new();
        let mut top_picks: BTreeMap<SlotKey, ScoredCandidate> = BTreeMap::new();

        for (rank, (_, slot, _)) in ordered.iter().enumerate() {
            let (favs, news) = &per_slot[slot];
            let prefer_favorite = rank < favorite_target;

            let pick_from = |pool: &[ScoredCandidate], used: &BTreeSet<RecipeId>| {
                pool.iter().find(|c| !used.contains(&c.recipe.id)).cloned()
            };

            let (primary, fallback) = if prefer_favorite {
                (favs, news)
            } else {
                (news, favs)
            };
            let pick = pick_from(primary, &used).or_else(|| pick_from(fallback, &used));

            match pick {
                Some(candidate) => {
                    used.insert(candidate.recipe.id.clone());
                    top_picks.insert(*slot, candidate);
                }
                None => {
                    warn!("{}, leaving the slot empty", PlanError::NoCandidatesFound(*slot));
                }
            }
        }

        let mut favorites_count = 0;
        let mut new_count = 0;
        let mut slots = Vec::with_capacity(14);
        for key in SlotKey::week() {
            let mut slot = WeeklyPlanSlot::empty(key);
            if let Some(top) = top_picks.get(&key) {
                match top.recipe.provenance {
                    Provenance::Favorite => favorites_count += 1,
                    Provenance::New => new_count += 1,
                }

                let mut candidates = vec![top.clone()];
                if let Some((favs, news)) = per_slot.get(&key) {
                    let mut rest: Vec<ScoredCandidate> = favs
                        .iter()
                        .chain(news.iter())
                        .filter(|c| !used.contains(&c.recipe.id))
                        .cloned()
                        .collect();
                    rest.sort_by(compare_candidates);
                    candidates.extend(
                        rest.into_iter()
                            .take(MAX_CANDIDATES_PER_SLOT - 1),
                    );
                }
                slot.candidates = candidates;
            }
            slots.push(slot);
        }

        info!(
            "Allocation complete: {favorites_count} favorite and {new_count} new top picks, {} empty slots",
            occupied.len() - favorites_count - new_count
        );

        WeeklyPlan {
            week_start: request.week_start,
            generated_at: Utc::now(),
            slots,
            groups: Vec::new(),
            favorites_count,
            new_count,
        }
    }
}

/// Group slots by the profile's dominant effort class, defaulting to
/// Normal where the profile has no signal. At most three buckets.
fn bucket_by_effort(
    slots: &[SlotKey],
    profile: &PreferenceProfile,
) -> BTreeMap<EffortClass, Vec<SlotKey>> {
    let mut buckets: BTreeMap<EffortClass, Vec<SlotKey>> = BTreeMap::new();
    for slot in slots {
        let class = profile.dominant_effort(*slot).unwrap_or(EffortClass::Normal);
        buckets.entry(class).or_default().push(*slot);
    }
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{SlotType, Weekday};

    #[test]
    fn test_bucket_fallback_is_normal() {
        let profile = PreferenceProfile::uniform();
        let slots = SlotKey::week();
        let buckets = bucket_by_effort(&slots, &profile);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[&EffortClass::Normal].len(), 14);
    }

    #[test]
    fn test_plan_request_skips() {
        let request = PlanRequest::new(NaiveDate::from_ymd_opt(2026, 8, 17).unwrap())
            .with_skipped(SlotKey::new(Weekday::Monday, SlotType::Lunch));
        assert_eq!(request.skipped_slots.len(), 1);
    }
}
