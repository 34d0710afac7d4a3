//! # Preference Profile Module
//!
//! This module derives a household taste profile from cooked-meal history.
//! The profile carries two signals:
//!
//! - **Ingredient affinities**: recency-weighted frequencies of normalized
//!   ingredient names, pushed through a saturating transform so a single
//!   staple cannot dominate
//! - **Effort histograms**: per (weekday, slot) tallies of effort classes,
//!   answering "what kind of cooking happens on Tuesday dinners"
//!
//! Profiles are snapshots. A profile older than seven days is stale and is
//! rebuilt before the next plan generation.

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::{EffortClass, MealRecord, SlotKey};

/// Half-life of history influence in days
const RECENCY_HALF_LIFE_DAYS: f64 = 90.0;

/// Ingredients in more than this share of meals carry no signal
const UNIVERSAL_INGREDIENT_SHARE: f64 = 0.7;

/// Profiles older than this are rebuilt
const STALE_AFTER_DAYS: i64 = 7;

/// Effort-class tallies for one (weekday, slot) cell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffortHistogram {
    counts: [u32; 3],
}

impl EffortHistogram {
    pub fn record(&mut self, class: EffortClass) {
        self.counts[class as usize] += 1;
    }

    pub fn count(&self, class: EffortClass) -> u32 {
        self.counts[class as usize]
    }

    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// The dominant effort class, if the histogram carries a strict signal
    ///
    /// Returns None for empty histograms and for all-equal counts. Among
    /// tied maxima the quicker class wins.
    pub fn dominant(&self) -> Option<EffortClass> {
        if self.total() == 0 {
            return None;
        }
        if self.counts[0] == self.counts[1] && self.counts[1] == self.counts[2] {
            return None;
        }
        let max = *self.counts.iter().max().unwrap_or(&0);
        EffortClass::ALL
            .into_iter()
            .find(|c| self.counts[*c as usize] == max)
    }
}

/// Household taste profile derived from meal history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreferenceProfile {
    /// Normalized ingredient name to affinity weight in (0, 1)
    affinities: BTreeMap<String, f64>,
    /// Per-slot effort tallies
    histograms: BTreeMap<SlotKey, EffortHistogram>,
    pub built_at: DateTime<Utc>,
}

impl PreferenceProfile {
    /// Build a profile from meal history
    ///
    /// Each meal contributes `0.5^(age_days / 90)` to the raw weight of
    /// every distinct ingredient it used. Ingredients present in more than
    /// 70% of meals are universal staples and are skipped. Raw weights are
    /// saturated through `w / (w + 1)`.
    ///
    /// # Arguments
    ///
    /// * `history` - Cooked-meal records, any order
    /// * `today` - Reference date for recency weighting
    pub fn build(history: &[MealRecord], today: NaiveDate) -> Self {
        let meal_count = history.len();

        // Count in how many meals each ingredient appears (once per meal)
        let mut presence: BTreeMap<&str, usize> = BTreeMap::new();
        for meal in history {
            let mut seen: Vec<&str> = meal.ingredients.iter().map(|s| s.as_str()).collect();
            seen.sort_unstable();
            seen.dedup();
            for name in seen {
                *presence.entry(name).or_insert(0) += 1;
            }
        }

        let universal_cutoff = UNIVERSAL_INGREDIENT_SHARE * meal_count as f64;

        let mut raw_weights: BTreeMap<String, f64> = BTreeMap::new();
        let mut histograms: BTreeMap<SlotKey, EffortHistogram> = BTreeMap::new();

        for meal in history {
            let age_days = (today - meal.cooked_at).num_days().max(0) as f64;
            let weight = 0.5_f64.powf(age_days / RECENCY_HALF_LIFE_DAYS);

            let mut seen: Vec<&str> = meal.ingredients.iter().map(|s| s.as_str()).collect();
            seen.sort_unstable();
            seen.dedup();
            for name in seen {
                if presence.get(name).copied().unwrap_or(0) as f64 > universal_cutoff {
                    continue;
                }
                *raw_weights.entry(name.to_string()).or_insert(0.0) += weight;
            }

            histograms
                .entry(meal.slot)
                .or_default()
                .record(EffortClass::from_prep_time(meal.prep_time_minutes));
        }

        let affinities: BTreeMap<String, f64> = raw_weights
            .into_iter()
            .map(|(name, w)| (name, w / (w + 1.0)))
            .collect();

        info!(
            "Built preference profile from {} meals: {} ingredient affinities, {} slot histograms",
            meal_count,
            affinities.len(),
            histograms.len()
        );

        Self {
            affinities,
            histograms,
            built_at: Utc::now(),
        }
    }

    /// Assemble a profile from already-computed parts
    ///
    /// Used when restoring a persisted snapshot and by tests that need
    /// exact affinity values.
    pub fn from_parts(
        affinities: BTreeMap<String, f64>,
        histograms: BTreeMap<SlotKey, EffortHistogram>,
    ) -> Self {
        Self {
            affinities,
            histograms,
            built_at: Utc::now(),
        }
    }

    /// Neutral fallback profile used when history is unavailable
    ///
    /// Empty affinities give every candidate the neutral affinity score and
    /// empty histograms give every slot the neutral time fit.
    pub fn uniform() -> Self {
        debug!("Using uniform fallback profile");
        Self {
            affinities: BTreeMap::new(),
            histograms: BTreeMap::new(),
            built_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.affinities.is_empty()
    }

    pub fn affinity(&self, name: &str) -> Option<f64> {
        self.affinities.get(name).copied()
    }

    pub fn affinities(&self) -> &BTreeMap<String, f64> {
        &self.affinities
    }

    /// Dominant effort class for a slot, None without a strict signal
    pub fn dominant_effort(&self, slot: SlotKey) -> Option<EffortClass> {
        self.histograms.get(&slot).and_then(|h| h.dominant())
    }

    /// The highest-affinity ingredient names, for search constraints
    pub fn top_ingredients(&self, limit: usize) -> Vec<String> {
        let mut entries: Vec<(&String, f64)> =
            self.affinities.iter().map(|(n, w)| (n, *w)).collect();
        entries.sort_by(|(na, wa), (nb, wb)| {
            wb.partial_cmp(wa)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| na.cmp(nb))
        });
        entries
            .into_iter()
            .take(limit)
            .map(|(n, _)| n.clone())
            .collect()
    }

    /// Whether the profile should be rebuilt
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        (now - self.built_at).num_days() > STALE_AFTER_DAYS
    }
}
