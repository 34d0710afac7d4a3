#[cfg(test)]
mod tests {
    use mealplanner::availability::AvailabilityIndex;
    use mealplanner::model::{
        AvailabilityRecord, IngredientEntry, Provenance, Recipe, SlotKey, SlotType, Store,
        Weekday,
    };
    use mealplanner::profile::PreferenceProfile;
    use mealplanner::scoring::{score, ScoreOutcome, ScoringContext};
    use std::collections::{BTreeMap, BTreeSet};

    fn slot() -> SlotKey {
        SlotKey::new(Weekday::Wednesday, SlotType::Dinner)
    }

    fn recipe(id: &str, ingredients: &[&str], prep: u32) -> Recipe {
        let mut r = Recipe::new(id, id, Provenance::New).with_prep_time(prep);
        for name in ingredients {
            r = r.with_ingredient(IngredientEntry::new(name, name));
        }
        r
    }

    fn profile_with(affinities: &[(&str, f64)]) -> PreferenceProfile {
        PreferenceProfile::from_parts(
            affinities
                .iter()
                .map(|(n, w)| (n.to_string(), *w))
                .collect(),
            BTreeMap::new(),
        )
    }

    fn composite(
        r: &Recipe,
        profile: &PreferenceProfile,
        index: &AvailabilityIndex,
        ratings: &BTreeMap<String, u8>,
    ) -> Option<f64> {
        let blocked = BTreeSet::new();
        let ctx = ScoringContext {
            profile,
            availability: index,
            ratings,
            blocked: &blocked,
        };
        score(r, slot(), &ctx).composite()
    }

    #[test]
    fn test_strong_affinity_match_scores_high() {
        // The household loves tomatoes and lentils; a recipe built on
        // exactly those two should clear 0.85
        let profile = profile_with(&[("tomate", 0.8), ("linse", 0.6)]);
        let index = AvailabilityIndex::default();
        let ratings = BTreeMap::new();

        let r = recipe("r-1", &["tomate", "linse"], 40);
        let score = composite(&r, &profile, &index, &ratings).unwrap();
        assert!(score > 0.85, "expected > 0.85, got {score}");
    }

    #[test]
    fn test_unknown_ingredients_score_lower() {
        let profile = profile_with(&[("tomate", 0.8), ("linse", 0.6)]);
        let index = AvailabilityIndex::default();
        let ratings = BTreeMap::new();

        let on_profile = composite(&recipe("a", &["tomate", "linse"], 40), &profile, &index, &ratings).unwrap();
        let off_profile = composite(&recipe("b", &["okra", "yuzu"], 40), &profile, &index, &ratings).unwrap();
        assert!(on_profile > off_profile);
    }

    #[test]
    fn test_rating_multipliers() {
        let profile = profile_with(&[("tomate", 0.8)]);
        let index = AvailabilityIndex::default();
        let r = recipe("r-1", &["tomate"], 40);

        let base = composite(&r, &profile, &index, &BTreeMap::new()).unwrap();

        for (stars, multiplier) in [(2u8, 0.85), (3, 1.0), (4, 1.10), (5, 1.20)] {
            let mut ratings = BTreeMap::new();
            ratings.insert("r-1".to_string(), stars);
            let rated = composite(&r, &profile, &index, &ratings).unwrap();
            let expected = (base * multiplier).clamp(0.0, 1.0);
            assert!(
                (rated - expected).abs() < 1e-9,
                "{stars} stars: expected {expected}, got {rated}"
            );
        }
    }

    #[test]
    fn test_one_star_is_a_hard_exclusion() {
        let profile = profile_with(&[("tomate", 0.8)]);
        let index = AvailabilityIndex::default();
        let mut ratings = BTreeMap::new();
        ratings.insert("r-1".to_string(), 1u8);

        let r = recipe("r-1", &["tomate"], 40);
        assert_eq!(composite(&r, &profile, &index, &ratings), None);
    }

    #[test]
    fn test_score_stays_in_unit_interval() {
        // Five stars on a perfect match must still clamp at 1.0
        let profile = profile_with(&[("tomate", 0.9)]);
        let index = AvailabilityIndex::default();
        let mut ratings = BTreeMap::new();
        ratings.insert("r-1".to_string(), 5u8);

        let r = recipe("r-1", &["tomate"], 40);
        let score = composite(&r, &profile, &index, &ratings).unwrap();
        assert!(score <= 1.0);
        assert!(score > 0.0);
    }

    #[test]
    fn test_out_of_season_mains_exclude_recipe() {
        let profile = PreferenceProfile::uniform();
        let index = AvailabilityIndex::new(vec![
            AvailabilityRecord::new("spargel", Store::Bioland, false),
            AvailabilityRecord::new("kürbis", Store::Bioland, false),
        ]);
        let ratings = BTreeMap::new();

        // Both mains known and out of season
        let r = recipe("r-1", &["spargel", "kürbis"], 40);
        assert_eq!(composite(&r, &profile, &index, &ratings), None);

        // An unknown ingredient counts as a year-round staple and keeps
        // the recipe alive
        let r = recipe("r-2", &["spargel", "reis"], 40);
        assert!(composite(&r, &profile, &index, &ratings).is_some());
    }

    #[test]
    fn test_availability_fraction_reflected_in_score() {
        let profile = PreferenceProfile::uniform();
        let ratings = BTreeMap::new();
        let full = AvailabilityIndex::new(vec![
            AvailabilityRecord::new("tomate", Store::Bioland, true),
            AvailabilityRecord::new("linse", Store::Generic, true),
        ]);
        let partial = AvailabilityIndex::new(vec![AvailabilityRecord::new(
            "tomate",
            Store::Bioland,
            true,
        )]);

        let r = recipe("r-1", &["tomate", "linse"], 40);
        let with_full = composite(&r, &profile, &full, &ratings).unwrap();
        let with_partial = composite(&r, &profile, &partial, &ratings).unwrap();
        assert!(with_full > with_partial);
    }

    #[test]
    fn test_identical_inputs_identical_scores() {
        let profile = profile_with(&[("tomate", 0.7), ("zwiebel", 0.4)]);
        let index = AvailabilityIndex::default();
        let ratings = BTreeMap::new();
        let r = recipe("r-1", &["tomate", "zwiebel", "reis"], 25);

        let first = composite(&r, &profile, &index, &ratings).unwrap();
        for _ in 0..10 {
            assert_eq!(composite(&r, &profile, &index, &ratings).unwrap(), first);
        }
    }
}
