#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Utc};
    use mealplanner::availability::AvailabilityIndex;
    use mealplanner::model::{
        AvailabilityRecord, IngredientEntry, MultiDayGroup, Provenance, Recipe,
        ScoredCandidate, SlotKey, SlotType, Store, Weekday, WeeklyPlan, WeeklyPlanSlot,
    };
    use mealplanner::shopping::{aggregate, split_by_store};
    use std::collections::BTreeMap;

    fn key(weekday: Weekday, slot_type: SlotType) -> SlotKey {
        SlotKey::new(weekday, slot_type)
    }

    fn empty_plan() -> WeeklyPlan {
        WeeklyPlan {
            week_start: NaiveDate::from_ymd_opt(2026, 8, 17).unwrap(),
            generated_at: Utc::now(),
            slots: SlotKey::week().into_iter().map(WeeklyPlanSlot::empty).collect(),
            groups: Vec::new(),
            favorites_count: 0,
            new_count: 0,
        }
    }

    fn place(plan: &mut WeeklyPlan, at: SlotKey, recipe: Recipe) {
        let slot = plan.slot_mut(at).unwrap();
        slot.candidates = vec![ScoredCandidate {
            recipe,
            score: 0.8,
            substitutions: BTreeMap::new(),
        }];
    }

    fn reis_recipe(id: &str, grams: f64, servings: u32) -> Recipe {
        Recipe::new(id, id, Provenance::Favorite)
            .with_servings(servings)
            .with_ingredient(
                IngredientEntry::new("reis", "Reis").with_amount(grams, "gramm"),
            )
    }

    #[test]
    fn test_household_scaling() {
        // 200 g for 2 servings, household of 4 -> 400 g
        let mut plan = empty_plan();
        place(&mut plan, key(Weekday::Monday, SlotType::Dinner), reis_recipe("r", 200.0, 2));

        let list = aggregate(&plan, 4);
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].name, "reis");
        assert_eq!(list.items[0].quantity, Some(400.0));
        assert_eq!(list.recipe_count, 1);
    }

    #[test]
    fn test_same_name_and_unit_sum_into_one_line() {
        let mut plan = empty_plan();
        place(&mut plan, key(Weekday::Monday, SlotType::Dinner), reis_recipe("a", 200.0, 2));
        place(&mut plan, key(Weekday::Tuesday, SlotType::Dinner), reis_recipe("b", 150.0, 2));

        let list = aggregate(&plan, 2);
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].quantity, Some(350.0));
        assert_eq!(list.items[0].recipe_ids, vec!["a", "b"]);
    }

    #[test]
    fn test_different_units_stay_separate() {
        let mut plan = empty_plan();
        let gramm = Recipe::new("a", "a", Provenance::Favorite)
            .with_servings(2)
            .with_ingredient(IngredientEntry::new("tomate", "Tomaten").with_amount(200.0, "gramm"));
        let stueck = Recipe::new("b", "b", Provenance::Favorite)
            .with_servings(2)
            .with_ingredient(IngredientEntry::new("tomate", "Tomaten").with_amount(3.0, "stück"));
        place(&mut plan, key(Weekday::Monday, SlotType::Dinner), gramm);
        place(&mut plan, key(Weekday::Tuesday, SlotType::Dinner), stueck);

        let list = aggregate(&plan, 2);
        assert_eq!(list.items.len(), 2);
        let units: Vec<_> = list.items.iter().map(|i| i.unit.as_deref()).collect();
        assert!(units.contains(&Some("gramm")));
        assert!(units.contains(&Some("stück")));
    }

    #[test]
    fn test_multi_day_recipe_counted_once_with_multiplier() {
        // Lasagne cooked once for three days: quantities triple but the
        // recipe contributes a single time
        let primary = key(Weekday::Sunday, SlotType::Dinner);
        let reuse = vec![
            key(Weekday::Monday, SlotType::Dinner),
            key(Weekday::Tuesday, SlotType::Dinner),
        ];

        let mut plan = empty_plan();
        place(&mut plan, primary, reis_recipe("lasagne", 200.0, 2));
        for k in &reuse {
            let slot = plan.slot_mut(*k).unwrap();
            slot.is_reuse = true;
            slot.group = Some(primary);
        }
        plan.groups.push(MultiDayGroup {
            primary,
            reuse: reuse.clone(),
        });

        let list = aggregate(&plan, 2);
        assert_eq!(list.recipe_count, 1);
        assert_eq!(list.items[0].quantity, Some(600.0));
    }

    #[test]
    fn test_missing_servings_scales_by_multiplier_only() {
        let mut plan = empty_plan();
        let recipe = Recipe::new("r", "r", Provenance::New).with_ingredient(
            IngredientEntry::new("linse", "Linsen").with_amount(100.0, "gramm"),
        );
        place(&mut plan, key(Weekday::Monday, SlotType::Dinner), recipe);

        // Household size must not enter the factor without a servings count
        let list = aggregate(&plan, 4);
        assert_eq!(list.items[0].quantity, Some(100.0));
    }

    #[test]
    fn test_unitless_entries_keep_no_quantity() {
        let mut plan = empty_plan();
        let recipe = Recipe::new("r", "r", Provenance::New)
            .with_servings(2)
            .with_ingredient(IngredientEntry::new("salz", "Salz"));
        place(&mut plan, key(Weekday::Monday, SlotType::Dinner), recipe);

        let list = aggregate(&plan, 2);
        assert_eq!(list.items[0].name, "salz");
        assert_eq!(list.items[0].quantity, None);
    }

    #[test]
    fn test_aggregation_is_order_independent() {
        let build = |first: SlotKey, second: SlotKey| {
            let mut plan = empty_plan();
            place(&mut plan, first, reis_recipe("a", 200.0, 2));
            place(&mut plan, second, reis_recipe("b", 150.0, 2));
            aggregate(&plan, 2)
        };

        let monday_first = build(
            key(Weekday::Monday, SlotType::Dinner),
            key(Weekday::Friday, SlotType::Dinner),
        );
        let friday_first = build(
            key(Weekday::Friday, SlotType::Dinner),
            key(Weekday::Monday, SlotType::Dinner),
        );
        assert_eq!(monday_first.items, friday_first.items);
    }

    #[test]
    fn test_split_by_store_with_unassigned_bucket() {
        let mut plan = empty_plan();
        let recipe = Recipe::new("r", "r", Provenance::Favorite)
            .with_servings(2)
            .with_ingredient(IngredientEntry::new("tomate", "Tomaten").with_amount(200.0, "gramm"))
            .with_ingredient(IngredientEntry::new("reis", "Reis").with_amount(150.0, "gramm"))
            .with_ingredient(IngredientEntry::new("drachenfrucht", "Drachenfrucht").with_amount(1.0, "stück"));
        place(&mut plan, key(Weekday::Monday, SlotType::Dinner), recipe);

        let index = AvailabilityIndex::new(vec![
            AvailabilityRecord::new("tomate", Store::Bioland, true),
            AvailabilityRecord::new("reis", Store::Generic, true),
        ]);

        let list = aggregate(&plan, 2);
        let split = split_by_store(&list, &index);

        assert_eq!(split.bioland.len(), 1);
        assert_eq!(split.bioland[0].name, "tomate");
        assert_eq!(split.generic.len(), 1);
        assert_eq!(split.generic[0].name, "reis");
        // Unknown items are kept, never dropped
        assert_eq!(split.unassigned.len(), 1);
        assert_eq!(split.unassigned[0].name, "drachenfrucht");
    }

    #[test]
    fn test_split_resolves_synonyms() {
        let mut plan = empty_plan();
        let recipe = Recipe::new("r", "r", Provenance::Favorite)
            .with_servings(2)
            .with_ingredient(
                IngredientEntry::new("strauchtomate", "Strauchtomaten").with_amount(4.0, "stück"),
            );
        place(&mut plan, key(Weekday::Monday, SlotType::Dinner), recipe);

        let index = AvailabilityIndex::new(vec![AvailabilityRecord::new(
            "tomate",
            Store::Bioland,
            true,
        )
        .with_synonym("strauchtomate")]);

        let split = split_by_store(&aggregate(&plan, 2), &index);
        assert_eq!(split.bioland.len(), 1);
        assert!(split.unassigned.is_empty());
    }
}
