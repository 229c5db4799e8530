//! Property-based tests for the filter engine and aggregates.
//!
//! These verify invariants that should hold for all inputs:
//! - The filtered table is an order-preserving subset of the table
//! - Included rows satisfy every active predicate, excluded rows fail one
//! - An empty categorical selection never restricts
//! - Histogram counts add up to the non-missing calorie values
//! - Grouped means agree with the table: counts, extremes and top-N
//! - Columns missing from the table impose no restriction

use std::collections::BTreeSet;

use meal_dashboard::data::aggregate::{
    GroupMean, calorie_histogram, health_score_by_cuisine, healthy_ratio_by_diet,
};
use meal_dashboard::data::filter::{
    CategoricalColumn, FilterSpec, FilteredTable, NumericRange, apply,
};
use meal_dashboard::data::model::{
    CALORIES, CUISINE, DIET_TYPE, HEALTH_SCORE, IS_HEALTHY, MealTable,
};
use proptest::prelude::*;

const CUISINES: [&str; 4] = ["Italian", "Thai", "Indian", "Greek"];
const DIETS: [&str; 3] = ["Vegan", "Keto", "Paleo"];
const METHODS: [&str; 3] = ["Baked", "Fried", "Raw"];
const COLUMNS: [&str; 6] = [
    "cuisine",
    "diet_type",
    "cooking_method",
    "calories",
    "health_score",
    "is_healthy",
];

fn category(options: &'static [&'static str]) -> impl Strategy<Value = Option<String>> {
    prop::option::weighted(0.9, prop::sample::select(options).prop_map(str::to_string))
}

fn number(lo: f64, hi: f64) -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        8 => (lo..hi).prop_map(|v| Some(format!("{v:.1}"))),
        1 => Just(None),
        1 => Just(Some("oops".to_string())),
    ]
}

/// Rows over [`COLUMNS`], each column kept with high probability so absent
/// columns show up regularly.
fn meal_table() -> impl Strategy<Value = MealTable> {
    let row = (
        category(&CUISINES),
        category(&DIETS),
        category(&METHODS),
        number(0.0, 2000.0),
        number(0.0, 100.0),
        prop::option::weighted(0.9, prop::bool::ANY.prop_map(|b| u8::from(b).to_string())),
    );
    (
        prop::array::uniform6(prop::bool::weighted(0.85)),
        prop::collection::vec(row, 0..60),
    )
        .prop_map(|(keep, rows)| {
            let columns = COLUMNS
                .iter()
                .zip(keep)
                .filter(|(_, k)| *k)
                .map(|(c, _)| c.to_string())
                .collect();
            let rows = rows.into_iter().map(|(c, d, m, cal, hs, ok)| {
                [c, d, m, cal, hs, ok]
                    .into_iter()
                    .zip(keep)
                    .filter(|(_, k)| *k)
                    .map(|(cell, _)| cell)
                    .collect::<Vec<_>>()
            });
            MealTable::from_raw(columns, rows)
        })
}

fn selection(options: &'static [&'static str]) -> impl Strategy<Value = BTreeSet<String>> {
    prop::sample::subsequence(options, 0..=options.len())
        .prop_map(|picked| picked.into_iter().map(str::to_string).collect())
}

fn range(lo: f64, hi: f64) -> impl Strategy<Value = Option<NumericRange>> {
    prop::option::of((lo..hi, lo..hi).prop_map(|(a, b)| NumericRange::new(a.min(b), a.max(b))))
}

fn filter_spec() -> impl Strategy<Value = FilterSpec> {
    (
        selection(&CUISINES),
        selection(&DIETS),
        selection(&METHODS),
        range(0.0, 2000.0),
        range(0.0, 100.0),
    )
        .prop_map(|(cuisines, diets, methods, calories, health_score)| {
            let mut spec = FilterSpec::unrestricted();
            spec.selections.insert(CategoricalColumn::Cuisine, cuisines);
            spec.selections.insert(CategoricalColumn::DietType, diets);
            spec.selections.insert(CategoricalColumn::CookingMethod, methods);
            spec.calories = calories;
            spec.health_score = health_score;
            spec
        })
}

/// `(count, sum, min, max)` of `value` over the filtered rows whose `key` is `label`,
/// read straight from the table.
fn observed(ft: &FilteredTable<'_>, key: &str, value: &str, label: &str) -> (usize, f64, f64, f64) {
    let table = ft.table();
    ft.indices()
        .iter()
        .filter(|&&row| table.text(row, key) == Some(label))
        .filter_map(|&row| table.number(row, value))
        .fold((0, 0.0, f64::INFINITY, f64::NEG_INFINITY), |(n, sum, lo, hi), v| {
            (n + 1, sum + v, lo.min(v), hi.max(v))
        })
}

/// Each reported group agrees with its rows in the table: count, mean and
/// extremes.  Groups come best first.
fn check_groups(
    ft: &FilteredTable<'_>,
    groups: &[GroupMean],
    key: &str,
    value: &str,
) -> Result<(), TestCaseError> {
    for g in groups {
        let (count, sum, lo, hi) = observed(ft, key, value, &g.label);
        prop_assert_eq!(g.count, count, "{}", g.label);
        prop_assert!(count > 0);
        prop_assert!(lo <= g.mean && g.mean <= hi, "{:?} outside [{}, {}]", g, lo, hi);
        prop_assert!((g.mean - sum / count as f64).abs() <= 1e-9 * hi.abs().max(1.0));
    }
    prop_assert!(groups.windows(2).all(|w| w[0].mean >= w[1].mean));
    Ok(())
}

proptest! {
    #[test]
    fn prop_filtered_rows_are_an_ordered_subset(table in meal_table(), spec in filter_spec()) {
        let ft = apply(&table, &spec);
        prop_assert!(ft.len() <= table.len());
        prop_assert!(ft.indices().windows(2).all(|w| w[0] < w[1]));
        prop_assert!(ft.indices().iter().all(|&i| i < table.len()));
    }

    #[test]
    fn prop_inclusion_matches_predicates(table in meal_table(), spec in filter_spec()) {
        let ft = apply(&table, &spec);
        for row in 0..table.len() {
            let included = ft.indices().binary_search(&row).is_ok();
            prop_assert_eq!(included, spec.matches(&table, row), "row {}", row);
        }
    }

    #[test]
    fn prop_empty_selection_never_restricts(table in meal_table(), spec in filter_spec()) {
        let mut cleared = spec.clone();
        cleared.selections.insert(CategoricalColumn::Cuisine, BTreeSet::new());
        let mut dropped = spec;
        dropped.selections.remove(&CategoricalColumn::Cuisine);
        let with_empty = apply(&table, &cleared).into_indices();
        let without = apply(&table, &dropped).into_indices();
        prop_assert_eq!(with_empty, without);
    }

    #[test]
    fn prop_histogram_counts_every_present_calorie(
        table in meal_table(),
        spec in filter_spec(),
        bins in 10usize..=100,
    ) {
        let ft = apply(&table, &spec);
        match calorie_histogram(&ft, bins) {
            Ok(hist) => {
                let present = ft.numbers(CALORIES).filter(|(_, v)| v.is_some()).count();
                prop_assert_eq!(hist.total(), present);
                if present > 0 {
                    prop_assert_eq!(hist.bins.len(), bins);
                }
            }
            Err(_) => prop_assert!(!table.has_column(CALORIES)),
        }
    }

    #[test]
    fn prop_cuisine_means_match_the_table(
        table in meal_table(),
        spec in filter_spec(),
        top_n in 5usize..=20,
    ) {
        let ft = apply(&table, &spec);
        match health_score_by_cuisine(&ft, top_n) {
            Ok(groups) => {
                prop_assert!(groups.len() <= top_n);
                check_groups(&ft, &groups, CUISINE, HEALTH_SCORE)?;
                let expected = CUISINES
                    .iter()
                    .filter(|c| observed(&ft, CUISINE, HEALTH_SCORE, c).0 > 0)
                    .count();
                prop_assert_eq!(groups.len(), expected.min(top_n));
            }
            Err(_) => prop_assert!(!table.has_column(CUISINE) || !table.has_column(HEALTH_SCORE)),
        }
    }

    #[test]
    fn prop_diet_ratios_match_the_table(table in meal_table(), spec in filter_spec()) {
        let ft = apply(&table, &spec);
        match healthy_ratio_by_diet(&ft) {
            Ok(groups) => {
                check_groups(&ft, &groups, DIET_TYPE, IS_HEALTHY)?;
                let expected = DIETS
                    .iter()
                    .filter(|d| observed(&ft, DIET_TYPE, IS_HEALTHY, d).0 > 0)
                    .count();
                prop_assert_eq!(groups.len(), expected);
                prop_assert!(groups.iter().all(|g| (0.0..=1.0).contains(&g.mean)));
            }
            Err(_) => prop_assert!(!table.has_column(DIET_TYPE) || !table.has_column(IS_HEALTHY)),
        }
    }

    #[test]
    fn prop_absent_columns_never_restrict(table in meal_table(), spec in filter_spec()) {
        let kept = apply(&table, &spec).into_indices();
        let mut relaxed = spec;
        for column in CategoricalColumn::ALL {
            if !table.has_column(column.column_name()) {
                relaxed.selections.remove(&column);
            }
        }
        if !table.has_column(CALORIES) {
            relaxed.calories = None;
        }
        if !table.has_column(HEALTH_SCORE) {
            relaxed.health_score = None;
        }
        prop_assert_eq!(kept, apply(&table, &relaxed).into_indices());
    }
}
