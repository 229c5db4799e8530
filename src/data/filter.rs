use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::model::{CALORIES, COOKING_METHOD, CUISINE, CellValue, DIET_TYPE, HEALTH_SCORE, MealTable, Record};

// ---------------------------------------------------------------------------
// Filter predicate pieces
// ---------------------------------------------------------------------------

/// The categorical columns a user can restrict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CategoricalColumn {
    Cuisine,
    DietType,
    CookingMethod,
}

impl CategoricalColumn {
    pub const ALL: [CategoricalColumn; 3] = [
        CategoricalColumn::Cuisine,
        CategoricalColumn::DietType,
        CategoricalColumn::CookingMethod,
    ];

    pub fn column_name(self) -> &'static str {
        match self {
            CategoricalColumn::Cuisine => CUISINE,
            CategoricalColumn::DietType => DIET_TYPE,
            CategoricalColumn::CookingMethod => COOKING_METHOD,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CategoricalColumn::Cuisine => "Cuisine",
            CategoricalColumn::DietType => "Diet Type",
            CategoricalColumn::CookingMethod => "Cooking Method",
        }
    }
}

impl fmt::Display for CategoricalColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Closed interval `[min, max]`.  A missing value is never inside it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericRange {
    pub min: f64,
    pub max: f64,
}

impl NumericRange {
    pub const UNBOUNDED: NumericRange = NumericRange {
        min: f64::NEG_INFINITY,
        max: f64::INFINITY,
    };

    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: Option<f64>) -> bool {
        value.is_some_and(|v| v >= self.min && v <= self.max)
    }
}

// ---------------------------------------------------------------------------
// FilterSpec
// ---------------------------------------------------------------------------

/// Everything the user has chosen to restrict the table by.
///
/// An empty selection set for a column means "no restriction" on that column,
/// not "show nothing".  A `None` range likewise imposes nothing, while any
/// `Some` range (even an unbounded one) rejects missing values.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub selections: BTreeMap<CategoricalColumn, BTreeSet<String>>,
    pub calories: Option<NumericRange>,
    pub health_score: Option<NumericRange>,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self::unrestricted()
    }
}

impl FilterSpec {
    /// A spec that lets every row through.
    pub fn unrestricted() -> Self {
        Self {
            selections: BTreeMap::new(),
            calories: None,
            health_score: None,
        }
    }

    /// Dashboard defaults: every category selected, calories spanning the
    /// observed range, health score spanning 0–100.  A calorie column with
    /// no values at all gets an unbounded range, which keeps no rows.
    pub fn for_table(table: &MealTable) -> Self {
        let selections = CategoricalColumn::ALL
            .iter()
            .filter(|c| table.has_column(c.column_name()))
            .map(|&c| (c, table.categories(c.column_name())))
            .collect();

        let calories = table.has_column(CALORIES).then(|| {
            table
                .numeric_range(CALORIES)
                .map(|(lo, hi)| NumericRange::new(lo.floor(), hi.ceil()))
                .unwrap_or(NumericRange::UNBOUNDED)
        });

        Self {
            selections,
            calories,
            health_score: Some(NumericRange::new(0.0, 100.0)),
        }
    }

    pub fn selection(&self, column: CategoricalColumn) -> Option<&BTreeSet<String>> {
        self.selections.get(&column)
    }

    /// Whether a single row passes every active predicate.
    pub fn matches(&self, table: &MealTable, row: usize) -> bool {
        let range_ok = |column: &str, range: Option<NumericRange>| match range {
            Some(range) if table.has_column(column) => range.contains(table.number(row, column)),
            _ => true,
        };
        if !range_ok(CALORIES, self.calories) || !range_ok(HEALTH_SCORE, self.health_score) {
            return false;
        }
        self.selections.iter().all(|(col, selected)| {
            let name = col.column_name();
            if selected.is_empty() || !table.has_column(name) {
                return true;
            }
            table.text(row, name).is_some_and(|v| selected.contains(v))
        })
    }
}

// ---------------------------------------------------------------------------
// FilteredTable
// ---------------------------------------------------------------------------

/// The rows of a table passing a [`FilterSpec`], in their original order.
#[derive(Debug, Clone)]
pub struct FilteredTable<'a> {
    table: &'a MealTable,
    indices: Vec<usize>,
}

impl<'a> FilteredTable<'a> {
    /// View over an explicit, ascending set of row indices.
    pub fn from_indices(table: &'a MealTable, indices: Vec<usize>) -> Self {
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        Self { table, indices }
    }

    /// View over every row of the table.
    pub fn all(table: &'a MealTable) -> Self {
        Self::from_indices(table, (0..table.len()).collect())
    }

    pub fn table(&self) -> &'a MealTable {
        self.table
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn into_indices(self) -> Vec<usize> {
        self.indices
    }

    pub fn columns(&self) -> &'a [String] {
        self.table.columns()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.table.has_column(name)
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a Record> + '_ {
        let rows = self.table.rows();
        self.indices.iter().map(move |&i| &rows[i])
    }

    /// `(row index, value)` for each included row; `None` marks a missing value.
    pub fn numbers(&self, column: &str) -> impl Iterator<Item = (usize, Option<f64>)> + '_ {
        let pos = self.table.column_position(column);
        self.indices.iter().map(move |&i| {
            let value = pos.and_then(|p| self.table.rows()[i].cells[p].as_f64());
            (i, value)
        })
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&'a CellValue> {
        self.table.cell(row, column)
    }

    /// The first `n` included rows (the preview).
    pub fn head(&self, n: usize) -> &[usize] {
        &self.indices[..n.min(self.indices.len())]
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Mask construction
// ---------------------------------------------------------------------------

/// Apply a filter spec to the table.
///
/// Builds an all-true mask and ANDs in one predicate per active column:
/// * `calories` / `health_score` – value inside the closed range; missing
///   values fail.  An absent column or a `None` range imposes no restriction.
/// * `cuisine` / `diet_type` / `cooking_method` – value in the selected set
///   when that set is non-empty; missing values fail.  An empty set or an
///   absent column imposes no restriction.
pub fn apply<'a>(table: &'a MealTable, spec: &FilterSpec) -> FilteredTable<'a> {
    let mut mask = vec![true; table.len()];

    for (column, range) in [(CALORIES, spec.calories), (HEALTH_SCORE, spec.health_score)] {
        let Some(range) = range else {
            continue;
        };
        let Some(pos) = table.column_position(column) else {
            if column == CALORIES {
                log::warn!("Column '{CALORIES}' not present; calorie range not applied");
            }
            continue;
        };
        and_mask(&mut mask, table, |cells| range.contains(cells[pos].as_f64()));
    }

    for (column, selected) in &spec.selections {
        if selected.is_empty() {
            continue;
        }
        let Some(pos) = table.column_position(column.column_name()) else {
            continue;
        };
        and_mask(&mut mask, table, |cells| {
            cells[pos].as_str().is_some_and(|v| selected.contains(v))
        });
    }

    let indices: Vec<usize> = mask
        .iter()
        .enumerate()
        .filter(|(_, keep)| **keep)
        .map(|(i, _)| i)
        .collect();

    log::debug!("Filter kept {} of {} rows", indices.len(), table.len());
    FilteredTable::from_indices(table, indices)
}

fn and_mask(mask: &mut [bool], table: &MealTable, predicate: impl Fn(&[CellValue]) -> bool) {
    for (keep, record) in mask.iter_mut().zip(table.rows()) {
        if *keep {
            *keep = predicate(&record.cells);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: &[&[&str]]) -> MealTable {
        MealTable::from_raw(
            columns.iter().map(|c| c.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| Some(s.to_string())).collect::<Vec<_>>()),
        )
    }

    fn meals() -> MealTable {
        table(
            &["cuisine", "diet_type", "cooking_method", "calories", "health_score"],
            &[
                &["Italian", "Vegan", "Baked", "500", "80"],
                &["American", "Keto", "Fried", "1200", "40"],
                &["Thai", "Vegan", "Steamed", "", "90"],
                &["", "Paleo", "Grilled", "300", "70"],
                &["Italian", "Keto", "Grilled", "650", "n/a"],
            ],
        )
    }

    fn select(spec: &mut FilterSpec, column: CategoricalColumn, values: &[&str]) {
        spec.selections
            .insert(column, values.iter().map(|v| v.to_string()).collect());
    }

    #[test]
    fn calorie_range_is_inclusive_and_excludes_missing() {
        let t = meals();
        let mut spec = FilterSpec::unrestricted();
        spec.calories = Some(NumericRange::new(300.0, 650.0));
        assert_eq!(apply(&t, &spec).indices(), &[0, 3, 4]);
    }

    #[test]
    fn health_score_missing_values_fail_a_bounded_range() {
        let t = meals();
        let mut spec = FilterSpec::unrestricted();
        spec.health_score = Some(NumericRange::new(0.0, 100.0));
        assert_eq!(apply(&t, &spec).indices(), &[0, 1, 2, 3]);
    }

    #[test]
    fn empty_selection_imposes_no_restriction() {
        let t = meals();
        let mut spec = FilterSpec::unrestricted();
        select(&mut spec, CategoricalColumn::Cuisine, &[]);
        assert_eq!(apply(&t, &spec).len(), t.len());
    }

    #[test]
    fn non_empty_selection_excludes_missing_categories() {
        let t = meals();
        let mut spec = FilterSpec::unrestricted();
        select(&mut spec, CategoricalColumn::Cuisine, &["Italian", "Thai"]);
        assert_eq!(apply(&t, &spec).indices(), &[0, 2, 4]);
    }

    #[test]
    fn predicates_are_combined_with_and() {
        let t = meals();
        let mut spec = FilterSpec::unrestricted();
        select(&mut spec, CategoricalColumn::DietType, &["Keto", "Vegan"]);
        select(&mut spec, CategoricalColumn::CookingMethod, &["Grilled", "Baked"]);
        spec.calories = Some(NumericRange::new(0.0, 1000.0));
        assert_eq!(apply(&t, &spec).indices(), &[0, 4]);
    }

    #[test]
    fn absent_columns_impose_no_restriction() {
        let t = table(&["meal_name"], &[&["Soup"], &["Stew"]]);
        let mut spec = FilterSpec::unrestricted();
        spec.calories = Some(NumericRange::new(0.0, 10.0));
        spec.health_score = Some(NumericRange::new(0.0, 10.0));
        select(&mut spec, CategoricalColumn::Cuisine, &["Thai"]);
        assert_eq!(apply(&t, &spec).len(), 2);
        assert!(spec.matches(&t, 0));
    }

    #[test]
    fn entirely_missing_calories_exclude_every_row() {
        let t = table(&["calories"], &[&[""], &["x"]]);
        let mut spec = FilterSpec::unrestricted();
        spec.calories = Some(NumericRange::new(0.0, 1000.0));
        assert!(apply(&t, &spec).is_empty());
    }

    #[test]
    fn defaults_select_everything_observed() {
        let t = meals();
        let spec = FilterSpec::for_table(&t);
        assert_eq!(spec.calories, Some(NumericRange::new(300.0, 1200.0)));
        assert_eq!(spec.health_score, Some(NumericRange::new(0.0, 100.0)));
        let cuisines = spec.selection(CategoricalColumn::Cuisine).unwrap();
        assert_eq!(cuisines.len(), 3);
        // Missing calories, missing cuisine and missing health score drop out.
        assert_eq!(apply(&t, &spec).indices(), &[0, 1]);
    }

    #[test]
    fn default_calorie_bounds_are_widened_to_whole_numbers() {
        let t = table(&["calories"], &[&["99.6"], &["450.2"]]);
        let spec = FilterSpec::for_table(&t);
        assert_eq!(spec.calories, Some(NumericRange::new(99.0, 451.0)));
        assert_eq!(apply(&t, &spec).len(), 2);
    }

    #[test]
    fn matches_agrees_with_apply() {
        let t = meals();
        let mut spec = FilterSpec::for_table(&t);
        select(&mut spec, CategoricalColumn::Cuisine, &["Italian"]);
        let kept = apply(&t, &spec);
        for row in 0..t.len() {
            assert_eq!(kept.indices().contains(&row), spec.matches(&t, row));
        }
    }

    #[test]
    fn unbounded_range_still_rejects_missing() {
        let t = meals();
        let mut spec = FilterSpec::unrestricted();
        spec.calories = Some(NumericRange::UNBOUNDED);
        assert_eq!(apply(&t, &spec).indices(), &[0, 1, 3, 4]);
    }

    #[test]
    fn short_typed_records_are_filtered_without_panicking() {
        let t = MealTable::from_records(
            vec!["cuisine".into(), "calories".into()],
            vec![Record {
                cells: vec![CellValue::Text("Thai".into())],
            }],
        );
        let mut spec = FilterSpec::unrestricted();
        spec.calories = Some(NumericRange::new(0.0, 10.0));
        assert!(apply(&t, &spec).is_empty());
        let all = FilteredTable::all(&t);
        assert_eq!(all.numbers(CALORIES).collect::<Vec<_>>(), vec![(0, None)]);
    }

    #[test]
    fn head_is_bounded_by_len() {
        let t = meals();
        let all = FilteredTable::all(&t);
        assert_eq!(all.head(2), &[0, 1]);
        assert_eq!(all.head(500).len(), t.len());
    }
}
