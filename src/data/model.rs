use std::collections::{BTreeSet, HashMap};
use std::fmt;

// ---------------------------------------------------------------------------
// Well-known columns
// ---------------------------------------------------------------------------

pub const MEAL_NAME: &str = "meal_name";
pub const CUISINE: &str = "cuisine";
pub const DIET_TYPE: &str = "diet_type";
pub const COOKING_METHOD: &str = "cooking_method";
pub const MEAL_TYPE: &str = "meal_type";
pub const CALORIES: &str = "calories";
pub const HEALTH_SCORE: &str = "health_score";
pub const IS_HEALTHY: &str = "is_healthy";

/// Columns coerced to `f64` at load time when present.
pub const NUMERIC_COLUMNS: [&str; 14] = [
    CALORIES,
    "protein_g",
    "carbs_g",
    "fat_g",
    "fiber_g",
    "sugar_g",
    "sodium_mg",
    "cholesterol_mg",
    "serving_size_g",
    "prep_time_min",
    "cook_time_min",
    "rating",
    HEALTH_SCORE,
    IS_HEALTHY,
];

pub fn is_numeric_column(name: &str) -> bool {
    NUMERIC_COLUMNS.contains(&name)
}

// ---------------------------------------------------------------------------
// CellValue – a single cell of the table
// ---------------------------------------------------------------------------

/// A table cell. Numeric columns hold `Number` or `Missing`; every other
/// column holds the source text verbatim or `Missing` for empty fields.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Missing,
}

impl CellValue {
    /// Coerce raw source text for a numeric column. Anything that does not
    /// parse to a non-NaN float becomes `Missing`.
    pub fn numeric(raw: Option<&str>) -> Self {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => match s.parse::<f64>() {
                Ok(v) if !v.is_nan() => CellValue::Number(v),
                _ => CellValue::Missing,
            },
            None => CellValue::Missing,
        }
    }

    /// Keep raw source text for a non-numeric column.
    pub fn text(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if !s.is_empty() => CellValue::Text(s.to_string()),
            _ => CellValue::Missing,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

/// Empty string for `Missing`; this is also the CSV export representation.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Number(v) => write!(f, "{v}"),
            CellValue::Missing => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// MealTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// One row of the table, cells aligned with [`MealTable::columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub cells: Vec<CellValue>,
}

/// The full parsed dataset. Immutable once built; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct MealTable {
    columns: Vec<String>,
    column_index: HashMap<String, usize>,
    rows: Vec<Record>,
}

impl MealTable {
    /// Build a table from raw text cells, coercing the numeric column set.
    /// Short rows are padded with `Missing`; extra trailing cells are dropped.
    pub fn from_raw<I, R>(columns: Vec<String>, raw_rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = Option<String>>,
    {
        let numeric: Vec<bool> = columns.iter().map(|c| is_numeric_column(c)).collect();
        let width = columns.len();

        let rows = raw_rows
            .into_iter()
            .map(|raw| {
                let mut cells: Vec<CellValue> = raw
                    .into_iter()
                    .take(width)
                    .zip(numeric.iter())
                    .map(|(value, &is_num)| {
                        if is_num {
                            CellValue::numeric(value.as_deref())
                        } else {
                            CellValue::text(value.as_deref())
                        }
                    })
                    .collect();
                cells.resize(width, CellValue::Missing);
                Record { cells }
            })
            .collect();

        Self::from_records(columns, rows)
    }

    /// Build a table from already-typed records.  Each record is padded with
    /// `Missing` or truncated to the column count.
    pub fn from_records(columns: Vec<String>, mut rows: Vec<Record>) -> Self {
        let width = columns.len();
        for record in &mut rows {
            record.cells.resize(width, CellValue::Missing);
        }
        let column_index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        MealTable {
            columns,
            column_index,
            rows,
        }
    }

    /// Column names in source order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.column_index.get(name).copied()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index.contains_key(name)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&CellValue> {
        let pos = self.column_position(column)?;
        self.rows.get(row)?.cells.get(pos)
    }

    /// Numeric value of a cell; `None` when the column is absent or the
    /// value is missing.
    pub fn number(&self, row: usize, column: &str) -> Option<f64> {
        self.cell(row, column).and_then(CellValue::as_f64)
    }

    pub fn text(&self, row: usize, column: &str) -> Option<&str> {
        self.cell(row, column).and_then(CellValue::as_str)
    }

    /// Sorted unique non-missing text values of a column.
    pub fn categories(&self, column: &str) -> BTreeSet<String> {
        let Some(pos) = self.column_position(column) else {
            return BTreeSet::new();
        };
        self.rows
            .iter()
            .filter_map(|r| r.cells.get(pos).and_then(CellValue::as_str))
            .map(str::to_string)
            .collect()
    }

    /// Observed `(min, max)` over non-missing values of a numeric column.
    pub fn numeric_range(&self, column: &str) -> Option<(f64, f64)> {
        let pos = self.column_position(column)?;
        self.rows
            .iter()
            .filter_map(|r| r.cells.get(pos).and_then(CellValue::as_f64))
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
