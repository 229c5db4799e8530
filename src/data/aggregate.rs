//! Summaries over a [`FilteredTable`]: scalar KPIs and the data behind the
//! four chart views.  Every function is pure; a missing column yields
//! [`Unavailable`] (or `None` for a single KPI) instead of an error.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use thiserror::Error;

use super::filter::FilteredTable;
use super::model::{CALORIES, CUISINE, DIET_TYPE, HEALTH_SCORE, IS_HEALTHY, MEAL_NAME};

pub const HISTOGRAM_BINS: RangeInclusive<usize> = 10..=100;
pub const TOP_N: RangeInclusive<usize> = 5..=20;

/// Some column an aggregate needs is absent from the table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", describe_missing(.columns))]
pub struct Unavailable {
    pub columns: Vec<&'static str>,
}

fn describe_missing(columns: &[&'static str]) -> String {
    let quoted: Vec<String> = columns.iter().map(|c| format!("'{c}'")).collect();
    match quoted.len() {
        1 => format!("Column {} not available.", quoted[0]),
        _ => format!("Columns {} not available.", quoted.join(" and/or ")),
    }
}

fn require(ft: &FilteredTable<'_>, columns: &[&'static str]) -> Result<(), Unavailable> {
    let missing: Vec<&'static str> = columns
        .iter()
        .copied()
        .filter(|c| !ft.has_column(c))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(Unavailable { columns: missing })
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as f64)
}

// ---------------------------------------------------------------------------
// KPIs
// ---------------------------------------------------------------------------

/// Headline numbers.  `None` means "no data" for that figure.
#[derive(Debug, Clone, PartialEq)]
pub struct Kpis {
    pub rows: usize,
    pub mean_calories: Option<f64>,
    /// Mean of the 0/1 `is_healthy` indicator, scaled to 0–100.
    pub healthy_share_pct: Option<f64>,
    pub mean_health_score: Option<f64>,
}

pub fn kpis(ft: &FilteredTable<'_>) -> Kpis {
    let column_mean = |column: &str| {
        if ft.has_column(column) {
            mean(ft.numbers(column).filter_map(|(_, v)| v))
        } else {
            None
        }
    };
    Kpis {
        rows: ft.len(),
        mean_calories: column_mean(CALORIES),
        healthy_share_pct: column_mean(IS_HEALTHY).map(|m| m * 100.0),
        mean_health_score: column_mean(HEALTH_SCORE),
    }
}

/// One decimal, or an en dash when there is nothing to show.
pub fn format_kpi(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => "–".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Histogram {
    pub bins: Vec<HistogramBin>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }
}

/// Equal-width histogram of `calories` over the observed range.
///
/// `bins` is clamped to [`HISTOGRAM_BINS`].  The maximum value lands in the
/// last bin.  When every value is equal the range is widened to one unit
/// centred on that value.  No values at all gives a histogram without bins.
pub fn calorie_histogram(ft: &FilteredTable<'_>, bins: usize) -> Result<Histogram, Unavailable> {
    require(ft, &[CALORIES])?;
    let bins = bins.clamp(*HISTOGRAM_BINS.start(), *HISTOGRAM_BINS.end());

    let values: Vec<f64> = ft.numbers(CALORIES).filter_map(|(_, v)| v).collect();
    let Some((lo, hi)) = values.iter().fold(None, |acc: Option<(f64, f64)>, &v| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    }) else {
        return Ok(Histogram::default());
    };

    let (start, span) = if hi > lo { (lo, hi - lo) } else { (lo - 0.5, 1.0) };
    let width = span / bins as f64;

    let mut counts = vec![0usize; bins];
    for v in values {
        let idx = (((v - start) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    let bins = counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            start: start + i as f64 * width,
            end: start + (i + 1) as f64 * width,
            count,
        })
        .collect();
    Ok(Histogram { bins })
}

// ---------------------------------------------------------------------------
// Grouped means
// ---------------------------------------------------------------------------

/// Mean of one column within one group, plus the extremes it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMean {
    pub label: String,
    pub mean: f64,
    pub count: usize,
    pub min: f64,
    pub max: f64,
}

/// Group by a text column and average a numeric column.
///
/// Rows with a missing key are skipped, as are groups with no numeric
/// values.  Sorted by mean descending; equal means fall back to label
/// ascending.
fn group_mean(
    ft: &FilteredTable<'_>,
    key: &'static str,
    value: &'static str,
) -> Result<Vec<GroupMean>, Unavailable> {
    require(ft, &[key, value])?;

    // label -> (sum, count, min, max)
    let mut acc: BTreeMap<&str, (f64, usize, f64, f64)> = BTreeMap::new();
    for (row, v) in ft.numbers(value) {
        let (Some(label), Some(v)) = (ft.table().text(row, key), v) else {
            continue;
        };
        let entry = acc
            .entry(label)
            .or_insert((0.0, 0, f64::INFINITY, f64::NEG_INFINITY));
        entry.0 += v;
        entry.1 += 1;
        entry.2 = entry.2.min(v);
        entry.3 = entry.3.max(v);
    }

    let mut groups: Vec<GroupMean> = acc
        .into_iter()
        .map(|(label, (sum, count, min, max))| GroupMean {
            label: label.to_string(),
            // Clamp away float noise so the mean never leaves [min, max].
            mean: (sum / count as f64).clamp(min, max),
            count,
            min,
            max,
        })
        .collect();

    groups.sort_by(|a, b| {
        b.mean
            .partial_cmp(&a.mean)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
    Ok(groups)
}

/// Mean `health_score` per `cuisine`, best first, at most `top_n` groups
/// (`top_n` clamped to [`TOP_N`]).
pub fn health_score_by_cuisine(
    ft: &FilteredTable<'_>,
    top_n: usize,
) -> Result<Vec<GroupMean>, Unavailable> {
    let top_n = top_n.clamp(*TOP_N.start(), *TOP_N.end());
    let mut groups = group_mean(ft, CUISINE, HEALTH_SCORE)?;
    groups.truncate(top_n);
    Ok(groups)
}

/// Fraction of healthy meals (mean of `is_healthy`) per `diet_type`, best first.
pub fn healthy_ratio_by_diet(ft: &FilteredTable<'_>) -> Result<Vec<GroupMean>, Unavailable> {
    group_mean(ft, DIET_TYPE, IS_HEALTHY)
}

// ---------------------------------------------------------------------------
// Calories vs health score
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterPoint {
    pub row: usize,
    pub calories: f64,
    pub health_score: f64,
    /// `diet_type`, used for colour coding.
    pub group: Option<String>,
    /// `meal_name`, used for hover text.
    pub label: Option<String>,
}

/// Ordinary least squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trend {
    pub slope: f64,
    pub intercept: f64,
}

impl Trend {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScatterSeries {
    pub points: Vec<ScatterPoint>,
    /// `None` with fewer than two points or no spread in calories.
    pub trend: Option<Trend>,
}

impl ScatterSeries {
    /// The point closest to `(calories, health_score)`, measuring distance
    /// with each axis scaled to the spread of the points.
    pub fn nearest(&self, calories: f64, health_score: f64) -> Option<&ScatterPoint> {
        let spread = |value: fn(&ScatterPoint) -> f64| {
            let (lo, hi) = self
                .points
                .iter()
                .map(value)
                .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                    (lo.min(v), hi.max(v))
                });
            if hi > lo { hi - lo } else { 1.0 }
        };
        let (x_span, y_span) = (spread(|p| p.calories), spread(|p| p.health_score));

        let distance = |p: &ScatterPoint| {
            let dx = (p.calories - calories) / x_span;
            let dy = (p.health_score - health_score) / y_span;
            dx * dx + dy * dy
        };
        self.points
            .iter()
            .min_by(|a, b| distance(*a).total_cmp(&distance(*b)))
    }
}

pub fn calories_vs_health(ft: &FilteredTable<'_>) -> Result<ScatterSeries, Unavailable> {
    require(ft, &[CALORIES, HEALTH_SCORE])?;
    let table = ft.table();

    let points: Vec<ScatterPoint> = ft
        .numbers(CALORIES)
        .filter_map(|(row, calories)| {
            let calories = calories?;
            let health_score = table.number(row, HEALTH_SCORE)?;
            Some(ScatterPoint {
                row,
                calories,
                health_score,
                group: table.text(row, DIET_TYPE).map(str::to_string),
                label: table.text(row, MEAL_NAME).map(str::to_string),
            })
        })
        .collect();

    let trend = ols(points.iter().map(|p| (p.calories, p.health_score)));
    Ok(ScatterSeries { points, trend })
}

fn ols(pairs: impl Iterator<Item = (f64, f64)> + Clone) -> Option<Trend> {
    let n = pairs.clone().count();
    if n < 2 {
        return None;
    }
    let n_f = n as f64;
    let (sum_x, sum_y) = pairs
        .clone()
        .fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
    let (mean_x, mean_y) = (sum_x / n_f, sum_y / n_f);

    let (sxx, sxy) = pairs.fold((0.0, 0.0), |(sxx, sxy), (x, y)| {
        let dx = x - mean_x;
        (sxx + dx * dx, sxy + dx * (y - mean_y))
    });
    if sxx == 0.0 {
        return None;
    }
    let slope = sxy / sxx;
    Some(Trend {
        slope,
        intercept: mean_y - slope * mean_x,
    })
}
