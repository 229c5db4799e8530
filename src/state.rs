use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use meal_dashboard::config::DashboardConfig;
use meal_dashboard::data::aggregate::{
    self, GroupMean, HISTOGRAM_BINS, Histogram, Kpis, ScatterSeries, TOP_N, Unavailable,
};
use meal_dashboard::data::artifacts::{artifact_note, discover_model_artifact};
use meal_dashboard::data::cache::TableCache;
use meal_dashboard::data::export::{self, CsvExport};
use meal_dashboard::data::filter::{self, CategoricalColumn, FilterSpec, FilteredTable, NumericRange};
use meal_dashboard::data::model::{CALORIES, DIET_TYPE, HEALTH_SCORE, MealTable};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Chart tabs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartTab {
    #[default]
    CaloriesDistribution,
    HealthByCuisine,
    HealthyRatioByDiet,
    CaloriesVsHealth,
}

impl ChartTab {
    pub const ALL: [ChartTab; 4] = [
        ChartTab::CaloriesDistribution,
        ChartTab::HealthByCuisine,
        ChartTab::HealthyRatioByDiet,
        ChartTab::CaloriesVsHealth,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ChartTab::CaloriesDistribution => "Calories Distribution",
            ChartTab::HealthByCuisine => "Health Score by Cuisine",
            ChartTab::HealthyRatioByDiet => "Healthy Ratio by Diet",
            ChartTab::CaloriesVsHealth => "Calories vs Health Score",
        }
    }
}

// ---------------------------------------------------------------------------
// Cached aggregates
// ---------------------------------------------------------------------------

/// Everything the central panel draws, recomputed on every filter or
/// chart-parameter change rather than every frame.
#[derive(Debug, Clone)]
pub struct Summary {
    pub kpis: Kpis,
    pub histogram: Result<Histogram, Unavailable>,
    pub by_cuisine: Result<Vec<GroupMean>, Unavailable>,
    pub by_diet: Result<Vec<GroupMean>, Unavailable>,
    /// Shared with the scatter plot's hover lookup.
    pub scatter: Result<Arc<ScatterSeries>, Unavailable>,
}

impl Summary {
    fn compute(ft: &FilteredTable<'_>, bins: usize, top_n: usize) -> Self {
        Self {
            kpis: aggregate::kpis(ft),
            histogram: aggregate::calorie_histogram(ft, bins),
            by_cuisine: aggregate::health_score_by_cuisine(ft, top_n),
            by_diet: aggregate::healthy_ratio_by_diet(ft),
            scatter: aggregate::calories_vs_health(ft).map(Arc::new),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,
    cache: TableCache,

    /// Loaded table (None until a file loads).
    pub table: Option<Arc<MealTable>>,
    pub source_path: Option<PathBuf>,

    /// Selectable values per categorical column present in the table.
    pub options: BTreeMap<CategoricalColumn, BTreeSet<String>>,
    /// Whole-number slider bounds for calories.
    pub calorie_bounds: Option<(f64, f64)>,

    pub filters: FilterSpec,
    pub bins: usize,
    pub top_n: usize,
    pub active_tab: ChartTab,

    /// Indices of rows passing the current filters (cached).
    pub visible_indices: Vec<usize>,
    pub summary: Option<Summary>,

    /// Colours for `diet_type` in the scatter plot and filter list.
    pub color_map: Option<ColorMap>,

    pub artifact_note: String,
    pub status: Option<Status>,
    /// A load failure at startup.  When set, nothing else is rendered.
    pub fatal_error: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig, cache: TableCache) -> Self {
        let artifact_note = match discover_model_artifact(&config.artifact_dir) {
            Ok(found) => artifact_note(found.as_deref()),
            Err(e) => {
                log::warn!(
                    "Could not scan {} for model artifacts: {e}",
                    config.artifact_dir.display()
                );
                artifact_note(None)
            }
        };

        Self {
            bins: config.default_bins,
            top_n: config.default_top_n,
            config,
            cache,
            table: None,
            source_path: None,
            options: BTreeMap::new(),
            calorie_bounds: None,
            filters: FilterSpec::default(),
            active_tab: ChartTab::default(),
            visible_indices: Vec::new(),
            summary: None,
            color_map: None,
            artifact_note,
            status: None,
            fatal_error: None,
        }
    }

    /// Load the configured dataset.  Any failure here is fatal for the session.
    pub fn open_initial(&mut self) {
        let path = self.config.data_path.clone();
        if let Err(e) = self.open(&path) {
            log::error!("Failed to load {}: {e:#}", path.display());
            self.fatal_error = Some(format!("{e:#}"));
        }
    }

    /// Load (or fetch from cache) a table and make it current.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        let table = self
            .cache
            .get_or_load(path)
            .with_context(|| format!("Could not load '{}'", path.display()))?;
        self.set_table(table, path.to_path_buf());
        Ok(())
    }

    /// Ingest a table, reset filters to "everything selected" and recompute.
    pub fn set_table(&mut self, table: Arc<MealTable>, path: PathBuf) {
        self.filters = FilterSpec::for_table(&table);
        self.options = self.filters.selections.clone();
        self.calorie_bounds = self
            .filters
            .calories
            .filter(|r| r.min.is_finite() && r.max.is_finite())
            .map(|r| (r.min, r.max));
        self.color_map = table
            .has_column(DIET_TYPE)
            .then(|| ColorMap::new(&table.categories(DIET_TYPE)));

        self.table = Some(table);
        self.source_path = Some(path);
        self.status = None;
        self.refilter();
    }

    /// Recompute `visible_indices` and the summary after a filter change.
    pub fn refilter(&mut self) {
        if let Some(table) = &self.table {
            self.visible_indices = filter::apply(table, &self.filters).into_indices();
        }
        self.resummarize();
    }

    fn resummarize(&mut self) {
        self.summary = self.filtered().map(|ft| Summary::compute(&ft, self.bins, self.top_n));
    }

    /// The current filtered view.
    pub fn filtered(&self) -> Option<FilteredTable<'_>> {
        self.table
            .as_deref()
            .map(|t| FilteredTable::from_indices(t, self.visible_indices.clone()))
    }

    /// First rows of the filtered view for the preview table.
    pub fn preview_indices(&self) -> &[usize] {
        let n = self.config.preview_rows.min(self.visible_indices.len());
        &self.visible_indices[..n]
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.table.as_ref().is_some_and(|t| t.has_column(column))
    }

    // -- Filter edits ------------------------------------------------------

    /// Select or deselect a single value in a column's filter.
    pub fn set_category(&mut self, column: CategoricalColumn, value: &str, selected: bool) {
        let set = self.filters.selections.entry(column).or_default();
        if selected {
            set.insert(value.to_string());
        } else {
            set.remove(value);
        }
        self.refilter();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: CategoricalColumn) {
        if let Some(all) = self.options.get(&column) {
            self.filters.selections.insert(column, all.clone());
            self.refilter();
        }
    }

    /// Deselect all values in a column.  An empty selection shows every row.
    pub fn select_none(&mut self, column: CategoricalColumn) {
        self.filters.selections.insert(column, BTreeSet::new());
        self.refilter();
    }

    pub fn set_calorie_range(&mut self, range: NumericRange) {
        if self.has_column(CALORIES) {
            self.filters.calories = Some(ordered(range));
            self.refilter();
        }
    }

    pub fn set_health_score_range(&mut self, range: NumericRange) {
        if self.has_column(HEALTH_SCORE) {
            self.filters.health_score = Some(ordered(range));
            self.refilter();
        }
    }

    // -- Chart parameters --------------------------------------------------

    pub fn set_bins(&mut self, bins: usize) {
        self.bins = bins.clamp(*HISTOGRAM_BINS.start(), *HISTOGRAM_BINS.end());
        self.resummarize();
    }

    pub fn set_top_n(&mut self, top_n: usize) {
        self.top_n = top_n.clamp(*TOP_N.start(), *TOP_N.end());
        self.resummarize();
    }

    // -- Export ------------------------------------------------------------

    pub fn export_csv(&self) -> Option<Result<CsvExport, csv::Error>> {
        self.filtered().map(|ft| export::export(&ft))
    }

    /// Write the filtered rows to `path` and report the outcome in `status`.
    pub fn save_export(&mut self, path: &Path) {
        let outcome = match self.export_csv() {
            None => return,
            Some(result) => result
                .context("serializing filtered rows")
                .and_then(|e| {
                    std::fs::write(path, &e.bytes)
                        .with_context(|| format!("writing {}", path.display()))
                }),
        };
        self.status = Some(match outcome {
            Ok(()) => Status::Info(format!(
                "Saved {} rows to {}",
                self.visible_indices.len(),
                path.display()
            )),
            Err(e) => {
                log::error!("Export failed: {e:#}");
                Status::Error(format!("Export failed: {e:#}"))
            }
        });
    }
}

fn ordered(range: NumericRange) -> NumericRange {
    NumericRange::new(range.min.min(range.max), range.max.max(range.min))
}
