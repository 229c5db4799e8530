use std::collections::BTreeMap;
use std::sync::Arc;

use eframe::egui::{Color32, RichText, Slider, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoint, PlotPoints, Points};

use meal_dashboard::data::aggregate::{
    GroupMean, HISTOGRAM_BINS, Histogram, Kpis, ScatterPoint, ScatterSeries, TOP_N, format_kpi,
};
use meal_dashboard::data::model::{CUISINE, HEALTH_SCORE, MEAL_TYPE, MealTable};

use crate::color::{ColorMap, sequential};
use crate::state::{AppState, ChartTab};

const PLOT_HEIGHT: f32 = 340.0;
const HISTOGRAM_COLOR: Color32 = Color32::from_rgb(0x5D, 0xAD, 0xE2);
const CUISINE_HUE: f32 = 150.0;
const DIET_HUE: f32 = 210.0;
const TREND_NAME: &str = "OLS trend";

// ---------------------------------------------------------------------------
// KPI row
// ---------------------------------------------------------------------------

pub fn kpi_row(ui: &mut Ui, kpis: &Kpis) {
    let healthy_share = kpis
        .healthy_share_pct
        .map(|v| format!("{v:.1}%"))
        .unwrap_or_else(|| format_kpi(None));

    ui.columns(4, |cols: &mut [Ui]| {
        metric(&mut cols[0], "Rows (filtered)", thousands(kpis.rows));
        metric(&mut cols[1], "Avg Calories", format_kpi(kpis.mean_calories));
        metric(&mut cols[2], "Healthy Share", healthy_share);
        metric(&mut cols[3], "Avg Health Score", format_kpi(kpis.mean_health_score));
    });
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).weak());
        ui.label(RichText::new(value).size(24.0).strong());
    });
}

/// `12345` → `"12,345"`.
fn thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

// ---------------------------------------------------------------------------
// Chart tabs
// ---------------------------------------------------------------------------

/// Tab strip plus the active chart.
pub fn chart_tabs(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        for tab in ChartTab::ALL {
            ui.selectable_value(&mut state.active_tab, tab, tab.title());
        }
    });
    ui.separator();

    match state.active_tab {
        ChartTab::CaloriesDistribution => {
            let mut bins = state.bins;
            if ui.add(Slider::new(&mut bins, HISTOGRAM_BINS).text("Bins")).changed() {
                state.set_bins(bins);
            }
            if let Some(summary) = &state.summary {
                match &summary.histogram {
                    Ok(h) => histogram_plot(ui, h),
                    Err(e) => unavailable(ui, e),
                }
            }
        }
        ChartTab::HealthByCuisine => {
            if state.has_column(CUISINE) && state.has_column(HEALTH_SCORE) {
                let mut top_n = state.top_n;
                if ui.add(Slider::new(&mut top_n, TOP_N).text("Top cuisines")).changed() {
                    state.set_top_n(top_n);
                }
            }
            let Some(summary) = &state.summary else {
                return;
            };
            match &summary.by_cuisine {
                Ok(groups) => {
                    ui.strong(format!("Average Health Score by Cuisine (Top {})", state.top_n));
                    group_bars(ui, "health_by_cuisine", groups, CUISINE_HUE, "Avg Health Score");
                }
                Err(e) => unavailable(ui, e),
            }
        }
        ChartTab::HealthyRatioByDiet => {
            let Some(summary) = &state.summary else {
                return;
            };
            ui.strong("Healthy Meal Ratio by Diet Type");
            match &summary.by_diet {
                Ok(groups) => group_bars(ui, "healthy_ratio_by_diet", groups, DIET_HUE, "Healthy Ratio"),
                Err(e) => unavailable(ui, e),
            }
        }
        ChartTab::CaloriesVsHealth => {
            let Some(summary) = &state.summary else {
                return;
            };
            match &summary.scatter {
                Ok(series) => scatter_plot(
                    ui,
                    Arc::clone(series),
                    state.color_map.as_ref(),
                    state.table.clone(),
                ),
                Err(e) => unavailable(ui, e),
            }
        }
    }
}

fn unavailable(ui: &mut Ui, reason: &impl ToString) {
    ui.label(RichText::new(reason.to_string()).italics());
}

// ---------------------------------------------------------------------------
// Individual charts
// ---------------------------------------------------------------------------

fn histogram_plot(ui: &mut Ui, histogram: &Histogram) {
    let bars: Vec<Bar> = histogram
        .bins
        .iter()
        .map(|b| {
            Bar::new(b.center(), b.count as f64)
                .width(b.width())
                .name(format!("{:.0}–{:.0} kcal", b.start, b.end))
        })
        .collect();
    let chart = BarChart::new(bars).color(HISTOGRAM_COLOR).name("Calories");

    Plot::new("calories_histogram")
        .height(PLOT_HEIGHT)
        .x_axis_label("Calories (kcal)")
        .y_axis_label("Count")
        .allow_scroll(false)
        .show(ui, |plot_ui| plot_ui.bar_chart(chart));
}

/// One bar per group, shaded by value, labelled on the x axis and in a
/// ranked list under the plot.
fn group_bars(ui: &mut Ui, id: &str, groups: &[GroupMean], hue: f32, y_label: &str) {
    let (lo, hi) = groups.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), g| {
        (lo.min(g.mean), hi.max(g.mean))
    });
    let shade = |v: f64| if hi > lo { (v - lo) / (hi - lo) } else { 1.0 };

    let labels: Vec<String> = groups.iter().map(|g| g.label.clone()).collect();
    let bars: Vec<Bar> = groups
        .iter()
        .enumerate()
        .map(|(i, g)| {
            Bar::new(i as f64, g.mean)
                .width(0.7)
                .name(&g.label)
                .fill(sequential(hue, shade(g.mean)))
        })
        .collect();

    Plot::new(id)
        .height(PLOT_HEIGHT)
        .x_axis_formatter(move |mark, _range| axis_label(&labels, mark.value))
        .y_axis_label(y_label)
        .allow_scroll(false)
        .show(ui, |plot_ui| plot_ui.bar_chart(BarChart::new(bars)));

    ui.horizontal_wrapped(|ui: &mut Ui| {
        for (i, g) in groups.iter().enumerate() {
            ui.label(format!("{}. {} ({:.2}, n={})", i + 1, g.label, g.mean, g.count));
        }
    });
}

/// Category label for a whole-number bar position; blank between bars.
fn axis_label(labels: &[String], x: f64) -> String {
    let i = x.round();
    if i < 0.0 || (x - i).abs() > 1e-6 {
        return String::new();
    }
    labels.get(i as usize).cloned().unwrap_or_default()
}

/// Meal name, then cuisine and meal type when the table has them.
fn hover_text(table: &MealTable, point: &ScatterPoint) -> String {
    let mut lines = vec![
        point
            .label
            .clone()
            .unwrap_or_else(|| format!("Row {}", point.row)),
    ];
    for (name, column) in [("Cuisine", CUISINE), ("Meal type", MEAL_TYPE)] {
        if let Some(value) = table.text(point.row, column) {
            lines.push(format!("{name}: {value}"));
        }
    }
    lines.push(format!("Calories: {:.0}", point.calories));
    lines.push(format!("Health Score: {:.1}", point.health_score));
    lines.join("\n")
}

fn coordinates(value: &PlotPoint) -> String {
    format!("Calories: {:.0}\nHealth Score: {:.1}", value.x, value.y)
}

fn scatter_plot(
    ui: &mut Ui,
    series: Arc<ScatterSeries>,
    color_map: Option<&ColorMap>,
    table: Option<Arc<MealTable>>,
) {
    // group label → points; `None` collects rows without a diet type.
    let mut by_group: BTreeMap<Option<&str>, Vec<[f64; 2]>> = BTreeMap::new();
    for p in &series.points {
        by_group
            .entry(p.group.as_deref())
            .or_default()
            .push([p.calories, p.health_score]);
    }

    let x_range = series.points.iter().fold(None, |acc: Option<(f64, f64)>, p| match acc {
        None => Some((p.calories, p.calories)),
        Some((lo, hi)) => Some((lo.min(p.calories), hi.max(p.calories))),
    });

    let hover_series = Arc::clone(&series);
    Plot::new("calories_vs_health")
        .height(PLOT_HEIGHT)
        .legend(Legend::default())
        .label_formatter(move |name, value| {
            // Only the per-diet point series carry meals; the trend line and
            // the bare cursor show coordinates.
            if name.is_empty() || name.starts_with(TREND_NAME) {
                return coordinates(value);
            }
            match (&table, hover_series.nearest(value.x, value.y)) {
                (Some(table), Some(point)) => hover_text(table, point),
                _ => coordinates(value),
            }
        })
        .x_axis_label("Calories (kcal)")
        .y_axis_label("Health Score")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (group, points) in by_group {
                let color = color_map.map_or(Color32::LIGHT_BLUE, |cm| cm.color_for(group));
                plot_ui.points(
                    Points::new(PlotPoints::from(points))
                        .radius(2.5)
                        .color(color)
                        .name(group.unwrap_or("(none)")),
                );
            }

            if let (Some(trend), Some((x0, x1))) = (series.trend, x_range) {
                let line: PlotPoints = [[x0, trend.at(x0)], [x1, trend.at(x1)]]
                    .into_iter()
                    .collect();
                plot_ui.line(
                    Line::new(line)
                        .name(format!("{TREND_NAME} (slope {:.4})", trend.slope))
                        .color(Color32::WHITE)
                        .width(1.5),
                );
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bar_axis_shows_labels_at_whole_positions() {
        let labels = vec!["Greek".to_string(), "Thai".to_string()];
        assert_eq!(axis_label(&labels, 0.0), "Greek");
        assert_eq!(axis_label(&labels, 1.0), "Thai");
        assert_eq!(axis_label(&labels, 0.5), "");
        assert_eq!(axis_label(&labels, 2.0), "");
        assert_eq!(axis_label(&labels, -1.0), "");
    }

    #[test]
    fn hover_names_the_meal_with_cuisine_and_meal_type() {
        let table = MealTable::from_raw(
            ["meal_name", "cuisine", "meal_type", "calories", "health_score"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
            vec![
                ["Pad Thai", "Thai", "Lunch", "610", "58"]
                    .iter()
                    .map(|s| Some(s.to_string()))
                    .collect::<Vec<_>>(),
                vec![None, None, Some("Snack".to_string()), Some("90".into()), Some("70".into())],
            ],
        );
        let point = |row: usize, calories: f64, health_score: f64, label: Option<&str>| ScatterPoint {
            row,
            calories,
            health_score,
            group: None,
            label: label.map(str::to_string),
        };

        assert_eq!(
            hover_text(&table, &point(0, 610.0, 58.0, Some("Pad Thai"))),
            "Pad Thai\nCuisine: Thai\nMeal type: Lunch\nCalories: 610\nHealth Score: 58.0"
        );
        assert_eq!(
            hover_text(&table, &point(1, 90.0, 70.0, None)),
            "Row 1\nMeal type: Snack\nCalories: 90\nHealth Score: 70.0"
        );
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(999), "999");
        assert_eq!(thousands(1000), "1,000");
        assert_eq!(thousands(1234567), "1,234,567");
    }
}
