use eframe::egui::{self, Color32, RichText, ScrollArea, Slider, Ui};

use meal_dashboard::data::export::EXPORT_FILE_NAME;
use meal_dashboard::data::filter::{CategoricalColumn, NumericRange};
use meal_dashboard::data::model::{CALORIES, HEALTH_SCORE};

use crate::state::{AppState, Status};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.table.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for column in CategoricalColumn::ALL {
                category_filter(ui, state, column);
            }
            ui.separator();
            range_filters(ui, state);
        });
}

/// Collapsible checkbox list for one categorical column.
fn category_filter(ui: &mut Ui, state: &mut AppState, column: CategoricalColumn) {
    // Clone so we can mutate state inside the loop.
    let Some(all_values) = state.options.get(&column).cloned() else {
        return;
    };

    let n_selected = state.filters.selection(column).map_or(0, |s| s.len());
    let n_total = all_values.len();
    let header_text = format!("{column}  ({n_selected}/{n_total})");

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(column.column_name())
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(column);
                }
                if ui
                    .small_button("None")
                    .on_hover_text("Nothing selected shows every row")
                    .clicked()
                {
                    state.select_none(column);
                }
            });

            for val in &all_values {
                let mut checked = state
                    .filters
                    .selection(column)
                    .is_some_and(|s| s.contains(val));

                // Diet types carry their scatter-plot colour.
                let mut text = RichText::new(val.as_str());
                if column == CategoricalColumn::DietType {
                    if let Some(cm) = &state.color_map {
                        text = text.color(cm.color_for(Some(val.as_str())));
                    }
                }

                if ui.checkbox(&mut checked, text).changed() {
                    state.set_category(column, val, checked);
                }
            }
        });
}

fn range_filters(ui: &mut Ui, state: &mut AppState) {
    if let Some((lo, hi)) = state.calorie_bounds {
        ui.strong("Calories range");
        let mut range = state.filters.calories.unwrap_or(NumericRange::new(lo, hi));
        if range_sliders(ui, &mut range, lo, hi) {
            state.set_calorie_range(range);
        }
    } else if !state.has_column(CALORIES) {
        ui.label(RichText::new("Column 'calories' not available.").weak());
    }

    ui.add_space(6.0);

    if state.has_column(HEALTH_SCORE) {
        ui.strong("Health Score range");
        let mut range = state
            .filters
            .health_score
            .unwrap_or(NumericRange::new(0.0, 100.0));
        if range_sliders(ui, &mut range, 0.0, 100.0) {
            state.set_health_score_range(range);
        }
    }
}

/// Min / max sliders with a step of one; returns whether either moved.
fn range_sliders(ui: &mut Ui, range: &mut NumericRange, lo: f64, hi: f64) -> bool {
    let min_changed = ui
        .add(Slider::new(&mut range.min, lo..=hi).step_by(1.0).text("min"))
        .changed();
    let max_changed = ui
        .add(Slider::new(&mut range.max, lo..=hi).step_by(1.0).text("max"))
        .changed();
    min_changed || max_changed
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_export = state.table.is_some();
            if ui
                .add_enabled(can_export, egui::Button::new("Export filtered CSV…"))
                .clicked()
            {
                save_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let (Some(table), Some(path)) = (&state.table, &state.source_path) {
            let name = path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
            ui.label(RichText::new(name).strong());
            ui.label(format!(
                "{} meals loaded, {} visible",
                table.len(),
                state.visible_indices.len()
            ));
        }

        ui.separator();

        match &state.status {
            Some(Status::Info(msg)) => {
                ui.label(msg);
            }
            Some(Status::Error(msg)) => {
                ui.label(RichText::new(msg).color(Color32::RED));
            }
            None => {}
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open meal data")
        .add_filter("Supported files", &["csv", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.open(&path) {
            log::error!("Failed to load file: {e:#}");
            state.status = Some(Status::Error(format!("Error: {e:#}")));
        }
    }
}

pub fn save_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Download filtered data (CSV)")
        .set_file_name(EXPORT_FILE_NAME)
        .add_filter("CSV", &["csv"])
        .save_file();

    if let Some(path) = file {
        state.save_export(&path);
    }
}
