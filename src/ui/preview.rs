use eframe::egui::{self, Align, Layout, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};

use crate::state::AppState;

const ROW_HEIGHT: f32 = 18.0;

// ---------------------------------------------------------------------------
// Filtered rows preview (bottom panel)
// ---------------------------------------------------------------------------

pub fn preview_panel(ui: &mut Ui, state: &AppState) {
    let Some(table) = state.table.as_deref() else {
        return;
    };
    let rows = state.preview_indices();

    ui.horizontal(|ui: &mut Ui| {
        ui.heading("Filtered Meals");
        ui.label(
            RichText::new(format!(
                "showing {} of {}",
                rows.len(),
                state.visible_indices.len()
            ))
            .weak(),
        );
    });
    ui.label(RichText::new(&state.artifact_note).small().weak());
    ui.separator();

    ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .cell_layout(Layout::left_to_right(Align::Center))
            .columns(Column::auto().at_least(60.0).clip(true), table.columns().len())
            .header(ROW_HEIGHT + 4.0, |mut header| {
                for name in table.columns() {
                    header.col(|ui: &mut Ui| {
                        ui.strong(name.as_str());
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                    let record = &table.rows()[rows[row.index()]];
                    for cell in &record.cells {
                        row.col(|ui: &mut Ui| {
                            if cell.is_missing() {
                                ui.label(RichText::new("–").weak());
                            } else {
                                ui.add(egui::Label::new(cell.to_string()).truncate());
                            }
                        });
                    }
                });
            });
    });
}
