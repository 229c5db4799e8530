use eframe::egui::{self, Color32, RichText, Ui};

use crate::state::AppState;
use crate::ui::{panels, plot, preview};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct MealDashboardApp {
    pub state: AppState,
}

impl MealDashboardApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for MealDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // A missing input file halts everything else.
        if let Some(err) = &self.state.fatal_error {
            egui::CentralPanel::default().show(ctx, |ui: &mut Ui| {
                ui.centered_and_justified(|ui: &mut Ui| {
                    ui.label(RichText::new(err).color(Color32::RED).heading());
                });
            });
            return;
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui: &mut Ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(240.0)
            .resizable(true)
            .show(ctx, |ui: &mut Ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: data preview ----
        egui::TopBottomPanel::bottom("preview_panel")
            .resizable(true)
            .default_height(260.0)
            .show(ctx, |ui: &mut Ui| {
                preview::preview_panel(ui, &self.state);
            });

        // ---- Central panel: KPIs and charts ----
        egui::CentralPanel::default().show(ctx, |ui: &mut Ui| {
            let Some(summary) = &self.state.summary else {
                ui.centered_and_justified(|ui: &mut Ui| {
                    ui.heading("Open a file to explore meals  (File → Open…)");
                });
                return;
            };
            plot::kpi_row(ui, &summary.kpis);
            ui.separator();
            plot::chart_tabs(ui, &mut self.state);
        });
    }
}
