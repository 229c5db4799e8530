mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use app::MealDashboardApp;
use eframe::egui;
use meal_dashboard::config::DashboardConfig;
use meal_dashboard::data::cache::TableCache;
use state::AppState;

fn main() -> Result<()> {
    env_logger::init();

    let cwd = std::env::current_dir().context("resolving working directory")?;
    let cli_data_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = DashboardConfig::resolve(&cwd, cli_data_path).context("loading configuration")?;
    log::info!("Using dataset {}", config.data_path.display());

    let mut state = AppState::new(config, TableCache::new());
    state.open_initial();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Healthy Meals – Interactive Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(MealDashboardApp::new(state)))),
    )
    .map_err(|e| anyhow!("running the dashboard window: {e}"))
}
