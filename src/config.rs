use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::data::aggregate::{HISTOGRAM_BINS, TOP_N};

/// Optional config file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "meal_dashboard.json";

pub const ENV_DATA_PATH: &str = "MEAL_DASHBOARD_DATA";
pub const ENV_ARTIFACT_DIR: &str = "MEAL_DASHBOARD_ARTIFACT_DIR";
pub const ENV_BINS: &str = "MEAL_DASHBOARD_BINS";
pub const ENV_TOP_N: &str = "MEAL_DASHBOARD_TOP_N";
pub const ENV_PREVIEW_ROWS: &str = "MEAL_DASHBOARD_PREVIEW_ROWS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// The cleaned dataset to open at startup.
    pub data_path: PathBuf,
    /// Directory scanned for a trained-model artifact.
    pub artifact_dir: PathBuf,
    pub default_bins: usize,
    pub default_top_n: usize,
    /// Rows shown in the preview table.
    pub preview_rows: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("healthy_eating_dataset_clean.csv"),
            artifact_dir: PathBuf::from("."),
            default_bins: 40,
            default_top_n: 10,
            preview_rows: 500,
        }
    }
}

impl DashboardConfig {
    /// Defaults, then `meal_dashboard.json` in `dir` if present, then the
    /// process environment, then an optional data path from the command line.
    pub fn resolve(dir: &Path, cli_data_path: Option<PathBuf>) -> Result<Self> {
        let mut config = Self::from_dir(dir)?;
        config.merge_env(|key| std::env::var(key).ok());
        if let Some(path) = cli_data_path {
            config.data_path = path;
        }
        Ok(config.clamped())
    }

    /// Defaults overlaid with `dir/meal_dashboard.json` when the file exists.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Apply `MEAL_DASHBOARD_*` overrides.  Unparsable numbers are ignored
    /// with a warning.
    pub fn merge_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENV_DATA_PATH) {
            self.data_path = PathBuf::from(path);
        }
        if let Some(dir) = lookup(ENV_ARTIFACT_DIR) {
            self.artifact_dir = PathBuf::from(dir);
        }
        for (key, slot) in [
            (ENV_BINS, &mut self.default_bins),
            (ENV_TOP_N, &mut self.default_top_n),
            (ENV_PREVIEW_ROWS, &mut self.preview_rows),
        ] {
            let Some(raw) = lookup(key) else {
                continue;
            };
            match raw.trim().parse() {
                Ok(value) => *slot = value,
                Err(_) => log::warn!("Ignoring {key}={raw:?}: not a whole number"),
            }
        }
    }

    /// Pull the chart parameters into their allowed ranges.
    pub fn clamped(mut self) -> Self {
        self.default_bins = self
            .default_bins
            .clamp(*HISTOGRAM_BINS.start(), *HISTOGRAM_BINS.end());
        self.default_top_n = self.default_top_n.clamp(*TOP_N.start(), *TOP_N.end());
        self
    }
}
