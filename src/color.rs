use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

fn hsl_to_color32(hsl: Hsl) -> Color32 {
    let rgb: Srgb = hsl.into_color();
    Color32::from_rgb(
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            hsl_to_color32(Hsl::new(hue, 0.75, 0.55))
        })
        .collect()
}

/// Single-hue ramp for bar heights: `t = 0` is pale, `t = 1` is saturated.
pub fn sequential(hue: f32, t: f64) -> Color32 {
    let t = t.clamp(0.0, 1.0) as f32;
    hsl_to_color32(Hsl::new(hue, 0.35 + 0.45 * t, 0.80 - 0.45 * t))
}

// ---------------------------------------------------------------------------
// Color mapping: category label → Color32
// ---------------------------------------------------------------------------

/// Maps the labels of a categorical column (e.g. `diet_type`) to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map from a column's unique labels.
    pub fn new(labels: &BTreeSet<String>) -> Self {
        let mapping = labels
            .iter()
            .cloned()
            .zip(generate_palette(labels.len()))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Colour for a label; missing or unknown labels are grey.
    pub fn color_for(&self, label: Option<&str>) -> Color32 {
        label
            .and_then(|l| self.mapping.get(l))
            .copied()
            .unwrap_or(self.default_color)
    }
}
