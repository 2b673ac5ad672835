use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, Srgb};

use crate::data::model::Category;

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            to_color32(Hsl::new(hue, 0.75, 0.55).into_color())
        })
        .collect()
}

fn to_color32(rgb: Srgb) -> Color32 {
    Color32::from_rgb(
        (rgb.red * 255.0) as u8,
        (rgb.green * 255.0) as u8,
        (rgb.blue * 255.0) as u8,
    )
}

/// Heat-map ramp: yellow at low intensity to red at the densest cell.
pub fn heat_color(intensity: f64) -> Color32 {
    let t = intensity.clamp(0.0, 1.0) as f32;
    let hsl = Hsl::new(55.0 * (1.0 - t), 0.95 - 0.05 * t, 0.6 - 0.15 * t);
    let c = to_color32(hsl.into_color());
    let alpha = (60.0 + 170.0 * t) as u8;
    Color32::from_rgba_unmultiplied(c.r(), c.g(), c.b(), alpha)
}

// ---------------------------------------------------------------------------
// Color mapping: category value → Color32
// ---------------------------------------------------------------------------

/// Maps the distinct values of one category to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub category: Category,
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    /// Build a colour map for the given category from its distinct values.
    pub fn new(category: Category, values: &BTreeSet<String>) -> Self {
        let palette = generate_palette(values.len());
        let mapping: BTreeMap<String, Color32> = values
            .iter()
            .cloned()
            .zip(palette)
            .collect();

        ColorMap {
            category,
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given value; blanks fall back to grey.
    pub fn color_for(&self, value: &str) -> Color32 {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }

    /// Return the legend entries (value label → colour) for the UI.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        self.mapping
            .iter()
            .map(|(v, c)| (v.clone(), *c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let p = generate_palette(4);
        assert_eq!(p.len(), 4);
        assert_ne!(p[0], p[2]);
    }

    #[test]
    fn unknown_values_are_grey() {
        let values: BTreeSet<String> = ["Choque", "Caída"].iter().map(|s| s.to_string()).collect();
        let cm = ColorMap::new(Category::Clase, &values);
        assert_eq!(cm.color_for(""), Color32::GRAY);
        assert_ne!(cm.color_for("Choque"), Color32::GRAY);
        assert_eq!(cm.legend_entries().len(), 2);
    }

    #[test]
    fn heat_gets_more_opaque() {
        assert!(heat_color(1.0).a() > heat_color(0.0).a());
    }
}
