use std::collections::BTreeMap;

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

use crate::data::model::{Dataset, Dimension};

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
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            Color32::from_rgb(
                (rgb.red * 255.0) as u8,
                (rgb.green * 255.0) as u8,
                (rgb.blue * 255.0) as u8,
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Color mapping: group label → Color32
// ---------------------------------------------------------------------------

/// Maps a fixed list of labels to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    pub fn new<'a>(labels: impl IntoIterator<Item = &'a String>) -> Self {
        let labels: Vec<&String> = labels.into_iter().collect();
        let palette = generate_palette(labels.len());
        let mapping = labels
            .into_iter()
            .zip(palette)
            .map(|(label, c)| (label.clone(), c))
            .collect();

        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    /// Look up the colour for a given label.
    pub fn color_for(&self, label: &str) -> Color32 {
        self.mapping
            .get(label)
            .copied()
            .unwrap_or(self.default_color)
    }
}

/// One [`ColorMap`] per dimension, built from every label in the loaded
/// dataset. Charts share these maps, so a season or day type keeps its colour
/// across chart kinds and filter changes.
#[derive(Debug, Clone)]
pub struct DimensionColors {
    maps: BTreeMap<Dimension, ColorMap>,
    fallback: ColorMap,
}

impl DimensionColors {
    pub fn new(dataset: &Dataset) -> Self {
        let maps = Dimension::ALL
            .into_iter()
            .map(|dim| (dim, ColorMap::new(&dataset.labels(dim))))
            .collect();
        DimensionColors {
            maps,
            fallback: ColorMap::new(std::iter::empty()),
        }
    }

    pub fn get(&self, dim: Dimension) -> &ColorMap {
        self.maps.get(&dim).unwrap_or(&self.fallback)
    }
}

// ---------------------------------------------------------------------------
// Sequential scale for heatmaps
// ---------------------------------------------------------------------------

/// Yellow → green → blue stops.
const YL_GN_BU: [(u8, u8, u8); 9] = [
    (255, 255, 217),
    (237, 248, 177),
    (199, 233, 180),
    (127, 205, 187),
    (65, 182, 196),
    (29, 145, 192),
    (34, 94, 168),
    (37, 52, 148),
    (8, 29, 88),
];

fn stop(i: usize) -> LinSrgb {
    let (r, g, b) = YL_GN_BU[i];
    Srgb::new(r, g, b).into_format::<f32>().into_linear()
}

/// Colour for `t` in `0.0..=1.0`, interpolated in linear RGB.
pub fn heat_color(t: f64) -> Color32 {
    let last = YL_GN_BU.len() - 1;
    let pos = (t.clamp(0.0, 1.0) as f32) * last as f32;
    let i = (pos.floor() as usize).min(last - 1);
    let frac = pos - i as f32;

    let mixed = stop(i).mix(stop(i + 1), frac);
    let rgb: Srgb<u8> = Srgb::from_linear(mixed);
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

/// Annotation colour on a heatmap cell: light text above `threshold`.
pub fn annotation_color(value: f64, threshold: f64) -> Color32 {
    if value > threshold {
        Color32::WHITE
    } else {
        Color32::BLACK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_requested_size() {
        assert!(generate_palette(0).is_empty());
        let colors = generate_palette(4);
        assert_eq!(colors.len(), 4);
        assert_ne!(colors[0], colors[1]);
    }

    #[test]
    fn heat_scale_endpoints() {
        let close = |a: Color32, b: Color32| {
            a.to_array()
                .iter()
                .zip(b.to_array())
                .all(|(x, y)| x.abs_diff(y) <= 1)
        };
        assert!(close(heat_color(0.0), Color32::from_rgb(255, 255, 217)));
        assert!(close(heat_color(1.0), Color32::from_rgb(8, 29, 88)));
        assert_eq!(heat_color(-3.0), heat_color(0.0));
    }

    #[test]
    fn unknown_label_uses_default() {
        let labels = vec!["Weekday".to_string(), "Weekend".to_string()];
        let map = ColorMap::new(&labels);
        assert_ne!(map.color_for("Weekday"), Color32::GRAY);
        assert_eq!(map.color_for("Holiday"), Color32::GRAY);
    }

    #[test]
    fn dimension_colours_ignore_the_filtered_subset() {
        use crate::data::filter::{filter, FilterCriteria};
        use crate::data::model::fixtures::sample;

        let ds = sample();
        let colors = DimensionColors::new(&ds);
        let autumn = colors.get(Dimension::Season).color_for("Musim Gugur");
        assert_ne!(autumn, Color32::GRAY);

        // A chart-local map over a filtered label list would shift hues.
        let criteria = FilterCriteria {
            seasons: ["Musim Gugur", "Musim Semi"].map(String::from).into(),
            ..Default::default()
        };
        let subset = filter(&ds, &criteria);
        let local = ColorMap::new(&subset.labels(Dimension::Season));
        assert_ne!(local.color_for("Musim Gugur"), autumn);

        let seasons = colors.get(Dimension::Season);
        let distinct: std::collections::BTreeSet<_> = ds
            .labels(Dimension::Season)
            .iter()
            .map(|l| seasons.color_for(l).to_array())
            .collect();
        assert_eq!(distinct.len(), 4);
    }
}
