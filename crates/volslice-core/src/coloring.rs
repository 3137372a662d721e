//! Bulk coloring of sampled volume values.
//!
//! Values are never colored one at a time: a whole slice (or a whole oblique
//! value buffer) is passed in and an RGBA byte buffer of the same element count
//! is filled in a single call.

use std::collections::{BTreeMap, HashMap};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VolsliceError};

/// A palette mapping normalized values in [0, 1] to colors.
#[derive(Debug, Clone)]
pub struct Palette {
    /// Palette name.
    pub name: String,
    /// Control colors, evenly spaced from 0 to 1.
    pub colors: Vec<Vec3>,
}

impl Palette {
    /// Creates a new palette.
    pub fn new(name: impl Into<String>, colors: Vec<Vec3>) -> Self {
        Self {
            name: name.into(),
            colors,
        }
    }

    /// Samples the palette at a normalized value.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn sample(&self, t: f32) -> Vec3 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        match self.colors.len() {
            0 => Vec3::ZERO,
            1 => self.colors[0],
            len => {
                let n = len - 1;
                let idx = ((t * n as f32).floor() as usize).min(n - 1);
                let frac = t * n as f32 - idx as f32;
                self.colors[idx].lerp(self.colors[idx + 1], frac)
            }
        }
    }
}

/// Looks up palettes by name.
pub trait ColorMapper {
    /// Returns the palette with the given name, if registered.
    fn palette_by_name(&self, name: &str) -> Option<&Palette>;
}

/// Registry of named palettes.
#[derive(Debug, Default)]
pub struct PaletteRegistry {
    palettes: HashMap<String, Palette>,
}

impl PaletteRegistry {
    /// Creates a registry holding the default palettes.
    pub fn new() -> Self {
        let mut registry = Self::default();
        registry.register_defaults();
        registry
    }

    fn register_defaults(&mut self) {
        self.register(Palette::new("Gray_Interp", vec![Vec3::ZERO, Vec3::ONE]));

        // negative: green to blue to black, positive: red to orange to yellow
        self.register(Palette::new(
            "ROY-BIG-BL",
            vec![
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(0.0, 0.4, 1.0),
                Vec3::new(0.0, 0.0, 0.7),
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.8, 0.0, 0.0),
                Vec3::new(1.0, 0.47, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
            ],
        ));

        self.register(Palette::new(
            "videen_style",
            vec![
                Vec3::new(0.0, 1.0, 1.0),
                Vec3::new(0.0, 0.6, 0.6),
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(0.4, 0.0, 0.6),
                Vec3::new(0.2, 0.2, 0.2),
                Vec3::new(0.6, 0.0, 0.2),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.6, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
            ],
        ));

        self.register(Palette::new(
            "viridis",
            vec![
                Vec3::new(0.267, 0.004, 0.329),
                Vec3::new(0.282, 0.140, 0.457),
                Vec3::new(0.253, 0.265, 0.529),
                Vec3::new(0.206, 0.371, 0.553),
                Vec3::new(0.163, 0.471, 0.558),
                Vec3::new(0.127, 0.566, 0.550),
                Vec3::new(0.134, 0.658, 0.517),
                Vec3::new(0.266, 0.749, 0.440),
                Vec3::new(0.477, 0.821, 0.318),
                Vec3::new(0.741, 0.873, 0.150),
                Vec3::new(0.993, 0.906, 0.144),
            ],
        ));
    }

    /// Registers a palette, replacing any palette with the same name.
    pub fn register(&mut self, palette: Palette) {
        self.palettes.insert(palette.name.clone(), palette);
    }

    /// Gets a palette by name.
    pub fn get(&self, name: &str) -> Option<&Palette> {
        self.palettes.get(name)
    }

    /// Returns all palette names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.palettes.keys().map(String::as_str)
    }
}

impl ColorMapper for PaletteRegistry {
    fn palette_by_name(&self, name: &str) -> Option<&Palette> {
        self.get(name)
    }
}

/// How values are normalized before the palette lookup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum PaletteScale {
    /// Use the minimum and maximum of the map.
    #[default]
    AutoScale,
    /// Use a fixed value range.
    Fixed { min: f32, max: f32 },
}

/// Which side of the threshold is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThresholdTest {
    /// Show values above the threshold.
    ShowAbove,
    /// Show values below the threshold.
    ShowBelow,
}

/// A display threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaletteThreshold {
    pub test: ThresholdTest,
    pub value: f32,
}

impl PaletteThreshold {
    /// Returns whether a value passes the threshold.
    pub fn passes(&self, value: f32) -> bool {
        match self.test {
            ThresholdTest::ShowAbove => value > self.value,
            ThresholdTest::ShowBelow => value < self.value,
        }
    }
}

/// Palette settings for a scalar volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteColorMapping {
    /// Name of the palette, resolved through a [`ColorMapper`].
    pub palette_name: String,
    /// Value normalization.
    pub scale: PaletteScale,
    /// Optional threshold hiding values that fail the test.
    pub threshold: Option<PaletteThreshold>,
    /// Whether exactly-zero values are drawn.
    pub display_zero: bool,
    /// Whether positive values are drawn.
    pub display_positive: bool,
    /// Whether negative values are drawn.
    pub display_negative: bool,
}

impl PaletteColorMapping {
    /// Creates a mapping with auto scaling that displays every value except zero.
    pub fn new(palette_name: impl Into<String>) -> Self {
        Self {
            palette_name: palette_name.into(),
            scale: PaletteScale::AutoScale,
            threshold: None,
            display_zero: false,
            display_positive: true,
            display_negative: true,
        }
    }

    fn value_range(&self, statistics: &VolumeStatistics) -> (f32, f32) {
        match self.scale {
            PaletteScale::AutoScale => (statistics.min, statistics.max),
            PaletteScale::Fixed { min, max } => (min, max),
        }
    }

    fn displayed(&self, value: f32) -> bool {
        if value.is_nan() {
            return false;
        }
        let sign_shown = if value > 0.0 {
            self.display_positive
        } else if value < 0.0 {
            self.display_negative
        } else {
            self.display_zero
        };
        sign_shown && self.threshold.map_or(true, |t| t.passes(value))
    }
}

/// One entry of a label table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub rgba: [u8; 4],
}

/// Integer label key to name and color.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelTable {
    labels: BTreeMap<i32, Label>,
}

impl LabelTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a label.
    pub fn insert(&mut self, key: i32, name: impl Into<String>, rgba: [u8; 4]) {
        self.labels.insert(
            key,
            Label {
                name: name.into(),
                rgba,
            },
        );
    }

    /// Returns the label for a key.
    pub fn label(&self, key: i32) -> Option<&Label> {
        self.labels.get(&key)
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns whether the table has no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// How an overlay's values become colors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColorMapping {
    /// Scalar values through a named palette.
    Palette(PaletteColorMapping),
    /// Integer keys through a label table.
    Labels(LabelTable),
}

impl ColorMapping {
    /// Returns whether values are label keys.
    pub fn is_label(&self) -> bool {
        matches!(self, ColorMapping::Labels(_))
    }
}

/// Summary statistics of one map, used for auto scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VolumeStatistics {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
}

impl VolumeStatistics {
    /// Computes statistics over the finite values.
    #[allow(clippy::cast_precision_loss)]
    pub fn from_values(values: &[f32]) -> Self {
        let mut min = f32::MAX;
        let mut max = f32::MIN;
        let mut sum = 0.0f64;
        let mut count = 0usize;
        for &v in values.iter().filter(|v| v.is_finite()) {
            min = min.min(v);
            max = max.max(v);
            sum += f64::from(v);
            count += 1;
        }
        if count == 0 {
            return Self::default();
        }
        #[allow(clippy::cast_possible_truncation)]
        let mean = (sum / count as f64) as f32;
        Self { min, max, mean }
    }
}

impl Default for VolumeStatistics {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: 1.0,
            mean: 0.5,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_byte(c: f32) -> u8 {
    (c.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Colors scalar values through a palette.
///
/// `rgba` must hold four bytes per value. Values that are not displayed get
/// zero alpha.
pub fn color_scalars_with_palette(
    statistics: &VolumeStatistics,
    mapping: &PaletteColorMapping,
    palette: &Palette,
    values: &[f32],
    rgba: &mut [u8],
) {
    let (lo, hi) = mapping.value_range(statistics);
    let range = hi - lo;
    for (value, out) in values.iter().zip(rgba.chunks_exact_mut(4)) {
        if !mapping.displayed(*value) {
            out.copy_from_slice(&[0, 0, 0, 0]);
            continue;
        }
        let t = if range > 0.0 { (value - lo) / range } else { 0.5 };
        let c = palette.sample(t);
        out.copy_from_slice(&[to_byte(c.x), to_byte(c.y), to_byte(c.z), 255]);
    }
}

/// Colors label keys through a label table. Unknown keys are transparent.
#[allow(clippy::cast_possible_truncation)]
pub fn color_indices_with_label_table(table: &LabelTable, values: &[f32], rgba: &mut [u8]) {
    for (value, out) in values.iter().zip(rgba.chunks_exact_mut(4)) {
        let color = if value.is_finite() {
            table.label(value.round() as i32).map_or([0; 4], |l| l.rgba)
        } else {
            [0; 4]
        };
        out.copy_from_slice(&color);
    }
}

/// Colors values with an overlay's mapping.
///
/// A palette that cannot be found leaves the output fully transparent and
/// returns [`VolsliceError::MissingPalette`].
pub fn color_values(
    mapping: &ColorMapping,
    statistics: &VolumeStatistics,
    mapper: &dyn ColorMapper,
    values: &[f32],
    rgba: &mut [u8],
) -> Result<()> {
    match mapping {
        ColorMapping::Palette(palette_mapping) => {
            let Some(palette) = mapper.palette_by_name(&palette_mapping.palette_name) else {
                rgba.fill(0);
                return Err(VolsliceError::MissingPalette(palette_mapping.palette_name.clone()));
            };
            color_scalars_with_palette(statistics, palette_mapping, palette, values, rgba);
        }
        ColorMapping::Labels(table) => color_indices_with_label_table(table, values, rgba),
    }
    Ok(())
}

/// Keeps only the pixels of a colored 2D slice that lie on a label boundary.
///
/// A visible pixel is kept when any of its four neighbours differs in color or
/// falls outside the slice; interior pixels become transparent.
pub fn convert_slice_coloring_to_outline_mode(rgba: &mut [u8], columns: usize, rows: usize) {
    if rgba.len() < columns * rows * 4 {
        return;
    }
    let source = rgba[..columns * rows * 4].to_vec();
    let pixel = |c: usize, r: usize| {
        let o = (c + r * columns) * 4;
        &source[o..o + 4]
    };

    for r in 0..rows {
        for c in 0..columns {
            let here = pixel(c, r);
            if here[3] == 0 {
                continue;
            }
            let boundary = c == 0
                || r == 0
                || c + 1 == columns
                || r + 1 == rows
                || pixel(c - 1, r) != here
                || pixel(c + 1, r) != here
                || pixel(c, r - 1) != here
                || pixel(c, r + 1) != here;
            if !boundary {
                let o = (c + r * columns) * 4;
                rgba[o..o + 4].fill(0);
            }
        }
    }
}
