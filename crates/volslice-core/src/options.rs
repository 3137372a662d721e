//! Configuration options for slice drawing.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How label volumes are drawn in orthogonal slices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LabelDrawingType {
    /// Every labeled voxel is drawn.
    #[default]
    Filled,
    /// Only voxels on a boundary between labels are drawn.
    Outline,
}

/// Polygon depth offset applied to layers above the first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DepthOffset {
    pub factor: f32,
    pub units: f32,
}

impl Default for DepthOffset {
    fn default() -> Self {
        Self {
            factor: -1.0,
            units: -1.0,
        }
    }
}

/// Options for slice drawing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SliceDrawOptions {
    /// Oblique step multiplier when three slices are drawn in a 3D view.
    pub reduced_detail_factor: f32,

    /// Fraction of the viewport height the reference volume occupies at zoom 1.
    pub orthographic_margin: f32,

    /// Enlargement of the orthographic bounds when drawn with other structures.
    pub all_structures_scale: f32,

    /// Depth bias for every overlay after the first.
    pub layer_depth_offset: DepthOffset,

    /// How label volumes are drawn.
    pub label_drawing: LabelDrawingType,

    /// Gap between montage cells, in pixels.
    pub montage_gap: i32,

    /// Digits after the decimal point in montage coordinate labels.
    pub montage_coordinate_precision: usize,

    /// Whether montage cells are labeled with their slice coordinate.
    pub show_montage_coordinates: bool,

    /// Gap between the views of the all view, in pixels.
    pub all_view_gap: i32,

    /// Whether crosshair lines are drawn through the selected coordinate.
    pub show_crosshairs: bool,
}

impl Default for SliceDrawOptions {
    fn default() -> Self {
        Self {
            reduced_detail_factor: 3.0,
            orthographic_margin: 0.98,
            all_structures_scale: 2.0,
            layer_depth_offset: DepthOffset::default(),
            label_drawing: LabelDrawingType::Filled,
            montage_gap: 3,
            montage_coordinate_precision: 0,
            show_montage_coordinates: true,
            all_view_gap: 2,
            show_crosshairs: false,
        }
    }
}

impl SliceDrawOptions {
    /// Parses options from JSON. Missing fields take their default values.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes options to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Loads options from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Saves options to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
