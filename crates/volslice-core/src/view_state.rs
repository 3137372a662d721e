//! Per-draw view state and the per-plane structural parameters.

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// The plane a slice view looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ViewPlane {
    /// Constant Z, viewed from +Z.
    #[default]
    Axial,
    /// Constant Y, viewed from -Y.
    Coronal,
    /// Constant X, viewed from -X.
    Parasagittal,
    /// Parasagittal, coronal and axial side by side.
    All,
}

/// How slices are oriented and laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ViewMode {
    /// Axis-aligned slices drawn on each volume's native grid.
    #[default]
    Orthogonal,
    /// Slices cut along the rotated plane.
    Oblique,
    /// A grid of axis-aligned slices stepping through the volume.
    Montage,
}

/// What kind of view a slice is drawn into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DrawMode {
    /// One slice fills the view.
    #[default]
    SingleSlice,
    /// All three slices shown together in a 3D view, at reduced detail.
    ThreeDimensional,
    /// Slices drawn among other structures.
    AllStructures,
}

/// Structural parameters of a slice view plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneAxes {
    /// Coordinate axis that is constant on the slice (0 = X, 1 = Y, 2 = Z).
    pub through_axis: usize,
    /// Plane normal before any oblique rotation.
    pub normal: Vec3,
    /// Axis that runs left to right on screen.
    pub screen_x: Vec3,
    /// Axis that runs bottom to top on screen.
    pub screen_y: Vec3,
    /// Camera up vector before any oblique rotation.
    pub up: Vec3,
    /// Native index axis of slice columns.
    pub column_axis: usize,
    /// Native index axis of slice rows.
    pub row_axis: usize,
    /// Sign of the horizontal camera pan.
    pub pan_x_sign: f32,
    /// Coordinate letter used in montage labels.
    pub coordinate_label: char,
}

const AXIAL_AXES: PlaneAxes = PlaneAxes {
    through_axis: 2,
    normal: Vec3::Z,
    screen_x: Vec3::X,
    screen_y: Vec3::Y,
    up: Vec3::Y,
    column_axis: 0,
    row_axis: 1,
    pan_x_sign: 1.0,
    coordinate_label: 'Z',
};

const CORONAL_AXES: PlaneAxes = PlaneAxes {
    through_axis: 1,
    normal: Vec3::NEG_Y,
    screen_x: Vec3::X,
    screen_y: Vec3::Z,
    up: Vec3::Z,
    column_axis: 0,
    row_axis: 2,
    pan_x_sign: 1.0,
    coordinate_label: 'Y',
};

const PARASAGITTAL_AXES: PlaneAxes = PlaneAxes {
    through_axis: 0,
    normal: Vec3::NEG_X,
    screen_x: Vec3::Y,
    screen_y: Vec3::Z,
    up: Vec3::Z,
    column_axis: 1,
    row_axis: 2,
    pan_x_sign: -1.0,
    coordinate_label: 'X',
};

impl ViewPlane {
    /// The three slice planes in the order they are laid out in the all view.
    pub const SLICE_PLANES: [ViewPlane; 3] = [ViewPlane::Parasagittal, ViewPlane::Coronal, ViewPlane::Axial];

    /// Structural parameters of the plane. [`ViewPlane::All`] resolves like axial.
    pub fn axes(self) -> &'static PlaneAxes {
        match self {
            ViewPlane::Axial | ViewPlane::All => &AXIAL_AXES,
            ViewPlane::Coronal => &CORONAL_AXES,
            ViewPlane::Parasagittal => &PARASAGITTAL_AXES,
        }
    }

    /// Display name.
    pub fn name(self) -> &'static str {
        match self {
            ViewPlane::Axial => "axial",
            ViewPlane::Coronal => "coronal",
            ViewPlane::Parasagittal => "parasagittal",
            ViewPlane::All => "all",
        }
    }
}

/// Montage grid settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MontageSettings {
    pub rows: usize,
    pub columns: usize,
    /// Number of voxel slices between adjacent montage cells.
    pub slice_spacing: usize,
}

impl Default for MontageSettings {
    fn default() -> Self {
        Self {
            rows: 3,
            columns: 4,
            slice_spacing: 5,
        }
    }
}

/// Everything a draw needs to know about the view, passed explicitly per draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    /// Selected slice coordinates.
    pub slice_coordinates: Vec3,
    /// Rotation applied to oblique slices.
    pub oblique_rotation: Mat4,
    /// Pan in world units.
    pub translation: Vec3,
    /// Zoom factor, 1 shows the whole reference volume.
    pub zoom: f32,
    pub view_plane: ViewPlane,
    pub view_mode: ViewMode,
    pub montage: MontageSettings,
}

impl ViewState {
    /// Creates a state looking at the given coordinates.
    pub fn new(slice_coordinates: Vec3) -> Self {
        Self {
            slice_coordinates,
            ..Self::default()
        }
    }

    /// Returns whether slices are cut obliquely.
    pub fn is_oblique(&self) -> bool {
        self.view_mode == ViewMode::Oblique
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            slice_coordinates: Vec3::ZERO,
            oblique_rotation: Mat4::IDENTITY,
            translation: Vec3::ZERO,
            zoom: 1.0,
            view_plane: ViewPlane::Axial,
            view_mode: ViewMode::Orthogonal,
            montage: MontageSettings::default(),
        }
    }
}
