//! Slice plane, camera and orthographic projection for a view.
//!
//! Everything here is recomputed for every draw from the [`ViewState`]; nothing
//! is cached between draws.

use glam::{IVec3, Mat4, Vec3};
use volslice_core::{BoundingBox, Plane, ViewPlane, ViewState, VolumeGeometry};

use crate::error::{DrawError, DrawResult};
use crate::layout::Viewport;

/// Orthographic near and far depth.
const ORTHOGRAPHIC_DEPTH: f32 = 1000.0;

/// Distance of the 3D view camera from the origin.
const THREE_SLICE_EYE_DISTANCE: f32 = 100.0;

/// A resolved slice plane with the point the camera looks at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliceFrame {
    pub view_plane: ViewPlane,
    pub plane: Plane,
    pub look_at_center: Vec3,
}

/// Resolves the slice plane for a view.
///
/// The normal comes from the view plane, rotated by the oblique rotation in
/// oblique mode. The plane passes through the selected coordinates, except
/// that a montage slice index replaces the through-axis coordinate with that
/// slice's coordinate in the reference volume.
pub fn resolve_slice_plane(
    state: &ViewState,
    view_plane: ViewPlane,
    reference: &VolumeGeometry,
    montage_slice_index: Option<usize>,
) -> DrawResult<SliceFrame> {
    let axes = view_plane.axes();
    let mut center = state.slice_coordinates;
    if let Some(index) = montage_slice_index {
        let index = i32::try_from(index).unwrap_or(i32::MAX);
        center[axes.through_axis] = reference.index_to_space(IVec3::splat(index))[axes.through_axis];
    }

    let normal = if state.is_oblique() {
        state.oblique_rotation.transform_vector3(axes.normal)
    } else {
        axes.normal
    };

    let plane = Plane::new(normal, center);
    if !plane.is_valid() {
        log::debug!("skipping {} view: degenerate slice normal {normal}", view_plane.name());
        return Err(DrawError::InvalidPlane);
    }
    log::trace!("{} slice {plane}", view_plane.name());

    Ok(SliceFrame {
        view_plane,
        plane,
        look_at_center: center,
    })
}

/// Transform from slice-local screen coordinates to world coordinates.
pub fn oblique_transform(state: &ViewState) -> Mat4 {
    Mat4::from_translation(state.slice_coordinates) * state.oblique_rotation
}

/// Camera for drawing a slice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewCamera {
    pub eye: Vec3,
    pub center: Vec3,
    pub up: Vec3,
    /// World to eye transform.
    pub view: Mat4,
}

impl ViewCamera {
    /// Camera looking at the slice from the side its normal points to.
    ///
    /// The view is panned so that the translation moves the slice on screen.
    pub fn for_slice(state: &ViewState, frame: &SliceFrame) -> Self {
        let axes = frame.view_plane.axes();
        let pan = state.slice_coordinates + state.translation;
        let view_translation = Vec3::new(axes.pan_x_sign * pan.dot(axes.screen_x), pan.dot(axes.screen_y), 0.0);

        let up = if state.is_oblique() {
            state.oblique_rotation.transform_vector3(axes.up)
        } else {
            axes.up
        };
        let center = frame.look_at_center;
        let eye = center + frame.plane.normal();

        Self {
            eye,
            center,
            up,
            view: Mat4::from_translation(view_translation) * Mat4::look_at_rh(eye, center, up),
        }
    }

    /// Camera for the 3D view showing all three slices, scaled by the zoom.
    pub fn three_slice(zoom: f32) -> Self {
        let eye = Vec3::new(0.0, 0.0, THREE_SLICE_EYE_DISTANCE);
        let zoom = if zoom > 0.0 { zoom } else { 1.0 };
        Self {
            eye,
            center: Vec3::ZERO,
            up: Vec3::Y,
            view: Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y) * Mat4::from_scale(Vec3::splat(zoom)),
        }
    }
}

/// Bounds of an orthographic projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrthographicBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
    pub near: f32,
    pub far: f32,
}

impl OrthographicBounds {
    /// Fits the reference volume vertically into the viewport.
    ///
    /// At zoom 1 the volume fills `margin` of the viewport height. The
    /// horizontal extent follows the viewport aspect ratio.
    pub fn for_view(
        reference_bounds: &BoundingBox,
        view_plane: ViewPlane,
        zoom: f32,
        margin: f32,
        viewport: Viewport,
    ) -> DrawResult<Self> {
        if viewport.is_empty() {
            return Err(DrawError::EmptyViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        let vertical = view_plane.axes().screen_y;
        let mut scale = 1.0 / margin;
        if zoom > 0.0 {
            scale /= zoom;
        }
        let top = reference_bounds.max().dot(vertical) * scale;
        let bottom = reference_bounds.min().dot(vertical) * scale;
        let half_height = (top - bottom) / 2.0;
        let aspect = viewport.aspect_ratio();

        let bounds = Self {
            left: -half_height * aspect,
            right: half_height * aspect,
            bottom,
            top,
            near: -ORTHOGRAPHIC_DEPTH,
            far: ORTHOGRAPHIC_DEPTH,
        };
        log::trace!("orthographic bounds {bounds:?}");
        Ok(bounds)
    }

    /// Bounds scaled about their center.
    #[must_use]
    pub fn enlarged(&self, scale: f32) -> Self {
        let center_x = (self.left + self.right) / 2.0;
        let center_y = (self.bottom + self.top) / 2.0;
        let dx = (self.right - self.left) / 2.0 * scale;
        let dy = (self.top - self.bottom) / 2.0 * scale;
        Self {
            left: center_x - dx,
            right: center_x + dx,
            bottom: center_y - dy,
            top: center_y + dy,
            ..*self
        }
    }

    /// Projection matrix for these bounds.
    pub fn projection(&self) -> Mat4 {
        Mat4::orthographic_rh_gl(self.left, self.right, self.bottom, self.top, self.near, self.far)
    }
}
