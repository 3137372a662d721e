//! Lines drawn over a slice: surface outlines and crosshairs.

use glam::Vec3;
use volslice_core::{Plane, ViewPlane, ViewState};

use crate::plane_resolver::SliceFrame;
use crate::primitives::LineBatch;

/// Half length of a crosshair line, large enough to cross any viewport.
const CROSSHAIR_EXTENT: f32 = 10_000.0;

const SURFACE_OUTLINE_WIDTH: f32 = 2.0;
const CROSSHAIR_WIDTH: f32 = 1.0;

/// Color identifying a slice plane in crosshairs.
pub fn axis_color(view_plane: ViewPlane) -> [u8; 4] {
    match view_plane {
        ViewPlane::Axial | ViewPlane::All => [0, 0, 255, 255],
        ViewPlane::Coronal => [0, 255, 0, 255],
        ViewPlane::Parasagittal => [255, 0, 0, 255],
    }
}

/// Plane whose unrotated normal lies along `axis`.
fn plane_with_normal_along(axis: Vec3) -> ViewPlane {
    let a = axis.abs();
    if a.x >= a.y && a.x >= a.z {
        ViewPlane::Parasagittal
    } else if a.y >= a.z {
        ViewPlane::Coronal
    } else {
        ViewPlane::Axial
    }
}

/// A triangle mesh whose intersection with the slice is drawn as an outline.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineSurface {
    pub name: String,
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<[u32; 3]>,
    pub color: [u8; 4],
}

impl OutlineSurface {
    /// Creates a surface drawn in the given color.
    pub fn new(name: impl Into<String>, vertices: Vec<Vec3>, triangles: Vec<[u32; 3]>, color: [u8; 4]) -> Self {
        Self {
            name: name.into(),
            vertices,
            triangles,
            color,
        }
    }
}

/// Intersects every triangle of the surface with the plane.
///
/// Triangles referencing missing vertices are skipped.
pub fn surface_outline(plane: &Plane, surface: &OutlineSurface) -> LineBatch {
    let mut lines = LineBatch::new(SURFACE_OUTLINE_WIDTH);
    if !plane.is_valid() {
        return lines;
    }
    let vertex = |index: u32| surface.vertices.get(index as usize).copied();
    let mut skipped = 0usize;
    for &[a, b, c] in &surface.triangles {
        let (Some(a), Some(b), Some(c)) = (vertex(a), vertex(b), vertex(c)) else {
            skipped += 1;
            continue;
        };
        if let Some((start, end)) = plane.triangle_intersection(a, b, c) {
            lines.add_segment(start, end, surface.color);
        }
    }
    if skipped > 0 {
        log::warn!("surface '{}': skipped {skipped} triangles with invalid vertex indices", surface.name);
    }
    lines
}

/// Two lines through the selected coordinate along the screen axes of the view.
///
/// Each line takes the color of the slice plane it represents: the horizontal
/// line is the plane whose normal points up the screen, the vertical line the
/// plane whose normal points across it.
pub fn crosshairs(state: &ViewState, frame: &SliceFrame) -> LineBatch {
    let axes = frame.view_plane.axes();
    let (horizontal, vertical) = if state.is_oblique() {
        (
            state.oblique_rotation.transform_vector3(axes.screen_x),
            state.oblique_rotation.transform_vector3(axes.screen_y),
        )
    } else {
        (axes.screen_x, axes.screen_y)
    };

    let center = frame.look_at_center;
    let mut lines = LineBatch::new(CROSSHAIR_WIDTH);
    lines.add_segment(
        center - horizontal * CROSSHAIR_EXTENT,
        center + horizontal * CROSSHAIR_EXTENT,
        axis_color(plane_with_normal_along(axes.screen_y)),
    );
    lines.add_segment(
        center - vertical * CROSSHAIR_EXTENT,
        center + vertical * CROSSHAIR_EXTENT,
        axis_color(plane_with_normal_along(axes.screen_x)),
    );
    lines
}
