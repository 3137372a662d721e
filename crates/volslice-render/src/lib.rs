//! Slice drawing for volslice-rs.
//!
//! This crate turns overlays and a view state into primitives:
//! - Slice plane, camera and orthographic projection per view
//! - Orthogonal slices on each volume's native grid
//! - Oblique slices resampled on a screen-aligned grid, with compositing
//! - Montage and all-view layout
//! - Surface outlines and crosshairs
//!
//! Primitives go to a [`PrimitiveSink`]; nothing here talks to a GPU.

// Type casts in geometry code: Conversions between cell counts (usize/i32)
// and coordinates (f32) are intentional and bounded by the viewport size.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
// Documentation lints: Detailed error/panic docs will be added as the API stabilizes.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
// Float comparisons are exact where tests check constructed values.
#![allow(clippy::float_cmp)]
// Builder-style methods returning values are standard.
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::similar_names)]
#![allow(clippy::module_name_repetitions)]

pub mod compositor;
pub mod context;
pub mod decorations;
pub mod error;
pub mod layout;
pub mod oblique;
pub mod orthogonal;
pub mod plane_resolver;
pub mod primitives;

#[cfg(test)]
mod test_util;

pub use compositor::{composite, CompositedCell};
pub use context::DrawContext;
pub use decorations::{axis_color, crosshairs, surface_outline, OutlineSurface};
pub use error::{DrawError, DrawResult};
pub use layout::{all_view_viewports, montage_cells, montage_label, AllViewViewports, MontageCell, Viewport};
pub use oblique::{
    draw_oblique, voxel_bounds_and_spacing, ObliqueSlice, PerVolumeValueBuffer, SampleLink, VoxelBoundsAndSpacing,
    VoxelSample,
};
pub use orthogonal::draw_orthogonal;
pub use plane_resolver::{oblique_transform, resolve_slice_plane, OrthographicBounds, SliceFrame, ViewCamera};
pub use primitives::{
    LineBatch, LineVertex, PrimitiveSink, QuadBatch, QuadVertex, RecordedView, RecordingSink, TextLabel, ViewSetup,
};
