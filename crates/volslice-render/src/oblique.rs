//! Oblique slices resampled on a screen-aligned grid.
//!
//! The visible part of the slice plane is cut into square cells one voxel
//! wide. Every overlay is sampled at each cell center, the sampled values of
//! each overlay are colored in one bulk call, and each cell is drawn with the
//! color of the first overlay that is visible there.

use std::ops::Range;

use glam::{IVec3, Vec3};
use volslice_core::{color_values, BoundingBox, DrawMode, ViewState, VolumeOverlay, VoxelIdentification};

use crate::compositor::composite;
use crate::context::DrawContext;
use crate::error::{DrawError, DrawResult};
use crate::plane_resolver::{oblique_transform, OrthographicBounds, SliceFrame};
use crate::primitives::QuadBatch;

/// Tolerance when counting rows, so that an exact multiple of the voxel size
/// does not produce an extra row.
const ROW_COUNT_TOLERANCE: f32 = 1.0e-3;

/// One grid cell where at least one overlay has data.
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelSample {
    pub center: Vec3,
    /// Bottom-left, bottom-right, top-right and top-left corners.
    pub corners: [Vec3; 4],
    /// Range of this cell's entries in the shared link list.
    pub links: Range<usize>,
}

/// A valid sample of one overlay, stored in that overlay's value buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLink {
    pub volume_index: usize,
    pub offset: usize,
}

/// Sampled values of one overlay and their colors, four bytes per value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerVolumeValueBuffer {
    pub values: Vec<f32>,
    pub rgba: Vec<u8>,
}

impl PerVolumeValueBuffer {
    /// Appends a value and returns its offset.
    pub fn push(&mut self, value: f32) -> usize {
        self.values.push(value);
        self.values.len() - 1
    }

    /// Color of the value at `offset`.
    pub fn rgba_at(&self, offset: usize) -> Option<[u8; 4]> {
        let pixel = self.rgba.get(offset * 4..offset * 4 + 4)?;
        Some([pixel[0], pixel[1], pixel[2], pixel[3]])
    }

    /// Colors all values at once and scales every alpha by the overlay
    /// opacity. A missing palette leaves the buffer transparent.
    fn color(&mut self, ctx: &DrawContext<'_>, overlay: &VolumeOverlay<'_>) {
        self.rgba = vec![0; self.values.len() * 4];
        if self.values.is_empty() {
            return;
        }
        if let Err(e) = color_values(
            overlay.color_mapping(),
            overlay.statistics(),
            ctx.color_mapper,
            &self.values,
            &mut self.rgba,
        ) {
            log::warn!("{e}, '{}' is not colored", overlay.volume().name());
            return;
        }
        let opacity = u16::from(overlay.opacity_byte());
        for pixel in self.rgba.chunks_exact_mut(4) {
            pixel[3] = (u16::from(pixel[3]) * opacity / 255) as u8;
        }
    }
}

/// Union of the voxel bounds of all overlays and the smallest spacing per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelBoundsAndSpacing {
    pub bounds: BoundingBox,
    pub spacing: Vec3,
}

impl VoxelBoundsAndSpacing {
    /// Smallest spacing over all axes.
    pub fn min_spacing(&self) -> f32 {
        self.spacing.min_element()
    }
}

/// Computes the union of voxel bounds and the per-axis minimum spacing.
pub fn voxel_bounds_and_spacing(overlays: &[VolumeOverlay<'_>]) -> DrawResult<VoxelBoundsAndSpacing> {
    if overlays.is_empty() {
        return Err(DrawError::NoOverlays);
    }
    let mut bounds = BoundingBox::empty();
    let mut spacing = Vec3::splat(f32::MAX);
    for overlay in overlays {
        let geometry = overlay.volume().geometry();
        if geometry.min_max_spacing().is_none() {
            return Err(DrawError::NonPositiveSpacing(overlay.volume().name().to_string()));
        }
        let volume_bounds = geometry.voxel_bounding_box();
        let extent = volume_bounds.extent();
        if !extent.is_finite() || extent.cmplt(Vec3::ZERO).any() {
            return Err(DrawError::DegenerateVoxelBounds(overlay.volume().name().to_string()));
        }
        bounds.union(&volume_bounds);
        spacing = spacing.min(geometry.spacing());
    }
    // every axis of the union needs max > min
    let extent = bounds.extent();
    if !extent.is_finite() || extent.cmple(Vec3::ZERO).any() {
        return Err(DrawError::DegenerateVoxelBounds(overlays[0].volume().name().to_string()));
    }
    log::trace!(
        "voxel bounds {:?} to {:?}, min spacing {spacing}",
        bounds.min(),
        bounds.max()
    );
    Ok(VoxelBoundsAndSpacing { bounds, spacing })
}

/// Result of an oblique slice draw.
#[derive(Debug, Clone, PartialEq)]
pub struct ObliqueSlice {
    pub batch: QuadBatch,
    /// Edge length of the grid cells.
    pub voxel_size: f32,
    /// Number of cells where at least one overlay had data.
    pub sample_count: usize,
}

/// Slice-local rectangle covered by the grid, in screen axes.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScreenWindow {
    min_x: f32,
    max_x: f32,
    min_y: f32,
    max_y: f32,
}

/// Visible window relative to the look-at center, snapped outward so that cell
/// centers line up with voxel centers of the reference volume.
#[allow(clippy::cast_possible_truncation)]
fn aligned_window(
    ctx: &DrawContext<'_>,
    frame: &SliceFrame,
    state: &ViewState,
    ortho: &OrthographicBounds,
    voxel_size: f32,
) -> ScreenWindow {
    let axes = frame.view_plane.axes();
    let view_offset = frame.look_at_center + state.translation;
    let offset_x = view_offset.dot(axes.screen_x);
    let offset_y = view_offset.dot(axes.screen_y);

    let reference = ctx.overlays[0].volume().geometry();
    let origin_voxel = reference.index_to_space(reference.enclosing_voxel(Vec3::ZERO));

    let snap = |min: f32, max: f32, axis: Vec3| {
        let phase = (origin_voxel.dot(axis) - frame.look_at_center.dot(axis)).rem_euclid(voxel_size);
        let first = ((min - phase) / voxel_size).round();
        let last = ((max - phase) / voxel_size).round();
        (
            first * voxel_size + phase - voxel_size / 2.0,
            last * voxel_size + phase + voxel_size / 2.0,
        )
    };
    let (min_x, max_x) = snap(ortho.left - offset_x, ortho.right - offset_x, axes.screen_x);
    let (min_y, max_y) = snap(ortho.bottom - offset_y, ortho.top - offset_y, axes.screen_y);
    ScreenWindow {
        min_x,
        max_x,
        min_y,
        max_y,
    }
}

/// Draws an oblique slice through all overlays.
///
/// The grid step is the smallest voxel spacing of any overlay, multiplied by
/// the reduced detail factor in [`DrawMode::ThreeDimensional`]. With
/// `identification` set, every cell is colored with the identification color
/// of the voxel of the winning overlay that encloses the cell center.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss,
    clippy::too_many_lines
)]
pub fn draw_oblique(
    ctx: &DrawContext<'_>,
    frame: &SliceFrame,
    state: &ViewState,
    ortho: &OrthographicBounds,
    draw_mode: DrawMode,
    mut identification: Option<&mut VoxelIdentification>,
) -> DrawResult<ObliqueSlice> {
    let bounds_and_spacing = voxel_bounds_and_spacing(ctx.overlays)?;
    let mut voxel_size = bounds_and_spacing.min_spacing();
    if draw_mode == DrawMode::ThreeDimensional {
        voxel_size *= ctx.options.reduced_detail_factor;
    }

    let axes = frame.view_plane.axes();
    let window = aligned_window(ctx, frame, state, ortho, voxel_size);
    let transform = oblique_transform(state);
    let corner = |x: f32, y: f32| transform.transform_point3(axes.screen_x * x + axes.screen_y * y);
    let bottom_left = corner(window.min_x, window.min_y);
    let bottom_right = corner(window.max_x, window.min_y);
    let top_right = corner(window.max_x, window.max_y);
    let top_left = corner(window.min_x, window.max_y);
    log::trace!(
        "oblique {} corners BL {bottom_left} BR {bottom_right} TR {top_right} TL {top_left}",
        frame.view_plane.name()
    );

    let samplers = ctx.samplers();
    let mut buffers = vec![PerVolumeValueBuffer::default(); ctx.overlays.len()];
    let mut samples: Vec<VoxelSample> = Vec::new();
    let mut links: Vec<SampleLink> = Vec::new();

    let left_length = bottom_left.distance(top_left);
    let right_length = bottom_right.distance(top_right);
    if left_length > 0.0 && right_length > 0.0 {
        let left_dir = (top_left - bottom_left) / left_length;
        let right_dir = (top_right - bottom_right) / right_length;
        let left_steps = left_length / voxel_size;
        let right_step = right_length / left_steps;
        let rows = (left_steps - ROW_COUNT_TOLERANCE).ceil().max(0.0) as usize;

        for row in 0..rows {
            let left_bottom = bottom_left + left_dir * (row as f32 * voxel_size);
            let left_top = left_bottom + left_dir * voxel_size;
            let right_bottom = bottom_right + right_dir * (row as f32 * right_step);
            let right_top = right_bottom + right_dir * right_step;

            let cells = (left_bottom.distance(right_bottom) / voxel_size).round() as usize;
            if cells == 0 {
                continue;
            }
            let bottom_step = (right_bottom - left_bottom) / cells as f32;
            let top_step = (right_top - left_top) / cells as f32;

            for cell in 0..cells {
                let cell_bottom_left = left_bottom + bottom_step * cell as f32;
                let cell_top_left = left_top + top_step * cell as f32;
                let cell_top_right = cell_top_left + top_step;
                let center = (cell_bottom_left + cell_top_right) * 0.5;

                let mut sample_index = None;
                for (volume_index, sampler) in samplers.iter().enumerate() {
                    let Some(value) = sampler.sample(center) else {
                        continue;
                    };
                    let index = *sample_index.get_or_insert_with(|| {
                        samples.push(VoxelSample {
                            center,
                            corners: [
                                cell_bottom_left,
                                cell_bottom_left + bottom_step,
                                cell_top_right,
                                cell_top_left,
                            ],
                            links: links.len()..links.len(),
                        });
                        samples.len() - 1
                    });
                    let offset = buffers[volume_index].push(value);
                    links.push(SampleLink { volume_index, offset });
                    samples[index].links.end = links.len();
                }
            }
        }
    }

    for (buffer, overlay) in buffers.iter_mut().zip(ctx.overlays) {
        buffer.color(ctx, overlay);
    }

    let cells = composite(&samples, &links, &buffers);
    let normal = frame.plane.normal();
    let mut batch = QuadBatch::with_capacity(samples.len());
    for (sample, cell) in samples.iter().zip(&cells) {
        let Some(cell) = cell else {
            continue;
        };
        let color = match identification.as_deref_mut() {
            Some(ids) => {
                let overlay = &ctx.overlays[cell.volume_index];
                let geometry = overlay.volume().geometry();
                let ijk: IVec3 = geometry.enclosing_voxel(sample.center);
                if !geometry.index_valid(ijk) {
                    continue;
                }
                match ids.add_voxel(cell.volume_index, overlay.map_index(), ijk) {
                    Some(color) => color,
                    None => continue,
                }
            }
            None => cell.rgba,
        };
        batch.add_quad(sample.corners, normal, color);
    }

    log::trace!(
        "oblique {}: voxel size {voxel_size}, {} samples, {} quads",
        frame.view_plane.name(),
        samples.len(),
        batch.len()
    );
    Ok(ObliqueSlice {
        batch,
        voxel_size,
        sample_count: samples.len(),
    })
}
