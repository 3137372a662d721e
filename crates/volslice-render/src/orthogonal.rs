//! Orthogonal slices drawn on each volume's native voxel grid.
//!
//! Every overlay is drawn as its own layer of voxel quads. Volumes may differ in
//! resolution, so each one finds its own slice index for the plane.

use glam::{IVec3, Vec3};
use volslice_core::{
    color_values, convert_slice_coloring_to_outline_mode, slice_values, LabelDrawingType, VolumeOverlay,
    VoxelIdentification,
};

use crate::context::DrawContext;
use crate::plane_resolver::SliceFrame;
use crate::primitives::QuadBatch;

/// Color of voxels without data in the bottom layer.
const NO_DATA_COLOR: [u8; 4] = [0, 0, 0, 255];

/// Draws one quad layer per overlay that intersects the plane.
///
/// Overlays whose slice index falls outside their volume are left out. With
/// `identification` set, every quad is colored with its identification color
/// instead.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
pub fn draw_orthogonal(
    ctx: &DrawContext<'_>,
    frame: &SliceFrame,
    mut identification: Option<&mut VoxelIdentification>,
) -> Vec<QuadBatch> {
    let axes = frame.view_plane.axes();
    let through = axes.through_axis;
    let plane_coordinate = frame.plane.point()[through];
    let normal = frame.plane.normal();

    let mut batches = Vec::with_capacity(ctx.overlays.len());
    for (volume_index, overlay) in ctx.overlays.iter().enumerate() {
        let geometry = overlay.volume().geometry();
        let dims = geometry.dims();

        let mut coordinate_on_slice = geometry.index_to_space(IVec3::ZERO);
        coordinate_on_slice[through] = plane_coordinate;
        let slice_index = geometry.enclosing_voxel(coordinate_on_slice)[through];
        if slice_index < 0 || slice_index as usize >= dims[through] {
            log::debug!(
                "{} slice {slice_index} outside '{}' (dimension {})",
                frame.view_plane.name(),
                overlay.volume().name(),
                dims[through]
            );
            continue;
        }

        let Some(sampler) = ctx.sampler(volume_index) else {
            continue;
        };
        let slice = slice_values(&sampler, dims, axes, slice_index as usize);
        let rgba = color_slice(ctx, overlay, &slice.values, &slice.valid, slice.columns, slice.rows);

        let mut column_step = Vec3::ZERO;
        column_step[axes.column_axis] = geometry.axis_step(axes.column_axis)[axes.column_axis];
        let mut row_step = Vec3::ZERO;
        row_step[axes.row_axis] = geometry.axis_step(axes.row_axis)[axes.row_axis];

        let mut first_voxel = IVec3::ZERO;
        first_voxel[through] = slice_index;
        let mut start = geometry.index_to_space(first_voxel) - (column_step + row_step) * 0.5;
        start[through] = plane_coordinate;

        let opacity = overlay.opacity_byte();
        let mut batch = QuadBatch::with_capacity(slice.columns * slice.rows);
        for row in 0..slice.rows {
            for column in 0..slice.columns {
                let pixel = &rgba[(column + row * slice.columns) * 4..][..4];
                let mut color = if pixel[3] > 0 {
                    [pixel[0], pixel[1], pixel[2], opacity]
                } else if volume_index == 0 {
                    NO_DATA_COLOR
                } else {
                    continue;
                };
                if color[3] == 0 {
                    continue;
                }

                if let Some(ids) = identification.as_deref_mut() {
                    let mut ijk = first_voxel;
                    ijk[axes.column_axis] = column as i32;
                    ijk[axes.row_axis] = row as i32;
                    match ids.add_voxel(volume_index, overlay.map_index(), ijk) {
                        Some(id_color) => color = id_color,
                        None => continue,
                    }
                }

                let bottom_left = start + column_step * column as f32 + row_step * row as f32;
                batch.add_quad(
                    [
                        bottom_left,
                        bottom_left + column_step,
                        bottom_left + column_step + row_step,
                        bottom_left + row_step,
                    ],
                    normal,
                    color,
                );
            }
        }

        if volume_index > 0 {
            batch.set_depth_offset(Some(ctx.options.layer_depth_offset));
        }
        log::trace!(
            "{} slice {slice_index} of '{}': {} quads",
            frame.view_plane.name(),
            overlay.volume().name(),
            batch.len()
        );
        batches.push(batch);
    }
    batches
}

/// Colors a native slice in one bulk call and applies the label outline mode.
fn color_slice(
    ctx: &DrawContext<'_>,
    overlay: &VolumeOverlay<'_>,
    values: &[f32],
    valid: &[bool],
    columns: usize,
    rows: usize,
) -> Vec<u8> {
    let mut rgba = vec![0u8; values.len() * 4];
    if let Err(e) = color_values(
        overlay.color_mapping(),
        overlay.statistics(),
        ctx.color_mapper,
        values,
        &mut rgba,
    ) {
        log::warn!("{e}, '{}' is not colored", overlay.volume().name());
    }

    for (pixel, is_valid) in rgba.chunks_exact_mut(4).zip(valid) {
        if !is_valid {
            pixel.fill(0);
        }
    }

    if overlay.color_mapping().is_label() && ctx.options.label_drawing == LabelDrawingType::Outline {
        convert_slice_coloring_to_outline_mode(&mut rgba, columns, rows);
    }
    rgba
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane_resolver::resolve_slice_plane;
    use crate::test_util::{label_overlay, label_table, labeled_volume, Fixture};
    use volslice_core::{ViewPlane, ViewState};

    fn frame(state: &ViewState, view_plane: ViewPlane, fixture: &Fixture<'_>) -> SliceFrame {
        resolve_slice_plane(state, view_plane, fixture.overlays[0].volume().geometry(), None).unwrap()
    }

    #[test]
    fn test_axial_layer_covers_slice() {
        let volume = labeled_volume([4, 3, 2], Vec3::ZERO, Vec3::ONE, |_| 1.0);
        let fixture = Fixture::new(vec![label_overlay(&volume, &label_table())]);
        let state = ViewState::new(Vec3::new(0.0, 0.0, 1.0));
        let batches = draw_orthogonal(&fixture.context(), &frame(&state, ViewPlane::Axial, &fixture), None);

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].len(), 12);
        assert_eq!(batches[0].depth_offset(), None);
        let (corners, color) = batches[0].quads().next().unwrap();
        assert_eq!(corners[0], Vec3::new(-0.5, -0.5, 1.0));
        assert_eq!(corners[2], Vec3::new(0.5, 0.5, 1.0));
        assert_eq!(color, [255, 0, 0, 255]);
    }

    #[test]
    fn test_out_of_range_layer_is_omitted() {
        // a second volume of 4 slices cannot show slice 5
        let bottom = labeled_volume([2, 2, 8], Vec3::ZERO, Vec3::ONE, |_| 0.0);
        let short = labeled_volume([2, 2, 4], Vec3::ZERO, Vec3::ONE, |_| 1.0);
        let table = label_table();
        let fixture = Fixture::new(vec![label_overlay(&bottom, &table), label_overlay(&short, &table)]);
        let state = ViewState::new(Vec3::new(0.0, 0.0, 5.0));
        let batches = draw_orthogonal(&fixture.context(), &frame(&state, ViewPlane::Axial, &fixture), None);

        assert_eq!(batches.len(), 1);
        // label 0 is transparent, so the bottom layer shows the no-data color
        assert!(batches[0].quads().all(|(_, color)| color == NO_DATA_COLOR));
        assert_eq!(batches[0].len(), 4);
    }

    #[test]
    fn test_upper_layers_skip_transparent_voxels_and_get_depth_offset() {
        let bottom = labeled_volume([3, 3, 3], Vec3::ZERO, Vec3::ONE, |_| 1.0);
        let top = labeled_volume([3, 3, 3], Vec3::ZERO, Vec3::ONE, |ijk| if ijk.x == 1 { 2.0 } else { 0.0 });
        let table = label_table();
        let fixture = Fixture::new(vec![label_overlay(&bottom, &table), label_overlay(&top, &table)]);
        let state = ViewState::new(Vec3::new(1.0, 1.0, 1.0));
        let batches = draw_orthogonal(&fixture.context(), &frame(&state, ViewPlane::Coronal, &fixture), None);

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0].len(), 9);
        assert_eq!(batches[1].len(), 3);
        assert_eq!(batches[1].depth_offset(), Some(fixture.options.layer_depth_offset));
        assert!(batches[1].quads().all(|(_, color)| color == [0, 255, 0, 255]));
    }

    #[test]
    fn test_invisible_layer_is_neither_drawn_nor_identified() {
        let bottom = labeled_volume([3, 3, 3], Vec3::ZERO, Vec3::ONE, |_| 1.0);
        let top = labeled_volume([3, 3, 3], Vec3::ZERO, Vec3::ONE, |_| 2.0);
        let table = label_table();
        let fixture = Fixture::new(vec![
            label_overlay(&bottom, &table),
            label_overlay(&top, &table).with_opacity(0.0).unwrap(),
        ]);
        let state = ViewState::new(Vec3::ONE);
        let frame = frame(&state, ViewPlane::Axial, &fixture);

        let batches = draw_orthogonal(&fixture.context(), &frame, None);
        assert_eq!(batches[0].len(), 9);
        assert!(batches[1].is_empty());

        let mut ids = VoxelIdentification::new();
        let batches = draw_orthogonal(&fixture.context(), &frame, Some(&mut ids));
        assert_eq!(ids.len(), 9);
        assert!(batches[1].is_empty());
        for (_, color) in batches[0].quads() {
            assert_eq!(ids.decode(color).unwrap().volume_index, 0);
        }
    }

    #[test]
    fn test_quads_lie_on_plane() {
        let volume = labeled_volume([5, 6, 7], Vec3::new(-2.0, -3.0, -4.0), Vec3::new(1.5, 2.0, 2.5), |_| 1.0);
        let fixture = Fixture::new(vec![label_overlay(&volume, &label_table())]);
        let state = ViewState::new(Vec3::new(0.7, -1.1, 2.2));
        for view_plane in ViewPlane::SLICE_PLANES {
            let frame = frame(&state, view_plane, &fixture);
            for batch in draw_orthogonal(&fixture.context(), &frame, None) {
                for (corners, _) in batch.quads() {
                    for corner in corners {
                        assert!(frame.plane.signed_distance(corner).abs() < 1e-5);
                    }
                }
            }
        }
    }

    #[test]
    fn test_identification_records_voxels() {
        let volume = labeled_volume([3, 4, 5], Vec3::ZERO, Vec3::ONE, |_| 1.0);
        let fixture = Fixture::new(vec![label_overlay(&volume, &label_table())]);
        let state = ViewState::new(Vec3::new(2.0, 1.0, 3.0));
        let frame = frame(&state, ViewPlane::Parasagittal, &fixture);

        let mut ids = VoxelIdentification::new();
        let batches = draw_orthogonal(&fixture.context(), &frame, Some(&mut ids));
        assert_eq!(ids.len(), 20);
        for (corners, color) in batches[0].quads() {
            let record = ids.decode(color).unwrap();
            let center = (corners[0] + corners[2]) * 0.5;
            assert_eq!(record.ijk, volume.geometry().enclosing_voxel(center));
            assert_eq!(record.ijk.x, 2);
        }
    }

    #[test]
    fn test_label_outline_mode() {
        let volume = labeled_volume([5, 5, 1], Vec3::ZERO, Vec3::ONE, |_| 1.0);
        let mut fixture = Fixture::new(vec![label_overlay(&volume, &label_table())]);
        fixture.options.label_drawing = LabelDrawingType::Outline;
        let state = ViewState::new(Vec3::ZERO);
        let batches = draw_orthogonal(&fixture.context(), &frame(&state, ViewPlane::Axial, &fixture), None);
        let colored = batches[0].quads().filter(|(_, color)| *color != NO_DATA_COLOR).count();
        // the 3x3 interior becomes background
        assert_eq!(colored, 16);
        assert_eq!(batches[0].len(), 25);
    }
}
