//! Integration tests for slice drawing through a [`SliceDrawSession`].

use std::sync::Arc;

use proptest::prelude::*;
use volslice::*;

const RED: [u8; 4] = [255, 0, 0, 255];
const GREEN: [u8; 4] = [0, 255, 0, 255];
const BLACK: [u8; 4] = [0, 0, 0, 255];

fn label_table() -> LabelTable {
    let mut table = LabelTable::new();
    table.insert(1, "red", RED);
    table.insert(2, "green", GREEN);
    table
}

fn labeled_volume(dims: [usize; 3], origin: Vec3, spacing: Vec3, value: impl Fn(IVec3) -> f32) -> Volume {
    let geometry = VolumeGeometry::from_origin_and_spacing(dims, origin, spacing).expect("geometry");
    let mut values = Vec::with_capacity(geometry.num_voxels());
    for k in 0..dims[2] {
        for j in 0..dims[1] {
            for i in 0..dims[0] {
                values.push(value(IVec3::new(i as i32, j as i32, k as i32)));
            }
        }
    }
    DenseVolume::new("labels", geometry, vec![values]).expect("volume").into()
}

fn label_overlay(volume: &Volume) -> VolumeOverlay<'_> {
    VolumeOverlay::new(volume, 0, ColorMapping::Labels(label_table())).expect("overlay")
}

fn all_colors(view: &RecordedView) -> Vec<[u8; 4]> {
    view.quads.iter().flat_map(|batch| batch.quads().map(|(_, color)| color)).collect()
}

const VIEWPORT: Viewport = Viewport::new(0, 0, 100, 100);

#[test]
fn test_opaque_bottom_layer_hides_transparent_top_layer() {
    let bottom = labeled_volume([5, 5, 5], Vec3::splat(-2.0), Vec3::ONE, |_| 1.0);
    let top = labeled_volume([5, 5, 5], Vec3::splat(-2.0), Vec3::ONE, |_| 2.0);
    let overlays = vec![
        label_overlay(&bottom),
        label_overlay(&top).with_opacity(0.5).expect("opacity"),
    ];
    let palettes = PaletteRegistry::new();
    let mut session = SliceDrawSession::new(overlays, &palettes, SliceDrawOptions::default()).expect("session");

    let mut state = ViewState::new(Vec3::ZERO);
    state.view_mode = ViewMode::Oblique;
    let mut sink = RecordingSink::new();
    assert_eq!(session.draw(&state, VIEWPORT, DrawPurpose::Render, &mut sink), 1);

    let colors = all_colors(&sink.views()[0]);
    assert_eq!(colors.len(), 25);
    assert!(colors.iter().all(|&color| color == RED));
}

#[test]
fn test_out_of_range_layer_is_omitted() {
    // the selected z = 5 is inside the bottom volume but past the top volume's last slice
    let bottom = labeled_volume([4, 4, 10], Vec3::ZERO, Vec3::ONE, |ijk| if ijk.x < 2 { 1.0 } else { 0.0 });
    let top = labeled_volume([4, 4, 4], Vec3::ZERO, Vec3::ONE, |_| 2.0);
    let palettes = PaletteRegistry::new();
    let mut session = SliceDrawSession::new(
        vec![label_overlay(&bottom), label_overlay(&top)],
        &palettes,
        SliceDrawOptions::default(),
    )
    .expect("session");

    let mut sink = RecordingSink::new();
    let state = ViewState::new(Vec3::new(1.0, 1.0, 5.0));
    assert_eq!(session.draw(&state, VIEWPORT, DrawPurpose::Render, &mut sink), 1);

    let view = &sink.views()[0];
    assert_eq!(view.quad_count(), 16);
    let colors = all_colors(view);
    assert_eq!(colors.iter().filter(|&&c| c == RED).count(), 8);
    // unlabeled voxels of the bottom layer are drawn as opaque background
    assert_eq!(colors.iter().filter(|&&c| c == BLACK).count(), 8);
    assert!(!colors.contains(&GREEN));
}

#[test]
fn test_identity_rotation_resolves_orthogonal_plane() {
    let volume = labeled_volume([6, 6, 6], Vec3::ZERO, Vec3::ONE, |_| 1.0);
    let reference = volume.geometry();
    let center = Vec3::new(2.0, 3.0, 1.0);

    let orthogonal = ViewState::new(center);
    let mut oblique = orthogonal;
    oblique.view_mode = ViewMode::Oblique;
    oblique.oblique_rotation = Mat4::IDENTITY;

    for view_plane in [ViewPlane::Axial, ViewPlane::Coronal, ViewPlane::Parasagittal] {
        let expected = volslice_render::resolve_slice_plane(&orthogonal, view_plane, reference, None).expect("plane");
        let actual = volslice_render::resolve_slice_plane(&oblique, view_plane, reference, None).expect("plane");
        assert!((expected.plane.normal() - actual.plane.normal()).length() < 1e-6);
        assert!((expected.plane.point() - actual.plane.point()).length() < 1e-6);
        assert!((expected.plane.d() - actual.plane.d()).abs() < 1e-6);
    }
}

#[test]
fn test_montage_slice_coordinate() {
    let volume = labeled_volume([4, 4, 16], Vec3::ZERO, Vec3::splat(2.0), |_| 1.0);
    let reference = volume.geometry();
    let mut state = ViewState::new(Vec3::ZERO);
    state.view_mode = ViewMode::Montage;

    let frame = volslice_render::resolve_slice_plane(&state, ViewPlane::Axial, reference, Some(10)).expect("plane");
    assert!((frame.plane.point().z - 20.0).abs() < 1e-5);
    assert!((frame.look_at_center.z - 20.0).abs() < 1e-5);
}

#[test]
fn test_montage_cells_and_labels() {
    let volume = labeled_volume([4, 4, 16], Vec3::ZERO, Vec3::splat(2.0), |_| 1.0);
    let palettes = PaletteRegistry::new();
    let mut session =
        SliceDrawSession::new(vec![label_overlay(&volume)], &palettes, SliceDrawOptions::default()).expect("session");

    let mut state = ViewState::new(Vec3::new(2.0, 2.0, 20.0));
    state.view_mode = ViewMode::Montage;
    state.montage = MontageSettings {
        rows: 1,
        columns: 2,
        slice_spacing: 5,
    };
    let mut sink = RecordingSink::new();
    let viewport = Viewport::new(0, 0, 203, 100);
    assert_eq!(session.draw(&state, viewport, DrawPurpose::Render, &mut sink), 2);

    let views = sink.views();
    assert_eq!(views[0].setup.viewport, Viewport::new(0, 0, 100, 100));
    assert_eq!(views[1].setup.viewport, Viewport::new(103, 0, 100, 100));
    for view in views {
        assert_eq!(view.quad_count(), 16);
        // montage cells never get crosshairs
        assert!(view.lines.is_empty());
    }
    let labels: Vec<_> = views.iter().flat_map(|v| v.labels.iter().map(|l| l.text.clone())).collect();
    assert_eq!(labels, vec!["Z=30mm".to_string(), "Z=20mm".to_string()]);
    assert_eq!((views[0].labels[0].x, views[0].labels[0].y), (95, 5));

    // quads of a cell lie on that cell's slice
    let (corners, _) = views[1].quads[0].quads().next().expect("quad");
    assert!(corners.iter().all(|c| (c.z - 20.0).abs() < 1e-5));
}

#[test]
fn test_montage_labels_can_be_hidden() {
    let volume = labeled_volume([4, 4, 16], Vec3::ZERO, Vec3::ONE, |_| 1.0);
    let palettes = PaletteRegistry::new();
    let options = SliceDrawOptions {
        show_montage_coordinates: false,
        ..SliceDrawOptions::default()
    };
    let mut session = SliceDrawSession::new(vec![label_overlay(&volume)], &palettes, options).expect("session");

    let mut state = ViewState::new(Vec3::new(1.0, 1.0, 8.0));
    state.view_mode = ViewMode::Montage;
    let mut sink = RecordingSink::new();
    let views = session.draw(&state, Viewport::new(0, 0, 400, 300), DrawPurpose::Render, &mut sink);
    assert!(views > 0);
    assert!(sink.views().iter().all(|v| v.labels.is_empty()));
}

#[test]
fn test_cached_map_fetched_once_per_session() {
    let geometry = VolumeGeometry::from_origin_and_spacing([4, 4, 4], Vec3::ZERO, Vec3::ONE).expect("geometry");
    let values: Vec<f32> = (0..64).map(|v| v as f32 + 1.0).collect();
    let source = Arc::new(InMemoryMapSource::new(vec![values]));
    let volume: Volume = CachedMapVolume::dense("remote", geometry, 1, Arc::clone(&source)).into();
    assert_eq!(source.fetch_count(), 0);

    let overlay = VolumeOverlay::new(&volume, 0, ColorMapping::Palette(PaletteColorMapping::new("Gray_Interp")))
        .expect("overlay");
    let palettes = PaletteRegistry::new();
    let mut session = SliceDrawSession::new(vec![overlay], &palettes, SliceDrawOptions::default()).expect("session");
    assert_eq!(source.fetch_count(), 1);

    let mut state = ViewState::new(Vec3::splat(1.5));
    state.view_plane = ViewPlane::All;
    state.view_mode = ViewMode::Oblique;
    state.oblique_rotation = Mat4::from_rotation_y(0.3);
    let mut sink = RecordingSink::new();
    assert_eq!(session.draw(&state, Viewport::new(0, 0, 400, 400), DrawPurpose::Render, &mut sink), 4);
    assert!(sink.views().iter().any(|v| v.quad_count() > 0));

    state.view_mode = ViewMode::Orthogonal;
    session.draw(&state, Viewport::new(0, 0, 400, 400), DrawPurpose::Render, &mut sink);
    assert_eq!(source.fetch_count(), 1);
}

#[test]
fn test_all_view_draws_three_quadrants() {
    let volume = labeled_volume([4, 5, 6], Vec3::ZERO, Vec3::ONE, |_| 1.0);
    let palettes = PaletteRegistry::new();
    let mut session =
        SliceDrawSession::new(vec![label_overlay(&volume)], &palettes, SliceDrawOptions::default()).expect("session");

    let mut state = ViewState::new(Vec3::new(1.0, 2.0, 3.0));
    state.view_plane = ViewPlane::All;
    let mut sink = RecordingSink::new();
    assert_eq!(session.draw(&state, Viewport::new(0, 0, 200, 200), DrawPurpose::Render, &mut sink), 3);

    // parasagittal, coronal, axial
    let counts: Vec<_> = sink.views().iter().map(RecordedView::quad_count).collect();
    assert_eq!(counts, vec![5 * 6, 4 * 6, 4 * 5]);
    assert_eq!(sink.views()[2].setup.viewport, Viewport::new(102, 0, 98, 98));
}

#[test]
fn test_draw_with_structures_enlarges_bounds() {
    let volume = labeled_volume([4, 5, 6], Vec3::ZERO, Vec3::ONE, |_| 1.0);
    let palettes = PaletteRegistry::new();
    let options = SliceDrawOptions::default();
    let mut session = SliceDrawSession::new(vec![label_overlay(&volume)], &palettes, options.clone()).expect("session");

    let mut sink = RecordingSink::new();
    let state = ViewState::new(Vec3::new(1.0, 2.0, 3.0));
    assert!(session.draw_with_structures(&state, VIEWPORT, DrawPurpose::Render, &mut sink));

    let view = &sink.views()[0];
    assert_eq!(view.quad_count(), 5 * 6 + 4 * 6 + 4 * 5);
    let expected = volslice_render::OrthographicBounds::for_view(
        &volume.geometry().voxel_bounding_box(),
        ViewPlane::All,
        1.0,
        options.orthographic_margin,
        VIEWPORT,
    )
    .expect("bounds")
    .enlarged(options.all_structures_scale);
    assert_eq!(view.setup.projection, expected.projection());
}

#[test]
fn test_crosshairs_and_surface_outlines() {
    let volume = labeled_volume([4, 4, 4], Vec3::ZERO, Vec3::ONE, |_| 1.0);
    let palettes = PaletteRegistry::new();
    let options = SliceDrawOptions {
        show_crosshairs: true,
        ..SliceDrawOptions::default()
    };
    let mut session = SliceDrawSession::new(vec![label_overlay(&volume)], &palettes, options).expect("session");
    session.add_surface(OutlineSurface::new(
        "tetra",
        vec![Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0), Vec3::new(0.0, 3.0, 0.0), Vec3::new(0.0, 0.0, 3.0)],
        vec![[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]],
        [255, 255, 0, 255],
    ));

    let mut sink = RecordingSink::new();
    session.draw(&ViewState::new(Vec3::splat(1.0)), VIEWPORT, DrawPurpose::Render, &mut sink);
    let view = &sink.views()[0];
    assert_eq!(view.lines.len(), 2);
    assert_eq!(view.lines[0].len(), 3);
    assert_eq!(view.lines[1].len(), 2);
}

#[test]
fn test_empty_viewport_draws_nothing() {
    let volume = labeled_volume([2, 2, 2], Vec3::ZERO, Vec3::ONE, |_| 1.0);
    let palettes = PaletteRegistry::new();
    let mut session =
        SliceDrawSession::new(vec![label_overlay(&volume)], &palettes, SliceDrawOptions::default()).expect("session");
    let mut sink = RecordingSink::new();
    let drawn = session.draw(&ViewState::default(), Viewport::new(0, 0, 0, 10), DrawPurpose::Render, &mut sink);
    assert_eq!(drawn, 0);
    assert!(sink.views().is_empty());
}

#[test]
fn test_session_requires_overlays() {
    let palettes = PaletteRegistry::new();
    let err = SliceDrawSession::new(Vec::new(), &palettes, SliceDrawOptions::default()).unwrap_err();
    assert_eq!(err, DrawError::NoOverlays);
}

#[test]
fn test_options_file_roundtrip() {
    let options = SliceDrawOptions {
        montage_gap: 7,
        show_crosshairs: true,
        label_drawing: LabelDrawingType::Outline,
        ..SliceDrawOptions::default()
    };
    let path = std::env::temp_dir().join(format!("volslice-options-{}.json", std::process::id()));
    options.save(&path).expect("save");
    let loaded = SliceDrawOptions::load(&path).expect("load");
    let _ = std::fs::remove_file(&path);
    assert_eq!(loaded, options);
}

proptest! {
    #[test]
    fn prop_orthogonal_quads_lie_on_slice(
        x in -2.9f32..2.9,
        y in -1.9f32..2.9,
        z in -0.9f32..2.9,
        plane in 0usize..3,
    ) {
        let dims = [6, 5, 4];
        let volume = labeled_volume(dims, Vec3::new(-2.5, -1.5, -0.5), Vec3::ONE, |_| 1.0);
        let palettes = PaletteRegistry::new();
        let mut session = SliceDrawSession::new(
            vec![label_overlay(&volume)],
            &palettes,
            SliceDrawOptions::default(),
        ).expect("session");

        let view_plane = ViewPlane::SLICE_PLANES[plane];
        let axes = view_plane.axes();
        let mut state = ViewState::new(Vec3::new(x, y, z));
        state.view_plane = view_plane;
        let mut sink = RecordingSink::new();
        prop_assert_eq!(session.draw(&state, VIEWPORT, DrawPurpose::Render, &mut sink), 1);

        let view = &sink.views()[0];
        prop_assert_eq!(view.quad_count(), dims[axes.column_axis] * dims[axes.row_axis]);
        for batch in &view.quads {
            for (corners, _) in batch.quads() {
                for corner in corners {
                    prop_assert!((corner[axes.through_axis] - state.slice_coordinates[axes.through_axis]).abs() < 1e-4);
                }
            }
        }
    }
}
