//! Per-frame slice drawing.
//!
//! A [`SliceDrawSession`] holds the overlays of one frame together with the
//! whole maps of cached-map volumes, so that a frame made of several views
//! (the all view, a montage) fetches every remote map exactly once.

use glam::IVec3;
use volslice_core::{
    ColorMapper, DrawMode, IdentificationRecord, MapCache, SelectedVoxel, SelectionReadback, SliceDrawOptions,
    ViewMode, ViewPlane, ViewState, VolumeGeometry, VolumeOverlay, VoxelHit, VoxelIdentification,
};
use volslice_render::{
    all_view_viewports, crosshairs, draw_oblique, draw_orthogonal, montage_cells, montage_label, resolve_slice_plane,
    surface_outline, DrawContext, DrawError, DrawResult, OrthographicBounds, OutlineSurface, PrimitiveSink,
    SliceFrame, TextLabel, ViewCamera, ViewSetup, Viewport,
};

/// Inset of montage coordinate labels from the bottom-right cell corner, in pixels.
const MONTAGE_LABEL_INSET: i32 = 5;

/// What a draw is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawPurpose {
    /// Colored slices with outlines, crosshairs and labels.
    #[default]
    Render,
    /// Identification colors only, for the view under the given window pixel.
    Identify { x: i32, y: i32 },
}

impl DrawPurpose {
    fn is_identify(self) -> bool {
        matches!(self, DrawPurpose::Identify { .. })
    }

    /// Whether a view with this viewport takes part in the draw.
    fn includes(self, viewport: Viewport) -> bool {
        match self {
            DrawPurpose::Render => true,
            DrawPurpose::Identify { x, y } => viewport.contains(x, y),
        }
    }
}

/// Draws slice views of a stack of overlays.
pub struct SliceDrawSession<'a> {
    overlays: Vec<VolumeOverlay<'a>>,
    map_cache: MapCache,
    color_mapper: &'a dyn ColorMapper,
    options: SliceDrawOptions,
    surfaces: Vec<OutlineSurface>,
    identification: VoxelIdentification,
}

impl<'a> SliceDrawSession<'a> {
    /// Creates a session and fetches the map of every cached-map overlay.
    ///
    /// Overlays are in layer order, the first one at the bottom. The first
    /// overlay is the reference volume for the orthographic bounds, montage
    /// slices and oblique voxel alignment.
    pub fn new(
        overlays: Vec<VolumeOverlay<'a>>,
        color_mapper: &'a dyn ColorMapper,
        options: SliceDrawOptions,
    ) -> DrawResult<Self> {
        if overlays.is_empty() {
            return Err(DrawError::NoOverlays);
        }
        let map_cache = MapCache::fetch(&overlays);
        log::debug!("slice draw session with {} overlays", overlays.len());
        Ok(Self {
            overlays,
            map_cache,
            color_mapper,
            options,
            surfaces: Vec::new(),
            identification: VoxelIdentification::new(),
        })
    }

    /// Adds a surface whose intersection with each slice is outlined.
    pub fn add_surface(&mut self, surface: OutlineSurface) {
        self.surfaces.push(surface);
    }

    /// The overlays, bottom layer first.
    pub fn overlays(&self) -> &[VolumeOverlay<'a>] {
        &self.overlays
    }

    /// The drawing options.
    pub fn options(&self) -> &SliceDrawOptions {
        &self.options
    }

    /// The whole-map cache built when the session was created.
    pub fn map_cache(&self) -> &MapCache {
        &self.map_cache
    }

    /// Identification records of the last identification draw.
    pub fn identification(&self) -> &VoxelIdentification {
        &self.identification
    }

    fn reference(&self) -> &VolumeGeometry {
        self.overlays[0].volume().geometry()
    }

    /// Draws the slice view for the state into the viewport.
    ///
    /// Montage mode draws a grid of orthogonal slices. The all view draws the
    /// parasagittal, coronal and axial slices in three quadrants, and in
    /// oblique mode all three slices together in the bottom-left quadrant.
    /// Returns the number of views drawn.
    pub fn draw(
        &mut self,
        state: &ViewState,
        viewport: Viewport,
        purpose: DrawPurpose,
        sink: &mut dyn PrimitiveSink,
    ) -> usize {
        if viewport.is_empty() {
            log::debug!("nothing drawn into empty viewport {viewport:?}");
            return 0;
        }

        if state.view_mode == ViewMode::Montage {
            return self.draw_montage(state, viewport, purpose, sink);
        }

        let views = if state.view_plane == ViewPlane::All {
            let quadrants = all_view_viewports(viewport, self.options.all_view_gap);
            let mut views = 0;
            for (view_plane, quadrant) in [
                (ViewPlane::Parasagittal, quadrants.parasagittal),
                (ViewPlane::Coronal, quadrants.coronal),
                (ViewPlane::Axial, quadrants.axial),
            ] {
                if self.draw_single_view(state, view_plane, quadrant, None, purpose, sink) {
                    views += 1;
                }
            }
            if state.is_oblique()
                && self.draw_three_slice_view(
                    state,
                    quadrants.three_dimensional,
                    DrawMode::ThreeDimensional,
                    purpose,
                    sink,
                )
            {
                views += 1;
            }
            views
        } else {
            usize::from(self.draw_single_view(state, state.view_plane, viewport, None, purpose, sink))
        };
        log::trace!("drew {views} views");
        views
    }

    /// Draws all three slices into one view among other structures.
    ///
    /// The orthographic bounds are enlarged so that the slices leave room for
    /// the rest of the scene.
    pub fn draw_with_structures(
        &mut self,
        state: &ViewState,
        viewport: Viewport,
        purpose: DrawPurpose,
        sink: &mut dyn PrimitiveSink,
    ) -> bool {
        self.draw_three_slice_view(state, viewport, DrawMode::AllStructures, purpose, sink)
    }

    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    fn draw_montage(
        &mut self,
        state: &ViewState,
        viewport: Viewport,
        purpose: DrawPurpose,
        sink: &mut dyn PrimitiveSink,
    ) -> usize {
        let view_plane = match state.view_plane {
            ViewPlane::All => ViewPlane::Axial,
            other => other,
        };
        let axes = view_plane.axes();
        let reference = self.reference();
        let through = axes.through_axis;
        let selected_slice = i64::from(reference.enclosing_voxel(state.slice_coordinates)[through]);
        let cells = montage_cells(
            viewport,
            &state.montage,
            self.options.montage_gap,
            selected_slice,
            reference.dims()[through],
        );

        let mut views = 0;
        for cell in cells {
            let coordinate = self.reference().index_to_space(IVec3::splat(cell.slice_index as i32))[through];
            if !self.draw_single_view(state, view_plane, cell.viewport, Some(cell.slice_index), purpose, sink) {
                continue;
            }
            views += 1;
            if purpose == DrawPurpose::Render && self.options.show_montage_coordinates {
                sink.draw_text(&TextLabel {
                    text: montage_label(
                        axes.coordinate_label,
                        coordinate,
                        self.options.montage_coordinate_precision,
                    ),
                    x: cell.viewport.width - MONTAGE_LABEL_INSET,
                    y: MONTAGE_LABEL_INSET,
                });
            }
        }
        views
    }

    /// Draws one slice plane into its own view. Returns false when skipped.
    fn draw_single_view(
        &mut self,
        state: &ViewState,
        view_plane: ViewPlane,
        viewport: Viewport,
        montage_slice_index: Option<usize>,
        purpose: DrawPurpose,
        sink: &mut dyn PrimitiveSink,
    ) -> bool {
        if !purpose.includes(viewport) {
            return false;
        }
        match self.try_draw_single_view(state, view_plane, viewport, montage_slice_index, purpose, sink) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("{} view skipped: {e}", view_plane.name());
                false
            }
        }
    }

    fn try_draw_single_view(
        &mut self,
        state: &ViewState,
        view_plane: ViewPlane,
        viewport: Viewport,
        montage_slice_index: Option<usize>,
        purpose: DrawPurpose,
        sink: &mut dyn PrimitiveSink,
    ) -> DrawResult<()> {
        let reference = self.reference();
        let frame = resolve_slice_plane(state, view_plane, reference, montage_slice_index)?;
        let ortho = OrthographicBounds::for_view(
            &reference.voxel_bounding_box(),
            view_plane,
            state.zoom,
            self.options.orthographic_margin,
            viewport,
        )?;
        let camera = ViewCamera::for_slice(state, &frame);
        sink.begin_view(&ViewSetup {
            viewport,
            projection: ortho.projection(),
            view: camera.view,
        });

        if purpose.is_identify() {
            let estimate = self.estimated_voxels(view_plane);
            self.identification.reset(estimate);
        }
        let oblique = state.is_oblique() && montage_slice_index.is_none();
        self.draw_slice(state, &frame, &ortho, oblique, DrawMode::SingleSlice, purpose, sink)?;

        if purpose == DrawPurpose::Render {
            self.draw_surface_outlines(&frame, sink);
            if self.options.show_crosshairs && montage_slice_index.is_none() {
                sink.draw_lines(&crosshairs(state, &frame));
            }
        }
        Ok(())
    }

    /// Draws the three slice planes together in one 3D view.
    fn draw_three_slice_view(
        &mut self,
        state: &ViewState,
        viewport: Viewport,
        draw_mode: DrawMode,
        purpose: DrawPurpose,
        sink: &mut dyn PrimitiveSink,
    ) -> bool {
        if !purpose.includes(viewport) {
            return false;
        }
        let reference_bounds = self.reference().voxel_bounding_box();
        let mut ortho = match OrthographicBounds::for_view(
            &reference_bounds,
            ViewPlane::All,
            1.0,
            self.options.orthographic_margin,
            viewport,
        ) {
            Ok(ortho) => ortho,
            Err(e) => {
                log::debug!("3D slice view skipped: {e}");
                return false;
            }
        };
        if draw_mode == DrawMode::AllStructures {
            ortho = ortho.enlarged(self.options.all_structures_scale);
        }
        let camera = ViewCamera::three_slice(state.zoom);
        sink.begin_view(&ViewSetup {
            viewport,
            projection: ortho.projection(),
            view: camera.view,
        });

        if purpose.is_identify() {
            let estimate: usize = ViewPlane::SLICE_PLANES.iter().map(|p| self.estimated_voxels(*p)).sum();
            self.identification.reset(estimate);
        }
        let oblique = state.is_oblique();
        for view_plane in ViewPlane::SLICE_PLANES {
            let frame = match resolve_slice_plane(state, view_plane, self.reference(), None) {
                Ok(frame) => frame,
                Err(e) => {
                    log::debug!("{} slice skipped in 3D view: {e}", view_plane.name());
                    continue;
                }
            };
            if let Err(e) = self.draw_slice(state, &frame, &ortho, oblique, draw_mode, purpose, sink) {
                log::debug!("{} slice skipped in 3D view: {e}", view_plane.name());
                continue;
            }
            if purpose == DrawPurpose::Render {
                self.draw_surface_outlines(&frame, sink);
            }
        }
        true
    }

    /// Draws the quads of one slice into the current view.
    #[allow(clippy::too_many_arguments)]
    fn draw_slice(
        &mut self,
        state: &ViewState,
        frame: &SliceFrame,
        ortho: &OrthographicBounds,
        oblique: bool,
        draw_mode: DrawMode,
        purpose: DrawPurpose,
        sink: &mut dyn PrimitiveSink,
    ) -> DrawResult<()> {
        // built from fields so that the identification records can be borrowed mutably
        let ctx = DrawContext {
            overlays: &self.overlays,
            map_cache: &self.map_cache,
            color_mapper: self.color_mapper,
            options: &self.options,
        };
        let identification = purpose.is_identify().then_some(&mut self.identification);
        if oblique {
            let slice = draw_oblique(&ctx, frame, state, ortho, draw_mode, identification)?;
            sink.draw_quads(&slice.batch);
        } else {
            for batch in draw_orthogonal(&ctx, frame, identification) {
                sink.draw_quads(&batch);
            }
        }
        Ok(())
    }

    fn draw_surface_outlines(&self, frame: &SliceFrame, sink: &mut dyn PrimitiveSink) {
        for surface in &self.surfaces {
            let lines = surface_outline(&frame.plane, surface);
            if !lines.is_empty() {
                sink.draw_lines(&lines);
            }
        }
    }

    fn estimated_voxels(&self, view_plane: ViewPlane) -> usize {
        let axes = view_plane.axes();
        let dims = self.reference().dims();
        dims[axes.column_axis] * dims[axes.row_axis] * self.overlays.len()
    }

    /// Resolves the voxel under a window pixel after an identification draw.
    ///
    /// The pixel is read back and decoded to its identification record. The
    /// voxel replaces the current selection when it is nearer to the viewer.
    pub fn process_identification(
        &self,
        readback: &dyn SelectionReadback,
        x: i32,
        y: i32,
        selected: &mut SelectedVoxel,
    ) -> Option<IdentificationRecord> {
        let pixel = readback.read_pixel(x, y)?;
        let record = self.identification.decode(pixel.rgba)?;
        let overlay = self.overlays.get(record.volume_index)?;
        let xyz = overlay.volume().geometry().index_to_space(record.ijk);
        let replaced = selected.offer(VoxelHit {
            record,
            xyz,
            screen_depth: pixel.depth,
        });
        log::debug!(
            "identified voxel {} of '{}' at {xyz} (depth {}, {})",
            record.ijk,
            overlay.volume().name(),
            pixel.depth,
            if replaced { "selected" } else { "farther than selection" }
        );
        Some(record)
    }
}

impl std::fmt::Debug for SliceDrawSession<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SliceDrawSession")
            .field("overlays", &self.overlays)
            .field("map_cache", &self.map_cache)
            .field("options", &self.options)
            .field("surfaces", &self.surfaces.len())
            .field("identification", &self.identification.len())
            .finish_non_exhaustive()
    }
}
