//! Quad and line batches handed to a primitive sink.
//!
//! The slice drawing code never rasterizes anything itself. It fills batches
//! of colored quads and lines and passes them to a [`PrimitiveSink`], which
//! owns the actual rendering backend.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};
use volslice_core::DepthOffset;

use crate::layout::Viewport;

/// One vertex of a quad.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [u8; 4],
}

/// Quads sharing a depth offset, four vertices per quad.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuadBatch {
    vertices: Vec<QuadVertex>,
    depth_offset: Option<DepthOffset>,
}

impl QuadBatch {
    /// Creates an empty batch with room for `quads` quads.
    pub fn with_capacity(quads: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(quads * 4),
            depth_offset: None,
        }
    }

    /// Sets the polygon depth offset used when drawing this batch.
    pub fn set_depth_offset(&mut self, offset: Option<DepthOffset>) {
        self.depth_offset = offset;
    }

    /// Depth offset for this batch, `None` for the bottom layer.
    pub fn depth_offset(&self) -> Option<DepthOffset> {
        self.depth_offset
    }

    /// Adds a quad given its corners in counter-clockwise order.
    pub fn add_quad(&mut self, corners: [Vec3; 4], normal: Vec3, color: [u8; 4]) {
        for corner in corners {
            self.vertices.push(QuadVertex {
                position: corner.to_array(),
                normal: normal.to_array(),
                color,
            });
        }
    }

    /// Number of quads.
    pub fn len(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Returns whether the batch has no quads.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// All vertices.
    pub fn vertices(&self) -> &[QuadVertex] {
        &self.vertices
    }

    /// Corners of one quad.
    pub fn quad_corners(&self, quad: usize) -> Option<[Vec3; 4]> {
        let v = self.vertices.get(quad * 4..quad * 4 + 4)?;
        Some(std::array::from_fn(|i| Vec3::from_array(v[i].position)))
    }

    /// Color of one quad.
    pub fn quad_color(&self, quad: usize) -> Option<[u8; 4]> {
        self.vertices.get(quad * 4).map(|v| v.color)
    }

    /// Iterates over quads as (corners, color).
    pub fn quads(&self) -> impl Iterator<Item = ([Vec3; 4], [u8; 4])> + '_ {
        self.vertices.chunks_exact(4).map(|v| {
            (
                std::array::from_fn(|i| Vec3::from_array(v[i].position)),
                v[0].color,
            )
        })
    }

    /// Raw vertex bytes, ready for upload to a vertex buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// One vertex of a line segment.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    pub position: [f32; 3],
    pub color: [u8; 4],
}

/// Line segments, two vertices per segment.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineBatch {
    vertices: Vec<LineVertex>,
    /// Line width in pixels.
    pub width: f32,
}

impl LineBatch {
    /// Creates an empty batch.
    pub fn new(width: f32) -> Self {
        Self {
            vertices: Vec::new(),
            width,
        }
    }

    /// Adds a segment.
    pub fn add_segment(&mut self, a: Vec3, b: Vec3, color: [u8; 4]) {
        self.vertices.push(LineVertex {
            position: a.to_array(),
            color,
        });
        self.vertices.push(LineVertex {
            position: b.to_array(),
            color,
        });
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.vertices.len() / 2
    }

    /// Returns whether there are no segments.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// All vertices.
    pub fn vertices(&self) -> &[LineVertex] {
        &self.vertices
    }

    /// Iterates over segments as (start, end, color).
    pub fn segments(&self) -> impl Iterator<Item = (Vec3, Vec3, [u8; 4])> + '_ {
        self.vertices
            .chunks_exact(2)
            .map(|v| (Vec3::from_array(v[0].position), Vec3::from_array(v[1].position), v[0].color))
    }

    /// Raw vertex bytes, ready for upload to a vertex buffer.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }
}

/// Text anchored in window coordinates of the current viewport.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub text: String,
    /// Pixel position of the bottom-right corner of the text.
    pub x: i32,
    pub y: i32,
}

/// Viewport and transforms for everything drawn until the next view begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewSetup {
    pub viewport: Viewport,
    pub projection: Mat4,
    pub view: Mat4,
}

/// Receives the primitives of a slice draw.
pub trait PrimitiveSink {
    /// Starts a new view. Primitives that follow use its viewport and transforms.
    fn begin_view(&mut self, setup: &ViewSetup);

    /// Draws colored quads.
    fn draw_quads(&mut self, batch: &QuadBatch);

    /// Draws line segments.
    fn draw_lines(&mut self, batch: &LineBatch);

    /// Draws a text label. Sinks without text support ignore it.
    fn draw_text(&mut self, _label: &TextLabel) {}
}

/// Everything drawn into one view.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedView {
    pub setup: ViewSetup,
    pub quads: Vec<QuadBatch>,
    pub lines: Vec<LineBatch>,
    pub labels: Vec<TextLabel>,
}

impl RecordedView {
    /// Total number of quads over all batches.
    pub fn quad_count(&self) -> usize {
        self.quads.iter().map(QuadBatch::len).sum()
    }
}

/// A sink that keeps every primitive it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    views: Vec<RecordedView>,
}

impl RecordingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded views in draw order.
    pub fn views(&self) -> &[RecordedView] {
        &self.views
    }

    /// Removes all recorded views.
    pub fn clear(&mut self) {
        self.views.clear();
    }
}

impl PrimitiveSink for RecordingSink {
    fn begin_view(&mut self, setup: &ViewSetup) {
        self.views.push(RecordedView {
            setup: *setup,
            quads: Vec::new(),
            lines: Vec::new(),
            labels: Vec::new(),
        });
    }

    fn draw_quads(&mut self, batch: &QuadBatch) {
        if let Some(view) = self.views.last_mut() {
            view.quads.push(batch.clone());
        } else {
            log::warn!("quads drawn before any view was started");
        }
    }

    fn draw_lines(&mut self, batch: &LineBatch) {
        if let Some(view) = self.views.last_mut() {
            view.lines.push(batch.clone());
        } else {
            log::warn!("lines drawn before any view was started");
        }
    }

    fn draw_text(&mut self, label: &TextLabel) {
        if let Some(view) = self.views.last_mut() {
            view.labels.push(label.clone());
        }
    }
}
