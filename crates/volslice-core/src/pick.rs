//! Voxel identification for picking.
//!
//! During an identification draw every emitted quad is filled with a color that
//! encodes a small per-draw integer. The integer indexes a flat record list of
//! `(volume, map, i, j, k)` tuples. After the draw the pixel under the mouse is
//! read back and decoded to the record.

use glam::{IVec3, Vec3};

/// Number of `i64` fields stored per identified voxel.
pub const IDENTIFICATION_FIELDS_PER_VOXEL: usize = 5;

/// Largest id that fits in 24 bits after reserving black for the background.
pub const MAX_PICK_ID: u32 = 0x00FF_FFFE;

/// Encodes an index into an RGB color.
///
/// The color is encoded as RGB where:
/// - R contains bits 16-23
/// - G contains bits 8-15
/// - B contains bits 0-7
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn index_to_color(index: u32) -> [u8; 3] {
    [
        ((index >> 16) & 0xFF) as u8,
        ((index >> 8) & 0xFF) as u8,
        (index & 0xFF) as u8,
    ]
}

/// Decodes a color produced by [`index_to_color`].
#[must_use]
pub fn color_to_index(r: u8, g: u8, b: u8) -> u32 {
    (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)
}

/// Turns identification ids into colors distinguishable from drawn content and
/// back.
pub trait PickColorCodec {
    /// Color written for an id.
    fn encode(&self, id: u32) -> [u8; 4];

    /// Id for a read-back color, or `None` for background.
    fn decode(&self, rgba: [u8; 4]) -> Option<u32>;
}

/// Stores `id + 1` in 24-bit RGB with opaque alpha. Black is background.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlatIndexCodec;

impl PickColorCodec for FlatIndexCodec {
    fn encode(&self, id: u32) -> [u8; 4] {
        let [r, g, b] = index_to_color(id + 1);
        [r, g, b, 255]
    }

    fn decode(&self, rgba: [u8; 4]) -> Option<u32> {
        color_to_index(rgba[0], rgba[1], rgba[2]).checked_sub(1)
    }
}

/// One identified voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentificationRecord {
    pub volume_index: usize,
    pub map_index: usize,
    pub ijk: IVec3,
}

/// Per-draw identification records and their color codec.
#[derive(Debug, Clone, Default)]
pub struct VoxelIdentification<C: PickColorCodec = FlatIndexCodec> {
    indices: Vec<i64>,
    codec: C,
}

impl VoxelIdentification<FlatIndexCodec> {
    /// Creates an empty record list using [`FlatIndexCodec`].
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: PickColorCodec> VoxelIdentification<C> {
    /// Creates an empty record list with a custom codec.
    pub fn with_codec(codec: C) -> Self {
        Self {
            indices: Vec::new(),
            codec,
        }
    }

    /// Clears all records. Must be called before every identification draw.
    pub fn reset(&mut self, estimated_voxels: usize) {
        self.indices.clear();
        self.indices.reserve(estimated_voxels * IDENTIFICATION_FIELDS_PER_VOXEL);
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.indices.len() / IDENTIFICATION_FIELDS_PER_VOXEL
    }

    /// Returns whether there are no records.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Appends a record and returns the color to draw its quad with.
    ///
    /// Returns `None` once the id space is exhausted; the voxel is then not
    /// identifiable and should not be drawn in the identification pass.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn add_voxel(&mut self, volume_index: usize, map_index: usize, ijk: IVec3) -> Option<[u8; 4]> {
        let id = u32::try_from(self.len()).ok().filter(|id| *id <= MAX_PICK_ID)?;
        self.indices.extend_from_slice(&[
            volume_index as i64,
            map_index as i64,
            i64::from(ijk.x),
            i64::from(ijk.y),
            i64::from(ijk.z),
        ]);
        Some(self.codec.encode(id))
    }

    /// Returns the record with the given id.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn record(&self, id: u32) -> Option<IdentificationRecord> {
        let start = id as usize * IDENTIFICATION_FIELDS_PER_VOXEL;
        let fields = self.indices.get(start..start + IDENTIFICATION_FIELDS_PER_VOXEL)?;
        Some(IdentificationRecord {
            volume_index: fields[0] as usize,
            map_index: fields[1] as usize,
            ijk: IVec3::new(fields[2] as i32, fields[3] as i32, fields[4] as i32),
        })
    }

    /// Decodes a read-back pixel color to its record.
    pub fn decode(&self, rgba: [u8; 4]) -> Option<IdentificationRecord> {
        self.record(self.codec.decode(rgba)?)
    }
}

/// The voxel chosen by an identification, with the screen depth it was found at.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SelectedVoxel {
    hit: Option<VoxelHit>,
}

/// A voxel found under the mouse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelHit {
    pub record: IdentificationRecord,
    /// Center of the voxel in world coordinates.
    pub xyz: Vec3,
    /// Screen depth, smaller is nearer the viewer.
    pub screen_depth: f32,
}

impl SelectedVoxel {
    /// Creates an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the selected voxel, if any.
    pub fn hit(&self) -> Option<&VoxelHit> {
        self.hit.as_ref()
    }

    /// Returns whether another candidate at `screen_depth` should replace the
    /// current selection.
    pub fn is_other_screen_depth_closer_to_viewer(&self, screen_depth: f32) -> bool {
        self.hit.map_or(true, |hit| screen_depth < hit.screen_depth)
    }

    /// Stores a candidate if it is nearer than the current selection.
    pub fn offer(&mut self, hit: VoxelHit) -> bool {
        if self.is_other_screen_depth_closer_to_viewer(hit.screen_depth) {
            self.hit = Some(hit);
            true
        } else {
            false
        }
    }

    /// Clears the selection.
    pub fn reset(&mut self) {
        self.hit = None;
    }
}

/// A pixel read from the identification buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelReadback {
    pub rgba: [u8; 4],
    pub depth: f32,
}

/// Reads pixels back after an identification draw.
pub trait SelectionReadback {
    /// Color and depth at a window pixel, or `None` outside the buffer.
    fn read_pixel(&self, x: i32, y: i32) -> Option<PixelReadback>;
}
