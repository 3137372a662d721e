//! Volume backings and their index/space mapping.
//!
//! A [`Volume`] is one of a closed set of backings:
//! - [`DenseVolume`] keeps every map in memory and supports direct voxel access.
//! - [`CachedMapVolume`] is backed by a [`MapSource`] for which per-voxel access is
//!   prohibitively expensive (e.g. data served remotely). Whole maps are fetched
//!   once per draw session and sampled through a voxel-to-offset table.
//!
//! Map data is stored with `i` varying fastest: the offset of voxel `(i, j, k)` is
//! `i + j * dim_i + k * dim_i * dim_j`.

use std::sync::atomic::{AtomicUsize, Ordering};

use glam::{IVec3, Mat4, Vec3};

use crate::bounding_box::BoundingBox;
use crate::error::{Result, VolsliceError};

/// Dimensions and index-to-space transform of a voxel grid.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeGeometry {
    dims: [usize; 3],
    index_to_space: Mat4,
    space_to_index: Mat4,
}

impl VolumeGeometry {
    /// Creates a geometry from dimensions and an affine index-to-space matrix.
    pub fn new(dims: [usize; 3], index_to_space: Mat4) -> Result<Self> {
        if dims.iter().any(|&d| d == 0 || d > i32::MAX as usize) {
            return Err(VolsliceError::InvalidDimensions(dims));
        }
        let det = index_to_space.determinant();
        if !det.is_finite() || det.abs() < f32::EPSILON {
            return Err(VolsliceError::SingularTransform(format!("{dims:?}")));
        }
        Ok(Self {
            dims,
            index_to_space,
            space_to_index: index_to_space.inverse(),
        })
    }

    /// Creates an axis-aligned geometry from the center of voxel (0, 0, 0) and the
    /// signed voxel spacing along each axis.
    pub fn from_origin_and_spacing(dims: [usize; 3], origin: Vec3, spacing: Vec3) -> Result<Self> {
        let matrix = Mat4::from_translation(origin) * Mat4::from_scale(spacing);
        Self::new(dims, matrix)
    }

    /// Number of voxels along each index axis.
    pub fn dims(&self) -> [usize; 3] {
        self.dims
    }

    /// Total number of voxels in one map.
    pub fn num_voxels(&self) -> usize {
        self.dims[0] * self.dims[1] * self.dims[2]
    }

    /// The index-to-space matrix.
    pub fn index_to_space_matrix(&self) -> Mat4 {
        self.index_to_space
    }

    /// Converts an integer voxel index to the coordinate of its center.
    pub fn index_to_space(&self, ijk: IVec3) -> Vec3 {
        self.index_to_space.transform_point3(ijk.as_vec3())
    }

    /// Converts a fractional voxel index to a coordinate.
    pub fn fractional_index_to_space(&self, ijk: Vec3) -> Vec3 {
        self.index_to_space.transform_point3(ijk)
    }

    /// Converts a coordinate to a fractional voxel index.
    pub fn space_to_index(&self, xyz: Vec3) -> Vec3 {
        self.space_to_index.transform_point3(xyz)
    }

    /// Returns the voxel whose center is nearest to the coordinate.
    ///
    /// The returned index may be outside the volume; check with
    /// [`VolumeGeometry::index_valid`].
    #[allow(clippy::cast_possible_truncation)]
    pub fn enclosing_voxel(&self, xyz: Vec3) -> IVec3 {
        let f = self.space_to_index(xyz);
        IVec3::new(
            f.x.round() as i32,
            f.y.round() as i32,
            f.z.round() as i32,
        )
    }

    /// Returns whether a voxel index lies inside the volume.
    #[allow(clippy::cast_sign_loss)]
    pub fn index_valid(&self, ijk: IVec3) -> bool {
        ijk.cmpge(IVec3::ZERO).all()
            && (ijk.x as usize) < self.dims[0]
            && (ijk.y as usize) < self.dims[1]
            && (ijk.z as usize) < self.dims[2]
    }

    /// Returns the offset of a voxel in map data, or `None` if outside.
    #[allow(clippy::cast_sign_loss)]
    pub fn offset(&self, ijk: IVec3) -> Option<usize> {
        if !self.index_valid(ijk) {
            return None;
        }
        Some(ijk.x as usize + self.dims[0] * (ijk.y as usize + self.dims[1] * ijk.z as usize))
    }

    /// Change in coordinate for a one voxel step along an index axis.
    pub fn axis_step(&self, axis: usize) -> Vec3 {
        let mut unit = IVec3::ZERO;
        unit[axis] = 1;
        self.index_to_space(unit) - self.index_to_space(IVec3::ZERO)
    }

    /// Signed change in coordinate from voxel (0,0,0) to voxel (1,1,1).
    pub fn voxel_step(&self) -> Vec3 {
        self.index_to_space(IVec3::ONE) - self.index_to_space(IVec3::ZERO)
    }

    /// Absolute voxel spacing along each coordinate axis.
    pub fn spacing(&self) -> Vec3 {
        self.voxel_step().abs()
    }

    /// Smallest and largest spacing, or `None` if any spacing is not positive.
    pub fn min_max_spacing(&self) -> Option<(f32, f32)> {
        let spacing = self.spacing();
        let min = spacing.min_element();
        let max = spacing.max_element();
        (min > 0.0 && max > 0.0).then_some((min, max))
    }

    /// Bounding box of the voxel centers (first and last voxel).
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn voxel_bounding_box(&self) -> BoundingBox {
        let last = IVec3::new(
            self.dims[0] as i32 - 1,
            self.dims[1] as i32 - 1,
            self.dims[2] as i32 - 1,
        );
        BoundingBox::from_corners(self.index_to_space(IVec3::ZERO), self.index_to_space(last))
    }
}

/// A volume whose maps are held in memory.
#[derive(Debug, Clone)]
pub struct DenseVolume {
    name: String,
    geometry: VolumeGeometry,
    maps: Vec<Vec<f32>>,
}

impl DenseVolume {
    /// Creates a dense volume. Every map must hold one value per voxel.
    pub fn new(name: impl Into<String>, geometry: VolumeGeometry, maps: Vec<Vec<f32>>) -> Result<Self> {
        let expected = geometry.num_voxels();
        if let Some(bad) = maps.iter().find(|m| m.len() != expected) {
            return Err(VolsliceError::SizeMismatch {
                expected,
                actual: bad.len(),
            });
        }
        Ok(Self {
            name: name.into(),
            geometry,
            maps,
        })
    }

    /// Returns the name of the volume.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the geometry.
    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    /// Number of maps (frames) in the volume.
    pub fn num_maps(&self) -> usize {
        self.maps.len()
    }

    /// All values of one map.
    pub fn map(&self, map_index: usize) -> Option<&[f32]> {
        self.maps.get(map_index).map(Vec::as_slice)
    }

    /// Value of a voxel, or `None` if the index or map is invalid.
    pub fn value(&self, ijk: IVec3, map_index: usize) -> Option<f32> {
        let offset = self.geometry.offset(ijk)?;
        self.maps.get(map_index)?.get(offset).copied()
    }

    /// Value of the voxel enclosing a coordinate.
    pub fn nearest_value(&self, xyz: Vec3, map_index: usize) -> Option<f32> {
        self.value(self.geometry.enclosing_voxel(xyz), map_index)
    }

    /// Tricubic (Catmull-Rom) interpolation of the map at a coordinate.
    ///
    /// Returns `None` when the enclosing voxel is outside the volume. Neighbours
    /// beyond the volume edge are clamped to the edge voxel.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pub fn cubic_value(&self, xyz: Vec3, map_index: usize) -> Option<f32> {
        let data = self.maps.get(map_index)?;
        if !self.geometry.index_valid(self.geometry.enclosing_voxel(xyz)) {
            return None;
        }

        let f = self.geometry.space_to_index(xyz);
        let base = f.floor();
        let t = f - base;
        let base = base.as_ivec3();
        let wx = catmull_rom_weights(t.x);
        let wy = catmull_rom_weights(t.y);
        let wz = catmull_rom_weights(t.z);
        let dims = self.geometry.dims();
        let clamp = |v: i32, axis: usize| v.clamp(0, dims[axis] as i32 - 1) as usize;

        let mut sum = 0.0;
        for (dz, wz) in wz.iter().enumerate() {
            let k = clamp(base.z + dz as i32 - 1, 2);
            for (dy, wy) in wy.iter().enumerate() {
                let j = clamp(base.y + dy as i32 - 1, 1);
                let row = dims[0] * (j + dims[1] * k);
                for (dx, wx) in wx.iter().enumerate() {
                    let i = clamp(base.x + dx as i32 - 1, 0);
                    sum += wx * wy * wz * data[row + i];
                }
            }
        }
        Some(sum)
    }
}

fn catmull_rom_weights(t: f32) -> [f32; 4] {
    let t2 = t * t;
    let t3 = t2 * t;
    [
        0.5 * (-t3 + 2.0 * t2 - t),
        0.5 * (3.0 * t3 - 5.0 * t2 + 2.0),
        0.5 * (-3.0 * t3 + 4.0 * t2 + t),
        0.5 * (t3 - t2),
    ]
}

/// Provider of whole maps for volumes whose per-voxel access is expensive.
pub trait MapSource: Send + Sync {
    /// Fetches every value of one map.
    fn fetch_map(&self, map_index: usize) -> Result<Vec<f32>>;
}

/// An in-memory [`MapSource`] that counts how many maps were fetched.
#[derive(Debug, Default)]
pub struct InMemoryMapSource {
    maps: Vec<Vec<f32>>,
    fetch_count: AtomicUsize,
}

impl InMemoryMapSource {
    /// Creates a source serving the given maps.
    pub fn new(maps: Vec<Vec<f32>>) -> Self {
        Self {
            maps,
            fetch_count: AtomicUsize::new(0),
        }
    }

    /// Number of `fetch_map` calls served so far.
    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::Relaxed)
    }
}

impl MapSource for InMemoryMapSource {
    fn fetch_map(&self, map_index: usize) -> Result<Vec<f32>> {
        self.fetch_count.fetch_add(1, Ordering::Relaxed);
        self.maps
            .get(map_index)
            .cloned()
            .ok_or_else(|| VolsliceError::MapFetchFailed {
                volume: "in-memory".to_string(),
                map_index,
                reason: "no such map".to_string(),
            })
    }
}

impl<T: MapSource + ?Sized> MapSource for std::sync::Arc<T> {
    fn fetch_map(&self, map_index: usize) -> Result<Vec<f32>> {
        (**self).fetch_map(map_index)
    }
}

/// A volume sampled through whole-map fetches.
pub struct CachedMapVolume {
    name: String,
    geometry: VolumeGeometry,
    num_maps: usize,
    voxel_offsets: Vec<i64>,
    map_length: usize,
    source: Box<dyn MapSource>,
}

impl std::fmt::Debug for CachedMapVolume {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedMapVolume")
            .field("name", &self.name)
            .field("geometry", &self.geometry)
            .field("num_maps", &self.num_maps)
            .field("map_length", &self.map_length)
            .finish_non_exhaustive()
    }
}

impl CachedMapVolume {
    /// Creates a cached-map volume where every voxel has data and maps are laid
    /// out in voxel order.
    #[allow(clippy::cast_possible_wrap)]
    pub fn dense(
        name: impl Into<String>,
        geometry: VolumeGeometry,
        num_maps: usize,
        source: impl MapSource + 'static,
    ) -> Self {
        let n = geometry.num_voxels();
        Self {
            name: name.into(),
            geometry,
            num_maps,
            voxel_offsets: (0..n as i64).collect(),
            map_length: n,
            source: Box::new(source),
        }
    }

    /// Creates a cached-map volume with an explicit voxel-to-offset table.
    ///
    /// A negative offset marks a voxel without data.
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn with_voxel_offsets(
        name: impl Into<String>,
        geometry: VolumeGeometry,
        num_maps: usize,
        voxel_offsets: Vec<i64>,
        source: impl MapSource + 'static,
    ) -> Result<Self> {
        if voxel_offsets.len() != geometry.num_voxels() {
            return Err(VolsliceError::SizeMismatch {
                expected: geometry.num_voxels(),
                actual: voxel_offsets.len(),
            });
        }
        let map_length = voxel_offsets
            .iter()
            .copied()
            .max()
            .map_or(0, |m| (m + 1).max(0) as usize);
        Ok(Self {
            name: name.into(),
            geometry,
            num_maps,
            voxel_offsets,
            map_length,
            source: Box::new(source),
        })
    }

    /// Returns the name of the volume.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the geometry.
    pub fn geometry(&self) -> &VolumeGeometry {
        &self.geometry
    }

    /// Number of maps in the volume.
    pub fn num_maps(&self) -> usize {
        self.num_maps
    }

    /// Offset into map data for a voxel, or `None` if the voxel has no data.
    #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
    pub fn offset_for_index(&self, ijk: IVec3) -> Option<usize> {
        let voxel = self.geometry.offset(ijk)?;
        let offset = self.voxel_offsets[voxel];
        (offset >= 0).then_some(offset as usize)
    }

    /// Offset into map data for the voxel enclosing a coordinate.
    pub fn map_data_offset(&self, xyz: Vec3) -> Option<usize> {
        self.offset_for_index(self.geometry.enclosing_voxel(xyz))
    }

    /// Fetches a whole map from the backing source.
    pub fn fetch_map(&self, map_index: usize) -> Result<Vec<f32>> {
        if map_index >= self.num_maps {
            return Err(VolsliceError::MapIndexOutOfRange {
                volume: self.name.clone(),
                map_index,
                num_maps: self.num_maps,
            });
        }
        let data = self.source.fetch_map(map_index)?;
        if data.len() < self.map_length {
            return Err(VolsliceError::SizeMismatch {
                expected: self.map_length,
                actual: data.len(),
            });
        }
        Ok(data)
    }
}

/// A volume that can be drawn as an overlay.
#[derive(Debug)]
pub enum Volume {
    /// Directly indexed in-memory data.
    Direct(DenseVolume),
    /// Data fetched one whole map at a time.
    CachedMap(CachedMapVolume),
}

impl Volume {
    /// Returns the name of the volume.
    pub fn name(&self) -> &str {
        match self {
            Volume::Direct(v) => v.name(),
            Volume::CachedMap(v) => v.name(),
        }
    }

    /// Returns the geometry.
    pub fn geometry(&self) -> &VolumeGeometry {
        match self {
            Volume::Direct(v) => v.geometry(),
            Volume::CachedMap(v) => v.geometry(),
        }
    }

    /// Number of maps in the volume.
    pub fn num_maps(&self) -> usize {
        match self {
            Volume::Direct(v) => v.num_maps(),
            Volume::CachedMap(v) => v.num_maps(),
        }
    }

    /// Returns whether sampling requires a whole-map fetch.
    pub fn is_cached_map(&self) -> bool {
        matches!(self, Volume::CachedMap(_))
    }
}

impl From<DenseVolume> for Volume {
    fn from(volume: DenseVolume) -> Self {
        Volume::Direct(volume)
    }
}

impl From<CachedMapVolume> for Volume {
    fn from(volume: CachedMapVolume) -> Self {
        Volume::CachedMap(volume)
    }
}
