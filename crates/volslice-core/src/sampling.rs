//! Value lookup shared by the orthogonal and oblique slice paths.
//!
//! Traversal code asks a [`VolumeSampler`] for values and never looks at how
//! the volume is backed.

use glam::{IVec3, Vec3};

use crate::overlay::VolumeOverlay;
use crate::view_state::PlaneAxes;
use crate::volume::{CachedMapVolume, DenseVolume, Volume};

/// How in-memory volumes are sampled between voxel centers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingPolicy {
    /// Value of the enclosing voxel.
    Nearest,
    /// Tricubic interpolation.
    Cubic,
}

impl SamplingPolicy {
    /// Palette-mapped scalars are interpolated, label keys are not.
    pub fn for_overlay(overlay: &VolumeOverlay<'_>) -> Self {
        if overlay.color_mapping().is_label() {
            SamplingPolicy::Nearest
        } else {
            SamplingPolicy::Cubic
        }
    }
}

/// Whole maps of cached-map overlays, fetched once per draw session.
#[derive(Debug, Default)]
pub struct MapCache {
    maps: Vec<Option<Vec<f32>>>,
}

impl MapCache {
    /// Fetches the map of every cached-map overlay. Direct volumes get no entry.
    ///
    /// A failed fetch is logged and leaves that overlay without data, so it
    /// samples as invalid everywhere.
    pub fn fetch(overlays: &[VolumeOverlay<'_>]) -> Self {
        let maps = overlays
            .iter()
            .map(|overlay| match overlay.volume() {
                Volume::Direct(_) => None,
                Volume::CachedMap(volume) => match volume.fetch_map(overlay.map_index()) {
                    Ok(data) => {
                        log::debug!(
                            "fetched map {} of '{}' ({} values)",
                            overlay.map_index(),
                            volume.name(),
                            data.len()
                        );
                        Some(data)
                    }
                    Err(e) => {
                        log::warn!("{e}");
                        None
                    }
                },
            })
            .collect();
        Self { maps }
    }

    /// Cached data for an overlay, by overlay index.
    pub fn map(&self, overlay_index: usize) -> Option<&[f32]> {
        self.maps.get(overlay_index)?.as_deref()
    }

    /// Number of overlays the cache was built for.
    pub fn len(&self) -> usize {
        self.maps.len()
    }

    /// Returns whether the cache was built for no overlays.
    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Builds the sampler for one overlay.
    pub fn sampler<'a>(&'a self, overlay_index: usize, overlay: &VolumeOverlay<'a>) -> VolumeSampler<'a> {
        VolumeSampler::new(overlay, self.map(overlay_index))
    }
}

#[derive(Debug, Clone, Copy)]
enum Backing<'a> {
    Direct {
        volume: &'a DenseVolume,
        policy: SamplingPolicy,
    },
    CachedMap {
        volume: &'a CachedMapVolume,
        data: Option<&'a [f32]>,
    },
}

/// Samples one overlay's map at world coordinates or voxel indices.
#[derive(Debug, Clone, Copy)]
pub struct VolumeSampler<'a> {
    backing: Backing<'a>,
    map_index: usize,
}

impl<'a> VolumeSampler<'a> {
    /// Creates a sampler. `cached` is the whole-map data of a cached-map volume.
    pub fn new(overlay: &VolumeOverlay<'a>, cached: Option<&'a [f32]>) -> Self {
        let backing = match overlay.volume() {
            Volume::Direct(volume) => Backing::Direct {
                volume,
                policy: SamplingPolicy::for_overlay(overlay),
            },
            Volume::CachedMap(volume) => Backing::CachedMap { volume, data: cached },
        };
        Self {
            backing,
            map_index: overlay.map_index(),
        }
    }

    /// Value at a coordinate, or `None` outside the volume or without data.
    pub fn sample(&self, point: Vec3) -> Option<f32> {
        match self.backing {
            Backing::Direct { volume, policy } => match policy {
                SamplingPolicy::Cubic => volume.cubic_value(point, self.map_index),
                SamplingPolicy::Nearest => volume.nearest_value(point, self.map_index),
            },
            Backing::CachedMap { volume, data } => {
                let offset = volume.map_data_offset(point)?;
                data?.get(offset).copied()
            }
        }
    }

    /// Value of one voxel.
    pub fn value_at_index(&self, ijk: IVec3) -> Option<f32> {
        match self.backing {
            Backing::Direct { volume, .. } => volume.value(ijk, self.map_index),
            Backing::CachedMap { volume, data } => {
                let offset = volume.offset_for_index(ijk)?;
                data?.get(offset).copied()
            }
        }
    }
}

/// Raw values of one native 2D slice, row-major with columns varying fastest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SliceValues {
    pub columns: usize,
    pub rows: usize,
    pub values: Vec<f32>,
    /// False where the voxel has no data; the value there is zero.
    pub valid: Vec<bool>,
}

/// Reads every voxel of the native slice `slice_index` along the plane's
/// through axis.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn slice_values(
    sampler: &VolumeSampler<'_>,
    dims: [usize; 3],
    axes: &PlaneAxes,
    slice_index: usize,
) -> SliceValues {
    let columns = dims[axes.column_axis];
    let rows = dims[axes.row_axis];
    let mut values = Vec::with_capacity(columns * rows);
    let mut valid = Vec::with_capacity(columns * rows);

    let mut ijk = IVec3::ZERO;
    ijk[axes.through_axis] = slice_index as i32;
    for r in 0..rows {
        ijk[axes.row_axis] = r as i32;
        for c in 0..columns {
            ijk[axes.column_axis] = c as i32;
            let value = sampler.value_at_index(ijk);
            values.push(value.unwrap_or(0.0));
            valid.push(value.is_some());
        }
    }

    SliceValues {
        columns,
        rows,
        values,
        valid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coloring::{ColorMapping, LabelTable, PaletteColorMapping};
    use crate::view_state::ViewPlane;
    use crate::volume::{InMemoryMapSource, VolumeGeometry};
    use std::sync::Arc;

    fn geometry() -> VolumeGeometry {
        VolumeGeometry::from_origin_and_spacing([3, 4, 2], Vec3::ZERO, Vec3::ONE).unwrap()
    }

    fn indexed_values(geometry: &VolumeGeometry) -> Vec<f32> {
        (0..geometry.num_voxels()).map(|v| v as f32).collect()
    }

    #[test]
    fn test_policy_follows_mapping() {
        let geometry = geometry();
        let volume: Volume = DenseVolume::new("v", geometry.clone(), vec![indexed_values(&geometry)])
            .unwrap()
            .into();
        let palette = VolumeOverlay::new(&volume, 0, ColorMapping::Palette(PaletteColorMapping::new("viridis"))).unwrap();
        let labels = VolumeOverlay::new(&volume, 0, ColorMapping::Labels(LabelTable::new())).unwrap();
        assert_eq!(SamplingPolicy::for_overlay(&palette), SamplingPolicy::Cubic);
        assert_eq!(SamplingPolicy::for_overlay(&labels), SamplingPolicy::Nearest);

        let sampler = VolumeSampler::new(&labels, None);
        assert_eq!(sampler.sample(Vec3::new(1.2, 0.9, 0.1)), Some(4.0));
        assert_eq!(sampler.sample(Vec3::new(-3.0, 0.0, 0.0)), None);
    }

    #[test]
    fn test_cached_map_sampling_uses_cache() {
        let geometry = geometry();
        let source = Arc::new(InMemoryMapSource::new(vec![indexed_values(&geometry)]));
        let volume: Volume = CachedMapVolume::dense("remote", geometry, 1, Arc::clone(&source)).into();
        let overlay = VolumeOverlay::new(&volume, 0, ColorMapping::Palette(PaletteColorMapping::new("viridis"))).unwrap();
        assert_eq!(source.fetch_count(), 0);

        let overlays = [overlay];
        let cache = MapCache::fetch(&overlays);
        assert_eq!(source.fetch_count(), 1);

        let sampler = cache.sampler(0, &overlays[0]);
        for _ in 0..10 {
            assert_eq!(sampler.sample(Vec3::new(2.0, 1.0, 1.0)), Some(17.0));
        }
        assert_eq!(source.fetch_count(), 1);
    }

    #[test]
    fn test_cached_map_without_data_is_invalid() {
        let geometry = geometry();
        let volume: Volume =
            CachedMapVolume::dense("remote", geometry, 1, InMemoryMapSource::new(Vec::new())).into();
        let overlay = VolumeOverlay::new(&volume, 0, ColorMapping::Labels(LabelTable::new())).unwrap();
        let overlays = [overlay];
        let cache = MapCache::fetch(&overlays);
        assert!(cache.map(0).is_none());
        assert_eq!(cache.sampler(0, &overlays[0]).sample(Vec3::ZERO), None);
    }

    #[test]
    fn test_slice_values_layout() {
        let geometry = geometry();
        let volume: Volume = DenseVolume::new("v", geometry.clone(), vec![indexed_values(&geometry)])
            .unwrap()
            .into();
        let overlay = VolumeOverlay::new(&volume, 0, ColorMapping::Labels(LabelTable::new())).unwrap();
        let sampler = VolumeSampler::new(&overlay, None);

        let coronal = slice_values(&sampler, geometry.dims(), ViewPlane::Coronal.axes(), 2);
        assert_eq!((coronal.columns, coronal.rows), (3, 2));
        // column i, row k, fixed j = 2
        assert_eq!(coronal.values, vec![6.0, 7.0, 8.0, 18.0, 19.0, 20.0]);
        assert!(coronal.valid.iter().all(|v| *v));

        let out_of_range = slice_values(&sampler, geometry.dims(), ViewPlane::Axial.axes(), 5);
        assert!(out_of_range.valid.iter().all(|v| !*v));
    }
}
