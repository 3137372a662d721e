//! Shared fixtures for unit tests.

use glam::{IVec3, Vec3};
use volslice_core::{
    ColorMapping, DenseVolume, LabelTable, MapCache, PaletteColorMapping, PaletteRegistry, SliceDrawOptions, Volume,
    VolumeGeometry, VolumeOverlay,
};

use crate::context::DrawContext;

pub(crate) const RED: [u8; 4] = [255, 0, 0, 255];
pub(crate) const GREEN: [u8; 4] = [0, 255, 0, 255];

/// Label 1 is red, label 2 is green, everything else is transparent.
pub(crate) fn label_table() -> LabelTable {
    let mut table = LabelTable::new();
    table.insert(1, "red", RED);
    table.insert(2, "green", GREEN);
    table
}

/// A single-map volume with values given per voxel index.
#[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
pub(crate) fn labeled_volume(dims: [usize; 3], origin: Vec3, spacing: Vec3, value: impl Fn(IVec3) -> f32) -> Volume {
    let geometry = VolumeGeometry::from_origin_and_spacing(dims, origin, spacing).unwrap();
    let mut values = Vec::with_capacity(geometry.num_voxels());
    for k in 0..dims[2] {
        for j in 0..dims[1] {
            for i in 0..dims[0] {
                values.push(value(IVec3::new(i as i32, j as i32, k as i32)));
            }
        }
    }
    DenseVolume::new("test", geometry, vec![values]).unwrap().into()
}

pub(crate) fn label_overlay<'a>(volume: &'a Volume, table: &LabelTable) -> VolumeOverlay<'a> {
    VolumeOverlay::new(volume, 0, ColorMapping::Labels(table.clone())).unwrap()
}

pub(crate) fn palette_overlay<'a>(volume: &'a Volume, palette: &str) -> VolumeOverlay<'a> {
    VolumeOverlay::new(volume, 0, ColorMapping::Palette(PaletteColorMapping::new(palette))).unwrap()
}

/// Overlays with their map cache, palettes and options.
pub(crate) struct Fixture<'a> {
    pub overlays: Vec<VolumeOverlay<'a>>,
    pub map_cache: MapCache,
    pub palettes: PaletteRegistry,
    pub options: SliceDrawOptions,
}

impl<'a> Fixture<'a> {
    pub fn new(overlays: Vec<VolumeOverlay<'a>>) -> Self {
        let map_cache = MapCache::fetch(&overlays);
        Self {
            overlays,
            map_cache,
            palettes: PaletteRegistry::new(),
            options: SliceDrawOptions::default(),
        }
    }

    pub fn context(&self) -> DrawContext<'_> {
        DrawContext {
            overlays: &self.overlays,
            map_cache: &self.map_cache,
            color_mapper: &self.palettes,
            options: &self.options,
        }
    }
}
