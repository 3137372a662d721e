//! Overlay layers drawn in a slice view.

use crate::coloring::{ColorMapping, VolumeStatistics};
use crate::error::{Result, VolsliceError};
use crate::volume::Volume;

/// One volume map drawn as a layer, with its opacity and color mapping.
///
/// Overlays are owned by the caller and only read during a draw. Index 0 is the
/// bottom layer.
#[derive(Debug, Clone)]
pub struct VolumeOverlay<'a> {
    volume: &'a Volume,
    map_index: usize,
    opacity: f32,
    color_mapping: ColorMapping,
    statistics: VolumeStatistics,
}

impl<'a> VolumeOverlay<'a> {
    /// Creates a fully opaque overlay.
    ///
    /// Statistics are computed from the map for in-memory volumes. Cached-map
    /// volumes start with default statistics so that building an overlay never
    /// triggers a map fetch; use [`VolumeOverlay::with_statistics`] to supply them.
    pub fn new(volume: &'a Volume, map_index: usize, color_mapping: ColorMapping) -> Result<Self> {
        if map_index >= volume.num_maps() {
            return Err(VolsliceError::MapIndexOutOfRange {
                volume: volume.name().to_string(),
                map_index,
                num_maps: volume.num_maps(),
            });
        }
        let statistics = match volume {
            Volume::Direct(dense) => dense
                .map(map_index)
                .map(VolumeStatistics::from_values)
                .unwrap_or_default(),
            Volume::CachedMap(_) => VolumeStatistics::default(),
        };
        Ok(Self {
            volume,
            map_index,
            opacity: 1.0,
            color_mapping,
            statistics,
        })
    }

    /// Sets the opacity, which must lie in [0, 1].
    pub fn with_opacity(mut self, opacity: f32) -> Result<Self> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(VolsliceError::InvalidOpacity(opacity));
        }
        self.opacity = opacity;
        Ok(self)
    }

    /// Replaces the statistics used for auto scaling.
    #[must_use]
    pub fn with_statistics(mut self, statistics: VolumeStatistics) -> Self {
        self.statistics = statistics;
        self
    }

    /// The volume drawn by this overlay.
    pub fn volume(&self) -> &'a Volume {
        self.volume
    }

    /// The map (frame) of the volume.
    pub fn map_index(&self) -> usize {
        self.map_index
    }

    /// Opacity in [0, 1].
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Opacity as an alpha byte.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn opacity_byte(&self) -> u8 {
        (self.opacity * 255.0).round() as u8
    }

    /// How values are colored.
    pub fn color_mapping(&self) -> &ColorMapping {
        &self.color_mapping
    }

    /// Statistics used for auto scaling.
    pub fn statistics(&self) -> &VolumeStatistics {
        &self.statistics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coloring::PaletteColorMapping;
    use crate::volume::{DenseVolume, VolumeGeometry};
    use glam::Vec3;

    fn volume() -> Volume {
        let geometry = VolumeGeometry::from_origin_and_spacing([2, 1, 1], Vec3::ZERO, Vec3::ONE).unwrap();
        DenseVolume::new("v", geometry, vec![vec![2.0, 6.0]]).unwrap().into()
    }

    #[test]
    fn test_overlay_validation() {
        let volume = volume();
        let mapping = ColorMapping::Palette(PaletteColorMapping::new("Gray_Interp"));
        assert!(VolumeOverlay::new(&volume, 1, mapping.clone()).is_err());

        let overlay = VolumeOverlay::new(&volume, 0, mapping).unwrap();
        assert_eq!(overlay.statistics().min, 2.0);
        assert_eq!(overlay.statistics().max, 6.0);
        assert_eq!(overlay.opacity_byte(), 255);

        assert!(overlay.clone().with_opacity(1.5).is_err());
        assert!(overlay.clone().with_opacity(-0.1).is_err());
        assert_eq!(overlay.with_opacity(0.5).unwrap().opacity_byte(), 128);
    }
}
