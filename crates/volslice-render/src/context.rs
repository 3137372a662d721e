//! Per-draw inputs shared by the slice rasterizers.

use volslice_core::{ColorMapper, MapCache, SliceDrawOptions, VolumeOverlay, VolumeSampler};

/// Everything a slice draw reads besides the view state.
///
/// Overlays are in layer order, index 0 at the bottom. The map cache must have
/// been built from the same overlay slice.
#[derive(Clone, Copy)]
pub struct DrawContext<'a> {
    pub overlays: &'a [VolumeOverlay<'a>],
    pub map_cache: &'a MapCache,
    pub color_mapper: &'a dyn ColorMapper,
    pub options: &'a SliceDrawOptions,
}

impl<'a> DrawContext<'a> {
    /// Sampler for one overlay.
    pub fn sampler(&self, overlay_index: usize) -> Option<VolumeSampler<'a>> {
        let overlay = self.overlays.get(overlay_index)?;
        Some(self.map_cache.sampler(overlay_index, overlay))
    }

    /// Samplers for all overlays, in layer order.
    pub fn samplers(&self) -> Vec<VolumeSampler<'a>> {
        self.overlays
            .iter()
            .enumerate()
            .map(|(i, overlay)| self.map_cache.sampler(i, overlay))
            .collect()
    }
}

impl std::fmt::Debug for DrawContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawContext")
            .field("overlays", &self.overlays.len())
            .field("map_cache", &self.map_cache)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
