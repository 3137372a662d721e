//! Per-cell compositing of oblique samples.

use crate::oblique::{PerVolumeValueBuffer, SampleLink, VoxelSample};

/// The color chosen for one oblique cell and the overlay it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompositedCell {
    pub rgba: [u8; 4],
    pub volume_index: usize,
}

/// Picks a color for every sample.
///
/// The links of a sample are scanned in overlay order and the first entry with
/// non-zero alpha wins; there is no blending. Samples where every linked volume
/// is transparent yield `None`.
pub fn composite(
    samples: &[VoxelSample],
    links: &[SampleLink],
    buffers: &[PerVolumeValueBuffer],
) -> Vec<Option<CompositedCell>> {
    samples
        .iter()
        .map(|sample| {
            links.get(sample.links.clone())?.iter().find_map(|link| {
                let rgba = buffers.get(link.volume_index)?.rgba_at(link.offset)?;
                (rgba[3] > 0).then_some(CompositedCell {
                    rgba,
                    volume_index: link.volume_index,
                })
            })
        })
        .collect()
}
