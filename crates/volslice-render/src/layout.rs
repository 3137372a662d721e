//! Viewport layout for montage grids and the all view.

use volslice_core::MontageSettings;

/// A window-space rectangle; `(x, y)` is the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    /// Creates a viewport.
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Returns whether the viewport has no area.
    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Width divided by height.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Returns whether a window pixel lies inside the viewport.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.x + self.width && y < self.y + self.height
    }
}

/// One cell of a montage grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MontageCell {
    pub viewport: Viewport,
    /// Slice index along the through axis of the reference volume.
    pub slice_index: usize,
    pub row: usize,
    pub column: usize,
}

/// Lays out montage cells from the top-left cell, left to right, top to bottom.
///
/// The slice shown top-left is found by starting half a grid of slices above
/// `selected_slice` and stepping down until the index is inside the volume.
/// Each following cell shows a slice `slice_spacing` lower. Cells whose slice
/// falls outside `[0, slice_count)` are left empty.
#[allow(clippy::cast_possible_wrap)]
pub fn montage_cells(
    viewport: Viewport,
    settings: &MontageSettings,
    gap: i32,
    selected_slice: i64,
    slice_count: usize,
) -> Vec<MontageCell> {
    let rows = settings.rows as i32;
    let columns = settings.columns as i32;
    if rows <= 0 || columns <= 0 {
        return Vec::new();
    }
    let cell_width = (viewport.width - gap * (columns - 1)) / columns;
    let cell_height = (viewport.height - gap * (rows - 1)) / rows;
    if cell_width <= 0 || cell_height <= 0 {
        log::debug!("montage viewport {viewport:?} too small for {rows}x{columns} cells");
        return Vec::new();
    }

    let step = settings.slice_spacing.max(1) as i64;
    let max_slice = slice_count as i64;
    let cell_total = i64::from(rows * columns);
    let mut slice = selected_slice + (cell_total / 2) * step;
    while slice >= max_slice {
        slice -= step;
    }

    let mut cells = Vec::new();
    for row in 0..rows {
        for column in 0..columns {
            if (0..max_slice).contains(&slice) {
                cells.push(MontageCell {
                    viewport: Viewport::new(
                        viewport.x + column * (cell_width + gap),
                        viewport.y + (rows - row - 1) * (cell_height + gap),
                        cell_width,
                        cell_height,
                    ),
                    slice_index: slice as usize,
                    row: row as usize,
                    column: column as usize,
                });
            }
            slice -= step;
        }
    }
    cells
}

/// Label for a montage cell, such as `Z=20mm`.
pub fn montage_label(axis_letter: char, coordinate: f32, precision: usize) -> String {
    format!("{axis_letter}={coordinate:.precision$}mm")
}

/// Quadrants of the all view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllViewViewports {
    pub parasagittal: Viewport,
    pub coronal: Viewport,
    pub axial: Viewport,
    /// Bottom-left quadrant, used for the 3D view of all three slices.
    pub three_dimensional: Viewport,
}

/// Splits a viewport into the four quadrants of the all view.
pub fn all_view_viewports(viewport: Viewport, gap: i32) -> AllViewViewports {
    let half_x = viewport.width / 2;
    let half_y = viewport.height / 2;
    let width = half_x - gap;
    let height = half_y - gap;
    AllViewViewports {
        parasagittal: Viewport::new(viewport.x, viewport.y + half_y + gap, width, height),
        coronal: Viewport::new(viewport.x + half_x + gap, viewport.y + half_y + gap, width, height),
        axial: Viewport::new(viewport.x + half_x + gap, viewport.y, width, height),
        three_dimensional: Viewport::new(viewport.x, viewport.y, width, height),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(rows: usize, columns: usize, slice_spacing: usize) -> MontageSettings {
        MontageSettings {
            rows,
            columns,
            slice_spacing,
        }
    }

    #[test]
    fn test_montage_order_top_left_to_right() {
        let cells = montage_cells(Viewport::new(0, 0, 320, 200), &settings(2, 3, 2), 2, 10, 40);
        let slices: Vec<usize> = cells.iter().map(|c| c.slice_index).collect();
        // start at 10 + (6 / 2) * 2 = 16 and step down
        assert_eq!(slices, vec![16, 14, 12, 10, 8, 6]);

        assert_eq!(cells[0].viewport.y, 101);
        assert_eq!(cells[3].viewport.y, 0);
        assert_eq!(cells[1].viewport.x, 107);
        assert!(cells.iter().all(|c| c.viewport.width == 105 && c.viewport.height == 99));
    }

    #[test]
    fn test_montage_clamps_start_to_volume() {
        let cells = montage_cells(Viewport::new(0, 0, 100, 100), &settings(2, 2, 3), 0, 9, 10);
        // 9 + 2 * 3 = 15 is too high, step down to 9
        assert_eq!(cells[0].slice_index, 9);
        let slices: Vec<usize> = cells.iter().map(|c| c.slice_index).collect();
        assert_eq!(slices, vec![9, 6, 3, 0]);
    }

    #[test]
    fn test_montage_skips_slices_below_zero() {
        let cells = montage_cells(Viewport::new(0, 0, 100, 100), &settings(2, 2, 5), 0, 0, 6);
        let slices: Vec<usize> = cells.iter().map(|c| c.slice_index).collect();
        assert_eq!(slices, vec![5, 0]);
        assert_eq!((cells[1].row, cells[1].column), (0, 1));
    }

    #[test]
    fn test_montage_tiny_viewport() {
        assert!(montage_cells(Viewport::new(0, 0, 4, 4), &settings(3, 3, 1), 3, 1, 10).is_empty());
    }

    #[test]
    fn test_montage_label() {
        assert_eq!(montage_label('Z', 20.0, 0), "Z=20mm");
        assert_eq!(montage_label('X', -3.26, 1), "X=-3.3mm");
    }

    #[test]
    fn test_all_view_quadrants() {
        let vps = all_view_viewports(Viewport::new(10, 20, 200, 100), 2);
        assert_eq!(vps.parasagittal, Viewport::new(10, 72, 98, 48));
        assert_eq!(vps.coronal, Viewport::new(112, 72, 98, 48));
        assert_eq!(vps.axial, Viewport::new(112, 20, 98, 48));
        assert_eq!(vps.three_dimensional, Viewport::new(10, 20, 98, 48));
    }
}
