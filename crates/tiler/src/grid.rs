use serde::Serialize;
use std::fmt;

/// A tile grid: `cols` tiles across, `rows` tiles down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct GridShape {
    pub cols: u32,
    pub rows: u32,
}

impl GridShape {
    pub const fn new(cols: u32, rows: u32) -> Self {
        Self { cols, rows }
    }

    pub fn tile_count(self) -> u32 {
        self.cols * self.rows
    }

    pub fn aspect_ratio(self) -> f64 {
        self.cols as f64 / self.rows as f64
    }

    /// Grid cell of the `index`-th tile in row-major order.
    pub fn cell(self, index: u32) -> (u32, u32) {
        (index % self.cols, index / self.cols)
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.cols, self.rows)
    }
}

/// Every grid with `min_tiles <= cols * rows <= max_tiles`, ordered by tile
/// count and then by column count.
pub fn candidate_grids(min_tiles: u32, max_tiles: u32) -> Vec<GridShape> {
    let mut grids: Vec<GridShape> = (1..=max_tiles)
        .flat_map(|cols| (1..=max_tiles / cols).map(move |rows| GridShape::new(cols, rows)))
        .filter(|g| g.tile_count() >= min_tiles)
        .collect();
    grids.sort_by_key(|g| (g.tile_count(), g.cols));
    grids
}

/// Pick the candidate whose aspect ratio is closest to `width / height`.
///
/// On an exact tie a later (denser) candidate replaces the current choice only
/// when the image area exceeds half the pixel area of that candidate's grid at
/// `edge` pixels per tile, so small images are not blown up into many tiles.
pub fn select_grid(width: u32, height: u32, edge: u32, candidates: &[GridShape]) -> GridShape {
    let aspect = width as f64 / height as f64;
    let area = width as f64 * height as f64;
    let tile_area = edge as f64 * edge as f64;

    let mut best = GridShape::new(1, 1);
    let mut best_diff = f64::INFINITY;
    for &grid in candidates {
        let diff = (aspect - grid.aspect_ratio()).abs();
        if diff < best_diff {
            best_diff = diff;
            best = grid;
        } else if diff == best_diff && area > 0.5 * tile_area * grid.tile_count() as f64 {
            best = grid;
        }
    }
    best
}
