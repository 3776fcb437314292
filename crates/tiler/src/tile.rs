use image::imageops::FilterType;
use image::{DynamicImage, RgbImage};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::grid::{candidate_grids, select_grid, GridShape};
use crate::normalize::Normalizer;

#[derive(Debug, Error)]
pub enum TilingError {
    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Invalid tiling parameters: {0}")]
    InvalidParams(String),
    #[error("Grid {grid} should yield {expected} tiles, produced {actual}")]
    TileCountMismatch {
        grid: GridShape,
        expected: u32,
        actual: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilingParams {
    /// Edge length in pixels of every emitted tile.
    pub edge_length: u32,
    pub min_tiles: u32,
    pub max_tiles: u32,
    /// Append a whole-image tile when the grid has more than one tile.
    pub use_thumbnail: bool,
}

impl Default for TilingParams {
    fn default() -> Self {
        Self { edge_length: 448, min_tiles: 1, max_tiles: 12, use_thumbnail: true }
    }
}

/// Largest accepted tile edge in pixels.
pub const MAX_EDGE_LENGTH: u32 = 4096;
/// Largest accepted grid size.
pub const MAX_TILES: u32 = 64;

impl TilingParams {
    pub fn validate(&self) -> Result<(), TilingError> {
        if self.edge_length == 0 || self.edge_length > MAX_EDGE_LENGTH {
            return Err(TilingError::InvalidParams(format!(
                "edge_length must be between 1 and {MAX_EDGE_LENGTH}, got {}",
                self.edge_length
            )));
        }
        if self.max_tiles > MAX_TILES {
            return Err(TilingError::InvalidParams(format!(
                "max_tiles must be at most {MAX_TILES}, got {}",
                self.max_tiles
            )));
        }
        if self.min_tiles == 0 {
            return Err(TilingError::InvalidParams("min_tiles must be at least 1".into()));
        }
        if self.min_tiles > self.max_tiles {
            return Err(TilingError::InvalidParams(format!(
                "min_tiles ({}) exceeds max_tiles ({})",
                self.min_tiles, self.max_tiles
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TileKind {
    Grid { col: u32, row: u32 },
    Thumbnail,
}

/// One normalized square tile.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub kind: TileKind,
    pub edge: u32,
    /// CHW, `3 * edge * edge` values.
    pub data: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileSet {
    pub grid: GridShape,
    /// Grid tiles in row-major order, then the optional thumbnail.
    pub tiles: Vec<Tile>,
}

impl TileSet {
    pub fn grid_tile_count(&self) -> usize {
        self.tiles
            .iter()
            .filter(|t| matches!(t.kind, TileKind::Grid { .. }))
            .count()
    }

    pub fn has_thumbnail(&self) -> bool {
        self.tiles.last().is_some_and(|t| t.kind == TileKind::Thumbnail)
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// All tiles in one contiguous buffer with its `[n, 3, edge, edge]` shape.
    pub fn to_batch(&self) -> (Vec<f32>, [usize; 4]) {
        let edge = self.tiles.first().map_or(0, |t| t.edge as usize);
        let shape = [self.tiles.len(), 3, edge, edge];
        let mut data = Vec::with_capacity(shape.iter().product());
        for tile in &self.tiles {
            data.extend_from_slice(&tile.data);
        }
        (data, shape)
    }
}

/// Decode `bytes` and tile the result. An undecodable image is an error, never
/// an empty tile set.
pub fn tile_image_bytes(bytes: &[u8], params: &TilingParams) -> Result<TileSet, TilingError> {
    let img = image::load_from_memory(bytes)?;
    tile_image(&img, params)
}

/// Split `img` into an aspect-ratio-matched grid of normalized square tiles.
pub fn tile_image(img: &DynamicImage, params: &TilingParams) -> Result<TileSet, TilingError> {
    params.validate()?;
    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(TilingError::InvalidParams(format!("image is empty ({width}x{height})")));
    }

    let edge = params.edge_length;
    let candidates = candidate_grids(params.min_tiles, params.max_tiles);
    let grid = select_grid(width, height, edge, &candidates);
    tracing::debug!("Tiling {width}x{height} image as {grid} grid of {edge}px tiles");

    let (target_w, target_h) = edge
        .checked_mul(grid.cols)
        .zip(edge.checked_mul(grid.rows))
        .ok_or_else(|| {
            TilingError::InvalidParams(format!("{grid} grid of {edge}px tiles overflows"))
        })?;

    let rgb = img.to_rgb8();
    let resized = image::imageops::resize(&rgb, target_w, target_h, FilterType::CatmullRom);

    let normalizer = Normalizer::default();
    let mut tiles: Vec<Tile> = (0..grid.tile_count())
        .map(|i| {
            let (col, row) = grid.cell(i);
            let crop: RgbImage =
                image::imageops::crop_imm(&resized, col * edge, row * edge, edge, edge).to_image();
            Tile { kind: TileKind::Grid { col, row }, edge, data: normalizer.normalize(&crop) }
        })
        .collect();

    let produced = tiles.len() as u32;
    if produced != grid.tile_count() {
        return Err(TilingError::TileCountMismatch {
            grid,
            expected: grid.tile_count(),
            actual: produced,
        });
    }

    if params.use_thumbnail && produced > 1 {
        let thumb = image::imageops::resize(&rgb, edge, edge, FilterType::CatmullRom);
        tiles.push(Tile { kind: TileKind::Thumbnail, edge, data: normalizer.normalize(&thumb) });
    }

    Ok(TileSet { grid, tiles })
}
