//! Adaptive tiling of document images for vision models.
//!
//! An image is resized onto the grid of square tiles whose shape best matches
//! its aspect ratio, cut row-major, and normalized with ImageNet statistics.

pub mod grid;
pub mod normalize;
pub mod tile;

pub use grid::{candidate_grids, select_grid, GridShape};
pub use normalize::{Normalizer, IMAGENET_MEAN, IMAGENET_STD};
pub use tile::{
    tile_image, tile_image_bytes, Tile, TileKind, TileSet, TilingError, TilingParams,
    MAX_EDGE_LENGTH, MAX_TILES,
};
