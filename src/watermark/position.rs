//! Geometry for watermark placement.
//!
//! Sizing and tile-grid math, kept free of pixel data so it can be tested
//! exactly.
//!
//! # Example
//!
//! ```
//! use pagemark::watermark::position::{tile_positions, ImageDimensions};
//! use pagemark::watermark::{TileOriginMode, TileSpacing};
//!
//! let page = ImageDimensions { width: 1000, height: 1400 };
//! let tiles = tile_positions(&page, TileSpacing::new(320, 380), TileOriginMode::Raw);
//! assert_eq!(tiles.len(), 16); // 4 columns x 4 rows
//! ```

use super::{TileOriginMode, TileSpacing};
use crate::constants::MIN_WATERMARK_WIDTH;

/// Dimensions of the target page image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

impl ImageDimensions {
    pub fn shorter_side(&self) -> u32 {
        self.width.min(self.height)
    }
}

/// Dimensions of a prepared watermark bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkDimensions {
    pub width: u32,
    pub height: u32,
}

/// A single position where a watermark is pasted (top-left corner).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Width in pixels the logo is scaled to before rotation.
///
/// `max(32, floor(shorter_side * fraction))`.
pub fn target_width(image: &ImageDimensions, fraction: f32) -> u32 {
    // f32 on purpose: widening 0.35f32 to f64 would floor 1000 * 0.35 to 349
    let scaled = (image.shorter_side() as f32 * fraction).floor();
    let scaled = if scaled.is_finite() && scaled > 0.0 {
        scaled.min(u32::MAX as f32) as u32
    } else {
        0
    };
    scaled.max(MIN_WATERMARK_WIDTH)
}

/// Height that keeps the logo's aspect ratio at `target_width`.
pub fn scaled_height(natural: &WatermarkDimensions, target_width: u32) -> u32 {
    let scale = target_width as f64 / natural.width.max(1) as f64;
    ((natural.height as f64 * scale).floor() as u32).max(1)
}

/// Calculate paste positions for the tiled watermark grid.
///
/// Raw mode visits `x = 0, sx, 2sx, ...` while `x < width` (same for y), so
/// the grid has `ceil(W / sx) * ceil(H / sy)` cells. Margin-centered mode
/// starts at `-(sx / 2)` and runs while `x < width + sx / 2`.
///
/// Positions are ordered row by row, top to bottom.
pub fn tile_positions(
    image: &ImageDimensions,
    spacing: TileSpacing,
    origin: TileOriginMode,
) -> Vec<PlacementPosition> {
    if spacing.step_x == 0 || spacing.step_y == 0 {
        return Vec::new();
    }

    let step_x = spacing.step_x as i64;
    let step_y = spacing.step_y as i64;
    let (start_x, end_x, start_y, end_y) = match origin {
        TileOriginMode::Raw => (0, image.width as i64, 0, image.height as i64),
        TileOriginMode::MarginCentered => {
            let margin_x = step_x / 2;
            let margin_y = step_y / 2;
            (
                -margin_x,
                image.width as i64 + margin_x,
                -margin_y,
                image.height as i64 + margin_y,
            )
        }
    };

    let mut positions = Vec::new();
    let mut y = start_y;
    while y < end_y {
        let mut x = start_x;
        while x < end_x {
            positions.push(PlacementPosition::new(x as i32, y as i32));
            x += step_x;
        }
        y += step_y;
    }

    positions
}

/// Number of tiles `tile_positions` produces, without allocating.
pub fn tile_count(image: &ImageDimensions, spacing: TileSpacing, origin: TileOriginMode) -> usize {
    if spacing.step_x == 0 || spacing.step_y == 0 {
        return 0;
    }
    let count = |extent: u32, step: u32| -> usize {
        match origin {
            TileOriginMode::Raw => extent.div_ceil(step) as usize,
            TileOriginMode::MarginCentered => {
                let margin = (step / 2) as u64;
                let span = extent as u64 + 2 * margin;
                span.div_ceil(step as u64) as usize
            }
        }
    };
    count(image.width, spacing.step_x) * count(image.height, spacing.step_y)
}

/// Position that centers a watermark on the page.
///
/// Uses floor division, so a watermark larger than the page overhangs
/// equally (rounded toward the top-left).
pub fn centered_position(
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
) -> PlacementPosition {
    let dx = image.width as i64 - watermark.width as i64;
    let dy = image.height as i64 - watermark.height as i64;
    PlacementPosition::new(dx.div_euclid(2) as i32, dy.div_euclid(2) as i32)
}

/// Check if a watermark at `pos` is at least partially visible.
pub fn is_visible(
    pos: &PlacementPosition,
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
) -> bool {
    let wm_right = pos.x as i64 + watermark.width as i64;
    let wm_bottom = pos.y as i64 + watermark.height as i64;

    (pos.x as i64) < image.width as i64
        && (pos.y as i64) < image.height as i64
        && wm_right > 0
        && wm_bottom > 0
}
