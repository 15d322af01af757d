//! Watermark module for stamping a tiled logo onto page images.
//!
//! The logo (usually SVG) is scaled relative to the page's shorter side,
//! rotated, faded and repeated on a fixed pitch starting at the page's
//! top-left corner. Watermarking never fails a page: if the logo cannot be
//! loaded or any compositing step fails, the page is returned unchanged.
//!
//! # Configuration Example
//!
//! ```yaml
//! watermark:
//!   logo: ./logo.svg
//!   opacity: 0.65
//!   angle: 0
//!   scale_fraction: 0.25
//!   spacing: [320, 380]
//!   tile_origin: raw          # or margin-centered
//!   center_emphasis: false
//!   center_scale: 0.35
//! ```

pub mod compositor;
pub mod config;
pub mod error;
pub mod logo;
pub mod position;
pub mod transform;

// Re-export main types for convenience
pub use compositor::{
    blend_pixels, composite, flatten_over, paste_over, prepare_stamp, render_overlay, Compositor,
    WatermarkPlan,
};
pub use config::{TileOriginMode, TileSpacing, WatermarkConfig};
pub use error::WatermarkError;
pub use logo::{LogoBitmap, LogoResource};
pub use position::{
    centered_position, is_visible, target_width, tile_count, tile_positions, ImageDimensions,
    PlacementPosition, WatermarkDimensions,
};
pub use transform::{apply_opacity, resize_lanczos, rotate_expand, rotated_extent};
