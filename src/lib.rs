// Pagemark Library
// Watermarked PDF page rendering: rasterize, stamp a tiled logo, encode

pub mod config;
pub mod constants;
pub mod encoder;
pub mod error;
pub mod job;
pub mod logging;
pub mod pipeline;
pub mod render;
pub mod watermark;
