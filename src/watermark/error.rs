//! Watermark error types.
//!
//! These errors never leave the compositor: every failure degrades to
//! returning the page unchanged. They exist so the cause can be logged.

use std::fmt;

/// Errors that can occur while preparing or applying a watermark.
#[derive(Debug)]
pub enum WatermarkError {
    /// Logo resource could not be read
    ResourceError(String),

    /// Logo data could not be decoded or rasterized
    DecodeError(String),

    /// Resampling the logo failed
    ResizeError(String),

    /// Rotating the logo failed
    RotateError(String),

    /// Invalid configuration
    ConfigError(String),

    /// Failed to composite watermark onto the page
    CompositeError(String),
}

impl fmt::Display for WatermarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceError(msg) => write!(f, "Failed to load watermark logo: {}", msg),
            Self::DecodeError(msg) => write!(f, "Failed to rasterize watermark logo: {}", msg),
            Self::ResizeError(msg) => write!(f, "Failed to resize watermark: {}", msg),
            Self::RotateError(msg) => write!(f, "Failed to rotate watermark: {}", msg),
            Self::ConfigError(msg) => write!(f, "Watermark configuration error: {}", msg),
            Self::CompositeError(msg) => write!(f, "Failed to composite watermark: {}", msg),
        }
    }
}

impl std::error::Error for WatermarkError {}
