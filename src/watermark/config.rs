//! Watermark configuration types.
//!
//! A `WatermarkConfig` is resolved once per job (from the YAML config and
//! CLI overrides) and passed explicitly into the compositor. Nothing inside
//! the compositing code reads defaults ambiently.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CENTER_SCALE, DEFAULT_WATERMARK_ANGLE, DEFAULT_WATERMARK_OPACITY,
    DEFAULT_WATERMARK_SCALE, DEFAULT_WATERMARK_STEP_X, DEFAULT_WATERMARK_STEP_Y,
    MAX_CENTER_SCALE, MIN_CENTER_SCALE,
};

fn default_opacity() -> f32 {
    DEFAULT_WATERMARK_OPACITY
}

fn default_angle() -> f32 {
    DEFAULT_WATERMARK_ANGLE
}

fn default_scale_fraction() -> f32 {
    DEFAULT_WATERMARK_SCALE
}

fn default_center_scale() -> f32 {
    DEFAULT_CENTER_SCALE
}

/// Where the tile grid starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TileOriginMode {
    /// First tile at the page's top-left corner (0, 0)
    #[default]
    Raw,
    /// Grid shifted by half a step up and left, extending half a step past
    /// the right and bottom edges
    MarginCentered,
}

impl TileOriginMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::MarginCentered => "margin-centered",
        }
    }
}

/// Tile pitch in pixels.
///
/// Serialized as a two-element sequence `[step_x, step_y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(u32, u32)", into = "(u32, u32)")]
pub struct TileSpacing {
    pub step_x: u32,
    pub step_y: u32,
}

impl TileSpacing {
    pub fn new(step_x: u32, step_y: u32) -> Self {
        Self { step_x, step_y }
    }
}

impl Default for TileSpacing {
    fn default() -> Self {
        Self::new(DEFAULT_WATERMARK_STEP_X, DEFAULT_WATERMARK_STEP_Y)
    }
}

impl From<(u32, u32)> for TileSpacing {
    fn from((step_x, step_y): (u32, u32)) -> Self {
        Self::new(step_x, step_y)
    }
}

impl From<TileSpacing> for (u32, u32) {
    fn from(spacing: TileSpacing) -> Self {
        (spacing.step_x, spacing.step_y)
    }
}

/// Parameters of the tiled logo watermark.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WatermarkConfig {
    /// Alpha multiplier from 0.0 (invisible) to 1.0 (logo alpha untouched) (default: 0.65)
    #[serde(default = "default_opacity")]
    pub opacity: f32,

    /// Counter-clockwise rotation in degrees, applied before tiling (default: 0)
    #[serde(default = "default_angle")]
    pub angle: f32,

    /// Watermark width as a fraction of the page's shorter side (default: 0.25)
    #[serde(default = "default_scale_fraction")]
    pub scale_fraction: f32,

    /// Tile pitch in pixels (default: [320, 380])
    #[serde(default)]
    pub spacing: TileSpacing,

    /// Tile grid origin (default: raw)
    #[serde(default)]
    pub tile_origin: TileOriginMode,

    /// Paste one larger logo centered on the page after tiling (default: false)
    #[serde(default)]
    pub center_emphasis: bool,

    /// Width fraction of the centered logo, clamped to [0.15, 0.5] (default: 0.35)
    #[serde(default = "default_center_scale")]
    pub center_scale: f32,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            opacity: default_opacity(),
            angle: default_angle(),
            scale_fraction: default_scale_fraction(),
            spacing: TileSpacing::default(),
            tile_origin: TileOriginMode::default(),
            center_emphasis: false,
            center_scale: default_center_scale(),
        }
    }
}

impl WatermarkConfig {
    /// Centered logo width fraction after clamping.
    pub fn effective_center_scale(&self) -> f32 {
        self.center_scale.clamp(MIN_CENTER_SCALE, MAX_CENTER_SCALE)
    }

    /// Validate the watermark configuration.
    pub fn validate(&self) -> Result<(), String> {
        // Check for NaN/Infinity and valid range
        if !self.opacity.is_finite() || !(0.0..=1.0).contains(&self.opacity) {
            return Err(format!(
                "Watermark opacity must be a finite value between 0.0 and 1.0, got {}",
                self.opacity
            ));
        }

        if !self.angle.is_finite() {
            return Err(format!(
                "Watermark angle must be a finite number of degrees, got {}",
                self.angle
            ));
        }

        if !self.scale_fraction.is_finite()
            || self.scale_fraction <= 0.0
            || self.scale_fraction > 1.0
        {
            return Err(format!(
                "Watermark scale_fraction must be in (0.0, 1.0], got {}",
                self.scale_fraction
            ));
        }

        if self.spacing.step_x == 0 || self.spacing.step_y == 0 {
            return Err(format!(
                "Watermark spacing must be positive in both axes, got [{}, {}]",
                self.spacing.step_x, self.spacing.step_y
            ));
        }

        if !self.center_scale.is_finite() {
            return Err(format!(
                "Watermark center_scale must be finite, got {}",
                self.center_scale
            ));
        }

        Ok(())
    }
}
