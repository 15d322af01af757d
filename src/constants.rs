// Constants module - centralized default values for configuration
//
// Defaults are resolved once when configuration is loaded and then passed
// explicitly; compositing code never reads these directly.

// =============================================================================
// Watermark defaults
// =============================================================================

/// Default watermark opacity (alpha multiplier)
pub const DEFAULT_WATERMARK_OPACITY: f32 = 0.65;

/// Default watermark rotation in degrees
pub const DEFAULT_WATERMARK_ANGLE: f32 = 0.0;

/// Default watermark width as a fraction of the page's shorter side
pub const DEFAULT_WATERMARK_SCALE: f32 = 0.25;

/// Default horizontal tile pitch in pixels
pub const DEFAULT_WATERMARK_STEP_X: u32 = 320;

/// Default vertical tile pitch in pixels
pub const DEFAULT_WATERMARK_STEP_Y: u32 = 380;

/// Rendered watermark width never drops below this many pixels
pub const MIN_WATERMARK_WIDTH: u32 = 32;

/// Default width fraction of the centered emphasis logo
pub const DEFAULT_CENTER_SCALE: f32 = 0.35;

/// Lower clamp for the centered emphasis logo width fraction
pub const MIN_CENTER_SCALE: f32 = 0.15;

/// Upper clamp for the centered emphasis logo width fraction
pub const MAX_CENTER_SCALE: f32 = 0.5;

/// Default logo file, relative to the working directory
pub const DEFAULT_LOGO_PATH: &str = "logo.svg";

// =============================================================================
// Render defaults
// =============================================================================

/// Default page rasterization resolution
pub const DEFAULT_DPI: u32 = 200;

/// Lowest accepted rasterization resolution
pub const MIN_DPI: u32 = 36;

/// Highest accepted rasterization resolution
pub const MAX_DPI: u32 = 1200;

/// PDF user space units per inch
pub const PDF_POINTS_PER_INCH: f32 = 72.0;

/// Default JPEG quality (1-100)
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Leading bytes of every PDF file
pub const PDF_MAGIC: &[u8] = b"%PDF-";
