// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_DPI, DEFAULT_LOGO_PATH, MAX_DPI, MIN_DPI};
use crate::encoder::OutputFormat;
use crate::pipeline::{FailurePolicy, PipelineOptions};
use crate::watermark::{LogoResource, WatermarkConfig};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub watermark: WatermarkSettings,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

fn default_dpi() -> u32 {
    DEFAULT_DPI
}

fn default_logo_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOGO_PATH)
}

/// Page rasterization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Rasterization resolution (default: 200)
    #[serde(default = "default_dpi")]
    pub dpi: u32,

    /// Output image format (default: png)
    #[serde(default)]
    pub format: OutputFormat,

    /// Directory containing the PDFium shared library; the system library
    /// path is searched when unset or when binding from here fails
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdfium_library_path: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dpi: default_dpi(),
            format: OutputFormat::default(),
            pdfium_library_path: None,
        }
    }
}

/// Watermark logo plus compositing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatermarkSettings {
    /// Logo file, SVG or raster (default: logo.svg)
    #[serde(default = "default_logo_path")]
    pub logo: PathBuf,

    #[serde(flatten)]
    pub config: WatermarkConfig,
}

impl Default for WatermarkSettings {
    fn default() -> Self {
        Self {
            logo: default_logo_path(),
            config: WatermarkConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Per-page failure handling (default: abort)
    #[serde(default)]
    pub on_page_error: FailurePolicy,
}

impl Config {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        // Replace ${VAR_NAME} with environment variable values
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

        // First, check that all referenced environment variables exist.
        // Comments are left alone, so documented placeholders never fail a load.
        for line in yaml.lines() {
            let (content, _) = split_comment(line);
            for caps in re.captures_iter(content) {
                let var_name = &caps[1];
                std::env::var(var_name).map_err(|_| {
                    format!(
                        "Environment variable '{}' is referenced but not set",
                        var_name
                    )
                })?;
            }
        }

        let substituted = yaml
            .lines()
            .map(|line| {
                let (content, comment) = split_comment(line);
                let content = re.replace_all(content, |caps: &regex::Captures| {
                    std::env::var(&caps[1]).unwrap_or_default()
                });
                format!("{}{}", content, comment)
            })
            .collect::<Vec<_>>()
            .join("\n");

        if substituted.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let yaml = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_DPI..=MAX_DPI).contains(&self.render.dpi) {
            return Err(format!(
                "render.dpi must be between {} and {}, got {}",
                MIN_DPI, MAX_DPI, self.render.dpi
            ));
        }

        if self.watermark.logo.as_os_str().is_empty() {
            return Err("watermark.logo cannot be empty".to_string());
        }

        self.watermark
            .config
            .validate()
            .map_err(|e| format!("watermark: {}", e))?;

        Ok(())
    }

    /// Pipeline settings for one document
    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            dpi: self.render.dpi,
            format: self.render.format,
            failure_policy: self.pipeline.on_page_error,
            watermark: self.watermark.config,
            logo: LogoResource::Path(self.watermark.logo.clone()),
        }
    }
}

/// Split a YAML line into content and trailing comment.
///
/// A comment starts at a `#` that begins the line or follows whitespace.
fn split_comment(line: &str) -> (&str, &str) {
    let bytes = line.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'#' && (i == 0 || bytes[i - 1].is_ascii_whitespace()) {
            return line.split_at(i);
        }
    }
    (line, "")
}
