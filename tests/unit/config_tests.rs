// Configuration loading tests
// Exercises the shipped example file and CLI-style overrides

use pagemark::config::*;
use pagemark::encoder::OutputFormat;
use pagemark::pipeline::FailurePolicy;
use pagemark::watermark::{TileOriginMode, TileSpacing, WatermarkConfig};
use rstest::rstest;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn example_config_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("config.example.yaml")
}

fn write_config(yaml: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_example_config_matches_defaults() {
    let config = Config::from_file(example_config_path()).expect("example config loads");
    assert!(config.validate().is_ok());

    assert_eq!(config.render.dpi, 200);
    assert_eq!(config.render.format, OutputFormat::Png);
    assert!(config.render.pdfium_library_path.is_none());
    assert_eq!(config.watermark.config, WatermarkConfig::default());
    assert_eq!(config.pipeline.on_page_error, FailurePolicy::Abort);
}

#[test]
fn test_example_config_loads_without_env_vars() {
    std::env::remove_var("VAR_NAME");
    std::env::remove_var("PDFIUM_LIB_DIR");

    let yaml = std::fs::read_to_string(example_config_path()).unwrap();
    assert!(yaml.contains("${PDFIUM_LIB_DIR}"));

    let config = Config::from_yaml_with_env(&yaml).expect("commented placeholders are ignored");
    assert!(config.render.pdfium_library_path.is_none());
}

#[rstest]
#[case("raw", TileOriginMode::Raw)]
#[case("margin-centered", TileOriginMode::MarginCentered)]
fn test_tile_origin_values(#[case] value: &str, #[case] expected: TileOriginMode) {
    let file = write_config(&format!("watermark:\n  tile_origin: {}\n", value));
    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.watermark.config.tile_origin, expected);
}

#[rstest]
#[case("watermark:\n  opacity: -0.1\n")]
#[case("watermark:\n  scale_fraction: 0\n")]
#[case("watermark:\n  spacing: [0, 380]\n")]
#[case("render:\n  dpi: 5000\n")]
fn test_invalid_values_fail_validation(#[case] yaml: &str) {
    let config = Config::from_yaml_with_env(yaml).unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_malformed_yaml_is_error() {
    assert!(Config::from_yaml_with_env("render: [unclosed").is_err());
    assert!(Config::from_yaml_with_env("watermark:\n  spacing: 320\n").is_err());
}

#[test]
fn test_env_substitution_in_file() {
    std::env::set_var("PAGEMARK_CONFIG_TEST_DPI", "300");
    let file = write_config("render:\n  dpi: ${PAGEMARK_CONFIG_TEST_DPI}\n");
    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.render.dpi, 300);
}

#[test]
fn test_pipeline_options_carry_watermark_settings() {
    let file = write_config(
        r#"
watermark:
  logo: /srv/brand/logo.svg
  opacity: 0.3
  spacing: [200, 250]
render:
  format: jpg
"#,
    );
    let config = Config::from_file(file.path()).unwrap();
    let options = config.pipeline_options();

    assert_eq!(options.format, OutputFormat::Jpeg);
    assert_eq!(options.watermark.opacity, 0.3);
    assert_eq!(options.watermark.spacing, TileSpacing::new(200, 250));
    assert_eq!(
        options.logo,
        pagemark::watermark::LogoResource::path("/srv/brand/logo.svg")
    );
}
