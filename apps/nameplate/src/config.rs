use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::layout::font_metrics::DEFAULT_FONT_PATHS;
use crate::layout::{CanvasSpec, SizeRange};

/// Application configuration loaded from environment variables.
/// Every variable is optional; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Ordered font search list; the first loadable file wins.
    pub font_paths: Vec<PathBuf>,
    /// JSON file holding the persisted printer choice.
    pub settings_path: PathBuf,
    /// Directory where print jobs are dropped as PNG files.
    pub spool_dir: PathBuf,
    pub canvas: CanvasSpec,
    pub sizes: SizeRange,
    /// Largest `width * height` a request may ask for in a canvas override.
    pub max_canvas_pixels: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let font_paths = match get("NAMEPLATE_FONT_PATHS") {
            Some(list) => std::env::split_paths(&list).collect(),
            None => DEFAULT_FONT_PATHS.iter().map(PathBuf::from).collect(),
        };

        let defaults = CanvasSpec::default();
        let canvas = CanvasSpec {
            margin_x_ratio: parse_or(&get, "NAMEPLATE_MARGIN_X", defaults.margin_x_ratio)?,
            margin_y_ratio: parse_or(&get, "NAMEPLATE_MARGIN_Y", defaults.margin_y_ratio)?,
            fill_ratio: parse_or(&get, "NAMEPLATE_FILL_RATIO", defaults.fill_ratio)?,
            dpi: parse_or(&get, "NAMEPLATE_DPI", defaults.dpi)?,
            ..CanvasSpec::new(
                parse_or(&get, "NAMEPLATE_CANVAS_WIDTH", defaults.width)?,
                parse_or(&get, "NAMEPLATE_CANVAS_HEIGHT", defaults.height)?,
            )
        };
        canvas.validate().context("Invalid canvas configuration")?;

        let max_canvas_pixels = parse_or(&get, "NAMEPLATE_MAX_CANVAS_PIXELS", DEFAULT_MAX_CANVAS_PIXELS)?;
        if canvas.pixel_count() > max_canvas_pixels {
            anyhow::bail!(
                "Configured canvas {}x{} exceeds NAMEPLATE_MAX_CANVAS_PIXELS ({max_canvas_pixels})",
                canvas.width,
                canvas.height
            );
        }

        let default_sizes = SizeRange::default();
        let sizes = SizeRange {
            min: parse_or(&get, "NAMEPLATE_MIN_FONT_SIZE", default_sizes.min)?,
            max: parse_or(&get, "NAMEPLATE_MAX_FONT_SIZE", default_sizes.max)?,
            step: parse_or(&get, "NAMEPLATE_FONT_SIZE_STEP", default_sizes.step)?,
        };
        sizes.validate().context("Invalid font size configuration")?;

        Ok(Config {
            port: parse_or(&get, "PORT", 8080)?,
            rust_log: get("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            font_paths,
            settings_path: get("NAMEPLATE_SETTINGS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("printer_settings.json")),
            spool_dir: get("NAMEPLATE_SPOOL_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join("nameplate-spool")),
            canvas,
            sizes,
            max_canvas_pixels,
        })
    }
}

/// Four A4 pages at 300 DPI.
pub const DEFAULT_MAX_CANVAS_PIXELS: u64 = 4 * 3508 * 2480;

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_environment() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.canvas, CanvasSpec::default());
        assert_eq!(config.sizes, SizeRange::default());
        assert_eq!(config.font_paths.len(), DEFAULT_FONT_PATHS.len());
        assert_eq!(config.settings_path, PathBuf::from("printer_settings.json"));
        assert_eq!(config.max_canvas_pixels, DEFAULT_MAX_CANVAS_PIXELS);
    }

    #[test]
    fn test_dpi_override() {
        let config = config_from(&[("NAMEPLATE_DPI", "600")]).unwrap();
        assert_eq!(config.canvas.dpi, 600);
    }

    #[test]
    fn test_canvas_above_pixel_cap_fails() {
        let err = config_from(&[("NAMEPLATE_MAX_CANVAS_PIXELS", "1000")]).unwrap_err();
        assert!(err.to_string().contains("NAMEPLATE_MAX_CANVAS_PIXELS"));
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("NAMEPLATE_CANVAS_WIDTH", "1754"),
            ("NAMEPLATE_CANVAS_HEIGHT", "1240"),
            ("NAMEPLATE_FILL_RATIO", "0.8"),
            ("NAMEPLATE_FONT_SIZE_STEP", "5"),
        ])
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!((config.canvas.width, config.canvas.height), (1754, 1240));
        assert!((config.canvas.fill_ratio - 0.8).abs() < 1e-6);
        assert_eq!(config.sizes.step, 5);
    }

    #[test]
    fn test_blank_value_uses_default() {
        let config = config_from(&[("PORT", "  ")]).unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_malformed_port_fails() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_invalid_canvas_fails_fast() {
        assert!(config_from(&[("NAMEPLATE_CANVAS_WIDTH", "0")]).is_err());
        assert!(config_from(&[("NAMEPLATE_MARGIN_X", "0.5")]).is_err());
    }

    #[test]
    fn test_font_paths_override() {
        let list = std::env::join_paths(["/a/one.ttf", "/b/two.ttf"]).unwrap();
        let list = list.to_string_lossy().into_owned();
        let config = config_from(&[("NAMEPLATE_FONT_PATHS", list.as_str())]).unwrap();
        assert_eq!(
            config.font_paths,
            vec![PathBuf::from("/a/one.ttf"), PathBuf::from("/b/two.ttf")]
        );
    }
}
