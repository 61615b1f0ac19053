use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramConfig {
    #[serde(default = "default_bins")]
    pub bins: usize,
    #[serde(default = "default_label")]
    pub table_label: String, // "range" or "center"
}

fn default_bins() -> usize {
    10
}
fn default_label() -> String {
    "range".into()
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            bins: default_bins(),
            table_label: default_label(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RasterConfig {
    #[serde(default)]
    pub band: Option<String>, // falls back to the first numeric column when None
    #[serde(default)]
    pub nodata: Option<f64>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_batch_size() -> usize {
    65536
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            band: None,
            nodata: None,
            batch_size: default_batch_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_bar_color")]
    pub bar_color: String,
    #[serde(default = "default_plot_format")]
    pub format: String, // "png" or "svg"
}

fn default_width() -> u32 {
    640
}
fn default_height() -> u32 {
    480
}
fn default_bar_color() -> String {
    "#1f77b4".into()
}
fn default_plot_format() -> String {
    "png".into()
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            bar_color: default_bar_color(),
            format: default_plot_format(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

fn default_format() -> String {
    "csv".into()
}
fn default_output_dir() -> String {
    ".".into()
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            format: default_format(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub histogram: HistogramConfig,
    #[serde(default)]
    pub raster: RasterConfig,
    #[serde(default)]
    pub plot: PlotConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    pub fn config_path() -> PathBuf {
        if let Ok(env_path) = std::env::var("RASTER_HIST_CONFIG") {
            return PathBuf::from(env_path); // $RASTER_HIST_CONFIG overrides default config path
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("raster-hist")
            .join("config.toml")
    }

    pub fn load() -> crate::Result<Self> {
        let path = Self::config_path();
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    pub fn load_from(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let cfg: Self =
            toml::from_str(&content).map_err(|e| crate::RasterHistError::Other(e.to_string()))?;
        Ok(cfg)
    }

    pub fn save(&self) -> crate::Result<PathBuf> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::RasterHistError::Other(e.to_string()))?;
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_histogram_parameters() {
        let cfg = Config::default();
        assert_eq!(cfg.histogram.bins, 10);
        assert_eq!(cfg.histogram.table_label, "range");
        assert_eq!(cfg.raster.batch_size, 65536);
        assert!(cfg.raster.band.is_none());
        assert_eq!(cfg.plot.format, "png");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let cfg: Config = toml::from_str("[histogram]\nbins = 25\n\n[raster]\nnodata = -9999.0\n").unwrap();
        assert_eq!(cfg.histogram.bins, 25);
        assert_eq!(cfg.histogram.table_label, "range");
        assert_eq!(cfg.raster.nodata, Some(-9999.0));
        assert_eq!(cfg.plot.width, 640);
        assert_eq!(cfg.export.format, "csv");
    }

    #[test]
    fn load_from_reads_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[plot]\nformat = \"svg\"\nwidth = 800\n").unwrap();
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.plot.format, "svg");
        assert_eq!(cfg.plot.width, 800);
        assert_eq!(cfg.plot.height, 480);
    }

    #[test]
    fn load_from_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[histogram\nbins = ").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(crate::RasterHistError::Other(_))
        ));
    }
}
