use crate::histogram::HistogramBin;
use plotters::coord::Shift;
use plotters::prelude::*;
use raster_hist_common::{PlotConfig, RasterHistError, Result};
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlotFormat {
    #[default]
    Png,
    Svg,
}

impl PlotFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Svg => "svg",
        }
    }
}

impl FromStr for PlotFormat {
    type Err = RasterHistError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "svg" => Ok(Self::Svg),
            other => Err(RasterHistError::invalid(format!(
                "unknown plot format '{other}' (use png or svg)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// parse `#rrggbb` (leading `#` optional)
pub fn parse_hex_color(s: &str) -> Result<Rgb> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return Err(RasterHistError::invalid(format!("bad colour '{s}'")));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map_err(|_| RasterHistError::invalid(format!("bad colour '{s}'")))
    };
    Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlotStyle {
    pub width: u32,
    pub height: u32,
    pub bar_color: Rgb,
    pub format: PlotFormat,
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            bar_color: Rgb(0x1f, 0x77, 0xb4),
            format: PlotFormat::Png,
        }
    }
}

impl PlotStyle {
    pub fn from_config(cfg: &PlotConfig) -> Result<Self> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(RasterHistError::invalid("plot size must be non-zero"));
        }
        Ok(Self {
            width: cfg.width,
            height: cfg.height,
            bar_color: parse_hex_color(&cfg.bar_color)?,
            format: cfg.format.parse()?,
        })
    }
}

/// x/y window covering every bar; a zero-width range gets a unit window
fn axis_window(bins: &[HistogramBin]) -> ((f64, f64), f64) {
    let lo = bins.first().map(|b| b.lower).unwrap_or(0.0);
    let hi = bins.last().map(|b| b.upper).unwrap_or(1.0);
    let x = if hi > lo { (lo, hi) } else { (lo - 0.5, hi + 0.5) };
    let top = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64 * 1.05;
    (x, top)
}

fn bar_span(bin: &HistogramBin) -> (f64, f64) {
    if bin.upper > bin.lower {
        (bin.lower, bin.upper)
    } else {
        (bin.lower - 0.25, bin.upper + 0.25)
    }
}

fn draw_bars<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    bins: &[HistogramBin],
    style: &PlotStyle,
) -> std::result::Result<(), DrawingAreaErrorKind<DB::ErrorType>> {
    root.fill(&WHITE)?;
    let ((x0, x1), top) = axis_window(bins);
    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .build_cartesian_2d(x0..x1, 0f64..top)?;
    let Rgb(r, g, b) = style.bar_color;
    chart.draw_series(bins.iter().map(|bin| {
        let (l, u) = bar_span(bin);
        Rectangle::new([(l, 0.0), (u, bin.count as f64)], RGBColor(r, g, b).filled())
    }))?;
    chart.draw_series(bins.iter().map(|bin| {
        let (l, u) = bar_span(bin);
        Rectangle::new([(l, 0.0), (u, bin.count as f64)], BLACK.stroke_width(1))
    }))?;
    let axes = chart.plotting_area();
    axes.draw(&PathElement::new(vec![(x0, 0.0), (x1, 0.0)], BLACK.stroke_width(1)))?;
    axes.draw(&PathElement::new(vec![(x0, 0.0), (x0, top)], BLACK.stroke_width(1)))?;
    Ok(())
}

/// Rendering context for a single histogram image. Created per call and
/// consumed by [`PlotCanvas::finish`].
pub struct PlotCanvas {
    path: PathBuf,
    style: PlotStyle,
}

impl PlotCanvas {
    pub fn new(path: impl Into<PathBuf>, style: PlotStyle) -> Self {
        Self {
            path: path.into(),
            style,
        }
    }

    pub fn finish(self, bins: &[HistogramBin]) -> Result<PathBuf> {
        let size = (self.style.width, self.style.height);
        match self.style.format {
            PlotFormat::Png => {
                let root = BitMapBackend::new(&self.path, size).into_drawing_area();
                draw_bars(&root, bins, &self.style).map_err(render_err)?;
                root.present().map_err(render_err)?;
            }
            PlotFormat::Svg => {
                let root = SVGBackend::new(&self.path, size).into_drawing_area();
                draw_bars(&root, bins, &self.style).map_err(render_err)?;
                root.present().map_err(render_err)?;
            }
        }
        log::debug!("rendered {} bars to {}", bins.len(), self.path.display());
        Ok(self.path)
    }
}

fn render_err(e: impl std::fmt::Display) -> RasterHistError {
    RasterHistError::Render(e.to_string())
}

fn html_attr_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn write_html(html_path: &Path, image_path: &Path) -> Result<()> {
    // same directory, so the file name alone resolves
    let src = image_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| image_path.display().to_string());
    let doc = format!("<html><img src=\"{}\"/></html>", html_attr_escape(&src));
    std::fs::write(html_path, doc)?;
    Ok(())
}

pub fn image_path_for(html_path: &Path, format: PlotFormat) -> PathBuf {
    html_path.with_extension(format.extension())
}

/// Draws the bar chart next to `html_path` and writes the HTML wrapper.
/// Returns the image path.
pub fn render_histogram(html_path: &Path, bins: &[HistogramBin], style: &PlotStyle) -> Result<PathBuf> {
    if bins.is_empty() {
        return Err(RasterHistError::invalid("nothing to plot"));
    }
    let image_path = image_path_for(html_path, style.format);
    if image_path == html_path {
        return Err(RasterHistError::invalid(format!(
            "plot path {} would be overwritten by its own image",
            html_path.display()
        )));
    }
    let image_path = PlotCanvas::new(image_path, style.clone()).finish(bins)?;
    write_html(html_path, &image_path)?;
    Ok(image_path)
}
