use crate::export::{table_rows, write_table, TableFormat, TableLabel};
use crate::histogram::{compute_histogram, total_count, HistogramBin};
use crate::raster::{ParquetBandSource, RasterInfo, RasterSource};
use crate::render::{render_histogram, PlotStyle};
use crate::scan::{collect_samples, ScanOptions};
use raster_hist_common::{Config, RasterHistError, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub const DEFAULT_BINS: usize = 10;
pub const MIN_BINS: usize = 2;

/// Inputs of one histogram run.
#[derive(Debug, Clone)]
pub struct HistogramParams {
    pub input: PathBuf,
    pub band: Option<String>,
    pub bins: usize,
    pub nodata: Option<f64>,
    pub batch_size: usize,
    pub table: Option<PathBuf>,
    pub table_format: TableFormat,
    pub table_label: TableLabel,
    pub plot: Option<PathBuf>,   // HTML wrapper; the image lands beside it
    pub plot_style: PlotStyle,
}

impl HistogramParams {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            band: None,
            bins: DEFAULT_BINS,
            nodata: None,
            batch_size: 65536,
            table: None,
            table_format: TableFormat::default(),
            table_label: TableLabel::default(),
            plot: None,
            plot_style: PlotStyle::default(),
        }
    }

    pub fn from_config(input: impl Into<PathBuf>, config: &Config) -> Result<Self> {
        Ok(Self {
            band: config.raster.band.clone(),
            bins: config.histogram.bins,
            nodata: config.raster.nodata,
            batch_size: config.raster.batch_size,
            table_format: config.export.format.parse()?,
            table_label: config.histogram.table_label.parse()?,
            plot_style: PlotStyle::from_config(&config.plot)?,
            ..Self::new(input)
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistogramReport {
    pub raster: RasterInfo,
    pub total_cells: u64,
    pub nodata_cells: u64,
    pub sample_count: u64,
    pub min: f64,
    pub max: f64,
    pub bin_width: f64,
    pub bins: Vec<HistogramBin>,
    pub table_path: Option<PathBuf>,
    pub plot_path: Option<PathBuf>,
}

/// Opens the Parquet band named by `params` and runs the histogram over it.
pub fn run_histogram(params: &HistogramParams, cancel: Option<Arc<AtomicBool>>) -> Result<HistogramReport> {
    let mut source =
        ParquetBandSource::open(&params.input, params.band.as_deref(), params.batch_size)?;
    histogram_from_source(&mut source, params, cancel)
}

pub fn histogram_from_source(
    source: &mut dyn RasterSource,
    params: &HistogramParams,
    cancel: Option<Arc<AtomicBool>>,
) -> Result<HistogramReport> {
    if params.bins == 0 {
        return Err(RasterHistError::invalid("bin count must be at least 1"));
    }
    let opts = ScanOptions {
        nodata: params.nodata,
        cancel,
    };
    let samples = collect_samples(source, &opts)?;
    let bins = compute_histogram(&samples.values, params.bins)?;
    debug_assert_eq!(total_count(&bins), samples.values.len() as u64);

    let table_path = match &params.table {
        Some(path) => {
            let rows = table_rows(&bins, params.table_label);
            write_table(path, &rows, params.table_format)?;
            log::info!("wrote {} rows to {}", rows.len(), path.display());
            Some(path.clone())
        }
        None => None,
    };
    let plot_path = match &params.plot {
        Some(path) => {
            let image = render_histogram(path, &bins, &params.plot_style)?;
            log::info!("wrote plot {} ({})", path.display(), image.display());
            Some(path.clone())
        }
        None => None,
    };

    // non-empty here, compute_histogram rejects empty input
    let (min, max) = match (samples.min(), samples.max()) {
        (Some(lo), Some(hi)) => (lo, hi),
        _ => return Err(RasterHistError::EmptyInput),
    };
    Ok(HistogramReport {
        raster: source.info().clone(),
        total_cells: samples.total_cells,
        nodata_cells: samples.nodata_cells,
        sample_count: samples.values.len() as u64,
        min,
        max,
        bin_width: bins.first().map(|b| b.width()).unwrap_or_default(),
        bins,
        table_path,
        plot_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::GridRaster;

    #[test_log::test]
    fn grid_histogram_with_table_and_plot() {
        let dir = tempfile::tempdir().unwrap();
        let cells: Vec<f64> = (1..=10).map(f64::from).chain([-9999.0, -9999.0]).collect();
        let mut grid = GridRaster::new(4, 3, cells, Some(-9999.0)).unwrap();
        let params = HistogramParams {
            bins: 5,
            table: Some(dir.path().join("table.csv")),
            plot: Some(dir.path().join("plot.html")),
            ..HistogramParams::new("memory")
        };
        let report = histogram_from_source(&mut grid, &params, None).unwrap();
        assert_eq!(report.total_cells, 12);
        assert_eq!(report.nodata_cells, 2);
        assert_eq!(report.sample_count, 10);
        assert_eq!((report.min, report.max), (1.0, 10.0));
        assert_eq!(report.bins[0].lower, report.min);
        assert_eq!(report.bins[report.bins.len() - 1].upper, report.max);
        assert!(report.bins.iter().all(|b| b.count == 2));

        let table = std::fs::read_to_string(dir.path().join("table.csv")).unwrap();
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines[0], "CENTER_VALUE,NUM_ELEM");
        assert_eq!(lines.len(), report.bins.len() + 1);
        for (line, bin) in lines[1..].iter().zip(&report.bins) {
            assert_eq!(*line, format!("{},{}", bin.label(), bin.count));
        }
        assert!(dir.path().join("plot.png").exists());
        assert!(dir.path().join("plot.html").exists());
    }

    #[test]
    fn all_nodata_is_empty_input() {
        let mut grid = GridRaster::new(2, 1, vec![-1.0, -1.0], Some(-1.0)).unwrap();
        let res = histogram_from_source(&mut grid, &HistogramParams::new("memory"), None);
        assert!(matches!(res, Err(RasterHistError::EmptyInput)));
    }

    #[test]
    fn zero_bins_rejected_before_scan() {
        let mut grid = GridRaster::new(1, 1, vec![1.0], None).unwrap();
        let params = HistogramParams {
            bins: 0,
            ..HistogramParams::new("memory")
        };
        assert!(matches!(
            histogram_from_source(&mut grid, &params, None),
            Err(RasterHistError::InvalidArgument(_))
        ));
    }

    #[test]
    fn params_from_config() {
        let mut cfg = Config::default();
        cfg.histogram.bins = 32;
        cfg.histogram.table_label = "center".into();
        cfg.export.format = "json".into();
        cfg.plot.format = "svg".into();
        let params = HistogramParams::from_config("dem.parquet", &cfg).unwrap();
        assert_eq!(params.bins, 32);
        assert_eq!(params.table_label, TableLabel::Center);
        assert_eq!(params.table_format, TableFormat::Json);
        assert_eq!(params.plot_style.format, crate::render::PlotFormat::Svg);
        assert_eq!(params.input, PathBuf::from("dem.parquet"));
    }

    #[test]
    fn bad_config_values_surface() {
        let mut cfg = Config::default();
        cfg.plot.bar_color = "blue".into();
        assert!(HistogramParams::from_config("x", &cfg).is_err());
    }
}
