pub mod algorithm;
pub mod export;
pub mod histogram;
pub mod raster;
pub mod render;
pub mod scan;

pub use algorithm::{
    histogram_from_source, run_histogram, HistogramParams, HistogramReport, DEFAULT_BINS, MIN_BINS,
};
pub use export::{
    export_report_json, print_summary, table_rows, write_table, write_table_csv, write_table_json,
    TableFormat, TableLabel, TableRow, TableValue,
};
pub use histogram::{compute_histogram, total_count, HistogramBin};
pub use raster::{GridRaster, ParquetBandSource, RasterInfo, RasterSource};
pub use raster_hist_common::{RasterHistError, Result};
pub use render::{parse_hex_color, render_histogram, write_html, PlotCanvas, PlotFormat, PlotStyle, Rgb};
pub use scan::{collect_samples, SampleSet, ScanOptions};
