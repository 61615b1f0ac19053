use crate::algorithm::HistogramReport;
use crate::histogram::HistogramBin;
use raster_hist_common::{RasterHistError, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

pub const LABEL_FIELD: &str = "CENTER_VALUE";
pub const COUNT_FIELD: &str = "NUM_ELEM";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableLabel {
    /// `"{lower}-{upper}"` text
    #[default]
    Range,
    /// numeric bin center
    Center,
}

impl FromStr for TableLabel {
    type Err = RasterHistError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "range" => Ok(Self::Range),
            "center" | "centre" => Ok(Self::Center),
            other => Err(RasterHistError::invalid(format!(
                "unknown table label '{other}' (use range or center)"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    #[default]
    Csv,
    Json,
}

impl TableFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl FromStr for TableFormat {
    type Err = RasterHistError;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(RasterHistError::invalid(format!(
                "unknown table format '{other}' (use csv or json)"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TableValue {
    Text(String),
    Number(f64),
}

impl std::fmt::Display for TableValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(rename = "CENTER_VALUE")]
    pub label: TableValue,
    #[serde(rename = "NUM_ELEM")]
    pub count: u64,
}

pub fn table_rows(bins: &[HistogramBin], label: TableLabel) -> Vec<TableRow> {
    bins.iter()
        .map(|b| TableRow {
            label: match label {
                TableLabel::Range => TableValue::Text(b.label()),
                TableLabel::Center => TableValue::Number(b.center()),
            },
            count: b.count,
        })
        .collect()
}

fn csv_escape(raw: &str) -> String {
    // wrap in quotes if contains comma, quote, or newline
    if raw.contains(',') || raw.contains('"') || raw.contains('\n') {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

pub fn write_table_csv(output_path: &Path, rows: &[TableRow]) -> Result<()> {
    let mut file = std::io::BufWriter::new(std::fs::File::create(output_path)?);
    writeln!(file, "{LABEL_FIELD},{COUNT_FIELD}")?;
    for row in rows {
        writeln!(file, "{},{}", csv_escape(&row.label.to_string()), row.count)?;
    }
    file.flush()?;
    Ok(())
}

pub fn write_table_json(output_path: &Path, rows: &[TableRow]) -> Result<()> {
    let file = std::fs::File::create(output_path)?;
    serde_json::to_writer_pretty(file, rows).map_err(|e| RasterHistError::Other(e.to_string()))?;
    Ok(())
}

pub fn write_table(output_path: &Path, rows: &[TableRow], format: TableFormat) -> Result<()> {
    match format {
        TableFormat::Csv => write_table_csv(output_path, rows),
        TableFormat::Json => write_table_json(output_path, rows),
    }
}

pub fn export_report_json(output_path: &Path, report: &HistogramReport) -> Result<()> {
    let file = std::fs::File::create(output_path)?;
    serde_json::to_writer_pretty(file, report).map_err(|e| RasterHistError::Other(e.to_string()))?;
    Ok(())
}

// headless summary output

pub fn print_summary(report: &HistogramReport) {
    println!("{:<16} {}", "Raster:", report.raster.name);
    println!("{:<16} {}", "Band:", report.raster.band);
    if let (Some(c), Some(r)) = (report.raster.columns, report.raster.rows) {
        println!("{:<16} {c} x {r}", "Size:");
    }
    println!("{:<16} {}", "Cells:", report.total_cells);
    println!("{:<16} {}", "No-data:", report.nodata_cells);
    println!("{:<16} {}", "Samples:", report.sample_count);
    println!("{:<16} {}", "Min:", report.min);
    println!("{:<16} {}", "Max:", report.max);
    println!("{:<16} {} x {}", "Bins:", report.bins.len(), report.bin_width);
    if let Some(p) = &report.table_path {
        println!("{:<16} {}", "Table:", p.display());
    }
    if let Some(p) = &report.plot_path {
        println!("{:<16} {}", "Plot:", p.display());
    }
}
