pub mod config;
pub use config::{Config, ExportConfig, HistogramConfig, PlotConfig, RasterConfig};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RasterHistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("no samples left after removing no-data cells")]
    EmptyInput,
    #[error("scan cancelled")]
    Cancelled,
    #[error("render error: {0}")]
    Render(String),
    #[error("{0}")]
    Other(String),
}

impl RasterHistError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, RasterHistError>;
