use arrow::array::{Array, Float64Array};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use parquet::arrow::ProjectionMask;
use raster_hist_common::{RasterHistError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const META_COLUMNS: &str = "raster:columns";
pub const META_ROWS: &str = "raster:rows";
pub const META_NODATA: &str = "raster:nodata";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterInfo {
    pub name: String,
    pub band: String,
    pub columns: Option<u64>,
    pub rows: Option<u64>,
    pub cell_count: Option<u64>,
    pub nodata: Option<f64>,
}

/// A lazily read raster band. Blocks hold cell values in row-major order;
/// null cells come back as NaN.
pub trait RasterSource {
    fn info(&self) -> &RasterInfo;
    fn next_block(&mut self) -> Result<Option<Vec<f64>>>;
}

/// In-memory raster band.
#[derive(Debug, Clone)]
pub struct GridRaster {
    info: RasterInfo,
    cells: Vec<f64>,
    block_size: usize,
    cursor: usize,
}

impl GridRaster {
    pub fn new(columns: usize, rows: usize, cells: Vec<f64>, nodata: Option<f64>) -> Result<Self> {
        let expected = columns
            .checked_mul(rows)
            .ok_or_else(|| RasterHistError::invalid("raster dimensions overflow"))?;
        if cells.len() != expected {
            return Err(RasterHistError::invalid(format!(
                "{columns}x{rows} raster needs {expected} cells, got {}",
                cells.len()
            )));
        }
        Ok(Self {
            info: RasterInfo {
                name: "memory".into(),
                band: "1".into(),
                columns: Some(columns as u64),
                rows: Some(rows as u64),
                cell_count: Some(expected as u64),
                nodata,
            },
            cells,
            block_size: columns.max(1), // one raster row per block
            cursor: 0,
        })
    }

    pub fn with_block_size(mut self, block_size: usize) -> Self {
        self.block_size = block_size.max(1);
        self
    }
}

impl RasterSource for GridRaster {
    fn info(&self) -> &RasterInfo {
        &self.info
    }

    fn next_block(&mut self) -> Result<Option<Vec<f64>>> {
        if self.cursor >= self.cells.len() {
            return Ok(None);
        }
        let end = (self.cursor + self.block_size).min(self.cells.len());
        let block = self.cells[self.cursor..end].to_vec();
        self.cursor = end;
        Ok(Some(block))
    }
}

/// A raster band stored as one numeric column of a Parquet table.
pub struct ParquetBandSource {
    info: RasterInfo,
    reader: ParquetRecordBatchReader,
}

fn is_numeric(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float16
            | DataType::Float32
            | DataType::Float64
    )
}

impl ParquetBandSource {
    pub fn open(path: &Path, band: Option<&str>, batch_size: usize) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let builder =
            ParquetRecordBatchReaderBuilder::try_new(file).map_err(RasterHistError::Parquet)?;
        let schema = builder.schema().clone();
        let index = match band {
            Some(name) => {
                let idx = schema
                    .fields()
                    .iter()
                    .position(|f| f.name() == name)
                    .ok_or_else(|| RasterHistError::invalid(format!("no band named '{name}'")))?;
                if !is_numeric(schema.field(idx).data_type()) {
                    return Err(RasterHistError::invalid(format!(
                        "band '{name}' has non-numeric type {}",
                        schema.field(idx).data_type()
                    )));
                }
                idx
            }
            None => schema
                .fields()
                .iter()
                .position(|f| is_numeric(f.data_type()))
                .ok_or_else(|| RasterHistError::invalid("no numeric band in raster"))?,
        };
        let band_name = schema.field(index).name().clone();

        let file_meta = builder.metadata().file_metadata();
        let cell_count = u64::try_from(file_meta.num_rows()).ok();
        let lookup = |key: &str| -> Option<String> {
            file_meta
                .key_value_metadata()?
                .iter()
                .find(|kv| kv.key == key)
                .and_then(|kv| kv.value.clone())
        };
        let parse_u64 = |key: &str| -> Result<Option<u64>> {
            lookup(key)
                .map(|s| {
                    s.trim()
                        .parse::<u64>()
                        .map_err(|_| RasterHistError::invalid(format!("bad {key} value '{s}'")))
                })
                .transpose()
        };
        let columns = parse_u64(META_COLUMNS)?;
        let rows = parse_u64(META_ROWS)?;
        let nodata = lookup(META_NODATA)
            .map(|s| {
                s.trim()
                    .parse::<f64>()
                    .map_err(|_| RasterHistError::invalid(format!("bad {META_NODATA} value '{s}'")))
            })
            .transpose()?;
        if let (Some(c), Some(r), Some(n)) = (columns, rows, cell_count) {
            if c.saturating_mul(r) != n {
                log::warn!("{}: {c}x{r} raster header disagrees with {n} stored cells", path.display());
            }
        }

        let mask = ProjectionMask::roots(builder.parquet_schema(), [index]);
        let reader = builder
            .with_projection(mask)
            .with_batch_size(batch_size.max(1))
            .build()
            .map_err(RasterHistError::Parquet)?;
        log::debug!("opened {} band '{band_name}' ({cell_count:?} cells)", path.display());
        Ok(Self {
            info: RasterInfo {
                name: path.display().to_string(),
                band: band_name,
                columns,
                rows,
                cell_count,
                nodata,
            },
            reader,
        })
    }
}

impl RasterSource for ParquetBandSource {
    fn info(&self) -> &RasterInfo {
        &self.info
    }

    fn next_block(&mut self) -> Result<Option<Vec<f64>>> {
        let Some(batch) = self.reader.next() else {
            return Ok(None);
        };
        let batch = batch.map_err(RasterHistError::Arrow)?;
        let column = batch.column(0);
        let cast = arrow::compute::cast(column.as_ref(), &DataType::Float64)?;
        let values = cast
            .as_any()
            .downcast_ref::<Float64Array>()
            .ok_or_else(|| RasterHistError::Other("band did not cast to Float64".into()))?;
        let block = (0..values.len())
            .map(|i| if values.is_null(i) { f64::NAN } else { values.value(i) })
            .collect();
        Ok(Some(block))
    }
}
