use crate::raster::RasterSource;
use raster_hist_common::{RasterHistError, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub nodata: Option<f64>, // overrides the source's own sentinel when set
    pub cancel: Option<Arc<AtomicBool>>,
}

/// Finite cell values of a band with no-data cells removed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleSet {
    pub values: Vec<f64>,
    pub total_cells: u64,
    pub nodata_cells: u64,
}

impl SampleSet {
    pub fn min(&self) -> Option<f64> {
        self.values.iter().cloned().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().cloned().reduce(f64::max)
    }
}

pub fn collect_samples(source: &mut dyn RasterSource, opts: &ScanOptions) -> Result<SampleSet> {
    let sentinel = opts.nodata.or(source.info().nodata);
    let expected = source.info().cell_count;
    let mut set = SampleSet::default();
    let mut blocks = 0u64;
    loop {
        if let Some(flag) = &opts.cancel {
            if flag.load(Ordering::Relaxed) {
                log::info!("scan cancelled after {} cells", set.total_cells);
                return Err(RasterHistError::Cancelled);
            }
        }
        let Some(block) = source.next_block()? else {
            break;
        };
        blocks += 1;
        set.total_cells += block.len() as u64;
        for v in block {
            // NaN never equals the sentinel, so a NaN sentinel still masks via is_finite
            if !v.is_finite() || sentinel == Some(v) {
                set.nodata_cells += 1;
            } else {
                set.values.push(v);
            }
        }
        match expected {
            Some(total) if total > 0 => log::debug!(
                "block {blocks}: {}/{total} cells ({:.1}%)",
                set.total_cells,
                set.total_cells as f64 / total as f64 * 100.0
            ),
            _ => log::debug!("block {blocks}: {} cells", set.total_cells),
        }
    }
    log::info!(
        "scanned {} cells of {} ({} no-data)",
        set.total_cells,
        source.info().band,
        set.nodata_cells
    );
    Ok(set)
}
