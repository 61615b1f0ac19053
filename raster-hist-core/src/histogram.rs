use raster_hist_common::{RasterHistError, Result};
use serde::{Deserialize, Serialize};

/// One equal-width interval of a histogram. Every bin is half-open
/// `[lower, upper)` except the last, which is closed so it holds the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    pub fn label(&self) -> String {
        format!("{}-{}", self.lower, self.upper)
    }
}

/// Bins `samples` into `bin_count` equal-width intervals spanning `[min, max]`.
///
/// Empty input fails with `EmptyInput`. When every sample has the same value
/// the result is a single zero-width bin `[v, v]` holding all of them,
/// whatever `bin_count` is.
pub fn compute_histogram(samples: &[f64], bin_count: usize) -> Result<Vec<HistogramBin>> {
    if bin_count == 0 {
        return Err(RasterHistError::invalid("bin count must be at least 1"));
    }
    if let Some(bad) = samples.iter().find(|v| !v.is_finite()) {
        return Err(RasterHistError::invalid(format!(
            "sample {bad} is not finite"
        )));
    }
    if samples.is_empty() {
        return Err(RasterHistError::EmptyInput);
    }
    let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return Ok(vec![HistogramBin {
            lower: min,
            upper: max,
            count: samples.len() as u64,
        }]);
    }

    let edges = bin_edges(min, max, bin_count);
    let mut counts = vec![0u64; bin_count];
    for &v in samples {
        // last edge <= v among the k lower edges; edges[0] == min <= v
        let idx = edges[..bin_count].partition_point(|&e| e <= v) - 1;
        counts[idx] += 1;
    }
    Ok(counts
        .iter()
        .enumerate()
        .map(|(i, &c)| HistogramBin {
            lower: edges[i],
            upper: edges[i + 1],
            count: c,
        })
        .collect())
}

/// `bin_count + 1` non-decreasing edges from `min` to `max`. When the range
/// spans fewer than about `bin_count` ULPs some interior edges coincide and
/// the bins between them are empty `[e, e)` intervals.
fn bin_edges(min: f64, max: f64, bin_count: usize) -> Vec<f64> {
    let k = bin_count as f64;
    let width = (max - min) / k;
    let mut edges: Vec<f64> = (0..=bin_count)
        .map(|i| {
            if i == bin_count {
                max
            } else if width.is_finite() {
                min + i as f64 * width
            } else {
                // range overflowed f64; min < 0 < max so the terms never overflow together
                min / k * (k - i as f64) + max / k * i as f64
            }
        })
        .collect();
    for i in 1..edges.len() {
        edges[i] = edges[i].clamp(edges[i - 1], max);
    }
    edges
}

pub fn total_count(bins: &[HistogramBin]) -> u64 {
    bins.iter().map(|b| b.count).sum()
}
