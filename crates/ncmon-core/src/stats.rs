//! Derived statistics over sample snapshots.
//!
//! Everything here is recomputed from a snapshot on demand and never cached.
//! Degenerate inputs yield a defined sentinel (zero, an empty series) or a
//! [`StatsError`]; none of these functions can panic on division.

use serde::Serialize;
use thiserror::Error;

/// Why a statistic is undefined for the given input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("ideal coding gain is undefined for {peers} native peer(s)")]
    TooFewPeers { peers: usize },

    #[error("trend needs at least 2 points, got {points}")]
    TooFewPoints { points: usize },

    #[error("trend is undefined when every x value is equal")]
    DegenerateX,
}

/// Least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Trend {
    pub slope: f64,
    pub intercept: f64,
    pub points: usize,
}

impl Trend {
    /// Value of the fitted line at `x`.
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// One histogram bin, `[lower, upper)` except the last which is closed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: u64,
}

/// Arithmetic mean; 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Divide each element by its 1-based position.
///
/// Fed with the distinct-natives-per-broadcast series this is the coding gain
/// after each broadcast.
pub fn ratio_series(values: &[i64]) -> Vec<f64> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| *v as f64 / (i + 1) as f64)
        .collect()
}

/// Best achievable coding gain with `peers` native nodes: `n / (n - 1)`.
pub fn ideal_coding_gain(peers: usize) -> Result<f64, StatsError> {
    if peers <= 1 {
        return Err(StatsError::TooFewPeers { peers });
    }
    Ok(peers as f64 / (peers - 1) as f64)
}

/// Pair each value with its 1-based index, the x-axis of every time series.
pub fn indexed(values: &[f64]) -> Vec<(f64, f64)> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| ((i + 1) as f64, *v))
        .collect()
}

/// Ordinary least-squares fit over `(x, y)` points.
pub fn linear_trend(points: &[(f64, f64)]) -> Result<Trend, StatsError> {
    let n = points.len();
    if n < 2 {
        return Err(StatsError::TooFewPoints { points: n });
    }

    let nf = n as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / nf;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / nf;

    let (sxx, sxy) = points.iter().fold((0.0, 0.0), |(sxx, sxy), (x, y)| {
        let dx = x - mean_x;
        (sxx + dx * dx, sxy + dx * (y - mean_y))
    });

    if sxx == 0.0 {
        return Err(StatsError::DegenerateX);
    }

    let slope = sxy / sxx;
    Ok(Trend {
        slope,
        intercept: mean_y - slope * mean_x,
        points: n,
    })
}

/// Equal-width histogram over the value range.
///
/// Empty input or zero bins give an empty histogram. When every value is the
/// same the range is widened by 0.5 on each side.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        min -= 0.5;
        max += 0.5;
    }

    let width = (max - min) / bins as f64;
    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();

    for v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}
