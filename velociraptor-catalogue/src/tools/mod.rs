//! Binning helpers and derived quantities.

mod mass_function;

pub use mass_function::{create_mass_function, MassFunction};

/// `n + 1` edges evenly spaced in `log10` between `lowest` and `highest`.
pub fn log_edges(lowest: f64, highest: f64, n: usize) -> Vec<f64> {
    let (lo, hi) = (lowest.log10(), highest.log10());
    (0..=n)
        .map(|i| 10f64.powf(lo + (hi - lo) * i as f64 / n as f64))
        .collect()
}

/// `n + 1` edges evenly spaced between `lowest` and `highest`.
pub fn linear_edges(lowest: f64, highest: f64, n: usize) -> Vec<f64> {
    (0..=n)
        .map(|i| lowest + (highest - lowest) * i as f64 / n as f64)
        .collect()
}

/// Bin index of `value` for ascending `edges`. The last bin includes its
/// upper edge; values outside the edges, and NaN, have no bin.
pub fn bin_index(edges: &[f64], value: f64) -> Option<usize> {
    let n = edges.len().checked_sub(1)?;
    if n == 0 || !(value >= edges[0] && value <= edges[n]) {
        return None;
    }
    let i = edges.partition_point(|&e| e <= value);
    Some(i.saturating_sub(1).min(n - 1))
}

/// Counts per bin.
pub fn histogram(values: &[f64], edges: &[f64]) -> Vec<u64> {
    let mut counts = vec![0u64; edges.len().saturating_sub(1)];
    for &v in values {
        if let Some(i) = bin_index(edges, v) {
            counts[i] += 1;
        }
    }
    counts
}

/// Counts per `(x, y)` cell, indexed `[x_bin][y_bin]`.
pub fn histogram_2d(x: &[f64], y: &[f64], x_edges: &[f64], y_edges: &[f64]) -> Vec<Vec<u64>> {
    let mut counts =
        vec![vec![0u64; y_edges.len().saturating_sub(1)]; x_edges.len().saturating_sub(1)];
    for (&xv, &yv) in x.iter().zip(y) {
        if let (Some(i), Some(j)) = (bin_index(x_edges, xv), bin_index(y_edges, yv)) {
            counts[i][j] += 1;
        }
    }
    counts
}
