// src/processor.rs

//! Pure statistics over [`PriceSeries`]. Nothing here blocks or holds state.
//!
//! Two series of different length are aligned by position: only the first
//! `min(len_a, len_b)` samples of each take part in the covariance. Samples are
//! assumed to share a cadence, so no timestamp matching is attempted.

use statrs::statistics::Statistics;

use crate::error::{Result, StockError};
use crate::price_sample::PriceSeries;

/// Arithmetic mean of the sample prices.
pub fn mean(series: &PriceSeries) -> Result<f64> {
    if series.is_empty() {
        return Err(StockError::EmptyInput);
    }
    Ok(series.prices().mean())
}

/// `sqrt(Σ(price - mean)² / (n - 1))`
pub fn sample_std_dev(series: &PriceSeries, mean: f64) -> Result<f64> {
    let n = series.len();
    if n < 2 {
        return Err(StockError::InsufficientData { required: 2, actual: n });
    }

    let sum_sq: f64 = series.prices().map(|price| (price - mean).powi(2)).sum();
    Ok((sum_sq / (n - 1) as f64).sqrt())
}

/// Covariance over the index-aligned prefix of both series, divided by `aligned - 1`.
///
/// The means are the full-series means, as supplied by the caller.
pub fn covariance(series_a: &PriceSeries, series_b: &PriceSeries, mean_a: f64, mean_b: f64) -> Result<f64> {
    let aligned = series_a.len().min(series_b.len());
    if aligned < 2 {
        return Err(StockError::InsufficientData { required: 2, actual: aligned });
    }

    let sum: f64 = series_a
        .prices()
        .zip(series_b.prices())
        .map(|(a, b)| (a - mean_a) * (b - mean_b))
        .sum();

    Ok(sum / (aligned - 1) as f64)
}

/// Pearson correlation coefficient.
///
/// Returns `Ok(NaN)` when the correlation is undefined: either series, or
/// their aligned prefix, has fewer than two samples, or either series is
/// constant. Standard deviations use the full series while the covariance
/// only sees the aligned prefix, so unequal lengths can push the raw ratio
/// outside [-1, 1]; such coefficients are clamped to the nearest bound.
pub fn pearson_correlation(series_a: &PriceSeries, series_b: &PriceSeries) -> Result<f64> {
    if series_a.len().min(series_b.len()) < 2 {
        return Ok(f64::NAN);
    }

    let mean_a = mean(series_a)?;
    let mean_b = mean(series_b)?;

    let std_a = sample_std_dev(series_a, mean_a)?;
    let std_b = sample_std_dev(series_b, mean_b)?;

    if std_a == 0.0 || std_b == 0.0 {
        return Ok(f64::NAN);
    }

    let cov = covariance(series_a, series_b, mean_a, mean_b)?;
    let coefficient = cov / (std_a * std_b);
    if coefficient.is_finite() {
        Ok(coefficient.clamp(-1.0, 1.0))
    } else {
        Ok(f64::NAN)
    }
}
