use crate::error::{self, Error, Result};
use log::debug;
#[cfg(feature = "serde")]
use serde_crate::{Deserialize, Serialize};

/// A banding of a signature: `num_bands` bands of `rows_per_band` rows each.
#[cfg_attr(
    feature = "serde",
    derive(Deserialize, Serialize),
    serde(crate = "serde_crate")
)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BandConfig {
    /// Number of bands. Controls OR-amplification.
    pub num_bands: usize,
    /// Number of rows in every band. Controls AND-amplification.
    pub rows_per_band: usize,
}

impl BandConfig {
    /// Returns the probability that two signatures with Jaccard similarity `similarity` share at
    /// least one band bucket: `1 - (1 - s^r)^b`. `similarity` is expected within `[0, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use text_sketch::lsh::BandConfig;
    ///
    /// let config = BandConfig {
    ///     num_bands: 20,
    ///     rows_per_band: 5,
    /// };
    ///
    /// assert_eq!(config.collision_probability(0.0), 0.0);
    /// assert_eq!(config.collision_probability(1.0), 1.0);
    /// assert!(config.collision_probability(0.8) > 0.99);
    /// assert!(config.collision_probability(0.2) < 0.01);
    /// ```
    pub fn collision_probability(&self, similarity: f64) -> f64 {
        let band_match = similarity.powi(self.rows_per_band as i32);
        1.0 - (1.0 - band_match).powi(self.num_bands as i32)
    }

    /// Returns the similarity at which the collision probability S-curve rises most steeply,
    /// approximately `(1 / b)^(1 / r)`. Pairs above it are likely candidates, pairs below it are
    /// not.
    pub fn threshold(&self) -> f64 {
        (1.0 / self.num_bands as f64).powf(1.0 / self.rows_per_band as f64)
    }
}

/// Finds the banding of a `signature_length` signature whose S-curve threshold is closest to
/// `threshold`.
///
/// Every band count `b` in `1..=signature_length` is tried with `r = signature_length / b` rows
/// per band. The first `b` with the smallest `|(1 / b)^(1 / r) - threshold|` wins.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if `threshold` is outside `[0, 1]` or `signature_length` is
/// zero.
///
/// # Examples
///
/// ```
/// use text_sketch::lsh::find_optimal_bands;
///
/// let config = find_optimal_bands(0.5, 128).unwrap();
/// assert!(config.num_bands * config.rows_per_band <= 128);
/// assert!((config.threshold() - 0.5).abs() < 0.05);
/// ```
pub fn find_optimal_bands(threshold: f64, signature_length: usize) -> Result<BandConfig> {
    error::check_threshold("threshold", threshold)?;
    if signature_length == 0 {
        return Err(Error::InvalidConfig(
            "signature length must be at least 1".to_string(),
        ));
    }

    let mut best = BandConfig {
        num_bands: 1,
        rows_per_band: signature_length,
    };
    let mut best_diff = f64::MAX;
    for num_bands in 1..=signature_length {
        let config = BandConfig {
            num_bands,
            rows_per_band: signature_length / num_bands,
        };
        let diff = (config.threshold() - threshold).abs();
        if diff < best_diff {
            best = config;
            best_diff = diff;
        }
    }

    debug!(
        "threshold {} over {} rows tuned to {} bands of {} rows (S-curve threshold {:.4})",
        threshold,
        signature_length,
        best.num_bands,
        best.rows_per_band,
        best.threshold(),
    );
    Ok(best)
}
