//! Metric computation engine.
//!
//! Five named metrics over `(H, W, C)` image pairs (PSNR, SSIM, UQI, SAM,
//! RMSE) plus the auxiliary stress metric. Each metric function validates
//! shapes before touching any pixel and returns a [`MetricMap`]; the scalar
//! result is always the mean of that map over all dimensions.
//!
//! Numerical robustness is part of the contract: every division carries a
//! small additive epsilon so flat regions (zero variance) and identical
//! inputs (zero error) produce finite values instead of NaN/Inf.

mod pointwise;
mod spectral;
mod windowed;

pub use pointwise::{mse_map, psnr_map, rmse_map, stress};
pub use spectral::sam_map;
pub use windowed::{ssim_map, uqi_map};

use crate::result::{CotejarError, CotejarResult};
use ndarray::{Array2, Array3, ArrayView3, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Epsilon guarding divisions by near-zero error or norm
pub const EPS_DIV: f32 = 1e-8;

/// Epsilon stabilizing windowed-statistics denominators
pub const EPS_STAB: f32 = 1e-12;

/// Output of a metric function: same `(H, W)` as the inputs, either
/// channel-resolved or already channel-reduced depending on the metric.
#[derive(Debug, Clone)]
pub enum MetricMap {
    /// `(H, W, C)` map with one value per pixel per channel
    PerChannel(Array3<f32>),
    /// `(H, W)` map already collapsed over channels (SAM)
    Reduced(Array2<f32>),
}

impl MetricMap {
    /// Mean over all dimensions; this is the scalar metric value
    #[must_use]
    pub fn mean(&self) -> f32 {
        match self {
            Self::PerChannel(map) => map.mean().unwrap_or(0.0),
            Self::Reduced(map) => map.mean().unwrap_or(0.0),
        }
    }

    /// Channel count for channel-resolved maps
    #[must_use]
    pub fn channels(&self) -> Option<usize> {
        match self {
            Self::PerChannel(map) => Some(map.dim().2),
            Self::Reduced(_) => None,
        }
    }

    /// Collapse to `(H, W)` by averaging over the channel axis
    #[must_use]
    pub fn reduce_channels(&self) -> Array2<f32> {
        match self {
            Self::PerChannel(map) => map
                .mean_axis(Axis(2))
                .unwrap_or_else(|| Array2::zeros((map.dim().0, map.dim().1))),
            Self::Reduced(map) => map.clone(),
        }
    }
}

/// The closed set of exported metrics.
///
/// Each variant carries its display name and its best-of-N polarity, so
/// dispatch and selection never go through strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    /// Peak signal-to-noise ratio (dB), channel-resolved
    Psnr,
    /// Structural similarity, exported as a dissimilarity map (`1 - ssim`)
    Ssim,
    /// Universal quality index, channel-resolved
    Uqi,
    /// Spectral angle mapper, channel-reduced
    Sam,
    /// Root-mean-square error, channel-resolved
    Rmse,
}

impl MetricKind {
    /// All metrics in computation order
    pub const ALL: [Self; 5] = [Self::Psnr, Self::Ssim, Self::Uqi, Self::Sam, Self::Rmse];

    /// Canonical metric name (also the JSON key and CSV column header)
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Psnr => "PSNR",
            Self::Ssim => "SSIM",
            Self::Uqi => "UQI",
            Self::Sam => "SAM",
            Self::Rmse => "RMSE",
        }
    }

    /// Parse a canonical metric name
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Best-of-N polarity.
    ///
    /// SSIM counts as higher-is-better even though the exported map is a
    /// dissimilarity; best-of-N selection keeps the max for it.
    #[must_use]
    pub const fn higher_is_better(self) -> bool {
        match self {
            Self::Psnr | Self::Ssim | Self::Uqi => true,
            Self::Sam | Self::Rmse => false,
        }
    }

    /// Arrow indicator for summaries
    #[must_use]
    pub const fn indicator(self) -> char {
        if self.higher_is_better() {
            '↑'
        } else {
            '↓'
        }
    }

    /// Typical display range `(vmin, vmax)` for heatmap color scaling
    #[must_use]
    pub const fn display_range(self) -> (f32, f32) {
        match self {
            Self::Psnr => (10.0, 30.0),
            Self::Ssim | Self::Uqi | Self::Sam | Self::Rmse => (0.0, 1.0),
        }
    }

    /// Compute this metric's map for a pair of equal-shaped images
    pub fn compute(self, a: ArrayView3<'_, f32>, b: ArrayView3<'_, f32>) -> CotejarResult<MetricMap> {
        match self {
            Self::Psnr => Ok(MetricMap::PerChannel(psnr_map(a, b)?)),
            Self::Ssim => Ok(MetricMap::PerChannel(ssim_map(a, b, crate::window::SSIM_WINDOW)?)),
            Self::Uqi => Ok(MetricMap::PerChannel(uqi_map(a, b, crate::window::UQI_WINDOW)?)),
            Self::Sam => Ok(MetricMap::Reduced(sam_map(a, b)?)),
            Self::Rmse => Ok(MetricMap::PerChannel(rmse_map(a, b)?)),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape guard shared by all metric functions: mismatches raise before any
/// pixel is touched, never a partial result.
pub(crate) fn check_shapes(
    a: ArrayView3<'_, f32>,
    b: ArrayView3<'_, f32>,
) -> CotejarResult<()> {
    if a.dim() != b.dim() {
        let (ah, aw, ac) = a.dim();
        let (bh, bw, bc) = b.dim();
        return Err(CotejarError::shape_mismatch([ah, aw, ac], [bh, bw, bc]));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn all_lists_five_metrics_in_order() {
        let names: Vec<&str> = MetricKind::ALL.iter().map(|k| k.name()).collect();
        assert_eq!(names, ["PSNR", "SSIM", "UQI", "SAM", "RMSE"]);
    }

    #[test]
    fn from_name_round_trips() {
        for kind in MetricKind::ALL {
            assert_eq!(MetricKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(MetricKind::from_name("MSE"), None);
    }

    #[test]
    fn polarity_matches_selection_rules() {
        assert!(MetricKind::Psnr.higher_is_better());
        assert!(MetricKind::Ssim.higher_is_better());
        assert!(MetricKind::Uqi.higher_is_better());
        assert!(!MetricKind::Sam.higher_is_better());
        assert!(!MetricKind::Rmse.higher_is_better());
        assert_eq!(MetricKind::Psnr.indicator(), '↑');
        assert_eq!(MetricKind::Rmse.indicator(), '↓');
    }

    #[test]
    fn sam_is_the_only_reduced_map() {
        let a = Array3::from_elem((4, 4, 3), 0.5_f32);
        for kind in MetricKind::ALL {
            let map = kind.compute(a.view(), a.view()).unwrap();
            match kind {
                MetricKind::Sam => assert!(map.channels().is_none()),
                _ => assert_eq!(map.channels(), Some(3)),
            }
        }
    }

    #[test]
    fn compute_rejects_shape_mismatch_for_every_metric() {
        let a = Array3::from_elem((4, 4, 3), 0.5_f32);
        let b = Array3::from_elem((4, 5, 3), 0.5_f32);
        for kind in MetricKind::ALL {
            let err = kind.compute(a.view(), b.view()).unwrap_err();
            assert!(
                matches!(err, crate::result::CotejarError::ShapeMismatch { .. }),
                "{kind} accepted mismatched shapes"
            );
        }
    }

    #[test]
    fn reduce_channels_averages_the_channel_axis() {
        let mut map = Array3::zeros((2, 2, 2));
        map[(0, 0, 0)] = 1.0;
        map[(0, 0, 1)] = 3.0;
        let reduced = MetricMap::PerChannel(map).reduce_channels();
        assert_eq!(reduced[(0, 0)], 2.0);
        assert_eq!(reduced[(1, 1)], 0.0);
    }
}
