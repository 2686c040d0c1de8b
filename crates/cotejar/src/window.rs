//! Gaussian window kernels for windowed metrics (SSIM, UQI).

use crate::result::{CotejarError, CotejarResult};
use ndarray::{Array1, Array2};

/// Sigma used by the windowed metrics
pub const DEFAULT_SIGMA: f32 = 1.5;

/// Window size for SSIM
pub const SSIM_WINDOW: usize = 11;

/// Window size for UQI
pub const UQI_WINDOW: usize = 8;

/// Build a 2D Gaussian convolution kernel of shape `(size, size)`.
///
/// A 1D Gaussian is sampled at integer offsets from `size / 2`, normalized,
/// and outer-producted with itself, so the kernel entries sum to 1. For even
/// sizes the center falls on index `size / 2` and the kernel is asymmetric;
/// this matches the window the UQI metric was defined with.
pub fn gaussian_window(size: usize, sigma: f32) -> CotejarResult<Array2<f32>> {
    let gauss = gaussian_1d(size, sigma)?;
    let n = gauss.len();
    Ok(Array2::from_shape_fn((n, n), |(i, j)| gauss[i] * gauss[j]))
}

/// 1D Gaussian sampled at integer offsets from the center, normalized to sum 1
fn gaussian_1d(size: usize, sigma: f32) -> CotejarResult<Array1<f32>> {
    if size == 0 {
        return Err(CotejarError::invalid_parameter(
            "window size must be positive",
        ));
    }
    let center = (size / 2) as f32;
    let mut gauss = Array1::from_shape_fn(size, |x| {
        let d = x as f32 - center;
        (-(d * d) / (2.0 * sigma * sigma)).exp()
    });
    let sum = gauss.sum();
    gauss.mapv_inplace(|v| v / sum);
    Ok(gauss)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_sums_to_one() {
        for size in [3, 7, 8, 11] {
            let kernel = gaussian_window(size, DEFAULT_SIGMA).unwrap();
            assert_eq!(kernel.dim(), (size, size));
            assert!((kernel.sum() - 1.0).abs() < 1e-5, "size {size}");
        }
    }

    #[test]
    fn zero_size_is_invalid_parameter() {
        let err = gaussian_window(0, DEFAULT_SIGMA).unwrap_err();
        assert!(matches!(
            err,
            crate::result::CotejarError::InvalidParameter { .. }
        ));
    }

    #[test]
    fn odd_kernel_is_symmetric_about_center() {
        let kernel = gaussian_window(11, DEFAULT_SIGMA).unwrap();
        for i in 0..11 {
            for j in 0..11 {
                let mirrored = kernel[(10 - i, 10 - j)];
                assert!((kernel[(i, j)] - mirrored).abs() < 1e-7);
            }
        }
    }

    #[test]
    fn even_kernel_peaks_at_floor_center() {
        let kernel = gaussian_window(8, DEFAULT_SIGMA).unwrap();
        let peak = kernel
            .indexed_iter()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .map(|(idx, _)| idx)
            .unwrap();
        assert_eq!(peak, (4, 4));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Kernel normalization holds for any valid size and sigma
            #[test]
            fn kernel_sum_is_one(size in 1_usize..32, sigma in 0.1_f32..8.0) {
                let kernel = gaussian_window(size, sigma).unwrap();
                prop_assert!((kernel.sum() - 1.0).abs() < 1e-4);
            }

            /// All kernel entries are non-negative
            #[test]
            fn kernel_entries_non_negative(size in 1_usize..32, sigma in 0.1_f32..8.0) {
                let kernel = gaussian_window(size, sigma).unwrap();
                prop_assert!(kernel.iter().all(|&v| v >= 0.0));
            }
        }
    }
}
