//! Pixelwise metrics: MSE, PSNR, RMSE and the global stress metric.

use super::{check_shapes, EPS_DIV};
use crate::result::CotejarResult;
use ndarray::{Array3, ArrayView3, Axis};

/// Squared error per pixel per channel: `(a - b)^2`
pub fn mse_map(a: ArrayView3<'_, f32>, b: ArrayView3<'_, f32>) -> CotejarResult<Array3<f32>> {
    check_shapes(a, b)?;
    let mut out = a.to_owned();
    out.zip_mut_with(&b, |x, &y| {
        let d = *x - y;
        *x = d * d;
    });
    Ok(out)
}

/// Peak signal-to-noise ratio map in dB, channel-resolved.
///
/// The peak is the per-channel spatial maximum of the first argument, so a
/// channel's PSNR reflects its own dynamic range. The `1e-8` in the
/// denominator keeps identical inputs large and finite rather than infinite.
pub fn psnr_map(a: ArrayView3<'_, f32>, b: ArrayView3<'_, f32>) -> CotejarResult<Array3<f32>> {
    let mut out = mse_map(a, b)?;
    let channels = a.dim().2;
    let peaks: Vec<f32> = (0..channels)
        .map(|c| {
            a.index_axis(Axis(2), c)
                .fold(f32::NEG_INFINITY, |m, &v| m.max(v))
        })
        .collect();
    for ((_h, _w, c), v) in out.indexed_iter_mut() {
        let peak = peaks[c];
        *v = 10.0 * ((peak * peak) / (*v + EPS_DIV)).log10();
    }
    Ok(out)
}

/// Root-mean-square error map, channel-resolved: `sqrt((a - b)^2)`
pub fn rmse_map(a: ArrayView3<'_, f32>, b: ArrayView3<'_, f32>) -> CotejarResult<Array3<f32>> {
    let mut out = mse_map(a, b)?;
    out.mapv_inplace(f32::sqrt);
    Ok(out)
}

/// Global stress metric: `sqrt(1 - (Σab)² / (Σa²·Σb²))`.
///
/// Auxiliary scalar; 0 for proportional inputs, approaching 1 as the images
/// decorrelate.
pub fn stress(a: ArrayView3<'_, f32>, b: ArrayView3<'_, f32>) -> CotejarResult<f32> {
    check_shapes(a, b)?;
    let mut sum_aa = 0.0_f64;
    let mut sum_bb = 0.0_f64;
    let mut sum_ab = 0.0_f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        sum_aa += f64::from(x) * f64::from(x);
        sum_bb += f64::from(y) * f64::from(y);
        sum_ab += f64::from(x) * f64::from(y);
    }
    let ratio = (sum_ab * sum_ab) / (sum_aa * sum_bb);
    Ok((1.0 - ratio).max(0.0).sqrt() as f32)
}
