//! Windowed metrics: SSIM and UQI.
//!
//! Both metrics share the same local-statistics machinery: a Gaussian window
//! is convolved over each channel (zero padding at the borders) to get local
//! means, and variances/covariance come from the single-pass identity
//! `Var(X) = E[X^2] - E[X]^2`, without a second convolution over centered values.

use super::{check_shapes, EPS_STAB};
use crate::result::CotejarResult;
use crate::window::{gaussian_window, DEFAULT_SIGMA};
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis, Zip};

/// SSIM luminance constant, `0.01²`
const C1: f32 = 0.01 * 0.01;

/// SSIM contrast constant, `0.03²`
const C2: f32 = 0.03 * 0.03;

/// Structural similarity map, channel-resolved, exported as a dissimilarity.
///
/// The per-channel SSIM map is clipped to `[0, 1]` and then inverted
/// (`1 - map`): identical inputs yield 0, not 1. The inversion is observable
/// behavior of the exported values and is deliberately preserved; do not
/// "fix" it back to the textbook similarity convention.
pub fn ssim_map(
    a: ArrayView3<'_, f32>,
    b: ArrayView3<'_, f32>,
    window_size: usize,
) -> CotejarResult<Array3<f32>> {
    check_shapes(a, b)?;
    let kernel = gaussian_window(window_size, DEFAULT_SIGMA)?;
    let (h, w, channels) = a.dim();
    let mut out = Array3::zeros((h, w, channels));
    for c in 0..channels {
        let stats = LocalStats::compute(
            a.index_axis(Axis(2), c),
            b.index_axis(Axis(2), c),
            &kernel,
        );
        let mut plane = out.index_axis_mut(Axis(2), c);
        Zip::from(&mut plane)
            .and(&stats.mu_x)
            .and(&stats.mu_y)
            .and(&stats.var_x)
            .and(&stats.var_y)
            .and(&stats.cov)
            .for_each(|o, &mx, &my, &vx, &vy, &cov| {
                let numer = (2.0 * mx * my + C1) * (2.0 * cov + C2);
                let denom = (mx * mx + my * my + C1) * (vx + vy + C2) + EPS_STAB;
                *o = 1.0 - (numer / denom).clamp(0.0, 1.0);
            });
    }
    Ok(out)
}

/// Universal quality index map, channel-resolved, not reduced.
///
/// `4·mx·my·cov / ((mx² + my²)(vx + vy) + 1e-12)` over an 8-tap Gaussian
/// window by default. The caller averages the map to a scalar.
pub fn uqi_map(
    a: ArrayView3<'_, f32>,
    b: ArrayView3<'_, f32>,
    window_size: usize,
) -> CotejarResult<Array3<f32>> {
    check_shapes(a, b)?;
    let kernel = gaussian_window(window_size, DEFAULT_SIGMA)?;
    let (h, w, channels) = a.dim();
    let mut out = Array3::zeros((h, w, channels));
    for c in 0..channels {
        let stats = LocalStats::compute(
            a.index_axis(Axis(2), c),
            b.index_axis(Axis(2), c),
            &kernel,
        );
        let mut plane = out.index_axis_mut(Axis(2), c);
        Zip::from(&mut plane)
            .and(&stats.mu_x)
            .and(&stats.mu_y)
            .and(&stats.var_x)
            .and(&stats.var_y)
            .and(&stats.cov)
            .for_each(|o, &mx, &my, &vx, &vy, &cov| {
                *o = 4.0 * mx * my * cov / ((mx * mx + my * my) * (vx + vy) + EPS_STAB);
            });
    }
    Ok(out)
}

/// Windowed first- and second-order statistics for one channel pair
struct LocalStats {
    mu_x: Array2<f32>,
    mu_y: Array2<f32>,
    var_x: Array2<f32>,
    var_y: Array2<f32>,
    cov: Array2<f32>,
}

impl LocalStats {
    fn compute(x: ArrayView2<'_, f32>, y: ArrayView2<'_, f32>, kernel: &Array2<f32>) -> Self {
        let mu_x = convolve_plane(x, kernel);
        let mu_y = convolve_plane(y, kernel);

        let xx = x.mapv(|v| v * v);
        let yy = y.mapv(|v| v * v);
        let xy = Zip::from(&x).and(&y).map_collect(|&p, &q| p * q);

        let mut var_x = convolve_plane(xx.view(), kernel);
        Zip::from(&mut var_x).and(&mu_x).for_each(|v, &m| *v -= m * m);
        let mut var_y = convolve_plane(yy.view(), kernel);
        Zip::from(&mut var_y).and(&mu_y).for_each(|v, &m| *v -= m * m);
        let mut cov = convolve_plane(xy.view(), kernel);
        Zip::from(&mut cov)
            .and(&mu_x)
            .and(&mu_y)
            .for_each(|v, &mx, &my| *v -= mx * my);

        Self {
            mu_x,
            mu_y,
            var_x,
            var_y,
            cov,
        }
    }
}

/// 2D convolution with zero padding, centered at `size / 2` on both axes.
///
/// `out[y, x] = sum(k[u, v] * in[y + c - u, x + c - v])`, values outside the
/// input counted as zero. For even kernel sizes the `size / 2` center keeps
/// parity with the constant-mode convolution the metrics were defined with.
fn convolve_plane(input: ArrayView2<'_, f32>, kernel: &Array2<f32>) -> Array2<f32> {
    let (h, w) = input.dim();
    let (kh, kw) = kernel.dim();
    let (cy, cx) = (kh as isize / 2, kw as isize / 2);
    let mut out = Array2::zeros((h, w));
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0_f32;
            for u in 0..kh {
                let sy = y as isize + cy - u as isize;
                if sy < 0 || sy >= h as isize {
                    continue;
                }
                for v in 0..kw {
                    let sx = x as isize + cx - v as isize;
                    if sx < 0 || sx >= w as isize {
                        continue;
                    }
                    acc += kernel[(u, v)] * input[(sy as usize, sx as usize)];
                }
            }
            out[(y, x)] = acc;
        }
    }
    out
}
