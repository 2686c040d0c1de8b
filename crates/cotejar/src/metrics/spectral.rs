//! Spectral angle mapper.

use super::{check_shapes, EPS_DIV};
use crate::result::CotejarResult;
use ndarray::{Array2, ArrayView3};

/// Spectral angle mapper map, channel-reduced to `(H, W)`.
///
/// For each pixel the angle between the two channel vectors is computed as
/// `arccos(clip(a·b / (|a||b| + 1e-8), -1, 1))` and normalized by π, so the
/// output lands in `[0, 1]`. Unlike the other metrics this one collapses the
/// channel axis itself.
pub fn sam_map(a: ArrayView3<'_, f32>, b: ArrayView3<'_, f32>) -> CotejarResult<Array2<f32>> {
    check_shapes(a, b)?;
    let (h, w, channels) = a.dim();
    let mut out = Array2::zeros((h, w));
    for y in 0..h {
        for x in 0..w {
            let mut dot = 0.0_f32;
            let mut norm_a = 0.0_f32;
            let mut norm_b = 0.0_f32;
            for c in 0..channels {
                let p = a[(y, x, c)];
                let q = b[(y, x, c)];
                dot += p * q;
                norm_a += p * p;
                norm_b += q * q;
            }
            let cos_theta = (dot / (norm_a.sqrt() * norm_b.sqrt() + EPS_DIV)).clamp(-1.0, 1.0);
            out[(y, x)] = cos_theta.acos() / std::f32::consts::PI;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn sam_of_identical_is_zero() {
        let a = Array3::from_elem((4, 4, 3), 0.5_f32);
        let map = sam_map(a.view(), a.view()).unwrap();
        for &v in map.iter() {
            assert!(v.abs() < 1e-3, "got {v}");
        }
    }

    #[test]
    fn sam_of_scaled_spectra_is_zero() {
        // the angle ignores magnitude; a pixel-wise scaling keeps it at 0
        let a = Array3::from_shape_fn((4, 4, 3), |(_, _, c)| 0.2 + c as f32 * 0.1);
        let b = a.mapv(|v| v * 0.5);
        let map = sam_map(a.view(), b.view()).unwrap();
        for &v in map.iter() {
            assert!(v.abs() < 1e-3, "got {v}");
        }
    }

    #[test]
    fn sam_of_orthogonal_spectra_is_half() {
        let mut a = Array3::zeros((1, 1, 2));
        let mut b = Array3::zeros((1, 1, 2));
        a[(0, 0, 0)] = 1.0;
        b[(0, 0, 1)] = 1.0;
        let map = sam_map(a.view(), b.view()).unwrap();
        assert!((map[(0, 0)] - 0.5).abs() < 1e-4);
    }

    #[test]
    fn sam_output_is_channel_reduced() {
        let a = Array3::from_elem((6, 5, 3), 0.3_f32);
        let map = sam_map(a.view(), a.view()).unwrap();
        assert_eq!(map.dim(), (6, 5));
    }

    #[test]
    fn sam_rejects_shape_mismatch() {
        let a = Array3::<f32>::zeros((4, 4, 3));
        let b = Array3::<f32>::zeros((4, 4, 122));
        assert!(sam_map(a.view(), b.view()).is_err());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn image_strategy() -> impl Strategy<Value = Array3<f32>> {
            proptest::collection::vec(0.0_f32..=1.0, 4 * 4 * 3)
                .prop_map(|v| Array3::from_shape_vec((4, 4, 3), v).unwrap())
        }

        proptest! {
            /// SAM stays in [0, 1] for any pair of non-degenerate vectors
            #[test]
            fn sam_bounded(a in image_strategy(), b in image_strategy()) {
                let map = sam_map(a.view(), b.view()).unwrap();
                prop_assert!(map.iter().all(|&v| (0.0..=1.0).contains(&v)));
            }

            /// SAM is symmetric
            #[test]
            fn sam_symmetric(a in image_strategy(), b in image_strategy()) {
                let ab = sam_map(a.view(), b.view()).unwrap();
                let ba = sam_map(b.view(), a.view()).unwrap();
                for (x, y) in ab.iter().zip(ba.iter()) {
                    prop_assert!((x - y).abs() < 1e-5);
                }
            }
        }
    }
}
