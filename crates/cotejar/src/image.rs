//! Image cubes: loading, type inference and intensity normalization.
//!
//! An [`Image`] is an owned `(H, W, C)` array of `f32` in `[0, 1]`. Its
//! semantic kind is resolved exactly once, at construction, from the channel
//! count and carried alongside the data; downstream code never re-infers it.

use crate::result::{CotejarError, CotejarResult};
use ndarray::{Array3, ArrayD, ArrayView3};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Center wavelengths (nm) of the hyperspectral sensor bands.
///
/// Single process-wide constant; the band count of a hyperspectral cube is
/// the length of this table. Only visualization consumes the actual values.
#[rustfmt::skip]
pub const HSI_WAVELENGTHS_NM: [f64; 122] = [
    365.9298, 375.594, 385.2625, 394.9355, 404.6129, 414.2946,
    423.9808, 433.6713, 443.3662, 453.0655, 462.7692, 472.4773,
    482.1898, 491.9066, 501.6279, 511.3535, 521.0836, 530.818,
    540.5568, 550.3, 560.0477, 569.7996, 579.556, 589.3168,
    599.0819, 608.8515, 618.6254, 628.4037, 638.1865, 647.9736,
    657.7651, 667.561, 654.7923, 664.5994, 674.4012, 684.1979,
    693.9894, 703.7756, 713.5566, 723.3325, 733.1031, 742.8685,
    752.6287, 762.3837, 772.1335, 781.8781, 791.6174, 801.3516,
    811.0805, 820.8043, 830.5228, 840.2361, 849.9442, 859.6471,
    869.3448, 879.0372, 888.7245, 898.4066, 908.0834, 917.7551,
    927.4214, 937.0827, 946.7387, 956.3895, 966.0351, 975.6755,
    985.3106, 994.9406, 1004.565, 1014.185, 1023.799, 1033.408,
    1043.012, 1052.611, 1062.204, 1071.793, 1081.376, 1090.954,
    1100.526, 1110.094, 1119.656, 1129.213, 1138.765, 1148.311,
    1157.853, 1167.389, 1176.92, 1186.446, 1195.966, 1205.482,
    1214.992, 1224.497, 1233.996, 1243.491, 1252.98, 1262.464,
    1252.773, 1262.746, 1272.718, 1282.691, 1292.662, 1302.634,
    1312.606, 1452.182, 1462.15, 1472.118, 1482.085, 1492.052,
    1502.019, 1511.986, 1521.952, 1531.918, 1541.885, 1551.85,
    1561.816, 1571.781, 1581.746, 1591.711, 1601.675, 1611.64,
    1621.604, 1631.568,
];

/// Number of hyperspectral bands
pub const HSI_BAND_COUNT: usize = HSI_WAVELENGTHS_NM.len();

/// Intensity scale for 8-bit RGB input
pub const RGB_SCALE: f32 = 255.0;

/// Intensity scale for 12-bit hyperspectral input
pub const HSI_SCALE: f32 = 4096.0;

/// Semantic kind of an image, resolved once at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageKind {
    /// 3-channel RGB image
    Rgb,
    /// Hyperspectral cube with the given band count
    Hyperspectral {
        /// Number of spectral bands
        bands: usize,
    },
}

impl ImageKind {
    /// Resolve the kind from a channel count
    pub fn from_channels(channels: usize) -> CotejarResult<Self> {
        match channels {
            3 => Ok(Self::Rgb),
            c if c == HSI_BAND_COUNT => Ok(Self::Hyperspectral { bands: c }),
            c => Err(CotejarError::UnsupportedChannelCount {
                channels: c,
                expected: HSI_BAND_COUNT,
            }),
        }
    }

    /// Channel count implied by this kind
    #[must_use]
    pub const fn channels(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Hyperspectral { bands } => bands,
        }
    }

    /// Intensity scale used to normalize raw values to `[0, 1]`
    #[must_use]
    pub const fn intensity_scale(self) -> f32 {
        match self {
            Self::Rgb => RGB_SCALE,
            Self::Hyperspectral { .. } => HSI_SCALE,
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb => write!(f, "RGB"),
            Self::Hyperspectral { .. } => write!(f, "HSI"),
        }
    }
}

/// An owned `(H, W, C)` image cube, normalized to `[0, 1]`
#[derive(Debug, Clone)]
pub struct Image {
    data: Array3<f32>,
    kind: ImageKind,
}

impl Image {
    /// Build an image from raw sensor values, normalizing by the kind's
    /// intensity scale and clipping to `[0, 1]`.
    pub fn from_raw(data: Array3<f32>) -> CotejarResult<Self> {
        let kind = ImageKind::from_channels(data.dim().2)?;
        let scale = kind.intensity_scale();
        let data = data.mapv(|v| (v / scale).clamp(0.0, 1.0));
        Ok(Self { data, kind })
    }

    /// Build an image from values already in `[0, 1]` (clipped defensively)
    pub fn from_normalized(data: Array3<f32>) -> CotejarResult<Self> {
        let kind = ImageKind::from_channels(data.dim().2)?;
        let data = data.mapv(|v| v.clamp(0.0, 1.0));
        Ok(Self { data, kind })
    }

    /// Load an image from a `.npy` file.
    ///
    /// The stored dtype may be `f32`, `f64`, `u16` or `u8`; everything is
    /// cast to `f32` before normalization.
    pub fn load(path: impl AsRef<Path>) -> CotejarResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CotejarError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let raw = read_cube(path)?;
        Self::from_raw(raw)
    }

    /// Semantic kind of this image
    #[must_use]
    pub const fn kind(&self) -> ImageKind {
        self.kind
    }

    /// Borrow the pixel data
    #[must_use]
    pub fn data(&self) -> ArrayView3<'_, f32> {
        self.data.view()
    }

    /// Shape as `[H, W, C]`
    #[must_use]
    pub fn shape(&self) -> [usize; 3] {
        let (h, w, c) = self.data.dim();
        [h, w, c]
    }

    /// Image height in pixels
    #[must_use]
    pub fn height(&self) -> usize {
        self.data.dim().0
    }

    /// Image width in pixels
    #[must_use]
    pub fn width(&self) -> usize {
        self.data.dim().1
    }

    /// Number of channels
    #[must_use]
    pub fn channels(&self) -> usize {
        self.data.dim().2
    }
}

/// Read a 3D `f32` cube from a `.npy` file, casting from the stored dtype.
fn read_cube(path: &Path) -> CotejarResult<Array3<f32>> {
    let dynamic: ArrayD<f32> = if let Ok(arr) = ndarray_npy::read_npy::<_, ArrayD<f32>>(path) {
        arr
    } else if let Ok(arr) = ndarray_npy::read_npy::<_, ArrayD<u16>>(path) {
        arr.mapv(f32::from)
    } else if let Ok(arr) = ndarray_npy::read_npy::<_, ArrayD<u8>>(path) {
        arr.mapv(f32::from)
    } else {
        match ndarray_npy::read_npy::<_, ArrayD<f64>>(path) {
            Ok(arr) => arr.mapv(|v| v as f32),
            Err(e) => return Err(CotejarError::array_read(path, e.to_string())),
        }
    };
    let shape = dynamic.shape().to_vec();
    dynamic.into_dimensionality().map_err(|_| {
        CotejarError::array_read(
            path,
            format!("Invalid image dimensions: {shape:?}. Expected 3D array (H,W,C)"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use ndarray_npy::write_npy;

    #[test]
    fn kind_from_channels_rgb() {
        assert_eq!(ImageKind::from_channels(3).unwrap(), ImageKind::Rgb);
    }

    #[test]
    fn kind_from_channels_hsi() {
        assert_eq!(
            ImageKind::from_channels(HSI_BAND_COUNT).unwrap(),
            ImageKind::Hyperspectral {
                bands: HSI_BAND_COUNT
            }
        );
    }

    #[test]
    fn kind_from_channels_rejects_seven() {
        let err = ImageKind::from_channels(7).unwrap_err();
        assert!(matches!(
            err,
            CotejarError::UnsupportedChannelCount { channels: 7, .. }
        ));
    }

    #[test]
    fn wavelength_table_matches_band_count() {
        assert_eq!(HSI_WAVELENGTHS_NM.len(), 122);
        assert_eq!(HSI_BAND_COUNT, 122);
    }

    #[test]
    fn rgb_normalization_divides_by_255_and_clips() {
        let raw = Array3::from_elem((2, 2, 3), 510.0_f32);
        let img = Image::from_raw(raw).unwrap();
        assert_eq!(img.kind(), ImageKind::Rgb);
        assert!(img.data().iter().all(|&v| v == 1.0));

        let raw = Array3::from_elem((2, 2, 3), 127.5_f32);
        let img = Image::from_raw(raw).unwrap();
        assert!(img.data().iter().all(|&v| (v - 0.5).abs() < 1e-6));
    }

    #[test]
    fn hsi_normalization_divides_by_4096() {
        let raw = Array3::from_elem((2, 2, HSI_BAND_COUNT), 2048.0_f32);
        let img = Image::from_raw(raw).unwrap();
        assert_eq!(
            img.kind(),
            ImageKind::Hyperspectral {
                bands: HSI_BAND_COUNT
            }
        );
        assert!(img.data().iter().all(|&v| (v - 0.5).abs() < 1e-6));
    }

    #[test]
    fn load_missing_file_is_file_not_found() {
        let err = Image::load("/nonexistent/void_crop1.npy").unwrap_err();
        assert!(matches!(err, CotejarError::FileNotFound { .. }));
    }

    #[test]
    fn load_round_trips_f32_npy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene_crop1.npy");
        let raw = Array3::from_shape_fn((4, 5, 3), |(h, w, c)| (h + w + c) as f32);
        write_npy(&path, &raw).unwrap();

        let img = Image::load(&path).unwrap();
        assert_eq!(img.shape(), [4, 5, 3]);
        assert_eq!(img.kind(), ImageKind::Rgb);
        // 255-scaled copy of the raw values
        let expected = raw.mapv(|v| v / 255.0);
        for (a, b) in img.data().iter().zip(expected.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn load_casts_u16_npy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hsi_crop1.npy");
        let raw = Array3::from_elem((2, 2, HSI_BAND_COUNT), 4096_u16);
        write_npy(&path, &raw).unwrap();

        let img = Image::load(&path).unwrap();
        assert!(img.data().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn load_rejects_unsupported_channel_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weird_crop1.npy");
        let raw = Array3::<f32>::zeros((4, 4, 7));
        write_npy(&path, &raw).unwrap();

        let err = Image::load(&path).unwrap_err();
        assert!(matches!(
            err,
            CotejarError::UnsupportedChannelCount { channels: 7, .. }
        ));
    }

    #[test]
    fn load_rejects_non_3d_arrays() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flat.npy");
        let raw = ndarray::Array2::<f32>::zeros((4, 4));
        write_npy(&path, &raw).unwrap();

        let err = Image::load(&path).unwrap_err();
        assert!(matches!(err, CotejarError::ArrayRead { .. }));
    }
}
