//! Heatmap rendering of metric maps (feature `render`).
//!
//! Pure consumer of [`MetricMap`] outputs: per-channel PNGs for
//! channel-resolved maps and a combined per-metric canvas with one panel per
//! comparison pair.

use crate::metrics::{MetricKind, MetricMap};
use crate::result::CotejarResult;
use ndarray::ArrayView2;
use std::fs;
use std::path::{Path, PathBuf};

/// RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    /// Red component (0-255)
    pub r: u8,
    /// Green component (0-255)
    pub g: u8,
    /// Blue component (0-255)
    pub b: u8,
}

impl Rgb {
    /// Create a new RGB color
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Create color from hex value
    #[must_use]
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }
}

/// Color palette: anchor colors at fixed stops, linearly interpolated
#[derive(Debug, Clone)]
pub struct ColorPalette {
    anchors: Vec<(f32, Rgb)>,
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::inferno()
    }
}

impl ColorPalette {
    /// Inferno palette (dark purple through orange to pale yellow)
    #[must_use]
    pub fn inferno() -> Self {
        Self {
            anchors: vec![
                (0.0, Rgb::from_hex(0x000004)),
                (0.25, Rgb::from_hex(0x56106E)),
                (0.5, Rgb::from_hex(0xBB3754)),
                (0.75, Rgb::from_hex(0xF98C0A)),
                (1.0, Rgb::from_hex(0xFCFFA4)),
            ],
        }
    }

    /// Grayscale palette
    #[must_use]
    pub fn grayscale() -> Self {
        Self {
            anchors: vec![(0.0, Rgb::new(0, 0, 0)), (1.0, Rgb::new(255, 255, 255))],
        }
    }

    /// Color for a normalized value in `[0, 1]`
    #[must_use]
    pub fn color_for(&self, t: f32) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mut lower = self.anchors[0];
        for &anchor in &self.anchors {
            if anchor.0 <= t {
                lower = anchor;
            } else {
                let span = anchor.0 - lower.0;
                let frac = if span > 0.0 { (t - lower.0) / span } else { 0.0 };
                return lerp(lower.1, anchor.1, frac);
            }
        }
        lower.1
    }
}

fn lerp(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let mix = |x: u8, y: u8| (f32::from(x) + (f32::from(y) - f32::from(x)) * t).round() as u8;
    Rgb::new(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b))
}

/// Gap between panels of a combined canvas, in pixels
const PANEL_GAP: usize = 4;

/// Renders metric maps as PNG heatmaps
#[derive(Debug, Clone)]
pub struct HeatmapRenderer {
    palette: ColorPalette,
    /// Channel stride for per-channel output (every Nth channel)
    channel_step: usize,
}

impl Default for HeatmapRenderer {
    fn default() -> Self {
        Self {
            palette: ColorPalette::inferno(),
            channel_step: 5,
        }
    }
}

impl HeatmapRenderer {
    /// Renderer with the default inferno palette
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different palette
    #[must_use]
    pub fn with_palette(mut self, palette: ColorPalette) -> Self {
        self.palette = palette;
        self
    }

    /// Change the per-channel output stride (0 is treated as 1)
    #[must_use]
    pub fn with_channel_step(mut self, step: usize) -> Self {
        self.channel_step = step.max(1);
        self
    }

    /// Render one `(H, W)` plane with a fixed value range
    #[must_use]
    pub fn render_plane(&self, plane: ArrayView2<'_, f32>, vmin: f32, vmax: f32) -> image::RgbImage {
        let (h, w) = plane.dim();
        let span = if vmax > vmin { vmax - vmin } else { 1.0 };
        image::RgbImage::from_fn(w as u32, h as u32, |x, y| {
            let v = plane[(y as usize, x as usize)];
            let color = self.palette.color_for((v - vmin) / span);
            image::Rgb([color.r, color.g, color.b])
        })
    }

    /// Write per-channel heatmaps for a channel-resolved map.
    ///
    /// Files land under `{output_dir}/metric_maps_by_channels/{metric}/` as
    /// `crop_{N}_{pair}_ch{c}.png`, every `channel_step`th channel; for
    /// hyperspectral maps the band's wavelength is appended to the name.
    /// Channel-reduced maps produce no per-channel output.
    pub fn save_channel_maps(
        &self,
        crop: usize,
        metric: MetricKind,
        pair: &str,
        map: &MetricMap,
        wavelengths: Option<&[f64]>,
        output_dir: impl AsRef<Path>,
    ) -> CotejarResult<Vec<PathBuf>> {
        let MetricMap::PerChannel(channels) = map else {
            return Ok(Vec::new());
        };
        let dir = output_dir
            .as_ref()
            .join("metric_maps_by_channels")
            .join(metric.name());
        fs::create_dir_all(&dir)?;

        let (vmin, vmax) = metric.display_range();
        let mut written = Vec::new();
        for c in (0..channels.dim().2).step_by(self.channel_step) {
            let plane = channels.index_axis(ndarray::Axis(2), c);
            let img = self.render_plane(plane, vmin, vmax);
            let suffix = wavelengths
                .and_then(|wls| wls.get(c))
                .map_or_else(String::new, |wl| format!("_{wl:.0}nm"));
            let path = dir.join(format!("crop_{crop}_{pair}_ch{c}{suffix}.png"));
            img.save(&path)
                .map_err(|e| std::io::Error::other(e.to_string()))?;
            written.push(path);
        }
        Ok(written)
    }

    /// Write the combined canvas for one metric: one channel-reduced panel
    /// per comparison pair, auto-scaled, side by side.
    pub fn save_combined(
        &self,
        crop: usize,
        metric: MetricKind,
        panels: &[(String, MetricMap)],
        output_dir: impl AsRef<Path>,
    ) -> CotejarResult<PathBuf> {
        let dir = output_dir.as_ref().join("metric_maps");
        fs::create_dir_all(&dir)?;

        let reduced: Vec<_> = panels.iter().map(|(_, map)| map.reduce_channels()).collect();
        let panel_h = reduced.iter().map(|p| p.dim().0).max().unwrap_or(0);
        let total_w: usize = reduced.iter().map(|p| p.dim().1).sum::<usize>()
            + PANEL_GAP * reduced.len().saturating_sub(1);

        let mut canvas =
            image::RgbImage::new(total_w.max(1) as u32, panel_h.max(1) as u32);
        let mut x_off = 0_usize;
        for plane in &reduced {
            let lo = plane.iter().copied().fold(f32::INFINITY, f32::min);
            let hi = plane.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let tile = self.render_plane(plane.view(), lo, hi);
            for (x, y, pixel) in tile.enumerate_pixels() {
                canvas.put_pixel((x_off + x as usize) as u32, y, *pixel);
            }
            x_off += plane.dim().1 + PANEL_GAP;
        }

        let path = dir.join(format!("crop_{crop}_{}_combined.png", metric.name()));
        canvas
            .save(&path)
            .map_err(|e| std::io::Error::other(e.to_string()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array2, Array3};

    #[test]
    fn palette_endpoints_match_anchors() {
        let palette = ColorPalette::inferno();
        assert_eq!(palette.color_for(0.0), Rgb::from_hex(0x000004));
        assert_eq!(palette.color_for(1.0), Rgb::from_hex(0xFCFFA4));
        // out-of-range values are clamped
        assert_eq!(palette.color_for(-5.0), palette.color_for(0.0));
        assert_eq!(palette.color_for(5.0), palette.color_for(1.0));
    }

    #[test]
    fn grayscale_midpoint_is_mid_gray() {
        let palette = ColorPalette::grayscale();
        let mid = palette.color_for(0.5);
        assert!(mid.r.abs_diff(128) <= 1);
        assert_eq!(mid.r, mid.g);
        assert_eq!(mid.g, mid.b);
    }

    #[test]
    fn render_plane_has_map_dimensions() {
        let plane = Array2::from_shape_fn((6, 9), |(y, x)| (y + x) as f32);
        let img = HeatmapRenderer::new().render_plane(plane.view(), 0.0, 14.0);
        assert_eq!(img.width(), 9);
        assert_eq!(img.height(), 6);
    }

    #[test]
    fn channel_maps_stride_and_naming() {
        let dir = tempfile::tempdir().unwrap();
        let map = MetricMap::PerChannel(Array3::from_elem((4, 4, 12), 0.5_f32));
        let renderer = HeatmapRenderer::new();
        let written = renderer
            .save_channel_maps(1, MetricKind::Rmse, "hazed_a vs clean_b", &map, None, dir.path())
            .unwrap();
        // channels 0, 5, 10
        assert_eq!(written.len(), 3);
        assert!(written[0].ends_with("crop_1_hazed_a vs clean_b_ch0.png"));
        assert!(written[2].ends_with("crop_1_hazed_a vs clean_b_ch10.png"));
        assert!(written[0].parent().unwrap().ends_with("metric_maps_by_channels/RMSE"));
    }

    #[test]
    fn channel_step_is_configurable() {
        let dir = tempfile::tempdir().unwrap();
        let map = MetricMap::PerChannel(Array3::from_elem((4, 4, 9), 0.5_f32));
        let written = HeatmapRenderer::new()
            .with_channel_step(3)
            .save_channel_maps(1, MetricKind::Uqi, "a vs b", &map, None, dir.path())
            .unwrap();
        // channels 0, 3, 6
        assert_eq!(written.len(), 3);
        assert!(written[1].ends_with("crop_1_a vs b_ch3.png"));
    }

    #[test]
    fn channel_step_zero_clamps_to_one() {
        let dir = tempfile::tempdir().unwrap();
        let map = MetricMap::PerChannel(Array3::from_elem((2, 2, 4), 0.5_f32));
        let written = HeatmapRenderer::new()
            .with_channel_step(0)
            .save_channel_maps(1, MetricKind::Rmse, "a vs b", &map, None, dir.path())
            .unwrap();
        assert_eq!(written.len(), 4);
    }

    #[test]
    fn channel_maps_annotate_wavelengths() {
        let dir = tempfile::tempdir().unwrap();
        let map = MetricMap::PerChannel(Array3::from_elem((4, 4, 6), 0.5_f32));
        let wls = [365.9, 375.6, 385.3, 394.9, 404.6, 414.3];
        let written = HeatmapRenderer::new()
            .save_channel_maps(2, MetricKind::Sam, "a vs b", &map, Some(&wls), dir.path())
            .unwrap();
        assert!(written[0].ends_with("crop_2_a vs b_ch0_366nm.png"));
        assert!(written[1].ends_with("crop_2_a vs b_ch5_414nm.png"));
    }

    #[test]
    fn reduced_maps_produce_no_channel_output() {
        let dir = tempfile::tempdir().unwrap();
        let map = MetricMap::Reduced(Array2::from_elem((4, 4), 0.1_f32));
        let written = HeatmapRenderer::new()
            .save_channel_maps(1, MetricKind::Sam, "a vs b", &map, None, dir.path())
            .unwrap();
        assert!(written.is_empty());
    }

    #[test]
    fn combined_canvas_tiles_all_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let panels = vec![
            ("a vs b".to_string(), MetricMap::Reduced(Array2::from_elem((4, 6), 0.1_f32))),
            ("a vs c".to_string(), MetricMap::Reduced(Array2::from_elem((4, 6), 0.9_f32))),
        ];
        let path = HeatmapRenderer::new()
            .save_combined(3, MetricKind::Rmse, &panels, dir.path())
            .unwrap();
        assert!(path.ends_with("metric_maps/crop_3_RMSE_combined.png"));
        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.height(), 4);
        assert_eq!(img.width(), (6 + 4 + 6) as u32);
    }
}
