//! Cotejar: Image-Quality Metrics for RGB and Hyperspectral Cubes
//!
//! Cotejar (Spanish: "to collate/compare") computes full-reference quality
//! metrics (PSNR, SSIM, UQI, SAM, RMSE) over pairs of image cubes stored as
//! NumPy `.npy` arrays, aggregates the results per crop and per folder, and
//! renders per-channel heatmaps of the metric maps.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                     COTEJAR Pipeline                             │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌──────────┐   ┌────────────┐   ┌───────────┐   ┌────────────┐  │
//! │  │ .npy     │   │ Metric     │   │ CropReport│   │ Aggregate  │  │
//! │  │ cubes    │──►│ Calculator │──►│ (JSON)    │──►│ Report     │  │
//! │  │ (H,W,C)  │   │ 5 metrics  │   │ per crop  │   │ (CSV)      │  │
//! │  └──────────┘   └─────┬──────┘   └───────────┘   └────────────┘  │
//! │                       │ metric maps                              │
//! │                 ┌─────▼──────┐                                   │
//! │                 │ Heatmap    │  (feature `render`)               │
//! │                 │ Renderer   │                                   │
//! │                 └────────────┘                                   │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]
#![cfg_attr(test, allow(clippy::large_stack_arrays, clippy::large_stack_frames))]

/// Pairwise metric computation with shape/type validation
pub mod calculator;
/// Heatmap rendering of metric maps (requires the `render` feature)
#[cfg(feature = "render")]
pub mod heatmap;
/// Image cubes: loading, normalization and kind detection
pub mod image;
/// The five metric kernels and their maps
pub mod metrics;
/// Per-crop reports and folder-level CSV aggregation
pub mod report;
/// Error and result types
pub mod result;
/// Folder analysis pipeline
pub mod runner;
/// Gaussian analysis windows
pub mod window;

pub use calculator::MetricCalculator;
#[cfg(feature = "render")]
pub use heatmap::{ColorPalette, HeatmapRenderer, Rgb};
pub use image::{Image, ImageKind, HSI_BAND_COUNT, HSI_WAVELENGTHS_NM};
pub use metrics::{MetricKind, MetricMap};
pub use report::{
    best_of, pair_label, rmse_ratio, AggregateReport, AggregateRow, CropReport, LabeledImage,
    CSV_METRIC_ORDER,
};
pub use result::{CotejarError, CotejarResult};
pub use runner::{
    AnalysisRunner, CancelToken, CropFailure, FolderJob, FolderSummary, LabelsConfig,
};
pub use window::{gaussian_window, DEFAULT_SIGMA, SSIM_WINDOW, UQI_WINDOW};
