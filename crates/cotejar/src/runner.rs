//! Folder analysis pipeline.
//!
//! A folder job names a data directory, its `labels.json` and an output
//! directory. The runner walks every crop of the folder, computes all
//! pairwise metrics, persists one JSON report per crop and (with the
//! `render` feature) writes the heatmap PNGs. Crops run in parallel;
//! missing files and failed crops are logged and skipped, never fatal for
//! the folder.

use crate::calculator::MetricCalculator;
#[cfg(feature = "render")]
use crate::image::{ImageKind, HSI_WAVELENGTHS_NM};
use crate::report::{pair_label, CropReport, LabeledImage};
use crate::result::{CotejarError, CotejarResult};
use rayon::prelude::*;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

/// Contents of a folder's `labels.json`.
///
/// `files` and `classes` are parallel lists; the number of coordinate
/// entries is the number of crops cut from the scene.
#[derive(Debug, Clone, Deserialize)]
pub struct LabelsConfig {
    /// Array file basenames, one per source image
    pub files: Vec<String>,
    /// Class name per file, parallel to `files`
    #[serde(rename = "class")]
    pub classes: Vec<String>,
    /// Crop coordinate entries; only the count matters here
    pub coordinates: Vec<serde_json::Value>,
}

impl LabelsConfig {
    /// Parse a `labels.json` file
    pub fn load(path: impl AsRef<Path>) -> CotejarResult<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CotejarError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Number of crops described by the config
    #[must_use]
    pub fn crop_count(&self) -> usize {
        self.coordinates.len()
    }

    /// (basename, class) pairs in config order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.files
            .iter()
            .zip(&self.classes)
            .map(|(f, c)| (f.as_str(), c.as_str()))
    }
}

/// One folder to analyze
#[derive(Debug, Clone)]
pub struct FolderJob {
    /// Display name of the folder (used in logs and summaries)
    pub name: String,
    /// Directory holding the `{basename}_crop{N}.npy` arrays
    pub data_dir: PathBuf,
    /// Path to the folder's `labels.json`
    pub labels_path: PathBuf,
    /// Where reports and heatmaps are written
    pub output_dir: PathBuf,
}

impl FolderJob {
    /// Conventional layout: data in `{root}`, labels at `{root}/labels.json`,
    /// results under `{root}/results`
    #[must_use]
    pub fn from_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            name: root.display().to_string(),
            data_dir: root.to_path_buf(),
            labels_path: root.join("labels.json"),
            output_dir: root.join("results"),
        }
    }
}

/// Cooperative cancellation flag shared with worker threads
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Fresh, un-cancelled token
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; crops not yet started are skipped
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A crop that could not be processed
#[derive(Debug, Clone)]
pub struct CropFailure {
    /// Crop index
    pub crop: usize,
    /// Failure description
    pub message: String,
}

/// Outcome of one folder run
#[derive(Debug, Clone)]
pub struct FolderSummary {
    /// Folder display name
    pub folder: String,
    /// Crops with a persisted report
    pub crops_processed: usize,
    /// Crops skipped (no loadable images, failed, or cancelled)
    pub crops_skipped: usize,
    /// Per-crop failures, in crop order
    pub errors: Vec<CropFailure>,
}

enum CropOutcome {
    Processed,
    Skipped,
    Failed(CropFailure),
}

/// Drives the per-folder analysis: image loading, metric computation,
/// report persistence and heatmap rendering
#[derive(Debug, Clone)]
pub struct AnalysisRunner {
    calculator: MetricCalculator,
    #[cfg(feature = "render")]
    renderer: Option<crate::heatmap::HeatmapRenderer>,
    cancel: CancelToken,
    sequential: bool,
}

impl Default for AnalysisRunner {
    fn default() -> Self {
        Self {
            calculator: MetricCalculator::new(),
            #[cfg(feature = "render")]
            renderer: Some(crate::heatmap::HeatmapRenderer::new()),
            cancel: CancelToken::new(),
            sequential: false,
        }
    }
}

impl AnalysisRunner {
    /// Runner over all metrics with default rendering
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific calculator (e.g. a metric subset)
    #[must_use]
    pub fn with_calculator(mut self, calculator: MetricCalculator) -> Self {
        self.calculator = calculator;
        self
    }

    /// Disable heatmap output
    #[cfg(feature = "render")]
    #[must_use]
    pub fn without_rendering(mut self) -> Self {
        self.renderer = None;
        self
    }

    /// Share a cancellation token with the caller
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Process crops one at a time instead of on the rayon pool
    #[must_use]
    pub const fn sequential(mut self) -> Self {
        self.sequential = true;
        self
    }

    /// Process every crop of one folder.
    ///
    /// Fails only when the labels config itself cannot be read; everything
    /// below crop level is skip-and-warn.
    pub fn run_folder(&self, job: &FolderJob) -> CotejarResult<FolderSummary> {
        let labels = LabelsConfig::load(&job.labels_path)?;
        let crop_count = labels.crop_count();
        info!(folder = %job.name, crops = crop_count, "folder analysis started");

        let process = |crop: usize| {
            if self.cancel.is_cancelled() {
                return CropOutcome::Skipped;
            }
            match self.run_crop(job, &labels, crop) {
                Ok(true) => CropOutcome::Processed,
                Ok(false) => CropOutcome::Skipped,
                Err(e) => {
                    warn!(folder = %job.name, crop, error = %e, "crop failed");
                    CropOutcome::Failed(CropFailure {
                        crop,
                        message: e.to_string(),
                    })
                }
            }
        };
        let outcomes: Vec<CropOutcome> = if self.sequential {
            (1..=crop_count).map(process).collect()
        } else {
            (1..=crop_count).into_par_iter().map(process).collect()
        };

        let mut summary = FolderSummary {
            folder: job.name.clone(),
            crops_processed: 0,
            crops_skipped: 0,
            errors: Vec::new(),
        };
        for outcome in outcomes {
            match outcome {
                CropOutcome::Processed => summary.crops_processed += 1,
                CropOutcome::Skipped => summary.crops_skipped += 1,
                CropOutcome::Failed(failure) => {
                    summary.crops_skipped += 1;
                    summary.errors.push(failure);
                }
            }
        }
        info!(
            folder = %job.name,
            processed = summary.crops_processed,
            skipped = summary.crops_skipped,
            "folder analysis finished"
        );
        Ok(summary)
    }

    /// Run several folders in sequence, each internally parallel
    pub fn run_folders(&self, jobs: &[FolderJob]) -> Vec<FolderSummary> {
        let mut summaries = Vec::with_capacity(jobs.len());
        for job in jobs {
            match self.run_folder(job) {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    warn!(folder = %job.name, error = %e, "folder skipped");
                    summaries.push(FolderSummary {
                        folder: job.name.clone(),
                        crops_processed: 0,
                        crops_skipped: 0,
                        errors: vec![CropFailure {
                            crop: 0,
                            message: e.to_string(),
                        }],
                    });
                }
            }
        }
        summaries
    }

    /// One crop: load, compare, persist, render. `Ok(false)` means the crop
    /// had no loadable images and was skipped.
    fn run_crop(&self, job: &FolderJob, labels: &LabelsConfig, crop: usize) -> CotejarResult<bool> {
        let images = self.load_crop_images(job, labels, crop);
        if images.is_empty() {
            warn!(folder = %job.name, crop, "no images loaded, skipping crop");
            return Ok(false);
        }

        let mut report = CropReport::new(crop, self.calculator.metrics());
        for metric in self.calculator.metrics() {
            #[cfg(feature = "render")]
            let mut panels = Vec::new();
            for i in 0..images.len() {
                for j in (i + 1)..images.len() {
                    let (a, b) = (&images[i], &images[j]);
                    let pair = pair_label(a, b);
                    let (value, map) = self.calculator.compare_map(*metric, &a.image, &b.image)?;
                    report.insert(*metric, pair.clone(), f64::from(value));
                    #[cfg(feature = "render")]
                    if let Some(renderer) = &self.renderer {
                        let wavelengths = match a.image.kind() {
                            ImageKind::Hyperspectral { .. } => Some(&HSI_WAVELENGTHS_NM[..]),
                            ImageKind::Rgb => None,
                        };
                        renderer.save_channel_maps(
                            crop,
                            *metric,
                            &pair,
                            &map,
                            wavelengths,
                            &job.output_dir,
                        )?;
                        panels.push((pair, map));
                    }
                    #[cfg(not(feature = "render"))]
                    let _ = map;
                }
            }
            #[cfg(feature = "render")]
            if let Some(renderer) = &self.renderer {
                if !panels.is_empty() {
                    renderer.save_combined(crop, *metric, &panels, &job.output_dir)?;
                }
            }
        }

        report.save(&job.output_dir)?;
        info!(folder = %job.name, crop, "crop report written");
        Ok(true)
    }

    /// Images of one crop; files that are missing or unreadable are logged
    /// and left out
    fn load_crop_images(
        &self,
        job: &FolderJob,
        labels: &LabelsConfig,
        crop: usize,
    ) -> Vec<LabeledImage> {
        let mut images = Vec::new();
        for (basename, class_name) in labels.entries() {
            let path = job.data_dir.join(format!("{basename}_crop{crop}.npy"));
            match LabeledImage::load(&path, class_name) {
                Ok(image) => images.push(image),
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "image not loaded");
                }
            }
        }
        images
    }
}
