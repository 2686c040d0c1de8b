//! Per-crop comparison records.
//!
//! One crop's report owns all pairwise metric results for that crop,
//! keyed metric name → pair label → scalar. Pair enumeration follows the
//! loaded-image list order, which is stable and never sorted.

use crate::calculator::MetricCalculator;
use crate::image::Image;
use crate::metrics::MetricKind;
use crate::result::{CotejarError, CotejarResult};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// How many characters of the file stem appear in a pair label
const STEM_LABEL_LEN: usize = 7;

/// A loaded image together with its comparison identity
#[derive(Debug, Clone)]
pub struct LabeledImage {
    /// The normalized image cube
    pub image: Image,
    /// Class name from the labels config (e.g. "clean", "hazed")
    pub class_name: String,
    /// File stem of the source array
    pub file_stem: String,
}

impl LabeledImage {
    /// Load an image and record its class and file stem
    pub fn load(path: impl AsRef<Path>, class_name: impl Into<String>) -> CotejarResult<Self> {
        let path = path.as_ref();
        let image = Image::load(path)?;
        let file_stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            image,
            class_name: class_name.into(),
            file_stem,
        })
    }

    /// Short identity: `"{class}_{stem[:7]}"`
    #[must_use]
    pub fn label(&self) -> String {
        let stem: String = self.file_stem.chars().take(STEM_LABEL_LEN).collect();
        format!("{}_{}", self.class_name, stem)
    }
}

/// Label for an unordered comparison between two images
#[must_use]
pub fn pair_label(a: &LabeledImage, b: &LabeledImage) -> String {
    format!("{} vs {}", a.label(), b.label())
}

/// Parse the crop number out of a `crop_{N}_metrics` file stem
#[must_use]
pub fn parse_crop_number(stem: &str) -> Option<usize> {
    stem.split('_').nth(1)?.parse().ok()
}

/// All comparison results for one spatial crop.
///
/// Serialized as `{ "<MetricName>": { "<pair_label>": <value>, ... }, ... }`;
/// insertion order of pairs is preserved in the JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropReport {
    /// Crop index (carried from the filename, not stored in the JSON)
    #[serde(skip)]
    crop: usize,
    /// metric name → pair label → scalar value
    #[serde(flatten)]
    metrics: IndexMap<String, IndexMap<String, f64>>,
}

impl CropReport {
    /// Empty report for a crop, pre-seeded with one map per metric
    #[must_use]
    pub fn new(crop: usize, metrics: &[MetricKind]) -> Self {
        let metrics = metrics
            .iter()
            .map(|kind| (kind.name().to_string(), IndexMap::new()))
            .collect();
        Self { crop, metrics }
    }

    /// Run every metric over all unordered pairs of the crop's images.
    ///
    /// Validation errors (shape/type mismatch) propagate to the caller;
    /// the crop-level handler decides whether to skip the crop.
    pub fn compute(
        calculator: &MetricCalculator,
        crop: usize,
        images: &[LabeledImage],
    ) -> CotejarResult<Self> {
        let mut report = Self::new(crop, calculator.metrics());
        for metric in calculator.metrics() {
            for i in 0..images.len() {
                for j in (i + 1)..images.len() {
                    let (a, b) = (&images[i], &images[j]);
                    let value = calculator.compare(*metric, &a.image, &b.image)?;
                    report.insert(*metric, pair_label(a, b), f64::from(value));
                }
            }
        }
        Ok(report)
    }

    /// Record one comparison value
    pub fn insert(&mut self, metric: MetricKind, pair: String, value: f64) {
        self.metrics
            .entry(metric.name().to_string())
            .or_default()
            .insert(pair, value);
    }

    /// Crop index this report belongs to
    #[must_use]
    pub const fn crop(&self) -> usize {
        self.crop
    }

    /// Pair → value map for one metric
    #[must_use]
    pub fn metric(&self, metric: MetricKind) -> Option<&IndexMap<String, f64>> {
        self.metrics.get(metric.name())
    }

    /// All metric maps in insertion order
    #[must_use]
    pub const fn metrics(&self) -> &IndexMap<String, IndexMap<String, f64>> {
        &self.metrics
    }

    /// Write the report to `{output_dir}/crop_{N}_metrics.json`
    pub fn save(&self, output_dir: impl AsRef<Path>) -> CotejarResult<PathBuf> {
        let output_dir = output_dir.as_ref();
        fs::create_dir_all(output_dir)?;
        let path = output_dir.join(format!("crop_{}_metrics.json", self.crop));
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)?;
        Ok(path)
    }

    /// Read a persisted report, recovering the crop index from the filename
    pub fn load(path: impl AsRef<Path>) -> CotejarResult<Self> {
        let path = path.as_ref();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let crop = parse_crop_number(&stem).ok_or_else(|| {
            CotejarError::invalid_parameter(format!("cannot parse crop number from {stem:?}"))
        })?;
        let json = fs::read_to_string(path)?;
        let mut report: Self = serde_json::from_str(&json)?;
        report.crop = crop;
        Ok(report)
    }

    /// Human-readable summary with ↑/↓ polarity indicators
    #[must_use]
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", "=".repeat(40));
        let _ = writeln!(out, "Crop {} Metrics Summary", self.crop);
        let _ = writeln!(out, "{}", "=".repeat(40));
        for (name, comparisons) in &self.metrics {
            let indicator = MetricKind::from_name(name).map_or('?', MetricKind::indicator);
            let _ = writeln!(out, "\n{name} ({indicator}):");
            for (pair, value) in comparisons {
                let _ = writeln!(out, "  {pair}: {value:.4}");
            }
        }
        out
    }
}

/// Best-of-N selection: the extremal metric value over several references,
/// max for higher-is-better metrics and min otherwise.
pub fn best_of(
    calculator: &MetricCalculator,
    metric: MetricKind,
    target: &Image,
    references: &[Image],
) -> CotejarResult<f32> {
    if references.is_empty() {
        return Err(CotejarError::invalid_parameter(
            "best-of-N selection needs at least one reference",
        ));
    }
    let mut best: Option<f32> = None;
    for reference in references {
        let value = calculator.compare(metric, target, reference)?;
        best = Some(match best {
            None => value,
            Some(current) if metric.higher_is_better() => current.max(value),
            Some(current) => current.min(value),
        });
    }
    Ok(best.unwrap_or_default())
}

/// R metric: mean target-to-reference RMSE over mean
/// reference-to-reference RMSE.
///
/// Values near 1 mean the target sits no farther from the references than
/// the references sit from each other. Needs at least two references so the
/// baseline pair set is non-empty; identical references give an infinite
/// ratio.
pub fn rmse_ratio(
    calculator: &MetricCalculator,
    target: &Image,
    references: &[Image],
) -> CotejarResult<f32> {
    if references.len() < 2 {
        return Err(CotejarError::invalid_parameter(
            "RMSE ratio needs at least two references",
        ));
    }
    let mut target_sum = 0.0_f32;
    for reference in references {
        target_sum += calculator.compare(MetricKind::Rmse, target, reference)?;
    }
    let target_mean = target_sum / references.len() as f32;

    let mut baseline_sum = 0.0_f32;
    let mut baseline_pairs = 0_usize;
    for i in 0..references.len() {
        for j in (i + 1)..references.len() {
            baseline_sum +=
                calculator.compare(MetricKind::Rmse, &references[i], &references[j])?;
            baseline_pairs += 1;
        }
    }
    Ok(target_mean / (baseline_sum / baseline_pairs as f32))
}
