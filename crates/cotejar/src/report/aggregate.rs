//! Folder-level aggregation of persisted crop reports into one CSV table.
//!
//! The column schema is fixed: `Folder, Crop, Comparison, PSNR, SSIM, SAM,
//! UQI, RMSE`. A metric absent from a source record becomes an explicit null
//! (empty cell), never a dropped column.

use super::crop::{parse_crop_number, CropReport};
use crate::metrics::MetricKind;
use crate::result::CotejarResult;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Metric column order of the aggregate CSV
pub const CSV_METRIC_ORDER: [MetricKind; 5] = [
    MetricKind::Psnr,
    MetricKind::Ssim,
    MetricKind::Sam,
    MetricKind::Uqi,
    MetricKind::Rmse,
];

/// One aggregate row: a (folder, crop, comparison) triple with the five
/// metric values, any of which may be null
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    /// Source results folder
    pub folder: String,
    /// Crop index
    pub crop: usize,
    /// Pair label
    pub comparison: String,
    /// PSNR value, if present in the source record
    pub psnr: Option<f64>,
    /// SSIM value, if present
    pub ssim: Option<f64>,
    /// SAM value, if present
    pub sam: Option<f64>,
    /// UQI value, if present
    pub uqi: Option<f64>,
    /// RMSE value, if present
    pub rmse: Option<f64>,
}

impl AggregateRow {
    fn new(folder: String, crop: usize, comparison: String) -> Self {
        Self {
            folder,
            crop,
            comparison,
            psnr: None,
            ssim: None,
            sam: None,
            uqi: None,
            rmse: None,
        }
    }

    /// Value for one metric column
    #[must_use]
    pub const fn value(&self, metric: MetricKind) -> Option<f64> {
        match metric {
            MetricKind::Psnr => self.psnr,
            MetricKind::Ssim => self.ssim,
            MetricKind::Sam => self.sam,
            MetricKind::Uqi => self.uqi,
            MetricKind::Rmse => self.rmse,
        }
    }

    fn set(&mut self, metric: MetricKind, value: f64) {
        match metric {
            MetricKind::Psnr => self.psnr = Some(value),
            MetricKind::Ssim => self.ssim = Some(value),
            MetricKind::Sam => self.sam = Some(value),
            MetricKind::Uqi => self.uqi = Some(value),
            MetricKind::Rmse => self.rmse = Some(value),
        }
    }
}

/// The terminal artifact: rows across all folders, crops and comparisons,
/// sorted by (folder, crop, comparison)
#[derive(Debug, Clone, Default)]
pub struct AggregateReport {
    rows: Vec<AggregateRow>,
}

impl AggregateReport {
    /// Build a report from the persisted crop reports of many results
    /// folders.
    ///
    /// Missing folders and malformed records are logged and skipped;
    /// aggregation of the remaining data continues.
    #[must_use]
    pub fn from_folders(folders: &[PathBuf]) -> Self {
        let mut keyed: BTreeMap<(String, usize, String), AggregateRow> = BTreeMap::new();
        for folder in folders {
            if !folder.is_dir() {
                warn!(folder = %folder.display(), "results folder not found, skipping");
                continue;
            }
            let folder_name = folder.display().to_string();
            for (_, path) in collect_crop_files(folder) {
                match CropReport::load(&path) {
                    Ok(report) => merge_report(&mut keyed, &folder_name, &report),
                    Err(e) => {
                        warn!(file = %path.display(), error = %e, "skipping malformed crop report");
                    }
                }
            }
        }
        // BTreeMap iteration order is the required row order
        Self {
            rows: keyed.into_values().collect(),
        }
    }

    /// Aggregated rows in (folder, crop, comparison) order
    #[must_use]
    pub fn rows(&self) -> &[AggregateRow] {
        &self.rows
    }

    /// Whether any row was aggregated
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the CSV with the fixed column schema, floats to 4 decimals,
    /// nulls as empty cells.
    ///
    /// The header row is always written, so a run with zero aggregated rows
    /// yields a header-only file rather than no file.
    pub fn write_csv(&self, path: impl AsRef<Path>) -> CotejarResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let mut writer = csv::Writer::from_path(path)?;
        let mut header = vec!["Folder".to_string(), "Crop".to_string(), "Comparison".to_string()];
        header.extend(CSV_METRIC_ORDER.iter().map(|m| m.name().to_string()));
        writer.write_record(&header)?;
        for row in &self.rows {
            let mut record = vec![row.folder.clone(), row.crop.to_string(), row.comparison.clone()];
            for metric in CSV_METRIC_ORDER {
                record.push(row.value(metric).map_or_else(String::new, |v| format!("{v:.4}")));
            }
            writer.write_record(&record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Fold one crop report into the keyed row set
fn merge_report(
    keyed: &mut BTreeMap<(String, usize, String), AggregateRow>,
    folder: &str,
    report: &CropReport,
) {
    for (metric_name, comparisons) in report.metrics() {
        let Some(metric) = MetricKind::from_name(metric_name) else {
            warn!(metric = %metric_name, crop = report.crop(), "unknown metric in crop report, ignoring");
            continue;
        };
        for (comparison, &value) in comparisons {
            let key = (folder.to_string(), report.crop(), comparison.clone());
            keyed
                .entry(key)
                .or_insert_with(|| {
                    AggregateRow::new(folder.to_string(), report.crop(), comparison.clone())
                })
                .set(metric, value);
        }
    }
}

/// Crop report files of a results folder, ordered by crop number
fn collect_crop_files(folder: &Path) -> Vec<(usize, PathBuf)> {
    let mut files = Vec::new();
    let Ok(entries) = fs::read_dir(folder) else {
        warn!(folder = %folder.display(), "cannot list results folder");
        return files;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if name.starts_with("crop_") && name.ends_with("_metrics.json") {
            if let Some(crop) = path
                .file_stem()
                .and_then(|s| parse_crop_number(&s.to_string_lossy()))
            {
                files.push((crop, path));
            }
        }
    }
    files.sort_by_key(|(crop, _)| *crop);
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::MetricCalculator;
    use crate::image::Image;
    use crate::report::LabeledImage;
    use ndarray::Array3;

    fn labeled(class: &str, stem: &str, v: f32) -> LabeledImage {
        LabeledImage {
            image: Image::from_normalized(Array3::from_elem((4, 4, 3), v)).unwrap(),
            class_name: class.to_string(),
            file_stem: stem.to_string(),
        }
    }

    fn write_report(dir: &Path, crop: usize) -> CropReport {
        let images = vec![labeled("hazed", "a", 0.4), labeled("clean", "b", 0.6)];
        let report = CropReport::compute(&MetricCalculator::new(), crop, &images).unwrap();
        report.save(dir).unwrap();
        report
    }

    #[test]
    fn aggregates_rows_across_folders_in_sorted_order() {
        let base = tempfile::tempdir().unwrap();
        let dir_b = base.path().join("b/results");
        let dir_a = base.path().join("a/results");
        write_report(&dir_b, 1);
        write_report(&dir_a, 2);
        write_report(&dir_a, 1);

        let report = AggregateReport::from_folders(&[dir_b.clone(), dir_a.clone()]);
        let rows = report.rows();
        assert_eq!(rows.len(), 3);
        // folder sorts first, then numeric crop
        assert_eq!(rows[0].folder, dir_a.display().to_string());
        assert_eq!(rows[0].crop, 1);
        assert_eq!(rows[1].crop, 2);
        assert_eq!(rows[2].folder, dir_b.display().to_string());
    }

    #[test]
    fn missing_metric_stays_null_never_dropped() {
        let dir = tempfile::tempdir().unwrap();
        // a record carrying only RMSE
        let mut partial = CropReport::new(1, &[MetricKind::Rmse]);
        partial.insert(MetricKind::Rmse, "hazed_a vs clean_b".to_string(), 0.25);
        partial.save(dir.path()).unwrap();

        let report = AggregateReport::from_folders(&[dir.path().to_path_buf()]);
        let row = &report.rows()[0];
        assert_eq!(row.rmse, Some(0.25));
        assert_eq!(row.psnr, None);
        assert_eq!(row.ssim, None);
        assert_eq!(row.sam, None);
        assert_eq!(row.uqi, None);
    }

    #[test]
    fn csv_always_has_all_five_metric_columns() {
        let dir = tempfile::tempdir().unwrap();
        let mut partial = CropReport::new(1, &[MetricKind::Rmse]);
        partial.insert(MetricKind::Rmse, "hazed_a vs clean_b".to_string(), 0.25);
        partial.save(dir.path()).unwrap();

        let out = dir.path().join("complete_metrics_report.csv");
        AggregateReport::from_folders(&[dir.path().to_path_buf()])
            .write_csv(&out)
            .unwrap();

        let csv = fs::read_to_string(&out).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Folder,Crop,Comparison,PSNR,SSIM,SAM,UQI,RMSE"
        );
        let row = lines.next().unwrap();
        assert!(row.ends_with(",,,,0.2500"), "row was {row}");
    }

    #[test]
    fn csv_formats_floats_to_four_decimals() {
        let dir = tempfile::tempdir().unwrap();
        write_report(dir.path(), 1);
        let out = dir.path().join("report.csv");
        AggregateReport::from_folders(&[dir.path().to_path_buf()])
            .write_csv(&out)
            .unwrap();
        let csv = fs::read_to_string(&out).unwrap();
        let data_row = csv.lines().nth(1).unwrap();
        // rmse of constant 0.4 vs 0.6 images
        assert!(data_row.contains("0.2000"), "row was {data_row}");
    }

    #[test]
    fn empty_report_writes_header_only_csv() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("report.csv");
        AggregateReport::default().write_csv(&out).unwrap();
        let csv = fs::read_to_string(&out).unwrap();
        assert_eq!(
            csv.lines().collect::<Vec<_>>(),
            ["Folder,Crop,Comparison,PSNR,SSIM,SAM,UQI,RMSE"]
        );
    }

    #[test]
    fn malformed_records_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write_report(dir.path(), 1);
        fs::write(dir.path().join("crop_2_metrics.json"), "{ not json").unwrap();

        let report = AggregateReport::from_folders(&[dir.path().to_path_buf()]);
        assert_eq!(report.rows().len(), 1);
        assert_eq!(report.rows()[0].crop, 1);
    }

    #[test]
    fn missing_folder_is_skipped_not_fatal() {
        let report = AggregateReport::from_folders(&[PathBuf::from("/nonexistent/results")]);
        assert!(report.is_empty());
    }
}
