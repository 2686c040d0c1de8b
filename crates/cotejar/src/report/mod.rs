//! Per-crop comparison reports and folder-level aggregation.

mod aggregate;
mod crop;

pub use aggregate::{AggregateReport, AggregateRow, CSV_METRIC_ORDER};
pub use crop::{best_of, pair_label, parse_crop_number, rmse_ratio, CropReport, LabeledImage};
