//! Pairwise metric computation with shape/type validation.

use crate::image::Image;
use crate::metrics::{MetricKind, MetricMap};
use crate::result::{CotejarError, CotejarResult};

/// Validates a pair of images, dispatches a metric and reduces its map to a
/// scalar. Pure given valid inputs; validation failures are never swallowed
/// into a misleading numeric result.
#[derive(Debug, Clone)]
pub struct MetricCalculator {
    metrics: Vec<MetricKind>,
}

impl Default for MetricCalculator {
    fn default() -> Self {
        Self {
            metrics: MetricKind::ALL.to_vec(),
        }
    }
}

impl MetricCalculator {
    /// Calculator over all five metrics
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculator over a chosen metric subset
    #[must_use]
    pub fn with_metrics(metrics: Vec<MetricKind>) -> Self {
        Self { metrics }
    }

    /// Metrics this calculator runs, in computation order.
    ///
    /// This list drives the report and runner loops; it is an iteration
    /// order, not a gate. [`compare`](Self::compare) accepts any metric
    /// regardless of the configured subset.
    #[must_use]
    pub fn metrics(&self) -> &[MetricKind] {
        &self.metrics
    }

    /// Compute a metric for a pair of images, reduced to a scalar.
    ///
    /// Works for any [`MetricKind`], including ones outside the configured
    /// [`metrics`](Self::metrics) subset.
    pub fn compare(&self, metric: MetricKind, a: &Image, b: &Image) -> CotejarResult<f32> {
        Ok(self.compare_map(metric, a, b)?.0)
    }

    /// Compute a metric, returning both the scalar and the full map
    /// (the map feeds visualization)
    pub fn compare_map(
        &self,
        metric: MetricKind,
        a: &Image,
        b: &Image,
    ) -> CotejarResult<(f32, MetricMap)> {
        self.validate(a, b)?;
        let map = metric.compute(a.data(), b.data())?;
        Ok((map.mean(), map))
    }

    /// Shape check first, then kind check, before any metric executes
    fn validate(&self, a: &Image, b: &Image) -> CotejarResult<()> {
        if a.shape() != b.shape() {
            return Err(CotejarError::shape_mismatch(a.shape(), b.shape()));
        }
        if a.kind() != b.kind() {
            return Err(CotejarError::TypeMismatch {
                left: a.kind(),
                right: b.kind(),
            });
        }
        Ok(())
    }
}
