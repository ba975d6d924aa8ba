//! Distance-to-score conversion and acceptance thresholds.


use crate::constants::{LONG_QUERY_BOUNDARY, MAX_UNIT_SQUARED_L2};
use crate::vector::Metric;

/// Converts raw store distances into `[0, 1]` scores and decides admission
/// against the configured thresholds.
///
/// Cosine stores already return a similarity, which is used as the score
/// directly. Distance stores (L2) are mapped through
/// `1 - distance / max_possible` where `max_possible` is the squared-L2
/// bound: 4.0 for unit-normalized inputs, a configured constant otherwise.
#[derive(Debug, Clone)]
pub struct SimilarityEvaluator {
    metric: Metric,
    threshold: f32,
    threshold_long: f32,
    max_distance: f32,
}

impl SimilarityEvaluator {
    /// Creates an evaluator for `metric` with the standard and long-query
    /// thresholds.
    pub fn new(metric: Metric, threshold: f32, threshold_long: f32) -> Self {
        Self {
            metric,
            threshold,
            threshold_long,
            max_distance: MAX_UNIT_SQUARED_L2,
        }
    }

    /// Overrides the distance bound used for non-normalized L2 inputs.
    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Converts one raw distance into a `[0, 1]` score.
    pub fn evaluate(&self, distance: f32, normalized: bool) -> f32 {
        match self.metric {
            Metric::Cosine => distance.clamp(0.0, 1.0),
            Metric::L2 => {
                let max_possible = if normalized {
                    MAX_UNIT_SQUARED_L2
                } else {
                    self.max_distance
                };
                (1.0 - distance / max_possible).clamp(0.0, 1.0)
            }
        }
    }

    /// The threshold applied to a query of `query_len` chars.
    pub fn threshold_for(&self, query_len: usize) -> f32 {
        if query_len > LONG_QUERY_BOUNDARY {
            self.threshold_long
        } else {
            self.threshold
        }
    }

    /// `true` if `score` clears the threshold for a query of `query_len`.
    pub fn accept(&self, score: f32, query_len: usize) -> bool {
        score >= self.threshold_for(query_len)
    }

    /// Configured metric.
    pub fn metric(&self) -> Metric {
        self.metric
    }
}
