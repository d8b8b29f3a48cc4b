// Standard-score outlier detection over aggregate tables.
//
// Scores use the sample (n - 1) standard deviation of the finite values in a
// column. A column with no spread (all values equal, or fewer than two finite
// values) scores every finite row as 0. Non-finite values score NaN and are
// never flagged.
use crate::types::{AggregateRow, Metric};
use crate::util::{finite_values, mean, sample_std};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricScores {
    pub metric: Metric,
    pub scores: Vec<f64>,
    pub flags: Vec<bool>,
}

impl MetricScores {
    /// Flagged rows with their scores, in table order.
    pub fn flagged<'a>(&self, rows: &'a [AggregateRow]) -> Vec<(&'a AggregateRow, f64)> {
        rows.iter()
            .zip(self.scores.iter().zip(&self.flags))
            .filter(|(_, (_, flag))| **flag)
            .map(|(row, (score, _))| (row, *score))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutlierReport {
    pub threshold: f64,
    pub metrics: Vec<MetricScores>,
}

impl OutlierReport {
    pub fn get(&self, metric: Metric) -> Option<&MetricScores> {
        self.metrics.iter().find(|m| m.metric == metric)
    }
}

/// Standard score of every value in `values`.
pub fn z_scores(values: &[f64]) -> Vec<f64> {
    let finite = finite_values(values);
    let constant = finite.windows(2).all(|w| w[0] == w[1]);
    let stats = match (mean(&finite), sample_std(&finite)) {
        (Some(m), Some(s)) if !constant && s > 0.0 => Some((m, s)),
        _ => None,
    };
    values
        .iter()
        .map(|v| {
            if !v.is_finite() {
                f64::NAN
            } else if let Some((m, s)) = stats {
                (v - m) / s
            } else {
                0.0
            }
        })
        .collect()
}

/// Strictly greater than the threshold in magnitude; NaN is never an outlier.
pub fn is_outlier(score: f64, threshold: f64) -> bool {
    score.abs() > threshold
}

pub fn detect(rows: &[AggregateRow], metrics: &[Metric], threshold: f64) -> OutlierReport {
    let metrics = metrics
        .iter()
        .map(|&metric| {
            let values: Vec<f64> = rows.iter().map(|r| metric.value(r)).collect();
            let scores = z_scores(&values);
            let flags: Vec<bool> = scores.iter().map(|z| is_outlier(*z, threshold)).collect();
            debug!(
                metric = metric.name(),
                flagged = flags.iter().filter(|f| **f).count(),
                "scored"
            );
            MetricScores {
                metric,
                scores,
                flags,
            }
        })
        .collect();
    OutlierReport { threshold, metrics }
}
