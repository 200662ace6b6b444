//! Metrics
//!
//! Count-based scores (precision, recall, F1) over a [`Classification`], and
//! a time-weighted breakdown of how well matched notes line up with the
//! reference.

use thiserror::Error;

use crate::{
    classify::{matching_detections, Classification},
    note_events::NoteEvents,
    stats::Accumulator,
};

/// Errors when computing metrics.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum MetricsError {
    /// The metric's denominator is zero.
    #[error("{metric} is undefined: no notes to score")]
    Undefined {
        /// Name of the metric that could not be computed.
        metric: &'static str,
    },
}

fn ratio(metric: &'static str, hits: usize, total: usize) -> Result<f64, MetricsError> {
    if total == 0 {
        return Err(MetricsError::Undefined { metric });
    }
    Ok(hits as f64 / total as f64)
}

/// `correct / (correct + incorrect)`.
///
/// Returns `Err(MetricsError::Undefined)` when there are no detected notes.
pub fn precision(correct: usize, incorrect: usize) -> Result<f64, MetricsError> {
    ratio("precision", correct, correct + incorrect)
}

/// `correct / (correct + missed)`.
///
/// Returns `Err(MetricsError::Undefined)` when both counts are zero.
pub fn recall(correct: usize, missed: usize) -> Result<f64, MetricsError> {
    ratio("recall", correct, correct + missed)
}

/// Harmonic mean of precision and recall; `0.0` when both are zero.
pub fn f1_score(precision: f64, recall: f64) -> f64 {
    let sum = precision + recall;
    if sum == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / sum
    }
}

/// Sizes of the three classified sets.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ClassificationCounts {
    /// Number of correct detections (true positives).
    pub correct: usize,
    /// Number of incorrect detections (false positives).
    pub incorrect: usize,
    /// Number of missed reference notes (false negatives).
    pub missed: usize,
}

impl ClassificationCounts {
    /// See [`precision`].
    pub fn precision(&self) -> Result<f64, MetricsError> {
        precision(self.correct, self.incorrect)
    }

    /// See [`recall`].
    pub fn recall(&self) -> Result<f64, MetricsError> {
        recall(self.correct, self.missed)
    }

    /// F1 score, undefined whenever precision or recall is.
    pub fn f1(&self) -> Result<f64, MetricsError> {
        Ok(f1_score(self.precision()?, self.recall()?))
    }
}

impl From<&Classification> for ClassificationCounts {
    fn from(c: &Classification) -> Self {
        ClassificationCounts {
            correct: c.correct.len(),
            incorrect: c.incorrect.len(),
            missed: c.missed.len(),
        }
    }
}

/// Durations, in seconds, describing how matched detections align with the
/// reference notes they match.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct TimeWeighted {
    /// Total length of matched detections.
    pub correct_seconds: f64,
    /// Reference time left uncovered by a late start or an early end.
    pub missed_seconds: f64,
    /// Detected time beyond the reference from an early start or a late end.
    pub overshot_seconds: f64,
}

/// Time-weighted comparison of `detected` against `reference`.
///
/// Uses the same matching rule as [`classify`](fn@crate::classify). For
/// every match the full detection length counts as correct, and each boundary
/// difference is filed as missed (detector inside the reference note) or
/// overshot (detector outside it).
pub fn time_weighted(detected: &NoteEvents, reference: &NoteEvents) -> TimeWeighted {
    let mut correct = Accumulator::default();
    let mut missed = Accumulator::default();
    let mut overshot = Accumulator::default();

    for r in reference {
        for d in matching_detections(detected, r) {
            correct.add(d.duration());

            if d.onset > r.onset {
                missed.add(d.onset - r.onset);
            } else {
                overshot.add(r.onset - d.onset);
            }

            if d.offset < r.offset {
                missed.add(r.offset - d.offset);
            } else {
                overshot.add(d.offset - r.offset);
            }
        }
    }

    TimeWeighted {
        correct_seconds: correct.total(),
        missed_seconds: missed.total(),
        overshot_seconds: overshot.total(),
    }
}
