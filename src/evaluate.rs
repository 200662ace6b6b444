//! Evaluator
//!
//! Runs every measurement over one detected/reference pair and bundles the
//! results into a printable [`Evaluation`].

use std::fmt::{self, Display};

use log::{debug, warn};
use thiserror::Error;

use crate::{
    classify::{classify, Classification},
    metrics::{time_weighted, ClassificationCounts, MetricsError, TimeWeighted},
    note_events::{NoteEvent, NoteEvents},
    transient::filter_transient_errors,
};

/// Errors that stop an evaluation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EvaluationError {
    /// The reference was required to be monophonic but two notes overlap.
    #[error("reference is polyphonic: {first} overlaps {second}")]
    PolyphonicReference {
        /// Earlier of the two overlapping notes.
        first: NoteEvent,
        /// Later of the two overlapping notes.
        second: NoteEvent,
    },
}

/// Builder for [`Evaluator`].
#[derive(Debug, Clone)]
pub struct EvaluatorBuilder {
    require_monophonic_reference: bool,
    parallel: bool,
}

impl EvaluatorBuilder {
    /// Defaults: polyphonic references are allowed, classification runs on
    /// the calling thread.
    pub fn new() -> Self {
        EvaluatorBuilder {
            require_monophonic_reference: false,
            parallel: false,
        }
    }

    /// Reject references containing overlapping notes.
    pub fn require_monophonic_reference(mut self, value: bool) -> Self {
        self.require_monophonic_reference = value;
        self
    }

    /// Classify on the rayon thread pool. Ignored without the `parallel`
    /// feature.
    pub fn parallel(mut self, value: bool) -> Self {
        self.parallel = value;
        self
    }

    /// Build the `Evaluator`.
    pub fn build(self) -> Evaluator {
        Evaluator {
            require_monophonic_reference: self.require_monophonic_reference,
            parallel: self.parallel,
        }
    }
}

impl Default for EvaluatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Evaluates detected notes against reference notes.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    require_monophonic_reference: bool,
    parallel: bool,
}

impl Evaluator {
    /// Return a builder to customize the evaluator.
    pub fn builder() -> EvaluatorBuilder {
        EvaluatorBuilder::new()
    }

    /// Evaluator with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Evaluate `detected` against `reference`.
    ///
    /// Returns `Err(PolyphonicReference)` when a monophonic reference is
    /// required and two reference notes overlap.
    pub fn evaluate(
        &self,
        detected: &NoteEvents,
        reference: &NoteEvents,
    ) -> Result<Evaluation, EvaluationError> {
        let reference_monophonic = match reference.first_overlap() {
            None => true,
            Some((first, second)) if self.require_monophonic_reference => {
                return Err(EvaluationError::PolyphonicReference { first, second });
            }
            Some((first, second)) => {
                warn!("reference is polyphonic: {first} overlaps {second}");
                false
            }
        };

        let classification = self.classify(detected, reference);
        let transient_errors = filter_transient_errors(&classification.incorrect, reference);
        let counts = ClassificationCounts::from(&classification);
        debug!(
            "{} of {} incorrect notes are transient",
            transient_errors.len(),
            counts.incorrect
        );

        Ok(Evaluation {
            counts,
            time_weighted: time_weighted(detected, reference),
            detected_notes: detected.len(),
            reference_notes: reference.len(),
            detected_duration: detected.total_duration(),
            reference_duration: reference.total_duration(),
            detected_monophonic: detected.is_monophonic(),
            reference_monophonic,
            classification,
            transient_errors,
        })
    }

    #[cfg(feature = "parallel")]
    fn classify(&self, detected: &NoteEvents, reference: &NoteEvents) -> Classification {
        if self.parallel {
            crate::classify::classify_parallel(detected, reference)
        } else {
            classify(detected, reference)
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn classify(&self, detected: &NoteEvents, reference: &NoteEvents) -> Classification {
        if self.parallel {
            debug!("parallel classification requested without the `parallel` feature");
        }
        classify(detected, reference)
    }
}

/// Everything measured for one detected/reference pair.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Correct, incorrect and missed notes.
    pub classification: Classification,
    /// Incorrect notes active at a reference onset.
    pub transient_errors: NoteEvents,
    /// Sizes of the classified sets.
    pub counts: ClassificationCounts,
    /// Boundary alignment of matched notes.
    pub time_weighted: TimeWeighted,
    /// Number of detected notes.
    pub detected_notes: usize,
    /// Number of reference notes.
    pub reference_notes: usize,
    /// Total length of all detected notes, in seconds.
    pub detected_duration: f64,
    /// Total length of all reference notes, in seconds.
    pub reference_duration: f64,
    /// Whether no two detected notes overlap.
    pub detected_monophonic: bool,
    /// Whether no two reference notes overlap.
    pub reference_monophonic: bool,
}

impl Evaluation {
    /// Precision of the detection.
    pub fn precision(&self) -> Result<f64, MetricsError> {
        self.counts.precision()
    }

    /// Recall of the detection.
    pub fn recall(&self) -> Result<f64, MetricsError> {
        self.counts.recall()
    }

    /// F1 score of the detection.
    pub fn f1(&self) -> Result<f64, MetricsError> {
        self.counts.f1()
    }

    /// Total length of the correct notes, in seconds.
    pub fn correct_duration(&self) -> f64 {
        self.classification.correct.total_duration()
    }

    /// Total length of the incorrect notes, in seconds.
    pub fn incorrect_duration(&self) -> f64 {
        self.classification.incorrect.total_duration()
    }

    /// Total length of the missed notes, in seconds.
    pub fn missed_duration(&self) -> f64 {
        self.classification.missed.total_duration()
    }
}

struct Score(Result<f64, MetricsError>);

impl Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Ok(value) => write!(f, "{value:.4}"),
            Err(_) => write!(f, "n/a"),
        }
    }
}

impl Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let polyphony = |mono: bool| if mono { "monophonic" } else { "polyphonic" };

        writeln!(
            f,
            "detected:  {} notes, {:.3} s ({})",
            self.detected_notes,
            self.detected_duration,
            polyphony(self.detected_monophonic)
        )?;
        writeln!(
            f,
            "reference: {} notes, {:.3} s ({})",
            self.reference_notes,
            self.reference_duration,
            polyphony(self.reference_monophonic)
        )?;
        writeln!(
            f,
            "correct:   {} notes, {:.3} s",
            self.counts.correct,
            self.correct_duration()
        )?;
        writeln!(
            f,
            "incorrect: {} notes, {:.3} s ({} transient)",
            self.counts.incorrect,
            self.incorrect_duration(),
            self.transient_errors.len()
        )?;
        writeln!(
            f,
            "missed:    {} notes, {:.3} s",
            self.counts.missed,
            self.missed_duration()
        )?;
        writeln!(
            f,
            "precision: {}  recall: {}  f1: {}",
            Score(self.precision()),
            Score(self.recall()),
            Score(self.f1())
        )?;
        write!(
            f,
            "time weighted: {:.3} s correct, {:.3} s missed, {:.3} s overshot",
            self.time_weighted.correct_seconds,
            self.time_weighted.missed_seconds,
            self.time_weighted.overshot_seconds
        )
    }
}
