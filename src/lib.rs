//! # note_eval
//!
//! Score the output of a pitch/note detector against ground-truth
//! annotations. Both sides are sets of pitched time intervals; detected notes
//! are classified as correct, incorrect or missed, and precision, recall, F1
//! and time-weighted boundary errors are derived from that split.
//!
//! ## Example
//! ```rust
//! use note_eval::{Evaluator, NoteEvents};
//!
//! fn run() -> Result<(), Box<dyn std::error::Error>> {
//!     // 1) Ground truth and detector output
//!     let mut reference = NoteEvents::new();
//!     reference.add(60, 0.0, 1.0);
//!     reference.add(62, 1.0, 2.0);
//!
//!     let mut detected = NoteEvents::new();
//!     detected.add(60, 0.1, 0.9);
//!     detected.add(61, 1.0, 1.1);
//!
//!     // 2) Evaluate
//!     let evaluator = Evaluator::builder()
//!         .require_monophonic_reference(true)
//!         .build();
//!     let evaluation = evaluator.evaluate(&detected, &reference)?;
//!
//!     assert_eq!(evaluation.counts.correct, 1);
//!     assert_eq!(evaluation.transient_errors.len(), 1);
//!     println!("{evaluation}");
//!     println!("f1 = {:.3}", evaluation.f1()?);
//!
//!     Ok(())
//! }
//! # run().unwrap();
//! ```
//!
//! ## Features
//! - `parsers` (default): annotation XML and detector JSON readers
//! - `parallel`: classify on the `rayon` thread pool

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rust_2018_idioms)]
#![deny(clippy::all)]

/// Note events and their collection.
pub use note_events::{Iter, NoteEvent, NoteEvents};

/// Correct / incorrect / missed classification.
pub use classify::{classify, correct_notes, incorrect_notes, missed_notes, Classification};

/// Parallel classification.
#[cfg(feature = "parallel")]
pub use classify::classify_parallel;

/// Count and duration based scores.
pub use metrics::{
    f1_score, precision, recall, time_weighted, ClassificationCounts, MetricsError, TimeWeighted,
};

/// Transient error filtering.
pub use transient::{filter_transient_errors, transient_errors};

/// Full evaluation of one detected/reference pair.
pub use evaluate::{Evaluation, EvaluationError, Evaluator, EvaluatorBuilder};

/// Note event module.
pub mod note_events;

/// Classification module.
pub mod classify;

/// Metrics module.
pub mod metrics;

/// Transient error module.
pub mod transient;

/// Evaluation module.
pub mod evaluate;

/// Input readers.
#[cfg(feature = "parsers")]
pub mod parse;

mod stats;
