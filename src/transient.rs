//! Transient error detection.
//!
//! Incorrect detections still sounding when a reference note starts are
//! usually short glitches around the note change rather than sustained
//! mistakes.

use crate::{classify::classify, note_events::NoteEvents};

/// Incorrect detections of `detected` that are active at some reference onset.
pub fn transient_errors(detected: &NoteEvents, reference: &NoteEvents) -> NoteEvents {
    filter_transient_errors(&classify(detected, reference).incorrect, reference)
}

/// Members of `incorrect` that are active at the onset of any reference note.
///
/// Each incorrect note is kept at most once, however many onsets it spans,
/// and the result is always a subset of `incorrect`.
pub fn filter_transient_errors(incorrect: &NoteEvents, reference: &NoteEvents) -> NoteEvents {
    let onsets: Vec<f64> = reference.iter().map(|r| r.onset).collect();

    let mut transient = NoteEvents::new();
    transient.add_copy_all(incorrect.iter().filter(|e| {
        let first = onsets.partition_point(|&t| t < e.onset);
        onsets.get(first).is_some_and(|&t| e.is_active_at(t))
    }));
    transient
}
