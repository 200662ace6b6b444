//! Classifier
//!
//! Splits detected notes into correct and incorrect ones and finds the
//! reference notes the detector missed.
//!
//! A detected note is correct when it overlaps a reference note of the same
//! pitch. Every such note counts, so a reference note covered by two
//! same-pitch detections contributes two correct notes.

use log::debug;

use crate::note_events::{NoteEvent, NoteEvents};

/// Partition of a detected collection against a reference collection.
#[derive(Debug, Clone, Default)]
pub struct Classification {
    /// Detected notes overlapping a reference note of the same pitch.
    pub correct: NoteEvents,
    /// Detected notes that are not correct.
    pub incorrect: NoteEvents,
    /// Reference notes without any matching detected note.
    pub missed: NoteEvents,
}

/// Detected notes matching `reference_note`: same pitch, overlapping span.
pub(crate) fn matching_detections<'a>(
    detected: &'a NoteEvents,
    reference_note: &'a NoteEvent,
) -> impl Iterator<Item = &'a NoteEvent> + 'a {
    detected
        .events_overlapping(reference_note.onset, reference_note.offset)
        .filter(move |d| d.pitch == reference_note.pitch)
}

/// Classify `detected` against `reference` in a single pass over each.
///
/// Correct and missed notes are found together while walking the reference
/// notes; incorrect notes are then every detected note absent from the
/// finished correct set. Inputs are left untouched.
pub fn classify(detected: &NoteEvents, reference: &NoteEvents) -> Classification {
    let mut correct = NoteEvents::new();
    let mut missed = NoteEvents::new();

    for reference_note in reference {
        let before = correct.len();
        correct.add_copy_all(matching_detections(detected, reference_note));
        if correct.len() == before {
            missed.add_copy(reference_note);
        }
    }

    finish(detected, correct, missed)
}

/// Same result as [`classify`], with the reference pass spread over the
/// rayon thread pool.
///
/// Partial results are merged in reference order before the incorrect pass
/// runs, so the output is identical to the sequential version.
#[cfg(feature = "parallel")]
pub fn classify_parallel(detected: &NoteEvents, reference: &NoteEvents) -> Classification {
    use rayon::prelude::*;

    // Sort up front so workers only ever read the cached orderings.
    detected.ensure_sorted();
    reference.ensure_sorted();

    let partials: Vec<(Vec<NoteEvent>, Option<NoteEvent>)> = (0..reference.len())
        .into_par_iter()
        .map(|i| {
            let reference_note = &reference[i];
            let hits: Vec<NoteEvent> = matching_detections(detected, reference_note)
                .copied()
                .collect();
            let miss = hits.is_empty().then_some(*reference_note);
            (hits, miss)
        })
        .collect();

    let mut correct = NoteEvents::new();
    let mut missed = NoteEvents::new();
    for (hits, miss) in partials {
        correct.extend(hits);
        missed.extend(miss);
    }

    finish(detected, correct, missed)
}

fn finish(detected: &NoteEvents, correct: NoteEvents, missed: NoteEvents) -> Classification {
    let incorrect = incorrect_against(detected, &correct);
    debug!(
        "classified {} detected notes: {} correct, {} incorrect, {} missed",
        detected.len(),
        correct.len(),
        incorrect.len(),
        missed.len()
    );
    Classification {
        correct,
        incorrect,
        missed,
    }
}

fn incorrect_against(detected: &NoteEvents, correct: &NoteEvents) -> NoteEvents {
    let mut incorrect = NoteEvents::new();
    incorrect.add_copy_all(detected.iter().filter(|d| !correct.contains(d)));
    incorrect
}

/// Detected notes matching some reference note (true positives).
pub fn correct_notes(detected: &NoteEvents, reference: &NoteEvents) -> NoteEvents {
    let mut correct = NoteEvents::new();
    for reference_note in reference {
        correct.add_copy_all(matching_detections(detected, reference_note));
    }
    correct
}

/// Detected notes matching no reference note (false positives).
pub fn incorrect_notes(detected: &NoteEvents, reference: &NoteEvents) -> NoteEvents {
    incorrect_against(detected, &correct_notes(detected, reference))
}

/// Reference notes without a matching detection (false negatives).
pub fn missed_notes(detected: &NoteEvents, reference: &NoteEvents) -> NoteEvents {
    let mut missed = NoteEvents::new();
    missed.add_copy_all(
        reference
            .iter()
            .filter(|r| matching_detections(detected, r).next().is_none()),
    );
    missed
}
