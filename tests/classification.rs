//! Tests for classification, metrics and transient error detection.

use note_eval::{
    classify, correct_notes, f1_score, filter_transient_errors, incorrect_notes, missed_notes,
    precision, recall, time_weighted, transient_errors, ClassificationCounts, EvaluationError,
    Evaluator, MetricsError, NoteEvent, NoteEvents, TimeWeighted,
};

const EPSILON: f64 = 1e-9;

fn collection(events: &[(i32, f64, f64)]) -> NoteEvents {
    events
        .iter()
        .map(|&(pitch, onset, offset)| NoteEvent::new(pitch, onset, offset))
        .collect()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < EPSILON,
        "expected {expected}, got {actual}"
    );
}

/// Events as a sorted multiset, for order-independent comparison.
fn multiset(notes: &NoteEvents) -> Vec<(i32, u64, u64)> {
    let mut v: Vec<_> = notes
        .iter()
        .map(|e| (e.pitch, e.onset.to_bits(), e.offset.to_bits()))
        .collect();
    v.sort_unstable();
    v
}

#[test]
fn test_exact_match() {
    let reference = collection(&[(60, 0.0, 1.0)]);
    let detected = collection(&[(60, 0.0, 1.0)]);
    let c = classify(&detected, &reference);

    assert_eq!(c.correct.len(), 1);
    assert!(c.incorrect.is_empty());
    assert!(c.missed.is_empty());

    let counts = ClassificationCounts::from(&c);
    assert_eq!(counts.precision(), Ok(1.0));
    assert_eq!(counts.recall(), Ok(1.0));
    assert_eq!(counts.f1(), Ok(1.0));
}

#[test]
fn test_wrong_pitch() {
    let reference = collection(&[(60, 0.0, 1.0)]);
    let detected = collection(&[(61, 0.0, 1.0)]);
    let c = classify(&detected, &reference);

    assert!(c.correct.is_empty());
    assert_eq!(c.incorrect.to_vec(), vec![NoteEvent::new(61, 0.0, 1.0)]);
    assert_eq!(c.missed.to_vec(), vec![NoteEvent::new(60, 0.0, 1.0)]);

    let counts = ClassificationCounts::from(&c);
    assert_eq!(counts.precision(), Ok(0.0));
    assert_eq!(counts.recall(), Ok(0.0));
    assert_eq!(counts.f1(), Ok(0.0));
}

#[test]
fn test_detection_inside_reference() {
    let reference = collection(&[(60, 0.0, 1.0)]);
    let detected = collection(&[(60, 0.2, 0.8)]);

    assert_eq!(classify(&detected, &reference).correct.len(), 1);

    let tw = time_weighted(&detected, &reference);
    assert_close(tw.correct_seconds, 0.6);
    assert_close(tw.overshot_seconds, 0.0);
    assert_close(tw.missed_seconds, 0.4);
}

#[test]
fn test_detection_around_reference() {
    let reference = collection(&[(60, 0.0, 1.0)]);
    let detected = collection(&[(60, -0.1, 1.2)]);

    let tw = time_weighted(&detected, &reference);
    assert_close(tw.correct_seconds, 1.3);
    assert_close(tw.overshot_seconds, 0.3);
    assert_close(tw.missed_seconds, 0.0);
}

#[test]
fn test_time_weighted_mixed_boundaries() {
    let reference = collection(&[(60, 0.0, 1.0), (62, 2.0, 3.0)]);
    let detected = collection(&[(60, 0.25, 1.5), (62, 1.5, 2.5), (64, 2.0, 3.0)]);

    let tw = time_weighted(&detected, &reference);
    assert_close(tw.correct_seconds, 1.25 + 1.0);
    assert_close(tw.missed_seconds, 0.25 + 0.5);
    assert_close(tw.overshot_seconds, 0.5 + 0.5);
}

#[test]
fn test_time_weighted_ignores_unmatched() {
    let reference = collection(&[(60, 0.0, 1.0)]);
    let detected = collection(&[(61, 0.0, 1.0), (60, 1.0, 2.0)]);

    let tw = time_weighted(&detected, &reference);
    assert_eq!(tw, TimeWeighted::default());
}

#[test]
fn test_touching_detection_is_not_a_match() {
    let reference = collection(&[(60, 1.0, 2.0)]);
    let detected = collection(&[(60, 0.0, 1.0), (60, 2.0, 3.0)]);
    let c = classify(&detected, &reference);

    assert!(c.correct.is_empty());
    assert_eq!(c.incorrect.len(), 2);
    assert_eq!(c.missed.len(), 1);
}

#[test]
fn test_every_overlapping_match_counts() {
    let reference = collection(&[(60, 0.0, 1.0)]);
    let detected = collection(&[(60, 0.0, 0.4), (60, 0.5, 1.0), (62, 0.4, 0.5)]);
    let c = classify(&detected, &reference);

    assert_eq!(c.correct.len(), 2);
    assert_eq!(c.incorrect.to_vec(), vec![NoteEvent::new(62, 0.4, 0.5)]);
    assert!(c.missed.is_empty());
}

#[test]
fn test_detection_matching_two_references_is_counted_twice() {
    let reference = collection(&[(60, 0.0, 1.0), (60, 1.0, 2.0)]);
    let detected = collection(&[(60, 0.5, 1.5)]);
    let c = classify(&detected, &reference);

    assert_eq!(c.correct.len(), 2);
    assert!(c.incorrect.is_empty());
    assert!(c.missed.is_empty());
}

#[test]
fn test_correct_and_incorrect_cover_detected() {
    let reference = collection(&[
        (60, 0.0, 0.5),
        (62, 0.5, 1.0),
        (64, 1.0, 1.5),
        (65, 1.5, 2.0),
        (67, 2.0, 3.0),
    ]);
    let detected = collection(&[
        (60, 0.05, 0.45),
        (61, 0.45, 0.55),
        (62, 0.55, 0.95),
        (76, 1.1, 1.4),
        (65, 1.5, 1.9),
        (67, 2.1, 2.2),
        (55, 3.5, 4.0),
    ]);
    let c = classify(&detected, &reference);

    assert_eq!(c.correct.len() + c.incorrect.len(), detected.len());
    assert_eq!(c.correct.len() + c.missed.len(), reference.len());
    assert_eq!(c.missed.to_vec(), vec![NoteEvent::new(64, 1.0, 1.5)]);
    for e in &detected {
        assert!(c.correct.contains(e) != c.incorrect.contains(e), "{e}");
    }
}

#[test]
fn test_classification_ignores_insertion_order() {
    let reference = [(60, 0.0, 0.5), (62, 0.5, 1.0), (64, 1.0, 1.5), (64, 2.0, 2.5)];
    let detected = [(60, 0.1, 0.5), (63, 0.5, 0.7), (62, 0.7, 1.0), (64, 1.4, 2.2), (65, 3.0, 3.5)];

    let expected = classify(&collection(&detected), &collection(&reference));

    let mut reference_rev = reference;
    reference_rev.reverse();
    let mut detected_rot = detected;
    detected_rot.rotate_left(2);

    let actual = classify(&collection(&detected_rot), &collection(&reference_rev));
    assert_eq!(multiset(&actual.correct), multiset(&expected.correct));
    assert_eq!(multiset(&actual.incorrect), multiset(&expected.incorrect));
    assert_eq!(multiset(&actual.missed), multiset(&expected.missed));
}

#[test]
fn test_single_set_functions_agree_with_classify() {
    let reference = collection(&[(60, 0.0, 1.0), (62, 1.0, 2.0), (64, 2.0, 3.0)]);
    let detected = collection(&[(60, 0.0, 1.0), (63, 1.0, 2.0), (64, 2.5, 2.6), (64, 2.6, 3.2)]);
    let c = classify(&detected, &reference);

    assert_eq!(correct_notes(&detected, &reference).to_vec(), c.correct.to_vec());
    assert_eq!(incorrect_notes(&detected, &reference).to_vec(), c.incorrect.to_vec());
    assert_eq!(missed_notes(&detected, &reference).to_vec(), c.missed.to_vec());
}

#[test]
fn test_classify_leaves_inputs_untouched() {
    let reference = collection(&[(62, 1.0, 2.0), (60, 0.0, 1.0)]);
    let detected = collection(&[(61, 0.0, 1.0)]);
    let before = (reference.to_vec(), detected.to_vec());

    let _ = classify(&detected, &reference);
    assert_eq!((reference.to_vec(), detected.to_vec()), before);
}

#[test]
fn test_empty_inputs() {
    let empty = NoteEvents::new();
    let notes = collection(&[(60, 0.0, 1.0)]);

    let c = classify(&empty, &empty);
    assert!(c.correct.is_empty() && c.incorrect.is_empty() && c.missed.is_empty());

    let c = classify(&notes, &empty);
    assert_eq!(c.incorrect.len(), 1);
    let counts = ClassificationCounts::from(&c);
    assert_eq!(counts.precision(), Ok(0.0));
    assert_eq!(
        counts.recall(),
        Err(MetricsError::Undefined { metric: "recall" })
    );
    assert!(counts.f1().is_err());

    let c = classify(&empty, &notes);
    assert_eq!(c.missed.len(), 1);
    let counts = ClassificationCounts::from(&c);
    assert_eq!(
        counts.precision(),
        Err(MetricsError::Undefined {
            metric: "precision"
        })
    );
    assert_eq!(counts.recall(), Ok(0.0));

    assert_eq!(time_weighted(&empty, &notes), TimeWeighted::default());
}

#[test]
fn test_score_functions() {
    assert_eq!(precision(3, 1), Ok(0.75));
    assert_eq!(recall(3, 3), Ok(0.5));
    assert!(precision(0, 0).is_err());
    assert!(recall(0, 0).is_err());
    assert_close(f1_score(0.75, 0.5), 0.6);
    assert_eq!(f1_score(0.0, 0.0), 0.0);
    assert_eq!(f1_score(1.0, 0.0), 0.0);
}

#[test]
fn test_transient_errors_at_reference_onsets() {
    let reference = collection(&[(60, 0.0, 1.0), (62, 1.0, 2.0), (64, 2.0, 3.0)]);
    let detected = collection(&[
        (60, 0.0, 0.95),
        // glitch spanning the 60 -> 62 change
        (61, 0.95, 1.05),
        (62, 1.05, 2.0),
        // sustained error in the middle of 64
        (70, 2.3, 2.8),
        // active at 2.0
        (63, 1.9, 2.1),
    ]);

    let transient = transient_errors(&detected, &reference);
    assert_eq!(
        transient.to_vec(),
        vec![NoteEvent::new(61, 0.95, 1.05), NoteEvent::new(63, 1.9, 2.1)]
    );

    let incorrect = classify(&detected, &reference).incorrect;
    assert_eq!(incorrect.len(), 3);
    for e in &transient {
        assert!(incorrect.contains(e));
    }
}

#[test]
fn test_transient_error_spanning_several_onsets_is_kept_once() {
    let reference = collection(&[(60, 0.0, 1.0), (62, 1.0, 2.0), (64, 2.0, 3.0)]);
    let incorrect = collection(&[(50, 0.5, 2.5), (51, 2.0, 2.0001), (52, 3.0, 4.0)]);

    let transient = filter_transient_errors(&incorrect, &reference);
    assert_eq!(
        transient.to_vec(),
        vec![NoteEvent::new(50, 0.5, 2.5), NoteEvent::new(51, 2.0, 2.0001)]
    );
}

#[test]
fn test_transient_matches_per_onset_union() {
    let reference = collection(&[(60, 0.0, 1.0), (62, 1.0, 2.0), (64, 2.5, 3.0)]);
    let incorrect = collection(&[
        (40, 0.0, 0.1),
        (41, 0.9, 1.0),
        (42, 0.9, 1.1),
        (43, 1.5, 2.6),
        (44, 2.6, 2.7),
    ]);

    let mut union = Vec::new();
    for r in &reference {
        for e in incorrect.events_at(r.onset) {
            if !union.contains(e) {
                union.push(*e);
            }
        }
    }

    let transient = filter_transient_errors(&incorrect, &reference);
    assert_eq!(transient.len(), union.len());
    for e in &union {
        assert!(transient.contains(e));
    }
}

#[test]
fn test_evaluator_report() {
    let reference = collection(&[(60, 0.0, 1.0), (62, 1.0, 2.0)]);
    let detected = collection(&[(60, 0.1, 0.9), (61, 1.0, 1.1)]);

    let evaluation = Evaluator::new().evaluate(&detected, &reference).unwrap();
    assert_eq!(evaluation.counts, ClassificationCounts { correct: 1, incorrect: 1, missed: 1 });
    assert_eq!(evaluation.precision(), Ok(0.5));
    assert_eq!(evaluation.recall(), Ok(0.5));
    assert_eq!(evaluation.f1(), Ok(0.5));
    assert_eq!(evaluation.transient_errors.len(), 1);
    assert_eq!(evaluation.detected_notes, 2);
    assert_eq!(evaluation.reference_notes, 2);
    assert_close(evaluation.detected_duration, 0.9);
    assert_close(evaluation.reference_duration, 2.0);
    assert_close(evaluation.correct_duration(), 0.8);
    assert_close(evaluation.incorrect_duration(), 0.1);
    assert_close(evaluation.missed_duration(), 1.0);
    assert!(evaluation.reference_monophonic);

    let report = evaluation.to_string();
    assert!(report.contains("precision: 0.5000  recall: 0.5000  f1: 0.5000"), "{report}");
    assert!(report.contains("(1 transient)"), "{report}");
}

#[test]
fn test_evaluator_reports_undefined_scores() {
    let reference = collection(&[(60, 0.0, 1.0)]);
    let evaluation = Evaluator::new()
        .evaluate(&NoteEvents::new(), &reference)
        .unwrap();
    assert!(evaluation.to_string().contains("precision: n/a"));
}

#[test]
fn test_evaluator_rejects_polyphonic_reference_when_required() {
    let reference = collection(&[(60, 0.0, 1.0), (64, 0.5, 1.5)]);
    let detected = collection(&[(60, 0.0, 1.0)]);

    let strict = Evaluator::builder().require_monophonic_reference(true).build();
    assert_eq!(
        strict.evaluate(&detected, &reference).unwrap_err(),
        EvaluationError::PolyphonicReference {
            first: NoteEvent::new(60, 0.0, 1.0),
            second: NoteEvent::new(64, 0.5, 1.5),
        }
    );

    let lenient = Evaluator::default().evaluate(&detected, &reference).unwrap();
    assert!(!lenient.reference_monophonic);
    assert_eq!(lenient.counts.missed, 1);
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_classification_matches_sequential() {
    use note_eval::classify_parallel;

    let reference: NoteEvents = (0..500)
        .map(|i| NoteEvent::new(40 + (i % 24), i as f64 * 0.5, i as f64 * 0.5 + 0.5))
        .collect();
    let detected: NoteEvents = (0..700)
        .map(|i| {
            let onset = i as f64 * 0.37;
            NoteEvent::new(40 + (i * 7 % 24), onset, onset + 0.3)
        })
        .collect();

    let sequential = classify(&detected, &reference);
    let parallel = classify_parallel(&detected, &reference);
    assert_eq!(parallel.correct.to_vec(), sequential.correct.to_vec());
    assert_eq!(parallel.incorrect.to_vec(), sequential.incorrect.to_vec());
    assert_eq!(parallel.missed.to_vec(), sequential.missed.to_vec());
}
