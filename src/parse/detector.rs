//! Detector results JSON reader.
//!
//! The detector reports one entry per analysed frame, each carrying the
//! detected MIDI number (or `null` for silence) and the frame's position in
//! samples. Consecutive frames of the same pitch are joined into notes.

use std::{collections::BTreeMap, fs, path::Path};

use log::{debug, warn};
use serde::Deserialize;

use super::ParseError;
use crate::note_events::NoteEvents;

#[derive(Debug, Deserialize)]
struct DetectorResults {
    #[serde(rename = "Sample rate (Hz)")]
    sample_rate: f64,
    #[serde(rename = "note events")]
    frames: Vec<Frame>,
}

#[derive(Debug, Deserialize)]
struct Frame {
    midi_number: Option<i32>,
    #[serde(rename = "note_start (samples)", default)]
    start: Option<u64>,
    #[serde(rename = "note_duration (samples)", default)]
    duration: Option<u64>,
}

/// A note still being extended by incoming frames, in samples.
#[derive(Debug, Copy, Clone)]
struct Ongoing {
    start: u64,
    end: u64,
    // index of the frame that opened the note
    frame: usize,
}

/// Read detector results from a JSON file.
pub fn detections_from_path<P: AsRef<Path>>(path: P) -> Result<NoteEvents, ParseError> {
    let text = fs::read_to_string(path.as_ref())?;
    let notes = detections_from_str(&text)?;
    debug!(
        "read {} detected notes from {}",
        notes.len(),
        path.as_ref().display()
    );
    Ok(notes)
}

/// Read detector results from a JSON document and join frames into notes.
///
/// - a `null` frame ends every ongoing note;
/// - a frame continuing an ongoing pitch exactly where it ends extends it;
/// - a frame starting before the ongoing note of its pitch ends is merged
///   into it (the note then covers both, even if the frame starts earlier),
///   with a warning;
/// - a frame starting after a gap ends the ongoing note and starts a new one.
///
/// Notes still ongoing after the last frame are ended there.
pub fn detections_from_str(json: &str) -> Result<NoteEvents, ParseError> {
    let results: DetectorResults = serde_json::from_str(json)?;
    let sample_rate = results.sample_rate;
    if !(sample_rate.is_finite() && sample_rate > 0.0) {
        return Err(ParseError::InvalidValue {
            element: "Sample rate (Hz)",
            value: sample_rate.to_string(),
            msg: "must be a positive number".to_string(),
        });
    }

    let mut notes = NoteEvents::new();
    let mut ongoing: BTreeMap<i32, Ongoing> = BTreeMap::new();
    let flush = |notes: &mut NoteEvents, pitch: i32, note: Ongoing| -> Result<(), ParseError> {
        let onset = note.start as f64 / sample_rate;
        let offset = note.end as f64 / sample_rate;
        if note.end <= note.start {
            return Err(ParseError::InvalidInterval {
                index: note.frame,
                onset,
                offset,
            });
        }
        notes.add(pitch, onset, offset);
        Ok(())
    };

    for (index, frame) in results.frames.iter().enumerate() {
        let Some(pitch) = frame.midi_number else {
            for (pitch, note) in std::mem::take(&mut ongoing) {
                flush(&mut notes, pitch, note)?;
            }
            continue;
        };

        let start = frame.start.ok_or(ParseError::MissingElement {
            element: "note_start (samples)",
            index,
        })?;
        let duration = frame.duration.ok_or(ParseError::MissingElement {
            element: "note_duration (samples)",
            index,
        })?;
        let end = start
            .checked_add(duration)
            .ok_or_else(|| ParseError::InvalidValue {
                element: "note_duration (samples)",
                value: duration.to_string(),
                msg: format!("note starting at sample {start} ends past the sample range"),
            })?;

        match ongoing.get_mut(&pitch) {
            Some(note) if note.end == start => note.end = end,
            Some(note) if note.end > start => {
                warn!(
                    "overlapping frames for pitch {pitch}: merging [{}, {}] and [{}, {}] (samples)",
                    note.start, note.end, start, end
                );
                note.start = note.start.min(start);
                note.end = note.end.max(end);
            }
            Some(note) => {
                let finished = std::mem::replace(
                    note,
                    Ongoing {
                        start,
                        end,
                        frame: index,
                    },
                );
                flush(&mut notes, pitch, finished)?;
            }
            None => {
                ongoing.insert(
                    pitch,
                    Ongoing {
                        start,
                        end,
                        frame: index,
                    },
                );
            }
        }
    }

    for (pitch, note) in ongoing {
        flush(&mut notes, pitch, note)?;
    }

    Ok(notes)
}
