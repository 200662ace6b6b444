//! Annotation XML reader.
//!
//! Expected layout:
//!
//! ```xml
//! <instrumentRecording>
//!   <transcription>
//!     <event>
//!       <pitch>60</pitch>
//!       <onsetSec>0.25</onsetSec>
//!       <offsetSec>0.75</offsetSec>
//!     </event>
//!   </transcription>
//! </instrumentRecording>
//! ```

use std::{cmp::Ordering, fs, path::Path, str::FromStr};

use log::debug;
use roxmltree::{Document, Node};

use super::ParseError;
use crate::note_events::NoteEvents;

/// Read annotations from an XML file.
pub fn annotations_from_path<P: AsRef<Path>>(path: P) -> Result<NoteEvents, ParseError> {
    let text = fs::read_to_string(path.as_ref())?;
    let notes = annotations_from_str(&text)?;
    debug!(
        "read {} annotated notes from {}",
        notes.len(),
        path.as_ref().display()
    );
    Ok(notes)
}

/// Read annotations from an XML document.
///
/// The root element must have exactly one `<transcription>` child; each
/// element inside it is a note with exactly one each of `<pitch>`, `<onsetSec>`
/// and `<offsetSec>`.
pub fn annotations_from_str(xml: &str) -> Result<NoteEvents, ParseError> {
    let doc = Document::parse(xml)?;

    let transcriptions: Vec<Node<'_, '_>> = doc
        .root_element()
        .children()
        .filter(|n| n.has_tag_name("transcription"))
        .collect();
    let transcription = match transcriptions.as_slice() {
        [only] => *only,
        other => return Err(ParseError::TranscriptionCount { found: other.len() }),
    };

    let mut notes = NoteEvents::new();
    for (index, event) in transcription.children().filter(Node::is_element).enumerate() {
        let pitch: i32 = child_value(event, "pitch", index)?;
        let onset: f64 = child_value(event, "onsetSec", index)?;
        let offset: f64 = child_value(event, "offsetSec", index)?;

        if onset.partial_cmp(&offset) != Some(Ordering::Less) {
            return Err(ParseError::InvalidInterval {
                index,
                onset,
                offset,
            });
        }
        notes.add(pitch, onset, offset);
    }

    Ok(notes)
}

fn child_value<T>(event: Node<'_, '_>, element: &'static str, index: usize) -> Result<T, ParseError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let mut matches = event.children().filter(|n| n.has_tag_name(element));
    let node = matches
        .next()
        .ok_or(ParseError::MissingElement { element, index })?;
    if matches.next().is_some() {
        return Err(ParseError::DuplicateElement { element, index });
    }
    let text = node
        .text()
        .ok_or(ParseError::MissingElement { element, index })?
        .trim();

    text.parse().map_err(|e: T::Err| ParseError::InvalidValue {
        element,
        value: text.to_string(),
        msg: e.to_string(),
    })
}
