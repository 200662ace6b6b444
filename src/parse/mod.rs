//! Readers producing [`NoteEvents`](crate::NoteEvents) from annotation and
//! detector output files.

use thiserror::Error;

/// Ground-truth annotations stored as XML.
pub mod annotations;

/// Frame-wise detector results stored as JSON.
pub mod detector;

pub use annotations::{annotations_from_path, annotations_from_str};
pub use detector::{detections_from_path, detections_from_str};

/// Errors returned while reading note events.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The file could not be read.
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not well-formed XML.
    #[error("invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),

    /// The document is not valid JSON for the expected layout.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// An annotation file must hold exactly one `<transcription>` element.
    #[error("found {found} transcription tags instead of 1")]
    TranscriptionCount {
        /// Number of `<transcription>` elements found.
        found: usize,
    },

    /// A required element or field is absent.
    #[error("missing `{element}` in note {index}")]
    MissingElement {
        /// Name of the missing element or field.
        element: &'static str,
        /// Position of the offending note in the input.
        index: usize,
    },

    /// A required element appears more than once in the same note.
    #[error("`{element}` appears more than once in note {index}")]
    DuplicateElement {
        /// Name of the repeated element.
        element: &'static str,
        /// Position of the offending note in the input.
        index: usize,
    },

    /// An element holds text that could not be interpreted.
    #[error("invalid value {value:?} for `{element}`: {msg}")]
    InvalidValue {
        /// Name of the element or field.
        element: &'static str,
        /// The offending text.
        value: String,
        /// What was wrong with it.
        msg: String,
    },

    /// A note does not end after it starts.
    #[error("note {index} has onset {onset} not before offset {offset}")]
    InvalidInterval {
        /// Position of the offending note in the input; for detector results,
        /// the frame that opened it.
        index: usize,
        /// Parsed onset in seconds.
        onset: f64,
        /// Parsed offset in seconds.
        offset: f64,
    },
}
