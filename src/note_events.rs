//! Note Events
//!
//! Pitched half-open time intervals, and an onset-ordered collection of them
//! supporting the interval queries the evaluator is built on.

use std::{
    fmt::{self, Display},
    iter::FusedIterator,
    ops::Index,
    sync::OnceLock,
};

use crate::stats::Accumulator;

/// A single pitched note spanning `[onset, offset)` seconds.
///
/// Equality is structural: two events are equal when pitch, onset and offset
/// all compare equal.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct NoteEvent {
    /// Pitch identifier, usually a MIDI note number.
    pub pitch: i32,
    /// Start of the note in seconds (inclusive).
    pub onset: f64,
    /// End of the note in seconds (exclusive).
    pub offset: f64,
}

impl NoteEvent {
    /// Create a note event.
    ///
    /// `onset < offset` is expected but not checked; the file readers reject
    /// empty intervals before they get here.
    pub const fn new(pitch: i32, onset: f64, offset: f64) -> Self {
        NoteEvent {
            pitch,
            onset,
            offset,
        }
    }

    /// Length of the note in seconds.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.offset - self.onset
    }

    /// True if `timepoint` lies inside `[onset, offset)`.
    #[inline]
    pub fn is_active_at(&self, timepoint: f64) -> bool {
        self.onset <= timepoint && timepoint < self.offset
    }

    /// True if the two notes share any time. Touching endpoints do not overlap.
    #[inline]
    pub fn overlaps(&self, other: &NoteEvent) -> bool {
        !(self.onset >= other.offset || self.offset <= other.onset)
    }
}

impl Display for NoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{pitch: {}, onset: {}, offset: {}}}",
            self.pitch, self.onset, self.offset
        )
    }
}

/// Ordered multiset of note events.
///
/// Events are kept in insertion order and viewed through an onset ordering
/// that is computed on the first read after a mutation and cached until the
/// next one. All reads take `&self`, so a collection can be shared freely
/// (including across threads) once it has been built.
///
/// ```rust
/// use note_eval::NoteEvents;
///
/// let mut notes = NoteEvents::new();
/// notes.add(62, 1.0, 1.5);
/// notes.add(60, 0.0, 1.0);
///
/// assert_eq!(notes[0].pitch, 60);
/// assert_eq!(notes.events_at(1.2).count(), 1);
/// assert!(notes.is_monophonic());
/// ```
#[derive(Debug, Clone, Default)]
pub struct NoteEvents {
    events: Vec<NoteEvent>,
    // Indices into `events` sorted by onset; unset while dirty.
    order: OnceLock<Vec<usize>>,
}

impl NoteEvents {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new event.
    pub fn add(&mut self, pitch: i32, onset: f64, offset: f64) {
        self.push(NoteEvent::new(pitch, onset, offset));
    }

    /// Append a copy of an existing event.
    pub fn add_copy(&mut self, event: &NoteEvent) {
        self.push(*event);
    }

    /// Append copies of every event in `events`.
    pub fn add_copy_all<'a, I>(&mut self, events: I)
    where
        I: IntoIterator<Item = &'a NoteEvent>,
    {
        self.events.extend(events.into_iter().copied());
        self.order.take();
    }

    fn push(&mut self, event: NoteEvent) {
        self.events.push(event);
        self.order.take();
    }

    /// Make sure the cached onset ordering is current.
    ///
    /// The sort is stable, so events sharing an onset keep their insertion
    /// order. Every other read calls this implicitly.
    pub fn ensure_sorted(&self) {
        self.order();
    }

    fn order(&self) -> &[usize] {
        self.order.get_or_init(|| {
            let mut order: Vec<usize> = (0..self.events.len()).collect();
            if order.len() > 1 {
                order.sort_by(|&a, &b| self.events[a].onset.total_cmp(&self.events[b].onset));
            }
            order
        })
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if the collection holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Event at `index` in onset order, or `None` when out of bounds.
    pub fn get(&self, index: usize) -> Option<&NoteEvent> {
        self.order().get(index).map(|&i| &self.events[i])
    }

    /// Iterate over the events in onset order.
    pub fn iter(&self) -> Iter<'_> {
        self.iter_from(0)
    }

    fn iter_from(&self, start: usize) -> Iter<'_> {
        let order = self.order();
        Iter {
            events: &self.events,
            order: order[start.min(order.len())..].iter(),
        }
    }

    // Position of the first event whose onset is not before `time`.
    fn first_onset_at_or_after(&self, time: f64) -> usize {
        self.order()
            .partition_point(|&i| self.events[i].onset < time)
    }

    /// Copy the events out in onset order.
    pub fn to_vec(&self) -> Vec<NoteEvent> {
        self.iter().copied().collect()
    }

    /// Sum of the durations of all events, in seconds.
    pub fn total_duration(&self) -> f64 {
        let mut acc = Accumulator::default();
        acc.extend(self.events.iter().map(NoteEvent::duration));
        acc.total()
    }

    /// Events active at `timepoint`, i.e. `onset <= timepoint < offset`.
    pub fn events_at(&self, timepoint: f64) -> impl Iterator<Item = &NoteEvent> + '_ {
        self.iter()
            .take_while(move |e| e.onset <= timepoint)
            .filter(move |e| timepoint < e.offset)
    }

    /// Events sharing any time with `[start, stop]`.
    ///
    /// Events that end at or before `start`, or begin at or after `stop`, are
    /// excluded.
    pub fn events_overlapping(
        &self,
        start: f64,
        stop: f64,
    ) -> impl Iterator<Item = &NoteEvent> + '_ {
        self.iter()
            .take_while(move |e| e.onset < stop)
            .filter(move |e| e.offset > start)
    }

    /// Events lying entirely inside `[start, stop]`, bounds inclusive.
    pub fn events_fully_within(
        &self,
        start: f64,
        stop: f64,
    ) -> impl Iterator<Item = &NoteEvent> + '_ {
        self.iter_from(self.first_onset_at_or_after(start))
            .take_while(move |e| e.onset <= stop)
            .filter(move |e| e.offset <= stop)
    }

    /// Structural membership test.
    pub fn contains(&self, event: &NoteEvent) -> bool {
        self.iter_from(self.first_onset_at_or_after(event.onset))
            .take_while(|e| e.onset <= event.onset)
            .any(|e| e == event)
    }

    /// First pair of distinct events that overlap in time, in onset order.
    ///
    /// Sweeps once over the sorted events, checking each against the earlier
    /// event reaching furthest right.
    pub fn first_overlap(&self) -> Option<(NoteEvent, NoteEvent)> {
        let mut reach: Option<&NoteEvent> = None;
        for event in self {
            if let Some(prev) = reach {
                if prev.overlaps(event) {
                    return Some((*prev, *event));
                }
                if event.offset <= prev.offset {
                    continue;
                }
            }
            reach = Some(event);
        }
        None
    }

    /// True if no two events overlap in time.
    pub fn is_monophonic(&self) -> bool {
        self.first_overlap().is_none()
    }

    /// True if at least two events overlap in time.
    pub fn is_polyphonic(&self) -> bool {
        !self.is_monophonic()
    }
}

impl Index<usize> for NoteEvents {
    type Output = NoteEvent;

    fn index(&self, index: usize) -> &NoteEvent {
        &self.events[self.order()[index]]
    }
}

impl FromIterator<NoteEvent> for NoteEvents {
    fn from_iter<I: IntoIterator<Item = NoteEvent>>(iter: I) -> Self {
        NoteEvents {
            events: iter.into_iter().collect(),
            order: OnceLock::new(),
        }
    }
}

impl Extend<NoteEvent> for NoteEvents {
    fn extend<I: IntoIterator<Item = NoteEvent>>(&mut self, iter: I) {
        self.events.extend(iter);
        self.order.take();
    }
}

impl<'a> IntoIterator for &'a NoteEvents {
    type Item = &'a NoteEvent;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl Display for NoteEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, event) in self.iter().enumerate() {
            if i > 0 {
                writeln!(f, ",")?;
            }
            write!(f, "{event}")?;
        }
        write!(f, "]")
    }
}

/// Onset-ordered iterator over a [`NoteEvents`] collection.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    events: &'a [NoteEvent],
    order: std::slice::Iter<'a, usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a NoteEvent;

    fn next(&mut self) -> Option<&'a NoteEvent> {
        self.order.next().map(|&i| &self.events[i])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.order.size_hint()
    }

    fn nth(&mut self, n: usize) -> Option<&'a NoteEvent> {
        self.order.nth(n).map(|&i| &self.events[i])
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.order.next_back().map(|&i| &self.events[i])
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl FusedIterator for Iter<'_> {}
