//! Score event and timeline type definitions

use std::collections::BTreeMap;
use std::ops::Bound::{Excluded, Unbounded};

use serde::Serialize;

use crate::pitch::PitchStep;
use crate::reader::ScalarValue;

/// A flattened note property: one value, or several when an attribute recurs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Scalar(ScalarValue),
    List(Vec<ScalarValue>),
}

impl PropertyValue {
    pub fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            PropertyValue::Scalar(value) => Some(value),
            PropertyValue::List(_) => None,
        }
    }
}

/// Tie role of a note
///
/// A tie extends one pitch's sounding duration across several written notes.
/// Only the `Start` note survives into the timeline, carrying the summed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieType {
    Start,
    Stop,
    /// Ends one tie and starts the next on the same note
    Continue,
}

impl TieType {
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim() {
            "start" => Some(TieType::Start),
            "stop" => Some(TieType::Stop),
            "continue" => Some(TieType::Continue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatDirection {
    Forward,
    Backward,
}

/// A repeat barline, captured but never expanded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepeatMarker {
    pub direction: RepeatDirection,
    pub measure: usize,
}

/// A `<note>` flattened into named fields
///
/// Properties without a dedicated field are kept in `extra` under their
/// flattened camelCase key (e.g. `mordent`, `noteheadParentheses`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NoteEvent {
    pub measure: usize,
    pub staff: Option<u32>,
    pub duration: Option<i64>,
    pub step: Option<PitchStep>,
    pub alter: Option<f64>,
    pub octave: Option<i32>,
    pub rest: bool,
    pub grace: bool,
    pub chord: bool,
    pub cue: bool,
    pub tie_type: Option<TieType>,
    pub accidental: Option<String>,
    pub arpeggiate: bool,
    pub trill: bool,
    pub extra: BTreeMap<String, PropertyValue>,
}

impl NoteEvent {
    pub fn new(measure: usize) -> Self {
        Self {
            measure,
            ..Self::default()
        }
    }
}

/// One musical event, in document order
///
/// Order is the only signal for chord grouping, tie resolution and clock replay.
#[derive(Debug, Clone, PartialEq)]
pub enum DraftEvent {
    Repeat(RepeatMarker),
    Note(NoteEvent),
    Forward { duration: i64, measure: usize },
    Backup { duration: i64, measure: usize },
}

/// A note recorded in the draft timeline, still carrying rest/chord/tie bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedNote {
    pub measure: usize,
    pub timecode: i64,
    pub staff: u32,
    pub duration: i64,
    pub pitch: Option<i32>,
    pub pitch_label: Option<String>,
    pub rest: bool,
    pub grace: bool,
    pub chord: bool,
    pub tie_type: Option<TieType>,
    pub accidental: Option<String>,
    pub arpeggiate: bool,
    pub trill: bool,
    pub extra: BTreeMap<String, PropertyValue>,
}

/// Timecode -> notes, addressed by `(timecode, index)` during the post-assembly passes
pub type DraftTimeline = BTreeMap<i64, Vec<PlacedNote>>;

fn is_false(b: &bool) -> bool {
    !*b
}

/// A note as handed to the performance layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedNote {
    pub pitch: i32,
    pub pitch_label: String,
    pub duration: i64,
    pub staff: u32,
    pub measure: usize,
    pub timecode: i64,
    #[serde(skip_serializing_if = "is_false")]
    pub grace: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub arpeggiate: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub trill: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accidental: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, PropertyValue>,
}

impl From<PlacedNote> for ResolvedNote {
    fn from(note: PlacedNote) -> Self {
        Self {
            pitch: note.pitch.unwrap_or(0),
            pitch_label: note.pitch_label.unwrap_or_default(),
            duration: note.duration,
            staff: note.staff,
            measure: note.measure,
            timecode: note.timecode,
            grace: note.grace,
            arpeggiate: note.arpeggiate,
            trill: note.trill,
            accidental: note.accidental,
            extra: note.extra,
        }
    }
}

/// The performance timeline: timecode -> notes that begin sounding there
///
/// Invariants: every timecode has at least one note, notes within a
/// timecode are ordered by descending pitch, and no rest survives.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Timeline {
    pub timewise: BTreeMap<i64, Vec<ResolvedNote>>,
    pub repeats: Vec<RepeatMarker>,
}

impl Timeline {
    pub fn notes_at(&self, timecode: i64) -> Option<&[ResolvedNote]> {
        self.timewise.get(&timecode).map(Vec::as_slice)
    }

    pub fn timecodes(&self) -> impl Iterator<Item = i64> + '_ {
        self.timewise.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, &[ResolvedNote])> + '_ {
        self.timewise.iter().map(|(t, notes)| (*t, notes.as_slice()))
    }

    /// The first timecode strictly after `timecode`, for advancing a performance cursor
    pub fn next_timecode_after(&self, timecode: i64) -> Option<i64> {
        self.timewise
            .range((Excluded(timecode), Unbounded))
            .next()
            .map(|(t, _)| *t)
    }

    pub fn len(&self) -> usize {
        self.timewise.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timewise.is_empty()
    }

    pub fn repeats(&self) -> &[RepeatMarker] {
        &self.repeats
    }
}
