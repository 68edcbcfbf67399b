//! # Score Module
//!
//! Turns normalized MusicXML elements into a performance timeline.
//!
//! ## Purpose
//! A piano practice tool needs to know, for every moment of the piece, which
//! notes start sounding, on which staff and for how long. MusicXML describes
//! this indirectly: notes follow each other in document order, chords are
//! marked on their second and later members, and `<backup>`/`<forward>` move a
//! cursor between voices. This module replays all of that.
//!
//! ## Sub-modules
//! - `segment` - Split the element stream into measures
//! - `events` - Flatten each measure into draft events
//! - `assemble` - Replay events on a clock and clean up the result
//! - `types` - NoteEvent, DraftEvent, ResolvedNote and Timeline
//!
//! ## Pipeline
//! ```text
//! elements -> segment_measures -> extract_events -> Assembler -> Timeline
//! ```
//!
//! ## Example
//! ```rust
//! use timewise::reader::read_elements;
//! use timewise::score::{assemble, extract_events, segment_measures};
//! use timewise::ReaderOptions;
//!
//! let source = r#"<measure number="1">
//!   <note><pitch><step>C</step><octave>4</octave></pitch><duration>2</duration></note>
//!   <note><chord/><pitch><step>E</step><octave>4</octave></pitch><duration>2</duration></note>
//!   <note><pitch><step>G</step><octave>4</octave></pitch><duration>2</duration></note>
//! </measure>"#;
//!
//! let elements = read_elements(source, &ReaderOptions::default()).unwrap();
//! let events = extract_events(&segment_measures(&elements)).unwrap();
//! let timeline = assemble(events).unwrap();
//!
//! let chord: Vec<i32> = timeline.notes_at(0).unwrap().iter().map(|n| n.pitch).collect();
//! assert_eq!(chord, vec![64, 60]);
//! assert_eq!(timeline.notes_at(2).unwrap()[0].pitch_label, "g4");
//! ```
//!
//! ## Chords
//!
//! Every written note advances the clock by its duration, except chord
//! members. When a chord starts, the clock is rewound by the previous note's
//! duration so the new member lands on the same timecode; when it ends, that
//! duration is applied again.
//!
//! ## Ties
//!
//! A tie start absorbs the durations of its stops and continues (matched by
//! staff and pitch), and only the start note remains in the timeline.

mod assemble;
mod events;
mod segment;
mod types;

pub use assemble::{
    assemble, drop_tied_continuations, merge_tie_durations, prune_empty_timecodes, remove_rests,
    sort_by_descending_pitch, strip_chord_flags, Assembler, Clock,
};
pub use events::{extract_events, extract_measure_events, note_from_properties, PropertyBag};
pub use segment::{count_measure_markers, segment_measures, MeasureSlice};
pub use types::{
    DraftEvent, DraftTimeline, NoteEvent, PlacedNote, PropertyValue, RepeatDirection,
    RepeatMarker, ResolvedNote, TieType, Timeline,
};

#[cfg(test)]
mod tests;
