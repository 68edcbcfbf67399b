//! Timeline assembly
//!
//! Replays draft events against a rewindable clock, then runs the cleanup
//! passes that turn the draft timeline into the performance timeline.

use std::collections::HashMap;

use crate::error::TimewiseError;
use crate::pitch::resolve_note_pitch;

use super::types::{
    DraftEvent, DraftTimeline, NoteEvent, PlacedNote, RepeatMarker, ResolvedNote, TieType,
    Timeline,
};

const DEFAULT_STAFF: u32 = 1;

/// Position in division units; measures never reset it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Clock(i64);

impl Clock {
    /// Move forward, returning the new position. On overflow the clock stays put.
    pub fn advance(&mut self, duration: i64) -> Option<i64> {
        self.0 = self.0.checked_add(duration)?;
        Some(self.0)
    }

    /// Move back, returning the new position. On overflow the clock stays put.
    pub fn rewind(&mut self, duration: i64) -> Option<i64> {
        self.0 = self.0.checked_sub(duration)?;
        Some(self.0)
    }

    pub fn position(&self) -> i64 {
        self.0
    }
}

fn duration_overflow(measure: usize, duration: i64) -> TimewiseError {
    TimewiseError::InvalidFieldError {
        measure,
        field: "duration".to_string(),
        value: duration.to_string(),
    }
}

/// What the chord protocol needs to remember about the last note
#[derive(Debug, Clone, Copy)]
struct PreviousNote {
    chord: bool,
    duration: i64,
}

/// Replays events in document order into a [`DraftTimeline`]
#[derive(Debug, Default)]
pub struct Assembler {
    clock: Clock,
    previous: Option<PreviousNote>,
    draft: DraftTimeline,
    repeats: Vec<RepeatMarker>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn push(&mut self, event: DraftEvent) -> Result<(), TimewiseError> {
        match event {
            DraftEvent::Repeat(marker) => self.repeats.push(marker),
            DraftEvent::Backup { duration, measure } => self.rewind(duration, measure)?,
            DraftEvent::Forward { duration, measure } => self.advance(duration, measure)?,
            DraftEvent::Note(note) => self.push_note(note)?,
        }
        Ok(())
    }

    fn advance(&mut self, duration: i64, measure: usize) -> Result<(), TimewiseError> {
        self.clock
            .advance(duration)
            .map(drop)
            .ok_or_else(|| duration_overflow(measure, duration))
    }

    fn rewind(&mut self, duration: i64, measure: usize) -> Result<(), TimewiseError> {
        self.clock
            .rewind(duration)
            .map(drop)
            .ok_or_else(|| duration_overflow(measure, duration))
    }

    fn push_note(&mut self, note: NoteEvent) -> Result<(), TimewiseError> {
        let duration = if note.grace {
            0
        } else {
            note.duration.ok_or_else(|| TimewiseError::MissingFieldError {
                measure: note.measure,
                field: "duration".to_string(),
            })?
        };

        let previous_chord = self.previous.map_or(false, |p| p.chord);
        let previous_duration = self.previous.map_or(0, |p| p.duration);

        let measure = note.measure;
        if note.chord && !previous_chord {
            // Land on the timecode of the note that opened the chord
            self.rewind(previous_duration, measure)?;
        } else if !note.chord && previous_chord {
            self.advance(previous_duration, measure)?;
        }

        let chord = note.chord;
        if !note.cue {
            let placed = self.place(note, duration)?;
            self.draft.entry(placed.timecode).or_default().push(placed);
        }

        if !chord {
            self.advance(duration, measure)?;
        }
        self.previous = Some(PreviousNote { chord, duration });
        Ok(())
    }

    fn place(&self, note: NoteEvent, duration: i64) -> Result<PlacedNote, TimewiseError> {
        let pitch = resolve_note_pitch(&note)?;
        Ok(PlacedNote {
            measure: note.measure,
            timecode: self.clock.position(),
            staff: note.staff.unwrap_or(DEFAULT_STAFF),
            duration,
            pitch: pitch.as_ref().map(|p| p.number),
            pitch_label: pitch.map(|p| p.label),
            rest: note.rest,
            grace: note.grace,
            chord: note.chord,
            tie_type: note.tie_type,
            accidental: note.accidental,
            arpeggiate: note.arpeggiate,
            trill: note.trill,
            extra: note.extra,
        })
    }

    /// The draft timeline as replayed, before any cleanup pass
    pub fn into_draft(self) -> (DraftTimeline, Vec<RepeatMarker>) {
        (self.draft, self.repeats)
    }

    /// Run every cleanup pass in order and produce the final timeline.
    pub fn finish(self) -> Result<Timeline, TimewiseError> {
        let (mut draft, repeats) = self.into_draft();

        merge_tie_durations(&mut draft)?;
        drop_tied_continuations(&mut draft);
        remove_rests(&mut draft);
        prune_empty_timecodes(&mut draft);
        strip_chord_flags(&mut draft);
        sort_by_descending_pitch(&mut draft);

        let timewise = draft
            .into_iter()
            .map(|(timecode, notes)| (timecode, notes.into_iter().map(ResolvedNote::from).collect()))
            .collect();
        log::debug!("assembled timeline with {} repeat markers", repeats.len());
        Ok(Timeline { timewise, repeats })
    }
}

/// Replay `events` and return the finished timeline.
pub fn assemble(events: impl IntoIterator<Item = DraftEvent>) -> Result<Timeline, TimewiseError> {
    let mut assembler = Assembler::new();
    for event in events {
        assembler.push(event)?;
    }
    assembler.finish()
}

/// Fold every tie stop/continue duration into the start note of its staff/pitch.
///
/// Starts are addressed by `(timecode, index)` so later passes can still
/// find the merged note.
pub fn merge_tie_durations(draft: &mut DraftTimeline) -> Result<(), TimewiseError> {
    let mut open_ties: HashMap<(u32, Option<i32>), (i64, usize)> = HashMap::new();
    let mut carried: Vec<((i64, usize), i64)> = Vec::new();

    for (&timecode, notes) in draft.iter() {
        for (index, note) in notes.iter().enumerate() {
            let key = (note.staff, note.pitch);
            match note.tie_type {
                None => {}
                Some(TieType::Start) => {
                    open_ties.insert(key, (timecode, index));
                }
                Some(tie_type) => {
                    let start = match tie_type {
                        TieType::Stop => open_ties.remove(&key),
                        _ => open_ties.get(&key).copied(),
                    };
                    let start = start.ok_or_else(|| TimewiseError::TieConsistencyError {
                        measure: note.measure,
                        staff: note.staff,
                        pitch: note.pitch.unwrap_or(0),
                    })?;
                    carried.push((start, note.duration));
                }
            }
        }
    }

    for ((timecode, index), duration) in carried {
        if let Some(start) = draft.get_mut(&timecode).and_then(|notes| notes.get_mut(index)) {
            start.duration = start
                .duration
                .checked_add(duration)
                .ok_or_else(|| duration_overflow(start.measure, duration))?;
        }
    }

    for ((staff, pitch), (timecode, _)) in &open_ties {
        log::warn!(
            "tie started at timecode {} (staff {}, pitch {:?}) never stops",
            timecode,
            staff,
            pitch
        );
    }
    Ok(())
}

/// Drop notes whose duration now lives on their tie start, and clear the start's tie marker.
pub fn drop_tied_continuations(draft: &mut DraftTimeline) {
    for notes in draft.values_mut() {
        notes.retain(|note| !matches!(note.tie_type, Some(TieType::Stop | TieType::Continue)));
        for note in notes.iter_mut() {
            note.tie_type = None;
        }
    }
}

pub fn remove_rests(draft: &mut DraftTimeline) {
    for notes in draft.values_mut() {
        notes.retain(|note| !note.rest);
    }
}

pub fn prune_empty_timecodes(draft: &mut DraftTimeline) {
    let before = draft.len();
    draft.retain(|_, notes| !notes.is_empty());
    log::debug!("pruned {} empty timecodes", before - draft.len());
}

pub fn strip_chord_flags(draft: &mut DraftTimeline) {
    for note in draft.values_mut().flatten() {
        note.chord = false;
    }
}

/// Highest pitch first; equal pitches keep their recorded order.
pub fn sort_by_descending_pitch(draft: &mut DraftTimeline) {
    for notes in draft.values_mut() {
        notes.sort_by_key(|note| std::cmp::Reverse(note.pitch.unwrap_or(0)));
    }
}
