use super::*;
use crate::pitch::{pitch_number, PitchStep};
use crate::reader::read_elements;
use crate::{ReaderOptions, TimewiseError};

fn note(step: PitchStep, octave: i32, duration: i64) -> NoteEvent {
    NoteEvent {
        step: Some(step),
        octave: Some(octave),
        duration: Some(duration),
        ..NoteEvent::new(1)
    }
}

fn chord_note(step: PitchStep, octave: i32, duration: i64) -> NoteEvent {
    NoteEvent {
        chord: true,
        ..note(step, octave, duration)
    }
}

fn tied(tie_type: TieType, event: NoteEvent) -> NoteEvent {
    NoteEvent {
        tie_type: Some(tie_type),
        ..event
    }
}

fn rest(duration: i64) -> NoteEvent {
    NoteEvent {
        rest: true,
        duration: Some(duration),
        ..NoteEvent::new(1)
    }
}

fn timeline_of(events: Vec<NoteEvent>) -> Timeline {
    assemble(events.into_iter().map(DraftEvent::Note)).unwrap()
}

fn pitches_at(timeline: &Timeline, timecode: i64) -> Vec<i32> {
    timeline
        .notes_at(timecode)
        .map(|notes| notes.iter().map(|n| n.pitch).collect())
        .unwrap_or_default()
}

fn draft_of(events: Vec<NoteEvent>) -> DraftTimeline {
    let mut assembler = Assembler::new();
    for event in events {
        assembler.push(DraftEvent::Note(event)).unwrap();
    }
    assembler.into_draft().0
}

#[test]
fn test_sequential_notes_advance_clock() {
    let timeline = timeline_of(vec![
        note(PitchStep::C, 4, 4),
        note(PitchStep::D, 4, 2),
        note(PitchStep::E, 4, 2),
    ]);
    let timecodes: Vec<i64> = timeline.timecodes().collect();
    assert_eq!(timecodes, vec![0, 4, 6]);
    assert_eq!(pitches_at(&timeline, 4), vec![62]);
}

#[test]
fn test_two_note_chord_shares_timecode() {
    let timeline = timeline_of(vec![
        note(PitchStep::C, 4, 4),
        chord_note(PitchStep::E, 4, 4),
        note(PitchStep::G, 4, 2),
    ]);
    assert_eq!(pitches_at(&timeline, 0), vec![64, 60]);
    // The note after the chord lands at start + D1
    assert_eq!(pitches_at(&timeline, 4), vec![67]);
    assert_eq!(timeline.len(), 2);
}

#[test]
fn test_three_note_chord() {
    let timeline = timeline_of(vec![
        note(PitchStep::C, 3, 8),
        chord_note(PitchStep::G, 3, 8),
        chord_note(PitchStep::E, 4, 8),
        note(PitchStep::F, 4, 8),
    ]);
    assert_eq!(pitches_at(&timeline, 0), vec![64, 55, 48]);
    assert_eq!(pitches_at(&timeline, 8), vec![65]);
}

#[test]
fn test_document_ending_mid_chord() {
    let mut assembler = Assembler::new();
    assembler.push(DraftEvent::Note(note(PitchStep::C, 4, 4))).unwrap();
    assembler.push(DraftEvent::Note(chord_note(PitchStep::E, 4, 4))).unwrap();
    // The last member's deferred advance is never applied
    assert_eq!(assembler.clock().position(), 0);
}

#[test]
fn test_chord_after_backup_rewinds_from_previous_note() {
    let mut assembler = Assembler::new();
    let events = vec![
        DraftEvent::Note(note(PitchStep::C, 5, 4)),
        DraftEvent::Backup { duration: 4, measure: 1 },
        DraftEvent::Note(NoteEvent {
            staff: Some(2),
            ..note(PitchStep::C, 3, 4)
        }),
        DraftEvent::Note(NoteEvent {
            staff: Some(2),
            ..chord_note(PitchStep::G, 3, 4)
        }),
    ];
    for event in events {
        assembler.push(event).unwrap();
    }
    let timeline = assembler.finish().unwrap();
    assert_eq!(pitches_at(&timeline, 0), vec![72, 55, 48]);
    let staves: Vec<u32> = timeline.notes_at(0).unwrap().iter().map(|n| n.staff).collect();
    assert_eq!(staves, vec![1, 2, 2]);
}

#[test]
fn test_tie_merges_durations() {
    let timeline = timeline_of(vec![
        tied(TieType::Start, note(PitchStep::A, 4, 4)),
        tied(TieType::Stop, note(PitchStep::A, 4, 2)),
        note(PitchStep::B, 4, 2),
    ]);
    let notes = timeline.notes_at(0).unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].duration, 6);
    // The stop note at 4 is gone; the next note keeps its own timecode
    assert!(timeline.notes_at(4).is_none());
    assert_eq!(pitches_at(&timeline, 6), vec![71]);
}

#[test]
fn test_tie_chain_through_continue() {
    let timeline = timeline_of(vec![
        tied(TieType::Start, note(PitchStep::D, 4, 4)),
        tied(TieType::Continue, note(PitchStep::D, 4, 4)),
        tied(TieType::Stop, note(PitchStep::D, 4, 1)),
    ]);
    assert_eq!(timeline.len(), 1);
    assert_eq!(timeline.notes_at(0).unwrap()[0].duration, 9);
}

#[test]
fn test_ties_are_matched_per_staff() {
    let timeline = timeline_of(vec![
        tied(TieType::Start, note(PitchStep::C, 4, 4)),
        NoteEvent {
            staff: Some(2),
            ..tied(TieType::Start, note(PitchStep::C, 4, 4))
        },
        tied(TieType::Stop, note(PitchStep::C, 4, 4)),
        NoteEvent {
            staff: Some(2),
            ..tied(TieType::Stop, note(PitchStep::C, 4, 8))
        },
    ]);
    let durations: Vec<(u32, i64)> = timeline
        .iter()
        .flat_map(|(_, notes)| notes.iter().map(|n| (n.staff, n.duration)))
        .collect();
    assert_eq!(durations, vec![(1, 8), (2, 12)]);
}

#[test]
fn test_tie_stop_without_start_is_error() {
    let result = assemble(vec![
        DraftEvent::Note(note(PitchStep::C, 4, 4)),
        DraftEvent::Note(tied(TieType::Stop, note(PitchStep::D, 4, 4))),
    ]);
    assert_eq!(
        result,
        Err(TimewiseError::TieConsistencyError {
            measure: 1,
            staff: 1,
            pitch: 62
        })
    );
}

#[test]
fn test_tie_continue_without_start_is_error() {
    let result = assemble(vec![
        DraftEvent::Note(tied(TieType::Start, note(PitchStep::C, 4, 4))),
        DraftEvent::Note(tied(TieType::Continue, note(PitchStep::E, 4, 4))),
    ]);
    assert_eq!(
        result,
        Err(TimewiseError::TieConsistencyError {
            measure: 1,
            staff: 1,
            pitch: 64
        })
    );
}

#[test]
fn test_continues_keep_the_tie_open() {
    let timeline = timeline_of(vec![
        tied(TieType::Start, note(PitchStep::G, 3, 2)),
        tied(TieType::Continue, note(PitchStep::G, 3, 4)),
        tied(TieType::Continue, note(PitchStep::G, 3, 8)),
        tied(TieType::Stop, note(PitchStep::G, 3, 1)),
        note(PitchStep::A, 3, 1),
    ]);
    let timecodes: Vec<i64> = timeline.timecodes().collect();
    assert_eq!(timecodes, vec![0, 15]);
    assert_eq!(timeline.notes_at(0).unwrap()[0].duration, 15);
    assert_eq!(pitches_at(&timeline, 15), vec![57]);
}

#[test]
fn test_tie_stop_closes_the_tie() {
    let result = assemble(vec![
        DraftEvent::Note(tied(TieType::Start, note(PitchStep::G, 3, 2))),
        DraftEvent::Note(tied(TieType::Stop, note(PitchStep::G, 3, 2))),
        DraftEvent::Note(tied(TieType::Continue, note(PitchStep::G, 3, 2))),
    ]);
    assert!(matches!(result, Err(TimewiseError::TieConsistencyError { pitch: 55, .. })));
}

#[test]
fn test_tie_merge_overflow_is_error() {
    let mut assembler = Assembler::new();
    let events = vec![
        DraftEvent::Note(tied(TieType::Start, note(PitchStep::C, 4, i64::MAX))),
        DraftEvent::Backup { duration: i64::MAX, measure: 1 },
        DraftEvent::Note(tied(TieType::Stop, note(PitchStep::C, 4, 1))),
    ];
    for event in events {
        assembler.push(event).unwrap();
    }
    assert_eq!(
        assembler.finish(),
        Err(TimewiseError::InvalidFieldError {
            measure: 1,
            field: "duration".to_string(),
            value: "1".to_string()
        })
    );
}

#[test]
fn test_clock_overflow_from_notes_is_error() {
    let result = assemble(vec![
        DraftEvent::Note(note(PitchStep::C, 4, i64::MAX)),
        DraftEvent::Note(note(PitchStep::D, 4, 1)),
    ]);
    assert!(matches!(
        result,
        Err(TimewiseError::InvalidFieldError { ref field, .. }) if field == "duration"
    ));
}

#[test]
fn test_unresolved_tie_keeps_its_duration() {
    let timeline = timeline_of(vec![
        tied(TieType::Start, note(PitchStep::E, 4, 4)),
        note(PitchStep::F, 4, 4),
    ]);
    assert_eq!(timeline.notes_at(0).unwrap()[0].duration, 4);
    assert_eq!(timeline.len(), 2);
}

#[test]
fn test_rest_only_measures_vanish() {
    let timeline = timeline_of(vec![rest(4), rest(4), note(PitchStep::C, 4, 4)]);
    let timecodes: Vec<i64> = timeline.timecodes().collect();
    assert_eq!(timecodes, vec![8]);
}

#[test]
fn test_rest_without_pitch_needs_no_step() {
    let timeline = timeline_of(vec![rest(2)]);
    assert!(timeline.is_empty());
}

#[test]
fn test_cue_notes_are_not_recorded_but_move_the_clock() {
    let timeline = timeline_of(vec![
        NoteEvent {
            cue: true,
            ..note(PitchStep::C, 4, 4)
        },
        note(PitchStep::D, 4, 4),
    ]);
    assert_eq!(timeline.len(), 1);
    assert_eq!(pitches_at(&timeline, 4), vec![62]);
}

#[test]
fn test_grace_notes_have_no_duration() {
    let timeline = timeline_of(vec![
        NoteEvent {
            grace: true,
            duration: None,
            ..note(PitchStep::B, 4, 0)
        },
        note(PitchStep::C, 5, 4),
    ]);
    let notes = timeline.notes_at(0).unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].pitch, 72);
    assert_eq!(notes[1].duration, 0);
    assert!(notes[1].grace);
}

#[test]
fn test_grace_note_ignores_stated_duration() {
    let timeline = timeline_of(vec![
        NoteEvent {
            grace: true,
            ..note(PitchStep::B, 4, 8)
        },
        note(PitchStep::C, 5, 4),
    ]);
    assert_eq!(timeline.notes_at(0).unwrap().len(), 2);
}

#[test]
fn test_forward_moves_clock() {
    let mut assembler = Assembler::new();
    assembler.push(DraftEvent::Forward { duration: 8, measure: 1 }).unwrap();
    assembler.push(DraftEvent::Note(note(PitchStep::C, 4, 4))).unwrap();
    let timeline = assembler.finish().unwrap();
    assert_eq!(pitches_at(&timeline, 8), vec![60]);
}

#[test]
fn test_repeats_are_collected_without_moving_clock() {
    let mut assembler = Assembler::new();
    let marker = RepeatMarker {
        direction: RepeatDirection::Backward,
        measure: 2,
    };
    assembler.push(DraftEvent::Repeat(marker.clone())).unwrap();
    assert_eq!(assembler.clock().position(), 0);
    let timeline = assembler.finish().unwrap();
    assert_eq!(timeline.repeats(), &[marker]);
    assert!(timeline.is_empty());
}

#[test]
fn test_sounding_note_without_step_is_error() {
    let result = assemble(vec![DraftEvent::Note(NoteEvent {
        octave: Some(4),
        duration: Some(4),
        ..NoteEvent::new(7)
    })]);
    assert_eq!(
        result,
        Err(TimewiseError::MissingFieldError {
            measure: 7,
            field: "step".to_string()
        })
    );
}

#[test]
fn test_cleanup_passes_are_idempotent() {
    let mut draft = draft_of(vec![
        note(PitchStep::C, 4, 4),
        chord_note(PitchStep::G, 4, 4),
        chord_note(PitchStep::E, 4, 4),
        rest(4),
        rest(4),
        note(PitchStep::D, 4, 4),
    ]);
    remove_rests(&mut draft);
    prune_empty_timecodes(&mut draft);
    sort_by_descending_pitch(&mut draft);
    let once = draft.clone();

    remove_rests(&mut draft);
    prune_empty_timecodes(&mut draft);
    sort_by_descending_pitch(&mut draft);
    assert_eq!(draft, once);

    let pitches: Vec<Option<i32>> = once[&0].iter().map(|n| n.pitch).collect();
    assert_eq!(pitches, vec![Some(67), Some(64), Some(60)]);
    assert!(!once.contains_key(&4));
}

#[test]
fn test_chord_flags_are_stripped() {
    let mut draft = draft_of(vec![note(PitchStep::C, 4, 4), chord_note(PitchStep::E, 4, 4)]);
    assert!(draft[&0][1].chord);
    strip_chord_flags(&mut draft);
    assert!(draft.values().flatten().all(|n| !n.chord));
}

#[test]
fn test_sort_is_stable_for_equal_pitches() {
    let mut draft = draft_of(vec![
        note(PitchStep::C, 4, 4),
        NoteEvent {
            staff: Some(2),
            ..chord_note(PitchStep::C, 4, 4)
        },
    ]);
    sort_by_descending_pitch(&mut draft);
    let staves: Vec<u32> = draft[&0].iter().map(|n| n.staff).collect();
    assert_eq!(staves, vec![1, 2]);
}

#[test]
fn test_end_to_end_document() {
    let source = r#"<score-partwise version="3.1">
<part id="P1">
<measure number="1">
  <note><pitch><step>C</step><octave>4</octave></pitch><duration>4</duration><staff>1</staff></note>
  <note><rest/><duration>1</duration><staff>1</staff></note>
  <backup><duration>4</duration></backup>
  <forward><duration>8</duration></forward>
  <note><rest/><duration>4</duration><staff>2</staff></note>
</measure>
</part>
</score-partwise>"#;
    let elements = read_elements(source, &ReaderOptions::default()).unwrap();
    let slices = segment_measures(&elements);
    let timeline = assemble(extract_events(&slices).unwrap()).unwrap();

    assert_eq!(timeline.len(), 1);
    let notes = timeline.notes_at(0).unwrap();
    assert_eq!(notes.len(), 1);
    assert_eq!(Some(notes[0].pitch), pitch_number(PitchStep::C, Some(0.0), 4));
    assert_eq!(notes[0].duration, 4);
    assert_eq!(notes[0].staff, 1);
    assert_eq!(notes[0].measure, 1);
}
