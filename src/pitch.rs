//! # Pitch Resolution
//!
//! Converts MusicXML's (step, alter, octave) triple into a single semitone
//! number and a short display label.
//!
//! ## Numbering
//! `number = 12 + octave * 12 + semitone(step) + trunc(alter)`, so C0 is 12
//! and octave 4 is the octave that begins at middle C. Fractional
//! alterations (quarter tones) are truncated toward zero; a piano cannot
//! play them. Numbers that do not fit an `i32` resolve to `None`.
//!
//! ## Example
//! ```rust
//! use timewise::pitch::{resolve_pitch, PitchStep};
//!
//! let pitch = resolve_pitch(PitchStep::B, Some(-1.0), 3).unwrap();
//! assert_eq!(pitch.number, 58);
//! assert_eq!(pitch.label, "b♭3");
//! ```

use crate::error::TimewiseError;
use crate::score::NoteEvent;

const OCTAVE_SEMITONES: i32 = 12;
/// Number given to C in octave 0
const C0_VALUE: i32 = 12;

/// A step of the diatonic scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PitchStep {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl PitchStep {
    /// Parse a step letter; surrounding whitespace is ignored, case is not.
    pub fn from_letter(s: &str) -> Option<Self> {
        match s.trim() {
            "C" => Some(PitchStep::C),
            "D" => Some(PitchStep::D),
            "E" => Some(PitchStep::E),
            "F" => Some(PitchStep::F),
            "G" => Some(PitchStep::G),
            "A" => Some(PitchStep::A),
            "B" => Some(PitchStep::B),
            _ => None,
        }
    }

    /// Semitones above C within one octave
    pub fn semitone(self) -> i32 {
        match self {
            PitchStep::C => 0,
            PitchStep::D => 2,
            PitchStep::E => 4,
            PitchStep::F => 5,
            PitchStep::G => 7,
            PitchStep::A => 9,
            PitchStep::B => 11,
        }
    }

    fn lowercase(self) -> char {
        match self {
            PitchStep::C => 'c',
            PitchStep::D => 'd',
            PitchStep::E => 'e',
            PitchStep::F => 'f',
            PitchStep::G => 'g',
            PitchStep::A => 'a',
            PitchStep::B => 'b',
        }
    }
}

/// A pitch resolved to a number and a label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPitch {
    pub number: i32,
    pub label: String,
}

pub fn pitch_number(step: PitchStep, alter: Option<f64>, octave: i32) -> Option<i32> {
    let alter_semitones = match alter {
        None => 0,
        Some(a) => {
            let whole = a.trunc();
            if whole.abs() > i32::MAX as f64 {
                return None;
            }
            whole as i32
        }
    };
    octave
        .checked_mul(OCTAVE_SEMITONES)?
        .checked_add(C0_VALUE + step.semitone())?
        .checked_add(alter_semitones)
}

/// `c4`, `b♭3`, `f♯5`. Only whole-step alterations of exactly one semitone get a sign.
pub fn pitch_label(step: PitchStep, alter: Option<f64>, octave: i32) -> String {
    let accidental = match alter {
        Some(a) if a == -1.0 => "♭",
        Some(a) if a == 1.0 => "♯",
        _ => "",
    };
    format!("{}{}{}", step.lowercase(), accidental, octave)
}

pub fn resolve_pitch(step: PitchStep, alter: Option<f64>, octave: i32) -> Option<ResolvedPitch> {
    Some(ResolvedPitch {
        number: pitch_number(step, alter, octave)?,
        label: pitch_label(step, alter, octave),
    })
}

/// Resolve a note event's pitch. Rests have none; a sounding note must carry step and octave.
///
/// An octave or alteration too large to number is an `InvalidFieldError`.
pub fn resolve_note_pitch(note: &NoteEvent) -> Result<Option<ResolvedPitch>, TimewiseError> {
    if note.rest {
        return Ok(None);
    }
    let missing = |field: &str| TimewiseError::MissingFieldError {
        measure: note.measure,
        field: field.to_string(),
    };
    let step = note.step.ok_or_else(|| missing("step"))?;
    let octave = note.octave.ok_or_else(|| missing("octave"))?;
    resolve_pitch(step, note.alter, octave).map(Some).ok_or_else(|| {
        let (field, value) = match (pitch_number(step, None, octave), note.alter) {
            (Some(_), Some(alter)) => ("alter", alter.to_string()),
            _ => ("octave", octave.to_string()),
        };
        TimewiseError::InvalidFieldError {
            measure: note.measure,
            field: field.to_string(),
            value,
        }
    })
}

/// Parse a pitch name like `C4`, `F#3` or `Bb5` into its number.
///
/// The first character is the step, every `#` adds a semitone, every `b`
/// after the step removes one, and the final character is the octave digit.
/// Anything else is an `InvalidPitchName`.
pub fn pitch_from_name(name: &str) -> Result<i32, TimewiseError> {
    let invalid = || TimewiseError::InvalidPitchName(name.to_string());

    let mut chars = name.trim().chars();
    let step = chars
        .next()
        .and_then(|c| PitchStep::from_letter(c.encode_utf8(&mut [0; 4])))
        .ok_or_else(invalid)?;
    let octave = chars
        .next_back()
        .and_then(|c| c.to_digit(10))
        .ok_or_else(invalid)? as i32;

    let mut alter = 0.0;
    for c in chars {
        match c {
            '#' => alter += 1.0,
            'b' => alter -= 1.0,
            _ => return Err(invalid()),
        }
    }

    pitch_number(step, Some(alter), octave).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_steps_in_octave_four() {
        let expected = [
            (PitchStep::C, 60),
            (PitchStep::D, 62),
            (PitchStep::E, 64),
            (PitchStep::F, 65),
            (PitchStep::G, 67),
            (PitchStep::A, 69),
            (PitchStep::B, 71),
        ];
        for (step, number) in expected {
            assert_eq!(pitch_number(step, None, 4), Some(number));
        }
    }

    #[test]
    fn test_octave_zero_is_valid() {
        assert_eq!(pitch_number(PitchStep::C, None, 0), Some(12));
        assert_eq!(pitch_number(PitchStep::A, None, 0), Some(21));
    }

    #[test]
    fn test_alterations() {
        assert_eq!(pitch_number(PitchStep::F, Some(1.0), 4), Some(66));
        assert_eq!(pitch_number(PitchStep::B, Some(-1.0), 3), Some(58));
        assert_eq!(pitch_number(PitchStep::C, Some(-2.0), 5), Some(70));
    }

    #[test]
    fn test_microtones_truncate_toward_zero() {
        assert_eq!(pitch_number(PitchStep::C, Some(0.5), 4), Some(60));
        assert_eq!(pitch_number(PitchStep::C, Some(-0.5), 4), Some(60));
        assert_eq!(pitch_number(PitchStep::C, Some(1.5), 4), Some(61));
        assert_eq!(pitch_number(PitchStep::C, Some(-1.5), 4), Some(59));
    }

    #[test]
    fn test_out_of_range_pitch_numbers() {
        assert_eq!(pitch_number(PitchStep::C, None, 999_999_999), None);
        assert_eq!(pitch_number(PitchStep::B, None, i32::MAX / 12), None);
        assert_eq!(pitch_number(PitchStep::C, Some(1e12), 4), None);
        assert_eq!(pitch_number(PitchStep::C, Some(-1e12), 4), None);
        assert_eq!(pitch_number(PitchStep::C, None, -1), Some(0));
        assert!(resolve_pitch(PitchStep::C, None, i32::MIN).is_none());
    }

    #[test]
    fn test_huge_octave_is_invalid() {
        let note = NoteEvent {
            step: Some(PitchStep::C),
            octave: Some(999_999_999),
            ..NoteEvent::new(5)
        };
        assert_eq!(
            resolve_note_pitch(&note),
            Err(TimewiseError::InvalidFieldError {
                measure: 5,
                field: "octave".to_string(),
                value: "999999999".to_string()
            })
        );
    }

    #[test]
    fn test_huge_alter_is_invalid() {
        let note = NoteEvent {
            step: Some(PitchStep::C),
            alter: Some(1e12),
            octave: Some(4),
            ..NoteEvent::new(6)
        };
        assert!(matches!(
            resolve_note_pitch(&note),
            Err(TimewiseError::InvalidFieldError { measure: 6, ref field, .. }) if field == "alter"
        ));
    }

    #[test]
    fn test_labels() {
        assert_eq!(pitch_label(PitchStep::C, None, 4), "c4");
        assert_eq!(pitch_label(PitchStep::B, Some(-1.0), 3), "b♭3");
        assert_eq!(pitch_label(PitchStep::F, Some(1.0), 5), "f♯5");
        assert_eq!(pitch_label(PitchStep::C, Some(0.0), 4), "c4");
        // Double sharps and quarter tones get no sign
        assert_eq!(pitch_label(PitchStep::F, Some(2.0), 4), "f4");
        assert_eq!(pitch_label(PitchStep::E, Some(-0.5), 4), "e4");
    }

    #[test]
    fn test_step_letters() {
        assert_eq!(PitchStep::from_letter("A"), Some(PitchStep::A));
        assert_eq!(PitchStep::from_letter(" G "), Some(PitchStep::G));
        assert_eq!(PitchStep::from_letter("H"), None);
        assert_eq!(PitchStep::from_letter("c"), None);
    }

    #[test]
    fn test_rest_has_no_pitch() {
        let note = NoteEvent {
            rest: true,
            ..NoteEvent::new(1)
        };
        assert_eq!(resolve_note_pitch(&note).unwrap(), None);
    }

    #[test]
    fn test_missing_step_or_octave() {
        let no_step = NoteEvent {
            octave: Some(4),
            ..NoteEvent::new(2)
        };
        assert_eq!(
            resolve_note_pitch(&no_step),
            Err(TimewiseError::MissingFieldError {
                measure: 2,
                field: "step".to_string()
            })
        );

        let no_octave = NoteEvent {
            step: Some(PitchStep::D),
            ..NoteEvent::new(3)
        };
        assert_eq!(
            resolve_note_pitch(&no_octave),
            Err(TimewiseError::MissingFieldError {
                measure: 3,
                field: "octave".to_string()
            })
        );
    }

    #[test]
    fn test_resolve_note_pitch() {
        let note = NoteEvent {
            step: Some(PitchStep::E),
            alter: Some(-1.0),
            octave: Some(4),
            ..NoteEvent::new(1)
        };
        assert_eq!(
            resolve_note_pitch(&note).unwrap(),
            Some(ResolvedPitch {
                number: 63,
                label: "e♭4".to_string()
            })
        );
    }

    #[test]
    fn test_pitch_from_name() {
        assert_eq!(pitch_from_name("C4").unwrap(), 60);
        assert_eq!(pitch_from_name("C#4").unwrap(), 61);
        assert_eq!(pitch_from_name("Bb3").unwrap(), 58);
        assert_eq!(pitch_from_name("A0").unwrap(), 21);
        assert_eq!(
            pitch_from_name("H4"),
            Err(TimewiseError::InvalidPitchName("H4".to_string()))
        );
        assert_eq!(
            pitch_from_name("H4").unwrap_err().to_string(),
            "Invalid pitch name \"H4\""
        );
        assert!(pitch_from_name("C").is_err());
        assert!(pitch_from_name("Cx4").is_err());
    }
}
