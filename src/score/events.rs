use std::collections::BTreeMap;

use crate::error::TimewiseError;
use crate::pitch::PitchStep;
use crate::reader::{camelize, ElementKind, RawElement, ScalarValue};

use super::segment::MeasureSlice;
use super::types::{DraftEvent, NoteEvent, PropertyValue, RepeatDirection, RepeatMarker, TieType};

/// Flattened note properties, keyed by camelCase name
pub type PropertyBag = BTreeMap<String, PropertyValue>;

/// Notation-only properties dropped by exact name
const IGNORED_EXACT: &[&str] = &[
    // <tie> is about sound, <tied> about notation; ties are read from <tied>
    "tie",
    "pitch",
    "notations",
    "ornaments",
    // The hand is decided by staff, not voice
    "voice",
    "dot",
    "stem",
    "type",
    "technical",
    "articulations",
    "timeModification",
    "actualNotes",
    "normalNotes",
    "accent",
];

/// Dropped when the key starts with one of these
const IGNORED_PREFIXES: &[&str] = &[
    "tieT",
    "stacca",
    "fermata",
    "fingering",
    "slur",
    "beam",
    "strongAccent",
    "tuplet",
];

/// Dropped when the key extends one of these, keeping the bare key itself
const IGNORED_EXTENSIONS: &[&str] = &["wavyLine", "grace"];

fn is_ignored(key: &str) -> bool {
    IGNORED_EXACT.contains(&key)
        || IGNORED_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
        || IGNORED_EXTENSIONS
            .iter()
            .any(|base| key != *base && key.starts_with(base))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Collect the properties of the note whose children start at `start`.
///
/// Returns the bag and the index of the note's close tag (or the slice
/// length when the note never closes).
fn collect_note_properties(elements: &[RawElement], start: usize) -> (PropertyBag, usize) {
    let mut bag = PropertyBag::new();
    let mut index = start;

    while index < elements.len() {
        let element = &elements[index];
        index += 1;

        if element.kind == ElementKind::Close {
            if element.tag == "note" {
                return (bag, index - 1);
            }
            continue;
        }

        let value = element.value.clone().unwrap_or(ScalarValue::Bool(true));
        bag.insert(element.tag.clone(), PropertyValue::Scalar(value));

        for (name, value) in &element.attributes {
            let key = format!("{}{}", element.tag, capitalize(&camelize(name)));
            match bag.remove(&key) {
                None => {
                    bag.insert(key, PropertyValue::Scalar(value.clone()));
                }
                Some(PropertyValue::Scalar(existing)) => {
                    bag.insert(key, PropertyValue::List(vec![existing, value.clone()]));
                }
                Some(PropertyValue::List(mut values)) => {
                    values.push(value.clone());
                    bag.insert(key, PropertyValue::List(values));
                }
            }
        }
    }

    (bag, elements.len())
}

fn without_ignored(bag: PropertyBag) -> PropertyBag {
    bag.into_iter().filter(|(key, _)| !is_ignored(key)).collect()
}

fn with_transformed_properties(mut bag: PropertyBag) -> PropertyBag {
    // A note ending one tie and starting another carries both types
    if let Some(PropertyValue::List(types)) = bag.get("tiedType") {
        let is_stop_start = types.len() > 1
            && matches!(types[0].as_str(), Some("start" | "stop"))
            && matches!(types[1].as_str(), Some("start" | "stop"))
            && types[0] != types[1];
        if is_stop_start {
            bag.insert(
                "tiedType".to_string(),
                PropertyValue::Scalar(ScalarValue::Text("continue".to_string())),
            );
        }
    }

    let trill_mark = bag.remove("trillMark");
    let wavy_line = bag.remove("wavyLine");
    if trill_mark.is_some() || wavy_line.is_some() {
        bag.insert("trill".to_string(), PropertyValue::Scalar(ScalarValue::Bool(true)));
    }

    bag
}

/// `n` truncated toward zero, if it fits in an `i64`
fn whole_number(n: f64) -> Option<i64> {
    let whole = n.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    (whole >= i64::MIN as f64 && whole < i64::MAX as f64).then(|| whole as i64)
}

/// A duration in division units: a whole number, never negative
fn duration_units(n: f64) -> Option<i64> {
    whole_number(n).filter(|d| *d >= 0)
}

/// Lifts recognized properties out of a bag into a [`NoteEvent`]
struct NoteBuilder {
    bag: PropertyBag,
    measure: usize,
}

impl NoteBuilder {
    fn invalid(&self, field: &str, value: &PropertyValue) -> TimewiseError {
        let value = match value {
            PropertyValue::Scalar(v) => v.to_string(),
            PropertyValue::List(vs) => vs.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", "),
        };
        TimewiseError::InvalidFieldError {
            measure: self.measure,
            field: field.to_string(),
            value,
        }
    }

    fn take_number(&mut self, key: &str) -> Result<Option<f64>, TimewiseError> {
        match self.bag.remove(key) {
            None => Ok(None),
            Some(PropertyValue::Scalar(ScalarValue::Number(n))) => Ok(Some(n)),
            Some(other) => Err(self.invalid(key, &other)),
        }
    }

    fn take_integer<T: TryFrom<i64>>(&mut self, key: &str) -> Result<Option<T>, TimewiseError> {
        let Some(number) = self.take_number(key)? else {
            return Ok(None);
        };
        whole_number(number)
            .and_then(|n| T::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| self.invalid(key, &PropertyValue::Scalar(ScalarValue::Number(number))))
    }

    fn take_duration(&mut self) -> Result<Option<i64>, TimewiseError> {
        let Some(number) = self.take_number("duration")? else {
            return Ok(None);
        };
        duration_units(number)
            .map(Some)
            .ok_or_else(|| self.invalid("duration", &PropertyValue::Scalar(ScalarValue::Number(number))))
    }

    fn take_flag(&mut self, key: &str) -> bool {
        match self.bag.remove(key) {
            None => false,
            Some(PropertyValue::Scalar(value)) => value.is_set(),
            Some(PropertyValue::List(_)) => true,
        }
    }

    /// Text content only; a bare `<accidental/>` carries no text.
    fn take_text(&mut self, key: &str) -> Option<String> {
        let first = match self.bag.remove(key)? {
            PropertyValue::Scalar(value) => value,
            PropertyValue::List(values) => values.into_iter().next()?,
        };
        match first {
            ScalarValue::Text(text) => Some(text),
            _ => None,
        }
    }

    fn take_step(&mut self) -> Result<Option<PitchStep>, TimewiseError> {
        match self.bag.remove("step") {
            None => Ok(None),
            Some(PropertyValue::Scalar(ScalarValue::Text(letter))) => match PitchStep::from_letter(&letter) {
                Some(step) => Ok(Some(step)),
                None => Err(self.invalid("step", &PropertyValue::Scalar(ScalarValue::Text(letter)))),
            },
            Some(other) => Err(self.invalid("step", &other)),
        }
    }

    fn take_tie_type(&mut self) -> Option<TieType> {
        // <tied> presence alone carries nothing the type does not
        self.bag.remove("tied");
        let name = self.take_text("tiedType")?;
        let tie_type = TieType::from_name(&name);
        if tie_type.is_none() {
            log::debug!("measure {}: ignoring tie type {:?}", self.measure, name);
        }
        tie_type
    }

    fn build(mut self) -> Result<NoteEvent, TimewiseError> {
        let duration = self.take_duration()?;
        let staff = self.take_integer::<u32>("staff")?;
        let step = self.take_step()?;
        let alter = self.take_number("alter")?;
        let octave = self.take_integer::<i32>("octave")?;

        Ok(NoteEvent {
            measure: self.measure,
            staff,
            duration,
            step,
            alter,
            octave,
            rest: self.take_flag("rest"),
            grace: self.take_flag("grace"),
            chord: self.take_flag("chord"),
            cue: self.take_flag("cue"),
            tie_type: self.take_tie_type(),
            accidental: self.take_text("accidental"),
            arpeggiate: self.take_flag("arpeggiate"),
            trill: self.take_flag("trill"),
            extra: self.bag,
        })
    }
}

/// Turn a raw property bag into a note event: filter, transform, then lift typed fields.
pub fn note_from_properties(bag: PropertyBag, measure: usize) -> Result<NoteEvent, TimewiseError> {
    NoteBuilder {
        bag: with_transformed_properties(without_ignored(bag)),
        measure,
    }
    .build()
}

fn repeat_marker(element: &RawElement, measure: usize) -> Option<RepeatMarker> {
    let direction = match element.attribute("direction").and_then(ScalarValue::as_str) {
        Some("forward") => RepeatDirection::Forward,
        Some("backward") => RepeatDirection::Backward,
        other => {
            log::debug!("measure {}: skipping repeat with direction {:?}", measure, other);
            return None;
        }
    };
    Some(RepeatMarker { direction, measure })
}

fn jump_duration(element: Option<&RawElement>, measure: usize) -> Result<i64, TimewiseError> {
    match element {
        Some(e) if e.tag == "duration" => match &e.value {
            Some(ScalarValue::Number(n)) => duration_units(*n).ok_or_else(|| TimewiseError::InvalidFieldError {
                measure,
                field: "duration".to_string(),
                value: n.to_string(),
            }),
            Some(other) => Err(TimewiseError::InvalidFieldError {
                measure,
                field: "duration".to_string(),
                value: other.to_string(),
            }),
            None => Err(TimewiseError::MissingFieldError {
                measure,
                field: "duration".to_string(),
            }),
        },
        _ => Err(TimewiseError::MissingFieldError {
            measure,
            field: "duration".to_string(),
        }),
    }
}

/// Convert one measure's elements into events, in document order.
pub fn extract_measure_events(slice: &MeasureSlice<'_>) -> Result<Vec<DraftEvent>, TimewiseError> {
    let elements = slice.elements;
    let measure = slice.number;
    let mut events = Vec::new();
    let mut index = 0;

    while index < elements.len() {
        let element = &elements[index];
        match (element.tag.as_str(), element.kind) {
            (_, ElementKind::Close) => {}
            ("repeat", _) => {
                if let Some(marker) = repeat_marker(element, measure) {
                    events.push(DraftEvent::Repeat(marker));
                }
            }
            ("note", ElementKind::OpenClose) => {
                events.push(DraftEvent::Note(note_from_properties(PropertyBag::new(), measure)?));
            }
            ("note", ElementKind::Open) => {
                let (bag, close_index) = collect_note_properties(elements, index + 1);
                events.push(DraftEvent::Note(note_from_properties(bag, measure)?));
                index = close_index;
            }
            ("forward", ElementKind::Open) => {
                let duration = jump_duration(elements.get(index + 1), measure)?;
                events.push(DraftEvent::Forward { duration, measure });
                index += 1;
            }
            ("backup", ElementKind::Open) => {
                let duration = jump_duration(elements.get(index + 1), measure)?;
                events.push(DraftEvent::Backup { duration, measure });
                index += 1;
            }
            ("forward" | "backup", _) => {
                return Err(TimewiseError::MissingFieldError {
                    measure,
                    field: "duration".to_string(),
                });
            }
            _ => {}
        }
        index += 1;
    }

    Ok(events)
}

/// Events of every measure, concatenated in measure order.
pub fn extract_events(slices: &[MeasureSlice<'_>]) -> Result<Vec<DraftEvent>, TimewiseError> {
    let mut events = Vec::new();
    for slice in slices {
        events.extend(extract_measure_events(slice)?);
    }
    Ok(events)
}
