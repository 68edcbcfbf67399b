//! # Public API
//!
//! Main entry points for reading a MusicXML document into a timeline.
//!
//! ## Reading Functions
//!
//! - [`read_timeline()`] - Read with default options (recommended)
//! - [`read_timeline_with_options()`] - Custom numeric coercion and tracing
//! - [`read_events()`] - Stop before assembly and inspect the draft events
//! - [`Timeline::from_musicxml()`] - Same as `read_timeline`, as a constructor
//!
//! ## Typical Usage
//!
//! ```rust
//! use timewise::read_timeline;
//!
//! let source = r#"<?xml version="1.0" encoding="UTF-8"?>
//! <score-partwise version="3.1">
//!   <part id="P1">
//!     <measure number="1">
//!       <note>
//!         <pitch><step>A</step><octave>4</octave></pitch>
//!         <duration>4</duration>
//!       </note>
//!     </measure>
//!   </part>
//! </score-partwise>"#;
//!
//! let timeline = read_timeline(source)?;
//! let notes = timeline.notes_at(0).unwrap();
//! assert_eq!(notes[0].pitch, 69);
//! assert_eq!(notes[0].pitch_label, "a4");
//! # Ok::<(), timewise::TimewiseError>(())
//! ```
//!
//! ## Custom Options
//!
//! ```rust
//! use timewise::{read_timeline_with_options, ReaderOptions};
//!
//! let options = ReaderOptions::from_yaml("numeric-coercion-limit: 8")?;
//! let timeline = read_timeline_with_options("<measure/>", &options)?;
//! assert!(timeline.is_empty());
//! # Ok::<(), timewise::TimewiseError>(())
//! ```

use crate::config::ReaderOptions;
use crate::error::TimewiseError;
use crate::reader::read_elements;
use crate::score::{assemble, extract_events, segment_measures, DraftEvent, Timeline};

/// Read a MusicXML document into its performance timeline.
///
/// # Pipeline
/// 1. Tokenize and normalize from the first `<measure`
/// 2. Split the elements into measures
/// 3. Extract draft events per measure
/// 4. Replay them on the clock and clean up the result
///
/// # Errors
/// Any malformed tag, missing required field or dangling tie stop rejects
/// the whole document.
pub fn read_timeline(source: &str) -> Result<Timeline, TimewiseError> {
    read_timeline_with_options(source, &ReaderOptions::default())
}

/// Read a timeline with custom reader options.
pub fn read_timeline_with_options(
    source: &str,
    options: &ReaderOptions,
) -> Result<Timeline, TimewiseError> {
    let events = read_events(source, options)?;
    assemble(events)
}

/// Read the draft events of a document without assembling them.
///
/// Pitches are not resolved at this stage, so a note missing its step still
/// reads successfully.
pub fn read_events(source: &str, options: &ReaderOptions) -> Result<Vec<DraftEvent>, TimewiseError> {
    let elements = read_elements(source, options)?;
    let slices = segment_measures(&elements);
    let events = extract_events(&slices)?;
    log::debug!(
        "read {} events from {} measures",
        events.len(),
        slices.len()
    );
    Ok(events)
}

impl Timeline {
    /// Build the timeline for a MusicXML document with default options.
    pub fn from_musicxml(source: &str) -> Result<Self, TimewiseError> {
        read_timeline(source)
    }
}
