pub mod api;
pub mod config;
pub mod error;
pub mod pitch;
pub mod reader;
pub mod score;

pub use api::{read_events, read_timeline, read_timeline_with_options};
pub use config::ReaderOptions;
pub use error::*;
pub use pitch::{pitch_from_name, pitch_label, pitch_number, resolve_pitch, PitchStep, ResolvedPitch};
pub use score::{DraftEvent, NoteEvent, RepeatDirection, RepeatMarker, ResolvedNote, TieType, Timeline};
