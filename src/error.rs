//! # Error Types
//!
//! This module defines all error types for the timewise reader.
//!
//! Every error is fatal for the whole document: a half-read timeline is not
//! safe to perform from, so nothing is partially returned.
//!
//! ## Error Types
//! - `LexicalError` - Tokenizer errors with a byte offset and source excerpt
//! - `MissingFieldError` - A required note/jump field is absent (with measure number)
//! - `InvalidFieldError` - A field is present but cannot be interpreted
//! - `TieConsistencyError` - A tie stop/continue with no open tie start
//! - `InvalidPitchName` - A pitch name outside any document could not be parsed
//! - `ConfigError` - Invalid YAML reader options
//!
//! ## Usage
//! ```rust
//! use timewise::{read_timeline, TimewiseError};
//!
//! let source = "<measure><note><rest/><duration>4</duration></note></measure>";
//! match read_timeline(source) {
//!     Ok(timeline) => println!("{} timecodes", timeline.len()),
//!     Err(TimewiseError::LexicalError { offset, message, .. }) => {
//!         eprintln!("Markup error at byte {}: {}", offset, message);
//!     }
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TimewiseError {
    /// Structurally invalid tag found by the tokenizer.
    ///
    /// # Example
    /// ```
    /// # use timewise::TimewiseError;
    /// let err = TimewiseError::LexicalError {
    ///     offset: 12,
    ///     excerpt: "a '1'>".to_string(),
    ///     message: "expected '=' after attribute name 'a'".to_string(),
    /// };
    /// assert_eq!(
    ///     err.to_string(),
    ///     "Lexical error at byte 12: expected '=' after attribute name 'a' (near \"a '1'>\")"
    /// );
    /// ```
    #[error("Lexical error at byte {offset}: {message} (near {excerpt:?})")]
    LexicalError {
        offset: usize,
        excerpt: String,
        message: String,
    },

    /// A sounding note lacks its step or octave, or a note/forward/backup
    /// lacks a duration.
    ///
    /// # Example
    /// ```
    /// # use timewise::TimewiseError;
    /// let err = TimewiseError::MissingFieldError {
    ///     measure: 3,
    ///     field: "octave".to_string(),
    /// };
    /// assert_eq!(err.to_string(), "Missing field 'octave' on a note in measure 3");
    /// ```
    #[error("Missing field '{field}' on a note in measure {measure}")]
    MissingFieldError { measure: usize, field: String },

    /// A field holds a value that cannot be interpreted (e.g. step `H`).
    #[error("Invalid value {value:?} for field '{field}' in measure {measure}")]
    InvalidFieldError {
        measure: usize,
        field: String,
        value: String,
    },

    /// A tie stop or continue with no matching tie start on its staff/pitch.
    #[error("Tie stop in measure {measure} has no matching tie start for staff {staff}, pitch {pitch}")]
    TieConsistencyError { measure: usize, staff: u32, pitch: i32 },

    /// A pitch name such as `C#4` could not be parsed.
    #[error("Invalid pitch name {0:?}")]
    InvalidPitchName(String),

    /// Reader options could not be loaded.
    #[error("Invalid reader options: {0}")]
    ConfigError(String),
}
