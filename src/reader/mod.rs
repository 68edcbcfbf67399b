//! # Reader Module
//!
//! Turns raw notation markup into a flat, ordered list of normalized elements.
//!
//! ## Why Not an XML Library
//! Exports from some notation programs embed processing-instruction text
//! (e.g. `<?DoletFinale ... ?>`) inside element content in ways that break
//! conformant parsers. The lexer here is a small hand-written scanner that
//! only recovers what the timeline needs:
//! - tag boundaries (open, close, self-closing)
//! - attributes, with numeric and yes/no coercion
//! - scalar text content of leaf elements
//!
//! ## Sub-modules
//! - `types` - RawElement, ElementKind, ScalarValue, Token
//! - `lexer` - Character-level scanner behind a `next_element(offset)` interface
//! - `normalize` - Camelizes tag names and fuses `<x></x>` pairs
//! - `document` - Drives the lexer from the first `<measure` to the end
//!
//! ## Example
//! ```rust
//! use timewise::reader::{read_elements, ElementKind, ScalarValue};
//! use timewise::ReaderOptions;
//!
//! let source = "<measure number='1'><note><duration>4</duration></note></measure>";
//! let elements = read_elements(source, &ReaderOptions::default()).unwrap();
//!
//! assert_eq!(elements[2].tag, "duration");
//! assert_eq!(elements[2].kind, ElementKind::OpenClose);
//! assert_eq!(elements[2].value, Some(ScalarValue::Number(4.0)));
//! ```

mod document;
mod lexer;
mod normalize;
mod types;

pub use document::{find_first_measure, read_elements};
pub use lexer::{Elements, Lexer};
pub use normalize::{camelize, Normalizer};
pub use types::{ElementKind, RawElement, ScalarValue, Token};
