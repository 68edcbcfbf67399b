use crate::config::ReaderOptions;
use crate::error::TimewiseError;

use super::lexer::Lexer;
use super::normalize::Normalizer;
use super::types::RawElement;

const MEASURE_START: &str = "<measure";

/// Offset of the first `<measure` tag, ignoring longer names like `<measure-layout>`.
pub fn find_first_measure(source: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(found) = source.get(from..)?.find(MEASURE_START) {
        let at = from + found;
        let after = source.as_bytes().get(at + MEASURE_START.len()).copied();
        let is_boundary = match after {
            None => true,
            Some(b) => !(b.is_ascii_alphanumeric() || b == b'-' || b == b'_'),
        };
        if is_boundary {
            return Some(at);
        }
        from = at + MEASURE_START.len();
    }
    None
}

/// Read every normalized element from the first measure to the end of the document.
///
/// Content before the first measure (part list, credits, defaults) is never
/// tokenized. A document without measures yields no elements.
pub fn read_elements(source: &str, options: &ReaderOptions) -> Result<Vec<RawElement>, TimewiseError> {
    let Some(start) = find_first_measure(source) else {
        log::debug!("no <measure> found in {} bytes of input", source.len());
        return Ok(Vec::new());
    };

    let lexer = Lexer::with_options(source, options);
    let elements = Normalizer::new(lexer.elements(start)).collect::<Result<Vec<_>, _>>()?;
    log::debug!("read {} elements starting at byte {}", elements.len(), start);
    Ok(elements)
}
