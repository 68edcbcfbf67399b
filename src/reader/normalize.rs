use std::iter::Peekable;

use crate::error::TimewiseError;

use super::types::{ElementKind, RawElement};

/// Rewrite a tag name as a lower camel identifier: `time-modification` -> `timeModification`.
pub fn camelize(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut upper_next = false;
    for (i, c) in name.chars().enumerate() {
        if c == '-' || c == '_' || c.is_whitespace() {
            upper_next = true;
            continue;
        }
        if upper_next && !result.is_empty() {
            result.extend(c.to_uppercase());
        } else if i == 0 {
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
        upper_next = false;
    }
    result
}

/// Cleans the raw token stream with one token of lookahead.
///
/// - tag names are camelized
/// - `rest` is always self-closing
/// - an open tag immediately followed by its own close fuses into `OpenClose`
pub struct Normalizer<I>
where
    I: Iterator<Item = Result<RawElement, TimewiseError>>,
{
    inner: Peekable<I>,
}

impl<I> Normalizer<I>
where
    I: Iterator<Item = Result<RawElement, TimewiseError>>,
{
    pub fn new(inner: I) -> Self {
        Self {
            inner: inner.peekable(),
        }
    }

    /// Consume the next token if it closes `tag` (compared after camelizing).
    fn take_matching_close(&mut self, tag: &str) -> bool {
        let matches = matches!(
            self.inner.peek(),
            Some(Ok(next)) if next.kind == ElementKind::Close && camelize(&next.tag) == tag
        );
        if matches {
            self.inner.next();
        }
        matches
    }
}

impl<I> Iterator for Normalizer<I>
where
    I: Iterator<Item = Result<RawElement, TimewiseError>>,
{
    type Item = Result<RawElement, TimewiseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut element = match self.inner.next()? {
            Ok(element) => element,
            Err(e) => return Some(Err(e)),
        };

        element.tag = camelize(&element.tag);

        if element.kind == ElementKind::Open && self.take_matching_close(&element.tag) {
            element.kind = ElementKind::OpenClose;
        }
        if element.tag == "rest" && element.kind != ElementKind::Close {
            element.kind = ElementKind::OpenClose;
        }

        Some(Ok(element))
    }
}
