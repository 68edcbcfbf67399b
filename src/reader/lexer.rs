use crate::config::ReaderOptions;
use crate::error::TimewiseError;

use super::types::{ElementKind, RawElement, ScalarValue, Token};

/// Number of source characters quoted in lexical error messages
const EXCERPT_CHARS: usize = 40;

/// Which kind of tag boundary a `<` starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Open,
    Close,
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\n' | b'\r' | b'\t')
}

fn is_tag_name_byte(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'-'
}

fn is_attribute_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.')
}

/// Hand-rolled scanner over notation markup.
///
/// Conformant XML parsers reject some real-world exports (processing
/// instructions left unbalanced inside element content), so this lexer only
/// recognizes what the timeline needs: tag boundaries, attributes and simple
/// scalar content. It is stateless between calls; the caller threads the
/// offset returned in each [`Token`].
pub struct Lexer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    numeric_limit: usize,
    trace: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self::with_options(input, &ReaderOptions::default())
    }

    pub fn with_options(input: &'a str, options: &ReaderOptions) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            numeric_limit: options.numeric_coercion_limit,
            trace: options.trace,
        }
    }

    fn byte(&self, index: usize) -> Option<u8> {
        self.bytes.get(index).copied()
    }

    fn starts_with_at(&self, index: usize, pattern: &str) -> bool {
        self.bytes
            .get(index..)
            .is_some_and(|rest| rest.starts_with(pattern.as_bytes()))
    }

    fn find_from(&self, index: usize, pattern: &str) -> Option<usize> {
        self.input.get(index..)?.find(pattern).map(|found| index + found)
    }

    fn skip_whitespace(&self, from: usize) -> usize {
        let mut needle = from;
        while let Some(b) = self.byte(needle) {
            if !is_whitespace(b) {
                break;
            }
            needle += 1;
        }
        needle
    }

    fn read_name(&self, from: usize, accepts: fn(u8) -> bool) -> usize {
        let mut needle = from;
        while let Some(b) = self.byte(needle) {
            if !accepts(b) {
                break;
            }
            needle += 1;
        }
        needle
    }

    /// Find the next `<` that opens or closes a tag.
    ///
    /// `<?` and `<!` never start a tag. Terminated comments and CDATA
    /// sections are jumped over whole so markup quoted inside them is inert.
    fn find_markup(&self, from: usize) -> Option<(usize, Marker)> {
        let mut needle = from;
        while needle < self.bytes.len() {
            if self.bytes[needle] != b'<' {
                needle += 1;
                continue;
            }
            match self.byte(needle + 1) {
                Some(b'/') => return Some((needle, Marker::Close)),
                Some(b) if is_tag_name_byte(b) => return Some((needle, Marker::Open)),
                Some(b'!') => {
                    let terminator = if self.starts_with_at(needle, "<!--") {
                        Some("-->")
                    } else if self.starts_with_at(needle, "<![CDATA[") {
                        Some("]]>")
                    } else {
                        None
                    };
                    needle = match terminator.and_then(|t| self.find_from(needle, t).map(|i| i + t.len())) {
                        Some(after) => after,
                        None => needle + 1,
                    };
                }
                _ => needle += 1,
            }
        }
        None
    }

    fn error(&self, offset: usize, message: String) -> TimewiseError {
        let mut start = offset.min(self.input.len());
        while !self.input.is_char_boundary(start) {
            start -= 1;
        }
        TimewiseError::LexicalError {
            offset,
            excerpt: self.input[start..].chars().take(EXCERPT_CHARS).collect(),
            message,
        }
    }

    /// Read the next element at or after `from`.
    ///
    /// Returns `Ok(None)` once no further tag can be found.
    pub fn next_element(&self, from: usize) -> Result<Option<Token>, TimewiseError> {
        let start = self.skip_whitespace(from);
        let Some((tag_start, marker)) = self.find_markup(start) else {
            return Ok(None);
        };

        let token = match marker {
            Marker::Close => self.read_close_tag(tag_start),
            Marker::Open => self.read_open_tag(tag_start)?,
        };

        if self.trace {
            if let Some(token) = &token {
                log::trace!(
                    "{:?} <{}> at {}..{} attributes={:?} value={:?}",
                    token.element.kind,
                    token.element.tag,
                    tag_start,
                    token.end,
                    token.element.attributes,
                    token.element.value
                );
            }
        }

        Ok(token)
    }

    fn read_close_tag(&self, tag_start: usize) -> Option<Token> {
        let name_start = tag_start + 2;
        let name_end = self.read_name(name_start, is_tag_name_byte);
        if name_end == name_start {
            return None;
        }
        let after_name = self.skip_whitespace(name_end);
        let end = if self.byte(after_name) == Some(b'>') {
            after_name + 1
        } else {
            name_end
        };
        Some(Token {
            element: RawElement::new(&self.input[name_start..name_end], ElementKind::Close),
            end,
        })
    }

    fn read_open_tag(&self, tag_start: usize) -> Result<Option<Token>, TimewiseError> {
        let name_start = tag_start + 1;
        let name_end = self.read_name(name_start, is_tag_name_byte);
        if name_end == name_start {
            return Ok(None);
        }
        let tag = &self.input[name_start..name_end];
        let mut element = RawElement::new(tag, ElementKind::Open);

        let mut needle = self.skip_whitespace(name_end);
        loop {
            match self.byte(needle) {
                Some(b'/') if self.byte(needle + 1) == Some(b'>') => {
                    element.kind = ElementKind::OpenClose;
                    return Ok(Some(Token {
                        element,
                        end: needle + 2,
                    }));
                }
                Some(b'>') => break,
                Some(b) if is_tag_name_byte(b) => {
                    let (name, value, after) = self.read_attribute(needle)?;
                    element.attributes.push((name, value));
                    needle = self.skip_whitespace(after);
                }
                _ => {
                    return Err(self.error(needle, format!("unterminated tag <{}>", tag)));
                }
            }
        }

        let content_start = needle + 1;
        element.value = self.read_simple_value(content_start);
        Ok(Some(Token {
            element,
            end: content_start,
        }))
    }

    /// Parse `name = 'value'` starting at `from`; returns the offset after the closing quote.
    fn read_attribute(&self, from: usize) -> Result<(String, ScalarValue, usize), TimewiseError> {
        let name_end = self.read_name(from, is_attribute_name_byte);
        let name = &self.input[from..name_end];

        let equals = self.skip_whitespace(name_end);
        if self.byte(equals) != Some(b'=') {
            return Err(self.error(
                equals,
                format!("expected '=' after attribute name '{}'", name),
            ));
        }

        let quote_at = self.skip_whitespace(equals + 1);
        let quote = match self.byte(quote_at) {
            Some(q @ (b'\'' | b'"')) => q,
            found => {
                let found = found.map_or("end of input".to_string(), |b| format!("'{}'", b as char));
                return Err(self.error(
                    quote_at,
                    format!(
                        "expected a quote after '=' for attribute '{}', found {}",
                        name, found
                    ),
                ));
            }
        };

        let value_start = quote_at + 1;
        let value_end = self.bytes[value_start..]
            .iter()
            .position(|&b| b == quote)
            .map(|i| value_start + i)
            .ok_or_else(|| {
                self.error(
                    quote_at,
                    format!("unterminated value for attribute '{}'", name),
                )
            })?;

        let value = ScalarValue::coerce(&self.input[value_start..value_end], self.numeric_limit);
        Ok((name.to_string(), value, value_end + 1))
    }

    /// Capture content only when the next tag after `>` is a closing tag.
    /// Whitespace-only content captures nothing.
    fn read_simple_value(&self, content_start: usize) -> Option<ScalarValue> {
        match self.find_markup(content_start) {
            Some((close_at, Marker::Close)) => {
                let content = &self.input[content_start..close_at];
                if content.trim().is_empty() {
                    return None;
                }
                Some(ScalarValue::coerce(content, self.numeric_limit))
            }
            _ => None,
        }
    }

    /// Iterate elements from `from` to the end of the input.
    pub fn elements(&self, from: usize) -> Elements<'_, 'a> {
        Elements {
            lexer: self,
            cursor: from,
            done: false,
        }
    }
}

/// Iterator over the elements of a document; stops after the first error.
pub struct Elements<'l, 'a> {
    lexer: &'l Lexer<'a>,
    cursor: usize,
    done: bool,
}

impl Iterator for Elements<'_, '_> {
    type Item = Result<RawElement, TimewiseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.lexer.next_element(self.cursor) {
            Ok(Some(token)) => {
                self.cursor = token.end;
                Some(Ok(token.element))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
