//! Lexical element type definitions
//!
//! These are the units the tokenizer produces and the normalizer cleans up.

use std::fmt;

use serde::Serialize;

/// A scalar captured from an attribute value or from simple element content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl ScalarValue {
    /// Coerce captured text.
    ///
    /// `yes`/`true` and `no`/`false` (any case) become booleans. Text whose
    /// trimmed form is at most `numeric_limit` bytes and parses as a finite
    /// number becomes a number. Anything else is kept verbatim.
    pub fn coerce(text: &str, numeric_limit: usize) -> Self {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case("yes") || trimmed.eq_ignore_ascii_case("true") {
            return ScalarValue::Bool(true);
        }
        if trimmed.eq_ignore_ascii_case("no") || trimmed.eq_ignore_ascii_case("false") {
            return ScalarValue::Bool(false);
        }
        if !trimmed.is_empty() && trimmed.len() <= numeric_limit {
            if let Ok(number) = trimmed.parse::<f64>() {
                if number.is_finite() {
                    return ScalarValue::Number(number);
                }
            }
        }
        ScalarValue::Text(text.to_string())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Presence semantics for flag-like properties: everything but `false` counts.
    pub fn is_set(&self) -> bool {
        !matches!(self, ScalarValue::Bool(false))
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Bool(b) => write!(f, "{}", b),
            ScalarValue::Number(n) => write!(f, "{}", n),
            ScalarValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// How a tag was written (or, after normalization, how it behaves).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    /// `<tag ...>`
    Open,
    /// `</tag>`
    Close,
    /// `<tag .../>`, or an open tag fused with its immediate close
    OpenClose,
}

/// One lexical element of the document
#[derive(Debug, Clone, PartialEq)]
pub struct RawElement {
    pub tag: String,
    pub kind: ElementKind,
    /// Attributes in document order
    pub attributes: Vec<(String, ScalarValue)>,
    pub value: Option<ScalarValue>,
}

impl RawElement {
    pub fn new(tag: impl Into<String>, kind: ElementKind) -> Self {
        Self {
            tag: tag.into(),
            kind,
            attributes: Vec::new(),
            value: None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&ScalarValue> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    pub fn is(&self, tag: &str, kind: ElementKind) -> bool {
        self.kind == kind && self.tag == tag
    }

    /// Open or self-closing occurrence of `tag`
    pub fn opens(&self, tag: &str) -> bool {
        self.tag == tag && self.kind != ElementKind::Close
    }
}

/// An element plus the byte offset just past it, where scanning resumes.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub element: RawElement,
    pub end: usize,
}
