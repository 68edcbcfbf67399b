//! Reader options.
//!
//! Options are plain YAML with kebab-case keys:
//!
//! ```yaml
//! numeric-coercion-limit: 32
//! trace: false
//! ```

use serde::Deserialize;

use crate::error::TimewiseError;

/// Longest trimmed text (in bytes) that is still coerced to a number.
pub const DEFAULT_NUMERIC_COERCION_LIMIT: usize = 32;

/// Knobs for the tokenizer and document reader.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct ReaderOptions {
    /// Captured text longer than this stays text even if it looks numeric
    pub numeric_coercion_limit: usize,
    /// Log every token at `trace` level
    pub trace: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            numeric_coercion_limit: DEFAULT_NUMERIC_COERCION_LIMIT,
            trace: false,
        }
    }
}

impl ReaderOptions {
    /// Parse options from a YAML document. An empty document yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self, TimewiseError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| TimewiseError::ConfigError(e.to_string()))
    }
}
