//! Pattern matching utilities for prompt detection.

use std::fmt;
use std::ops::Range;

use memchr::memmem;
use regex::bytes::Regex;

use crate::error::ConfigError;

/// Trait for prompt matching - regex by default, extensible for custom parsers.
pub trait PromptMatcher: Send + Sync {
    /// Returns the byte range of the first match, or None if no match.
    fn find_span(&self, data: &[u8]) -> Option<Range<usize>>;

    /// Check if the data matches the pattern.
    fn is_match(&self, data: &[u8]) -> bool {
        self.find_span(data).is_some()
    }
}

impl PromptMatcher for Regex {
    fn find_span(&self, data: &[u8]) -> Option<Range<usize>> {
        self.find(data).map(|m| m.range())
    }
}

/// One alternative passed to [`Console::expect`](super::Console::expect).
#[derive(Clone)]
pub enum Pattern {
    /// Exact byte sequence.
    Literal(String),

    /// Regular expression over the raw bytes.
    Regex(Regex),

    /// Sentinel that "matches" when nothing else did within the timeout.
    Timeout,
}

impl Pattern {
    /// Create a literal pattern.
    pub fn literal(text: impl Into<String>) -> Self {
        Pattern::Literal(text.into())
    }

    /// Compile a regex pattern.
    pub fn regex(pattern: &str) -> Result<Self, ConfigError> {
        Ok(Pattern::Regex(Regex::new(pattern)?))
    }

    /// Build the prompt pattern from its configured text.
    ///
    /// An empty prompt is rejected: it would match before any output arrived.
    pub fn prompt(text: &str, is_regex: bool) -> Result<Self, ConfigError> {
        if text.is_empty() {
            return Err(ConfigError::EmptyPrompt);
        }
        if is_regex {
            Self::regex(text)
        } else {
            Ok(Self::literal(text))
        }
    }

    /// Whether this is the timeout sentinel.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Pattern::Timeout)
    }
}

impl PromptMatcher for Pattern {
    fn find_span(&self, data: &[u8]) -> Option<Range<usize>> {
        match self {
            Pattern::Literal(text) => {
                let needle = text.as_bytes();
                memmem::find(data, needle).map(|start| start..start + needle.len())
            }
            Pattern::Regex(re) => re.find_span(data),
            Pattern::Timeout => None,
        }
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(text) => write!(f, "Literal({:?})", text),
            Pattern::Regex(re) => write!(f, "Regex({:?})", re.as_str()),
            Pattern::Timeout => write!(f, "Timeout"),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::Literal(text) => write!(f, "{}", text),
            Pattern::Regex(re) => write!(f, "{}", re.as_str()),
            Pattern::Timeout => write!(f, "<timeout>"),
        }
    }
}

/// Find the earliest match among `patterns`.
///
/// Returns the index of the winning pattern and its byte range. When two
/// patterns match at the same offset the one listed first wins.
pub fn find_first(patterns: &[Pattern], data: &[u8]) -> Option<(usize, Range<usize>)> {
    patterns
        .iter()
        .enumerate()
        .filter_map(|(index, pattern)| pattern.find_span(data).map(|span| (index, span)))
        .min_by_key(|(index, span)| (span.start, *index))
}
