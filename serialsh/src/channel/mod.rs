//! Channel layer for pattern matching on an interactive console.
//!
//! This module defines the [`Console`] contract the driver is built on,
//! the [`Pattern`] alternatives passed to `expect`, and the buffer used by
//! stream-backed consoles to accumulate and search output.

mod buffer;
#[cfg(test)]
pub(crate) mod mock;
mod patterns;

pub use buffer::PatternBuffer;
pub use patterns::{Pattern, PromptMatcher, find_first};

use std::future::Future;
use std::time::Duration;

use crate::error::ConsoleError;

/// Outcome of a successful [`Console::expect`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    /// Index of the pattern that matched.
    pub index: usize,

    /// Everything received before the match.
    ///
    /// When the timeout sentinel matched, this is all output still pending.
    pub before: Vec<u8>,

    /// The matched bytes (empty for the timeout sentinel).
    pub matched: Vec<u8>,
}

impl Expectation {
    /// Get the bytes before the match as a string (lossy UTF-8).
    pub fn before_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.before)
    }
}

/// A byte-oriented interactive console.
///
/// Implementations own the underlying stream; the driver only ever holds
/// one console and never shares it.
pub trait Console: Send {
    /// Write `line` followed by the line terminator.
    fn send_line(&mut self, line: &str) -> impl Future<Output = Result<(), ConsoleError>> + Send;

    /// Wait up to `timeout` for one of `patterns` to show up.
    ///
    /// If nothing matched in time and `patterns` contains
    /// [`Pattern::Timeout`], the sentinel's index is returned together with
    /// the pending output, which stays buffered. Without a sentinel a
    /// [`ConsoleError::Timeout`] is returned instead.
    fn expect(
        &mut self,
        patterns: &[Pattern],
        timeout: Duration,
    ) -> impl Future<Output = Result<Expectation, ConsoleError>> + Send;
}

/// Resolve an expired `expect` call against the timeout sentinel.
pub fn resolve_timeout(
    patterns: &[Pattern],
    pending: &[u8],
    timeout: Duration,
) -> Result<Expectation, ConsoleError> {
    match patterns.iter().position(Pattern::is_timeout) {
        Some(index) => Ok(Expectation {
            index,
            before: pending.to_vec(),
            matched: Vec::new(),
        }),
        None => Err(ConsoleError::Timeout(timeout)),
    }
}
