//! Pattern buffer with incremental search.
//!
//! A search covers the bytes that arrived since the previous one plus
//! `search_depth` bytes before them, so a console that streams a large log
//! does not make every read re-scan everything received since the last
//! match, and no received byte is ever skipped.

use std::ops::Range;

use bytes::{Buf, BytesMut};
use vte::{Parser, Perform};

use super::patterns::{Pattern, find_first};

/// Buffer for accumulating console output and searching it for patterns.
///
/// Bytes stay in the buffer until a match consumes them, so output that
/// arrived during a timed-out `expect` is still visible to the next one.
/// When more than `max_pending` bytes pile up without a match, the oldest
/// ones are dropped.
pub struct PatternBuffer {
    /// Pending, not yet matched output.
    buffer: BytesMut,

    /// How many already searched bytes are searched again, for matches
    /// that straddle two reads.
    search_depth: usize,

    /// Upper bound on pending bytes.
    max_pending: usize,

    /// Length of the buffer at the last search.
    searched: usize,

    /// Escape-sequence parser, `None` when stripping is disabled.
    stripper: Option<AnsiStripper>,
}

impl PatternBuffer {
    /// Create a new pattern buffer.
    ///
    /// # Arguments
    ///
    /// * `search_depth` - Number of already searched bytes to search again.
    /// * `max_pending` - Number of unmatched bytes kept at most.
    /// * `strip_ansi` - Remove ANSI escape sequences from incoming data.
    pub fn new(search_depth: usize, max_pending: usize, strip_ansi: bool) -> Self {
        Self {
            buffer: BytesMut::with_capacity(4096),
            search_depth,
            max_pending,
            searched: 0,
            stripper: strip_ansi.then(AnsiStripper::new),
        }
    }

    /// Append incoming data, stripping escape codes if enabled.
    pub fn extend(&mut self, data: &[u8]) {
        match self.stripper.as_mut() {
            Some(stripper) => stripper.strip_into(data, &mut self.buffer),
            None => self.buffer.extend_from_slice(data),
        }

        let excess = self.buffer.len().saturating_sub(self.max_pending);
        if excess > 0 {
            self.buffer.advance(excess);
            self.searched = self.searched.saturating_sub(excess);
        }
    }

    /// Search the bytes received since the last search for the earliest
    /// matching pattern.
    ///
    /// The returned range is relative to the start of the whole buffer.
    pub fn search(&mut self, patterns: &[Pattern]) -> Option<(usize, Range<usize>)> {
        let start = self.searched.saturating_sub(self.search_depth);
        self.searched = self.buffer.len();
        find_first(patterns, &self.buffer[start..])
            .map(|(index, span)| (index, span.start + start..span.end + start))
    }

    /// Make the next search cover the whole buffer.
    ///
    /// Needed whenever the patterns change between searches.
    pub fn rewind(&mut self) {
        self.searched = 0;
    }

    /// Remove everything up to the end of `span`.
    ///
    /// Returns the bytes before the match and the matched bytes.
    pub fn consume(&mut self, span: Range<usize>) -> (Vec<u8>, Vec<u8>) {
        let before = self.buffer.split_to(span.start);
        let matched = self.buffer.split_to(span.end - span.start);
        self.searched = self.searched.saturating_sub(span.end);
        (before.to_vec(), matched.to_vec())
    }

    /// Get a reference to the pending bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the current buffer length.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Drop all pending bytes.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.searched = 0;
    }
}

impl Default for PatternBuffer {
    fn default() -> Self {
        Self::new(1000, 64 * 1024, true)
    }
}

/// Streaming ANSI escape remover.
///
/// The parser keeps its state between chunks, so an escape sequence split
/// across two reads is still removed.
struct AnsiStripper {
    parser: Parser,
}

impl AnsiStripper {
    fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    fn strip_into(&mut self, data: &[u8], out: &mut BytesMut) {
        let mut sink = PlainText { out };
        self.parser.advance(&mut sink, data);
    }
}

/// Collects printable text and line control bytes, drops everything else.
struct PlainText<'a> {
    out: &'a mut BytesMut,
}

impl Perform for PlainText<'_> {
    fn print(&mut self, c: char) {
        let mut utf8 = [0u8; 4];
        self.out.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
    }

    fn execute(&mut self, byte: u8) {
        if matches!(byte, b'\n' | b'\r' | b'\t') {
            self.out.extend_from_slice(&[byte]);
        }
    }
}
