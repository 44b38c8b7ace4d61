//! Stream console configuration.

use std::time::Duration;

/// Configuration for a [`StreamConsole`](super::StreamConsole).
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Terminator appended by `send_line`.
    pub line_ending: String,

    /// How many already searched bytes are searched again after a read.
    pub search_depth: usize,

    /// Unmatched output kept at most; older bytes are dropped.
    pub max_pending: usize,

    /// Remove ANSI escape sequences from received data.
    pub strip_ansi: bool,

    /// Size of a single read from the stream.
    pub read_chunk_size: usize,

    /// Timeout for establishing network connections.
    pub connect_timeout: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            line_ending: "\n".to_string(),
            search_depth: 1000,
            max_pending: 64 * 1024,
            strip_ansi: true,
            read_chunk_size: 4096,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl StreamConfig {
    /// Set the line terminator.
    pub fn with_line_ending(mut self, line_ending: impl Into<String>) -> Self {
        self.line_ending = line_ending.into();
        self
    }

    /// Set the pattern search depth.
    pub fn with_search_depth(mut self, search_depth: usize) -> Self {
        self.search_depth = search_depth;
        self
    }

    /// Set how much unmatched output is kept.
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending;
        self
    }

    /// Enable or disable ANSI stripping.
    pub fn with_strip_ansi(mut self, strip_ansi: bool) -> Self {
        self.strip_ansi = strip_ansi;
        self
    }
}
