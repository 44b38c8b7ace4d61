//! Result type for command execution.

use std::time::Duration;

/// Output of one command run on the shell.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// The command that was executed.
    pub command: String,

    /// Output lines, without the echoed command and the trailing prompt fragment.
    pub lines: Vec<String>,

    /// Everything received before the prompt, decoded as text.
    pub raw_result: String,

    /// Time taken to execute the command.
    pub elapsed: Duration,

    /// Failure marker found in the output, if any.
    pub failure_message: Option<String>,
}

impl CommandResult {
    /// Create a new successful result.
    pub fn new(
        command: impl Into<String>,
        lines: Vec<String>,
        raw_result: impl Into<String>,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            lines,
            raw_result: raw_result.into(),
            elapsed,
            failure_message: None,
        }
    }

    /// Build a result from the bytes received before the prompt.
    ///
    /// The first line containing one of `failed_when_contains` marks the
    /// result as failed.
    pub(crate) fn from_output(
        command: &str,
        before: &[u8],
        elapsed: Duration,
        failed_when_contains: &[String],
    ) -> Self {
        let raw = String::from_utf8_lossy(before).into_owned();
        let lines = split_output(&raw);
        let failure_message = failed_when_contains
            .iter()
            .find(|marker| lines.iter().any(|line| line.contains(marker.as_str())))
            .cloned();

        Self {
            command: command.to_string(),
            lines,
            raw_result: raw,
            elapsed,
            failure_message,
        }
    }

    /// Check if the result indicates success.
    pub fn is_success(&self) -> bool {
        self.failure_message.is_none()
    }

    /// Check if any output line contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.lines.iter().any(|line| line.contains(pattern))
    }

    /// Take the output lines.
    pub fn into_lines(self) -> Vec<String> {
        self.lines
    }
}

impl std::fmt::Display for CommandResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.lines.join("\n"))
    }
}

/// Split raw command output into lines.
///
/// The first line is the echoed command and the last one is whatever
/// preceded the prompt on its line; both are dropped. Lines end in `\n`
/// with an optional `\r`.
pub fn split_output(raw: &str) -> Vec<String> {
    let lines: Vec<&str> = raw
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    if lines.len() < 2 {
        return Vec::new();
    }
    lines[1..lines.len() - 1]
        .iter()
        .map(|line| line.to_string())
        .collect()
}
