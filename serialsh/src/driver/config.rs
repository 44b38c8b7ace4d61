//! Shell driver configuration.

use std::time::Duration;

use serde::Deserialize;

use crate::channel::Pattern;
use crate::error::ConfigError;

/// Configuration for a [`ShellDriver`](super::ShellDriver).
///
/// The defaults fit the Zephyr shell. Durations are given in seconds when
/// deserialized:
///
/// ```json
/// { "prompt": "uart:~$ ", "login_timeout": 120, "probe_interval": 0.5 }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Prompt printed by the shell when it is ready for input.
    pub prompt: String,

    /// Treat `prompt` as a regular expression instead of literal text.
    pub prompt_regex: bool,

    /// Overall time allowed for finding the prompt.
    #[serde(deserialize_with = "seconds")]
    pub login_timeout: Duration,

    /// Timeout of a single poll while waiting for the prompt.
    #[serde(deserialize_with = "seconds")]
    pub probe_interval: Duration,

    /// Default timeout for commands.
    #[serde(deserialize_with = "seconds")]
    pub command_timeout: Duration,

    /// Command that must not exist, sent to check the shell is alive.
    pub validation_command: String,

    /// What the shell prints after `<validation_command>: `.
    pub not_found_fragment: String,

    /// Timeout for the not-found reply.
    #[serde(deserialize_with = "seconds")]
    pub not_found_timeout: Duration,

    /// Timeout for the prompt following the not-found reply.
    #[serde(deserialize_with = "seconds")]
    pub prompt_timeout: Duration,

    /// Sent on every activation to keep log messages out of command output.
    pub disable_logging_command: Option<String>,

    /// Command that reboots the target.
    pub reboot_command: String,

    /// Output fragments that mark a command as failed.
    pub failed_when_contains: Vec<String>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt: String::new(),
            prompt_regex: false,
            login_timeout: Duration::from_secs(60),
            probe_interval: Duration::from_secs(2),
            command_timeout: Duration::from_secs(30),
            validation_command: "invalidCommand42".to_string(),
            not_found_fragment: "command not found".to_string(),
            not_found_timeout: Duration::from_secs(2),
            prompt_timeout: Duration::from_secs(1),
            disable_logging_command: Some("log disable".to_string()),
            reboot_command: "kernel reboot cold".to_string(),
            failed_when_contains: vec!["command not found".to_string()],
        }
    }
}

impl ShellConfig {
    /// Create a configuration with default settings for `prompt`.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }

    /// Compile the prompt pattern.
    pub fn prompt_pattern(&self) -> Result<Pattern, ConfigError> {
        Pattern::prompt(&self.prompt, self.prompt_regex)
    }

    /// Pattern of the shell's reply to the validation command.
    pub fn not_found_pattern(&self) -> Pattern {
        Pattern::literal(format!(
            "{}: {}",
            self.validation_command, self.not_found_fragment
        ))
    }
}

fn seconds<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
}
