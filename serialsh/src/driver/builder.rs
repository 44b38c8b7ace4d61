//! Builder for creating shell drivers.

use std::sync::Arc;
use std::time::Duration;

use super::config::ShellConfig;
use super::shell::ShellDriver;
use super::step::StepObserver;
use crate::channel::Console;
use crate::error::Result;

/// Builder for constructing a [`ShellDriver`].
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
/// use serialsh::driver::ShellDriverBuilder;
/// use serialsh::transport::{StreamConfig, StreamConsole};
///
/// # async fn example() -> Result<(), serialsh::Error> {
/// let console = StreamConsole::connect("127.0.0.1:5555", StreamConfig::default()).await?;
/// let mut shell = ShellDriverBuilder::new("uart:~$ ")
///     .login_timeout(Duration::from_secs(120))
///     .build(console)?;
/// shell.activate().await?;
/// # Ok(())
/// # }
/// ```
pub struct ShellDriverBuilder {
    config: ShellConfig,
    observer: Option<Arc<dyn StepObserver>>,
}

impl ShellDriverBuilder {
    /// Create a new builder for a shell printing `prompt`.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self::from_config(ShellConfig::new(prompt))
    }

    /// Start from an existing configuration.
    pub fn from_config(config: ShellConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    /// Treat the prompt as a regular expression.
    pub fn regex_prompt(mut self) -> Self {
        self.config.prompt_regex = true;
        self
    }

    /// Set the overall time allowed for finding the prompt.
    pub fn login_timeout(mut self, timeout: Duration) -> Self {
        self.config.login_timeout = timeout;
        self
    }

    /// Set the timeout of a single poll while waiting for the prompt.
    pub fn probe_interval(mut self, interval: Duration) -> Self {
        self.config.probe_interval = interval;
        self
    }

    /// Set the default command timeout.
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.config.command_timeout = timeout;
        self
    }

    /// Set the validation command and the not-found text the shell prints for it.
    pub fn validation(
        mut self,
        command: impl Into<String>,
        not_found_fragment: impl Into<String>,
    ) -> Self {
        self.config.validation_command = command.into();
        self.config.not_found_fragment = not_found_fragment.into();
        self
    }

    /// Set the timeouts of the two validation steps.
    pub fn validation_timeouts(mut self, not_found: Duration, prompt: Duration) -> Self {
        self.config.not_found_timeout = not_found;
        self.config.prompt_timeout = prompt;
        self
    }

    /// Set the command issued on activation, `None` to skip it.
    pub fn disable_logging_command(mut self, command: Option<String>) -> Self {
        self.config.disable_logging_command = command;
        self
    }

    /// Set the reboot command.
    pub fn reboot_command(mut self, command: impl Into<String>) -> Self {
        self.config.reboot_command = command.into();
        self
    }

    /// Add an output fragment that marks a command as failed.
    pub fn failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.failed_when_contains.push(pattern.into());
        self
    }

    /// Report steps to `observer` instead of the log.
    pub fn observer(mut self, observer: Arc<dyn StepObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Build the driver on top of `console`.
    ///
    /// The driver starts inactive. Call `activate()` to synchronize with
    /// the shell.
    pub fn build<C: Console>(self, console: C) -> Result<ShellDriver<C>> {
        let driver = ShellDriver::new(console, self.config)?;
        Ok(match self.observer {
            Some(observer) => driver.with_observer(observer),
            None => driver,
        })
    }
}
