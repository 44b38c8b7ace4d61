//! High-level driver for interactive shells.
//!
//! The driver layer synchronizes with the shell prompt, runs commands and
//! reboots the target. Its capabilities are split into the
//! [`CommandRunner`] and [`ResettableBootTarget`] traits.

mod builder;
pub mod config;
mod response;
mod shell;
pub mod step;

pub use builder::ShellDriverBuilder;
pub use config::ShellConfig;
pub use response::{CommandResult, split_output};
pub use shell::ShellDriver;
pub use step::{LogObserver, Step, StepObserver, StepRecord, StepRecorder};

use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::error::{DriverError, Result};

/// Whether the driver is synchronized with a live shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Status {
    /// Not synchronized; commands are rejected.
    #[default]
    Inactive = 0,

    /// Prompt found and validated.
    Active = 1,
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        status as u8
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Inactive => write!(f, "inactive"),
            Status::Active => write!(f, "active"),
        }
    }
}

/// Something that runs shell commands and returns their output.
pub trait CommandRunner: Send {
    /// Run a command with the default timeout.
    fn run(&mut self, command: &str) -> impl Future<Output = Result<CommandResult>> + Send;

    /// Run a command, waiting at most `timeout` for the prompt to return.
    fn run_with_timeout(
        &mut self,
        command: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<CommandResult>> + Send;

    /// Run a command and fail if its output contains a failure marker.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use serialsh::driver::CommandRunner;
    ///
    /// # async fn example(shell: &mut impl CommandRunner) -> Result<(), serialsh::Error> {
    /// let lines = shell.run_check("kernel uptime").await?;
    /// println!("{}", lines.join("\n"));
    /// # Ok(())
    /// # }
    /// ```
    fn run_check(&mut self, command: &str) -> impl Future<Output = Result<Vec<String>>> + Send {
        async move {
            let result = self.run(command).await?;
            match result.failure_message {
                Some(message) => Err(DriverError::CommandFailed {
                    command: command.to_string(),
                    message,
                }
                .into()),
                None => Ok(result.lines),
            }
        }
    }
}

/// A target that can be rebooted from its shell.
pub trait ResettableBootTarget: Send {
    /// Reboot the target. The driver must be re-activated afterwards.
    fn reset(&mut self) -> impl Future<Output = Result<()>> + Send;

    /// Boot a named image.
    fn boot(&mut self, name: &str) -> impl Future<Output = Result<()>> + Send;

    /// Wait until the target finished booting.
    fn await_boot(&mut self) -> impl Future<Output = Result<()>> + Send;
}
