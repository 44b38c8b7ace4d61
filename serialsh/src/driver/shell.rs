//! Shell driver: prompt synchronization, validation, commands and reboot.

use std::slice;
use std::sync::Arc;
use std::time::Duration;

use log::{debug, trace};
use tokio::time::Instant;

use super::config::ShellConfig;
use super::response::CommandResult;
use super::step::{LogObserver, StepObserver, StepScope};
use super::{CommandRunner, ResettableBootTarget, Status};
use crate::channel::{Console, Pattern};
use crate::error::{ConsoleError, DriverError, Error, Result, ValidationStage};

/// Driver for a line-oriented shell on an interactive console.
///
/// The driver starts [`Status::Inactive`]. [`activate`](Self::activate)
/// waits for the prompt, checks that the shell answers, and only then
/// allows commands and resets.
///
/// # Example
///
/// ```rust,no_run
/// use serialsh::{CommandRunner, ResettableBootTarget, ShellDriverBuilder};
/// use serialsh::transport::{StreamConfig, StreamConsole};
///
/// # async fn example() -> Result<(), serialsh::Error> {
/// let console = StreamConsole::connect("127.0.0.1:5555", StreamConfig::default()).await?;
/// let mut shell = ShellDriverBuilder::new("uart:~$ ").build(console)?;
///
/// shell.activate().await?;
/// for line in shell.run("kernel version").await?.lines {
///     println!("{}", line);
/// }
/// shell.reset().await?;
/// # Ok(())
/// # }
/// ```
pub struct ShellDriver<C> {
    /// The console the shell runs on.
    console: C,

    /// Driver configuration.
    config: ShellConfig,

    /// Compiled prompt pattern.
    prompt: Pattern,

    /// Synchronization state.
    status: Status,

    /// Receives step notifications.
    observer: Arc<dyn StepObserver>,
}

impl<C: Console> ShellDriver<C> {
    /// Create an inactive driver on top of `console`.
    pub fn new(console: C, config: ShellConfig) -> Result<Self> {
        let prompt = config.prompt_pattern()?;
        Ok(Self {
            console,
            config,
            prompt,
            status: Status::Inactive,
            observer: Arc::new(LogObserver),
        })
    }

    /// Report steps to `observer`.
    pub fn with_observer(mut self, observer: Arc<dyn StepObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Current synchronization state.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Check if the driver is active.
    pub fn is_active(&self) -> bool {
        self.status == Status::Active
    }

    /// Get the configuration.
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Get the compiled prompt pattern.
    pub fn prompt(&self) -> &Pattern {
        &self.prompt
    }

    /// Get a reference to the console.
    pub fn console(&self) -> &C {
        &self.console
    }

    /// Get a mutable reference to the console.
    ///
    /// Reading from the console directly can swallow a prompt the driver
    /// is waiting for.
    pub fn console_mut(&mut self) -> &mut C {
        &mut self.console
    }

    /// Give back the console.
    pub fn into_console(self) -> C {
        self.console
    }

    /// Synchronize with the shell.
    ///
    /// Waits for the prompt and validates it unless the driver is already
    /// active, then sends the configured logging-disable command.
    pub async fn activate(&mut self) -> Result<()> {
        let scope = StepScope::begin(&self.observer, "activate", Vec::new());
        let result = self.activate_inner().await;
        scope.finish(&result);
        result
    }

    async fn activate_inner(&mut self) -> Result<()> {
        if self.status == Status::Inactive {
            self.await_prompt().await?;
        }

        if let Some(command) = self.config.disable_logging_command.clone() {
            let timeout = self.config.command_timeout;
            self.execute(&command, timeout).await?;
        }
        Ok(())
    }

    /// Mark the driver inactive. The console is left untouched.
    pub fn deactivate(&mut self) {
        debug!("shell driver deactivated");
        self.status = Status::Inactive;
    }

    /// Reject the call unless the driver is active.
    fn ensure_active(&self) -> Result<()> {
        if self.status == Status::Active {
            Ok(())
        } else {
            Err(DriverError::NotActive.into())
        }
    }

    /// Entry of a guarded public operation: check the state, then trace it.
    fn enter(&self, name: &'static str, args: Vec<(&'static str, String)>) -> Result<StepScope> {
        self.ensure_active()?;
        Ok(StepScope::begin(&self.observer, name, args))
    }

    /// Wait for the prompt, then validate it.
    async fn await_prompt(&mut self) -> Result<()> {
        let scope = StepScope::begin(&self.observer, "await_prompt", Vec::new());
        let result = match self.synchronize().await {
            Ok(()) => self.check_prompt().await,
            Err(e) => Err(e),
        };
        scope.finish(&result);
        result
    }

    /// Poll for the prompt until it shows up or the login timeout expires.
    ///
    /// Each poll waits `probe_interval`. A poll that times out with exactly
    /// the same pending output as the previous one means the console is
    /// idle, and an empty line is sent to make the shell print its prompt.
    /// Only one such probe is sent per stall; the next one needs the
    /// output to change and then stall again.
    async fn synchronize(&mut self) -> Result<()> {
        let login_timeout = self.config.login_timeout;
        let probe_interval = self.config.probe_interval;
        let deadline = Instant::now() + login_timeout;
        let patterns = [self.prompt.clone(), Pattern::Timeout];

        let mut last_before: Option<Vec<u8>> = None;
        let mut probed = false;

        loop {
            let exp = self.console.expect(&patterns, probe_interval).await?;

            if exp.index == 0 {
                debug!("prompt found");
                return Ok(());
            }

            if last_before.as_deref() == Some(exp.before.as_slice()) {
                if !probed {
                    debug!("console idle, probing for the prompt");
                    self.console.send_line("").await?;
                    probed = true;
                }
            } else {
                probed = false;
            }

            if Instant::now() >= deadline {
                return Err(DriverError::SynchronizationTimeout { login_timeout }.into());
            }

            last_before = Some(exp.before);
        }
    }

    /// Check the prompt belongs to a live shell by sending a command that
    /// does not exist and waiting for the error and the next prompt.
    ///
    /// This is the only place the driver becomes active, so dropping
    /// `activate` half way leaves it inactive.
    async fn check_prompt(&mut self) -> Result<()> {
        let result = self.validation_round_trip().await;
        self.status = if result.is_ok() {
            Status::Active
        } else {
            Status::Inactive
        };
        result
    }

    async fn validation_round_trip(&mut self) -> Result<()> {
        self.console
            .send_line(&self.config.validation_command)
            .await?;

        let not_found = self.config.not_found_pattern();
        let timeout = self.config.not_found_timeout;
        self.console
            .expect(slice::from_ref(&not_found), timeout)
            .await
            .map_err(|e| validation_error(e, ValidationStage::NotFoundReply, timeout))?;

        let timeout = self.config.prompt_timeout;
        self.console
            .expect(slice::from_ref(&self.prompt), timeout)
            .await
            .map_err(|e| validation_error(e, ValidationStage::Prompt, timeout))?;

        trace!("shell answered the validation command");
        Ok(())
    }

    /// Send a command and collect its output.
    ///
    /// Returns `None` without touching the console while inactive.
    async fn execute(&mut self, command: &str, timeout: Duration) -> Result<Option<CommandResult>> {
        if self.status != Status::Active {
            return Ok(None);
        }

        let start = Instant::now();
        self.console.send_line(command).await?;

        let exp = self
            .console
            .expect(slice::from_ref(&self.prompt), timeout)
            .await
            .map_err(|e| match e {
                ConsoleError::Timeout(_) => Error::from(DriverError::CommandTimeout {
                    command: command.to_string(),
                    timeout,
                }),
                other => other.into(),
            })?;

        let result = CommandResult::from_output(
            command,
            &exp.before,
            start.elapsed(),
            &self.config.failed_when_contains,
        );
        debug!("Received data: {:?}", result.lines);
        Ok(Some(result))
    }
}

fn validation_error(err: ConsoleError, stage: ValidationStage, timeout: Duration) -> Error {
    match err {
        ConsoleError::Timeout(_) => DriverError::ValidationTimeout { stage, timeout }.into(),
        other => other.into(),
    }
}

impl<C: Console> CommandRunner for ShellDriver<C> {
    async fn run(&mut self, command: &str) -> Result<CommandResult> {
        let timeout = self.config.command_timeout;
        self.run_with_timeout(command, timeout).await
    }

    async fn run_with_timeout(&mut self, command: &str, timeout: Duration) -> Result<CommandResult> {
        let scope = self.enter("run", vec![("cmd", command.to_string())])?;
        let result = self
            .execute(command, timeout)
            .await
            .and_then(|output| output.ok_or_else(|| DriverError::NotActive.into()));
        scope.finish(&result);
        result
    }
}

impl<C: Console> ResettableBootTarget for ShellDriver<C> {
    async fn reset(&mut self) -> Result<()> {
        let scope = self.enter("reset", Vec::new())?;
        // The target goes away as soon as the command is sent.
        self.status = Status::Inactive;
        let result = self
            .console
            .send_line(&self.config.reboot_command)
            .await
            .map_err(Error::from);
        scope.finish(&result);
        result
    }

    async fn boot(&mut self, _name: &str) -> Result<()> {
        self.ensure_active()?;
        Err(DriverError::Unsupported { operation: "boot" }.into())
    }

    async fn await_boot(&mut self) -> Result<()> {
        self.ensure_active()?;
        Err(DriverError::Unsupported {
            operation: "await_boot",
        }
        .into())
    }
}
