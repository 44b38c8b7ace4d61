//! # serialsh
//!
//! Async driver for interactive shells on serial and telnet-style consoles.
//!
//! serialsh waits for a shell prompt on a byte-stream console, checks the
//! shell is really answering, runs commands and parses their output, and
//! reboots the target through its shell.
//!
//! ## Features
//!
//! - Prompt synchronization with idle detection: a stalled console gets a
//!   single empty line to make it print the prompt again
//! - Prompt validation by round-tripping a command that does not exist
//! - Command output split into lines, with the echo and prompt removed
//! - Console abstraction with a tokio stream implementation (TCP, pipes)
//! - ANSI escape stripping and tail-only pattern search
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use serialsh::{CommandRunner, ShellDriverBuilder};
//! use serialsh::transport::{StreamConfig, StreamConsole};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), serialsh::Error> {
//!     let console = StreamConsole::connect("127.0.0.1:5555", StreamConfig::default()).await?;
//!     let mut shell = ShellDriverBuilder::new("uart:~$ ").build(console)?;
//!
//!     shell.activate().await?;
//!
//!     let result = shell.run("kernel version").await?;
//!     println!("{}", result);
//!
//!     shell.deactivate();
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod driver;
pub mod error;
pub mod transport;

// Re-export main types for convenience
pub use channel::{Console, Expectation, Pattern};
pub use driver::{
    CommandResult, CommandRunner, ResettableBootTarget, ShellConfig, ShellDriver,
    ShellDriverBuilder, Status,
};
pub use error::Error;
pub use transport::{StreamConfig, StreamConsole};
