//! Byte-stream consoles built on tokio I/O.
//!
//! The driver only needs something implementing
//! [`Console`](crate::channel::Console). This module provides one for any
//! `AsyncRead + AsyncWrite` stream: a TCP socket exported by ser2net or
//! QEMU's `-serial tcp:`, a serial port wrapper, or an in-memory pipe.

pub mod config;
mod stream;

pub use config::StreamConfig;
pub use stream::StreamConsole;
