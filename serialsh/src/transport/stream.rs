//! Console implementation over a tokio byte stream.

use std::time::Duration;

use log::{debug, trace};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Instant;

use super::config::StreamConfig;
use crate::channel::{Console, Expectation, Pattern, PatternBuffer, resolve_timeout};
use crate::error::{ConsoleError, Result};

/// Interactive console over any `AsyncRead + AsyncWrite` stream.
///
/// Received bytes are kept in a [`PatternBuffer`] until a pattern match
/// consumes them. A timed-out `expect` leaves the buffer untouched, up to
/// [`StreamConfig::max_pending`] bytes.
pub struct StreamConsole<S> {
    /// The underlying byte stream.
    stream: S,

    /// Output received but not consumed by a match yet.
    buffer: PatternBuffer,

    /// Configuration used for this console.
    config: StreamConfig,
}

impl<S> StreamConsole<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap an already connected stream.
    pub fn new(stream: S, config: StreamConfig) -> Self {
        Self {
            buffer: PatternBuffer::new(
                config.search_depth,
                config.max_pending,
                config.strip_ansi,
            ),
            stream,
            config,
        }
    }

    /// Get a reference to the pending output.
    pub fn buffer(&self) -> &PatternBuffer {
        &self.buffer
    }

    /// Drop all pending output.
    ///
    /// Useful before activating a driver again after a failed activation,
    /// so that stale log output is not carried into the next attempt.
    pub fn clear_buffer(&mut self) {
        self.buffer.clear();
    }

    /// Get the configuration.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Give back the underlying stream, discarding pending output.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

impl StreamConsole<TcpStream> {
    /// Connect to a network console such as ser2net or QEMU's TCP serial.
    pub async fn connect(addr: &str, config: StreamConfig) -> Result<Self> {
        let stream = tokio::time::timeout(config.connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ConsoleError::ConnectTimeout {
                addr: addr.to_string(),
                timeout: config.connect_timeout,
            })?
            .map_err(ConsoleError::Io)?;
        stream.set_nodelay(true).map_err(ConsoleError::Io)?;

        debug!("console connected to {}", addr);
        Ok(Self::new(stream, config))
    }
}

impl<S> Console for StreamConsole<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn send_line(&mut self, line: &str) -> std::result::Result<(), ConsoleError> {
        let mut data = Vec::with_capacity(line.len() + self.config.line_ending.len());
        data.extend_from_slice(line.as_bytes());
        data.extend_from_slice(self.config.line_ending.as_bytes());

        trace!("console write: {:?}", line);
        self.stream.write_all(&data).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn expect(
        &mut self,
        patterns: &[Pattern],
        timeout: Duration,
    ) -> std::result::Result<Expectation, ConsoleError> {
        let deadline = Instant::now() + timeout;
        let mut chunk = vec![0u8; self.config.read_chunk_size];
        self.buffer.rewind();

        loop {
            if let Some((index, span)) = self.buffer.search(patterns) {
                let (before, matched) = self.buffer.consume(span);
                trace!(
                    "console matched {:?} after {} bytes",
                    patterns[index],
                    before.len()
                );
                return Ok(Expectation {
                    index,
                    before,
                    matched,
                });
            }

            match tokio::time::timeout_at(deadline, self.stream.read(&mut chunk)).await {
                Err(_) => {
                    trace!(
                        "console expect timed out after {:?}, {} bytes pending",
                        timeout,
                        self.buffer.len()
                    );
                    return resolve_timeout(patterns, self.buffer.as_slice(), timeout);
                }
                Ok(Ok(0)) => return Err(ConsoleError::Closed),
                Ok(Ok(n)) => {
                    trace!("console read {} bytes", n);
                    self.buffer.extend(&chunk[..n]);
                }
                Ok(Err(e)) => return Err(ConsoleError::Io(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::duplex;

    fn plain() -> StreamConfig {
        StreamConfig::default().with_strip_ansi(false)
    }

    #[tokio::test]
    async fn test_expect_returns_output_before_prompt() {
        let (client, mut device) = duplex(1024);
        let mut console = StreamConsole::new(client, plain());

        device.write_all(b"*** Booting Zephyr ***\r\nuart:~$ ").await.unwrap();

        let exp = console
            .expect(&[Pattern::literal("uart:~$ ")], Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(exp.index, 0);
        assert_eq!(exp.before_str(), "*** Booting Zephyr ***\r\n");
        assert_eq!(exp.matched, b"uart:~$ ");
        assert!(console.buffer().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_keeps_pending_output() {
        let (client, mut device) = duplex(1024);
        let mut console = StreamConsole::new(client, plain());
        let patterns = [Pattern::literal("uart:~$ "), Pattern::Timeout];

        device.write_all(b"loading").await.unwrap();

        let first = console.expect(&patterns, Duration::from_secs(2)).await.unwrap();
        assert_eq!(first.index, 1);
        assert_eq!(first.before_str(), "loading");

        // Nothing new arrived: the capture is byte-for-byte identical.
        let second = console.expect(&patterns, Duration::from_secs(2)).await.unwrap();
        assert_eq!(second, first);

        device.write_all(b" done\r\nuart:~$ ").await.unwrap();
        let third = console.expect(&patterns, Duration::from_secs(2)).await.unwrap();
        assert_eq!(third.index, 0);
        assert_eq!(third.before_str(), "loading done\r\n");
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_without_sentinel_is_an_error() {
        let (client, _device) = duplex(1024);
        let mut console = StreamConsole::new(client, plain());

        let start = Instant::now();
        let err = console
            .expect(&[Pattern::literal("uart:~$ ")], Duration::from_secs(3))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Timeout(d) if d == Duration::from_secs(3)));
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_closed_stream() {
        let (client, device) = duplex(1024);
        let mut console = StreamConsole::new(client, plain());
        drop(device);

        let err = console
            .expect(&[Pattern::literal("uart:~$ ")], Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::Closed));
    }

    #[tokio::test]
    async fn test_earliest_pattern_wins() {
        let (client, mut device) = duplex(1024);
        let mut console = StreamConsole::new(client, plain());

        device
            .write_all(b"invalidCommand42: command not found\r\nuart:~$ ")
            .await
            .unwrap();

        let patterns = [
            Pattern::literal("uart:~$ "),
            Pattern::literal("invalidCommand42: command not found"),
        ];
        let exp = console.expect(&patterns, Duration::from_secs(1)).await.unwrap();
        assert_eq!(exp.index, 1);

        // The prompt is still buffered for the next call.
        let exp = console.expect(&patterns, Duration::from_secs(1)).await.unwrap();
        assert_eq!(exp.index, 0);
        assert_eq!(exp.before_str(), "\r\n");
    }

    #[tokio::test]
    async fn test_send_line_appends_terminator() {
        let mock = tokio_test::io::Builder::new()
            .write(b"kernel version\r\n")
            .read(b"kernel version\r\nZephyr version 3.6.0\r\nuart:~$ ")
            .build();
        let mut console = StreamConsole::new(mock, plain().with_line_ending("\r\n"));

        console.send_line("kernel version").await.unwrap();
        let exp = console
            .expect(&[Pattern::literal("uart:~$ ")], Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(exp.before_str(), "kernel version\r\nZephyr version 3.6.0\r\n");
    }

    #[tokio::test]
    async fn test_colored_prompt_is_stripped() {
        let (client, mut device) = duplex(1024);
        let mut console = StreamConsole::new(client, StreamConfig::default());

        device.write_all(b"\x1b[1;32muart:~$ \x1b[m").await.unwrap();

        let exp = console
            .expect(&[Pattern::literal("uart:~$ ")], Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(exp.index, 0);
    }

    #[tokio::test]
    async fn test_reply_followed_by_log_burst_in_one_read() {
        let (client, mut device) = duplex(16 * 1024);
        let mut console = StreamConsole::new(client, plain());

        let mut payload = b"invalidCommand42: command not found\r\nuart:~$ ".to_vec();
        for i in 0..40 {
            payload.extend_from_slice(
                format!("[00:00:02.{:03},000] <inf> sensor: sample {}\r\n", i, i).as_bytes(),
            );
        }
        assert!(payload.len() > console.config().search_depth);
        device.write_all(&payload).await.unwrap();

        let exp = console
            .expect(
                &[Pattern::literal("invalidCommand42: command not found")],
                Duration::from_secs(2),
            )
            .await
            .unwrap();
        assert_eq!(exp.index, 0);
        assert!(exp.before.is_empty());

        let exp = console
            .expect(&[Pattern::literal("uart:~$ ")], Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(exp.before_str(), "\r\n");
        assert!(console.buffer().as_slice().ends_with(b"sample 39\r\n"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_output_is_bounded() {
        let (client, mut device) = duplex(8 * 1024);
        let mut console = StreamConsole::new(client, plain().with_max_pending(256));
        let patterns = [Pattern::literal("uart:~$ "), Pattern::Timeout];

        device.write_all(&[b'.'; 1000]).await.unwrap();
        device.write_all(b"tail").await.unwrap();

        let exp = console.expect(&patterns, Duration::from_secs(2)).await.unwrap();
        assert_eq!(exp.index, 1);
        assert_eq!(exp.before.len(), 256);
        assert!(exp.before.ends_with(b"tail"));

        console.clear_buffer();
        assert!(console.buffer().is_empty());
    }
}
