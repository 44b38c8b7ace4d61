//! Scripted console for driver tests.

use std::collections::VecDeque;
use std::time::Duration;

use super::{Console, Expectation, Pattern, resolve_timeout};
use crate::error::ConsoleError;

/// What the mock answers to one `expect` call.
#[derive(Debug, Clone)]
pub(crate) enum Reply {
    /// Pattern `index` matched after `before`.
    Match { index: usize, before: String },

    /// Nothing matched; `pending` is all output buffered so far.
    /// The mock sleeps for the full timeout before answering.
    Timeout(String),

    /// The stream went away.
    Closed,
}

impl Reply {
    pub(crate) fn matched(index: usize, before: &str) -> Self {
        Reply::Match {
            index,
            before: before.to_string(),
        }
    }

    pub(crate) fn timeout(pending: &str) -> Self {
        Reply::Timeout(pending.to_string())
    }
}

/// Everything the driver did to the console, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Event {
    Write(String),
    Expect { patterns: Vec<String>, timeout: Duration },
}

type Fallback = Box<dyn FnMut(usize) -> Reply + Send>;

/// Console that plays back scripted replies.
///
/// Once the script runs out, `fallback` (called with the number of
/// `expect` calls so far) produces the replies; without one the console
/// stays silent.
pub(crate) struct MockConsole {
    script: VecDeque<Reply>,
    fallback: Option<Fallback>,
    expect_calls: usize,
    pub(crate) events: Vec<Event>,
}

impl MockConsole {
    pub(crate) fn new(script: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            script: script.into_iter().collect(),
            fallback: None,
            expect_calls: 0,
            events: Vec::new(),
        }
    }

    pub(crate) fn with_fallback(mut self, fallback: impl FnMut(usize) -> Reply + Send + 'static) -> Self {
        self.fallback = Some(Box::new(fallback));
        self
    }

    /// Lines written so far.
    pub(crate) fn written(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Write(line) => Some(line.as_str()),
                Event::Expect { .. } => None,
            })
            .collect()
    }

    /// Number of scripted replies not consumed yet.
    pub(crate) fn remaining(&self) -> usize {
        self.script.len()
    }

    fn next_reply(&mut self) -> Reply {
        let calls = self.expect_calls;
        self.expect_calls += 1;
        if let Some(reply) = self.script.pop_front() {
            return reply;
        }
        match self.fallback.as_mut() {
            Some(fallback) => fallback(calls),
            None => Reply::Timeout(String::new()),
        }
    }
}

impl Console for MockConsole {
    async fn send_line(&mut self, line: &str) -> Result<(), ConsoleError> {
        self.events.push(Event::Write(line.to_string()));
        Ok(())
    }

    async fn expect(
        &mut self,
        patterns: &[Pattern],
        timeout: Duration,
    ) -> Result<Expectation, ConsoleError> {
        self.events.push(Event::Expect {
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            timeout,
        });

        match self.next_reply() {
            Reply::Match { index, before } => {
                assert!(
                    index < patterns.len() && !patterns[index].is_timeout(),
                    "scripted match index {} invalid for {:?}",
                    index,
                    patterns
                );
                Ok(Expectation {
                    index,
                    before: before.into_bytes(),
                    matched: patterns[index].to_string().into_bytes(),
                })
            }
            Reply::Timeout(pending) => {
                tokio::time::sleep(timeout).await;
                resolve_timeout(patterns, pending.as_bytes(), timeout)
            }
            Reply::Closed => Err(ConsoleError::Closed),
        }
    }
}
