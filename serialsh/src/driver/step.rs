//! Step tracing for driver operations.
//!
//! Every public driver operation reports a [`Step`] with its name and
//! arguments to a [`StepObserver`] when it starts and when it finishes.
//! Observers only watch; they cannot change the outcome.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, warn};
use tokio::time::Instant;

use crate::error::{Error, Result};

/// A traced driver operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    /// Operation name, e.g. `run`.
    pub name: &'static str,

    /// Argument names and values.
    pub args: Vec<(&'static str, String)>,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, (name, value)) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={:?}", name, value)?;
        }
        write!(f, ")")
    }
}

/// Receives step start and finish notifications.
pub trait StepObserver: Send + Sync {
    /// Called when a step starts.
    fn step_started(&self, step: &Step);

    /// Called when a step finishes, with the error if it failed.
    fn step_finished(&self, step: &Step, elapsed: Duration, error: Option<&Error>);
}

/// Observer that writes steps to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogObserver;

impl StepObserver for LogObserver {
    fn step_started(&self, step: &Step) {
        debug!("step {} started", step);
    }

    fn step_finished(&self, step: &Step, elapsed: Duration, error: Option<&Error>) {
        match error {
            Some(e) => warn!("step {} failed after {:?}: {}", step, elapsed, e),
            None => debug!("step {} done in {:?}", step, elapsed),
        }
    }
}

/// A finished step as kept by [`StepRecorder`].
#[derive(Debug, Clone)]
pub struct StepRecord {
    pub step: Step,
    pub elapsed: Duration,
    /// Error message if the step failed.
    pub error: Option<String>,
}

/// Observer that keeps finished steps in memory.
#[derive(Debug, Default)]
pub struct StepRecorder {
    records: Mutex<Vec<StepRecord>>,
}

impl StepRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finished steps, oldest first.
    pub fn records(&self) -> Vec<StepRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Names of the finished steps, oldest first.
    pub fn names(&self) -> Vec<&'static str> {
        self.records().iter().map(|r| r.step.name).collect()
    }
}

impl StepObserver for StepRecorder {
    fn step_started(&self, _step: &Step) {}

    fn step_finished(&self, step: &Step, elapsed: Duration, error: Option<&Error>) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(StepRecord {
                step: step.clone(),
                elapsed,
                error: error.map(|e| e.to_string()),
            });
    }
}

/// An in-flight step; report the outcome with [`finish`](Self::finish).
pub(crate) struct StepScope {
    observer: Arc<dyn StepObserver>,
    step: Step,
    start: Instant,
}

impl StepScope {
    pub(crate) fn begin(
        observer: &Arc<dyn StepObserver>,
        name: &'static str,
        args: Vec<(&'static str, String)>,
    ) -> Self {
        let step = Step { name, args };
        observer.step_started(&step);
        Self {
            observer: observer.clone(),
            step,
            start: Instant::now(),
        }
    }

    pub(crate) fn finish<T>(self, result: &Result<T>) {
        self.observer
            .step_finished(&self.step, self.start.elapsed(), result.as_ref().err());
    }
}
