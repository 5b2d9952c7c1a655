// Poller with an on-demand trigger for the current scheduled task

use crate::errors::{panic_message, PollerError, TriggerFailure};
use crate::scheduler::base::BasePoller;
use crate::scheduler::fixed_delay::{FixedDelayConfig, FixedDelayPoller};
use crate::scheduler::task::ScheduledTask;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Callback receiving failures that `trigger_now` suppresses
pub type FailureHook = Arc<dyn Fn(&TriggerFailure) + Send + Sync>;

/// Whether a task has been recorded yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Nothing scheduled; `trigger_now` does nothing
    Empty,
    /// A task is recorded; `trigger_now` runs it
    Armed,
}

impl PollerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PollerState::Empty => "empty",
            PollerState::Armed => "armed",
        }
    }
}

/// Wraps a [`BasePoller`] so the most recently scheduled task can also be run
/// on demand, outside the base poller's cadence.
///
/// The held task starts empty and is overwritten by every `schedule` call.
/// It is never cleared.
pub struct TriggerablePoller<P: BasePoller = FixedDelayPoller> {
    base: P,
    current: Mutex<Option<ScheduledTask>>,
    schedule_lock: Mutex<()>,
    failure_hook: Option<FailureHook>,
}

impl TriggerablePoller<FixedDelayPoller> {
    /// Triggerable poller over a fixed-delay poller with default delays
    pub fn with_defaults() -> Self {
        Self::new(FixedDelayPoller::with_defaults())
    }

    /// Triggerable poller over a fixed-delay poller with the given delays
    pub fn fixed_delay(config: FixedDelayConfig) -> Result<Self, PollerError> {
        Ok(Self::new(FixedDelayPoller::new(config)?))
    }
}

impl Default for TriggerablePoller<FixedDelayPoller> {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl<P: BasePoller> TriggerablePoller<P> {
    pub fn new(base: P) -> Self {
        Self {
            base,
            current: Mutex::new(None),
            schedule_lock: Mutex::new(()),
            failure_hook: None,
        }
    }

    /// Report failures suppressed by `trigger_now` to `hook`.
    ///
    /// The hook runs on the triggering thread; a panic inside it is contained.
    pub fn with_failure_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&TriggerFailure) + Send + Sync + 'static,
    {
        self.failure_hook = Some(Arc::new(hook));
        self
    }

    /// Record `task` as the current task, then hand it to the base poller.
    ///
    /// Errors from the base poller are returned as-is. The task stays
    /// recorded even when the base poller rejects it.
    pub fn schedule(&self, task: ScheduledTask) -> Result<(), PollerError> {
        let _guard = self
            .schedule_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        *self.current.lock().unwrap_or_else(PoisonError::into_inner) = Some(task.clone());
        debug!(task = %task.name(), "Recorded scheduled task");

        self.base.schedule(task)
    }

    /// Run the current task synchronously on the calling thread.
    ///
    /// Does nothing if no task has been scheduled. Errors and panics raised
    /// by the task are discarded; this method always returns normally.
    ///
    /// A panicking task still goes through the process-wide panic hook, which
    /// by default prints the panic message to stderr before it is caught here.
    /// Install a silent hook with [`std::panic::set_hook`] if that output is
    /// unwanted.
    pub fn trigger_now(&self) {
        let Some(task) = self.current_task() else {
            return;
        };

        debug!(task = %task.name(), "Manual trigger");

        let failure = match catch_unwind(AssertUnwindSafe(|| task.run())) {
            Ok(Ok(())) => return,
            Ok(Err(source)) => TriggerFailure::Failed {
                task: task.name().to_string(),
                source,
            },
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                discard_payload(payload);
                TriggerFailure::Panicked {
                    task: task.name().to_string(),
                    message,
                }
            }
        };

        if let Some(hook) = &self.failure_hook {
            if let Err(payload) = catch_unwind(AssertUnwindSafe(|| hook(&failure))) {
                discard_payload(payload);
            }
        }
    }

    /// Snapshot of the current task, if any
    pub fn current_task(&self) -> Option<ScheduledTask> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn state(&self) -> PollerState {
        if self
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
        {
            PollerState::Armed
        } else {
            PollerState::Empty
        }
    }

    pub fn base(&self) -> &P {
        &self.base
    }

    /// Stop the base poller's cadence. `trigger_now` keeps working.
    pub fn stop(&self) {
        self.base.stop();
    }
}

impl<P: BasePoller + fmt::Debug> fmt::Debug for TriggerablePoller<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerablePoller")
            .field("base", &self.base)
            .field("state", &self.state())
            .field("failure_hook", &self.failure_hook.is_some())
            .finish()
    }
}

/// Drop a panic payload; dropping it may panic in turn, in which case it is leaked.
fn discard_payload(payload: Box<dyn Any + Send>) {
    if let Err(nested) = catch_unwind(AssertUnwindSafe(move || drop(payload))) {
        std::mem::forget(nested);
    }
}
