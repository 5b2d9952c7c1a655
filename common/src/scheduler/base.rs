// Base poller abstraction wrapped by the triggerable poller

use crate::errors::PollerError;
use crate::scheduler::task::ScheduledTask;

/// A periodic scheduling primitive that owns the timer and cadence.
///
/// Implementations run the scheduled task on their own worker; callers
/// only hand tasks over and ask the cadence to stop.
pub trait BasePoller: Send + Sync {
    /// Start running `task` on this poller's cadence
    fn schedule(&self, task: ScheduledTask) -> Result<(), PollerError>;

    /// Stop the cadence. Calling it more than once has no further effect.
    fn stop(&self);
}
