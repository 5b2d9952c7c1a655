// Scheduler module: base pollers and the on-demand trigger wrapper

pub mod base;
pub mod fixed_delay;
pub mod task;
pub mod triggerable;

pub use base::BasePoller;
pub use fixed_delay::{FixedDelayConfig, FixedDelayPoller};
pub use task::{ScheduledTask, TaskResult};
pub use triggerable::{FailureHook, PollerState, TriggerablePoller};
