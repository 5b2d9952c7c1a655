// Error handling framework

use thiserror::Error;

/// Errors raised while scheduling work on a base poller.
///
/// These are the only errors that cross the public API: a failure of the
/// scheduled task itself never surfaces as a `PollerError`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PollerError {
    #[error("No Tokio runtime available on the calling thread")]
    NoRuntime,

    #[error("Invalid poller configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Poller has been stopped")]
    Stopped,
}

/// Failure of a task run outside the normal cadence.
///
/// Only ever handed to an optional failure hook; never returned to a caller.
#[derive(Error, Debug)]
pub enum TriggerFailure {
    #[error("Task '{task}' failed: {source:#}")]
    Failed {
        task: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Task '{task}' panicked: {message}")]
    Panicked { task: String, message: String },
}

impl TriggerFailure {
    /// Name of the task that failed
    pub fn task_name(&self) -> &str {
        match self {
            TriggerFailure::Failed { task, .. } | TriggerFailure::Panicked { task, .. } => task,
        }
    }
}

/// Render a panic payload as text, for the payload types `panic!` produces.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poller_error_display() {
        let err = PollerError::InvalidConfiguration("delay must be positive".to_string());
        assert!(err.to_string().contains("delay must be positive"));
        assert!(PollerError::NoRuntime.to_string().contains("Tokio runtime"));
    }

    #[test]
    fn test_trigger_failure_task_name() {
        let failed = TriggerFailure::Failed {
            task: "refresh".to_string(),
            source: anyhow::anyhow!("boom"),
        };
        assert_eq!(failed.task_name(), "refresh");
        assert!(failed.to_string().contains("boom"));

        let panicked = TriggerFailure::Panicked {
            task: "refresh".to_string(),
            message: "oops".to_string(),
        };
        assert_eq!(panicked.task_name(), "refresh");
    }

    #[test]
    fn test_panic_message_variants() {
        let static_payload: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(static_payload.as_ref()), "static");

        let owned_payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned_payload.as_ref()), "owned");

        let other_payload: Box<dyn std::any::Any + Send> = Box::new(42_u32);
        assert_eq!(panic_message(other_payload.as_ref()), "non-string panic payload");
    }
}
