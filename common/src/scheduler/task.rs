// Scheduled unit of work handed to a poller

use std::fmt;
use std::sync::Arc;

/// Outcome of a single poll cycle
pub type TaskResult = anyhow::Result<()>;

type TaskFn = dyn Fn() -> TaskResult + Send + Sync + 'static;

/// An opaque, zero-argument unit of work run once per poll cycle.
///
/// Cloning is cheap and clones share the same closure, so a clone taken out
/// of a poller identifies the same task as the one that was scheduled
/// (see [`ScheduledTask::ptr_eq`]).
#[derive(Clone)]
pub struct ScheduledTask {
    name: Arc<str>,
    inner: Arc<TaskFn>,
}

impl ScheduledTask {
    /// Create a new task with a name used for logging
    pub fn new<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> TaskResult + Send + Sync + 'static,
    {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            inner: Arc::new(f),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the task on the calling thread
    pub fn run(&self) -> TaskResult {
        (self.inner)()
    }

    /// Whether both handles refer to the same scheduled closure
    pub fn ptr_eq(a: &ScheduledTask, b: &ScheduledTask) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_run_invokes_closure() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let task = ScheduledTask::new("count", move || {
            c.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert!(task.run().is_ok());
        assert!(task.run().is_ok());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
        assert_eq!(task.name(), "count");
    }

    #[test]
    fn test_run_returns_task_error() {
        let task = ScheduledTask::new("fail", || Err(anyhow::anyhow!("source unavailable")));
        let err = task.run().unwrap_err();
        assert_eq!(err.to_string(), "source unavailable");
    }

    #[test]
    fn test_ptr_eq_tracks_identity() {
        let a = ScheduledTask::new("a", || Ok(()));
        let a_clone = a.clone();
        let b = ScheduledTask::new("a", || Ok(()));

        assert!(ScheduledTask::ptr_eq(&a, &a_clone));
        assert!(!ScheduledTask::ptr_eq(&a, &b));
    }

    #[test]
    fn test_debug_shows_name() {
        let task = ScheduledTask::new("heartbeat", || Ok(()));
        assert!(format!("{:?}", task).contains("heartbeat"));
    }
}
