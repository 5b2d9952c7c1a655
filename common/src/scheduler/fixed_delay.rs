// Fixed-delay base poller driven by the Tokio timer

use crate::errors::PollerError;
use crate::scheduler::base::BasePoller;
use crate::scheduler::task::ScheduledTask;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument};

/// Default delay before the first poll cycle (in milliseconds)
pub const DEFAULT_INITIAL_DELAY_MILLIS: u64 = 30_000;

/// Default delay between the end of one cycle and the start of the next (in milliseconds)
pub const DEFAULT_DELAY_MILLIS: u64 = 60_000;

/// Configuration for the fixed-delay poller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedDelayConfig {
    /// Wait before the first cycle
    pub initial_delay: Duration,
    /// Wait between the end of a cycle and the start of the next one
    pub delay: Duration,
    /// Whether entries removed from the polled source are kept.
    /// Carried for the task's owner; the poller itself does not read it.
    pub ignore_deletes_from_source: bool,
}

impl Default for FixedDelayConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(DEFAULT_INITIAL_DELAY_MILLIS),
            delay: Duration::from_millis(DEFAULT_DELAY_MILLIS),
            ignore_deletes_from_source: false,
        }
    }
}

impl FixedDelayConfig {
    pub fn new(initial_delay_millis: u64, delay_millis: u64, ignore_deletes_from_source: bool) -> Self {
        Self {
            initial_delay: Duration::from_millis(initial_delay_millis),
            delay: Duration::from_millis(delay_millis),
            ignore_deletes_from_source,
        }
    }

    pub fn validate(&self) -> Result<(), PollerError> {
        if self.delay.is_zero() {
            return Err(PollerError::InvalidConfiguration(
                "delay must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct CadenceState {
    shutdown_tx: Option<broadcast::Sender<()>>,
    stopped: bool,
}

/// Base poller that runs the scheduled task with a fixed delay between runs.
///
/// Each cycle runs on Tokio's blocking pool. A new `schedule` call replaces
/// the running cadence; dropping the poller ends it.
#[derive(Debug)]
pub struct FixedDelayPoller {
    config: FixedDelayConfig,
    state: Mutex<CadenceState>,
    run_count: Arc<AtomicU64>,
}

impl FixedDelayPoller {
    /// Create a new fixed-delay poller
    pub fn new(config: FixedDelayConfig) -> Result<Self, PollerError> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    /// Create a poller with the default 30s initial delay and 60s delay
    pub fn with_defaults() -> Self {
        Self::from_valid_config(FixedDelayConfig::default())
    }

    fn from_valid_config(config: FixedDelayConfig) -> Self {
        Self {
            config,
            state: Mutex::new(CadenceState::default()),
            run_count: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn config(&self) -> &FixedDelayConfig {
        &self.config
    }

    pub fn ignores_deletes_from_source(&self) -> bool {
        self.config.ignore_deletes_from_source
    }

    /// Number of cycles completed by the cadence (manual runs are not counted)
    pub fn run_count(&self) -> u64 {
        self.run_count.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .stopped
    }
}

impl BasePoller for FixedDelayPoller {
    #[instrument(skip(self, task), fields(task = %task.name()))]
    fn schedule(&self, task: ScheduledTask) -> Result<(), PollerError> {
        let handle = Handle::try_current().map_err(|_| PollerError::NoRuntime)?;

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.stopped {
            return Err(PollerError::Stopped);
        }

        if let Some(previous) = state.shutdown_tx.take() {
            debug!("Replacing running cadence");
            let _ = previous.send(());
        }

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        state.shutdown_tx = Some(shutdown_tx);

        info!(
            initial_delay_ms = self.config.initial_delay.as_millis() as u64,
            delay_ms = self.config.delay.as_millis() as u64,
            "Starting fixed-delay cadence"
        );

        handle.spawn(run_cadence(
            task,
            self.config.initial_delay,
            self.config.delay,
            shutdown_rx,
            self.run_count.clone(),
        ));

        Ok(())
    }

    fn stop(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.stopped {
            return;
        }
        state.stopped = true;

        if let Some(shutdown_tx) = state.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
        info!("Fixed-delay poller stopped");
    }
}

/// Cadence loop: wait, run, repeat until shut down or the sender is dropped
async fn run_cadence(
    task: ScheduledTask,
    initial_delay: Duration,
    delay: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
    run_count: Arc<AtomicU64>,
) {
    let mut wait = initial_delay;

    loop {
        tokio::select! {
            _ = sleep(wait) => {}
            _ = shutdown_rx.recv() => {
                debug!(task = %task.name(), "Cadence shut down");
                break;
            }
        }

        let cycle = task.clone();
        match tokio::task::spawn_blocking(move || cycle.run()).await {
            Ok(Ok(())) => {
                debug!(task = %task.name(), "Poll cycle completed");
            }
            Ok(Err(e)) => {
                error!(task = %task.name(), error = %e, "Poll cycle failed");
            }
            Err(e) => {
                error!(task = %task.name(), error = %e, "Poll cycle aborted");
            }
        }

        run_count.fetch_add(1, Ordering::SeqCst);
        wait = delay;
    }
}
