// Poller binary entry point

mod routes;

use common::config::Settings;
use common::scheduler::{ScheduledTask, TriggerablePoller};
use common::telemetry;
use routes::{create_router, AppState};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = Settings::load()?;
    settings.validate()?;

    telemetry::init_logging(&settings.observability.log_level)?;

    info!(
        initial_delay_millis = settings.poller.initial_delay_millis,
        delay_millis = settings.poller.delay_millis,
        ignore_deletes_from_source = settings.poller.ignore_deletes_from_source,
        "Configuration loaded"
    );

    let poller = Arc::new(TriggerablePoller::fixed_delay(
        settings.poller.to_fixed_delay_config(),
    )?);

    poller.schedule(heartbeat_task()).map_err(|e| {
        error!(error = %e, "Failed to schedule poll task");
        e
    })?;

    let app = create_router(AppState {
        poller: poller.clone(),
    });

    let addr = SocketAddr::from((
        settings.server.host.parse::<std::net::IpAddr>()?,
        settings.server.port,
    ));
    info!(addr = %addr, "Starting control server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    poller.stop();
    info!("Poller stopped");
    Ok(())
}

/// Poll task that only records that a cycle happened
fn heartbeat_task() -> ScheduledTask {
    let cycles = Arc::new(AtomicU64::new(0));
    ScheduledTask::new("heartbeat", move || {
        let cycle = cycles.fetch_add(1, Ordering::SeqCst) + 1;
        info!(cycle, "Poll cycle");
        Ok(())
    })
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Initiating graceful shutdown");
}
