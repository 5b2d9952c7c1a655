// HTTP control surface for the poller

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use common::scheduler::TriggerablePoller;
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

/// Application state shared across all handlers
#[derive(Clone, Debug)]
pub struct AppState {
    pub poller: Arc<TriggerablePoller>,
}

#[derive(Debug, Serialize)]
pub struct TriggerResponse {
    pub state: &'static str,
}

/// Create the router with health and trigger endpoints
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/trigger", post(trigger))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
#[tracing::instrument]
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// Run the current poll task now, outside its cadence
#[tracing::instrument(skip(state))]
pub async fn trigger(State(state): State<AppState>) -> Response {
    let poller = state.poller.clone();

    // The task runs synchronously; keep it off the async workers
    match tokio::task::spawn_blocking(move || {
        poller.trigger_now();
        poller.state()
    })
    .await
    {
        Ok(poller_state) => (
            StatusCode::ACCEPTED,
            Json(TriggerResponse {
                state: poller_state.as_str(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Manual trigger did not complete");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use common::scheduler::{FixedDelayConfig, ScheduledTask};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn idle_poller() -> Arc<TriggerablePoller> {
        Arc::new(
            TriggerablePoller::fixed_delay(FixedDelayConfig::new(60_000, 60_000, false)).unwrap(),
        )
    }

    async fn post_trigger(app: Router) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/trigger")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = create_router(AppState {
            poller: idle_poller(),
        });
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_trigger_on_empty_poller() {
        let app = create_router(AppState {
            poller: idle_poller(),
        });
        let (status, body) = post_trigger(app).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["state"], "empty");
    }

    #[tokio::test]
    async fn test_trigger_runs_scheduled_task() {
        let poller = idle_poller();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        poller
            .schedule(ScheduledTask::new("count", move || {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }))
            .unwrap();

        let app = create_router(AppState {
            poller: poller.clone(),
        });
        let (status, body) = post_trigger(app).await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["state"], "armed");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(poller.base().run_count(), 0);
    }

    #[tokio::test]
    async fn test_trigger_with_failing_task_still_accepted() {
        let poller = idle_poller();
        poller
            .schedule(ScheduledTask::new("fail", || Err(anyhow::anyhow!("unreachable source"))))
            .unwrap();

        let app = create_router(AppState { poller });
        let (status, body) = post_trigger(app).await;

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["state"], "armed");
    }
}
