use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::State,
    routing::{get, post},
    Router,
};

use crate::outcome::{PassObserver, PassOutcome};
use crate::reconcile::Reconciler;
use crate::traits::{ReviewSource, StatusStore};

/// Body of every trigger response, whatever the pass did.
pub const ACK: &str = "OK";

/// Something that can run one reconciliation pass on demand.
#[async_trait]
pub trait PassTrigger: Send + Sync {
    async fn run_pass(&self) -> PassOutcome;
}

#[async_trait]
impl<S: StatusStore, R: ReviewSource> PassTrigger for Reconciler<S, R> {
    async fn run_pass(&self) -> PassOutcome {
        Reconciler::run_pass(self).await
    }
}

pub struct AppState {
    pub trigger: Arc<dyn PassTrigger>,
    pub observer: Arc<dyn PassObserver>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        .route("/card_urls/auto_upload", post(auto_upload))
        .with_state(state)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

/// Run one pass, hand the outcome to the observer, always acknowledge.
async fn auto_upload(State(state): State<Arc<AppState>>) -> &'static str {
    let outcome = state.trigger.run_pass().await;
    state.observer.record(&outcome);
    ACK
}
