//! Webhook and operator endpoints.

use std::sync::Arc;

use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

use super::classifier::Classifier;
use super::coordinator::{Coordinator, PendingApproval};
use super::model::{ClassifiedEvent, InboundEvent};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct RelayState {
    pub classifier: Arc<Classifier>,
    pub coordinator: Arc<Coordinator>,
    /// Hold the webhook response until the forwarded request resolves.
    pub sync_wait: bool,
}

/// Build the Axum router for the relay.
pub fn relay_routes(state: RelayState) -> Router {
    Router::new()
        .route("/webhook", get(webhook_query).post(webhook_form))
        .route("/health", get(health))
        .route("/api/pending", get(list_pending))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "credit-relay"
    }))
}

// ── Webhook ─────────────────────────────────────────────────────────────

async fn webhook_form(State(state): State<RelayState>, Form(event): Form<InboundEvent>) -> Response {
    process_event(&state, event).await
}

async fn webhook_query(
    State(state): State<RelayState>,
    Query(event): Query<InboundEvent>,
) -> Response {
    process_event(&state, event).await
}

fn received() -> Response {
    (StatusCode::OK, "Webhook received").into_response()
}

fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

async fn process_event(state: &RelayState, event: InboundEvent) -> Response {
    let classified = match state.classifier.classify(&event) {
        Ok(classified) => classified,
        Err(e) => {
            warn!(error = %e, "Rejected inbound event");
            return server_error();
        }
    };

    match classified {
        ClassifiedEvent::NewRequest {
            requester_number,
            requester_name,
            raw_text,
        } => {
            let pending = match state
                .coordinator
                .forward(requester_number, requester_name, raw_text)
                .await
            {
                Ok(pending) => pending,
                Err(e) => {
                    error!(error = %e, "New request failed");
                    return server_error();
                }
            };

            if state.sync_wait {
                await_decision(pending).await;
            } else {
                tokio::spawn(await_decision(pending));
            }
            received()
        }
        other => match state.coordinator.handle(other).await {
            Ok(result) => {
                debug!(result = ?result, "Webhook event handled");
                received()
            }
            Err(e) => {
                error!(error = %e, "Webhook event failed");
                server_error()
            }
        },
    }
}

async fn await_decision(pending: PendingApproval) {
    let correlation_key = pending.correlation_key().to_string();
    let outcome = pending.wait().await;
    info!(correlation_key = %correlation_key, outcome = ?outcome, "Credit request finished");
}

// ── Operator view ───────────────────────────────────────────────────────

async fn list_pending(State(state): State<RelayState>) -> impl IntoResponse {
    Json(state.coordinator.store().pending().await)
}
