use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use holdarr_model::InboundEvent;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::parser;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook", post(webhook))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// One endpoint for every upstream: the parser works out what arrived.
/// Resolution misses and handler failures are acknowledged with 200 so the
/// upstreams do not retry storms at us; failures are logged here.
async fn webhook(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Json<Value> {
    let events = parser::parse_webhook(&payload);
    if events.is_empty() {
        info!(target: "webhook::ingest", "no actionable events in payload");
        return Json(json!({ "status": "ignored" }));
    }

    let mut processed = 0usize;
    let mut misses = 0usize;
    let mut failures = 0usize;
    for event in events {
        match dispatch(&state, event).await {
            Ok(true) => processed += 1,
            Ok(false) => misses += 1,
            Err(err) => {
                warn!(target: "webhook::ingest", error = %err, "event handling failed");
                failures += 1;
            }
        }
    }
    Json(json!({
        "status": "success",
        "processed": processed,
        "ignored": misses,
        "failed": failures,
    }))
}

/// Returns `Ok(false)` for resolution misses: events about media outside the
/// managed libraries are expected and mutate nothing.
async fn dispatch(state: &AppState, event: InboundEvent) -> holdarr_core::Result<bool> {
    match event {
        InboundEvent::Play(play) => match state.resolver.resolve_play(&play) {
            Some(resolved) => {
                state.orchestrator.handle_play(&resolved).await?;
                Ok(true)
            }
            None => Ok(false),
        },
        InboundEvent::Import(import) => {
            match state.resolver.resolve_import(&import) {
                Some(resolved) => {
                    state
                        .orchestrator
                        .handle_import(&resolved, import.final_path.clone())
                        .await?;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
        InboundEvent::Delete(delete) => {
            match state.resolver.resolve_delete(&delete) {
                Some(resolved) => {
                    state
                        .orchestrator
                        .handle_delete(&resolved, delete.reason)
                        .await?;
                    Ok(true)
                }
                None => Ok(false),
            }
        }
        InboundEvent::Add(add) => {
            let entries = state.resolver.resolve_add(&add);
            if entries.is_empty() {
                return Ok(false);
            }
            state.orchestrator.handle_add(&entries).await?;
            Ok(true)
        }
    }
}
