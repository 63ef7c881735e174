// src/triggers/http.rs
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{Dispatcher, TriggerEvent};
use crate::errors::SparrowError;

/// Body of a record-creation event delivered by the hosting platform.
#[derive(Debug, Deserialize)]
pub struct CreatedPayload {
    pub id: String,
    #[serde(default)]
    pub data: Value,
}

pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events/schedule/:name", post(schedule_fired))
        .route("/events/created/:collection", post(record_created))
        .layer(TraceLayer::new_for_http())
        .with_state(dispatcher)
}

async fn health() -> &'static str {
    "ok"
}

pub async fn schedule_fired(
    State(dispatcher): State<Arc<Dispatcher>>,
    Path(name): Path<String>,
) -> Result<StatusCode, SparrowError> {
    dispatcher.dispatch(TriggerEvent::tick(name)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// A 5xx here tells the platform to redeliver the event.
pub async fn record_created(
    State(dispatcher): State<Arc<Dispatcher>>,
    Path(collection): Path<String>,
    Json(payload): Json<CreatedPayload>,
) -> Result<StatusCode, SparrowError> {
    if payload.id.is_empty() {
        return Err(SparrowError::bad_request("Event is missing the record id"));
    }

    tracing::debug!("Record created: {}/{}", collection, payload.id);
    dispatcher
        .dispatch(TriggerEvent::created(collection, payload.id, payload.data))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
