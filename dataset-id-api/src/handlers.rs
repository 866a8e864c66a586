//! HTTP request handlers for the Dataset ID API.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures_util::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use crate::config::StatusMode;
use crate::error::AggregateError;
use crate::response::AggregateResponse;
use crate::state::AppState;
use crate::telemetry::Telemetry;

/// Service name reported by `/health`.
pub const SERVICE_NAME: &str = "dataset-id-api";

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

#[derive(Debug, Serialize)]
pub struct EndpointMap {
    pub dataset_ids: String,
    pub health: String,
}

/// Service banner returned by `GET /`.
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
    pub endpoints: EndpointMap,
}

/// GET /
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "dataset id api service running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        endpoints: EndpointMap {
            dataset_ids: "/api/dataset-ids".to_string(),
            health: "/health".to_string(),
        },
    })
}

/// GET /health
///
/// Liveness only; never touches the upstream catalog.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
    })
}

/// GET /api/dataset-ids
///
/// Walks the upstream catalog and returns every leaf dataset id. Every
/// outcome uses the same envelope; in `envelope` status mode the transport
/// status is always 200 and callers must inspect `code`.
pub async fn get_dataset_ids(State(state): State<Arc<AppState>>) -> Response {
    tracing::debug!("Aggregating dataset ids");
    let started = Instant::now();

    let outcome = AssertUnwindSafe(state.aggregate())
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(AggregateError::Internal(panic_message(panic.as_ref()))));

    if let Err(e) = &outcome {
        tracing::warn!(code = e.code(), reason = %e, "Aggregation did not succeed");
    }

    let response = AggregateResponse::from(outcome);
    Telemetry::record_aggregation(response.code, started.elapsed().as_secs_f64() * 1000.0);

    let status = transport_status(state.config.status_mode, response.code);
    (status, Json(response)).into_response()
}

fn transport_status(mode: StatusMode, code: u16) -> StatusCode {
    match mode {
        StatusMode::Envelope => StatusCode::OK,
        StatusMode::Rest => StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "aggregation panicked".to_string()
    }
}
