//! HTTP surface
//!
//! Thin REST layer over the pipeline and the store:
//!
//! - `GET    /measurements` — history, newest first
//! - `POST   /measurements` — submit one reading (201 on success)
//! - `DELETE /measurements` — wipe history
//! - `GET    /ws`           — WebSocket upgrade for the live feed

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::ingest::{IngestError, IngestionPipeline};
use crate::reading::{RawReading, Reading};
use crate::registry::ConnectionRegistry;
use crate::store::{ReadingStore, StoreError};

use super::ws;

/// Shared state handed to every handler
pub(crate) struct AppState<S> {
    pub pipeline: Arc<IngestionPipeline<S>>,
    pub store: Arc<S>,
    pub registry: Arc<ConnectionRegistry>,
}

// Manual impl: `S` itself is behind Arcs and need not be Clone
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            store: Arc::clone(&self.store),
            registry: Arc::clone(&self.registry),
        }
    }
}

/// Build the application router
pub(crate) fn router<S: ReadingStore + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route(
            "/measurements",
            get(list_readings::<S>)
                .post(submit_reading::<S>)
                .delete(delete_readings::<S>),
        )
        .route("/ws", get(ws::upgrade::<S>))
        .with_state(state)
}

/// Error response: status code plus a JSON `{"error": ...}` body
pub(crate) struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        let status = match &err {
            IngestError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            IngestError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct DeleteResponse {
    deleted: u64,
}

async fn list_readings<S: ReadingStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<Vec<Reading>>, ApiError> {
    Ok(Json(state.store.list_all().await?))
}

async fn submit_reading<S: ReadingStore>(
    State(state): State<AppState<S>>,
    Json(raw): Json<RawReading>,
) -> Result<(StatusCode, Json<Reading>), ApiError> {
    let reading = state.pipeline.submit(raw).await?;
    Ok((StatusCode::CREATED, Json(reading)))
}

async fn delete_readings<S: ReadingStore>(
    State(state): State<AppState<S>>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted = state.store.delete_all().await?;
    tracing::info!(deleted, "History wiped");
    Ok(Json(DeleteResponse { deleted }))
}
