//! Admin HTTP API over the persistence store
//!
//! Lets an operator inspect and edit tracked links and move the cycle
//! timestamp, e.g. back to 0 to force the next poll to start a cycle.

mod routes;

use crate::storage::{SharedStorage, StorageError};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;

/// Errors returned to API clients as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl From<StorageError> for ApiError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::LinkNotFound(_) => ApiError::NotFound(error.to_string()),
            StorageError::LinkExists(_) => ApiError::BadRequest(error.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Internal(message) => {
                tracing::error!("API storage failure: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Builds the API router
pub fn router(storage: SharedStorage) -> Router {
    Router::new()
        .route(
            "/timestamp",
            get(routes::get_timestamp).put(routes::put_timestamp),
        )
        .route("/urls", get(routes::list_urls).post(routes::create_url))
        .route(
            "/urls/:id",
            get(routes::get_url)
                .put(routes::update_url)
                .delete(routes::delete_url),
        )
        .with_state(storage)
}

/// Serves the API until `shutdown` fires
pub async fn serve(
    storage: SharedStorage,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Admin API listening on {}", listener.local_addr()?);

    axum::serve(listener, router(storage))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
