//! AetherSegment API Server
//!
//! REST endpoints over the segmentation pipeline: campaign analysis,
//! segment creation, cached segment reads, trigger suggestions, and
//! filter-impact previews.

pub mod http;
pub mod state;

pub use http::create_router;
pub use state::AppState;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use aether_engine::EngineError;
use aether_warehouse::WarehouseError;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Service initialization failed: {0}")]
    Init(#[from] WarehouseError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Engine(EngineError::SegmentNotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(serde_json::json!({
            "error": status.canonical_reason().unwrap_or("Error"),
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}
