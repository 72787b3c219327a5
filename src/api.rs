use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::pipeline::{ExtractionReport, Pipeline};

/// Upload cap for raw PDF bodies.
pub const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/extract", post(extract_from_text))
        .route("/upload", post(upload_pdf))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(serde::Deserialize)]
struct ExtractReq {
    text: String,
}

#[derive(serde::Serialize)]
struct ErrorResp {
    error: String,
}

fn bad_request(msg: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResp { error: msg.into() }),
    )
        .into_response()
}

async fn extract_from_text(
    State(state): State<AppState>,
    Json(body): Json<ExtractReq>,
) -> Json<ExtractionReport> {
    Json(state.pipeline.report(&body.text).await)
}

async fn upload_pdf(State(state): State<AppState>, body: Bytes) -> Response {
    if body.is_empty() {
        return bad_request("No file uploaded");
    }
    let text = match state.pipeline.read_pdf(&body) {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, bytes = body.len(), "rejecting upload");
            return bad_request(e.to_string());
        }
    };
    Json(state.pipeline.report(&text).await).into_response()
}
