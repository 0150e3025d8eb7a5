use std::any::Any;

use axum::{
    extract::{rejection::JsonRejection, State},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::catch_panic::CatchPanicLayer;
use tracing::info;

use crate::caption::CaptionRequest;
use crate::error::{AppError, AppResult};
use crate::models::{CaptionResult, GenerateRequest, PageMetadata, ScrapeRequest};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/scrape", post(scrape).fallback(method_not_allowed))
        .route("/api/generate", post(generate).fallback(method_not_allowed))
        .layer(CatchPanicLayer::custom(handle_panic))
        .with_state(state)
}

/// GET /health
async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// POST /api/scrape
async fn scrape(
    State(state): State<AppState>,
    payload: Result<Json<ScrapeRequest>, JsonRejection>,
) -> AppResult<Json<PageMetadata>> {
    let Json(req) = payload?;
    let url = req.url.unwrap_or_default();
    info!(url = %url, "scraping");

    let metadata = state.extractor.extract(&url).await?;
    info!(
        images = metadata.images.len(),
        has_title = !metadata.title.is_empty(),
        "scrape complete"
    );
    Ok(Json(metadata))
}

/// POST /api/generate
async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> AppResult<Json<CaptionResult>> {
    let Json(req) = payload?;
    let request = CaptionRequest::from(req);
    info!(goal = request.goal.key(), "generating caption");

    let result = state.captioner.caption(&request).await?;
    Ok(Json(result))
}

async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };
    AppError::Internal(detail).into_response()
}
