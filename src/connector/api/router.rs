use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tracing::info;

use crate::application::{PipelineJob, PipelineQueue, RecommendBooksUseCase};
use crate::domain::DomainError;

#[derive(Clone)]
pub struct AppState {
    pub recommend: Arc<RecommendBooksUseCase>,
    pub queue: PipelineQueue,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/recommendations/{review_id}", get(recommend))
        .route("/api/books/{isbn}/vector", post(trigger_book_build))
        .route("/api/reviews/{review_id}/vector", post(trigger_review_update))
        .with_state(state)
}

pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {addr}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Structured error envelope: `{"error": {"code": ..., "message": ...}}`.
struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {"code": self.code, "message": self.message}
        }));
        (self.status, body).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound(message) => Self {
                status: StatusCode::NOT_FOUND,
                code: "not_found",
                message,
            },
            DomainError::InvalidInput(_) => Self {
                status: StatusCode::BAD_REQUEST,
                code: "empty_review",
                message: "Review content is empty.".to_string(),
            },
            DomainError::EmbeddingError(_) => Self {
                status: StatusCode::BAD_GATEWAY,
                code: "embedding_failed",
                message: "Embedding failed.".to_string(),
            },
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "internal",
                message: other.to_string(),
            },
        }
    }
}

async fn recommend(
    State(state): State<AppState>,
    Path(review_id): Path<i64>,
) -> Result<Response, ApiError> {
    let recommendation = state.recommend.execute(review_id).await?;
    Ok(Json(recommendation).into_response())
}

/// "Book created" trigger: enqueue the build pipeline and return at once.
/// The caller never observes pipeline outcome — a dropped job is only
/// logged, and the next trigger for the same ISBN self-heals.
async fn trigger_book_build(
    State(state): State<AppState>,
    Path(isbn): Path<String>,
) -> impl IntoResponse {
    state.queue.submit(PipelineJob::BookCreated { isbn });
    (StatusCode::ACCEPTED, Json(json!({"status": "accepted"})))
}

/// "Review created" trigger, same contract as the book trigger.
async fn trigger_review_update(
    State(state): State<AppState>,
    Path(review_id): Path<i64>,
) -> impl IntoResponse {
    state.queue.submit(PipelineJob::ReviewCreated { review_id });
    (StatusCode::ACCEPTED, Json(json!({"status": "accepted"})))
}
