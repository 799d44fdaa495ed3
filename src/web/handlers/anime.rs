//! # Anime Lookup Handler

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use crate::fetch::{FetchOutcome, FALLBACK_RESPONSE};
use crate::web::state::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Cache-aside lookup: GET /get_anime/{anime_id}
///
/// - 200 JSON record when found
/// - 200 text `Fallback response` when the upstream is unavailable
/// - 404 when the upstream reports the record does not exist
/// - 500 when the fetched record could not be persisted
pub async fn get_anime(State(state): State<AppState>, Path(anime_id): Path<i32>) -> Response {
    match state.context.coordinator.fetch_or_cache(anime_id).await {
        Ok(FetchOutcome::Found(record)) => (StatusCode::OK, Json(record)).into_response(),
        Ok(FetchOutcome::Fallback) => (StatusCode::OK, FALLBACK_RESPONSE).into_response(),
        Ok(FetchOutcome::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: "Anime not found".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!(anime_id, error = %e, "Lookup failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}
