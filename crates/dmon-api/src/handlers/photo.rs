//! Photo handler.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use chrono::Utc;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// `GET /photo/{id}.jpg`
pub async fn photo(State(state): State<AppState>, Path(name): Path<String>) -> ApiResult<Response> {
    let id = name
        .strip_suffix(".jpg")
        .ok_or_else(|| ApiError::bad_request("invalid filename"))?;

    let record = state
        .photos
        .get(id)
        .await
        .filter(|record| !record.is_expired(Utc::now()))
        .ok_or_else(|| ApiError::not_found("record not found"))?;
    let jpeg = record
        .jpeg_image
        .ok_or_else(|| ApiError::not_found("record has no photo"))?;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], jpeg).into_response())
}
