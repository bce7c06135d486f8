//! Mute/unmute handler.

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use chrono::{Duration, Utc};
use serde_json::Value;
use tracing::{info, warn};

use dmon_models::FeedbackNotification;

use crate::error::{ApiError, ApiResult};
use crate::handlers::health::StatusResponse;
use crate::state::AppState;

/// Parse the `s` field: an integer number of seconds, as a JSON number or numeric string.
pub fn parse_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.abs() < i64::MAX as f64)
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `POST /mute` with `{"key": "<photo id>", "s": <seconds>}`.
///
/// `s < 1` unmutes; otherwise notifications are muted for `s` seconds.
/// The key must name a cached photo, which proves the caller received a
/// recent notification.
pub async fn mute(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<StatusResponse>> {
    let data: Value = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid JSON body: {}", e)))?;

    let key = match data.get("key").and_then(Value::as_str) {
        Some(key) if !key.is_empty() => key.to_string(),
        _ => return Err(ApiError::forbidden("missing 'key' field")),
    };
    if !state.photos.contains(&key).await {
        warn!(key = %key, "mute request with unknown key");
        return Err(ApiError::forbidden("bad key"));
    }

    let secs = match data.get("s") {
        None | Some(Value::Null) => return Err(ApiError::bad_request("missing 's' field")),
        Some(value) => parse_seconds(value).ok_or_else(|| ApiError::bad_request("invalid 's' field"))?,
    };

    let now = Utc::now();
    let (mute_until, feedback) = if secs < 1 {
        (now, FeedbackNotification::unmuted(key))
    } else {
        let until = Duration::try_seconds(secs)
            .and_then(|d| now.checked_add_signed(d))
            .ok_or_else(|| ApiError::bad_request("invalid 's' field"))?;
        (until, FeedbackNotification::muted(key, secs))
    };

    state.mute.set_mute_until(mute_until).await;
    info!(mute_until = %mute_until, "mute window updated");

    if state.notifications.send(feedback.into()).is_err() {
        warn!("notification channel closed; mute acknowledgement not sent");
    }
    Ok(Json(StatusResponse::ok()))
}
