//! Control server integration tests.

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tower::ServiceExt;

use dmon_api::{create_router, AppState};
use dmon_models::{FeedbackType, Notification, PhotoRecord};
use dmon_notifier::{MuteState, PhotoCache};

struct Harness {
    app: Router,
    mute: MuteState,
    photos: PhotoCache,
    feedback: UnboundedReceiver<Notification>,
}

fn harness() -> Harness {
    let (tx, rx) = mpsc::unbounded_channel();
    let mute = MuteState::new();
    let photos = PhotoCache::new();
    let app = create_router(AppState::new(mute.clone(), photos.clone(), tx), None);
    Harness {
        app,
        mute,
        photos,
        feedback: rx,
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_mute(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/mute")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let h = harness();
    let response = h.app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_photo_served_as_jpeg() {
    let h = harness();
    let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00];
    h.photos
        .insert(PhotoRecord::new("abc123", Utc::now(), Some(jpeg.clone())))
        .await;

    let response = h.app.oneshot(get("/photo/abc123.jpg")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/jpeg"
    );
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.to_vec(), jpeg);
}

#[tokio::test]
async fn test_photo_requires_jpg_suffix() {
    let h = harness();
    h.photos
        .insert(PhotoRecord::new("abc123", Utc::now(), Some(vec![1])))
        .await;

    let response = h.app.oneshot(get("/photo/abc123.png")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_photo_not_found() {
    let h = harness();
    let response = h.app.oneshot(get("/photo/missing.jpg")).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_photo_record_without_image() {
    let h = harness();
    h.photos
        .insert(PhotoRecord::new("abc123", Utc::now(), None))
        .await;

    let response = h.app.oneshot(get("/photo/abc123.jpg")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_expired_photo_not_served() {
    let h = harness();
    h.photos
        .insert(PhotoRecord::new(
            "old",
            Utc::now() - Duration::hours(25),
            Some(vec![1]),
        ))
        .await;

    let response = h.app.oneshot(get("/photo/old.jpg")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_mute_rejects_missing_key() {
    let h = harness();
    let response = h.app.oneshot(post_mute(r#"{"s": 600}"#)).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(h.mute.mute_until().await.is_none());
}

#[tokio::test]
async fn test_mute_rejects_unknown_key() {
    let h = harness();
    let response = h
        .app
        .oneshot(post_mute(r#"{"key": "nope", "s": 600}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(h.mute.mute_until().await.is_none());
}

#[tokio::test]
async fn test_mute_rejects_bad_duration() {
    let h = harness();
    h.photos
        .insert(PhotoRecord::new("abc123", Utc::now(), None))
        .await;

    for body in [
        r#"{"key": "abc123"}"#,
        r#"{"key": "abc123", "s": "soon"}"#,
        r#"{"key": "abc123", "s": [1]}"#,
        "not json",
    ] {
        let response = h.app.clone().oneshot(post_mute(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
    }
    assert!(h.mute.mute_until().await.is_none());
}

#[tokio::test]
async fn test_mute_sets_window_and_acknowledges() {
    let mut h = harness();
    h.photos
        .insert(PhotoRecord::new("abc123", Utc::now(), None))
        .await;

    let before = Utc::now();
    let response = h
        .app
        .oneshot(post_mute(r#"{"key": "abc123", "s": 600}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"status": "ok"}));

    let until = h.mute.mute_until().await.unwrap();
    assert!(until >= before + Duration::seconds(600));
    assert!(until <= Utc::now() + Duration::seconds(600));

    match h.feedback.try_recv() {
        Ok(Notification::Feedback(n)) => {
            assert_eq!(n.kind, FeedbackType::Muted);
            assert_eq!(n.key, "abc123");
            assert_eq!(n.mute_seconds, Some(600));
        }
        other => panic!("unexpected feedback: {:?}", other),
    }
}

#[tokio::test]
async fn test_mute_accepts_numeric_string() {
    let h = harness();
    h.photos
        .insert(PhotoRecord::new("abc123", Utc::now(), None))
        .await;

    let response = h
        .app
        .oneshot(post_mute(r#"{"key": "abc123", "s": "3600"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(h.mute.is_muted_at(Utc::now() + Duration::minutes(59)).await);
}

#[tokio::test]
async fn test_mute_rejects_out_of_range_duration() {
    let mut h = harness();
    h.photos
        .insert(PhotoRecord::new("abc123", Utc::now(), None))
        .await;

    for body in [
        r#"{"key": "abc123", "s": 9223372036854775807}"#,
        r#"{"key": "abc123", "s": 1e300}"#,
    ] {
        let response = h.app.clone().oneshot(post_mute(body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {}", body);
    }
    assert!(h.mute.mute_until().await.is_none());
    assert!(h.feedback.try_recv().is_err());
}

#[tokio::test]
async fn test_zero_seconds_unmutes() {
    let mut h = harness();
    h.photos
        .insert(PhotoRecord::new("abc123", Utc::now(), None))
        .await;
    h.mute
        .set_mute_until(Utc::now() + Duration::hours(4))
        .await;

    let response = h
        .app
        .oneshot(post_mute(r#"{"key": "abc123", "s": 0}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!h.mute.is_muted_at(Utc::now()).await);

    match h.feedback.try_recv() {
        Ok(Notification::Feedback(n)) => {
            assert_eq!(n.kind, FeedbackType::Unmuted);
            assert_eq!(n.mute_seconds, None);
        }
        other => panic!("unexpected feedback: {:?}", other),
    }
}

#[tokio::test]
async fn test_cors_preflight() {
    let h = harness();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/mute")
        .header(header::ORIGIN, "https://ntfy.sh")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = h.app.oneshot(request).await.unwrap();
    assert!(response.status().is_success());
    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "*"
    );
}
