//! API integration tests.
//!
//! Drives the real router over the in-memory store in demo mode (no
//! provider credential), the same configuration the server boots with when
//! no external services are reachable.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use vgen_api::{create_router, ApiConfig, AppState, FallbackPolicy, JobLifecycleManager};
use vgen_store::MemoryStore;

const DEMO_URL: &str =
    "https://commondatastorage.googleapis.com/gtv-videos-bucket/sample/BigBuckBunny.mp4";

fn test_app() -> Router {
    let memory = Arc::new(MemoryStore::new());
    let store: Arc<dyn vgen_store::JobStore> = memory.clone();
    let status_checks: Arc<dyn vgen_store::StatusCheckStore> = memory;

    let policy = FallbackPolicy {
        demo_video_url: DEMO_URL.to_string(),
        demo_delay: Duration::from_millis(1),
        provider_timeout: Duration::from_secs(1),
    };
    let generator = Arc::new(JobLifecycleManager::new(Arc::clone(&store), None, policy));
    let state = AppState::with_components(ApiConfig::default(), store, status_checks, generator);
    create_router(state, None)
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = test_app();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let app = test_app();

    let response = app.oneshot(get("/ready")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["store"]["status"], "ok");
}

#[tokio::test]
async fn test_root_message() {
    let app = test_app();

    let response = app.oneshot(get("/api/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"], "AI Video Generator API");
}

#[tokio::test]
async fn test_generate_video_demo_mode() {
    let app = test_app();

    let response = app
        .oneshot(post_json(
            "/api/generate-video",
            serde_json::json!({"prompt": "A beautiful sunset over the ocean"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "completed");
    assert_eq!(body["video_url"], DEMO_URL);
    assert_eq!(body["prompt"], "A beautiful sunset over the ocean");
    assert!(body["error_message"]
        .as_str()
        .unwrap()
        .contains("Demo mode"));
    assert!(!body["id"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_video_empty_prompt_rejected() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/generate-video",
            serde_json::json!({"prompt": "   "}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing was persisted
    let response = app.oneshot(get("/api/videos")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_generate_video_zero_duration_rejected() {
    let app = test_app();

    let response = app
        .oneshot(post_json(
            "/api/generate-video",
            serde_json::json!({"prompt": "sunset", "duration": 0}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_then_poll() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/generate-video",
            serde_json::json!({"prompt": "a city at night", "duration": 8}),
        ))
        .await
        .unwrap();
    let created = body_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();

    let response = app
        .oneshot(get(&format!("/api/video/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["id"], id.as_str());
    assert_eq!(body["status"], "completed");
    assert_eq!(body["video_url"], DEMO_URL);
}

#[tokio::test]
async fn test_get_video_unknown_id_is_404() {
    let app = test_app();

    let response = app
        .oneshot(get("/api/video/550e8400-e29b-41d4-a716-446655440000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_video_invalid_id_is_400() {
    let app = test_app();

    let response = app.oneshot(get("/api/video/bad!")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_videos_limit_and_ordering() {
    let app = test_app();

    for prompt in ["first", "second", "third"] {
        let response = app
            .clone()
            .oneshot(post_json(
                "/api/generate-video",
                serde_json::json!({"prompt": prompt}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(get("/api/videos?limit=2")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let jobs = body.as_array().unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0]["prompt"], "third");
    assert_eq!(jobs[1]["prompt"], "second");
}

#[tokio::test]
async fn test_status_check_round_trip() {
    let app = test_app();

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/status",
            serde_json::json!({"client_name": "integration-probe"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let created = body_json(response).await;
    assert_eq!(created["client_name"], "integration-probe");
    assert!(!created["id"].as_str().unwrap().is_empty());

    let response = app.oneshot(get("/api/status")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = test_app();

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/videos")
                .header("Origin", "http://localhost:3000")
                .header("Access-Control-Request-Method", "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = test_app();

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );
    assert!(response.headers().contains_key("X-Request-ID"));
}
