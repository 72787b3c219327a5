// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::json;
use serde_json::Value as Json;
use tower::ServiceExt as _; // for `oneshot`

use budget_extractor::api::{self, AppState};
use budget_extractor::config::ExtractionConfig;
use budget_extractor::Pipeline;

const BODY_LIMIT: usize = 1024 * 1024;

/// Keyword/pattern-only pipeline; no provider is contacted.
fn test_router() -> Router {
    api::router(AppState::new(Pipeline::new(ExtractionConfig::default(), None)))
}

async fn read_json(resp: axum::response::Response) -> Json {
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse json")
}

#[tokio::test]
async fn health_returns_ok() {
    let resp = test_router()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.unwrap();
    assert_eq!(std::str::from_utf8(&bytes).unwrap(), "OK");
}

#[tokio::test]
async fn extract_returns_full_report() {
    let payload = json!({
        "text": "Energy 17 1000,500,400 Agriculture 18 2000,900,800 Total Budget: 5,000,000"
    });
    let req = Request::builder()
        .method("POST")
        .uri("/extract")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap();

    let resp = test_router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = read_json(resp).await;

    assert_eq!(v["total_budget"], json!(5_000_000.0));
    assert_eq!(v["budget_info"]["Total Budget"], json!(5_000_000.0));
    assert_eq!(v["agriculture"][0]["Programme"], json!("Agriculture"));
    assert_eq!(v["agriculture"][0]["2024"], json!(2000.0));
    assert_eq!(v["agriculture_totals"]["2022"], json!(800.0));
    assert_eq!(v["climate_programmes"].as_array().map(Vec::len), Some(2));
    assert!(v["graph"]["categories"].get("Unallocated").is_some());
    assert_eq!(v["survey"]["total_budget"], json!(5_000_000.0));
}

#[tokio::test]
async fn extract_with_nothing_found_is_still_ok() {
    let req = Request::builder()
        .method("POST")
        .uri("/extract")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"text": "lorem ipsum"}"#))
        .unwrap();
    let resp = test_router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let v = read_json(resp).await;
    assert_eq!(v["total_budget"], Json::Null);
    assert_eq!(v["agriculture"], Json::Null);
    assert_eq!(v["climate_programmes"], Json::Null);
    assert_eq!(v["budget_info"]["Total Budget"], Json::Null);
}

#[tokio::test]
async fn upload_rejects_non_pdf() {
    let req = Request::builder()
        .method("POST")
        .uri("/upload")
        .header("content-type", "application/pdf")
        .body(Body::from("definitely not a pdf"))
        .unwrap();
    let resp = test_router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let v = read_json(resp).await;
    assert!(v["error"].as_str().unwrap().contains("PDF"));
}

#[tokio::test]
async fn upload_rejects_empty_body() {
    let req = Request::builder()
        .method("POST")
        .uri("/upload")
        .body(Body::empty())
        .unwrap();
    let resp = test_router().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let v = read_json(resp).await;
    assert_eq!(v["error"], json!("No file uploaded"));
}
