//! 健康检查 API 集成测试

use axum::http::StatusCode;

mod common;
use common::{create_test_app, request, send};

#[tokio::test]
async fn test_health_endpoint() {
    let (_, app) = create_test_app();

    let (status, headers, json) = send(&app, request("GET", "/health", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert!(json["version"].is_string());
    assert!(json["uptime_secs"].is_number());

    // 请求追踪头
    assert!(headers.contains_key("x-trace-id"));
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_readiness_endpoint() {
    let (_, app) = create_test_app();

    let (status, _, json) = send(&app, request("GET", "/ready", None, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ready"], true);
    assert_eq!(json["checks"][0]["name"], "store:memory");
    assert_eq!(json["checks"][0]["status"], "healthy");
}

#[tokio::test]
async fn test_unknown_route_not_found() {
    let (_, app) = create_test_app();

    let (status, _, _) = send(&app, request("GET", "/api/v1/nope", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
