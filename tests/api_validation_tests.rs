//! 请求校验集成测试

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::{json, Value};

mod common;
use common::{create_test_app, register, request, send};

fn field_paths(body: &Value) -> Vec<String> {
    body["fieldErrors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| {
            e["path"]
                .as_array()
                .unwrap()
                .iter()
                .map(|p| p.as_str().unwrap())
                .collect::<Vec<_>>()
                .join(".")
        })
        .collect()
}

#[tokio::test]
async fn test_empty_registration_reports_every_field() {
    let (_, app) = create_test_app();

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::empty())
        .unwrap();
    let (status, _, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "request validation failed");

    let paths = field_paths(&body);
    for field in ["id", "email", "password", "firstName"] {
        assert!(paths.contains(&field.to_string()), "missing {} in {:?}", field, paths);
    }
    // role 有默认值
    assert!(!paths.contains(&"role".to_string()));
}

#[tokio::test]
async fn test_weak_password_and_bad_email() {
    let (_, app) = create_test_app();

    let (status, _, body) = send(
        &app,
        request(
            "POST",
            "/api/v1/auth/register",
            Some(json!({
                "id": "u1",
                "email": "not-an-email",
                "password": "short",
                "firstName": "A"
            })),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(field_paths(&body), vec!["email".to_string(), "password".to_string()]);
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let (_, app) = create_test_app();

    let req = Request::builder()
        .method("POST")
        .uri("/api/v1/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"id\": "))
        .unwrap();
    let (status, _, body) = send(&app, req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let errors = body["fieldErrors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0]["path"].as_array().unwrap().is_empty());
    assert!(errors[0]["message"].as_str().unwrap().starts_with("malformed JSON"));
}

#[tokio::test]
async fn test_login_rejects_unknown_fields() {
    let (_, app) = create_test_app();

    let (status, _, body) = send(
        &app,
        request(
            "POST",
            "/api/v1/auth/login",
            Some(json!({"id": "u1", "password": "x", "remember": true})),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fieldErrors"][0]["path"], json!(["remember"]));
    assert_eq!(body["fieldErrors"][0]["message"], "unrecognized field");
}

#[tokio::test]
async fn test_unparsable_query_number_falls_back_to_default() {
    let (_, app) = create_test_app();
    let token = register(&app, "u1").await;

    let (status, _, body) =
        send(&app, request("GET", "/api/v1/users?from=abc", None, Some(&token))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _, _) =
        send(&app, request("GET", "/api/v1/subjects?from=abc&count=xyz", None, Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_query_window_bounds() {
    let (_, app) = create_test_app();
    let token = register(&app, "u1").await;

    let (status, _, body) =
        send(&app, request("GET", "/api/v1/users?count=101", None, Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fieldErrors"][0]["path"], json!(["count"]));
    assert_eq!(body["fieldErrors"][0]["message"], "count cannot be greater than 100");

    let (status, _, _) =
        send(&app, request("GET", "/api/v1/users?count=0", None, Some(&token))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_window_pages_through_users() {
    let (_, app) = create_test_app();
    let token = register(&app, "a").await;
    register(&app, "b").await;
    register(&app, "c").await;

    let (status, _, body) =
        send(&app, request("GET", "/api/v1/users?from=1&count=1", None, Some(&token))).await;

    assert_eq!(status, StatusCode::OK);
    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["id"], "b");
}

#[tokio::test]
async fn test_subject_marks_cross_check() {
    let (_, app) = create_test_app();
    let token = register(&app, "u1").await;

    let (status, _, body) = send(
        &app,
        request(
            "POST",
            "/api/v1/subjects",
            Some(json!({
                "id": "math",
                "name": "Math",
                "minMarks": 40,
                "maxMarks": 10,
                "totalTime": 60
            })),
            Some(&token),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["fieldErrors"][0]["path"], json!(["maxMarks"]));
}
