//! 测试公共模块
//! 提供测试配置、内存存储应用和请求辅助函数

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, HeaderMap, Request, StatusCode},
    Router,
};
use empstat::{
    config::{
        AppConfig, DatabaseConfig, LoggingConfig, SecurityConfig, ServerConfig, StoreBackend,
        StoreConfig,
    },
    middleware::AppState,
    repository::{DataStore, MemoryStore},
    routes,
};
use http_body_util::BodyExt;
use secrecy::Secret;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "Abcdef1!";

/// 创建测试配置
pub fn create_test_config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            addr: "127.0.0.1:0".to_string(),
            graceful_shutdown_timeout_secs: 5,
            body_limit_bytes: 64 * 1024,
        },
        store: StoreConfig {
            backend: StoreBackend::Memory,
        },
        database: DatabaseConfig {
            url: std::env::var("TEST_DATABASE_URL").ok().map(Secret::new),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout_secs: 5,
            idle_timeout_secs: 300,
            max_lifetime_secs: 1800,
        },
        logging: LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: SecurityConfig {
            access_token_secret: Secret::new("test-access-secret-for-testing-only-32+".to_string()),
            refresh_token_secret: Secret::new(
                "test-refresh-secret-for-testing-only-32+".to_string(),
            ),
            access_token_ttl_secs: 300,
            refresh_token_ttl_secs: 3600,
            // 测试中降低哈希开销
            password_work_factor: 1,
            password_memory_kib: 1024,
            cookie_secure: false,
        },
    }
}

/// 基于给定存储创建应用状态
pub fn create_test_app_state_with(store: Arc<dyn DataStore>) -> Arc<AppState> {
    Arc::new(AppState::new(create_test_config(), store).expect("Failed to build app state"))
}

/// 基于内存存储创建应用状态
pub fn create_test_app_state() -> Arc<AppState> {
    create_test_app_state_with(Arc::new(MemoryStore::new()))
}

/// 创建测试应用
pub fn create_test_app() -> (Arc<AppState>, Router) {
    let state = create_test_app_state();
    let app = routes::create_router(state.clone());
    (state, app)
}

/// 构建请求，可带 JSON 体和 Bearer 访问令牌
pub fn request(method: &str, uri: &str, body: Option<Value>, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    builder.body(body).unwrap()
}

/// 发送请求并读取 JSON 响应体（空响应体返回 Null）
pub async fn send(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
    let response = app.clone().oneshot(req).await.unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, headers, json)
}

/// 注册请求体
pub fn registration(id: &str) -> Value {
    json!({
        "id": id,
        "email": format!("{}@example.com", id),
        "password": TEST_PASSWORD,
        "firstName": "Test",
        "role": "employee"
    })
}

/// 注册账户并返回访问令牌
pub async fn register(app: &Router, id: &str) -> String {
    let (status, _, body) = send(
        app,
        request("POST", "/api/v1/auth/register", Some(registration(id)), None),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);

    body["accessToken"].as_str().unwrap().to_string()
}

/// 读取所有 Set-Cookie 值
pub fn set_cookies(headers: &HeaderMap) -> Vec<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}
