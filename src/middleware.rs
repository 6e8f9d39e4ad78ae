//! HTTP 中间件与应用状态
//! 请求追踪与指标

use crate::{
    auth::{AuthGuard, PasswordHasher, TokenCodec},
    config::AppConfig,
    error::AppError,
    repository::DataStore,
    schemas::Schemas,
    services::SessionService,
};
use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

/// 应用状态
///
/// 启动后只读；handler 通过 `State<Arc<AppState>>` 共享。
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn DataStore>,
    pub codec: Arc<TokenCodec>,
    pub schemas: Arc<Schemas>,
    pub sessions: Arc<SessionService>,
    pub access_guard: Arc<AuthGuard>,
    pub refresh_guard: Arc<AuthGuard>,
}

impl AppState {
    /// 由配置和存储构建全部共享组件
    pub fn new(config: AppConfig, store: Arc<dyn DataStore>) -> Result<Self, AppError> {
        let codec = Arc::new(TokenCodec::from_config(&config.security));
        let hasher = PasswordHasher::from_config(&config.security)?;
        let schemas = Schemas::compile().map_err(|e| AppError::Config(e.to_string()))?;

        let sessions = Arc::new(SessionService::new(store.clone(), codec.clone(), hasher));

        Ok(Self {
            access_guard: Arc::new(AuthGuard::access(codec.clone())),
            refresh_guard: Arc::new(AuthGuard::refresh(codec.clone())),
            config,
            store,
            codec,
            schemas: Arc::new(schemas),
            sessions,
        })
    }
}

/// 请求追踪中间件
/// 为每个请求生成 trace_id 和 request_id，并记录指标
pub async fn request_tracking_middleware(req: Request, next: Next) -> Response {
    let trace_id = extract_or_generate_trace_id(req.headers());
    let request_id = Uuid::new_v4().to_string();

    let method = req.method().to_string();
    let uri = req.uri().path().to_string();

    let span = tracing::info_span!(
        "http_request",
        trace_id = %trace_id,
        request_id = %request_id,
        method = %method,
        uri = %uri,
    );

    async move {
        let start = Instant::now();

        let mut response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status().as_u16();

        // 指标标签只用静态字符串
        let method_label = match method.as_str() {
            "GET" => "GET",
            "POST" => "POST",
            "PUT" => "PUT",
            "DELETE" => "DELETE",
            "PATCH" => "PATCH",
            _ => "OTHER",
        };
        let status_label = match status {
            200 => "200",
            201 => "201",
            204 => "204",
            400 => "400",
            401 => "401",
            403 => "403",
            404 => "404",
            409 => "409",
            500 => "500",
            _ => "other",
        };

        metrics::counter!("http_requests_total", "method" => method_label, "status" => status_label)
            .increment(1);
        metrics::histogram!("http_request_duration_seconds").record(elapsed.as_secs_f64());

        tracing::info!(
            method = %method,
            uri = %uri,
            status = status,
            elapsed_ms = elapsed.as_millis(),
            "Request completed"
        );

        if let Ok(value) = HeaderValue::from_str(&trace_id) {
            response.headers_mut().insert("x-trace-id", value);
        }
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert("x-request-id", value);
        }

        response
    }
    .instrument(span)
    .await
}

/// 从请求头中提取或生成 trace_id
fn extract_or_generate_trace_id(headers: &HeaderMap) -> String {
    headers
        .get("x-trace-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
