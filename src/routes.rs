//! 路由注册
//! 创建所有 API 路由并应用中间件

use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
};

use crate::{
    auth::{auth_middleware, scope_middleware, RequiredScope, ADMIN_SCOPE},
    handlers,
    middleware::{request_tracking_middleware, AppState},
};

/// 写操作要求的作用域
const ADMIN_ONLY: RequiredScope = RequiredScope(&[ADMIN_SCOPE]);

/// 创建应用路由
pub fn create_router(state: Arc<AppState>) -> Router {
    // 公开端点（健康检查）
    let public_routes = Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check));

    // 认证路由（无需认证）
    let auth_routes = Router::new()
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/auth/logout", post(handlers::auth::logout));

    // 刷新令牌路由，只接受刷新令牌
    let refresh_routes = Router::new()
        .route("/api/v1/auth/refresh", post(handlers::auth::refresh))
        .route_layer(from_fn_with_state(state.refresh_guard.clone(), auth_middleware));

    // 需要 admin 作用域的写操作
    let admin_routes = Router::new()
        .route("/api/v1/subjects", post(handlers::subject::create_subject))
        .route(
            "/api/v1/subjects/{id}",
            put(handlers::subject::update_subject).delete(handlers::subject::delete_subject),
        )
        .route("/api/v1/trainings", post(handlers::training::create_training))
        .route(
            "/api/v1/trainings/{id}",
            put(handlers::training::update_training).delete(handlers::training::delete_training),
        )
        .route("/api/v1/assessments", post(handlers::assessment::create_assessment))
        .route(
            "/api/v1/assessments/{userId}/{trainingId}",
            put(handlers::assessment::update_assessment)
                .delete(handlers::assessment::delete_assessment),
        )
        .route_layer(from_fn_with_state(ADMIN_ONLY, scope_middleware));

    // 需要访问令牌的路由
    // route_layer 后加的先执行，认证在作用域检查之前
    let authenticated_routes = Router::new()
        .route("/api/v1/auth/me", get(handlers::auth::me))
        // 账户
        .route("/api/v1/users", get(handlers::user::list_users))
        .route(
            "/api/v1/users/me",
            get(handlers::user::get_me)
                .put(handlers::user::update_me)
                .delete(handlers::user::delete_me),
        )
        .route("/api/v1/users/me/password", put(handlers::user::change_password))
        // 科目
        .route("/api/v1/subjects", get(handlers::subject::list_subjects))
        .route("/api/v1/subjects/{id}", get(handlers::subject::get_subject))
        // 培训
        .route("/api/v1/trainings", get(handlers::training::list_trainings))
        .route("/api/v1/trainings/{id}", get(handlers::training::get_training))
        // 考核
        .route("/api/v1/assessments", get(handlers::assessment::list_assessments))
        .route(
            "/api/v1/assessments/{userId}/{trainingId}",
            get(handlers::assessment::get_assessment),
        )
        .merge(admin_routes)
        .route_layer(from_fn_with_state(state.access_guard.clone(), auth_middleware));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 组合所有路由
    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(refresh_routes)
        .merge(authenticated_routes)
        .layer(RequestBodyLimitLayer::new(state.config.server.body_limit_bytes))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(request_tracking_middleware))
        .with_state(state)
}
