//! 认证相关的 HTTP 处理器
//!
//! 令牌同时写入 HttpOnly cookie 并在响应体中返回。

use crate::{
    auth::{
        cookie::{clear_cookie, token_cookie, ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME},
        AuthContext,
    },
    error::AppError,
    middleware::AppState,
    models::{
        auth::{LoginRequest, SessionInfo, TokenPair},
        identity::CreateIdentityRequest,
    },
    validation::ValidJson,
};
use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

fn session_cookies(state: &AppState, tokens: &TokenPair) -> HeaderMap {
    let secure = state.config.security.cookie_secure;
    let mut headers = HeaderMap::new();
    headers.append(
        SET_COOKIE,
        token_cookie(
            ACCESS_COOKIE_NAME,
            &tokens.access_token,
            Some(state.codec.access_ttl_secs()),
            secure,
        ),
    );
    headers.append(
        SET_COOKIE,
        token_cookie(
            REFRESH_COOKIE_NAME,
            &tokens.refresh_token,
            state.codec.refresh_ttl_secs(),
            secure,
        ),
    );
    headers
}

/// 注册
pub async fn register(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<CreateIdentityRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (_, tokens) = state.sessions.register(req).await?;
    let cookies = session_cookies(&state, &tokens);

    Ok((StatusCode::CREATED, cookies, Json(tokens)))
}

/// 登录
pub async fn login(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let tokens = state.sessions.login(req).await?;
    let cookies = session_cookies(&state, &tokens);

    Ok((cookies, Json(tokens)))
}

/// 刷新访问令牌，路由上挂载刷新令牌守卫
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let response = state.sessions.refresh(&auth_context)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        SET_COOKIE,
        token_cookie(
            ACCESS_COOKIE_NAME,
            &response.access_token,
            Some(response.expires_in),
            state.config.security.cookie_secure,
        ),
    );

    Ok((headers, Json(response)))
}

/// 登出：只清除客户端 cookie，服务端不保存会话
pub async fn logout() -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.append(SET_COOKIE, clear_cookie(ACCESS_COOKIE_NAME));
    headers.append(SET_COOKIE, clear_cookie(REFRESH_COOKIE_NAME));

    (StatusCode::NO_CONTENT, headers)
}

/// 当前令牌对应的身份
pub async fn me(auth_context: AuthContext) -> Json<SessionInfo> {
    Json(SessionInfo {
        subject_id: auth_context.subject_id,
        scope: auth_context.scope,
    })
}
