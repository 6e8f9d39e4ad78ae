//! 账户的 HTTP 处理器

use crate::{
    auth::{
        cookie::{clear_cookie, ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME},
        AuthContext,
    },
    error::AppError,
    middleware::AppState,
    models::{
        common::ListWindow,
        identity::{ChangePasswordRequest, UpdateProfileRequest},
    },
    validation::{ValidJson, ValidQuery},
};
use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;

/// 列出账户
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    ValidQuery(window): ValidQuery<ListWindow>,
) -> Result<impl IntoResponse, AppError> {
    let users = state.store.list_identities(window).await?;
    Ok(Json(users))
}

/// 当前账户
pub async fn get_me(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .store
        .find_identity(&auth_context.subject_id)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;

    Ok(Json(user))
}

/// 修改资料
pub async fn update_me(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidJson(req): ValidJson<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut user = state
        .store
        .find_identity(&auth_context.subject_id)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;

    req.apply(&mut user);
    user.updated_at = Utc::now();

    let user = state
        .store
        .update_identity(user)
        .await?
        .ok_or_else(|| AppError::not_found("user"))?;

    tracing::info!(user_id = %user.id, "Profile updated");
    Ok(Json(user))
}

/// 修改密码
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidJson(req): ValidJson<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .sessions
        .change_password(&auth_context.subject_id, req)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// 删除当前账户，凭据与考核一并删除
pub async fn delete_me(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_identity(&auth_context.subject_id).await? {
        return Err(AppError::not_found("user"));
    }

    tracing::info!(user_id = %auth_context.subject_id, "Account deleted");

    let mut headers = HeaderMap::new();
    headers.append(SET_COOKIE, clear_cookie(ACCESS_COOKIE_NAME));
    headers.append(SET_COOKIE, clear_cookie(REFRESH_COOKIE_NAME));

    Ok((StatusCode::NO_CONTENT, headers))
}
