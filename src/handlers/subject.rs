//! 科目的 HTTP 处理器

use crate::{
    auth::AuthContext,
    error::AppError,
    middleware::AppState,
    models::{
        common::{ListWindow, RecordId},
        subject::{CreateSubjectRequest, UpdateSubjectRequest},
    },
    validation::{ValidJson, ValidPath, ValidQuery},
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;

pub async fn create_subject(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidJson(req): ValidJson<CreateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    let subject = state.store.create_subject(req.into_subject(Utc::now())).await?;

    tracing::info!(subject_id = %subject.id, by = %auth_context.subject_id, "Subject created");
    Ok((StatusCode::CREATED, Json(subject)))
}

pub async fn list_subjects(
    State(state): State<Arc<AppState>>,
    ValidQuery(window): ValidQuery<ListWindow>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(state.store.list_subjects(window).await?))
}

pub async fn get_subject(
    State(state): State<Arc<AppState>>,
    ValidPath(path): ValidPath<RecordId>,
) -> Result<impl IntoResponse, AppError> {
    let subject = state
        .store
        .find_subject(&path.id)
        .await?
        .ok_or_else(|| AppError::not_found("subject"))?;

    Ok(Json(subject))
}

pub async fn update_subject(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidPath(path): ValidPath<RecordId>,
    ValidJson(req): ValidJson<UpdateSubjectRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut subject = state
        .store
        .find_subject(&path.id)
        .await?
        .ok_or_else(|| AppError::not_found("subject"))?;

    req.apply(&mut subject);
    subject.updated_at = Utc::now();

    let subject = state
        .store
        .update_subject(subject)
        .await?
        .ok_or_else(|| AppError::not_found("subject"))?;

    tracing::info!(subject_id = %subject.id, by = %auth_context.subject_id, "Subject updated");
    Ok(Json(subject))
}

pub async fn delete_subject(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidPath(path): ValidPath<RecordId>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_subject(&path.id).await? {
        return Err(AppError::not_found("subject"));
    }

    tracing::info!(subject_id = %path.id, by = %auth_context.subject_id, "Subject deleted");
    Ok(StatusCode::NO_CONTENT)
}
