//! 培训的 HTTP 处理器

use crate::{
    auth::AuthContext,
    error::AppError,
    middleware::AppState,
    models::{
        common::{ListWindow, RecordId},
        training::{CreateTrainingRequest, TrainingFilter, UpdateTrainingRequest},
    },
    validation::{ValidJson, ValidPath, ValidQuery},
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;

/// 引用的科目必须存在
async fn require_subject(state: &AppState, subject_id: &str) -> Result<(), AppError> {
    match state.store.find_subject(subject_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::not_found("subject")),
    }
}

pub async fn create_training(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidJson(req): ValidJson<CreateTrainingRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_subject(&state, &req.subject).await?;

    let training = state.store.create_training(req.into_training(Utc::now())).await?;

    tracing::info!(training_id = %training.id, by = %auth_context.subject_id, "Training created");
    Ok((StatusCode::CREATED, Json(training)))
}

pub async fn list_trainings(
    State(state): State<Arc<AppState>>,
    ValidQuery(filter): ValidQuery<TrainingFilter>,
) -> Result<impl IntoResponse, AppError> {
    let window = ListWindow {
        from: filter.from,
        count: filter.count,
    };
    let trainings = state
        .store
        .list_trainings(filter.subject.as_deref(), window)
        .await?;

    Ok(Json(trainings))
}

pub async fn get_training(
    State(state): State<Arc<AppState>>,
    ValidPath(path): ValidPath<RecordId>,
) -> Result<impl IntoResponse, AppError> {
    let training = state
        .store
        .find_training(&path.id)
        .await?
        .ok_or_else(|| AppError::not_found("training"))?;

    Ok(Json(training))
}

pub async fn update_training(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidPath(path): ValidPath<RecordId>,
    ValidJson(req): ValidJson<UpdateTrainingRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut training = state
        .store
        .find_training(&path.id)
        .await?
        .ok_or_else(|| AppError::not_found("training"))?;

    require_subject(&state, &req.subject).await?;

    req.apply(&mut training);
    training.updated_at = Utc::now();

    let training = state
        .store
        .update_training(training)
        .await?
        .ok_or_else(|| AppError::not_found("training"))?;

    tracing::info!(training_id = %training.id, by = %auth_context.subject_id, "Training updated");
    Ok(Json(training))
}

pub async fn delete_training(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidPath(path): ValidPath<RecordId>,
) -> Result<impl IntoResponse, AppError> {
    if !state.store.delete_training(&path.id).await? {
        return Err(AppError::not_found("training"));
    }

    tracing::info!(training_id = %path.id, by = %auth_context.subject_id, "Training deleted");
    Ok(StatusCode::NO_CONTENT)
}
