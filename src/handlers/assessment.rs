//! 考核的 HTTP 处理器

use crate::{
    auth::AuthContext,
    error::AppError,
    middleware::AppState,
    models::{
        assessment::{
            AssessmentFilter, AssessmentKey, CreateAssessmentRequest, UpdateAssessmentRequest,
        },
        common::ListWindow,
    },
    validation::{ValidJson, ValidPath, ValidQuery},
};
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::Utc;
use std::sync::Arc;

pub async fn create_assessment(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidJson(req): ValidJson<CreateAssessmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    if state.store.find_identity(&req.user_id).await?.is_none() {
        return Err(AppError::not_found("user"));
    }
    if state.store.find_training(&req.training_id).await?.is_none() {
        return Err(AppError::not_found("training"));
    }

    let assessment = state
        .store
        .create_assessment(req.into_assessment(Utc::now()))
        .await?;

    tracing::info!(
        user_id = %assessment.user_id,
        training_id = %assessment.training_id,
        by = %auth_context.subject_id,
        "Assessment created"
    );
    Ok((StatusCode::CREATED, Json(assessment)))
}

pub async fn list_assessments(
    State(state): State<Arc<AppState>>,
    ValidQuery(filter): ValidQuery<AssessmentFilter>,
) -> Result<impl IntoResponse, AppError> {
    let window = ListWindow {
        from: filter.from,
        count: filter.count,
    };
    let assessments = state
        .store
        .list_assessments(
            filter.user_id.as_deref(),
            filter.training_id.as_deref(),
            window,
        )
        .await?;

    Ok(Json(assessments))
}

pub async fn get_assessment(
    State(state): State<Arc<AppState>>,
    ValidPath(key): ValidPath<AssessmentKey>,
) -> Result<impl IntoResponse, AppError> {
    let assessment = state
        .store
        .find_assessment(&key.user_id, &key.training_id)
        .await?
        .ok_or_else(|| AppError::not_found("assessment"))?;

    Ok(Json(assessment))
}

pub async fn update_assessment(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidPath(key): ValidPath<AssessmentKey>,
    ValidJson(req): ValidJson<UpdateAssessmentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mut assessment = state
        .store
        .find_assessment(&key.user_id, &key.training_id)
        .await?
        .ok_or_else(|| AppError::not_found("assessment"))?;

    assessment.marks = req.marks;
    assessment.internet_allowed = req.internet_allowed;
    assessment.updated_at = Utc::now();

    let assessment = state
        .store
        .update_assessment(assessment)
        .await?
        .ok_or_else(|| AppError::not_found("assessment"))?;

    tracing::info!(
        user_id = %key.user_id,
        training_id = %key.training_id,
        by = %auth_context.subject_id,
        "Assessment updated"
    );
    Ok(Json(assessment))
}

pub async fn delete_assessment(
    State(state): State<Arc<AppState>>,
    auth_context: AuthContext,
    ValidPath(key): ValidPath<AssessmentKey>,
) -> Result<impl IntoResponse, AppError> {
    if !state
        .store
        .delete_assessment(&key.user_id, &key.training_id)
        .await?
    {
        return Err(AppError::not_found("assessment"));
    }

    tracing::info!(
        user_id = %key.user_id,
        training_id = %key.training_id,
        by = %auth_context.subject_id,
        "Assessment deleted"
    );
    Ok(StatusCode::NO_CONTENT)
}
