//! Assessment domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Assessment of one account in one training, keyed by both ids
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub user_id: String,
    pub training_id: String,
    pub marks: f64,
    pub internet_allowed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `{userId}/{trainingId}` path parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentKey {
    pub user_id: String,
    pub training_id: String,
}

/// Create assessment request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssessmentRequest {
    pub user_id: String,
    pub training_id: String,
    pub marks: f64,
    pub internet_allowed: bool,
}

impl CreateAssessmentRequest {
    pub fn into_assessment(self, now: DateTime<Utc>) -> Assessment {
        Assessment {
            user_id: self.user_id,
            training_id: self.training_id,
            marks: self.marks,
            internet_allowed: self.internet_allowed,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Update assessment request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAssessmentRequest {
    pub marks: f64,
    pub internet_allowed: bool,
}

/// Assessment list query
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentFilter {
    pub user_id: Option<String>,
    pub training_id: Option<String>,
    pub from: Option<i64>,
    pub count: i64,
}
