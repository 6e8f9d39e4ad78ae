//! Training session domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Training delivery mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "training_mode", rename_all = "lowercase")]
pub enum TrainingMode {
    Online,
    Offline,
    Onsite,
}

/// Training session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Training {
    pub id: String,
    pub name: String,
    pub mode: TrainingMode,
    /// Referenced subject id
    #[serde(rename = "subject")]
    pub subject_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create training request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTrainingRequest {
    pub id: String,
    pub name: String,
    pub mode: TrainingMode,
    pub subject: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl CreateTrainingRequest {
    pub fn into_training(self, now: DateTime<Utc>) -> Training {
        Training {
            id: self.id,
            name: self.name,
            mode: self.mode,
            subject_id: self.subject,
            started_at: self.started_at,
            ended_at: self.ended_at,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Update training request (full replacement, id excluded)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTrainingRequest {
    pub name: String,
    pub mode: TrainingMode,
    pub subject: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

impl UpdateTrainingRequest {
    pub fn apply(self, training: &mut Training) {
        training.name = self.name;
        training.mode = self.mode;
        training.subject_id = self.subject;
        training.started_at = self.started_at;
        training.ended_at = self.ended_at;
    }
}

/// Training list query
#[derive(Debug, Clone, Deserialize)]
pub struct TrainingFilter {
    pub subject: Option<String>,
    pub from: Option<i64>,
    pub count: i64,
}
