//! Subject domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub min_marks: f64,
    pub max_marks: f64,
    /// Minutes
    pub total_time: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create subject request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubjectRequest {
    pub id: String,
    pub name: String,
    pub min_marks: f64,
    pub max_marks: f64,
    pub total_time: i64,
}

impl CreateSubjectRequest {
    pub fn into_subject(self, now: DateTime<Utc>) -> Subject {
        Subject {
            id: self.id,
            name: self.name,
            min_marks: self.min_marks,
            max_marks: self.max_marks,
            total_time: self.total_time,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Update subject request (full replacement, id excluded)
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubjectRequest {
    pub name: String,
    pub min_marks: f64,
    pub max_marks: f64,
    pub total_time: i64,
}

impl UpdateSubjectRequest {
    pub fn apply(self, subject: &mut Subject) {
        subject.name = self.name;
        subject.min_marks = self.min_marks;
        subject.max_marks = self.max_marks;
        subject.total_time = self.total_time;
    }
}
