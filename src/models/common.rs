//! Shared request shapes

use serde::Deserialize;

/// List window taken from the query string
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListWindow {
    /// Number of records to skip
    pub from: Option<i64>,
    pub count: i64,
}

impl ListWindow {
    pub fn offset(&self) -> usize {
        self.from.unwrap_or(0).max(0) as usize
    }

    pub fn limit(&self) -> usize {
        self.count.max(0) as usize
    }
}

/// `{id}` path parameter
#[derive(Debug, Clone, Deserialize)]
pub struct RecordId {
    pub id: String,
}
