//! 数据存储层
//!
//! 记录的增删改查都经过 [`DataStore`]；唯一性与外键冲突统一报告为
//! [`StoreError::ConstraintViolation`]，每次调用自成一个事务。

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::models::{
    assessment::Assessment,
    common::ListWindow,
    identity::{Credential, Identity},
    subject::Subject,
    training::Training,
};
use async_trait::async_trait;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// 存储层错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// 唯一性或外键约束冲突
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Backend failure: {0}")]
    Backend(String),
}

/// 健康状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthStatus::Healthy)
    }
}

/// 记录存储接口
#[async_trait]
pub trait DataStore: Send + Sync {
    /// 存储后端名称，用于日志
    fn backend(&self) -> &'static str;

    async fn health(&self) -> HealthStatus;

    // 账户
    async fn find_identity(&self, id: &str) -> StoreResult<Option<Identity>>;
    async fn find_identity_by_email(&self, email: &str) -> StoreResult<Option<Identity>>;
    async fn list_identities(&self, window: ListWindow) -> StoreResult<Vec<Identity>>;
    /// 账户与凭据一起创建
    async fn create_identity(
        &self,
        identity: Identity,
        credential: Credential,
    ) -> StoreResult<Identity>;
    async fn update_identity(&self, identity: Identity) -> StoreResult<Option<Identity>>;
    /// 级联删除凭据与考核
    async fn delete_identity(&self, id: &str) -> StoreResult<bool>;

    // 凭据
    async fn find_credential(&self, identity_id: &str) -> StoreResult<Option<Credential>>;
    async fn replace_credential(&self, credential: Credential) -> StoreResult<bool>;

    // 科目
    async fn find_subject(&self, id: &str) -> StoreResult<Option<Subject>>;
    async fn list_subjects(&self, window: ListWindow) -> StoreResult<Vec<Subject>>;
    async fn create_subject(&self, subject: Subject) -> StoreResult<Subject>;
    async fn update_subject(&self, subject: Subject) -> StoreResult<Option<Subject>>;
    /// 仍被培训引用时报告约束冲突
    async fn delete_subject(&self, id: &str) -> StoreResult<bool>;

    // 培训
    async fn find_training(&self, id: &str) -> StoreResult<Option<Training>>;
    async fn list_trainings(
        &self,
        subject_id: Option<&str>,
        window: ListWindow,
    ) -> StoreResult<Vec<Training>>;
    async fn create_training(&self, training: Training) -> StoreResult<Training>;
    async fn update_training(&self, training: Training) -> StoreResult<Option<Training>>;
    /// 仍被考核引用时报告约束冲突
    async fn delete_training(&self, id: &str) -> StoreResult<bool>;

    // 考核
    async fn find_assessment(
        &self,
        user_id: &str,
        training_id: &str,
    ) -> StoreResult<Option<Assessment>>;
    async fn list_assessments(
        &self,
        user_id: Option<&str>,
        training_id: Option<&str>,
        window: ListWindow,
    ) -> StoreResult<Vec<Assessment>>;
    async fn create_assessment(&self, assessment: Assessment) -> StoreResult<Assessment>;
    async fn update_assessment(&self, assessment: Assessment) -> StoreResult<Option<Assessment>>;
    async fn delete_assessment(&self, user_id: &str, training_id: &str) -> StoreResult<bool>;
}
