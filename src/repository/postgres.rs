//! PostgreSQL 存储
//!
//! 连接池参数来自 [`DatabaseConfig`]，启动时执行 `migrations/` 下的迁移。

use super::{DataStore, HealthStatus, StoreError, StoreResult};
use crate::{
    config::DatabaseConfig,
    models::{
        assessment::Assessment,
        common::ListWindow,
        identity::{Credential, Identity},
        subject::Subject,
        training::Training,
    },
};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// 唯一性与外键冲突归为约束冲突
impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() || db_err.is_foreign_key_violation() {
                return StoreError::ConstraintViolation(db_err.message().to_string());
            }
        }
        StoreError::Backend(e.to_string())
    }
}

fn window_args(window: ListWindow) -> (i64, i64) {
    (window.offset() as i64, window.limit() as i64)
}

/// 按配置构造连接池参数，借出前先探活
fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .test_before_acquire(true)
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 建立连接池；未配置 url 时直接失败
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let url = config
            .url
            .as_ref()
            .ok_or_else(|| StoreError::Backend("database url is not configured".to_string()))?;

        let pool = pool_options(config)
            .connect(url.expose_secret())
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Postgres store connection failed");
                StoreError::Backend(e.to_string())
            })?;

        tracing::info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Postgres store connected"
        );
        Ok(Self::new(pool))
    }

    /// 执行内嵌迁移，已执行的版本会跳过
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Postgres store migration failed");
                StoreError::Backend(e.to_string())
            })?;

        tracing::info!("Postgres store schema up to date");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DataStore for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn health(&self) -> HealthStatus {
        metrics::gauge!("store.pool.size", "backend" => "postgres").set(self.pool.size() as f64);
        metrics::gauge!("store.pool.idle", "backend" => "postgres")
            .set(self.pool.num_idle() as f64);

        match sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&self.pool).await {
            Ok(_) => HealthStatus::Healthy,
            Err(e) => {
                tracing::warn!(error = %e, "Postgres store unreachable");
                HealthStatus::Unhealthy(e.to_string())
            }
        }
    }

    async fn find_identity(&self, id: &str) -> StoreResult<Option<Identity>> {
        let identity = sqlx::query_as::<_, Identity>("SELECT * FROM identities WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(identity)
    }

    async fn find_identity_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
        let identity = sqlx::query_as::<_, Identity>("SELECT * FROM identities WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(identity)
    }

    async fn list_identities(&self, window: ListWindow) -> StoreResult<Vec<Identity>> {
        let (offset, limit) = window_args(window);
        let identities = sqlx::query_as::<_, Identity>(
            "SELECT * FROM identities ORDER BY id OFFSET $1 LIMIT $2",
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(identities)
    }

    async fn create_identity(
        &self,
        identity: Identity,
        credential: Credential,
    ) -> StoreResult<Identity> {
        let mut tx = self.pool.begin().await?;

        let created = sqlx::query_as::<_, Identity>(
            r#"
            INSERT INTO identities
                (id, email, first_name, middle_name, last_name, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&identity.id)
        .bind(&identity.email)
        .bind(&identity.first_name)
        .bind(&identity.middle_name)
        .bind(&identity.last_name)
        .bind(identity.role)
        .bind(identity.created_at)
        .bind(identity.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO credentials (identity_id, password_hash, updated_at) VALUES ($1, $2, $3)",
        )
        .bind(&credential.identity_id)
        .bind(&credential.password_hash)
        .bind(credential.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn update_identity(&self, identity: Identity) -> StoreResult<Option<Identity>> {
        let updated = sqlx::query_as::<_, Identity>(
            r#"
            UPDATE identities
            SET email = $2, first_name = $3, middle_name = $4, last_name = $5, role = $6,
                updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(&identity.id)
        .bind(&identity.email)
        .bind(&identity.first_name)
        .bind(&identity.middle_name)
        .bind(&identity.last_name)
        .bind(identity.role)
        .bind(identity.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete_identity(&self, id: &str) -> StoreResult<bool> {
        // credentials 与 assessments 由外键级联删除
        let result = sqlx::query("DELETE FROM identities WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_credential(&self, identity_id: &str) -> StoreResult<Option<Credential>> {
        let credential =
            sqlx::query_as::<_, Credential>("SELECT * FROM credentials WHERE identity_id = $1")
                .bind(identity_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(credential)
    }

    async fn replace_credential(&self, credential: Credential) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE credentials SET password_hash = $2, updated_at = $3 WHERE identity_id = $1",
        )
        .bind(&credential.identity_id)
        .bind(&credential.password_hash)
        .bind(credential.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_subject(&self, id: &str) -> StoreResult<Option<Subject>> {
        let subject = sqlx::query_as::<_, Subject>("SELECT * FROM subjects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(subject)
    }

    async fn list_subjects(&self, window: ListWindow) -> StoreResult<Vec<Subject>> {
        let (offset, limit) = window_args(window);
        let subjects =
            sqlx::query_as::<_, Subject>("SELECT * FROM subjects ORDER BY id OFFSET $1 LIMIT $2")
                .bind(offset)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?;

        Ok(subjects)
    }

    async fn create_subject(&self, subject: Subject) -> StoreResult<Subject> {
        let created = sqlx::query_as::<_, Subject>(
            r#"
            INSERT INTO subjects (id, name, min_marks, max_marks, total_time, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&subject.id)
        .bind(&subject.name)
        .bind(subject.min_marks)
        .bind(subject.max_marks)
        .bind(subject.total_time)
        .bind(subject.created_at)
        .bind(subject.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update_subject(&self, subject: Subject) -> StoreResult<Option<Subject>> {
        let updated = sqlx::query_as::<_, Subject>(
            r#"
            UPDATE subjects
            SET name = $2, min_marks = $3, max_marks = $4, total_time = $5, updated_at = $6
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(&subject.id)
        .bind(&subject.name)
        .bind(subject.min_marks)
        .bind(subject.max_marks)
        .bind(subject.total_time)
        .bind(subject.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete_subject(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM subjects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_training(&self, id: &str) -> StoreResult<Option<Training>> {
        let training = sqlx::query_as::<_, Training>("SELECT * FROM trainings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(training)
    }

    async fn list_trainings(
        &self,
        subject_id: Option<&str>,
        window: ListWindow,
    ) -> StoreResult<Vec<Training>> {
        let (offset, limit) = window_args(window);
        let trainings = sqlx::query_as::<_, Training>(
            r#"
            SELECT * FROM trainings
            WHERE ($1::TEXT IS NULL OR subject_id = $1)
            ORDER BY id
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(subject_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(trainings)
    }

    async fn create_training(&self, training: Training) -> StoreResult<Training> {
        let created = sqlx::query_as::<_, Training>(
            r#"
            INSERT INTO trainings
                (id, name, mode, subject_id, started_at, ended_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&training.id)
        .bind(&training.name)
        .bind(training.mode)
        .bind(&training.subject_id)
        .bind(training.started_at)
        .bind(training.ended_at)
        .bind(training.created_at)
        .bind(training.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update_training(&self, training: Training) -> StoreResult<Option<Training>> {
        let updated = sqlx::query_as::<_, Training>(
            r#"
            UPDATE trainings
            SET name = $2, mode = $3, subject_id = $4, started_at = $5, ended_at = $6,
                updated_at = $7
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(&training.id)
        .bind(&training.name)
        .bind(training.mode)
        .bind(&training.subject_id)
        .bind(training.started_at)
        .bind(training.ended_at)
        .bind(training.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete_training(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM trainings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_assessment(
        &self,
        user_id: &str,
        training_id: &str,
    ) -> StoreResult<Option<Assessment>> {
        let assessment = sqlx::query_as::<_, Assessment>(
            "SELECT * FROM assessments WHERE user_id = $1 AND training_id = $2",
        )
        .bind(user_id)
        .bind(training_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(assessment)
    }

    async fn list_assessments(
        &self,
        user_id: Option<&str>,
        training_id: Option<&str>,
        window: ListWindow,
    ) -> StoreResult<Vec<Assessment>> {
        let (offset, limit) = window_args(window);
        let assessments = sqlx::query_as::<_, Assessment>(
            r#"
            SELECT * FROM assessments
            WHERE ($1::TEXT IS NULL OR user_id = $1)
              AND ($2::TEXT IS NULL OR training_id = $2)
            ORDER BY user_id, training_id
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(user_id)
        .bind(training_id)
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(assessments)
    }

    async fn create_assessment(&self, assessment: Assessment) -> StoreResult<Assessment> {
        let created = sqlx::query_as::<_, Assessment>(
            r#"
            INSERT INTO assessments
                (user_id, training_id, marks, internet_allowed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&assessment.user_id)
        .bind(&assessment.training_id)
        .bind(assessment.marks)
        .bind(assessment.internet_allowed)
        .bind(assessment.created_at)
        .bind(assessment.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update_assessment(&self, assessment: Assessment) -> StoreResult<Option<Assessment>> {
        let updated = sqlx::query_as::<_, Assessment>(
            r#"
            UPDATE assessments
            SET marks = $3, internet_allowed = $4, updated_at = $5
            WHERE user_id = $1 AND training_id = $2
            RETURNING *
            "#,
        )
        .bind(&assessment.user_id)
        .bind(&assessment.training_id)
        .bind(assessment.marks)
        .bind(assessment.internet_allowed)
        .bind(assessment.updated_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete_assessment(&self, user_id: &str, training_id: &str) -> StoreResult<bool> {
        let result =
            sqlx::query("DELETE FROM assessments WHERE user_id = $1 AND training_id = $2")
                .bind(user_id)
                .bind(training_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn database_config(url: Option<&str>) -> DatabaseConfig {
        DatabaseConfig {
            url: url.map(|u| secrecy::Secret::new(u.to_string())),
            max_connections: 7,
            min_connections: 2,
            acquire_timeout_secs: 3,
            idle_timeout_secs: 60,
            max_lifetime_secs: 600,
        }
    }

    #[test]
    fn test_pool_options_follow_config() {
        let options = pool_options(&database_config(None));

        assert_eq!(options.get_max_connections(), 7);
        assert_eq!(options.get_min_connections(), 2);
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(3));
        assert_eq!(options.get_idle_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(options.get_max_lifetime(), Some(Duration::from_secs(600)));
        assert!(options.get_test_before_acquire());
    }

    #[tokio::test]
    async fn test_connect_without_url() {
        let err = PgStore::connect(&database_config(None)).await.err().unwrap();
        assert_eq!(
            err,
            StoreError::Backend("database url is not configured".to_string())
        );
    }
}
