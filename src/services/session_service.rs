//! 会话服务：注册、登录、令牌刷新、修改密码
//!
//! 令牌不落库；失败路径上不写入任何状态。

use crate::{
    auth::{AuthContext, PasswordHasher, TokenCodec, ADMIN_SCOPE},
    error::AppError,
    models::{
        auth::{AccessTokenResponse, LoginRequest, TokenPair},
        identity::{ChangePasswordRequest, CreateIdentityRequest, Credential, Identity},
    },
    repository::DataStore,
};
use chrono::Utc;
use std::sync::Arc;

pub struct SessionService {
    store: Arc<dyn DataStore>,
    codec: Arc<TokenCodec>,
    hasher: PasswordHasher,
}

impl SessionService {
    pub fn new(store: Arc<dyn DataStore>, codec: Arc<TokenCodec>, hasher: PasswordHasher) -> Self {
        Self {
            store,
            codec,
            hasher,
        }
    }

    /// 注册新账户并签发令牌
    pub async fn register(&self, req: CreateIdentityRequest) -> Result<(Identity, TokenPair), AppError> {
        tracing::info!(user_id = %req.id, "Register request received");

        if self.store.find_identity(&req.id).await?.is_some() {
            tracing::info!(user_id = %req.id, "Register rejected, id already exists");
            return Err(AppError::conflict("user with this id already exists"));
        }
        if self.store.find_identity_by_email(&req.email).await?.is_some() {
            tracing::info!(user_id = %req.id, "Register rejected, email already exists");
            return Err(AppError::conflict("user with this email already exists"));
        }

        let password_hash = self.hasher.hash_blocking(req.password.clone()).await?;

        let now = Utc::now();
        let credential = Credential {
            identity_id: req.id.clone(),
            password_hash,
            updated_at: now,
        };
        // 并发的重复注册由存储层唯一约束拦截
        let identity = self.store.create_identity(req.to_identity(now), credential).await?;

        let tokens = self.issue_tokens(&identity.id)?;

        tracing::info!(user_id = %identity.id, "Register completed");
        Ok((identity, tokens))
    }

    /// 校验凭据并签发令牌
    pub async fn login(&self, req: LoginRequest) -> Result<TokenPair, AppError> {
        tracing::info!(user_id = %req.id, "Login request received");

        let identity = self.store.find_identity(&req.id).await?.ok_or_else(|| {
            tracing::info!(user_id = %req.id, "Login rejected, user not found");
            AppError::not_found("user")
        })?;

        let credential = self.store.find_credential(&identity.id).await?.ok_or_else(|| {
            tracing::warn!(user_id = %identity.id, "Login rejected, credential not found");
            AppError::not_found("credential")
        })?;

        let matched = self
            .hasher
            .verify_blocking(req.password, credential.password_hash)
            .await?;
        if !matched {
            tracing::info!(user_id = %identity.id, "Login rejected, password does not match");
            return Err(AppError::Unauthorized);
        }

        let tokens = self.issue_tokens(&identity.id)?;

        tracing::info!(user_id = %identity.id, "Login completed");
        Ok(tokens)
    }

    /// 用已校验的刷新令牌签发新的访问令牌，刷新令牌本身不重签
    pub fn refresh(&self, context: &AuthContext) -> Result<AccessTokenResponse, AppError> {
        let access_token = self.codec.issue_access(&context.subject_id, &context.scope)?;

        tracing::info!(user_id = %context.subject_id, "Access token refreshed");
        Ok(AccessTokenResponse {
            access_token,
            expires_in: self.codec.access_ttl_secs(),
        })
    }

    /// 校验旧密码后替换凭据
    pub async fn change_password(
        &self,
        subject_id: &str,
        req: ChangePasswordRequest,
    ) -> Result<(), AppError> {
        let credential = self
            .store
            .find_credential(subject_id)
            .await?
            .ok_or_else(|| AppError::not_found("credential"))?;

        let matched = self
            .hasher
            .verify_blocking(req.current_password, credential.password_hash)
            .await?;
        if !matched {
            tracing::info!(user_id = %subject_id, "Password change rejected, current password does not match");
            return Err(AppError::Unauthorized);
        }

        let password_hash = self.hasher.hash_blocking(req.new_password).await?;
        let replaced = self
            .store
            .replace_credential(Credential {
                identity_id: subject_id.to_string(),
                password_hash,
                updated_at: Utc::now(),
            })
            .await?;
        if !replaced {
            return Err(AppError::not_found("user"));
        }

        tracing::info!(user_id = %subject_id, "Password changed");
        Ok(())
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    // 单一固定作用域
    fn issue_tokens(&self, subject_id: &str) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.codec.issue_access(subject_id, ADMIN_SCOPE)?,
            refresh_token: self.codec.issue_refresh(subject_id, ADMIN_SCOPE)?,
            expires_in: self.codec.access_ttl_secs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::TokenKind,
        config::SecurityConfig,
        models::{
            assessment::Assessment, common::ListWindow, identity::Role, subject::Subject,
            training::Training,
        },
        repository::{HealthStatus, MemoryStore, StoreResult},
    };
    use async_trait::async_trait;
    use axum::{http::StatusCode, response::IntoResponse};
    use http_body_util::BodyExt;
    use secrecy::Secret;

    /// 账户存在但凭据行丢失的存储
    struct CredentiallessStore(MemoryStore);

    #[async_trait]
    impl DataStore for CredentiallessStore {
        fn backend(&self) -> &'static str {
            "credentialless"
        }
        async fn health(&self) -> HealthStatus {
            self.0.health().await
        }
        async fn find_identity(&self, id: &str) -> StoreResult<Option<Identity>> {
            self.0.find_identity(id).await
        }
        async fn find_identity_by_email(&self, email: &str) -> StoreResult<Option<Identity>> {
            self.0.find_identity_by_email(email).await
        }
        async fn list_identities(&self, window: ListWindow) -> StoreResult<Vec<Identity>> {
            self.0.list_identities(window).await
        }
        async fn create_identity(
            &self,
            identity: Identity,
            credential: Credential,
        ) -> StoreResult<Identity> {
            self.0.create_identity(identity, credential).await
        }
        async fn update_identity(&self, identity: Identity) -> StoreResult<Option<Identity>> {
            self.0.update_identity(identity).await
        }
        async fn delete_identity(&self, id: &str) -> StoreResult<bool> {
            self.0.delete_identity(id).await
        }
        async fn find_credential(&self, _identity_id: &str) -> StoreResult<Option<Credential>> {
            Ok(None)
        }
        async fn replace_credential(&self, credential: Credential) -> StoreResult<bool> {
            self.0.replace_credential(credential).await
        }
        async fn find_subject(&self, id: &str) -> StoreResult<Option<Subject>> {
            self.0.find_subject(id).await
        }
        async fn list_subjects(&self, window: ListWindow) -> StoreResult<Vec<Subject>> {
            self.0.list_subjects(window).await
        }
        async fn create_subject(&self, subject: Subject) -> StoreResult<Subject> {
            self.0.create_subject(subject).await
        }
        async fn update_subject(&self, subject: Subject) -> StoreResult<Option<Subject>> {
            self.0.update_subject(subject).await
        }
        async fn delete_subject(&self, id: &str) -> StoreResult<bool> {
            self.0.delete_subject(id).await
        }
        async fn find_training(&self, id: &str) -> StoreResult<Option<Training>> {
            self.0.find_training(id).await
        }
        async fn list_trainings(
            &self,
            subject_id: Option<&str>,
            window: ListWindow,
        ) -> StoreResult<Vec<Training>> {
            self.0.list_trainings(subject_id, window).await
        }
        async fn create_training(&self, training: Training) -> StoreResult<Training> {
            self.0.create_training(training).await
        }
        async fn update_training(&self, training: Training) -> StoreResult<Option<Training>> {
            self.0.update_training(training).await
        }
        async fn delete_training(&self, id: &str) -> StoreResult<bool> {
            self.0.delete_training(id).await
        }
        async fn find_assessment(
            &self,
            user_id: &str,
            training_id: &str,
        ) -> StoreResult<Option<Assessment>> {
            self.0.find_assessment(user_id, training_id).await
        }
        async fn list_assessments(
            &self,
            user_id: Option<&str>,
            training_id: Option<&str>,
            window: ListWindow,
        ) -> StoreResult<Vec<Assessment>> {
            self.0.list_assessments(user_id, training_id, window).await
        }
        async fn create_assessment(&self, assessment: Assessment) -> StoreResult<Assessment> {
            self.0.create_assessment(assessment).await
        }
        async fn update_assessment(
            &self,
            assessment: Assessment,
        ) -> StoreResult<Option<Assessment>> {
            self.0.update_assessment(assessment).await
        }
        async fn delete_assessment(&self, user_id: &str, training_id: &str) -> StoreResult<bool> {
            self.0.delete_assessment(user_id, training_id).await
        }
    }

    fn security() -> SecurityConfig {
        SecurityConfig {
            access_token_secret: Secret::new("access_secret_key_32_characters_long!".to_string()),
            refresh_token_secret: Secret::new("refresh_secret_key_32_characters_long".to_string()),
            access_token_ttl_secs: 900,
            refresh_token_ttl_secs: 3600,
            password_work_factor: 1,
            password_memory_kib: 1024,
            cookie_secure: false,
        }
    }

    fn service_with(store: Arc<dyn DataStore>) -> SessionService {
        let security = security();
        SessionService::new(
            store,
            Arc::new(TokenCodec::from_config(&security)),
            PasswordHasher::from_config(&security).unwrap(),
        )
    }

    fn service() -> (SessionService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (service_with(store.clone()), store)
    }

    fn registration() -> CreateIdentityRequest {
        CreateIdentityRequest {
            id: "u1".to_string(),
            email: "u1@x.com".to_string(),
            password: "Abcdef1!".to_string(),
            first_name: "A".to_string(),
            middle_name: None,
            last_name: None,
            role: Role::Employee,
        }
    }

    #[tokio::test]
    async fn test_register_issues_admin_scoped_tokens() {
        let (service, store) = service();
        let (identity, tokens) = service.register(registration()).await.unwrap();
        assert_eq!(identity.id, "u1");

        let access = service.codec().verify(TokenKind::Access, &tokens.access_token).unwrap();
        assert_eq!(access.subject_id, "u1");
        assert_eq!(access.scope, ADMIN_SCOPE);
        let refresh = service.codec().verify(TokenKind::Refresh, &tokens.refresh_token).unwrap();
        assert_eq!(refresh.scope, ADMIN_SCOPE);

        // 只存哈希
        let credential = store.find_credential("u1").await.unwrap().unwrap();
        assert!(credential.password_hash.starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_register_conflicts() {
        let (service, _) = service();
        service.register(registration()).await.unwrap();

        let err = service.register(registration()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let mut same_email = registration();
        same_email.id = "u2".to_string();
        let err = service.register(same_email).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_login_outcomes() {
        let (service, _) = service();
        service.register(registration()).await.unwrap();

        let err = service
            .login(LoginRequest {
                id: "ghost".to_string(),
                password: "Abcdef1!".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let err = service
            .login(LoginRequest {
                id: "u1".to_string(),
                password: "Wrong1!xx".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));

        let tokens = service
            .login(LoginRequest {
                id: "u1".to_string(),
                password: "Abcdef1!".to_string(),
            })
            .await
            .unwrap();
        assert!(!tokens.access_token.is_empty());
        assert_eq!(tokens.expires_in, 900);
    }

    #[tokio::test]
    async fn test_login_without_credential_row() {
        let service = service_with(Arc::new(CredentiallessStore(MemoryStore::new())));
        service.register(registration()).await.unwrap();

        let err = service
            .login(LoginRequest {
                id: "u1".to_string(),
                password: "Abcdef1!".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(ref what) if what == "credential"));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_login_with_corrupt_hash_is_internal_error() {
        let (service, store) = service();
        service.register(registration()).await.unwrap();

        let replaced = store
            .replace_credential(Credential {
                identity_id: "u1".to_string(),
                password_hash: "not-a-phc".to_string(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
        assert!(replaced);

        let err = service
            .login(LoginRequest {
                id: "u1".to_string(),
                password: "Abcdef1!".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Hashing(_)));

        // 哈希细节不外泄
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({"message": "Internal server error"}));
    }

    #[tokio::test]
    async fn test_refresh_issues_access_token_only() {
        let (service, _) = service();
        let context = AuthContext {
            subject_id: "u1".to_string(),
            scope: ADMIN_SCOPE.to_string(),
            kind: TokenKind::Refresh,
        };

        let response = service.refresh(&context).unwrap();
        let verified = service.codec().verify(TokenKind::Access, &response.access_token).unwrap();
        assert_eq!(verified.subject_id, "u1");
    }

    #[tokio::test]
    async fn test_change_password() {
        let (service, _) = service();
        service.register(registration()).await.unwrap();

        let err = service
            .change_password(
                "u1",
                ChangePasswordRequest {
                    current_password: "nope".to_string(),
                    new_password: "Newpass1!".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));

        service
            .change_password(
                "u1",
                ChangePasswordRequest {
                    current_password: "Abcdef1!".to_string(),
                    new_password: "Newpass1!".to_string(),
                },
            )
            .await
            .unwrap();

        let login = |password: &str| LoginRequest {
            id: "u1".to_string(),
            password: password.to_string(),
        };
        assert!(service.login(login("Abcdef1!")).await.is_err());
        assert!(service.login(login("Newpass1!")).await.is_ok());
    }
}
