//! 令牌认证中间件
//! 从约定的载体读取令牌，校验后把身份附加到请求扩展

use crate::{
    auth::{
        cookie::{get_cookie, ACCESS_COOKIE_NAME, REFRESH_COOKIE_NAME},
        token::{TokenCodec, TokenKind},
    },
    error::AppError,
};
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// 刷新令牌的备用请求头
pub const REFRESH_TOKEN_HEADER: &str = "x-refresh-token";

/// 令牌载体
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Carrier {
    /// 指定名称的 cookie
    Cookie(&'static str),
    /// 指定名称的请求头，值即令牌
    Header(&'static str),
    /// `Authorization: Bearer <token>`
    Bearer,
}

impl Carrier {
    /// 从请求头中读取令牌
    pub fn extract(&self, headers: &HeaderMap) -> Option<String> {
        match self {
            Carrier::Cookie(name) => get_cookie(headers, name),
            Carrier::Header(name) => headers
                .get(*name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            Carrier::Bearer => headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }
}

/// 认证上下文（附加到请求扩展）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub subject_id: String,
    pub scope: String,
    pub kind: TokenKind,
}

impl AuthContext {
    /// 作用域是否在期望集合内
    pub fn has_scope(&self, expected: &[&str]) -> bool {
        expected.iter().any(|scope| *scope == self.scope)
    }

    /// 作用域不匹配时返回 Forbidden
    pub fn require_scope(&self, expected: &[&str]) -> Result<(), AppError> {
        if self.has_scope(expected) {
            Ok(())
        } else {
            tracing::warn!(
                subject_id = %self.subject_id,
                scope = %self.scope,
                ?expected,
                "Scope check failed"
            );
            Err(AppError::Forbidden)
        }
    }
}

// 实现 FromRequestParts 以便在 handler 中直接提取 AuthContext
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// 某一类令牌的认证守卫
pub struct AuthGuard {
    codec: Arc<TokenCodec>,
    kind: TokenKind,
    carriers: Vec<Carrier>,
}

impl AuthGuard {
    pub fn new(codec: Arc<TokenCodec>, kind: TokenKind, carriers: Vec<Carrier>) -> Self {
        Self {
            codec,
            kind,
            carriers,
        }
    }

    /// 访问令牌：`accessToken` cookie，其次 Bearer 头
    pub fn access(codec: Arc<TokenCodec>) -> Self {
        Self::new(
            codec,
            TokenKind::Access,
            vec![Carrier::Cookie(ACCESS_COOKIE_NAME), Carrier::Bearer],
        )
    }

    /// 刷新令牌：`refreshToken` cookie，其次 `x-refresh-token` 头
    pub fn refresh(codec: Arc<TokenCodec>) -> Self {
        Self::new(
            codec,
            TokenKind::Refresh,
            vec![Carrier::Cookie(REFRESH_COOKIE_NAME), Carrier::Header(REFRESH_TOKEN_HEADER)],
        )
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    /// 按载体顺序列出所有出现的令牌
    pub fn extract_tokens(&self, headers: &HeaderMap) -> Vec<String> {
        self.carriers
            .iter()
            .filter_map(|carrier| carrier.extract(headers))
            .collect()
    }

    /// 按载体顺序校验，第一个通过的令牌生效；
    /// 过期的 cookie 不会遮住后面有效的头部令牌。任何令牌错误都归为 Unauthorized
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<AuthContext, AppError> {
        let tokens = self.extract_tokens(headers);
        if tokens.is_empty() {
            tracing::info!(kind = %self.kind, "No token presented");
            return Err(AppError::Unauthorized);
        }

        let mut verified = None;
        for token in &tokens {
            match self.codec.verify(self.kind, token) {
                Ok(v) => {
                    verified = Some(v);
                    break;
                }
                Err(e) => tracing::info!(kind = %self.kind, reason = %e, "Token rejected"),
            }
        }
        let verified = verified.ok_or(AppError::Unauthorized)?;

        tracing::debug!(kind = %self.kind, subject_id = %verified.subject_id, "Token accepted");

        Ok(AuthContext {
            subject_id: verified.subject_id,
            scope: verified.scope,
            kind: self.kind,
        })
    }
}

/// 令牌认证中间件 - 必须认证
pub async fn auth_middleware(
    State(guard): State<Arc<AuthGuard>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_context = guard.authenticate(req.headers())?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}

/// 路由声明的作用域要求
#[derive(Debug, Clone, Copy)]
pub struct RequiredScope(pub &'static [&'static str]);

/// 作用域中间件，必须放在认证中间件之后运行
pub async fn scope_middleware(
    State(required): State<RequiredScope>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_context = req
        .extensions()
        .get::<AuthContext>()
        .ok_or(AppError::Unauthorized)?;

    auth_context.require_scope(required.0)?;

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{auth::token::ADMIN_SCOPE, config::SecurityConfig};
    use chrono::{Duration, Utc};
    use secrecy::Secret;

    fn codec() -> Arc<TokenCodec> {
        Arc::new(TokenCodec::from_config(&SecurityConfig {
            access_token_secret: Secret::new("access_secret_key_32_characters_long!".to_string()),
            refresh_token_secret: Secret::new("refresh_secret_key_32_characters_long".to_string()),
            access_token_ttl_secs: 900,
            refresh_token_ttl_secs: 3600,
            password_work_factor: 1,
            password_memory_kib: 1024,
            cookie_secure: false,
        }))
    }

    #[test]
    fn test_extract_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Bearer test_token_123".parse().unwrap());

        assert_eq!(Carrier::Bearer.extract(&headers), Some("test_token_123".to_string()));
    }

    #[test]
    fn test_extract_token_invalid_format() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "InvalidFormat".parse().unwrap());

        assert_eq!(Carrier::Bearer.extract(&headers), None);
    }

    #[test]
    fn test_cookie_takes_precedence_over_bearer() {
        let codec = codec();
        let guard = AuthGuard::access(codec.clone());
        let from_cookie = codec.issue_access("cookie-user", ADMIN_SCOPE).unwrap();
        let from_header = codec.issue_access("header-user", ADMIN_SCOPE).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("cookie", format!("accessToken={}", from_cookie).parse().unwrap());
        headers.insert("authorization", format!("Bearer {}", from_header).parse().unwrap());

        assert_eq!(guard.extract_tokens(&headers), vec![from_cookie, from_header]);
        assert_eq!(guard.authenticate(&headers).unwrap().subject_id, "cookie-user");
    }

    #[test]
    fn test_stale_cookie_falls_back_to_bearer() {
        let codec = codec();
        let guard = AuthGuard::access(codec.clone());
        let expired = codec
            .issue_at(
                TokenKind::Access,
                "u1",
                ADMIN_SCOPE,
                Some(Duration::minutes(15)),
                Utc::now() - Duration::hours(2),
            )
            .unwrap();
        let fresh = codec.issue_access("u1", ADMIN_SCOPE).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("cookie", format!("accessToken={}", expired).parse().unwrap());
        headers.insert("authorization", format!("Bearer {}", fresh).parse().unwrap());

        let context = guard.authenticate(&headers).unwrap();
        assert_eq!(context.subject_id, "u1");

        // 只有过期 cookie 时仍然拒绝
        headers.remove("authorization");
        assert!(matches!(guard.authenticate(&headers), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_authenticate_resolves_identity() {
        let codec = codec();
        let guard = AuthGuard::access(codec.clone());
        let token = codec.issue_access("u1", ADMIN_SCOPE).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert("authorization", format!("Bearer {}", token).parse().unwrap());

        let context = guard.authenticate(&headers).unwrap();
        assert_eq!(context.subject_id, "u1");
        assert_eq!(context.scope, "admin");
        assert_eq!(context.kind, TokenKind::Access);
    }

    #[test]
    fn test_refresh_guard_rejects_access_token() {
        let codec = codec();
        let guard = AuthGuard::refresh(codec.clone());
        let token = codec.issue_access("u1", ADMIN_SCOPE).unwrap();

        let mut headers = HeaderMap::new();
        headers.insert(REFRESH_TOKEN_HEADER, token.parse().unwrap());

        assert!(matches!(guard.authenticate(&headers), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_missing_token_is_unauthorized() {
        let guard = AuthGuard::access(codec());
        assert!(matches!(guard.authenticate(&HeaderMap::new()), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_scope_check() {
        let context = AuthContext {
            subject_id: "u1".to_string(),
            scope: "viewer".to_string(),
            kind: TokenKind::Access,
        };

        assert!(!context.has_scope(&[ADMIN_SCOPE]));
        assert!(matches!(context.require_scope(&[ADMIN_SCOPE]), Err(AppError::Forbidden)));
        assert!(context.require_scope(&["viewer", ADMIN_SCOPE]).is_ok());
    }
}
