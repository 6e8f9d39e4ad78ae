//! Signed session tokens
//! Access and refresh tokens are HS256 JWTs signed with independent secrets

use crate::config::{SecurityConfig, ACCESS_TTL_RANGE, REFRESH_TTL_RANGE};
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// The single scope handed out by the session flow
pub const ADMIN_SCOPE: &str = "admin";

/// Token class; each kind is bound to its own secret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Access => write!(f, "access"),
            TokenKind::Refresh => write!(f, "refresh"),
        }
    }
}

/// Why a token was rejected, or why it could not be issued
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("token signature mismatch")]
    SignatureMismatch,

    #[error("token expired")]
    Expired,

    #[error("failed to sign token: {0}")]
    Signing(String),
}

/// Wire payload: `{sub, scope, iat, exp?}`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (identity id)
    pub sub: String,

    pub scope: String,

    /// Issued at, seconds since the epoch
    pub iat: i64,

    /// Expiration, seconds since the epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
}

/// Result of a successful verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub subject_id: String,
    pub scope: String,
    pub issued_at: DateTime<Utc>,
    pub expiry: Option<DateTime<Utc>>,
}

impl TryFrom<Claims> for VerifiedToken {
    type Error = TokenError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let issued_at = Utc
            .timestamp_opt(claims.iat, 0)
            .single()
            .ok_or(TokenError::Malformed)?;
        let expiry = claims
            .exp
            .map(|exp| Utc.timestamp_opt(exp, 0).single().ok_or(TokenError::Malformed))
            .transpose()?;

        Ok(Self {
            subject_id: claims.sub,
            scope: claims.scope,
            issued_at,
            expiry,
        })
    }
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

// Values above `max_secs` are clamped; config validation rejects them before this point
fn ttl_from_secs(secs: u64, max_secs: u64) -> Duration {
    i64::try_from(secs.min(max_secs))
        .ok()
        .and_then(Duration::try_seconds)
        .unwrap_or(Duration::zero())
}

/// Issues and verifies access/refresh tokens
///
/// Keys are derived once from the immutable security config and shared
/// read-only across requests.
pub struct TokenCodec {
    access: KeyPair,
    refresh: KeyPair,
    access_ttl: Duration,
    refresh_ttl: Option<Duration>,
}

impl TokenCodec {
    /// Build the codec from the security config
    pub fn from_config(config: &SecurityConfig) -> Self {
        let refresh_ttl = match config.refresh_token_ttl_secs {
            0 => None,
            secs => Some(ttl_from_secs(secs, *REFRESH_TTL_RANGE.end())),
        };

        Self {
            access: KeyPair::from_secret(config.access_token_secret.expose_secret()),
            refresh: KeyPair::from_secret(config.refresh_token_secret.expose_secret()),
            access_ttl: ttl_from_secs(config.access_token_ttl_secs, *ACCESS_TTL_RANGE.end()),
            refresh_ttl,
        }
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    /// Configured lifetime of an access token, in seconds
    pub fn access_ttl_secs(&self) -> u64 {
        self.access_ttl.num_seconds().max(0) as u64
    }

    /// Configured lifetime of a refresh token, `None` when refresh tokens do not expire
    pub fn refresh_ttl_secs(&self) -> Option<u64> {
        self.refresh_ttl.map(|ttl| ttl.num_seconds().max(0) as u64)
    }

    /// Sign a token of `kind` issued now
    pub fn issue(
        &self,
        kind: TokenKind,
        subject_id: &str,
        scope: &str,
        ttl: Option<Duration>,
    ) -> Result<String, TokenError> {
        self.issue_at(kind, subject_id, scope, ttl, Utc::now())
    }

    /// Sign a token of `kind` as if issued at `issued_at`
    pub fn issue_at(
        &self,
        kind: TokenKind,
        subject_id: &str,
        scope: &str,
        ttl: Option<Duration>,
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let exp = match ttl {
            Some(ttl) => Some(
                issued_at
                    .checked_add_signed(ttl)
                    .ok_or_else(|| {
                        tracing::error!(%kind, ttl_secs = ttl.num_seconds(), "Token expiry out of range");
                        TokenError::Signing("token expiry out of range".to_string())
                    })?
                    .timestamp(),
            ),
            None => None,
        };

        let claims = Claims {
            sub: subject_id.to_string(),
            scope: scope.to_string(),
            iat: issued_at.timestamp(),
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.keys(kind).encoding).map_err(|e| {
            tracing::error!(%kind, "Failed to encode token: {:?}", e);
            TokenError::Signing(e.to_string())
        })
    }

    /// Access token with the configured TTL
    pub fn issue_access(&self, subject_id: &str, scope: &str) -> Result<String, TokenError> {
        self.issue(TokenKind::Access, subject_id, scope, Some(self.access_ttl))
    }

    /// Refresh token with the configured TTL, if any
    pub fn issue_refresh(&self, subject_id: &str, scope: &str) -> Result<String, TokenError> {
        self.issue(TokenKind::Refresh, subject_id, scope, self.refresh_ttl)
    }

    /// Verify a token against the secret of `kind`
    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<VerifiedToken, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        // exp is optional on the wire; when present it is still enforced
        validation.set_required_spec_claims::<&str>(&[]);

        let data = decode::<Claims>(token, &self.keys(kind).decoding, &validation).map_err(|e| {
            tracing::debug!(%kind, "Token validation failed: {:?}", e);
            match e.kind() {
                ErrorKind::InvalidSignature => TokenError::SignatureMismatch,
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Malformed,
            }
        })?;

        VerifiedToken::try_from(data.claims)
    }
}
