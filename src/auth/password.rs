//! Password hashing and verification using Argon2id

use crate::config::{SecurityConfig, WORK_FACTOR_RANGE};
use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString,
    },
    Algorithm, Argon2, Params, Version,
};
use thiserror::Error;

/// Hashing failures. A password mismatch is not an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HashingError {
    #[error("work factor {0} is outside the accepted range")]
    InvalidWorkFactor(u32),

    #[error("invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("malformed password hash: {0}")]
    MalformedHash(String),

    #[error("password hashing failed: {0}")]
    Failure(String),
}

/// Password hasher with configurable parameters
///
/// The work factor is the Argon2 iteration count. Produced hashes are PHC
/// strings, so verification reads its parameters from the stored hash and
/// keeps working after the configured work factor changes.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    work_factor: u32,
}

impl PasswordHasher {
    /// Create a hasher for the given work factor and memory cost.
    pub fn new(work_factor: u32, memory_kib: u32) -> Result<Self, HashingError> {
        if !WORK_FACTOR_RANGE.contains(&work_factor) {
            return Err(HashingError::InvalidWorkFactor(work_factor));
        }

        let params = Params::new(memory_kib, work_factor, 1, None)
            .map_err(|e| HashingError::InvalidParams(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            work_factor,
        })
    }

    /// Create a hasher from the security section of the config
    pub fn from_config(config: &SecurityConfig) -> Result<Self, HashingError> {
        Self::new(config.password_work_factor, config.password_memory_kib)
    }

    pub fn work_factor(&self) -> u32 {
        self.work_factor
    }

    /// Hash a password
    pub fn hash(&self, password: &str) -> Result<String, HashingError> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!("Failed to hash password: {:?}", e);
                HashingError::Failure(e.to_string())
            })?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a password against a hash
    ///
    /// Returns `Ok(false)` on mismatch and only errors when the stored hash
    /// cannot be parsed.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, HashingError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            tracing::debug!("Failed to parse password hash: {:?}", e);
            HashingError::MalformedHash(e.to_string())
        })?;

        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(HashingError::MalformedHash(e.to_string())),
        }
    }

    /// Hash on the blocking pool so the async workers keep serving requests
    pub async fn hash_blocking(&self, password: String) -> Result<String, HashingError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| HashingError::Failure(e.to_string()))?
    }

    /// Verify on the blocking pool
    pub async fn verify_blocking(
        &self,
        password: String,
        hash: String,
    ) -> Result<bool, HashingError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| HashingError::Failure(e.to_string()))?
    }
}
