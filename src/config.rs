//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

/// 签名密钥的最小长度（HS256）
pub const MIN_SECRET_LEN: usize = 32;

/// 密码哈希工作因子的允许范围（Argon2 迭代次数）
pub const WORK_FACTOR_RANGE: std::ops::RangeInclusive<u32> = 1..=10;

/// 访问令牌过期时间的允许范围（秒）
pub const ACCESS_TTL_RANGE: std::ops::RangeInclusive<u64> = 60..=86_400;

/// 刷新令牌过期时间的允许范围（秒），另外 0 表示不过期
pub const REFRESH_TTL_RANGE: std::ops::RangeInclusive<u64> = 60..=31_536_000;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:3000"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
    /// 请求体大小上限（字节）
    pub body_limit_bytes: usize,
}

/// 数据存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库连接 URL（仅 postgres 后端需要）
    pub url: Option<Secret<String>>,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// 访问令牌签名密钥
    pub access_token_secret: Secret<String>,
    /// 刷新令牌签名密钥，必须与访问令牌密钥不同
    pub refresh_token_secret: Secret<String>,
    /// 访问令牌过期时间（秒）
    pub access_token_ttl_secs: u64,
    /// 刷新令牌过期时间（秒），0 表示不过期
    pub refresh_token_ttl_secs: u64,
    /// 密码哈希工作因子
    pub password_work_factor: u32,
    /// 密码哈希内存开销（KiB）
    pub password_memory_kib: u32,
    /// 令牌 cookie 是否带 Secure 标记
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    ///
    /// 令牌密钥、访问令牌过期时间和密码工作因子没有默认值，
    /// 缺失任意一项都会导致加载失败。
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        settings = settings
            .set_default("server.addr", "0.0.0.0:3000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("server.body_limit_bytes", 1024 * 1024)?
            .set_default("store.backend", "memory")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("database.max_lifetime_secs", 1800)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.refresh_token_ttl_secs", 604800)?
            .set_default("security.password_memory_kib", 19456)?
            .set_default("security.cookie_secure", false)?;

        // 前缀为 EMPSTAT_，嵌套分隔符为 __
        settings = settings.add_source(
            Environment::with_prefix("EMPSTAT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(port_str) = self.server.addr.split(':').next_back() {
            if let Ok(port) = port_str.parse::<u16>() {
                if port != 0 && port < 1024 {
                    return Err(ConfigError::Message("Server port should be >= 1024".to_string()));
                }
            }
        }

        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        if self.store.backend == StoreBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::Message(
                "database.url is required for the postgres store backend".to_string(),
            ));
        }

        if self.database.max_connections < self.database.min_connections {
            return Err(ConfigError::Message(
                "max_connections must be >= min_connections".to_string(),
            ));
        }

        let access = self.security.access_token_secret.expose_secret();
        let refresh = self.security.refresh_token_secret.expose_secret();

        if access.len() < MIN_SECRET_LEN || refresh.len() < MIN_SECRET_LEN {
            return Err(ConfigError::Message(format!(
                "Token secrets must be at least {} characters long",
                MIN_SECRET_LEN
            )));
        }

        if access == refresh {
            return Err(ConfigError::Message(
                "access_token_secret and refresh_token_secret must differ".to_string(),
            ));
        }

        if !ACCESS_TTL_RANGE.contains(&self.security.access_token_ttl_secs) {
            return Err(ConfigError::Message(format!(
                "access_token_ttl_secs must be between {} and {} (1 minute to 24 hours)",
                ACCESS_TTL_RANGE.start(),
                ACCESS_TTL_RANGE.end()
            )));
        }

        let refresh_ttl = self.security.refresh_token_ttl_secs;
        if refresh_ttl != 0 && !REFRESH_TTL_RANGE.contains(&refresh_ttl) {
            return Err(ConfigError::Message(format!(
                "refresh_token_ttl_secs must be 0 (no expiry) or between {} and {} (1 minute to 1 year)",
                REFRESH_TTL_RANGE.start(),
                REFRESH_TTL_RANGE.end()
            )));
        }

        if !WORK_FACTOR_RANGE.contains(&self.security.password_work_factor) {
            return Err(ConfigError::Message(format!(
                "password_work_factor must be between {} and {}",
                WORK_FACTOR_RANGE.start(),
                WORK_FACTOR_RANGE.end()
            )));
        }

        Ok(())
    }
}
