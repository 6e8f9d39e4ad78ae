//! 声明式请求校验
//!
//! 规则在启动时注册到 [`RuleRegistry`]，规则集编译为 [`Schema`]，
//! 每个请求在进入 handler 之前由 [`validate`] 按通道（body/path/query）校验。

pub mod engine;
pub mod extract;
pub mod rule;
pub mod schema;

pub use engine::{validate, Channel};
pub use extract::{RequestSchema, ValidJson, ValidPath, ValidQuery};
pub use rule::{FieldRule, FieldType, SharedRule};
pub use schema::{CrossCheck, FieldDecl, RuleRegistry, RuleSet, Schema, SchemaError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 单个字段的校验失败
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub path: Vec<String>,
    pub message: String,
}

impl FieldError {
    pub fn new(path: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

/// 请求校验失败，携带全部字段错误
#[derive(Debug, Clone, Error)]
#[error("request validation failed")]
pub struct ValidationError {
    pub field_errors: Vec<FieldError>,
}

impl ValidationError {
    pub fn new(field_errors: Vec<FieldError>) -> Self {
        Self { field_errors }
    }

    /// 与具体字段无关的错误，例如请求体不是合法 JSON
    pub fn request(message: impl Into<String>) -> Self {
        Self::new(vec![FieldError::new(Vec::new(), message)])
    }
}
