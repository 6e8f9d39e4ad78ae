//! HTTP 处理器

pub mod assessment;
pub mod auth;
pub mod health;
pub mod subject;
pub mod training;
pub mod user;
