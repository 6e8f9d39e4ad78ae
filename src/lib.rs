//! 员工培训统计服务库
//! 提供认证、请求校验和记录管理

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod routes;
pub mod schemas;
pub mod services;
pub mod telemetry;
pub mod validation;
