//! 数据模型模块
//! 四类记录（账户、科目、培训、考核）及其请求/响应结构

pub mod assessment;
pub mod auth;
pub mod common;
pub mod identity;
pub mod subject;
pub mod training;
