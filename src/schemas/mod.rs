//! 各路由的请求 schema
//!
//! 所有字段规则注册在同一个 [`RuleRegistry`] 中，跨记录类型复用时按名称引用
//! （例如考核引用账户 id 与培训 id 的规则），不做复制。

mod assessment;
mod common;
mod identity;
mod subject;
mod training;

pub use identity::is_complex_password;

use crate::validation::{RuleRegistry, RuleSet, Schema, SchemaError};

/// 启动时编译好的全部 schema，只读共享
#[derive(Debug, Clone)]
pub struct Schemas {
    pub list_window: Schema,
    pub record_id: Schema,

    pub register: Schema,
    pub login: Schema,
    pub update_profile: Schema,
    pub change_password: Schema,

    pub create_subject: Schema,
    pub update_subject: Schema,

    pub create_training: Schema,
    pub update_training: Schema,
    pub training_filter: Schema,

    pub create_assessment: Schema,
    pub update_assessment: Schema,
    pub assessment_key: Schema,
    pub assessment_filter: Schema,
}

impl Schemas {
    /// 注册共享规则并编译所有规则集
    pub fn compile() -> Result<Self, SchemaError> {
        let registry = registry()?;
        let compile = |set: &RuleSet| Schema::compile(&registry, set);

        let schemas = Self {
            list_window: compile(&common::LIST_WINDOW)?,
            record_id: compile(&common::RECORD_ID)?,

            register: compile(&identity::REGISTER)?,
            login: compile(&identity::LOGIN)?,
            update_profile: compile(&identity::UPDATE_PROFILE)?,
            change_password: compile(&identity::CHANGE_PASSWORD)?,

            create_subject: compile(&subject::CREATE)?,
            update_subject: compile(&subject::UPDATE)?,

            create_training: compile(&training::CREATE)?,
            update_training: compile(&training::UPDATE)?,
            training_filter: compile(&training::FILTER)?,

            create_assessment: compile(&assessment::CREATE)?,
            update_assessment: compile(&assessment::UPDATE)?,
            assessment_key: compile(&assessment::KEY)?,
            assessment_filter: compile(&assessment::FILTER)?,
        };

        tracing::debug!(rules = registry.len(), "Request schemas compiled");
        Ok(schemas)
    }
}

/// 共享规则表
pub fn registry() -> Result<RuleRegistry, SchemaError> {
    let mut registry = RuleRegistry::new();
    common::define(&mut registry)?;
    identity::define(&mut registry)?;
    subject::define(&mut registry)?;
    training::define(&mut registry)?;
    assessment::define(&mut registry)?;
    Ok(registry)
}
