use crate::{
    models::common::{ListWindow, RecordId},
    validation::{FieldDecl, FieldRule, RequestSchema, RuleRegistry, RuleSet, Schema, SchemaError},
};
use serde_json::json;

/// 列表默认条数
pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 100;

pub(super) static LIST_WINDOW: RuleSet = RuleSet::open(
    "list_window",
    &[FieldDecl::new("from", "list.from"), FieldDecl::new("count", "list.count")],
);

pub(super) static RECORD_ID: RuleSet = RuleSet::open("record_id", &[FieldDecl::new("id", "record.id")]);

pub(super) fn define(registry: &mut RuleRegistry) -> Result<(), SchemaError> {
    registry.define(
        "list.from",
        FieldRule::integer()
            .optional()
            .min(0.0, "from cannot be less than 0")
            .build(),
    )?;
    registry.define(
        "list.count",
        FieldRule::integer()
            .default_value(json!(DEFAULT_PAGE_SIZE))
            .min(1.0, "count cannot be less than 1")
            .max(MAX_PAGE_SIZE as f64, "count cannot be greater than 100")
            .build(),
    )?;
    registry.define(
        "record.id",
        FieldRule::string()
            .trim()
            .lowercase()
            .min_length(1, "id cannot be empty")
            .build(),
    )?;
    Ok(())
}

impl RequestSchema for ListWindow {
    fn schema(schemas: &super::Schemas) -> &Schema {
        &schemas.list_window
    }
}

impl RequestSchema for RecordId {
    fn schema(schemas: &super::Schemas) -> &Schema {
        &schemas.record_id
    }
}
