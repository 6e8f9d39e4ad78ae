use super::Schemas;
use crate::{
    models::assessment::{
        AssessmentFilter, AssessmentKey, CreateAssessmentRequest, UpdateAssessmentRequest,
    },
    validation::{FieldDecl, FieldRule, RequestSchema, RuleRegistry, RuleSet, Schema, SchemaError},
};
use serde_json::json;

// 考核引用账户 id 与培训 id 的规则
pub(super) static CREATE: RuleSet = RuleSet::open(
    "create_assessment",
    &[
        FieldDecl::new("userId", "identity.id"),
        FieldDecl::new("trainingId", "training.id"),
        FieldDecl::new("marks", "assessment.marks"),
        FieldDecl::new("internetAllowed", "assessment.internet_allowed"),
    ],
);

pub(super) static UPDATE: RuleSet = RuleSet::open(
    "update_assessment",
    &[
        FieldDecl::new("marks", "assessment.marks"),
        FieldDecl::new("internetAllowed", "assessment.internet_allowed"),
    ],
);

pub(super) static KEY: RuleSet = RuleSet::open(
    "assessment_key",
    &[
        FieldDecl::new("userId", "identity.id"),
        FieldDecl::new("trainingId", "training.id"),
    ],
);

pub(super) static FILTER: RuleSet = RuleSet::open(
    "assessment_filter",
    &[
        FieldDecl::optional("userId", "identity.id"),
        FieldDecl::optional("trainingId", "training.id"),
        FieldDecl::new("from", "list.from"),
        FieldDecl::new("count", "list.count"),
    ],
);

pub(super) fn define(registry: &mut RuleRegistry) -> Result<(), SchemaError> {
    registry.define(
        "assessment.marks",
        FieldRule::number()
            .min(0.0, "minimum marks cannot be less than 0")
            .build(),
    )?;
    registry.define(
        "assessment.internet_allowed",
        FieldRule::boolean().default_value(json!(false)).build(),
    )?;
    Ok(())
}

impl RequestSchema for CreateAssessmentRequest {
    fn schema(schemas: &Schemas) -> &Schema {
        &schemas.create_assessment
    }
}

impl RequestSchema for UpdateAssessmentRequest {
    fn schema(schemas: &Schemas) -> &Schema {
        &schemas.update_assessment
    }
}

impl RequestSchema for AssessmentKey {
    fn schema(schemas: &Schemas) -> &Schema {
        &schemas.assessment_key
    }
}

impl RequestSchema for AssessmentFilter {
    fn schema(schemas: &Schemas) -> &Schema {
        &schemas.assessment_filter
    }
}
