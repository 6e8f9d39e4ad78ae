use super::Schemas;
use crate::{
    models::subject::{CreateSubjectRequest, UpdateSubjectRequest},
    validation::{
        CrossCheck, FieldDecl, FieldRule, RequestSchema, RuleRegistry, RuleSet, Schema, SchemaError,
    },
};

const MARKS_ORDER: &[CrossCheck] = &[CrossCheck::NotLess {
    field: "maxMarks",
    than: "minMarks",
    message: "maximum marks cannot be less than minimum marks",
}];

pub(super) static CREATE: RuleSet = RuleSet::open(
    "create_subject",
    &[
        FieldDecl::new("id", "subject.id"),
        FieldDecl::new("name", "subject.name"),
        FieldDecl::new("minMarks", "subject.min_marks"),
        FieldDecl::new("maxMarks", "subject.max_marks"),
        FieldDecl::new("totalTime", "subject.total_time"),
    ],
)
.with_checks(MARKS_ORDER);

pub(super) static UPDATE: RuleSet = RuleSet::open(
    "update_subject",
    &[
        FieldDecl::new("name", "subject.name"),
        FieldDecl::new("minMarks", "subject.min_marks"),
        FieldDecl::new("maxMarks", "subject.max_marks"),
        FieldDecl::new("totalTime", "subject.total_time"),
    ],
)
.with_checks(MARKS_ORDER);

pub(super) fn define(registry: &mut RuleRegistry) -> Result<(), SchemaError> {
    registry.define(
        "subject.id",
        FieldRule::string()
            .trim()
            .lowercase()
            .min_length(1, "id cannot be empty")
            .build(),
    )?;
    registry.define(
        "subject.name",
        FieldRule::string()
            .trim()
            .min_length(1, "name cannot be empty")
            .build(),
    )?;
    registry.define(
        "subject.min_marks",
        FieldRule::number()
            .min(0.0, "minimum marks cannot be less than 0")
            .build(),
    )?;
    registry.define(
        "subject.max_marks",
        FieldRule::number()
            .min(0.0, "maximum marks cannot be less than 0")
            .build(),
    )?;
    registry.define(
        "subject.total_time",
        FieldRule::integer()
            .min(0.0, "total time cannot be less than 0")
            .build(),
    )?;
    Ok(())
}

impl RequestSchema for CreateSubjectRequest {
    fn schema(schemas: &Schemas) -> &Schema {
        &schemas.create_subject
    }
}

impl RequestSchema for UpdateSubjectRequest {
    fn schema(schemas: &Schemas) -> &Schema {
        &schemas.update_subject
    }
}
