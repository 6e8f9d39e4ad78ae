use super::Schemas;
use crate::{
    models::training::{CreateTrainingRequest, TrainingFilter, UpdateTrainingRequest},
    validation::{
        CrossCheck, FieldDecl, FieldRule, RequestSchema, RuleRegistry, RuleSet, Schema, SchemaError,
    },
};

const SCHEDULE_ORDER: &[CrossCheck] = &[CrossCheck::NotLess {
    field: "endedAt",
    than: "startedAt",
    message: "end time cannot be before start time",
}];

pub(super) static CREATE: RuleSet = RuleSet::open(
    "create_training",
    &[
        FieldDecl::new("id", "training.id"),
        FieldDecl::new("name", "training.name"),
        FieldDecl::new("mode", "training.mode"),
        FieldDecl::new("subject", "subject.id"),
        FieldDecl::new("startedAt", "training.started_at"),
        FieldDecl::new("endedAt", "training.ended_at"),
    ],
)
.with_checks(SCHEDULE_ORDER);

pub(super) static UPDATE: RuleSet = RuleSet::open(
    "update_training",
    &[
        FieldDecl::new("name", "training.name"),
        FieldDecl::new("mode", "training.mode"),
        FieldDecl::new("subject", "subject.id"),
        FieldDecl::new("startedAt", "training.started_at"),
        FieldDecl::new("endedAt", "training.ended_at"),
    ],
)
.with_checks(SCHEDULE_ORDER);

pub(super) static FILTER: RuleSet = RuleSet::open(
    "training_filter",
    &[
        FieldDecl::optional("subject", "subject.id"),
        FieldDecl::new("from", "list.from"),
        FieldDecl::new("count", "list.count"),
    ],
);

pub(super) fn define(registry: &mut RuleRegistry) -> Result<(), SchemaError> {
    registry.define(
        "training.id",
        FieldRule::string()
            .trim()
            .lowercase()
            .min_length(1, "id cannot be empty")
            .build(),
    )?;
    registry.define(
        "training.name",
        FieldRule::string()
            .trim()
            .min_length(1, "name cannot be empty")
            .build(),
    )?;
    registry.define(
        "training.mode",
        FieldRule::one_of(&["online", "offline", "onsite"])
            .trim()
            .lowercase()
            .build(),
    )?;
    registry.define(
        "training.started_at",
        FieldRule::date()
            .not_before_now("time should be greater than now")
            .build(),
    )?;
    registry.define(
        "training.ended_at",
        FieldRule::date()
            .not_before_now("time should be greater than now")
            .default_from("startedAt")
            .build(),
    )?;
    Ok(())
}

impl RequestSchema for CreateTrainingRequest {
    fn schema(schemas: &Schemas) -> &Schema {
        &schemas.create_training
    }
}

impl RequestSchema for UpdateTrainingRequest {
    fn schema(schemas: &Schemas) -> &Schema {
        &schemas.update_training
    }
}

impl RequestSchema for TrainingFilter {
    fn schema(schemas: &Schemas) -> &Schema {
        &schemas.training_filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::{validate, Channel};
    use chrono::{Duration, Utc};
    use serde_json::json;

    #[test]
    fn test_ended_at_defaults_to_started_at() {
        let schemas = Schemas::compile().unwrap();
        let start = (Utc::now() + Duration::days(3)).to_rfc3339();
        let out = validate(
            &schemas.create_training,
            Channel::Body,
            &json!({"id": "T1", "name": "Rust", "mode": "Online", "subject": "math", "startedAt": start}),
        )
        .unwrap();

        assert_eq!(out["id"], "t1");
        assert_eq!(out["mode"], "online");
        assert_eq!(out["endedAt"], out["startedAt"]);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let schemas = Schemas::compile().unwrap();
        let start = (Utc::now() + Duration::days(3)).to_rfc3339();
        let err = validate(
            &schemas.update_training,
            Channel::Body,
            &json!({"name": "Rust", "mode": "hybrid", "subject": "math", "startedAt": start}),
        )
        .unwrap_err();
        assert_eq!(err.field_errors[0].path, vec!["mode".to_string()]);
    }

    #[test]
    fn test_filter_subject_is_optional() {
        let schemas = Schemas::compile().unwrap();
        let out = validate(&schemas.training_filter, Channel::Query, &json!({"subject": "MATH"}))
            .unwrap();
        assert_eq!(out["subject"], "math");

        let out = validate(&schemas.training_filter, Channel::Query, &json!({})).unwrap();
        assert!(!out.contains_key("subject"));
    }
}
