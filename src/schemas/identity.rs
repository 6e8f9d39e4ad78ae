use super::Schemas;
use crate::{
    models::{
        auth::LoginRequest,
        identity::{ChangePasswordRequest, CreateIdentityRequest, UpdateProfileRequest},
    },
    validation::{FieldDecl, FieldRule, RequestSchema, RuleRegistry, RuleSet, Schema, SchemaError},
};
use serde_json::json;

const PASSWORD_SPECIAL_CHARS: &str = "#?!@$%^&*-";
const PASSWORD_MIN_LEN: usize = 8;
/// argon2 按输入长度计费，超长密码在哈希前拒绝
const PASSWORD_MAX_LEN: usize = 128;

/// 密码复杂度：至少 8 个字符，包含大写、小写、数字和一个特殊字符
pub fn is_complex_password(password: &str) -> bool {
    password.chars().count() >= PASSWORD_MIN_LEN
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c))
}

const PASSWORD_MESSAGE: &str = "password must be at least 8 characters and contain one lower case \
                                letter, one upper case letter, one number and one special character";

pub(super) static REGISTER: RuleSet = RuleSet::open(
    "register",
    &[
        FieldDecl::new("id", "identity.id"),
        FieldDecl::new("email", "identity.email"),
        FieldDecl::new("password", "identity.password"),
        FieldDecl::new("firstName", "identity.name"),
        FieldDecl::new("middleName", "identity.extra_name"),
        FieldDecl::new("lastName", "identity.extra_name"),
        FieldDecl::new("role", "identity.role"),
    ],
);

pub(super) static LOGIN: RuleSet = RuleSet::open(
    "login",
    &[
        FieldDecl::new("id", "identity.id"),
        FieldDecl::new("password", "login.password"),
    ],
)
.closed();

pub(super) static UPDATE_PROFILE: RuleSet = RuleSet::open(
    "update_profile",
    &[
        FieldDecl::optional("email", "identity.email"),
        FieldDecl::optional("firstName", "identity.name"),
        FieldDecl::new("middleName", "identity.extra_name"),
        FieldDecl::new("lastName", "identity.extra_name"),
    ],
);

pub(super) static CHANGE_PASSWORD: RuleSet = RuleSet::open(
    "change_password",
    &[
        FieldDecl::new("currentPassword", "login.password"),
        FieldDecl::new("newPassword", "identity.password"),
    ],
)
.closed();

pub(super) fn define(registry: &mut RuleRegistry) -> Result<(), SchemaError> {
    registry.define(
        "identity.id",
        FieldRule::string()
            .trim()
            .lowercase()
            .min_length(1, "id cannot be empty")
            .build(),
    )?;
    registry.define(
        "identity.email",
        FieldRule::string()
            .trim()
            .lowercase()
            .email("invalid email format")
            .build(),
    )?;
    registry.define(
        "identity.password",
        FieldRule::string()
            .max_length(PASSWORD_MAX_LEN, "password cannot be longer than 128 characters")
            .predicate(is_complex_password, PASSWORD_MESSAGE)
            .build(),
    )?;
    registry.define(
        "identity.name",
        FieldRule::string()
            .trim()
            .min_length(1, "name cannot be empty")
            .build(),
    )?;
    registry.define("identity.extra_name", FieldRule::string().trim().optional().build())?;
    registry.define(
        "identity.role",
        FieldRule::one_of(&["admin", "employee"])
            .trim()
            .lowercase()
            .default_value(json!("employee"))
            .build(),
    )?;
    registry.define(
        "login.password",
        FieldRule::string()
            .min_length(1, "password cannot be empty")
            .build(),
    )?;
    Ok(())
}

impl RequestSchema for CreateIdentityRequest {
    fn schema(schemas: &Schemas) -> &Schema {
        &schemas.register
    }
}

impl RequestSchema for LoginRequest {
    fn schema(schemas: &Schemas) -> &Schema {
        &schemas.login
    }
}

impl RequestSchema for UpdateProfileRequest {
    fn schema(schemas: &Schemas) -> &Schema {
        &schemas.update_profile
    }
}

impl RequestSchema for ChangePasswordRequest {
    fn schema(schemas: &Schemas) -> &Schema {
        &schemas.change_password
    }
}
