//! Account domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "identity_role", rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }
}

/// Account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Hashed password, one per account
///
/// Never serialized; the hash stays on the server.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct Credential {
    pub identity_id: String,
    pub password_hash: String,
    pub updated_at: DateTime<Utc>,
}

/// Registration request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIdentityRequest {
    pub id: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
}

impl CreateIdentityRequest {
    /// Account record for this request; the password is handled separately
    pub fn to_identity(&self, now: DateTime<Utc>) -> Identity {
        Identity {
            id: self.id.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            middle_name: self.middle_name.clone(),
            last_name: self.last_name.clone(),
            role: self.role,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Profile update; absent fields keep their value
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
}

impl UpdateProfileRequest {
    pub fn apply(self, identity: &mut Identity) {
        if let Some(email) = self.email {
            identity.email = email;
        }
        if let Some(first_name) = self.first_name {
            identity.first_name = first_name;
        }
        if self.middle_name.is_some() {
            identity.middle_name = self.middle_name;
        }
        if self.last_name.is_some() {
            identity.last_name = self.last_name;
        }
    }
}

/// Password change request
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_update_keeps_absent_fields() {
        let now = Utc::now();
        let mut identity = Identity {
            id: "u1".to_string(),
            email: "u1@x.com".to_string(),
            first_name: "A".to_string(),
            middle_name: None,
            last_name: Some("B".to_string()),
            role: Role::Employee,
            created_at: now,
            updated_at: now,
        };

        UpdateProfileRequest {
            email: None,
            first_name: Some("Alice".to_string()),
            middle_name: Some("M".to_string()),
            last_name: None,
        }
        .apply(&mut identity);

        assert_eq!(identity.email, "u1@x.com");
        assert_eq!(identity.first_name, "Alice");
        assert_eq!(identity.middle_name.as_deref(), Some("M"));
        assert_eq!(identity.last_name.as_deref(), Some("B"));
    }

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_value(Role::Employee).unwrap(), "employee");
        let role: Role = serde_json::from_value(serde_json::json!("admin")).unwrap();
        assert_eq!(role, Role::Admin);
    }
}
