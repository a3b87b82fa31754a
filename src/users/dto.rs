use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::repo_types::{Role, User};

/// Request body for user registration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

/// Request body for a profile update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub provider: Option<String>,
    pub password: Option<String>,
}

/// Body of the public profile-update route. Role and password are not
/// accepted here; unknown keys are rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdateRequest {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub provider: Option<String>,
}

impl From<ProfileUpdateRequest> for UpdateUserRequest {
    fn from(p: ProfileUpdateRequest) -> Self {
        Self {
            name: p.name,
            username: p.username,
            email: p.email,
            provider: p.provider,
            ..Default::default()
        }
    }
}

/// Request body for credential sign-in.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for the update-password form.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub password: String,
    pub new_password: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub provider: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            name: u.name,
            email: u.email,
            role: u.role,
            provider: u.provider,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}
