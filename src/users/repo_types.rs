use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Provider recorded for accounts registered with email + password.
pub const CREDENTIALS_PROVIDER: &str = "credentials";

/// Access level of an account. New accounts always start as `User`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// User record in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                   // primary key, also seeds the username
    pub username: String,           // "user-" + first 8 chars of id
    pub name: String,               // display name
    pub email: String,              // unique
    pub role: Role,
    pub provider: String,           // "credentials" or an OAuth provider name
    #[serde(skip_serializing)]
    pub password: Option<String>,   // bcrypt hash, None for OAuth accounts
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Row to insert; timestamps are filled in by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub provider: String,
    pub password: Option<String>,
}

impl User {
    /// Username derived from the leading characters of the generated id.
    pub fn username_for(id: Uuid) -> String {
        let hyphenated = id.hyphenated().to_string();
        format!("user-{}", &hyphenated[..8])
    }
}
