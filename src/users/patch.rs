use crate::users::repo_types::{Role, User};

/// Partial update of a stored user. `None` means "keep what is stored".
///
/// `password` carries an already hashed value; plaintext never reaches a patch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub provider: Option<String>,
    pub password_hash: Option<String>,
}

impl UserPatch {
    /// Fallback-merge: every field set in the patch wins, every other field
    /// is taken from `existing`. Identity and timestamps are never patched.
    pub fn apply(self, existing: &User) -> User {
        User {
            id: existing.id,
            username: self.username.unwrap_or_else(|| existing.username.clone()),
            name: self.name.unwrap_or_else(|| existing.name.clone()),
            email: self.email.unwrap_or_else(|| existing.email.clone()),
            role: self.role.unwrap_or(existing.role),
            provider: self.provider.unwrap_or_else(|| existing.provider.clone()),
            password: self.password_hash.or_else(|| existing.password.clone()),
            created_at: existing.created_at,
            updated_at: existing.updated_at,
        }
    }
}
