use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AccountError;
use crate::users::repo_types::{NewUser, User};

/// Data-access handle for persisted users.
///
/// Lookups report a miss as `Ok(None)`; `update` and `delete` report it as
/// `AccountError::NotFound`. Unique violations surface as `AccountError::Conflict`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_many(&self) -> Result<Vec<User>, AccountError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AccountError>;

    async fn count_by_email(&self, email: &str) -> Result<i64, AccountError>;

    async fn count_by_id(&self, id: Uuid) -> Result<i64, AccountError>;

    async fn create(&self, user: NewUser) -> Result<User, AccountError>;

    /// Overwrites every mutable column of the row identified by `user.id`.
    async fn update(&self, user: &User) -> Result<User, AccountError>;

    async fn delete(&self, id: Uuid) -> Result<User, AccountError>;
}
