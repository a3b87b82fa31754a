use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::AccountError;
use crate::users::repo_types::{NewUser, User};
use crate::users::store::UserStore;

/// In-process user store with the same uniqueness rules as the `users` table.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Name of the unique constraint another row already holds, if any.
fn taken(users: &HashMap<Uuid, User>, skip: Uuid, email: &str, username: &str) -> Option<&'static str> {
    users.values().filter(|u| u.id != skip).find_map(|u| {
        if u.email == email {
            Some("users_email_key")
        } else if u.username == username {
            Some("users_username_key")
        } else {
            None
        }
    })
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_many(&self) -> Result<Vec<User>, AccountError> {
        let mut users: Vec<User> = self.users.lock().await.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError> {
        let users = self.users.lock().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AccountError> {
        Ok(self.users.lock().await.get(&id).cloned())
    }

    async fn count_by_email(&self, email: &str) -> Result<i64, AccountError> {
        let users = self.users.lock().await;
        Ok(users.values().filter(|u| u.email == email).count() as i64)
    }

    async fn count_by_id(&self, id: Uuid) -> Result<i64, AccountError> {
        Ok(i64::from(self.users.lock().await.contains_key(&id)))
    }

    async fn create(&self, new: NewUser) -> Result<User, AccountError> {
        let mut users = self.users.lock().await;
        if users.contains_key(&new.id) {
            return Err(AccountError::unique_violation("users_pkey"));
        }
        if let Some(constraint) = taken(&users, new.id, &new.email, &new.username) {
            return Err(AccountError::unique_violation(constraint));
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: new.id,
            username: new.username,
            name: new.name,
            email: new.email,
            role: new.role,
            provider: new.provider,
            password: new.password,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, AccountError> {
        let mut users = self.users.lock().await;
        if !users.contains_key(&user.id) {
            return Err(AccountError::NotFound(user.id.to_string()));
        }
        if let Some(constraint) = taken(&users, user.id, &user.email, &user.username) {
            return Err(AccountError::unique_violation(constraint));
        }
        let stored = users
            .get_mut(&user.id)
            .ok_or_else(|| AccountError::NotFound(user.id.to_string()))?;
        *stored = User {
            created_at: stored.created_at,
            updated_at: OffsetDateTime::now_utc(),
            ..user.clone()
        };
        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<User, AccountError> {
        self.users
            .lock()
            .await
            .remove(&id)
            .ok_or_else(|| AccountError::NotFound(id.to_string()))
    }
}
