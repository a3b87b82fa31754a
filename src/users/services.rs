use std::sync::Arc;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::error::AccountError;
use crate::users::{
    dto::{RegisterRequest, UpdateUserRequest},
    password::{hash_password, verify_password},
    patch::UserPatch,
    repo_types::{NewUser, Role, User, CREDENTIALS_PROVIDER},
    store::UserStore,
};

/// Account lifecycle on top of an injected [`UserStore`].
///
/// Hashing happens here, so a store only ever sees bcrypt hashes. Every call
/// is a single round trip to the store; there is no locking across calls.
#[derive(Clone)]
pub struct AccountStore {
    store: Arc<dyn UserStore>,
    hash_cost: u32,
}

/// Empty strings count as "no password", same as an absent field.
fn supplied(password: Option<&str>) -> Option<&str> {
    password.filter(|p| !p.is_empty())
}

impl AccountStore {
    pub fn new(store: Arc<dyn UserStore>, hash_cost: u32) -> Self {
        Self { store, hash_cost }
    }

    pub async fn list(&self) -> Result<Vec<User>, AccountError> {
        let users = self.store.find_many().await?;
        debug!(count = users.len(), "listed users");
        Ok(users)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError> {
        self.store.find_by_email(email).await
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AccountError> {
        self.store.find_by_id(id).await
    }

    pub async fn count_by_email(&self, email: &str) -> Result<i64, AccountError> {
        self.store.count_by_email(email).await
    }

    pub async fn count_by_id(&self, id: Uuid) -> Result<i64, AccountError> {
        self.store.count_by_id(id).await
    }

    #[instrument(skip(self, data), fields(email = %data.email))]
    pub async fn insert(&self, data: RegisterRequest) -> Result<User, AccountError> {
        let id = Uuid::new_v4();
        let password = match supplied(data.password.as_deref()) {
            Some(plain) => Some(hash_password(plain, self.hash_cost)?),
            None => None,
        };

        let user = self
            .store
            .create(NewUser {
                id,
                username: User::username_for(id),
                name: data.name,
                email: data.email,
                role: Role::default(),
                provider: data
                    .provider
                    .unwrap_or_else(|| CREDENTIALS_PROVIDER.to_string()),
                password,
            })
            .await?;

        info!(user_id = %user.id, provider = %user.provider, "user inserted");
        Ok(user)
    }

    /// Fallback-merge update: fields missing from `data` keep their stored value.
    #[instrument(skip(self, data))]
    pub async fn update(&self, id: Uuid, data: UpdateUserRequest) -> Result<User, AccountError> {
        let existing = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AccountError::NotFound(id.to_string()))?;

        let password_hash = match supplied(data.password.as_deref()) {
            Some(plain) => Some(hash_password(plain, self.hash_cost)?),
            None => None,
        };

        let patch = UserPatch {
            name: data.name,
            username: data.username,
            email: data.email,
            role: data.role,
            provider: data.provider,
            password_hash,
        };
        let merged = patch.apply(&existing);
        let user = self.store.update(&merged).await?;

        info!(user_id = %user.id, "user updated");
        Ok(user)
    }

    #[instrument(skip(self))]
    pub async fn destroy(&self, id: Uuid) -> Result<User, AccountError> {
        let user = self.store.delete(id).await?;
        info!(user_id = %user.id, "user destroyed");
        Ok(user)
    }

    /// Credential sign-in. Unknown email, OAuth-only account and wrong
    /// password are indistinguishable to the caller.
    #[instrument(skip(self, password))]
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<User, AccountError> {
        let Some(user) = self.store.find_by_email(email).await? else {
            warn!("sign-in for unknown email");
            return Err(AccountError::InvalidCredentials);
        };
        let Some(hash) = user.password.as_deref() else {
            warn!(user_id = %user.id, provider = %user.provider, "sign-in without local password");
            return Err(AccountError::InvalidCredentials);
        };
        if !verify_password(password, hash)? {
            warn!(user_id = %user.id, "sign-in with wrong password");
            return Err(AccountError::InvalidCredentials);
        }
        debug!(user_id = %user.id, "credentials verified");
        Ok(user)
    }

    /// Replaces the password after checking the current one.
    #[instrument(skip(self, current, new_password))]
    pub async fn change_password(
        &self,
        id: Uuid,
        current: &str,
        new_password: &str,
    ) -> Result<User, AccountError> {
        let user = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| AccountError::NotFound(id.to_string()))?;
        let Some(hash) = user.password.as_deref() else {
            return Err(AccountError::InvalidCredentials);
        };
        if !verify_password(current, hash)? {
            warn!(user_id = %id, "password change with wrong current password");
            return Err(AccountError::InvalidCredentials);
        }
        if supplied(Some(new_password)).is_none() {
            return Err(AccountError::Validation("new password is required".into()));
        }

        self.update(
            id,
            UpdateUserRequest {
                password: Some(new_password.to_string()),
                ..Default::default()
            },
        )
        .await
    }
}
