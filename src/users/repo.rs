use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AccountError;
use crate::users::repo_types::{NewUser, User};
use crate::users::store::UserStore;

/// Postgres-backed user store.
#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_many(&self) -> Result<Vec<User>, AccountError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, name, email, role, provider, password, created_at, updated_at
            FROM users
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    /// Find a user by email.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, name, email, role, provider, password, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AccountError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, name, email, role, provider, password, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn count_by_email(&self, email: &str) -> Result<i64, AccountError> {
        let count = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM users WHERE email = $1"#)
            .bind(email)
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    async fn count_by_id(&self, id: Uuid) -> Result<i64, AccountError> {
        let count = sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM users WHERE id = $1"#)
            .bind(id)
            .fetch_one(&self.db)
            .await?;
        Ok(count)
    }

    /// Insert a new user. The unique indexes on email and username decide duplicates.
    async fn create(&self, user: NewUser) -> Result<User, AccountError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, name, email, role, provider, password)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, username, name, email, role, provider, password, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(&user.provider)
        .bind(user.password.as_deref()) // NULL for OAuth accounts
        .fetch_one(&self.db)
        .await?;
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<User, AccountError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
               SET username = $2,
                   name = $3,
                   email = $4,
                   role = $5,
                   provider = $6,
                   password = $7,
                   updated_at = now()
             WHERE id = $1
            RETURNING id, username, name, email, role, provider, password, created_at, updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role)
        .bind(&user.provider)
        .bind(user.password.as_deref())
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AccountError::NotFound(user.id.to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<User, AccountError> {
        sqlx::query_as::<_, User>(
            r#"
            DELETE FROM users
             WHERE id = $1
            RETURNING id, username, name, email, role, provider, password, created_at, updated_at
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AccountError::NotFound(id.to_string()))
    }
}
