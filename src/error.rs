use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, error};

/// Failures surfaced by the account lifecycle.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Carries the looked-up id for logs; the message never includes it.
    #[error("User not found")]
    NotFound(String),

    /// Unique constraint rejected the write (email or username).
    #[error("{0}")]
    Conflict(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),

    #[error("database error: {0}")]
    Database(#[source] sqlx::Error),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<sqlx::Error> for AccountError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AccountError::NotFound(String::new()),
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                AccountError::unique_violation(db.constraint().unwrap_or_default())
            }
            other => AccountError::Database(other),
        }
    }
}

impl AccountError {
    /// Client-facing conflict for a violated unique constraint.
    pub fn unique_violation(constraint: &str) -> Self {
        let message = match constraint {
            "users_email_key" => "Email already registered",
            "users_username_key" => "Username already taken",
            _ => "Account already exists",
        };
        AccountError::Conflict(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AccountError::NotFound(_) => StatusCode::NOT_FOUND,
            AccountError::Conflict(_) => StatusCode::CONFLICT,
            AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AccountError::Validation(_) => StatusCode::BAD_REQUEST,
            AccountError::Hashing(_) | AccountError::Database(_) | AccountError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AccountError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let AccountError::NotFound(id) = &self {
            debug!(%id, "user not found");
        }
        if status.is_server_error() {
            error!(error = %self, "request failed");
            return (status, "Internal server error".to_string()).into_response();
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_variants_to_status_codes() {
        assert_eq!(
            AccountError::NotFound("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AccountError::unique_violation("users_email_key").status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AccountError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AccountError::Validation("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AccountError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn row_not_found_becomes_not_found() {
        let err = AccountError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, AccountError::NotFound(_)));
    }

    #[test]
    fn messages_do_not_leak_storage_details() {
        let err = AccountError::from(sqlx::Error::RowNotFound);
        assert_eq!(err.to_string(), "User not found");
        assert_eq!(
            AccountError::NotFound("3f2b8c1d".into()).to_string(),
            "User not found"
        );
        assert_eq!(
            AccountError::unique_violation("users_email_key").to_string(),
            "Email already registered"
        );
        assert_eq!(
            AccountError::unique_violation("users_username_key").to_string(),
            "Username already taken"
        );
        assert_eq!(
            AccountError::unique_violation("users_pkey").to_string(),
            "Account already exists"
        );
    }

    #[test]
    fn server_errors_hide_details() {
        let res = AccountError::Internal(anyhow::anyhow!("secret detail")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
