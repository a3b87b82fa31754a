use tracing::error;

use crate::error::AccountError;

pub fn hash_password(plain: &str, cost: u32) -> Result<String, AccountError> {
    bcrypt::hash(plain, cost).map_err(|e| {
        error!(error = %e, "bcrypt hash error");
        AccountError::Hashing(e)
    })
}

pub fn verify_password(plain: &str, hash: &str) -> Result<bool, AccountError> {
    bcrypt::verify(plain, hash).map_err(|e| {
        error!(error = %e, "bcrypt verify error");
        AccountError::Hashing(e)
    })
}
