use thiserror::Error;

/// Lookup against the user service: does this user exist and is it active.
#[allow(async_fn_in_trait)]
pub trait UserValidator {
    async fn is_active(&self, user_id: &str) -> Result<bool, UserValidationError>;
}

#[derive(Debug, Clone, Error)]
pub enum UserValidationError {
    #[error("User service unavailable: {0}")]
    Unavailable(String),
}
