use sea_orm::DbErr;

use crate::domain::TransitionError;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("database error: {0}")]
    Database(#[from] DbErr),
    #[error("{0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("invalid or expired session")]
    Unauthorized,
    #[error("invalid email or password")]
    InvalidCredentials,
}

impl RegistryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn super_admin_required() -> Self {
        Self::Forbidden("ACCESS DENIED: Super Admin privileges required.".into())
    }
}

impl From<TransitionError> for RegistryError {
    fn from(err: TransitionError) -> Self {
        Self::Conflict(err.to_string())
    }
}
