use thiserror::Error;

use crate::error::HttpError;
use axum::http::StatusCode;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("You are not allowed to perform this action")]
    Unauthorized,

    #[error("Invalid principal format: {0}")]
    InvalidPrincipal(String),

    #[error("Invalid referral code format: {0}")]
    InvalidCode(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("No manual premium grant found for {0}")]
    ManualGrantNotFound(String),

    #[error("Referral code {0} not found")]
    CodeNotFound(String),

    #[error("Referral code {0} already exists")]
    CodeExists(String),

    #[error("Referral code {0} has expired")]
    CodeExpired(String),

    #[error("Referral code {0} has been revoked")]
    CodeRevoked(String),

    #[error("Referral code {0} was already redeemed by this account")]
    AlreadyRedeemed(String),

    #[error("Checkout session {0} was already used by another account")]
    SessionInUse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        HttpError::new(error.to_string(), status)
    }
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Unauthorized => StatusCode::FORBIDDEN,

            ServiceError::InvalidPrincipal(_)
            | ServiceError::InvalidCode(_)
            | ServiceError::InvalidDuration(_) => StatusCode::BAD_REQUEST,

            ServiceError::ManualGrantNotFound(_) | ServiceError::CodeNotFound(_) => {
                StatusCode::NOT_FOUND
            }

            ServiceError::CodeExpired(_) | ServiceError::CodeRevoked(_) => StatusCode::GONE,

            ServiceError::AlreadyRedeemed(_)
            | ServiceError::SessionInUse(_)
            | ServiceError::CodeExists(_) => StatusCode::CONFLICT,

            ServiceError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
