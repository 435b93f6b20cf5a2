use http::StatusCode;
use uuid::Uuid;

use petadopt_core::error::StoreError;

/// Users service error variants.
#[derive(Debug, thiserror::Error)]
pub enum UsersServiceError {
    #[error("user not found")]
    UserNotFound,
    #[error("email is already registered")]
    EmailAlreadyRegistered,
    #[error("invalid email: {0}")]
    InvalidEmail(String),
    #[error("invalid full name: {0}")]
    InvalidFullName(String),
    #[error("invalid phone number: {0}")]
    InvalidPhoneNumber(String),
    #[error("user is suspended")]
    UserSuspended,
    #[error("user is already active")]
    UserAlreadyActive,
    #[error("user is already suspended")]
    UserAlreadySuspended,
    #[error("user is already an admin")]
    UserAlreadyAdmin,
    #[error("user {user_id} was modified by another request")]
    ConcurrencyConflict { user_id: Uuid },
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl UsersServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UserNotFound => "USER_NOT_FOUND",
            Self::EmailAlreadyRegistered => "EMAIL_ALREADY_REGISTERED",
            Self::InvalidEmail(_) => "INVALID_EMAIL",
            Self::InvalidFullName(_) => "INVALID_FULL_NAME",
            Self::InvalidPhoneNumber(_) => "INVALID_PHONE_NUMBER",
            Self::UserSuspended => "USER_SUSPENDED",
            Self::UserAlreadyActive => "USER_ALREADY_ACTIVE",
            Self::UserAlreadySuspended => "USER_ALREADY_SUSPENDED",
            Self::UserAlreadyAdmin => "USER_ALREADY_ADMIN",
            Self::ConcurrencyConflict { .. } => "CONCURRENCY_CONFLICT",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::UserNotFound => StatusCode::NOT_FOUND,
            Self::InvalidEmail(_) | Self::InvalidFullName(_) | Self::InvalidPhoneNumber(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::UserSuspended => StatusCode::FORBIDDEN,
            Self::EmailAlreadyRegistered
            | Self::UserAlreadyActive
            | Self::UserAlreadySuspended
            | Self::UserAlreadyAdmin
            | Self::ConcurrencyConflict { .. } => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Numeric code carried in error bodies.
    pub fn error_code(&self) -> u16 {
        match self {
            Self::UserNotFound => 1101,
            Self::EmailAlreadyRegistered => 1102,
            Self::InvalidEmail(_) => 1103,
            Self::InvalidFullName(_) => 1104,
            Self::InvalidPhoneNumber(_) => 1105,
            Self::UserSuspended => 1106,
            Self::UserAlreadyActive => 1107,
            Self::UserAlreadySuspended => 1108,
            Self::UserAlreadyAdmin => 1109,
            Self::ConcurrencyConflict { .. } => 2001,
            Self::Internal(_) => 5000,
        }
    }

    pub fn body(&self) -> serde_json::Value {
        if let Self::Internal(e) = self {
            tracing::error!(error = %e, kind = "INTERNAL", "internal error");
        }
        serde_json::json!({
            "kind": self.kind(),
            "code": self.error_code(),
            "message": self.to_string(),
        })
    }
}

impl From<StoreError> for UsersServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConcurrencyConflict { aggregate_id, .. } => Self::ConcurrencyConflict {
                user_id: aggregate_id,
            },
            StoreError::Duplicate { .. } => Self::EmailAlreadyRegistered,
            other => Self::Internal(anyhow::Error::new(other)),
        }
    }
}
