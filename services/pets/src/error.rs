use http::StatusCode;
use uuid::Uuid;

use petadopt_core::error::StoreError;

/// Pets service error variants.
#[derive(Debug, thiserror::Error)]
pub enum PetsServiceError {
    #[error("pet not found")]
    PetNotFound,
    #[error("pet is not available")]
    PetNotAvailable,
    #[error("pet is not reserved")]
    PetNotReserved,
    #[error("invalid pet name: {0}")]
    InvalidPetName(String),
    #[error("pet type not found")]
    PetTypeNotFound,
    #[error("pet type `{0}` already exists")]
    PetTypeAlreadyExists(String),
    #[error("invalid pet type: {0}")]
    InvalidPetType(String),
    #[error("pet type `{0}` is inactive")]
    PetTypeInactive(String),
    #[error("pet type `{0}` is already active")]
    PetTypeAlreadyActive(String),
    #[error("pet type `{0}` is already inactive")]
    PetTypeAlreadyInactive(String),
    #[error("pet {pet_id} was modified by another request")]
    ConcurrencyConflict { pet_id: Uuid },
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl PetsServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::PetNotFound => "PET_NOT_FOUND",
            Self::PetNotAvailable => "PET_NOT_AVAILABLE",
            Self::PetNotReserved => "PET_NOT_RESERVED",
            Self::InvalidPetName(_) => "INVALID_PET_NAME",
            Self::PetTypeNotFound => "PET_TYPE_NOT_FOUND",
            Self::PetTypeAlreadyExists(_) => "PET_TYPE_ALREADY_EXISTS",
            Self::InvalidPetType(_) => "INVALID_PET_TYPE",
            Self::PetTypeInactive(_) => "PET_TYPE_INACTIVE",
            Self::PetTypeAlreadyActive(_) => "PET_TYPE_ALREADY_ACTIVE",
            Self::PetTypeAlreadyInactive(_) => "PET_TYPE_ALREADY_INACTIVE",
            Self::ConcurrencyConflict { .. } => "CONCURRENCY_CONFLICT",
            Self::Internal(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::PetNotFound | Self::PetTypeNotFound => StatusCode::NOT_FOUND,
            Self::PetNotAvailable
            | Self::PetNotReserved
            | Self::PetTypeAlreadyExists(_)
            | Self::PetTypeAlreadyActive(_)
            | Self::PetTypeAlreadyInactive(_)
            | Self::ConcurrencyConflict { .. } => StatusCode::CONFLICT,
            Self::InvalidPetName(_) | Self::InvalidPetType(_) | Self::PetTypeInactive(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Numeric code carried in error bodies.
    pub fn error_code(&self) -> u16 {
        match self {
            Self::PetNotFound => 1001,
            Self::PetNotAvailable => 1002,
            Self::PetNotReserved => 1003,
            Self::InvalidPetName(_) => 1004,
            Self::PetTypeNotFound => 1005,
            Self::PetTypeAlreadyExists(_) => 1006,
            Self::InvalidPetType(_) => 1007,
            Self::PetTypeInactive(_) => 1008,
            Self::PetTypeAlreadyActive(_) => 1009,
            Self::PetTypeAlreadyInactive(_) => 1010,
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

impl From<StoreError> for PetsServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::ConcurrencyConflict { aggregate_id, .. } => Self::ConcurrencyConflict {
                pet_id: aggregate_id,
            },
            other => Self::Internal(anyhow::Error::new(other)),
        }
    }
}
