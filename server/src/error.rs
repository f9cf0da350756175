use hyper::StatusCode;
use thiserror::Error;
use tracing::error;

/// Failure taxonomy shared by every operation.
///
/// The message is what the caller sees. Storage details never reach it:
/// they are logged where the failure happens and replaced by a generic
/// `Internal` message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),

    #[error("{0}")]
    Unimplemented(String),
}

impl ServiceError {
    pub fn to_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Internal(_) => "INTERNAL",
            Self::Unimplemented(_) => "UNIMPLEMENTED",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unimplemented(_) => StatusCode::NOT_IMPLEMENTED,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Unauthenticated(m)
            | Self::InvalidArgument(m)
            | Self::NotFound(m)
            | Self::Internal(m)
            | Self::Unimplemented(m) => m,
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::NotFound(message.to_string())
    }

    pub fn invalid(message: &str) -> Self {
        Self::InvalidArgument(message.to_string())
    }
}

/// Log a storage failure with its context and turn it into `Internal`.
///
/// Use as `.map_err(|e| storage("Could not find user", e))?`.
pub fn storage(context: &str, err: sqlx::Error) -> ServiceError {
    error!("{}: {}", context, err);
    ServiceError::Internal(context.to_string())
}

/// True when `err` is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
