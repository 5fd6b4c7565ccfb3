use thiserror::Error;
use validator::ValidationErrors;

use crate::db::StoreError;

/// Failure of a marketplace operation. Both HTTP surfaces render the same
/// variant with the same code.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    AlreadyExists(String),
    #[error("{0}")]
    FailedPrecondition(String),
    #[error(transparent)]
    Internal(#[from] StoreError),
}

impl ServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::InvalidArgument(message.into())
    }

    pub fn denied(message: impl Into<String>) -> Self {
        ServiceError::PermissionDenied(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn exists(message: impl Into<String>) -> Self {
        ServiceError::AlreadyExists(message.into())
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        ServiceError::FailedPrecondition(message.into())
    }

    /// Callable-protocol code, e.g. `permission-denied`.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Unauthenticated(_) => "unauthenticated",
            ServiceError::InvalidArgument(_) => "invalid-argument",
            ServiceError::PermissionDenied(_) => "permission-denied",
            ServiceError::NotFound(_) => "not-found",
            ServiceError::AlreadyExists(_) => "already-exists",
            ServiceError::FailedPrecondition(_) => "failed-precondition",
            ServiceError::Internal(_) => "internal",
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value for '{}'", field),
                })
            })
            .collect();
        messages.sort();
        ServiceError::InvalidArgument(messages.join("; "))
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
