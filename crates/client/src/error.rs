//! Error types for the portal client.

use std::sync::Arc;

use reqwest::StatusCode;
use thiserror::Error;

use crate::storage::StorageError;

/// Errors returned by client operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection refused, DNS,
    /// timeout) after all retries.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    ///
    /// `message` is the user-facing text for the status; `detail` is what
    /// the backend put in its error body, if anything.
    #[error("HTTP {status}: {message}")]
    Http {
        status: StatusCode,
        message: String,
        detail: Option<String>,
    },

    /// An authenticated call was rejected with 401. The session has already
    /// been torn down when this is returned.
    #[error("session expired")]
    Authentication,

    /// Registration failed because the username is taken.
    #[error("{0}")]
    DuplicateUser(String),

    /// Registration failed for any other reason. Carries the backend detail.
    #[error("{0}")]
    Registration(String),

    /// An anonymous call got no response; the user was already notified.
    #[error("no response from server")]
    NoResponse,

    /// A 2xx body did not have the expected shape.
    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Durable storage failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A local file could not be used for upload.
    #[error("file error: {0}")]
    File(String),

    /// A reference list came back empty.
    #[error("{0} list is empty")]
    EmptyReference(&'static str),

    /// A failure shared between every caller of a de-duplicated fetch.
    #[error(transparent)]
    Shared(Arc<ApiError>),
}

impl ApiError {
    /// HTTP status of the failure, if the backend answered.
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Authentication => Some(StatusCode::UNAUTHORIZED),
            Self::Shared(inner) => inner.status(),
            _ => None,
        }
    }

    /// Whether this is a 422 validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.status() == Some(StatusCode::UNPROCESSABLE_ENTITY)
    }

    /// Whether the session was ended by this failure.
    #[must_use]
    pub fn is_authentication(&self) -> bool {
        matches!(self.root(), Self::Authentication)
    }

    /// The underlying error, looking through [`ApiError::Shared`].
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Shared(inner) => inner.root(),
            other => other,
        }
    }
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_detection() {
        let err = ApiError::Http {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: "Ошибка валидации данных".to_owned(),
            detail: None,
        };
        assert!(err.is_validation());
        assert!(!ApiError::NoResponse.is_validation());
    }

    #[test]
    fn test_shared_root() {
        let shared = ApiError::Shared(Arc::new(ApiError::Authentication));
        assert!(shared.is_authentication());
        assert_eq!(shared.status(), Some(StatusCode::UNAUTHORIZED));
        assert_eq!(shared.to_string(), "session expired");
    }

    #[test]
    fn test_registration_display_is_detail() {
        assert_eq!(ApiError::Registration("Bad field".into()).to_string(), "Bad field");
    }
}
