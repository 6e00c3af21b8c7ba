//! Error types for the control API.
//!
//! [`ApiError`] covers every way a request can be refused and converts
//! into an Axum response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors returned by control API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// A player identity could not be parsed.
    #[error("invalid UUID: {0}")]
    InvalidUuid(String),

    /// An action request did not name a player.
    #[error("missing uuid")]
    MissingUuid,

    /// The action name is not part of the vocabulary.
    #[error("unknown action: {0}")]
    UnknownAction(String),

    /// The request carried no valid secret.
    #[error("unauthorized")]
    Unauthorized,

    /// Authorization has already been bootstrapped.
    #[error("already initialized")]
    AlreadyInitialized,

    /// A caller-supplied secret was under the minimum length.
    #[error("key_too_short")]
    KeyTooShort,

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// The HTTP status this error maps to.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidUuid(_) | Self::MissingUuid | Self::UnknownAction(_) | Self::KeyTooShort => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::AlreadyInitialized => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({ "error": self.to_string() });

        (status, axum::Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::MissingUuid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::AlreadyInitialized.status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::Internal(String::from("disk")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn body_names_the_error() {
        assert_eq!(ApiError::KeyTooShort.to_string(), "key_too_short");
        assert_eq!(ApiError::Unauthorized.to_string(), "unauthorized");
    }
}
