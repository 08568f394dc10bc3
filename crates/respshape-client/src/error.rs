//! Error types for the management client.

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Error body returned by the Edge management API.
///
/// Edge answers failed calls with `{ "code": "...", "message": "..." }`.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code, e.g. `keymanagement.service.app_does_not_exist`.
    #[serde(default)]
    pub code: Option<String>,
    /// Human-readable description.
    pub message: String,
}

/// Errors that can occur when talking to the management API.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClientError {
    /// Network or HTTP request failure.
    ///
    /// DNS resolution, connection failures, timeouts or socket errors.
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON serialization or deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Credentials were rejected (HTTP 401 or 403).
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// The addressed entity does not exist (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// The entity already exists or is in a conflicting state (HTTP 409).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Any other non-success status.
    #[error("API error ({status}): {message}")]
    ApiError {
        /// HTTP status returned by the server.
        status: StatusCode,
        /// Error message extracted from the body.
        message: String,
    },

    /// Invalid management server URL or organization.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The proxy bundle could not be packaged.
    #[error("Bundle error: {0}")]
    BundleError(String),

    /// I/O failure while reading the bundle.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure while writing the bundle archive.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

impl ClientError {
    /// Maps a non-success status and its extracted message onto an error.
    #[must_use]
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status.as_u16() {
            401 | 403 => Self::AuthenticationError(message),
            404 => Self::NotFound(message),
            409 => Self::Conflict(message),
            _ => Self::ApiError { status, message },
        }
    }

    /// Check if this error means the addressed entity is absent.
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is an authentication error.
    pub const fn is_authentication_error(&self) -> bool {
        matches!(self, Self::AuthenticationError(_))
    }
}
