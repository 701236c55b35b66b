//! Shared primitives for all Rust crates in the SamSoftware HR client.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use thiserror::Error;

pub use auth::{AccessToken, PrincipalId};

/// Result type used across SamSoftware HR crates.
pub type AppResult<T> = Result<T, AppError>;

/// Fallback text shown when a failure carries no usable message.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please try again.";

/// Text shown when the backend could not be reached at all.
pub const CONNECTION_FAILURE_MESSAGE: &str =
    "Unable to connect to the server. Please check your connection and try again.";

/// Text shown when a call needs a session that is missing or expired.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Common application error categories.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant, detected before any request.
    #[error("validation error: {0}")]
    Validation(String),

    /// Requested resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Write operation conflicts with existing state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Session is missing, invalid or expired.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Session is valid but the permission matrix denies the action.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The request never reached the backend or no response came back.
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with `success: false`.
    #[error("server error: {}", .message.as_deref().unwrap_or("no message"))]
    Server {
        /// Message reported by the backend, if any.
        message: Option<String>,
    },

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Builds a server failure from an optional envelope message.
    #[must_use]
    pub fn server(message: Option<String>) -> Self {
        let message = message.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        Self::Server { message }
    }

    /// Returns the text an error notice should show for this failure.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Server {
                message: Some(message),
            } => message.clone(),
            Self::Server { message: None } | Self::Internal(_) => {
                GENERIC_FAILURE_MESSAGE.to_owned()
            }
            Self::Transport(_) => CONNECTION_FAILURE_MESSAGE.to_owned(),
            Self::Unauthorized(_) => SESSION_EXPIRED_MESSAGE.to_owned(),
            Self::Validation(message)
            | Self::NotFound(message)
            | Self::Conflict(message)
            | Self::Forbidden(message) => message.clone(),
        }
    }

    /// Returns whether the failure was raised before any request was issued.
    #[must_use]
    pub fn is_preflight(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Unauthorized(_) | Self::Forbidden(_)
        )
    }
}
