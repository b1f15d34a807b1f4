//! Authentication Error Handling (SI-11)
//!
//! NIST SP 800-53 SI-11 compliant error handling for the authentication
//! pipeline: failures are converted to HTTP-level responses, never
//! process-fatal errors, and token-verification failures never reveal
//! which check failed.
//!
//! # Security Rationale
//!
//! A client that can distinguish "signature mismatch" from "expired" from
//! "malformed" learns more about the token scheme than it should. Every
//! [`AuthError::InvalidToken`] therefore renders as the same uniform
//! message; the internal cause is carried only for logging.
//!
//! # Usage
//!
//! ```ignore
//! use portcullis::error::AuthError;
//!
//! fn check(role: &str) -> Result<(), AuthError> {
//!     let role = portcullis::authority::Role::from_name(role)?;
//!     Ok(())
//! }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::responders::ResponseBody;

/// Uniform client-facing message for every token-verification failure.
pub const TOKEN_CANNOT_BE_VERIFIED: &str = "Token cannot be verified";

/// Errors produced by the authentication pipeline.
///
/// Every variant maps to an HTTP status; none aborts the process.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Signature mismatch, malformed structure, or expiry. The cause is
    /// for logging only; clients always see the same message.
    #[error("Token cannot be verified")]
    InvalidToken {
        /// Internal cause, never surfaced to clients
        cause: String,
    },

    /// Role name did not match any defined variant
    #[error("Unknown role: {name}")]
    UnknownRole {
        /// The rejected role name
        name: String,
    },

    /// Token signing failed
    #[error("Token could not be created")]
    TokenCreation {
        /// Internal cause, never surfaced to clients
        cause: String,
    },

    /// Credentials did not match
    #[error("Username or password is incorrect")]
    InvalidCredentials,

    /// Account locked after repeated failed attempts
    #[error("Your account has been locked, please contact administration")]
    AccountLocked,

    /// Account disabled by an administrator
    #[error("Your account has been disabled, please contact administration")]
    AccountDisabled,

    /// Unauthenticated request to a protected route
    #[error("You need to log in to access this page")]
    AuthenticationRequired,

    /// Authenticated principal lacks a required authority
    #[error("You do not have permission to access this page")]
    InsufficientAuthority,
}

impl AuthError {
    pub(crate) fn invalid_token(cause: impl Into<String>) -> Self {
        Self::InvalidToken {
            cause: cause.into(),
        }
    }

    pub(crate) fn token_creation(cause: impl Into<String>) -> Self {
        Self::TokenCreation {
            cause: cause.into(),
        }
    }

    /// Get the HTTP status this error renders as
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidToken { .. }
            | Self::InvalidCredentials
            | Self::AccountLocked
            | Self::AccountDisabled
            | Self::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Self::InsufficientAuthority => StatusCode::FORBIDDEN,
            Self::UnknownRole { .. } => StatusCode::BAD_REQUEST,
            Self::TokenCreation { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log the error (called automatically by `IntoResponse`)
    fn log(&self) {
        match self {
            Self::InvalidToken { cause } => {
                tracing::debug!(cause = %cause, "Token verification failed");
            }
            Self::TokenCreation { cause } => {
                tracing::error!(cause = %cause, "Token creation failed");
            }
            Self::AuthenticationRequired | Self::InsufficientAuthority => {
                tracing::warn!(error = %self, "Access refused");
            }
            _ => {
                tracing::debug!(error = %self, "Authentication error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        let status = self.status_code();
        ResponseBody::new(status, self.to_string()).into_response()
    }
}

/// Result type alias for the authentication pipeline
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AuthError::invalid_token("bad signature").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::AuthenticationRequired.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AuthError::InsufficientAuthority.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AuthError::UnknownRole {
                name: "bogus".into()
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::token_creation("oops").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invalid_token_message_is_uniform() {
        // The display text must not depend on the internal cause.
        let expired = AuthError::invalid_token("ExpiredSignature");
        let forged = AuthError::invalid_token("InvalidSignature");
        assert_eq!(expired.to_string(), forged.to_string());
        assert_eq!(expired.to_string(), TOKEN_CANNOT_BE_VERIFIED);
    }

    #[test]
    fn test_unknown_role_names_the_role() {
        let err = AuthError::UnknownRole {
            name: "WIZARD".into(),
        };
        assert!(err.to_string().contains("WIZARD"));
    }
}
