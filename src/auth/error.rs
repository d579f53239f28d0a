// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::storage::StorageError;

/// Authentication error type.
///
/// Credential failures all share one generic message so a caller cannot
/// tell a wrong email from a wrong password, or a forged token from a
/// revoked one. Store failures are kept apart: they mean "could not check",
/// not "not allowed".
#[derive(Debug)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Invalid authorization header format
    InvalidAuthHeader,
    /// Login email/secret pair did not match
    InvalidCredentials,
    /// Bearer token does not resolve to a live session
    UnknownSession,
    /// Session outlived the configured lifetime
    SessionExpired,
    /// Session store could not be read or written
    Store(StorageError),
    /// System randomness unavailable
    Entropy,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::InvalidCredentials
            | AuthError::UnknownSession
            | AuthError::SessionExpired => "unauthorized",
            AuthError::Store(StorageError::Conflict(_)) => "conflict",
            AuthError::Store(_) => "store_unavailable",
            AuthError::Entropy => "internal_error",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::InvalidCredentials
            | AuthError::UnknownSession
            | AuthError::SessionExpired => StatusCode::UNAUTHORIZED,
            AuthError::Store(StorageError::Conflict(_)) => StatusCode::CONFLICT,
            AuthError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            AuthError::Entropy => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller is simply not allowed, as opposed to the check
    /// itself failing.
    pub fn is_unauthorized(&self) -> bool {
        self.status_code() == StatusCode::UNAUTHORIZED
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "Authorization header is required"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::UnknownSession | AuthError::SessionExpired => {
                write!(f, "Session is not valid")
            }
            AuthError::Store(e) => write!(f, "Session store error: {e}"),
            AuthError::Entropy => write!(f, "Could not generate session secret"),
        }
    }
}

impl std::error::Error for AuthError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AuthError::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StorageError> for AuthError {
    fn from(e: StorageError) -> Self {
        AuthError::Store(e)
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AuthError::Store(StorageError::Conflict(_)) | AuthError::Entropy => self.to_string(),
            AuthError::Store(e) => {
                tracing::error!(error = %e, "session store failure");
                "Session store is unavailable".to_string()
            }
            _ => self.to_string(),
        };
        let body = Json(AuthErrorBody {
            error: message,
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}
