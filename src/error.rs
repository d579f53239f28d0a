// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::api::validation::ValidationError;
use crate::interactor::{ErrorKind, InteractorError};

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: &'static str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "validation_error", message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "unauthorized", "Unauthorized")
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "conflict", message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::bad_request(e.to_string())
    }
}

impl From<InteractorError> for ApiError {
    fn from(e: InteractorError) -> Self {
        match e.kind() {
            ErrorKind::Unauthorized => Self::unauthorized(),
            ErrorKind::NotFound => Self::not_found(e.to_string()),
            ErrorKind::Conflict => Self::conflict(e.to_string()),
            ErrorKind::StoreUnavailable => {
                tracing::error!(error = %e, stage = %e.stage(), "store unavailable");
                Self::unavailable(format!("{} is temporarily unavailable", e.stage()))
            }
            ErrorKind::PartialConsistency => {
                tracing::warn!(error = %e, stage = %e.stage(), "stores disagree");
                Self::new(StatusCode::BAD_GATEWAY, "partial_consistency", e.to_string())
            }
            ErrorKind::Internal => {
                tracing::error!(error = %e, stage = %e.stage(), "internal failure");
                Self::internal("Internal server error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
            error_code: self.code,
        });
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactor::Stage;
    use crate::storage::StorageError;
    use axum::body::to_bytes;

    #[test]
    fn constructors_set_status_and_code() {
        let nf = ApiError::not_found("missing");
        assert_eq!(nf.status, StatusCode::NOT_FOUND);
        assert_eq!(nf.message, "missing");

        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.code, "validation_error");
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data","error_code":"validation_error"}"#);
    }

    #[test]
    fn interactor_kinds_map_to_statuses() {
        let cases = [
            (
                InteractorError::Unauthorized {
                    stage: Stage::SessionCheck,
                },
                StatusCode::UNAUTHORIZED,
            ),
            (
                InteractorError::store(Stage::PrimaryRead)(StorageError::NotFound("x".into())),
                StatusCode::NOT_FOUND,
            ),
            (
                InteractorError::store(Stage::PrimaryWrite)(StorageError::Conflict("x".into())),
                StatusCode::CONFLICT,
            ),
            (
                InteractorError::store(Stage::PrimaryWrite)(StorageError::Unavailable("x".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                InteractorError::PartialConsistency {
                    stage: Stage::SecondaryWrite,
                    record_id: "i1".into(),
                    source: StorageError::Unavailable("x".into()),
                },
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }

    #[test]
    fn unavailable_message_hides_store_details() {
        let err = ApiError::from(InteractorError::store(Stage::PrimaryRead)(
            StorageError::Unavailable("/var/lib/db: permission denied".into()),
        ));
        assert!(!err.message.contains("/var/lib"));
    }
}
