// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;
use crate::storage::StorageError;

/// Health check response with individual component status.
#[derive(Debug, Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Overall health status ("ok" or "degraded").
    pub status: String,
    /// Individual health checks and their results.
    pub checks: HealthChecks,
}

/// Individual health check results.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    /// Whether the service process is running.
    pub service: String,
    /// Record store status.
    pub records: String,
    /// Blob store status. Only present when image payloads are offloaded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blobs: Option<String>,
}

/// Simple health check response for liveness probes.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

fn describe(check: &Result<(), StorageError>, store: &str) -> String {
    match check {
        Ok(()) => "ok".to_string(),
        Err(e) => {
            tracing::warn!(error = %e, store, "health check failed");
            "unavailable".to_string()
        }
    }
}

/// Health check endpoint handler.
///
/// Returns 200 if both stores answer, 503 otherwise.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = ReadyResponse),
        (status = 503, description = "Service is unhealthy", body = ReadyResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    let report = state.interactor.check_stores();
    let ready = report.is_ready();

    let response = ReadyResponse {
        status: if ready { "ok" } else { "degraded" }.to_string(),
        checks: HealthChecks {
            service: "ok".to_string(),
            records: describe(&report.records, "records"),
            blobs: report.blobs.as_ref().map(|check| describe(check, "blobs")),
        },
    };

    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}

/// Liveness probe handler.
///
/// Always returns 200 if the process is running.
#[utoipa::path(
    get,
    path = "/health/live",
    tag = "Health",
    responses(
        (status = 200, description = "Service is alive", body = HealthResponse)
    )
)]
pub async fn liveness() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Readiness probe handler.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "Health",
    responses(
        (status = 200, description = "Service is ready", body = ReadyResponse),
        (status = 503, description = "Service is not ready", body = ReadyResponse)
    )
)]
pub async fn readiness(state: State<AppState>) -> (StatusCode, Json<ReadyResponse>) {
    health(state).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{body_json, send, test_app};
    use axum::http::Method;

    #[tokio::test]
    async fn liveness_always_ok() {
        let Json(body) = liveness().await;
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn inline_mode_skips_blob_check() {
        let test = test_app(false);
        let (status, body) = send(&test.app, Method::GET, "/health/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
        let body = body_json(&body);
        assert_eq!(body["checks"]["records"], "ok");
        assert!(body["checks"].get("blobs").is_none());
    }

    #[tokio::test]
    async fn blob_outage_degrades_readiness() {
        let test = test_app(true);
        test.blobs.set_unavailable(true);

        let (status, body) = send(&test.app, Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(&body);
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["checks"]["blobs"], "unavailable");
    }

    #[tokio::test]
    async fn record_outage_degrades_readiness() {
        let test = test_app(false);
        test.store.set_unavailable(true);

        let (status, body) = send(&test.app, Method::GET, "/health/ready", None, None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(&body)["checks"]["records"], "unavailable");
    }
}
