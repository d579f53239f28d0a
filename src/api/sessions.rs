// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Login, logout and session listing.

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderName, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::validation::{description, Email},
    auth::Auth,
    error::ApiError,
    models::Session,
    state::AppState,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Free-form label for the device or client.
    #[serde(default)]
    pub description: Option<String>,
}

/// A freshly issued session. The token is only ever returned here.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub session_id: String,
    pub account_id: String,
    /// Send as `Authorization: Bearer <token>`.
    pub token: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Session> for LoginResponse {
    fn from(session: Session) -> Self {
        Self {
            session_id: session.session_id,
            account_id: session.account_id,
            token: session.token,
            description: session.description,
            created_at: session.created_at,
        }
    }
}

/// A live session as listed to its owner, without any secret.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub session_id: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Whether this is the session making the request.
    pub current: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionListResponse {
    pub sessions: Vec<SessionResponse>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LogoutAllResponse {
    /// Number of sessions revoked, the caller's included.
    pub revoked: usize,
}

/// Exchange an email and password for a bearer token.
///
/// Unknown emails and wrong passwords get the same 401.
#[utoipa::path(
    post,
    path = "/v1/sessions",
    tag = "Sessions",
    request_body = LoginRequest,
    responses(
        (status = 201, description = "Session issued", body = LoginResponse),
        (status = 401, description = "Invalid email or password"),
        (status = 503, description = "Store unavailable")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<(StatusCode, [(HeaderName, String); 1], Json<LoginResponse>), ApiError> {
    // A malformed email cannot belong to any account
    let email = Email::parse(&request.email).map_err(|_| ApiError::unauthorized())?;
    let label = match request.description.as_deref() {
        Some(text) => Some(description(Some(text))?),
        None => None,
    };

    let session = state
        .interactor
        .login(email.as_str(), &request.password, label)?;
    let header = [(AUTHORIZATION, format!("Bearer {}", session.token))];
    Ok((StatusCode::CREATED, header, Json(session.into())))
}

#[utoipa::path(
    get,
    path = "/v1/users/{account_id}/sessions",
    tag = "Sessions",
    security(("bearer_auth" = [])),
    params(("account_id" = String, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "Live sessions", body = SessionListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_sessions(
    Auth(session): Auth,
    State(state): State<AppState>,
) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions: Vec<SessionResponse> = state
        .interactor
        .list_sessions(&session)?
        .into_iter()
        .map(|s| SessionResponse {
            current: s.session_id == session.session_id,
            session_id: s.session_id,
            description: s.description,
            created_at: s.created_at,
        })
        .collect();
    let total = sessions.len();
    Ok(Json(SessionListResponse { sessions, total }))
}

/// Revoke the session making the request.
#[utoipa::path(
    delete,
    path = "/v1/users/{account_id}/session",
    tag = "Sessions",
    security(("bearer_auth" = [])),
    params(("account_id" = String, Path, description = "Account identifier")),
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn logout(
    Auth(session): Auth,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state.interactor.logout(&session)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Revoke every session of the account.
#[utoipa::path(
    delete,
    path = "/v1/users/{account_id}/sessions",
    tag = "Sessions",
    security(("bearer_auth" = [])),
    params(("account_id" = String, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "All sessions revoked", body = LogoutAllResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn logout_all(
    Auth(session): Auth,
    State(state): State<AppState>,
) -> Result<Json<LogoutAllResponse>, ApiError> {
    let revoked = state.interactor.logout_all(&session)?;
    Ok(Json(LogoutAllResponse { revoked }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{body_json, send, test_app, PASSWORD};
    use axum::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn login_returns_token_in_body_and_header() {
        let test = test_app(false);
        test.sign_up("ada@example.com").await;

        let response = test
            .request(
                Method::POST,
                "/v1/sessions",
                None,
                Some(json!({"email": "Ada@Example.com", "password": PASSWORD, "description": "laptop"})),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let header = response
            .headers()
            .get(AUTHORIZATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = body_json(&body);
        assert_eq!(header, format!("Bearer {}", body["token"].as_str().unwrap()));
        assert_eq!(body["description"], "laptop");
        assert!(body.get("original").is_none());
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let test = test_app(false);
        test.sign_up("ada@example.com").await;

        let (wrong_status, wrong_body) = send(
            &test.app,
            Method::POST,
            "/v1/sessions",
            None,
            Some(json!({"email": "ada@example.com", "password": "not the password"})),
        )
        .await;
        let (unknown_status, unknown_body) = send(
            &test.app,
            Method::POST,
            "/v1/sessions",
            None,
            Some(json!({"email": "eve@example.com", "password": PASSWORD})),
        )
        .await;

        assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_status, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_body, unknown_body);
    }

    #[tokio::test]
    async fn logout_revokes_only_the_current_session() {
        let test = test_app(false);
        let (account_id, first) = test.sign_up("ada@example.com").await;
        let second = test.log_in("ada@example.com").await;

        let (status, body) = send(
            &test.app,
            Method::GET,
            &format!("/v1/users/{account_id}/sessions"),
            Some(&first),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body = body_json(&body);
        assert_eq!(body["total"], 2);
        assert_eq!(
            body["sessions"]
                .as_array()
                .unwrap()
                .iter()
                .filter(|s| s["current"] == true)
                .count(),
            1
        );

        let (status, _) = send(
            &test.app,
            Method::DELETE,
            &format!("/v1/users/{account_id}/session"),
            Some(&first),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let profile = format!("/v1/users/{account_id}");
        let (status, _) = send(&test.app, Method::GET, &profile, Some(&first), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = send(&test.app, Method::GET, &profile, Some(&second), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn logout_all_revokes_every_session() {
        let test = test_app(false);
        let (account_id, first) = test.sign_up("ada@example.com").await;
        let second = test.log_in("ada@example.com").await;

        let (status, body) = send(
            &test.app,
            Method::DELETE,
            &format!("/v1/users/{account_id}/sessions"),
            Some(&second),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body_json(&body)["revoked"], 2);

        let profile = format!("/v1/users/{account_id}");
        for token in [first, second] {
            let (status, _) = send(&test.app, Method::GET, &profile, Some(&token), None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
        }
    }
}
