// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Account registration and profile endpoints.

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::validation::{description, Email, Name, Secret},
    auth::Auth,
    error::ApiError,
    models::{Account, AccountFields},
    state::AppState,
};

/// Request to open an account.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    /// At least 8 characters. Never stored.
    pub password: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Request to replace profile fields.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateAccountRequest {
    pub name: String,
    pub email: String,
    /// New password; the current one is kept when omitted.
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Account as returned to its owner. The credential is never exposed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    pub account_id: String,
    pub name: String,
    pub email: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            account_id: account.account_id,
            name: account.name,
            email: account.email,
            description: account.description,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

fn account_fields(
    name: &str,
    email: &str,
    text: Option<&str>,
) -> Result<AccountFields, ApiError> {
    Ok(AccountFields {
        name: Name::parse("name", name)?.into_inner(),
        email: Email::parse(email)?.into_inner(),
        description: description(text)?,
    })
}

#[utoipa::path(
    post,
    path = "/v1/users",
    tag = "Users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = AccountResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Email already registered"),
        (status = 503, description = "Store unavailable")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), ApiError> {
    let fields = account_fields(&request.name, &request.email, request.description.as_deref())?;
    let secret = Secret::parse(&request.password)?;

    let account = state.interactor.register(fields, secret.expose())?;
    Ok((StatusCode::CREATED, Json(account.into())))
}

#[utoipa::path(
    get,
    path = "/v1/users/{account_id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("account_id" = String, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "Account profile", body = AccountResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_account(
    Auth(session): Auth,
    State(state): State<AppState>,
) -> Result<Json<AccountResponse>, ApiError> {
    let account = state.interactor.get_account(&session)?;
    Ok(Json(account.into()))
}

#[utoipa::path(
    put,
    path = "/v1/users/{account_id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("account_id" = String, Path, description = "Account identifier")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = AccountResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn update_account(
    Auth(session): Auth,
    State(state): State<AppState>,
    Json(request): Json<UpdateAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let fields = account_fields(&request.name, &request.email, request.description.as_deref())?;
    let secret = request.password.as_deref().map(Secret::parse).transpose()?;

    let account = state
        .interactor
        .update_account(&session, fields, secret.as_ref().map(Secret::expose))?;
    Ok(Json(account.into()))
}

/// Delete the account with all of its wallets, categories, images,
/// transactions and sessions.
#[utoipa::path(
    delete,
    path = "/v1/users/{account_id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("account_id" = String, Path, description = "Account identifier")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Account deleted but some image blobs remain")
    )
)]
pub async fn delete_account(
    Auth(session): Auth,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state.interactor.delete_account(&session)?;
    Ok(StatusCode::NO_CONTENT)
}
