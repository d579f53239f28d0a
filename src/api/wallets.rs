// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet management API endpoints.
//!
//! Wallets are created in batches; a batch is stored whole or not at all.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::validation::{self, description, Name, RecordId, Secret},
    auth::Auth,
    error::ApiError,
    models::{Wallet, WalletFields},
    state::AppState,
};

/// One wallet to create, or the replacement fields of an existing one.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Optional secret guarding the wallet. Stored only in derived form.
    #[serde(default)]
    pub access_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateWalletsRequest {
    pub wallets: Vec<WalletRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletResponse {
    pub wallet_id: String,
    pub account_id: String,
    pub name: String,
    pub description: String,
    /// Whether an access secret is set.
    pub protected: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Wallet> for WalletResponse {
    fn from(wallet: Wallet) -> Self {
        Self {
            protected: wallet.access_credential.is_some(),
            wallet_id: wallet.wallet_id,
            account_id: wallet.account_id,
            name: wallet.name,
            description: wallet.description,
            created_at: wallet.created_at,
            updated_at: wallet.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletListResponse {
    pub wallets: Vec<WalletResponse>,
    pub total: usize,
}

impl From<Vec<Wallet>> for WalletListResponse {
    fn from(wallets: Vec<Wallet>) -> Self {
        let wallets: Vec<WalletResponse> = wallets.into_iter().map(Into::into).collect();
        Self {
            total: wallets.len(),
            wallets,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletAccessRequest {
    pub access_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WalletAccessResponse {
    pub granted: bool,
}

impl TryFrom<WalletRequest> for WalletFields {
    type Error = validation::ValidationError;

    fn try_from(request: WalletRequest) -> Result<Self, Self::Error> {
        Ok(WalletFields {
            name: Name::parse("name", &request.name)?.into_inner(),
            description: description(request.description.as_deref())?,
            access_secret: request
                .access_secret
                .as_deref()
                .map(Secret::parse)
                .transpose()?
                .map(Secret::into_inner),
        })
    }
}

#[utoipa::path(
    get,
    path = "/v1/users/{account_id}/wallets",
    tag = "Wallets",
    security(("bearer_auth" = [])),
    params(("account_id" = String, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "Wallets of the account", body = WalletListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_wallets(
    Auth(session): Auth,
    State(state): State<AppState>,
) -> Result<Json<WalletListResponse>, ApiError> {
    let wallets = state.interactor.list_wallets(&session)?;
    Ok(Json(wallets.into()))
}

/// Create a batch of wallets in one transaction.
#[utoipa::path(
    post,
    path = "/v1/users/{account_id}/wallets",
    tag = "Wallets",
    security(("bearer_auth" = [])),
    params(("account_id" = String, Path, description = "Account identifier")),
    request_body = CreateWalletsRequest,
    responses(
        (status = 201, description = "Wallets created in submission order", body = WalletListResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn create_wallets(
    Auth(session): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateWalletsRequest>,
) -> Result<(StatusCode, Json<WalletListResponse>), ApiError> {
    let fields = validation::batch(request.wallets, WalletFields::try_from)?;
    let wallets = state.interactor.create_wallets(&session, fields)?;
    Ok((StatusCode::CREATED, Json(wallets.into())))
}

#[utoipa::path(
    get,
    path = "/v1/users/{account_id}/wallets/{wallet_id}",
    tag = "Wallets",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = String, Path, description = "Account identifier"),
        ("wallet_id" = String, Path, description = "Wallet identifier")
    ),
    responses(
        (status = 200, description = "Wallet", body = WalletResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Wallet not found")
    )
)]
pub async fn get_wallet(
    Auth(session): Auth,
    Path(path): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<WalletResponse>, ApiError> {
    let (_, wallet_id) = path;
    let wallet_id = RecordId::parse("wallet_id", &wallet_id)?;
    let wallet = state.interactor.get_wallet(&session, wallet_id.as_str())?;
    Ok(Json(wallet.into()))
}

#[utoipa::path(
    put,
    path = "/v1/users/{account_id}/wallets/{wallet_id}",
    tag = "Wallets",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = String, Path, description = "Account identifier"),
        ("wallet_id" = String, Path, description = "Wallet identifier")
    ),
    request_body = WalletRequest,
    responses(
        (status = 200, description = "Wallet updated", body = WalletResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Wallet not found")
    )
)]
pub async fn update_wallet(
    Auth(session): Auth,
    Path(path): Path<(String, String)>,
    State(state): State<AppState>,
    Json(request): Json<WalletRequest>,
) -> Result<Json<WalletResponse>, ApiError> {
    let (_, wallet_id) = path;
    let wallet_id = RecordId::parse("wallet_id", &wallet_id)?;
    let fields = WalletFields::try_from(request)?;
    let wallet = state
        .interactor
        .update_wallet(&session, wallet_id.as_str(), fields)?;
    Ok(Json(wallet.into()))
}

/// Delete a wallet and its transactions.
#[utoipa::path(
    delete,
    path = "/v1/users/{account_id}/wallets/{wallet_id}",
    tag = "Wallets",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = String, Path, description = "Account identifier"),
        ("wallet_id" = String, Path, description = "Wallet identifier")
    ),
    responses(
        (status = 204, description = "Wallet deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Wallet not found")
    )
)]
pub async fn delete_wallet(
    Auth(session): Auth,
    Path(path): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let (_, wallet_id) = path;
    let wallet_id = RecordId::parse("wallet_id", &wallet_id)?;
    state.interactor.delete_wallet(&session, wallet_id.as_str())?;
    Ok(StatusCode::NO_CONTENT)
}

/// Check a wallet's access secret. Wallets without one always grant access.
#[utoipa::path(
    post,
    path = "/v1/users/{account_id}/wallets/{wallet_id}/access",
    tag = "Wallets",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = String, Path, description = "Account identifier"),
        ("wallet_id" = String, Path, description = "Wallet identifier")
    ),
    request_body = WalletAccessRequest,
    responses(
        (status = 200, description = "Whether the secret matches", body = WalletAccessResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Wallet not found")
    )
)]
pub async fn verify_wallet_access(
    Auth(session): Auth,
    Path(path): Path<(String, String)>,
    State(state): State<AppState>,
    Json(request): Json<WalletAccessRequest>,
) -> Result<Json<WalletAccessResponse>, ApiError> {
    let (_, wallet_id) = path;
    let wallet_id = RecordId::parse("wallet_id", &wallet_id)?;
    let granted = state.interactor.verify_wallet_access(
        &session,
        wallet_id.as_str(),
        &request.access_secret,
    )?;
    Ok(Json(WalletAccessResponse { granted }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{body_json, send, test_app};
    use axum::http::Method;
    use serde_json::json;

    #[tokio::test]
    async fn batch_create_keeps_submission_order() {
        let test = test_app(false);
        let (account_id, token) = test.sign_up("ada@example.com").await;
        let uri = format!("/v1/users/{account_id}/wallets");

        let (status, body) = send(
            &test.app,
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({"wallets": [{"name": "Cash"}, {"name": "Bank"}, {"name": "Card"}]})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let body = body_json(&body);
        assert_eq!(body["total"], 3);
        let names: Vec<&str> = body["wallets"]
            .as_array()
            .unwrap()
            .iter()
            .map(|w| w["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["Cash", "Bank", "Card"]);

        let (status, body) = send(&test.app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body_json(&body)["total"], 3);
    }

    #[tokio::test]
    async fn one_bad_item_rejects_the_batch() {
        let test = test_app(false);
        let (account_id, token) = test.sign_up("ada@example.com").await;
        let uri = format!("/v1/users/{account_id}/wallets");

        let (status, _) = send(
            &test.app,
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({"wallets": [{"name": "Cash"}, {"name": "  "}]})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, body) = send(&test.app, Method::GET, &uri, Some(&token), None).await;
        assert_eq!(body_json(&body)["total"], 0);
    }

    #[tokio::test]
    async fn update_and_access_check() {
        let test = test_app(false);
        let (account_id, token) = test.sign_up("ada@example.com").await;
        let wallet_id = test.create_wallet(&account_id, &token, "Cash").await;
        let uri = format!("/v1/users/{account_id}/wallets/{wallet_id}");

        let (status, body) = send(
            &test.app,
            Method::PUT,
            &uri,
            Some(&token),
            Some(json!({"name": "Savings", "access_secret": "piggy bank key"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body = body_json(&body);
        assert_eq!(body["name"], "Savings");
        assert_eq!(body["protected"], true);
        assert!(body.get("access_credential").is_none());

        let access = format!("{uri}/access");
        let (_, body) = send(
            &test.app,
            Method::POST,
            &access,
            Some(&token),
            Some(json!({"access_secret": "piggy bank key"})),
        )
        .await;
        assert_eq!(body_json(&body)["granted"], true);

        let (_, body) = send(
            &test.app,
            Method::POST,
            &access,
            Some(&token),
            Some(json!({"access_secret": "wrong key!"})),
        )
        .await;
        assert_eq!(body_json(&body)["granted"], false);
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids() {
        let test = test_app(false);
        let (account_id, token) = test.sign_up("ada@example.com").await;

        let missing = format!("/v1/users/{account_id}/wallets/{}", uuid::Uuid::new_v4());
        let (status, body) = send(&test.app, Method::GET, &missing, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body_json(&body)["error_code"], "not_found");

        let malformed = format!("/v1/users/{account_id}/wallets/not-a-uuid");
        let (status, _) = send(&test.app, Method::DELETE, &malformed, Some(&token), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn wallets_of_other_accounts_are_invisible() {
        let test = test_app(false);
        let (ada, ada_token) = test.sign_up("ada@example.com").await;
        let (bob, bob_token) = test.sign_up("bob@example.com").await;
        let wallet_id = test.create_wallet(&ada, &ada_token, "Cash").await;

        let uri = format!("/v1/users/{bob}/wallets/{wallet_id}");
        let (status, _) = send(&test.app, Method::GET, &uri, Some(&bob_token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
