// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transaction endpoints.
//!
//! Transactions belong to a wallet and point at a category. Batches are
//! recorded against one wallet in a single transaction.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::validation::{self, description, RecordId},
    auth::Auth,
    error::ApiError,
    models::{Transaction, TransactionFields},
    state::AppState,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionRequest {
    pub category_id: String,
    /// Signed decimal amount; negative for spending.
    #[schema(value_type = String, example = "-12.50")]
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    /// Day the money moved (`YYYY-MM-DD`).
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateTransactionsRequest {
    pub transactions: Vec<TransactionRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub transaction_id: String,
    pub account_id: String,
    pub wallet_id: String,
    pub category_id: String,
    #[schema(value_type = String, example = "-12.50")]
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionResponse {
    fn from(tx: Transaction) -> Self {
        Self {
            transaction_id: tx.transaction_id,
            account_id: tx.account_id,
            wallet_id: tx.wallet_id,
            category_id: tx.category_id,
            amount: tx.amount,
            description: tx.description,
            date: tx.date,
            created_at: tx.created_at,
            updated_at: tx.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionListResponse {
    pub transactions: Vec<TransactionResponse>,
    pub total: usize,
}

impl From<Vec<Transaction>> for TransactionListResponse {
    fn from(transactions: Vec<Transaction>) -> Self {
        let transactions: Vec<TransactionResponse> =
            transactions.into_iter().map(Into::into).collect();
        Self {
            total: transactions.len(),
            transactions,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct TransactionQuery {
    /// Only list transactions of this wallet.
    pub wallet_id: Option<String>,
}

impl TryFrom<TransactionRequest> for TransactionFields {
    type Error = validation::ValidationError;

    fn try_from(request: TransactionRequest) -> Result<Self, Self::Error> {
        Ok(TransactionFields {
            category_id: RecordId::parse("category_id", &request.category_id)?.into_inner(),
            amount: request.amount,
            description: description(request.description.as_deref())?,
            date: request.date,
        })
    }
}

#[utoipa::path(
    get,
    path = "/v1/users/{account_id}/transactions",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = String, Path, description = "Account identifier"),
        TransactionQuery
    ),
    responses(
        (status = 200, description = "Transactions, oldest first", body = TransactionListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_transactions(
    Auth(session): Auth,
    Query(query): Query<TransactionQuery>,
    State(state): State<AppState>,
) -> Result<Json<TransactionListResponse>, ApiError> {
    let wallet_id = query
        .wallet_id
        .as_deref()
        .map(|id| RecordId::parse("wallet_id", id))
        .transpose()?;
    let transactions = state
        .interactor
        .list_transactions(&session, wallet_id.as_ref().map(RecordId::as_str))?;
    Ok(Json(transactions.into()))
}

/// Record a batch of transactions against one wallet.
#[utoipa::path(
    post,
    path = "/v1/users/{account_id}/wallets/{wallet_id}/transactions",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = String, Path, description = "Account identifier"),
        ("wallet_id" = String, Path, description = "Wallet identifier")
    ),
    request_body = CreateTransactionsRequest,
    responses(
        (status = 201, description = "Transactions recorded in submission order", body = TransactionListResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Wallet not found"),
        (status = 409, description = "A referenced category does not exist")
    )
)]
pub async fn create_transactions(
    Auth(session): Auth,
    Path(path): Path<(String, String)>,
    State(state): State<AppState>,
    Json(request): Json<CreateTransactionsRequest>,
) -> Result<(StatusCode, Json<TransactionListResponse>), ApiError> {
    let (_, wallet_id) = path;
    let wallet_id = RecordId::parse("wallet_id", &wallet_id)?;
    let fields = validation::batch(request.transactions, TransactionFields::try_from)?;
    let transactions = state
        .interactor
        .create_transactions(&session, wallet_id.as_str(), fields)?;
    Ok((StatusCode::CREATED, Json(transactions.into())))
}

#[utoipa::path(
    get,
    path = "/v1/users/{account_id}/wallets/{wallet_id}/transactions/{transaction_id}",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = String, Path, description = "Account identifier"),
        ("wallet_id" = String, Path, description = "Wallet identifier"),
        ("transaction_id" = String, Path, description = "Transaction identifier")
    ),
    responses(
        (status = 200, description = "Transaction", body = TransactionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn get_transaction(
    Auth(session): Auth,
    Path(path): Path<(String, String, String)>,
    State(state): State<AppState>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let (_, wallet_id, transaction_id) = path;
    let wallet_id = RecordId::parse("wallet_id", &wallet_id)?;
    let transaction_id = RecordId::parse("transaction_id", &transaction_id)?;
    let transaction = state.interactor.get_transaction(
        &session,
        wallet_id.as_str(),
        transaction_id.as_str(),
    )?;
    Ok(Json(transaction.into()))
}

#[utoipa::path(
    put,
    path = "/v1/users/{account_id}/wallets/{wallet_id}/transactions/{transaction_id}",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = String, Path, description = "Account identifier"),
        ("wallet_id" = String, Path, description = "Wallet identifier"),
        ("transaction_id" = String, Path, description = "Transaction identifier")
    ),
    request_body = TransactionRequest,
    responses(
        (status = 200, description = "Transaction updated", body = TransactionResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Transaction not found"),
        (status = 409, description = "The referenced category does not exist")
    )
)]
pub async fn update_transaction(
    Auth(session): Auth,
    Path(path): Path<(String, String, String)>,
    State(state): State<AppState>,
    Json(request): Json<TransactionRequest>,
) -> Result<Json<TransactionResponse>, ApiError> {
    let (_, wallet_id, transaction_id) = path;
    let wallet_id = RecordId::parse("wallet_id", &wallet_id)?;
    let transaction_id = RecordId::parse("transaction_id", &transaction_id)?;
    let fields = TransactionFields::try_from(request)?;
    let transaction = state.interactor.update_transaction(
        &session,
        wallet_id.as_str(),
        transaction_id.as_str(),
        fields,
    )?;
    Ok(Json(transaction.into()))
}

#[utoipa::path(
    delete,
    path = "/v1/users/{account_id}/wallets/{wallet_id}/transactions/{transaction_id}",
    tag = "Transactions",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = String, Path, description = "Account identifier"),
        ("wallet_id" = String, Path, description = "Wallet identifier"),
        ("transaction_id" = String, Path, description = "Transaction identifier")
    ),
    responses(
        (status = 204, description = "Transaction deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Transaction not found")
    )
)]
pub async fn delete_transaction(
    Auth(session): Auth,
    Path(path): Path<(String, String, String)>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let (_, wallet_id, transaction_id) = path;
    let wallet_id = RecordId::parse("wallet_id", &wallet_id)?;
    let transaction_id = RecordId::parse("transaction_id", &transaction_id)?;
    state.interactor.delete_transaction(
        &session,
        wallet_id.as_str(),
        transaction_id.as_str(),
    )?;
    Ok(StatusCode::NO_CONTENT)
}
