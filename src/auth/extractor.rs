// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for authenticated sessions.
//!
//! Use the `Auth` extractor in handlers under `/v1/users/{account_id}`:
//!
//! ```rust,ignore
//! async fn my_handler(Auth(session): Auth) -> impl IntoResponse {
//!     // session.account_id matches the path
//! }
//! ```

use axum::{
    extract::{FromRequestParts, RawPathParams},
    http::{header::AUTHORIZATION, request::Parts},
};

use super::{AuthError, BearerToken};
use crate::interactor::InteractorError;
use crate::models::Session;
use crate::state::AppState;
use crate::storage::StorageError;

/// Path parameter naming the account a request acts on.
pub const ACCOUNT_PARAM: &str = "account_id";

/// Extractor for a live session.
///
/// Reads the bearer token from the `Authorization` header and resolves it
/// against the account named in the path. A token issued to another account
/// never matches.
pub struct Auth(pub Session);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingAuthHeader)?
            .to_str()
            .map_err(|_| AuthError::InvalidAuthHeader)?;
        let token = BearerToken::parse(auth_header)?;

        let params = RawPathParams::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthError::UnknownSession)?;
        let account_id = params
            .iter()
            .find(|(name, _)| *name == ACCOUNT_PARAM)
            .map(|(_, value)| value.to_string())
            .ok_or(AuthError::UnknownSession)?;

        let session = state
            .interactor
            .authorize(&account_id, token.as_str())
            .map_err(rejection)?;

        Ok(Auth(session))
    }
}

fn rejection(e: InteractorError) -> AuthError {
    match e {
        InteractorError::Unauthorized { .. } => AuthError::UnknownSession,
        InteractorError::Store { source, .. } => AuthError::Store(source),
        InteractorError::PartialConsistency { source, .. } => AuthError::Store(source),
        InteractorError::Internal { reason, .. } => AuthError::Store(StorageError::Unavailable(reason)),
    }
}
