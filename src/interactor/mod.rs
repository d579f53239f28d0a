// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Interactor
//!
//! The single place that sequences the record store, the blob store and the
//! session authenticator for each business operation.
//!
//! ## Ordering Rules
//!
//! - Batch creates run in one record-store transaction; ids are assigned in
//!   submission order right before it, and the stored rows are re-read
//! - Image writes hit the record store first, then the blob store; image
//!   deletes do the same. A blob failure after the record changed is
//!   reported as `PartialConsistency` with the image id
//! - Account deletion revokes every session before removing the account
//!
//! Every operation other than registration and login takes the [`Session`]
//! returned by [`Interactor::authorize`]; the session's account scopes all
//! reads and writes.

mod batch;
mod error;
mod images;

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::Span;
use uuid::Uuid;

use crate::auth::{CredentialHasher, SessionAuthenticator};
use crate::models::{Account, AccountFields, Image, Session};
use crate::storage::{RecordKey, RecordStore, Records, StorageError};

pub use error::{ErrorKind, InteractorError, Stage};
pub use images::{ImagePayload, ImageStorage};

pub type InteractorResult<T> = Result<T, InteractorError>;

/// Readiness of both stores.
#[derive(Debug)]
pub struct StoreHealth {
    pub records: Result<(), StorageError>,
    /// `None` when payloads are kept inline.
    pub blobs: Option<Result<(), StorageError>>,
}

impl StoreHealth {
    pub fn is_ready(&self) -> bool {
        self.records.is_ok() && self.blobs.as_ref().is_none_or(Result::is_ok)
    }
}

pub struct Interactor {
    store: Arc<dyn RecordStore>,
    sessions: SessionAuthenticator,
    hasher: CredentialHasher,
    images: ImageStorage,
    span: Span,
}

impl Interactor {
    pub fn new(
        store: Arc<dyn RecordStore>,
        hasher: CredentialHasher,
        session_ttl: Option<Duration>,
        images: ImageStorage,
    ) -> Self {
        let sessions = SessionAuthenticator::new(store.clone(), hasher.clone(), session_ttl);
        Self {
            store,
            sessions,
            hasher,
            images,
            span: Span::none(),
        }
    }

    /// Parent span for every event this interactor records.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn image_storage(&self) -> &ImageStorage {
        &self.images
    }

    pub fn check_stores(&self) -> StoreHealth {
        StoreHealth {
            records: self.store.health_check(),
            blobs: self.images.blob_store().map(|blobs| blobs.health_check()),
        }
    }

    /// Resolve a bearer token presented for `account_id` to its session.
    pub fn authorize(&self, account_id: &str, token: &str) -> InteractorResult<Session> {
        self.sessions
            .validate_bearer(account_id, token)
            .map_err(InteractorError::auth(Stage::SessionCheck))
    }

    // =========================================================================
    // Accounts
    // =========================================================================

    pub fn register(&self, fields: AccountFields, secret: &str) -> InteractorResult<Account> {
        let now = Utc::now();
        let account = Account {
            account_id: Uuid::new_v4().to_string(),
            name: fields.name,
            email: fields.email,
            credential: self.hasher.derive(secret),
            description: fields.description,
            created_at: now,
            updated_at: now,
        };
        let account = self
            .store
            .create(account)
            .map_err(InteractorError::store(Stage::PrimaryWrite))?;
        tracing::info!(parent: &self.span, account_id = %account.account_id, "account registered");
        Ok(account)
    }

    /// Check an email/secret pair and open a session for the account.
    ///
    /// An unknown email and a wrong secret are indistinguishable to the
    /// caller.
    pub fn login(
        &self,
        email: &str,
        secret: &str,
        description: Option<String>,
    ) -> InteractorResult<Session> {
        let account: Account = match self.store.find_unique("email", email) {
            Ok(account) => account,
            Err(StorageError::NotFound(_)) => {
                tracing::warn!(parent: &self.span, "login for unknown email");
                return Err(InteractorError::Unauthorized {
                    stage: Stage::SessionCheck,
                });
            }
            Err(e) => return Err(InteractorError::store(Stage::PrimaryRead)(e)),
        };

        if !self.sessions.authenticate(secret, &account.credential) {
            tracing::warn!(parent: &self.span, account_id = %account.account_id, "login with wrong secret");
            return Err(InteractorError::Unauthorized {
                stage: Stage::SessionCheck,
            });
        }

        self.sessions
            .issue_session(&account.account_id, description)
            .map_err(InteractorError::auth(Stage::SessionIssue))
    }

    pub fn get_account(&self, session: &Session) -> InteractorResult<Account> {
        self.store
            .get(&Account::key_for(&session.account_id))
            .map_err(InteractorError::store(Stage::PrimaryRead))
    }

    /// Replace profile fields; a new secret re-derives the credential.
    pub fn update_account(
        &self,
        session: &Session,
        fields: AccountFields,
        secret: Option<&str>,
    ) -> InteractorResult<Account> {
        let mut account = self.get_account(session)?;
        account.name = fields.name;
        account.email = fields.email;
        account.description = fields.description;
        if let Some(secret) = secret {
            account.credential = self.hasher.derive(secret);
        }
        let account = self
            .store
            .update(account)
            .map_err(InteractorError::store(Stage::PrimaryWrite))?;
        tracing::info!(parent: &self.span, account_id = %account.account_id, "account updated");
        Ok(account)
    }

    /// Delete the account and everything it owns.
    ///
    /// Sessions go first so a half-deleted account never accepts requests.
    /// With offloaded images, blobs are removed last; a blob that cannot be
    /// removed is reported as `PartialConsistency`.
    pub fn delete_account(&self, session: &Session) -> InteractorResult<()> {
        let account_id = session.account_id.as_str();

        let image_ids: Vec<String> = if self.images.is_offloaded() {
            self.store
                .list::<Image>(&RecordKey::new([account_id]))
                .map_err(InteractorError::store(Stage::PrimaryRead))?
                .into_iter()
                .map(|image| image.image_id)
                .collect()
        } else {
            Vec::new()
        };

        self.sessions
            .revoke_all(account_id)
            .map_err(InteractorError::auth(Stage::SessionRevoke))?;
        self.store
            .delete::<Account>(&Account::key_for(account_id))
            .map_err(InteractorError::store(Stage::PrimaryWrite))?;
        tracing::info!(parent: &self.span, account_id = %account_id, "account deleted");

        let mut first_failure = None;
        for image_id in &image_ids {
            if let Err(e) = self.remove_payload(account_id, image_id) {
                first_failure.get_or_insert(e);
            }
        }
        match first_failure {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Sessions
    // =========================================================================

    pub fn logout(&self, session: &Session) -> InteractorResult<()> {
        self.sessions
            .revoke(&session.account_id, &session.token)
            .map_err(InteractorError::auth(Stage::SessionRevoke))
    }

    pub fn logout_all(&self, session: &Session) -> InteractorResult<usize> {
        self.sessions
            .revoke_all(&session.account_id)
            .map_err(InteractorError::auth(Stage::SessionRevoke))
    }

    pub fn list_sessions(&self, session: &Session) -> InteractorResult<Vec<Session>> {
        self.sessions
            .sessions(&session.account_id)
            .map_err(InteractorError::auth(Stage::PrimaryRead))
    }
}
