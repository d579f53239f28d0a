// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session issuance, validation and revocation.
//!
//! ## Session Lifecycle
//!
//! 1. Login: a 32-byte random seed is drawn from the system CSPRNG, the
//!    bearer token is `hasher(seed)`, and `(account_id, seed, token)` is
//!    stored as a session row keyed by `account_id|token`
//! 2. Every request: the row is looked up by `(account_id, token)` in the
//!    store of record; a miss is `Unauthorized`. A hit is re-checked with
//!    the hasher and, when a lifetime is configured, for age
//! 3. Logout removes one row; logout-everywhere removes every row of the
//!    account
//!
//! Nothing is cached, so a revoked session fails on the very next request.

use std::sync::Arc;

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{Duration, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use uuid::Uuid;

use super::{AuthError, CredentialHasher};
use crate::models::{Credential, Session};
use crate::storage::{Record, RecordKey, RecordStore, Records, StorageError};

/// Size of the random session seed in bytes.
const SEED_LEN: usize = 32;

/// A bearer credential taken from an `Authorization` header value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Parse `"<scheme> <token>"`. Only the `Bearer` scheme is accepted.
    pub fn parse(header: &str) -> Result<Self, AuthError> {
        let (scheme, token) = header
            .trim()
            .split_once(' ')
            .ok_or(AuthError::InvalidAuthHeader)?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return Err(AuthError::InvalidAuthHeader);
        }
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::InvalidAuthHeader);
        }
        Ok(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub struct SessionAuthenticator {
    store: Arc<dyn RecordStore>,
    hasher: CredentialHasher,
    ttl: Option<Duration>,
    rng: SystemRandom,
}

impl SessionAuthenticator {
    pub fn new(store: Arc<dyn RecordStore>, hasher: CredentialHasher, ttl: Option<Duration>) -> Self {
        Self {
            store,
            hasher,
            ttl,
            rng: SystemRandom::new(),
        }
    }

    /// Whether `secret` derives to `stored`. A mismatch is an answer, not an
    /// error.
    pub fn authenticate(&self, secret: &str, stored: &Credential) -> bool {
        self.hasher.verify(secret, stored.as_str())
    }

    /// Create and persist a new session for `account_id`.
    ///
    /// A token collision surfaces as a storage conflict; it is not retried.
    pub fn issue_session(
        &self,
        account_id: &str,
        description: Option<String>,
    ) -> Result<Session, AuthError> {
        let mut seed = [0u8; SEED_LEN];
        self.rng.fill(&mut seed).map_err(|_| AuthError::Entropy)?;
        let original = Base64UrlUnpadded::encode_string(&seed);
        let token = self.hasher.derive(&original).as_str().to_string();

        let now = Utc::now();
        let session = Session {
            session_id: Uuid::new_v4().to_string(),
            account_id: account_id.to_string(),
            original,
            token,
            description,
            created_at: now,
            updated_at: now,
        };

        let session = self.store.create(session)?;
        tracing::info!(
            account_id = %account_id,
            session_id = %session.session_id,
            "session issued"
        );
        Ok(session)
    }

    /// Resolve a presented token to the live session it belongs to.
    pub fn validate_bearer(&self, account_id: &str, token: &str) -> Result<Session, AuthError> {
        let session: Session = match self.store.get(&Session::key_for(account_id, token)) {
            Ok(session) => session,
            Err(StorageError::NotFound(_)) => {
                tracing::debug!(account_id = %account_id, "bearer token has no session");
                return Err(AuthError::UnknownSession);
            }
            Err(e) => return Err(AuthError::Store(e)),
        };

        // The row alone is not enough: the token must still derive from the seed
        if !self.hasher.verify(&session.original, token) {
            tracing::warn!(
                account_id = %account_id,
                session_id = %session.session_id,
                "session token does not match its seed"
            );
            return Err(AuthError::UnknownSession);
        }

        if let Some(ttl) = self.ttl {
            if Utc::now() - session.created_at > ttl {
                tracing::debug!(session_id = %session.session_id, "session expired");
                match self.store.delete::<Session>(&session.key()) {
                    Ok(_) | Err(StorageError::NotFound(_)) => {}
                    Err(e) => tracing::warn!(
                        session_id = %session.session_id,
                        error = %e,
                        "failed to remove expired session"
                    ),
                }
                return Err(AuthError::SessionExpired);
            }
        }

        Ok(session)
    }

    /// Remove one session. Unknown sessions are reported as such.
    pub fn revoke(&self, account_id: &str, token: &str) -> Result<(), AuthError> {
        match self.store.delete::<Session>(&Session::key_for(account_id, token)) {
            Ok(session) => {
                tracing::info!(
                    account_id = %account_id,
                    session_id = %session.session_id,
                    "session revoked"
                );
                Ok(())
            }
            Err(StorageError::NotFound(_)) => Err(AuthError::UnknownSession),
            Err(e) => Err(AuthError::Store(e)),
        }
    }

    /// Remove every session of an account. Returns how many were removed.
    pub fn revoke_all(&self, account_id: &str) -> Result<usize, AuthError> {
        let removed = self
            .store
            .delete_scope::<Session>(&RecordKey::new([account_id]))?;
        tracing::info!(account_id = %account_id, removed, "all sessions revoked");
        Ok(removed)
    }

    /// Live sessions of an account, oldest first.
    pub fn sessions(&self, account_id: &str) -> Result<Vec<Session>, AuthError> {
        Ok(self.store.list::<Session>(&RecordKey::new([account_id]))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Account;
    use crate::storage::MemoryStore;

    fn setup(ttl: Option<Duration>) -> (Arc<MemoryStore>, SessionAuthenticator) {
        let store = Arc::new(MemoryStore::new());
        let hasher = CredentialHasher::new("test-key").unwrap();
        for id in ["a1", "a2"] {
            store
                .create(Account {
                    account_id: id.to_string(),
                    name: id.to_string(),
                    email: format!("{id}@example.com"),
                    credential: hasher.derive("password1"),
                    description: String::new(),
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                })
                .unwrap();
        }
        let auth = SessionAuthenticator::new(store.clone(), hasher, ttl);
        (store, auth)
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(BearerToken::parse("Bearer abc").unwrap().as_str(), "abc");
        assert_eq!(BearerToken::parse("bearer  abc ").unwrap().as_str(), "abc");
        assert!(matches!(
            BearerToken::parse("Basic abc"),
            Err(AuthError::InvalidAuthHeader)
        ));
        assert!(BearerToken::parse("Bearer").is_err());
        assert!(BearerToken::parse("Bearer   ").is_err());
    }

    #[test]
    fn authenticate_compares_derived_credentials() {
        let (_, auth) = setup(None);
        let stored = auth.hasher.derive("password1");
        assert!(auth.authenticate("password1", &stored));
        assert!(!auth.authenticate("password2", &stored));
    }

    #[test]
    fn issued_session_validates_with_its_description() {
        let (_, auth) = setup(None);
        let issued = auth
            .issue_session("a1", Some("mobile".to_string()))
            .unwrap();
        assert_ne!(issued.original, issued.token);

        let session = auth.validate_bearer("a1", &issued.token).unwrap();
        assert_eq!(session.session_id, issued.session_id);
        assert_eq!(session.description.as_deref(), Some("mobile"));
    }

    #[test]
    fn token_is_bound_to_its_account() {
        let (_, auth) = setup(None);
        let issued = auth.issue_session("a1", None).unwrap();
        assert!(matches!(
            auth.validate_bearer("a2", &issued.token),
            Err(AuthError::UnknownSession)
        ));
    }

    #[test]
    fn forged_token_is_rejected() {
        let (_, auth) = setup(None);
        auth.issue_session("a1", None).unwrap();
        let forged = auth.hasher.derive("guessed-seed");
        assert!(matches!(
            auth.validate_bearer("a1", forged.as_str()),
            Err(AuthError::UnknownSession)
        ));
    }

    #[test]
    fn revoked_token_stops_validating() {
        let (_, auth) = setup(None);
        let issued = auth.issue_session("a1", None).unwrap();
        auth.revoke("a1", &issued.token).unwrap();

        assert!(matches!(
            auth.validate_bearer("a1", &issued.token),
            Err(AuthError::UnknownSession)
        ));
        assert!(matches!(
            auth.revoke("a1", &issued.token),
            Err(AuthError::UnknownSession)
        ));
    }

    #[test]
    fn revoke_all_only_touches_one_account() {
        let (_, auth) = setup(None);
        let first = auth.issue_session("a1", None).unwrap();
        auth.issue_session("a1", None).unwrap();
        let other = auth.issue_session("a2", None).unwrap();

        assert_eq!(auth.revoke_all("a1").unwrap(), 2);
        assert!(auth.validate_bearer("a1", &first.token).is_err());
        assert!(auth.validate_bearer("a2", &other.token).is_ok());
        assert!(auth.sessions("a1").unwrap().is_empty());
    }

    #[test]
    fn issuing_for_unknown_account_conflicts() {
        let (_, auth) = setup(None);
        assert!(matches!(
            auth.issue_session("ghost", None),
            Err(AuthError::Store(StorageError::Conflict(_)))
        ));
    }

    #[test]
    fn store_outage_is_not_unauthorized() {
        let (store, auth) = setup(None);
        let issued = auth.issue_session("a1", None).unwrap();
        store.set_unavailable(true);

        let err = auth.validate_bearer("a1", &issued.token).unwrap_err();
        assert!(matches!(err, AuthError::Store(StorageError::Unavailable(_))));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn expired_session_is_rejected() {
        let (store, auth) = setup(Some(Duration::zero()));
        let issued = auth.issue_session("a1", None).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert!(matches!(
            auth.validate_bearer("a1", &issued.token),
            Err(AuthError::SessionExpired)
        ));
        assert_eq!(store.row_count(Session::TABLE), 0);
        assert!(matches!(
            auth.validate_bearer("a1", &issued.token),
            Err(AuthError::UnknownSession)
        ));
    }
}
