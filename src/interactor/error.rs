// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Orchestration errors.
//!
//! Every failure carries the [`Stage`] that produced it. Kinds are forwarded
//! unchanged from the component that failed; nothing is retried or guessed.

use std::fmt;

use crate::auth::AuthError;
use crate::storage::StorageError;

/// Sub-operation of a business operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    SessionCheck,
    SessionIssue,
    SessionRevoke,
    /// Read from the record store
    PrimaryRead,
    /// Write to the record store
    PrimaryWrite,
    /// Read from the blob store
    SecondaryRead,
    /// Write to the blob store
    SecondaryWrite,
    /// Delete from the blob store
    SecondaryDelete,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::SessionCheck => "session check",
            Stage::SessionIssue => "session issue",
            Stage::SessionRevoke => "session revoke",
            Stage::PrimaryRead => "record read",
            Stage::PrimaryWrite => "record write",
            Stage::SecondaryRead => "blob read",
            Stage::SecondaryWrite => "blob write",
            Stage::SecondaryDelete => "blob delete",
        };
        f.write_str(name)
    }
}

/// Failure category, independent of where it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    StoreUnavailable,
    Conflict,
    /// The record store was written but the blob store was not brought in line
    PartialConsistency,
    Internal,
}

#[derive(Debug, thiserror::Error)]
pub enum InteractorError {
    #[error("unauthorized")]
    Unauthorized { stage: Stage },

    #[error("{stage} failed: {source}")]
    Store {
        stage: Stage,
        #[source]
        source: StorageError,
    },

    #[error("{stage} failed for {record_id} after the record was saved: {source}")]
    PartialConsistency {
        stage: Stage,
        record_id: String,
        #[source]
        source: StorageError,
    },

    #[error("{stage} failed: {reason}")]
    Internal { stage: Stage, reason: String },
}

impl InteractorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InteractorError::Unauthorized { .. } => ErrorKind::Unauthorized,
            InteractorError::Store { source, .. } => match source {
                StorageError::NotFound(_) => ErrorKind::NotFound,
                StorageError::Conflict(_) => ErrorKind::Conflict,
                StorageError::Unavailable(_) | StorageError::Encoding(_) => {
                    ErrorKind::StoreUnavailable
                }
            },
            InteractorError::PartialConsistency { .. } => ErrorKind::PartialConsistency,
            InteractorError::Internal { .. } => ErrorKind::Internal,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            InteractorError::Unauthorized { stage }
            | InteractorError::Store { stage, .. }
            | InteractorError::PartialConsistency { stage, .. }
            | InteractorError::Internal { stage, .. } => *stage,
        }
    }

    /// `map_err` adapter tagging a storage failure with `stage`.
    pub(crate) fn store(stage: Stage) -> impl FnOnce(StorageError) -> Self {
        move |source| InteractorError::Store { stage, source }
    }

    pub(crate) fn auth(stage: Stage) -> impl FnOnce(AuthError) -> Self {
        move |e| match e {
            AuthError::Store(source) => InteractorError::Store { stage, source },
            AuthError::Entropy => InteractorError::Internal {
                stage,
                reason: AuthError::Entropy.to_string(),
            },
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::InvalidCredentials
            | AuthError::UnknownSession
            | AuthError::SessionExpired => InteractorError::Unauthorized { stage },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_kinds_are_forwarded() {
        let missing = InteractorError::store(Stage::PrimaryRead)(StorageError::NotFound(
            "wallets a1|w1".to_string(),
        ));
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert_eq!(missing.stage(), Stage::PrimaryRead);

        let down = InteractorError::store(Stage::PrimaryWrite)(StorageError::Unavailable(
            "io".to_string(),
        ));
        assert_eq!(down.kind(), ErrorKind::StoreUnavailable);

        let dup = InteractorError::store(Stage::PrimaryWrite)(StorageError::Conflict(
            "dup".to_string(),
        ));
        assert_eq!(dup.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn auth_failures_split_by_cause() {
        let denied = InteractorError::auth(Stage::SessionCheck)(AuthError::UnknownSession);
        assert_eq!(denied.kind(), ErrorKind::Unauthorized);

        let outage = InteractorError::auth(Stage::SessionCheck)(AuthError::Store(
            StorageError::Unavailable("down".to_string()),
        ));
        assert_eq!(outage.kind(), ErrorKind::StoreUnavailable);
        assert_eq!(outage.stage(), Stage::SessionCheck);
    }

    #[test]
    fn partial_consistency_names_the_record() {
        let err = InteractorError::PartialConsistency {
            stage: Stage::SecondaryWrite,
            record_id: "img-1".to_string(),
            source: StorageError::Unavailable("blob store down".to_string()),
        };
        assert_eq!(err.kind(), ErrorKind::PartialConsistency);
        assert!(err.to_string().contains("img-1"));
        assert!(err.to_string().starts_with("blob write"));
    }
}
