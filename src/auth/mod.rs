// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Session-based authentication for the Moneybook API.
//!
//! ## Auth Flow
//!
//! 1. Client logs in with email and password (`POST /v1/sessions`)
//! 2. Server checks the password against the stored credential and issues a
//!    session; the response carries the bearer token
//! 3. Client sends `Authorization: Bearer <token>` on every call under
//!    `/v1/users/{account_id}/...`
//! 4. Server resolves `(account_id, token)` to a live session row
//!
//! ## Security
//!
//! - Secrets are stored only as keyed HMAC-SHA-256 derivations
//! - Credential comparisons are constant time
//! - Login and session failures return one generic message

pub mod error;
pub mod extractor;
pub mod hasher;
pub mod sessions;

pub use error::AuthError;
pub use extractor::Auth;
pub use hasher::{CredentialHasher, HasherError};
pub use sessions::{BearerToken, SessionAuthenticator};
