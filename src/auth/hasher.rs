// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Keyed credential derivation.
//!
//! Passwords, wallet access secrets and session seeds are never stored.
//! What is stored is `base64url(HMAC-SHA-256(server_key, secret))`, which is
//! deterministic for a given key and cannot be reversed without the key.

use base64ct::{Base64UrlUnpadded, Encoding};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::models::Credential;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, thiserror::Error)]
pub enum HasherError {
    #[error("credential key must not be empty")]
    EmptyKey,
    #[error("credential key rejected: {0}")]
    InvalidKey(String),
}

/// Derives and checks credentials with a server-side key.
#[derive(Clone)]
pub struct CredentialHasher {
    mac: HmacSha256,
}

impl CredentialHasher {
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self, HasherError> {
        let key = key.as_ref();
        if key.is_empty() {
            return Err(HasherError::EmptyKey);
        }
        let mac =
            HmacSha256::new_from_slice(key).map_err(|e| HasherError::InvalidKey(e.to_string()))?;
        Ok(Self { mac })
    }

    pub fn derive(&self, secret: &str) -> Credential {
        let mut mac = self.mac.clone();
        mac.update(secret.as_bytes());
        Credential::new(Base64UrlUnpadded::encode_string(&mac.finalize().into_bytes()))
    }

    /// Constant-time check of `secret` against an encoded credential.
    pub fn verify(&self, secret: &str, encoded: &str) -> bool {
        let Ok(expected) = Base64UrlUnpadded::decode_vec(encoded) else {
            return false;
        };
        let mut mac = self.mac.clone();
        mac.update(secret.as_bytes());
        mac.verify_slice(&expected).is_ok()
    }
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CredentialHasher(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_key() {
        assert!(matches!(
            CredentialHasher::new(""),
            Err(HasherError::EmptyKey)
        ));
    }

    #[test]
    fn derivation_is_deterministic_per_key() {
        let hasher = CredentialHasher::new("server-key").unwrap();
        let other = CredentialHasher::new("other-key").unwrap();

        assert_eq!(hasher.derive("hunter22"), hasher.derive("hunter22"));
        assert_ne!(hasher.derive("hunter22"), other.derive("hunter22"));
        assert_ne!(hasher.derive("hunter22").as_str(), "hunter22");
        // 32-byte digest, unpadded url-safe base64
        assert_eq!(hasher.derive("x").as_str().len(), 43);
    }

    #[test]
    fn verify_matches_only_the_original_secret() {
        let hasher = CredentialHasher::new("server-key").unwrap();
        let stored = hasher.derive("correct horse");

        assert!(hasher.verify("correct horse", stored.as_str()));
        assert!(!hasher.verify("correct hors", stored.as_str()));
        assert!(!hasher.verify("correct horse", "not base64 at all!"));
    }

    #[test]
    fn single_bit_flip_fails_verification() {
        let hasher = CredentialHasher::new("server-key").unwrap();
        let stored = hasher.derive("secret-a");

        let mut flipped = b"secret-a".to_vec();
        flipped[7] ^= 0x01;
        let flipped = String::from_utf8(flipped).unwrap();
        assert!(!hasher.verify(&flipped, stored.as_str()));
    }
}
