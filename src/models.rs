// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Domain entities and the inputs used to create or change them.
//!
//! Entities are what the record store holds. Identifiers are UUID v4 strings
//! assigned at creation and never changed; the owning account is part of
//! every storage key.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::storage::{Record, RecordKey, Reference};

macro_rules! timestamped {
    () => {
        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }

        fn set_timestamps(&mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) {
            self.created_at = created_at;
            self.updated_at = updated_at;
        }
    };
}

/// Output of the credential hasher. Never the secret itself.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(encoded: String) -> Self {
        Self(encoded)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(..)")
    }
}

// =============================================================================
// Account
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub account_id: String,
    pub name: String,
    /// Normalized (NFKC, lowercase); unique across accounts.
    pub email: String,
    pub credential: Credential,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn key_for(account_id: &str) -> RecordKey {
        RecordKey::new([account_id])
    }
}

impl Record for Account {
    const TABLE: &'static str = "accounts";
    const CASCADE: &'static [&'static str] = &[
        Session::TABLE,
        Wallet::TABLE,
        Category::TABLE,
        Image::TABLE,
        Transaction::TABLE,
    ];

    fn key(&self) -> RecordKey {
        Self::key_for(&self.account_id)
    }

    fn unique_values(&self) -> Vec<(&'static str, String)> {
        vec![("email", self.email.clone())]
    }

    timestamped!();
}

/// Profile fields supplied on registration and on edit.
#[derive(Debug, Clone)]
pub struct AccountFields {
    pub name: String,
    pub email: String,
    pub description: String,
}

// =============================================================================
// Session
// =============================================================================

/// A live login. Looked up by `(account_id, token)` on every request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub account_id: String,
    /// Random secret the bearer token was derived from.
    pub original: String,
    pub token: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn key_for(account_id: &str, token: &str) -> RecordKey {
        RecordKey::new([account_id, token])
    }
}

impl Record for Session {
    const TABLE: &'static str = "sessions";

    fn key(&self) -> RecordKey {
        Self::key_for(&self.account_id, &self.token)
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference {
            table: Account::TABLE,
            key: Account::key_for(&self.account_id),
        }]
    }

    timestamped!();
}

// =============================================================================
// Wallet
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wallet {
    pub wallet_id: String,
    pub account_id: String,
    pub name: String,
    pub description: String,
    /// Derived form of the wallet's access secret, when one was set.
    #[serde(default)]
    pub access_credential: Option<Credential>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn key_for(account_id: &str, wallet_id: &str) -> RecordKey {
        RecordKey::new([account_id, wallet_id])
    }
}

impl Record for Wallet {
    const TABLE: &'static str = "wallets";
    const CASCADE: &'static [&'static str] = &[Transaction::TABLE];

    fn key(&self) -> RecordKey {
        Self::key_for(&self.account_id, &self.wallet_id)
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference {
            table: Account::TABLE,
            key: Account::key_for(&self.account_id),
        }]
    }

    timestamped!();
}

#[derive(Debug, Clone)]
pub struct WalletFields {
    pub name: String,
    pub description: String,
    pub access_secret: Option<String>,
}

// =============================================================================
// Category
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub category_id: String,
    pub account_id: String,
    pub image_id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn key_for(account_id: &str, category_id: &str) -> RecordKey {
        RecordKey::new([account_id, category_id])
    }
}

impl Record for Category {
    const TABLE: &'static str = "categories";

    fn key(&self) -> RecordKey {
        Self::key_for(&self.account_id, &self.category_id)
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference {
                table: Account::TABLE,
                key: Account::key_for(&self.account_id),
            },
            Reference {
                table: Image::TABLE,
                key: Image::key_for(&self.account_id, &self.image_id),
            },
        ]
    }

    timestamped!();
}

#[derive(Debug, Clone)]
pub struct CategoryFields {
    pub image_id: String,
    pub name: String,
    pub description: String,
}

// =============================================================================
// Image
// =============================================================================

/// Receipt or icon image. The payload is always kept in the row; it is also
/// pushed to the blob store when offloading is enabled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub image_id: String,
    pub account_id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub url: Option<String>,
    pub file_name: String,
    pub format: String,
    #[serde(with = "payload")]
    pub raw_image: Vec<u8>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Image {
    pub fn key_for(account_id: &str, image_id: &str) -> RecordKey {
        RecordKey::new([account_id, image_id])
    }
}

impl Record for Image {
    const TABLE: &'static str = "images";

    fn key(&self) -> RecordKey {
        Self::key_for(&self.account_id, &self.image_id)
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference {
            table: Account::TABLE,
            key: Account::key_for(&self.account_id),
        }]
    }

    timestamped!();
}

#[derive(Debug, Clone)]
pub struct ImageFields {
    pub name: String,
    pub description: String,
    pub url: Option<String>,
    pub file_name: String,
    pub format: String,
    pub raw_image: Vec<u8>,
}

/// Image payload bytes as stored in JSON rows (standard base64).
mod payload {
    use base64ct::{Base64, Encoding};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&Base64::encode_string(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Base64::decode_vec(&encoded).map_err(D::Error::custom)
    }
}

// =============================================================================
// Transaction
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_id: String,
    pub account_id: String,
    pub wallet_id: String,
    pub category_id: String,
    /// Signed; negative amounts are spending.
    pub amount: Decimal,
    pub description: String,
    /// Calendar day the money moved, independent of record timestamps.
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn key_for(account_id: &str, wallet_id: &str, transaction_id: &str) -> RecordKey {
        RecordKey::new([account_id, wallet_id, transaction_id])
    }
}

impl Record for Transaction {
    const TABLE: &'static str = "transactions";

    fn key(&self) -> RecordKey {
        Self::key_for(&self.account_id, &self.wallet_id, &self.transaction_id)
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference {
                table: Wallet::TABLE,
                key: Wallet::key_for(&self.account_id, &self.wallet_id),
            },
            Reference {
                table: Category::TABLE,
                key: Category::key_for(&self.account_id, &self.category_id),
            },
        ]
    }

    timestamped!();
}

#[derive(Debug, Clone)]
pub struct TransactionFields {
    pub category_id: String,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
}

/// Every table the record store must provide.
pub const TABLES: &[&str] = &[
    Account::TABLE,
    Session::TABLE,
    Wallet::TABLE,
    Category::TABLE,
    Image::TABLE,
    Transaction::TABLE,
    crate::storage::UNIQUE_INDEX,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_debug_is_redacted() {
        let credential = Credential::new("secret-derived".to_string());
        assert_eq!(format!("{credential:?}"), "Credential(..)");
    }

    #[test]
    fn image_payload_is_base64_in_rows() {
        let image = Image {
            image_id: "i1".to_string(),
            account_id: "a1".to_string(),
            name: "receipt".to_string(),
            description: String::new(),
            url: None,
            file_name: "r.jpg".to_string(),
            format: "jpeg".to_string(),
            raw_image: vec![0xFF, 0xD8, 0xFF],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&image).unwrap();
        assert_eq!(json["raw_image"], "/9j/");

        let back: Image = serde_json::from_value(json).unwrap();
        assert_eq!(back.raw_image, vec![0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn transaction_key_nests_under_wallet() {
        let wallet_scope = Wallet::key_for("a1", "w1").scope();
        let key = Transaction::key_for("a1", "w1", "t1");
        assert!(key.as_str().starts_with(&wallet_scope));
    }
}
