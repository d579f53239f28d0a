// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed parsers for request fields.
//!
//! Handlers turn raw JSON strings into these types before calling the
//! interactor, so anything past this module is known to be well formed.

use base64ct::{Base64, Encoding};
use unicode_normalization::UnicodeNormalization;
use url::Url;
use uuid::Uuid;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 2000;
pub const MAX_EMAIL_LEN: usize = 254;
pub const MIN_SECRET_LEN: usize = 8;
pub const MAX_BATCH_LEN: usize = 500;
pub const MAX_PAYLOAD_BYTES: usize = 10 * 1024 * 1024;
/// Request body cap for image uploads: base64 of a full payload plus the JSON fields around it.
pub const MAX_IMAGE_BODY_BYTES: usize = MAX_PAYLOAD_BYTES.div_ceil(3) * 4 + 64 * 1024;
const MAX_FORMAT_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} must be a UUID")]
    InvalidId { field: &'static str },

    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("email address is malformed")]
    InvalidEmail,

    #[error("password must be at least {min} characters")]
    WeakSecret { min: usize },

    #[error("url must be an absolute http or https URL")]
    InvalidUrl,

    #[error("image format must be a short alphanumeric name")]
    InvalidFormat,

    #[error("{field} must be standard base64")]
    InvalidPayload { field: &'static str },

    #[error("{field} exceeds {max} bytes")]
    PayloadTooLarge { field: &'static str, max: usize },

    #[error("batch exceeds {max} items")]
    BatchTooLarge { max: usize },
}

/// A UUID identifier in canonical lowercase hyphenated form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordId(String);

impl RecordId {
    pub fn parse(field: &'static str, raw: &str) -> Result<Self, ValidationError> {
        let id = Uuid::parse_str(raw.trim()).map_err(|_| ValidationError::InvalidId { field })?;
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Trimmed, non-empty display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(String);

impl Name {
    pub fn parse(field: &'static str, raw: &str) -> Result<Self, ValidationError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty { field });
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(ValidationError::TooLong {
                field,
                max: MAX_NAME_LEN,
            });
        }
        Ok(Self(name.to_string()))
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Free text that may be empty.
pub fn description(raw: Option<&str>) -> Result<String, ValidationError> {
    let text = raw.unwrap_or_default().trim();
    if text.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(ValidationError::TooLong {
            field: "description",
            max: MAX_DESCRIPTION_LEN,
        });
    }
    Ok(text.to_string())
}

/// Email address normalized to NFKC and lowercase, so lookups and the
/// uniqueness check agree on one spelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email(String);

impl Email {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let email: String = raw.trim().nfkc().collect::<String>().to_lowercase();
        if email.is_empty() {
            return Err(ValidationError::Empty { field: "email" });
        }
        if email.chars().count() > MAX_EMAIL_LEN {
            return Err(ValidationError::TooLong {
                field: "email",
                max: MAX_EMAIL_LEN,
            });
        }
        if email.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidEmail);
        }
        let (local, domain) = email.split_once('@').ok_or(ValidationError::InvalidEmail)?;
        if local.is_empty()
            || domain.contains('@')
            || !domain.contains('.')
            || domain.starts_with('.')
            || domain.ends_with('.')
        {
            return Err(ValidationError::InvalidEmail);
        }
        Ok(Self(email))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Password or access secret. Kept exactly as typed.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        if raw.chars().count() < MIN_SECRET_LEN {
            return Err(ValidationError::WeakSecret {
                min: MIN_SECRET_LEN,
            });
        }
        Ok(Self(raw.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Secret(..)")
    }
}

/// Absolute http(s) URL an image was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrl(Url);

impl SourceUrl {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let url = Url::parse(raw.trim()).map_err(|_| ValidationError::InvalidUrl)?;
        match url.scheme() {
            "http" | "https" => Ok(Self(url)),
            _ => Err(ValidationError::InvalidUrl),
        }
    }

    pub fn into_inner(self) -> String {
        self.0.into()
    }
}

/// Lowercase image format such as `png` or `jpeg`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFormat(String);

impl ImageFormat {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let format = raw.trim().to_ascii_lowercase();
        if format.is_empty()
            || format.len() > MAX_FORMAT_LEN
            || !format.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ValidationError::InvalidFormat);
        }
        Ok(Self(format))
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Decode a standard base64 payload.
pub fn payload(field: &'static str, raw: &str) -> Result<Vec<u8>, ValidationError> {
    let bytes =
        Base64::decode_vec(raw.trim()).map_err(|_| ValidationError::InvalidPayload { field })?;
    if bytes.is_empty() {
        return Err(ValidationError::Empty { field });
    }
    if bytes.len() > MAX_PAYLOAD_BYTES {
        return Err(ValidationError::PayloadTooLarge {
            field,
            max: MAX_PAYLOAD_BYTES,
        });
    }
    Ok(bytes)
}

/// Parse every item of a batch, stopping at the first bad one.
pub fn batch<T, U, F>(items: Vec<T>, parse: F) -> Result<Vec<U>, ValidationError>
where
    F: Fn(T) -> Result<U, ValidationError>,
{
    if items.len() > MAX_BATCH_LEN {
        return Err(ValidationError::BatchTooLarge { max: MAX_BATCH_LEN });
    }
    items.into_iter().map(parse).collect()
}
