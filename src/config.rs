// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Configuration is read from the environment once at startup and handed to
//! each component through its constructor.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Root for the record database and default blob directory | `./data` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `BLOB_STORAGE_ENABLED` | Mirror image payloads to the blob store | `false` |
//! | `BLOB_DIR` | Blob store root | `$DATA_DIR/blobs` |
//! | `CREDENTIAL_KEY` | Server-side key for credential derivation | Required |
//! | `SESSION_TTL_SECS` | Session lifetime in seconds | Unset (no expiry) |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::fmt;
use std::path::PathBuf;

use chrono::Duration;

use crate::storage::paths::{StoragePaths, DATA_ROOT};

/// Root directory for the record database and default blob directory.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

pub const HOST_ENV: &str = "HOST";

pub const PORT_ENV: &str = "PORT";

/// `true`/`false`; selects offloaded image storage.
pub const BLOB_STORAGE_ENABLED_ENV: &str = "BLOB_STORAGE_ENABLED";

pub const BLOB_DIR_ENV: &str = "BLOB_DIR";

/// Key for the credential hasher. Changing it invalidates every stored
/// password, wallet secret and session.
pub const CREDENTIAL_KEY_ENV: &str = "CREDENTIAL_KEY";

pub const SESSION_TTL_SECS_ENV: &str = "SESSION_TTL_SECS";

pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    /// Unknown values fall back to `Pretty`.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }

    pub fn from_env() -> Self {
        Self::parse(std::env::var(LOG_FORMAT_ENV).ok().as_deref())
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub blob_storage_enabled: bool,
    pub blob_dir: PathBuf,
    pub credential_key: String,
    pub session_ttl: Option<Duration>,
    pub log_format: LogFormat,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("data_dir", &self.data_dir)
            .field("blob_storage_enabled", &self.blob_storage_enabled)
            .field("blob_dir", &self.blob_dir)
            .field("credential_key", &"<redacted>")
            .field("session_ttl", &self.session_ttl)
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl AppConfig {
    /// Build the configuration from any variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let data_dir = PathBuf::from(var(DATA_DIR_ENV).unwrap_or_else(|| DATA_ROOT.to_string()));
        let paths = StoragePaths::new(&data_dir);

        let port = match var(PORT_ENV) {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
                name: PORT_ENV,
                value,
                reason: "expected a port number",
            })?,
            None => DEFAULT_PORT,
        };

        let blob_storage_enabled = match var(BLOB_STORAGE_ENABLED_ENV) {
            Some(value) => parse_bool(&value).ok_or(ConfigError::Invalid {
                name: BLOB_STORAGE_ENABLED_ENV,
                value,
                reason: "expected true or false",
            })?,
            None => false,
        };

        let session_ttl = match var(SESSION_TTL_SECS_ENV) {
            Some(value) => match value.trim().parse::<i64>() {
                Ok(secs) if secs > 0 => Some(Duration::seconds(secs)),
                _ => {
                    return Err(ConfigError::Invalid {
                        name: SESSION_TTL_SECS_ENV,
                        value,
                        reason: "expected a positive number of seconds",
                    })
                }
            },
            None => None,
        };

        Ok(Self {
            host: var(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            blob_dir: var(BLOB_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| paths.blobs_dir()),
            data_dir,
            blob_storage_enabled,
            credential_key: var(CREDENTIAL_KEY_ENV).ok_or(ConfigError::Missing(CREDENTIAL_KEY_ENV))?,
            session_ttl,
            log_format: LogFormat::parse(var(LOG_FORMAT_ENV).as_deref()),
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn storage_paths(&self) -> StoragePaths {
        StoragePaths::new(&self.data_dir)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
