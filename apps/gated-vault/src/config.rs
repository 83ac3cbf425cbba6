// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names, default values and the loader used at
//! startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `IPFS_API_URL` | IPFS HTTP API base URL | `https://ipfs.infura.io:5001/api/v0` |
//! | `IPFS_PROJECT_ID` | IPFS project id (basic auth user) | Optional |
//! | `IPFS_PROJECT_SECRET` | IPFS project secret (basic auth password) | Optional |
//! | `IPFS_GATEWAY_URL` | Prefix joined with each locator before encryption | `https://ipfs.infura.io/ipfs/` |
//! | `KEY_NETWORK_URL` | Remote key node; unset runs the in-process custodian | Optional |
//! | `KEY_NETWORK_MASTER_KEY` | Hex 32-byte custodian master key | Random per process |
//! | `CHAIN` | Chain used for auth messages and the default policy | `ethereum` |
//! | `CHAIN_RPC_URL` | RPC endpoint override for balance reads | Network default |
//! | `WALLET_PRIVATE_KEY` | Hex secp256k1 signing key | One of the two required |
//! | `WALLET_PRIVATE_KEY_PATH` | PEM file holding the signing key | One of the two required |
//! | `POLICY_PATH` | JSON access policy file | Default balance gate |
//! | `AUTH_SIG_TTL_SECS` | Validity of each auth assertion, 1 to 604800 | `300` |
//! | `REQUEST_TIMEOUT_SECS` | Timeout for outbound HTTP calls | `15` |
//! | `CONTENT_CACHE_CAPACITY` | Fetched content LRU entries | `64` |
//! | `MAX_UPLOAD_BYTES` | Largest accepted upload | `10485760` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::storage::ipfs::DEFAULT_IPFS_API_URL;
use crate::storage::IpfsCredentials;
use crate::vault::DEFAULT_GATEWAY_PREFIX;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const IPFS_API_URL_ENV: &str = "IPFS_API_URL";
pub const IPFS_PROJECT_ID_ENV: &str = "IPFS_PROJECT_ID";
pub const IPFS_PROJECT_SECRET_ENV: &str = "IPFS_PROJECT_SECRET";
pub const IPFS_GATEWAY_URL_ENV: &str = "IPFS_GATEWAY_URL";
pub const KEY_NETWORK_URL_ENV: &str = "KEY_NETWORK_URL";
pub const KEY_NETWORK_MASTER_KEY_ENV: &str = "KEY_NETWORK_MASTER_KEY";
pub const CHAIN_ENV: &str = "CHAIN";
pub const CHAIN_RPC_URL_ENV: &str = "CHAIN_RPC_URL";
pub const WALLET_PRIVATE_KEY_ENV: &str = "WALLET_PRIVATE_KEY";
pub const WALLET_PRIVATE_KEY_PATH_ENV: &str = "WALLET_PRIVATE_KEY_PATH";
pub const POLICY_PATH_ENV: &str = "POLICY_PATH";
pub const AUTH_SIG_TTL_SECS_ENV: &str = "AUTH_SIG_TTL_SECS";
pub const REQUEST_TIMEOUT_SECS_ENV: &str = "REQUEST_TIMEOUT_SECS";
pub const CONTENT_CACHE_CAPACITY_ENV: &str = "CONTENT_CACHE_CAPACITY";
pub const MAX_UPLOAD_BYTES_ENV: &str = "MAX_UPLOAD_BYTES";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CHAIN: &str = "ethereum";
pub const DEFAULT_AUTH_SIG_TTL_SECS: u64 = 300;
/// Upper bound for `AUTH_SIG_TTL_SECS` (one week).
pub const MAX_AUTH_SIG_TTL_SECS: u64 = 7 * 24 * 60 * 60;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_CONTENT_CACHE_CAPACITY: usize = 64;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required setting: {0}")]
    Missing(String),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(format!("expected json or pretty, got {other}")),
        }
    }
}

/// Where the auth signer's key comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum WalletKeySource {
    Hex(String),
    PemFile(PathBuf),
}

impl std::fmt::Debug for WalletKeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletKeySource::Hex(_) => f.write_str("Hex(..)"),
            WalletKeySource::PemFile(path) => f.debug_tuple("PemFile").field(path).finish(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub ipfs_api_url: String,
    pub ipfs_credentials: Option<IpfsCredentials>,
    pub ipfs_gateway_url: String,
    pub key_network_url: Option<String>,
    pub key_network_master_key: Option<String>,
    pub chain: String,
    pub chain_rpc_url: Option<String>,
    pub wallet_key: WalletKeySource,
    pub policy_path: Option<PathBuf>,
    pub auth_sig_ttl: Duration,
    pub request_timeout: Duration,
    pub content_cache_capacity: usize,
    pub max_upload_bytes: usize,
    pub log_format: LogFormat,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let ipfs_credentials = match (get(IPFS_PROJECT_ID_ENV), get(IPFS_PROJECT_SECRET_ENV)) {
            (Some(project_id), Some(project_secret)) => Some(IpfsCredentials {
                project_id,
                project_secret,
            }),
            (None, None) => None,
            _ => {
                return Err(ConfigError::Invalid {
                    name: IPFS_PROJECT_ID_ENV.to_string(),
                    reason: format!("{IPFS_PROJECT_ID_ENV} and {IPFS_PROJECT_SECRET_ENV} must be set together"),
                })
            }
        };

        let wallet_key = match (get(WALLET_PRIVATE_KEY_ENV), get(WALLET_PRIVATE_KEY_PATH_ENV)) {
            (Some(hex), _) => WalletKeySource::Hex(hex),
            (None, Some(path)) => WalletKeySource::PemFile(PathBuf::from(path)),
            (None, None) => {
                return Err(ConfigError::Missing(format!(
                    "{WALLET_PRIVATE_KEY_ENV} or {WALLET_PRIVATE_KEY_PATH_ENV}"
                )))
            }
        };

        let auth_sig_ttl_secs = parse_or(
            get(AUTH_SIG_TTL_SECS_ENV),
            AUTH_SIG_TTL_SECS_ENV,
            DEFAULT_AUTH_SIG_TTL_SECS,
        )?;
        if !(1..=MAX_AUTH_SIG_TTL_SECS).contains(&auth_sig_ttl_secs) {
            return Err(ConfigError::Invalid {
                name: AUTH_SIG_TTL_SECS_ENV.to_string(),
                reason: format!("must be between 1 and {MAX_AUTH_SIG_TTL_SECS}"),
            });
        }

        Ok(Self {
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(get(PORT_ENV), PORT_ENV, DEFAULT_PORT)?,
            ipfs_api_url: get(IPFS_API_URL_ENV).unwrap_or_else(|| DEFAULT_IPFS_API_URL.to_string()),
            ipfs_credentials,
            ipfs_gateway_url: get(IPFS_GATEWAY_URL_ENV)
                .unwrap_or_else(|| DEFAULT_GATEWAY_PREFIX.to_string()),
            key_network_url: get(KEY_NETWORK_URL_ENV),
            key_network_master_key: get(KEY_NETWORK_MASTER_KEY_ENV),
            chain: get(CHAIN_ENV).unwrap_or_else(|| DEFAULT_CHAIN.to_string()),
            chain_rpc_url: get(CHAIN_RPC_URL_ENV),
            wallet_key,
            policy_path: get(POLICY_PATH_ENV).map(PathBuf::from),
            auth_sig_ttl: Duration::from_secs(auth_sig_ttl_secs),
            request_timeout: Duration::from_secs(parse_or(
                get(REQUEST_TIMEOUT_SECS_ENV),
                REQUEST_TIMEOUT_SECS_ENV,
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            content_cache_capacity: parse_or(
                get(CONTENT_CACHE_CAPACITY_ENV),
                CONTENT_CACHE_CAPACITY_ENV,
                DEFAULT_CONTENT_CACHE_CAPACITY,
            )?,
            max_upload_bytes: parse_or(
                get(MAX_UPLOAD_BYTES_ENV),
                MAX_UPLOAD_BYTES_ENV,
                DEFAULT_MAX_UPLOAD_BYTES,
            )?,
            log_format: parse_or(get(LOG_FORMAT_ENV), LOG_FORMAT_ENV, LogFormat::default())?,
        })
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                name: HOST_ENV.to_string(),
                reason: e.to_string(),
            })
    }
}

fn parse_or<T>(raw: Option<String>, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name: name.to_string(),
            reason: e.to_string(),
        }),
    }
}
