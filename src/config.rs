// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup and passed into [`crate::state::AppState`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `SUPABASE_URL` | Credential Store base URL | Required |
//! | `SUPABASE_SERVICE_ROLE_KEY` | Elevated (service) credential | Required |
//! | `SUPABASE_ANON_KEY` | Public (anonymous) credential | Required for login bridging |
//! | `UPSTREAM_TIMEOUT_SECS` | Deadline for each Credential Store call | `10` |
//! | `ADMIN_COOKIE_NAME` | Admin marker cookie | `web3_admin_auth` |
//! | `USER_COOKIE_NAME` | Dashboard presence cookie | `web3_user_auth` |
//! | `TLS_CERT_PATH` / `TLS_KEY_PATH` | PEM files; HTTPS when both are set | Unset |
//! | `CORS_ALLOWED_ORIGINS` | Comma-separated cross-origin allow list | Same-origin only |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! `SUPABASE_URL` and `SUPABASE_ANON_KEY` also accept their
//! `NEXT_PUBLIC_`-prefixed names so the service can share an env file with
//! the web front-end.

use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";

/// Credential Store base URL, e.g. `https://abcd1234.supabase.co`.
pub const SUPABASE_URL_ENV: &str = "SUPABASE_URL";
pub const SUPABASE_URL_PUBLIC_ENV: &str = "NEXT_PUBLIC_SUPABASE_URL";

/// Service-role key. Grants admin access to the Credential Store and must
/// never leave the server.
pub const SERVICE_ROLE_KEY_ENV: &str = "SUPABASE_SERVICE_ROLE_KEY";

pub const ANON_KEY_ENV: &str = "SUPABASE_ANON_KEY";
pub const ANON_KEY_PUBLIC_ENV: &str = "NEXT_PUBLIC_SUPABASE_ANON_KEY";

pub const UPSTREAM_TIMEOUT_ENV: &str = "UPSTREAM_TIMEOUT_SECS";
pub const ADMIN_COOKIE_NAME_ENV: &str = "ADMIN_COOKIE_NAME";
pub const USER_COOKIE_NAME_ENV: &str = "USER_COOKIE_NAME";
pub const TLS_CERT_PATH_ENV: &str = "TLS_CERT_PATH";
pub const TLS_KEY_PATH_ENV: &str = "TLS_KEY_PATH";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
pub const CORS_ALLOWED_ORIGINS_ENV: &str = "CORS_ALLOWED_ORIGINS";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_ADMIN_COOKIE_NAME: &str = "web3_admin_auth";
pub const DEFAULT_USER_COOKIE_NAME: &str = "web3_user_auth";

/// Header accepted as an alternative admin proof.
pub const ADMIN_HEADER_NAME: &str = "x-admin-auth";

/// Value the admin header must carry.
pub const ADMIN_SENTINEL: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Missing Supabase configuration: {0}")]
    Missing(String),

    #[error("Invalid Supabase configuration: {0}")]
    Invalid(String),
}

/// Connection settings for the hosted Credential Store.
///
/// The service key and anon key are kept apart so the two credential
/// tiers can never be mixed up by callers.
#[derive(Clone)]
pub struct CredentialStoreConfig {
    pub base_url: Url,
    pub service_role_key: String,
    pub anon_key: Option<String>,
    pub timeout: Duration,
}

impl std::fmt::Debug for CredentialStoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStoreConfig")
            .field("base_url", &self.base_url.as_str())
            .field("service_role_key", &"<redacted>")
            .field("anon_key", &self.anon_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CredentialStoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw_url = env_optional(SUPABASE_URL_ENV)
            .or_else(|| env_optional(SUPABASE_URL_PUBLIC_ENV))
            .ok_or_else(|| ConfigError::Missing(SUPABASE_URL_ENV.to_string()))?;
        let service_role_key = env_required(SERVICE_ROLE_KEY_ENV)?;
        let anon_key = env_optional(ANON_KEY_ENV).or_else(|| env_optional(ANON_KEY_PUBLIC_ENV));
        let timeout = env_optional(UPSTREAM_TIMEOUT_ENV)
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_UPSTREAM_TIMEOUT);

        Self::new(&raw_url, service_role_key, anon_key, timeout)
    }

    pub fn new(
        base_url: &str,
        service_role_key: impl Into<String>,
        anon_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url.trim())
            .map_err(|e| ConfigError::Invalid(format!("{SUPABASE_URL_ENV}: {e}")))?;
        if base_url.host_str().is_none() {
            return Err(ConfigError::Invalid(format!(
                "{SUPABASE_URL_ENV} has no host"
            )));
        }

        Ok(Self {
            base_url,
            service_role_key: service_role_key.into(),
            anon_key,
            timeout,
        })
    }

    /// Project reference used to name session cookies: the first label of
    /// the Credential Store host (`abcd1234` for `abcd1234.supabase.co`).
    pub fn project_ref(&self) -> String {
        self.base_url
            .host_str()
            .and_then(|host| host.split('.').next())
            .unwrap_or_default()
            .to_string()
    }
}

/// Cookie names used by the admin gate and the route gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateSettings {
    pub admin_cookie_name: String,
    pub user_cookie_name: String,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            admin_cookie_name: DEFAULT_ADMIN_COOKIE_NAME.to_string(),
            user_cookie_name: DEFAULT_USER_COOKIE_NAME.to_string(),
        }
    }
}

impl GateSettings {
    pub fn from_env() -> Self {
        Self {
            admin_cookie_name: env_or_default(ADMIN_COOKIE_NAME_ENV, DEFAULT_ADMIN_COOKIE_NAME),
            user_cookie_name: env_or_default(USER_COOKIE_NAME_ENV, DEFAULT_USER_COOKIE_NAME),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn from_env() -> Self {
        match env_optional(LOG_FORMAT_ENV).as_deref() {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

/// Bind address, optional TLS material and cross-origin allow list.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub tls: Option<(String, String)>,
    /// Empty means no cross-origin access at all.
    pub allowed_origins: Vec<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let host = env_or_default(HOST_ENV, DEFAULT_HOST);
        let port = env_optional(PORT_ENV)
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let tls = match (env_optional(TLS_CERT_PATH_ENV), env_optional(TLS_KEY_PATH_ENV)) {
            (Some(cert), Some(key)) => Some((cert, key)),
            _ => None,
        };
        let allowed_origins = env_optional(CORS_ALLOWED_ORIGINS_ENV)
            .map(|raw| parse_origins(&raw))
            .unwrap_or_default();
        Self {
            host,
            port,
            tls,
            allowed_origins,
        }
    }
}

/// Split a comma-separated origin list, dropping blanks, trailing slashes
/// and the `*` wildcard.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty() && *o != "*")
        .map(str::to_string)
        .collect()
}

fn env_required(name: &str) -> Result<String, ConfigError> {
    env_optional(name).ok_or_else(|| ConfigError::Missing(name.to_string()))
}

fn env_optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    env_optional(name).unwrap_or_else(|| default.to_string())
}
