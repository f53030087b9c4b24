// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Credential Store
//!
//! Client side of the hosted identity provider (a GoTrue-compatible auth
//! API). The application never stores credentials itself; it only asks the
//! store to mint one-time links, redeem them and manage user records.
//!
//! ## Credential tiers
//!
//! | Handle | Key | Operations |
//! |--------|-----|------------|
//! | [`AdminAuthApi`] | service role | mint links, list and update users |
//! | [`PublicAuthApi`] | anonymous | redeem one-time tokens |
//!
//! Minting needs elevated privilege; redemption deliberately uses the public
//! key so the resulting session looks like an ordinary sign-in. The two
//! tiers are separate traits and separate client types so one can never
//! stand in for the other.

pub mod error;
pub mod gotrue;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

pub use error::CredentialStoreError;
pub use gotrue::{AdminClient, PublicClient};

use crate::config::CredentialStoreConfig;

/// Kind of one-time link requested from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkKind {
    #[serde(rename = "magiclink")]
    MagicLink,
}

impl LinkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::MagicLink => "magiclink",
        }
    }
}

/// Parameters for minting a one-time link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateLinkParams {
    pub kind: LinkKind,
    pub email: String,
    /// Where the store sends the browser after the link is followed.
    pub redirect_to: String,
}

/// Result of a mint call. GoTrue returns these properties flattened next to
/// the user record; everything is optional because older servers omit some.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneratedLink {
    #[serde(default)]
    pub action_link: Option<String>,
    #[serde(default)]
    pub hashed_token: Option<String>,
    #[serde(default)]
    pub email_otp: Option<String>,
    #[serde(default)]
    pub redirect_to: Option<String>,
    #[serde(default)]
    pub verification_type: Option<String>,
}

/// A live session: access/refresh token pair bound to one user.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub user: Value,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .field("user_id", &self.user_id())
            .finish()
    }
}

impl Session {
    pub fn user_id(&self) -> Option<&str> {
        self.user.get("id").and_then(Value::as_str)
    }
}

/// User record as returned by the store's admin API.
///
/// Fields this service doesn't interpret are kept in `extra` so they are
/// relayed to the admin UI unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub last_sign_in_at: Option<String>,
    #[serde(default)]
    pub user_metadata: Value,
    #[serde(default)]
    pub app_metadata: Value,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Fields an administrator may change on a user. Absent fields are left
/// untouched by the store.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub user_metadata: Option<Value>,
}

impl std::fmt::Debug for UserAttributes {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserAttributes")
            .field("email", &self.email)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("user_metadata", &self.user_metadata)
            .finish()
    }
}

/// Operations that require the service-role key.
#[async_trait]
pub trait AdminAuthApi: Send + Sync {
    async fn generate_link(
        &self,
        params: &GenerateLinkParams,
    ) -> Result<GeneratedLink, CredentialStoreError>;

    async fn list_users(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<AuthUser>, CredentialStoreError>;

    async fn update_user(
        &self,
        user_id: &str,
        attributes: &UserAttributes,
    ) -> Result<AuthUser, CredentialStoreError>;
}

/// Operations performed with the anonymous key.
#[async_trait]
pub trait PublicAuthApi: Send + Sync {
    /// Redeem a one-time token hash. `Ok(None)` means the store accepted the
    /// call but returned no session.
    async fn verify_otp(
        &self,
        token_hash: &str,
        kind: LinkKind,
    ) -> Result<Option<Session>, CredentialStoreError>;
}

/// Credential Store handles, built once at startup and shared through
/// [`crate::state::AppState`].
#[derive(Clone)]
pub struct AuthClients {
    pub admin: Arc<dyn AdminAuthApi>,
    /// Absent when no anon key is configured; login bridging then fails
    /// with a configuration error.
    pub public: Option<Arc<dyn PublicAuthApi>>,
    /// Names the session cookie (`sb-<project_ref>-auth-token`).
    pub project_ref: String,
}

impl AuthClients {
    pub fn new(
        admin: Arc<dyn AdminAuthApi>,
        public: Option<Arc<dyn PublicAuthApi>>,
        project_ref: impl Into<String>,
    ) -> Self {
        Self {
            admin,
            public,
            project_ref: project_ref.into(),
        }
    }

    pub fn from_config(config: &CredentialStoreConfig) -> Result<Self, CredentialStoreError> {
        let admin = AdminClient::new(
            config.base_url.clone(),
            config.service_role_key.clone(),
            config.timeout,
        )?;
        let public = match &config.anon_key {
            Some(key) => Some(Arc::new(PublicClient::new(
                config.base_url.clone(),
                key.clone(),
                config.timeout,
            )?) as Arc<dyn PublicAuthApi>),
            None => None,
        };

        Ok(Self::new(Arc::new(admin), public, config.project_ref()))
    }
}

/// Bound a Credential Store call by `deadline`, independent of whatever the
/// underlying transport enforces.
pub async fn with_deadline<T, F>(deadline: Duration, call: F) -> Result<T, CredentialStoreError>
where
    F: Future<Output = Result<T, CredentialStoreError>>,
{
    tokio::time::timeout(deadline, call)
        .await
        .map_err(|_| CredentialStoreError::Timeout)?
}
