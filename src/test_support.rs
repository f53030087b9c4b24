// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential Store doubles shared by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::credential_store::{
    AdminAuthApi, AuthClients, AuthUser, CredentialStoreError, GenerateLinkParams, GeneratedLink,
    LinkKind, PublicAuthApi, Session, UserAttributes,
};
use crate::state::AppState;

pub const TEST_PROJECT_REF: &str = "abcd1234";

#[derive(Default)]
pub struct FakeAdminApi {
    pub generate_calls: AtomicUsize,
    pub list_calls: AtomicUsize,
    pub update_calls: AtomicUsize,
    pub fail_with: Option<CredentialStoreError>,
    pub omit_hashed_token: bool,
    pub delay: Option<Duration>,
    pub last_link_params: Mutex<Option<GenerateLinkParams>>,
    pub last_update: Mutex<Option<(String, UserAttributes)>>,
    pub users: Vec<AuthUser>,
}

impl FakeAdminApi {
    pub fn calls(&self) -> usize {
        self.generate_calls.load(Ordering::SeqCst)
            + self.list_calls.load(Ordering::SeqCst)
            + self.update_calls.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl AdminAuthApi for FakeAdminApi {
    async fn generate_link(
        &self,
        params: &GenerateLinkParams,
    ) -> Result<GeneratedLink, CredentialStoreError> {
        let n = self.generate_calls.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_link_params.lock().unwrap() = Some(params.clone());
        self.pause().await;
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }

        let redirect: String =
            url::form_urlencoded::byte_serialize(params.redirect_to.as_bytes()).collect();
        Ok(GeneratedLink {
            action_link: Some(format!(
                "https://{TEST_PROJECT_REF}.supabase.co/auth/v1/verify?token=tok-{n}&type=magiclink&redirect_to={redirect}"
            )),
            hashed_token: (!self.omit_hashed_token).then(|| format!("hash-{n}")),
            email_otp: Some("123456".to_string()),
            redirect_to: Some(params.redirect_to.clone()),
            verification_type: Some(LinkKind::MagicLink.as_str().to_string()),
        })
    }

    async fn list_users(
        &self,
        _page: u32,
        _per_page: u32,
    ) -> Result<Vec<AuthUser>, CredentialStoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;
        match &self.fail_with {
            Some(err) => Err(err.clone()),
            None => Ok(self.users.clone()),
        }
    }

    async fn update_user(
        &self,
        user_id: &str,
        attributes: &UserAttributes,
    ) -> Result<AuthUser, CredentialStoreError> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_update.lock().unwrap() = Some((user_id.to_string(), attributes.clone()));
        self.pause().await;
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        Ok(test_user(
            user_id,
            attributes.email.as_deref().unwrap_or("user@example.com"),
        ))
    }
}

#[derive(Default)]
pub struct FakePublicApi {
    pub verify_calls: AtomicUsize,
    pub fail_with: Option<CredentialStoreError>,
    pub no_session: bool,
    pub delay: Option<Duration>,
    pub last_token_hash: Mutex<Option<String>>,
}

impl FakePublicApi {
    pub fn calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PublicAuthApi for FakePublicApi {
    async fn verify_otp(
        &self,
        token_hash: &str,
        _kind: LinkKind,
    ) -> Result<Option<Session>, CredentialStoreError> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_token_hash.lock().unwrap() = Some(token_hash.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        if self.no_session {
            return Ok(None);
        }
        Ok(Some(Session {
            access_token: format!("access-{token_hash}"),
            refresh_token: format!("refresh-{token_hash}"),
            token_type: "bearer".to_string(),
            expires_in: 3600,
            expires_at: None,
            user: json!({ "id": "user-1", "email": "user@example.com" }),
        }))
    }
}

pub fn test_user(id: &str, email: &str) -> AuthUser {
    serde_json::from_value(json!({
        "id": id,
        "email": email,
        "created_at": "2026-01-01T00:00:00Z",
        "user_metadata": { "name": "Test User", "country": "NG" },
        "app_metadata": { "providers": ["email"] }
    }))
    .unwrap()
}

/// Configured state backed by the given doubles.
pub fn state_with(admin: Arc<FakeAdminApi>, public: Option<Arc<FakePublicApi>>) -> AppState {
    let public = public.map(|p| p as Arc<dyn PublicAuthApi>);
    AppState::new(AuthClients::new(admin, public, TEST_PROJECT_REF))
}
