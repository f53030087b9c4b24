// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! GoTrue REST client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::{json, Value};
use tracing::debug;
use url::Url;

use super::error::upstream_message;
use super::{
    AdminAuthApi, AuthUser, CredentialStoreError, GenerateLinkParams, GeneratedLink, LinkKind,
    PublicAuthApi, Session, UserAttributes,
};

const AUTH_PREFIX: &str = "/auth/v1";

/// HTTP plumbing shared by both credential tiers. Holds exactly one key.
#[derive(Clone)]
struct GoTrueClient {
    base_url: Url,
    api_key: String,
    http: Client,
}

impl GoTrueClient {
    fn new(
        base_url: Url,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, CredentialStoreError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                CredentialStoreError::Transport(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            base_url,
            api_key,
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.base_url.as_str().trim_end_matches('/'),
            AUTH_PREFIX,
            path
        )
    }

    /// `/admin/users/<id>` with `id` escaped as a single path segment.
    fn user_endpoint(&self, user_id: &str) -> Result<Url, CredentialStoreError> {
        let mut url = Url::parse(&self.endpoint("/admin/users")).map_err(|e| {
            CredentialStoreError::Transport(format!("invalid user endpoint: {e}"))
        })?;
        url.path_segments_mut()
            .map_err(|_| {
                CredentialStoreError::Transport("base URL cannot carry a path".to_string())
            })?
            .push(user_id);
        Ok(url)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.authorize(self.http.request(method, self.endpoint(path)))
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
    }

    async fn send<T: DeserializeOwned>(
        &self,
        label: &str,
        request: RequestBuilder,
    ) -> Result<T, CredentialStoreError> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!(%status, operation = label, "Credential Store rejected request");
            return Err(CredentialStoreError::Rejected(upstream_message(status, &body)));
        }

        response.json().await.map_err(|e| {
            CredentialStoreError::InvalidResponse(format!("{label} invalid JSON: {e}"))
        })
    }
}

/// Service-role client. Only this type can mint links or touch user records.
#[derive(Clone)]
pub struct AdminClient {
    inner: GoTrueClient,
}

impl AdminClient {
    pub fn new(
        base_url: Url,
        service_role_key: String,
        timeout: Duration,
    ) -> Result<Self, CredentialStoreError> {
        Ok(Self {
            inner: GoTrueClient::new(base_url, service_role_key, timeout)?,
        })
    }
}

#[derive(Deserialize)]
struct UserListResponse {
    #[serde(default)]
    users: Vec<AuthUser>,
}

#[async_trait]
impl AdminAuthApi for AdminClient {
    async fn generate_link(
        &self,
        params: &GenerateLinkParams,
    ) -> Result<GeneratedLink, CredentialStoreError> {
        let body = json!({
            "type": params.kind.as_str(),
            "email": params.email,
            "redirect_to": params.redirect_to,
        });
        let request = self
            .inner
            .request(Method::POST, "/admin/generate_link")
            .query(&[("redirect_to", params.redirect_to.as_str())])
            .json(&body);

        self.inner.send("generate_link", request).await
    }

    async fn list_users(
        &self,
        page: u32,
        per_page: u32,
    ) -> Result<Vec<AuthUser>, CredentialStoreError> {
        let request = self
            .inner
            .request(Method::GET, "/admin/users")
            .query(&[("page", page), ("per_page", per_page)]);

        let response: UserListResponse = self.inner.send("list_users", request).await?;
        Ok(response.users)
    }

    async fn update_user(
        &self,
        user_id: &str,
        attributes: &UserAttributes,
    ) -> Result<AuthUser, CredentialStoreError> {
        let url = self.inner.user_endpoint(user_id)?;
        let request = self
            .inner
            .authorize(self.inner.http.request(Method::PUT, url))
            .json(attributes);

        self.inner.send("update_user", request).await
    }
}

/// Anonymous-key client, used the way a browser sign-in would be.
#[derive(Clone)]
pub struct PublicClient {
    inner: GoTrueClient,
}

impl PublicClient {
    pub fn new(
        base_url: Url,
        anon_key: String,
        timeout: Duration,
    ) -> Result<Self, CredentialStoreError> {
        Ok(Self {
            inner: GoTrueClient::new(base_url, anon_key, timeout)?,
        })
    }
}

#[async_trait]
impl PublicAuthApi for PublicClient {
    async fn verify_otp(
        &self,
        token_hash: &str,
        kind: LinkKind,
    ) -> Result<Option<Session>, CredentialStoreError> {
        let request = self
            .inner
            .request(Method::POST, "/verify")
            .json(&json!({
                "token_hash": token_hash,
                "type": kind.as_str(),
            }));

        let body: Value = self.inner.send("verify_otp", request).await?;
        session_from_verify_body(body)
    }
}

/// The verify endpoint answers with a bare session object. A body without an
/// access token means the store accepted the call without signing anyone in.
fn session_from_verify_body(body: Value) -> Result<Option<Session>, CredentialStoreError> {
    let has_token = body
        .get("access_token")
        .and_then(Value::as_str)
        .is_some_and(|t| !t.is_empty());
    if !has_token {
        return Ok(None);
    }

    serde_json::from_value(body)
        .map(Some)
        .map_err(|e| CredentialStoreError::InvalidResponse(format!("verify_otp session: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> GoTrueClient {
        GoTrueClient::new(
            Url::parse(base).unwrap(),
            "key".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn endpoint_joins_auth_prefix() {
        let c = client("https://abcd1234.supabase.co");
        assert_eq!(
            c.endpoint("/admin/generate_link"),
            "https://abcd1234.supabase.co/auth/v1/admin/generate_link"
        );
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let c = client("http://localhost:54321/gateway/");
        assert_eq!(
            c.endpoint("/verify"),
            "http://localhost:54321/gateway/auth/v1/verify"
        );
    }

    #[test]
    fn user_endpoint_escapes_id_as_path_segment() {
        let c = client("https://abcd1234.supabase.co/");
        assert_eq!(
            c.user_endpoint("a b+c/d").unwrap().as_str(),
            "https://abcd1234.supabase.co/auth/v1/admin/users/a%20b+c%2Fd"
        );
        assert_eq!(
            c.user_endpoint("2b3c-uuid").unwrap().as_str(),
            "https://abcd1234.supabase.co/auth/v1/admin/users/2b3c-uuid"
        );
    }

    #[test]
    fn verify_body_without_token_is_no_session() {
        let body = json!({ "user": { "id": "u1" } });
        assert_eq!(session_from_verify_body(body).unwrap(), None);
    }

    #[test]
    fn verify_body_with_token_is_session() {
        let body = json!({
            "access_token": "at",
            "refresh_token": "rt",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1700003600,
            "user": { "id": "u1" }
        });
        let session = session_from_verify_body(body).unwrap().unwrap();
        assert_eq!(session.refresh_token, "rt");
        assert_eq!(session.expires_at, Some(1_700_003_600));
    }

    #[test]
    fn verify_body_with_token_but_no_refresh_is_invalid() {
        let body = json!({ "access_token": "at" });
        assert!(matches!(
            session_from_verify_body(body),
            Err(CredentialStoreError::InvalidResponse(_))
        ));
    }
}
