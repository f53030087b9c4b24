// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Admin Impersonation
//!
//! Lets an administrator open the dashboard as another user without going
//! through that user's inbox.
//!
//! ## Flow
//!
//! 1. `initiate` mints a one-time magic link (service key) and hands the
//!    action link back to the admin.
//! 2. `redeem` mints again, then exchanges the token hash for a session with
//!    the anonymous key, exactly as an interactive sign-in would.
//! 3. `write_session` puts that session on the outgoing redirect through a
//!    [`ResponseCookieSink`], so the tokens only ever travel in `Set-Cookie`
//!    headers on the response the browser follows.
//!
//! Every step is sequential; each Credential Store call is bounded by the
//! configured upstream timeout.

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderMap};
use tracing::{info, warn};

use crate::config::{ConfigError, ANON_KEY_ENV};
use crate::credential_store::{
    with_deadline, AdminAuthApi, GenerateLinkParams, LinkKind, PublicAuthApi, Session,
};
use crate::error::AdminError;
use crate::session::{CookieOptions, ResponseCookieSink, SessionCookieStore};
use crate::state::AppState;

pub const DASHBOARD_OVERVIEW_PATH: &str = "/dashboard/overview";
pub const AUTH_CALLBACK_PATH: &str = "/auth/callback?redirect=/dashboard/overview";
pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Lifetime of the dashboard presence marker (7 days), matching what an
/// interactive sign-in sets.
pub const USER_MARKER_MAX_AGE: i64 = 7 * 24 * 60 * 60;

pub const EMAIL_REQUIRED: &str = "Email is required.";
pub const LINK_FAILED: &str = "Failed to generate link.";
pub const OTP_FAILED: &str = "Failed to verify OTP.";

/// Origin used to build redirect URLs: the `Origin` header, else
/// `http://<Host>`, else [`DEFAULT_ORIGIN`].
pub fn request_origin(headers: &HeaderMap) -> String {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty() && *v != "null")
    };

    let origin = match header_value(header::ORIGIN) {
        Some(origin) => origin.to_string(),
        None => match header_value(header::HOST) {
            Some(host) => format!("http://{host}"),
            None => DEFAULT_ORIGIN.to_string(),
        },
    };
    origin.trim_end_matches('/').to_string()
}

/// Trimmed, non-empty email or a validation error.
pub fn require_email(email: Option<&str>) -> Result<String, AdminError> {
    email
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AdminError::Validation(EMAIL_REQUIRED.to_string()))
}

pub struct ImpersonationService {
    admin: Arc<dyn AdminAuthApi>,
    public: Option<Arc<dyn PublicAuthApi>>,
    session_cookies: SessionCookieStore,
    user_cookie_name: String,
    timeout: Duration,
}

impl ImpersonationService {
    /// Build from application state. Fails with a configuration error before
    /// any network activity when the Credential Store is not set up.
    pub fn from_state(state: &AppState) -> Result<Self, AdminError> {
        let clients = state.clients()?;
        Ok(Self {
            admin: clients.admin.clone(),
            public: clients.public.clone(),
            session_cookies: SessionCookieStore::new(&clients.project_ref),
            user_cookie_name: state.gate.user_cookie_name.clone(),
            timeout: state.upstream_timeout,
        })
    }

    /// Bridging additionally needs the anonymous credential.
    pub fn require_bridging(&self) -> Result<&Arc<dyn PublicAuthApi>, AdminError> {
        self.public
            .as_ref()
            .ok_or_else(|| ConfigError::Missing(ANON_KEY_ENV.to_string()).into())
    }

    /// Mint a one-time link that lands on the dashboard overview.
    pub async fn initiate(&self, email: &str, origin: &str) -> Result<String, AdminError> {
        let params = GenerateLinkParams {
            kind: LinkKind::MagicLink,
            email: email.to_string(),
            redirect_to: format!("{origin}{DASHBOARD_OVERVIEW_PATH}"),
        };

        let link = with_deadline(self.timeout, self.admin.generate_link(&params)).await?;
        let action_link = link
            .action_link
            .filter(|l| !l.is_empty())
            .ok_or_else(|| AdminError::Upstream(LINK_FAILED.to_string()))?;

        info!(email = %email, "Minted impersonation link");
        Ok(action_link)
    }

    /// Mint a link for `email` and redeem it server-side.
    pub async fn redeem(&self, email: &str, origin: &str) -> Result<Session, AdminError> {
        let public = self.require_bridging()?;

        let params = GenerateLinkParams {
            kind: LinkKind::MagicLink,
            email: email.to_string(),
            redirect_to: format!("{origin}{AUTH_CALLBACK_PATH}"),
        };
        let link = with_deadline(self.timeout, self.admin.generate_link(&params))
            .await
            .map_err(|e| non_empty_upstream(e.into(), LINK_FAILED))?;
        let token_hash = link
            .hashed_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AdminError::Upstream(LINK_FAILED.to_string()))?;

        let session = with_deadline(
            self.timeout,
            public.verify_otp(&token_hash, LinkKind::MagicLink),
        )
        .await
        .map_err(|e| non_empty_upstream(e.into(), OTP_FAILED))?
        .ok_or_else(|| {
            warn!(email = %email, "OTP redemption returned no session");
            AdminError::Upstream(OTP_FAILED.to_string())
        })?;

        info!(
            email = %email,
            user_id = session.user_id().unwrap_or("unknown"),
            "Redeemed impersonation link"
        );
        Ok(session)
    }

    /// Write `session` onto the response behind `sink`, plus the dashboard
    /// presence marker.
    pub fn write_session(
        &self,
        session: &Session,
        request_headers: &HeaderMap,
        sink: &mut dyn ResponseCookieSink,
    ) -> Result<(), AdminError> {
        self.session_cookies
            .set_session(session, request_headers, sink)
            .map_err(|e| AdminError::Unexpected(e.to_string()))?;

        sink.set(
            &self.user_cookie_name,
            "1",
            &CookieOptions::default().with_max_age(USER_MARKER_MAX_AGE),
        );
        Ok(())
    }
}

fn non_empty_upstream(err: AdminError, fallback: &str) -> AdminError {
    match err {
        AdminError::Upstream(msg) if msg.trim().is_empty() => {
            AdminError::Upstream(fallback.to_string())
        }
        other => other,
    }
}
