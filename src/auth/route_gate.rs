// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Navigation gate for the admin and dashboard page trees.
//!
//! This only checks that the expected cookie is present. It keeps signed-out
//! browsers away from pages that would fail anyway; the real check is the
//! [`super::AdminGate`] extractor on every privileged endpoint.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tracing::debug;

use crate::session::request_cookie;
use crate::state::AppState;

pub const ADMIN_PREFIX: &str = "/admin";
pub const ADMIN_LOGIN_PATH: &str = "/admin/login";
pub const DASHBOARD_PREFIX: &str = "/dashboard";
pub const SIGNIN_PATH: &str = "/signin";

fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

fn cookie_present(headers: &HeaderMap, name: &str) -> bool {
    request_cookie(headers, name).is_some_and(|v| !v.is_empty())
}

/// Where a browser without the right cookie is sent, or `None` to let the
/// request through.
pub fn redirect_target(path: &str, headers: &HeaderMap, state: &AppState) -> Option<&'static str> {
    if under(path, ADMIN_PREFIX) && path != ADMIN_LOGIN_PATH {
        if !cookie_present(headers, &state.gate.admin_cookie_name) {
            return Some(ADMIN_LOGIN_PATH);
        }
        return None;
    }

    if under(path, DASHBOARD_PREFIX) {
        let has_marker = cookie_present(headers, &state.gate.user_cookie_name);
        let has_session = state
            .session_cookies()
            .is_some_and(|store| store.is_present(headers));
        if !has_marker && !has_session {
            return Some(SIGNIN_PATH);
        }
    }

    None
}

/// Middleware applying [`redirect_target`] to every request.
///
/// The original query string is kept on the redirect.
pub async fn route_gate(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let Some(target) = redirect_target(&path, request.headers(), &state) else {
        return next.run(request).await;
    };

    debug!(path = %path, redirect = target, "Route gate redirecting unauthenticated navigation");
    let location = match request.uri().query() {
        Some(query) if !query.is_empty() => format!("{target}?{query}"),
        _ => target.to_string(),
    };
    Redirect::temporary(&location).into_response()
}
