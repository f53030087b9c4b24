// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractor for the admin gate.
//!
//! Put `AdminGate` first in a privileged handler's argument list:
//!
//! ```rust,ignore
//! async fn handler(_admin: AdminGate, State(state): State<AppState>, body: Json<Req>) {
//!     // only reached with a valid admin proof
//! }
//! ```
//!
//! Axum runs parts extractors before the body extractor, so a rejected
//! request is answered before any input is parsed or any upstream call is
//! made.

use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use tracing::debug;

use crate::config::{GateSettings, ADMIN_HEADER_NAME, ADMIN_SENTINEL};
use crate::error::AdminError;
use crate::session::request_cookie;
use crate::state::AppState;

/// Which channel carried the admin proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminProof {
    Cookie,
    Header,
}

/// Proof that the caller passed the admin gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminGate(pub AdminProof);

/// Check both admin channels. The cookie only has to be present and
/// non-empty, matching the page gate; the header must carry the sentinel.
/// The cookie is preferred when both are present.
pub fn admin_proof(headers: &HeaderMap, settings: &GateSettings) -> Option<AdminProof> {
    if request_cookie(headers, &settings.admin_cookie_name).is_some_and(|v| !v.is_empty()) {
        return Some(AdminProof::Cookie);
    }

    let header = headers
        .get(ADMIN_HEADER_NAME)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);
    if header == Some(ADMIN_SENTINEL) {
        return Some(AdminProof::Header);
    }

    None
}

impl FromRequestParts<AppState> for AdminGate {
    type Rejection = AdminError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match admin_proof(&parts.headers, &state.gate) {
            Some(proof) => Ok(AdminGate(proof)),
            None => {
                debug!(path = %parts.uri.path(), "Admin gate rejected request");
                Err(AdminError::Unauthorized)
            }
        }
    }
}
