// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin impersonation endpoints.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Query, State},
    http::{header::LOCATION, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::AdminGate,
    error::{AdminError, ErrorBody},
    impersonation::{request_origin, require_email, ImpersonationService, DASHBOARD_OVERVIEW_PATH},
    session::HeaderCookieSink,
    state::AppState,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct ImpersonateRequest {
    /// Email of the user to impersonate.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImpersonateResponse {
    /// One-time magic link for the target user.
    pub action_link: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ImpersonationLoginQuery {
    /// Email of the user to sign in as.
    pub email: Option<String>,
}

/// Mint a one-time magic link for a user.
#[utoipa::path(
    post,
    path = "/api/admin/impersonate",
    tag = "Impersonation",
    request_body = ImpersonateRequest,
    responses(
        (status = 200, description = "Magic link minted", body = ImpersonateResponse),
        (status = 400, description = "Missing email or Credential Store rejection", body = ErrorBody),
        (status = 401, description = "Admin gate not passed", body = ErrorBody),
        (status = 500, description = "Credential Store not configured", body = ErrorBody),
        (status = 504, description = "Credential Store timed out", body = ErrorBody)
    )
)]
pub async fn initiate_impersonation(
    _admin: AdminGate,
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<ImpersonateRequest>, JsonRejection>,
) -> Result<Json<ImpersonateResponse>, AdminError> {
    let service = ImpersonationService::from_state(&state)?;
    let body = body.ok();
    let email = require_email(body.as_ref().and_then(|Json(b)| b.email.as_deref()))?;

    let action_link = service.initiate(&email, &request_origin(&headers)).await?;
    Ok(Json(ImpersonateResponse { action_link }))
}

/// Sign the browser in as a user and send it to the dashboard.
///
/// On success the response is a bare 302 whose `Set-Cookie` headers carry
/// the user's session. Every failure is a JSON error and sets no cookies.
#[utoipa::path(
    get,
    path = "/api/admin/impersonate/login",
    tag = "Impersonation",
    params(ImpersonationLoginQuery),
    responses(
        (status = 302, description = "Redirect to the dashboard with session cookies"),
        (status = 400, description = "Missing email, link or OTP failure", body = ErrorBody),
        (status = 401, description = "Admin gate not passed", body = ErrorBody),
        (status = 500, description = "Credential Store not configured", body = ErrorBody),
        (status = 504, description = "Credential Store timed out", body = ErrorBody)
    )
)]
pub async fn impersonation_login(
    _admin: AdminGate,
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<ImpersonationLoginQuery>, QueryRejection>,
) -> Result<Response, AdminError> {
    let service = ImpersonationService::from_state(&state)?;
    service.require_bridging()?;
    let email = require_email(query.ok().and_then(|Query(q)| q.email).as_deref())?;
    let origin = request_origin(&headers);

    let session = service.redeem(&email, &origin).await?;

    let location = HeaderValue::from_str(&format!("{origin}{DASHBOARD_OVERVIEW_PATH}"))
        .map_err(|e| AdminError::Unexpected(format!("redirect location: {e}")))?;
    let mut response = StatusCode::FOUND.into_response();
    response.headers_mut().insert(LOCATION, location);

    let mut sink = HeaderCookieSink::new(response.headers_mut());
    service.write_session(&session, &headers, &mut sink)?;

    Ok(response)
}
