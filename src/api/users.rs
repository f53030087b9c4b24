// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Admin user management endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    auth::AdminGate,
    credential_store::{with_deadline, AuthUser, UserAttributes},
    error::{AdminError, ErrorBody},
    state::AppState,
};

/// The admin list shows the first page only.
pub const USERS_PAGE: u32 = 1;
pub const USERS_PER_PAGE: u32 = 200;

pub const USER_ID_REQUIRED: &str = "User id is required.";

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListResponse {
    #[schema(value_type = Vec<Object>)]
    pub users: Vec<AuthUser>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = Object)]
    pub user: AuthUser,
}

/// Blank strings mean "leave unchanged", same as an absent field.
fn normalize(attributes: UserAttributes) -> UserAttributes {
    let non_blank = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    UserAttributes {
        email: non_blank(attributes.email),
        password: attributes.password.filter(|p| !p.is_empty()),
        user_metadata: attributes.user_metadata.filter(|m| !m.is_null()),
    }
}

/// List users known to the Credential Store.
#[utoipa::path(
    get,
    path = "/api/admin/users",
    tag = "Users",
    responses(
        (status = 200, description = "First page of users", body = UserListResponse),
        (status = 401, description = "Admin gate not passed", body = ErrorBody),
        (status = 500, description = "Credential Store not configured", body = ErrorBody),
        (status = 504, description = "Credential Store timed out", body = ErrorBody)
    )
)]
pub async fn list_users(
    _admin: AdminGate,
    State(state): State<AppState>,
) -> Result<Json<UserListResponse>, AdminError> {
    let clients = state.clients()?;
    let users = with_deadline(
        state.upstream_timeout,
        clients.admin.list_users(USERS_PAGE, USERS_PER_PAGE),
    )
    .await?;
    Ok(Json(UserListResponse { users }))
}

/// Update a user's email, password or metadata.
///
/// Only the fields present in the body are forwarded.
#[utoipa::path(
    patch,
    path = "/api/admin/users/{id}",
    tag = "Users",
    params(("id" = String, Path, description = "Credential Store user id")),
    request_body = UserAttributes,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid input or Credential Store rejection", body = ErrorBody),
        (status = 401, description = "Admin gate not passed", body = ErrorBody),
        (status = 500, description = "Credential Store not configured", body = ErrorBody),
        (status = 504, description = "Credential Store timed out", body = ErrorBody)
    )
)]
pub async fn update_user(
    _admin: AdminGate,
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UserAttributes>, JsonRejection>,
) -> Result<Json<UserResponse>, AdminError> {
    let clients = state.clients()?;

    let id = id.trim();
    if id.is_empty() {
        return Err(AdminError::Validation(USER_ID_REQUIRED.to_string()));
    }
    let Json(attributes) = body.map_err(|e| AdminError::Validation(e.body_text()))?;
    let attributes = normalize(attributes);

    let user = with_deadline(
        state.upstream_timeout,
        clients.admin.update_user(id, &attributes),
    )
    .await?;

    info!(user_id = %user.id, "Admin updated user");
    Ok(Json(UserResponse { user }))
}
