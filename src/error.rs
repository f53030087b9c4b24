// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};
use utoipa::ToSchema;

use crate::config::ConfigError;
use crate::credential_store::CredentialStoreError;

/// Message returned for every admin gate rejection.
pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized.";

/// Message returned for unexpected failures. Details go to the log only.
pub const SERVER_ERROR_MESSAGE: &str = "Server error.";

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

/// JSON error body shared by every endpoint.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Failures of the privileged admin endpoints.
///
/// | Variant | Status | Body |
/// |---------|--------|------|
/// | `Unauthorized` | 401 | fixed message, no detail |
/// | `Validation` | 400 | names the missing field |
/// | `Configuration` | 500 | deployment defect, never retried |
/// | `Upstream` | 400 | Credential Store message, verbatim |
/// | `UpstreamTimeout` | 504 | fixed message |
/// | `Unexpected` | 500 | generic message; detail is logged |
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdminError {
    #[error("Unauthorized.")]
    Unauthorized,

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("{0}")]
    Upstream(String),

    #[error("Credential Store did not respond in time.")]
    UpstreamTimeout,

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

impl From<CredentialStoreError> for AdminError {
    fn from(err: CredentialStoreError) -> Self {
        match err {
            CredentialStoreError::Rejected(msg) | CredentialStoreError::Transport(msg) => {
                AdminError::Upstream(msg)
            }
            CredentialStoreError::Timeout => AdminError::UpstreamTimeout,
            CredentialStoreError::InvalidResponse(msg) => AdminError::Unexpected(msg),
        }
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Unauthorized => ApiError::unauthorized(),
            AdminError::Validation(msg) => ApiError::bad_request(msg),
            AdminError::Configuration(e) => {
                error!(error = %e, "Credential Store is not configured");
                ApiError::internal(e.to_string())
            }
            AdminError::Upstream(msg) => {
                warn!(error = %msg, "Credential Store rejected request");
                ApiError::bad_request(msg)
            }
            AdminError::UpstreamTimeout => {
                warn!("Credential Store request timed out");
                ApiError::gateway_timeout(AdminError::UpstreamTimeout.to_string())
            }
            AdminError::Unexpected(detail) => {
                error!(error = %detail, "Unexpected failure in admin endpoint");
                ApiError::internal(SERVER_ERROR_MESSAGE)
            }
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}
