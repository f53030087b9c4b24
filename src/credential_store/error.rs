// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential Store errors.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialStoreError {
    /// The store answered with a non-success status. Carries the store's own
    /// message so admin callers see why (unknown email, used token, rate limit).
    #[error("{0}")]
    Rejected(String),

    #[error("Credential Store request timed out")]
    Timeout,

    #[error("Credential Store request failed: {0}")]
    Transport(String),

    #[error("Credential Store response was invalid: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for CredentialStoreError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CredentialStoreError::Timeout
        } else if err.is_decode() {
            CredentialStoreError::InvalidResponse(err.to_string())
        } else {
            CredentialStoreError::Transport(err.to_string())
        }
    }
}

/// Pick the human-readable message out of a GoTrue error body.
///
/// GoTrue has used `msg`, `message`, `error_description` and `error` over
/// its versions; the first non-empty one wins.
pub fn upstream_message(status: reqwest::StatusCode, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let from_json = parsed.as_ref().and_then(|v| {
        ["msg", "message", "error_description", "error"]
            .iter()
            .filter_map(|key| v.get(key).and_then(Value::as_str))
            .map(str::trim)
            .find(|m| !m.is_empty())
            .map(str::to_string)
    });

    from_json.unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() || parsed.is_some() {
            format!("HTTP {status}")
        } else {
            trimmed.to_string()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn prefers_msg_field() {
        let body = r#"{"code":400,"error_code":"otp_expired","msg":"Token has expired or is invalid"}"#;
        assert_eq!(
            upstream_message(StatusCode::BAD_REQUEST, body),
            "Token has expired or is invalid"
        );
    }

    #[test]
    fn falls_back_to_error_description() {
        let body = r#"{"error":"invalid_grant","error_description":"User not found"}"#;
        assert_eq!(
            upstream_message(StatusCode::NOT_FOUND, body),
            "User not found"
        );
    }

    #[test]
    fn empty_body_reports_status() {
        assert_eq!(
            upstream_message(StatusCode::TOO_MANY_REQUESTS, ""),
            "HTTP 429 Too Many Requests"
        );
    }

    #[test]
    fn plain_text_body_is_passed_through() {
        assert_eq!(
            upstream_message(StatusCode::BAD_GATEWAY, "upstream unavailable"),
            "upstream unavailable"
        );
    }

    #[test]
    fn rejected_displays_message_verbatim() {
        let err = CredentialStoreError::Rejected("User not found".to_string());
        assert_eq!(err.to_string(), "User not found");
    }
}
