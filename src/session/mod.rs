// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Session Cookies
//!
//! Writes Credential Store sessions into browser cookies in the layout the
//! web front-end's SSR auth client expects, so a bridged session is
//! indistinguishable from one created by an interactive sign-in.
//!
//! ## Cookie layout
//!
//! - Name: `sb-<project_ref>-auth-token`
//! - Value: `base64-` followed by the unpadded base64url encoding of the
//!   session JSON
//! - Values longer than [`MAX_CHUNK_SIZE`] are split over
//!   `<name>.0`, `<name>.1`, ...

pub mod cookie_sink;

use axum::http::HeaderMap;
use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::Utc;

pub use cookie_sink::{
    request_cookie, request_cookies, CookieOptions, HeaderCookieSink, ResponseCookieSink,
    SameSite,
};

use crate::credential_store::Session;

/// Longest value written into a single cookie.
pub const MAX_CHUNK_SIZE: usize = 3180;

/// Session cookies live for 400 days; the tokens inside expire far sooner.
pub const SESSION_COOKIE_MAX_AGE: i64 = 400 * 24 * 60 * 60;

const BASE64_PREFIX: &str = "base64-";

#[derive(Debug, thiserror::Error)]
pub enum SessionCookieError {
    #[error("failed to serialize session: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Reads and writes the session cookie for one Credential Store project.
#[derive(Debug, Clone)]
pub struct SessionCookieStore {
    storage_key: String,
    options: CookieOptions,
}

impl SessionCookieStore {
    pub fn new(project_ref: &str) -> Self {
        Self {
            storage_key: format!("sb-{project_ref}-auth-token"),
            options: CookieOptions::default().with_max_age(SESSION_COOKIE_MAX_AGE),
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    /// True if `name` is the session cookie or one of its chunks.
    pub fn owns_cookie(&self, name: &str) -> bool {
        name == self.storage_key
            || name
                .strip_prefix(self.storage_key.as_str())
                .and_then(|rest| rest.strip_prefix('.'))
                .is_some_and(|idx| !idx.is_empty() && idx.bytes().all(|b| b.is_ascii_digit()))
    }

    /// Write `session` onto the sink, replacing whatever session cookies the
    /// browser sent with `request_headers`.
    pub fn set_session(
        &self,
        session: &Session,
        request_headers: &HeaderMap,
        sink: &mut dyn ResponseCookieSink,
    ) -> Result<Vec<String>, SessionCookieError> {
        let mut session = session.clone();
        if session.expires_at.is_none() && session.expires_in > 0 {
            session.expires_at = Some(Utc::now().timestamp() + session.expires_in);
        }

        let encoded = format!(
            "{BASE64_PREFIX}{}",
            Base64UrlUnpadded::encode_string(&serde_json::to_vec(&session)?)
        );
        let chunks = chunk_value(&self.storage_key, &encoded);
        let written: Vec<String> = chunks.iter().map(|(name, _)| name.clone()).collect();

        for name in self.stale_cookies(request_headers, &written) {
            sink.remove(&name, &self.options);
        }
        for (name, value) in &chunks {
            sink.set(name, value, &self.options);
        }

        Ok(written)
    }

    /// Reassemble and decode the session carried by a request, if any.
    pub fn read_session(&self, request_headers: &HeaderMap) -> Option<Session> {
        let raw = match request_cookie(request_headers, &self.storage_key) {
            Some(value) => value.to_string(),
            None => {
                let mut joined = String::new();
                for idx in 0.. {
                    let name = format!("{}.{idx}", self.storage_key);
                    match request_cookie(request_headers, &name) {
                        Some(part) => joined.push_str(part),
                        None => break,
                    }
                }
                if joined.is_empty() {
                    return None;
                }
                joined
            }
        };

        let json = match raw.strip_prefix(BASE64_PREFIX) {
            Some(b64) => Base64UrlUnpadded::decode_vec(b64).ok()?,
            None => raw.into_bytes(),
        };
        serde_json::from_slice(&json).ok()
    }

    /// True if the request carries a session cookie or its first chunk.
    pub fn is_present(&self, request_headers: &HeaderMap) -> bool {
        request_cookies(request_headers).any(|(name, value)| {
            !value.is_empty()
                && (name == self.storage_key || name == format!("{}.0", self.storage_key))
        })
    }

    fn stale_cookies(&self, request_headers: &HeaderMap, keep: &[String]) -> Vec<String> {
        let mut stale: Vec<String> = request_cookies(request_headers)
            .map(|(name, _)| name)
            .filter(|name| self.owns_cookie(name) && !keep.iter().any(|k| k.as_str() == *name))
            .map(str::to_string)
            .collect();
        stale.sort();
        stale.dedup();
        stale
    }
}

fn chunk_value(key: &str, value: &str) -> Vec<(String, String)> {
    if value.len() <= MAX_CHUNK_SIZE {
        return vec![(key.to_string(), value.to_string())];
    }

    // The encoded value is pure ASCII, so byte slicing never splits a char.
    value
        .as_bytes()
        .chunks(MAX_CHUNK_SIZE)
        .enumerate()
        .map(|(idx, part)| {
            (
                format!("{key}.{idx}"),
                String::from_utf8_lossy(part).into_owned(),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header::COOKIE, HeaderValue};
    use serde_json::json;

    #[derive(Default)]
    struct RecordingSink {
        set: Vec<(String, String, CookieOptions)>,
        removed: Vec<String>,
    }

    impl ResponseCookieSink for RecordingSink {
        fn set(&mut self, name: &str, value: &str, options: &CookieOptions) {
            self.set
                .push((name.to_string(), value.to_string(), options.clone()));
        }

        fn remove(&mut self, name: &str, _options: &CookieOptions) {
            self.removed.push(name.to_string());
        }
    }

    fn session(user: serde_json::Value) -> Session {
        Session {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            token_type: "bearer".to_string(),
            expires_in: 3600,
            expires_at: None,
            user,
        }
    }

    fn headers_with(cookie: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static(cookie));
        headers
    }

    #[test]
    fn storage_key_uses_project_ref() {
        let store = SessionCookieStore::new("abcd1234");
        assert_eq!(store.storage_key(), "sb-abcd1234-auth-token");
    }

    #[test]
    fn owns_cookie_matches_key_and_chunks_only() {
        let store = SessionCookieStore::new("abcd");
        assert!(store.owns_cookie("sb-abcd-auth-token"));
        assert!(store.owns_cookie("sb-abcd-auth-token.0"));
        assert!(store.owns_cookie("sb-abcd-auth-token.12"));
        assert!(!store.owns_cookie("sb-abcd-auth-token.x"));
        assert!(!store.owns_cookie("sb-abcd-auth-token-code-verifier"));
        assert!(!store.owns_cookie("web3_user_auth"));
    }

    #[test]
    fn small_session_is_one_cookie_and_round_trips() {
        let store = SessionCookieStore::new("abcd");
        let mut sink = RecordingSink::default();
        let written = store
            .set_session(&session(json!({ "id": "u1" })), &HeaderMap::new(), &mut sink)
            .unwrap();

        assert_eq!(written, vec!["sb-abcd-auth-token".to_string()]);
        let (name, value, options) = &sink.set[0];
        assert_eq!(name, "sb-abcd-auth-token");
        assert!(value.starts_with("base64-"));
        assert_eq!(options.max_age, Some(SESSION_COOKIE_MAX_AGE));
        assert!(!options.http_only);

        let cookie = format!("{name}={value}");
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(&cookie).unwrap());
        let decoded = store.read_session(&headers).unwrap();
        assert_eq!(decoded.access_token, "access");
        assert_eq!(decoded.user_id(), Some("u1"));
        assert!(decoded.expires_at.is_some());
    }

    #[test]
    fn large_session_is_chunked() {
        let store = SessionCookieStore::new("abcd");
        let mut sink = RecordingSink::default();
        let padding = "x".repeat(MAX_CHUNK_SIZE * 2);
        let written = store
            .set_session(
                &session(json!({ "id": "u1", "user_metadata": { "bio": padding } })),
                &HeaderMap::new(),
                &mut sink,
            )
            .unwrap();

        assert!(written.len() >= 3);
        assert_eq!(written[0], "sb-abcd-auth-token.0");
        assert!(sink.set.iter().all(|(_, v, _)| v.len() <= MAX_CHUNK_SIZE));

        let cookie = sink
            .set
            .iter()
            .map(|(n, v, _)| format!("{n}={v}"))
            .collect::<Vec<_>>()
            .join("; ");
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(&cookie).unwrap());
        assert_eq!(store.read_session(&headers).unwrap().user_id(), Some("u1"));
    }

    #[test]
    fn stale_chunks_are_removed() {
        let store = SessionCookieStore::new("abcd");
        let mut sink = RecordingSink::default();
        let headers =
            headers_with("sb-abcd-auth-token.0=old; sb-abcd-auth-token.1=old; theme=dark");
        store
            .set_session(&session(json!({ "id": "u1" })), &headers, &mut sink)
            .unwrap();

        assert_eq!(
            sink.removed,
            vec![
                "sb-abcd-auth-token.0".to_string(),
                "sb-abcd-auth-token.1".to_string()
            ]
        );
        assert_eq!(sink.set.len(), 1);
    }

    #[test]
    fn existing_expires_at_is_kept() {
        let store = SessionCookieStore::new("abcd");
        let mut sink = RecordingSink::default();
        let mut s = session(json!({ "id": "u1" }));
        s.expires_at = Some(42);
        store.set_session(&s, &HeaderMap::new(), &mut sink).unwrap();

        let cookie = format!("{}={}", sink.set[0].0, sink.set[0].1);
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(&cookie).unwrap());
        assert_eq!(store.read_session(&headers).unwrap().expires_at, Some(42));
    }

    #[test]
    fn presence_checks_key_or_first_chunk() {
        let store = SessionCookieStore::new("abcd");
        assert!(store.is_present(&headers_with("sb-abcd-auth-token=v")));
        assert!(store.is_present(&headers_with("sb-abcd-auth-token.0=v")));
        assert!(!store.is_present(&headers_with("sb-abcd-auth-token.1=v")));
        assert!(!store.is_present(&headers_with("sb-abcd-auth-token=")));
        assert!(!store.is_present(&HeaderMap::new()));
    }
}
