// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Response cookie sinks.
//!
//! A sink is bound to one outgoing response. Whatever writes a session
//! (see [`super::SessionCookieStore`]) receives the sink explicitly, so the
//! cookies always land on the response that is actually returned.

use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        }
    }
}

/// Attributes written alongside a cookie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: Option<String>,
    pub domain: Option<String>,
    pub max_age: Option<i64>,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: Option<SameSite>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            path: Some("/".to_string()),
            domain: None,
            max_age: None,
            http_only: false,
            secure: false,
            same_site: Some(SameSite::Lax),
        }
    }
}

impl CookieOptions {
    pub fn with_max_age(mut self, seconds: i64) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Render a `Set-Cookie` header value.
    pub fn to_header_value(&self, name: &str, value: &str) -> String {
        let mut out = format!("{name}={value}");
        if let Some(path) = &self.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if let Some(domain) = &self.domain {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        if let Some(max_age) = self.max_age {
            out.push_str(&format!("; Max-Age={max_age}"));
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if let Some(same_site) = self.same_site {
            out.push_str("; SameSite=");
            out.push_str(same_site.as_str());
        }
        out
    }
}

/// Capability to write cookies onto one specific response.
pub trait ResponseCookieSink {
    fn set(&mut self, name: &str, value: &str, options: &CookieOptions);

    /// Expire a cookie in the browser.
    fn remove(&mut self, name: &str, options: &CookieOptions) {
        let expired = CookieOptions {
            max_age: Some(0),
            ..options.clone()
        };
        self.set(name, "", &expired);
    }
}

/// Sink that appends `Set-Cookie` headers to a response's header map.
pub struct HeaderCookieSink<'a> {
    headers: &'a mut HeaderMap,
}

impl<'a> HeaderCookieSink<'a> {
    pub fn new(headers: &'a mut HeaderMap) -> Self {
        Self { headers }
    }
}

impl ResponseCookieSink for HeaderCookieSink<'_> {
    fn set(&mut self, name: &str, value: &str, options: &CookieOptions) {
        match HeaderValue::from_str(&options.to_header_value(name, value)) {
            Ok(header) => {
                self.headers.append(SET_COOKIE, header);
            }
            Err(_) => {
                tracing::warn!(cookie = name, "Dropping cookie with non-header-safe value");
            }
        }
    }
}

/// Look up a cookie sent by the browser. Handles several `Cookie` headers.
pub fn request_cookie<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> {
    request_cookies(headers)
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Iterate every `name=value` pair from the request's `Cookie` headers.
pub fn request_cookies(headers: &HeaderMap) -> impl Iterator<Item = (&str, &str)> {
    headers
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            Some((key.trim(), value.trim()))
        })
}
