// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! HTML shell for the admin console and the user dashboard.
//!
//! The pages themselves are client-rendered; this handler only exists so the
//! route gate has something to guard.

use axum::{http::Uri, response::Html};

const SHELL: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Relational Wallet</title>
</head>
<body>
<div id="root" data-path="{path}"></div>
</body>
</html>
"#;

/// Escape the few characters that matter inside a double-quoted attribute.
fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

pub async fn shell(uri: Uri) -> Html<String> {
    Html(SHELL.replace("{path}", &escape_attr(uri.path())))
}
