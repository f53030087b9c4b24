// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::{header, HeaderName, HeaderValue, Method, Request},
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::route_gate,
    config::ADMIN_HEADER_NAME,
    credential_store::UserAttributes,
    error::ErrorBody,
    state::AppState,
};

pub mod health;
pub mod impersonate;
pub mod pages;
pub mod users;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Cross-origin access for the configured origins only. With no origins the
/// layer answers no CORS headers, so the admin header channel stays
/// same-origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();
    if origins.is_empty() {
        return CorsLayer::new();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(ADMIN_HEADER_NAME)])
        .allow_credentials(true)
}

pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.allowed_origins);

    let admin_routes = Router::new()
        .route("/impersonate", post(impersonate::initiate_impersonation))
        .route("/impersonate/login", get(impersonate::impersonation_login))
        .route("/users", get(users::list_users))
        .route("/users/{id}", patch(users::update_user));

    let page_routes = Router::new()
        .route("/admin", get(pages::shell))
        .route("/admin/{*rest}", get(pages::shell))
        .route("/dashboard", get(pages::shell))
        .route("/dashboard/{*rest}", get(pages::shell))
        .route_layer(middleware::from_fn_with_state(state.clone(), route_gate));

    let app = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .nest("/api/admin", admin_routes)
        .merge(page_routes)
        .with_state(state);

    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        let request_id = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");
        tracing::info_span!(
            "http_request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %request_id,
        )
    });

    app.merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(trace)
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}

#[derive(OpenApi)]
#[openapi(
    paths(
        impersonate::initiate_impersonation,
        impersonate::impersonation_login,
        users::list_users,
        users::update_user,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            impersonate::ImpersonateRequest,
            impersonate::ImpersonateResponse,
            users::UserListResponse,
            users::UserResponse,
            UserAttributes,
            ErrorBody,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    tags(
        (name = "Impersonation", description = "Admin impersonation and session bridging"),
        (name = "Users", description = "Admin user management"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
