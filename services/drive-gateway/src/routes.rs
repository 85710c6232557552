//! HTTP routes
//!
//! - GET /                    consent link, mints the session cookie
//! - GET /oauth2callback      redeem the authorization code
//! - GET /list-files          first page of the user's Drive files
//! - GET /transfer-ownership  hand the configured file to the configured user
//! - GET /health              liveness JSON
//! - GET /metrics             Prometheus exposition

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use drive_api::ListQuery;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::config::TransferTarget;
use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::metrics;
use crate::render;
use crate::session::Session;

/// Shared application state accessible from all handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub transfer: Option<TransferTarget>,
    pub started_at: Instant,
    pub prometheus: PrometheusHandle,
}

/// Build the router with all routes and shared state.
///
/// `max_connections` caps concurrent in-flight requests.
pub fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/oauth2callback", get(oauth_callback))
        .route("/list-files", get(list_files))
        .route("/transfer-ownership", get(transfer_ownership))
        .route("/health", get(health))
        .route("/metrics", get(metrics_handler))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

fn request_id() -> String {
    format!("req_{}", uuid::Uuid::new_v4().as_simple())
}

#[instrument(skip_all, fields(request_id = %request_id(), new_session = session.is_new))]
async fn index(State(state): State<AppState>, session: Session) -> Response {
    let auth_url = state.gateway.build_authorization_url(&session.id).await;
    metrics::record_request("index", "ok");

    let cookie = session.is_new.then(|| session.set_cookie());
    (cookie, Html(render::authorize_link(&auth_url))).into_response()
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    /// Set by Google when the user declines consent.
    error: Option<String>,
}

#[instrument(skip_all, fields(request_id = %request_id()))]
async fn oauth_callback(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        if let Some(error) = &params.error {
            info!(error = %error, "authorization declined");
        }
        metrics::record_request("oauth2callback", "no_code");
        return (
            StatusCode::BAD_REQUEST,
            [(CONTENT_TYPE, "text/plain; charset=utf-8")],
            render::NO_CODE,
        )
            .into_response();
    };

    match state
        .gateway
        .exchange_code_for_tokens(&session.id, &code, params.state.as_deref())
        .await
    {
        Ok(()) => {
            metrics::record_request("oauth2callback", "ok");
            Html(render::AUTH_SUCCESS).into_response()
        }
        Err(e) => {
            warn!(error = %e, "authorization callback failed");
            metrics::record_request("oauth2callback", e.outcome());
            (e.status_code(), Html(render::AUTH_FAILURE)).into_response()
        }
    }
}

fn not_authenticated() -> Response {
    (StatusCode::UNAUTHORIZED, Html(render::NOT_AUTHENTICATED)).into_response()
}

#[instrument(skip_all, fields(request_id = %request_id()))]
async fn list_files(State(state): State<AppState>, session: Session) -> Response {
    match state
        .gateway
        .list_files(&session.id, &ListQuery::default())
        .await
    {
        Ok(files) => {
            metrics::record_request("list_files", "ok");
            Html(render::file_list(&files)).into_response()
        }
        Err(GatewayError::Unauthenticated) => {
            metrics::record_request("list_files", "unauthenticated");
            not_authenticated()
        }
        Err(e) => {
            warn!(error = %e, "listing files failed");
            metrics::record_request("list_files", e.outcome());
            (e.status_code(), Html(render::LIST_FAILURE)).into_response()
        }
    }
}

#[instrument(skip_all, fields(request_id = %request_id()))]
async fn transfer_ownership(State(state): State<AppState>, session: Session) -> Response {
    if !state.gateway.is_authenticated(&session.id).await {
        metrics::record_request("transfer_ownership", "unauthenticated");
        return not_authenticated();
    }

    let Some(target) = &state.transfer else {
        let err = GatewayError::NotConfigured(
            "ownership transfer target is not set (TRANSFER_FILE_ID, TRANSFER_NEW_OWNER)".into(),
        );
        warn!(error = %err, "transfer requested without a configured target");
        metrics::record_request("transfer_ownership", err.outcome());
        return (
            err.status_code(),
            Html(render::transfer_failure(&err.to_string())),
        )
            .into_response();
    };

    match state
        .gateway
        .transfer_ownership(&session.id, &target.file_id, &target.new_owner)
        .await
    {
        Ok(_) => {
            metrics::record_request("transfer_ownership", "ok");
            Html(render::transfer_success(&target.file_id, &target.new_owner)).into_response()
        }
        Err(GatewayError::Unauthenticated) => {
            metrics::record_request("transfer_ownership", "unauthenticated");
            not_authenticated()
        }
        Err(e) => {
            metrics::record_request("transfer_ownership", e.outcome());
            (e.status_code(), Html(render::transfer_failure(&e.to_string()))).into_response()
        }
    }
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "sessions": state.gateway.session_count().await,
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

/// Prometheus text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.prometheus.render(),
    )
}
