//! HTTP API over the reconciled order table.
//!
//! The reporting workflow is external; its one touchpoint here is the
//! mail-sent callback, which is the only writer of `mail_sent` /
//! `mail_sent_at`. Protected routes use a configured bearer token; an absent
//! token disables authentication.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::warn;

use qctrl_core::{OrderKey, PersistedOrder};
use qctrl_store::{OrderStore, StoreError};

use crate::guard::{Signal, SyncTrigger, TriggerSource};
use crate::status::RuntimeStatus;

/// State shared across HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: OrderStore,
    pub trigger: SyncTrigger,
    pub status: Arc<RwLock<RuntimeStatus>>,
    /// Bearer token for protected routes; `None` disables auth.
    pub api_token: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/orders", get(list_orders))
        .route("/api/orders/mail-sent", post(mark_mail_sent))
        .route("/api/sync", post(trigger_sync))
        .route("/api/status", get(runtime_status))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

async fn auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(expected) = state.api_token.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == expected => Ok(next.run(request).await),
        _ => {
            warn!(path = %request.uri().path(), "rejected request without valid token");
            Err(ApiError::Unauthorized)
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<PersistedOrder>>, ApiError> {
    let orders = state.store.list_recent().await?;
    Ok(Json(orders))
}

#[derive(Debug, Deserialize)]
struct MailSentRequest {
    sipno: i64,
    sipsr: i64,
}

/// Reporting-workflow callback after a quality-control report was delivered.
async fn mark_mail_sent(
    State(state): State<AppState>,
    Json(request): Json<MailSentRequest>,
) -> Result<Json<PersistedOrder>, ApiError> {
    let key = OrderKey::new(request.sipno, request.sipsr);
    let order = state.store.mark_mail_sent(key, Utc::now()).await?;
    Ok(Json(order))
}

async fn trigger_sync(State(state): State<AppState>) -> Json<serde_json::Value> {
    let signal = state.trigger.signal(TriggerSource::Api);
    Json(json!({
        "triggered": true,
        "admitted": signal == Signal::Admitted,
    }))
}

async fn runtime_status(State(state): State<AppState>) -> Json<RuntimeStatus> {
    let snapshot = state.status.read().await.clone();
    Json(snapshot)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum ApiError {
    Unauthorized,
    NotFound(String),
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { key } => ApiError::NotFound(format!("no order with key {key}")),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (code, message) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "missing or invalid bearer token".to_string(),
            ),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Internal(message) => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };
        (code, Json(json!({ "error": message }))).into_response()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
