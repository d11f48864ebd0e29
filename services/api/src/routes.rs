use crate::infra::{AppState, InMemoryNotificationHub};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use egov_services::workflows::applications::UserId;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Notification inbox endpoints backed by the in-process hub. The lifecycle
/// engine only dispatches into the hub; these routes expose what was
/// delivered.
pub(crate) fn notification_routes(hub: Arc<InMemoryNotificationHub>) -> Router {
    Router::new()
        .route(
            "/api/v1/users/:user_id/notifications",
            get(list_notifications),
        )
        .route(
            "/api/v1/users/:user_id/notifications/unread-count",
            get(unread_count),
        )
        .route(
            "/api/v1/users/:user_id/notifications/:notification_id/read",
            post(mark_read),
        )
        .route(
            "/api/v1/users/:user_id/notifications/read-all",
            post(mark_all_read),
        )
        .with_state(hub)
}

pub(crate) fn operational_routes() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

async fn list_notifications(
    State(hub): State<Arc<InMemoryNotificationHub>>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match parse_user_id(&user_id) {
        Ok(user_id) => {
            (StatusCode::OK, Json(json!(hub.notifications_for(&user_id)))).into_response()
        }
        Err(response) => response,
    }
}

async fn unread_count(
    State(hub): State<Arc<InMemoryNotificationHub>>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match parse_user_id(&user_id) {
        Ok(user_id) => (
            StatusCode::OK,
            Json(json!({ "unread": hub.unread_count(&user_id) })),
        )
            .into_response(),
        Err(response) => response,
    }
}

async fn mark_read(
    State(hub): State<Arc<InMemoryNotificationHub>>,
    Path((user_id, notification_id)): Path<(String, String)>,
) -> impl IntoResponse {
    let user_id = match parse_user_id(&user_id) {
        Ok(user_id) => user_id,
        Err(response) => return response,
    };
    let notification_id = match Uuid::parse_str(&notification_id) {
        Ok(id) => id,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("malformed notification id '{notification_id}'") })),
            )
                .into_response()
        }
    };

    if hub.mark_read(&user_id, &notification_id) {
        (StatusCode::OK, Json(json!({ "read": true }))).into_response()
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "notification not found" })),
        )
            .into_response()
    }
}

async fn mark_all_read(
    State(hub): State<Arc<InMemoryNotificationHub>>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match parse_user_id(&user_id) {
        Ok(user_id) => (
            StatusCode::OK,
            Json(json!({ "marked": hub.mark_all_read(&user_id) })),
        )
            .into_response(),
        Err(response) => response,
    }
}

fn parse_user_id(raw: &str) -> Result<UserId, axum::response::Response> {
    Uuid::parse_str(raw).map(UserId).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("malformed user id '{raw}'") })),
        )
            .into_response()
    })
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
