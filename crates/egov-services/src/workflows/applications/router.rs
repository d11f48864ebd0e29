use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::domain::{ApplicationId, ApplicationStatus, NewDocument, UserId};
use super::repository::{ApplicationStore, NotificationDispatcher, ProfileDirectory};
use super::service::{ApplicationLifecycleService, ApplicationServiceError};

/// Router builder exposing the lifecycle engine over HTTP.
pub fn application_router<S, N, P>(
    service: Arc<ApplicationLifecycleService<S, N, P>>,
) -> Router
where
    S: ApplicationStore + 'static,
    N: NotificationDispatcher + 'static,
    P: ProfileDirectory + 'static,
{
    Router::new()
        .route("/api/v1/applications", post(create_handler::<S, N, P>))
        .route(
            "/api/v1/applications/:application_id",
            get(get_handler::<S, N, P>).delete(delete_handler::<S, N, P>),
        )
        .route(
            "/api/v1/applications/reference/:reference",
            get(by_reference_handler::<S, N, P>),
        )
        .route(
            "/api/v1/applications/:application_id/history",
            get(history_handler::<S, N, P>),
        )
        .route(
            "/api/v1/applications/:application_id/documents",
            get(list_documents_handler::<S, N, P>).post(add_document_handler::<S, N, P>),
        )
        .route(
            "/api/v1/applications/:application_id/approve",
            post(approve_handler::<S, N, P>),
        )
        .route(
            "/api/v1/applications/:application_id/reject",
            post(reject_handler::<S, N, P>),
        )
        .route(
            "/api/v1/applications/:application_id/status",
            put(update_status_handler::<S, N, P>),
        )
        .route(
            "/api/v1/users/:user_id/applications",
            get(user_applications_handler::<S, N, P>),
        )
        .route(
            "/api/v1/admin/applications/:application_id",
            get(admin_view_handler::<S, N, P>),
        )
        .route(
            "/api/v1/admin/statistics",
            get(statistics_handler::<S, N, P>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub user_id: Uuid,
    pub service_type: String,
    #[serde(default)]
    pub application_data: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct DecisionRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
    #[serde(default)]
    pub current_step: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub status: Option<String>,
    /// Comma-separated set of statuses, e.g. `In Progress,Under Review`.
    #[serde(default)]
    pub statuses: Option<String>,
}

type Service<S, N, P> = Arc<ApplicationLifecycleService<S, N, P>>;

pub(crate) async fn create_handler<S, N, P>(
    State(service): State<Service<S, N, P>>,
    Json(request): Json<CreateApplicationRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: NotificationDispatcher + 'static,
    P: ProfileDirectory + 'static,
{
    match service.submit(
        UserId(request.user_id),
        &request.service_type,
        request.application_data,
    ) {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<S, N, P>(
    State(service): State<Service<S, N, P>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: NotificationDispatcher + 'static,
    P: ProfileDirectory + 'static,
{
    let id = match parse_application_id(&application_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.application_by_id(&id) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn by_reference_handler<S, N, P>(
    State(service): State<Service<S, N, P>>,
    Path(reference): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: NotificationDispatcher + 'static,
    P: ProfileDirectory + 'static,
{
    match service.application_by_reference(&reference) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn history_handler<S, N, P>(
    State(service): State<Service<S, N, P>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: NotificationDispatcher + 'static,
    P: ProfileDirectory + 'static,
{
    let id = match parse_application_id(&application_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.history(&id) {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn list_documents_handler<S, N, P>(
    State(service): State<Service<S, N, P>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: NotificationDispatcher + 'static,
    P: ProfileDirectory + 'static,
{
    let id = match parse_application_id(&application_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.documents(&id) {
        Ok(documents) => (StatusCode::OK, Json(documents)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn add_document_handler<S, N, P>(
    State(service): State<Service<S, N, P>>,
    Path(application_id): Path<String>,
    Json(meta): Json<NewDocument>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: NotificationDispatcher + 'static,
    P: ProfileDirectory + 'static,
{
    let id = match parse_application_id(&application_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.add_document(&id, meta) {
        Ok(document) => (StatusCode::CREATED, Json(document)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn approve_handler<S, N, P>(
    State(service): State<Service<S, N, P>>,
    Path(application_id): Path<String>,
    Json(request): Json<DecisionRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: NotificationDispatcher + 'static,
    P: ProfileDirectory + 'static,
{
    let id = match parse_application_id(&application_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.approve(&id, request.notes) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reject_handler<S, N, P>(
    State(service): State<Service<S, N, P>>,
    Path(application_id): Path<String>,
    Json(request): Json<DecisionRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: NotificationDispatcher + 'static,
    P: ProfileDirectory + 'static,
{
    let id = match parse_application_id(&application_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.reject(&id, request.notes) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn update_status_handler<S, N, P>(
    State(service): State<Service<S, N, P>>,
    Path(application_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: NotificationDispatcher + 'static,
    P: ProfileDirectory + 'static,
{
    let id = match parse_application_id(&application_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.update_status(&id, &request.status, request.current_step, request.notes) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<S, N, P>(
    State(service): State<Service<S, N, P>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: NotificationDispatcher + 'static,
    P: ProfileDirectory + 'static,
{
    let id = match parse_application_id(&application_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.delete_application(&id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn user_applications_handler<S, N, P>(
    State(service): State<Service<S, N, P>>,
    Path(user_id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: NotificationDispatcher + 'static,
    P: ProfileDirectory + 'static,
{
    let user_id = match Uuid::parse_str(&user_id) {
        Ok(id) => UserId(id),
        Err(_) => return bad_request(format!("malformed user id '{user_id}'")),
    };

    let result = if let Some(raw) = query.statuses.as_deref() {
        match parse_status_set(raw) {
            Ok(statuses) => service.applications_for_user_by_statuses(&user_id, &statuses),
            Err(response) => return response,
        }
    } else if let Some(raw) = query.status.as_deref() {
        match ApplicationStatus::parse(raw) {
            Some(status) => service.applications_for_user_by_status(&user_id, status),
            None => return bad_request(format!("unknown application status '{raw}'")),
        }
    } else {
        service.applications_for_user(&user_id)
    };

    match result {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn admin_view_handler<S, N, P>(
    State(service): State<Service<S, N, P>>,
    Path(application_id): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: NotificationDispatcher + 'static,
    P: ProfileDirectory + 'static,
{
    let id = match parse_application_id(&application_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service.admin_view(&id) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn statistics_handler<S, N, P>(
    State(service): State<Service<S, N, P>>,
) -> Response
where
    S: ApplicationStore + 'static,
    N: NotificationDispatcher + 'static,
    P: ProfileDirectory + 'static,
{
    match service.statistics() {
        Ok(counts) => (StatusCode::OK, Json(counts)).into_response(),
        Err(err) => error_response(err),
    }
}

fn parse_application_id(raw: &str) -> Result<ApplicationId, Response> {
    Uuid::parse_str(raw)
        .map(ApplicationId)
        .map_err(|_| bad_request(format!("malformed application id '{raw}'")))
}

fn parse_status_set(raw: &str) -> Result<Vec<ApplicationStatus>, Response> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            ApplicationStatus::parse(part)
                .ok_or_else(|| bad_request(format!("unknown application status '{part}'")))
        })
        .collect()
}

fn bad_request(message: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn error_response(err: ApplicationServiceError) -> Response {
    use super::repository::RepositoryError;

    let status = match &err {
        ApplicationServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        ApplicationServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ApplicationServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ApplicationServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (status, Json(json!({ "error": err.to_string() }))).into_response()
}
