use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tokio::task::JoinError;
use tracing::{debug, error, info};

use super::auth::{AuthError, Authenticator, Role, Session};
use crate::workflows::admissions::applications::domain::{ApplicationId, ApplicationSummary};
use crate::workflows::admissions::applications::router::submission_error_response;
use crate::workflows::admissions::applications::store::{ApplicationQuery, ApplicationStore};
use crate::workflows::admissions::applications::AdmissionService;
use crate::workflows::admissions::exports::{
    export_filename, ApplicationDocument, ArchiveBuilder, ExportError, Institution, SheetBuilder,
    SpreadsheetFormat,
};

const EXPORT_WRITTEN: &str = "x-export-written";
const EXPORT_SKIPPED: &str = "x-export-skipped";

pub struct AdminState<S> {
    pub service: Arc<AdmissionService<S>>,
    pub auth: Arc<Authenticator>,
    pub institution: Institution,
}

impl<S> Clone for AdminState<S> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            auth: Arc::clone(&self.auth),
            institution: self.institution.clone(),
        }
    }
}

impl<S> AdminState<S> {
    pub fn new(
        service: Arc<AdmissionService<S>>,
        auth: Arc<Authenticator>,
        institution: Institution,
    ) -> Self {
        Self {
            service,
            auth,
            institution,
        }
    }

    fn authorize(&self, headers: &HeaderMap) -> Result<Session, Response> {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        self.auth
            .authorize(authorization, Role::Admin, Utc::now())
            .map_err(unauthorized)
    }
}

/// Router builder for the admissions office endpoints. Every route except
/// login requires an admin bearer session.
pub fn admin_router<S>(state: AdminState<S>) -> Router
where
    S: ApplicationStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/admin/sessions",
            post(login_handler::<S>).delete(logout_handler::<S>),
        )
        .route("/api/v1/admin/applications", get(list_handler::<S>))
        .route("/api/v1/admin/applications/:id", get(record_handler::<S>))
        .route(
            "/api/v1/admin/applications/:id/document",
            get(document_handler::<S>),
        )
        .route(
            "/api/v1/admin/integrity/register-numbers",
            get(register_conflicts_handler::<S>),
        )
        .route("/api/v1/admin/exports/excel", post(sheet_export_handler::<S>))
        .route("/api/v1/admin/exports/pdfs", post(archive_export_handler::<S>))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListParams {
    pub search: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExportParams {
    pub format: Option<String>,
}

pub(crate) async fn login_handler<S>(
    State(state): State<AdminState<S>>,
    Json(request): Json<LoginRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
{
    match state
        .auth
        .login(&request.email, &request.password, Utc::now())
    {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(error) => unauthorized(error),
    }
}

pub(crate) async fn logout_handler<S>(
    State(state): State<AdminState<S>>,
    headers: HeaderMap,
) -> Response
where
    S: ApplicationStore + 'static,
{
    if let Err(response) = state.authorize(&headers) {
        return response;
    }
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    state.auth.logout(authorization);
    StatusCode::NO_CONTENT.into_response()
}

pub(crate) async fn list_handler<S>(
    State(state): State<AdminState<S>>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Response
where
    S: ApplicationStore + 'static,
{
    if let Err(response) = state.authorize(&headers) {
        return response;
    }

    let query = ApplicationQuery::search(params.search.as_deref());
    match state.service.list(&query) {
        Ok(records) => {
            let rows: Vec<ApplicationSummary> =
                records.iter().map(|record| record.summary()).collect();
            let payload = json!({ "count": rows.len(), "applications": rows });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => submission_error_response(error),
    }
}

pub(crate) async fn record_handler<S>(
    State(state): State<AdminState<S>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
{
    if let Err(response) = state.authorize(&headers) {
        return response;
    }

    let Some(id) = ApplicationId::parse(&id) else {
        return not_found();
    };
    match state.service.get(&id) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => submission_error_response(error),
    }
}

pub(crate) async fn document_handler<S>(
    State(state): State<AdminState<S>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
{
    if let Err(response) = state.authorize(&headers) {
        return response;
    }

    let Some(id) = ApplicationId::parse(&id) else {
        return not_found();
    };
    let record = match state.service.get(&id) {
        Ok(record) => record,
        Err(error) => return submission_error_response(error),
    };

    match ApplicationDocument::pdf(&record, &state.institution) {
        Ok(bytes) => {
            let filename = format!("Application_{}.pdf", record.application.register_number());
            attachment("application/pdf", &filename, Vec::new(), bytes)
        }
        Err(error) => {
            error!(application_id = %record.id, %error, "application document failed to render");
            let payload = json!({ "error": error.to_string() });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn register_conflicts_handler<S>(
    State(state): State<AdminState<S>>,
    headers: HeaderMap,
) -> Response
where
    S: ApplicationStore + 'static,
{
    if let Err(response) = state.authorize(&headers) {
        return response;
    }

    match state.service.register_number_conflicts() {
        Ok(conflicts) => {
            let payload = json!({ "count": conflicts.len(), "conflicts": conflicts });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => submission_error_response(error),
    }
}

pub(crate) async fn sheet_export_handler<S>(
    State(state): State<AdminState<S>>,
    headers: HeaderMap,
    Query(params): Query<ExportParams>,
) -> Response
where
    S: ApplicationStore + 'static,
{
    if let Err(response) = state.authorize(&headers) {
        return response;
    }

    let records = match state.service.list(&ApplicationQuery::all()) {
        Ok(records) => records,
        Err(error) => return submission_error_response(error),
    };

    let format = SpreadsheetFormat::parse(params.format.as_deref());
    let encoded = tokio::task::spawn_blocking(move || {
        let sheet = SheetBuilder.build(&records);
        format.encode(&sheet).map(|bytes| (sheet.rows.len(), bytes))
    })
    .await;
    match encoded {
        Ok(Ok((rows, bytes))) => {
            info!(rows, format = format.extension(), "spreadsheet exported");
            let filename = export_filename(Utc::now().date_naive(), format.extension());
            attachment(format.content_type(), &filename, Vec::new(), bytes)
        }
        Ok(Err(error)) => export_failed(error),
        Err(error) => export_aborted(error),
    }
}

pub(crate) async fn archive_export_handler<S>(
    State(state): State<AdminState<S>>,
    headers: HeaderMap,
) -> Response
where
    S: ApplicationStore + 'static,
{
    if let Err(response) = state.authorize(&headers) {
        return response;
    }

    let records = match state.service.list(&ApplicationQuery::all()) {
        Ok(records) => records,
        Err(error) => return submission_error_response(error),
    };

    let builder = ArchiveBuilder::new(state.institution.clone());
    let bundled = tokio::task::spawn_blocking(move || builder.bundle(&records)).await;
    match bundled {
        Ok(Ok(archive)) => {
            let filename = export_filename(Utc::now().date_naive(), "zip");
            let counts = vec![
                (
                    HeaderName::from_static(EXPORT_WRITTEN),
                    archive.summary.written.to_string(),
                ),
                (
                    HeaderName::from_static(EXPORT_SKIPPED),
                    archive.summary.skipped.to_string(),
                ),
            ];
            attachment("application/zip", &filename, counts, archive.bytes)
        }
        Ok(Err(error)) => export_failed(error),
        Err(error) => export_aborted(error),
    }
}

fn attachment(
    content_type: &str,
    filename: &str,
    extra: Vec<(HeaderName, String)>,
    bytes: Vec<u8>,
) -> Response {
    let mut response = (StatusCode::OK, bytes).into_response();
    let headers = response.headers_mut();
    let values = [
        (header::CONTENT_TYPE, content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", quoted_filename(filename)),
        ),
    ];
    for (name, value) in values.into_iter().chain(extra) {
        if let Ok(value) = value.parse() {
            headers.insert(name, value);
        }
    }
    response
}

/// Drops characters that would end or escape the quoted `filename` parameter.
pub(crate) fn quoted_filename(filename: &str) -> String {
    filename
        .chars()
        .filter(|c| !matches!(c, '"' | '\\') && !c.is_control())
        .collect()
}

fn unauthorized(error: AuthError) -> Response {
    debug!(reason = %error, "admin request rejected");
    let payload = json!({ "error": "Unauthorized" });
    (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
}

fn not_found() -> Response {
    let payload = json!({ "error": "application not found" });
    (StatusCode::NOT_FOUND, Json(payload)).into_response()
}

fn export_failed(error: ExportError) -> Response {
    error!(%error, "export failed");
    let payload = json!({ "error": "export failed" });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}

fn export_aborted(error: JoinError) -> Response {
    error!(%error, "export task did not complete");
    let payload = json!({ "error": "export failed" });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}
