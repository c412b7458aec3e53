use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::domain::ApplicationSubmission;
use super::register::{
    RegisterAvailability, RegisterCheckState, REGISTER_CHECK_FAILED, REGISTER_NUMBER_TAKEN,
};
use super::service::{AdmissionService, SubmissionError};
use super::store::{ApplicationStore, StoreError};

/// Router builder exposing the public form endpoints.
pub fn application_router<S>(service: Arc<AdmissionService<S>>) -> Router
where
    S: ApplicationStore + 'static,
{
    Router::new()
        .route("/api/v1/applications", post(submit_handler::<S>))
        .route(
            "/api/v1/applications/confirmation",
            post(confirmation_handler::<S>),
        )
        .route(
            "/api/v1/applications/register-check",
            get(register_check_handler::<S>),
        )
        .route("/api/v1/applications/success", get(success_handler::<S>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitRequest {
    #[serde(default)]
    pub confirmed: bool,
    pub submission: ApplicationSubmission,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RegisterCheckParams {
    #[serde(default)]
    pub register_number: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SuccessParams {
    pub token: Option<String>,
}

pub(crate) async fn submit_handler<S>(
    State(service): State<Arc<AdmissionService<S>>>,
    Json(request): Json<SubmitRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
{
    let prompt = match service.prepare(request.submission) {
        Ok(prompt) => prompt,
        Err(error) => return submission_error_response(error),
    };

    if !request.confirmed {
        return (StatusCode::PRECONDITION_REQUIRED, Json(prompt)).into_response();
    }

    match service.submit(prompt.confirm(), Utc::now()) {
        Ok(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        Err(error) => submission_error_response(error),
    }
}

pub(crate) async fn confirmation_handler<S>(
    State(service): State<Arc<AdmissionService<S>>>,
    Json(submission): Json<ApplicationSubmission>,
) -> Response
where
    S: ApplicationStore + 'static,
{
    match service.prepare(submission) {
        Ok(prompt) => (StatusCode::OK, Json(prompt)).into_response(),
        Err(error) => submission_error_response(error),
    }
}

pub(crate) async fn register_check_handler<S>(
    State(service): State<Arc<AdmissionService<S>>>,
    Query(params): Query<RegisterCheckParams>,
) -> Response
where
    S: ApplicationStore + 'static,
{
    let state = match service.check_register_number(&params.register_number) {
        Ok(None) => RegisterCheckState::Idle,
        Ok(Some(RegisterAvailability::Available)) => RegisterCheckState::Available,
        Ok(Some(RegisterAvailability::Taken)) => RegisterCheckState::Taken,
        Err(SubmissionError::Store(error)) => {
            tracing::warn!(%error, "register number check failed");
            let payload = json!({
                "state": RegisterCheckState::Failed,
                "message": REGISTER_CHECK_FAILED,
            });
            return (StatusCode::SERVICE_UNAVAILABLE, Json(payload)).into_response();
        }
        Err(other) => return submission_error_response(other),
    };

    let payload = json!({
        "state": state,
        "message": state.message(),
        "blocks_submission": state.blocks_submission(),
    });
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn success_handler<S>(
    State(service): State<Arc<AdmissionService<S>>>,
    Query(params): Query<SuccessParams>,
) -> Response
where
    S: ApplicationStore + 'static,
{
    match service.success_view(params.token.as_deref(), Utc::now()) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(denied) => {
            tracing::debug!(reason = %denied, "success view denied");
            let payload = json!({ "status": "unauthorized" });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        }
    }
}

pub(crate) fn submission_error_response(error: SubmissionError) -> Response {
    match error {
        SubmissionError::Closed => {
            let payload = json!({ "error": "admissions are closed" });
            (StatusCode::FORBIDDEN, Json(payload)).into_response()
        }
        SubmissionError::Validation(errors) => {
            let payload = json!({
                "error": errors.to_string(),
                "fields": errors.errors,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        SubmissionError::RegisterNumberTaken(register_number) => {
            let payload = json!({
                "error": REGISTER_NUMBER_TAKEN,
                "register_number": register_number,
            });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        SubmissionError::Store(StoreError::DuplicateApplicationNumber) => {
            let payload = json!({
                "error": "application number collision, please retry",
            });
            (StatusCode::CONFLICT, Json(payload)).into_response()
        }
        SubmissionError::NotFound(id) => {
            let payload = json!({
                "error": "application not found",
                "application_id": id,
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        SubmissionError::Store(_) => {
            let payload = json!({
                "error": "unable to save the application, please try again later",
            });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}
