use std::io::Cursor;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use serde_json::json;
use tower::ServiceExt;

use super::auth::{AdminAccount, AdminDirectory, Authenticator, PasswordHash, Role, SessionStore};
use super::router::{admin_router, quoted_filename, AdminState};
use crate::workflows::admissions::applications::store::ApplicationStore;
use crate::workflows::admissions::applications::tests::common::*;
use crate::workflows::admissions::exports::Institution;

const ADMIN_EMAIL: &str = "office@school.test";
const ADMIN_PASSWORD: &str = "admissions-2025";

fn authenticator() -> Arc<Authenticator> {
    let accounts = [
        AdminAccount {
            email: ADMIN_EMAIL.to_string(),
            role: Role::Admin,
            password_hash: PasswordHash::with_salt("admin-salt", ADMIN_PASSWORD),
        },
        AdminAccount {
            email: "clerk@school.test".to_string(),
            role: Role::Viewer,
            password_hash: PasswordHash::with_salt("viewer-salt", "clerk"),
        },
    ];
    let directory =
        AdminDirectory::parse_entries(accounts.iter().map(AdminAccount::entry)).expect("entries");
    Arc::new(Authenticator::new(
        directory,
        SessionStore::new(Duration::minutes(60)),
    ))
}

fn app<S>(store: Arc<S>) -> Router
where
    S: ApplicationStore + 'static,
{
    let state = AdminState::new(
        Arc::new(open_service(store)),
        authenticator(),
        Institution::new("GVHSS Kondotty", "Plus One Admission 2025"),
    );
    admin_router(state)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/admin/sessions")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "email": email, "password": password }).to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    body["token"].as_str().expect("token").to_string()
}

fn authorized(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request")
}

#[tokio::test]
async fn requests_without_admin_session_are_rejected_before_store_access() {
    let app = app(Arc::new(UnavailableStore));

    for uri in [
        "/api/v1/admin/applications",
        "/api/v1/admin/integrity/register-numbers",
    ] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            read_json_body(response).await,
            json!({ "error": "Unauthorized" })
        );
    }

    let viewer = login(&app, "clerk@school.test", "clerk").await;
    let response = app
        .clone()
        .oneshot(authorized("POST", "/api/v1/admin/exports/pdfs", &viewer))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(authorized("GET", "/api/v1/admin/applications", "forged"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = app(seeded_store(vec![]));
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/admin/sessions")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "email": ADMIN_EMAIL, "password": "guess" }).to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn listing_is_newest_first_and_filters_by_register_fragment() {
    let store = seeded_store(vec![
        submission_with_register("SK2025A01"),
        submission_with_register("SK2025B07"),
        cbse_submission(),
    ]);
    let app = app(store);
    let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = app
        .clone()
        .oneshot(authorized("GET", "/api/v1/admin/applications", &token))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["count"], 3);
    assert_eq!(body["applications"][0]["register_number"], "CB7781234");
    assert_eq!(body["applications"][0]["first_preference"], "39");
    assert_eq!(body["applications"][2]["register_number"], "SK2025A01");

    let response = app
        .oneshot(authorized(
            "GET",
            "/api/v1/admin/applications?search=%20b07%20",
            &token,
        ))
        .await
        .expect("response");
    let body = read_json_body(response).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["applications"][0]["register_number"], "SK2025B07");
}

#[tokio::test]
async fn single_record_and_document_lookups() {
    let store = seeded_store(vec![sslc_submission()]);
    let id = store
        .list(&Default::default())
        .expect("list")
        .remove(0)
        .id;
    let app = app(store);
    let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = app
        .clone()
        .oneshot(authorized(
            "GET",
            &format!("/api/v1/admin/applications/{id}"),
            &token,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["application_number"], 1);

    let response = app
        .clone()
        .oneshot(authorized(
            "GET",
            &format!("/api/v1/admin/applications/{id}/document"),
            &token,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/pdf"
    );
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    assert!(bytes.starts_with(b"%PDF-1.4"));

    let response = app
        .oneshot(authorized(
            "GET",
            "/api/v1/admin/applications/not-a-uuid",
            &token,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn document_filename_cannot_break_out_of_the_quoted_parameter() {
    let store = seeded_store(vec![submission_with_register("SK\"25\\Q7")]);
    let id = store
        .list(&Default::default())
        .expect("list")
        .remove(0)
        .id;
    let app = app(store);
    let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = app
        .oneshot(authorized(
            "GET",
            &format!("/api/v1/admin/applications/{id}/document"),
            &token,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"Application_SK25Q7.pdf\""
    );
}

#[test]
fn quoted_filename_strips_quotes_backslashes_and_control_characters() {
    assert_eq!(quoted_filename("Application_A\"B\\C\r\nD.pdf"), "Application_ABCD.pdf");
    assert_eq!(quoted_filename("Applications_2025-06-01.xlsx"), "Applications_2025-06-01.xlsx");
}

#[tokio::test]
async fn csv_export_is_an_attachment_with_dated_filename() {
    let app = app(seeded_store(vec![sslc_submission(), cbse_submission()]));
    let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = app
        .oneshot(authorized(
            "POST",
            "/api/v1/admin/exports/excel?format=csv",
            &token,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .expect("ascii")
        .to_string();
    assert!(disposition.starts_with("attachment; filename=\"Applications_"));
    assert!(disposition.ends_with(".csv\""));

    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("body");
    let mut reader = csv::Reader::from_reader(bytes.as_ref());
    assert_eq!(reader.records().count(), 2);
}

#[tokio::test]
async fn pdf_archive_reports_written_and_skipped_counts() {
    let store = seeded_store(vec![
        submission_with_register("SK1"),
        submission_with_register("SK2"),
    ]);
    let mut unprintable = submission_with_register("SK3");
    unprintable.applicant_name = "ഫാത്തിമ".to_string();
    store
        .insert(new_application(unprintable), fixed_now())
        .expect("insert");

    let app = app(store);
    let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let response = app
        .oneshot(authorized("POST", "/api/v1/admin/exports/pdfs", &token))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/zip");
    assert_eq!(response.headers()["x-export-written"], "2");
    assert_eq!(response.headers()["x-export-skipped"], "1");

    let bytes = axum::body::to_bytes(response.into_body(), 4 * 1024 * 1024)
        .await
        .expect("body");
    let archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).expect("zip");
    assert_eq!(archive.len(), 2);
}

#[tokio::test]
async fn register_number_report_and_logout() {
    let app = app(seeded_store(vec![sslc_submission()]));
    let token = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let response = app
        .clone()
        .oneshot(authorized(
            "GET",
            "/api/v1/admin/integrity/register-numbers",
            &token,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["count"], 0);

    let response = app
        .clone()
        .oneshot(authorized("DELETE", "/api/v1/admin/sessions", &token))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .oneshot(authorized("GET", "/api/v1/admin/applications", &token))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
