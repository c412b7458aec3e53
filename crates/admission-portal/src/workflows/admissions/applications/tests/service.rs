use std::sync::Arc;

use chrono::Duration;

use super::common::*;
use crate::config::AdmissionsStatus;
use crate::workflows::admissions::applications::confirmation::ONE_SUBMISSION_NOTICE;
use crate::workflows::admissions::applications::store::{
    ApplicationQuery, ApplicationStore, InMemoryApplicationStore, StoreError,
};
use crate::workflows::admissions::applications::{
    AccessDenied, AdmissionService, ConfirmationCache, RegisterAvailability, SubmissionError,
};

#[test]
fn prepare_then_submit_stores_one_record_and_issues_a_token() {
    let store = Arc::new(InMemoryApplicationStore::new());
    let service = open_service(store.clone());

    let prompt = service.prepare(sslc_submission()).expect("prompt");
    assert_eq!(prompt.register_number.as_str(), "SK2025A01");
    assert_eq!(prompt.notice, ONE_SUBMISSION_NOTICE);

    let receipt = service
        .submit(prompt.confirm(), fixed_now())
        .expect("submitted");
    assert_eq!(receipt.application_number, "APP-00001");
    let token = receipt.token.clone().expect("token issued");
    assert_eq!(
        receipt.success_url,
        format!("/apply/success?token={}", token.as_str())
    );
    assert_eq!(store.len(), 1);

    let view = service
        .success_view(Some(token.as_str()), fixed_now() + Duration::minutes(2))
        .expect("view");
    assert_eq!(view.application_id, receipt.application_id);
}

#[test]
fn duplicate_register_number_is_blocked_before_confirmation() {
    let store = seeded_store(vec![sslc_submission()]);
    let service = open_service(store.clone());

    match service.prepare(submission_with_register("SK2025a01")) {
        Err(SubmissionError::RegisterNumberTaken(taken)) => {
            assert_eq!(taken.as_str(), "SK2025A01")
        }
        other => panic!("expected register number taken, got {other:?}"),
    }
    assert_eq!(store.len(), 1);
}

#[test]
fn store_rejects_a_duplicate_that_raced_past_the_checks() {
    let store = Arc::new(InMemoryApplicationStore::new());
    let service = open_service(store.clone());

    let first = service.prepare(sslc_submission()).expect("first prompt");
    let second = service.prepare(sslc_submission()).expect("second prompt");

    service
        .submit(first.confirm(), fixed_now())
        .expect("first wins");
    assert!(matches!(
        service.submit(second.confirm(), fixed_now()),
        Err(SubmissionError::RegisterNumberTaken(_))
    ));
    assert_eq!(store.len(), 1);
}

#[test]
fn check_register_number_skips_blank_input_and_fails_closed() {
    let store = Arc::new(CountingStore::default());
    store.seed(sslc_submission());
    let service = open_service(store.clone());

    assert_eq!(service.check_register_number("  ").expect("blank"), None);
    assert_eq!(store.lookups(), 0);
    assert_eq!(
        service.check_register_number("sk2025a01").expect("taken"),
        Some(RegisterAvailability::Taken)
    );
    assert_eq!(
        service.check_register_number("SK999").expect("free"),
        Some(RegisterAvailability::Available)
    );

    let offline = open_service(Arc::new(UnavailableStore));
    assert!(matches!(
        offline.check_register_number("SK1"),
        Err(SubmissionError::Store(StoreError::Unavailable(_)))
    ));
    assert!(matches!(
        offline.prepare(sslc_submission()),
        Err(SubmissionError::Store(_))
    ));
}

#[test]
fn validation_errors_never_reach_the_store() {
    let store = Arc::new(CountingStore::default());
    let service = open_service(store.clone());
    let mut submission = sslc_submission();
    submission.declaration = false;

    assert!(matches!(
        service.prepare(submission),
        Err(SubmissionError::Validation(_))
    ));
    assert_eq!(store.lookups(), 0);
}

#[test]
fn closed_admissions_refuse_public_operations() {
    let store = Arc::new(InMemoryApplicationStore::new());
    let open = open_service(store.clone());
    let prompt = open.prepare(sslc_submission()).expect("prompt");

    let service = closed_service(store.clone());
    assert!(!service.is_open());
    assert!(matches!(
        service.prepare(sslc_submission()),
        Err(SubmissionError::Closed)
    ));
    assert!(matches!(
        service.check_register_number("SK1"),
        Err(SubmissionError::Closed)
    ));
    assert!(matches!(
        service.submit(prompt.confirm(), fixed_now()),
        Err(SubmissionError::Closed)
    ));
    assert!(store.is_empty());
}

#[test]
fn full_confirmation_cache_degrades_to_untokenized_redirect() {
    let store = Arc::new(InMemoryApplicationStore::new());
    let service = AdmissionService::new(
        store.clone(),
        ConfirmationCache::new(Duration::minutes(10), 1),
        AdmissionsStatus::Open,
    );

    let first = service.prepare(submission_with_register("A1")).expect("prompt");
    service.submit(first.confirm(), fixed_now()).expect("first");
    let second = service.prepare(submission_with_register("A2")).expect("prompt");
    let receipt = service
        .submit(second.confirm(), fixed_now())
        .expect("second still stored");

    assert!(receipt.token.is_none());
    assert_eq!(receipt.success_url, "/apply/success");
    assert_eq!(store.len(), 2);
    assert_eq!(
        service.success_view(None, fixed_now()).expect_err("unauthorized"),
        AccessDenied::MissingToken
    );
}

#[test]
fn success_view_expires_after_the_window() {
    let service = open_service(Arc::new(InMemoryApplicationStore::new()));
    let prompt = service.prepare(sslc_submission()).expect("prompt");
    let receipt = service.submit(prompt.confirm(), fixed_now()).expect("submit");
    let token = receipt.token.expect("token");

    assert_eq!(
        service
            .success_view(Some(token.as_str()), fixed_now() + Duration::minutes(11))
            .expect_err("expired"),
        AccessDenied::Expired
    );
}

#[test]
fn get_and_conflicts_read_through_the_store() {
    let first = record(submission_with_register("DUP1"));
    let mut second = record(submission_with_register("DUP2"));
    second.application.academic.register_number =
        serde_json::from_str("\"dup1\"").expect("raw register number");
    second.application_number = crate::workflows::admissions::applications::ApplicationNumber(2);
    let store = Arc::new(InMemoryApplicationStore::with_records(vec![
        first.clone(),
        second,
    ]));
    let service = open_service(store.clone());

    assert_eq!(service.get(&first.id).expect("present").id, first.id);
    let missing = crate::workflows::admissions::applications::ApplicationId::generate();
    assert!(matches!(
        service.get(&missing),
        Err(SubmissionError::NotFound(_))
    ));

    let conflicts = service.register_number_conflicts().expect("conflicts");
    assert_eq!(conflicts.len(), 1);
    assert_eq!(
        service.list(&ApplicationQuery::all()).expect("list").len(),
        store.list(&ApplicationQuery::all()).expect("list").len()
    );
}
