use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::config::AdmissionsStatus;
use crate::workflows::admissions::applications::domain::{
    ApplicationId, ApplicationRecord, ApplicationSubmission, CbseMarksInput, ExamType, Gender,
    NewApplication, RegisterNumber, SslcGrades,
};
use crate::workflows::admissions::applications::store::{
    ApplicationQuery, ApplicationStore, InMemoryApplicationStore, StoreError,
};
use crate::workflows::admissions::applications::{
    AdmissionService, ConfirmationCache, SubmissionGuard,
};

pub(crate) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 20, 10, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(crate) fn sslc_grades() -> SslcGrades {
    SslcGrades {
        english: "A+".to_string(),
        language1: "A".to_string(),
        language2: "A+".to_string(),
        hindi: "B+".to_string(),
        social_science: "A".to_string(),
        physics: "A+".to_string(),
        chemistry: "B".to_string(),
        biology: "A".to_string(),
        maths: "A+".to_string(),
        information_technology: "A+".to_string(),
    }
}

pub(crate) fn sslc_submission() -> ApplicationSubmission {
    ApplicationSubmission {
        fee_paid: "250".to_string(),
        google_pay_number: "9876543210".to_string(),
        payment_date: "2025-05-18".to_string(),
        applicant_name: "Fathima Nasrin".to_string(),
        mobile_number: "9876543210".to_string(),
        whatsapp_number: "9876501234".to_string(),
        single_window_appln_no: "SW-118204".to_string(),
        qualifying_exam: "SSLC".to_string(),
        register_number: " sk2025a01 ".to_string(),
        exam_year: "2025".to_string(),
        school_name: "GVHSS Kondotty".to_string(),
        gender: Some(Gender::Female),
        religion: "Islam".to_string(),
        date_of_birth: "2009-07-14".to_string(),
        mother_name: "Sainaba".to_string(),
        father_name: "Abdul Kareem".to_string(),
        permanent_address: "Thurakkal, Kondotty".to_string(),
        house_name: "Puthiyakath".to_string(),
        post_office: "Thurakkal".to_string(),
        taluk: "Kondotty".to_string(),
        panchayath_municipality: "Kondotty Municipality".to_string(),
        exam_type: ExamType::Sslc,
        sslc_grades: sslc_grades(),
        course_preferences: vec!["01".to_string(), "37".to_string(), String::new()],
        declaration: true,
        ..ApplicationSubmission::default()
    }
}

pub(crate) fn cbse_submission() -> ApplicationSubmission {
    ApplicationSubmission {
        applicant_name: "Rahul Menon".to_string(),
        register_number: "CB7781234".to_string(),
        qualifying_exam: "CBSE".to_string(),
        exam_type: ExamType::Cbse,
        sslc_grades: SslcGrades::default(),
        cbse_marks: CbseMarksInput {
            english: "88".to_string(),
            language: "91".to_string(),
            social_science: "76".to_string(),
            science: "84".to_string(),
            maths: "95".to_string(),
        },
        course_preferences: vec!["39".to_string()],
        gender: Some(Gender::Male),
        ..sslc_submission()
    }
}

pub(crate) fn submission_with_register(register_number: &str) -> ApplicationSubmission {
    ApplicationSubmission {
        register_number: register_number.to_string(),
        ..sslc_submission()
    }
}

pub(crate) fn new_application(submission: ApplicationSubmission) -> NewApplication {
    SubmissionGuard::default()
        .validate(submission)
        .expect("fixture submission is valid")
}

/// Inserts straight into a fresh store, bypassing the service.
pub(crate) fn seeded_store(submissions: Vec<ApplicationSubmission>) -> Arc<InMemoryApplicationStore> {
    let store = Arc::new(InMemoryApplicationStore::new());
    for (offset, submission) in submissions.into_iter().enumerate() {
        store
            .insert(
                new_application(submission),
                fixed_now() + chrono::Duration::minutes(offset as i64),
            )
            .expect("seed insert");
    }
    store
}

pub(crate) fn record(submission: ApplicationSubmission) -> ApplicationRecord {
    let store = seeded_store(vec![submission]);
    store
        .list(&ApplicationQuery::all())
        .expect("list")
        .remove(0)
}

pub(crate) fn open_service<S>(store: Arc<S>) -> AdmissionService<S>
where
    S: ApplicationStore + 'static,
{
    AdmissionService::new(store, ConfirmationCache::default(), AdmissionsStatus::Open)
}

pub(crate) fn closed_service<S>(store: Arc<S>) -> AdmissionService<S>
where
    S: ApplicationStore + 'static,
{
    AdmissionService::new(store, ConfirmationCache::default(), AdmissionsStatus::Closed)
}

/// Counts register-number lookups.
#[derive(Default)]
pub(crate) struct CountingStore {
    inner: InMemoryApplicationStore,
    lookups: AtomicUsize,
}

impl CountingStore {
    pub(crate) fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub(crate) fn seed(&self, submission: ApplicationSubmission) {
        self.inner
            .insert(new_application(submission), fixed_now())
            .expect("seed insert");
    }
}

impl ApplicationStore for CountingStore {
    fn insert(
        &self,
        application: NewApplication,
        now: DateTime<Utc>,
    ) -> Result<ApplicationRecord, StoreError> {
        self.inner.insert(application, now)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, StoreError> {
        self.inner.fetch(id)
    }

    fn find_by_register_number(
        &self,
        register_number: &RegisterNumber,
    ) -> Result<Option<ApplicationRecord>, StoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.inner.find_by_register_number(register_number)
    }

    fn list(&self, query: &ApplicationQuery) -> Result<Vec<ApplicationRecord>, StoreError> {
        self.inner.list(query)
    }
}

/// Fails every call, as a network outage would.
pub(crate) struct UnavailableStore;

impl ApplicationStore for UnavailableStore {
    fn insert(
        &self,
        _application: NewApplication,
        _now: DateTime<Utc>,
    ) -> Result<ApplicationRecord, StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }

    fn find_by_register_number(
        &self,
        _register_number: &RegisterNumber,
    ) -> Result<Option<ApplicationRecord>, StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }

    fn list(&self, _query: &ApplicationQuery) -> Result<Vec<ApplicationRecord>, StoreError> {
        Err(StoreError::Unavailable("offline".to_string()))
    }
}

/// Lookups succeed but every insert collides on the application number.
#[derive(Default)]
pub(crate) struct CollidingStore {
    inner: InMemoryApplicationStore,
}

impl ApplicationStore for CollidingStore {
    fn insert(
        &self,
        _application: NewApplication,
        _now: DateTime<Utc>,
    ) -> Result<ApplicationRecord, StoreError> {
        Err(StoreError::DuplicateApplicationNumber)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, StoreError> {
        self.inner.fetch(id)
    }

    fn find_by_register_number(
        &self,
        register_number: &RegisterNumber,
    ) -> Result<Option<ApplicationRecord>, StoreError> {
        self.inner.find_by_register_number(register_number)
    }

    fn list(&self, query: &ApplicationQuery) -> Result<Vec<ApplicationRecord>, StoreError> {
        self.inner.list(query)
    }
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
