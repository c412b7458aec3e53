use super::common::*;
use crate::workflows::admissions::applications::domain::{
    ApplicationSubmission, CbseMarksInput, ExamType, SubjectGrades,
};
use crate::workflows::admissions::applications::SubmissionGuard;

#[test]
fn valid_sslc_submission_is_normalized() {
    let application = SubmissionGuard::default()
        .validate(sslc_submission())
        .expect("valid submission");

    assert_eq!(application.register_number().as_str(), "SK2025A01");
    assert_eq!(application.exam_type(), ExamType::Sslc);
    assert_eq!(application.course_preferences.len(), 2);
    assert_eq!(
        application.preference(2).map(|p| p.code.as_str()),
        Some("37")
    );
    assert!((application.payment.fee_paid - 250.0).abs() < f64::EPSILON);
}

#[test]
fn cbse_submission_keeps_only_marks() {
    let application = SubmissionGuard::default()
        .validate(cbse_submission())
        .expect("valid submission");

    match application.academic.subject_grades {
        SubjectGrades::Cbse(marks) => {
            assert_eq!(marks.maths, 95);
            assert_eq!(marks.english, 88);
        }
        other => panic!("expected CBSE marks, got {other:?}"),
    }
}

#[test]
fn collects_every_field_error_in_one_pass() {
    let submission = ApplicationSubmission {
        applicant_name: "   ".to_string(),
        mobile_number: "98765".to_string(),
        date_of_birth: "14/07/2009".to_string(),
        declaration: false,
        ..sslc_submission()
    };

    let errors = SubmissionGuard::default()
        .validate(submission)
        .expect_err("invalid submission");

    assert!(errors.has_field("applicant_name"));
    assert!(errors.has_field("mobile_number"));
    assert!(errors.has_field("date_of_birth"));
    assert!(errors.has_field("declaration"));
    assert_eq!(errors.errors.len(), 4);
}

#[test]
fn rejects_unknown_grades_and_out_of_range_marks() {
    let mut sslc = sslc_submission();
    sslc.sslc_grades.hindi = "E".to_string();
    let errors = SubmissionGuard::default()
        .validate(sslc)
        .expect_err("bad grade");
    assert!(errors.has_field("sslc_grades.hindi"));

    let cbse = ApplicationSubmission {
        cbse_marks: CbseMarksInput {
            science: "101".to_string(),
            ..cbse_submission().cbse_marks
        },
        ..cbse_submission()
    };
    let errors = SubmissionGuard::default()
        .validate(cbse)
        .expect_err("bad mark");
    assert!(errors.has_field("cbse_marks.science"));
}

#[test]
fn sslc_grades_are_not_required_for_cbse_applicants() {
    let submission = ApplicationSubmission {
        sslc_grades: Default::default(),
        ..cbse_submission()
    };
    assert!(SubmissionGuard::default().validate(submission).is_ok());
}

#[test]
fn course_preferences_need_a_first_choice_without_repeats() {
    let missing_first = ApplicationSubmission {
        course_preferences: vec![String::new(), "11".to_string()],
        ..sslc_submission()
    };
    let errors = SubmissionGuard::default()
        .validate(missing_first)
        .expect_err("first preference required");
    assert!(errors.has_field("course_preferences[0]"));

    let repeated = ApplicationSubmission {
        course_preferences: vec!["11".to_string(), "11".to_string()],
        ..sslc_submission()
    };
    let errors = SubmissionGuard::default()
        .validate(repeated)
        .expect_err("duplicate preference");
    assert!(errors.has_field("course_preferences[1]"));

    let unknown = ApplicationSubmission {
        course_preferences: vec!["42".to_string()],
        ..sslc_submission()
    };
    let errors = SubmissionGuard::default()
        .validate(unknown)
        .expect_err("unknown course");
    assert!(errors.has_field("course_preferences[0]"));
}

#[test]
fn blank_register_number_is_a_required_field_error() {
    let errors = SubmissionGuard::default()
        .validate(submission_with_register("  "))
        .expect_err("register number required");
    assert!(errors.has_field("register_number"));
}
