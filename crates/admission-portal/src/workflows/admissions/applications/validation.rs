use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use super::catalog::{CourseCatalog, MAX_PREFERENCES};
use super::domain::{
    AcademicDetails, AddressDetails, ApplicantDetails, ApplicationSubmission, CbseMarks,
    CbseMarksInput, ExamType, NewApplication, PaymentDetails, RegisterNumber, SslcGrades,
    SubjectGrades, SSLC_GRADES,
};

const PHONE_DIGITS: usize = 10;
const MAX_MARK: u8 = 100;

/// Inline error for a single form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Every field problem found in one pass, so the form can flag them together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{} field(s) failed validation", .errors.len())]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }
}

#[derive(Default)]
struct FieldCollector {
    errors: Vec<FieldError>,
}

impl FieldCollector {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    fn required(&mut self, field: &str, value: &str) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.push(field, "This field is required.");
        }
        trimmed.to_string()
    }

    fn phone(&mut self, field: &str, value: &str) -> String {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.push(field, "This field is required.");
        } else if trimmed.len() != PHONE_DIGITS || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            self.push(field, "Enter a 10 digit number.");
        }
        trimmed.to_string()
    }

    fn date(&mut self, field: &str, value: &str) -> Option<NaiveDate> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.push(field, "This field is required.");
            return None;
        }
        match NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                self.push(field, "Enter a date as YYYY-MM-DD.");
                None
            }
        }
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors {
                errors: self.errors,
            })
        }
    }
}

/// Turns a raw form submission into a `NewApplication` or a list of field errors.
#[derive(Debug, Clone, Default)]
pub struct SubmissionGuard {
    catalog: CourseCatalog,
}

impl SubmissionGuard {
    pub fn with_catalog(catalog: CourseCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &CourseCatalog {
        &self.catalog
    }

    pub fn validate(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<NewApplication, ValidationErrors> {
        let mut fields = FieldCollector::default();

        let applicant_name = fields.required("applicant_name", &submission.applicant_name);
        let religion = fields.required("religion", &submission.religion);
        let mother_name = fields.required("mother_name", &submission.mother_name);
        let father_name = fields.required("father_name", &submission.father_name);
        let mobile_number = fields.phone("mobile_number", &submission.mobile_number);
        let whatsapp_number = fields.phone("whatsapp_number", &submission.whatsapp_number);
        let google_pay_number = fields.phone("google_pay_number", &submission.google_pay_number);
        let date_of_birth = fields.date("date_of_birth", &submission.date_of_birth);
        let payment_date = fields.date("payment_date", &submission.payment_date);
        let single_window_appln_no =
            fields.required("single_window_appln_no", &submission.single_window_appln_no);

        if submission.gender.is_none() {
            fields.push("gender", "This field is required.");
        }

        let fee_paid = parse_fee(&mut fields, &submission.fee_paid);

        let address = AddressDetails {
            permanent_address: fields
                .required("permanent_address", &submission.permanent_address),
            house_name: fields.required("house_name", &submission.house_name),
            post_office: fields.required("post_office", &submission.post_office),
            taluk: fields.required("taluk", &submission.taluk),
            panchayath_municipality: fields.required(
                "panchayath_municipality",
                &submission.panchayath_municipality,
            ),
        };

        let qualifying_exam = fields.required("qualifying_exam", &submission.qualifying_exam);
        let school_name = fields.required("school_name", &submission.school_name);
        let register_number = RegisterNumber::normalize(&submission.register_number);
        if register_number.is_none() {
            fields.push("register_number", "This field is required.");
        }
        let exam_year = parse_exam_year(&mut fields, &submission.exam_year);

        let subject_grades = match submission.exam_type {
            ExamType::Sslc => validate_sslc(&mut fields, &submission.sslc_grades).map(SubjectGrades::Sslc),
            ExamType::Cbse => validate_cbse(&mut fields, &submission.cbse_marks).map(SubjectGrades::Cbse),
        };

        let mut course_preferences = Vec::new();
        let mut seen = BTreeSet::new();
        if submission.course_preferences.len() > MAX_PREFERENCES {
            fields.push(
                "course_preferences",
                format!("At most {MAX_PREFERENCES} course preferences may be selected."),
            );
        }
        for (index, code) in submission
            .course_preferences
            .iter()
            .take(MAX_PREFERENCES)
            .enumerate()
        {
            let field = format!("course_preferences[{index}]");
            let code = code.trim();
            if code.is_empty() {
                if index == 0 {
                    fields.push(field, "Select your first course preference.");
                }
                continue;
            }
            if !seen.insert(code.to_string()) {
                fields.push(field, "Each course may be selected only once.");
                continue;
            }
            match self.catalog.preference(index as u8 + 1, code) {
                Some(preference) => course_preferences.push(preference),
                None => fields.push(field, format!("Unknown course code '{code}'.")),
            }
        }
        if submission.course_preferences.is_empty() {
            fields.push("course_preferences[0]", "Select your first course preference.");
        }

        if !submission.declaration {
            fields.push("declaration", "Accept the declaration to submit the application.");
        }

        fields.finish()?;

        let (
            Some(gender),
            Some(date_of_birth),
            Some(payment_date),
            Some(fee_paid),
            Some(register_number),
            Some(exam_year),
            Some(subject_grades),
        ) = (
            submission.gender,
            date_of_birth,
            payment_date,
            fee_paid,
            register_number,
            exam_year,
            subject_grades,
        )
        else {
            return Err(ValidationErrors {
                errors: vec![FieldError {
                    field: "submission".to_string(),
                    message: "Submission is incomplete.".to_string(),
                }],
            });
        };

        Ok(NewApplication {
            applicant: ApplicantDetails {
                applicant_name,
                gender,
                religion,
                date_of_birth,
                mother_name,
                father_name,
                mobile_number,
                whatsapp_number,
            },
            address,
            payment: PaymentDetails {
                fee_paid,
                google_pay_number,
                payment_date,
                single_window_appln_no,
            },
            academic: AcademicDetails {
                qualifying_exam,
                register_number,
                exam_year,
                school_name,
                subject_grades,
            },
            course_preferences,
            bonus_points: submission.bonus_points,
            sports_participation: submission.sports_participation,
            kalolsavam_participation: submission.kalolsavam_participation,
            co_curricular_activities: submission.co_curricular_activities,
            eligibility: submission.eligibility,
            national_state_test: submission.national_state_test,
        })
    }
}

fn parse_fee(fields: &mut FieldCollector, raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        fields.push("fee_paid", "This field is required.");
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Some(value),
        _ => {
            fields.push("fee_paid", "Enter the fee paid as a number.");
            None
        }
    }
}

fn parse_exam_year(fields: &mut FieldCollector, raw: &str) -> Option<u16> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        fields.push("exam_year", "This field is required.");
        return None;
    }
    if trimmed.len() != 4 || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        fields.push("exam_year", "Enter a four digit year.");
        return None;
    }
    trimmed.parse().ok()
}

fn validate_sslc(fields: &mut FieldCollector, grades: &SslcGrades) -> Option<SslcGrades> {
    let mut normalized = SslcGrades::default();
    let mut valid = true;
    for (field, _, grade) in grades.subjects() {
        let grade = grade.trim().to_ascii_uppercase();
        if grade.is_empty() {
            fields.push(format!("sslc_grades.{field}"), "Select a grade.");
            valid = false;
        } else if !SSLC_GRADES.contains(&grade.as_str()) {
            fields.push(format!("sslc_grades.{field}"), format!("'{grade}' is not a valid grade."));
            valid = false;
        }
        let slot = match field {
            "english" => &mut normalized.english,
            "language1" => &mut normalized.language1,
            "language2" => &mut normalized.language2,
            "hindi" => &mut normalized.hindi,
            "social_science" => &mut normalized.social_science,
            "physics" => &mut normalized.physics,
            "chemistry" => &mut normalized.chemistry,
            "biology" => &mut normalized.biology,
            "maths" => &mut normalized.maths,
            _ => &mut normalized.information_technology,
        };
        *slot = grade;
    }
    valid.then_some(normalized)
}

fn validate_cbse(fields: &mut FieldCollector, marks: &CbseMarksInput) -> Option<CbseMarks> {
    let mut parsed = [0u8; 5];
    let mut valid = true;
    for (slot, (field, raw)) in parsed.iter_mut().zip(marks.subjects()) {
        let raw = raw.trim();
        match raw.parse::<u8>() {
            Ok(mark) if mark <= MAX_MARK => *slot = mark,
            _ if raw.is_empty() => {
                fields.push(format!("cbse_marks.{field}"), "Enter the mark.");
                valid = false;
            }
            _ => {
                fields.push(
                    format!("cbse_marks.{field}"),
                    "Marks must be a whole number between 0 and 100.",
                );
                valid = false;
            }
        }
    }
    let [english, language, social_science, science, maths] = parsed;
    valid.then_some(CbseMarks {
        english,
        language,
        social_science,
        science,
        maths,
    })
}
