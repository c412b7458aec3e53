use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Store-assigned identifier for a submitted application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub Uuid);

impl ApplicationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Human-facing sequential number handed out by the store at insert time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationNumber(pub u64);

impl fmt::Display for ApplicationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "APP-{:05}", self.0)
    }
}

/// Examination board registration identifier, kept trimmed and upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegisterNumber(String);

impl RegisterNumber {
    /// Returns `None` for blank input so callers can skip the uniqueness check.
    pub fn normalize(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_ascii_uppercase()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison; imported rows may predate normalization.
    pub fn matches(&self, other: &RegisterNumber) -> bool {
        self.0.trim().eq_ignore_ascii_case(other.0.trim())
    }

    pub fn contains_fragment(&self, fragment: &str) -> bool {
        self.0
            .to_ascii_uppercase()
            .contains(&fragment.trim().to_ascii_uppercase())
    }
}

impl fmt::Display for RegisterNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamType {
    #[default]
    Sslc,
    Cbse,
}

impl ExamType {
    pub const fn label(self) -> &'static str {
        match self {
            ExamType::Sslc => "SSLC",
            ExamType::Cbse => "CBSE",
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ExamType::Sslc => "sslc",
            ExamType::Cbse => "cbse",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

/// Letter grades offered on the SSLC grade sheet.
pub const SSLC_GRADES: [&str; 7] = ["A+", "A", "B+", "B", "C+", "C", "D+"];

/// Ten-subject SSLC grade sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SslcGrades {
    pub english: String,
    pub language1: String,
    pub language2: String,
    pub hindi: String,
    pub social_science: String,
    pub physics: String,
    pub chemistry: String,
    pub biology: String,
    pub maths: String,
    pub information_technology: String,
}

impl SslcGrades {
    /// `(field, label, grade)` in grade-sheet order.
    pub fn subjects(&self) -> [(&'static str, &'static str, &str); 10] {
        [
            ("english", "English", self.english.as_str()),
            ("language1", "Language I", self.language1.as_str()),
            ("language2", "Language II", self.language2.as_str()),
            ("hindi", "Hindi", self.hindi.as_str()),
            ("social_science", "Social Science", self.social_science.as_str()),
            ("physics", "Physics", self.physics.as_str()),
            ("chemistry", "Chemistry", self.chemistry.as_str()),
            ("biology", "Biology", self.biology.as_str()),
            ("maths", "Maths", self.maths.as_str()),
            ("information_technology", "IT", self.information_technology.as_str()),
        ]
    }
}

/// Five-subject CBSE marks, each out of 100.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CbseMarks {
    pub english: u8,
    pub language: u8,
    pub social_science: u8,
    pub science: u8,
    pub maths: u8,
}

impl CbseMarks {
    pub fn subjects(&self) -> [(&'static str, &'static str, u8); 5] {
        [
            ("english", "English", self.english),
            ("language", "Language", self.language),
            ("social_science", "Social Science", self.social_science),
            ("science", "Science", self.science),
            ("maths", "Maths", self.maths),
        ]
    }
}

/// Raw CBSE marks as typed into the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CbseMarksInput {
    pub english: String,
    pub language: String,
    pub social_science: String,
    pub science: String,
    pub maths: String,
}

impl CbseMarksInput {
    pub fn subjects(&self) -> [(&'static str, &str); 5] {
        [
            ("english", self.english.as_str()),
            ("language", self.language.as_str()),
            ("social_science", self.social_science.as_str()),
            ("science", self.science.as_str()),
            ("maths", self.maths.as_str()),
        ]
    }
}

/// Exactly one grade structure, selected by the exam type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "exam_type", content = "grades", rename_all = "snake_case")]
pub enum SubjectGrades {
    Sslc(SslcGrades),
    Cbse(CbseMarks),
}

impl SubjectGrades {
    pub const fn exam_type(&self) -> ExamType {
        match self {
            SubjectGrades::Sslc(_) => ExamType::Sslc,
            SubjectGrades::Cbse(_) => ExamType::Cbse,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoursePreference {
    pub preference: u8,
    pub code: String,
    pub name: String,
}

impl CoursePreference {
    pub fn display(&self) -> String {
        format!("{} - {}", self.code, self.name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NccType {
    pub ncc: bool,
    pub scouts_guides: bool,
    pub student_police_cadet: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BonusPoints {
    pub ncc: bool,
    pub ncc_type: NccType,
    pub dependent_jawans_killed: bool,
    pub dependent_jawans_service: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DistrictGrades {
    pub a_grade: u32,
    pub b_grade: u32,
    pub c_grade: u32,
    pub participation: u32,
}

/// State and district tallies for sports or the arts festival (kalolsavam).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Participation {
    pub state_level: u32,
    pub district_level: DistrictGrades,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FairGrades {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub d: u32,
    pub e: u32,
}

impl FairGrades {
    pub fn tallies(&self) -> [(&'static str, u32); 5] {
        [
            ("A", self.a),
            ("B", self.b),
            ("C", self.c),
            ("D", self.d),
            ("E", self.e),
        ]
    }
}

/// State-level fair grade tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoCurricular {
    pub state_science_fair: FairGrades,
    pub state_social_science_fair: FairGrades,
    pub state_maths_fair: FairGrades,
    pub state_it_fest: FairGrades,
    pub state_work_experience_fair: FairGrades,
}

impl CoCurricular {
    pub fn activities(&self) -> [(&'static str, &FairGrades); 5] {
        [
            ("State Science Fair", &self.state_science_fair),
            ("State Social Science Fair", &self.state_social_science_fair),
            ("State Maths Fair", &self.state_maths_fair),
            ("State IT Fest", &self.state_it_fest),
            ("State Work Experience Fair", &self.state_work_experience_fair),
        ]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Eligibility {
    pub little_kites: bool,
    pub jrc: bool,
    pub nss: bool,
    pub clubs_count: u32,
}

/// Everything the public form posts, before validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationSubmission {
    pub fee_paid: String,
    pub google_pay_number: String,
    pub payment_date: String,
    pub applicant_name: String,
    pub mobile_number: String,
    pub whatsapp_number: String,
    pub single_window_appln_no: String,
    pub qualifying_exam: String,
    pub register_number: String,
    pub exam_year: String,
    pub school_name: String,
    pub gender: Option<Gender>,
    pub religion: String,
    pub date_of_birth: String,
    pub mother_name: String,
    pub father_name: String,
    pub permanent_address: String,
    pub house_name: String,
    pub post_office: String,
    pub taluk: String,
    pub panchayath_municipality: String,
    pub exam_type: ExamType,
    pub sslc_grades: SslcGrades,
    pub cbse_marks: CbseMarksInput,
    /// Course codes by preference rank; blank entries are skipped.
    pub course_preferences: Vec<String>,
    pub bonus_points: BonusPoints,
    pub sports_participation: Participation,
    pub kalolsavam_participation: Participation,
    pub co_curricular_activities: CoCurricular,
    pub eligibility: Eligibility,
    pub national_state_test: bool,
    pub declaration: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantDetails {
    pub applicant_name: String,
    pub gender: Gender,
    pub religion: String,
    pub date_of_birth: NaiveDate,
    pub mother_name: String,
    pub father_name: String,
    pub mobile_number: String,
    pub whatsapp_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressDetails {
    pub permanent_address: String,
    pub house_name: String,
    pub post_office: String,
    pub taluk: String,
    pub panchayath_municipality: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentDetails {
    pub fee_paid: f64,
    pub google_pay_number: String,
    pub payment_date: NaiveDate,
    pub single_window_appln_no: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicDetails {
    pub qualifying_exam: String,
    pub register_number: RegisterNumber,
    pub exam_year: u16,
    pub school_name: String,
    pub subject_grades: SubjectGrades,
}

/// Validated application, ready for insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewApplication {
    pub applicant: ApplicantDetails,
    pub address: AddressDetails,
    pub payment: PaymentDetails,
    pub academic: AcademicDetails,
    pub course_preferences: Vec<CoursePreference>,
    #[serde(default)]
    pub bonus_points: BonusPoints,
    #[serde(default)]
    pub sports_participation: Participation,
    #[serde(default)]
    pub kalolsavam_participation: Participation,
    #[serde(default)]
    pub co_curricular_activities: CoCurricular,
    #[serde(default)]
    pub eligibility: Eligibility,
    #[serde(default)]
    pub national_state_test: bool,
}

impl NewApplication {
    pub fn register_number(&self) -> &RegisterNumber {
        &self.academic.register_number
    }

    pub fn exam_type(&self) -> ExamType {
        self.academic.subject_grades.exam_type()
    }

    pub fn preference(&self, rank: u8) -> Option<&CoursePreference> {
        self.course_preferences
            .iter()
            .find(|preference| preference.preference == rank)
    }
}

/// Stored row. Never updated or deleted through the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub application_number: ApplicationNumber,
    pub created_at: DateTime<Utc>,
    pub application: NewApplication,
}

impl ApplicationRecord {
    pub fn summary(&self) -> ApplicationSummary {
        ApplicationSummary {
            id: self.id,
            application_number: self.application_number.to_string(),
            register_number: self.application.register_number().to_string(),
            applicant_name: self.application.applicant.applicant_name.clone(),
            mobile_number: self.application.applicant.mobile_number.clone(),
            exam_type: self.application.exam_type(),
            first_preference: self
                .application
                .preference(1)
                .map(|preference| preference.code.clone()),
            submitted_on: self.created_at.date_naive(),
        }
    }
}

/// Row shown on the admin listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationSummary {
    pub id: ApplicationId,
    pub application_number: String,
    pub register_number: String,
    pub applicant_name: String,
    pub mobile_number: String,
    pub exam_type: ExamType,
    pub first_preference: Option<String>,
    pub submitted_on: NaiveDate,
}
