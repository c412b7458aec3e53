use rust_xlsxwriter::{Format, Workbook};

use super::ExportError;
use crate::workflows::admissions::applications::domain::{
    ApplicationRecord, CbseMarks, CoCurricular, FairGrades, Participation, SslcGrades, SubjectGrades,
};

const SHEET_NAME: &str = "Applications";
const MAX_COLUMN_WIDTH: usize = 50;
const COLUMN_PADDING: usize = 2;

const BASE_COLUMNS: [&str; 28] = [
    "Application ID",
    "Application Number",
    "Register Number",
    "Applicant Name",
    "Mobile Number",
    "WhatsApp Number",
    "Single Window Appln. No",
    "Gender",
    "Religion",
    "Date of Birth",
    "Fee Paid",
    "Google Pay Number",
    "Payment Date",
    "Qualifying Exam",
    "Exam Year",
    "Exam Type",
    "School Name",
    "Address",
    "House Name",
    "Post Office",
    "Taluk",
    "Panchayath/Municipality",
    "Mother Name",
    "Father Name",
    "Course Preference 1",
    "Course Preference 2",
    "Course Preference 3",
    "Submitted On",
];

const BONUS_COLUMNS: [&str; 6] = [
    "Bonus: NCC",
    "Bonus: NCC Type NCC",
    "Bonus: Scouts & Guides",
    "Bonus: Student Police Cadet",
    "Bonus: Dependent of Jawan Killed in Action",
    "Bonus: Dependent of Jawan in Service",
];

const PARTICIPATION_COLUMNS: [&str; 5] = [
    "State Level",
    "District A Grade",
    "District B Grade",
    "District C Grade",
    "District Participation",
];

const ELIGIBILITY_COLUMNS: [&str; 5] = [
    "Little Kites",
    "JRC",
    "NSS",
    "Clubs Count",
    "National/State Level Test",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    Xlsx,
    Csv,
}

impl SpreadsheetFormat {
    /// Anything other than `csv` falls back to XLSX.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|value| value.trim().to_ascii_lowercase()) {
            Some(value) if value == "csv" => Self::Csv,
            _ => Self::Xlsx,
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }

    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Csv => "text/csv; charset=utf-8",
        }
    }

    pub fn encode(self, sheet: &Sheet) -> Result<Vec<u8>, ExportError> {
        match self {
            Self::Xlsx => sheet.to_xlsx(),
            Self::Csv => sheet.to_csv(),
        }
    }
}

/// Header row plus one row of cell text per record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    /// Longest of header and cells in characters, padded and capped.
    pub fn column_widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(index, header)| {
                let longest = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(index))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0);
                (longest + COLUMN_PADDING).min(MAX_COLUMN_WIDTH)
            })
            .collect()
    }

    pub fn to_xlsx(&self) -> Result<Vec<u8>, ExportError> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(SHEET_NAME)?;

            for (column, header) in self.headers.iter().enumerate() {
                worksheet.write_string_with_format(0, column as u16, header, &bold)?;
            }
            for (row_index, row) in self.rows.iter().enumerate() {
                for (column, cell) in row.iter().enumerate() {
                    worksheet.write_string(row_index as u32 + 1, column as u16, cell)?;
                }
            }
            for (column, width) in self.column_widths().into_iter().enumerate() {
                worksheet.set_column_width(column as u16, width as f64)?;
            }
        }
        Ok(workbook.save_to_buffer()?)
    }

    pub fn to_csv(&self) -> Result<Vec<u8>, ExportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|error| ExportError::Io(error.into_error()))
    }
}

/// Flattens records into spreadsheet rows with hoisted nested fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct SheetBuilder;

impl SheetBuilder {
    pub fn build(&self, records: &[ApplicationRecord]) -> Sheet {
        Sheet {
            headers: headers(),
            rows: records
                .iter()
                .map(|record| {
                    flatten(record)
                        .into_iter()
                        .map(|(_, value)| value)
                        .collect()
                })
                .collect(),
        }
    }
}

fn sslc_headers() -> Vec<String> {
    let grades = SslcGrades::default();
    grades
        .subjects()
        .into_iter()
        .map(|(_, label, _)| format!("SSLC {label}"))
        .collect()
}

fn cbse_headers() -> Vec<String> {
    CbseMarks::default()
        .subjects()
        .into_iter()
        .map(|(_, label, _)| format!("CBSE {label}"))
        .collect()
}

fn co_curricular_headers() -> Vec<String> {
    let blank = CoCurricular::default();
    blank
        .activities()
        .into_iter()
        .flat_map(|(activity, grades)| {
            grades
                .tallies()
                .into_iter()
                .map(move |(grade, _)| format!("{activity} {grade} Grade"))
        })
        .collect()
}

/// Column headers in export order.
pub fn headers() -> Vec<String> {
    let mut headers: Vec<String> = BASE_COLUMNS.iter().map(|h| h.to_string()).collect();
    headers.extend(sslc_headers());
    headers.extend(cbse_headers());
    headers.extend(BONUS_COLUMNS.iter().map(|h| h.to_string()));
    for prefix in ["Sports", "Kalolsavam"] {
        headers.extend(
            PARTICIPATION_COLUMNS
                .iter()
                .map(|column| format!("{prefix} {column}")),
        );
    }
    headers.extend(co_curricular_headers());
    headers.extend(ELIGIBILITY_COLUMNS.iter().map(|h| h.to_string()));
    headers
}

fn yes_no(flag: bool) -> String {
    let label = if flag { "Yes" } else { "No" };
    label.to_string()
}

fn participation_cells(participation: &Participation) -> [String; 5] {
    let district = participation.district_level;
    [
        participation.state_level.to_string(),
        district.a_grade.to_string(),
        district.b_grade.to_string(),
        district.c_grade.to_string(),
        district.participation.to_string(),
    ]
}

fn fair_cells(grades: &FairGrades) -> impl Iterator<Item = String> {
    grades
        .tallies()
        .into_iter()
        .map(|(_, count)| count.to_string())
}

/// `(header, cell)` pairs for one record, in the same order as [`headers`].
pub fn flatten(record: &ApplicationRecord) -> Vec<(String, String)> {
    let application = &record.application;
    let applicant = &application.applicant;
    let address = &application.address;
    let payment = &application.payment;
    let academic = &application.academic;
    let preference = |rank: u8| {
        application
            .preference(rank)
            .map(|p| p.display())
            .unwrap_or_default()
    };

    let mut cells: Vec<String> = vec![
        record.id.to_string(),
        record.application_number.to_string(),
        academic.register_number.to_string(),
        applicant.applicant_name.clone(),
        applicant.mobile_number.clone(),
        applicant.whatsapp_number.clone(),
        payment.single_window_appln_no.clone(),
        applicant.gender.label().to_string(),
        applicant.religion.clone(),
        applicant.date_of_birth.format("%Y-%m-%d").to_string(),
        payment.fee_paid.to_string(),
        payment.google_pay_number.clone(),
        payment.payment_date.format("%Y-%m-%d").to_string(),
        academic.qualifying_exam.clone(),
        academic.exam_year.to_string(),
        academic.subject_grades.exam_type().label().to_string(),
        academic.school_name.clone(),
        address.permanent_address.clone(),
        address.house_name.clone(),
        address.post_office.clone(),
        address.taluk.clone(),
        address.panchayath_municipality.clone(),
        applicant.mother_name.clone(),
        applicant.father_name.clone(),
        preference(1),
        preference(2),
        preference(3),
        record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
    ];

    match &academic.subject_grades {
        SubjectGrades::Sslc(grades) => {
            cells.extend(grades.subjects().iter().map(|(_, _, grade)| grade.to_string()));
            cells.extend(std::iter::repeat(String::new()).take(5));
        }
        SubjectGrades::Cbse(marks) => {
            cells.extend(std::iter::repeat(String::new()).take(10));
            cells.extend(marks.subjects().iter().map(|(_, _, mark)| mark.to_string()));
        }
    }

    let bonus = &application.bonus_points;
    cells.extend([
        yes_no(bonus.ncc),
        yes_no(bonus.ncc_type.ncc),
        yes_no(bonus.ncc_type.scouts_guides),
        yes_no(bonus.ncc_type.student_police_cadet),
        yes_no(bonus.dependent_jawans_killed),
        yes_no(bonus.dependent_jawans_service),
    ]);
    cells.extend(participation_cells(&application.sports_participation));
    cells.extend(participation_cells(&application.kalolsavam_participation));
    for (_, grades) in application.co_curricular_activities.activities() {
        cells.extend(fair_cells(grades));
    }

    let eligibility = &application.eligibility;
    cells.extend([
        yes_no(eligibility.little_kites),
        yes_no(eligibility.jrc),
        yes_no(eligibility.nss),
        eligibility.clubs_count.to_string(),
        yes_no(application.national_state_test),
    ]);

    headers().into_iter().zip(cells).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::admissions::applications::tests::common::{
        cbse_submission, record, sslc_submission,
    };

    fn cell<'a>(pairs: &'a [(String, String)], header: &str) -> &'a str {
        pairs
            .iter()
            .find(|(name, _)| name == header)
            .map(|(_, value)| value.as_str())
            .unwrap_or_else(|| panic!("missing column {header}"))
    }

    #[test]
    fn flatten_emits_one_cell_per_header() {
        let pairs = flatten(&record(sslc_submission()));
        assert_eq!(pairs.len(), headers().len());
        assert_eq!(cell(&pairs, "Register Number"), "SK2025A01");
        assert_eq!(cell(&pairs, "Application Number"), "APP-00001");
        assert_eq!(
            cell(&pairs, "Course Preference 1"),
            "01 - Physics, Chemistry, Biology & Maths"
        );
        assert_eq!(cell(&pairs, "Course Preference 3"), "");
        assert_eq!(cell(&pairs, "Sports State Level"), "0");
    }

    #[test]
    fn grade_columns_of_the_other_exam_are_blank() {
        let sslc = flatten(&record(sslc_submission()));
        assert_eq!(cell(&sslc, "SSLC English"), "A+");
        assert_eq!(cell(&sslc, "CBSE English"), "");

        let cbse = flatten(&record(cbse_submission()));
        assert_eq!(cell(&cbse, "SSLC English"), "");
        assert_eq!(cell(&cbse, "CBSE Maths"), "95");
    }

    #[test]
    fn column_widths_are_padded_and_capped() {
        let sheet = Sheet {
            headers: vec!["ID".to_string(), "Address".to_string()],
            rows: vec![vec!["12345".to_string(), "x".repeat(80)]],
        };
        assert_eq!(sheet.column_widths(), vec![7, 50]);
    }

    #[test]
    fn csv_output_starts_with_header_row() {
        let sheet = SheetBuilder.build(&[record(sslc_submission())]);
        let bytes = sheet.to_csv().expect("csv");
        let text = String::from_utf8(bytes).expect("utf8");
        let mut lines = text.lines();
        assert!(lines
            .next()
            .expect("header")
            .starts_with("Application ID,Application Number,Register Number"));
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn xlsx_output_is_a_zip_container() {
        let sheet = SheetBuilder.build(&[record(cbse_submission())]);
        let bytes = sheet.to_xlsx().expect("xlsx");
        assert_eq!(&bytes[..2], b"PK");
        assert_eq!(SpreadsheetFormat::parse(Some("CSV")), SpreadsheetFormat::Csv);
        assert_eq!(SpreadsheetFormat::parse(None), SpreadsheetFormat::Xlsx);
    }
}
